//! Feature extraction from a single working scan.
//!
//! The extraction follows the edge and planar point selection of LOAM (J. Zhang and S. Singh, "LOAM: Lidar
//! Odometry and Mapping in Real-time", RSS 2014):
//!
//! 1. Every interior point gets a curvature value computed from `curvature_region` neighbours on each side.
//! 2. Points that are unreliable feature candidates are masked before any selection happens. These are the
//!    points of the foreground surface next to a depth discontinuity and points hit by a beam that is
//!    nearly parallel to the surface.
//! 3. The scan is split into regions. In each region the points with the largest curvature become corners
//!    and the points with the smallest curvature become flat surface points, both limited by quotas. Every
//!    selected point suppresses its neighbourhood so that features spread out.
//! 4. All points of a region that did not become a corner are candidates for the less flat surface cloud.
//!
//! Curvature and the neighbour mask are computed once per scan and shared by all regions.

use std::ops::Range;

use float_ord::FloatOrd;
use log::{trace, warn};
use loam_core::{containers::PointCloud, nalgebra::Vector3, point::ScanPoint};

use crate::params::RegistrationParams;

/// Label of a point within its region. The variants are ordered: `SurfaceFlat < SurfaceLessFlat <
/// CornerLessSharp < CornerSharp`, so every label `<= SurfaceLessFlat` is a surface label.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PointLabel {
    SurfaceFlat,
    SurfaceLessFlat,
    CornerLessSharp,
    CornerSharp,
}

impl Default for PointLabel {
    fn default() -> Self {
        PointLabel::SurfaceLessFlat
    }
}

impl PointLabel {
    pub fn is_corner(self) -> bool {
        self > PointLabel::SurfaceLessFlat
    }
}

/// Labels of one region of a scan after feature selection
#[derive(Debug, Clone, PartialEq)]
pub struct RegionLabels {
    /// Indices into the working scan covered by this region
    pub range: Range<usize>,
    /// One label per index in `range`
    pub labels: Vec<PointLabel>,
}

impl RegionLabels {
    /// Number of points in this region with the given label
    pub fn count(&self, label: PointLabel) -> usize {
        self.labels.iter().filter(|l| **l == label).count()
    }

    /// Scan indices of all points in this region with the given label
    pub fn indices_with(&self, label: PointLabel) -> impl Iterator<Item = usize> + '_ {
        let start = self.range.start;
        self.labels
            .iter()
            .enumerate()
            .filter(move |(_, l)| **l == label)
            .map(move |(offset, _)| start + offset)
    }
}

/// Features of a single scan
#[derive(Debug, Clone, Default)]
pub struct ScanFeatureSets {
    pub corner_sharp: PointCloud<ScanPoint>,
    pub corner_less_sharp: PointCloud<ScanPoint>,
    pub surface_flat: PointCloud<ScanPoint>,
    /// All points that were not selected as corners, before downsampling
    pub less_flat_candidates: PointCloud<ScanPoint>,
    pub regions: Vec<RegionLabels>,
}

/// Per-point buffers of one scan: the curvature of every interior point and the mask of points that may no
/// longer be selected as features. A set mask entry is never cleared again.
#[derive(Debug, Clone)]
pub struct ScanBuffers {
    curvature: Vec<f32>,
    neighbor_picked: Vec<bool>,
}

impl ScanBuffers {
    /// Computes curvatures for `scan` and seeds the neighbour mask with all unreliable points
    pub fn new(scan: &PointCloud<ScanPoint>, params: &RegistrationParams) -> Self {
        let mut buffers = Self {
            curvature: compute_curvature(scan, params.curvature_region),
            neighbor_picked: vec![false; scan.len()],
        };
        buffers.mark_unreliable_points(scan, params);
        buffers
    }

    /// Curvature of the point at `index`. The `curvature_region` points at either end of the scan have no
    /// curvature and report `0.0`.
    pub fn curvature(&self, index: usize) -> f32 {
        self.curvature[index]
    }

    pub fn is_picked(&self, index: usize) -> bool {
        self.neighbor_picked[index]
    }

    pub fn num_picked(&self) -> usize {
        self.neighbor_picked.iter().filter(|p| **p).count()
    }

    fn mark_range(&mut self, range: Range<usize>) {
        let end = range.end.min(self.neighbor_picked.len());
        for picked in &mut self.neighbor_picked[range.start.min(end)..end] {
            *picked = true;
        }
    }

    /// Masks the foreground edge of depth discontinuities and points seen under a grazing angle
    fn mark_unreliable_points(&mut self, scan: &PointCloud<ScanPoint>, params: &RegistrationParams) {
        let c = params.curvature_region;
        if scan.len() < 2 * c + 2 {
            return;
        }

        for i in c..scan.len() - c - 1 {
            let previous = scan.at(i - 1).position;
            let point = scan.at(i).position;
            let next = scan.at(i + 1).position;

            let depth1 = point.norm();
            let depth2 = next.norm();

            if squared_diff(&next, &point) > params.occlusion_gap_threshold
                && depth1 > 0.0
                && depth2 > 0.0
            {
                if depth1 > depth2 {
                    // the next point lies in front of the current one
                    let weighted_distance = (next - point * (depth2 / depth1)).norm() / depth2;
                    if weighted_distance < params.occlusion_weighted_distance {
                        self.mark_range(i + 1..i + c + 2);
                    }
                } else {
                    let weighted_distance = (point - next * (depth1 / depth2)).norm() / depth1;
                    if weighted_distance < params.occlusion_weighted_distance {
                        self.mark_range(i - c..i + 1);
                    }
                }
            }

            let tangent = next - previous;
            let tangent_length = tangent.norm();
            if depth1 > 0.0
                && tangent_length > 0.0
                && (point.dot(&tangent) / (depth1 * tangent_length)).abs() > params.grazing_cos_threshold
            {
                self.neighbor_picked[i] = true;
            }
        }
    }

    /// Marks `index` as picked together with its neighbourhood: up to `curvature_region` indices on each
    /// side as long as consecutive points are close, and every point of the scan within
    /// `suppression_distance` of the picked point.
    fn mark_as_picked(&mut self, scan: &PointCloud<ScanPoint>, index: usize, params: &RegistrationParams) {
        self.neighbor_picked[index] = true;

        for i in 1..=params.curvature_region {
            let j = index + i;
            if j >= scan.len()
                || squared_diff(&scan.at(j).position, &scan.at(j - 1).position)
                    > params.neighbor_gap_threshold
            {
                break;
            }
            self.neighbor_picked[j] = true;
        }

        for i in 1..=params.curvature_region {
            if i > index {
                break;
            }
            let j = index - i;
            if squared_diff(&scan.at(j).position, &scan.at(j + 1).position)
                > params.neighbor_gap_threshold
            {
                break;
            }
            self.neighbor_picked[j] = true;
        }

        let center = scan.at(index).position;
        let squared_suppression = params.suppression_distance * params.suppression_distance;
        for (picked, position) in self.neighbor_picked.iter_mut().zip(scan.positions()) {
            if squared_diff(&position, &center) < squared_suppression {
                *picked = true;
            }
        }
    }
}

fn squared_diff(a: &Vector3<f32>, b: &Vector3<f32>) -> f32 {
    (a - b).norm_squared()
}

/// Computes the curvature of every point of `scan` that has `curvature_region` neighbours on both sides:
/// the length of the sum of the displacement vectors from the point to all of these neighbours. Points too
/// close to either end of the scan get a curvature of `0.0`.
///
/// ```
/// # use loam_algorithms::feature_extraction::compute_curvature;
/// # use loam_core::{containers::PointCloud, nalgebra::Vector3, point::ScanPoint};
/// let line: PointCloud<_> = (0..20)
///     .map(|i| ScanPoint::new(Vector3::new(i as f32 * 0.1, 0.0, 2.0), 0.0))
///     .collect();
/// let curvature = compute_curvature(&line, 5);
/// assert!(curvature[10] < 1e-5);
/// ```
pub fn compute_curvature(scan: &PointCloud<ScanPoint>, curvature_region: usize) -> Vec<f32> {
    let mut curvature = vec![0.0; scan.len()];
    if scan.len() < 2 * curvature_region + 1 {
        return curvature;
    }

    let point_weight = -2.0 * curvature_region as f32;
    for i in curvature_region..scan.len() - curvature_region {
        let mut diff = scan.at(i).position * point_weight;
        for j in 1..=curvature_region {
            diff += scan.at(i + j).position + scan.at(i - j).position;
        }
        curvature[i] = diff.norm();
    }
    curvature
}

/// Splits the interior `[c, n - c - 1)` of a scan with `n` points into `n_regions` contiguous regions of
/// (nearly) equal size, with `c` being the curvature region. Returns no regions if the scan is too small.
pub fn region_bounds(n: usize, curvature_region: usize, n_regions: usize) -> Vec<Range<usize>> {
    if n < 2 * curvature_region + 2 || n_regions == 0 {
        return vec![];
    }
    let start = curvature_region;
    let span = n - 2 * curvature_region - 1;
    (0..n_regions)
        .map(|j| start + j * span / n_regions..start + (j + 1) * span / n_regions)
        .collect()
}

/// Runs the greedy corner and surface selection on a single region and collects its less flat candidates
fn select_region_features(
    scan: &PointCloud<ScanPoint>,
    buffers: &mut ScanBuffers,
    region: Range<usize>,
    params: &RegistrationParams,
    features: &mut ScanFeatureSets,
) {
    let mut labels = vec![PointLabel::default(); region.len()];

    // stable and deterministic: equal curvatures keep their index order
    let mut sort_indices = region.clone().collect::<Vec<_>>();
    sort_indices.sort_by(|a, b| {
        FloatOrd(buffers.curvature[*a])
            .cmp(&FloatOrd(buffers.curvature[*b]))
            .then(a.cmp(b))
    });

    // extract corner features
    let mut largest_picked_num = 0;
    for &scan_idx in sort_indices.iter().rev() {
        if buffers.curvature[scan_idx] <= params.surface_curvature_threshold {
            break;
        }
        if buffers.neighbor_picked[scan_idx] {
            continue;
        }

        largest_picked_num += 1;
        let label = if largest_picked_num <= params.max_corner_sharp {
            PointLabel::CornerSharp
        } else if largest_picked_num <= params.max_corner_less_sharp() {
            PointLabel::CornerLessSharp
        } else {
            break;
        };

        labels[scan_idx - region.start] = label;
        match label {
            PointLabel::CornerSharp => features.corner_sharp.push(*scan.at(scan_idx)),
            _ => features.corner_less_sharp.push(*scan.at(scan_idx)),
        }
        buffers.mark_as_picked(scan, scan_idx, params);
    }

    // extract flat surface features
    let mut smallest_picked_num = 0;
    for &scan_idx in sort_indices.iter() {
        if smallest_picked_num >= params.max_surface_flat
            || buffers.curvature[scan_idx] >= params.surface_curvature_threshold
        {
            break;
        }
        if buffers.neighbor_picked[scan_idx] {
            continue;
        }

        smallest_picked_num += 1;
        labels[scan_idx - region.start] = PointLabel::SurfaceFlat;
        features.surface_flat.push(*scan.at(scan_idx));
        buffers.mark_as_picked(scan, scan_idx, params);
    }

    // extract less flat surface features
    for (offset, label) in labels.iter().enumerate() {
        if *label <= PointLabel::SurfaceLessFlat {
            features
                .less_flat_candidates
                .push(*scan.at(region.start + offset));
        }
    }

    features.regions.push(RegionLabels {
        range: region,
        labels,
    });
}

/// Extracts corner and surface features from `scan`. Scans with fewer than
/// [min_scan_size](RegistrationParams::min_scan_size) points yield no features at all.
pub fn extract_features(scan: &PointCloud<ScanPoint>, params: &RegistrationParams) -> ScanFeatureSets {
    let mut features = ScanFeatureSets::default();
    if scan.len() < params.min_scan_size() {
        warn!(
            "Skipping feature extraction for a scan with {} points, at least {} are required",
            scan.len(),
            params.min_scan_size()
        );
        return features;
    }

    let mut buffers = ScanBuffers::new(scan, params);
    trace!(
        "{} of {} points masked before feature selection",
        buffers.num_picked(),
        scan.len()
    );
    for region in region_bounds(scan.len(), params.curvature_region, params.n_feature_regions) {
        select_region_features(scan, &mut buffers, region, params, &mut features);
    }
    features
}
