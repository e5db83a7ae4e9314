use std::collections::BTreeMap;

use loam_core::{
    containers::PointCloud,
    nalgebra::{Point3, Vector3},
    point::ScanPoint,
};

use crate::bounds::calculate_bounds;

/// finds the leaf of point p in a grid anchored at `origin`
fn find_leaf(
    p: &Vector3<f32>,
    origin: &Point3<f32>,
    inverse_leafsize: &Vector3<f32>,
) -> (i64, i64, i64) {
    let index_x = ((p.x - origin.x) * inverse_leafsize.x).floor() as i64;
    let index_y = ((p.y - origin.y) * inverse_leafsize.y).floor() as i64;
    let index_z = ((p.z - origin.z) * inverse_leafsize.z).floor() as i64;
    (index_x, index_y, index_z)
}

/// returns the centroid of the points with the given indices. Position and intensity are averaged
fn centroid(points: &[usize], buffer: &PointCloud<ScanPoint>) -> ScanPoint {
    let mut position_sum = Vector3::<f32>::zeros();
    let mut intensity_sum = 0.0;
    for p in points {
        let point = buffer.at(*p);
        position_sum += point.position;
        intensity_sum += point.intensity;
    }
    let num_of_points = points.len() as f32;
    ScanPoint::new(position_sum / num_of_points, intensity_sum / num_of_points)
}

/// Downsamples `buffer` by applying a voxelgrid-filter. The grid is anchored at the minimum corner of the
/// bounding box of `buffer`. Every occupied voxel is replaced by the centroid of its points. The centroids
/// are appended to `filtered_buffer` ordered by their voxel index, so the result is deterministic and never
/// contains more points than `buffer`.
///
/// # Panics
///
/// If any of the leaf sizes is not a positive number
///
/// # Examples
/// ```
/// # use loam_algorithms::voxel_grid::voxelgrid_filter;
/// # use loam_core::{containers::PointCloud, nalgebra::Vector3, point::ScanPoint};
/// let mut points = vec![];
/// // generate some points
/// for i in 0..100 {
///     for j in 0..100 {
///         points.push(ScanPoint::new(Vector3::new(0.0, i as f32, j as f32), 0.0));
///     }
/// }
/// let buffer = points.into_iter().collect::<PointCloud<_>>();
/// let mut filtered = PointCloud::new();
/// voxelgrid_filter(&buffer, 1.5, 1.5, 1.5, &mut filtered);
/// // filtered now has fewer points than buffer
/// assert!(filtered.len() < buffer.len() / 2);
/// ```
pub fn voxelgrid_filter(
    buffer: &PointCloud<ScanPoint>,
    leafsize_x: f32,
    leafsize_y: f32,
    leafsize_z: f32,
    filtered_buffer: &mut PointCloud<ScanPoint>,
) {
    if !(leafsize_x > 0.0 && leafsize_y > 0.0 && leafsize_z > 0.0) {
        panic!(
            "Invalid leaf size ({}, {}, {}) for the voxel grid, all leaf sizes must be positive.",
            leafsize_x, leafsize_y, leafsize_z
        );
    }

    // get the bounding box of the pointcloud
    let aabb = match calculate_bounds(buffer) {
        Some(aabb) => aabb,
        None => return,
    };
    let inverse_leafsize = Vector3::new(1.0 / leafsize_x, 1.0 / leafsize_y, 1.0 / leafsize_z);

    // occupied voxels, keyed and iterated by their leaf index
    let mut voxels: BTreeMap<(i64, i64, i64), Vec<usize>> = BTreeMap::new();

    // create the VoxelGrid
    for (i, p) in buffer.positions().enumerate() {
        let pos = find_leaf(&p, aabb.min(), &inverse_leafsize);
        voxels.entry(pos).or_insert_with(Vec::new).push(i);
    }

    filtered_buffer.extend(voxels.values().map(|points| centroid(points, buffer)));
}

/// Downsamples `buffer` with a cubic voxel grid of edge length `leafsize` and returns the centroids
pub fn downsample(buffer: &PointCloud<ScanPoint>, leafsize: f32) -> PointCloud<ScanPoint> {
    let mut filtered = PointCloud::new();
    voxelgrid_filter(buffer, leafsize, leafsize, leafsize, &mut filtered);
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn setup_point_cloud() -> PointCloud<ScanPoint> {
        let mut points = vec![];
        // the two extreme points span the grid from 0.0 to 10.0
        points.push(ScanPoint::new(Vector3::new(0.0, 0.0, 0.0), 0.0));
        points.push(ScanPoint::new(Vector3::new(10.0, 10.0, 10.0), 0.0));
        // three points in each of the 1000 voxels
        for i in 0..10 {
            for j in 0..10 {
                for k in 0..10 {
                    for (offset, intensity) in [(0.5, 2.0), (0.6, 4.0), (0.7, 6.0)].iter() {
                        points.push(ScanPoint::new(
                            Vector3::new(
                                i as f32 + offset,
                                j as f32 + offset,
                                k as f32 + offset,
                            ),
                            *intensity,
                        ));
                    }
                }
            }
        }
        points.into_iter().collect()
    }

    #[test]
    fn test_voxel_grid_filter() {
        let buffer = setup_point_cloud();
        assert_eq!(3002, buffer.len());
        let filtered = downsample(&buffer, 1.0);
        // the corner point at 10.0 gets a voxel of its own, the one at the origin shares the first voxel
        assert_eq!(1001, filtered.len());

        // voxel (0, 0, 1) holds the points at offsets 0.5, 0.6 and 0.7
        let second = filtered.at(1);
        assert_approx_eq!(0.6, second.position.x, 1e-5);
        assert_approx_eq!(0.6, second.position.y, 1e-5);
        assert_approx_eq!(1.6, second.position.z, 1e-5);
        assert_approx_eq!(4.0, second.intensity, 1e-5);
    }

    #[test]
    fn test_voxel_grid_output_is_sorted_by_voxel() {
        let buffer: PointCloud<_> = vec![
            ScanPoint::new(Vector3::new(5.0, 0.0, 0.0), 0.0),
            ScanPoint::new(Vector3::new(0.0, 0.0, 0.0), 0.0),
            ScanPoint::new(Vector3::new(2.5, 0.0, 0.0), 0.0),
        ]
        .into_iter()
        .collect();
        let filtered = downsample(&buffer, 1.0);
        let xs = filtered.positions().map(|p| p.x).collect::<Vec<_>>();
        assert_eq!(vec![0.0, 2.5, 5.0], xs);
    }

    #[test]
    fn test_many_sparse_voxels_come_out_in_leaf_order() {
        // one point per voxel, inserted in descending order along a diagonal
        let buffer: PointCloud<_> = (0..5000)
            .rev()
            .map(|i| {
                let t = i as f32 * 0.3;
                ScanPoint::new(Vector3::new(t, (i % 7) as f32 * 0.3, 0.0), i as f32)
            })
            .collect();
        let filtered = downsample(&buffer, 0.2);
        assert_eq!(5000, filtered.len());
        for (i, point) in filtered.iter().enumerate() {
            assert_approx_eq!(i as f32, point.intensity, 1e-3);
        }
    }

    #[test]
    fn test_downsampling_twice_never_grows() {
        let mut rng = StdRng::seed_from_u64(7);
        let buffer: PointCloud<_> = (0..2000)
            .map(|_| {
                ScanPoint::new(
                    Vector3::new(
                        rng.gen_range(-5.0..5.0),
                        rng.gen_range(-5.0..5.0),
                        rng.gen_range(-0.5..0.5),
                    ),
                    0.0,
                )
            })
            .collect();
        let once = downsample(&buffer, 0.4);
        let twice = downsample(&once, 0.4);
        assert!(once.len() <= buffer.len());
        assert!(twice.len() <= once.len());
    }

    #[test]
    fn test_empty_buffer_yields_nothing() {
        let mut filtered = PointCloud::new();
        voxelgrid_filter(&PointCloud::new(), 0.2, 0.2, 0.2, &mut filtered);
        assert!(filtered.is_empty());
    }

    #[test]
    #[should_panic]
    fn test_zero_leaf_size_panics() {
        downsample(&setup_point_cloud(), 0.0);
    }
}
