use anyhow::{bail, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Multiplier between the sharp corner quota and the total corner quota of a region
pub const CORNER_LESS_SHARP_FACTOR: usize = 10;

/// Configuration of the scan registration pipeline. All quotas apply per region of a scan.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RegistrationParams {
    /// Minimum time in seconds between two sweep reversals. Also the time span that the relative capture
    /// time of a point is scaled to when it is packed into the intensity channel.
    /// Default: 0.1
    pub scan_period: f32,

    /// Number of messages that are discarded before processing starts.
    /// Default: 20
    pub system_delay: usize,

    /// Number of regions a scan is split into for feature selection.
    /// Default: 4
    pub n_feature_regions: usize,

    /// Number of neighbours on each side of a point used for its curvature. Also the index window
    /// that is suppressed around a selected feature.
    /// Default: 5
    pub curvature_region: usize,

    /// Maximum number of sharp corner points per region.
    /// Default: 2
    pub max_corner_sharp: usize,

    /// Maximum number of flat surface points per region.
    /// Default: 4
    pub max_surface_flat: usize,

    /// Points with a curvature above this value are corner candidates, points below it flat candidates.
    /// Default: 0.1
    pub surface_curvature_threshold: f32,

    /// Voxel edge length in meters used to downsample the less flat surface points.
    /// Default: 0.2
    pub less_flat_filter_size: f32,

    /// Squared distance between two consecutive points that ends the index window suppression
    /// around a selected feature.
    /// Default: 0.05
    pub neighbor_gap_threshold: f32,

    /// No two selected features of a scan are closer to each other than this distance in meters.
    /// Default: 0.2
    pub suppression_distance: f32,

    /// Squared distance between two consecutive points above which the pair is tested for occlusion.
    /// Default: 0.1
    pub occlusion_gap_threshold: f32,

    /// Range-normalized distance below which a depth discontinuity counts as an occlusion.
    /// Default: 0.1
    pub occlusion_weighted_distance: f32,

    /// A point is hit by a grazing beam if the absolute cosine between its beam and the local surface
    /// direction (from its previous to its next neighbour) exceeds this value. Values of 1 and above
    /// disable the test.
    /// Default: 0.95
    pub grazing_cos_threshold: f32,
}

impl Default for RegistrationParams {
    fn default() -> Self {
        Self {
            scan_period: 0.1,
            system_delay: 20,
            n_feature_regions: 4,
            curvature_region: 5,
            max_corner_sharp: 2,
            max_surface_flat: 4,
            surface_curvature_threshold: 0.1,
            less_flat_filter_size: 0.2,
            neighbor_gap_threshold: 0.05,
            suppression_distance: 0.2,
            occlusion_gap_threshold: 0.1,
            occlusion_weighted_distance: 0.1,
            grazing_cos_threshold: 0.95,
        }
    }
}

impl RegistrationParams {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of corner points (sharp and less sharp) per region
    pub fn max_corner_less_sharp(&self) -> usize {
        self.max_corner_sharp * CORNER_LESS_SHARP_FACTOR
    }

    /// Smallest number of points a scan must have so that every interior point has `curvature_region`
    /// neighbours on both sides and the region partition is not empty
    pub fn min_scan_size(&self) -> usize {
        2 * self.curvature_region + 2
    }

    pub fn with_scan_period(mut self, scan_period: f32) -> Self {
        self.scan_period = scan_period;
        self
    }

    pub fn with_system_delay(mut self, system_delay: usize) -> Self {
        self.system_delay = system_delay;
        self
    }

    pub fn with_n_feature_regions(mut self, n_feature_regions: usize) -> Self {
        self.n_feature_regions = n_feature_regions;
        self
    }

    pub fn with_max_corner_sharp(mut self, max_corner_sharp: usize) -> Self {
        self.max_corner_sharp = max_corner_sharp;
        self
    }

    pub fn with_surface_curvature_threshold(mut self, threshold: f32) -> Self {
        self.surface_curvature_threshold = threshold;
        self
    }

    pub fn with_less_flat_filter_size(mut self, filter_size: f32) -> Self {
        self.less_flat_filter_size = filter_size;
        self
    }

    /// Checks that this configuration can be used by the registration pipeline
    pub fn validate(&self) -> Result<()> {
        if !(self.scan_period > 0.0 && self.scan_period < 1.0) {
            bail!(
                "scan_period must be in (0, 1) seconds but is {}",
                self.scan_period
            );
        }
        if self.n_feature_regions == 0 {
            bail!("n_feature_regions must be at least 1");
        }
        if self.curvature_region == 0 {
            bail!("curvature_region must be at least 1");
        }
        if !(self.less_flat_filter_size > 0.0 && self.less_flat_filter_size.is_finite()) {
            bail!(
                "less_flat_filter_size must be a positive number but is {}",
                self.less_flat_filter_size
            );
        }
        let thresholds = [
            ("surface_curvature_threshold", self.surface_curvature_threshold),
            ("neighbor_gap_threshold", self.neighbor_gap_threshold),
            ("suppression_distance", self.suppression_distance),
            ("occlusion_gap_threshold", self.occlusion_gap_threshold),
            ("occlusion_weighted_distance", self.occlusion_weighted_distance),
            ("grazing_cos_threshold", self.grazing_cos_threshold),
        ];
        for (name, value) in thresholds.iter() {
            if !value.is_finite() || *value < 0.0 {
                bail!("{} must be a finite, non-negative number but is {}", name, value);
            }
        }
        Ok(())
    }
}
