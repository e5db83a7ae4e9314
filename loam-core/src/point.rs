use nalgebra::Vector3;

/// Common interface of all point types that can be stored in a [PointCloud](crate::containers::PointCloud)
pub trait PointType: Copy {
    /// The 3D position of this point
    fn position(&self) -> Vector3<f32>;
}

/// A single return as delivered by the sensor, in sensor-native axes. May contain non-finite coordinates
/// or the origin for beams without echo.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RawPoint {
    pub position: Vector3<f32>,
}

impl RawPoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vector3::new(x, y, z),
        }
    }

    /// Returns `true` if all coordinates of this point are finite
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|c| c.is_finite())
    }

    /// Unit vector pointing from the sensor towards this point. Returns `None` for points at the origin
    /// or with non-finite coordinates.
    pub fn bearing(&self) -> Option<Vector3<f32>> {
        let range = self.position.norm();
        if !range.is_finite() || range == 0.0 {
            return None;
        }
        Some(self.position / range)
    }
}

impl PointType for RawPoint {
    fn position(&self) -> Vector3<f32> {
        self.position
    }
}

/// An accepted point in the working axis convention of the registration pipeline.
///
/// The `intensity` channel does not carry a reflectance value. It packs the scan line the point belongs
/// to together with its capture time within the sweep: `scan_line + scan_period * rel_time`, with
/// `rel_time` in `[0, 1)`. This requires `scan_period < 1`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ScanPoint {
    pub position: Vector3<f32>,
    pub intensity: f32,
}

impl ScanPoint {
    pub fn new(position: Vector3<f32>, intensity: f32) -> Self {
        Self {
            position,
            intensity,
        }
    }

    /// Creates a new `ScanPoint` and packs `scan_line` and `rel_time` into its intensity channel
    /// ```
    /// # use loam_core::{nalgebra::Vector3, point::ScanPoint};
    /// let point = ScanPoint::with_timing(Vector3::new(1.0, 0.0, 0.0), 3, 0.5, 0.1);
    /// assert_eq!(point.scan_line(), 3);
    /// assert!((point.rel_time(0.1) - 0.5).abs() < 1e-4);
    /// ```
    pub fn with_timing(
        position: Vector3<f32>,
        scan_line: u16,
        rel_time: f32,
        scan_period: f32,
    ) -> Self {
        Self {
            position,
            intensity: f32::from(scan_line) + scan_period * rel_time,
        }
    }

    /// The scan line index packed into the intensity channel
    pub fn scan_line(&self) -> u16 {
        self.intensity.trunc() as u16
    }

    /// The relative capture time in `[0, 1)` packed into the intensity channel
    pub fn rel_time(&self, scan_period: f32) -> f32 {
        self.intensity.fract() / scan_period
    }
}

impl PointType for ScanPoint {
    fn position(&self) -> Vector3<f32> {
        self.position
    }
}
