//! Turns the raw points of one message into the working scan of the pipeline.
//!
//! Every raw point is remapped into the working axis convention, dropped if it is not a valid return, stamped
//! with its relative capture time and finally projected into the reference frame of the sweep start if a
//! [MotionCompensator] is available. The order of the surviving points is never changed.

use loam_core::{
    containers::PointCloud,
    nalgebra::{Isometry3, Point3, Vector3},
    point::{RawPoint, ScanPoint},
};

use crate::params::RegistrationParams;

/// Points with a squared range below this value carry no echo and are dropped
pub const MIN_SQUARED_RANGE: f32 = 0.0001;

/// Scan line of all points of a single-line, continuously rotating scanner
pub const SCAN_LINE: u16 = 0;

/// Source of the motion of the sensor during a sweep, typically backed by an inertial measurement unit.
pub trait MotionCompensator {
    /// Transform that maps a point captured at `rel_time` (in `[0, 1)`) into the reference frame of the
    /// sweep start. Returns `None` if no motion estimate is available for this instant, in which case the
    /// point is used as captured.
    fn transform_to_sweep_start(&self, rel_time: f32) -> Option<Isometry3<f32>>;
}

impl<F> MotionCompensator for F
where
    F: Fn(f32) -> Option<Isometry3<f32>>,
{
    fn transform_to_sweep_start(&self, rel_time: f32) -> Option<Isometry3<f32>> {
        self(rel_time)
    }
}

/// Permutes sensor-native axes into the working axes: `(x, y, z) = (raw.y, raw.z, raw.x)`
pub fn remap_axes(raw: &RawPoint) -> Vector3<f32> {
    Vector3::new(raw.position.y, raw.position.z, raw.position.x)
}

/// Returns `true` if `position` is a usable return: all coordinates finite and not at the sensor origin
pub fn is_valid_position(position: &Vector3<f32>) -> bool {
    position.iter().all(|c| c.is_finite()) && position.norm_squared() >= MIN_SQUARED_RANGE
}

/// Relative capture time of the point at `index` in a message of `count` points, derived from its
/// column position. Always in `[0, 1)`.
pub fn relative_time(index: usize, count: usize) -> f32 {
    if count == 0 {
        return 0.0;
    }
    index as f32 / count as f32
}

/// Builds the working scan from the raw points of one message. Invalid points are dropped, all other
/// points keep their relative order.
pub fn preprocess(
    cloud: &PointCloud<RawPoint>,
    params: &RegistrationParams,
    motion_compensator: Option<&dyn MotionCompensator>,
) -> PointCloud<ScanPoint> {
    let count = cloud.len();
    let mut scan = PointCloud::with_capacity(count);

    for (index, raw) in cloud.iter().enumerate() {
        let position = remap_axes(raw);
        if !is_valid_position(&position) {
            continue;
        }

        let rel_time = relative_time(index, count);
        let position = match motion_compensator.and_then(|m| m.transform_to_sweep_start(rel_time)) {
            Some(transform) => transform.transform_point(&Point3::from(position)).coords,
            None => position,
        };

        scan.push(ScanPoint::with_timing(
            position,
            SCAN_LINE,
            rel_time,
            params.scan_period,
        ));
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use loam_core::nalgebra::{Translation3, UnitQuaternion};

    #[test]
    fn test_axes_are_permuted() {
        let remapped = remap_axes(&RawPoint::new(1.0, 2.0, 3.0));
        assert_eq!(Vector3::new(2.0, 3.0, 1.0), remapped);
    }

    #[test]
    fn test_invalid_points_are_dropped_in_order() {
        let cloud: PointCloud<_> = vec![
            RawPoint::new(1.0, 0.0, 0.0),
            RawPoint::new(f32::NAN, 0.0, 0.0),
            RawPoint::new(2.0, 0.0, 0.0),
            RawPoint::new(0.0, 0.0, 0.0),
            RawPoint::new(0.001, 0.0, 0.0),
            RawPoint::new(3.0, f32::INFINITY, 0.0),
            RawPoint::new(4.0, 0.0, 0.0),
        ]
        .into_iter()
        .collect();
        let scan = preprocess(&cloud, &RegistrationParams::default(), None);
        let zs = scan.positions().map(|p| p.z).collect::<Vec<_>>();
        assert_eq!(vec![1.0, 2.0, 4.0], zs);
    }

    #[test]
    fn test_relative_time_is_packed_from_column() {
        let cloud: PointCloud<_> = (0..4).map(|i| RawPoint::new(1.0 + i as f32, 0.0, 0.0)).collect();
        let params = RegistrationParams::default();
        let scan = preprocess(&cloud, &params, None);
        for (i, point) in scan.iter().enumerate() {
            assert_eq!(SCAN_LINE, point.scan_line());
            assert_approx_eq!(i as f32 / 4.0, point.rel_time(params.scan_period), 1e-4);
        }
    }

    #[test]
    fn test_compensation_moves_points_into_sweep_start_frame() {
        let cloud: PointCloud<_> = (0..10).map(|i| RawPoint::new(1.0, i as f32, 0.0)).collect();
        // pure translation proportional to the capture time
        let compensator = |rel_time: f32| {
            Some(Isometry3::from_parts(
                Translation3::new(rel_time, 0.0, 0.0),
                UnitQuaternion::identity(),
            ))
        };
        let scan = preprocess(&cloud, &RegistrationParams::default(), Some(&compensator));
        let uncompensated = preprocess(&cloud, &RegistrationParams::default(), None);
        assert_eq!(uncompensated.len(), scan.len());
        for (i, (moved, original)) in scan.iter().zip(uncompensated.iter()).enumerate() {
            assert_approx_eq!(original.position.x + i as f32 / 10.0, moved.position.x, 1e-5);
            assert_approx_eq!(original.position.z, moved.position.z, 1e-6);
        }
    }

    #[test]
    fn test_missing_compensation_passes_points_through() {
        let cloud: PointCloud<_> = (1..6).map(|i| RawPoint::new(i as f32, 1.0, 0.0)).collect();
        let compensator = |_: f32| -> Option<Isometry3<f32>> { None };
        let scan = preprocess(&cloud, &RegistrationParams::default(), Some(&compensator));
        assert_eq!(preprocess(&cloud, &RegistrationParams::default(), None), scan);
    }
}
