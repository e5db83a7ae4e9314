//! The message-driven registration pipeline.
//!
//! [ScanRegistration] owns all state that lives longer than one message: the warm-up counter and the
//! current [SweepState]. Every call to [ScanRegistration::handle_cloud_message] runs the whole chain
//! synchronously: sweep boundary detection, preprocessing, feature extraction, densification of the less
//! flat points and emission of the results.

use anyhow::{Context, Result};
use log::{debug, trace};
use loam_core::{containers::PointCloud, point::RawPoint};

use crate::{
    feature_extraction::extract_features,
    params::RegistrationParams,
    preprocessing::{preprocess, MotionCompensator},
    publisher::{FeaturePublisher, ScanFeatures},
    sweep::{detect_sweep_boundary, SweepState},
    voxel_grid::voxelgrid_filter,
};

/// Feature extraction front end for a continuously rotating 2D scanner.
///
/// Not thread-safe: calls to `handle_cloud_message` have to be serialized by the caller.
///
/// ```
/// # use loam_algorithms::{params::RegistrationParams, registration::ScanRegistration};
/// # use loam_core::{containers::PointCloud, point::RawPoint};
/// let params = RegistrationParams::default().with_system_delay(0);
/// let mut registration = ScanRegistration::new(params).unwrap();
/// let cloud: PointCloud<_> = (0..100)
///     .map(|i| {
///         let angle = i as f32 * 0.01;
///         RawPoint::new(4.0 * angle.cos(), 4.0 * angle.sin(), 0.0)
///     })
///     .collect();
/// let features = registration.handle_cloud_message(&cloud, 0.0).unwrap();
/// assert_eq!(100, features.full_scan.len());
/// ```
pub struct ScanRegistration {
    params: RegistrationParams,
    remaining_warm_up: usize,
    sweep: SweepState,
    motion_compensator: Option<Box<dyn MotionCompensator>>,
    publisher: Option<Box<dyn FeaturePublisher>>,
}

impl ScanRegistration {
    /// Creates a new `ScanRegistration` after validating `params`
    pub fn new(params: RegistrationParams) -> Result<Self> {
        params
            .validate()
            .context("Invalid configuration for the scan registration")?;
        Ok(Self {
            remaining_warm_up: params.system_delay,
            params,
            sweep: SweepState::default(),
            motion_compensator: None,
            publisher: None,
        })
    }

    pub fn params(&self) -> &RegistrationParams {
        &self.params
    }

    /// The state of the current sweep
    pub fn sweep(&self) -> &SweepState {
        &self.sweep
    }

    /// Returns `true` while incoming messages are still discarded
    pub fn is_warming_up(&self) -> bool {
        self.remaining_warm_up > 0
    }

    /// Every processed message is handed to `publisher` in addition to being returned
    pub fn set_publisher<P: FeaturePublisher + 'static>(&mut self, publisher: P) {
        self.publisher = Some(Box::new(publisher));
    }

    pub fn set_motion_compensator<M: MotionCompensator + 'static>(&mut self, motion_compensator: M) {
        self.motion_compensator = Some(Box::new(motion_compensator));
    }

    /// Handles one raw message with timestamp `stamp` (in seconds). Returns the emitted features, or `None`
    /// if the message was discarded during warm-up.
    pub fn handle_cloud_message(
        &mut self,
        cloud: &PointCloud<RawPoint>,
        stamp: f64,
    ) -> Option<ScanFeatures> {
        if self.remaining_warm_up > 0 {
            self.remaining_warm_up -= 1;
            debug!(
                "Discarding message at {:.3}s during warm-up, {} remaining",
                stamp, self.remaining_warm_up
            );
            return None;
        }
        Some(self.process(cloud, stamp))
    }

    fn process(&mut self, cloud: &PointCloud<RawPoint>, stamp: f64) -> ScanFeatures {
        detect_sweep_boundary(cloud, stamp, &mut self.sweep, self.params.scan_period);

        let scan = preprocess(cloud, &self.params, self.motion_compensator.as_deref());
        let features = extract_features(&scan, &self.params);

        self.sweep.corner_sharp.extend_from_cloud(&features.corner_sharp);
        self.sweep
            .corner_less_sharp
            .extend_from_cloud(&features.corner_less_sharp);
        self.sweep.surface_flat.extend_from_cloud(&features.surface_flat);

        if !features.less_flat_candidates.is_empty() {
            let leafsize = self.params.less_flat_filter_size;
            voxelgrid_filter(
                &features.less_flat_candidates,
                leafsize,
                leafsize,
                leafsize,
                &mut self.sweep.surface_less_flat,
            );
        }

        trace!(
            "Message at {:.3}s: {} of {} points accepted, {} sharp, {} less sharp, {} flat, {} less flat candidates",
            stamp,
            scan.len(),
            cloud.len(),
            features.corner_sharp.len(),
            features.corner_less_sharp.len(),
            features.surface_flat.len(),
            features.less_flat_candidates.len()
        );

        let result = ScanFeatures::snapshot(stamp, scan, &self.sweep);
        if let Some(publisher) = self.publisher.as_mut() {
            publisher.publish(&result);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::ChannelPublisher;
    use crate::sweep::RotationDirection;

    fn arc(start_degrees: f32, end_degrees: f32, n: usize) -> PointCloud<RawPoint> {
        (0..n)
            .map(|i| {
                let t = i as f32 / (n - 1) as f32;
                let angle = (start_degrees + t * (end_degrees - start_degrees)).to_radians();
                RawPoint::new(5.0 * angle.cos(), 5.0 * angle.sin(), 0.0)
            })
            .collect()
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        let params = RegistrationParams::default().with_scan_period(0.0);
        assert!(ScanRegistration::new(params).is_err());
    }

    #[test]
    fn test_warm_up_discards_messages() {
        let params = RegistrationParams::default().with_system_delay(2);
        let mut registration = ScanRegistration::new(params).unwrap();
        let cloud = arc(0.0, 90.0, 200);

        assert!(registration.handle_cloud_message(&cloud, 0.0).is_none());
        assert!(registration.handle_cloud_message(&cloud, 0.1).is_none());
        assert!(!registration.is_warming_up());
        assert!(registration.handle_cloud_message(&cloud, 0.2).is_some());
    }

    #[test]
    fn test_publisher_receives_every_processed_message() {
        let params = RegistrationParams::default().with_system_delay(1);
        let mut registration = ScanRegistration::new(params).unwrap();
        let (publisher, receiver) = ChannelPublisher::channel();
        registration.set_publisher(publisher);

        let cloud = arc(0.0, 90.0, 200);
        for i in 0..4 {
            registration.handle_cloud_message(&cloud, i as f64 * 0.25);
        }
        let stamps = receiver.try_iter().map(|f| f.stamp).collect::<Vec<_>>();
        assert_eq!(vec![0.25, 0.5, 0.75], stamps);
    }

    #[test]
    fn test_features_accumulate_within_a_sweep() {
        let params = RegistrationParams::default().with_system_delay(0);
        let mut registration = ScanRegistration::new(params).unwrap();
        let cloud = arc(0.0, 90.0, 400);

        let first = registration.handle_cloud_message(&cloud, 1.0).unwrap();
        assert_eq!(RotationDirection::Negative, registration.sweep().rotation_direction);
        let second = registration.handle_cloud_message(&cloud, 1.05).unwrap();

        assert_eq!(1, registration.sweep().sweep_index);
        assert_eq!(2 * first.surface_flat.len(), second.surface_flat.len());
        assert_eq!(2 * first.surface_less_flat.len(), second.surface_less_flat.len());
        assert_eq!(first.full_scan, second.full_scan);
    }

    #[test]
    fn test_empty_message_is_emitted() {
        let params = RegistrationParams::default().with_system_delay(0);
        let mut registration = ScanRegistration::new(params).unwrap();
        let features = registration
            .handle_cloud_message(&PointCloud::new(), 0.5)
            .unwrap();
        assert!(features.full_scan.is_empty());
        assert!(features.surface_less_flat.is_empty());
    }
}
