use std::sync::mpsc::{Receiver, Sender};

use log::warn;
use loam_core::{containers::PointCloud, point::ScanPoint};

use crate::sweep::SweepState;

/// The five clouds that are emitted after every processed message. The feature clouds hold everything
/// accumulated since the start of the current sweep, `full_scan` only holds the working scan of the
/// message itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanFeatures {
    /// Timestamp in seconds of the message that produced these clouds
    pub stamp: f64,
    pub full_scan: PointCloud<ScanPoint>,
    pub corner_sharp: PointCloud<ScanPoint>,
    pub corner_less_sharp: PointCloud<ScanPoint>,
    pub surface_flat: PointCloud<ScanPoint>,
    pub surface_less_flat: PointCloud<ScanPoint>,
}

impl ScanFeatures {
    /// Snapshot of the accumulated clouds of `sweep` together with the working scan of the current message
    pub fn snapshot(stamp: f64, full_scan: PointCloud<ScanPoint>, sweep: &SweepState) -> Self {
        Self {
            stamp,
            full_scan,
            corner_sharp: sweep.corner_sharp.clone(),
            corner_less_sharp: sweep.corner_less_sharp.clone(),
            surface_flat: sweep.surface_flat.clone(),
            surface_less_flat: sweep.surface_less_flat.clone(),
        }
    }

    /// All clouds together with a short name, in emission order
    pub fn named_clouds(&self) -> [(&'static str, &PointCloud<ScanPoint>); 5] {
        [
            ("full", &self.full_scan),
            ("corner_sharp", &self.corner_sharp),
            ("corner_less_sharp", &self.corner_less_sharp),
            ("surface_flat", &self.surface_flat),
            ("surface_less_flat", &self.surface_less_flat),
        ]
    }
}

/// Sink for the clouds of every processed message
pub trait FeaturePublisher {
    fn publish(&mut self, features: &ScanFeatures);
}

impl<F> FeaturePublisher for F
where
    F: FnMut(&ScanFeatures),
{
    fn publish(&mut self, features: &ScanFeatures) {
        self(features)
    }
}

/// Publishes copies of all features into a channel. If the receiving end is gone the features are dropped.
pub struct ChannelPublisher {
    sender: Sender<ScanFeatures>,
}

impl ChannelPublisher {
    pub fn new(sender: Sender<ScanFeatures>) -> Self {
        Self { sender }
    }

    /// Creates a new `ChannelPublisher` together with the receiving end of its channel
    pub fn channel() -> (Self, Receiver<ScanFeatures>) {
        let (sender, receiver) = std::sync::mpsc::channel();
        (Self::new(sender), receiver)
    }
}

impl FeaturePublisher for ChannelPublisher {
    fn publish(&mut self, features: &ScanFeatures) {
        if self.sender.send(features.clone()).is_err() {
            warn!(
                "Dropping features of message at {:.3}s, the receiver has disconnected",
                features.stamp
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_core::nalgebra::Vector3;

    #[test]
    fn test_snapshot_copies_accumulated_clouds() {
        let mut sweep = SweepState::default();
        sweep
            .corner_sharp
            .push(ScanPoint::new(Vector3::new(1.0, 2.0, 3.0), 0.0));
        let full_scan: PointCloud<_> = (0..3)
            .map(|i| ScanPoint::new(Vector3::new(i as f32, 0.0, 1.0), 0.0))
            .collect();

        let features = ScanFeatures::snapshot(4.5, full_scan, &sweep);
        sweep.corner_sharp.clear();

        assert_eq!(4.5, features.stamp);
        assert_eq!(3, features.full_scan.len());
        assert_eq!(1, features.corner_sharp.len());
        assert_eq!("surface_less_flat", features.named_clouds()[4].0);
    }

    #[test]
    fn test_channel_publisher_forwards_features() {
        let (mut publisher, receiver) = ChannelPublisher::channel();
        publisher.publish(&ScanFeatures {
            stamp: 1.0,
            ..Default::default()
        });
        assert_eq!(1.0, receiver.recv().unwrap().stamp);

        drop(receiver);
        // must not panic
        publisher.publish(&ScanFeatures::default());
    }

    #[test]
    fn test_closure_publisher() {
        let mut stamps = vec![];
        {
            let mut publisher = |features: &ScanFeatures| stamps.push(features.stamp);
            publisher.publish(&ScanFeatures {
                stamp: 2.0,
                ..Default::default()
            });
        }
        assert_eq!(vec![2.0], stamps);
    }
}
