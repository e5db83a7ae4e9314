#![warn(clippy::all)]
//! Feature extraction for LiDAR odometry.
//!
//! Turns the raw, possibly motion-distorted point sweeps of a continuously rotating range sensor into
//! sharp edge and flat surface features for a downstream scan matcher. The entry point is
//! [ScanRegistration](crate::registration::ScanRegistration), which runs the individual stages of this crate
//! for every incoming cloud message.

// Bounding box of a point cloud.
pub mod bounds;
// Curvature scoring, occlusion masking and the region-partitioned greedy feature selection.
pub mod feature_extraction;
// Configuration of the registration pipeline.
pub mod params;
// Validity filtering, axis remapping and motion compensation of raw sensor points.
pub mod preprocessing;
// Hand-off of the extracted feature clouds to whoever consumes them.
pub mod publisher;
// The per-message pipeline that ties all stages together.
pub mod registration;
// Sweep boundary detection and the state that lives for one sweep.
pub mod sweep;
// Voxel grid downsampling.
pub mod voxel_grid;
