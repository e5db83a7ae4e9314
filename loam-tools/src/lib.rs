#![warn(clippy::all)]

/// Reading raw frames from ASCII files
pub mod frames;
/// Writing extracted features to disk
pub mod writer;
