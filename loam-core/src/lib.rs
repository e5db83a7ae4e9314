#![warn(clippy::all)]

//! Core data structures for LiDAR scan registration
//!
//! `loam-core` provides the point types that flow through the feature extraction pipeline and a small
//! typed container for them. Raw sensor returns are represented by [RawPoint](crate::point::RawPoint), accepted
//! and axis-remapped returns by [ScanPoint](crate::point::ScanPoint). Both live in a [PointCloud](crate::containers::PointCloud).

pub extern crate nalgebra;
extern crate self as loam_core;

/// Typed point cloud container
pub mod containers;
/// Useful mathematical tools when working with point cloud data
pub mod math;
/// Point types of the registration pipeline
pub mod point;
