use std::iter::FromIterator;
use std::ops::Index;

use nalgebra::Vector3;

use crate::point::PointType;

/// Ordered, contiguous storage for points of a single `PointType`. Points keep the order in which they were pushed.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud<P: PointType> {
    points: Vec<P>,
}

impl<P: PointType> PointCloud<P> {
    /// Creates a new empty `PointCloud`
    /// ```
    /// # use loam_core::{containers::PointCloud, point::RawPoint};
    /// let cloud = PointCloud::<RawPoint>::new();
    /// assert!(cloud.is_empty());
    /// ```
    pub fn new() -> Self {
        Self { points: vec![] }
    }

    /// Creates a new empty `PointCloud` with space for `capacity` points
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Appends a single point to the end of this `PointCloud`
    pub fn push(&mut self, point: P) {
        self.points.push(point);
    }

    /// Appends all points of `other` to the end of this `PointCloud`, keeping their order
    /// ```
    /// # use loam_core::{containers::PointCloud, point::RawPoint};
    /// let mut a: PointCloud<_> = vec![RawPoint::new(1.0, 0.0, 0.0)].into_iter().collect();
    /// let b: PointCloud<_> = vec![RawPoint::new(2.0, 0.0, 0.0)].into_iter().collect();
    /// a.extend_from_cloud(&b);
    /// assert_eq!(2, a.len());
    /// assert_eq!(RawPoint::new(2.0, 0.0, 0.0), *a.at(1));
    /// ```
    pub fn extend_from_cloud(&mut self, other: &PointCloud<P>) {
        self.points.extend_from_slice(&other.points);
    }

    /// Removes all points
    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the point at `index`
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds
    pub fn at(&self, index: usize) -> &P {
        &self.points[index]
    }

    /// Returns the first point, if any
    pub fn first(&self) -> Option<&P> {
        self.points.first()
    }

    /// Returns the last point, if any
    pub fn last(&self) -> Option<&P> {
        self.points.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, P> {
        self.points.iter()
    }

    /// Iterator over the positions of all points in this `PointCloud`
    pub fn positions(&self) -> impl Iterator<Item = Vector3<f32>> + '_ {
        self.points.iter().map(|p| p.position())
    }
}

impl<P: PointType + bytemuck::Pod> PointCloud<P> {
    /// View the memory of all points as raw bytes, in native endianness
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.points)
    }
}

impl<P: PointType> Default for PointCloud<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PointType> Index<usize> for PointCloud<P> {
    type Output = P;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<P: PointType> FromIterator<P> for PointCloud<P> {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<P: PointType> Extend<P> for PointCloud<P> {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        self.points.extend(iter);
    }
}

impl<P: PointType> From<Vec<P>> for PointCloud<P> {
    fn from(points: Vec<P>) -> Self {
        Self { points }
    }
}

impl<P: PointType> IntoIterator for PointCloud<P> {
    type Item = P;
    type IntoIter = std::vec::IntoIter<P>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a, P: PointType> IntoIterator for &'a PointCloud<P> {
    type Item = &'a P;
    type IntoIter = std::slice::Iter<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
