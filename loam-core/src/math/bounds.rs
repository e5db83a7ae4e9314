use nalgebra::{Point3, Scalar};

/// 3D axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB<T: Scalar + PartialOrd> {
    min: Point3<T>,
    max: Point3<T>,
}

impl<T: Scalar + PartialOrd + Copy> AABB<T> {
    /// Creates an AABB with zero extent that contains exactly the given point
    /// ```
    /// # use loam_core::math::AABB;
    /// let bounds = AABB::from_point(nalgebra::Point3::new(1.0, 2.0, 3.0));
    /// assert_eq!(*bounds.min(), nalgebra::Point3::new(1.0, 2.0, 3.0));
    /// ```
    pub fn from_point(point: Point3<T>) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Returns the minimum point of this AABB
    pub fn min(&self) -> &Point3<T> {
        &self.min
    }

    /// Grows this AABB in place so that it contains the given point.
    /// ```
    /// # use loam_core::math::AABB;
    /// let mut bounds = AABB::from_point(nalgebra::Point3::new(0.0, 0.0, 0.0));
    /// bounds.extend_with_point(&nalgebra::Point3::new(2.0, -1.0, 1.0));
    /// assert_eq!(*bounds.min(), nalgebra::Point3::new(0.0, -1.0, 0.0));
    /// ```
    pub fn extend_with_point(&mut self, point: &Point3<T>) {
        for axis in 0..3 {
            if point[axis] < self.min[axis] {
                self.min[axis] = point[axis];
            }
            if point[axis] > self.max[axis] {
                self.max[axis] = point[axis];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_keeps_componentwise_minimum() {
        let mut bounds = AABB::from_point(Point3::new(1.0f32, 1.0, 1.0));
        bounds.extend_with_point(&Point3::new(-1.0, 3.0, 0.5));
        bounds.extend_with_point(&Point3::new(0.0, -2.0, 4.0));
        assert_eq!(Point3::new(-1.0, -2.0, 0.5), *bounds.min());
    }

    #[test]
    fn test_extend_with_inner_point_changes_nothing() {
        let mut bounds = AABB::from_point(Point3::new(0.0f32, 0.0, 0.0));
        bounds.extend_with_point(&Point3::new(2.0, 2.0, 2.0));
        let before = bounds;
        bounds.extend_with_point(&Point3::new(1.0, 0.5, 2.0));
        assert_eq!(before, bounds);
    }
}
