use loam_core::{
    containers::PointCloud,
    math::AABB,
    nalgebra::Point3,
    point::PointType,
};

/// Calculate the bounding box of the points in the given `cloud`. Returns `None` if the cloud contains zero
/// points
///
/// ```
/// # use loam_algorithms::bounds::calculate_bounds;
/// # use loam_core::{containers::PointCloud, point::RawPoint};
/// let cloud: PointCloud<_> = vec![RawPoint::new(1.0, -2.0, 0.0), RawPoint::new(-1.0, 2.0, 0.5)]
///     .into_iter()
///     .collect();
/// let bounds = calculate_bounds(&cloud).unwrap();
/// assert_eq!(*bounds.min(), loam_core::nalgebra::Point3::new(-1.0, -2.0, 0.0));
/// ```
pub fn calculate_bounds<P: PointType>(cloud: &PointCloud<P>) -> Option<AABB<f32>> {
    let mut positions = cloud.positions();
    let first = positions.next()?;
    let mut bounds = AABB::from_point(Point3::from(first));
    for pos in positions {
        bounds.extend_with_point(&Point3::from(pos));
    }
    Some(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_core::point::RawPoint;

    #[test]
    fn test_bounds_of_empty_cloud() {
        assert!(calculate_bounds(&PointCloud::<RawPoint>::new()).is_none());
    }

    #[test]
    fn test_bounds_minimum_lies_below_all_points() {
        let cloud: PointCloud<_> = (0..10)
            .map(|i| RawPoint::new(i as f32, -(i as f32), 0.5 * i as f32))
            .collect();
        let bounds = calculate_bounds(&cloud).unwrap();
        for pos in cloud.positions() {
            assert!(pos.x >= bounds.min().x && pos.y >= bounds.min().y && pos.z >= bounds.min().z);
        }
        assert_eq!(Point3::new(0.0, -9.0, 0.0), *bounds.min());
    }
}
