use super::geometry::{Plane, Point3D};

impl Plane {
    /// Perpendicular distance from `point` to the plane.
    ///
    /// The normal is renormalized on every call so that scaled or hand-built
    /// planes measure the same as unit ones. A zero normal gives an infinite
    /// distance.
    pub fn distance_to(&self, point: &Point3D) -> f64 {
        Scorer::new(self).distance_to(point)
    }
}

// Plane with its normal length computed once, for scoring many points.
struct Scorer {
    normal: Point3D,
    d: f64,
    normal_length: f64,
}

impl Scorer {
    fn new(plane: &Plane) -> Scorer {
        Scorer { normal: plane.normal(), d: plane.d, normal_length: plane.normal_length() }
    }

    fn distance_to(&self, point: &Point3D) -> f64 {
        if self.normal_length == 0.0 {
            return f64::INFINITY;
        }
        f64::abs(self.normal.dot(point) + self.d) / self.normal_length
    }
}

/// Distance of every point to `plane`, in input order.
pub fn distances(points: &[Point3D], plane: &Plane) -> Vec<f64> {
    let scorer = Scorer::new(plane);
    points.iter().map(|p| scorer.distance_to(p)).collect()
}

/// Indices of the points whose distance to `plane` is at most `threshold`.
pub fn inliers(points: &[Point3D], plane: &Plane, threshold: f64) -> Vec<usize> {
    let scorer = Scorer::new(plane);
    points.iter()
        .enumerate()
        .filter_map(|(i, p)| if scorer.distance_to(p) <= threshold { Some(i) } else { None })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_points() -> Vec<Point3D> {
        vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(1.0, 2.0, 3.0),
            Point3D::new(-4.0, 0.5, 2.0),
            Point3D::new(10.0, -7.0, 0.25),
        ]
    }

    #[test]
    fn distance_to_horizontal_plane_is_height_difference() {
        let plane = Plane::new(0.0, 0.0, 1.0, -1.0);
        let d = distances(&sample_points(), &plane);
        assert_eq!(d, vec![1.0, 2.0, 1.0, 0.75]);
    }

    #[test]
    fn scaling_the_plane_does_not_change_distances() {
        let plane = Plane::new(0.48, -0.6, 0.64, 1.5);
        let reference = distances(&sample_points(), &plane);
        for k in [2.0, -3.5, 1e-3, 1e6].iter() {
            let scaled = Plane::new(plane.a * k, plane.b * k, plane.c * k, plane.d * k);
            let d = distances(&sample_points(), &scaled);
            for (expected, actual) in reference.iter().zip(d.iter()) {
                assert_relative_eq!(*expected, *actual, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn zero_normal_gives_infinite_distance() {
        let plane = Plane::new(0.0, 0.0, 0.0, 1.0);
        assert!(distances(&sample_points(), &plane).iter().all(|d| d.is_infinite()));
        assert!(inliers(&sample_points(), &plane, 1e9).is_empty());
    }

    #[test]
    fn threshold_is_inclusive() {
        let plane = Plane::new(0.0, 0.0, 1.0, -1.0);
        assert_eq!(inliers(&sample_points(), &plane, 1.0), vec![0, 2, 3]);
        assert_eq!(inliers(&sample_points(), &plane, 0.5), Vec::<usize>::new());
    }

    #[test]
    fn inliers_agree_with_single_point_distances() {
        let plane = Plane::new(0.96, -1.2, 1.28, 3.0);
        let points = sample_points();
        for threshold in [0.0, 0.5, 1.0, 2.5, 10.0].iter() {
            let expected: Vec<usize> = (0..points.len())
                .filter(|&i| plane.distance_to(&points[i]) <= *threshold)
                .collect();
            assert_eq!(inliers(&points, &plane, *threshold), expected);
        }
        let single: Vec<f64> = points.iter().map(|p| plane.distance_to(p)).collect();
        assert_eq!(distances(&points, &plane), single);
    }

    #[test]
    fn no_points_no_distances() {
        let plane = Plane::new(0.0, 0.0, 1.0, 0.0);
        assert!(distances(&[], &plane).is_empty());
    }
}
