//! Bounding sphere

use super::Containment;
use crate::foundation::math::{max_abs_component, Mat4, Point3, Vec3};

/// A bounding sphere for culling and spatial placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::new(Vec3::zeros(), 0.0)
    }
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Smallest sphere enclosing both `a` and `b`
    ///
    /// If one sphere already contains the other the larger one is returned
    /// unchanged. Otherwise the result's diameter runs from the far side of
    /// `a` to the far side of `b`, which is exact for two spheres.
    pub fn merge(a: &BoundingSphere, b: &BoundingSphere) -> BoundingSphere {
        let offset = b.center - a.center;
        let distance = offset.magnitude();

        if a.radius - b.radius >= distance {
            return *a;
        }
        if b.radius - a.radius >= distance {
            return *b;
        }

        // Only reachable through rounding: centres coincide but neither
        // radius test passed
        if distance <= f32::EPSILON {
            return BoundingSphere::new(a.center, a.radius.max(b.radius) + distance);
        }

        let radius = (a.radius + distance + b.radius) * 0.5;
        let center = a.center + offset * ((radius - a.radius) / distance);
        BoundingSphere::new(center, radius)
    }

    /// Approximate bounding sphere of a point cloud
    ///
    /// Seeds the sphere with the most separated pair among the x/y/z extreme
    /// points, then grows it to swallow any point left outside. Not minimal,
    /// but never misses a point. Empty input gives a zero sphere at the
    /// origin; a single point gives a zero-radius sphere on that point.
    pub fn from_points(points: &[Vec3]) -> BoundingSphere {
        let Some(first) = points.first() else {
            return BoundingSphere::default();
        };

        let mut min_x = *first;
        let mut max_x = *first;
        let mut min_y = *first;
        let mut max_y = *first;
        let mut min_z = *first;
        let mut max_z = *first;

        for p in &points[1..] {
            if p.x < min_x.x {
                min_x = *p;
            }
            if p.x > max_x.x {
                max_x = *p;
            }
            if p.y < min_y.y {
                min_y = *p;
            }
            if p.y > max_y.y {
                max_y = *p;
            }
            if p.z < min_z.z {
                min_z = *p;
            }
            if p.z > max_z.z {
                max_z = *p;
            }
        }

        let pairs = [(min_x, max_x), (min_y, max_y), (min_z, max_z)];
        let (lo, hi) = pairs
            .iter()
            .copied()
            .max_by(|a, b| {
                (a.1 - a.0)
                    .magnitude_squared()
                    .total_cmp(&(b.1 - b.0).magnitude_squared())
            })
            .unwrap_or((*first, *first));

        let mut center = (lo + hi) * 0.5;
        let mut radius = (hi - lo).magnitude() * 0.5;

        for p in points {
            let distance = (p - center).magnitude();
            if distance > radius {
                let grown = (radius + distance) * 0.5;
                center += (p - center) * ((grown - radius) / distance);
                radius = grown;
            }
        }

        BoundingSphere::new(center, radius)
    }

    /// Move this local-space sphere into world space
    ///
    /// The radius grows by the largest absolute scale factor so non-uniform
    /// scale stays conservative.
    pub fn transformed(&self, world: &Mat4, world_scale: &Vec3) -> BoundingSphere {
        let center = world.transform_point(&Point3::from(self.center)).coords;
        BoundingSphere::new(center, self.radius * max_abs_component(world_scale))
    }

    /// Check if this sphere contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        (point - self.center).magnitude_squared() <= self.radius * self.radius
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }

    /// Classify `other` against this sphere
    pub fn intersect_sphere(&self, other: &BoundingSphere) -> Containment {
        let distance = (self.center - other.center).magnitude();
        if distance > self.radius + other.radius {
            Containment::Outside
        } else if distance + other.radius <= self.radius {
            Containment::Inside
        } else {
            Containment::Intersecting
        }
    }

    /// Whether every component is finite
    pub fn is_finite(&self) -> bool {
        self.radius.is_finite() && self.center.iter().all(|c| c.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_merge_contained_returns_larger() {
        let big = BoundingSphere::new(Vec3::zeros(), 10.0);
        let small = BoundingSphere::new(Vec3::new(2.0, 0.0, 0.0), 1.0);

        assert_eq!(BoundingSphere::merge(&big, &small), big);
        assert_eq!(BoundingSphere::merge(&small, &big), big);
    }

    #[test]
    fn test_merge_disjoint_spans_both() {
        let a = BoundingSphere::new(Vec3::new(-5.0, 0.0, 0.0), 1.0);
        let b = BoundingSphere::new(Vec3::new(5.0, 0.0, 0.0), 2.0);

        let merged = BoundingSphere::merge(&a, &b);

        // Diameter spans from x = -6 to x = 7
        assert_relative_eq!(merged.radius, 6.5, epsilon = 1e-5);
        assert_relative_eq!(merged.center, Vec3::new(0.5, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_from_points_degenerate_inputs() {
        let empty = BoundingSphere::from_points(&[]);
        assert_eq!(empty.radius, 0.0);

        let single = BoundingSphere::from_points(&[Vec3::new(3.0, 4.0, 5.0)]);
        assert_eq!(single.center, Vec3::new(3.0, 4.0, 5.0));
        assert_eq!(single.radius, 0.0);

        let same = BoundingSphere::from_points(&[Vec3::new(1.0, 1.0, 1.0); 4]);
        assert!(same.is_finite());
        assert_eq!(same.radius, 0.0);
    }

    #[test]
    fn test_from_points_contains_every_point() {
        let points: Vec<Vec3> = (0..64)
            .map(|i| {
                let t = i as f32 * 0.37;
                Vec3::new(t.sin() * 4.0, (t * 1.7).cos() * 2.0, t * 0.1 - 3.0)
            })
            .collect();

        let sphere = BoundingSphere::from_points(&points);
        for p in &points {
            assert!((p - sphere.center).magnitude() <= sphere.radius + 1e-4);
        }
    }

    #[test]
    fn test_intersect_sphere() {
        let a = BoundingSphere::new(Vec3::zeros(), 5.0);

        assert_eq!(a.intersect_sphere(&BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 1.0)), Containment::Inside);
        assert_eq!(a.intersect_sphere(&BoundingSphere::new(Vec3::new(5.0, 0.0, 0.0), 1.0)), Containment::Intersecting);
        assert_eq!(a.intersect_sphere(&BoundingSphere::new(Vec3::new(10.0, 0.0, 0.0), 1.0)), Containment::Outside);
    }

    #[test]
    fn test_transformed_uses_largest_scale() {
        let local = BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 2.0);
        let scale = Vec3::new(1.0, -3.0, 2.0);
        let world = Mat4::new_translation(&Vec3::new(0.0, 10.0, 0.0)) * Mat4::new_nonuniform_scaling(&scale);

        let moved = local.transformed(&world, &scale);

        assert_relative_eq!(moved.center, Vec3::new(1.0, 10.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(moved.radius, 6.0, epsilon = 1e-6);
    }
}
