//! View frustum and plane math for visibility culling

use super::{Aabb, BoundingSphere, Containment};
use crate::foundation::math::{Mat4, Quat, Vec3, Vec4};

/// Plane defined by normal and distance from origin
///
/// Points with a positive signed distance lie on the side the normal points
/// to. Frustum planes point inward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized)
    pub normal: Vec3,
    /// Distance term: `normal · p + distance = 0` on the plane
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance, normalizing both
    pub fn new(normal: Vec3, distance: f32) -> Self {
        let length = normal.magnitude();
        if length <= f32::EPSILON {
            return Self { normal, distance };
        }
        Self {
            normal: normal / length,
            distance: distance / length,
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }

    /// Re-express the plane after rotating then translating its space
    ///
    /// The normal is rotated; the distance term is recomputed from the new
    /// normal and the translation.
    pub fn transformed(&self, rotation: &Quat, translation: &Vec3) -> Plane {
        let normal = rotation * self.normal;
        Plane {
            normal,
            distance: self.distance - normal.dot(translation),
        }
    }
}

/// Index of each plane in [`Frustum::planes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumPlane {
    /// Near clipping plane
    Near = 0,
    /// Far clipping plane
    Far = 1,
    /// Right side
    Right = 2,
    /// Left side
    Left = 3,
    /// Top side
    Top = 4,
    /// Bottom side
    Bottom = 5,
}

/// Frustum for visibility culling
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Six inward-facing planes: near, far, right, left, top, bottom
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Build the view-space frustum of a projection matrix
    ///
    /// Six homogeneous clip-space points (the right, left, top and bottom
    /// edges of the far plane plus the near and far centres) are taken back
    /// through the inverse projection. Their slopes and depths define the
    /// planes. Returns `None` if the projection cannot be inverted.
    pub fn from_projection(projection: &Mat4) -> Option<Self> {
        let inverse = projection.try_inverse()?;

        let unproject = |clip: Vec4| -> Option<Vec3> {
            let v = inverse * clip;
            if v.w.abs() <= f32::EPSILON {
                return None;
            }
            Some(v.xyz() / v.w)
        };

        let right = unproject(Vec4::new(1.0, 0.0, 1.0, 1.0))?;
        let left = unproject(Vec4::new(-1.0, 0.0, 1.0, 1.0))?;
        let top = unproject(Vec4::new(0.0, 1.0, 1.0, 1.0))?;
        let bottom = unproject(Vec4::new(0.0, -1.0, 1.0, 1.0))?;
        let near = unproject(Vec4::new(0.0, 0.0, 0.0, 1.0))?;
        let far = unproject(Vec4::new(0.0, 0.0, 1.0, 1.0))?;

        let right_slope = right.x / right.z;
        let left_slope = left.x / left.z;
        let top_slope = top.y / top.z;
        let bottom_slope = bottom.y / bottom.z;

        let planes = [
            Plane::new(Vec3::new(0.0, 0.0, 1.0), -near.z),
            Plane::new(Vec3::new(0.0, 0.0, -1.0), far.z),
            Plane::new(Vec3::new(-1.0, 0.0, right_slope), 0.0),
            Plane::new(Vec3::new(1.0, 0.0, -left_slope), 0.0),
            Plane::new(Vec3::new(0.0, -1.0, top_slope), 0.0),
            Plane::new(Vec3::new(0.0, 1.0, -bottom_slope), 0.0),
        ];

        if planes.iter().any(|p| !p.distance.is_finite() || !p.normal.iter().all(|c| c.is_finite())) {
            return None;
        }

        Some(Self { planes })
    }

    /// Move this frustum by a rotation followed by a translation
    pub fn transformed(&self, rotation: &Quat, translation: &Vec3) -> Frustum {
        Frustum {
            planes: self.planes.map(|p| p.transformed(rotation, translation)),
        }
    }

    /// Get a single plane
    pub fn plane(&self, which: FrustumPlane) -> &Plane {
        &self.planes[which as usize]
    }

    /// Classify a sphere against the frustum
    ///
    /// `Outside` as soon as one plane fully excludes it, `Inside` only when
    /// all six planes fully include it.
    pub fn intersect_sphere(&self, sphere: &BoundingSphere) -> Containment {
        let mut result = Containment::Inside;
        for plane in &self.planes {
            let distance = plane.distance_to_point(sphere.center);
            if distance < -sphere.radius {
                return Containment::Outside;
            }
            if distance < sphere.radius {
                result = Containment::Intersecting;
            }
        }
        result
    }

    /// Classify an AABB against the frustum
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Containment {
        let mut result = Containment::Inside;
        for plane in &self.planes {
            // Corner furthest along the normal, and the one opposite it
            let mut positive = aabb.min;
            let mut negative = aabb.max;
            if plane.normal.x >= 0.0 {
                positive.x = aabb.max.x;
                negative.x = aabb.min.x;
            }
            if plane.normal.y >= 0.0 {
                positive.y = aabb.max.y;
                negative.y = aabb.min.y;
            }
            if plane.normal.z >= 0.0 {
                positive.z = aabb.max.z;
                negative.z = aabb.min.z;
            }

            if plane.distance_to_point(positive) < 0.0 {
                return Containment::Outside;
            }
            if plane.distance_to_point(negative) < 0.0 {
                result = Containment::Intersecting;
            }
        }
        result
    }
}
