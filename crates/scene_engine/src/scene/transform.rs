//! Per-entity transform
//!
//! A [`Transform`] stores the local position/rotation/scale of a node, the
//! derived world values, and the cached world matrix plus its transpose.
//! Parent and child links are arena handles; they never own anything. All
//! mutation that must keep the hierarchy consistent goes through
//! [`super::hierarchy::TransformHierarchy`].

use crate::foundation::collections::EntityId;
use crate::foundation::math::{Mat4, Quat, Trs, Vec3};

/// Hierarchical position/rotation/scale node
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    local: Trs,
    derived: Trs,
    world_matrix: Mat4,
    gpu_matrix: Mat4,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_trs(Trs::identity())
    }
}

impl Transform {
    /// Identity transform with no parent
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform at a position
    pub fn from_position(position: Vec3) -> Self {
        Self::from_trs(Trs::from_position(position))
    }

    /// Transform from a full local position, rotation and scale
    ///
    /// Until the transform is attached to a parent its world values equal
    /// its local values.
    pub fn from_trs(local: Trs) -> Self {
        let mut transform = Self {
            local,
            derived: local,
            world_matrix: Mat4::identity(),
            gpu_matrix: Mat4::identity(),
            parent: None,
            children: Vec::new(),
        };
        transform.derive(None);
        transform
    }

    /// Builder pattern: Set rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.local.rotation = rotation;
        self.derive(None);
        self
    }

    /// Builder pattern: Set scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.local.scale = scale;
        self.derive(None);
        self
    }

    /// Local transform relative to the parent
    pub fn local(&self) -> &Trs {
        &self.local
    }

    /// Derived world transform
    pub fn derived(&self) -> &Trs {
        &self.derived
    }

    /// Local position
    pub fn local_position(&self) -> Vec3 {
        self.local.position
    }

    /// Local rotation
    pub fn local_rotation(&self) -> Quat {
        self.local.rotation
    }

    /// Local scale
    pub fn local_scale(&self) -> Vec3 {
        self.local.scale
    }

    /// World position
    pub fn position(&self) -> Vec3 {
        self.derived.position
    }

    /// World rotation
    pub fn rotation(&self) -> Quat {
        self.derived.rotation
    }

    /// World scale
    pub fn scale(&self) -> Vec3 {
        self.derived.scale
    }

    /// World matrix (column-vector convention, `T * R * S`)
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    /// Transposed world matrix, the layout uploaded to the GPU
    pub fn gpu_matrix(&self) -> &Mat4 {
        &self.gpu_matrix
    }

    /// View matrix for a camera sitting on this transform
    ///
    /// Inverse of the world position and rotation; scale is ignored.
    pub fn view_matrix(&self) -> Mat4 {
        let inverse_rotation = self.derived.rotation.inverse();
        inverse_rotation.to_homogeneous() * Mat4::new_translation(&-self.derived.position)
    }

    /// Parent handle, if any
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Child handles (order is not meaningful)
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    /// Whether every derived component is finite
    pub fn is_finite(&self) -> bool {
        self.derived.is_finite()
    }

    pub(crate) fn local_mut(&mut self) -> &mut Trs {
        &mut self.local
    }

    /// Recompute derived values from the parent's derived transform
    pub(crate) fn derive(&mut self, parent: Option<&Trs>) {
        self.derived = match parent {
            Some(parent) => parent.combine(&self.local),
            None => self.local,
        };
        self.world_matrix = self.derived.to_matrix();
        self.gpu_matrix = self.world_matrix.transpose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point3;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_identity() {
        let transform = Transform::new();

        assert_eq!(transform.position(), Vec3::zeros());
        assert_relative_eq!(transform.rotation(), Quat::identity(), epsilon = 1e-6);
        assert_eq!(transform.scale(), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(*transform.world_matrix(), Mat4::identity());
    }

    #[test]
    fn test_gpu_matrix_is_transpose() {
        let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(Quat::from_axis_angle(&Vec3::z_axis(), 0.4));

        assert_eq!(*transform.gpu_matrix(), transform.world_matrix().transpose());
        // Translation sits in the last row of the uploaded form
        assert_relative_eq!(transform.gpu_matrix()[(3, 0)], 1.0);
        assert_relative_eq!(transform.gpu_matrix()[(3, 2)], 3.0);
    }

    #[test]
    fn test_derive_composes_with_parent() {
        let parent = Trs {
            position: Vec3::new(1.0, 0.0, 0.0),
            rotation: Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2),
            scale: Vec3::new(1.0, 1.0, 1.0),
        };
        let mut child = Transform::from_position(Vec3::new(0.0, 0.0, 1.0));
        child.derive(Some(&parent));

        // (0,0,1) rotated 90 degrees about Y becomes (1,0,0), then offset
        assert_relative_eq!(child.position(), Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_view_matrix_inverts_world() {
        let transform = Transform::from_position(Vec3::new(4.0, -2.0, 7.0))
            .with_rotation(Quat::from_axis_angle(&Vec3::x_axis(), 0.9));

        let p = transform.world_matrix().transform_point(&Point3::new(0.3, 0.2, 5.0));
        let back = transform.view_matrix().transform_point(&p);

        assert_relative_eq!(back.coords, Vec3::new(0.3, 0.2, 5.0), epsilon = 1e-4);
    }
}
