//! # Perspective Camera
//!
//! Projection parameters plus the view-space frustum derived from them. The
//! camera has no position of its own: it is a component, and the entity's
//! transform places it in the world.
//!
//! ## Conventions
//! - View space is left-handed and looks down `+Z`
//! - Depth maps to `[0, 1]`
//! - The frustum is cached in view space and moved into world space on demand

use crate::bounds::Frustum;
use crate::foundation::math::{Mat4, Mat4Ext, constants::PI};
use crate::scene::{SceneError, SceneResult, Transform};

/// Perspective camera component
///
/// # Example
/// ```rust
/// use scene_engine::render::Camera;
///
/// let camera = Camera::perspective(60_f32.to_radians(), 16.0 / 9.0, 0.1, 500.0).unwrap();
/// assert!(camera.far() > camera.near());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    projection: Mat4,
    frustum: Frustum,
}

impl Camera {
    /// Create a perspective camera
    ///
    /// # Arguments
    /// * `fov_y` - Vertical field of view in radians, in `(0, PI)`
    /// * `aspect` - Width over height, positive
    /// * `near` - Near plane distance, positive
    /// * `far` - Far plane distance, greater than `near`
    ///
    /// # Errors
    /// `SceneError::InvalidProjection` when the parameters cannot produce an
    /// invertible projection.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> SceneResult<Self> {
        if !(fov_y > 0.0 && fov_y < PI) {
            return Err(SceneError::InvalidProjection(format!("field of view {fov_y} out of range")));
        }
        if !(aspect > 0.0 && aspect.is_finite()) {
            return Err(SceneError::InvalidProjection(format!("aspect ratio {aspect}")));
        }
        if !(near > 0.0 && far > near && far.is_finite()) {
            return Err(SceneError::InvalidProjection(format!("clip range {near}..{far}")));
        }

        let projection = Mat4::perspective(fov_y, aspect, near, far);
        let frustum = Frustum::from_projection(&projection)
            .ok_or_else(|| SceneError::InvalidProjection("projection is not invertible".to_owned()))?;

        Ok(Self { fov_y, aspect, near, far, projection, frustum })
    }

    /// Vertical field of view in radians
    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// Aspect ratio
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Near plane distance
    pub fn near(&self) -> f32 {
        self.near
    }

    /// Far plane distance
    pub fn far(&self) -> f32 {
        self.far
    }

    /// Projection matrix
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Frustum in view space
    pub fn local_frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Frustum placed by the camera entity's world transform
    pub fn world_frustum(&self, transform: &Transform) -> Frustum {
        self.frustum.transformed(&transform.rotation(), &transform.position())
    }

    /// Projection times view for a camera on `transform`
    pub fn view_projection(&self, transform: &Transform) -> Mat4 {
        self.projection * transform.view_matrix()
    }

    /// Change the aspect ratio, rebuilding projection and frustum
    ///
    /// # Errors
    /// Same as [`Camera::perspective`].
    pub fn set_aspect(&mut self, aspect: f32) -> SceneResult<()> {
        *self = Self::perspective(self.fov_y, aspect, self.near, self.far)?;
        Ok(())
    }
}
