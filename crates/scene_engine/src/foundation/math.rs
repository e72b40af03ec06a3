//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene core.
//!
//! Conventions: column vectors, left-handed view space looking down `+Z`,
//! clip-space depth in `[0, 1]`.

pub use nalgebra::{Matrix4, Unit, UnitQuaternion, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Position, rotation and scale triple
///
/// Composition follows scale → rotate → translate, which is the column-vector
/// form `T * R * S`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trs {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Trs {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Trs {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Compose `child` (expressed in this transform's space) into world space
    pub fn combine(&self, child: &Trs) -> Trs {
        Trs {
            position: self.position + self.rotation * self.scale.component_mul(&child.position),
            rotation: self.rotation * child.rotation,
            scale: self.scale.component_mul(&child.scale),
        }
    }

    /// Solve for the local transform that composes with `self` into `world`
    ///
    /// Exact inverse of [`Trs::combine`]. Returns `None` when a scale
    /// component of `self` is too close to zero to divide by.
    pub fn solve_local(&self, world: &Trs) -> Option<Trs> {
        let inv_scale = reciprocal(&self.scale)?;
        let inv_rotation = self.rotation.inverse();
        Some(Trs {
            position: (inv_rotation * (world.position - self.position)).component_mul(&inv_scale),
            rotation: inv_rotation * world.rotation,
            scale: world.scale.component_mul(&inv_scale),
        })
    }

    /// Whether every component is finite
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.rotation.coords.iter().all(|v| v.is_finite())
            && self.scale.iter().all(|v| v.is_finite())
    }
}

/// Component-wise reciprocal, `None` if any component is near zero
pub fn reciprocal(v: &Vec3) -> Option<Vec3> {
    if v.iter().any(|c| c.abs() < f32::EPSILON) {
        return None;
    }
    Some(Vec3::new(1.0 / v.x, 1.0 / v.y, 1.0 / v.z))
}

/// Largest absolute component of a vector
pub fn max_abs_component(v: &Vec3) -> f32 {
    v.x.abs().max(v.y.abs()).max(v.z.abs())
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

/// Extension trait for Mat4 with projection and view helpers
pub trait Mat4Ext {
    /// Left-handed perspective projection, depth mapped to `[0, 1]`
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Left-handed look-at view matrix (view space looks down `+Z`)
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();

        // P = [1/(a·tan(φ/2))  0            0          0         ]
        //     [0               1/tan(φ/2)   0          0         ]
        //     [0               0            f/(f-n)    -nf/(f-n) ]
        //     [0               0            1          0         ]
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (far - near);
        result[(2, 3)] = -(near * far) / (far - near);
        result[(3, 2)] = 1.0;

        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = up.cross(&forward).normalize();
        let camera_up = forward.cross(&right);

        Mat4::new(
            right.x, right.y, right.z, -right.dot(&eye),
            camera_up.x, camera_up.y, camera_up.z, -camera_up.dot(&eye),
            forward.x, forward.y, forward.z, -forward.dot(&eye),
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_combine_then_solve_local_roundtrip() {
        let parent = Trs {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_axis_angle(&Vec3::y_axis(), 0.7),
            scale: Vec3::new(2.0, 1.0, 0.5),
        };
        let local = Trs {
            position: Vec3::new(-1.0, 0.5, 4.0),
            rotation: Quat::from_axis_angle(&Vec3::x_axis(), 0.3),
            scale: Vec3::new(1.0, 3.0, 1.0),
        };

        let world = parent.combine(&local);
        let solved = parent.solve_local(&world).unwrap();

        assert_relative_eq!(solved.position, local.position, epsilon = 1e-4);
        assert_relative_eq!(solved.scale, local.scale, epsilon = 1e-5);
        assert!(solved.rotation.angle_to(&local.rotation) < 1e-4);
    }

    #[test]
    fn test_solve_local_rejects_zero_scale() {
        let parent = Trs {
            scale: Vec3::new(1.0, 0.0, 1.0),
            ..Trs::identity()
        };
        assert!(parent.solve_local(&Trs::identity()).is_none());
    }

    #[test]
    fn test_to_matrix_applies_scale_before_translation() {
        let trs = Trs {
            position: Vec3::new(10.0, 0.0, 0.0),
            rotation: Quat::identity(),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };
        let p = trs.to_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.coords, Vec3::new(12.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_perspective_maps_near_and_far_to_unit_depth() {
        let proj = Mat4::perspective(utils::deg_to_rad(60.0), 1.5, 0.5, 50.0);

        let near = proj * Vec4::new(0.0, 0.0, 0.5, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, 50.0, 1.0);

        assert_relative_eq!(near.z / near.w, 0.0, epsilon = 1e-6);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_deg_to_rad_matches_constants() {
        assert_relative_eq!(utils::deg_to_rad(180.0), constants::PI, epsilon = 1e-6);
        assert_relative_eq!(utils::deg_to_rad(90.0), constants::HALF_PI, epsilon = 1e-6);
    }

    #[test]
    fn test_look_at_moves_target_onto_positive_z() {
        let eye = Vec3::new(0.0, 0.0, -5.0);
        let view = Mat4::look_at(eye, Vec3::zeros(), Vec3::y());
        let p = view.transform_point(&Point3::origin());
        assert_relative_eq!(p.coords, Vec3::new(0.0, 0.0, 5.0), epsilon = 1e-6);
    }
}
