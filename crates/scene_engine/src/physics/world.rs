//! Physics world trait and body descriptions

use super::{ContactListener, PhysicsError};
use crate::foundation::collections::EntityId;
use crate::foundation::math::{Quat, Vec3};

/// Opaque handle to a rigid body owned by a physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RigidBodyHandle(pub u32);

/// Initial state of a rigid body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    /// World position
    pub position: Vec3,
    /// World rotation
    pub rotation: Quat,
    /// Linear velocity in units per second
    pub linear_velocity: Vec3,
    /// Angular velocity as a scaled axis, radians per second
    pub angular_velocity: Vec3,
    /// Collision sphere radius
    pub radius: f32,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            linear_velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            radius: 1.0,
        }
    }
}

impl BodyDesc {
    /// Body at rest at a position
    pub fn at(position: Vec3) -> Self {
        Self { position, ..Self::default() }
    }

    /// Builder pattern: Set linear velocity
    pub fn with_linear_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Builder pattern: Set angular velocity
    pub fn with_angular_velocity(mut self, velocity: Vec3) -> Self {
        self.angular_velocity = velocity;
        self
    }

    /// Builder pattern: Set collision radius
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }
}

/// Pose of a body that moved during the last step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    /// Body handle
    pub handle: RigidBodyHandle,
    /// World position after the step
    pub position: Vec3,
    /// World rotation after the step
    pub rotation: Quat,
}

/// Rigid-body simulation the scene delegates to
///
/// Access from outside [`PhysicsWorld::step`] is bracketed by the
/// `mark_for_*` / `unmark_for_*` calls so a world that steps on another
/// thread can guard its state.
pub trait PhysicsWorld {
    /// Create a body that is not yet part of the simulation
    fn create_body(&mut self, desc: BodyDesc) -> RigidBodyHandle;

    /// Advance the simulation
    fn step(&mut self, dt: f32) -> Result<(), PhysicsError>;

    /// Add a body to the simulation and record the entity that owns it
    fn register_body(&mut self, handle: RigidBodyHandle, owner: EntityId) -> Result<(), PhysicsError>;

    /// Remove a body from the simulation
    fn unregister_body(&mut self, handle: RigidBodyHandle) -> Result<(), PhysicsError>;

    /// Entity that owns a registered body
    fn body_owner(&self, handle: RigidBodyHandle) -> Option<EntityId>;

    /// Poses of every registered body in an awake simulation island
    fn active_bodies(&self) -> Result<Vec<BodyState>, PhysicsError>;

    /// Teleport a body
    fn set_body_transform(&mut self, handle: RigidBodyHandle, position: Vec3, rotation: Quat) -> Result<(), PhysicsError>;

    /// Begin a read section
    fn mark_for_read(&self) -> Result<(), PhysicsError>;

    /// End a read section
    fn unmark_for_read(&self);

    /// Begin a write section
    fn mark_for_write(&mut self) -> Result<(), PhysicsError>;

    /// End a write section
    fn unmark_for_write(&mut self);

    /// Number of body pairs currently touching
    fn contact_count(&self) -> usize;

    /// Receive contact begin/end callbacks
    fn add_contact_listener(&mut self, listener: Box<dyn ContactListener>);
}
