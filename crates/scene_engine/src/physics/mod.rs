//! Physics collaborator interface
//!
//! The scene core never integrates bodies itself. It talks to a
//! [`PhysicsWorld`] implementation that owns the rigid bodies, steps them,
//! and reports which ones moved. [`SimplePhysicsWorld`] is a small reference
//! world used by the tests and the demo.

mod contact;
mod simple;
mod world;

pub use contact::{ContactCounter, ContactListener};
pub use simple::SimplePhysicsWorld;
pub use world::{BodyDesc, BodyState, PhysicsWorld, RigidBodyHandle};

use thiserror::Error;

/// Errors reported by a physics world
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhysicsError {
    /// The handle does not name a body of this world
    #[error("Unknown rigid body {0:?}")]
    UnknownBody(RigidBodyHandle),

    /// The body is already part of the simulation
    #[error("Rigid body {0:?} is already registered")]
    AlreadyRegistered(RigidBodyHandle),

    /// A read was attempted while the world is marked for writing, or the
    /// other way round
    #[error("Physics world access conflict: {0}")]
    AccessConflict(&'static str),
}
