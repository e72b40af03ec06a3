//! Scene error types

use thiserror::Error;

use crate::foundation::collections::EntityId;
use crate::physics::PhysicsError;
use crate::render::RenderError;

/// Kinds of component an entity can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Shared mesh
    Mesh,
    /// Shared wireframe primitive
    Primitive,
    /// Point light
    Light,
    /// Line batch
    Lines,
    /// Camera
    Camera,
    /// Text label
    Text,
    /// Rigid body handle
    RigidBody,
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Mesh => "mesh",
            Self::Primitive => "primitive",
            Self::Light => "light",
            Self::Lines => "line renderer",
            Self::Camera => "camera",
            Self::Text => "text label",
            Self::RigidBody => "rigid body",
        };
        f.write_str(name)
    }
}

/// Errors raised by scene, entity and transform operations
///
/// These are precondition violations: the operation is refused and the
/// previous state is left untouched (except for `NonFiniteTransform`, which
/// reports corruption already present in the hierarchy).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// The entity handle does not refer to a live entity
    #[error("Entity {0:?} not found")]
    EntityNotFound(EntityId),

    /// A transform was asked to become its own parent
    #[error("Entity {0:?} cannot be its own parent")]
    SelfParenting(EntityId),

    /// The requested parent is a descendant of the child
    #[error("Parenting {child:?} under {parent:?} would create a cycle")]
    CyclicParenting {
        /// Node being re-parented
        child: EntityId,
        /// Requested parent
        parent: EntityId,
    },

    /// A component slot is already occupied
    #[error("A {0} is already attached")]
    ComponentAlreadyAttached(ComponentKind),

    /// A component slot is empty
    #[error("No {0} is attached")]
    ComponentNotAttached(ComponentKind),

    /// The entity already belongs to a scene
    #[error("Entity already belongs to a scene (scene id {0})")]
    AlreadyInScene(u32),

    /// NaN or infinity appeared in a derived transform
    #[error("Non-finite transform on entity {0:?}")]
    NonFiniteTransform(EntityId),

    /// A world-space value cannot be back-solved through a zero parent scale
    #[error("Parent of entity {0:?} has a zero scale component")]
    DegenerateParentScale(EntityId),

    /// Camera parameters that do not produce an invertible projection
    #[error("Invalid projection: {0}")]
    InvalidProjection(String),

    /// The physics collaborator refused an operation
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    /// Rendering the frame failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// Result alias for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
