//! Rendering front end
//!
//! The scene hands the render queue the entities that survived culling. The
//! queue groups them by shared renderable and drives a [`RenderBackend`],
//! binding each group once and uploading per-instance constants for every
//! member.

mod backend;
mod constants;
pub mod primitives;
mod recorder;
mod render_queue;
mod renderable;

pub use backend::{GeometryBinding, RenderBackend, ShaderKind};
pub use constants::{InstanceConstants, LightConstants};
pub use primitives::{Camera, LineRenderer, PointLight, Primitive, PrimitiveShape, TextLabel};
pub use recorder::{CommandRecorder, RecorderStats, RenderCommand};
pub use render_queue::{FrameStats, RenderQueue};
pub use renderable::{Renderable, RenderableKind};

use thiserror::Error;

use crate::foundation::collections::EntityId;

/// Rendering error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// No camera entity has been set on the scene
    #[error("No camera set; cannot sort renderables")]
    MissingCamera,

    /// The camera entity is gone or carries no camera component
    #[error("Entity {0:?} has no camera component")]
    CameraNotAttached(EntityId),
}
