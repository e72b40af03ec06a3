//! Scene graph: entities, transform hierarchy and the per-frame pipeline

mod entity;
mod error;
mod hierarchy;
mod scene_manager;
mod transform;

pub use entity::Entity;
pub use error::{ComponentKind, SceneError, SceneResult};
pub use hierarchy::{TransformHierarchy, TransformStore};
pub use scene_manager::Scene;
pub use transform::Transform;
