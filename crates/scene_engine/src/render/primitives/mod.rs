//! Components an entity can carry for rendering
//!
//! Meshes live in [`crate::assets`]; everything else an entity can draw or
//! look through is here.

mod camera;
mod light;
mod lines;
mod primitive;
mod text;

pub use camera::Camera;
pub use light::PointLight;
pub use lines::LineRenderer;
pub use primitive::{Primitive, PrimitiveShape};
pub use text::TextLabel;
