//! Rendering collaborator interface
//!
//! The render queue decides what to draw and in which order; a
//! [`RenderBackend`] turns those decisions into GPU work. The core never
//! touches a device itself.

use super::constants::{InstanceConstants, LightConstants};

/// Shader program families the queue asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Lit, filled triangle meshes
    Mesh,
    /// Wireframe debug primitives
    Wireframe,
    /// Line strips
    Lines,
    /// Deferred point-light volumes
    LightVolume,
    /// Screen-facing text
    Text,
}

/// Geometry a renderable asks the backend to bind
///
/// `label` identifies the shared resource to the backend; `index_count` is
/// what a following indexed draw will consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryBinding<'a> {
    /// Resource name
    pub label: &'a str,
    /// Indices (or vertices for line geometry) in the bound buffer
    pub index_count: u32,
}

/// Receives draw commands from the render queue
pub trait RenderBackend {
    /// Switch shader program
    fn bind_shader(&mut self, shader: ShaderKind);

    /// Bind vertex/index buffers
    fn bind_geometry(&mut self, geometry: GeometryBinding<'_>);

    /// Upload per-draw constants for the next draw
    fn upload_instance(&mut self, constants: &InstanceConstants);

    /// Upload light parameters for the next light-volume draw
    fn upload_light(&mut self, constants: &LightConstants);

    /// Issue an indexed triangle (or wireframe) draw
    fn draw_indexed(&mut self, index_count: u32);

    /// Issue a line draw
    fn draw_lines(&mut self, vertex_count: u32);

    /// Draw a text string placed by the given constants
    fn draw_text(&mut self, text: &str, constants: &InstanceConstants);
}
