//! Recording backend
//!
//! [`CommandRecorder`] stores every command it receives instead of talking to
//! a GPU. Tests inspect the recorded stream; the headless demo uses it as its
//! only backend.

use super::backend::{GeometryBinding, RenderBackend, ShaderKind};
use super::constants::{InstanceConstants, LightConstants};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// Shader switch
    BindShader(ShaderKind),
    /// Geometry bind
    BindGeometry {
        /// Resource name
        label: String,
        /// Index count of the bound buffer
        index_count: u32,
    },
    /// Per-instance upload
    UploadInstance(InstanceConstants),
    /// Light parameter upload
    UploadLight(LightConstants),
    /// Indexed draw
    DrawIndexed(u32),
    /// Line draw
    DrawLines(u32),
    /// Text draw
    DrawText(String),
}

/// Counters over the recorded stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecorderStats {
    /// Shader binds
    pub shader_binds: usize,
    /// Geometry binds
    pub geometry_binds: usize,
    /// Instance and light uploads
    pub uploads: usize,
    /// Draw calls of any kind
    pub draws: usize,
    /// Bytes of constant data uploaded
    pub uploaded_bytes: usize,
}

/// Backend that records instead of rendering
#[derive(Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<RenderCommand>,
    stats: RecorderStats,
}

impl CommandRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded commands in submission order
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Counters since the last clear
    pub fn stats(&self) -> RecorderStats {
        self.stats
    }

    /// Drop everything recorded so far
    pub fn clear(&mut self) {
        self.commands.clear();
        self.stats = RecorderStats::default();
    }

    /// Number of times a shader was bound
    pub fn shader_bind_count(&self, shader: ShaderKind) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::BindShader(s) if *s == shader))
            .count()
    }

    /// Number of indexed draws
    pub fn indexed_draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawIndexed(_)))
            .count()
    }

    /// Number of instance uploads
    pub fn instance_upload_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::UploadInstance(_)))
            .count()
    }
}

impl RenderBackend for CommandRecorder {
    fn bind_shader(&mut self, shader: ShaderKind) {
        self.stats.shader_binds += 1;
        self.commands.push(RenderCommand::BindShader(shader));
    }

    fn bind_geometry(&mut self, geometry: GeometryBinding<'_>) {
        self.stats.geometry_binds += 1;
        self.commands.push(RenderCommand::BindGeometry {
            label: geometry.label.to_owned(),
            index_count: geometry.index_count,
        });
    }

    fn upload_instance(&mut self, constants: &InstanceConstants) {
        self.stats.uploads += 1;
        self.stats.uploaded_bytes += constants.as_bytes().len();
        self.commands.push(RenderCommand::UploadInstance(*constants));
    }

    fn upload_light(&mut self, constants: &LightConstants) {
        self.stats.uploads += 1;
        self.stats.uploaded_bytes += constants.as_bytes().len();
        self.commands.push(RenderCommand::UploadLight(*constants));
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.stats.draws += 1;
        self.commands.push(RenderCommand::DrawIndexed(index_count));
    }

    fn draw_lines(&mut self, vertex_count: u32) {
        self.stats.draws += 1;
        self.commands.push(RenderCommand::DrawLines(vertex_count));
    }

    fn draw_text(&mut self, text: &str, constants: &InstanceConstants) {
        self.stats.uploads += 1;
        self.stats.uploaded_bytes += constants.as_bytes().len();
        self.stats.draws += 1;
        self.commands.push(RenderCommand::DrawText(text.to_owned()));
    }
}
