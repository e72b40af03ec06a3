//! Drawable components

use super::backend::RenderBackend;
use crate::bounds::BoundingSphere;

/// Which render-queue pass a renderable belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderableKind {
    /// Triangle mesh
    Mesh,
    /// Wireframe primitive
    Primitive,
    /// Line batch
    Lines,
    /// Point light volume
    Light,
}

/// Something the render queue can bind once and draw many times
///
/// `bind` sets up shader and geometry for a whole group; `draw` issues the
/// draw for one instance after its constants were uploaded.
pub trait Renderable {
    /// Pass this renderable is drawn in
    fn kind(&self) -> RenderableKind;

    /// Local-space bounding sphere
    fn bounding_sphere(&self) -> BoundingSphere;

    /// Whether the GPU data is ready; unfinished renderables are skipped
    fn has_finished_loading(&self) -> bool {
        true
    }

    /// Bind shader and geometry
    fn bind(&self, backend: &mut dyn RenderBackend);

    /// Draw one instance
    fn draw(&self, backend: &mut dyn RenderBackend);
}
