//! Point lights drawn as light volumes

use std::sync::Arc;

use crate::assets::Mesh;
use crate::bounds::BoundingSphere;
use crate::foundation::math::Vec3;
use crate::render::{GeometryBinding, RenderBackend, Renderable, RenderableKind, ShaderKind};

/// Point light component
///
/// Deferred shading draws each light as its volume mesh scaled by the
/// light radius. Lights sharing a volume mesh are drawn as one group.
#[derive(Debug, Clone)]
pub struct PointLight {
    /// Linear RGB colour
    pub color: Vec3,
    /// Brightness multiplier
    pub intensity: f32,
    /// Influence radius in world units
    pub radius: f32,
    volume: Arc<Mesh>,
}

impl PointLight {
    /// Light using a shared unit-sized volume mesh
    pub fn new(volume: Arc<Mesh>, color: Vec3, intensity: f32, radius: f32) -> Self {
        Self { color, intensity, radius, volume }
    }

    /// Shared volume mesh
    pub fn volume(&self) -> &Arc<Mesh> {
        &self.volume
    }
}

impl Renderable for PointLight {
    fn kind(&self) -> RenderableKind {
        RenderableKind::Light
    }

    fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere::new(Vec3::zeros(), self.radius)
    }

    fn has_finished_loading(&self) -> bool {
        self.volume.has_finished_loading()
    }

    fn bind(&self, backend: &mut dyn RenderBackend) {
        backend.bind_shader(ShaderKind::LightVolume);
        backend.bind_geometry(GeometryBinding {
            label: self.volume.name(),
            index_count: self.volume.index_count(),
        });
    }

    fn draw(&self, backend: &mut dyn RenderBackend) {
        self.volume.draw(backend);
    }
}
