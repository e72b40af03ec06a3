//! Per-entity line strips

use crate::bounds::BoundingSphere;
use crate::foundation::math::{Vec3, Vec4};
use crate::render::{GeometryBinding, RenderBackend, Renderable, RenderableKind, ShaderKind};

/// Line strip owned by one entity
#[derive(Debug, Clone, PartialEq)]
pub struct LineRenderer {
    points: Vec<Vec3>,
    color: Vec4,
    bounds: BoundingSphere,
}

impl LineRenderer {
    /// Line strip through `points` in local space
    pub fn new(points: Vec<Vec3>, color: Vec4) -> Self {
        let bounds = BoundingSphere::from_points(&points);
        Self { points, color, bounds }
    }

    /// Strip vertices
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Line colour
    pub fn color(&self) -> Vec4 {
        self.color
    }

    /// Replace the vertices and refresh the bounds
    pub fn set_points(&mut self, points: Vec<Vec3>) {
        self.bounds = BoundingSphere::from_points(&points);
        self.points = points;
    }

    fn vertex_count(&self) -> u32 {
        u32::try_from(self.points.len()).unwrap_or(u32::MAX)
    }
}

impl Renderable for LineRenderer {
    fn kind(&self) -> RenderableKind {
        RenderableKind::Lines
    }

    fn bounding_sphere(&self) -> BoundingSphere {
        self.bounds
    }

    fn bind(&self, backend: &mut dyn RenderBackend) {
        backend.bind_shader(ShaderKind::Lines);
        backend.bind_geometry(GeometryBinding {
            label: "lines",
            index_count: self.vertex_count(),
        });
    }

    fn draw(&self, backend: &mut dyn RenderBackend) {
        backend.draw_lines(self.vertex_count());
    }
}
