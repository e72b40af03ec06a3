//! Wireframe debug primitives

use crate::bounds::BoundingSphere;
use crate::foundation::math::{Vec3, Vec4};
use crate::render::{GeometryBinding, RenderBackend, Renderable, RenderableKind, ShaderKind};

/// Segments per circle of the wire sphere
const SPHERE_SEGMENTS: u32 = 16;

/// Shape of a wireframe primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimitiveShape {
    /// Box with the given half extents
    Box {
        /// Half size on each axis
        half_extents: Vec3,
    },
    /// Three great circles
    Sphere {
        /// Sphere radius
        radius: f32,
    },
}

/// Shared wireframe shape, typically used to visualise bounds
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    shape: PrimitiveShape,
    color: Vec4,
    label: String,
}

impl Primitive {
    /// Wire box
    pub fn wire_box(half_extents: Vec3) -> Self {
        Self::new(PrimitiveShape::Box { half_extents })
    }

    /// Wire sphere
    pub fn wire_sphere(radius: f32) -> Self {
        Self::new(PrimitiveShape::Sphere { radius })
    }

    fn new(shape: PrimitiveShape) -> Self {
        let label = match shape {
            PrimitiveShape::Box { .. } => "primitive/box",
            PrimitiveShape::Sphere { .. } => "primitive/sphere",
        };
        Self {
            shape,
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            label: label.to_owned(),
        }
    }

    /// Builder pattern: Set line colour
    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    /// Shape
    pub fn shape(&self) -> PrimitiveShape {
        self.shape
    }

    /// Line colour
    pub fn color(&self) -> Vec4 {
        self.color
    }

    /// Line-list indices the shape needs
    pub fn index_count(&self) -> u32 {
        match self.shape {
            // 12 edges
            PrimitiveShape::Box { .. } => 24,
            PrimitiveShape::Sphere { .. } => 3 * SPHERE_SEGMENTS * 2,
        }
    }
}

impl Renderable for Primitive {
    fn kind(&self) -> RenderableKind {
        RenderableKind::Primitive
    }

    fn bounding_sphere(&self) -> BoundingSphere {
        let radius = match self.shape {
            PrimitiveShape::Box { half_extents } => half_extents.magnitude(),
            PrimitiveShape::Sphere { radius } => radius,
        };
        BoundingSphere::new(Vec3::zeros(), radius)
    }

    fn bind(&self, backend: &mut dyn RenderBackend) {
        backend.bind_shader(ShaderKind::Wireframe);
        backend.bind_geometry(GeometryBinding {
            label: &self.label,
            index_count: self.index_count(),
        });
    }

    fn draw(&self, backend: &mut dyn RenderBackend) {
        backend.draw_indexed(self.index_count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_box_bounds_reach_corners() {
        let primitive = Primitive::wire_box(Vec3::new(1.0, 2.0, 2.0));
        assert_relative_eq!(primitive.bounding_sphere().radius, 3.0);
        assert_eq!(primitive.index_count(), 24);
    }
}
