//! Shared triangle meshes
//!
//! A [`Mesh`] is shared between entities through `Arc`. Its payload sits
//! behind a lock so a loader can fill a placeholder after entities already
//! reference it.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::bounds::BoundingSphere;
use crate::foundation::math::Vec3;
use crate::render::{GeometryBinding, RenderBackend, Renderable, RenderableKind, ShaderKind};

/// Geometry payload of a mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Triangle indices
    pub indices: Vec<u32>,
    /// Local bounding sphere of the positions
    pub bounds: BoundingSphere,
}

impl MeshData {
    /// Build mesh data, deriving the bounding sphere from the positions
    pub fn from_positions(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = BoundingSphere::from_points(&positions);
        Self { positions, indices, bounds }
    }

    /// Cube with half-extent 1 centred at the origin
    ///
    /// Encloses the unit sphere, which makes it a conservative light volume.
    pub fn unit_cube() -> Self {
        let positions = (0..8)
            .map(|i| {
                let sign = |bit: usize| if i & bit == 0 { -1.0 } else { 1.0 };
                Vec3::new(sign(1), sign(2), sign(4))
            })
            .collect();
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 1, 2, 3, // -z
            4, 5, 6, 5, 7, 6, // +z
            0, 1, 4, 1, 5, 4, // -y
            2, 6, 3, 3, 6, 7, // +y
            0, 4, 2, 2, 4, 6, // -x
            1, 3, 5, 3, 7, 5, // +x
        ];
        Self::from_positions(positions, indices)
    }

    /// Index count as the backend sees it
    pub fn index_count(&self) -> u32 {
        u32::try_from(self.indices.len()).unwrap_or(u32::MAX)
    }
}

/// Named, shareable mesh that may still be loading
#[derive(Debug)]
pub struct Mesh {
    name: String,
    data: RwLock<Option<MeshData>>,
}

impl Mesh {
    /// Mesh with its data already available
    pub fn new(name: impl Into<String>, data: MeshData) -> Self {
        Self {
            name: name.into(),
            data: RwLock::new(Some(data)),
        }
    }

    /// Mesh whose data will arrive later
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: RwLock::new(None),
        }
    }

    /// Mesh name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fill in (or replace) the payload
    pub fn complete(&self, data: MeshData) {
        *self.write() = Some(data);
        log::debug!("Mesh '{}' finished loading", self.name);
    }

    /// Indices in the loaded payload, zero while loading
    pub fn index_count(&self) -> u32 {
        self.read().as_ref().map_or(0, MeshData::index_count)
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<MeshData>> {
        self.data.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<MeshData>> {
        self.data.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Renderable for Mesh {
    fn kind(&self) -> RenderableKind {
        RenderableKind::Mesh
    }

    fn bounding_sphere(&self) -> BoundingSphere {
        self.read().as_ref().map(|data| data.bounds).unwrap_or_default()
    }

    fn has_finished_loading(&self) -> bool {
        self.read().is_some()
    }

    fn bind(&self, backend: &mut dyn RenderBackend) {
        backend.bind_shader(ShaderKind::Mesh);
        backend.bind_geometry(GeometryBinding {
            label: &self.name,
            index_count: self.index_count(),
        });
    }

    fn draw(&self, backend: &mut dyn RenderBackend) {
        backend.draw_indexed(self.index_count());
    }
}
