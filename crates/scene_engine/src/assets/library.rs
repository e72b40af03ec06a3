//! Mesh library with placeholder hand-out

use std::collections::HashMap;
use std::sync::Arc;

use super::mesh::{Mesh, MeshData};

/// Cache of shared meshes by name
///
/// Requesting a mesh that has not been loaded returns a placeholder that
/// entities can hold right away. When the data arrives the placeholder is
/// filled in place, so every holder sees the loaded mesh.
#[derive(Debug, Default)]
pub struct MeshLibrary {
    meshes: HashMap<String, Arc<Mesh>>,
}

impl MeshLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared mesh for `name`, a placeholder if it is not loaded yet
    pub fn request(&mut self, name: &str) -> Arc<Mesh> {
        Arc::clone(self.meshes.entry(name.to_owned()).or_insert_with(|| {
            log::debug!("Mesh '{}' requested before load, handing out placeholder", name);
            Arc::new(Mesh::placeholder(name))
        }))
    }

    /// Register loaded data for `name`, filling any placeholder
    pub fn complete(&mut self, name: &str, data: MeshData) -> Arc<Mesh> {
        match self.meshes.get(name) {
            Some(mesh) => {
                mesh.complete(data);
                Arc::clone(mesh)
            }
            None => {
                let mesh = Arc::new(Mesh::new(name, data));
                self.meshes.insert(name.to_owned(), Arc::clone(&mesh));
                mesh
            }
        }
    }

    /// Look up without creating a placeholder
    pub fn get(&self, name: &str) -> Option<Arc<Mesh>> {
        self.meshes.get(name).cloned()
    }

    /// Number of meshes known, loaded or not
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Names of meshes still waiting for data
    pub fn pending(&self) -> Vec<&str> {
        use crate::render::Renderable;
        self.meshes
            .iter()
            .filter(|(_, mesh)| !mesh.has_finished_loading())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
