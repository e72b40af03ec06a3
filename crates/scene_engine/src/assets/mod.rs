//! Shared geometry assets
//!
//! File loading is out of scope; a loader hands finished [`MeshData`] to the
//! [`MeshLibrary`], which swaps it into any placeholder already in use.

mod library;
mod mesh;

pub use library::MeshLibrary;
pub use mesh::{Mesh, MeshData};
