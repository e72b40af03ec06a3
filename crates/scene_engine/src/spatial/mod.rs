//! Spatial partitioning data structures
//!
//! Provides the octree index the scene uses for placement, visibility and
//! proximity queries.

mod octree;

pub use octree::{ChildFit, OctNode, Octree, OctreeEntry, Placement, PlacementReason, ROOT};
