//! # Scene Engine
//!
//! Scene-management core of a real-time 3D engine: a transform hierarchy with
//! parent/child inheritance, an octree that tracks movable entities, frustum
//! culling, and a render queue that batches drawable components for a
//! backend.
//!
//! ## Features
//!
//! - **Transform Hierarchy**: eager world-transform propagation with cycle checks
//! - **Octree Spatial Index**: fully pre-built, smallest-containing-octant placement
//! - **Frustum Culling**: plane-based, whole subtrees accepted when inside
//! - **Render Queue**: grouping by shared mesh, one bind per group
//! - **Collaborator Traits**: physics and render backends are pluggable
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use scene_engine::prelude::*;
//!
//! let mut scene = Scene::new(SceneConfig::default()).unwrap();
//!
//! let mut camera = Entity::new("camera");
//! camera.attach_camera(Camera::perspective(1.0, 16.0 / 9.0, 0.1, 500.0).unwrap()).unwrap();
//! let camera = scene.add_entity(camera).unwrap();
//! scene.set_camera(camera).unwrap();
//!
//! let mut rock = Entity::new("rock").with_transform(Transform::from_position(Vec3::new(0.0, 0.0, 20.0)));
//! rock.attach_mesh(Arc::new(Mesh::new("rock", MeshData::unit_cube()))).unwrap();
//! scene.add_entity(rock).unwrap();
//!
//! let mut backend = CommandRecorder::new();
//! let stats = scene.frame(1.0 / 60.0, &mut backend).unwrap();
//! assert_eq!(stats.total_meshes, 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod bounds;
pub mod config;
pub mod foundation;
pub mod physics;
pub mod render;
pub mod scene;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{Mesh, MeshData, MeshLibrary},
        bounds::{Aabb, BoundingSphere, Containment, Frustum, Plane},
        config::{Config, ConfigError, SceneConfig},
        foundation::{
            collections::EntityId,
            math::{Mat4, Mat4Ext, Quat, Trs, Vec3, Vec4},
        },
        physics::{BodyDesc, BodyState, ContactCounter, ContactListener, PhysicsWorld, RigidBodyHandle, SimplePhysicsWorld},
        render::{
            Camera, CommandRecorder, FrameStats, LineRenderer, PointLight, Primitive, RenderBackend, RenderError,
            Renderable, TextLabel,
        },
        scene::{Entity, Scene, SceneError, SceneResult, Transform},
        spatial::{Octree, Placement},
    };
}
