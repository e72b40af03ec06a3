//! Scene - owner of entities, transforms, the octree and the render queue
//!
//! Per frame the scene:
//! 1. Steps the physics world and copies moved bodies into entity transforms
//! 2. Propagates derived transforms to children
//! 3. Re-homes every entity whose world volume changed in the octree
//! 4. Culls against the camera frustum and drives the render queue

use std::collections::HashMap;

use super::entity::Entity;
use super::error::{ComponentKind, SceneError, SceneResult};
use super::hierarchy::TransformHierarchy;
use crate::config::{ConfigError, SceneConfig};
use crate::foundation::collections::{swap_remove_item, EntityId, SlotMap};
use crate::foundation::math::{Quat, Trs, Vec3};
use crate::physics::{PhysicsWorld, RigidBodyHandle};
use crate::render::{FrameStats, RenderBackend, RenderError, RenderQueue};
use crate::spatial::{Octree, Placement};

/// Scene graph with spatial index and render front end
pub struct Scene {
    config: SceneConfig,
    entities: SlotMap<EntityId, Entity>,
    hierarchy: TransformHierarchy,
    octree: Octree,
    physics: Option<Box<dyn PhysicsWorld>>,
    camera: Option<EntityId>,
    render_queue: RenderQueue,
    scene_ids: HashMap<u32, EntityId>,
    next_scene_id: u32,
    pending_verify: Vec<EntityId>,
    stats: FrameStats,
}

impl Scene {
    /// Create an empty scene without physics
    ///
    /// # Errors
    /// `ConfigError::Invalid` if the configuration does not validate.
    pub fn new(config: SceneConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let hierarchy = TransformHierarchy::new(config.transform_validation_enabled());
        let octree = Octree::new(config.world_bounds(), config.octree_depth);
        log::info!(
            "Scene created: octree depth {}, half extent {}, culling {}, transform validation {}",
            config.octree_depth,
            config.world_half_extent,
            config.enable_culling,
            hierarchy.validates()
        );

        Ok(Self {
            config,
            entities: SlotMap::with_key(),
            hierarchy,
            octree,
            physics: None,
            camera: None,
            render_queue: RenderQueue::new(),
            scene_ids: HashMap::new(),
            next_scene_id: 1,
            pending_verify: Vec::new(),
            stats: FrameStats::default(),
        })
    }

    /// Create a scene driven by a physics world
    ///
    /// # Errors
    /// Same as [`Scene::new`].
    pub fn with_physics(config: SceneConfig, physics: Box<dyn PhysicsWorld>) -> Result<Self, ConfigError> {
        let mut scene = Self::new(config)?;
        scene.physics = Some(physics);
        Ok(scene)
    }

    /// Configuration the scene was built with
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Physics world, if any
    pub fn physics(&self) -> Option<&dyn PhysicsWorld> {
        self.physics.as_deref()
    }

    /// Physics world, mutably
    pub fn physics_mut(&mut self) -> Option<&mut (dyn PhysicsWorld + 'static)> {
        self.physics.as_deref_mut()
    }

    /// Bring an entity into the scene
    ///
    /// Assigns a scene id, registers its rigid body, derives its transform
    /// and places it in the octree.
    ///
    /// # Errors
    /// `AlreadyInScene` for an entity that already has a scene id,
    /// `NonFiniteTransform` for a corrupt transform (with validation on), or
    /// the physics world's error if registration fails. The scene is left
    /// unchanged on error.
    pub fn add_entity(&mut self, mut entity: Entity) -> SceneResult<EntityId> {
        if let Some(scene_id) = entity.scene_id {
            log::warn!("Entity '{}' is already in a scene (id {})", entity.name(), scene_id);
            return Err(SceneError::AlreadyInScene(scene_id));
        }

        // Links copied from another scene's transform mean nothing here
        entity.transform.parent = None;
        entity.transform.children.clear();

        let scene_id = self.next_scene_id;
        entity.scene_id = Some(scene_id);
        let body = entity.rigid_body();
        let id = self.entities.insert(entity);

        if let Err(err) = self.hierarchy.update_derived(&mut self.entities, id) {
            self.entities.remove(id);
            return Err(err);
        }

        if let (Some(physics), Some(body)) = (self.physics.as_deref_mut(), body) {
            if let Err(err) = physics.register_body(body, id) {
                log::warn!("Could not register rigid body {:?}: {}", body, err);
                self.entities.remove(id);
                return Err(err.into());
            }
        }

        self.next_scene_id += 1;
        self.scene_ids.insert(scene_id, id);

        let sphere = self.entities[id].world_bounds();
        let placement = self.octree.insert(id, &sphere);
        log::debug!(
            "Added entity '{}' as {:?} (scene id {}) at octant {} depth {}",
            self.entities[id].name(),
            id,
            scene_id,
            placement.octant,
            placement.depth
        );
        Ok(id)
    }

    /// Destroy an entity and all of its descendants
    ///
    /// Returns the number of entities destroyed.
    ///
    /// # Errors
    /// `EntityNotFound` if the handle is stale.
    pub fn destroy_entity(&mut self, id: EntityId) -> SceneResult<usize> {
        let parent = self
            .entities
            .get(id)
            .ok_or(SceneError::EntityNotFound(id))?
            .transform
            .parent;

        if let Some(parent) = parent.and_then(|p| self.entities.get_mut(p)) {
            swap_remove_item(&mut parent.transform.children, &id);
        }

        let doomed = self.hierarchy.subtree(&self.entities, id);
        for node in doomed.iter().rev() {
            let Some(mut entity) = self.entities.remove(*node) else {
                continue;
            };
            self.octree.remove(*node);
            if let Some(scene_id) = entity.scene_id {
                self.scene_ids.remove(&scene_id);
            }
            if let (Some(physics), Some(body)) = (self.physics.as_deref_mut(), entity.take_rigid_body()) {
                if let Err(err) = physics.unregister_body(body) {
                    log::warn!("Could not unregister rigid body {:?}: {}", body, err);
                }
            }
            if self.camera == Some(*node) {
                log::debug!("Camera entity {:?} destroyed; scene has no camera", node);
                self.camera = None;
            }
            log::debug!("Destroyed entity '{}' ({:?})", entity.name(), node);
        }
        Ok(doomed.len())
    }

    /// Entity by handle
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Entity by handle, mutably
    ///
    /// Component edits that change the bounds need a
    /// [`Scene::refresh_bounds`] afterwards.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Give a live entity a rigid body
    ///
    /// The body is registered with the physics world and moved to the
    /// entity's current world pose.
    ///
    /// # Errors
    /// `EntityNotFound`, `ComponentAlreadyAttached` if the entity has a body,
    /// or the physics world's error if registration fails. The entity is left
    /// without the body on error.
    pub fn attach_rigid_body(&mut self, id: EntityId, body: RigidBodyHandle) -> SceneResult<()> {
        let entity = self.entities.get(id).ok_or(SceneError::EntityNotFound(id))?;
        if entity.rigid_body().is_some() {
            log::warn!("Entity '{}' already has a rigid body", entity.name());
            return Err(SceneError::ComponentAlreadyAttached(ComponentKind::RigidBody));
        }

        if let Some(physics) = self.physics.as_deref_mut() {
            physics.register_body(body, id)?;
        }
        self.entities[id].put_rigid_body(body)?;
        log::debug!("Attached rigid body {:?} to {:?}", body, id);
        self.push_to_physics(id)
    }

    /// Take the rigid body off a live entity and unregister it
    ///
    /// # Errors
    /// `EntityNotFound`, `ComponentNotAttached`, or the physics world's error
    /// if unregistering fails, in which case the entity keeps the body.
    pub fn detach_rigid_body(&mut self, id: EntityId) -> SceneResult<RigidBodyHandle> {
        let entity = self.entities.get(id).ok_or(SceneError::EntityNotFound(id))?;
        let Some(body) = entity.rigid_body() else {
            log::warn!("Entity '{}' has no rigid body to detach", entity.name());
            return Err(SceneError::ComponentNotAttached(ComponentKind::RigidBody));
        };

        if let Some(physics) = self.physics.as_deref_mut() {
            physics.unregister_body(body)?;
        }
        self.entities[id].take_rigid_body();
        log::debug!("Detached rigid body {:?} from {:?}", body, id);
        Ok(body)
    }

    /// Handle of the entity with a scene id
    pub fn find_by_scene_id(&self, scene_id: u32) -> Option<EntityId> {
        self.scene_ids.get(&scene_id).copied()
    }

    /// All live entities
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter()
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the scene has no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Render through the camera on `id`
    ///
    /// # Errors
    /// `EntityNotFound`, or `ComponentNotAttached(Camera)` if the entity has
    /// no camera.
    pub fn set_camera(&mut self, id: EntityId) -> SceneResult<()> {
        let entity = self.entities.get(id).ok_or(SceneError::EntityNotFound(id))?;
        if entity.camera().is_none() {
            log::warn!("Entity '{}' has no camera component", entity.name());
            return Err(SceneError::ComponentNotAttached(ComponentKind::Camera));
        }
        log::debug!("Active camera is now '{}'", entity.name());
        self.camera = Some(id);
        Ok(())
    }

    /// Active camera entity
    pub fn camera(&self) -> Option<EntityId> {
        self.camera
    }

    /// Set local position
    pub fn set_local_position(&mut self, id: EntityId, position: Vec3) -> SceneResult<()> {
        self.hierarchy.set_local_position(&mut self.entities, id, position)?;
        self.transform_changed(id)
    }

    /// Set local rotation
    pub fn set_local_rotation(&mut self, id: EntityId, rotation: Quat) -> SceneResult<()> {
        self.hierarchy.set_local_rotation(&mut self.entities, id, rotation)?;
        self.transform_changed(id)
    }

    /// Set local scale
    pub fn set_local_scale(&mut self, id: EntityId, scale: Vec3) -> SceneResult<()> {
        self.hierarchy.set_local_scale(&mut self.entities, id, scale)?;
        self.transform_changed(id)
    }

    /// Set world position
    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> SceneResult<()> {
        self.hierarchy.set_position(&mut self.entities, id, position)?;
        self.transform_changed(id)
    }

    /// Set world rotation
    pub fn set_rotation(&mut self, id: EntityId, rotation: Quat) -> SceneResult<()> {
        self.hierarchy.set_rotation(&mut self.entities, id, rotation)?;
        self.transform_changed(id)
    }

    /// Set world scale
    pub fn set_scale(&mut self, id: EntityId, scale: Vec3) -> SceneResult<()> {
        self.hierarchy.set_scale(&mut self.entities, id, scale)?;
        self.transform_changed(id)
    }

    /// Re-parent keeping the local transform; the world transform follows the
    /// new parent
    pub fn set_parent(&mut self, child: EntityId, parent: Option<EntityId>) -> SceneResult<()> {
        self.hierarchy.set_parent(&mut self.entities, child, parent)?;
        self.transform_changed(child)
    }

    /// Re-parent keeping the world transform
    pub fn set_parent_keep_world(&mut self, child: EntityId, parent: Option<EntityId>) -> SceneResult<()> {
        let world: Trs = *self
            .entities
            .get(child)
            .ok_or(SceneError::EntityNotFound(child))?
            .transform
            .derived();

        self.hierarchy.set_parent(&mut self.entities, child, parent)?;
        self.hierarchy.set_world(&mut self.entities, child, world)?;
        self.transform_changed(child)
    }

    /// Turn an entity so its `+Z` axis faces `target`
    pub fn look_at(&mut self, id: EntityId, target: Vec3, up: Vec3) -> SceneResult<()> {
        self.hierarchy.look_at(&mut self.entities, id, target, up)?;
        self.transform_changed(id)
    }

    /// Entity and its descendants in pre-order
    pub fn descendants(&self, id: EntityId) -> Vec<EntityId> {
        self.hierarchy.subtree(&self.entities, id)
    }

    /// Recompute an entity's local bounds and re-home it
    ///
    /// Call after a mesh finished loading or a component changed.
    pub fn refresh_bounds(&mut self, id: EntityId) -> SceneResult<Placement> {
        self.entities
            .get_mut(id)
            .ok_or(SceneError::EntityNotFound(id))?
            .recompute_bounds();
        self.verify_entity(id)
    }

    /// Re-home an entity in the octree from its current world bounds
    pub fn verify_entity(&mut self, id: EntityId) -> SceneResult<Placement> {
        let sphere = self
            .entities
            .get(id)
            .ok_or(SceneError::EntityNotFound(id))?
            .world_bounds();

        Ok(match self.octree.verify_aabb(id, &sphere) {
            Some(placement) => placement,
            None => self.octree.insert(id, &sphere),
        })
    }

    /// Advance one simulation step
    ///
    /// Steps physics, copies every active body into its entity's world
    /// transform, then re-homes every entity that moved since the last
    /// update.
    pub fn update(&mut self, dt: f32) -> SceneResult<()> {
        if let Some(physics) = self.physics.as_deref_mut() {
            physics.step(dt)?;

            physics.mark_for_read()?;
            let active = physics.active_bodies();
            let owned: Vec<_> = active
                .iter()
                .flatten()
                .filter_map(|state| physics.body_owner(state.handle).map(|owner| (owner, *state)))
                .collect();
            physics.unmark_for_read();
            let active = active?;
            log::trace!("{} active bodies after step", active.len());

            for (owner, state) in owned {
                let Some(entity) = self.entities.get(owner) else {
                    continue;
                };
                let world = Trs {
                    position: state.position,
                    rotation: state.rotation,
                    scale: entity.transform.scale(),
                };
                self.hierarchy.set_world(&mut self.entities, owner, world)?;
                for node in self.hierarchy.subtree(&self.entities, owner) {
                    self.queue_verify(node);
                }
            }
        }

        self.flush_verification();
        Ok(())
    }

    /// Entities inside the camera frustum, ordered by scene id
    ///
    /// Hidden entities are excluded. With culling disabled every visible
    /// entity is returned.
    ///
    /// # Errors
    /// `MissingCamera` or `CameraNotAttached` when culling needs a camera.
    pub fn visible_entities(&self) -> Result<Vec<EntityId>, RenderError> {
        let mut visible = if self.config.enable_culling {
            let camera = self.camera.ok_or(RenderError::MissingCamera)?;
            let entity = self.entities.get(camera).ok_or(RenderError::CameraNotAttached(camera))?;
            let frustum = entity
                .camera()
                .ok_or(RenderError::CameraNotAttached(camera))?
                .world_frustum(entity.transform());

            let mut found = Vec::new();
            self.octree.query_frustum(&frustum, &mut found);
            found
        } else {
            self.entities.keys().collect()
        };

        visible.retain(|id| self.entities.get(*id).is_some_and(|e| e.visible));
        visible.sort_by_key(|id| self.entities.get(*id).and_then(Entity::scene_id));
        Ok(visible)
    }

    /// Cull and draw the scene
    pub fn render(&mut self, backend: &mut dyn RenderBackend) -> Result<FrameStats, RenderError> {
        self.flush_verification();

        let visible = self.visible_entities()?;
        self.render_queue.sort_renderables(&visible, &self.entities, self.camera)?;
        self.stats = self.render_queue.draw_all(&self.entities, backend);

        log::trace!("Frame: {:?}", self.stats);
        Ok(self.stats)
    }

    /// `update` then `render`
    pub fn frame(&mut self, dt: f32, backend: &mut dyn RenderBackend) -> SceneResult<FrameStats> {
        self.update(dt)?;
        Ok(self.render(backend)?)
    }

    /// Statistics of the last rendered frame
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Spatial index
    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    fn transform_changed(&mut self, id: EntityId) -> SceneResult<()> {
        for node in self.hierarchy.subtree(&self.entities, id) {
            self.queue_verify(node);
        }
        self.push_to_physics(id)
    }

    fn queue_verify(&mut self, id: EntityId) {
        self.pending_verify.push(id);
    }

    fn flush_verification(&mut self) {
        if self.pending_verify.is_empty() {
            return;
        }
        let mut pending = std::mem::take(&mut self.pending_verify);
        pending.sort_unstable();
        pending.dedup();
        for id in pending {
            // Destroyed since it was queued
            if !self.entities.contains_key(id) {
                continue;
            }
            if let Err(err) = self.verify_entity(id) {
                log::error!("Could not re-home {:?} in the octree: {}", id, err);
            }
        }
    }

    /// Teleport the entity's rigid body to its new world pose
    fn push_to_physics(&mut self, id: EntityId) -> SceneResult<()> {
        let Some(physics) = self.physics.as_deref_mut() else {
            return Ok(());
        };
        let Some(entity) = self.entities.get(id) else {
            return Ok(());
        };
        let Some(body) = entity.rigid_body() else {
            return Ok(());
        };

        physics.mark_for_write()?;
        let result = physics.set_body_transform(body, entity.transform.position(), entity.transform.rotation());
        physics.unmark_for_write();
        Ok(result?)
    }
}
