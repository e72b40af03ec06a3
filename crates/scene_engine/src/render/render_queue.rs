//! # Render Queue
//!
//! Collects the visible entities of a frame and turns them into backend
//! calls with as few state changes as possible.
//!
//! ## Architecture
//!
//! - Meshes and primitives are grouped by the shared instance they point to
//! - Lights are grouped by their light-volume mesh
//! - Lines and text are owned per entity and drawn one by one
//! - Within a group, nodes are ordered front to back from the camera
//!
//! Each group binds shader and geometry once, then uploads the transposed
//! world matrix of every member and issues one draw per member.

use std::collections::HashMap;
use std::sync::Arc;

use super::backend::RenderBackend;
use super::constants::{InstanceConstants, LightConstants};
use super::primitives::Primitive;
use super::renderable::Renderable;
use super::RenderError;
use crate::assets::Mesh;
use crate::foundation::collections::{EntityId, SlotMap};
use crate::foundation::math::{Mat4, Point3, Vec3};
use crate::scene::Entity;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Counters for the last rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Entities that survived culling
    pub visible_nodes: usize,
    /// Distinct meshes drawn
    pub unique_meshes: usize,
    /// Mesh instances drawn
    pub total_meshes: usize,
    /// Primitive instances drawn
    pub primitives: usize,
    /// Line batches drawn
    pub lines: usize,
    /// Light volumes drawn
    pub visible_lights: usize,
    /// Text labels drawn
    pub text_labels: usize,
    /// Instances skipped because their renderable was still loading
    pub skipped_unloaded: usize,
    /// Draw calls issued
    pub draw_calls: usize,
}

/// Shared renderable and the entities drawing it
#[derive(Debug)]
struct Group<R> {
    renderable: Arc<R>,
    nodes: Vec<EntityId>,
}

/// Groups entities in first-seen order, keyed by the shared instance
#[derive(Debug)]
struct Groups<R> {
    groups: Vec<Group<R>>,
    index: HashMap<*const R, usize>,
}

impl<R> Default for Groups<R> {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<R> Groups<R> {
    fn add(&mut self, renderable: &Arc<R>, node: EntityId) {
        let key = Arc::as_ptr(renderable);
        let slot = *self.index.entry(key).or_insert_with(|| {
            self.groups.push(Group {
                renderable: Arc::clone(renderable),
                nodes: Vec::new(),
            });
            self.groups.len() - 1
        });
        self.groups[slot].nodes.push(node);
    }

    fn clear(&mut self) {
        self.groups.clear();
        self.index.clear();
    }
}

/// Per-frame batching of visible entities
#[derive(Debug, Default)]
pub struct RenderQueue {
    meshes: Groups<Mesh>,
    primitives: Groups<Primitive>,
    lights: Groups<Mesh>,
    lines: Vec<EntityId>,
    text: Vec<EntityId>,
    stats: FrameStats,
}

impl RenderQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget last frame's groups and counters
    pub fn reset(&mut self) {
        self.meshes.clear();
        self.primitives.clear();
        self.lights.clear();
        self.lines.clear();
        self.text.clear();
        self.stats = FrameStats::default();
    }

    /// Statistics of the last frame
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Number of distinct mesh groups queued
    pub fn mesh_group_count(&self) -> usize {
        self.meshes.groups.len()
    }

    /// Group the visible entities by what they draw
    ///
    /// # Errors
    /// `RenderError::MissingCamera` without a camera, and
    /// `RenderError::CameraNotAttached` if the camera entity has no camera
    /// component.
    pub fn sort_renderables(
        &mut self,
        visible: &[EntityId],
        entities: &SlotMap<EntityId, Entity>,
        camera: Option<EntityId>,
    ) -> Result<(), RenderError> {
        let camera = camera.ok_or(RenderError::MissingCamera)?;
        let eye = entities
            .get(camera)
            .filter(|e| e.camera().is_some())
            .map(|e| e.transform().position())
            .ok_or(RenderError::CameraNotAttached(camera))?;

        self.reset();
        self.stats.visible_nodes = visible.len();

        for &id in visible {
            let Some(entity) = entities.get(id) else {
                continue;
            };
            if let Some(mesh) = entity.mesh() {
                self.meshes.add(mesh, id);
            }
            if let Some(primitive) = entity.primitive() {
                self.primitives.add(primitive, id);
            }
            if let Some(light) = entity.light() {
                self.lights.add(light.volume(), id);
            }
            if entity.lines().is_some() {
                self.lines.push(id);
            }
            if entity.text().is_some() {
                self.text.push(id);
            }
        }

        let distance = |id: &EntityId| {
            entities
                .get(*id)
                .map_or(f32::MAX, |e| (e.transform().position() - eye).magnitude_squared())
        };
        for group in &mut self.meshes.groups {
            group.nodes.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
        }
        for group in &mut self.primitives.groups {
            group.nodes.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
        }

        log::trace!(
            "Sorted {} visible nodes into {} mesh groups, {} primitive groups, {} light groups",
            visible.len(),
            self.meshes.groups.len(),
            self.primitives.groups.len(),
            self.lights.groups.len()
        );
        Ok(())
    }

    /// Draw every mesh group
    pub fn draw_meshes(&mut self, entities: &SlotMap<EntityId, Entity>, backend: &mut dyn RenderBackend) {
        let mut unique = 0;
        for group in &self.meshes.groups {
            if let Some(drawn) = draw_group(group, entities, backend, &mut self.stats) {
                unique += 1;
                self.stats.total_meshes += drawn;
            }
        }
        self.stats.unique_meshes = unique;
    }

    /// Draw every primitive group
    pub fn draw_primitives(&mut self, entities: &SlotMap<EntityId, Entity>, backend: &mut dyn RenderBackend) {
        for group in &self.primitives.groups {
            if let Some(drawn) = draw_group(group, entities, backend, &mut self.stats) {
                self.stats.primitives += drawn;
            }
        }
    }

    /// Draw every line batch
    pub fn draw_lines(&mut self, entities: &SlotMap<EntityId, Entity>, backend: &mut dyn RenderBackend) {
        for id in &self.lines {
            let Some((entity, lines)) = entities.get(*id).and_then(|e| e.lines().map(|l| (e, l))) else {
                continue;
            };
            let color: [f32; 4] = lines.color().into();
            lines.bind(backend);
            backend.upload_instance(&InstanceConstants::new(entity.transform().gpu_matrix(), color));
            lines.draw(backend);
            self.stats.lines += 1;
            self.stats.draw_calls += 1;
        }
    }

    /// Draw every light volume, scaled by its light's radius
    pub fn draw_lights(&mut self, entities: &SlotMap<EntityId, Entity>, backend: &mut dyn RenderBackend) {
        for group in &self.lights.groups {
            if !group.renderable.has_finished_loading() {
                self.stats.skipped_unloaded += group.nodes.len();
                continue;
            }

            let mut bound = false;
            for id in &group.nodes {
                let Some((entity, light)) = entities.get(*id).and_then(|e| e.light().map(|l| (e, l))) else {
                    continue;
                };
                if !bound {
                    light.bind(backend);
                    bound = true;
                }
                let transform = entity.transform();
                let scaled = transform.world_matrix() * Mat4::new_scaling(light.radius);
                backend.upload_light(&LightConstants::new(
                    &scaled.transpose(),
                    light.color,
                    light.intensity,
                    transform.position(),
                    light.radius,
                ));
                light.draw(backend);
                self.stats.visible_lights += 1;
                self.stats.draw_calls += 1;
            }
        }
    }

    /// Draw every text label at its entity's position plus offset
    pub fn draw_text(&mut self, entities: &SlotMap<EntityId, Entity>, backend: &mut dyn RenderBackend) {
        for id in &self.text {
            let Some((entity, label)) = entities.get(*id).and_then(|e| e.text().map(|t| (e, t))) else {
                continue;
            };
            let anchor: Vec3 = entity
                .transform()
                .world_matrix()
                .transform_point(&Point3::from(label.offset))
                .coords;
            let placement = Mat4::new_translation(&anchor).transpose();
            backend.draw_text(&label.text, &InstanceConstants::new(&placement, label.color.into()));
            self.stats.text_labels += 1;
            self.stats.draw_calls += 1;
        }
    }

    /// Draw all passes in order: meshes, primitives, lines, lights, text
    pub fn draw_all(&mut self, entities: &SlotMap<EntityId, Entity>, backend: &mut dyn RenderBackend) -> FrameStats {
        self.draw_meshes(entities, backend);
        self.draw_primitives(entities, backend);
        self.draw_lines(entities, backend);
        self.draw_lights(entities, backend);
        self.draw_text(entities, backend);
        self.stats
    }
}

/// Bind a shared renderable once and draw every member
///
/// Returns the number of instances drawn, or `None` if the renderable is
/// still loading.
fn draw_group<R: Renderable>(
    group: &Group<R>,
    entities: &SlotMap<EntityId, Entity>,
    backend: &mut dyn RenderBackend,
    stats: &mut FrameStats,
) -> Option<usize> {
    if !group.renderable.has_finished_loading() {
        stats.skipped_unloaded += group.nodes.len();
        return None;
    }

    group.renderable.bind(backend);
    let mut drawn = 0;
    for id in &group.nodes {
        let Some(entity) = entities.get(*id) else {
            continue;
        };
        backend.upload_instance(&InstanceConstants::new(entity.transform().gpu_matrix(), WHITE));
        group.renderable.draw(backend);
        drawn += 1;
    }
    stats.draw_calls += drawn;
    Some(drawn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MeshData;
    use crate::foundation::math::Vec4;
    use crate::render::{Camera, CommandRecorder, LineRenderer, PointLight, RenderCommand, ShaderKind, TextLabel};
    use crate::scene::Transform;

    fn scene_with_camera() -> (SlotMap<EntityId, Entity>, EntityId) {
        let mut entities = SlotMap::with_key();
        let mut camera = Entity::new("camera");
        camera.attach_camera(Camera::perspective(1.0, 1.0, 0.1, 100.0).unwrap()).unwrap();
        let camera = entities.insert(camera);
        (entities, camera)
    }

    fn at(name: &str, x: f32) -> Entity {
        Entity::new(name).with_transform(Transform::from_position(Vec3::new(x, 0.0, 10.0)))
    }

    #[test]
    fn test_missing_camera_is_an_error() {
        let (entities, camera) = scene_with_camera();
        let mut queue = RenderQueue::new();

        assert_eq!(queue.sort_renderables(&[], &entities, None), Err(RenderError::MissingCamera));

        let mut entities = entities;
        let plain = entities.insert(Entity::new("plain"));
        assert_eq!(
            queue.sort_renderables(&[], &entities, Some(plain)),
            Err(RenderError::CameraNotAttached(plain))
        );
        assert!(queue.sort_renderables(&[], &entities, Some(camera)).is_ok());
    }

    #[test]
    fn test_shared_mesh_binds_once() {
        let (mut entities, camera) = scene_with_camera();
        let mesh = Arc::new(Mesh::new("rock", MeshData::unit_cube()));
        let other = Arc::new(Mesh::new("ship", MeshData::unit_cube()));

        let mut visible = Vec::new();
        for i in 0..4 {
            let mut entity = at("rock", i as f32);
            entity.attach_mesh(Arc::clone(&mesh)).unwrap();
            visible.push(entities.insert(entity));
        }
        let mut ship = at("ship", 0.0);
        ship.attach_mesh(Arc::clone(&other)).unwrap();
        visible.push(entities.insert(ship));

        let mut queue = RenderQueue::new();
        let mut backend = CommandRecorder::new();
        queue.sort_renderables(&visible, &entities, Some(camera)).unwrap();
        let stats = queue.draw_all(&entities, &mut backend);

        assert_eq!(stats.unique_meshes, 2);
        assert_eq!(stats.total_meshes, 5);
        assert_eq!(stats.draw_calls, 5);
        assert_eq!(backend.shader_bind_count(ShaderKind::Mesh), 2);
        assert_eq!(backend.instance_upload_count(), 5);
        // First-seen order: rock group before ship group
        assert!(matches!(&backend.commands()[1], RenderCommand::BindGeometry { label, .. } if label == "rock"));
    }

    #[test]
    fn test_unloaded_mesh_is_skipped() {
        let (mut entities, camera) = scene_with_camera();
        let pending = Arc::new(Mesh::placeholder("pending"));
        let mut entity = at("pending", 0.0);
        entity.attach_mesh(Arc::clone(&pending)).unwrap();
        let id = entities.insert(entity);

        let mut queue = RenderQueue::new();
        let mut backend = CommandRecorder::new();
        queue.sort_renderables(&[id], &entities, Some(camera)).unwrap();
        let stats = queue.draw_all(&entities, &mut backend);

        assert_eq!(stats.skipped_unloaded, 1);
        assert_eq!(stats.draw_calls, 0);
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn test_lights_lines_and_text() {
        let (mut entities, camera) = scene_with_camera();
        let volume = Arc::new(Mesh::new("light_volume", MeshData::unit_cube()));

        let mut lamp = at("lamp", 0.0);
        lamp.attach_light(PointLight::new(Arc::clone(&volume), Vec3::new(1.0, 0.5, 0.2), 2.0, 4.0)).unwrap();
        lamp.attach_text(TextLabel::new("lamp").with_offset(Vec3::new(0.0, 1.0, 0.0))).unwrap();
        let lamp = entities.insert(lamp);

        let mut trail = at("trail", 2.0);
        trail
            .attach_lines(LineRenderer::new(vec![Vec3::zeros(), Vec3::x()], Vec4::new(0.0, 1.0, 0.0, 1.0)))
            .unwrap();
        let trail = entities.insert(trail);

        let mut queue = RenderQueue::new();
        let mut backend = CommandRecorder::new();
        queue.sort_renderables(&[lamp, trail], &entities, Some(camera)).unwrap();
        let stats = queue.draw_all(&entities, &mut backend);

        assert_eq!(stats.visible_lights, 1);
        assert_eq!(stats.lines, 1);
        assert_eq!(stats.text_labels, 1);
        assert_eq!(stats.draw_calls, 3);

        let light = backend
            .commands()
            .iter()
            .find_map(|c| match c {
                RenderCommand::UploadLight(constants) => Some(*constants),
                _ => None,
            })
            .unwrap();
        assert_eq!(light.color_intensity, [1.0, 0.5, 0.2, 2.0]);
        assert_eq!(light.position_radius, [0.0, 0.0, 10.0, 4.0]);
        // Radius scales the volume
        assert_eq!(light.model[0][0], 4.0);
        assert!(backend.commands().contains(&RenderCommand::DrawText("lamp".to_owned())));
    }

    #[test]
    fn test_group_members_front_to_back() {
        let (mut entities, camera) = scene_with_camera();
        let mesh = Arc::new(Mesh::new("rock", MeshData::unit_cube()));

        let mut far = Entity::new("far").with_transform(Transform::from_position(Vec3::new(0.0, 0.0, 50.0)));
        far.attach_mesh(Arc::clone(&mesh)).unwrap();
        let far = entities.insert(far);
        let mut near = Entity::new("near").with_transform(Transform::from_position(Vec3::new(0.0, 0.0, 5.0)));
        near.attach_mesh(Arc::clone(&mesh)).unwrap();
        let near = entities.insert(near);

        let mut queue = RenderQueue::new();
        let mut backend = CommandRecorder::new();
        queue.sort_renderables(&[far, near], &entities, Some(camera)).unwrap();
        queue.draw_meshes(&entities, &mut backend);

        let uploads: Vec<_> = backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                RenderCommand::UploadInstance(constants) => Some(constants.model[3][2]),
                _ => None,
            })
            .collect();
        assert_eq!(uploads, vec![5.0, 50.0]);
    }
}
