//! Scene entities
//!
//! An [`Entity`] owns exactly one [`Transform`] and at most one component of
//! each kind. Meshes and primitives are shared through `Arc`; everything else
//! belongs to the entity. The entity keeps a local bounding sphere that
//! encloses every graphical component it carries.

use std::sync::Arc;

use super::error::{ComponentKind, SceneError, SceneResult};
use super::hierarchy::TransformStore;
use super::transform::Transform;
use crate::assets::Mesh;
use crate::bounds::BoundingSphere;
use crate::foundation::collections::{EntityId, SlotMap};
use crate::physics::RigidBodyHandle;
use crate::render::{Camera, LineRenderer, PointLight, Primitive, Renderable, TextLabel};

/// Scene node: a transform plus optional components
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    pub(crate) transform: Transform,
    mesh: Option<Arc<Mesh>>,
    primitive: Option<Arc<Primitive>>,
    light: Option<PointLight>,
    lines: Option<LineRenderer>,
    camera: Option<Camera>,
    text: Option<TextLabel>,
    rigid_body: Option<RigidBodyHandle>,
    bounds: Option<BoundingSphere>,
    /// Hidden entities are skipped by visibility queries
    pub visible: bool,
    pub(crate) scene_id: Option<u32>,
}

impl Entity {
    /// Standalone entity with an identity transform
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::new(),
            mesh: None,
            primitive: None,
            light: None,
            lines: None,
            camera: None,
            text: None,
            rigid_body: None,
            bounds: None,
            visible: true,
            scene_id: None,
        }
    }

    /// Builder pattern: Set the initial transform
    ///
    /// Only meaningful before the entity joins a scene.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Entity name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transform
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Id assigned when the entity joined a scene
    pub fn scene_id(&self) -> Option<u32> {
        self.scene_id
    }

    /// Merged local bounding sphere of the graphical components
    pub fn local_bounds(&self) -> Option<BoundingSphere> {
        self.bounds
    }

    /// Local bounds moved into world space
    ///
    /// An entity without graphical components is a point at its position.
    pub fn world_bounds(&self) -> BoundingSphere {
        self.bounds
            .unwrap_or_default()
            .transformed(self.transform.world_matrix(), &self.transform.scale())
    }

    /// Shared mesh
    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.mesh.as_ref()
    }

    /// Shared wireframe primitive
    pub fn primitive(&self) -> Option<&Arc<Primitive>> {
        self.primitive.as_ref()
    }

    /// Point light
    pub fn light(&self) -> Option<&PointLight> {
        self.light.as_ref()
    }

    /// Line strip
    pub fn lines(&self) -> Option<&LineRenderer> {
        self.lines.as_ref()
    }

    /// Line strip, mutably; call `Scene::refresh_bounds` after changing points
    pub fn lines_mut(&mut self) -> Option<&mut LineRenderer> {
        self.lines.as_mut()
    }

    /// Camera
    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    /// Camera, mutably
    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }

    /// Text label
    pub fn text(&self) -> Option<&TextLabel> {
        self.text.as_ref()
    }

    /// Text label, mutably
    pub fn text_mut(&mut self) -> Option<&mut TextLabel> {
        self.text.as_mut()
    }

    /// Rigid body handle
    pub fn rigid_body(&self) -> Option<RigidBodyHandle> {
        self.rigid_body
    }

    /// Attach a shared mesh
    pub fn attach_mesh(&mut self, mesh: Arc<Mesh>) -> SceneResult<()> {
        attach(&mut self.mesh, ComponentKind::Mesh, mesh)?;
        self.merge_bounds(self.mesh.as_deref().map(Renderable::bounding_sphere));
        Ok(())
    }

    /// Detach the mesh
    pub fn detach_mesh(&mut self) -> SceneResult<Arc<Mesh>> {
        let mesh = detach(&mut self.mesh, ComponentKind::Mesh)?;
        self.recompute_bounds();
        Ok(mesh)
    }

    /// Attach a shared wireframe primitive
    pub fn attach_primitive(&mut self, primitive: Arc<Primitive>) -> SceneResult<()> {
        attach(&mut self.primitive, ComponentKind::Primitive, primitive)?;
        self.merge_bounds(self.primitive.as_deref().map(Renderable::bounding_sphere));
        Ok(())
    }

    /// Detach the primitive
    pub fn detach_primitive(&mut self) -> SceneResult<Arc<Primitive>> {
        let primitive = detach(&mut self.primitive, ComponentKind::Primitive)?;
        self.recompute_bounds();
        Ok(primitive)
    }

    /// Attach a point light
    pub fn attach_light(&mut self, light: PointLight) -> SceneResult<()> {
        attach(&mut self.light, ComponentKind::Light, light)?;
        self.merge_bounds(self.light.as_ref().map(Renderable::bounding_sphere));
        Ok(())
    }

    /// Detach the point light
    pub fn detach_light(&mut self) -> SceneResult<PointLight> {
        let light = detach(&mut self.light, ComponentKind::Light)?;
        self.recompute_bounds();
        Ok(light)
    }

    /// Attach a line strip
    pub fn attach_lines(&mut self, lines: LineRenderer) -> SceneResult<()> {
        attach(&mut self.lines, ComponentKind::Lines, lines)?;
        self.merge_bounds(self.lines.as_ref().map(Renderable::bounding_sphere));
        Ok(())
    }

    /// Detach the line strip
    pub fn detach_lines(&mut self) -> SceneResult<LineRenderer> {
        let lines = detach(&mut self.lines, ComponentKind::Lines)?;
        self.recompute_bounds();
        Ok(lines)
    }

    /// Attach a camera
    pub fn attach_camera(&mut self, camera: Camera) -> SceneResult<()> {
        attach(&mut self.camera, ComponentKind::Camera, camera)
    }

    /// Detach the camera
    pub fn detach_camera(&mut self) -> SceneResult<Camera> {
        detach(&mut self.camera, ComponentKind::Camera)
    }

    /// Attach a text label
    pub fn attach_text(&mut self, text: TextLabel) -> SceneResult<()> {
        attach(&mut self.text, ComponentKind::Text, text)
    }

    /// Detach the text label
    pub fn detach_text(&mut self) -> SceneResult<TextLabel> {
        detach(&mut self.text, ComponentKind::Text)
    }

    /// Attach a rigid body created by the physics world
    ///
    /// The body is registered with the world when the entity joins a scene.
    /// Entities already in a scene go through
    /// [`crate::scene::Scene::attach_rigid_body`] instead.
    ///
    /// # Errors
    /// `AlreadyInScene` for a live entity, `ComponentAlreadyAttached` if it
    /// already has a body.
    pub fn attach_rigid_body(&mut self, body: RigidBodyHandle) -> SceneResult<()> {
        self.ensure_detached_from_scene("attach")?;
        self.put_rigid_body(body)
    }

    /// Detach the rigid body
    ///
    /// Entities already in a scene go through
    /// [`crate::scene::Scene::detach_rigid_body`] instead.
    pub fn detach_rigid_body(&mut self) -> SceneResult<RigidBodyHandle> {
        self.ensure_detached_from_scene("detach")?;
        detach(&mut self.rigid_body, ComponentKind::RigidBody)
    }

    /// Rebuild the local bounds from every graphical component
    pub fn recompute_bounds(&mut self) {
        let spheres = [
            self.mesh.as_deref().map(Renderable::bounding_sphere),
            self.primitive.as_deref().map(Renderable::bounding_sphere),
            self.light.as_ref().map(Renderable::bounding_sphere),
            self.lines.as_ref().map(Renderable::bounding_sphere),
        ];
        self.bounds = spheres
            .into_iter()
            .flatten()
            .reduce(|acc, sphere| BoundingSphere::merge(&acc, &sphere));
    }

    pub(crate) fn put_rigid_body(&mut self, body: RigidBodyHandle) -> SceneResult<()> {
        attach(&mut self.rigid_body, ComponentKind::RigidBody, body)
    }

    pub(crate) fn take_rigid_body(&mut self) -> Option<RigidBodyHandle> {
        self.rigid_body.take()
    }

    /// Physics registration follows scene membership, so live entities
    /// change bodies through the scene
    fn ensure_detached_from_scene(&self, action: &str) -> SceneResult<()> {
        match self.scene_id {
            Some(scene_id) => {
                log::warn!("Cannot {} a rigid body on '{}' directly; it is live in a scene", action, self.name);
                Err(SceneError::AlreadyInScene(scene_id))
            }
            None => Ok(()),
        }
    }

    fn merge_bounds(&mut self, sphere: Option<BoundingSphere>) {
        let Some(sphere) = sphere else {
            return;
        };
        self.bounds = Some(match self.bounds {
            Some(current) => BoundingSphere::merge(&current, &sphere),
            None => sphere,
        });
    }
}

fn attach<T>(slot: &mut Option<T>, kind: ComponentKind, value: T) -> SceneResult<()> {
    if slot.is_some() {
        log::warn!("Refusing to attach a second {}", kind);
        return Err(SceneError::ComponentAlreadyAttached(kind));
    }
    *slot = Some(value);
    Ok(())
}

fn detach<T>(slot: &mut Option<T>, kind: ComponentKind) -> SceneResult<T> {
    slot.take().ok_or_else(|| {
        log::warn!("No {} to detach", kind);
        SceneError::ComponentNotAttached(kind)
    })
}

impl TransformStore for SlotMap<EntityId, Entity> {
    fn transform(&self, id: EntityId) -> Option<&Transform> {
        self.get(id).map(|entity| &entity.transform)
    }

    fn transform_mut(&mut self, id: EntityId) -> Option<&mut Transform> {
        self.get_mut(id).map(|entity| &mut entity.transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MeshData;
    use crate::foundation::math::{Vec3, Vec4};
    use approx::assert_relative_eq;

    fn cube() -> Arc<Mesh> {
        Arc::new(Mesh::new("cube", MeshData::unit_cube()))
    }

    #[test]
    fn test_double_attach_rejected() {
        let mut entity = Entity::new("e");
        entity.attach_mesh(cube()).unwrap();

        assert_eq!(
            entity.attach_mesh(cube()).unwrap_err(),
            SceneError::ComponentAlreadyAttached(ComponentKind::Mesh)
        );
        assert_eq!(
            entity.detach_camera().unwrap_err(),
            SceneError::ComponentNotAttached(ComponentKind::Camera)
        );
    }

    #[test]
    fn test_bounds_grow_and_shrink() {
        let mut entity = Entity::new("e");
        assert!(entity.local_bounds().is_none());

        entity.attach_primitive(Arc::new(Primitive::wire_sphere(1.0))).unwrap();
        assert_relative_eq!(entity.local_bounds().unwrap().radius, 1.0);

        entity
            .attach_lines(LineRenderer::new(
                vec![Vec3::new(4.0, 0.0, 0.0), Vec3::new(6.0, 0.0, 0.0)],
                Vec4::new(1.0, 1.0, 1.0, 1.0),
            ))
            .unwrap();
        let merged = entity.local_bounds().unwrap();
        // From x = -1 to x = 6
        assert_relative_eq!(merged.radius, 3.5, epsilon = 1e-5);
        assert_relative_eq!(merged.center, Vec3::new(2.5, 0.0, 0.0), epsilon = 1e-5);

        entity.detach_lines().unwrap();
        assert_relative_eq!(entity.local_bounds().unwrap().radius, 1.0);

        entity.detach_primitive().unwrap();
        assert!(entity.local_bounds().is_none());
    }

    #[test]
    fn test_world_bounds_follow_transform() {
        let mut entity = Entity::new("e").with_transform(
            Transform::from_position(Vec3::new(10.0, 0.0, 0.0)).with_scale(Vec3::new(2.0, 2.0, 2.0)),
        );
        entity.attach_primitive(Arc::new(Primitive::wire_sphere(1.5))).unwrap();

        let world = entity.world_bounds();
        assert_relative_eq!(world.center, Vec3::new(10.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(world.radius, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rigid_body_on_live_entity_is_refused() {
        let mut entity = Entity::new("e");
        entity.attach_rigid_body(RigidBodyHandle(1)).unwrap();
        entity.scene_id = Some(7);

        assert_eq!(entity.detach_rigid_body().unwrap_err(), SceneError::AlreadyInScene(7));
        assert_eq!(entity.rigid_body(), Some(RigidBodyHandle(1)));

        let mut late = Entity::new("late");
        late.scene_id = Some(8);
        assert_eq!(late.attach_rigid_body(RigidBodyHandle(2)).unwrap_err(), SceneError::AlreadyInScene(8));
        assert_eq!(late.rigid_body(), None);
    }

    #[test]
    fn test_detach_rigid_body_before_joining() {
        let mut entity = Entity::new("e");
        entity.attach_rigid_body(RigidBodyHandle(3)).unwrap();

        assert_eq!(entity.detach_rigid_body().unwrap(), RigidBodyHandle(3));
        assert_eq!(
            entity.detach_rigid_body().unwrap_err(),
            SceneError::ComponentNotAttached(ComponentKind::RigidBody)
        );
    }

    #[test]
    fn test_entity_arena_is_a_transform_store() {
        let mut entities: SlotMap<EntityId, Entity> = SlotMap::with_key();
        let id = entities.insert(Entity::new("e"));

        assert!(TransformStore::transform(&entities, id).is_some());
        entities.remove(id);
        assert!(TransformStore::transform(&entities, id).is_none());
    }
}
