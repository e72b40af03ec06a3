//! Properties of the transform hierarchy, bounding volumes, octree placement,
//! frustum culling and render batching

use std::sync::Arc;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use scene_engine::bounds::{Aabb, BoundingSphere, Containment, Frustum};
use scene_engine::foundation::collections::{EntityId, SlotMap};
use scene_engine::foundation::math::Unit;
use scene_engine::prelude::*;
use scene_engine::render::{RenderCommand, ShaderKind};
use scene_engine::scene::TransformHierarchy;
use scene_engine::spatial::{PlacementReason, ROOT};

fn random_vec(rng: &mut StdRng, range: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-range..range),
        rng.gen_range(-range..range),
        rng.gen_range(-range..range),
    )
}

fn random_rotation(rng: &mut StdRng) -> Quat {
    let axis = Unit::new_normalize(random_vec(rng, 1.0) + Vec3::new(0.0, 0.0, 1e-3));
    Quat::from_axis_angle(&axis, rng.gen_range(-3.0..3.0))
}

fn scene() -> Scene {
    Scene::new(SceneConfig::default().with_transform_validation(true)).unwrap()
}

#[test]
fn translations_sum_down_a_chain() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut scene = scene();

    let mut expected = Vec3::zeros();
    let mut parent = None;
    let mut last = None;
    for i in 0..6 {
        let offset = random_vec(&mut rng, 10.0);
        expected += offset;
        let id = scene
            .add_entity(Entity::new(format!("link{i}")).with_transform(Transform::from_position(offset)))
            .unwrap();
        scene.set_parent(id, parent).unwrap();
        parent = Some(id);
        last = Some(id);
    }

    let tip = scene.entity(last.unwrap()).unwrap().transform();
    assert_relative_eq!(tip.position(), expected, epsilon = 1e-3);
}

#[test]
fn rotations_multiply_parent_to_child() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut scene = scene();

    let r1 = random_rotation(&mut rng);
    let r2 = random_rotation(&mut rng);
    let r3 = random_rotation(&mut rng);
    let a = scene.add_entity(Entity::new("a").with_transform(Transform::new().with_rotation(r1))).unwrap();
    let b = scene.add_entity(Entity::new("b").with_transform(Transform::new().with_rotation(r2))).unwrap();
    let c = scene.add_entity(Entity::new("c").with_transform(Transform::new().with_rotation(r3))).unwrap();
    scene.set_parent(b, Some(a)).unwrap();
    scene.set_parent(c, Some(b)).unwrap();

    let world = scene.entity(c).unwrap().transform().rotation();
    assert!(world.angle_to(&(r1 * r2 * r3)) < 1e-4);

    // Moving the root carries the whole chain
    scene.set_local_rotation(a, Quat::identity()).unwrap();
    let world = scene.entity(c).unwrap().transform().rotation();
    assert!(world.angle_to(&(r2 * r3)) < 1e-4);
}

#[test]
fn reparent_then_set_world_position_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(3);

    for _ in 0..20 {
        let mut scene = scene();
        let parent = scene
            .add_entity(Entity::new("parent").with_transform(
                Transform::from_position(random_vec(&mut rng, 20.0))
                    .with_rotation(random_rotation(&mut rng))
                    .with_scale(Vec3::new(
                        rng.gen_range(0.5..2.0),
                        rng.gen_range(0.5..2.0),
                        rng.gen_range(0.5..2.0),
                    )),
            ))
            .unwrap();
        let start = random_vec(&mut rng, 20.0);
        let child = scene
            .add_entity(Entity::new("child").with_transform(Transform::from_position(start)))
            .unwrap();

        scene.set_parent(child, Some(parent)).unwrap();
        scene.set_position(child, start).unwrap();
        let first = scene.entity(child).unwrap().transform().local_position();
        assert_relative_eq!(scene.entity(child).unwrap().transform().position(), start, epsilon = 1e-3);

        scene.set_position(child, start).unwrap();
        let second = scene.entity(child).unwrap().transform().local_position();
        assert_relative_eq!(first, second, epsilon = 1e-4);
    }
}

#[test]
fn parenting_cycles_are_refused() {
    let mut scene = scene();
    let a = scene.add_entity(Entity::new("a")).unwrap();
    let b = scene.add_entity(Entity::new("b")).unwrap();
    scene.set_parent(b, Some(a)).unwrap();

    assert_eq!(scene.set_parent(a, Some(a)).unwrap_err(), SceneError::SelfParenting(a));
    assert_eq!(
        scene.set_parent(a, Some(b)).unwrap_err(),
        SceneError::CyclicParenting { child: a, parent: b }
    );
}

fn surface_samples(sphere: &BoundingSphere, rng: &mut StdRng) -> Vec<Vec3> {
    (0..64)
        .map(|_| {
            let dir = (random_vec(rng, 1.0) + Vec3::new(1e-3, 0.0, 0.0)).normalize();
            sphere.center + dir * sphere.radius
        })
        .collect()
}

#[test]
fn merged_sphere_contains_both_surfaces() {
    let mut rng = StdRng::seed_from_u64(4);

    for _ in 0..200 {
        let a = BoundingSphere::new(random_vec(&mut rng, 50.0), rng.gen_range(0.0..10.0));
        let b = BoundingSphere::new(random_vec(&mut rng, 50.0), rng.gen_range(0.0..10.0));
        let merged = BoundingSphere::merge(&a, &b);

        for p in surface_samples(&a, &mut rng).iter().chain(&surface_samples(&b, &mut rng)) {
            let slack = 1e-4 * (1.0 + merged.radius);
            assert!((p - merged.center).magnitude() <= merged.radius + slack);
        }
    }
}

#[test]
fn merging_a_sphere_with_itself_is_identity() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..50 {
        let s = BoundingSphere::new(random_vec(&mut rng, 50.0), rng.gen_range(0.0..10.0));
        assert_eq!(BoundingSphere::merge(&s, &s), s);
    }
}

fn octree() -> Octree {
    Octree::new(Aabb::new(Vec3::new(-100.0, -100.0, -100.0), Vec3::new(100.0, 100.0, 100.0)), 3)
}

fn handles(n: usize) -> Vec<EntityId> {
    let mut arena: SlotMap<EntityId, ()> = SlotMap::with_key();
    (0..n).map(|_| arena.insert(())).collect()
}

#[test]
fn octree_placement_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(6);
    let ids = handles(300);
    let spheres: Vec<_> = ids
        .iter()
        .map(|_| BoundingSphere::new(random_vec(&mut rng, 99.0), rng.gen_range(0.1..8.0)))
        .collect();

    let mut first = octree();
    let mut second = octree();
    for (id, sphere) in ids.iter().zip(&spheres) {
        first.insert(*id, sphere);
    }
    for (id, sphere) in ids.iter().zip(&spheres) {
        second.insert(*id, sphere);
    }

    for id in &ids {
        assert_eq!(first.octant_of(*id), second.octant_of(*id));
    }
}

#[test]
fn single_leaf_fit_lands_in_that_leaf() {
    let mut tree = octree();
    let id = handles(1)[0];

    // Leaf cells are 25 wide; this sits well inside [50, 75]^3
    let placement = tree.insert(id, &BoundingSphere::new(Vec3::new(62.5, 62.5, 62.5), 1.0));

    assert_eq!(placement.depth, 3);
    let leaf = tree.octant(placement.octant).unwrap();
    assert_eq!(leaf.bounds.min, Vec3::new(50.0, 50.0, 50.0));
    assert_eq!(leaf.bounds.max, Vec3::new(75.0, 75.0, 75.0));
}

#[test]
fn oversize_volume_attaches_to_root() {
    let mut tree = octree();
    let id = handles(1)[0];

    let placement = tree.insert(id, &BoundingSphere::new(Vec3::zeros(), 150.0));

    assert_eq!(placement.octant, ROOT);
    assert_eq!(placement.reason, PlacementReason::OutsideBounds);
    assert_eq!(tree.octant(ROOT).unwrap().attached(), &[id]);
}

fn camera_frustum() -> Frustum {
    // Camera at (0, 0, -50) looking at the origin
    let camera = Camera::perspective(1.0, 1.0, 0.5, 200.0).unwrap();
    let mut transforms: SlotMap<EntityId, Transform> = SlotMap::with_key();
    let eye = transforms.insert(Transform::from_position(Vec3::new(0.0, 0.0, -50.0)));
    TransformHierarchy::new(true)
        .look_at(&mut transforms, eye, Vec3::zeros(), Vec3::y())
        .unwrap();
    camera.world_frustum(&transforms[eye])
}

#[test]
fn sphere_at_look_target_is_inside() {
    let frustum = camera_frustum();
    assert_eq!(frustum.intersect_sphere(&BoundingSphere::new(Vec3::zeros(), 1.0)), Containment::Inside);
}

#[test]
fn sphere_far_behind_camera_is_outside() {
    let frustum = camera_frustum();
    assert_eq!(
        frustum.intersect_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, -150.0), 1.0)),
        Containment::Outside
    );
}

#[test]
fn sphere_leaving_the_view_passes_through_intersecting() {
    let frustum = camera_frustum();

    let mut seen = Vec::new();
    for step in 0..=400 {
        let x = step as f32 * 0.25;
        let state = frustum.intersect_sphere(&BoundingSphere::new(Vec3::new(x, 0.0, 0.0), 2.0));
        if seen.last() != Some(&state) {
            seen.push(state);
        }
    }

    assert_eq!(seen, vec![Containment::Inside, Containment::Intersecting, Containment::Outside]);
}

#[test]
fn shared_mesh_binds_once_and_draws_each_instance() {
    const K: usize = 12;
    let mut scene = scene();

    let mut camera = Entity::new("camera");
    camera.attach_camera(Camera::perspective(1.2, 1.0, 0.1, 500.0).unwrap()).unwrap();
    let camera = scene.add_entity(camera).unwrap();
    scene.set_camera(camera).unwrap();

    let mesh = Arc::new(Mesh::new("rock", MeshData::unit_cube()));
    for i in 0..K {
        let mut rock = Entity::new(format!("rock{i}"))
            .with_transform(Transform::from_position(Vec3::new(i as f32 - 6.0, 0.0, 30.0)));
        rock.attach_mesh(Arc::clone(&mesh)).unwrap();
        scene.add_entity(rock).unwrap();
    }

    let mut backend = CommandRecorder::new();
    let stats = scene.render(&mut backend).unwrap();

    assert_eq!(stats.unique_meshes, 1);
    assert_eq!(stats.total_meshes, K);
    assert_eq!(backend.shader_bind_count(ShaderKind::Mesh), 1);
    assert_eq!(backend.stats().geometry_binds, 1);
    assert_eq!(backend.instance_upload_count(), K);
    assert_eq!(backend.indexed_draw_count(), K);
    assert!(matches!(backend.commands()[0], RenderCommand::BindShader(ShaderKind::Mesh)));
}
