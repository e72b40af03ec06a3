//! Asteroid field demo
//!
//! Fills a scene with drifting asteroids driven by the reference physics
//! world, renders a fixed number of frames into a command recorder and logs
//! what each frame drew. The asteroid mesh starts as a placeholder and
//! finishes "loading" a few frames in.
//!
//! Usage: `asteroid_field [config.toml|config.ron]`

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use scene_engine::config::Config;
use scene_engine::foundation::logging;
use scene_engine::prelude::*;

const ASTEROID_MESH: &str = "asteroid";
const MAX_DRIFT_SPEED: f32 = 6.0;

/// Demo settings, loadable from TOML or RON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    /// Asteroids to spawn
    entity_count: usize,
    /// Frames to simulate
    frame_count: u32,
    /// Frame at which the asteroid mesh finishes loading
    load_frame: u32,
    /// Log a summary every this many frames
    report_every: u32,
    /// Seconds per frame
    time_step: f32,
    /// RNG seed for asteroid placement
    seed: u64,
    /// Scene settings
    scene: SceneConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            entity_count: 1000,
            frame_count: 300,
            load_frame: 10,
            report_every: 60,
            time_step: 1.0 / 60.0,
            seed: 42,
            scene: SceneConfig::default(),
        }
    }
}

impl Config for DemoConfig {}

struct AsteroidField {
    config: DemoConfig,
    scene: Scene,
    library: MeshLibrary,
    asteroids: Vec<EntityId>,
}

impl AsteroidField {
    fn new(config: DemoConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let scene = Scene::with_physics(config.scene.clone(), Box::new(SimplePhysicsWorld::new()))?;
        let mut field = Self {
            config,
            scene,
            library: MeshLibrary::new(),
            asteroids: Vec::new(),
        };
        field.spawn_camera()?;
        field.spawn_asteroids()?;
        field.spawn_decorations()?;
        Ok(field)
    }

    fn spawn_camera(&mut self) -> SceneResult<()> {
        let half = self.config.scene.world_half_extent;
        let mut camera = Entity::new("camera")
            .with_transform(Transform::from_position(self.config.scene.world_center + Vec3::new(0.0, half * 0.5, -half * 1.5)));
        camera.attach_camera(Camera::perspective(1.0, 16.0 / 9.0, 0.1, half * 4.0)?)?;
        let camera = self.scene.add_entity(camera)?;
        self.scene.look_at(camera, self.config.scene.world_center, Vec3::y())?;
        self.scene.set_camera(camera)
    }

    fn spawn_asteroids(&mut self) -> SceneResult<()> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let center = self.config.scene.world_center;
        let spread = self.config.scene.world_half_extent * 0.9;
        let mesh = self.library.request(ASTEROID_MESH);
        let marker = Arc::new(Primitive::wire_sphere(1.0).with_color(Vec4::new(0.2, 1.0, 0.4, 1.0)));

        for i in 0..self.config.entity_count {
            let position = center
                + Vec3::new(
                    rng.gen_range(-spread..spread),
                    rng.gen_range(-spread..spread),
                    rng.gen_range(-spread..spread),
                );
            let velocity = Vec3::new(
                rng.gen_range(-MAX_DRIFT_SPEED..MAX_DRIFT_SPEED),
                rng.gen_range(-MAX_DRIFT_SPEED..MAX_DRIFT_SPEED),
                rng.gen_range(-MAX_DRIFT_SPEED..MAX_DRIFT_SPEED),
            );
            let scale = rng.gen_range(0.5..2.5);

            let mut asteroid = Entity::new(format!("asteroid{i}"))
                .with_transform(Transform::from_position(position).with_scale(Vec3::new(scale, scale, scale)));
            asteroid.attach_mesh(Arc::clone(&mesh))?;
            // Every tenth asteroid gets a debug marker
            if i % 10 == 0 {
                asteroid.attach_primitive(Arc::clone(&marker))?;
            }

            if let Some(physics) = self.scene.physics_mut() {
                let body = physics.create_body(
                    BodyDesc::at(position)
                        .with_linear_velocity(velocity)
                        .with_angular_velocity(velocity * 0.1)
                        .with_radius(scale),
                );
                asteroid.attach_rigid_body(body)?;
            }
            self.asteroids.push(self.scene.add_entity(asteroid)?);
        }

        logging::info!("Spawned {} asteroids sharing mesh '{}'", self.asteroids.len(), ASTEROID_MESH);
        Ok(())
    }

    fn spawn_decorations(&mut self) -> SceneResult<()> {
        let center = self.config.scene.world_center;
        let half = self.config.scene.world_half_extent;

        let volume = Arc::new(Mesh::new("light-volume", MeshData::unit_cube()));
        for (i, color) in [Vec3::new(1.0, 0.8, 0.6), Vec3::new(0.4, 0.6, 1.0)].into_iter().enumerate() {
            let side = if i == 0 { -1.0 } else { 1.0 };
            let mut light = Entity::new(format!("light{i}"))
                .with_transform(Transform::from_position(center + Vec3::new(side * half * 0.5, half * 0.3, 0.0)));
            light.attach_light(PointLight::new(Arc::clone(&volume), color, 3.0, half * 0.4))?;
            self.scene.add_entity(light)?;
        }

        let mut axes = Entity::new("axes").with_transform(Transform::from_position(center));
        axes.attach_lines(LineRenderer::new(
            vec![
                Vec3::new(-half, 0.0, 0.0),
                Vec3::new(half, 0.0, 0.0),
                Vec3::new(0.0, -half, 0.0),
                Vec3::new(0.0, half, 0.0),
                Vec3::new(0.0, 0.0, -half),
                Vec3::new(0.0, 0.0, half),
            ],
            Vec4::new(0.6, 0.6, 0.6, 1.0),
        ))?;
        axes.attach_text(TextLabel::new("origin").with_offset(Vec3::new(0.0, 2.0, 0.0)))?;
        self.scene.add_entity(axes)?;
        Ok(())
    }

    fn finish_loading(&mut self) -> SceneResult<()> {
        self.library.complete(ASTEROID_MESH, MeshData::unit_cube());
        for id in &self.asteroids {
            self.scene.refresh_bounds(*id)?;
        }
        logging::info!("Mesh '{}' loaded; {} pending", ASTEROID_MESH, self.library.pending().len());
        Ok(())
    }

    fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut backend = CommandRecorder::new();
        let mut total_draws = 0;

        for frame in 0..self.config.frame_count {
            if frame == self.config.load_frame {
                self.finish_loading()?;
            }

            backend.clear();
            let stats = self.scene.frame(self.config.time_step, &mut backend)?;
            total_draws += stats.draw_calls;

            if self.config.report_every > 0 && frame % self.config.report_every == 0 {
                let contacts = self.scene.physics().map_or(0, |physics| physics.contact_count());
                logging::info!(
                    "Frame {:4}: {} visible, {} meshes in {} groups, {} primitives, {} lights, {} skipped, {} draws, {} contacts, {} bytes uploaded",
                    frame,
                    stats.visible_nodes,
                    stats.total_meshes,
                    stats.unique_meshes,
                    stats.primitives,
                    stats.visible_lights,
                    stats.skipped_unloaded,
                    stats.draw_calls,
                    contacts,
                    backend.stats().uploaded_bytes
                );
            }
        }

        logging::info!(
            "Done: {} frames, {} draw calls, {} occupied octants",
            self.config.frame_count,
            total_draws,
            self.scene.octree().occupied_octants().len()
        );
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => DemoConfig::load_from_file(&path)?,
        None => DemoConfig::default(),
    };
    logging::init_with_level(&config.scene.log_level);

    logging::info!("=== Asteroid Field Demo ===");
    logging::info!("{} asteroids, {} frames, seed {}", config.entity_count, config.frame_count, config.seed);

    AsteroidField::new(config)?.run()
}
