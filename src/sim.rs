//! Agent registry and per-tick simulation state.
//!
//! Owns the ECS world plus everything the systems share between ticks. The
//! scene is passed in per call so the caller decides who owns it.

use glam::Vec2;

use crate::config::FarmConfig;
use crate::debug::timer::SystemTimers;
use crate::ecs::components::{AgentFlags, Facing, PetId, Pose, Position, Visual};
use crate::ecs::index::VisualIndex;
use crate::ecs::systems;
use crate::ecs::systems::grab::{CursorHint, GrabController, GrabState};
use crate::journal::Pet;
use crate::pet;
use crate::pick::Camera;
use crate::scene::{AgentInstance, AgentKind, Scene, SceneError};
use crate::spatial::Terrain;

/// Animation phase advances this many units per simulated second.
const ANIMATION_RATE: f64 = 5.0;

pub struct Simulation {
    world: hecs::World,
    terrain: Terrain,
    rng: fastrand::Rng,
    index: VisualIndex,
    grab: GrabController,
    camera: Camera,

    /// Simulated seconds since start.
    elapsed: f64,
    tick_count: u64,

    // Reusable instance buffer (avoid per-frame allocation)
    instance_buf: Vec<AgentInstance>,
}

impl Simulation {
    pub fn new(config: &FarmConfig, rng: fastrand::Rng) -> Self {
        Self {
            world: hecs::World::new(),
            terrain: config.terrain(),
            rng,
            index: VisualIndex::new(),
            grab: GrabController::new(),
            camera: Camera::from_config(&config.camera),
            elapsed: 0.0,
            tick_count: 0,
            instance_buf: Vec::new(),
        }
    }

    pub fn world(&self) -> &hecs::World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut hecs::World {
        &mut self.world
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn index(&self) -> &VisualIndex {
        &self.index
    }

    pub fn grab_state(&self) -> GrabState {
        self.grab.state()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn instances(&self) -> &[AgentInstance] {
        &self.instance_buf
    }

    /// Number of roaming pets (the walker is not counted).
    pub fn pet_count(&self) -> usize {
        self.world.query::<&PetId>().iter().count()
    }

    /// Build a visual for a pet record and drop the agent somewhere on land.
    pub fn spawn_pet<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
        record: &Pet,
        config: &FarmConfig,
    ) -> Result<hecs::Entity, SceneError> {
        let breed = record.visual_breed();
        let visual = scene.create_agent_visual(AgentKind::Pet(breed))?;
        let root = visual.root;
        let at = self
            .terrain
            .random_land_point(&mut self.rng, config.roam.spawn_radius);
        let velocity = pet::random_velocity(&mut self.rng, config.roam.speed);
        let entity = pet::spawn_pet(&mut self.world, &record.id, breed, at, velocity, visual);
        self.index.insert(root, entity);
        log::debug!("spawned {breed} for pet {} at {at:?}", record.id);
        Ok(entity)
    }

    pub fn spawn_walker<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
        config: &FarmConfig,
    ) -> Result<hecs::Entity, SceneError> {
        let visual = scene.create_agent_visual(AgentKind::Walker)?;
        let root = visual.root;
        let entity = pet::spawn_walker(
            &mut self.world,
            config.walker.start(),
            config.walker.speed,
            visual,
        );
        self.index.insert(root, entity);
        log::debug!("spawned walker at {:?}", config.walker.start());
        Ok(entity)
    }

    /// Remove the agent backing a pet record. Returns whether one existed.
    pub fn despawn_pet<S: Scene + ?Sized>(&mut self, scene: &mut S, pet_id: &str) -> bool {
        let found = self
            .world
            .query::<(&PetId, &Visual)>()
            .iter()
            .find(|(_, (id, _))| id.0 == pet_id)
            .map(|(e, (_, visual))| (e, visual.0.root));
        let Some((entity, root)) = found else {
            log::warn!("no agent for pet {pet_id}");
            return false;
        };

        scene.remove_agent_visual(root);
        self.index.remove(root);
        self.grab.forget(entity);
        // Entity came from the query above, so it is alive.
        let _ = self.world.despawn(entity);
        log::debug!("despawned pet {pet_id}");
        true
    }

    /// Advance every system by one fixed tick.
    pub fn tick(&mut self, config: &FarmConfig, timers: &mut SystemTimers) {
        let anim_t = (self.elapsed * ANIMATION_RATE) as f32;
        systems::tick(
            &mut self.world,
            &self.terrain,
            config,
            anim_t,
            &mut self.rng,
            timers,
        );
        self.elapsed += config.tick_seconds();
        self.tick_count += 1;
    }

    /// Build instance buffer from ECS world for the scene.
    pub fn build_instances(&mut self) {
        self.instance_buf.clear();
        for (_, (pos, facing, pose, flags, visual)) in self
            .world
            .query::<(&Position, &Facing, &Pose, &AgentFlags, &Visual)>()
            .iter()
        {
            self.instance_buf.push(AgentInstance::from_components(
                visual.0.root,
                pos,
                facing,
                pose,
                flags,
            ));
        }
    }

    pub fn sync_scene<S: Scene + ?Sized>(&self, scene: &mut S) -> Result<(), SceneError> {
        scene.apply_poses(&self.instance_buf)
    }

    /// Pointer pressed at `ndc` (normalized device coordinates).
    pub fn pointer_down<S: Scene + ?Sized>(&mut self, scene: &S, ndc: Vec2) -> CursorHint {
        let ray = self.camera.ray(ndc);
        self.grab.pointer_down(&mut self.world, &self.index, scene, &ray)
    }

    pub fn pointer_move<S: Scene + ?Sized>(
        &mut self,
        scene: &S,
        ndc: Vec2,
        config: &FarmConfig,
    ) -> CursorHint {
        let ray = self.camera.ray(ndc);
        self.grab
            .pointer_move(&mut self.world, &self.index, scene, &ray, &config.grab)
    }

    pub fn pointer_up(&mut self, config: &FarmConfig) -> CursorHint {
        self.grab
            .pointer_up(&mut self.world, &self.terrain.boundary, &config.grab)
    }
}
