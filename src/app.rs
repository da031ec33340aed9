use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use glam::Vec2;
use instant::Instant;
use thiserror::Error;

use crate::config::{ConfigError, FarmConfig};
use crate::debug::timer::SystemPhase;
use crate::debug::DebugPanel;
use crate::ecs::systems::grab::CursorHint;
use crate::journal::{Farm, FarmEvent, JournalError, Note};
use crate::pet::PetKind;
use crate::pick;
use crate::scene::{Scene, SceneError};
use crate::sim::Simulation;
use crate::store::{KeyValueStore, StoreError};

/// Max accumulated time before we clamp (prevents spiral of death).
const MAX_ACCUMULATOR: f64 = 0.25;

const EMPTY_FARM_NOTICE: &str =
    "No saved data yet. Write a diary to earn a dog, or import a backup to restore your farm.";

#[derive(Error, Debug)]
pub enum FarmError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Top-level application state. Everything the frame loop touches lives here.
pub struct FarmApp<S, K> {
    config: FarmConfig,
    sim: Simulation,
    farm: Farm<K>,
    scene: S,
    debug: DebugPanel,
}

impl<S: Scene, K: KeyValueStore> FarmApp<S, K> {
    /// Spawn an agent for every stored pet plus the walker.
    ///
    /// Any scene failure here aborts: a farm that cannot show its pets is
    /// not worth starting.
    pub fn new(
        config: FarmConfig,
        farm: Farm<K>,
        mut scene: S,
        rng: fastrand::Rng,
    ) -> Result<Self, FarmError> {
        config.validate()?;
        let mut sim = Simulation::new(&config, rng);

        for record in farm.pets() {
            sim.spawn_pet(&mut scene, record, &config)?;
        }
        if config.walker.enabled {
            sim.spawn_walker(&mut scene, &config)?;
        }
        log::info!("Spawned {} pets", sim.pet_count());

        let mut debug = DebugPanel::new();
        if farm.data().is_empty() {
            debug.notice(EMPTY_FARM_NOTICE);
        }

        Ok(Self {
            config,
            sim,
            farm,
            scene,
            debug,
        })
    }

    pub fn config(&self) -> &FarmConfig {
        &self.config
    }

    pub fn sim(&self) -> &Simulation {
        &self.sim
    }

    pub fn farm(&self) -> &Farm<K> {
        &self.farm
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn debug(&self) -> &DebugPanel {
        &self.debug
    }

    /// Run `ticks` simulation ticks, then push one frame of poses to the scene.
    ///
    /// A scene fault is reported to the diagnostics panel; the frame is
    /// dropped but the simulation keeps going.
    pub fn frame(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.sim.tick(&self.config, &mut self.debug.system_timers);
        }

        self.debug.system_timers.begin();
        self.sim.build_instances();
        self.debug.system_timers.end(SystemPhase::BuildInstances);

        self.debug.system_timers.begin();
        let synced = self.sim.sync_scene(&mut self.scene);
        self.debug.system_timers.end(SystemPhase::SceneSync);
        if let Err(e) = synced {
            self.debug.report_error(format!("frame {}: {e}", self.sim.tick_count()));
        }
    }

    pub fn save_diary(&mut self, content: &str) -> Result<(), FarmError> {
        let events = self.farm.save_diary(content)?;
        self.apply(events);
        Ok(())
    }

    pub fn delete_diary(&mut self, id: &str) -> Result<(), FarmError> {
        let events = self.farm.delete_diary(id)?;
        self.apply(events);
        Ok(())
    }

    pub fn add_note(&mut self, content: &str) -> Result<Note, FarmError> {
        let note = self.farm.add_note(content)?;
        self.surface_save_error();
        Ok(note)
    }

    pub fn delete_note(&mut self, id: &str) -> Result<(), FarmError> {
        let events = self.farm.delete_note(id)?;
        self.apply(events);
        Ok(())
    }

    pub fn complete_note(&mut self, id: &str) -> Result<(), FarmError> {
        let events = self.farm.complete_note(id)?;
        self.apply(events);
        Ok(())
    }

    pub fn adopt_pet(&mut self, kind: Option<PetKind>) {
        let events = self.farm.adopt_pet(kind);
        self.apply(events);
    }

    pub fn export(&self) -> Result<String, FarmError> {
        Ok(self.farm.export()?)
    }

    pub fn import(&mut self, json: &str) -> Result<(), FarmError> {
        let events = self.farm.import(json)?;
        self.apply(events);
        Ok(())
    }

    /// Pointer pressed at a pixel position inside a viewport.
    pub fn pointer_down(&mut self, pointer: Vec2, viewport: Vec2) -> CursorHint {
        let ndc = pick::pointer_to_ndc(pointer, viewport);
        self.sim.pointer_down(&self.scene, ndc)
    }

    pub fn pointer_move(&mut self, pointer: Vec2, viewport: Vec2) -> CursorHint {
        let ndc = pick::pointer_to_ndc(pointer, viewport);
        self.sim.pointer_move(&self.scene, ndc, &self.config)
    }

    pub fn pointer_up(&mut self) -> CursorHint {
        self.sim.pointer_up(&self.config)
    }

    /// Turn journal events into agent spawns and despawns.
    fn apply(&mut self, events: Vec<FarmEvent>) {
        for event in events {
            match event {
                FarmEvent::PetAdopted(record) => {
                    if let Err(e) = self.sim.spawn_pet(&mut self.scene, &record, &self.config) {
                        self.debug
                            .report_error(format!("could not show pet {}: {e}", record.id));
                    }
                }
                FarmEvent::PetReleased(id) => {
                    self.sim.despawn_pet(&mut self.scene, &id);
                }
            }
        }
        self.surface_save_error();
    }

    fn surface_save_error(&mut self) {
        if let Some(e) = self.farm.take_save_error() {
            self.debug.report_error(format!("save failed: {e}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Frame loop
// ---------------------------------------------------------------------------

/// Stops a running [`FrameLoop`]. Cloneable, single-threaded.
#[derive(Debug, Clone)]
pub struct LoopHandle {
    running: Rc<Cell<bool>>,
}

impl LoopHandle {
    pub fn stop(&self) {
        self.running.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }
}

/// Fixed-timestep driver: wall-clock time is accumulated and paid out in
/// whole ticks.
pub struct FrameLoop {
    tick_rate: f64,
    accumulator: f64,
    last_frame_time: Option<Instant>,
    running: Rc<Cell<bool>>,
}

impl FrameLoop {
    /// `tick_rate` is seconds per tick.
    pub fn new(tick_rate: f64) -> Self {
        Self {
            tick_rate,
            accumulator: 0.0,
            last_frame_time: None,
            running: Rc::new(Cell::new(true)),
        }
    }

    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            running: Rc::clone(&self.running),
        }
    }

    /// Add `dt` seconds and return how many ticks are due.
    pub fn ticks_for(&mut self, dt: f64) -> u32 {
        self.accumulator += dt;

        if self.accumulator > MAX_ACCUMULATOR {
            self.accumulator = MAX_ACCUMULATOR;
        }

        let mut ticks = 0;
        while self.accumulator >= self.tick_rate {
            self.accumulator -= self.tick_rate;
            ticks += 1;
        }
        ticks
    }

    /// Interpolation alpha between the last tick and the next.
    pub fn interpolation_alpha(&self) -> f32 {
        (self.accumulator / self.tick_rate) as f32
    }

    /// Exactly `n` frames of one tick each, without looking at the clock.
    pub fn step_frames<S: Scene, K: KeyValueStore>(&mut self, app: &mut FarmApp<S, K>, n: u64) {
        for _ in 0..n {
            if !self.running.get() {
                break;
            }
            app.debug.record_frame(self.tick_rate);
            app.frame(1);
        }
    }

    /// Run against the wall clock until stopped or `max_frames` have passed.
    pub fn run<S: Scene, K: KeyValueStore>(
        &mut self,
        app: &mut FarmApp<S, K>,
        max_frames: Option<u64>,
    ) {
        let mut frames = 0u64;
        let frame_budget = Duration::from_secs_f64(self.tick_rate);

        while self.running.get() && max_frames.map_or(true, |max| frames < max) {
            // --- Timing ---
            let now = Instant::now();
            let mut ticks = 0;
            if let Some(last) = self.last_frame_time {
                let dt = now.duration_since(last).as_secs_f64();
                app.debug.record_frame(dt);
                ticks = self.ticks_for(dt);
            }
            self.last_frame_time = Some(now);

            app.frame(ticks);
            frames += 1;

            if let Some(rest) = frame_budget.checked_sub(now.elapsed()) {
                std::thread::sleep(rest);
            }
        }
        log::info!("frame loop stopped after {frames} frames");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::Pet;
    use crate::pet::Breed;
    use crate::pick::Ray;
    use crate::scene::{AgentInstance, AgentKind, AgentVisual, HeadlessScene, VisualId};
    use crate::store::{MemoryStore, PETS_KEY};
    use crate::sync::SyncClient;
    use chrono::Utc;

    /// Headless scene that can be told to fail.
    #[derive(Default)]
    struct FlakyScene {
        inner: HeadlessScene,
        fail_build: bool,
        fail_frames: bool,
    }

    impl Scene for FlakyScene {
        fn create_agent_visual(&mut self, kind: AgentKind) -> Result<AgentVisual, SceneError> {
            if self.fail_build {
                return Err(SceneError::Build(kind, "asset missing".into()));
            }
            self.inner.create_agent_visual(kind)
        }

        fn remove_agent_visual(&mut self, root: VisualId) {
            self.inner.remove_agent_visual(root);
        }

        fn apply_poses(&mut self, instances: &[AgentInstance]) -> Result<(), SceneError> {
            if self.fail_frames {
                return Err(SceneError::Backend("context lost".into()));
            }
            self.inner.apply_poses(instances)
        }

        fn raycast(&self, ray: &Ray) -> Option<VisualId> {
            self.inner.raycast(ray)
        }
    }

    fn farm(store: MemoryStore) -> Farm<MemoryStore> {
        Farm::open(store, SyncClient::offline(), fastrand::Rng::with_seed(9))
    }

    fn app_with(store: MemoryStore) -> FarmApp<FlakyScene, MemoryStore> {
        FarmApp::new(
            FarmConfig::default(),
            farm(store),
            FlakyScene::default(),
            fastrand::Rng::with_seed(4),
        )
        .unwrap()
    }

    #[test]
    fn stored_pets_are_spawned_with_the_walker() {
        let store = MemoryStore::new().with(
            PETS_KEY,
            r#"[{"id":"1","type":"dog","breed":"corgi"},{"id":"2","type":"cat"}]"#,
        );
        let app = app_with(store);
        assert_eq!(app.sim().pet_count(), 2);
        assert_eq!(app.scene().inner.len(), 3);
        assert_eq!(app.debug().messages.len(), 0);
    }

    #[test]
    fn empty_farm_shows_a_hint() {
        let app = app_with(MemoryStore::new());
        assert_eq!(app.sim().pet_count(), 0);
        assert!(app.debug().visible);
        assert_eq!(app.debug().errors().count(), 0);
    }

    #[test]
    fn setup_faults_abort() {
        let scene = FlakyScene {
            fail_build: true,
            ..FlakyScene::default()
        };
        let result = FarmApp::new(
            FarmConfig::default(),
            farm(MemoryStore::new()),
            scene,
            fastrand::Rng::with_seed(1),
        );
        assert!(matches!(result, Err(FarmError::Scene(SceneError::Build(..)))));
    }

    #[test]
    fn invalid_config_aborts() {
        let mut config = FarmConfig::default();
        config.tick_rate = 0.0;
        let result = FarmApp::new(
            config,
            farm(MemoryStore::new()),
            HeadlessScene::new(),
            fastrand::Rng::with_seed(1),
        );
        assert!(matches!(result, Err(FarmError::Config(_))));
    }

    #[test]
    fn journal_changes_reach_the_world() {
        let mut app = app_with(MemoryStore::new());
        app.save_diary("first entry").unwrap();
        assert_eq!(app.sim().pet_count(), 1);

        let note = app.add_note("brush the corgi").unwrap();
        app.complete_note(&note.id).unwrap();
        assert_eq!(app.sim().pet_count(), 2);

        let first = app.farm().diaries()[1].id.clone();
        app.delete_diary(&first).unwrap();
        assert_eq!(app.sim().pet_count(), 1);
        assert_eq!(app.scene().inner.len(), 2);
    }

    #[test]
    fn frame_faults_are_reported_and_the_loop_goes_on() {
        let mut app = app_with(MemoryStore::new());
        app.adopt_pet(Some(PetKind::Dog));
        app.scene_mut().fail_frames = true;

        let mut frames = FrameLoop::new(app.config().tick_seconds());
        frames.step_frames(&mut app, 3);
        assert_eq!(app.debug().error_count, 3);
        assert_eq!(app.sim().tick_count(), 3);

        app.scene_mut().fail_frames = false;
        frames.step_frames(&mut app, 2);
        assert_eq!(app.debug().error_count, 3);
        assert_eq!(app.scene().inner.frames_applied(), 2);
    }

    #[test]
    fn guard_failures_surface_in_the_panel() {
        let at = Utc::now();
        let pets = vec![Pet::new("only".into(), Breed::Munchkin, at)];
        let store = MemoryStore::new().with(PETS_KEY, &serde_json::to_string(&pets).unwrap());
        let mut app = app_with(store);
        let note = app.add_note("last cat goes").unwrap();
        app.delete_note(&note.id).unwrap();

        assert_eq!(app.sim().pet_count(), 0);
        assert_eq!(app.debug().errors().count(), 1);
    }

    #[test]
    fn accumulator_pays_out_whole_ticks() {
        let mut frames = FrameLoop::new(0.125);
        assert_eq!(frames.ticks_for(0.3125), 2);
        assert_eq!(frames.interpolation_alpha(), 0.5);
        assert_eq!(frames.ticks_for(0.0625), 1);
        // A long stall is clamped.
        assert_eq!(frames.ticks_for(10.0), 2);
    }

    #[test]
    fn handle_stops_the_loop() {
        let mut app = app_with(MemoryStore::new());
        let mut frames = FrameLoop::new(app.config().tick_seconds());
        let handle = frames.handle();
        frames.step_frames(&mut app, 5);
        handle.stop();
        assert!(!handle.is_running());
        frames.step_frames(&mut app, 5);
        frames.run(&mut app, Some(10));
        assert_eq!(app.sim().tick_count(), 5);
    }
}
