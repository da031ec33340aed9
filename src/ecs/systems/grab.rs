use crate::config::GrabConfig;
use crate::ecs::components::{AgentFlags, Position};
use crate::ecs::index::VisualIndex;
use crate::pick::Ray;
use crate::scene::Scene;
use crate::spatial::WorldBoundary;

/// Pointer holding state. Pointers are single-contact, so at most one agent
/// is held at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrabState {
    #[default]
    Idle,
    Grabbed(hecs::Entity),
}

/// What the host should show as pointer cursor. `Grabbing` also means the
/// camera controls should be disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    Default,
    Grab,
    Grabbing,
}

/// Maps pointer input to a single held agent.
#[derive(Debug, Default)]
pub struct GrabController {
    state: GrabState,
}

impl GrabController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GrabState {
        self.state
    }

    pub fn held(&self) -> Option<hecs::Entity> {
        match self.state {
            GrabState::Grabbed(e) => Some(e),
            GrabState::Idle => None,
        }
    }

    /// Idle -> Grabbed when the ray hits an agent's visual.
    pub fn pointer_down<S: Scene + ?Sized>(
        &mut self,
        world: &mut hecs::World,
        index: &VisualIndex,
        scene: &S,
        ray: &Ray,
    ) -> CursorHint {
        if let GrabState::Grabbed(_) = self.state {
            log::debug!("pointer down while already holding an agent, ignored");
            return CursorHint::Grabbing;
        }

        let Some(entity) = pick(index, scene, ray) else {
            return CursorHint::Default;
        };
        let Ok(mut flags) = world.get::<&mut AgentFlags>(entity) else {
            return CursorHint::Default;
        };
        flags.walking = false;
        flags.grabbed = true;
        self.state = GrabState::Grabbed(entity);
        log::debug!("grabbed agent {entity:?}");
        CursorHint::Grabbing
    }

    /// Drag the held agent along the ground plane, or update hover when idle.
    pub fn pointer_move<S: Scene + ?Sized>(
        &mut self,
        world: &mut hecs::World,
        index: &VisualIndex,
        scene: &S,
        ray: &Ray,
        grab: &GrabConfig,
    ) -> CursorHint {
        match self.state {
            GrabState::Grabbed(entity) => {
                let Ok(mut pos) = world.get::<&mut Position>(entity) else {
                    // Agent was removed while held.
                    self.state = GrabState::Idle;
                    return CursorHint::Default;
                };
                if let Some(hit) = ray.intersect_plane_y(grab.ground_height) {
                    pos.0.x = hit.x;
                    pos.0.z = hit.z;
                    pos.0.y = grab.lift_height;
                }
                CursorHint::Grabbing
            }
            GrabState::Idle => {
                for (_, flags) in world.query_mut::<&mut AgentFlags>() {
                    flags.hovered = false;
                }
                let hovered = pick(index, scene, ray)
                    .and_then(|e| world.get::<&mut AgentFlags>(e).ok())
                    .map(|mut flags| flags.hovered = true)
                    .is_some();
                if hovered {
                    CursorHint::Grab
                } else {
                    CursorHint::Default
                }
            }
        }
    }

    /// Grabbed -> Idle: drop the agent on the ground and let it roam again.
    /// A drop past the shore lands on the nearest point inside it.
    pub fn pointer_up(
        &mut self,
        world: &mut hecs::World,
        boundary: &WorldBoundary,
        grab: &GrabConfig,
    ) -> CursorHint {
        if let GrabState::Grabbed(entity) = std::mem::take(&mut self.state) {
            if let Ok((pos, flags)) = world.query_one_mut::<(&mut Position, &mut AgentFlags)>(entity) {
                pos.set_ground(boundary.clamp(pos.ground()));
                pos.0.y = grab.ground_height;
                flags.walking = true;
                flags.grabbed = false;
                log::debug!("released agent {entity:?} at {:?}", pos.0);
            }
        }
        CursorHint::Default
    }

    /// Drop any reference to an agent that is being despawned.
    pub fn forget(&mut self, entity: hecs::Entity) {
        if self.state == GrabState::Grabbed(entity) {
            self.state = GrabState::Idle;
        }
    }
}

fn pick<S: Scene + ?Sized>(index: &VisualIndex, scene: &S, ray: &Ray) -> Option<hecs::Entity> {
    scene.raycast(ray).and_then(|root| index.agent(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::Pose;
    use crate::pet::Breed;
    use crate::scene::{AgentInstance, AgentKind, HeadlessScene};
    use glam::{Vec2, Vec3};

    struct Fixture {
        world: hecs::World,
        index: VisualIndex,
        scene: HeadlessScene,
        agents: Vec<hecs::Entity>,
    }

    /// Two agents at known ground positions, synced into the scene.
    fn fixture() -> Fixture {
        let mut world = hecs::World::new();
        let mut index = VisualIndex::new();
        let mut scene = HeadlessScene::new();
        let mut agents = Vec::new();
        let mut instances = Vec::new();
        for x in [0.0, 100.0] {
            let visual = scene.create_agent_visual(AgentKind::Pet(Breed::Shiba)).unwrap();
            let root = visual.root;
            let pos = Position(Vec3::new(x, 0.0, 0.0));
            let e = world.spawn((pos, AgentFlags::default()));
            index.insert(root, e);
            agents.push(e);
            instances.push(AgentInstance::from_components(
                root,
                &pos,
                &crate::ecs::components::Facing(0.0),
                &Pose::rest(4),
                &AgentFlags::default(),
            ));
        }
        scene.apply_poses(&instances).unwrap();
        Fixture {
            world,
            index,
            scene,
            agents,
        }
    }

    fn island() -> WorldBoundary {
        WorldBoundary { radius: 350.0 }
    }

    fn ray_down_at(x: f32, z: f32) -> Ray {
        Ray::new(Vec3::new(x, 200.0, z), Vec3::NEG_Y)
    }

    #[test]
    fn grab_drag_release_cycle() {
        let mut f = fixture();
        let cfg = GrabConfig::default();
        let mut grab = GrabController::new();
        let target = f.agents[1];

        let hint = grab.pointer_down(&mut f.world, &f.index, &f.scene, &ray_down_at(100.0, 0.0));
        assert_eq!(hint, CursorHint::Grabbing);
        assert_eq!(grab.state(), GrabState::Grabbed(target));
        {
            let flags = f.world.get::<&AgentFlags>(target).unwrap();
            assert!(!flags.walking && flags.grabbed);
        }

        grab.pointer_move(&mut f.world, &f.index, &f.scene, &ray_down_at(-30.0, 45.0), &cfg);
        assert_eq!(
            f.world.get::<&Position>(target).unwrap().0,
            Vec3::new(-30.0, 20.0, 45.0)
        );
        assert!(!f.world.get::<&AgentFlags>(target).unwrap().walking);

        grab.pointer_up(&mut f.world, &island(), &cfg);
        assert_eq!(grab.state(), GrabState::Idle);
        let flags = *f.world.get::<&AgentFlags>(target).unwrap();
        assert!(flags.walking && !flags.grabbed);
        assert_eq!(f.world.get::<&Position>(target).unwrap().0.y, 0.0);
    }

    #[test]
    fn drop_past_the_shore_lands_on_the_island() {
        let mut f = fixture();
        let cfg = GrabConfig::default();
        let mut grab = GrabController::new();
        let target = f.agents[1];

        grab.pointer_down(&mut f.world, &f.index, &f.scene, &ray_down_at(100.0, 0.0));
        grab.pointer_move(&mut f.world, &f.index, &f.scene, &ray_down_at(500.0, 0.0), &cfg);
        assert_eq!(f.world.get::<&Position>(target).unwrap().0.x, 500.0);

        grab.pointer_up(&mut f.world, &island(), &cfg);
        let pos = f.world.get::<&Position>(target).unwrap().0;
        assert!(island().contains(Vec2::new(pos.x, pos.z)));
        assert!(pos.x > 349.0);
        assert_eq!(pos.y, 0.0);
    }

    #[test]
    fn pointer_down_on_empty_ground_stays_idle() {
        let mut f = fixture();
        let mut grab = GrabController::new();
        let hint = grab.pointer_down(&mut f.world, &f.index, &f.scene, &ray_down_at(50.0, 50.0));
        assert_eq!(hint, CursorHint::Default);
        assert_eq!(grab.state(), GrabState::Idle);
        for &e in &f.agents {
            assert!(f.world.get::<&AgentFlags>(e).unwrap().walking);
        }
    }

    #[test]
    fn second_pointer_down_keeps_first_agent() {
        let mut f = fixture();
        let mut grab = GrabController::new();
        grab.pointer_down(&mut f.world, &f.index, &f.scene, &ray_down_at(0.0, 0.0));
        grab.pointer_down(&mut f.world, &f.index, &f.scene, &ray_down_at(100.0, 0.0));
        assert_eq!(grab.held(), Some(f.agents[0]));
        assert!(f.world.get::<&AgentFlags>(f.agents[1]).unwrap().walking);
    }

    #[test]
    fn hover_marks_only_first_hit() {
        let mut f = fixture();
        let cfg = GrabConfig::default();
        let mut grab = GrabController::new();

        let hint = grab.pointer_move(&mut f.world, &f.index, &f.scene, &ray_down_at(0.0, 0.0), &cfg);
        assert_eq!(hint, CursorHint::Grab);
        assert!(f.world.get::<&AgentFlags>(f.agents[0]).unwrap().hovered);
        assert!(!f.world.get::<&AgentFlags>(f.agents[1]).unwrap().hovered);

        grab.pointer_move(&mut f.world, &f.index, &f.scene, &ray_down_at(100.0, 0.0), &cfg);
        assert!(!f.world.get::<&AgentFlags>(f.agents[0]).unwrap().hovered);
        assert!(f.world.get::<&AgentFlags>(f.agents[1]).unwrap().hovered);

        let hint = grab.pointer_move(&mut f.world, &f.index, &f.scene, &ray_down_at(50.0, 60.0), &cfg);
        assert_eq!(hint, CursorHint::Default);
        assert!(!f.world.get::<&AgentFlags>(f.agents[1]).unwrap().hovered);
    }

    #[test]
    fn despawned_while_held_returns_to_idle() {
        let mut f = fixture();
        let cfg = GrabConfig::default();
        let mut grab = GrabController::new();
        grab.pointer_down(&mut f.world, &f.index, &f.scene, &ray_down_at(0.0, 0.0));
        f.world.despawn(f.agents[0]).unwrap();

        let hint = grab.pointer_move(&mut f.world, &f.index, &f.scene, &ray_down_at(10.0, 10.0), &cfg);
        assert_eq!(hint, CursorHint::Default);
        assert_eq!(grab.state(), GrabState::Idle);
    }
}
