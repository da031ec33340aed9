use std::collections::BTreeMap;

use glam::Vec3;

use crate::pick::Ray;
use crate::scene::{rig, AgentInstance, AgentKind, AgentVisual, Scene, SceneError, VisualId};

/// Picking radius for a pet's bounding sphere.
const PET_HIT_RADIUS: f32 = 12.0;
/// The walker is taller than the pets.
const WALKER_HIT_RADIUS: f32 = 15.0;
/// Sphere centres sit this far above the agent's feet.
const HIT_CENTER_LIFT: f32 = 8.0;

#[derive(Debug, Clone, Copy)]
struct HitSphere {
    center: Vec3,
    radius: f32,
}

/// Scene without any rendering: each visual is a bounding sphere that follows
/// the poses it is given. Used by the headless binary and tests.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    next_id: u32,
    visuals: BTreeMap<VisualId, HitSphere>,
    frames_applied: u64,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.visuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty()
    }

    pub fn contains(&self, root: VisualId) -> bool {
        self.visuals.contains_key(&root)
    }

    pub fn frames_applied(&self) -> u64 {
        self.frames_applied
    }

    /// Where the scene believes a visual's feet are.
    pub fn position_of(&self, root: VisualId) -> Option<Vec3> {
        self.visuals
            .get(&root)
            .map(|s| s.center - Vec3::Y * HIT_CENTER_LIFT)
    }
}

impl Scene for HeadlessScene {
    fn create_agent_visual(&mut self, kind: AgentKind) -> Result<AgentVisual, SceneError> {
        let root = VisualId(self.next_id);
        self.next_id += 1;
        let radius = match kind {
            AgentKind::Walker => WALKER_HIT_RADIUS,
            AgentKind::Pet(_) => PET_HIT_RADIUS,
        };
        self.visuals.insert(
            root,
            HitSphere {
                center: Vec3::Y * HIT_CENTER_LIFT,
                radius,
            },
        );
        let (limbs, has_tail, has_tongue) = rig(kind);
        Ok(AgentVisual {
            root,
            limbs,
            has_tail,
            has_tongue,
        })
    }

    fn remove_agent_visual(&mut self, root: VisualId) {
        self.visuals.remove(&root);
    }

    fn apply_poses(&mut self, instances: &[AgentInstance]) -> Result<(), SceneError> {
        for inst in instances {
            let sphere = self
                .visuals
                .get_mut(&inst.root)
                .ok_or(SceneError::UnknownVisual(inst.root))?;
            sphere.center = inst.position + Vec3::Y * HIT_CENTER_LIFT;
        }
        self.frames_applied += 1;
        Ok(())
    }

    fn raycast(&self, ray: &Ray) -> Option<VisualId> {
        self.visuals
            .iter()
            .filter_map(|(id, s)| ray.intersect_sphere(s.center, s.radius).map(|t| (*id, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}
