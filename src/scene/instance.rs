use glam::Vec3;

use crate::ecs::components::{AgentFlags, Facing, Pose, Position};
use crate::scene::VisualId;

/// Per-agent pose handed to the scene each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentInstance {
    pub root: VisualId,
    pub position: Vec3,
    /// Yaw in radians.
    pub rotation: f32,
    /// Uniform scale (breathing, hover highlight).
    pub scale: f32,
    /// Leg rotations about X.
    pub limb_swing: Vec<f32>,
    pub tail_yaw: f32,
    pub tongue_stretch: f32,
    pub hint_visible: bool,
    pub grabbed: bool,
}

impl AgentInstance {
    /// Build an AgentInstance from ECS components.
    pub fn from_components(
        root: VisualId,
        pos: &Position,
        facing: &Facing,
        pose: &Pose,
        flags: &AgentFlags,
    ) -> Self {
        Self {
            root,
            position: pos.0,
            rotation: facing.0,
            scale: pose.scale,
            limb_swing: pose.limb_swing.clone(),
            tail_yaw: pose.tail_yaw,
            tongue_stretch: pose.tongue_stretch,
            hint_visible: pose.hint_visible,
            grabbed: flags.grabbed,
        }
    }
}
