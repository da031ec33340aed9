use glam::{Vec2, Vec3};

use crate::pet::Breed;
use crate::scene::AgentVisual;

/// World position. Ground plane is XZ, Y is up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub Vec3);

impl Position {
    /// Projection onto the ground plane as (x, z).
    pub fn ground(&self) -> Vec2 {
        Vec2::new(self.0.x, self.0.z)
    }

    pub fn set_ground(&mut self, p: Vec2) {
        self.0.x = p.x;
        self.0.z = p.y;
    }
}

/// Per-tick displacement on the ground plane: `x` is vx, `y` is vz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity(pub Vec2);

/// Yaw in radians about the up axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facing(pub f32);

impl Facing {
    /// Align the forward axis with a ground velocity.
    pub fn from_velocity(vel: Vec2) -> Self {
        Self((-vel.y).atan2(vel.x))
    }
}

/// Behavioral flags shared by every agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentFlags {
    pub walking: bool,
    pub hovered: bool,
    pub grabbed: bool,
}

impl Default for AgentFlags {
    fn default() -> Self {
        Self {
            walking: true,
            hovered: false,
            grabbed: false,
        }
    }
}

impl AgentFlags {
    /// Eligible for autonomous motion this tick.
    pub fn roaming(&self) -> bool {
        self.walking && !self.grabbed
    }
}

/// A pet that bounces around with a discrete velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roamer {
    pub breed: Breed,
}

/// The scripted character: holds a heading and turns on collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Walker {
    /// Heading angle on the ground plane (radians, x toward cos, z toward sin).
    pub angle: f32,
    pub speed: f32,
}

/// Id of the pet record backing this agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PetId(pub String);

/// Handle to the agent's visual in the scene collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Visual(pub AgentVisual);

/// Cosmetic animation output. Depends only on elapsed time.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    /// Leg rotation about X, one per limb.
    pub limb_swing: Vec<f32>,
    pub tail_yaw: f32,
    pub tongue_stretch: f32,
    pub scale: f32,
    /// Whether the "grab me" hint label is shown.
    pub hint_visible: bool,
}

impl Pose {
    pub fn rest(limbs: usize) -> Self {
        Self {
            limb_swing: vec![0.0; limbs],
            tail_yaw: 0.0,
            tongue_stretch: 1.0,
            scale: 1.0,
            hint_visible: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_follows_velocity() {
        let f = Facing::from_velocity(Vec2::new(1.0, 0.0));
        assert_eq!(f.0, 0.0);
        // Moving toward +z turns the forward axis to -90 degrees.
        let f = Facing::from_velocity(Vec2::new(0.0, 1.0));
        assert!((f.0 + std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn ground_projection_round_trips() {
        let mut pos = Position(Vec3::new(1.0, 7.0, 3.0));
        assert_eq!(pos.ground(), Vec2::new(1.0, 3.0));
        pos.set_ground(Vec2::new(-4.0, 9.0));
        assert_eq!(pos.0, Vec3::new(-4.0, 7.0, 9.0));
    }

    #[test]
    fn grabbed_agents_do_not_roam() {
        let mut flags = AgentFlags::default();
        assert!(flags.roaming());
        flags.grabbed = true;
        assert!(!flags.roaming());
    }
}
