use crate::ecs::components::{AgentFlags, Pose, Position, Visual, Walker};

/// Peak hop height while walking.
const BOUNCE_HEIGHT: f32 = 5.0;
/// Leg swing amplitude (radians) for four-legged pets.
const PET_LEG_SWING: f32 = 0.6;
/// Leg swing amplitude (radians) for the walker.
const WALKER_LEG_SWING: f32 = 0.5;
const TAIL_RATE: f32 = 12.0;
const TAIL_SWING: f32 = 0.8;
const TONGUE_RATE: f32 = 15.0;
const BREATH_RATE: f32 = 3.0;
const BREATH_DEPTH: f32 = 0.03;
/// Scale applied to the agent under the pointer.
const HOVER_SCALE: f32 = 1.05;

/// Parameters shared by every cosmetic animation this frame.
#[derive(Debug, Clone, Copy)]
pub struct AnimationClock {
    /// Animation phase: elapsed seconds scaled by the animation rate.
    pub t: f32,
    pub pet_stride_rate: f32,
    pub walker_stride_rate: f32,
}

/// Purely visual secondary motion. Reads nothing but the clock and flags.
pub fn update(world: &mut hecs::World, clock: AnimationClock) {
    for (_, (pos, pose, flags, visual, walker)) in world.query_mut::<(
        &mut Position,
        &mut Pose,
        &AgentFlags,
        &Visual,
        Option<&Walker>,
    )>() {
        if flags.roaming() {
            let is_walker = walker.is_some();
            let (stride, swing) = if is_walker {
                (clock.walker_stride_rate, WALKER_LEG_SWING)
            } else {
                (clock.pet_stride_rate, PET_LEG_SWING)
            };
            let phase = (clock.t * stride).sin();

            pos.0.y = phase.abs() * BOUNCE_HEIGHT;

            for (i, leg) in pose.limb_swing.iter_mut().enumerate() {
                *leg = phase * swing * leg_phase(i, visual.0.limbs);
            }

            if visual.0.has_tail {
                pose.tail_yaw = (clock.t * TAIL_RATE).sin() * TAIL_SWING;
            }
            if visual.0.has_tongue {
                pose.tongue_stretch = 0.5 + (clock.t * TONGUE_RATE).sin().abs() * 1.5;
            }

            pose.scale = if is_walker {
                1.0
            } else {
                1.0 + (clock.t * BREATH_RATE).sin() * BREATH_DEPTH
            };
        }

        // Hover highlight
        if flags.hovered {
            pose.scale = HOVER_SCALE;
            pose.hint_visible = true;
        } else {
            pose.hint_visible = false;
            if !flags.walking && !flags.grabbed {
                pose.scale = 1.0;
            }
        }
    }
}

/// Diagonal legs move together on quadrupeds; a biped alternates.
fn leg_phase(index: usize, limbs: usize) -> f32 {
    let forward = if limbs == 4 {
        index == 0 || index == 3
    } else {
        index % 2 == 0
    };
    if forward {
        1.0
    } else {
        -1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{AgentVisual, VisualId};
    use glam::Vec3;

    fn visual(limbs: usize, tail: bool, tongue: bool) -> Visual {
        Visual(AgentVisual {
            root: VisualId(0),
            limbs,
            has_tail: tail,
            has_tongue: tongue,
        })
    }

    fn clock(t: f32) -> AnimationClock {
        AnimationClock {
            t,
            pet_stride_rate: 6.0,
            walker_stride_rate: 8.0,
        }
    }

    #[test]
    fn walking_pet_bounces_and_swings() {
        let mut world = hecs::World::new();
        let e = world.spawn((
            Position(Vec3::ZERO),
            Pose::rest(4),
            AgentFlags::default(),
            visual(4, true, true),
        ));
        let t = 0.2;
        update(&mut world, clock(t));

        let phase = (t * 6.0).sin();
        let pos = world.get::<&Position>(e).unwrap().0;
        assert!((pos.y - phase.abs() * 5.0).abs() < 1e-6);
        let pose = world.get::<&Pose>(e).unwrap();
        assert_eq!(pose.limb_swing[0], phase * 0.6);
        assert_eq!(pose.limb_swing[1], -phase * 0.6);
        assert_eq!(pose.limb_swing[3], phase * 0.6);
        assert!((pose.tail_yaw - (t * 12.0).sin() * 0.8).abs() < 1e-6);
        assert!(pose.tongue_stretch >= 0.5 && pose.tongue_stretch <= 2.0);
        assert!((pose.scale - 1.0).abs() <= 0.03 + 1e-6);
    }

    #[test]
    fn grabbed_agent_keeps_its_height() {
        let mut world = hecs::World::new();
        let flags = AgentFlags {
            walking: false,
            hovered: false,
            grabbed: true,
        };
        let e = world.spawn((
            Position(Vec3::new(1.0, 20.0, 1.0)),
            Pose::rest(4),
            flags,
            visual(4, false, false),
        ));
        update(&mut world, clock(1.3));
        assert_eq!(world.get::<&Position>(e).unwrap().0.y, 20.0);
    }

    #[test]
    fn hover_highlights_and_clears() {
        let mut world = hecs::World::new();
        let e = world.spawn((
            Position(Vec3::ZERO),
            Pose::rest(2),
            AgentFlags {
                walking: false,
                hovered: true,
                grabbed: false,
            },
            visual(2, false, false),
            Walker {
                angle: 0.0,
                speed: 0.5,
            },
        ));
        update(&mut world, clock(0.7));
        {
            let pose = world.get::<&Pose>(e).unwrap();
            assert_eq!(pose.scale, HOVER_SCALE);
            assert!(pose.hint_visible);
        }

        world.get::<&mut AgentFlags>(e).unwrap().hovered = false;
        update(&mut world, clock(0.8));
        let pose = world.get::<&Pose>(e).unwrap();
        assert_eq!(pose.scale, 1.0);
        assert!(!pose.hint_visible);
    }

    #[test]
    fn biped_legs_alternate() {
        assert_eq!(leg_phase(0, 2), 1.0);
        assert_eq!(leg_phase(1, 2), -1.0);
        assert_eq!(leg_phase(2, 4), -1.0);
    }
}
