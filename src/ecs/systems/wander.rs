use std::f32::consts::PI;

use glam::Vec2;

use crate::config::WalkerConfig;
use crate::ecs::components::{AgentFlags, Facing, Position, Walker};
use crate::pet::walker_facing;
use crate::spatial::Terrain;

/// Advance the scripted walker(s) by one tick.
///
/// Unlike pets, a walker keeps a heading. A blocked step turns it by a large
/// random angle (144 to 216 degrees) instead of mirroring a velocity.
pub fn update(
    world: &mut hecs::World,
    terrain: &Terrain,
    walker_cfg: &WalkerConfig,
    rng: &mut fastrand::Rng,
) {
    for (_, (pos, facing, flags, walker)) in
        world.query_mut::<(&mut Position, &mut Facing, &AgentFlags, &mut Walker)>()
    {
        if !flags.roaming() {
            continue;
        }

        let current = pos.ground();
        let next = current + Vec2::new(walker.angle.cos(), walker.angle.sin()) * walker.speed;

        if terrain.blocks(current, next) {
            walker.angle += PI * (0.8 + rng.f32() * 0.4);
        } else {
            pos.set_ground(next);
        }

        facing.0 = walker_facing(walker.angle);

        if rng.f32() < walker_cfg.jitter_chance {
            walker.angle += (rng.f32() - 0.5) * 2.0;
        }
    }
}
