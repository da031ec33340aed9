pub mod animation;
pub mod grab;
pub mod movement;
pub mod wander;

use crate::config::FarmConfig;
use crate::debug::timer::{SystemPhase, SystemTimers};
use crate::spatial::Terrain;
use animation::AnimationClock;

/// Run all simulation systems for one fixed tick.
pub fn tick(
    world: &mut hecs::World,
    terrain: &Terrain,
    config: &FarmConfig,
    anim_t: f32,
    rng: &mut fastrand::Rng,
    timers: &mut SystemTimers,
) {
    // 1. Pet motion with boundary / paddock reflection
    timers.begin();
    movement::integrate(world, terrain, &config.roam, rng);
    timers.end(SystemPhase::Movement);

    // 2. Scripted walker
    timers.begin();
    wander::update(world, terrain, &config.walker, rng);
    timers.end(SystemPhase::Wander);

    // 3. Cosmetic animation
    timers.begin();
    animation::update(
        world,
        AnimationClock {
            t: anim_t,
            pet_stride_rate: config.roam.stride_rate,
            walker_stride_rate: config.walker.stride_rate,
        },
    );
    timers.end(SystemPhase::Animation);
}
