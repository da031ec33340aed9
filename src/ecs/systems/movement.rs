use crate::config::RoamConfig;
use crate::ecs::components::{AgentFlags, Facing, Position, Roamer, Velocity};
use crate::pet;
use crate::spatial::Terrain;

/// Advance every roaming pet by one tick.
///
/// The tentative step is checked one tick ahead: leaving the island or
/// crossing a zone edge reverses the velocity and the pet stays put.
/// Grabbed pets and pets that are not walking are skipped.
pub fn integrate(
    world: &mut hecs::World,
    terrain: &Terrain,
    roam: &RoamConfig,
    rng: &mut fastrand::Rng,
) {
    for (_, (pos, vel, facing, flags, _)) in world
        .query_mut::<(&mut Position, &mut Velocity, &mut Facing, &AgentFlags, &Roamer)>()
    {
        if !flags.roaming() {
            continue;
        }

        let current = pos.ground();
        let mut next = current + vel.0;

        // Island edge
        if !terrain.boundary.contains(next) {
            reverse(vel, facing);
            next = current;
        }

        // Paddock fence, in either direction
        if terrain.crosses_zone_edge(current, next) {
            reverse(vel, facing);
            next = current;
        }

        pos.set_ground(next);

        // Occasional random turn
        if rng.f32() < roam.turn_chance {
            vel.0 = pet::random_velocity(rng, roam.speed);
            *facing = Facing::from_velocity(vel.0);
        }
    }
}

fn reverse(vel: &mut Velocity, facing: &mut Facing) {
    vel.0 = -vel.0;
    *facing = Facing::from_velocity(vel.0);
}
