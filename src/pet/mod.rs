use std::fmt;
use std::str::FromStr;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::ecs::components::*;
use crate::scene::AgentVisual;

/// Dog or cat. Diaries reward dogs, completed notes reward cats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetKind {
    Dog,
    Cat,
}

impl PetKind {
    pub const ALL: [PetKind; 2] = [PetKind::Dog, PetKind::Cat];

    pub fn breeds(self) -> &'static [Breed] {
        match self {
            PetKind::Dog => &[Breed::Shiba, Breed::Corgi],
            PetKind::Cat => &[Breed::Munchkin],
        }
    }

    pub fn random(rng: &mut fastrand::Rng) -> Self {
        Self::ALL[rng.usize(0..Self::ALL.len())]
    }

    /// Pick a breed of this kind uniformly.
    pub fn random_breed(self, rng: &mut fastrand::Rng) -> Breed {
        let breeds = self.breeds();
        breeds[rng.usize(0..breeds.len())]
    }

    pub fn label(self) -> &'static str {
        match self {
            PetKind::Dog => "dog",
            PetKind::Cat => "cat",
        }
    }
}

impl FromStr for PetKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dog" => Ok(PetKind::Dog),
            "cat" => Ok(PetKind::Cat),
            _ => Err(UnknownName(s.to_string())),
        }
    }
}

impl fmt::Display for PetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breed {
    Shiba,
    Corgi,
    Munchkin,
}

impl Breed {
    /// Used whenever a stored pet has no recognizable breed.
    pub const FALLBACK: Breed = Breed::Shiba;

    pub fn kind(self) -> PetKind {
        match self {
            Breed::Shiba | Breed::Corgi => PetKind::Dog,
            Breed::Munchkin => PetKind::Cat,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Breed::Shiba => "shiba",
            Breed::Corgi => "corgi",
            Breed::Munchkin => "munchkin",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Breed::Shiba => "Shiba Inu",
            Breed::Corgi => "Corgi",
            Breed::Munchkin => "Munchkin cat",
        }
    }
}

impl FromStr for Breed {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shiba" => Ok(Breed::Shiba),
            "corgi" => Ok(Breed::Corgi),
            "munchkin" => Ok(Breed::Munchkin),
            _ => Err(UnknownName(s.to_string())),
        }
    }
}

impl fmt::Display for Breed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown name: {0:?}")]
pub struct UnknownName(pub String);

/// Random starting velocity for a pet, each axis in `[-speed/2, speed/2)`.
pub fn random_velocity(rng: &mut fastrand::Rng, speed: f32) -> Vec2 {
    Vec2::new((rng.f32() - 0.5) * speed, (rng.f32() - 0.5) * speed)
}

/// Spawn a roaming pet agent at a ground position.
pub fn spawn_pet(
    world: &mut hecs::World,
    pet_id: &str,
    breed: Breed,
    at: Vec2,
    velocity: Vec2,
    visual: AgentVisual,
) -> hecs::Entity {
    let limbs = visual.limbs;
    world.spawn((
        Position(Vec3::new(at.x, 0.0, at.y)),
        Velocity(velocity),
        Facing::from_velocity(velocity),
        AgentFlags::default(),
        Roamer { breed },
        PetId(pet_id.to_string()),
        Visual(visual),
        Pose::rest(limbs),
    ))
}

/// Spawn the scripted walking character.
pub fn spawn_walker(
    world: &mut hecs::World,
    at: Vec2,
    speed: f32,
    visual: AgentVisual,
) -> hecs::Entity {
    let limbs = visual.limbs;
    let walker = Walker { angle: 0.0, speed };
    world.spawn((
        Position(Vec3::new(at.x, 0.0, at.y)),
        Facing(walker_facing(walker.angle)),
        AgentFlags::default(),
        walker,
        Visual(visual),
        Pose::rest(limbs),
    ))
}

/// The walker model faces +z at rest, so its yaw lags the heading by a quarter turn.
pub fn walker_facing(angle: f32) -> f32 {
    -angle + std::f32::consts::FRAC_PI_2
}
