use glam::Vec2;
use serde::Deserialize;

/// Axis-aligned rectangle on the ground plane that roaming agents may not
/// cross into or out of (the fenced paddock).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ExclusionZone {
    pub x_min: f32,
    pub x_max: f32,
    pub z_min: f32,
    pub z_max: f32,
}

impl ExclusionZone {
    /// Square zone of side `size` centred on (`cx`, `cz`).
    pub fn square(cx: f32, cz: f32, size: f32) -> Self {
        let half = size * 0.5;
        Self {
            x_min: cx - half,
            x_max: cx + half,
            z_min: cz - half,
            z_max: cz + half,
        }
    }

    /// Inclusive containment after growing the rectangle by `padding` on every side.
    pub fn contains(&self, p: Vec2, padding: f32) -> bool {
        p.x >= self.x_min - padding
            && p.x <= self.x_max + padding
            && p.y >= self.z_min - padding
            && p.y <= self.z_max + padding
    }
}

/// Circular island edge centred at the origin. Anything further out is water.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBoundary {
    pub radius: f32,
}

impl WorldBoundary {
    pub fn contains(&self, p: Vec2) -> bool {
        p.length_squared() <= self.radius * self.radius
    }

    /// Pull a point outside the shore back just inside it.
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        if self.contains(p) {
            p
        } else {
            p.clamp_length_max((self.radius - 1e-3).max(0.0))
        }
    }
}

/// The static collision geometry of the island: one boundary plus the
/// exclusion zones. Immutable for the whole session.
#[derive(Debug, Clone)]
pub struct Terrain {
    pub boundary: WorldBoundary,
    pub zones: Vec<ExclusionZone>,
    /// Margin so zone detection triggers slightly before visual overlap.
    pub padding: f32,
}

impl Terrain {
    pub fn new(radius: f32, zones: Vec<ExclusionZone>, padding: f32) -> Self {
        Self {
            boundary: WorldBoundary { radius },
            zones,
            padding,
        }
    }

    /// Inside any zone counts as inside.
    pub fn in_any_zone(&self, p: Vec2) -> bool {
        self.zones.iter().any(|z| z.contains(p, self.padding))
    }

    /// True when a step from `from` to `to` changes zone membership.
    pub fn crosses_zone_edge(&self, from: Vec2, to: Vec2) -> bool {
        self.in_any_zone(from) != self.in_any_zone(to)
    }

    /// True when a step would leave the island or cross a zone edge.
    pub fn blocks(&self, from: Vec2, to: Vec2) -> bool {
        !self.boundary.contains(to) || self.crosses_zone_edge(from, to)
    }

    /// Uniform-angle random point within `max_radius` of the origin, clamped
    /// to the island. Zones are not avoided; a pet spawned inside a paddock
    /// simply stays in it.
    pub fn random_land_point(&self, rng: &mut fastrand::Rng, max_radius: f32) -> Vec2 {
        let r = rng.f32() * max_radius.min(self.boundary.radius);
        let theta = rng.f32() * std::f32::consts::TAU;
        Vec2::new(theta.cos() * r, theta.sin() * r)
    }
}
