//! Tunable constants, loadable from a TOML file.
//!
//! Every field has a default matching the stock island, so an empty or
//! partial file is valid.

use std::fs;
use std::path::Path;

use glam::{Vec2, Vec3};
use serde::Deserialize;
use thiserror::Error;

use crate::spatial::{ExclusionZone, Terrain};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FarmConfig {
    pub world: WorldConfig,
    pub roam: RoamConfig,
    pub walker: WalkerConfig,
    pub grab: GrabConfig,
    pub camera: CameraConfig,
    /// Simulation ticks per second. One tick is one animation frame.
    pub tick_rate: f64,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            roam: RoamConfig::default(),
            walker: WalkerConfig::default(),
            grab: GrabConfig::default(),
            camera: CameraConfig::default(),
            tick_rate: 60.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub boundary_radius: f32,
    pub zones: Vec<ExclusionZone>,
    pub zone_padding: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            boundary_radius: 400.0,
            zones: vec![ExclusionZone::square(100.0, 100.0, 60.0)],
            zone_padding: 5.0,
        }
    }
}

/// Pet roaming parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoamConfig {
    /// Width of the per-axis velocity range; components land in `[-speed/2, speed/2)`.
    pub speed: f32,
    /// Per-tick chance of picking a fresh random velocity.
    pub turn_chance: f32,
    /// New pets appear within this distance of the origin.
    pub spawn_radius: f32,
    /// Leg/bounce cycle frequency.
    pub stride_rate: f32,
}

impl Default for RoamConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            turn_chance: 0.01,
            spawn_radius: 200.0,
            stride_rate: 6.0,
        }
    }
}

/// The scripted walking character.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    pub enabled: bool,
    pub start: [f32; 2],
    pub speed: f32,
    pub jitter_chance: f32,
    pub stride_rate: f32,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start: [-50.0, 50.0],
            speed: 0.5,
            jitter_chance: 0.01,
            stride_rate: 8.0,
        }
    }
}

impl WalkerConfig {
    pub fn start(&self) -> Vec2 {
        Vec2::from(self.start)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GrabConfig {
    /// Height a held agent floats at while dragged.
    pub lift_height: f32,
    /// Height of the drag plane and of released agents.
    pub ground_height: f32,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            lift_height: 20.0,
            ground_height: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [150.0, 200.0, 250.0],
            target: [0.0, 0.0, 0.0],
            fov_y_degrees: 60.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

impl CameraConfig {
    pub fn eye(&self) -> Vec3 {
        Vec3::from(self.eye)
    }

    pub fn target(&self) -> Vec3 {
        Vec3::from(self.target)
    }
}

impl FarmConfig {
    /// Load from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config: FarmConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.boundary_radius <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "world.boundary_radius must be positive, got {}",
                self.world.boundary_radius
            )));
        }
        if self.tick_rate <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tick_rate must be positive, got {}",
                self.tick_rate
            )));
        }
        for zone in &self.world.zones {
            if zone.x_min > zone.x_max || zone.z_min > zone.z_max {
                return Err(ConfigError::Invalid(format!("inverted zone {zone:?}")));
            }
        }
        if !(0.0..=1.0).contains(&self.roam.turn_chance)
            || !(0.0..=1.0).contains(&self.walker.jitter_chance)
        {
            return Err(ConfigError::Invalid("chances must lie in [0, 1]".into()));
        }
        Ok(())
    }

    pub fn terrain(&self) -> Terrain {
        Terrain::new(
            self.world.boundary_radius,
            self.world.zones.clone(),
            self.world.zone_padding,
        )
    }

    /// Seconds per simulation tick.
    pub fn tick_seconds(&self) -> f64 {
        1.0 / self.tick_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: FarmConfig = toml::from_str(
            r#"
            tick_rate = 30.0

            [world]
            zone_padding = 2.5

            [grab]
            lift_height = 12.0
            "#,
        )
        .unwrap();
        assert_eq!(config.tick_rate, 30.0);
        assert_eq!(config.world.zone_padding, 2.5);
        assert_eq!(config.world.boundary_radius, 400.0);
        assert_eq!(config.world.zones.len(), 1);
        assert_eq!(config.grab.lift_height, 12.0);
        assert_eq!(config.walker.speed, 0.5);
    }

    #[test]
    fn zones_parse_from_tables() {
        let config: FarmConfig = toml::from_str(
            r#"
            [[world.zones]]
            x_min = -10.0
            x_max = 10.0
            z_min = -20.0
            z_max = 20.0
            "#,
        )
        .unwrap();
        assert_eq!(config.world.zones.len(), 1);
        assert_eq!(config.world.zones[0].z_max, 20.0);
    }

    #[test]
    fn rejects_inverted_zone() {
        let mut config = FarmConfig::default();
        config.world.zones = vec![ExclusionZone {
            x_min: 5.0,
            x_max: -5.0,
            z_min: 0.0,
            z_max: 1.0,
        }];
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = FarmConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn default_is_valid() {
        FarmConfig::default().validate().unwrap();
        assert!((FarmConfig::default().tick_seconds() - 1.0 / 60.0).abs() < 1e-12);
    }
}
