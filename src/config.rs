//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`PLANAR_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use planar_math::Vec2;
use planar_physics::{FixtureDefaults, FixtureMaterial, WorldConfig};
use serde::{Serialize, Deserialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// World defaults
    #[serde(default)]
    pub physics: PhysicsConfig,
    /// Materials for the box/circle fixture commands
    #[serde(default)]
    pub fixtures: FixturesConfig,
    /// Frame timing
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Scene to load
    #[serde(default)]
    pub scene: SceneConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`PLANAR_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        // Load user config (optional)
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // Environment variables override everything
        // PLANAR_SCENE__PATH=foo.ron -> scene.path = "foo.ron"
        figment = figment.merge(Env::prefixed("PLANAR_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }

    /// Settings for new Worlds
    pub fn to_world_config(&self) -> WorldConfig {
        WorldConfig {
            fixtures: self.fixtures.to_fixture_defaults(),
            ..self.physics.to_world_config()
        }
    }
}

/// Physics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity [x, y] (negative y = downward)
    pub gravity: [f32; 2],
    /// Solver velocity iterations
    pub velocity_iterations: u32,
    /// Solver position iterations
    pub position_iterations: u32,
    /// Linear damping for new bodies
    pub linear_damping: f32,
    /// Angular damping for new bodies
    pub angular_damping: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        let world = WorldConfig::default();
        Self {
            gravity: [world.gravity.x, world.gravity.y],
            velocity_iterations: world.velocity_iterations,
            position_iterations: world.position_iterations,
            linear_damping: world.linear_damping,
            angular_damping: world.angular_damping,
        }
    }
}

impl PhysicsConfig {
    /// Convert to a World config with default fixture materials
    pub fn to_world_config(&self) -> WorldConfig {
        WorldConfig {
            gravity: Vec2::new(self.gravity[0], self.gravity[1]),
            velocity_iterations: self.velocity_iterations,
            position_iterations: self.position_iterations,
            linear_damping: self.linear_damping,
            angular_damping: self.angular_damping,
            fixtures: FixtureDefaults::default(),
        }
    }
}

/// Fixture material configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixturesConfig {
    /// Density of box and circle fixtures
    pub density: f32,
    pub box_friction: f32,
    pub box_restitution: f32,
    pub circle_friction: f32,
    pub circle_restitution: f32,
}

impl Default for FixturesConfig {
    fn default() -> Self {
        Self {
            density: FixtureMaterial::BOX.density,
            box_friction: FixtureMaterial::BOX.friction,
            box_restitution: FixtureMaterial::BOX.restitution,
            circle_friction: FixtureMaterial::CIRCLE.friction,
            circle_restitution: FixtureMaterial::CIRCLE.restitution,
        }
    }
}

impl FixturesConfig {
    pub fn to_fixture_defaults(&self) -> FixtureDefaults {
        FixtureDefaults {
            box_material: FixtureMaterial::new(self.density, self.box_friction, self.box_restitution),
            circle_material: FixtureMaterial::new(self.density, self.circle_friction, self.circle_restitution),
        }
    }
}

/// Simulation timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed frame duration in seconds for headless runs
    pub frame_seconds: f32,
    /// Number of frames the demo runs
    pub frames: u32,
    /// Cap on a measured frame duration
    pub max_frame_seconds: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            frame_seconds: 1.0 / 60.0,
            frames: 240,
            max_frame_seconds: 0.25,
        }
    }
}

/// Scene configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Path to a RON scene file
    pub path: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            path: "scenes/demo.ron".to_string(),
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.physics.gravity, [0.0, -10.0]);
        assert_eq!(config.physics.velocity_iterations, 6);
        assert_eq!(config.physics.position_iterations, 2);
        assert_eq!(config.scene.path, "scenes/demo.ron");
    }

    #[test]
    fn test_defaults_match_library() {
        let config = AppConfig::default();
        assert_eq!(config.to_world_config(), WorldConfig::default());
    }

    #[test]
    fn test_fixture_overrides_reach_world_config() {
        let mut config = AppConfig::default();
        config.fixtures.box_restitution = 0.0;
        config.fixtures.density = 2.0;
        config.physics.gravity = [0.0, -3.0];

        let world = config.to_world_config();
        assert_eq!(world.gravity, Vec2::new(0.0, -3.0));
        assert_eq!(world.fixtures.box_material, FixtureMaterial::new(2.0, 0.6, 0.0));
        assert_eq!(world.fixtures.circle_material.density, 2.0);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("gravity"));
        assert!(toml.contains("box_friction"));
        assert!(toml.contains("log_level"));
    }
}
