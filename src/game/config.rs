//! Game Configuration
//!
//! Every tunable constant of the simulation, grouped by concern. Defaults
//! reproduce the classic desert run; a JSON file may override any subset.

use std::path::Path;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Narrowest generation chunk. Smaller chunks would stop advancing once
/// `x + chunk` rounds back to `x` far into the world.
pub const MIN_CHUNK_WIDTH: f32 = 100.0;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its allowed range.
    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field
        field: &'static str,
        /// Human readable constraint
        reason: &'static str,
    },
}

/// Viewport (screen) dimensions in pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Screen width; also the unit for world extension and cleanup distances
    pub width: f32,
    /// Screen height
    pub height: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self { width: 800.0, height: 600.0 }
    }
}

/// Shared physics constants read by every entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Added to `vy` once per frame
    pub gravity: f32,
    /// `vx` multiplier for frames without directional intent
    pub friction: f32,
    /// Distance from the bottom of the viewport to the ground plane
    pub ground_offset: f32,
    /// Global speed scaling applied to every speed stat
    pub speed_factor: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.8,
            friction: 0.85,
            ground_offset: 80.0,
            speed_factor: 1.0,
        }
    }
}

/// Frame driver settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Upper bound on a single frame's delta
    pub max_delta_ms: f32,
    /// Host frame cadence for the async driver
    pub target_fps: u32,
    /// Persist dirty progress at least this often (frames)
    pub autosave_frames: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_delta_ms: 50.0,
            target_fps: 60,
            autosave_frames: 600,
        }
    }
}

/// Player stats and ability timings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Spawn x
    pub start_x: f32,
    /// Maximum (and starting) health
    pub max_health: u8,
    /// Thorns at spawn
    pub start_thorns: u8,
    /// Thorn capacity
    pub max_thorns: u8,
    /// Initial upward velocity of a jump
    pub jump_power: f32,
    /// Minimum time between two throws
    pub thorn_cooldown_ms: f32,
    /// How long a plant lasts before auto-release
    pub plant_duration_ms: f32,
    /// Invulnerability window after taking damage
    pub invulnerability_ms: f32,
    /// Horizontal knockback magnitude on damage
    pub knockback_x: f32,
    /// Upward knockback magnitude on damage
    pub knockback_y: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_x: 100.0,
            max_health: 3,
            start_thorns: 5,
            max_thorns: 10,
            jump_power: 15.0,
            thorn_cooldown_ms: 300.0,
            plant_duration_ms: 3000.0,
            invulnerability_ms: 2000.0,
            knockback_x: 8.0,
            knockback_y: 5.0,
        }
    }
}

/// World generation, lifecycle and pacing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Width of the world at start, in screens
    pub initial_screens: f32,
    /// Screens added per extension
    pub extend_screens: f32,
    /// Extend when furthest progress is within this many screens of the edge
    pub extend_margin_screens: f32,
    /// Purge entities this many screens behind the player
    pub cleanup_screens: f32,
    /// Width of one procedural population chunk
    pub chunk_width: f32,
    /// Horizontal span of one biome
    pub biome_span: f32,
    /// Fraction of a biome span after which its guardian appears
    pub boss_trigger_fraction: f32,
    /// Distance per difficulty level
    pub difficulty_step: f32,
    /// Pickup spawn cadence ahead of the player
    pub power_up_interval_ms: f32,
    /// Delay before the first sand storm
    pub first_storm_ms: f32,
    /// Base storm cadence at difficulty 1
    pub storm_interval_ms: f32,
    /// Storm cadence reduction per difficulty level
    pub storm_interval_step_ms: f32,
    /// Storm cadence floor
    pub storm_interval_min_ms: f32,
    /// Random extra delay added to each storm interval
    pub storm_jitter_ms: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            initial_screens: 2.0,
            extend_screens: 3.0,
            extend_margin_screens: 2.0,
            cleanup_screens: 3.0,
            chunk_width: 800.0,
            biome_span: 5000.0,
            boss_trigger_fraction: 0.8,
            difficulty_step: 3000.0,
            power_up_interval_ms: 15000.0,
            first_storm_ms: 15000.0,
            storm_interval_ms: 20000.0,
            storm_interval_step_ms: 1500.0,
            storm_interval_min_ms: 8000.0,
            storm_jitter_ms: 10000.0,
        }
    }
}

/// Win condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalConfig {
    /// Flowers needed to complete the level
    pub target_flowers: u32,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self { target_flowers: 100 }
    }
}

/// Complete game configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for all procedural decisions
    pub seed: u64,
    /// Screen
    pub viewport: ViewportConfig,
    /// Physics kernel constants
    pub physics: PhysicsConfig,
    /// Frame driver
    pub frame: LoopConfig,
    /// Player
    pub player: PlayerConfig,
    /// World generation and lifecycle
    pub world: WorldConfig,
    /// Win condition
    pub goal: GoalConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0xCAC7_05,
            viewport: ViewportConfig::default(),
            physics: PhysicsConfig::default(),
            frame: LoopConfig::default(),
            player: PlayerConfig::default(),
            world: WorldConfig::default(),
            goal: GoalConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Check cross-field and range constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid { field, reason })
        }

        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return invalid("viewport", "dimensions must be positive");
        }
        if self.physics.ground_offset < 0.0 || self.physics.ground_offset >= self.viewport.height {
            return invalid("physics.ground_offset", "must lie inside the viewport");
        }
        if !(0.0..=1.0).contains(&self.physics.friction) {
            return invalid("physics.friction", "must be within [0, 1]");
        }
        if self.physics.speed_factor <= 0.0 {
            return invalid("physics.speed_factor", "must be positive");
        }
        if self.frame.max_delta_ms <= 0.0 {
            return invalid("frame.max_delta_ms", "must be positive");
        }
        if self.frame.target_fps == 0 {
            return invalid("frame.target_fps", "must be non-zero");
        }
        if self.player.max_health == 0 {
            return invalid("player.max_health", "must be at least 1");
        }
        if self.player.start_thorns > self.player.max_thorns {
            return invalid("player.start_thorns", "cannot exceed max_thorns");
        }
        if self.world.extend_margin_screens >= self.world.extend_screens + self.world.initial_screens {
            return invalid("world.extend_margin_screens", "must be smaller than the generated span");
        }
        if self.world.chunk_width.is_nan() || self.world.chunk_width < MIN_CHUNK_WIDTH {
            return invalid("world.chunk_width", "must be at least 100 px");
        }
        if self.world.biome_span <= 0.0 || self.world.difficulty_step <= 0.0 {
            return invalid("world", "spans must be positive");
        }
        if !(0.0..1.0).contains(&self.world.boss_trigger_fraction) {
            return invalid("world.boss_trigger_fraction", "must be within [0, 1)");
        }
        if self.goal.target_flowers == 0 {
            return invalid("goal.target_flowers", "must be at least 1");
        }
        Ok(())
    }

    /// Y coordinate of the ground plane.
    #[inline]
    pub fn ground_y(&self) -> f32 {
        self.viewport.height - self.physics.ground_offset
    }

    /// One screen width, the unit of world extension and cleanup.
    #[inline]
    pub fn screen_width(&self) -> f32 {
        self.viewport.width
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ground_y(), 520.0);
        assert_eq!(config.screen_width(), 800.0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = GameConfig::from_json_str(r#"{ "seed": 7, "goal": { "target_flowers": 10 } }"#)
            .expect("valid config");
        assert_eq!(config.seed, 7);
        assert_eq!(config.goal.target_flowers, 10);
        assert_eq!(config.physics.gravity, 0.8);
        assert_eq!(config.player.max_thorns, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = GameConfig::from_json_str(r#"{ "player": { "start_thorns": 20, "max_thorns": 10 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "player.start_thorns", .. }));

        let err = GameConfig::from_json_str(r#"{ "physics": { "friction": 1.5 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "physics.friction", .. }));
    }

    #[test]
    fn test_tiny_chunk_width_rejected() {
        let err = GameConfig::from_json_str(r#"{"world":{"chunk_width":0.00001}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "world.chunk_width", .. }));

        let err = GameConfig::from_json_str(r#"{"world":{"chunk_width":0.0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "world.chunk_width", .. }));

        let ok = GameConfig::from_json_str(r#"{"world":{"chunk_width":100.0}}"#);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = GameConfig::from_json_str("{ seed: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = GameConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
