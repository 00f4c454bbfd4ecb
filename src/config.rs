//! Simulation configuration
//!
//! Every tunable constant an episode consumes at construction. Defaults come
//! from [`crate::consts`]; a JSON file may override any subset of them.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Fixed values consumed when an episode is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Playfield ===
    pub playfield_width: f32,
    pub playfield_height: f32,
    /// Where every agent starts
    pub agent_start: Vec2,

    // === Agent physics ===
    pub jump_impulse: f32,
    pub gravity: f32,
    pub max_fall: f32,
    pub rise_boost: f32,

    // === Obstacles ===
    pub gap_height: f32,
    /// Gap top is drawn uniformly from `gap_top_min..gap_top_max`
    pub gap_top_min: i32,
    pub gap_top_max: i32,
    pub scroll_speed: f32,
    pub first_obstacle_x: f32,
    pub spawn_obstacle_x: f32,

    // === Ground ===
    pub ground_y: f32,
    pub ground_segment_width: f32,

    // === Fitness shaping ===
    pub survival_reward: f32,
    pub collision_penalty: f32,
    pub pass_bonus: f32,
    pub jump_threshold: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            playfield_width: PLAYFIELD_WIDTH,
            playfield_height: PLAYFIELD_HEIGHT,
            agent_start: Vec2::new(AGENT_START_X, AGENT_START_Y),

            jump_impulse: JUMP_IMPULSE,
            gravity: GRAVITY,
            max_fall: MAX_FALL,
            rise_boost: RISE_BOOST,

            gap_height: GAP_HEIGHT,
            gap_top_min: GAP_TOP_MIN,
            gap_top_max: GAP_TOP_MAX,
            scroll_speed: SCROLL_SPEED,
            first_obstacle_x: FIRST_OBSTACLE_X,
            spawn_obstacle_x: SPAWN_OBSTACLE_X,

            ground_y: GROUND_Y,
            ground_segment_width: GROUND_SEGMENT_WIDTH,

            survival_reward: SURVIVAL_REWARD,
            collision_penalty: COLLISION_PENALTY,
            pass_bonus: PASS_BONUS,
            jump_threshold: JUMP_THRESHOLD,
        }
    }
}

impl SimConfig {
    /// Load from a JSON file; absent fields keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        log::info!("Loaded simulation config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Write as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Simulation config saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gap_top_min >= self.gap_top_max {
            return Err(ConfigError::Invalid(format!(
                "empty gap range {}..{}",
                self.gap_top_min, self.gap_top_max
            )));
        }
        if self.scroll_speed <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "scroll speed must be positive, got {}",
                self.scroll_speed
            )));
        }
        if self.ground_segment_width <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "ground segment width must be positive, got {}",
                self.ground_segment_width
            )));
        }
        if self.gap_height <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "gap height must be positive, got {}",
                self.gap_height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: SimConfig = serde_json::from_str(r#"{ "gap_height": 150.0 }"#).unwrap();
        assert_eq!(config.gap_height, 150.0);
        assert_eq!(config.scroll_speed, SCROLL_SPEED);
        assert_eq!(config.agent_start, Vec2::new(AGENT_START_X, AGENT_START_Y));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = SimConfig {
            gap_top_min: 300,
            gap_top_max: 300,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = SimConfig {
            scroll_speed: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.json");

        let config = SimConfig {
            first_obstacle_x: 640.0,
            pass_bonus: 3.0,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(SimConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SimConfig::load("/nonexistent/flap-gym.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
