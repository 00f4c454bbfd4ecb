//! Flap Gym - a side-scrolling flap simulation used as a fitness environment
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, pixel masks, episode bookkeeping)
//! - `config`: Data-driven simulation constants
//! - `eval`: Driving one episode per generation of controllers
//! - `error`: Contract-violation errors

pub mod config;
pub mod error;
pub mod eval;
pub mod sim;

pub use config::SimConfig;
pub use error::{ConfigError, EpisodeError};
pub use eval::{EvalOptions, EvaluationSummary, StopReason, StopSignal, evaluate};

/// Simulation constants
pub mod consts {
    /// Playfield dimensions
    pub const PLAYFIELD_WIDTH: f32 = 500.0;
    pub const PLAYFIELD_HEIGHT: f32 = 800.0;

    /// Agent spawn position (x never changes during an episode)
    pub const AGENT_START_X: f32 = 230.0;
    pub const AGENT_START_Y: f32 = 350.0;

    /// Upward velocity set by a jump
    pub const JUMP_IMPULSE: f32 = -10.5;
    /// displacement = vel * t + GRAVITY * t^2
    pub const GRAVITY: f32 = 1.5;
    /// Per-tick fall displacement cap
    pub const MAX_FALL: f32 = 16.0;
    /// Extra lift applied whenever displacement is upward
    pub const RISE_BOOST: f32 = 2.0;

    /// Tilt (degrees)
    pub const MAX_TILT_UP: f32 = 25.0;
    pub const MAX_TILT_DOWN: f32 = -90.0;
    pub const TILT_DECAY: f32 = 20.0;
    /// Agent keeps its nose up while within this distance below its jump height
    pub const TILT_HOLD_BAND: f32 = 50.0;
    /// Tilt at or below which the glide frame is pinned
    pub const NOSE_DIVE_TILT: f32 = -80.0;

    /// Ticks each animation frame stays on screen
    pub const ANIMATION_TIME: u32 = 5;

    /// Obstacles
    pub const GAP_HEIGHT: f32 = 200.0;
    pub const GAP_TOP_MIN: i32 = 50;
    pub const GAP_TOP_MAX: i32 = 450;
    pub const SCROLL_SPEED: f32 = 5.0;
    pub const FIRST_OBSTACLE_X: f32 = 700.0;
    pub const SPAWN_OBSTACLE_X: f32 = 600.0;

    /// Ground
    pub const GROUND_Y: f32 = 730.0;
    pub const GROUND_SEGMENT_WIDTH: f32 = 672.0;

    /// Fitness shaping
    pub const SURVIVAL_REWARD: f32 = 0.1;
    pub const COLLISION_PENALTY: f32 = 1.0;
    pub const PASS_BONUS: f32 = 5.0;
    /// Actions above this value trigger a jump
    pub const JUMP_THRESHOLD: f32 = 0.5;
}
