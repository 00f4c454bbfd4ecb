//! Deterministic simulation module
//!
//! All episode logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Injected, seeded RNG only
//! - Stable iteration order (roster order, obstacles oldest first)
//! - No rendering or platform dependencies

pub mod agent;
pub mod episode;
pub mod ground;
pub mod mask;
pub mod obstacle;
pub mod roster;
pub mod snapshot;
pub mod sprites;

pub use agent::Agent;
pub use episode::{Episode, EpisodeEvent, EpisodePhase, RetireCause, StepReport};
pub use ground::Ground;
pub use mask::Mask;
pub use obstacle::Obstacle;
pub use roster::{Controller, FitnessAccumulator, Observation, Roster, RosterEntry};
pub use snapshot::{AgentView, EpisodeSnapshot, GroundView, ObstacleView};
pub use sprites::{SpriteError, SpriteSheet};
