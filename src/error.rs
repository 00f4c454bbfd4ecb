//! Contract-violation errors
//!
//! Agent deaths and episode termination are ordinary state transitions, not
//! errors. These types only cover misuse by a caller.

/// Misuse of an [`Episode`](crate::sim::Episode)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EpisodeError {
    /// One action is required per live agent, in roster order
    #[error("expected {expected} actions (one per live agent), got {actual}")]
    ActionCountMismatch { expected: usize, actual: usize },
}

/// Problems loading or validating a [`SimConfig`](crate::SimConfig)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
