//! Read-only view of an episode for presentation
//!
//! Everything a renderer needs to draw one frame, nothing it could mutate.

use serde::{Deserialize, Serialize};

use super::agent::Agent;
use super::episode::EpisodePhase;
use super::ground::Ground;
use super::obstacle::Obstacle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub tilt: f32,
    pub frame: usize,
}

impl From<&Agent> for AgentView {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            x: agent.x(),
            y: agent.y(),
            tilt: agent.tilt(),
            frame: agent.frame(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleView {
    pub id: u32,
    pub x: f32,
    /// Where to draw the top barrier sprite
    pub top_barrier_y: f32,
    pub gap_top: f32,
    pub gap_bottom: f32,
    pub passed: bool,
}

impl From<&Obstacle> for ObstacleView {
    fn from(obstacle: &Obstacle) -> Self {
        Self {
            id: obstacle.id,
            x: obstacle.x(),
            top_barrier_y: obstacle.top_barrier_y(),
            gap_top: obstacle.gap_top(),
            gap_bottom: obstacle.gap_bottom(),
            passed: obstacle.passed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundView {
    pub y: f32,
    pub x1: f32,
    pub x2: f32,
}

impl From<&Ground> for GroundView {
    fn from(ground: &Ground) -> Self {
        let (x1, x2) = ground.offsets();
        Self { y: ground.y(), x1, x2 }
    }
}

/// One frame's worth of observable episode state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSnapshot {
    pub tick: u64,
    pub score: u32,
    pub phase: EpisodePhase,
    pub agents: Vec<AgentView>,
    pub obstacles: Vec<ObstacleView>,
    pub ground: GroundView,
}
