//! Scrolling barrier pair with a randomized vertical gap

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::agent::Agent;
use super::sprites::SpriteSheet;
use crate::config::SimConfig;

/// Round half to even, then to a pixel offset
#[inline]
fn pixel(v: f32) -> i32 {
    v.round_ties_even() as i32
}

/// A top and bottom barrier separated by a fixed-height gap
///
/// Geometry is fixed at construction; only `x` changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    /// Left (leading) edge
    x: f32,
    /// Bottom edge of the top barrier
    gap_top: f32,
    /// Top edge of the bottom barrier
    gap_bottom: f32,
    /// Y of the top barrier sprite's upper-left corner
    top_y: f32,
    width: f32,
    passed: bool,
}

impl Obstacle {
    /// New obstacle with a random gap
    pub fn new<R: Rng + ?Sized>(
        id: u32,
        x: f32,
        config: &SimConfig,
        sprites: &SpriteSheet,
        rng: &mut R,
    ) -> Self {
        let mut obstacle = Self::with_gap(id, x, 0.0, config, sprites);
        obstacle.regenerate_gap(config, sprites, rng);
        obstacle
    }

    /// New obstacle with an explicit gap top
    pub fn with_gap(id: u32, x: f32, gap_top: f32, config: &SimConfig, sprites: &SpriteSheet) -> Self {
        let mut obstacle = Self {
            id,
            x,
            gap_top: 0.0,
            gap_bottom: 0.0,
            top_y: 0.0,
            width: sprites.barrier_width(),
            passed: false,
        };
        obstacle.set_gap(gap_top, config, sprites);
        obstacle
    }

    fn regenerate_gap<R: Rng + ?Sized>(&mut self, config: &SimConfig, sprites: &SpriteSheet, rng: &mut R) {
        let gap_top = rng.random_range(config.gap_top_min..config.gap_top_max);
        self.set_gap(gap_top as f32, config, sprites);
    }

    fn set_gap(&mut self, gap_top: f32, config: &SimConfig, sprites: &SpriteSheet) {
        self.gap_top = gap_top;
        self.top_y = gap_top - sprites.barrier_height();
        self.gap_bottom = gap_top + config.gap_height;
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn gap_top(&self) -> f32 {
        self.gap_top
    }

    #[inline]
    pub fn gap_bottom(&self) -> f32 {
        self.gap_bottom
    }

    #[inline]
    pub fn top_barrier_y(&self) -> f32 {
        self.top_y
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[inline]
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Returns true the first time it is called
    pub(crate) fn mark_passed(&mut self) -> bool {
        !std::mem::replace(&mut self.passed, true)
    }

    /// Left edge, which the pass check compares against an agent's x
    #[inline]
    pub fn horizontal_edge(&self) -> f32 {
        self.x
    }

    /// Right edge; the last part of the obstacle to scroll past a point
    #[inline]
    pub fn trailing_edge(&self) -> f32 {
        self.x + self.width
    }

    /// Fully scrolled off the left side of the playfield
    #[inline]
    pub fn is_off_screen(&self) -> bool {
        self.trailing_edge() < 0.0
    }

    pub fn advance_one_tick(&mut self, config: &SimConfig) {
        self.x -= config.scroll_speed;
    }

    /// Pixel-exact overlap between either barrier and the agent's current frame
    pub fn overlaps(&self, agent: &Agent, sprites: &SpriteSheet) -> bool {
        let agent_mask = agent.collision_shape(sprites);
        let dx = pixel(self.x - agent.x());

        let top_offset = IVec2::new(dx, pixel(self.top_y - agent.y()));
        let bottom_offset = IVec2::new(dx, pixel(self.gap_bottom - agent.y()));

        agent_mask.overlaps(sprites.barrier_bottom(), bottom_offset)
            || agent_mask.overlaps(sprites.barrier_top(), top_offset)
    }
}
