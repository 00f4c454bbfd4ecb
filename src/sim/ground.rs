//! Scrolling ground made of two tiled segments

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ground {
    y: f32,
    width: f32,
    x1: f32,
    x2: f32,
}

impl Ground {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            y: config.ground_y,
            width: config.ground_segment_width,
            x1: 0.0,
            x2: config.ground_segment_width,
        }
    }

    /// The failure line agents must stay above
    #[inline]
    pub fn y(&self) -> f32 {
        self.y
    }

    /// Left edges of the two segments
    #[inline]
    pub fn offsets(&self) -> (f32, f32) {
        (self.x1, self.x2)
    }

    /// Scroll left; a segment that leaves the screen jumps behind the other
    pub fn advance_one_tick(&mut self, config: &SimConfig) {
        self.x1 -= config.scroll_speed;
        self.x2 -= config.scroll_speed;

        if self.x1 + self.width < 0.0 {
            self.x1 = self.x2 + self.width;
        }
        if self.x2 + self.width < 0.0 {
            self.x2 = self.x1 + self.width;
        }
    }
}
