//! The flapping agent: vertical-only physics and its animation frame

use serde::{Deserialize, Serialize};

use super::mask::Mask;
use super::sprites::SpriteSheet;
use crate::config::SimConfig;
use crate::consts::*;

/// Frame shown while nose-diving
const GLIDE_FRAME: usize = 1;

/// A single simulated agent
///
/// `x` is fixed for the whole episode; only the vertical state evolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: u32,
    x: f32,
    y: f32,
    vel: f32,
    /// Ticks since the last jump
    tick_count: u32,
    /// Height at the last jump, for tilt
    jump_height: f32,
    /// Presentation tilt in degrees (positive = nose up)
    tilt: f32,
    /// Animation cycle counter
    anim_count: u32,
    /// Sprite frame currently shown (and used for collision)
    frame: usize,
}

impl Agent {
    pub fn new(id: u32, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            vel: 0.0,
            tick_count: 0,
            jump_height: y,
            tilt: 0.0,
            anim_count: 0,
            frame: 0,
        }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn velocity(&self) -> f32 {
        self.vel
    }

    #[inline]
    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    #[inline]
    pub fn frame(&self) -> usize {
        self.frame
    }

    #[inline]
    pub fn ticks_since_jump(&self) -> u32 {
        self.tick_count
    }

    /// Teleport vertically (test and scenario setup only)
    #[cfg(test)]
    pub(crate) fn set_y(&mut self, y: f32) {
        self.y = y;
        self.jump_height = y;
    }

    /// Kick upward. Velocity, tick counter and tilt reference reset together.
    pub fn jump(&mut self, config: &SimConfig) {
        self.vel = config.jump_impulse;
        self.tick_count = 0;
        self.jump_height = self.y;
    }

    /// Advance physics by one tick
    pub fn advance_one_tick(&mut self, config: &SimConfig) {
        self.tick_count += 1;
        let t = self.tick_count as f32;

        let mut displacement = self.vel * t + config.gravity * t * t;
        if displacement >= config.max_fall {
            displacement = config.max_fall;
        } else if displacement < 0.0 {
            displacement -= config.rise_boost;
        }

        self.y += displacement;

        // Snap nose-up while rising or still near the jump height, then
        // drop the nose gradually.
        if displacement < 0.0 || self.y < self.jump_height + TILT_HOLD_BAND {
            if self.tilt < MAX_TILT_UP {
                self.tilt = MAX_TILT_UP;
            }
        } else if self.tilt > MAX_TILT_DOWN {
            self.tilt = (self.tilt - TILT_DECAY).max(MAX_TILT_DOWN);
        }
    }

    /// Advance the flap animation by one displayed tick.
    ///
    /// Cycles frames 0, 1, 2, 1, 0 every `ANIMATION_TIME` ticks; a nose-diving
    /// agent is pinned to the glide frame.
    pub fn advance_animation(&mut self) {
        self.anim_count += 1;

        let step = ANIMATION_TIME;
        if self.anim_count < step {
            self.frame = 0;
        } else if self.anim_count < step * 2 {
            self.frame = 1;
        } else if self.anim_count < step * 3 {
            self.frame = 2;
        } else if self.anim_count < step * 4 {
            self.frame = 1;
        } else {
            self.frame = 0;
            self.anim_count = 0;
        }

        if self.tilt <= NOSE_DIVE_TILT {
            self.frame = GLIDE_FRAME;
            self.anim_count = step * 2;
        }
    }

    /// Opaque-region mask of the frame currently shown
    #[inline]
    pub fn collision_shape<'a>(&self, sprites: &'a SpriteSheet) -> &'a Mask {
        sprites.agent_frame(self.frame)
    }

    /// Touching the ground line or above the top of the playfield
    pub fn is_out_of_bounds(&self, ground_y: f32, sprites: &SpriteSheet) -> bool {
        let height = self.collision_shape(sprites).height() as f32;
        self.y + height >= ground_y || self.y < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> Agent {
        Agent::new(1, AGENT_START_X, AGENT_START_Y)
    }

    #[test]
    fn test_free_fall_sequence() {
        let config = SimConfig::default();
        let mut a = agent();

        // 1.5, 6, 13.5, then clamped to 16
        let expected = [351.5, 357.5, 371.0, 387.0, 403.0];
        for y in expected {
            a.advance_one_tick(&config);
            assert_eq!(a.y(), y);
        }
        assert_eq!(a.ticks_since_jump(), 5);
    }

    #[test]
    fn test_jump_resets_state() {
        let config = SimConfig::default();
        let mut a = agent();
        for _ in 0..3 {
            a.advance_one_tick(&config);
        }
        a.jump(&config);
        assert_eq!(a.velocity(), JUMP_IMPULSE);
        assert_eq!(a.ticks_since_jump(), 0);

        // -10.5 + 1.5 = -9, plus the rise boost
        let before = a.y();
        a.advance_one_tick(&config);
        assert_eq!(a.y(), before - 11.0);
        assert_eq!(a.tilt(), MAX_TILT_UP);
    }

    #[test]
    fn test_displacement_zero_gets_no_boost() {
        let config = SimConfig::default();
        let mut a = agent();
        a.jump(&config);
        let mut ys = Vec::new();
        for _ in 0..7 {
            a.advance_one_tick(&config);
            ys.push(a.y());
        }
        // t = 7: -73.5 + 73.5 = 0 exactly
        assert_eq!(ys[6], ys[5]);
    }

    #[test]
    fn test_tilt_snaps_up_and_decays_down() {
        let config = SimConfig::default();
        let mut a = agent();

        a.advance_one_tick(&config);
        // Still within the hold band below the start height
        assert_eq!(a.tilt(), MAX_TILT_UP);

        for _ in 0..30 {
            a.advance_one_tick(&config);
            assert!(a.tilt() >= MAX_TILT_DOWN);
        }
        assert_eq!(a.tilt(), MAX_TILT_DOWN);

        // One jump snaps straight back up
        a.jump(&config);
        a.advance_one_tick(&config);
        assert_eq!(a.tilt(), MAX_TILT_UP);
    }

    #[test]
    fn test_tilt_decays_linearly() {
        let config = SimConfig::default();
        let mut a = agent();
        let mut tilts = Vec::new();
        for _ in 0..8 {
            a.advance_one_tick(&config);
            tilts.push(a.tilt());
        }
        // y = 387 on tick 4 is still inside the hold band; 403 on tick 5 is not
        assert_eq!(tilts[3], MAX_TILT_UP);
        assert_eq!(tilts[4], MAX_TILT_UP - TILT_DECAY);
        assert_eq!(tilts[5], MAX_TILT_UP - 2.0 * TILT_DECAY);
    }

    #[test]
    fn test_animation_cycle() {
        let mut a = agent();
        let mut frames = Vec::new();
        for _ in 0..21 {
            a.advance_animation();
            frames.push(a.frame());
        }
        let expected: Vec<usize> = [0; 4]
            .into_iter()
            .chain([1; 5])
            .chain([2; 5])
            .chain([1; 5])
            .chain([0; 2])
            .collect();
        assert_eq!(frames, expected);
    }

    #[test]
    fn test_nose_dive_pins_glide_frame() {
        let config = SimConfig::default();
        let mut a = agent();
        for _ in 0..20 {
            a.advance_one_tick(&config);
        }
        assert!(a.tilt() <= NOSE_DIVE_TILT);
        for _ in 0..12 {
            a.advance_animation();
            assert_eq!(a.frame(), GLIDE_FRAME);
        }
    }

    #[test]
    fn test_out_of_bounds() {
        let sprites = SpriteSheet::procedural();
        let mut a = agent();
        assert!(!a.is_out_of_bounds(GROUND_Y, &sprites));

        a.set_y(GROUND_Y - sprites.agent_height());
        assert!(a.is_out_of_bounds(GROUND_Y, &sprites));

        a.set_y(GROUND_Y - sprites.agent_height() - 0.5);
        assert!(!a.is_out_of_bounds(GROUND_Y, &sprites));

        a.set_y(-0.5);
        assert!(a.is_out_of_bounds(GROUND_Y, &sprites));

        a.set_y(0.0);
        assert!(!a.is_out_of_bounds(GROUND_Y, &sprites));
    }

    #[test]
    fn test_identical_runs_are_bit_identical() {
        let config = SimConfig::default();
        let mut a = agent();
        let mut b = agent();
        for _ in 0..200 {
            a.advance_one_tick(&config);
            b.advance_one_tick(&config);
            assert_eq!(a.y().to_bits(), b.y().to_bits());
        }
    }
}
