//! Sprite collision shapes
//!
//! The simulation never touches image data. It only needs the opaque-region
//! masks of the agent animation frames and of the two barriers, which live
//! in an immutable [`SpriteSheet`] shared between episodes.

use super::mask::Mask;

/// Agent sprite size (all frames share it)
pub const AGENT_WIDTH: u32 = 68;
pub const AGENT_HEIGHT: u32 = 48;

/// Number of distinct agent frames (wing up, level, down)
pub const AGENT_FRAME_COUNT: usize = 3;

/// Barrier sprite size
pub const BARRIER_WIDTH: u32 = 104;
pub const BARRIER_HEIGHT: u32 = 640;
/// Height of the flared lip at the barrier's open end
pub const BARRIER_LIP_HEIGHT: u32 = 48;
/// Horizontal inset of the barrier body on each side, below the lip
pub const BARRIER_BODY_INSET: u32 = 4;

/// Problems with caller-supplied masks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpriteError {
    #[error("agent frames must share one size: frame {index} is {width}x{height}")]
    FrameSizeMismatch { index: usize, width: u32, height: u32 },
    #[error("barrier masks differ in size: top {top:?}, bottom {bottom:?}")]
    BarrierSizeMismatch { top: (u32, u32), bottom: (u32, u32) },
}

/// Immutable collision shapes for one episode family
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    agent_frames: [Mask; AGENT_FRAME_COUNT],
    barrier_top: Mask,
    barrier_bottom: Mask,
}

impl SpriteSheet {
    /// Build a sheet from caller-supplied masks (e.g. derived from images).
    ///
    /// `barrier_bottom` is the barrier below the gap with its lip at the top
    /// rows; `barrier_top` is the one above the gap, normally its vertical
    /// mirror.
    pub fn from_masks(
        agent_frames: [Mask; AGENT_FRAME_COUNT],
        barrier_top: Mask,
        barrier_bottom: Mask,
    ) -> Result<Self, SpriteError> {
        let size = agent_frames[0].size();
        if let Some((index, frame)) = agent_frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.size() != size)
        {
            return Err(SpriteError::FrameSizeMismatch {
                index,
                width: frame.width(),
                height: frame.height(),
            });
        }
        if barrier_top.size() != barrier_bottom.size() {
            return Err(SpriteError::BarrierSizeMismatch {
                top: (barrier_top.width(), barrier_top.height()),
                bottom: (barrier_bottom.width(), barrier_bottom.height()),
            });
        }
        Ok(Self {
            agent_frames,
            barrier_top,
            barrier_bottom,
        })
    }

    /// Built-in shapes: a rounded body with a beak and a flapping wing, and
    /// barriers with a flared lip at the open end.
    pub fn procedural() -> Self {
        // Wing center height per frame: up, level, down
        let wing_centers: [f32; AGENT_FRAME_COUNT] = [7.0, 24.0, 41.0];
        let agent_frames = wing_centers.map(procedural_agent_frame);
        let barrier_bottom = procedural_barrier();
        let barrier_top = barrier_bottom.flip_vertical();
        Self {
            agent_frames,
            barrier_top,
            barrier_bottom,
        }
    }

    /// Mask for an agent animation frame (wraps out-of-range indices)
    #[inline]
    pub fn agent_frame(&self, frame: usize) -> &Mask {
        &self.agent_frames[frame % AGENT_FRAME_COUNT]
    }

    #[inline]
    pub fn agent_height(&self) -> f32 {
        self.agent_frames[0].height() as f32
    }

    #[inline]
    pub fn barrier_top(&self) -> &Mask {
        &self.barrier_top
    }

    #[inline]
    pub fn barrier_bottom(&self) -> &Mask {
        &self.barrier_bottom
    }

    #[inline]
    pub fn barrier_width(&self) -> f32 {
        self.barrier_bottom.width() as f32
    }

    #[inline]
    pub fn barrier_height(&self) -> f32 {
        self.barrier_bottom.height() as f32
    }
}

impl Default for SpriteSheet {
    fn default() -> Self {
        Self::procedural()
    }
}

/// Pixel-center ellipse test
#[inline]
fn in_ellipse(x: u32, y: u32, cx: f32, cy: f32, rx: f32, ry: f32) -> bool {
    let dx = (x as f32 + 0.5 - cx) / rx;
    let dy = (y as f32 + 0.5 - cy) / ry;
    dx * dx + dy * dy <= 1.0
}

fn procedural_agent_frame(wing_y: f32) -> Mask {
    Mask::from_fn(AGENT_WIDTH, AGENT_HEIGHT, |x, y| {
        let body = in_ellipse(x, y, 34.0, 24.0, 30.0, 20.0);
        let beak = (56..AGENT_WIDTH).contains(&x) && (20..30).contains(&y);
        let wing = in_ellipse(x, y, 20.0, wing_y, 12.0, 6.0);
        body || beak || wing
    })
}

fn procedural_barrier() -> Mask {
    Mask::from_fn(BARRIER_WIDTH, BARRIER_HEIGHT, |x, y| {
        y < BARRIER_LIP_HEIGHT
            || (BARRIER_BODY_INSET..BARRIER_WIDTH - BARRIER_BODY_INSET).contains(&x)
    })
}
