//! Opaque-region bitmasks for pixel-exact collision
//!
//! A mask records which pixels of a sprite are visible. Two masks collide
//! only when a visible pixel of one lands on a visible pixel of the other,
//! so tapered or rounded art never produces bounding-box false positives.

use glam::{IVec2, UVec2};

/// Alpha at or above which a pixel counts as opaque
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 127;

const WORD_BITS: u32 = u64::BITS;

/// A packed, row-major bitset of opaque pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    /// Words per row
    stride: usize,
    bits: Vec<u64>,
}

impl Mask {
    /// Fully transparent mask
    pub fn new(width: u32, height: u32) -> Self {
        let stride = width.div_ceil(WORD_BITS) as usize;
        Self {
            width,
            height,
            stride,
            bits: vec![0; stride * height as usize],
        }
    }

    /// Build a mask by evaluating `opaque` at every pixel
    pub fn from_fn<F>(width: u32, height: u32, mut opaque: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if opaque(x, y) {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }

    /// Build a mask from one alpha byte per pixel (row-major).
    ///
    /// Pixels with alpha strictly greater than `threshold` are opaque, which
    /// matches how sprite masks are usually derived from loaded images.
    /// Returns `None` when `alpha` is not exactly `width * height` bytes.
    pub fn from_alpha(width: u32, height: u32, alpha: &[u8], threshold: u8) -> Option<Self> {
        if alpha.len() != width as usize * height as usize {
            return None;
        }
        Some(Self::from_fn(width, height, |x, y| {
            alpha[(y * width + x) as usize] > threshold
        }))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    #[inline]
    fn word_index(&self, x: u32, y: u32) -> (usize, u32) {
        (y as usize * self.stride + (x / WORD_BITS) as usize, x % WORD_BITS)
    }

    /// Whether the pixel at (x, y) is opaque. Out-of-range pixels are transparent.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let (word, bit) = self.word_index(x, y);
        self.bits[word] & (1 << bit) != 0
    }

    /// Set a pixel. Out-of-range writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, opaque: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let (word, bit) = self.word_index(x, y);
        if opaque {
            self.bits[word] |= 1 << bit;
        } else {
            self.bits[word] &= !(1 << bit);
        }
    }

    /// Number of opaque pixels
    pub fn count(&self) -> u32 {
        self.bits.iter().map(|w| w.count_ones()).sum()
    }

    /// Mirror top-to-bottom
    pub fn flip_vertical(&self) -> Self {
        let mut flipped = self.clone();
        let stride = self.stride;
        if stride == 0 {
            return flipped;
        }
        for (y, row) in flipped.bits.chunks_exact_mut(stride).enumerate() {
            let src = (self.height as usize - 1 - y) * stride;
            row.copy_from_slice(&self.bits[src..src + stride]);
        }
        flipped
    }

    /// First point where `other`, placed with its top-left corner at `offset`
    /// in this mask's coordinates, overlaps an opaque pixel of this mask.
    ///
    /// Points are scanned row-major; the returned point is in this mask's
    /// coordinates.
    pub fn overlap(&self, other: &Mask, offset: IVec2) -> Option<IVec2> {
        let x0 = offset.x.max(0);
        let y0 = offset.y.max(0);
        let x1 = (offset.x + other.width as i32).min(self.width as i32);
        let y1 = (offset.y + other.height as i32).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }

        for y in y0..y1 {
            for x in x0..x1 {
                if self.get(x as u32, y as u32)
                    && other.get((x - offset.x) as u32, (y - offset.y) as u32)
                {
                    return Some(IVec2::new(x, y));
                }
            }
        }
        None
    }

    /// Convenience wrapper around [`Mask::overlap`]
    #[inline]
    pub fn overlaps(&self, other: &Mask, offset: IVec2) -> bool {
        self.overlap(other, offset).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x4 mask with only the top-left 2x2 block opaque
    fn corner_block() -> Mask {
        Mask::from_fn(4, 4, |x, y| x < 2 && y < 2)
    }

    #[test]
    fn test_get_set_and_count() {
        let mut mask = Mask::new(70, 3);
        assert_eq!(mask.count(), 0);
        mask.set(0, 0, true);
        mask.set(65, 2, true);
        assert!(mask.get(0, 0));
        assert!(mask.get(65, 2));
        assert!(!mask.get(64, 2));
        assert_eq!(mask.count(), 2);

        mask.set(0, 0, false);
        assert_eq!(mask.count(), 1);

        // Out of range is transparent and ignored
        mask.set(100, 100, true);
        assert!(!mask.get(100, 100));
    }

    #[test]
    fn test_from_alpha_threshold() {
        let alpha = [0, 127, 128, 255];
        let mask = Mask::from_alpha(2, 2, &alpha, DEFAULT_ALPHA_THRESHOLD).unwrap();
        assert!(!mask.get(0, 0));
        assert!(!mask.get(1, 0));
        assert!(mask.get(0, 1));
        assert!(mask.get(1, 1));

        assert!(Mask::from_alpha(2, 2, &alpha[..3], 127).is_none());
    }

    #[test]
    fn test_flip_vertical() {
        let mask = corner_block();
        let flipped = mask.flip_vertical();
        assert!(flipped.get(0, 3));
        assert!(flipped.get(1, 2));
        assert!(!flipped.get(0, 0));
        assert_eq!(flipped.count(), mask.count());
    }

    #[test]
    fn test_overlap_opaque_pixels() {
        let a = corner_block();
        let b = corner_block();

        // Same placement
        assert_eq!(a.overlap(&b, IVec2::ZERO), Some(IVec2::ZERO));
        // Shifted so b's opaque block touches a's (1, 1)
        assert_eq!(a.overlap(&b, IVec2::new(1, 1)), Some(IVec2::new(1, 1)));
        // Negative offsets work too
        assert_eq!(a.overlap(&b, IVec2::new(-1, -1)), Some(IVec2::ZERO));
    }

    #[test]
    fn test_bounding_boxes_overlap_but_pixels_do_not() {
        let a = corner_block();
        let b = corner_block();

        // b's box covers a's bottom-right quadrant, which is transparent
        assert!(!a.overlaps(&b, IVec2::new(2, 2)));
        assert!(!a.overlaps(&b, IVec2::new(2, 0)));
    }

    #[test]
    fn test_disjoint_boxes() {
        let a = corner_block();
        let b = corner_block();
        assert!(!a.overlaps(&b, IVec2::new(4, 0)));
        assert!(!a.overlaps(&b, IVec2::new(0, -4)));
        assert!(!a.overlaps(&b, IVec2::new(-10, 10)));
    }
}
