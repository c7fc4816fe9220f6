//! Account avatar images.
//!
//! The platform stores avatars at arbitrary sizes; consumers always render
//! them as a fixed-size square icon. [`Avatar::scaled`] performs the
//! nearest-neighbour resample and [`Avatar::placeholder`] is the silent
//! fallback for accounts without a stored image.

// Pixel coordinates are small non-negative icon offsets; the usize casts
// are lossless here.
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::fmt;

/// Square icon edge length, in pixels, used wherever an account avatar is
/// shown in a list.
pub const ICON_SIZE: u32 = 96;

/// Placeholder background, RGBA.
const PLACEHOLDER_BG: [u8; 4] = [0x3c, 0x41, 0x4a, 0xff];
/// Placeholder silhouette, RGBA.
const PLACEHOLDER_FG: [u8; 4] = [0xc5, 0xcb, 0xd4, 0xff];

/// An owned RGBA8 image buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Avatar {
    /// Width in pixels, at least 1.
    width: u32,
    /// Height in pixels, at least 1.
    height: u32,
    /// Row-major RGBA8 pixel data, `width * height * 4` bytes.
    rgba: Vec<u8>,
}

impl Avatar {
    /// Creates an avatar from raw RGBA8 pixel data.
    ///
    /// Returns `None` if either dimension is zero or the buffer length
    /// does not equal `width * height * 4`.
    #[must_use]
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let expected = (width as usize).checked_mul(height as usize)?.checked_mul(4)?;
        if rgba.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            rgba,
        })
    }

    /// Creates a single-colour avatar.
    ///
    /// Zero dimensions are clamped to 1.
    #[must_use]
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            rgba: pixels,
        }
    }

    /// The deterministic placeholder avatar used when the platform has no
    /// stored image for an account: a light silhouette on a dark square,
    /// already at [`ICON_SIZE`].
    #[must_use]
    pub fn placeholder() -> Self {
        let size = ICON_SIZE;
        let mut avatar = Self::solid(size, size, PLACEHOLDER_BG);

        // Head: circle in the upper half. Torso: larger circle whose
        // centre sits below the bottom edge, so only its cap is visible.
        let head = (size / 2, size * 3 / 8, size / 5);
        let torso = (size / 2, size + size / 8, size / 2);
        for (cx, cy, radius) in [head, torso] {
            avatar.fill_circle(cx, cy, radius, PLACEHOLDER_FG);
        }
        avatar
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Row-major RGBA8 pixel data.
    #[must_use]
    pub fn as_rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Resamples this avatar to a `size x size` square using
    /// nearest-neighbour interpolation. A zero `size` is clamped to 1.
    #[must_use]
    pub fn scaled(&self, size: u32) -> Self {
        let size = size.max(1);
        if size == self.width && size == self.height {
            return self.clone();
        }

        let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..u64::from(size) {
            let src_y = (y * u64::from(self.height) / u64::from(size)) as usize;
            for x in 0..u64::from(size) {
                let src_x = (x * u64::from(self.width) / u64::from(size)) as usize;
                let offset = (src_y * self.width as usize + src_x) * 4;
                pixels.extend_from_slice(&self.rgba[offset..offset + 4]);
            }
        }
        Self {
            width: size,
            height: size,
            rgba: pixels,
        }
    }

    /// Draws a filled circle centred at `(cx, cy)`, clipped to the image.
    fn fill_circle(&mut self, cx: u32, cy: u32, radius: u32, rgba: [u8; 4]) {
        let (cx, cy, radius) = (i64::from(cx), i64::from(cy), i64::from(radius));
        for y in 0..i64::from(self.height) {
            for x in 0..i64::from(self.width) {
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy <= radius * radius {
                    let offset = (y as usize * self.width as usize + x as usize) * 4;
                    self.rgba[offset..offset + 4].copy_from_slice(&rgba);
                }
            }
        }
    }
}

impl fmt::Debug for Avatar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Avatar")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_validates_dimensions() {
        assert!(Avatar::from_rgba(0, 4, vec![]).is_none());
        assert!(Avatar::from_rgba(2, 2, vec![0; 15]).is_none());
        assert!(Avatar::from_rgba(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn scaled_yields_requested_square() {
        let avatar = Avatar::solid(12, 34, [1, 2, 3, 4]);
        let scaled = avatar.scaled(ICON_SIZE);
        assert_eq!(scaled.width(), ICON_SIZE);
        assert_eq!(scaled.height(), ICON_SIZE);
        assert_eq!(scaled.as_rgba().len(), (ICON_SIZE * ICON_SIZE * 4) as usize);
        // Nearest-neighbour of a solid image stays solid.
        assert!(scaled.as_rgba().chunks(4).all(|px| px == [1, 2, 3, 4]));
    }

    #[test]
    fn scaled_is_identity_at_native_size() {
        let avatar = Avatar::solid(ICON_SIZE, ICON_SIZE, [9, 9, 9, 9]);
        assert_eq!(avatar.scaled(ICON_SIZE), avatar);
    }

    #[test]
    fn placeholder_has_icon_size_and_silhouette() {
        let placeholder = Avatar::placeholder();
        assert_eq!(placeholder.width(), ICON_SIZE);
        assert_eq!(placeholder.height(), ICON_SIZE);
        // Contains both background and silhouette pixels.
        let has_bg = placeholder.as_rgba().chunks(4).any(|px| px == PLACEHOLDER_BG);
        let has_fg = placeholder.as_rgba().chunks(4).any(|px| px == PLACEHOLDER_FG);
        assert!(has_bg && has_fg);
    }

    #[test]
    fn zero_scale_is_clamped() {
        let avatar = Avatar::solid(4, 4, [0, 0, 0, 0xff]);
        let scaled = avatar.scaled(0);
        assert_eq!(scaled.width(), 1);
        assert_eq!(scaled.height(), 1);
    }
}
