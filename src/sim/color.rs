//! Packed colors and segment palettes
//!
//! Colors are packed little-endian RGBA (`0xAABBGGRR`), the byte order tile
//! instance buffers are uploaded in.

use serde::{Deserialize, Serialize};

use super::rng::GenRng;

/// Convert a float channel to a normalized u8
#[inline]
fn u8_channel(x: f32) -> u32 {
    (x * 256.0).floor().clamp(0.0, 255.0) as u32
}

/// Pack floating-point RGBA
pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> u32 {
    (u8_channel(a) << 24) | (u8_channel(b) << 16) | (u8_channel(g) << 8) | u8_channel(r)
}

/// Pack opaque floating-point RGB
pub fn rgb(r: f32, g: f32, b: f32) -> u32 {
    0xff00_0000 | (u8_channel(b) << 16) | (u8_channel(g) << 8) | u8_channel(r)
}

/// Convert `0xRRGGBB` to a packed opaque color
pub const fn hex(x: u32) -> u32 {
    0xff00_0000 | ((x << 16) & 0x00ff_0000) | (x & 0x0000_ff00) | ((x >> 16) & 0x0000_00ff)
}

/// Unpack to float RGBA
pub fn unpack(c: u32) -> [f32; 4] {
    [
        (c & 0xff) as f32 / 255.0,
        ((c >> 8) & 0xff) as f32 / 255.0,
        ((c >> 16) & 0xff) as f32 / 255.0,
        ((c >> 24) & 0xff) as f32 / 255.0,
    ]
}

/// Multiply the RGB channels by `factor`, keeping alpha
pub fn shade(c: u32, factor: f32) -> u32 {
    let [r, g, b, a] = unpack(c);
    rgba(r * factor, g * factor, b * factor, a)
}

/// Per-tile brightness and tint perturbation around a base color
pub fn jitter(c: u32, amount: f32, rng: &mut GenRng) -> u32 {
    let [r, g, b, a] = unpack(c);
    let bright = 1.0 + rng.range_f32(-amount, amount);
    let tint = amount * 0.25;
    rgba(
        r * bright + rng.range_f32(-tint, tint),
        g * bright + rng.range_f32(-tint, tint),
        b * bright + rng.range_f32(-tint, tint),
        a,
    )
}

/// Colors for a generated segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    /// Floor and ceiling terrain
    pub terrain: u32,
    /// Floating obstacle blocks
    pub block: u32,
    /// Seam runs at the segment ends
    pub buffer: u32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            terrain: rgb(0.0, 0.5, 0.0),
            block: hex(0x4a6b8a),
            buffer: rgb(0.2, 0.2, 0.2),
        }
    }
}

/// Palettes picked per level style
pub mod palettes {
    use super::{Palette, hex};

    pub const OPEN: Palette = Palette {
        terrain: hex(0x3b7d4f),
        block: hex(0x6fa86a),
        buffer: hex(0x333333),
    };
    pub const MEDIUM: Palette = Palette {
        terrain: hex(0x6b5a3e),
        block: hex(0xa7a4b3),
        buffer: hex(0x333333),
    };
    pub const CLOSED: Palette = Palette {
        terrain: hex(0x4b3f72),
        block: hex(0x7a6bb0),
        buffer: hex(0x333333),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_swaps_to_rgba_order() {
        assert_eq!(hex(0x112233), 0xff33_2211);
    }

    #[test]
    fn test_rgb_clamps() {
        assert_eq!(rgb(2.0, -1.0, 0.0), 0xff00_00ff);
    }

    #[test]
    fn test_jitter_keeps_alpha_and_stays_close() {
        let mut rng = GenRng::new(11);
        let base = rgb(0.5, 0.5, 0.5);
        for _ in 0..50 {
            let c = jitter(base, 0.1, &mut rng);
            let [r, g, b, a] = unpack(c);
            assert_eq!(a, 1.0);
            for ch in [r, g, b] {
                assert!((ch - 0.5).abs() < 0.1, "channel drifted: {ch}");
            }
        }
    }
}
