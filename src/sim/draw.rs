//! Drawing descriptors handed to the tile and sprite layers
//!
//! The simulation never draws; it fills these batches and the renderer
//! uploads them as-is.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// One decorative rectangle, laid out for direct upload as instance data
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TileRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    /// Packed RGBA (see `color`)
    pub color: u32,
}

impl TileRect {
    pub fn new(x: f32, y: f32, w: f32, h: f32, color: u32) -> Self {
        Self { x, y, w, h, color }
    }

    /// Rectangle spanning two corners, in any order
    pub fn from_corners(a: Vec2, b: Vec2, color: u32) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y, color)
    }
}

/// Batch of tiles for the current segment
#[derive(Debug, Clone, Default)]
pub struct TileLayer {
    tiles: Vec<TileRect>,
}

impl TileLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    pub fn add(&mut self, tile: TileRect) {
        if tile.w > 0.0 && tile.h > 0.0 {
            self.tiles.push(tile);
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[TileRect] {
        &self.tiles
    }

    /// Raw bytes for an instance buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.tiles)
    }
}

/// A sprite to draw this frame
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDesc {
    pub pos: Vec2,
    pub radius: f32,
    pub angle: f32,
    pub color: u32,
    pub sprite: &'static str,
}

/// Sprites emitted by entities for one rendered frame
#[derive(Debug, Clone, Default)]
pub struct SpriteLayer {
    sprites: Vec<SpriteDesc>,
}

impl SpriteLayer {
    pub fn clear(&mut self) {
        self.sprites.clear();
    }

    pub fn add(&mut self, sprite: SpriteDesc) {
        self.sprites.push(sprite);
    }

    pub fn sprites(&self) -> &[SpriteDesc] {
        &self.sprites
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_rect_is_twenty_bytes() {
        assert_eq!(std::mem::size_of::<TileRect>(), 20);
        let mut layer = TileLayer::new();
        layer.add(TileRect::new(0.0, 0.0, 1.0, 1.0, 0xffff_ffff));
        assert_eq!(layer.as_bytes().len(), 20);
    }

    #[test]
    fn test_degenerate_tiles_dropped() {
        let mut layer = TileLayer::new();
        layer.add(TileRect::new(0.0, 0.0, 0.0, 4.0, 0));
        layer.add(TileRect::new(0.0, 0.0, 4.0, -1.0, 0));
        assert!(layer.is_empty());
    }

    #[test]
    fn test_from_corners_normalizes() {
        let t = TileRect::from_corners(Vec2::new(4.0, 2.0), Vec2::new(1.0, 5.0), 0);
        assert_eq!((t.x, t.y, t.w, t.h), (1.0, 2.0, 3.0, 3.0));
    }
}
