//! Floor and ceiling border chains
//!
//! A chain is a sequence of constant-height runs laid left to right with no
//! gaps: each run starts where the previous one ended. Heights are integer
//! grid units; `y` is the walkable surface (top of floor, underside of
//! ceiling).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::color::{self, Palette};
use super::draw::{TileLayer, TileRect};
use super::rng::GenRng;
use crate::consts::TILE_WIDTH;
use crate::error::BorderError;

/// Which surface a chain describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Floor,
    Ceiling,
}

/// What produced a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunKind {
    /// Flat wall laid by `extend_borders`
    #[default]
    Wall,
    /// Seam at a segment boundary; never merged with other kinds
    Buffer,
    /// Varying terrain from the growth state machine
    Terrain,
}

/// Integer rectangle `[x0, x1] x [y0, y1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRect {
    pub x0: i32,
    pub x1: i32,
    pub y0: i32,
    pub y1: i32,
}

impl GridRect {
    pub fn new(x0: i32, x1: i32, y0: i32, y1: i32) -> Self {
        Self {
            x0: x0.min(x1),
            x1: x0.max(x1),
            y0: y0.min(y1),
            y1: y0.max(y1),
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.x0 + self.x1) as f32 * 0.5,
            (self.y0 + self.y1) as f32 * 0.5,
        )
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width() as f32, self.height() as f32)
    }

    pub fn to_tile(&self, color: u32) -> TileRect {
        TileRect::new(
            self.x0 as f32,
            self.y0 as f32,
            self.width() as f32,
            self.height() as f32,
            color,
        )
    }
}

/// One constant-height piece of floor or ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderRun {
    pub x0: i32,
    pub x1: i32,
    pub y: i32,
    pub side: Side,
    pub kind: RunKind,
    /// Height of the previous run (own height for the first run)
    pub y0: i32,
    /// Height of the next run (own height for the last run)
    pub y1: i32,
}

impl BorderRun {
    #[inline]
    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    #[inline]
    pub fn is_buffer(&self) -> bool {
        self.kind == RunKind::Buffer
    }

    /// Solid rectangle between this run and a baseline height
    pub fn solid(&self, baseline: i32) -> GridRect {
        GridRect::new(self.x0, self.x1, baseline, self.y)
    }
}

/// A floor or ceiling chain with its append cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderChain {
    side: Side,
    runs: Vec<BorderRun>,
    x: i32,
    y: i32,
}

impl BorderChain {
    /// Chain holding a single zero-width run at `(x, y)`
    pub fn new(side: Side, x: i32, y: i32) -> Self {
        Self {
            side,
            runs: vec![BorderRun {
                x0: x,
                x1: x,
                y,
                side,
                kind: RunKind::Wall,
                y0: y,
                y1: y,
            }],
            x,
            y,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Cursor x (end of the last run)
    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Cursor height (height of the last run)
    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn runs(&self) -> &[BorderRun] {
        &self.runs
    }

    /// Left edge of the chain
    pub fn start(&self) -> i32 {
        self.runs.first().map_or(self.x, |r| r.x0)
    }

    /// Height of the first run
    pub fn start_y(&self) -> i32 {
        self.runs.first().map_or(self.y, |r| r.y)
    }

    /// Append a run from the cursor to `x` at height `y`
    ///
    /// Coordinates are rounded to the grid. A run matching the last run's
    /// height and kind extends it instead; a zero-width last run is replaced.
    pub fn add(&mut self, x: f32, y: f32, kind: RunKind) -> Result<(), BorderError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(BorderError::NonFinite { x, y });
        }
        let x1 = x.round() as i32;
        let y = y.round() as i32;
        if x1 < self.x {
            return Err(BorderError::Backward { x: x1, cursor: self.x });
        }

        let side = self.side;
        let x0 = self.x;
        let mut replaced = false;
        match self.runs.last_mut() {
            Some(last) if last.width() == 0 => {
                last.y = y;
                last.kind = kind;
                last.x1 = x1;
                replaced = true;
            }
            Some(last) if last.y == y && last.kind == kind => {
                last.x1 = x1;
            }
            _ => self.runs.push(BorderRun {
                x0,
                x1,
                y,
                side,
                kind,
                y0: y,
                y1: y,
            }),
        }
        if replaced {
            self.merge_tail();
        }
        self.x = x1;
        self.y = y;
        Ok(())
    }

    /// Fold the last run into the one before it when they match
    fn merge_tail(&mut self) {
        let n = self.runs.len();
        if n < 2 {
            return;
        }
        let (prev, last) = (&self.runs[n - 2], &self.runs[n - 1]);
        if prev.y == last.y && prev.kind == last.kind {
            let x1 = last.x1;
            self.runs.pop();
            self.runs[n - 2].x1 = x1;
        }
    }

    /// Fill in neighbour heights once generation is finished
    pub fn link(&mut self) {
        self.runs.retain(|r| r.width() > 0);
        let heights: Vec<i32> = self.runs.iter().map(|r| r.y).collect();
        let n = heights.len();
        for (i, run) in self.runs.iter_mut().enumerate() {
            run.y0 = if i > 0 { heights[i - 1] } else { run.y };
            run.y1 = if i + 1 < n { heights[i + 1] } else { run.y };
        }
    }

    /// Height of the run covering `x` (right edge belongs to the next run)
    pub fn height_at(&self, x: i32) -> Option<i32> {
        let idx = self.runs.partition_point(|r| r.x1 <= x);
        match self.runs.get(idx) {
            Some(run) if run.x0 <= x && run.width() > 0 => Some(run.y),
            _ if x == self.x => Some(self.y),
            _ => None,
        }
    }

    /// Lowest run height (floor baseline)
    pub fn min_y(&self) -> i32 {
        self.runs.iter().map(|r| r.y).min().unwrap_or(self.y)
    }

    /// Highest run height (ceiling baseline)
    pub fn max_y(&self) -> i32 {
        self.runs.iter().map(|r| r.y).max().unwrap_or(self.y)
    }

    /// Baseline the whole-segment volume sits at
    pub fn baseline(&self) -> i32 {
        match self.side {
            Side::Floor => self.min_y(),
            Side::Ceiling => self.max_y(),
        }
    }

    /// Boxes for runs that stick out past the baseline
    pub fn run_boxes(&self) -> impl Iterator<Item = GridRect> + '_ {
        let baseline = self.baseline();
        self.runs
            .iter()
            .filter(move |r| r.width() > 0 && r.y != baseline)
            .map(move |r| r.solid(baseline))
    }

    /// Decorative tiles for every run, `depth` units past the baseline
    ///
    /// Runs are cut into columns no wider than `TILE_WIDTH`, each shaded
    /// independently. Step faces exposed by a lower neighbour get an extra
    /// highlight strip.
    pub fn emit_tiles(&self, palette: &Palette, depth: i32, rng: &mut GenRng, tiles: &mut TileLayer) {
        let back = match self.side {
            Side::Floor => self.baseline() - depth,
            Side::Ceiling => self.baseline() + depth,
        };
        for run in self.runs.iter().filter(|r| r.width() > 0) {
            let base = match run.kind {
                RunKind::Buffer => palette.buffer,
                RunKind::Wall => color::shade(palette.terrain, 0.85),
                RunKind::Terrain => palette.terrain,
            };

            let mut x = run.x0;
            while x < run.x1 {
                let w = TILE_WIDTH.min(run.x1 - x);
                let rect = GridRect::new(x, x + w, back, run.y);
                tiles.add(rect.to_tile(color::jitter(base, 0.08, rng)));
                x += w;
            }

            let edge = color::shade(base, 1.3);
            for (neighbour, face_x) in [(run.y0, run.x0), (run.y1, run.x1)] {
                let exposed = match self.side {
                    Side::Floor => neighbour < run.y,
                    Side::Ceiling => neighbour > run.y,
                };
                if exposed {
                    let a = Vec2::new(face_x as f32 - 0.25, neighbour as f32);
                    let b = Vec2::new(face_x as f32 + 0.25, run.y as f32);
                    tiles.add(TileRect::from_corners(a, b, edge));
                }
            }
        }
    }
}
