//! One stretch of corridor: border chains, obstacles and spawn requests
//!
//! A segment is grown left to right by a style generator, then consumed by
//! `emit`, which turns it into collision bodies, tiles and a camera path.

use glam::{IVec2, Vec2};

use super::border::{BorderChain, GridRect, RunKind, Side};
use super::camera::{Camera, CameraTarget};
use super::color::{self, Palette};
use super::draw::TileLayer;
use super::entity::SpawnRequest;
use super::heightfield::camera_path;
use super::physics::{BodyDesc, PhysicsWorld, Shape, mask};
use super::rng::GenRng;
use crate::consts::{SEAM_WALL_THICKNESS, VOLUME_DEPTH};
use crate::tuning::Tuning;
use crate::{floor_mid, lerp};

/// Free-floating obstacle rectangle
pub type Block = GridRect;

/// Chance of staggering the two chains before a sudden step
const OFFSET_RUN_CHANCE: f32 = 0.25;
/// Chance of putting the whole sudden change on one chain
const EXTREME_SPLIT_CHANCE: f32 = 0.2;
/// Vertical travel of one move transition
const MOVE_MIN: i32 = 4;
const MOVE_MAX: i32 = 12;

/// How one growth step changes the corridor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Shrink,
    Grow,
    MoveUp,
    MoveDown,
}

/// Pick the next transition from the current gap ratio and centre height
///
/// Gaps near either bound are forced back toward the middle. Otherwise the
/// gap changes half the time (shrinking more likely the wider it is), and
/// the corridor moves the other half, drifting back into the soft band.
pub fn choose_transition(gap0: f32, centre: f32, band_lo: i32, band_hi: i32, rng: &mut GenRng) -> Transition {
    if gap0 > 0.75 {
        return Transition::Shrink;
    }
    if gap0 < 0.25 {
        return Transition::Grow;
    }
    if rng.chance(0.5) {
        if rng.chance(gap0) {
            Transition::Shrink
        } else {
            Transition::Grow
        }
    } else {
        let band = (band_hi - band_lo).max(1) as f32;
        let up = ((band_hi as f32 - centre) / band).clamp(0.0, 1.0);
        if rng.chance(up) {
            Transition::MoveUp
        } else {
            Transition::MoveDown
        }
    }
}

/// Counts of what `emit` produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitStats {
    pub base_volumes: usize,
    pub run_boxes: usize,
    pub block_boxes: usize,
    pub seam_walls: usize,
    pub tiles: usize,
}

/// What survives of a segment once it has been emitted
#[derive(Debug, Clone)]
pub struct EmittedSegment {
    pub x0: i32,
    pub x1: i32,
    /// Entry and exit seam centres
    pub buffers: [IVec2; 2],
    pub floor: BorderChain,
    pub ceiling: BorderChain,
    pub palette: Palette,
    pub camera: CameraTarget,
    pub spawns: Vec<SpawnRequest>,
    pub stats: EmitStats,
}

impl EmittedSegment {
    /// Floor and ceiling heights where the segment ends
    pub fn exit_heights(&self) -> (i32, i32) {
        (self.floor.y(), self.ceiling.y())
    }

    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }
}

/// A segment under construction
#[derive(Debug, Clone)]
pub struct Segment {
    x0: i32,
    x1: i32,
    floor: BorderChain,
    ceiling: BorderChain,
    blocks: Vec<Block>,
    palette: Option<Palette>,
    buffers: [Option<IVec2>; 2],
    spawns: Vec<SpawnRequest>,
    tuning: Tuning,
}

impl Segment {
    pub fn new(x0: i32, floor_y: i32, ceiling_y: i32, tuning: &Tuning) -> Self {
        Self {
            x0,
            x1: x0,
            floor: BorderChain::new(Side::Floor, x0, floor_y),
            ceiling: BorderChain::new(Side::Ceiling, x0, ceiling_y),
            blocks: Vec::new(),
            palette: None,
            buffers: [None, None],
            spawns: Vec::new(),
            tuning: tuning.clone(),
        }
    }

    pub fn x0(&self) -> i32 {
        self.x0
    }

    /// Rightmost x reached by either chain
    pub fn x1(&self) -> i32 {
        self.x1
    }

    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn floor(&self) -> &BorderChain {
        &self.floor
    }

    pub fn ceiling(&self) -> &BorderChain {
        &self.ceiling
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn spawns(&self) -> &[SpawnRequest] {
        &self.spawns
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn palette(&self) -> Option<Palette> {
        self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = Some(palette);
    }

    pub fn buffers(&self) -> [Option<IVec2>; 2] {
        self.buffers
    }

    /// Current clearance at the cursor
    pub fn gap(&self) -> i32 {
        self.ceiling.y() - self.floor.y()
    }

    pub fn centre(&self) -> f32 {
        (self.floor.y() + self.ceiling.y()) as f32 * 0.5
    }

    fn chain(&self, side: Side) -> &BorderChain {
        match side {
            Side::Floor => &self.floor,
            Side::Ceiling => &self.ceiling,
        }
    }

    fn chain_mut(&mut self, side: Side) -> &mut BorderChain {
        match side {
            Side::Floor => &mut self.floor,
            Side::Ceiling => &mut self.ceiling,
        }
    }

    /// Append one run to a chain; rejected appends are logged and ignored
    pub fn add_border(&mut self, side: Side, x: f32, y: f32, kind: RunKind) -> bool {
        match self.chain_mut(side).add(x, y, kind) {
            Ok(()) => {
                self.x1 = self.x1.max(self.floor.x()).max(self.ceiling.x());
                true
            }
            Err(e) => {
                log::error!("Ignoring {:?} border append: {}", side, e);
                false
            }
        }
    }

    /// Extend both chains flat to `x`
    pub fn extend_borders(&mut self, x: i32, kind: RunKind) {
        let (yf, yc) = (self.floor.y(), self.ceiling.y());
        self.step_to(x, yf, yc, kind);
    }

    /// Append one run per chain ending at `x`
    pub fn step_to(&mut self, x: i32, floor_y: i32, ceiling_y: i32, kind: RunKind) {
        self.add_border(Side::Floor, x as f32, floor_y as f32, kind);
        self.add_border(Side::Ceiling, x as f32, ceiling_y as f32, kind);
    }

    /// Lay a flat seam run and record its centre as the entry or exit anchor
    pub fn add_buffer(&mut self, entry: bool) -> IVec2 {
        let start = self.x1;
        let width = self.tuning.buffer_width;
        for side in [Side::Floor, Side::Ceiling] {
            let (x, y) = (self.chain(side).x(), self.chain(side).y());
            if x < start {
                self.add_border(side, start as f32, y as f32, RunKind::Terrain);
            }
        }
        self.extend_borders(start + width, RunKind::Buffer);
        let anchor = IVec2::new(start + width / 2, floor_mid(self.floor.y(), self.ceiling.y()));
        self.buffers[if entry { 0 } else { 1 }] = Some(anchor);
        anchor
    }

    pub fn add_block(&mut self, block: Block) -> bool {
        if block.is_empty() {
            log::debug!("Skipping empty block {:?}", block);
            return false;
        }
        self.blocks.push(block);
        true
    }

    /// Queue an entity by registered type name
    pub fn spawn(&mut self, kind: &'static str, position: Vec2, angle: f32) {
        self.spawns.push(SpawnRequest::new(kind, position).with_angle(angle));
    }

    /// Grow both chains by one transition; returns the new cursor x
    pub fn add_varying_borders(&mut self, rng: &mut GenRng) -> i32 {
        let min_gap = self.tuning.min_gap;
        let span = self.tuning.gap_span().max(1);
        let (yf0, yc0) = (self.floor.y(), self.ceiling.y());
        let gap = yc0 - yf0;
        let gap0 = ((gap - min_gap) as f32 / span as f32).clamp(0.0, 1.0);

        let transition = choose_transition(
            gap0,
            self.centre(),
            self.tuning.band_lo,
            self.tuning.band_hi,
            rng,
        );
        let (yf1, yc1, length) = match transition {
            Transition::Shrink | Transition::Grow => {
                let shrink = transition == Transition::Shrink;
                let change = 0.25 + 0.75 * rng.uniform();
                let gap1 = if shrink { gap0 - change } else { gap0 + change }.clamp(0.25, 0.75);
                let target = min_gap + (gap1 * span as f32).round() as i32;
                let delta = (target - gap).abs();

                if delta == 0 {
                    let x = self.x1 + self.tuning.step_width;
                    self.step_to(x, yf0, yc0, RunKind::Terrain);
                    return self.x1;
                }
                if rng.chance(self.tuning.sudden_chance) {
                    return self.sudden_step(delta, shrink, rng);
                }

                let change = if shrink { -delta } else { delta };
                let length = ((delta as f32 * (0.25 + 0.25 * rng.uniform())).round() as i32).max(1);
                if rng.chance(0.5) {
                    // floor locked
                    (yf0, yc0 + change, length)
                } else {
                    (yf0 - change, yc0, length)
                }
            }
            Transition::MoveUp | Transition::MoveDown => {
                let dir = if transition == Transition::MoveUp { 1 } else { -1 };
                let dy = rng.range(MOVE_MIN, MOVE_MAX) * dir;
                let half = (min_gap / 2).max(1);
                let length = ((dy.abs() + half - 1) / half).max(1);
                (yf0 + dy, yc0 + dy, length)
            }
        };

        self.ramp(yf1, yc1, length, rng)
    }

    /// Change the gap by `delta` in a single step
    fn sudden_step(&mut self, delta: i32, shrink: bool, rng: &mut GenRng) -> i32 {
        if rng.chance(OFFSET_RUN_CHANCE) {
            let w = rng.range(2, 4);
            let side = if rng.chance(0.5) { Side::Floor } else { Side::Ceiling };
            let (x, y) = (self.chain(side).x() + w, self.chain(side).y());
            self.add_border(side, x as f32, y as f32, RunKind::Terrain);
        }

        let off = if rng.chance(EXTREME_SPLIT_CHANCE) {
            if rng.chance(0.5) { 0 } else { delta }
        } else {
            rng.range(0, delta)
        };
        let (yf, yc) = (self.floor.y(), self.ceiling.y());
        let (yf, yc, width) = if shrink {
            (yf + off, yc - (delta - off), self.tuning.step_width + delta / 4)
        } else {
            (yf - off, yc + (delta - off), self.tuning.step_width + delta / 2)
        };
        let x = self.x1 + width;
        self.step_to(x, yf, yc, RunKind::Terrain);
        self.x1
    }

    /// Shared stepping loop toward target heights, keeping the gap legal
    fn ramp(&mut self, yf1: i32, yc1: i32, length: i32, rng: &mut GenRng) -> i32 {
        let min_gap = self.tuning.min_gap;
        let max_gap = self.tuning.max_gap;
        let (yf0, yc0) = (self.floor.y(), self.ceiling.y());
        let dir = ((yf1 + yc1) - (yf0 + yc0)).signum();
        let (mut prev_f, mut prev_c) = (yf0, yc0);
        let mut x = self.x1;

        for i in 1..=length {
            x += (self.tuning.step_width + rng.jitter()).max(1);
            let t = i as f32 / length as f32;
            let last = i == length;
            let (jf, jc) = if last { (0, 0) } else { (rng.jitter(), rng.jitter()) };
            let mut yf = lerp(yf0 as f32, yf1 as f32, t).round() as i32 + jf;
            let mut yc = lerp(yc0 as f32, yc1 as f32, t).round() as i32 + jc;

            if yc - yf < min_gap {
                yf = yc - min_gap;
            }
            if yc - yf > max_gap {
                if dir < 0 {
                    yc = yf + max_gap;
                } else {
                    yf = yc - max_gap;
                }
            }

            // Consecutive steps must overlap vertically
            if yf > prev_c - 1 {
                let shift = yf - (prev_c - 1);
                yf -= shift;
                yc -= shift;
            }
            if yc < prev_f + 1 {
                let shift = prev_f + 1 - yc;
                yf += shift;
                yc += shift;
            }

            self.step_to(x, yf, yc, RunKind::Terrain);
            prev_f = yf;
            prev_c = yc;
        }
        self.x1
    }

    /// Turn the finished segment into bodies, tiles and a camera path
    pub fn emit(
        mut self,
        world: &mut dyn PhysicsWorld,
        tiles: &mut TileLayer,
        camera: &mut Camera,
        rng: &mut GenRng,
    ) -> EmittedSegment {
        let (x0, x1) = (self.x0, self.x1);
        self.floor.link();
        self.ceiling.link();
        let palette = self.palette.unwrap_or_default();
        let mut stats = EmitStats::default();
        let tiles_before = tiles.len();

        let floor_base = self.floor.baseline();
        let ceiling_base = self.ceiling.baseline();
        for volume in [
            GridRect::new(x0, x1, floor_base - VOLUME_DEPTH, floor_base),
            GridRect::new(x0, x1, ceiling_base, ceiling_base + VOLUME_DEPTH),
        ] {
            if add_static_box(world, volume.center(), volume.size()) {
                stats.base_volumes += 1;
            }
        }

        for rect in self.floor.run_boxes().chain(self.ceiling.run_boxes()) {
            if add_static_box(world, rect.center(), rect.size()) {
                stats.run_boxes += 1;
            }
        }

        for block in &self.blocks {
            if add_static_box(world, block.center(), block.size()) {
                stats.block_boxes += 1;
            }
        }

        self.floor.emit_tiles(&palette, VOLUME_DEPTH, rng, tiles);
        self.ceiling.emit_tiles(&palette, VOLUME_DEPTH, rng, tiles);
        for block in &self.blocks {
            tiles.add(block.to_tile(color::jitter(palette.block, 0.08, rng)));
        }
        stats.tiles = tiles.len() - tiles_before;

        let target = camera_path(&self.floor, &self.ceiling, x0, x1);
        camera.set_target(target.clone());

        let bottom = (floor_base - VOLUME_DEPTH) as f32;
        let top = (ceiling_base + VOLUME_DEPTH) as f32;
        let half = SEAM_WALL_THICKNESS * 0.5;
        for x in [x0 as f32 - half, x1 as f32 + half] {
            let centre = Vec2::new(x, (bottom + top) * 0.5);
            if add_static_box(world, centre, Vec2::new(SEAM_WALL_THICKNESS, top - bottom)) {
                stats.seam_walls += 1;
            }
        }

        let entry = self.buffers[0].unwrap_or_else(|| {
            let (f, c) = (self.floor.start_y(), self.ceiling.start_y());
            IVec2::new(x0, floor_mid(f, c))
        });
        let exit = self.buffers[1]
            .unwrap_or_else(|| IVec2::new(x1, floor_mid(self.floor.y(), self.ceiling.y())));

        log::debug!(
            "Emitted segment [{}, {}]: {} run boxes, {} blocks, {} tiles",
            x0,
            x1,
            stats.run_boxes,
            stats.block_boxes,
            stats.tiles
        );

        EmittedSegment {
            x0,
            x1,
            buffers: [entry, exit],
            floor: self.floor,
            ceiling: self.ceiling,
            palette,
            camera: target,
            spawns: self.spawns,
            stats,
        }
    }
}

/// Add a static world box; empty boxes are skipped
fn add_static_box(world: &mut dyn PhysicsWorld, centre: Vec2, size: Vec2) -> bool {
    if size.x <= 0.0 || size.y <= 0.0 {
        return false;
    }
    let mut body = world.create_body(BodyDesc::fixed(centre));
    world.add_shape(&mut body, Shape::rect(size).with_filter(mask::WORLD, mask::ALL));
    world.add_body(body);
    true
}
