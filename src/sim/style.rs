//! Level style generators
//!
//! Each style fills a segment between its entry and exit buffers using the
//! segment's border primitives, and queues enemies and items by name.

use std::f32::consts::PI;

use glam::Vec2;

use super::border::{GridRect, RunKind};
use super::color::{Palette, palettes};
use super::rng::GenRng;
use super::segment::Segment;
use crate::consts::MAX_CLOSED_ITERATIONS;
use crate::floor_mid;
use crate::tuning::StyleWeights;

/// Target span of one styled stretch
const MIN_SPAN: i32 = 150;
const MAX_SPAN: i32 = 225;

/// Sample spacing for open-style clusters
const OPEN_SPACING: i32 = 25;
/// Sample spacing and end margin for medium-style obstacles
const MEDIUM_SPACING: i32 = 30;
const MEDIUM_MARGIN: i32 = 20;

const OPEN_ENEMIES: [&str; 4] = ["Enemy.Glider", "Enemy.Horiz", "Enemy.Diamond", "Enemy.Star"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStyle {
    /// Flat and wide, scattered enemy clusters
    Open,
    /// Flat with obstacle blocks and shelf turrets
    Medium,
    /// Twisting corridor from the growth state machine
    Closed,
}

impl LevelStyle {
    pub const ALL: [LevelStyle; 3] = [LevelStyle::Open, LevelStyle::Medium, LevelStyle::Closed];

    pub fn name(self) -> &'static str {
        match self {
            LevelStyle::Open => "open",
            LevelStyle::Medium => "medium",
            LevelStyle::Closed => "closed",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            LevelStyle::Open => palettes::OPEN,
            LevelStyle::Medium => palettes::MEDIUM,
            LevelStyle::Closed => palettes::CLOSED,
        }
    }

    /// Grow `seg` in this style; returns the cursor x reached
    pub fn generate(self, seg: &mut Segment, rng: &mut GenRng) -> i32 {
        match self {
            LevelStyle::Open => generate_open(seg, rng),
            LevelStyle::Medium => generate_medium(seg, rng),
            LevelStyle::Closed => generate_closed(seg, rng),
        }
        seg.x1()
    }
}

/// Weighted choice between the styles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StylePicker {
    weights: [f32; 3],
}

impl From<StyleWeights> for StylePicker {
    fn from(w: StyleWeights) -> Self {
        Self {
            weights: [w.open, w.medium, w.closed],
        }
    }
}

impl StylePicker {
    pub fn choose(&self, rng: &mut GenRng) -> LevelStyle {
        LevelStyle::ALL[rng.weighted(&self.weights)]
    }
}

/// Entry buffer, styled body, exit buffer and palette
pub fn generate_segment(seg: &mut Segment, style: LevelStyle, rng: &mut GenRng) {
    seg.add_buffer(true);
    style.generate(seg, rng);
    seg.add_buffer(false);
    seg.set_palette(style.palette());
    log::info!(
        "Generated {} segment [{}, {}], {} spawns, {} blocks",
        style.name(),
        seg.x0(),
        seg.x1(),
        seg.spawns().len(),
        seg.blocks().len()
    );
}

fn generate_open(seg: &mut Segment, rng: &mut GenRng) {
    let start = seg.x1();
    let end = start + rng.range(MIN_SPAN, MAX_SPAN);
    seg.extend_borders(end, RunKind::Wall);

    let (f, c) = (seg.floor().y(), seg.ceiling().y());
    let passage = seg.tuning().passage;
    let (lo, hi) = (f + passage, (c - passage).max(f + passage));

    let mut x = start + 15;
    while x < end - 10 {
        for _ in 0..rng.range(0, 2) {
            let kind = OPEN_ENEMIES[rng.range(0, OPEN_ENEMIES.len() as i32 - 1) as usize];
            let pos = Vec2::new((x + rng.range(-3, 3)) as f32, rng.range(lo, hi) as f32);
            seg.spawn(kind, pos, 0.0);
        }
        if rng.chance(0.25) {
            seg.spawn("Item", Vec2::new(x as f32, floor_mid(f, c) as f32), 0.0);
        }
        x += OPEN_SPACING;
    }
}

fn generate_medium(seg: &mut Segment, rng: &mut GenRng) {
    let start = seg.x1();
    let end = start + rng.range(MIN_SPAN, MAX_SPAN);
    seg.extend_borders(end, RunKind::Wall);

    let (f, c) = (seg.floor().y(), seg.ceiling().y());
    let passage = seg.tuning().passage;
    // room left once a passage is kept clear on either side
    let avail = c - f - 2 * passage;

    let mut last_enemy = false;
    let mut x = start + MEDIUM_MARGIN;
    while x <= end - MEDIUM_MARGIN {
        let w = rng.range(4, 10);
        let (x0, x1) = (x - w / 2, x - w / 2 + w);
        let mut enemy = false;

        match rng.range(0, 4) {
            // open
            0 => {}
            // floating island
            1 if avail >= 2 => {
                let h = rng.range(2, avail.min(6));
                let y0 = rng.range(f + passage, c - passage - h);
                seg.add_block(GridRect::new(x0, x1, y0, y0 + h));
            }
            // raised floor shelf
            2 if avail >= 2 => {
                let top = f + rng.range(2, avail.min(8));
                seg.add_block(GridRect::new(x0, x1, f, top));
                if !last_enemy {
                    seg.spawn("Enemy.Turret", Vec2::new(x as f32, top as f32 + 1.5), 0.0);
                    enemy = true;
                }
            }
            // lowered ceiling shelf
            3 if avail >= 2 => {
                let bottom = c - rng.range(2, avail.min(8));
                seg.add_block(GridRect::new(x0, x1, bottom, c));
                if !last_enemy {
                    seg.spawn("Enemy.Silo", Vec2::new(x as f32, bottom as f32 - 1.5), PI);
                    enemy = true;
                }
            }
            // pinch
            4 if avail >= 2 => {
                let h = rng.range(1, avail / 2);
                seg.add_block(GridRect::new(x0, x1, f, f + h));
                seg.add_block(GridRect::new(x0, x1, c - h, c));
            }
            _ => {}
        }

        last_enemy = enemy;
        x += MEDIUM_SPACING;
    }
}

fn generate_closed(seg: &mut Segment, rng: &mut GenRng) {
    let target = seg.x1() + rng.range(MIN_SPAN, MAX_SPAN);
    let mut iterations = 0;
    while seg.x1() < target && iterations < MAX_CLOSED_ITERATIONS {
        let x = seg.add_varying_borders(rng);
        if rng.chance(0.15) {
            seg.spawn("Enemy.Ace", Vec2::new(x as f32 - 2.0, seg.centre()), 0.0);
        }
        iterations += 1;
    }
    if seg.x1() < target {
        log::debug!(
            "Closed style stopped at {} short of {} after {} iterations",
            seg.x1(),
            target,
            iterations
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    fn fresh() -> Segment {
        Segment::new(0, -12, 12, &Tuning::default())
    }

    #[test]
    fn test_picker_respects_zero_weights() {
        let picker = StylePicker::from(StyleWeights {
            open: 0.0,
            medium: 0.0,
            closed: 1.0,
        });
        let mut rng = GenRng::new(2);
        for _ in 0..100 {
            assert_eq!(picker.choose(&mut rng), LevelStyle::Closed);
        }
    }

    #[test]
    fn test_open_is_flat_with_spawns_inside() {
        for seed in 0..30 {
            let mut seg = fresh();
            let mut rng = GenRng::new(seed);
            let x = LevelStyle::Open.generate(&mut seg, &mut rng);
            assert!((MIN_SPAN..=MAX_SPAN).contains(&x));
            assert_eq!(seg.floor().runs().len(), 1);
            assert_eq!(seg.ceiling().runs().len(), 1);
            for s in seg.spawns() {
                assert!(s.args.position.x > 0.0 && s.args.position.x < x as f32);
                assert!(s.args.position.y >= -8.0 && s.args.position.y <= 8.0);
            }
        }
    }

    #[test]
    fn test_medium_never_stacks_enemies() {
        for seed in 0..50 {
            let mut seg = fresh();
            LevelStyle::Medium.generate(&mut seg, &mut GenRng::new(seed));
            let xs: Vec<f32> = seg
                .spawns()
                .iter()
                .filter(|s| s.kind.starts_with("Enemy."))
                .map(|s| s.args.position.x)
                .collect();
            for pair in xs.windows(2) {
                assert!(pair[1] - pair[0] >= (2 * MEDIUM_SPACING) as f32);
            }
            for b in seg.blocks() {
                assert!(b.x0 >= 0 && b.x1 <= seg.x1());
                assert!(b.y0 >= -12 && b.y1 <= 12);
            }
        }
    }

    #[test]
    fn test_medium_keeps_a_passage_past_pinches() {
        for seed in 0..50 {
            let mut seg = fresh();
            LevelStyle::Medium.generate(&mut seg, &mut GenRng::new(seed));
            let blocks = seg.blocks();
            for a in blocks.iter().filter(|b| b.y0 == -12) {
                for b in blocks.iter().filter(|b| b.y1 == 12 && b.x0 == a.x0) {
                    assert!(b.y0 - a.y1 >= 2 * seg.tuning().passage);
                }
            }
        }
    }

    #[test]
    fn test_closed_reaches_target_with_legal_gap() {
        let tuning = Tuning::default();
        for seed in 0..30 {
            let mut seg = fresh();
            let x = LevelStyle::Closed.generate(&mut seg, &mut GenRng::new(seed));
            assert!(x >= MIN_SPAN);
            for x in 0..seg.x1() {
                let gap = seg.ceiling().height_at(x).unwrap() - seg.floor().height_at(x).unwrap();
                assert!((tuning.min_gap..=tuning.max_gap).contains(&gap));
            }
            assert!(seg.spawns().iter().all(|s| s.kind == "Enemy.Ace"));
        }
    }

    #[test]
    fn test_generate_segment_sets_buffers_and_palette() {
        let mut seg = fresh();
        generate_segment(&mut seg, LevelStyle::Medium, &mut GenRng::new(4));
        let [entry, exit] = seg.buffers();
        let (entry, exit) = (entry.unwrap(), exit.unwrap());
        assert_eq!(entry.x, 8);
        assert_eq!(exit.x, seg.x1() - 8);
        assert_eq!(seg.palette(), Some(palettes::MEDIUM));
        assert!(seg.floor().runs()[0].is_buffer());
    }

    #[test]
    fn test_same_seed_same_segment() {
        let build = |seed| {
            let mut seg = fresh();
            generate_segment(&mut seg, LevelStyle::Closed, &mut GenRng::new(seed));
            seg
        };
        let (a, b) = (build(77), build(77));
        assert_eq!(a.floor(), b.floor());
        assert_eq!(a.ceiling(), b.ceiling());
        assert_eq!(a.spawns(), b.spawns());
    }
}
