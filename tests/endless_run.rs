//! # Endless Run Integration Test
//!
//! Drives the game through many segment handoffs and checks the corridor
//! stays legal and continuous across every seam.

use dash_corridor::Tuning;
use dash_corridor::sim::{BorderChain, EmittedSegment, Game, PhysicsWorld, TickInput};
use glam::Vec2;

fn teleport_player(game: &mut Game, to: Vec2) {
    let id = game.player_id().expect("player");
    let body = game.body_of_mut(id).expect("player body");
    body.position = to;
    body.previous_position = to;
    body.velocity = Vec2::ZERO;
}

fn assert_segment_legal(seg: &EmittedSegment, tuning: &Tuning) {
    for x in seg.x0..seg.x1 {
        let f = seg.floor.height_at(x).expect("floor covers segment");
        let c = seg.ceiling.height_at(x).expect("ceiling covers segment");
        assert!(
            (tuning.min_gap..=tuning.max_gap).contains(&(c - f)),
            "gap {} at x={} in [{}, {}]",
            c - f,
            x,
            seg.x0,
            seg.x1
        );
    }
    for chain in [&seg.floor, &seg.ceiling] {
        assert_contiguous(chain, seg.x0, seg.x1);
    }
}

fn assert_contiguous(chain: &BorderChain, x0: i32, x1: i32) {
    let runs = chain.runs();
    assert_eq!(runs.first().map(|r| r.x0), Some(x0));
    assert_eq!(runs.last().map(|r| r.x1), Some(x1));
    for pair in runs.windows(2) {
        assert_eq!(pair[0].x1, pair[1].x0, "hole in chain");
    }
}

/// Test: hand off 60 segments in a row without breaking the corridor.
#[test]
fn test_sixty_handoffs_stay_continuous() {
    let tuning = Tuning::default();
    let mut game: Game = Game::new(42, tuning.clone());
    assert_segment_legal(game.segment(), &tuning);

    for i in 1..=60u64 {
        let exit = game.segment().buffers[1];
        let (old_floor, old_ceiling) = game.segment().exit_heights();
        let p = exit.as_vec2() + Vec2::new(2.0, 1.0);
        teleport_player(&mut game, p);

        assert!(game.maybe_transition());
        assert_eq!(game.segment_index(), i);

        let seg = game.segment();
        assert_eq!(seg.buffers[0].as_vec2(), Vec2::ZERO);
        assert_eq!(seg.floor.start_y(), old_floor - exit.y);
        assert_eq!(seg.ceiling.start_y(), old_ceiling - exit.y);
        assert_segment_legal(seg, &tuning);

        let q = game.player_position().expect("player retained");
        assert_eq!(q, Vec2::new(2.0, 1.0));

        let s = seg.stats;
        let geometry = s.base_volumes + s.run_boxes + s.block_boxes + s.seam_walls;
        assert_eq!(game.world().body_count(), geometry + game.entities().len());
    }
}

/// Test: the same seed replays the same corridor.
#[test]
fn test_same_seed_same_run() {
    let run = |seed| {
        let mut game: Game = Game::new(seed, Tuning::default());
        let mut chains = Vec::new();
        for _ in 0..12 {
            game.skip_segment();
            let seg = game.segment();
            chains.push((seg.floor.clone(), seg.ceiling.clone(), seg.spawns.clone()));
        }
        chains
    };
    assert_eq!(run(9), run(9));
    assert_ne!(run(9), run(10));
}

/// Test: fly on autopilot for a while without leaving the corridor.
#[test]
fn test_autopilot_stays_inside() {
    let mut game: Game = Game::new(7, Tuning::default());
    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    for _ in 0..1200 {
        game.step(&input);
        game.emit_frame();
        let Some(p) = game.player_position() else {
            break;
        };
        let seg = game.segment();
        let x = (p.x.floor() as i32).clamp(seg.x0, seg.x1 - 1);
        let f = seg.floor.height_at(x).expect("floor") as f32;
        let c = seg.ceiling.height_at(x).expect("ceiling") as f32;
        assert!(p.y >= f - 1.0 && p.y <= c + 1.0, "player at {p} outside [{f}, {c}]");
    }
    assert!(game.tick() > 0);
}

/// Test: tuning from JSON changes the generated corridor bounds.
#[test]
fn test_tuned_gap_bounds_hold() {
    let tuning = Tuning::from_json(r#"{ "min_gap": 16, "max_gap": 40 }"#).unwrap();
    let mut game: Game = Game::new(3, tuning.clone());
    for _ in 0..20 {
        game.skip_segment();
        assert_segment_legal(game.segment(), &tuning);
    }
}

/// Test: narrow ranges with an odd minimum still start and stay legal.
#[test]
fn test_narrow_odd_gap_tunings_hold() {
    for (min, max) in [(15, 16), (3, 4), (7, 8)] {
        let tuning = Tuning {
            min_gap: min,
            max_gap: max,
            ..Tuning::default()
        };
        for seed in 0..4 {
            let mut game: Game = Game::new(seed, tuning.clone());
            assert_segment_legal(game.segment(), &tuning);
            for _ in 0..10 {
                game.skip_segment();
                assert_segment_legal(game.segment(), &tuning);
                let p = game.player_position().expect("player retained");
                let seg = game.segment();
                assert!(p.x >= seg.x0 as f32 && p.x <= seg.x1 as f32);
            }
        }
    }
}
