//! Dash Corridor entry point
//!
//! Runs the game headless on autopilot and logs every segment handoff.
//! Set `RUST_LOG=info` to see the transitions.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use dash_corridor::Tuning;
use dash_corridor::consts::SIM_DT;
use dash_corridor::sim::game::GamePhase;
use dash_corridor::sim::{Game, PhysicsWorld, TickInput};

/// Command-line arguments for a headless run
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// World seed
    #[arg(short, long, default_value_t = 1)]
    seed: u64,
    /// Stop after this many segment transitions
    #[arg(
        short = 'n',
        long,
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    segments: u64,
    /// Give up after this many simulation ticks
    #[arg(long, value_name = "TICKS", default_value_t = 60 * 60 * 10)]
    max_ticks: u64,
    /// Tuning overrides as JSON
    #[arg(short, long, value_name = "FILE")]
    tuning: Option<PathBuf>,
    /// Jump straight to each exit instead of flying there
    #[arg(long)]
    skip: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = CliArgs::parse();

    let tuning = match &args.tuning {
        Some(path) => match Tuning::load(path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Failed to load tuning from {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Tuning::default(),
    };

    let mut game: Game = Game::new(args.seed, tuning);
    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };

    while game.segment_index() < args.segments && game.tick() < args.max_ticks {
        if args.skip {
            game.skip_segment();
            continue;
        }
        game.update(SIM_DT, &input);
        game.emit_frame();
        if game.phase() == GamePhase::GameOver {
            break;
        }
    }

    let segment = game.segment();
    println!(
        "seed {}: {} segments in {} ticks, score {}, current segment [{}, {}] ({} tiles, {} bodies)",
        game.seed(),
        game.segment_index(),
        game.tick(),
        game.score(),
        segment.x0,
        segment.x1,
        game.tiles().len(),
        game.world().body_count(),
    );
    ExitCode::SUCCESS
}
