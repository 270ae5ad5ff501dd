//! Spin Arena - headless runner
//!
//! Plays one match with the demo autopilot at the wheel and logs how it went.

use std::path::PathBuf;

use clap::Parser;
use spin_arena::consts::{SIM_DT, TICKS_PER_SECOND};
use spin_arena::sim::MatchMode;
use spin_arena::{Game, Settings, SettingsError};

/// Run a spinning-top match headless
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Match mode: arena, survival or duel
    #[arg(short, long, default_value = "arena")]
    mode: MatchMode,

    /// RNG seed (same seed, same match)
    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    /// Simulated seconds to run before giving up
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,

    /// JSON balance overrides
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), SettingsError> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    log::info!("Spin Arena (headless) starting: {} seed {}", args.mode.as_str(), args.seed);
    let mut game: Game = Game::start_match(args.mode, settings, args.seed);
    game.set_idle_mode(true);

    let total_ticks = (args.seconds.max(0.0) * TICKS_PER_SECOND as f32) as u64;
    let report_every = TICKS_PER_SECOND * 10;
    while game.session().time_ticks < total_ticks && !game.session().phase.is_over() {
        if game.advance(SIM_DT) == 0 {
            continue;
        }
        for event in game.drain_events() {
            log::trace!("{:?}", event);
        }

        let snap = game.snapshot();
        if snap.tick > 0 && snap.tick % report_every == 0 {
            log::info!(
                "t={}s phase={:?} rpm={:.1} zone={:.0} bots={} eliminated={}",
                snap.tick / TICKS_PER_SECOND,
                snap.phase,
                snap.player_rpm,
                snap.zone_radius,
                snap.bots_alive,
                snap.stats.bots_eliminated
            );
        }
    }

    let snap = game.snapshot();
    log::info!(
        "Finished after {:.1}s: {:?}, {} bots eliminated",
        snap.stats.survived_ticks as f32 / TICKS_PER_SECOND as f32,
        snap.phase,
        snap.stats.bots_eliminated
    );
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snap)?);
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is the product on wasm; hosts drive `Game` directly
}
