//! Cactus Quest
//!
//! Headless runner: plays an autopilot run through the frame driver and logs
//! the outcome. Usage: `cactus-quest [config.json] [progress.json]`.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cactus_quest::{
    game::{config::GameConfig, input::InputFrame, state::GameState, tick::tick},
    runtime::{JsonFileStore, MemoryStore, ScriptedInput},
    GameLoop, Services, VERSION,
};

/// Frames the demo runs for at most (two minutes at 60 fps).
const DEMO_FRAMES: u64 = 7200;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => GameConfig::from_json_file(&path).with_context(|| format!("loading config {}", path))?,
        None => GameConfig::default(),
    };

    info!("Cactus Quest v{}", VERSION);
    info!("Seed: {}", config.seed);
    info!("Target: {} flowers at {} fps", config.goal.target_flowers, config.frame.target_fps);

    let services = Services::headless().with_input(ScriptedInput::new(autopilot));
    let services = match args.next() {
        Some(path) => {
            info!("Progress file: {}", path);
            services.with_store(JsonFileStore::new(path))
        }
        None => services.with_store(MemoryStore::new()),
    };

    let mut game = GameLoop::new(config.clone(), services);
    game.start();

    info!("=== Running ===");
    let stats = game.run(DEMO_FRAMES).await;

    let state = game.state();
    info!("=== Results ===");
    info!("Phase: {:?}", state.phase);
    info!("Score: {}", state.score);
    info!("Flowers: {}/{}", state.flower_count, config.goal.target_flowers);
    info!("Distance: {:.0}px", state.world.max_progress_x());
    info!("Biome: {}", state.world.biome.current().name());
    info!(
        "Achievements: {} unlocked ({}%)",
        state.progress.unlocked_count(),
        state.progress.completion_percent()
    );
    info!(
        "Frames: {} ({} failed), events: {}, saves: {} ({} failed)",
        stats.frames, stats.failed_frames, stats.events, stats.saves, stats.save_failures
    );

    verify_determinism(&config);
    Ok(())
}

/// Hold right; hop every second and throw a thorn every half second.
fn autopilot(frame: u64) -> InputFrame {
    let mut input = InputFrame::with_flags(InputFrame::FLAG_RIGHT);
    input.set_jump(frame % 60 < 5);
    input.set_thorn(frame % 30 == 0);
    input
}

/// Replay the same script twice at a fixed delta and compare the outcome.
fn verify_determinism(config: &GameConfig) {
    info!("=== Verifying Determinism ===");
    let run = || {
        let mut state = GameState::new(config.clone());
        state.start();
        for frame in 0..1200 {
            tick(&mut state, autopilot(frame), 1000.0 / 60.0);
            if state.is_ended() {
                break;
            }
        }
        (state.frame, state.score, state.flower_count, state.world.max_progress_x())
    };

    let first = run();
    let second = run();
    if first == second {
        info!("DETERMINISM VERIFIED: {:?}", first);
    } else {
        info!("DETERMINISM FAILURE: {:?} vs {:?}", first, second);
    }
}
