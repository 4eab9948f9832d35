//! Game State Definitions
//!
//! The whole simulation lives in one `GameState`: the player, the world, the
//! camera, the run's tallies and the lifetime progress tracker. The tick
//! pipeline mutates it; renderers read it.

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::core::rng::DeterministicRng;
use crate::game::biome::Biome;
use crate::game::config::GameConfig;
use crate::game::enemy::{PlayerView, WorldView};
use crate::game::events::{GameEvent, GameEventData};
use crate::game::input::InputTracker;
use crate::game::player::Player;
use crate::game::progress::ProgressTracker;
use crate::game::world::World;

// =============================================================================
// PHASE
// =============================================================================

/// Top-level state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum GamePhase {
    /// Title screen, nothing simulated
    #[default]
    Menu,
    /// Simulation running
    Playing,
    /// Frozen until pause is pressed again
    Paused,
    /// Player ran out of health
    GameOver,
    /// Flower target reached
    LevelComplete,
}

impl GamePhase {
    /// Run has ended one way or the other.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::LevelComplete)
    }
}

// =============================================================================
// CAMERA
// =============================================================================

/// Horizontal follow camera.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Left edge of the view in world space
    pub x: f32,
}

impl Camera {
    /// Fraction of the gap to the target closed per frame
    pub const FOLLOW: f32 = 0.1;

    /// Ease toward centering `target_x`, clamped to the world.
    pub fn follow(&mut self, target_x: f32, viewport_width: f32, world_width: f32) {
        let goal = target_x - viewport_width * 0.5;
        self.x += (goal - self.x) * Self::FOLLOW;
        let max_x = (world_width - viewport_width).max(0.0);
        self.x = self.x.clamp(0.0, max_x);
    }
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Complete state of a run.
#[derive(Clone, Debug)]
pub struct GameState {
    /// Frames simulated while playing
    pub frame: u64,

    /// Simulated time while playing
    pub elapsed_ms: f64,

    /// Current phase
    pub phase: GamePhase,

    /// Tunables
    pub config: GameConfig,

    /// Procedural decisions and AI rolls
    pub rng: DeterministicRng,

    /// The cactus
    pub player: Player,

    /// Level contents
    pub world: World,

    /// View
    pub camera: Camera,

    /// Run score
    pub score: u32,

    /// Flowers eaten this run
    pub flower_count: u32,

    /// Lifetime statistics and achievements; survives resets
    pub progress: ProgressTracker,

    /// Press-edge detection
    pub input: InputTracker,

    pending_events: Vec<GameEvent>,
}

impl GameState {
    /// Build a fresh run at the menu.
    pub fn new(config: GameConfig) -> Self {
        Self::with_progress(config, ProgressTracker::new())
    }

    /// Build a fresh run carrying existing lifetime progress.
    pub fn with_progress(config: GameConfig, progress: ProgressTracker) -> Self {
        let rng = DeterministicRng::new(config.seed);
        Self::build(config, progress, rng)
    }

    fn build(config: GameConfig, progress: ProgressTracker, mut rng: DeterministicRng) -> Self {
        let world = World::new(&config, &mut rng);
        let player = Player::new(&config);
        Self {
            frame: 0,
            elapsed_ms: 0.0,
            phase: GamePhase::Menu,
            config,
            rng,
            player,
            world,
            camera: Camera::default(),
            score: 0,
            flower_count: 0,
            progress,
            input: InputTracker::default(),
            pending_events: Vec::new(),
        }
    }

    /// Leave the menu and start simulating.
    pub fn start(&mut self) {
        if self.phase != GamePhase::Menu {
            return;
        }
        self.phase = GamePhase::Playing;
        self.progress.biome_entered(Biome::Desert);
        self.push_event(GameEventData::BiomeEntered { biome: Biome::Desert });
        info!("run started (seed {})", self.config.seed);
    }

    /// Throw the run away and start over. Lifetime progress is kept.
    pub fn reset(&mut self) {
        let progress = std::mem::take(&mut self.progress);
        let events = std::mem::take(&mut self.pending_events);
        let seed = self.rng.next_u64();

        let mut next = Self::build(self.config.clone(), progress, DeterministicRng::new(seed));
        next.pending_events = events;
        // Keys held across the restart must not fire fresh edges
        next.input = self.input.clone();
        *self = next;
        self.start();
    }

    /// Flip between playing and paused. Returns the new paused flag, or
    /// `None` outside those phases.
    pub fn toggle_pause(&mut self) -> Option<bool> {
        let paused = match self.phase {
            GamePhase::Playing => true,
            GamePhase::Paused => false,
            _ => return None,
        };
        self.phase = if paused { GamePhase::Paused } else { GamePhase::Playing };
        Some(paused)
    }

    /// Check if the run has ended.
    pub fn is_ended(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Read-only context handed to enemy AI.
    pub fn world_view(&self) -> WorldView {
        WorldView {
            player: PlayerView::of(&self.player),
            gravity: self.config.physics.gravity,
            ground_y: self.config.ground_y(),
            world_width: self.world.width(),
            viewport_height: self.config.viewport.height,
            speed_factor: self.config.physics.speed_factor,
            elapsed_ms: self.elapsed_ms,
        }
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Queue an event stamped with the current frame.
    pub fn push_event(&mut self, data: GameEventData) {
        self.pending_events.push(GameEvent::new(self.frame, data));
    }

    /// Events queued so far this frame.
    pub fn pending_events(&self) -> &[GameEvent] {
        &self.pending_events
    }
}

// =============================================================================
// TESTS
// =============================================================================
