//! Loop Driver
//!
//! Feeds the simulation one frame at a time: clamp the delta, poll input,
//! tick, render, then fan events out to audio and notifications and persist
//! progress when it matters. A frame that panics is logged and dropped; the
//! next one runs regardless.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use thiserror::Error;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::game::config::GameConfig;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::progress::ProgressTracker;
use crate::game::render;
use crate::game::state::GameState;
use crate::game::tick::{tick, TickResult};
use crate::runtime::services::{
    AudioSink, InputSource, LogNotifier, NotificationSink, NullRenderer, RenderError, Renderer,
    ScriptedInput, TracingAudio,
};
use crate::runtime::store::{MemoryStore, ProgressStore};

/// A frame that could not complete.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Update or render panicked.
    #[error("frame {frame} {stage} panicked: {message}")]
    Panicked {
        /// Frame number when it happened
        frame: u64,
        /// `update` or `render`
        stage: &'static str,
        /// Panic payload, if it was a string
        message: String,
    },

    /// The renderer reported a failure.
    #[error("frame {frame} render failed: {source}")]
    Render {
        /// Frame number
        frame: u64,
        /// Underlying error
        #[source]
        source: RenderError,
    },
}

// =============================================================================
// CLOCK
// =============================================================================

/// Turns host timestamps into clamped frame deltas.
#[derive(Clone, Debug)]
pub struct FrameClock {
    last_ms: f64,
    max_delta_ms: f32,
}

impl FrameClock {
    /// Clock that never reports more than `max_delta_ms` for one frame.
    pub fn new(max_delta_ms: f32) -> Self {
        Self { last_ms: 0.0, max_delta_ms }
    }

    /// Delta since the previous timestamp, clamped to `[0, max]`.
    pub fn delta(&mut self, now_ms: f64) -> f32 {
        let raw = now_ms - self.last_ms;
        self.last_ms = now_ms;
        raw.clamp(0.0, self.max_delta_ms as f64) as f32
    }
}

// =============================================================================
// SERVICES
// =============================================================================

/// The driver's collaborators.
pub struct Services {
    /// Sound cues
    pub audio: Box<dyn AudioSink>,
    /// On-screen messages
    pub notifier: Box<dyn NotificationSink>,
    /// Key polling
    pub input: Box<dyn InputSource>,
    /// Drawing
    pub renderer: Box<dyn Renderer>,
    /// Lifetime progress
    pub store: Box<dyn ProgressStore>,
}

impl Services {
    /// Logging audio and notifications, no input, no drawing, memory store.
    pub fn headless() -> Self {
        Self {
            audio: Box::new(TracingAudio),
            notifier: Box::new(LogNotifier),
            input: Box::new(ScriptedInput::idle()),
            renderer: Box::new(NullRenderer),
            store: Box::new(MemoryStore::new()),
        }
    }

    /// Replace the audio sink.
    pub fn with_audio(mut self, audio: impl AudioSink + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    /// Replace the notification sink.
    pub fn with_notifier(mut self, notifier: impl NotificationSink + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Replace the input source.
    pub fn with_input(mut self, input: impl InputSource + 'static) -> Self {
        self.input = Box::new(input);
        self
    }

    /// Replace the renderer.
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Replace the progress store.
    pub fn with_store(mut self, store: impl ProgressStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }
}

// =============================================================================
// GAME LOOP
// =============================================================================

/// Counters for a driver session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Frames attempted
    pub frames: u64,
    /// Frames that panicked or failed to render
    pub failed_frames: u64,
    /// Events dispatched
    pub events: u64,
    /// Successful progress saves
    pub saves: u64,
    /// Failed progress saves
    pub save_failures: u64,
}

/// Owns a run and its collaborators.
pub struct GameLoop {
    state: GameState,
    clock: FrameClock,
    services: Services,
    stats: LoopStats,
    last_save_frame: u64,
}

impl GameLoop {
    /// Build a run, restoring lifetime progress from the store if it can.
    pub fn new(config: GameConfig, mut services: Services) -> Self {
        let progress = match services.store.load() {
            Ok(Some(snapshot)) => {
                info!("restored progress ({} achievements)", snapshot.unlocked.len());
                ProgressTracker::from_snapshot(snapshot)
            }
            Ok(None) => ProgressTracker::new(),
            Err(e) => {
                warn!("progress store unavailable, starting fresh: {}", e);
                ProgressTracker::new()
            }
        };

        let clock = FrameClock::new(config.frame.max_delta_ms);
        Self {
            state: GameState::with_progress(config, progress),
            clock,
            services,
            stats: LoopStats::default(),
            last_save_frame: 0,
        }
    }

    /// The run.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// The run, mutably (menus, debugging, tests).
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// Session counters.
    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Leave the menu.
    pub fn start(&mut self) {
        self.state.start();
        let events = self.state.take_events();
        self.dispatch(&events);
    }

    /// Start over after a terminal state; lifetime progress carries over.
    pub fn restart(&mut self) {
        self.state.reset();
        let events = self.state.take_events();
        self.dispatch(&events);
    }

    /// Run one frame at host time `now_ms`.
    pub fn frame(&mut self, now_ms: f64) -> Result<TickResult, FrameError> {
        self.stats.frames += 1;
        let dt = self.clock.delta(now_ms);
        let frame = self.state.frame;
        let input = self.services.input.poll(frame);

        let state = &mut self.state;
        let updated = panic::catch_unwind(AssertUnwindSafe(|| tick(state, input, dt)));
        let result = match updated {
            Ok(result) => result,
            Err(payload) => {
                self.stats.failed_frames += 1;
                let message = panic_message(payload.as_ref());
                error!("frame {} update panicked: {}", frame, message);
                return Err(FrameError::Panicked { frame, stage: "update", message });
            }
        };

        // The update is done; its events go out whatever the renderer does
        self.dispatch(&result.events);
        self.persist(&result);

        let state = &self.state;
        let renderer = &mut self.services.renderer;
        let rendered = panic::catch_unwind(AssertUnwindSafe(|| renderer.render(&render::snapshot(state))));
        match rendered {
            Ok(Ok(())) => Ok(result),
            Ok(Err(source)) => {
                self.stats.failed_frames += 1;
                warn!("frame {} render failed: {}", frame, source);
                Err(FrameError::Render { frame, source })
            }
            Err(payload) => {
                self.stats.failed_frames += 1;
                let message = panic_message(payload.as_ref());
                error!("frame {} render panicked: {}", frame, message);
                Err(FrameError::Panicked { frame, stage: "render", message })
            }
        }
    }

    /// Drive frames on a tokio interval at the configured rate until the run
    /// ends or `max_frames` have been attempted.
    pub async fn run(&mut self, max_frames: u64) -> LoopStats {
        let fps = self.state.config.frame.target_fps.max(1) as u64;
        let mut ticker = interval(Duration::from_micros(1_000_000 / fps));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let origin = Instant::now();

        for _ in 0..max_frames {
            ticker.tick().await;
            let now_ms = origin.elapsed().as_secs_f64() * 1000.0;
            // Failures are already logged; the loop goes on
            let _ = self.frame(now_ms);
            if self.state.is_ended() {
                info!("run ended at frame {} ({:?})", self.state.frame, self.state.phase);
                break;
            }
        }

        self.flush();
        self.stats.clone()
    }

    /// Save progress now if anything changed.
    pub fn flush(&mut self) {
        if self.state.progress.is_dirty() {
            self.save();
        }
    }

    fn dispatch(&mut self, events: &[GameEvent]) {
        for event in events {
            self.stats.events += 1;
            if let Some(cue) = event.audio_cue() {
                if let Err(e) = self.services.audio.play(cue) {
                    warn!("audio cue {} dropped: {}", cue.as_str(), e);
                }
            }
            if let Some(notification) = event.notification() {
                if let Err(e) = self.services.notifier.notify(&notification) {
                    warn!("notification dropped: {}", e);
                }
            }
        }
    }

    fn persist(&mut self, result: &TickResult) {
        if !self.state.progress.is_dirty() {
            return;
        }
        let unlocked = result
            .events
            .iter()
            .any(|e| matches!(e.data, GameEventData::AchievementUnlocked { .. }));
        let terminal = result.game_over || result.level_complete;
        let autosave = self.state.frame.saturating_sub(self.last_save_frame) >= self.state.config.frame.autosave_frames;

        if unlocked || terminal || autosave {
            self.save();
        }
    }

    fn save(&mut self) {
        self.last_save_frame = self.state.frame;
        match self.services.store.save(&self.state.progress.snapshot()) {
            Ok(()) => {
                self.state.progress.mark_clean();
                self.stats.saves += 1;
                debug!("progress saved at frame {}", self.state.frame);
            }
            Err(e) => {
                self.stats.save_failures += 1;
                warn!("progress save failed: {}", e);
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use crate::game::events::{AudioCue, Notification};
    use crate::game::input::InputFrame;
    use crate::game::progress::Metric;
    use crate::game::render::RenderSnapshot;
    use crate::game::state::GamePhase;
    use crate::runtime::services::ServiceError;

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        seen: Arc<Mutex<Vec<Notification>>>,
    }

    impl NotificationSink for RecordingNotifier {
        fn notify(&mut self, notification: &Notification) -> Result<(), ServiceError> {
            self.seen.lock().map_err(|_| ServiceError::Failed("poisoned".into()))?.push(notification.clone());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingAudio {
        cues: Arc<Mutex<Vec<AudioCue>>>,
    }

    impl AudioSink for RecordingAudio {
        fn play(&mut self, cue: AudioCue) -> Result<(), ServiceError> {
            self.cues.lock().map_err(|_| ServiceError::Failed("poisoned".into()))?.push(cue);
            Ok(())
        }
    }

    struct BrokenAudio;

    impl AudioSink for BrokenAudio {
        fn play(&mut self, _cue: AudioCue) -> Result<(), ServiceError> {
            Err(ServiceError::Unavailable("audio"))
        }
    }

    /// Panics on the frames listed.
    struct FlakyRenderer {
        panic_on: Vec<u64>,
    }

    impl Renderer for FlakyRenderer {
        fn render(&mut self, snapshot: &RenderSnapshot) -> Result<(), RenderError> {
            if self.panic_on.contains(&snapshot.frame) {
                panic!("renderer exploded on frame {}", snapshot.frame);
            }
            Ok(())
        }
    }

    fn fast_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.frame.target_fps = 1000;
        config
    }

    #[test]
    fn test_clock_clamps_long_frames() {
        let mut clock = FrameClock::new(50.0);
        assert_eq!(clock.delta(16.0), 16.0);
        assert_eq!(clock.delta(32.0), 16.0);
        assert_eq!(clock.delta(5032.0), 50.0);
        assert_eq!(clock.delta(5000.0), 0.0);
    }

    #[test]
    fn test_panicking_frame_is_skipped_not_fatal() {
        let services = Services::headless().with_renderer(FlakyRenderer { panic_on: vec![2] });
        let mut game = GameLoop::new(GameConfig::default(), services);
        game.start();

        assert!(game.frame(16.0).is_ok());
        let err = game.frame(32.0).unwrap_err();
        assert!(matches!(err, FrameError::Panicked { .. }));
        assert!(game.frame(48.0).is_ok());

        assert_eq!(game.stats().frames, 3);
        assert_eq!(game.stats().failed_frames, 1);
        assert_eq!(game.state().phase, GamePhase::Playing);
    }

    #[test]
    fn test_render_panic_keeps_finished_update() {
        let notifier = RecordingNotifier::default();
        let notes = notifier.seen.clone();
        let audio = RecordingAudio::default();
        let cues = audio.cues.clone();
        let store = MemoryStore::new();
        let services = Services::headless()
            .with_notifier(notifier)
            .with_audio(audio)
            .with_store(store.clone())
            .with_renderer(FlakyRenderer { panic_on: vec![1] });
        let mut game = GameLoop::new(GameConfig::default(), services);
        game.start();
        let target = game.state().config.goal.target_flowers;
        game.state_mut().flower_count = target;

        let err = game.frame(16.0).unwrap_err();
        assert!(matches!(err, FrameError::Panicked { stage: "render", .. }));
        assert_eq!(game.state().phase, GamePhase::LevelComplete);
        assert_eq!(game.stats().failed_frames, 1);

        let notes = notes.lock().expect("lock");
        assert!(notes.iter().any(|n| n.text.starts_with("Level complete")));
        assert!(notes.iter().any(|n| n.text.contains("Desert Explorer")));
        let cues = cues.lock().expect("lock");
        assert!(cues.contains(&AudioCue::Victory));
        assert!(cues.contains(&AudioCue::AchievementUnlocked));

        let saved = store.saved().expect("terminal frame saved");
        assert!(saved.unlocked.contains_key("desertExplorer"));
    }

    #[test]
    fn test_unavailable_store_does_not_touch_simulation() {
        let services = Services::headless().with_store(MemoryStore::unavailable());
        let mut game = GameLoop::new(GameConfig::default(), services);
        game.start();

        for i in 1..=5 {
            assert!(game.frame(i as f64 * 16.0).is_ok());
        }
        game.flush();
        assert_eq!(game.state().frame, 5);
        assert!(game.stats().save_failures >= 1);
        assert!(game.state().progress.is_dirty());
    }

    #[test]
    fn test_broken_audio_is_tolerated() {
        let services = Services::headless().with_audio(BrokenAudio);
        let mut game = GameLoop::new(GameConfig::default(), services);
        game.start();
        let jump = InputFrame::with_flags(InputFrame::FLAG_JUMP);
        game.services.input = Box::new(ScriptedInput::new(move |_| jump));

        assert!(game.frame(16.0).is_ok());
        assert_eq!(game.state().progress.value(Metric::Jumps), 1.0);
    }

    #[test]
    fn test_unlock_triggers_save_and_restore() {
        let store = MemoryStore::new();
        let services = Services::headless().with_store(store.clone());
        let mut game = GameLoop::new(GameConfig::default(), services);
        game.start();

        // Entering the desert unlocks its achievement on the first frame
        assert!(game.frame(16.0).is_ok());
        let saved = store.saved().expect("saved after unlock");
        assert!(saved.unlocked.contains_key("desertExplorer"));

        let restored = GameLoop::new(GameConfig::default(), Services::headless().with_store(store));
        assert!(restored.state().progress.is_unlocked("desertExplorer"));
    }

    #[test]
    fn test_pause_notification_reaches_sink() {
        let notifier = RecordingNotifier::default();
        let seen = notifier.seen.clone();
        let pause = InputFrame::with_flags(InputFrame::FLAG_PAUSE);
        let services = Services::headless()
            .with_notifier(notifier)
            .with_input(ScriptedInput::new(move |_| pause));
        let mut game = GameLoop::new(GameConfig::default(), services);
        game.start();

        assert!(game.frame(16.0).is_ok());
        assert_eq!(game.state().phase, GamePhase::Paused);
        let seen = seen.lock().expect("lock");
        assert!(seen.iter().any(|n| n.text.contains("Paused")));
    }

    #[tokio::test]
    async fn test_run_stops_at_frame_budget() {
        let mut game = GameLoop::new(fast_config(), Services::headless());
        game.start();
        let stats = game.run(20).await;
        assert_eq!(stats.frames, 20);
        assert_eq!(stats.failed_frames, 0);
        assert!(game.state().frame > 0);
    }

    #[tokio::test]
    async fn test_run_stops_when_run_ends() {
        let mut game = GameLoop::new(fast_config(), Services::headless());
        game.start();
        let target = game.state().config.goal.target_flowers;
        game.state_mut().flower_count = target;

        let stats = game.run(50).await;
        assert_eq!(stats.frames, 1);
        assert_eq!(game.state().phase, GamePhase::LevelComplete);
    }
}
