//! Collaborator Interfaces
//!
//! Narrow traits for everything outside the simulation: audio, on-screen
//! notifications, input polling and drawing. The loop driver owns one of each
//! and never lets their failures reach the simulation.

use thiserror::Error;
use tracing::{debug, info};

use crate::game::events::{AudioCue, Notification};
use crate::game::input::InputFrame;
use crate::game::render::RenderSnapshot;

/// Failure of an audio or notification collaborator.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The device or surface is not there.
    #[error("{0} unavailable")]
    Unavailable(&'static str),

    /// The collaborator tried and failed.
    #[error("service failed: {0}")]
    Failed(String),
}

/// Failure while drawing a frame.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The surface is gone (window closed, context lost).
    #[error("render surface lost")]
    SurfaceLost,

    /// Any other drawing failure.
    #[error("render failed: {0}")]
    Failed(String),
}

// =============================================================================
// TRAITS
// =============================================================================

/// Fire-and-forget sound cues.
pub trait AudioSink {
    /// Play a cue. At most once per occurrence; nothing waits on it.
    fn play(&mut self, cue: AudioCue) -> Result<(), ServiceError>;
}

/// Transient on-screen messages.
pub trait NotificationSink {
    /// Show a message; display and dismissal timing are the sink's concern.
    fn notify(&mut self, notification: &Notification) -> Result<(), ServiceError>;
}

/// Current-state input polling.
pub trait InputSource {
    /// Snapshot of held keys for the given frame.
    fn poll(&mut self, frame: u64) -> InputFrame;
}

/// Draws snapshots. Never mutates the simulation.
pub trait Renderer {
    /// Draw one frame.
    fn render(&mut self, snapshot: &RenderSnapshot) -> Result<(), RenderError>;
}

// =============================================================================
// ADAPTERS
// =============================================================================

/// Logs cues instead of playing them.
#[derive(Debug, Default)]
pub struct TracingAudio;

impl AudioSink for TracingAudio {
    fn play(&mut self, cue: AudioCue) -> Result<(), ServiceError> {
        debug!(cue = cue.as_str(), "audio");
        Ok(())
    }
}

/// Discards cues.
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: AudioCue) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// Writes notifications to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&mut self, notification: &Notification) -> Result<(), ServiceError> {
        info!(color = %notification.color, duration_ms = notification.duration_ms, "{}", notification.text);
        Ok(())
    }
}

/// Draws nothing.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _snapshot: &RenderSnapshot) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Input from a function of the frame index (demos, tests, replays of a
/// fixed script).
pub struct ScriptedInput<F> {
    script: F,
}

impl<F> ScriptedInput<F>
where
    F: FnMut(u64) -> InputFrame,
{
    /// Wrap a script.
    pub fn new(script: F) -> Self {
        Self { script }
    }
}

impl ScriptedInput<fn(u64) -> InputFrame> {
    /// No keys, ever.
    pub fn idle() -> Self {
        fn nothing(_: u64) -> InputFrame {
            InputFrame::new()
        }
        Self { script: nothing }
    }
}

impl<F> InputSource for ScriptedInput<F>
where
    F: FnMut(u64) -> InputFrame,
{
    fn poll(&mut self, frame: u64) -> InputFrame {
        (self.script)(frame)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_input_follows_frame_index() {
        let mut input = ScriptedInput::new(|frame| {
            if frame % 2 == 0 {
                InputFrame::with_flags(InputFrame::FLAG_RIGHT)
            } else {
                InputFrame::new()
            }
        });
        assert!(input.poll(0).right());
        assert!(!input.poll(1).right());
        assert!(ScriptedInput::idle().poll(7).is_idle());
    }

    #[test]
    fn test_default_adapters_accept_everything() {
        assert!(TracingAudio.play(AudioCue::Jump).is_ok());
        assert!(NullAudio.play(AudioCue::Jump).is_ok());
        let note = Notification::new("hello", "#ffffff", 1000);
        assert!(LogNotifier.notify(&note).is_ok());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ServiceError::Unavailable("audio").to_string(), "audio unavailable");
        assert_eq!(RenderError::SurfaceLost.to_string(), "render surface lost");
    }
}
