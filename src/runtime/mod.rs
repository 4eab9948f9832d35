//! Runtime Module
//!
//! Everything that touches the host: the frame clock, collaborator traits
//! and their adapters, and progress persistence. Non-deterministic by nature;
//! the simulation in `game/` never calls back into it.
//!
//! ## Module Structure
//!
//! - `driver`: Frame loop, event dispatch and autosave
//! - `services`: Audio, notification, input and render seams
//! - `store`: Progress persistence

pub mod driver;
pub mod services;
pub mod store;

pub use driver::{FrameClock, FrameError, GameLoop, LoopStats, Services};
pub use services::{AudioSink, InputSource, NotificationSink, Renderer, ScriptedInput};
pub use store::{JsonFileStore, MemoryStore, ProgressStore, StoreError};
