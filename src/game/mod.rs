//! Game Logic Module
//!
//! All game simulation code. Nothing here touches the clock, the filesystem
//! or an audio device; the runtime feeds it inputs and deltas.
//!
//! ## Module Structure
//!
//! - `config`: Tunables and JSON loading
//! - `input`: Polled key snapshot and press edges
//! - `physics`: Boxes, bodies and the gravity/ground/bounds kernel
//! - `entities`: Flowers, bricks and particles
//! - `projectile`: Thorns and hostile shots
//! - `powerup`: Timed buffs and pickups
//! - `player`: The cactus
//! - `enemy`: Creatures and their AI
//! - `boss`: Guardian phase machines and defeat rewards
//! - `hazard`: Sand storms and shelters
//! - `biome`: Biome spans and guardian triggers
//! - `world`: Entity collections, generation and cleanup
//! - `collision`: Ordered collision resolution
//! - `progress`: Lifetime statistics and achievements
//! - `events`: Frame events for audio and notifications
//! - `state`: The whole run
//! - `render`: Read-only draw snapshot
//! - `tick`: The per-frame pipeline

pub mod config;
pub mod input;
pub mod physics;
pub mod entities;
pub mod projectile;
pub mod powerup;
pub mod player;
pub mod enemy;
pub mod boss;
pub mod hazard;
pub mod biome;
pub mod world;
pub mod collision;
pub mod progress;
pub mod events;
pub mod state;
pub mod render;
pub mod tick;

// Re-export key types
pub use config::GameConfig;
pub use input::{InputFrame, InputTracker};
pub use player::Player;
pub use state::{GameState, GamePhase};
pub use tick::{tick, TickResult};
pub use events::{GameEvent, GameEventData};
