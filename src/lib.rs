//! # Cactus Quest
//!
//! Simulation core for a 2D side-scroller: a cactus walks an endless desert,
//! eats flowers to grow, throws thorns to befriend creatures and shelters
//! from sand storms.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        CACTUS QUEST                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── vec2.rs     - 2D vector                                 │
//! │  └── rng.rs      - Seeded Xorshift128+ PRNG                  │
//! │                                                              │
//! │  game/           - Simulation (deterministic per seed)       │
//! │  ├── config.rs   - Tunables                                  │
//! │  ├── player.rs   - The cactus                                │
//! │  ├── enemy.rs    - Creatures and AI                          │
//! │  ├── boss.rs     - Guardians                                 │
//! │  ├── hazard.rs   - Storms and shelters                       │
//! │  ├── world.rs    - Generation and cleanup                    │
//! │  ├── collision.rs- Ordered collision resolution              │
//! │  ├── progress.rs - Statistics and achievements               │
//! │  ├── render.rs   - Draw snapshot                             │
//! │  └── tick.rs     - Per-frame pipeline                        │
//! │                                                              │
//! │  runtime/        - Host side (non-deterministic)             │
//! │  ├── driver.rs   - Frame loop and autosave                   │
//! │  ├── services.rs - Audio, notification, input, render        │
//! │  └── store.rs    - Progress persistence                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Given the same config, seed and per-frame inputs and deltas, `game/`
//! produces the same run. All randomness comes from one seeded
//! `DeterministicRng`; nothing in `game/` reads the clock.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod runtime;

// Re-export commonly used types
pub use core::vec2::Vec2;
pub use core::rng::DeterministicRng;
pub use game::config::GameConfig;
pub use game::input::InputFrame;
pub use game::state::{GamePhase, GameState};
pub use game::tick::{tick, TickResult};
pub use runtime::driver::{GameLoop, Services};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
