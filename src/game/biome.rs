//! Biomes
//!
//! The world is cut into fixed-width spans that cycle through four biomes.
//! Biome identity is a pure function of x; the tracker turns crossings into
//! one-time transitions and decides when the biome's guardian shows up.

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::game::config::GameConfig;
use crate::game::enemy::Species;
use crate::game::powerup::PowerUpKind;

/// Environment segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Biome {
    /// Sandy dunes
    Desert,
    /// Lush paradise
    Oasis,
    /// Red cliffs
    Canyon,
    /// Forgotten structures
    Ruins,
}

impl Biome {
    /// Cycle order.
    pub const ORDER: [Biome; 4] = [Biome::Desert, Biome::Oasis, Biome::Canyon, Biome::Ruins];

    /// Biome for a span index.
    pub fn from_index(index: u64) -> Self {
        Self::ORDER[(index % Self::ORDER.len() as u64) as usize]
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Biome::Desert => "Desert",
            Biome::Oasis => "Oasis",
            Biome::Canyon => "Rocky Canyon",
            Biome::Ruins => "Ancient Ruins",
        }
    }

    /// Creatures that populate the biome.
    pub fn roster(self) -> &'static [Species] {
        match self {
            Biome::Desert => &[Species::Camel, Species::Scorpion],
            Biome::Oasis => &[Species::Camel, Species::Vulture],
            Biome::Canyon => &[Species::RockGolem, Species::Vulture],
            Biome::Ruins => &[Species::RockGolem, Species::Scorpion],
        }
    }

    /// Power-ups that spawn in the biome.
    pub fn power_ups(self) -> &'static [PowerUpKind] {
        match self {
            Biome::Desert => &[PowerUpKind::Speed, PowerUpKind::Shield],
            Biome::Oasis => &[PowerUpKind::JumpBoost, PowerUpKind::ThornRegen],
            Biome::Canyon => &[PowerUpKind::MultiThorn, PowerUpKind::Shield],
            Biome::Ruins => &[PowerUpKind::Speed, PowerUpKind::MultiThorn, PowerUpKind::JumpBoost],
        }
    }

    /// Guardian boss.
    pub fn guardian(self) -> Species {
        match self {
            Biome::Desert | Biome::Canyon => Species::SandWorm,
            Biome::Oasis | Biome::Ruins => Species::GiantVulture,
        }
    }
}

/// Span index containing `x`.
#[inline]
pub fn span_index(x: f32, span: f32) -> u64 {
    (x.max(0.0) / span).floor() as u64
}

/// Biome containing `x`.
#[inline]
pub fn biome_at(x: f32, span: f32) -> Biome {
    Biome::from_index(span_index(x, span))
}

/// What the tracker noticed this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BiomeUpdate {
    /// Crossed into a new biome span
    pub entered: Option<Biome>,
    /// Guardian to spawn, and where
    pub spawn_boss: Option<(Species, f32)>,
}

/// Tracks the player's biome and guardian triggers.
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeTracker {
    span: u64,
    current: Biome,
    boss_spawned: bool,
}

impl Default for BiomeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BiomeTracker {
    /// Start in the first desert span.
    pub fn new() -> Self {
        Self {
            span: 0,
            current: Biome::Desert,
            boss_spawned: false,
        }
    }

    /// Current biome.
    pub fn current(&self) -> Biome {
        self.current
    }

    /// Current span index.
    pub fn span(&self) -> u64 {
        self.span
    }

    /// This visit's guardian already appeared.
    pub fn boss_spawned(&self) -> bool {
        self.boss_spawned
    }

    /// Check the player's position. Transitions fire only when a new,
    /// further span is reached; the guardian appears once per visit after
    /// the configured fraction of the span.
    pub fn update(&mut self, player_x: f32, config: &GameConfig) -> BiomeUpdate {
        let span_width = config.world.biome_span;
        let mut update = BiomeUpdate::default();

        let index = span_index(player_x, span_width);
        if index > self.span {
            self.span = index;
            self.current = Biome::from_index(index);
            self.boss_spawned = false;
            update.entered = Some(self.current);
            info!("entering {} (span {})", self.current.name(), index);
        }

        let span_start = self.span as f32 * span_width;
        let into_span = player_x - span_start;
        if !self.boss_spawned && into_span > span_width * config.world.boss_trigger_fraction {
            self.boss_spawned = true;
            let x = player_x + config.screen_width() * 0.75;
            update.spawn_boss = Some((self.current.guardian(), x));
        }

        update
    }
}

// =============================================================================
// TESTS
// =============================================================================
