//! Game Events
//!
//! Discrete occurrences emitted during a frame. The loop driver fans them out
//! to the audio and notification sinks; tests read them to observe the
//! simulation without peeking at internals.

use serde::{Serialize, Deserialize};

use crate::game::biome::Biome;
use crate::game::enemy::Species;
use crate::game::entities::FlowerKind;
use crate::game::player::DamageSource;
use crate::game::powerup::PowerUpKind;

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Player left the ground
    Jumped,

    /// Player threw thorns
    ThornThrown {
        count: u8,
        remaining: u8,
    },

    /// Player ate a flower
    FlowerCollected {
        kind: FlowerKind,
        flower_count: u32,
        score: u32,
    },

    /// A hit landed on the player
    PlayerDamaged {
        source: DamageSource,
        health: u8,
    },

    /// A thorn hit an enemy that survived
    EnemyHit {
        species: Species,
        health: i32,
    },

    /// A regular enemy was worn down and befriended
    EnemyBefriended {
        species: Species,
    },

    /// A guardian boss entered the world
    BossAppeared {
        species: Species,
        biome: Biome,
    },

    /// A boss moved to a later phase
    BossPhaseChanged {
        species: Species,
        phase: u8,
    },

    /// A boss was defeated
    BossDefeated {
        species: Species,
    },

    /// An achievement unlocked for the first time
    AchievementUnlocked {
        id: String,
        name: String,
    },

    /// Player crossed into a new biome
    BiomeEntered {
        biome: Biome,
    },

    /// A sand storm is about to blow in
    StormWarning,

    /// A sand storm passed without hurting the player
    StormWeathered,

    /// Player stepped into a shelter
    ShelterEntered,

    /// Player picked up a power-up
    PowerUpCollected {
        kind: PowerUpKind,
    },

    /// A power-up ran out
    PowerUpExpired {
        kind: PowerUpKind,
    },

    /// Plant toggled on or off
    PlantToggled {
        planted: bool,
    },

    /// Player head-bumped a brick
    BrickHit {
        released_flower: bool,
    },

    /// The world grew to the right
    WorldExtended {
        width: f32,
        difficulty: u32,
    },

    /// Pause toggled
    PauseToggled {
        paused: bool,
    },

    /// Health reached zero
    GameOver {
        score: u32,
        distance: f32,
    },

    /// Flower target reached
    LevelComplete {
        score: u32,
        flower_count: u32,
    },
}

/// Audio cue names consumed by the audio sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioCue {
    /// Jump
    Jump,
    /// Thorn throw
    ThornThrow,
    /// Flower pickup
    FlowerCollect,
    /// Player hurt
    Damage,
    /// Enemy hurt
    EnemyHit,
    /// Enemy befriended
    Befriend,
    /// Boss entrance
    BossAppear,
    /// Boss down
    BossDefeated,
    /// Achievement jingle
    AchievementUnlocked,
    /// Power-up pickup
    PowerUp,
    /// Storm warning siren
    Storm,
    /// Level complete fanfare
    Victory,
    /// Game over sting
    GameOver,
}

impl AudioCue {
    /// Stable name for the sink.
    pub fn as_str(self) -> &'static str {
        match self {
            AudioCue::Jump => "jump",
            AudioCue::ThornThrow => "thorn-throw",
            AudioCue::FlowerCollect => "flower-collect",
            AudioCue::Damage => "damage",
            AudioCue::EnemyHit => "enemy-hit",
            AudioCue::Befriend => "befriend",
            AudioCue::BossAppear => "boss-appear",
            AudioCue::BossDefeated => "boss-defeated",
            AudioCue::AchievementUnlocked => "achievement-unlocked",
            AudioCue::PowerUp => "power-up",
            AudioCue::Storm => "storm",
            AudioCue::Victory => "victory",
            AudioCue::GameOver => "game-over",
        }
    }
}

/// Transient on-screen message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Message text
    pub text: String,
    /// CSS color
    pub color: String,
    /// How long the sink should keep it visible
    pub duration_ms: u32,
}

impl Notification {
    /// Create a notification.
    pub fn new(text: impl Into<String>, color: &str, duration_ms: u32) -> Self {
        Self {
            text: text.into(),
            color: color.to_string(),
            duration_ms,
        }
    }
}

/// A game event stamped with the frame it happened on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Frame when the event occurred
    pub frame: u64,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(frame: u64, data: GameEventData) -> Self {
        Self { frame, data }
    }

    /// The sound this event triggers, if any.
    pub fn audio_cue(&self) -> Option<AudioCue> {
        let cue = match &self.data {
            GameEventData::Jumped => AudioCue::Jump,
            GameEventData::ThornThrown { .. } => AudioCue::ThornThrow,
            GameEventData::FlowerCollected { .. } => AudioCue::FlowerCollect,
            GameEventData::PlayerDamaged { .. } => AudioCue::Damage,
            GameEventData::EnemyHit { .. } => AudioCue::EnemyHit,
            GameEventData::EnemyBefriended { .. } => AudioCue::Befriend,
            GameEventData::BossAppeared { .. } => AudioCue::BossAppear,
            GameEventData::BossDefeated { .. } => AudioCue::BossDefeated,
            GameEventData::AchievementUnlocked { .. } => AudioCue::AchievementUnlocked,
            GameEventData::PowerUpCollected { .. } => AudioCue::PowerUp,
            GameEventData::StormWarning => AudioCue::Storm,
            GameEventData::LevelComplete { .. } => AudioCue::Victory,
            GameEventData::GameOver { .. } => AudioCue::GameOver,
            _ => return None,
        };
        Some(cue)
    }

    /// The on-screen message this event requests, if any.
    pub fn notification(&self) -> Option<Notification> {
        let note = match &self.data {
            GameEventData::StormWarning => {
                Notification::new("Sandstorm approaching! Find shelter or plant yourself!", "#ff8800", 3000)
            }
            GameEventData::StormWeathered => Notification::new("Storm weathered!", "#88ff88", 1500),
            GameEventData::ShelterEntered => Notification::new("Safe in shelter", "#88ccff", 1500),
            GameEventData::BiomeEntered { biome } => {
                Notification::new(format!("Entering {}", biome.name()), "#ffffff", 2500)
            }
            GameEventData::BossAppeared { species, .. } => {
                Notification::new(format!("{} appears!", species.name()), "#ff4444", 3000)
            }
            GameEventData::BossDefeated { species } => {
                Notification::new(format!("{} befriended!", species.name()), "#ffd700", 3000)
            }
            GameEventData::AchievementUnlocked { name, .. } => {
                Notification::new(format!("Achievement: {}", name), "#ffd700", 3000)
            }
            GameEventData::PowerUpCollected { kind } => Notification::new(kind.name(), kind.color(), 2000),
            GameEventData::PauseToggled { paused } => {
                let text = if *paused { "Paused" } else { "Resumed" };
                Notification::new(text, "#ffffff", 1000)
            }
            GameEventData::LevelComplete { flower_count, .. } => {
                Notification::new(format!("Level complete! {} flowers", flower_count), "#00ff88", 5000)
            }
            GameEventData::GameOver { .. } => Notification::new("Game over", "#ff4444", 5000),
            _ => return None,
        };
        Some(note)
    }
}

// =============================================================================
// TESTS
// =============================================================================
