//! Achievement & Progress Tracker
//!
//! Named counters fed by gameplay, and the achievement catalog they unlock.
//! Counters only grow, except where a rule explicitly resets one
//! (`noDamageDistance` on a hit). Unlocking is idempotent: once an id is in
//! the unlocked set it is never evaluated again.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::info;

use crate::game::biome::Biome;
use crate::game::enemy::Species;

// =============================================================================
// METRICS
// =============================================================================

/// Tracked counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    /// Forward pixels travelled
    Distance,
    /// Creatures worn down and befriended
    CreaturesBefriended,
    /// Flowers eaten
    FlowersCollected,
    /// Storms that passed without a hit
    StormsWeathered,
    /// Forward pixels since the last hit
    NoDamageDistance,
    /// Power-ups picked up
    PowerupsCollected,
    /// Bricks head-bumped
    BricksHit,
    /// Jumps started
    Jumps,
    /// Plants started
    PlantsUsed,
    /// Best score
    Score,
    /// Largest size reached
    MaxSize,
    /// Super flowers eaten
    SuperFlowersCollected,
}

// =============================================================================
// CATALOG
// =============================================================================

/// Unlock condition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rule {
    /// Counter reaches a target
    Reach(Metric, f64),
    /// Enter a biome
    EnterBiome(Biome),
    /// Befriend a guardian
    BefriendGuardian(Species),
}

/// One achievement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Achievement {
    /// Stable id (persisted)
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Display description
    pub description: &'static str,
    /// Unlock condition
    pub rule: Rule,
}

const fn reach(id: &'static str, name: &'static str, description: &'static str, metric: Metric, target: f64) -> Achievement {
    Achievement { id, name, description, rule: Rule::Reach(metric, target) }
}

/// Every achievement.
pub static ACHIEVEMENTS: [Achievement; 26] = [
    reach("explorer", "Desert Explorer", "Travel 5000 pixels", Metric::Distance, 5000.0),
    reach("nomad", "Desert Nomad", "Travel 15000 pixels", Metric::Distance, 15000.0),
    reach("wanderer", "Eternal Wanderer", "Travel 50000 pixels", Metric::Distance, 50000.0),
    reach("peacemaker", "Desert Peacemaker", "Befriend 50 creatures", Metric::CreaturesBefriended, 50.0),
    reach("harmony", "Desert Harmony", "Befriend 200 creatures", Metric::CreaturesBefriended, 200.0),
    reach("legend", "Cactus Legend", "Befriend 500 creatures", Metric::CreaturesBefriended, 500.0),
    reach("collector", "Flower Collector", "Collect 100 flowers", Metric::FlowersCollected, 100.0),
    reach("gardener", "Desert Gardener", "Collect 500 flowers", Metric::FlowersCollected, 500.0),
    reach("botanist", "Master Botanist", "Collect 1000 flowers", Metric::FlowersCollected, 1000.0),
    reach("survivor", "Storm Survivor", "Survive 10 sand storms", Metric::StormsWeathered, 10.0),
    reach("stormmaster", "Storm Master", "Survive 50 sand storms", Metric::StormsWeathered, 50.0),
    reach("untouchable", "Untouchable", "Travel 2000 pixels without taking damage", Metric::NoDamageDistance, 2000.0),
    reach("poweruser", "Power User", "Collect 25 power-ups", Metric::PowerupsCollected, 25.0),
    reach("brickbreaker", "Brick Breaker", "Hit 100 bricks", Metric::BricksHit, 100.0),
    reach("jumper", "High Jumper", "Jump 1000 times", Metric::Jumps, 1000.0),
    reach("planter", "Master Planter", "Use plant power 100 times", Metric::PlantsUsed, 100.0),
    reach("scorer", "Point Scorer", "Reach 5000 points", Metric::Score, 5000.0),
    reach("champion", "Desert Champion", "Reach 20000 points", Metric::Score, 20000.0),
    reach("grower", "Growing Strong", "Reach maximum size", Metric::MaxSize, 3.0),
    reach("superflower", "Super Collector", "Collect 50 super flowers", Metric::SuperFlowersCollected, 50.0),
    Achievement {
        id: "desertExplorer",
        name: "Desert Explorer",
        description: "Enter the Desert biome",
        rule: Rule::EnterBiome(Biome::Desert),
    },
    Achievement {
        id: "oasisFinder",
        name: "Oasis Finder",
        description: "Enter the Oasis biome",
        rule: Rule::EnterBiome(Biome::Oasis),
    },
    Achievement {
        id: "canyonClimber",
        name: "Canyon Climber",
        description: "Enter the Rocky Canyon biome",
        rule: Rule::EnterBiome(Biome::Canyon),
    },
    Achievement {
        id: "ruinsSeeker",
        name: "Ruins Seeker",
        description: "Enter the Ancient Ruins biome",
        rule: Rule::EnterBiome(Biome::Ruins),
    },
    Achievement {
        id: "wormFriend",
        name: "Worm Whisperer",
        description: "Befriend the Sand Worm guardian",
        rule: Rule::BefriendGuardian(Species::SandWorm),
    },
    Achievement {
        id: "skyFriend",
        name: "Sky Friend",
        description: "Befriend the Giant Vulture guardian",
        rule: Rule::BefriendGuardian(Species::GiantVulture),
    },
];

/// Look up an achievement by id.
pub fn achievement(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

// =============================================================================
// TRACKER
// =============================================================================

/// Persisted form of the tracker.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Counter values
    pub counters: BTreeMap<Metric, f64>,
    /// Unlocked achievement ids with their unlock time
    pub unlocked: BTreeMap<String, DateTime<Utc>>,
}

/// Counters plus unlock state.
#[derive(Clone, Debug, Default)]
pub struct ProgressTracker {
    counters: BTreeMap<Metric, f64>,
    unlocked: BTreeMap<String, DateTime<Utc>>,
    pending: Vec<&'static Achievement>,
    dirty: bool,
}

impl ProgressTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from persisted state. Unknown ids are dropped.
    pub fn from_snapshot(snapshot: ProgressSnapshot) -> Self {
        let unlocked = snapshot
            .unlocked
            .into_iter()
            .filter(|(id, _)| achievement(id).is_some())
            .collect();
        Self {
            counters: snapshot.counters,
            unlocked,
            pending: Vec::new(),
            dirty: false,
        }
    }

    /// Persistable copy.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            counters: self.counters.clone(),
            unlocked: self.unlocked.clone(),
        }
    }

    /// Current value of a counter.
    pub fn value(&self, metric: Metric) -> f64 {
        self.counters.get(&metric).copied().unwrap_or(0.0)
    }

    /// Add to a counter. Negative amounts are ignored.
    pub fn increment(&mut self, metric: Metric, amount: f64) {
        if amount <= 0.0 {
            return;
        }
        *self.counters.entry(metric).or_insert(0.0) += amount;
        self.dirty = true;
        self.evaluate(metric);
    }

    /// Raise a counter to `value` if it is higher.
    pub fn set(&mut self, metric: Metric, value: f64) {
        let current = self.counters.entry(metric).or_insert(0.0);
        if value > *current {
            *current = value;
            self.dirty = true;
            self.evaluate(metric);
        }
    }

    /// Reset a counter to zero.
    pub fn reset(&mut self, metric: Metric) {
        if self.value(metric) != 0.0 {
            self.counters.insert(metric, 0.0);
            self.dirty = true;
        }
    }

    /// Record entering a biome.
    pub fn biome_entered(&mut self, biome: Biome) {
        self.unlock_where(|rule| rule == Rule::EnterBiome(biome));
    }

    /// Record befriending a guardian.
    pub fn guardian_befriended(&mut self, species: Species) {
        self.unlock_where(|rule| rule == Rule::BefriendGuardian(species));
    }

    /// Already unlocked.
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains_key(id)
    }

    /// When `id` was unlocked.
    pub fn unlocked_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.unlocked.get(id).copied()
    }

    /// Number unlocked.
    pub fn unlocked_count(&self) -> usize {
        self.unlocked.len()
    }

    /// Completion as a whole percentage.
    pub fn completion_percent(&self) -> u32 {
        (self.unlocked.len() as f64 / ACHIEVEMENTS.len() as f64 * 100.0).round() as u32
    }

    /// Achievements unlocked since the last call.
    pub fn take_unlocked(&mut self) -> Vec<&'static Achievement> {
        std::mem::take(&mut self.pending)
    }

    /// Changed since the last save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark as saved.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn evaluate(&mut self, metric: Metric) {
        let value = self.value(metric);
        self.unlock_where(|rule| matches!(rule, Rule::Reach(m, target) if m == metric && value >= target));
    }

    fn unlock_where(&mut self, predicate: impl Fn(Rule) -> bool) {
        for entry in ACHIEVEMENTS.iter() {
            if self.unlocked.contains_key(entry.id) || !predicate(entry.rule) {
                continue;
            }
            self.unlocked.insert(entry.id.to_string(), Utc::now());
            self.pending.push(entry);
            self.dirty = true;
            info!("achievement unlocked: {}", entry.name);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_unique() {
        let mut ids: Vec<_> = ACHIEVEMENTS.iter().map(|a| a.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ACHIEVEMENTS.len());
    }

    #[test]
    fn test_threshold_unlocks_once() {
        let mut tracker = ProgressTracker::new();
        for _ in 0..99 {
            tracker.increment(Metric::FlowersCollected, 1.0);
        }
        assert!(tracker.take_unlocked().is_empty());

        tracker.increment(Metric::FlowersCollected, 1.0);
        let unlocked = tracker.take_unlocked();
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].id, "collector");

        tracker.increment(Metric::FlowersCollected, 1.0);
        assert!(tracker.take_unlocked().is_empty());
        assert!(tracker.is_unlocked("collector"));
    }

    #[test]
    fn test_set_keeps_maximum() {
        let mut tracker = ProgressTracker::new();
        tracker.set(Metric::Score, 300.0);
        tracker.set(Metric::Score, 100.0);
        assert_eq!(tracker.value(Metric::Score), 300.0);
    }

    #[test]
    fn test_no_damage_distance_resets() {
        let mut tracker = ProgressTracker::new();
        tracker.increment(Metric::NoDamageDistance, 1500.0);
        tracker.reset(Metric::NoDamageDistance);
        tracker.increment(Metric::NoDamageDistance, 1500.0);
        assert!(!tracker.is_unlocked("untouchable"));
        tracker.increment(Metric::NoDamageDistance, 500.0);
        assert!(tracker.is_unlocked("untouchable"));
    }

    #[test]
    fn test_biome_and_guardian_unlocks() {
        let mut tracker = ProgressTracker::new();
        tracker.biome_entered(Biome::Oasis);
        tracker.biome_entered(Biome::Oasis);
        tracker.guardian_befriended(Species::SandWorm);
        let ids: Vec<_> = tracker.take_unlocked().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["oasisFinder", "wormFriend"]);
    }

    #[test]
    fn test_snapshot_restores_unlocks() {
        let mut tracker = ProgressTracker::new();
        tracker.set(Metric::MaxSize, 3.0);
        assert!(tracker.is_dirty());

        let json = serde_json::to_string(&tracker.snapshot()).expect("serialize");
        let restored: ProgressSnapshot = serde_json::from_str(&json).expect("deserialize");
        let mut tracker = ProgressTracker::from_snapshot(restored);

        assert!(tracker.is_unlocked("grower"));
        assert!(!tracker.is_dirty());
        tracker.set(Metric::MaxSize, 3.0);
        assert!(tracker.take_unlocked().is_empty());
    }

    #[test]
    fn test_unknown_ids_dropped_on_restore() {
        let mut snapshot = ProgressSnapshot::default();
        snapshot.unlocked.insert("rockFriend".to_string(), Utc::now());
        let tracker = ProgressTracker::from_snapshot(snapshot);
        assert_eq!(tracker.unlocked_count(), 0);
    }
}
