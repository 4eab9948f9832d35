//! Environmental Hazards
//!
//! Sand storms blow in from the right after a warning, drift left across the
//! player, and hurt anyone who is neither planted nor sheltered. Shelters
//! shield from storms and slowly patch the player up.

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::game::config::GameConfig;
use crate::game::physics::Aabb;

// =============================================================================
// SAND STORM
// =============================================================================

/// A sand storm band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SandStorm {
    /// Bounds (full height from the sky to the ground)
    pub bounds: Aabb,
    /// Horizontal drift per frame
    pub vx: f32,
    /// Time left in the warning phase
    pub warning_ms: f32,
    /// False once the storm has blown far past the player
    pub active: bool,
    hit_player: bool,
    passed: bool,
}

impl SandStorm {
    /// Warning phase before the storm starts moving
    pub const WARNING_MS: f32 = 3000.0;

    /// Drift speed before speed scaling
    pub const DRIFT: f32 = 2.0;

    /// Spawn a storm one screen (plus a margin) ahead of the player.
    pub fn spawn(player_x: f32, config: &GameConfig, rng: &mut DeterministicRng) -> Self {
        let width = 200.0 + rng.next_f32() * 100.0;
        let x = player_x + config.screen_width() + 100.0;
        Self {
            bounds: Aabb::new(x, 0.0, width, config.ground_y()),
            vx: -Self::DRIFT * config.physics.speed_factor,
            warning_ms: Self::WARNING_MS,
            active: true,
            hit_player: false,
            passed: false,
        }
    }

    /// Still in the warning phase.
    #[inline]
    pub fn is_warning(&self) -> bool {
        self.warning_ms > 0.0
    }

    /// Moving and able to hurt.
    #[inline]
    pub fn is_dangerous(&self) -> bool {
        self.active && !self.is_warning()
    }

    /// Record that the storm landed a hit.
    pub fn mark_hit(&mut self) {
        self.hit_player = true;
    }

    /// Advance one frame. Returns true exactly once: the frame the storm
    /// fully clears the player without having hurt them.
    pub fn update(&mut self, dt: f32, player: &Aabb, screen_width: f32) -> bool {
        if !self.active {
            return false;
        }
        if self.is_warning() {
            self.warning_ms -= dt;
            return false;
        }

        self.bounds.x += self.vx;

        let mut weathered = false;
        if !self.passed && self.bounds.right() < player.x {
            self.passed = true;
            weathered = !self.hit_player;
        }
        if self.bounds.right() < player.x - screen_width {
            self.active = false;
        }
        weathered
    }
}

/// Decides when the next storm blows in. The cadence tightens with
/// difficulty down to a floor, plus random jitter.
#[derive(Clone, Debug, PartialEq)]
pub struct StormScheduler {
    elapsed_ms: f32,
    next_ms: f32,
}

impl StormScheduler {
    /// Scheduler waiting for the first storm.
    pub fn new(config: &GameConfig) -> Self {
        Self {
            elapsed_ms: 0.0,
            next_ms: config.world.first_storm_ms,
        }
    }

    /// Base interval at a difficulty level, before jitter.
    pub fn interval_for(difficulty: u32, config: &GameConfig) -> f32 {
        let world = &config.world;
        let reduction = difficulty.saturating_sub(1) as f32 * world.storm_interval_step_ms;
        (world.storm_interval_ms - reduction).max(world.storm_interval_min_ms)
    }

    /// Time until the next storm.
    pub fn remaining_ms(&self) -> f32 {
        (self.next_ms - self.elapsed_ms).max(0.0)
    }

    /// Advance the timer. Returns true when a storm is due.
    pub fn update(&mut self, dt: f32, difficulty: u32, config: &GameConfig, rng: &mut DeterministicRng) -> bool {
        self.elapsed_ms += dt;
        if self.elapsed_ms < self.next_ms {
            return false;
        }
        self.elapsed_ms = 0.0;
        self.next_ms = Self::interval_for(difficulty, config) + rng.next_f32() * config.world.storm_jitter_ms;
        true
    }
}

// =============================================================================
// SHELTER
// =============================================================================

/// What a shelter did for the player this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShelterTick {
    /// Player stepped in this frame
    pub entered: bool,
    /// Health to restore
    pub heal: u8,
    /// Thorns to restore
    pub thorns: u8,
}

/// A refuge on the ground.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shelter {
    /// Bounds
    pub bounds: Aabb,
    occupied: bool,
    heal_ms: f32,
    restock_ms: f32,
}

impl Shelter {
    /// Shelter width
    pub const WIDTH: f32 = 120.0;
    /// Shelter height
    pub const HEIGHT: f32 = 100.0;
    /// Health regen cadence inside
    pub const HEAL_INTERVAL_MS: f32 = 3000.0;
    /// Thorn regen cadence inside
    pub const RESTOCK_INTERVAL_MS: f32 = 2000.0;

    /// Shelter standing on the ground at `x`.
    pub fn new(x: f32, ground_y: f32) -> Self {
        Self {
            bounds: Aabb::new(x, ground_y - Self::HEIGHT, Self::WIDTH, Self::HEIGHT),
            occupied: false,
            heal_ms: 0.0,
            restock_ms: 0.0,
        }
    }

    /// Player is inside.
    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    /// Player box overlaps the shelter.
    #[inline]
    pub fn covers(&self, player: &Aabb) -> bool {
        self.bounds.overlaps(player)
    }

    /// Advance regen for a player at `player`.
    pub fn update(&mut self, dt: f32, player: &Aabb) -> ShelterTick {
        let mut tick = ShelterTick::default();

        if !self.covers(player) {
            self.occupied = false;
            self.heal_ms = 0.0;
            self.restock_ms = 0.0;
            return tick;
        }

        tick.entered = !self.occupied;
        self.occupied = true;

        self.heal_ms += dt;
        while self.heal_ms >= Self::HEAL_INTERVAL_MS {
            self.heal_ms -= Self::HEAL_INTERVAL_MS;
            tick.heal = tick.heal.saturating_add(1);
        }
        self.restock_ms += dt;
        while self.restock_ms >= Self::RESTOCK_INTERVAL_MS {
            self.restock_ms -= Self::RESTOCK_INTERVAL_MS;
            tick.thorns = tick.thorns.saturating_add(1);
        }
        tick
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn player_at(x: f32) -> Aabb {
        Aabb::new(x, 460.0, 40.0, 60.0)
    }

    #[test]
    fn test_storm_warns_then_drifts() {
        let config = GameConfig::default();
        let mut rng = DeterministicRng::new(1);
        let mut storm = SandStorm::spawn(100.0, &config, &mut rng);
        assert_eq!(storm.bounds.x, 1000.0);
        assert_eq!(storm.bounds.height, 520.0);
        assert!(!storm.is_dangerous());

        let start = storm.bounds.x;
        for _ in 0..187 {
            storm.update(16.0, &player_at(100.0), 800.0);
        }
        assert_eq!(storm.bounds.x, start);
        storm.update(16.0, &player_at(100.0), 800.0);
        assert!(storm.is_dangerous());
        storm.update(16.0, &player_at(100.0), 800.0);
        assert_eq!(storm.bounds.x, start - 2.0);
    }

    #[test]
    fn test_storm_weathered_once_unless_hit() {
        let config = GameConfig::default();
        let mut rng = DeterministicRng::new(1);
        let player = player_at(500.0);

        let mut storm = SandStorm::spawn(0.0, &config, &mut rng);
        storm.warning_ms = 0.0;
        storm.bounds.x = 503.0 - storm.bounds.width;
        assert!(!storm.update(16.0, &player, 800.0));
        assert!(storm.update(16.0, &player, 800.0));
        assert!(!storm.update(16.0, &player, 800.0));

        let mut hit = SandStorm::spawn(0.0, &config, &mut rng);
        hit.warning_ms = 0.0;
        hit.mark_hit();
        hit.bounds.x = 499.0 - hit.bounds.width;
        assert!(!hit.update(16.0, &player, 800.0));
        assert!(!hit.active || hit.bounds.right() < 500.0);
    }

    #[test]
    fn test_storm_retires_far_behind() {
        let config = GameConfig::default();
        let mut rng = DeterministicRng::new(1);
        let mut storm = SandStorm::spawn(0.0, &config, &mut rng);
        storm.warning_ms = 0.0;
        storm.bounds.x = 1000.0 - 800.0 - storm.bounds.width - 1.0;
        storm.update(16.0, &player_at(1000.0), 800.0);
        assert!(!storm.active);
    }

    #[test]
    fn test_storm_interval_tightens_to_floor() {
        let config = GameConfig::default();
        assert_eq!(StormScheduler::interval_for(1, &config), 20000.0);
        assert_eq!(StormScheduler::interval_for(3, &config), 17000.0);
        assert_eq!(StormScheduler::interval_for(50, &config), 8000.0);
    }

    #[test]
    fn test_first_storm_at_fifteen_seconds() {
        let config = GameConfig::default();
        let mut rng = DeterministicRng::new(1);
        let mut scheduler = StormScheduler::new(&config);
        assert!(!scheduler.update(14_999.0, 1, &config, &mut rng));
        assert!(scheduler.update(1.0, 1, &config, &mut rng));
        let next = scheduler.remaining_ms();
        assert!((20000.0..30000.0).contains(&next));
    }

    #[test]
    fn test_shelter_regen_and_entry_edge() {
        let mut shelter = Shelter::new(400.0, 520.0);
        let inside = player_at(420.0);

        let first = shelter.update(16.0, &inside);
        assert!(first.entered);
        assert!(!shelter.update(16.0, &inside).entered);

        let tick = shelter.update(3000.0, &inside);
        assert_eq!(tick.heal, 1);
        assert_eq!(tick.thorns, 1);

        // Leaving resets progress
        shelter.update(16.0, &player_at(2000.0));
        assert!(!shelter.is_occupied());
        assert!(shelter.update(16.0, &inside).entered);
    }
}
