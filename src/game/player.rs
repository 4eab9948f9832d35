//! Player State Machine
//!
//! Orthogonal flags rather than one enum: grounded/airborne, planted/mobile,
//! invulnerable/vulnerable. Ability attempts that fail their preconditions
//! are silent no-ops.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::config::{GameConfig, PlayerConfig};
use crate::game::entities::FlowerKind;
use crate::game::input::InputFrame;
use crate::game::physics::{self, Aabb, Body};
use crate::game::powerup::{self, PowerUpEffects, PowerUpKind, MULTI_THORN_SPREAD, SPEED_MULTIPLIER};
use crate::game::projectile::Projectile;

// =============================================================================
// SIZE TABLE
// =============================================================================

/// Dimensions and base speed for one size step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeStats {
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
    /// Base speed before speed scaling
    pub speed: f32,
}

/// Smallest size
pub const MIN_SIZE: u8 = 1;

/// Largest size
pub const MAX_SIZE: u8 = 3;

/// Size -> (width, height, speed). Growth and damage-shrink both go through
/// this table, so they are reversible along the same steps.
pub const SIZE_TABLE: [SizeStats; 3] = [
    SizeStats { width: 40.0, height: 60.0, speed: 5.0 },
    SizeStats { width: 50.0, height: 75.0, speed: 4.0 },
    SizeStats { width: 60.0, height: 90.0, speed: 3.0 },
];

/// Look up a size step (clamped into the table).
#[inline]
pub fn size_stats(size: u8) -> SizeStats {
    let idx = size.clamp(MIN_SIZE, MAX_SIZE) - MIN_SIZE;
    SIZE_TABLE[idx as usize]
}

// =============================================================================
// DAMAGE
// =============================================================================

/// Where a hit came from. Planting blocks everything but area attacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageSource {
    /// Touching an enemy body
    Contact,
    /// Enemy projectile
    Projectile,
    /// Environmental hazard (sand storm)
    Hazard,
    /// Ground smash or burrow eruption
    Area,
}

impl DamageSource {
    /// Whether a planted player still takes this hit.
    #[inline]
    pub fn pierces_plant(self) -> bool {
        matches!(self, DamageSource::Area)
    }
}

// =============================================================================
// FRAME OUTCOMES
// =============================================================================

/// What the player did in response to this frame's input.
#[derive(Debug, Default)]
pub struct PlayerActions {
    /// A jump started
    pub jumped: bool,
    /// Thorns spawned by a throw
    pub thrown: Vec<Projectile>,
    /// Plant toggled to this value
    pub plant: Option<bool>,
}

/// Timer side effects for this frame.
#[derive(Debug, Default)]
pub struct TimerOutcome {
    /// Plant expired and the player uprooted
    pub plant_released: bool,
    /// Power-ups that ran out and were reverted
    pub expired: Vec<PowerUpKind>,
}

// =============================================================================
// PLAYER
// =============================================================================

/// The cactus.
#[derive(Clone, Debug)]
pub struct Player {
    /// Position, size and velocity
    pub body: Body,
    /// Facing direction
    pub facing_right: bool,
    /// Running buffs
    pub power_ups: PowerUpEffects,

    pub(crate) speed: f32,
    pub(crate) jump_power: f32,
    size: u8,
    speed_factor: f32,
    friction: f32,
    health: u8,
    max_health: u8,
    thorns: u8,
    max_thorns: u8,
    planted: bool,
    plant_ms: f32,
    invulnerable_ms: f32,
    last_throw_ms: Option<f64>,
    tuning: PlayerConfig,
}

impl Player {
    /// Spawn a size-1 cactus on the ground at the configured start.
    pub fn new(config: &GameConfig) -> Self {
        let stats = size_stats(MIN_SIZE);
        let tuning = config.player.clone();
        Self {
            body: Body::on_ground(tuning.start_x, config.ground_y(), stats.width, stats.height),
            facing_right: true,
            power_ups: PowerUpEffects::default(),
            speed: stats.speed * config.physics.speed_factor,
            jump_power: tuning.jump_power,
            size: MIN_SIZE,
            speed_factor: config.physics.speed_factor,
            friction: config.physics.friction,
            health: tuning.max_health,
            max_health: tuning.max_health,
            thorns: tuning.start_thorns.min(tuning.max_thorns),
            max_thorns: tuning.max_thorns,
            planted: false,
            plant_ms: 0.0,
            invulnerable_ms: 0.0,
            last_throw_ms: None,
            tuning,
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Size step (1..=3).
    pub fn size(&self) -> u8 {
        self.size
    }

    /// Effective movement speed.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Effective jump power.
    pub fn jump_power(&self) -> f32 {
        self.jump_power
    }

    /// Current health.
    pub fn health(&self) -> u8 {
        self.health
    }

    /// Health cap.
    pub fn max_health(&self) -> u8 {
        self.max_health
    }

    /// Current thorns.
    pub fn thorns(&self) -> u8 {
        self.thorns
    }

    /// Thorn cap.
    pub fn max_thorns(&self) -> u8 {
        self.max_thorns
    }

    /// Rooted in place.
    pub fn is_planted(&self) -> bool {
        self.planted
    }

    /// Time until the plant auto-releases.
    pub fn plant_remaining_ms(&self) -> f32 {
        self.plant_ms
    }

    /// Invulnerable iff the window timer is still running.
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_ms > 0.0
    }

    /// Time left in the invulnerability window.
    pub fn invulnerable_remaining_ms(&self) -> f32 {
        self.invulnerable_ms
    }

    /// Shield buff running.
    pub fn is_shielded(&self) -> bool {
        self.power_ups.has(PowerUpKind::Shield)
    }

    /// Standing on the ground or a brick.
    pub fn is_grounded(&self) -> bool {
        self.body.grounded
    }

    /// Bounds.
    pub fn aabb(&self) -> Aabb {
        self.body.aabb()
    }

    /// Center point.
    pub fn center(&self) -> Vec2 {
        self.body.center()
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    /// Turn this frame's input into velocity and ability attempts.
    ///
    /// `held` is the polled snapshot, `pressed` the keys that went down this
    /// frame (plant toggles on the press edge only).
    pub fn apply_input(&mut self, held: InputFrame, pressed: InputFrame, now_ms: f64) -> PlayerActions {
        let mut actions = PlayerActions::default();

        if pressed.plant() {
            actions.plant = self.toggle_plant();
        }

        let direction = held.direction();
        if self.planted {
            self.body.vel.x = 0.0;
        } else if direction != 0.0 {
            self.body.vel.x = direction * self.speed;
            self.facing_right = direction > 0.0;
        } else {
            physics::apply_friction(&mut self.body, self.friction);
        }

        if held.jump() {
            actions.jumped = self.try_jump();
        }
        if held.thorn() {
            actions.thrown = self.try_throw(now_ms);
        }

        actions
    }

    /// Jump if grounded and mobile.
    pub fn try_jump(&mut self) -> bool {
        if !self.body.grounded || self.planted {
            return false;
        }
        self.body.vel.y = -self.jump_power;
        self.body.grounded = false;
        true
    }

    /// Throw if a thorn is available, mobile, and off cooldown. Multi-thorn
    /// fires a spread for the price of one.
    pub fn try_throw(&mut self, now_ms: f64) -> Vec<Projectile> {
        if self.thorns == 0 || self.planted {
            return Vec::new();
        }
        let cooled = self
            .last_throw_ms
            .map_or(true, |last| now_ms - last >= self.tuning.thorn_cooldown_ms as f64);
        if !cooled {
            return Vec::new();
        }

        self.thorns -= 1;
        self.last_throw_ms = Some(now_ms);

        let direction = if self.facing_right { 1.0 } else { -1.0 };
        let edge_x = if self.facing_right { self.body.right() } else { self.body.pos.x };
        let origin = Vec2::new(edge_x, self.body.center().y);

        if self.power_ups.has(PowerUpKind::MultiThorn) {
            MULTI_THORN_SPREAD
                .iter()
                .map(|vy| Projectile::thorn(origin, direction, *vy, self.speed_factor))
                .collect()
        } else {
            vec![Projectile::thorn(origin, direction, 0.0, self.speed_factor)]
        }
    }

    /// Toggle planting. Rooting requires the ground; uprooting early is
    /// always allowed. Returns the new state, or `None` if nothing changed.
    pub fn toggle_plant(&mut self) -> Option<bool> {
        if self.planted {
            self.planted = false;
            self.plant_ms = 0.0;
            return Some(false);
        }
        if !self.body.grounded {
            return None;
        }
        self.planted = true;
        self.plant_ms = self.tuning.plant_duration_ms;
        self.body.vel = Vec2::ZERO;
        Some(true)
    }

    // -------------------------------------------------------------------------
    // Timers
    // -------------------------------------------------------------------------

    /// Count down invulnerability, plant and buffs.
    pub fn advance_timers(&mut self, dt: f32) -> TimerOutcome {
        let mut outcome = TimerOutcome::default();

        self.invulnerable_ms = (self.invulnerable_ms - dt).max(0.0);

        if self.planted {
            self.plant_ms -= dt;
            if self.plant_ms <= 0.0 {
                self.planted = false;
                self.plant_ms = 0.0;
                outcome.plant_released = true;
            }
        }

        outcome.expired = powerup::update(self, dt);
        outcome
    }

    // -------------------------------------------------------------------------
    // Damage & growth
    // -------------------------------------------------------------------------

    /// Apply one hit. Returns whether it landed.
    ///
    /// Gates, in order: invulnerability window, shield, planted (unless the
    /// source pierces it).
    pub fn take_damage(&mut self, source: DamageSource) -> bool {
        if self.is_invulnerable() || self.is_shielded() {
            return false;
        }
        if self.planted && !source.pierces_plant() {
            return false;
        }

        self.health = self.health.saturating_sub(1);
        self.invulnerable_ms = self.tuning.invulnerability_ms;
        self.shrink();

        if !self.planted {
            let kx = self.tuning.knockback_x * self.speed_factor;
            self.body.vel.x = if self.facing_right { -kx } else { kx };
            self.body.vel.y = -self.tuning.knockback_y * self.speed_factor;
            self.body.grounded = false;
        }
        true
    }

    /// Eat a flower: normal restores a thorn; super grows two steps and
    /// restores two thorns.
    pub fn eat_flower(&mut self, kind: FlowerKind) {
        match kind {
            FlowerKind::Normal => self.restock_thorns(1),
            FlowerKind::Super => {
                self.grow(2);
                self.restock_thorns(2);
            }
        }
    }

    /// Grow up to `steps` sizes (capped). Returns whether the size changed.
    pub fn grow(&mut self, steps: u8) -> bool {
        let target = self.size.saturating_add(steps).min(MAX_SIZE);
        self.set_size(target)
    }

    /// Shrink one step (floored). Returns whether the size changed.
    pub fn shrink(&mut self) -> bool {
        let target = self.size.saturating_sub(1).max(MIN_SIZE);
        self.set_size(target)
    }

    fn set_size(&mut self, size: u8) -> bool {
        if size == self.size {
            return false;
        }
        let stats = size_stats(size);
        let bottom = self.body.bottom();

        self.size = size;
        self.body.width = stats.width;
        self.body.height = stats.height;
        self.body.pos.y = bottom - stats.height;

        // A running speed buff keeps its multiplier over the new base
        let base = stats.speed * self.speed_factor;
        self.speed = match self.power_ups.snapshot_mut(PowerUpKind::Speed) {
            Some(snapshot) => {
                *snapshot = base;
                base * SPEED_MULTIPLIER
            }
            None => base,
        };
        true
    }

    /// Restore health (clamped).
    pub fn heal(&mut self, amount: u8) {
        self.health = self.health.saturating_add(amount).min(self.max_health);
    }

    /// Restore thorns (clamped).
    pub fn restock_thorns(&mut self, amount: u8) {
        self.thorns = self.thorns.saturating_add(amount).min(self.max_thorns);
    }

    /// External shove (wind gust). Planted players hold their ground.
    pub fn push(&mut self, dvx: f32) {
        if !self.planted {
            self.body.vel.x += dvx;
        }
    }

    /// Keep the player at or ahead of the forward boundary.
    pub fn clamp_forward(&mut self, min_x: f32) {
        if self.body.pos.x < min_x {
            self.body.pos.x = min_x;
            if self.body.vel.x < 0.0 {
                self.body.vel.x = 0.0;
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
