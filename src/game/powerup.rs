//! Power-Up Effect Manager
//!
//! Timed buffs applied to and reverted from the player, plus the pickups
//! that grant them and the scheduler that places pickups ahead of the run.
//!
//! Stat-overriding buffs snapshot the stat they override; revert restores
//! that snapshot exactly instead of dividing the multiplier back out.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::rng::DeterministicRng;
use crate::game::config::GameConfig;
use crate::game::physics::Aabb;
use crate::game::player::Player;

/// Speed buff multiplier
pub const SPEED_MULTIPLIER: f32 = 1.5;

/// Jump boost multiplier
pub const JUMP_MULTIPLIER: f32 = 1.4;

/// Thorn regen cadence while the buff is active
pub const THORN_REGEN_INTERVAL_MS: f32 = 4000.0;

/// Thorns fired per throw while multi-thorn is active
pub const MULTI_THORN_SPREAD: [f32; 3] = [-2.0, 0.0, 2.0];

// =============================================================================
// KINDS
// =============================================================================

/// Power-up variety.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerUpKind {
    /// Movement speed x1.5
    Speed,
    /// Immune to damage
    Shield,
    /// Each throw fires a three-thorn spread
    MultiThorn,
    /// Jump power x1.4
    JumpBoost,
    /// +1 thorn every few seconds
    ThornRegen,
}

impl PowerUpKind {
    /// Every kind, in spawn-table order.
    pub const ALL: [PowerUpKind; 5] = [
        PowerUpKind::Speed,
        PowerUpKind::Shield,
        PowerUpKind::MultiThorn,
        PowerUpKind::JumpBoost,
        PowerUpKind::ThornRegen,
    ];

    /// How long the buff lasts.
    pub fn duration_ms(self) -> f32 {
        match self {
            PowerUpKind::Speed => 8000.0,
            PowerUpKind::Shield => 10000.0,
            PowerUpKind::MultiThorn => 15000.0,
            PowerUpKind::JumpBoost => 12000.0,
            PowerUpKind::ThornRegen => 20000.0,
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            PowerUpKind::Speed => "Speed Boost",
            PowerUpKind::Shield => "Shield",
            PowerUpKind::MultiThorn => "Multi-Thorn",
            PowerUpKind::JumpBoost => "Jump Boost",
            PowerUpKind::ThornRegen => "Thorn Regen",
        }
    }

    /// Notification color (CSS hex).
    pub fn color(self) -> &'static str {
        match self {
            PowerUpKind::Speed => "#00ff00",
            PowerUpKind::Shield => "#0080ff",
            PowerUpKind::MultiThorn => "#ff8000",
            PowerUpKind::JumpBoost => "#ff00ff",
            PowerUpKind::ThornRegen => "#ffff00",
        }
    }
}

// =============================================================================
// ACTIVE EFFECTS
// =============================================================================

/// One running buff.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivePowerUp {
    /// Kind
    pub kind: PowerUpKind,
    /// Time left
    pub remaining_ms: f32,
    /// Pre-buff value of the overridden stat
    snapshot: Option<f32>,
    /// Thorn regen accumulator
    regen_ms: f32,
}

/// The player's running buffs; at most one per kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PowerUpEffects {
    active: Vec<ActivePowerUp>,
}

impl PowerUpEffects {
    /// Is `kind` running?
    pub fn has(&self, kind: PowerUpKind) -> bool {
        self.active.iter().any(|p| p.kind == kind)
    }

    /// Time left on `kind`, if running.
    pub fn remaining_ms(&self, kind: PowerUpKind) -> Option<f32> {
        self.active.iter().find(|p| p.kind == kind).map(|p| p.remaining_ms)
    }

    /// Running buffs in application order.
    pub fn iter(&self) -> impl Iterator<Item = &ActivePowerUp> {
        self.active.iter()
    }

    /// Number of running buffs.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// No buffs running.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Mutable access to a running buff's stored snapshot.
    pub(crate) fn snapshot_mut(&mut self, kind: PowerUpKind) -> Option<&mut f32> {
        self.active
            .iter_mut()
            .find(|p| p.kind == kind)
            .and_then(|p| p.snapshot.as_mut())
    }

    fn take(&mut self, kind: PowerUpKind) -> Option<ActivePowerUp> {
        let idx = self.active.iter().position(|p| p.kind == kind)?;
        Some(self.active.remove(idx))
    }
}

/// Apply `kind` to the player. An already-running instance of the same kind
/// is reverted first, so buffs replace rather than stack.
pub fn apply(player: &mut Player, kind: PowerUpKind) {
    if revert(player, kind) {
        debug!("refreshing {:?}", kind);
    }

    let snapshot = match kind {
        PowerUpKind::Speed => {
            let base = player.speed;
            player.speed = base * SPEED_MULTIPLIER;
            Some(base)
        }
        PowerUpKind::JumpBoost => {
            let base = player.jump_power;
            player.jump_power = base * JUMP_MULTIPLIER;
            Some(base)
        }
        PowerUpKind::Shield | PowerUpKind::MultiThorn | PowerUpKind::ThornRegen => None,
    };

    player.power_ups.active.push(ActivePowerUp {
        kind,
        remaining_ms: kind.duration_ms(),
        snapshot,
        regen_ms: 0.0,
    });
}

/// Revert `kind` if it is running. Returns whether anything was reverted.
pub fn revert(player: &mut Player, kind: PowerUpKind) -> bool {
    let Some(entry) = player.power_ups.take(kind) else {
        return false;
    };

    match (kind, entry.snapshot) {
        (PowerUpKind::Speed, Some(base)) => player.speed = base,
        (PowerUpKind::JumpBoost, Some(base)) => player.jump_power = base,
        _ => {}
    }
    true
}

/// Revert every running buff.
pub fn clear(player: &mut Player) {
    for kind in PowerUpKind::ALL {
        revert(player, kind);
    }
}

/// Count down running buffs and tick thorn regen. Returns the kinds that
/// expired this frame; each is reverted exactly once.
pub fn update(player: &mut Player, dt: f32) -> Vec<PowerUpKind> {
    let mut expired = Vec::new();
    let mut regen = 0u8;

    for entry in player.power_ups.active.iter_mut() {
        entry.remaining_ms -= dt;

        if entry.kind == PowerUpKind::ThornRegen {
            entry.regen_ms += dt;
            while entry.regen_ms >= THORN_REGEN_INTERVAL_MS {
                entry.regen_ms -= THORN_REGEN_INTERVAL_MS;
                regen = regen.saturating_add(1);
            }
        }

        if entry.remaining_ms <= 0.0 {
            expired.push(entry.kind);
        }
    }

    if regen > 0 {
        player.restock_thorns(regen);
    }
    for kind in &expired {
        revert(player, *kind);
    }
    expired
}

// =============================================================================
// PICKUPS
// =============================================================================

/// A power-up lying in the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PowerUpPickup {
    /// Kind granted on pickup
    pub kind: PowerUpKind,
    /// Bounds
    pub bounds: Aabb,
    /// Write-once collected flag
    pub collected: bool,
}

impl PowerUpPickup {
    /// Pickup sprite size
    pub const SIZE: f32 = 24.0;

    /// Create a pickup with its top-left at `(x, y)`.
    pub fn new(x: f32, y: f32, kind: PowerUpKind) -> Self {
        Self {
            kind,
            bounds: Aabb::new(x, y, Self::SIZE, Self::SIZE),
            collected: false,
        }
    }

    /// Mark collected. Returns false if it already was.
    pub fn collect(&mut self) -> bool {
        !std::mem::replace(&mut self.collected, true)
    }
}

/// Places a pickup ahead of the player on a fixed cadence, independent of
/// what the player does.
#[derive(Clone, Debug)]
pub struct PowerUpSpawner {
    elapsed_ms: f32,
    interval_ms: f32,
}

impl PowerUpSpawner {
    /// Create a spawner with the given cadence.
    pub fn new(interval_ms: f32) -> Self {
        Self { elapsed_ms: 0.0, interval_ms }
    }

    /// Advance the timer; returns a pickup when one is due.
    pub fn update(
        &mut self,
        dt: f32,
        player_x: f32,
        pool: &[PowerUpKind],
        config: &GameConfig,
        rng: &mut DeterministicRng,
    ) -> Option<PowerUpPickup> {
        self.elapsed_ms += dt;
        if self.elapsed_ms < self.interval_ms {
            return None;
        }
        self.elapsed_ms = 0.0;

        let screen = config.screen_width();
        let x = player_x + screen * 0.5 + rng.next_f32() * screen;
        let y = config.viewport.height - 150.0 - rng.next_f32() * 100.0;
        let kind = rng.choose(pool).copied().unwrap_or(PowerUpKind::Speed);
        Some(PowerUpPickup::new(x, y, kind))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(&GameConfig::default())
    }

    #[test]
    fn test_speed_reapply_does_not_stack() {
        let mut p = player();
        let base = p.speed();

        apply(&mut p, PowerUpKind::Speed);
        update(&mut p, 3000.0);
        apply(&mut p, PowerUpKind::Speed);

        assert_eq!(p.speed(), base * SPEED_MULTIPLIER);
        assert_eq!(p.power_ups.len(), 1);
        assert_eq!(p.power_ups.remaining_ms(PowerUpKind::Speed), Some(8000.0));
    }

    #[test]
    fn test_expiry_restores_snapshot_once() {
        let mut p = player();
        let base_speed = p.speed();
        let base_jump = p.jump_power();

        apply(&mut p, PowerUpKind::Speed);
        apply(&mut p, PowerUpKind::JumpBoost);
        assert!((p.jump_power() - base_jump * JUMP_MULTIPLIER).abs() < 1e-5);

        let expired = update(&mut p, 8000.0);
        assert_eq!(expired, vec![PowerUpKind::Speed]);
        assert_eq!(p.speed(), base_speed);

        // Already reverted; a second pass must not touch it
        assert!(update(&mut p, 1.0).is_empty());
        assert_eq!(p.speed(), base_speed);

        let expired = update(&mut p, 4000.0);
        assert_eq!(expired, vec![PowerUpKind::JumpBoost]);
        assert_eq!(p.jump_power(), base_jump);
        assert!(p.power_ups.is_empty());
    }

    #[test]
    fn test_thorn_regen_ticks() {
        let mut p = player();
        let start = p.thorns();
        apply(&mut p, PowerUpKind::ThornRegen);

        update(&mut p, 3999.0);
        assert_eq!(p.thorns(), start);
        update(&mut p, 1.0);
        assert_eq!(p.thorns(), start + 1);
        update(&mut p, 8000.0);
        assert_eq!(p.thorns(), start + 3);
    }

    #[test]
    fn test_flag_buffs() {
        let mut p = player();
        apply(&mut p, PowerUpKind::Shield);
        apply(&mut p, PowerUpKind::MultiThorn);
        assert!(p.is_shielded());
        assert!(p.power_ups.has(PowerUpKind::MultiThorn));

        clear(&mut p);
        assert!(!p.is_shielded());
        assert!(p.power_ups.is_empty());
    }

    #[test]
    fn test_pickup_collect_once() {
        let mut pickup = PowerUpPickup::new(0.0, 0.0, PowerUpKind::Shield);
        assert!(pickup.collect());
        assert!(!pickup.collect());
    }

    #[test]
    fn test_spawner_cadence_and_placement() {
        let config = GameConfig::default();
        let mut rng = DeterministicRng::new(42);
        let mut spawner = PowerUpSpawner::new(15000.0);

        assert!(spawner.update(14999.0, 1000.0, &PowerUpKind::ALL, &config, &mut rng).is_none());
        let pickup = spawner
            .update(1.0, 1000.0, &[PowerUpKind::JumpBoost], &config, &mut rng)
            .expect("due");
        assert_eq!(pickup.kind, PowerUpKind::JumpBoost);
        assert!(pickup.bounds.x >= 1400.0 && pickup.bounds.x < 2200.0);
        assert!(pickup.bounds.y > 350.0 && pickup.bounds.y <= 450.0);
        assert!(spawner.update(1.0, 1000.0, &PowerUpKind::ALL, &config, &mut rng).is_none());
    }
}
