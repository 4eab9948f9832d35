//! Collision Resolution
//!
//! Axis-aligned box tests between the player, the world's entities and
//! projectiles. Resolution runs in a fixed order each frame:
//!
//! 1. Solid bricks (landing, head-bumps, side pushes)
//! 2. Collectibles vs player (flowers, power-ups)
//! 3. Player vs enemies, hostile projectiles, AI strikes and storms
//! 4. Thorns vs enemies
//! 5. Shelters
//!
//! Every consumable has a single-use flag flipped before its reward is
//! applied, so running a step twice never double-counts.

use crate::game::boss;
use crate::game::enemy::{AiEffects, HitOutcome};
use crate::game::entities::{Burst, FlowerKind, ParticleKind};
use crate::game::events::GameEventData;
use crate::game::physics::Aabb;
use crate::game::player::DamageSource;
use crate::game::powerup;
use crate::game::progress::Metric;
use crate::game::state::GameState;

/// Score for befriending a regular creature.
pub const BEFRIEND_SCORE: u32 = 10;

/// Score for winning over a guardian.
pub const BOSS_SCORE: u32 = 500;

/// Tolerance for deciding a landing or a head-bump from the previous frame's
/// position.
const CONTACT_SLOP: f32 = 1.0;

/// Run every collision step in order. `strikes` are direct hits requested by
/// enemy AI this frame.
pub fn resolve(state: &mut GameState, strikes: &[DamageSource], dt: f32) {
    resolve_bricks(state);
    collect_overlapping(state);
    resolve_player_hits(state, strikes);
    resolve_thorns(state);
    resolve_shelters(state, dt);
}

// =============================================================================
// BRICKS
// =============================================================================

/// Treat bricks as solid blocks. Bumping one from below may release its flower.
pub fn resolve_bricks(state: &mut GameState) {
    for i in 0..state.world.bricks.len() {
        let brick = state.world.bricks[i].bounds;
        let body = &mut state.player.body;
        if !body.aabb().overlaps(&brick) {
            continue;
        }

        let prev_y = body.pos.y - body.vel.y;
        let prev_bottom = prev_y + body.height;

        if body.vel.y >= 0.0 && prev_bottom <= brick.y + CONTACT_SLOP {
            body.pos.y = brick.y - body.height;
            body.vel.y = 0.0;
            body.grounded = true;
        } else if body.vel.y < 0.0 && prev_y >= brick.bottom() - CONTACT_SLOP {
            body.pos.y = brick.bottom();
            body.vel.y = 0.0;
            bump_brick(state, i);
        } else {
            if body.center().x < brick.center().x {
                body.pos.x = brick.x - body.width;
            } else {
                body.pos.x = brick.right();
            }
            body.vel.x = 0.0;
        }
    }
}

fn bump_brick(state: &mut GameState, index: usize) {
    let released = state.world.bricks[index].bump();
    state.progress.increment(Metric::BricksHit, 1.0);
    let at = state.world.bricks[index].bounds.center();
    state.world.spawn_burst(&Burst::new(at, ParticleKind::Dust, 4), &mut state.rng);

    let released_flower = released.is_some();
    if let Some(flower) = released {
        state.world.flowers.push(flower);
    }
    state.push_event(GameEventData::BrickHit { released_flower });
}

// =============================================================================
// COLLECTIBLES
// =============================================================================

fn collect_overlapping(state: &mut GameState) {
    let player = state.player.aabb();

    for i in 0..state.world.flowers.len() {
        let flower = &state.world.flowers[i];
        if !flower.collected && flower.bounds.overlaps(&player) {
            collect_flower(state, i);
        }
    }

    for i in 0..state.world.power_ups.len() {
        let pickup = &state.world.power_ups[i];
        if !pickup.collected && pickup.bounds.overlaps(&player) {
            collect_power_up(state, i);
        }
    }
}

/// Eat the flower at `index`. Returns false (and changes nothing) if it was
/// already eaten.
pub fn collect_flower(state: &mut GameState, index: usize) -> bool {
    let Some(flower) = state.world.flowers.get_mut(index) else {
        return false;
    };
    if !flower.collect() {
        return false;
    }
    let kind = flower.kind;
    let at = flower.bounds.center();

    state.player.eat_flower(kind);
    state.score += kind.points();
    state.flower_count += 1;

    state.progress.increment(Metric::FlowersCollected, 1.0);
    if kind == FlowerKind::Super {
        state.progress.increment(Metric::SuperFlowersCollected, 1.0);
    }

    state.world.spawn_burst(&Burst::new(at, ParticleKind::Petal, 5), &mut state.rng);
    state.push_event(GameEventData::FlowerCollected {
        kind,
        flower_count: state.flower_count,
        score: state.score,
    });
    true
}

/// Pick up the power-up at `index`. Returns false if it was already taken.
pub fn collect_power_up(state: &mut GameState, index: usize) -> bool {
    let Some(pickup) = state.world.power_ups.get_mut(index) else {
        return false;
    };
    if !pickup.collect() {
        return false;
    }
    let kind = pickup.kind;
    let at = pickup.bounds.center();

    powerup::apply(&mut state.player, kind);
    state.progress.increment(Metric::PowerupsCollected, 1.0);
    state.world.spawn_burst(&Burst::new(at, ParticleKind::Gold, 8), &mut state.rng);
    state.push_event(GameEventData::PowerUpCollected { kind });
    true
}

// =============================================================================
// PLAYER DAMAGE
// =============================================================================

/// Apply one hit to the player and report it. Returns whether it landed.
pub fn damage_player(state: &mut GameState, source: DamageSource) -> bool {
    if !state.player.take_damage(source) {
        return false;
    }
    state.progress.reset(Metric::NoDamageDistance);
    let at = state.player.center();
    state.world.spawn_burst(&Burst::new(at, ParticleKind::Hurt, 8), &mut state.rng);
    state.push_event(GameEventData::PlayerDamaged {
        source,
        health: state.player.health(),
    });
    true
}

fn resolve_player_hits(state: &mut GameState, strikes: &[DamageSource]) {
    let player = state.player.aabb();

    for &source in strikes {
        damage_player(state, source);
    }

    let touching = state
        .world
        .enemies
        .iter()
        .any(|e| e.is_collidable() && e.aabb().overlaps(&player));
    if touching {
        damage_player(state, DamageSource::Contact);
    }

    // Hostile shots are spent on contact whether or not the hit lands
    let mut struck = false;
    for shot in state.world.enemy_projectiles.iter_mut() {
        if shot.active && shot.aabb().overlaps(&player) {
            shot.consume();
            struck = true;
        }
    }
    if struck {
        damage_player(state, DamageSource::Projectile);
    }

    if is_sheltered(state, &player) {
        return;
    }
    for i in 0..state.world.storms.len() {
        let storm = &state.world.storms[i];
        if storm.is_dangerous() && storm.bounds.overlaps(&player) && damage_player(state, DamageSource::Hazard) {
            state.world.storms[i].mark_hit();
        }
    }
}

/// Player box is inside any shelter.
pub fn is_sheltered(state: &GameState, player: &Aabb) -> bool {
    state.world.shelters.iter().any(|s| s.covers(player))
}

// =============================================================================
// THORNS
// =============================================================================

fn resolve_thorns(state: &mut GameState) {
    let mut fx = AiEffects::default();

    for t in 0..state.world.thorns.len() {
        let thorn = state.world.thorns[t].aabb();
        if !state.world.thorns[t].active {
            continue;
        }

        let target = state
            .world
            .enemies
            .iter()
            .position(|e| e.is_collidable() && e.aabb().overlaps(&thorn));
        let Some(e) = target else {
            continue;
        };

        state.world.thorns[t].consume();
        let enemy = &mut state.world.enemies[e];
        let species = enemy.species();
        let bounds = enemy.aabb();
        let outcome = enemy.take_damage(&mut fx);
        let health = enemy.actor.health;

        match outcome {
            HitOutcome::Ignored => {}
            HitOutcome::Hit => {
                state.push_event(GameEventData::EnemyHit { species, health });
            }
            HitOutcome::Befriended => {
                state.score += BEFRIEND_SCORE;
                state.progress.increment(Metric::CreaturesBefriended, 1.0);
                state.push_event(GameEventData::EnemyBefriended { species });
            }
            HitOutcome::Defeated => {
                state.score += BOSS_SCORE;
                state.progress.increment(Metric::CreaturesBefriended, 1.0);
                state.progress.guardian_befriended(species);
                let (power_ups, flowers) = boss::defeat_rewards(&bounds, &mut state.rng);
                state.world.power_ups.extend(power_ups);
                state.world.flowers.extend(flowers);
                state.push_event(GameEventData::BossDefeated { species });
            }
        }
    }

    for burst in &fx.bursts {
        state.world.spawn_burst(burst, &mut state.rng);
    }
}

// =============================================================================
// SHELTERS
// =============================================================================

fn resolve_shelters(state: &mut GameState, dt: f32) {
    let player = state.player.aabb();
    let mut entered = false;

    for shelter in state.world.shelters.iter_mut() {
        let tick = shelter.update(dt, &player);
        entered |= tick.entered;
        if tick.heal > 0 {
            state.player.heal(tick.heal);
        }
        if tick.thorns > 0 {
            state.player.restock_thorns(tick.thorns);
        }
    }

    if entered {
        state.push_event(GameEventData::ShelterEntered);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;
    use crate::game::config::GameConfig;
    use crate::game::enemy::{Enemy, Species};
    use crate::game::entities::{Brick, Flower};
    use crate::game::hazard::{SandStorm, Shelter};
    use crate::game::powerup::{PowerUpKind, PowerUpPickup};
    use crate::game::projectile::{Projectile, ProjectileKind};
    use crate::game::state::GamePhase;

    /// Playing state with an empty world around the player.
    fn empty_state() -> GameState {
        let mut state = GameState::new(GameConfig::default());
        state.start();
        state.take_events();
        let w = &mut state.world;
        w.flowers.clear();
        w.bricks.clear();
        w.enemies.clear();
        w.power_ups.clear();
        w.shelters.clear();
        w.storms.clear();
        state
    }

    fn count(state: &mut GameState, pred: impl Fn(&GameEventData) -> bool) -> usize {
        state.take_events().iter().filter(|e| pred(&e.data)).count()
    }

    #[test]
    fn test_flower_collection_is_idempotent() {
        let mut state = empty_state();
        state.world.flowers.push(Flower::new(3000.0, 300.0, FlowerKind::Normal));

        assert!(collect_flower(&mut state, 0));
        assert!(!collect_flower(&mut state, 0));
        assert_eq!(state.flower_count, 1);
        assert_eq!(state.score, 10);
        assert_eq!(state.progress.value(Metric::FlowersCollected), 1.0);
        assert_eq!(count(&mut state, |d| matches!(d, GameEventData::FlowerCollected { .. })), 1);
    }

    #[test]
    fn test_super_flower_grows_and_scores_double() {
        let mut state = empty_state();
        let center = state.player.center();
        state.world.flowers.push(Flower::new(center.x - 10.0, center.y - 10.0, FlowerKind::Super));

        resolve(&mut state, &[], 16.0);
        assert_eq!(state.score, 20);
        assert_eq!(state.player.size(), 3);
        assert_eq!(state.player.thorns(), 7);
        assert_eq!(state.progress.value(Metric::SuperFlowersCollected), 1.0);
    }

    #[test]
    fn test_power_up_pickup_applies_once() {
        let mut state = empty_state();
        let center = state.player.center();
        state.world.power_ups.push(PowerUpPickup::new(center.x, center.y, PowerUpKind::Shield));

        resolve(&mut state, &[], 16.0);
        resolve(&mut state, &[], 16.0);
        assert!(state.player.is_shielded());
        assert_eq!(state.progress.value(Metric::PowerupsCollected), 1.0);
    }

    #[test]
    fn test_contact_damage_respects_invulnerability() {
        let mut state = empty_state();
        let x = state.player.body.pos.x;
        state.world.enemies.push(Enemy::spawn(Species::Camel, x, 520.0, 1.0));

        resolve(&mut state, &[], 16.0);
        resolve(&mut state, &[], 16.0);
        assert_eq!(state.player.health(), 2);
        assert_eq!(count(&mut state, |d| matches!(d, GameEventData::PlayerDamaged { .. })), 1);
    }

    #[test]
    fn test_hostile_projectile_consumed_even_when_blocked() {
        let mut state = empty_state();
        state.player.body.grounded = true;
        state.player.toggle_plant();
        let center = state.player.center();
        state.world.enemy_projectiles.push(Projectile::new(ProjectileKind::Poison, center, Vec2::ZERO));

        resolve(&mut state, &[], 16.0);
        assert!(!state.world.enemy_projectiles[0].active);
        assert_eq!(state.player.health(), 3);
    }

    #[test]
    fn test_area_strike_pierces_plant() {
        let mut state = empty_state();
        state.player.body.grounded = true;
        state.player.toggle_plant();

        resolve(&mut state, &[DamageSource::Area], 16.0);
        assert_eq!(state.player.health(), 2);
    }

    #[test]
    fn test_shelter_blocks_storm() {
        let mut state = empty_state();
        let x = state.player.body.pos.x;
        state.world.shelters.push(Shelter::new(x - 20.0, 520.0));

        let mut rng = crate::core::rng::DeterministicRng::new(3);
        let mut storm = SandStorm::spawn(0.0, &state.config, &mut rng);
        storm.warning_ms = 0.0;
        storm.bounds.x = x - 50.0;
        state.world.storms.push(storm);

        resolve(&mut state, &[], 16.0);
        assert_eq!(state.player.health(), 3);

        state.world.shelters.clear();
        resolve(&mut state, &[], 16.0);
        assert_eq!(state.player.health(), 2);
    }

    #[test]
    fn test_thorns_befriend_scorpion() {
        let mut state = empty_state();
        state.world.enemies.push(Enemy::spawn(Species::Scorpion, 2000.0, 520.0, 1.0));
        let target = state.world.enemies[0].aabb().center();
        state.world.thorns.push(Projectile::thorn(target, 1.0, 0.0, 1.0));

        resolve(&mut state, &[], 16.0);
        assert!(!state.world.enemies[0].active);
        assert!(!state.world.thorns[0].active);
        assert_eq!(state.score, BEFRIEND_SCORE);
        assert_eq!(state.progress.value(Metric::CreaturesBefriended), 1.0);
    }

    #[test]
    fn test_guardian_defeat_drops_rewards_once() {
        let mut state = empty_state();
        state.world.enemies.push(Enemy::spawn(Species::SandWorm, 2000.0, 520.0, 1.0));
        state.world.enemies[0].actor.health = 1;
        let target = state.world.enemies[0].aabb().center();
        state.world.thorns.push(Projectile::thorn(target, 1.0, 0.0, 1.0));
        state.world.thorns.push(Projectile::thorn(target, 1.0, 0.0, 1.0));

        resolve(&mut state, &[], 16.0);
        assert_eq!(state.score, BOSS_SCORE);
        assert_eq!(state.world.power_ups.len(), 3);
        assert_eq!(state.world.flowers.len(), 5);
        assert!(state.progress.is_unlocked("wormFriend"));
        // Second thorn flies on
        assert!(state.world.thorns[1].active);
        assert_eq!(count(&mut state, |d| matches!(d, GameEventData::BossDefeated { .. })), 1);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_landing_on_brick_and_bumping_from_below() {
        let mut state = empty_state();
        state.world.bricks.push(Brick::new(400.0, 350.0, true));

        // Falling onto the top
        state.player.body.pos = Vec2::new(400.0, 350.0 - 60.0 + 2.0);
        state.player.body.vel = Vec2::new(0.0, 3.0);
        resolve_bricks(&mut state);
        assert_eq!(state.player.body.pos.y, 290.0);
        assert!(state.player.body.grounded);

        // Jumping into the underside
        state.player.body.pos = Vec2::new(400.0, 380.0);
        state.player.body.vel = Vec2::new(0.0, -5.0);
        resolve_bricks(&mut state);
        assert_eq!(state.player.body.pos.y, 382.0);
        assert_eq!(state.world.flowers.len(), 1);
        assert_eq!(state.progress.value(Metric::BricksHit), 1.0);
    }
}
