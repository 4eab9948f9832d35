//! Render Snapshot
//!
//! Flattens the visible part of a `GameState` into plain data a renderer can
//! draw without touching the simulation.

use serde::Serialize;

use crate::game::biome::Biome;
use crate::game::enemy::{Behavior, Species};
use crate::game::entities::{FlowerKind, ParticleKind};
use crate::game::physics::Aabb;
use crate::game::powerup::PowerUpKind;
use crate::game::projectile::ProjectileKind;
use crate::game::state::{GamePhase, GameState};

/// Extra distance beyond the viewport edges still emitted.
pub const CULL_MARGIN: f32 = 100.0;

/// What to draw.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum SpriteKind {
    /// The cactus
    Player,
    /// A flower
    Flower(FlowerKind),
    /// A brick
    Brick,
    /// A creature or guardian
    Enemy(Species),
    /// A thrown thorn
    Thorn,
    /// A hostile shot
    Shot(ProjectileKind),
    /// A power-up pickup
    PowerUp(PowerUpKind),
    /// A sand storm band
    Storm,
    /// A shelter
    Shelter,
    /// A cosmetic particle
    Particle(ParticleKind),
}

/// One drawable.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sprite {
    /// What
    pub kind: SpriteKind,
    /// Where, in world space
    pub bounds: Aabb,
    /// Opacity
    pub alpha: f32,
    /// Facing right (for mirrored sprites)
    pub facing_right: bool,
    /// State label for sprite selection ("warning", "burrowed", "planted", ...)
    pub tag: &'static str,
}

impl Sprite {
    fn new(kind: SpriteKind, bounds: Aabb) -> Self {
        Self { kind, bounds, alpha: 1.0, facing_right: true, tag: "" }
    }

    fn tagged(mut self, tag: &'static str) -> Self {
        self.tag = tag;
        self
    }
}

/// Health bar for an active guardian.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BossBar {
    /// Guardian species
    pub species: Species,
    /// Current health
    pub health: i32,
    /// Full health
    pub max_health: i32,
    /// Current phase
    pub phase: u8,
}

/// Heads-up display values.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Hud {
    /// Phase (menu, paused, game over overlays)
    pub phase: GamePhase,
    /// Health
    pub health: u8,
    /// Health capacity
    pub max_health: u8,
    /// Thorns
    pub thorns: u8,
    /// Thorn capacity
    pub max_thorns: u8,
    /// Size step
    pub size: u8,
    /// Score
    pub score: u32,
    /// Flowers eaten
    pub flower_count: u32,
    /// Flowers needed
    pub target_flowers: u32,
    /// Current biome
    pub biome: Biome,
    /// Difficulty level
    pub difficulty: u32,
    /// Active buffs with time left
    pub power_ups: Vec<(PowerUpKind, f32)>,
    /// A storm is in its warning phase
    pub storm_warning: bool,
    /// Guardian health bar
    pub boss: Option<BossBar>,
}

/// Everything a frame needs to draw.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderSnapshot {
    /// Frame number
    pub frame: u64,
    /// Camera left edge
    pub camera_x: f32,
    /// World width (for parallax and minimaps)
    pub world_width: f32,
    /// Drawables, back to front
    pub sprites: Vec<Sprite>,
    /// HUD
    pub hud: Hud,
}

/// Build the snapshot for the current state.
pub fn snapshot(state: &GameState) -> RenderSnapshot {
    let left = state.camera.x - CULL_MARGIN;
    let right = state.camera.x + state.config.viewport.width + CULL_MARGIN;
    let visible = |b: &Aabb| b.right() >= left && b.x <= right;

    let world = &state.world;
    let mut sprites = Vec::new();

    for shelter in world.shelters.iter().filter(|s| visible(&s.bounds)) {
        let tag = if shelter.is_occupied() { "occupied" } else { "" };
        sprites.push(Sprite::new(SpriteKind::Shelter, shelter.bounds).tagged(tag));
    }
    for brick in world.bricks.iter().filter(|b| visible(&b.bounds)) {
        let tag = if brick.released { "used" } else { "" };
        sprites.push(Sprite::new(SpriteKind::Brick, brick.bounds).tagged(tag));
    }
    for flower in world.flowers.iter().filter(|f| !f.collected && visible(&f.bounds)) {
        sprites.push(Sprite::new(SpriteKind::Flower(flower.kind), flower.bounds));
    }
    for pickup in world.power_ups.iter().filter(|p| !p.collected && visible(&p.bounds)) {
        sprites.push(Sprite::new(SpriteKind::PowerUp(pickup.kind), pickup.bounds));
    }

    for enemy in world.enemies.iter().filter(|e| e.active && visible(&e.aabb())) {
        let mut sprite = Sprite::new(SpriteKind::Enemy(enemy.species()), enemy.aabb()).tagged(enemy.behavior.label());
        sprite.facing_right = enemy.actor.facing_right;
        if let Behavior::BossSandWorm(ai) = &enemy.behavior {
            if ai.is_burrowed() {
                sprite.alpha = 0.3;
            }
        }
        sprites.push(sprite);
    }

    let player = &state.player;
    let mut cactus = Sprite::new(SpriteKind::Player, player.aabb());
    cactus.facing_right = player.facing_right;
    if player.is_invulnerable() {
        cactus.alpha = 0.5;
    }
    cactus.tag = if player.is_planted() {
        "planted"
    } else if player.is_shielded() {
        "shielded"
    } else {
        ""
    };
    sprites.push(cactus);

    for thorn in world.thorns.iter().filter(|t| t.active) {
        let mut sprite = Sprite::new(SpriteKind::Thorn, thorn.aabb());
        sprite.facing_right = thorn.body.vel.x >= 0.0;
        sprites.push(sprite);
    }
    for shot in world.enemy_projectiles.iter().filter(|p| p.active) {
        sprites.push(Sprite::new(SpriteKind::Shot(shot.kind), shot.aabb()));
    }

    for storm in world.storms.iter().filter(|s| s.active && visible(&s.bounds)) {
        let mut sprite = Sprite::new(SpriteKind::Storm, storm.bounds);
        if storm.is_warning() {
            sprite.alpha = 0.3;
            sprite.tag = "warning";
        }
        sprites.push(sprite);
    }

    for particle in world.particles.iter().filter(|p| p.active) {
        let mut sprite = Sprite::new(SpriteKind::Particle(particle.kind), Aabb::new(particle.pos.x, particle.pos.y, 4.0, 4.0));
        sprite.alpha = particle.alpha();
        sprites.push(sprite);
    }

    let boss = world
        .enemies
        .iter()
        .filter(|e| e.active)
        .find_map(|e| {
            e.boss_phase().map(|phase| BossBar {
                species: e.species(),
                health: e.actor.health,
                max_health: e.actor.max_health,
                phase,
            })
        });

    let hud = Hud {
        phase: state.phase,
        health: player.health(),
        max_health: player.max_health(),
        thorns: player.thorns(),
        max_thorns: player.max_thorns(),
        size: player.size(),
        score: state.score,
        flower_count: state.flower_count,
        target_flowers: state.config.goal.target_flowers,
        biome: world.biome.current(),
        difficulty: world.difficulty(),
        power_ups: player.power_ups.iter().map(|p| (p.kind, p.remaining_ms)).collect(),
        storm_warning: world.storms.iter().any(|s| s.active && s.is_warning()),
        boss,
    };

    RenderSnapshot {
        frame: state.frame,
        camera_x: state.camera.x,
        world_width: world.width(),
        sprites,
        hud,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::GameConfig;
    use crate::game::enemy::Enemy;
    use crate::game::entities::Flower;

    #[test]
    fn test_snapshot_culls_offscreen() {
        let mut state = GameState::new(GameConfig::default());
        state.world.flowers.clear();
        state.world.flowers.push(Flower::new(300.0, 400.0, FlowerKind::Normal));
        state.world.flowers.push(Flower::new(5000.0, 400.0, FlowerKind::Normal));

        let snap = snapshot(&state);
        let flowers = snap.sprites.iter().filter(|s| matches!(s.kind, SpriteKind::Flower(_))).count();
        assert_eq!(flowers, 1);
        assert_eq!(snap.sprites.iter().filter(|s| s.kind == SpriteKind::Player).count(), 1);
    }

    #[test]
    fn test_hud_reports_player_and_boss() {
        let mut state = GameState::new(GameConfig::default());
        state.world.enemies.push(Enemy::spawn(Species::GiantVulture, 500.0, 520.0, 1.0));

        let hud = snapshot(&state).hud;
        assert_eq!(hud.health, 3);
        assert_eq!(hud.thorns, 5);
        assert_eq!(hud.target_flowers, 100);
        assert_eq!(hud.biome, Biome::Desert);
        let bar = hud.boss.expect("boss bar");
        assert_eq!(bar.species, Species::GiantVulture);
        assert_eq!(bar.phase, 1);
        assert_eq!(bar.max_health, 12);
    }

    #[test]
    fn test_snapshot_serializes() {
        let state = GameState::new(GameConfig::default());
        let json = serde_json::to_string(&snapshot(&state)).expect("serialize");
        assert!(json.contains("\"hud\""));
    }
}
