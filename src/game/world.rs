//! World Container
//!
//! Owns every entity collection plus the lifecycle around them: procedural
//! chunk population, growth to the right as the player advances, difficulty
//! derived from furthest progress, the one-way forward boundary, and cleanup
//! of whatever falls far behind.

use tracing::{debug, info, warn};

use crate::core::rng::DeterministicRng;
use crate::game::biome::{biome_at, BiomeTracker};
use crate::game::config::GameConfig;
use crate::game::enemy::{Enemy, Species};
use crate::game::entities::{Brick, Burst, Flower, FlowerKind, Particle};
use crate::game::hazard::{SandStorm, Shelter, StormScheduler};
use crate::game::powerup::{PowerUpPickup, PowerUpSpawner};
use crate::game::projectile::Projectile;

/// Particles kept alive at once; the oldest go first.
pub const MAX_PARTICLES: usize = 400;

/// Chance a generated flower is a super flower.
const SUPER_FLOWER_CHANCE: f32 = 0.1;
/// Chance a chunk gets a brick row.
const BRICK_ROW_CHANCE: f32 = 0.6;
/// Chance a generated brick hides a flower.
const BRICK_REWARD_CHANCE: f32 = 0.3;
/// Chance a chunk gets a power-up pickup.
const CHUNK_POWER_UP_CHANCE: f32 = 0.25;
/// Chance a chunk gets a shelter.
const SHELTER_CHANCE: f32 = 0.3;
/// Upper bound on regular enemies per chunk.
const MAX_ENEMIES_PER_CHUNK: u32 = 4;

/// What the world lifecycle did this frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorldUpdate {
    /// Forward progress gained this frame
    pub progress_gained: f32,
    /// New world width and difficulty, if the world grew
    pub extended: Option<(f32, u32)>,
    /// Biome newly entered
    pub entered: Option<crate::game::biome::Biome>,
    /// Guardian spawned this frame
    pub boss_spawned: Option<Species>,
    /// A sand storm started its warning
    pub storm_spawned: bool,
}

/// Everything that lives in the level besides the player.
#[derive(Clone, Debug)]
pub struct World {
    /// Edible flowers
    pub flowers: Vec<Flower>,
    /// Bumpable bricks
    pub bricks: Vec<Brick>,
    /// Creatures and guardians
    pub enemies: Vec<Enemy>,
    /// Player thorns in flight
    pub thorns: Vec<Projectile>,
    /// Hostile projectiles in flight
    pub enemy_projectiles: Vec<Projectile>,
    /// Power-up pickups
    pub power_ups: Vec<PowerUpPickup>,
    /// Sand storms
    pub storms: Vec<SandStorm>,
    /// Shelters
    pub shelters: Vec<Shelter>,
    /// Cosmetic particles
    pub particles: Vec<Particle>,
    /// Biome transitions and guardian triggers
    pub biome: BiomeTracker,
    /// Storm cadence
    pub storm_scheduler: StormScheduler,
    /// Timed pickups ahead of the player
    pub power_up_spawner: PowerUpSpawner,
    width: f32,
    max_progress_x: f32,
    difficulty: u32,
}

impl World {
    /// Generate the starting stretch of world.
    pub fn new(config: &GameConfig, rng: &mut DeterministicRng) -> Self {
        let width = config.world.initial_screens * config.screen_width();
        let mut world = Self {
            flowers: Vec::new(),
            bricks: Vec::new(),
            enemies: Vec::new(),
            thorns: Vec::new(),
            enemy_projectiles: Vec::new(),
            power_ups: Vec::new(),
            storms: Vec::new(),
            shelters: Vec::new(),
            particles: Vec::new(),
            biome: BiomeTracker::new(),
            storm_scheduler: StormScheduler::new(config),
            power_up_spawner: PowerUpSpawner::new(config.world.power_up_interval_ms),
            width,
            max_progress_x: config.player.start_x,
            difficulty: 1,
        };
        world.populate(0.0, width, config, rng);
        world
    }

    /// Current world width. Grows, never shrinks.
    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Furthest x the player has reached.
    #[inline]
    pub fn max_progress_x(&self) -> f32 {
        self.max_progress_x
    }

    /// Difficulty level, starting at 1. Never decreases.
    #[inline]
    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Leftmost x the player may occupy: one screen behind the furthest
    /// progress, never below zero.
    #[inline]
    pub fn forward_boundary(&self, screen_width: f32) -> f32 {
        (self.max_progress_x - screen_width).max(0.0)
    }

    /// Record the player's position. Returns the forward progress gained.
    pub fn track_progress(&mut self, player_x: f32, config: &GameConfig) -> f32 {
        if player_x <= self.max_progress_x {
            return 0.0;
        }
        let gained = player_x - self.max_progress_x;
        self.max_progress_x = player_x;

        let level = 1 + (self.max_progress_x / config.world.difficulty_step).floor() as u32;
        if level > self.difficulty {
            self.difficulty = level;
            info!("difficulty raised to {}", level);
        }
        gained
    }

    /// Close enough to the right edge that the world should grow.
    pub fn needs_extension(&self, config: &GameConfig) -> bool {
        self.max_progress_x > self.width - config.world.extend_margin_screens * config.screen_width()
    }

    /// Grow the world if needed. Returns the new width when it grew.
    pub fn extend(&mut self, config: &GameConfig, rng: &mut DeterministicRng) -> Option<f32> {
        if !self.needs_extension(config) {
            return None;
        }
        let old = self.width;
        self.width += config.world.extend_screens * config.screen_width();
        self.populate(old, self.width, config, rng);
        debug!("world extended {} -> {} (difficulty {})", old, self.width, self.difficulty);
        Some(self.width)
    }

    /// Fill `[from, to)` chunk by chunk using each chunk's biome.
    fn populate(&mut self, from: f32, to: f32, config: &GameConfig, rng: &mut DeterministicRng) {
        let chunk = config.world.chunk_width;
        let mut x = from;
        while x < to {
            let end = (x + chunk).min(to);
            if end <= x {
                warn!("chunk width {} too small to advance past x={}", chunk, x);
                break;
            }
            self.populate_chunk(x, end, config, rng);
            x = end;
        }
    }

    fn populate_chunk(&mut self, start: f32, end: f32, config: &GameConfig, rng: &mut DeterministicRng) {
        let ground = config.ground_y();
        let width = end - start;
        let biome = biome_at(start + width * 0.5, config.world.biome_span);
        // Nothing hostile on top of the spawn point
        let safe = start < config.player.start_x + config.screen_width() * 0.5;

        let flowers = 3 + rng.next_int(3);
        for _ in 0..flowers {
            let kind = if rng.chance(SUPER_FLOWER_CHANCE) { FlowerKind::Super } else { FlowerKind::Normal };
            let x = start + rng.next_f32() * (width - Flower::SIZE).max(0.0);
            let y = ground - 40.0 - rng.next_f32() * 120.0;
            self.flowers.push(Flower::new(x, y, kind));
        }

        if rng.chance(BRICK_ROW_CHANCE) {
            let count = 1 + rng.next_int(3);
            let row_width = count as f32 * Brick::SIZE;
            let x = start + rng.next_f32() * (width - row_width).max(0.0);
            let y = ground - 150.0 - rng.next_f32() * 30.0;
            for i in 0..count {
                let reward = rng.chance(BRICK_REWARD_CHANCE);
                self.bricks.push(Brick::new(x + i as f32 * Brick::SIZE, y, reward));
            }
        }

        if !safe {
            let count = (1 + (self.difficulty - 1) / 2).min(MAX_ENEMIES_PER_CHUNK);
            for _ in 0..count {
                if let Some(&species) = rng.choose(biome.roster()) {
                    let x = start + rng.next_f32() * width;
                    self.enemies.push(Enemy::spawn(species, x, ground, config.physics.speed_factor));
                }
            }
        }

        if rng.chance(CHUNK_POWER_UP_CHANCE) {
            if let Some(&kind) = rng.choose(biome.power_ups()) {
                let x = start + rng.next_f32() * (width - PowerUpPickup::SIZE).max(0.0);
                let y = ground - 150.0 - rng.next_f32() * 100.0;
                self.power_ups.push(PowerUpPickup::new(x, y, kind));
            }
        }

        if rng.chance(SHELTER_CHANCE) {
            let x = start + rng.next_f32() * (width - Shelter::WIDTH).max(0.0);
            self.shelters.push(Shelter::new(x, ground));
        }
    }

    /// Place a guardian entering from the right.
    pub fn spawn_boss(&mut self, species: Species, x: f32, config: &GameConfig) {
        let x = x.min(self.width - species.stats().width).max(0.0);
        self.enemies.push(Enemy::spawn(species, x, config.ground_y(), config.physics.speed_factor));
        info!("{} appeared at x={:.0}", species.name(), x);
    }

    /// Spawn a particle burst.
    pub fn spawn_burst(&mut self, burst: &Burst, rng: &mut DeterministicRng) {
        for _ in 0..burst.count {
            self.particles.push(Particle::scatter(burst, rng));
        }
    }

    /// Run the per-frame lifecycle: progress, extension, biome, guardian,
    /// storms, timed pickups and cleanup.
    pub fn advance(&mut self, player_x: f32, dt: f32, config: &GameConfig, rng: &mut DeterministicRng) -> WorldUpdate {
        let mut update = WorldUpdate {
            progress_gained: self.track_progress(player_x, config),
            ..WorldUpdate::default()
        };

        if let Some(width) = self.extend(config, rng) {
            update.extended = Some((width, self.difficulty));
        }

        let biome = self.biome.update(player_x, config);
        update.entered = biome.entered;
        if let Some((species, x)) = biome.spawn_boss {
            self.spawn_boss(species, x, config);
            update.boss_spawned = Some(species);
        }

        if self.storm_scheduler.update(dt, self.difficulty, config, rng) {
            self.storms.push(SandStorm::spawn(player_x, config, rng));
            update.storm_spawned = true;
        }

        let pool = self.biome.current().power_ups();
        if let Some(pickup) = self.power_up_spawner.update(dt, player_x, pool, config, rng) {
            self.power_ups.push(pickup);
        }

        self.cleanup(player_x, config);
        update
    }

    /// Drop inactive or consumed entities and anything entirely behind the
    /// cleanup horizon.
    pub fn cleanup(&mut self, player_x: f32, config: &GameConfig) {
        let horizon = player_x - config.world.cleanup_screens * config.screen_width();

        self.flowers.retain(|f| !f.collected && f.bounds.right() >= horizon);
        self.bricks.retain(|b| b.bounds.right() >= horizon);
        self.enemies.retain(|e| e.active && e.aabb().right() >= horizon);
        self.thorns.retain(|p| p.active);
        self.enemy_projectiles.retain(|p| p.active);
        self.power_ups.retain(|p| !p.collected && p.bounds.right() >= horizon);
        self.storms.retain(|s| s.active);
        self.shelters.retain(|s| s.bounds.right() >= horizon);
        self.particles.retain(|p| p.active && p.pos.x >= horizon);

        if self.particles.len() > MAX_PARTICLES {
            let excess = self.particles.len() - MAX_PARTICLES;
            self.particles.drain(..excess);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::ParticleKind;
    use crate::core::vec2::Vec2;

    fn fresh() -> (World, GameConfig, DeterministicRng) {
        let config = GameConfig::default();
        let mut rng = DeterministicRng::new(42);
        let world = World::new(&config, &mut rng);
        (world, config, rng)
    }

    #[test]
    fn test_initial_world_is_two_screens_and_populated() {
        let (world, _, _) = fresh();
        assert_eq!(world.width(), 1600.0);
        assert_eq!(world.difficulty(), 1);
        assert!(world.flowers.len() >= 6);
        assert!(world.flowers.iter().all(|f| f.bounds.x >= 0.0 && f.bounds.x < 1600.0));
        // Start area is free of enemies
        assert!(world.enemies.iter().all(|e| e.aabb().x >= 400.0));
    }

    #[test]
    fn test_extension_adds_three_screens_once() {
        let (mut world, config, mut rng) = fresh();
        // Two screens wide with a two screen margin: grows right away
        assert!(world.needs_extension(&config));
        assert_eq!(world.extend(&config, &mut rng), Some(4000.0));
        assert_eq!(world.extend(&config, &mut rng), None);
        assert!(world.flowers.iter().any(|f| f.bounds.x >= 1600.0));
    }

    #[test]
    fn test_extension_waits_for_margin() {
        let (mut world, config, mut rng) = fresh();
        world.extend(&config, &mut rng);

        world.track_progress(2400.0, &config);
        assert_eq!(world.extend(&config, &mut rng), None);
        world.track_progress(2401.0, &config);
        assert_eq!(world.extend(&config, &mut rng), Some(6400.0));
    }

    #[test]
    fn test_difficulty_follows_furthest_progress() {
        let (mut world, config, _) = fresh();
        world.track_progress(2999.0, &config);
        assert_eq!(world.difficulty(), 1);
        world.track_progress(3000.0, &config);
        assert_eq!(world.difficulty(), 2);
        // Backtracking never lowers it
        assert_eq!(world.track_progress(100.0, &config), 0.0);
        assert_eq!(world.difficulty(), 2);
        world.track_progress(9100.0, &config);
        assert_eq!(world.difficulty(), 4);
    }

    #[test]
    fn test_forward_boundary_trails_by_one_screen() {
        let (mut world, config, _) = fresh();
        assert_eq!(world.forward_boundary(800.0), 0.0);
        world.track_progress(2000.0, &config);
        assert_eq!(world.forward_boundary(800.0), 1200.0);
        world.track_progress(1500.0, &config);
        assert_eq!(world.forward_boundary(800.0), 1200.0);
    }

    #[test]
    fn test_cleanup_purges_only_far_behind() {
        let (mut world, config, _) = fresh();
        world.flowers.clear();
        world.flowers.push(Flower::new(100.0, 400.0, FlowerKind::Normal));
        world.flowers.push(Flower::new(2500.0, 400.0, FlowerKind::Normal));
        let mut eaten = Flower::new(5000.0, 400.0, FlowerKind::Normal);
        eaten.collect();
        world.flowers.push(eaten);

        // Horizon at 5000 - 2400 = 2600: the flower at 2500..2520 is behind
        world.cleanup(5000.0, &config);
        assert!(world.flowers.is_empty());

        world.flowers.push(Flower::new(2590.0, 400.0, FlowerKind::Normal));
        world.cleanup(5000.0, &config);
        assert_eq!(world.flowers.len(), 1);
    }

    #[test]
    fn test_cleanup_keeps_solid_entities_at_horizon() {
        let (mut world, config, _) = fresh();
        let ground = config.ground_y();
        world.bricks.clear();
        world.enemies.clear();
        world.shelters.clear();

        // Horizon at 2600; each pair has one box ending just past it
        world.enemies.push(Enemy::spawn(Species::Camel, 2530.0, ground, 1.0));
        world.enemies.push(Enemy::spawn(Species::Camel, 2500.0, ground, 1.0));
        world.bricks.push(Brick::new(2570.0, 300.0, false));
        world.bricks.push(Brick::new(2560.0, 300.0, false));
        world.shelters.push(Shelter::new(2490.0, ground));
        world.shelters.push(Shelter::new(2470.0, ground));

        world.cleanup(5000.0, &config);

        assert_eq!(world.enemies.len(), 1);
        assert_eq!(world.enemies[0].aabb().x, 2530.0);
        assert!(world.enemies[0].active);
        assert_eq!(world.bricks.len(), 1);
        assert_eq!(world.bricks[0].bounds.x, 2570.0);
        assert_eq!(world.shelters.len(), 1);
        assert_eq!(world.shelters[0].bounds.x, 2490.0);
    }

    #[test]
    fn test_particles_capped() {
        let (mut world, config, mut rng) = fresh();
        let burst = Burst::new(Vec2::new(500.0, 300.0), ParticleKind::Gold, MAX_PARTICLES as u32 + 50);
        world.spawn_burst(&burst, &mut rng);
        world.cleanup(500.0, &config);
        assert_eq!(world.particles.len(), MAX_PARTICLES);
    }

    #[test]
    fn test_boss_spawn_is_clamped_to_world() {
        let (mut world, config, _) = fresh();
        world.enemies.clear();
        world.spawn_boss(Species::SandWorm, 10_000.0, &config);
        let worm = &world.enemies[0];
        assert!(worm.aabb().right() <= world.width());
    }
}
