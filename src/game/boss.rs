//! Guardian Bosses
//!
//! Phase-gated multi-attack behaviors. A boss's phase is derived every frame
//! from its remaining health against fixed thresholds and only ever moves
//! forward; each phase swaps the attack selection wholesale, and the
//! one-time entry effects of a phase (speed or cooldown multipliers) run at
//! the transition instant only.

use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::enemy::{Actor, AiEffects, WorldView};
use crate::game::entities::{Burst, Flower, FlowerKind, ParticleKind};
use crate::game::events::GameEventData;
use crate::game::physics::{self, Aabb};
use crate::game::player::DamageSource;
use crate::game::powerup::{PowerUpKind, PowerUpPickup};
use crate::game::projectile::{Projectile, ProjectileKind};

// =============================================================================
// PHASES
// =============================================================================

/// Phase for a health level. Phase 1 plus one for every threshold the
/// remaining health has dropped strictly below.
pub fn phase_for(health: i32, max_health: i32, thresholds: &[f32]) -> u8 {
    let crossed = thresholds
        .iter()
        .filter(|t| (health as f32) < max_health as f32 * **t)
        .count();
    1 + crossed as u8
}

/// Advance `current` to the derived phase. Returns the phases entered, in
/// order, so each entry effect runs exactly once. Never goes backwards.
fn advance_phase(current: &mut u8, actor: &Actor, thresholds: &[f32]) -> Vec<u8> {
    let derived = phase_for(actor.health, actor.max_health, thresholds);
    let entered: Vec<u8> = (*current + 1..=derived).collect();
    *current = (*current).max(derived);
    entered
}

fn tick_down(timer: &mut f32, dt: f32) {
    if *timer > 0.0 {
        *timer -= dt;
    }
}

// =============================================================================
// SAND WORM
// =============================================================================

/// Burrowing guardian.
///
/// Phase 1 alternates a sand blast and a body slam. Phase 2 burrows and
/// erupts next to the player. Phase 3 surfaces for good, speeds up once,
/// and fires both attacks at double rate.
#[derive(Clone, Debug)]
pub struct SandWormAi {
    phase: u8,
    burrowed: bool,
    attack_cooldown_ms: f32,
    attack_timer_ms: f32,
    underground_ms: f32,
    emerge_cooldown_ms: f32,
    segments: Vec<Vec2>,
}

impl SandWormAi {
    /// Health fractions that open phases 2 and 3
    pub const THRESHOLDS: [f32; 2] = [0.7, 0.3];
    /// Rage speed multiplier, applied once
    pub const RAGE_SPEED: f32 = 1.5;
    /// Cosmetic body segments
    pub const SEGMENTS: usize = 8;

    const ATTACK_COOLDOWN_MS: f32 = 2000.0;
    const UNDERGROUND_MS: f32 = 3000.0;
    const EMERGE_COOLDOWN_MS: f32 = 5000.0;
    const ERUPTION_RANGE: f32 = 80.0;
    const SEGMENT_SPACING: f32 = 25.0;
    const SEGMENT_EASING: f32 = 0.1;
    const FRICTION: f32 = 0.95;

    /// Fresh worm in phase 1.
    pub fn new() -> Self {
        Self {
            phase: 1,
            burrowed: false,
            attack_cooldown_ms: Self::ATTACK_COOLDOWN_MS,
            attack_timer_ms: Self::ATTACK_COOLDOWN_MS,
            underground_ms: 0.0,
            emerge_cooldown_ms: 0.0,
            segments: Vec::new(),
        }
    }

    /// Current phase (1..=3).
    pub fn phase(&self) -> u8 {
        self.phase
    }

    /// Underground and untouchable.
    pub fn is_burrowed(&self) -> bool {
        self.burrowed
    }

    /// Trailing body segments, head first. Cosmetic only.
    pub fn segments(&self) -> &[Vec2] {
        &self.segments
    }

    /// State tag for the renderer.
    pub fn label(&self) -> &'static str {
        match (self.phase, self.burrowed) {
            (_, true) => "burrowed",
            (3, false) => "rage",
            _ => "surfaced",
        }
    }

    pub(crate) fn update(
        &mut self,
        actor: &mut Actor,
        view: &WorldView,
        dt: f32,
        rng: &mut DeterministicRng,
        fx: &mut AiEffects,
    ) {
        tick_down(&mut self.attack_timer_ms, dt);
        tick_down(&mut self.underground_ms, dt);
        tick_down(&mut self.emerge_cooldown_ms, dt);

        for phase in advance_phase(&mut self.phase, actor, &Self::THRESHOLDS) {
            match phase {
                2 => self.burrow(actor, fx),
                3 => {
                    self.burrowed = false;
                    actor.speed *= Self::RAGE_SPEED;
                }
                _ => {}
            }
            fx.events.push(GameEventData::BossPhaseChanged { species: actor.species, phase });
        }

        match self.phase {
            1 => {
                if self.attack_timer_ms <= 0.0 {
                    if rng.chance(0.5) {
                        Self::sand_blast(actor, view, fx);
                    } else {
                        Self::body_slam(actor, view, fx);
                    }
                    self.attack_timer_ms = self.attack_cooldown_ms;
                }
            }
            2 => {
                if self.burrowed {
                    if self.underground_ms <= 0.0 {
                        self.emerge(actor, view, rng, fx);
                    }
                } else if self.emerge_cooldown_ms <= 0.0 {
                    self.burrow(actor, fx);
                }
            }
            _ => {
                if self.attack_timer_ms <= 0.0 {
                    Self::sand_blast(actor, view, fx);
                    Self::body_slam(actor, view, fx);
                    self.attack_timer_ms = self.attack_cooldown_ms * 0.5;
                }
            }
        }

        // Physics: slide with friction, stay on the ground
        actor.body.pos += actor.body.vel;
        actor.body.vel = actor.body.vel * Self::FRICTION;
        let rest_y = view.ground_y - actor.body.height;
        if actor.body.pos.y > rest_y {
            actor.body.pos.y = rest_y;
        }
        physics::clamp_to_world(&mut actor.body, view.world_width);

        self.update_segments(actor);
    }

    fn sand_blast(actor: &mut Actor, view: &WorldView, fx: &mut AiEffects) {
        let origin = Vec2::new(actor.center().x, actor.body.pos.y + 50.0);
        let toward = actor.toward_player(view);
        let speed = 6.0 * actor.speed_factor;
        for i in 0..5 {
            let angle = (i as f32 - 2.0) * 0.3;
            let vel = Vec2::new(angle.cos() * speed * toward, angle.sin() * speed);
            fx.projectiles.push(Projectile::new(ProjectileKind::Sand, origin, vel));
        }
    }

    fn body_slam(actor: &mut Actor, view: &WorldView, fx: &mut AiEffects) {
        let toward = actor.toward_player(view);
        actor.facing_right = toward > 0.0;
        actor.body.vel.x = toward * actor.speed * 2.0;
        let feet = Vec2::new(actor.center().x, actor.body.bottom());
        fx.bursts.push(Burst::new(feet, ParticleKind::Dust, 12));
    }

    fn burrow(&mut self, actor: &Actor, fx: &mut AiEffects) {
        self.burrowed = true;
        self.underground_ms = Self::UNDERGROUND_MS;
        self.emerge_cooldown_ms = Self::EMERGE_COOLDOWN_MS;
        let feet = Vec2::new(actor.center().x, actor.body.bottom());
        fx.bursts.push(Burst::new(feet, ParticleKind::Dust, 20));
    }

    fn emerge(&mut self, actor: &mut Actor, view: &WorldView, rng: &mut DeterministicRng, fx: &mut AiEffects) {
        self.burrowed = false;
        self.underground_ms = 0.0;

        actor.body.pos.x = view.player.center.x - actor.body.width * 0.5 + rng.next_centered() * 200.0;
        actor.body.pos.y = view.ground_y - actor.body.height;
        actor.body.vel = Vec2::ZERO;

        let feet = Vec2::new(actor.center().x, actor.body.bottom());
        fx.bursts.push(Burst::new(feet, ParticleKind::Dust, 25));
        if actor.distance_x(view) < Self::ERUPTION_RANGE {
            fx.strikes.push(DamageSource::Area);
        }
    }

    fn update_segments(&mut self, actor: &Actor) {
        if self.segments.is_empty() {
            self.segments = (0..Self::SEGMENTS)
                .map(|i| Vec2::new(actor.body.pos.x, actor.body.pos.y + 30.0 + i as f32 * Self::SEGMENT_SPACING))
                .collect();
            return;
        }

        let mut leader = Vec2::new(actor.body.pos.x, actor.body.pos.y + 30.0 - Self::SEGMENT_SPACING);
        for segment in self.segments.iter_mut() {
            let target = Vec2::new(leader.x, leader.y + Self::SEGMENT_SPACING);
            *segment = segment.lerp(target, Self::SEGMENT_EASING);
            leader = *segment;
        }
    }
}

impl Default for SandWormAi {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// GIANT VULTURE
// =============================================================================

/// Flying guardian.
///
/// Circles the player between attacks; each attack slot picks a dive, a
/// wind gust or a feather storm. Below half health it speeds up and attacks
/// more often (applied once).
#[derive(Clone, Debug)]
pub struct GiantVultureAi {
    phase: u8,
    attack_cooldown_ms: f32,
    attack_timer_ms: f32,
    dive_cooldown_ms: f32,
    wind_cooldown_ms: f32,
    angle: f32,
    orbit_y: f32,
}

impl GiantVultureAi {
    /// Health fraction that opens phase 2
    pub const THRESHOLDS: [f32; 1] = [0.5];
    /// Phase 2 speed multiplier
    pub const FRENZY_SPEED: f32 = 1.3;
    /// Phase 2 attack cooldown multiplier
    pub const FRENZY_COOLDOWN: f32 = 0.7;

    const ATTACK_COOLDOWN_MS: f32 = 3000.0;
    const DIVE_COOLDOWN_MS: f32 = 5000.0;
    const WIND_COOLDOWN_MS: f32 = 4000.0;
    const ORBIT_RADIUS_X: f32 = 150.0;
    const ORBIT_RADIUS_Y: f32 = 50.0;
    const ANGLE_STEP: f32 = 0.03;
    const EASING: f32 = 0.05;
    const FRICTION: f32 = 0.98;
    const WIND_REACH: f32 = 200.0;
    const WIND_PUSH: f32 = 5.0;

    /// Fresh vulture in phase 1.
    pub fn new() -> Self {
        Self {
            phase: 1,
            attack_cooldown_ms: Self::ATTACK_COOLDOWN_MS,
            attack_timer_ms: Self::ATTACK_COOLDOWN_MS,
            dive_cooldown_ms: 0.0,
            wind_cooldown_ms: 0.0,
            angle: 0.0,
            orbit_y: 150.0,
        }
    }

    /// Current phase (1..=2).
    pub fn phase(&self) -> u8 {
        self.phase
    }

    /// Current attack cadence.
    pub fn attack_cooldown_ms(&self) -> f32 {
        self.attack_cooldown_ms
    }

    /// State tag for the renderer.
    pub fn label(&self) -> &'static str {
        if self.phase >= 2 { "frenzy" } else { "circling" }
    }

    pub(crate) fn update(
        &mut self,
        actor: &mut Actor,
        view: &WorldView,
        dt: f32,
        rng: &mut DeterministicRng,
        fx: &mut AiEffects,
    ) {
        tick_down(&mut self.attack_timer_ms, dt);
        tick_down(&mut self.dive_cooldown_ms, dt);
        tick_down(&mut self.wind_cooldown_ms, dt);

        for phase in advance_phase(&mut self.phase, actor, &Self::THRESHOLDS) {
            if phase == 2 {
                actor.speed *= Self::FRENZY_SPEED;
                self.attack_cooldown_ms *= Self::FRENZY_COOLDOWN;
            }
            fx.events.push(GameEventData::BossPhaseChanged { species: actor.species, phase });
        }

        if self.attack_timer_ms <= 0.0 {
            let roll = rng.next_f32();
            if roll < 0.4 && self.dive_cooldown_ms <= 0.0 {
                self.dive(actor, view, fx);
            } else if roll < 0.7 && self.wind_cooldown_ms <= 0.0 {
                self.wind_gust(actor, view, fx);
            } else {
                Self::feather_storm(actor, rng, fx);
            }
            self.attack_timer_ms = self.attack_cooldown_ms;
        } else {
            self.angle += Self::ANGLE_STEP;
            let target = Vec2::new(
                view.player.center.x + self.angle.cos() * Self::ORBIT_RADIUS_X,
                self.orbit_y + self.angle.sin() * Self::ORBIT_RADIUS_Y,
            );
            actor.body.vel = (target - actor.body.pos) * Self::EASING;
            actor.facing_right = actor.body.vel.x > 0.0;
        }

        actor.body.pos += actor.body.vel;
        actor.body.vel = actor.body.vel * Self::FRICTION;
        let max_y = (view.viewport_height - 200.0).max(50.0);
        actor.body.pos.y = actor.body.pos.y.clamp(50.0, max_y);
        physics::clamp_to_world(&mut actor.body, view.world_width);
    }

    fn dive(&mut self, actor: &mut Actor, view: &WorldView, fx: &mut AiEffects) {
        self.dive_cooldown_ms = Self::DIVE_COOLDOWN_MS;
        let direction = (view.player.center - actor.center()).normalize();
        actor.body.vel = direction * (actor.speed * 3.0);
        actor.facing_right = direction.x > 0.0;
        let tail = Vec2::new(actor.center().x, actor.body.bottom());
        fx.bursts.push(Burst::new(tail, ParticleKind::Dust, 15));
    }

    fn wind_gust(&mut self, actor: &Actor, view: &WorldView, fx: &mut AiEffects) {
        self.wind_cooldown_ms = Self::WIND_COOLDOWN_MS;
        let origin = actor.center();
        let speed = 5.0 * actor.speed_factor;
        for i in 0..8 {
            let angle = i as f32 / 8.0 * std::f32::consts::TAU;
            let vel = Vec2::new(angle.cos() * speed, angle.sin() * speed);
            fx.projectiles.push(Projectile::new(ProjectileKind::Wind, origin, vel));
        }

        let dx = view.player.center.x - origin.x;
        if dx.abs() < Self::WIND_REACH {
            fx.player_push += dx.signum() * Self::WIND_PUSH;
        }
    }

    fn feather_storm(actor: &Actor, rng: &mut DeterministicRng, fx: &mut AiEffects) {
        for _ in 0..12 {
            let origin = Vec2::new(actor.body.pos.x + rng.next_f32() * actor.body.width, actor.body.pos.y);
            let vel = Vec2::new(rng.next_centered() * 2.0 * actor.speed_factor, 3.0 * actor.speed_factor);
            fx.projectiles.push(Projectile::new(ProjectileKind::Feather, origin, vel));
        }
    }

    pub(crate) fn on_hit(&mut self, actor: &mut Actor) {
        actor.body.vel.y -= 3.0;
    }
}

impl Default for GiantVultureAi {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// REWARDS
// =============================================================================

/// Loot dropped where a boss fell: three power-ups in a row above it and a
/// line of five super flowers.
pub fn defeat_rewards(bounds: &Aabb, rng: &mut DeterministicRng) -> (Vec<PowerUpPickup>, Vec<Flower>) {
    let center = bounds.center();

    let power_ups = (0..3)
        .map(|i| {
            let kind = rng.choose(&PowerUpKind::ALL).copied().unwrap_or(PowerUpKind::Shield);
            PowerUpPickup::new(center.x + (i as f32 - 1.0) * 50.0, center.y - 50.0, kind)
        })
        .collect();

    let flowers = (0..5)
        .map(|i| Flower::new(center.x + (i as f32 - 2.0) * 30.0, center.y - 30.0, FlowerKind::Super))
        .collect();

    (power_ups, flowers)
}

// =============================================================================
// TESTS
// =============================================================================
