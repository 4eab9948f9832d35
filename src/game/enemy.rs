//! Enemy AI
//!
//! A closed set of behaviors dispatched through one `Enemy` type. Every
//! frame each active enemy runs: timers, state-conditioned behavior, physics,
//! animation. Behaviors read the world through an immutable `WorldView` and
//! report side effects (projectiles, strikes on the player, particles)
//! through `AiEffects`; they never touch another entity directly.

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::boss::{GiantVultureAi, SandWormAi};
use crate::game::entities::{Burst, ParticleKind};
use crate::game::events::GameEventData;
use crate::game::physics::{self, Aabb, Body, Environment};
use crate::game::player::{DamageSource, Player};
use crate::game::projectile::{Projectile, ProjectileKind};

// =============================================================================
// SPECIES
// =============================================================================

/// Every creature that can appear in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Species {
    /// Ground patroller that chases and hops
    Camel,
    /// Small ground patroller with a poison sting
    Scorpion,
    /// Circling flyer that dives at the player
    Vulture,
    /// Sleeping ambusher with a ground smash and a rock throw
    RockGolem,
    /// Burrowing guardian boss
    SandWorm,
    /// Flying guardian boss
    GiantVulture,
}

/// Base stats for a species.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeciesStats {
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
    /// Health at spawn
    pub health: i32,
    /// Movement speed before speed scaling
    pub speed: f32,
}

impl Species {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Species::Camel => "Camel",
            Species::Scorpion => "Scorpion",
            Species::Vulture => "Vulture",
            Species::RockGolem => "Rock Golem",
            Species::SandWorm => "Sand Worm",
            Species::GiantVulture => "Giant Vulture",
        }
    }

    /// Guardian boss.
    pub fn is_boss(self) -> bool {
        matches!(self, Species::SandWorm | Species::GiantVulture)
    }

    /// Spawn stats.
    pub fn stats(self) -> SpeciesStats {
        let (width, height, health, speed) = match self {
            Species::Camel => (80.0, 60.0, 2, 2.0),
            Species::Scorpion => (40.0, 30.0, 1, 3.0),
            Species::Vulture => (50.0, 40.0, 2, 2.5),
            Species::RockGolem => (60.0, 80.0, 4, 1.5),
            Species::SandWorm => (100.0, 200.0, 15, 3.0),
            Species::GiantVulture => (120.0, 80.0, 12, 4.0),
        };
        SpeciesStats { width, height, health, speed }
    }
}

// =============================================================================
// CONTEXT
// =============================================================================

/// Read-only snapshot of the player handed to AI.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerView {
    /// Top-left
    pub pos: Vec2,
    /// Center
    pub center: Vec2,
    /// Facing direction
    pub facing_right: bool,
    /// Rooted in place
    pub planted: bool,
}

impl PlayerView {
    /// Snapshot a player.
    pub fn of(player: &Player) -> Self {
        Self {
            pos: player.body.pos,
            center: player.center(),
            facing_right: player.facing_right,
            planted: player.is_planted(),
        }
    }
}

/// Shared state AI may read. Built once per frame after the player update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldView {
    /// Player snapshot
    pub player: PlayerView,
    /// Gravity
    pub gravity: f32,
    /// Ground plane
    pub ground_y: f32,
    /// Live world width
    pub world_width: f32,
    /// Viewport height
    pub viewport_height: f32,
    /// Global speed scaling
    pub speed_factor: f32,
    /// Time since the run started
    pub elapsed_ms: f64,
}

impl WorldView {
    /// Physics environment for ground units.
    pub fn environment(&self) -> Environment {
        Environment {
            gravity: self.gravity,
            ground_y: self.ground_y,
            world_width: self.world_width,
        }
    }
}

/// Side effects requested by AI this frame.
#[derive(Debug, Default)]
pub struct AiEffects {
    /// Hostile projectiles to add to the world
    pub projectiles: Vec<Projectile>,
    /// Direct hits on the player (smash, eruption); gated by the player
    pub strikes: Vec<DamageSource>,
    /// Horizontal shove applied to the player (wind gust)
    pub player_push: f32,
    /// Cosmetic particle bursts
    pub bursts: Vec<Burst>,
    /// Events to publish
    pub events: Vec<GameEventData>,
}

// =============================================================================
// ACTOR
// =============================================================================

/// The gameplay state every behavior acts on.
#[derive(Clone, Debug)]
pub struct Actor {
    /// Species
    pub species: Species,
    /// Position, size and velocity
    pub body: Body,
    /// Remaining health
    pub health: i32,
    /// Health at spawn
    pub max_health: i32,
    /// Current movement speed (scaled)
    pub speed: f32,
    /// Global speed scaling captured at spawn
    pub speed_factor: f32,
    /// Facing direction
    pub facing_right: bool,
}

impl Actor {
    /// Center point.
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.body.center()
    }

    /// Horizontal center distance to the player.
    #[inline]
    pub fn distance_x(&self, view: &WorldView) -> f32 {
        (self.center().x - view.player.center.x).abs()
    }

    /// Euclidean center distance to the player.
    #[inline]
    pub fn distance(&self, view: &WorldView) -> f32 {
        self.center().distance(view.player.center)
    }

    /// -1 or +1 toward the player.
    #[inline]
    pub fn toward_player(&self, view: &WorldView) -> f32 {
        if view.player.center.x < self.center().x { -1.0 } else { 1.0 }
    }

    /// Health left as a fraction.
    #[inline]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0 {
            return 0.0;
        }
        self.health.max(0) as f32 / self.max_health as f32
    }

    /// Point at the front edge, vertically centered.
    pub fn muzzle(&self) -> Vec2 {
        let x = if self.facing_right { self.body.right() } else { self.body.pos.x };
        Vec2::new(x, self.center().y)
    }
}

/// Purely cosmetic animation counter.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Animation {
    /// Current frame
    pub frame: u8,
    timer_ms: f32,
    period_ms: f32,
    frames: u8,
}

impl Animation {
    fn new(period_ms: f32, frames: u8) -> Self {
        Self { frame: 0, timer_ms: 0.0, period_ms, frames }
    }

    fn advance(&mut self, dt: f32) {
        self.timer_ms += dt;
        if self.timer_ms > self.period_ms {
            self.timer_ms = 0.0;
            self.frame = (self.frame + 1) % self.frames.max(1);
        }
    }
}

fn tick_down(timer: &mut f32, dt: f32) {
    if *timer > 0.0 {
        *timer -= dt;
    }
}

// =============================================================================
// GROUND PATROLLER
// =============================================================================

/// Ground patroller state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatrolState {
    /// Pacing around home
    Patrol,
    /// Running at the player
    Chase,
    /// Knocked back after a hit
    Stunned,
}

/// Camel and scorpion AI.
#[derive(Clone, Debug)]
pub struct PatrolAi {
    /// Current state
    pub state: PatrolState,
    /// Spawn x
    pub home_x: f32,
    /// Distance at which the chase starts
    pub chase_range: f32,
    direction: f32,
    patrol_distance: f32,
    patrol_factor: f32,
    leash: Option<f32>,
    hops: bool,
    stun_ms: f32,
    sting: Option<Sting>,
}

#[derive(Clone, Copy, Debug)]
struct Sting {
    range: f32,
    cooldown_ms: f32,
}

impl PatrolAi {
    /// Stun after a hit
    pub const STUN_MS: f32 = 1500.0;

    /// Chase exits beyond this multiple of the chase range
    pub const HYSTERESIS: f32 = 1.5;

    const STING_COOLDOWN_MS: f32 = 2000.0;

    fn camel(home_x: f32) -> Self {
        Self {
            state: PatrolState::Patrol,
            home_x,
            chase_range: 180.0,
            direction: 1.0,
            patrol_distance: 120.0,
            patrol_factor: 0.5,
            leash: Some(220.0),
            hops: true,
            stun_ms: 0.0,
            sting: None,
        }
    }

    fn scorpion(home_x: f32) -> Self {
        Self {
            state: PatrolState::Patrol,
            home_x,
            chase_range: 120.0,
            direction: 1.0,
            patrol_distance: 80.0,
            patrol_factor: 0.3,
            leash: None,
            hops: false,
            stun_ms: 0.0,
            sting: Some(Sting { range: 30.0, cooldown_ms: 0.0 }),
        }
    }

    fn tick_timers(&mut self, dt: f32) {
        if let Some(sting) = self.sting.as_mut() {
            tick_down(&mut sting.cooldown_ms, dt);
        }
        if self.state == PatrolState::Stunned {
            self.stun_ms -= dt;
            if self.stun_ms <= 0.0 {
                self.stun_ms = 0.0;
                self.state = PatrolState::Patrol;
            }
        }
    }

    fn think(&mut self, actor: &mut Actor, view: &WorldView, fx: &mut AiEffects) {
        if self.state == PatrolState::Stunned {
            return;
        }

        let distance = actor.distance_x(view);
        match self.state {
            PatrolState::Patrol if distance < self.chase_range => self.state = PatrolState::Chase,
            PatrolState::Chase if distance > self.chase_range * Self::HYSTERESIS => {
                self.state = PatrolState::Patrol
            }
            _ => {}
        }

        match self.state {
            PatrolState::Patrol => self.patrol(actor),
            PatrolState::Chase => self.chase(actor, view),
            PatrolState::Stunned => {}
        }

        if let Some(sting) = self.sting.as_mut() {
            if distance < sting.range && sting.cooldown_ms <= 0.0 {
                sting.cooldown_ms = Self::STING_COOLDOWN_MS;
                let vx = if actor.facing_right { 5.0 } else { -5.0 } * actor.speed_factor;
                fx.projectiles.push(Projectile::new(
                    ProjectileKind::Poison,
                    actor.muzzle(),
                    Vec2::new(vx, 0.0),
                ));
            }
        }
    }

    fn patrol(&mut self, actor: &mut Actor) {
        let offset = actor.body.pos.x - self.home_x;
        if offset > self.patrol_distance {
            self.direction = -1.0;
        } else if offset < -self.patrol_distance {
            self.direction = 1.0;
        }
        actor.facing_right = self.direction > 0.0;
        actor.body.vel.x = self.direction * actor.speed * self.patrol_factor;
    }

    fn chase(&mut self, actor: &mut Actor, view: &WorldView) {
        let toward = actor.toward_player(view);
        self.direction = toward;
        actor.facing_right = toward > 0.0;
        actor.body.vel.x = toward * actor.speed;

        let player_above = view.player.pos.y < actor.body.pos.y - 20.0;
        if self.hops && player_above && actor.body.grounded && actor.distance_x(view) < 100.0 {
            actor.body.vel.y = -12.0 * actor.speed_factor;
            actor.body.grounded = false;
        }

        // Pinned at the end of the leash: give up the chase
        if let Some((min_x, max_x)) = self.leash_bounds() {
            let x = actor.body.pos.x;
            if x <= min_x || x >= max_x {
                self.state = PatrolState::Patrol;
            }
        }
    }

    /// Reachable x range when leashed.
    fn leash_bounds(&self) -> Option<(f32, f32)> {
        self.leash.map(|leash| {
            let min_x = (self.home_x - leash).max(0.0);
            (min_x, (self.home_x + leash).max(min_x))
        })
    }

    fn physics(&self, actor: &mut Actor, view: &WorldView) {
        if self.state == PatrolState::Stunned {
            physics::apply_friction(&mut actor.body, 0.85);
        }
        physics::step(&mut actor.body, &view.environment());
        if let Some((min_x, max_x)) = self.leash_bounds() {
            actor.body.pos.x = actor.body.pos.x.clamp(min_x, max_x);
        }
    }

    fn on_hit(&mut self, actor: &mut Actor) {
        self.state = PatrolState::Stunned;
        self.stun_ms = Self::STUN_MS;
        let kx = 5.0 * actor.speed_factor;
        actor.body.vel.x = if actor.facing_right { -kx } else { kx };
        actor.body.vel.y = -8.0 * actor.speed_factor;
        actor.body.grounded = false;
    }
}

// =============================================================================
// FLYER
// =============================================================================

/// Flyer state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlyerState {
    /// Orbiting above the player
    Circling,
    /// Committed straight-line dive
    Diving,
    /// Flying back to the orbit
    Returning,
}

/// Vulture AI.
#[derive(Clone, Debug)]
pub struct FlyerAi {
    /// Current state
    pub state: FlyerState,
    /// Orbit center altitude
    pub altitude: f32,
    angle: f32,
    dive_cooldown_ms: f32,
    dive_target: Vec2,
    return_point: Vec2,
}

impl FlyerAi {
    /// Dive trigger distance
    pub const DIVE_RANGE: f32 = 150.0;
    /// Time between dives
    pub const DIVE_COOLDOWN_MS: f32 = 4000.0;
    /// Dive speed before speed scaling
    pub const DIVE_SPEED: f32 = 8.0;

    const ORBIT_RADIUS_X: f32 = 100.0;
    const ORBIT_RADIUS_Y: f32 = 30.0;
    const ANGLE_STEP: f32 = 0.02;
    const EASING: f32 = 0.1;

    fn new(altitude: f32) -> Self {
        Self {
            state: FlyerState::Circling,
            altitude,
            angle: 0.0,
            dive_cooldown_ms: 0.0,
            dive_target: Vec2::ZERO,
            return_point: Vec2::ZERO,
        }
    }

    fn orbit_point(&self, view: &WorldView) -> Vec2 {
        Vec2::new(
            view.player.center.x + self.angle.cos() * Self::ORBIT_RADIUS_X,
            self.altitude + self.angle.sin() * Self::ORBIT_RADIUS_Y,
        )
    }

    fn think(&mut self, actor: &mut Actor, view: &WorldView, dt: f32) {
        tick_down(&mut self.dive_cooldown_ms, dt);

        if self.state == FlyerState::Circling
            && self.dive_cooldown_ms <= 0.0
            && actor.distance(view) < Self::DIVE_RANGE
        {
            self.state = FlyerState::Diving;
            self.dive_target = view.player.center;
            self.return_point = self.orbit_point(view);
            self.dive_cooldown_ms = Self::DIVE_COOLDOWN_MS;
        }

        match self.state {
            FlyerState::Circling => {
                self.angle += Self::ANGLE_STEP;
                let target = self.orbit_point(view);
                actor.body.vel = (target - actor.center()) * Self::EASING;
                actor.facing_right = self.angle.cos() > 0.0;
            }
            FlyerState::Diving => {
                let speed = Self::DIVE_SPEED * actor.speed_factor;
                let (step, distance) = actor.center().step_toward(self.dive_target, speed);
                if distance > 10.0 {
                    actor.body.vel = step;
                    actor.facing_right = step.x > 0.0;
                } else {
                    actor.body.vel = Vec2::ZERO;
                    self.state = FlyerState::Returning;
                }
            }
            FlyerState::Returning => {
                let (step, distance) = actor.center().step_toward(self.return_point, actor.speed);
                if distance > 20.0 {
                    actor.body.vel = step;
                } else {
                    actor.body.vel = Vec2::ZERO;
                    self.state = FlyerState::Circling;
                }
            }
        }
    }

    fn physics(actor: &mut Actor, view: &WorldView) {
        physics::integrate_kinematic(&mut actor.body);
        physics::clamp_to_world(&mut actor.body, view.world_width);
    }
}

// =============================================================================
// AMBUSHER
// =============================================================================

/// Ambusher state. Waking is one-way.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmbushState {
    /// Dormant until the player comes close
    Sleeping,
    /// Awake for good
    Active,
}

/// Rock golem AI.
#[derive(Clone, Debug)]
pub struct AmbushAi {
    /// Current state
    pub state: AmbushState,
    smash_cooldown_ms: f32,
    throw_cooldown_ms: f32,
}

impl AmbushAi {
    /// Wake distance
    pub const WAKE_RANGE: f32 = 100.0;
    /// Smash distance
    pub const SMASH_RANGE: f32 = 80.0;
    /// Rock throw distance
    pub const THROW_RANGE: f32 = 200.0;

    const SMASH_COOLDOWN_MS: f32 = 3000.0;
    const THROW_COOLDOWN_MS: f32 = 4000.0;
    const FRICTION: f32 = 0.9;

    fn new() -> Self {
        Self {
            state: AmbushState::Sleeping,
            smash_cooldown_ms: 0.0,
            throw_cooldown_ms: 0.0,
        }
    }

    fn tick_timers(&mut self, dt: f32) {
        tick_down(&mut self.smash_cooldown_ms, dt);
        tick_down(&mut self.throw_cooldown_ms, dt);
    }

    fn think(&mut self, actor: &mut Actor, view: &WorldView, fx: &mut AiEffects) {
        let distance = actor.distance_x(view);

        if self.state == AmbushState::Sleeping {
            if distance < Self::WAKE_RANGE {
                self.state = AmbushState::Active;
            } else {
                return;
            }
        }

        // Fixed priority: smash, throw, close the gap
        if distance < Self::SMASH_RANGE {
            if self.smash_cooldown_ms <= 0.0 {
                self.smash(actor, fx);
            }
        } else if distance < Self::THROW_RANGE && self.throw_cooldown_ms <= 0.0 {
            self.throw_rock(actor, view, fx);
        } else {
            let toward = actor.toward_player(view);
            actor.facing_right = toward > 0.0;
            actor.body.vel.x = toward * actor.speed;
        }
    }

    fn smash(&mut self, actor: &mut Actor, fx: &mut AiEffects) {
        self.smash_cooldown_ms = Self::SMASH_COOLDOWN_MS;
        actor.body.vel.x = 0.0;
        let feet = Vec2::new(actor.center().x, actor.body.bottom());
        fx.bursts.push(Burst::new(feet, ParticleKind::Dust, 15));
        fx.strikes.push(DamageSource::Area);
    }

    fn throw_rock(&mut self, actor: &mut Actor, view: &WorldView, fx: &mut AiEffects) {
        self.throw_cooldown_ms = Self::THROW_COOLDOWN_MS;
        let origin = Vec2::new(actor.center().x, actor.body.pos.y + 20.0);
        let aim = (view.player.center - origin).normalize() * (4.0 * actor.speed_factor);
        fx.projectiles.push(Projectile::new(
            ProjectileKind::Rock,
            origin,
            Vec2::new(aim.x, aim.y - 2.0),
        ));
    }

    fn physics(actor: &mut Actor, view: &WorldView) {
        physics::step(&mut actor.body, &view.environment());
        actor.body.vel.x *= Self::FRICTION;
    }
}

// =============================================================================
// ENEMY
// =============================================================================

/// Closed set of behaviors.
#[derive(Clone, Debug)]
pub enum Behavior {
    /// Camel, scorpion
    Patroller(PatrolAi),
    /// Vulture
    Flyer(FlyerAi),
    /// Rock golem
    Ambusher(AmbushAi),
    /// Sand worm guardian
    BossSandWorm(SandWormAi),
    /// Giant vulture guardian
    BossVulture(GiantVultureAi),
}

impl Behavior {
    /// Short state tag for the renderer.
    pub fn label(&self) -> &'static str {
        match self {
            Behavior::Patroller(ai) => match ai.state {
                PatrolState::Patrol => "patrol",
                PatrolState::Chase => "chase",
                PatrolState::Stunned => "stunned",
            },
            Behavior::Flyer(ai) => match ai.state {
                FlyerState::Circling => "circling",
                FlyerState::Diving => "diving",
                FlyerState::Returning => "returning",
            },
            Behavior::Ambusher(ai) => match ai.state {
                AmbushState::Sleeping => "sleeping",
                AmbushState::Active => "active",
            },
            Behavior::BossSandWorm(ai) => ai.label(),
            Behavior::BossVulture(ai) => ai.label(),
        }
    }

    /// Boss phase, if this is a boss.
    pub fn boss_phase(&self) -> Option<u8> {
        match self {
            Behavior::BossSandWorm(ai) => Some(ai.phase()),
            Behavior::BossVulture(ai) => Some(ai.phase()),
            _ => None,
        }
    }
}

/// Result of a thorn hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitOutcome {
    /// Already inactive or untouchable
    Ignored,
    /// Took damage and survived
    Hit,
    /// Regular creature worn down to zero
    Befriended,
    /// Boss worn down to zero (fires once)
    Defeated,
}

/// A creature in the world.
#[derive(Clone, Debug)]
pub struct Enemy {
    /// Gameplay state
    pub actor: Actor,
    /// AI
    pub behavior: Behavior,
    /// False once befriended or defeated
    pub active: bool,
    /// Cosmetic animation
    pub anim: Animation,
}

impl Enemy {
    /// Spawn `species` with its left edge at `x`.
    pub fn spawn(species: Species, x: f32, ground_y: f32, speed_factor: f32) -> Self {
        let stats = species.stats();
        let mut body = Body::on_ground(x, ground_y, stats.width, stats.height);

        let (behavior, anim) = match species {
            Species::Camel => (Behavior::Patroller(PatrolAi::camel(x)), Animation::new(300.0, 4)),
            Species::Scorpion => (Behavior::Patroller(PatrolAi::scorpion(x)), Animation::new(200.0, 6)),
            Species::Vulture => {
                let altitude = ground_y - 220.0;
                body.pos.y = altitude - stats.height * 0.5;
                body.grounded = false;
                (Behavior::Flyer(FlyerAi::new(altitude)), Animation::new(100.0, 4))
            }
            Species::RockGolem => (Behavior::Ambusher(AmbushAi::new()), Animation::new(400.0, 4)),
            Species::SandWorm => (Behavior::BossSandWorm(SandWormAi::new()), Animation::new(150.0, 4)),
            Species::GiantVulture => {
                body.pos.y = 100.0;
                body.grounded = false;
                (Behavior::BossVulture(GiantVultureAi::new()), Animation::new(120.0, 4))
            }
        };

        Self {
            actor: Actor {
                species,
                body,
                health: stats.health,
                max_health: stats.health,
                speed: stats.speed * speed_factor,
                speed_factor,
                facing_right: false,
            },
            behavior,
            active: true,
            anim,
        }
    }

    /// Species.
    #[inline]
    pub fn species(&self) -> Species {
        self.actor.species
    }

    /// Bounds.
    #[inline]
    pub fn aabb(&self) -> Aabb {
        self.actor.body.aabb()
    }

    /// Can be touched by the player or thorns this frame.
    pub fn is_collidable(&self) -> bool {
        match &self.behavior {
            Behavior::BossSandWorm(ai) => self.active && !ai.is_burrowed(),
            _ => self.active,
        }
    }

    /// Boss phase, if this is a boss.
    pub fn boss_phase(&self) -> Option<u8> {
        self.behavior.boss_phase()
    }

    /// Run one frame: timers, behavior, physics, animation.
    pub fn update(&mut self, view: &WorldView, dt: f32, rng: &mut DeterministicRng, fx: &mut AiEffects) {
        if !self.active {
            return;
        }

        let actor = &mut self.actor;
        match &mut self.behavior {
            Behavior::Patroller(ai) => {
                ai.tick_timers(dt);
                ai.think(actor, view, fx);
                ai.physics(actor, view);
            }
            Behavior::Flyer(ai) => {
                ai.think(actor, view, dt);
                FlyerAi::physics(actor, view);
            }
            Behavior::Ambusher(ai) => {
                ai.tick_timers(dt);
                ai.think(actor, view, fx);
                AmbushAi::physics(actor, view);
            }
            Behavior::BossSandWorm(ai) => ai.update(actor, view, dt, rng, fx),
            Behavior::BossVulture(ai) => ai.update(actor, view, dt, rng, fx),
        }

        self.anim.advance(dt);
    }

    /// Apply one thorn hit.
    pub fn take_damage(&mut self, fx: &mut AiEffects) -> HitOutcome {
        if !self.is_collidable() {
            return HitOutcome::Ignored;
        }

        self.actor.health -= 1;
        match &mut self.behavior {
            Behavior::Patroller(ai) => ai.on_hit(&mut self.actor),
            Behavior::Ambusher(ai) => ai.state = AmbushState::Active,
            Behavior::BossVulture(ai) => ai.on_hit(&mut self.actor),
            Behavior::Flyer(_) | Behavior::BossSandWorm(_) => {}
        }

        let center = self.actor.center();
        if self.actor.health > 0 {
            fx.bursts.push(Burst::new(center, ParticleKind::Dust, 6));
            return HitOutcome::Hit;
        }

        self.active = false;
        if self.actor.species.is_boss() {
            fx.bursts.push(Burst::new(center, ParticleKind::Gold, 30));
            HitOutcome::Defeated
        } else {
            fx.bursts.push(Burst::new(center, ParticleKind::Friendly, 12));
            HitOutcome::Befriended
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const GROUND: f32 = 520.0;

    fn view_at(player_x: f32, player_y: f32) -> WorldView {
        let pos = Vec2::new(player_x, player_y);
        WorldView {
            player: PlayerView {
                pos,
                center: pos + Vec2::new(20.0, 30.0),
                facing_right: true,
                planted: false,
            },
            gravity: 0.8,
            ground_y: GROUND,
            world_width: 10_000.0,
            viewport_height: 600.0,
            speed_factor: 1.0,
            elapsed_ms: 0.0,
        }
    }

    fn patrol_state(enemy: &Enemy) -> PatrolState {
        match &enemy.behavior {
            Behavior::Patroller(ai) => ai.state,
            other => panic!("not a patroller: {}", other.label()),
        }
    }

    #[test]
    fn test_patroller_chase_hysteresis() {
        let mut rng = DeterministicRng::new(1);
        let mut fx = AiEffects::default();
        let mut camel = Enemy::spawn(Species::Camel, 500.0, GROUND, 1.0);
        assert_eq!(patrol_state(&camel), PatrolState::Patrol);

        // Player center within 180 of the camel center
        let near = view_at(540.0 - 20.0 - 150.0, GROUND - 60.0);
        camel.update(&near, 16.0, &mut rng, &mut fx);
        assert_eq!(patrol_state(&camel), PatrolState::Chase);

        // Between 1x and 1.5x the range: still chasing
        let band = camel.actor.center().x - 20.0 - 230.0;
        camel.update(&view_at(band, GROUND - 60.0), 16.0, &mut rng, &mut fx);
        assert_eq!(patrol_state(&camel), PatrolState::Chase);

        // Beyond 1.5x: back to patrol
        let far = camel.actor.center().x - 20.0 - 400.0;
        camel.update(&view_at(far, GROUND - 60.0), 16.0, &mut rng, &mut fx);
        assert_eq!(patrol_state(&camel), PatrolState::Patrol);
    }

    #[test]
    fn test_leashed_chase_gives_up_at_leash_end() {
        let mut rng = DeterministicRng::new(1);
        let mut fx = AiEffects::default();
        let mut camel = Enemy::spawn(Species::Camel, 500.0, GROUND, 1.0);

        // Player keeps 150 px ahead: inside the chase band the whole time
        let mut reached_end = false;
        let mut gave_up = false;
        for _ in 0..300 {
            let ahead = camel.actor.center().x + 150.0 - 20.0;
            camel.update(&view_at(ahead, GROUND - 60.0), 16.0, &mut rng, &mut fx);
            assert!(camel.actor.body.pos.x <= 500.0 + 220.0);
            if reached_end && patrol_state(&camel) == PatrolState::Patrol {
                gave_up = true;
                break;
            }
            reached_end = camel.actor.body.pos.x >= 720.0;
        }
        assert!(gave_up);
    }

    #[test]
    fn test_patroller_stun_then_patrol() {
        let mut rng = DeterministicRng::new(1);
        let mut fx = AiEffects::default();
        let mut camel = Enemy::spawn(Species::Camel, 500.0, GROUND, 1.0);

        assert_eq!(camel.take_damage(&mut fx), HitOutcome::Hit);
        assert_eq!(patrol_state(&camel), PatrolState::Stunned);
        assert!(camel.actor.body.vel.y < 0.0);

        let far = view_at(2000.0, GROUND - 60.0);
        for _ in 0..10 {
            camel.update(&far, 100.0, &mut rng, &mut fx);
        }
        assert_eq!(patrol_state(&camel), PatrolState::Stunned);
        for _ in 0..6 {
            camel.update(&far, 100.0, &mut rng, &mut fx);
        }
        assert_eq!(patrol_state(&camel), PatrolState::Patrol);
    }

    #[test]
    fn test_patrol_reverses_at_distance() {
        let mut rng = DeterministicRng::new(1);
        let mut fx = AiEffects::default();
        let mut camel = Enemy::spawn(Species::Camel, 500.0, GROUND, 1.0);
        let far = view_at(5000.0, GROUND - 60.0);

        let mut min_x = f32::MAX;
        let mut max_x = f32::MIN;
        for _ in 0..1000 {
            camel.update(&far, 16.0, &mut rng, &mut fx);
            min_x = min_x.min(camel.actor.body.pos.x);
            max_x = max_x.max(camel.actor.body.pos.x);
        }
        assert!(max_x <= 500.0 + 120.0 + 2.0);
        assert!(min_x >= 500.0 - 120.0 - 2.0);
        assert!(max_x - min_x > 200.0);
    }

    #[test]
    fn test_scorpion_stings_on_cooldown() {
        let mut rng = DeterministicRng::new(1);
        let mut fx = AiEffects::default();
        let mut scorpion = Enemy::spawn(Species::Scorpion, 500.0, GROUND, 1.0);
        let close = view_at(500.0, GROUND - 60.0);

        scorpion.update(&close, 16.0, &mut rng, &mut fx);
        assert_eq!(fx.projectiles.len(), 1);
        assert_eq!(fx.projectiles[0].kind, ProjectileKind::Poison);

        scorpion.update(&close, 16.0, &mut rng, &mut fx);
        assert_eq!(fx.projectiles.len(), 1);
    }

    #[test]
    fn test_flyer_dive_cycle() {
        let mut rng = DeterministicRng::new(1);
        let mut fx = AiEffects::default();
        let mut vulture = Enemy::spawn(Species::Vulture, 500.0, GROUND, 1.0);

        // Player right below the orbit
        let view = view_at(500.0, GROUND - 140.0);
        let state = |e: &Enemy| match &e.behavior {
            Behavior::Flyer(ai) => ai.state,
            _ => unreachable!(),
        };

        vulture.update(&view, 16.0, &mut rng, &mut fx);
        assert_eq!(state(&vulture), FlyerState::Diving);

        let mut saw_returning = false;
        let mut back_to_circling = false;
        for _ in 0..400 {
            vulture.update(&view, 16.0, &mut rng, &mut fx);
            match state(&vulture) {
                FlyerState::Returning => saw_returning = true,
                FlyerState::Circling if saw_returning => {
                    back_to_circling = true;
                    break;
                }
                _ => {}
            }
        }
        assert!(saw_returning);
        assert!(back_to_circling);
    }

    #[test]
    fn test_golem_wakes_once_and_prioritizes_smash() {
        let mut rng = DeterministicRng::new(1);
        let mut fx = AiEffects::default();
        let mut golem = Enemy::spawn(Species::RockGolem, 500.0, GROUND, 1.0);
        let state = |e: &Enemy| match &e.behavior {
            Behavior::Ambusher(ai) => ai.state,
            _ => unreachable!(),
        };

        golem.update(&view_at(1500.0, GROUND - 60.0), 16.0, &mut rng, &mut fx);
        assert_eq!(state(&golem), AmbushState::Sleeping);

        golem.update(&view_at(510.0, GROUND - 60.0), 16.0, &mut rng, &mut fx);
        assert_eq!(state(&golem), AmbushState::Active);
        assert_eq!(fx.strikes, vec![DamageSource::Area]);
        assert!(fx.projectiles.is_empty());

        // Medium range: rock throw
        let golem_center = golem.actor.center().x;
        golem.update(&view_at(golem_center + 150.0 - 20.0, GROUND - 60.0), 16.0, &mut rng, &mut fx);
        assert_eq!(fx.projectiles.len(), 1);
        assert_eq!(fx.projectiles[0].kind, ProjectileKind::Rock);

        // Never goes back to sleep
        golem.update(&view_at(5000.0, GROUND - 60.0), 16.0, &mut rng, &mut fx);
        assert_eq!(state(&golem), AmbushState::Active);
    }

    #[test]
    fn test_golem_damage_wakes() {
        let mut fx = AiEffects::default();
        let mut golem = Enemy::spawn(Species::RockGolem, 500.0, GROUND, 1.0);
        golem.take_damage(&mut fx);
        assert_eq!(golem.behavior.label(), "active");
    }

    #[test]
    fn test_befriend_at_zero_health_once() {
        let mut fx = AiEffects::default();
        let mut scorpion = Enemy::spawn(Species::Scorpion, 500.0, GROUND, 1.0);
        assert_eq!(scorpion.take_damage(&mut fx), HitOutcome::Befriended);
        assert!(!scorpion.active);
        assert_eq!(scorpion.take_damage(&mut fx), HitOutcome::Ignored);
    }

    #[test]
    fn test_inactive_enemy_does_not_update() {
        let mut rng = DeterministicRng::new(1);
        let mut fx = AiEffects::default();
        let mut camel = Enemy::spawn(Species::Camel, 500.0, GROUND, 1.0);
        camel.active = false;
        let before = camel.actor.body.pos;
        camel.update(&view_at(510.0, GROUND - 60.0), 16.0, &mut rng, &mut fx);
        assert_eq!(camel.actor.body.pos, before);
    }
}
