//! Projectiles
//!
//! Player thorns and everything enemies fire. A projectile dies on lifetime
//! expiry, on leaving the world, or on its first qualifying hit.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::physics::{self, Aabb, Body};

/// What was fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectileKind {
    /// Player thorn
    Thorn,
    /// Scorpion sting
    Poison,
    /// Rock golem throw
    Rock,
    /// Sand worm blast
    Sand,
    /// Giant vulture gust
    Wind,
    /// Giant vulture feather storm
    Feather,
}

impl ProjectileKind {
    /// Fired by an enemy (damages the player).
    #[inline]
    pub fn is_hostile(self) -> bool {
        !matches!(self, ProjectileKind::Thorn)
    }

    /// Per-frame gravity applied to this projectile.
    pub fn gravity(self) -> f32 {
        match self {
            ProjectileKind::Thorn => 0.2,
            ProjectileKind::Rock => 0.2,
            ProjectileKind::Poison
            | ProjectileKind::Sand
            | ProjectileKind::Wind
            | ProjectileKind::Feather => 0.0,
        }
    }

    /// Lifetime before the projectile fizzles.
    pub fn lifetime_ms(self) -> f32 {
        match self {
            ProjectileKind::Thorn => 4000.0,
            _ => 3000.0,
        }
    }

    /// Sprite size.
    pub fn size(self) -> (f32, f32) {
        match self {
            ProjectileKind::Thorn | ProjectileKind::Poison => (8.0, 4.0),
            ProjectileKind::Rock => (12.0, 12.0),
            ProjectileKind::Sand => (10.0, 10.0),
            ProjectileKind::Wind => (15.0, 15.0),
            ProjectileKind::Feather => (8.0, 12.0),
        }
    }
}

/// A projectile in flight.
#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    /// Kind
    pub kind: ProjectileKind,
    /// Position, size and velocity
    pub body: Body,
    /// Remaining life
    pub lifetime_ms: f32,
    /// False once expired, out of bounds, or spent on a hit
    pub active: bool,
}

impl Projectile {
    /// Thorn horizontal speed before speed scaling
    pub const THORN_SPEED: f32 = 12.0;

    /// Margin past the world edges before a projectile is discarded
    pub const OUT_OF_BOUNDS_MARGIN: f32 = 50.0;

    /// Spawn a projectile centered on `origin`.
    pub fn new(kind: ProjectileKind, origin: Vec2, velocity: Vec2) -> Self {
        let (width, height) = kind.size();
        let mut body = Body::new(origin.x - width * 0.5, origin.y - height * 0.5, width, height);
        body.vel = velocity;
        Self {
            kind,
            body,
            lifetime_ms: kind.lifetime_ms(),
            active: true,
        }
    }

    /// Spawn a player thorn moving in `direction` (+1 right, -1 left).
    pub fn thorn(origin: Vec2, direction: f32, vy: f32, speed_factor: f32) -> Self {
        Self::new(
            ProjectileKind::Thorn,
            origin,
            Vec2::new(direction * Self::THORN_SPEED * speed_factor, vy),
        )
    }

    /// Bounds.
    #[inline]
    pub fn aabb(&self) -> Aabb {
        self.body.aabb()
    }

    /// Advance one frame. Anything that reaches the ground plane is spent.
    pub fn update(&mut self, dt: f32, world_width: f32, ground_y: f32) {
        if !self.active {
            return;
        }

        physics::integrate(&mut self.body, self.kind.gravity());
        self.lifetime_ms -= dt;

        let x = self.body.pos.x;
        let out_of_world = x < -Self::OUT_OF_BOUNDS_MARGIN
            || x > world_width + Self::OUT_OF_BOUNDS_MARGIN
            || self.body.bottom() >= ground_y;

        if self.lifetime_ms <= 0.0 || out_of_world {
            self.active = false;
        }
    }

    /// Spend the projectile on a hit. Returns false if it was already spent.
    pub fn consume(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }
}
