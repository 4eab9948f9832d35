//! Collectibles and Scenery
//!
//! Flowers, bricks and cosmetic particles. Each is positional: no IDs, just
//! a slot in the world ledger until it is collected or falls behind the
//! cleanup horizon.

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::physics::Aabb;

// =============================================================================
// FLOWERS
// =============================================================================

/// Flower variety; decides the reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowerKind {
    /// +1 thorn, 10 points
    Normal,
    /// Grows two sizes, +2 thorns, 20 points
    Super,
}

impl FlowerKind {
    /// Score awarded on collection.
    pub fn points(self) -> u32 {
        match self {
            FlowerKind::Normal => 10,
            FlowerKind::Super => 20,
        }
    }
}

/// A flower waiting to be eaten.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flower {
    /// Bounds
    pub bounds: Aabb,
    /// Variety
    pub kind: FlowerKind,
    /// Write-once: flips to true on the first collection
    pub collected: bool,
}

impl Flower {
    /// Flower sprite size
    pub const SIZE: f32 = 20.0;

    /// Create an uncollected flower at `(x, y)`.
    pub fn new(x: f32, y: f32, kind: FlowerKind) -> Self {
        Self {
            bounds: Aabb::new(x, y, Self::SIZE, Self::SIZE),
            kind,
            collected: false,
        }
    }

    /// Mark collected. Returns false if it already was.
    pub fn collect(&mut self) -> bool {
        if self.collected {
            return false;
        }
        self.collected = true;
        true
    }
}

// =============================================================================
// BRICKS
// =============================================================================

/// A solid block. Head-butting it from below counts a hit; reward bricks
/// release one flower the first time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    /// Bounds
    pub bounds: Aabb,
    /// Holds a flower
    pub reward: bool,
    /// Reward already released
    pub released: bool,
    /// Times hit from below
    pub hits: u32,
}

impl Brick {
    /// Brick edge length
    pub const SIZE: f32 = 32.0;

    /// Create a brick with its top-left at `(x, y)`.
    pub fn new(x: f32, y: f32, reward: bool) -> Self {
        Self {
            bounds: Aabb::new(x, y, Self::SIZE, Self::SIZE),
            reward,
            released: false,
            hits: 0,
        }
    }

    /// Register a head-bump. Returns a flower the first time a reward brick is hit.
    pub fn bump(&mut self) -> Option<Flower> {
        self.hits += 1;
        if self.reward && !self.released {
            self.released = true;
            let x = self.bounds.x + (Self::SIZE - Flower::SIZE) * 0.5;
            return Some(Flower::new(x, self.bounds.y - Flower::SIZE - 4.0, FlowerKind::Normal));
        }
        None
    }
}

// =============================================================================
// PARTICLES
// =============================================================================

/// Cosmetic particle palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Pink petals from eaten flowers
    Petal,
    /// Red sparks when the player is hurt
    Hurt,
    /// Brown dust from hits, smashes and burrowing
    Dust,
    /// Green motes when a creature is befriended
    Friendly,
    /// Gold shower for boss defeats and power-ups
    Gold,
}

/// Request to spawn a burst of particles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Burst {
    /// Origin
    pub at: Vec2,
    /// Palette
    pub kind: ParticleKind,
    /// Particle count
    pub count: u32,
}

impl Burst {
    /// Create a burst request.
    pub fn new(at: Vec2, kind: ParticleKind, count: u32) -> Self {
        Self { at, kind, count }
    }
}

/// A short-lived cosmetic particle. Never affects gameplay.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    /// Position
    pub pos: Vec2,
    /// Velocity
    pub vel: Vec2,
    /// Remaining life
    pub life_ms: f32,
    /// Palette
    pub kind: ParticleKind,
    /// Alive
    pub active: bool,
}

impl Particle {
    /// Lifetime of a fresh particle
    pub const LIFETIME_MS: f32 = 1000.0;

    /// Spawn one particle of a burst with randomized velocity.
    pub fn scatter(burst: &Burst, rng: &mut DeterministicRng) -> Self {
        Self {
            pos: burst.at,
            vel: Vec2::new(rng.next_centered() * 6.0, rng.next_centered() * 6.0 - 2.0),
            life_ms: Self::LIFETIME_MS,
            kind: burst.kind,
            active: true,
        }
    }

    /// Drift and fade.
    pub fn update(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.pos += self.vel;
        self.vel.y += 0.1;
        self.life_ms -= dt;
        if self.life_ms <= 0.0 {
            self.active = false;
        }
    }

    /// Remaining life as a fraction, for fading.
    pub fn alpha(&self) -> f32 {
        (self.life_ms / Self::LIFETIME_MS).clamp(0.0, 1.0)
    }
}
