//! Entity Physics Kernel
//!
//! Purely mechanical integration shared by the player, ground enemies and
//! projectiles. Gameplay code mutates `vel` first; the kernel then applies
//! gravity, integrates once, and resolves the ground plane and world bounds.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;

/// Axis-aligned bounding box (top-left origin).
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Aabb {
    /// Create a box from its top-left corner and size.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Strict overlap test; touching edges do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

/// Position, size and velocity of a simulated object.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Body {
    /// Top-left corner
    pub pos: Vec2,
    /// Pixels per frame
    pub vel: Vec2,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
    /// Resting on the ground plane after the last step
    pub grounded: bool,
}

impl Body {
    /// Create a body at rest.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            vel: Vec2::ZERO,
            width,
            height,
            grounded: false,
        }
    }

    /// Create a body standing on the ground plane.
    pub fn on_ground(x: f32, ground_y: f32, width: f32, height: f32) -> Self {
        let mut body = Self::new(x, ground_y - height, width, height);
        body.grounded = true;
        body
    }

    /// Bounding box.
    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos.x, self.pos.y, self.width, self.height)
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.aabb().center()
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.height
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.width
    }
}

/// Shared constants the kernel reads each step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Environment {
    /// Added to `vy` once per frame
    pub gravity: f32,
    /// Ground plane y
    pub ground_y: f32,
    /// Live world width
    pub world_width: f32,
}

/// `vy += gravity`, then move by velocity.
#[inline]
pub fn integrate(body: &mut Body, gravity: f32) {
    body.vel.y += gravity;
    body.pos += body.vel;
}

/// Move by velocity without gravity (fliers, drifting hazards).
#[inline]
pub fn integrate_kinematic(body: &mut Body) {
    body.pos += body.vel;
}

/// Clamp to the ground plane. Returns whether the body is grounded.
pub fn resolve_ground(body: &mut Body, ground_y: f32) -> bool {
    if body.bottom() >= ground_y {
        body.pos.y = ground_y - body.height;
        if body.vel.y > 0.0 {
            body.vel.y = 0.0;
        }
        body.grounded = true;
    } else {
        body.grounded = false;
    }
    body.grounded
}

/// Clamp `x` into `[0, world_width - width]`. Returns whether it was clamped.
pub fn clamp_to_world(body: &mut Body, world_width: f32) -> bool {
    let max_x = (world_width - body.width).max(0.0);
    let clamped = body.pos.x.clamp(0.0, max_x);
    let hit = clamped != body.pos.x;
    body.pos.x = clamped;
    hit
}

/// Decay horizontal velocity. Only called on frames without directional intent.
#[inline]
pub fn apply_friction(body: &mut Body, coefficient: f32) {
    body.vel.x *= coefficient;
    if body.vel.x.abs() < 0.01 {
        body.vel.x = 0.0;
    }
}

/// Full kernel step: gravity, integration, ground, world bounds.
pub fn step(body: &mut Body, env: &Environment) {
    integrate(body, env.gravity);
    resolve_ground(body, env.ground_y);
    clamp_to_world(body, env.world_width);
}

// =============================================================================
// TESTS
// =============================================================================
