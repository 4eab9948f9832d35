//! Input Snapshot
//!
//! The core polls one `InputFrame` per frame: a bit set of held actions.
//! No queuing; `InputTracker` derives press edges for toggle actions.

use serde::{Serialize, Deserialize};

/// Held inputs for a single frame.
///
/// Action flags (packed bits):
/// - Bit 0: move left
/// - Bit 1: move right
/// - Bit 2: jump
/// - Bit 3: throw thorn
/// - Bit 4: plant
/// - Bit 5: pause
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFrame {
    /// Packed action flags
    pub flags: u8,
}

impl InputFrame {
    /// Move left
    pub const FLAG_LEFT: u8 = 0x01;
    /// Move right
    pub const FLAG_RIGHT: u8 = 0x02;
    /// Jump
    pub const FLAG_JUMP: u8 = 0x04;
    /// Throw a thorn
    pub const FLAG_THORN: u8 = 0x08;
    /// Plant / uproot
    pub const FLAG_PLANT: u8 = 0x10;
    /// Pause / resume
    pub const FLAG_PAUSE: u8 = 0x20;

    /// Empty frame (nothing held).
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Frame with the given flags held.
    pub const fn with_flags(flags: u8) -> Self {
        Self { flags }
    }

    #[inline]
    fn has(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    #[inline]
    fn set(&mut self, flag: u8, held: bool) {
        if held {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// Left held.
    #[inline]
    pub fn left(&self) -> bool {
        self.has(Self::FLAG_LEFT)
    }

    /// Right held.
    #[inline]
    pub fn right(&self) -> bool {
        self.has(Self::FLAG_RIGHT)
    }

    /// Jump held.
    #[inline]
    pub fn jump(&self) -> bool {
        self.has(Self::FLAG_JUMP)
    }

    /// Thorn held.
    #[inline]
    pub fn thorn(&self) -> bool {
        self.has(Self::FLAG_THORN)
    }

    /// Plant held.
    #[inline]
    pub fn plant(&self) -> bool {
        self.has(Self::FLAG_PLANT)
    }

    /// Pause held.
    #[inline]
    pub fn pause(&self) -> bool {
        self.has(Self::FLAG_PAUSE)
    }

    /// Horizontal intent: -1, 0 or +1. Opposing directions cancel.
    #[inline]
    pub fn direction(&self) -> f32 {
        match (self.left(), self.right()) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    /// Set left.
    pub fn set_left(&mut self, held: bool) {
        self.set(Self::FLAG_LEFT, held);
    }

    /// Set right.
    pub fn set_right(&mut self, held: bool) {
        self.set(Self::FLAG_RIGHT, held);
    }

    /// Set jump.
    pub fn set_jump(&mut self, held: bool) {
        self.set(Self::FLAG_JUMP, held);
    }

    /// Set thorn.
    pub fn set_thorn(&mut self, held: bool) {
        self.set(Self::FLAG_THORN, held);
    }

    /// Set plant.
    pub fn set_plant(&mut self, held: bool) {
        self.set(Self::FLAG_PLANT, held);
    }

    /// Set pause.
    pub fn set_pause(&mut self, held: bool) {
        self.set(Self::FLAG_PAUSE, held);
    }

    /// Nothing held.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.flags == 0
    }
}

/// Remembers last frame's input so toggles fire once per key press.
#[derive(Clone, Debug, Default)]
pub struct InputTracker {
    previous: InputFrame,
}

impl InputTracker {
    /// Record `current` and return the flags that went down this frame.
    pub fn press(&mut self, current: InputFrame) -> InputFrame {
        let pressed = InputFrame::with_flags(current.flags & !self.previous.flags);
        self.previous = current;
        pressed
    }
}

// =============================================================================
// TESTS
// =============================================================================
