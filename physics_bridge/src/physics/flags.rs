//! Collision object flags and collision filter groups.

use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// Flags stored on a native collision object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CollisionFlags(pub u32);

impl CollisionFlags {
    pub const NONE: Self = Self(0);

    /// Never moves; mass is zero.
    pub const STATIC_OBJECT: Self = Self(1 << 0);

    /// Moved by the application, not by the simulation.
    pub const KINEMATIC_OBJECT: Self = Self(1 << 1);

    /// Reports contacts but does not respond to them.
    pub const NO_CONTACT_RESPONSE: Self = Self(1 << 2);

    /// Per-triangle material callback, required by mesh shapes.
    pub const CUSTOM_MATERIAL_CALLBACK: Self = Self(1 << 3);

    /// Ghost object driven by a kinematic character.
    pub const CHARACTER_OBJECT: Self = Self(1 << 4);

    pub const DISABLE_VISUALIZE_OBJECT: Self = Self(1 << 5);

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Set or clear `other` depending on `value`.
    #[inline]
    pub fn set(&mut self, other: Self, value: bool) {
        if value {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl BitOr for CollisionFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CollisionFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Collision filter group bits.
///
/// A pair of objects collides when each one's group intersects the other's
/// `can_collide_with` mask.
pub struct CollisionGroups;

impl CollisionGroups {
    pub const NONE: u32 = 0;
    pub const DEFAULT: u32 = 1 << 0;
    pub const STATIC: u32 = 1 << 1;
    pub const KINEMATIC: u32 = 1 << 2;
    pub const DEBRIS: u32 = 1 << 3;
    pub const SENSOR_TRIGGER: u32 = 1 << 4;
    pub const CHARACTER: u32 = 1 << 5;
    pub const CUSTOM0: u32 = 1 << 6;
    pub const CUSTOM1: u32 = 1 << 7;
    pub const CUSTOM2: u32 = 1 << 8;
    pub const CUSTOM3: u32 = 1 << 9;
    pub const ALL: u32 = u32::MAX;

    /// Whether two filtered objects may collide.
    #[inline]
    pub fn can_collide(group_a: u32, mask_a: u32, group_b: u32, mask_b: u32) -> bool {
        (group_a & mask_b) != 0 && (group_b & mask_a) != 0
    }
}
