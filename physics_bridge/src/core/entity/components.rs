//! Core components for the entity system

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Transform component representing position, rotation, and scale in local space
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// Position in local space
    pub position: Vec3,
    /// Rotation in local space as a quaternion
    pub rotation: Quat,
    /// Scale in local space
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with the given position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a new transform with the given position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Convert this transform to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Set the scale of the transform
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }
}

/// Global transform component representing the world-space transformation matrix
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GlobalTransform {
    /// World-space transformation matrix
    pub matrix: Mat4,
}

impl Default for GlobalTransform {
    fn default() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
        }
    }
}

impl GlobalTransform {
    /// Create a new global transform from a matrix
    pub fn from_matrix(matrix: Mat4) -> Self {
        Self { matrix }
    }

    /// Get the world position from the transformation matrix
    pub fn position(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }
}

/// World-space pose of an entity, decomposed from its world matrix.
///
/// `lossy_scale` is exact only when no ancestor combines rotation with
/// non-uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPose {
    pub position: Vec3,
    pub rotation: Quat,
    pub lossy_scale: Vec3,
}

impl Default for WorldPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            lossy_scale: Vec3::ONE,
        }
    }
}

impl WorldPose {
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (lossy_scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            rotation,
            lossy_scale,
        }
    }
}

/// Parent component establishing a parent-child relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub hecs::Entity);

/// Name component for user-friendly entity identification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Name(pub String);

impl Name {
    /// Create a new name component
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Which parts of a transform changed.
///
/// Local flags describe what was written; world flags describe what an
/// observer of the entity's world matrix sees, and are propagated to
/// descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TransformFlags(pub u32);

impl TransformFlags {
    pub const NONE: Self = Self(0);
    pub const LOCAL_POSITION: Self = Self(1 << 0);
    pub const LOCAL_ROTATION: Self = Self(1 << 1);
    pub const LOCAL_SCALE: Self = Self(1 << 2);
    pub const WORLD_POSITION: Self = Self(1 << 3);
    pub const WORLD_ROTATION: Self = Self(1 << 4);
    pub const WORLD_SCALE: Self = Self(1 << 5);
    pub const WORLD_MATRIX: Self = Self(1 << 6);

    /// Every flag set, including bits not named above.
    pub const ALL: Self = Self(i32::MAX as u32);

    /// The world-space flags a physics body mirrors.
    pub const WORLD_POSE: Self =
        Self(Self::WORLD_POSITION.0 | Self::WORLD_ROTATION.0 | Self::WORLD_SCALE.0);

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// World flags seen by the descendants of an entity whose flags are `self`.
    pub fn for_descendants(self) -> Self {
        let mut flags = Self::NONE;
        if self.intersects(Self(
            Self::LOCAL_POSITION.0 | Self::LOCAL_ROTATION.0 | Self::LOCAL_SCALE.0,
        )) {
            flags.insert(Self::WORLD_POSITION | Self::WORLD_MATRIX);
        }
        if self.contains(Self::LOCAL_ROTATION) {
            flags.insert(Self::WORLD_ROTATION);
        }
        if self.contains(Self::LOCAL_SCALE) {
            flags.insert(Self::WORLD_SCALE);
        }
        flags
    }
}

impl BitOr for TransformFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TransformFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for TransformFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for TransformFlags {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// Transform-changed notification recorded by [`super::World`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformChanged {
    pub entity: hecs::Entity,
    pub flags: TransformFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_default() {
        let transform = Transform::default();
        assert_eq!(transform.position, Vec3::ZERO);
        assert_eq!(transform.rotation, Quat::IDENTITY);
        assert_eq!(transform.scale, Vec3::ONE);
    }

    #[test]
    fn test_transform_to_matrix() {
        let transform = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        };
        let matrix = transform.to_matrix();
        assert_eq!(matrix.w_axis.truncate(), transform.position);
    }

    #[test]
    fn test_world_pose_from_matrix() {
        let rotation = Quat::from_rotation_y(0.5);
        let transform = Transform {
            position: Vec3::new(5.0, 10.0, 15.0),
            rotation,
            scale: Vec3::new(2.0, 2.0, 2.0),
        };
        let pose = WorldPose::from_matrix(&transform.to_matrix());
        assert!(pose.position.abs_diff_eq(transform.position, 1e-5));
        assert!(pose.rotation.abs_diff_eq(rotation, 1e-5));
        assert!(pose.lossy_scale.abs_diff_eq(Vec3::splat(2.0), 1e-5));
    }

    #[test]
    fn test_transform_flags_ops() {
        let mut flags = TransformFlags::WORLD_POSITION | TransformFlags::WORLD_SCALE;
        assert!(flags.contains(TransformFlags::WORLD_POSITION));
        assert!(!flags.contains(TransformFlags::WORLD_ROTATION));
        assert!(flags.intersects(TransformFlags::WORLD_POSE));

        flags.remove(TransformFlags::WORLD_POSITION);
        assert_eq!(flags, TransformFlags::WORLD_SCALE);

        assert!(TransformFlags::ALL.contains(TransformFlags::WORLD_POSE));
        assert!((TransformFlags::ALL & TransformFlags::WORLD_POSE) == TransformFlags::WORLD_POSE);
    }

    #[test]
    fn test_descendant_flags() {
        let moved = TransformFlags::LOCAL_POSITION.for_descendants();
        assert!(moved.contains(TransformFlags::WORLD_POSITION));
        assert!(!moved.contains(TransformFlags::WORLD_ROTATION));

        let turned = TransformFlags::LOCAL_ROTATION.for_descendants();
        assert!(turned.contains(TransformFlags::WORLD_POSITION | TransformFlags::WORLD_ROTATION));

        let scaled = TransformFlags::LOCAL_SCALE.for_descendants();
        assert!(scaled.contains(TransformFlags::WORLD_POSITION | TransformFlags::WORLD_SCALE));
    }

    #[test]
    fn test_name_component() {
        let name = Name::new("Test Entity");
        assert_eq!(name.0, "Test Entity");

        let json = serde_json::to_string(&name).unwrap();
        let deserialized: Name = serde_json::from_str(&json).unwrap();
        assert_eq!(name.0, deserialized.0);
    }
}
