//! Conversions between engine space and physics space
//!
//! Engine space is left-handed and Y-up. The physics simulator is
//! right-handed, so positions and directions negate X and rotations negate
//! X and W. Every map here is its own inverse.

use glam::{Quat, Vec3};

/// Engine position to physics position.
#[inline]
pub fn to_physics_position(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.y, v.z)
}

/// Physics position to engine position.
#[inline]
pub fn from_physics_position(v: Vec3) -> Vec3 {
    to_physics_position(v)
}

/// Engine rotation to physics rotation.
#[inline]
pub fn to_physics_rotation(q: Quat) -> Quat {
    Quat::from_xyzw(-q.x, q.y, q.z, -q.w)
}

/// Physics rotation to engine rotation.
#[inline]
pub fn from_physics_rotation(q: Quat) -> Quat {
    to_physics_rotation(q)
}

/// Walk, jump and gravity vectors follow the position flip.
#[inline]
pub fn to_physics_direction(v: Vec3) -> Vec3 {
    to_physics_position(v)
}

#[inline]
pub fn from_physics_direction(v: Vec3) -> Vec3 {
    to_physics_position(v)
}

/// Physics-space origin of a shape offset from its owner.
pub fn compose_local_offset(
    owner_position: Vec3,
    owner_rotation: Quat,
    owner_scale: Vec3,
    local_offset: Vec3,
) -> Vec3 {
    if local_offset == Vec3::ZERO {
        return to_physics_position(owner_position);
    }
    let offset = (owner_rotation * local_offset) * owner_scale;
    to_physics_position(owner_position + offset)
}

/// Physics-space rotation of a shape rotated relative to its owner.
pub fn compose_local_rotation(owner_rotation: Quat, local_rotation: Quat) -> Quat {
    if local_rotation == Quat::IDENTITY {
        return to_physics_rotation(owner_rotation);
    }
    to_physics_rotation(owner_rotation * local_rotation)
}

/// Owner rotation recovered from the physics rotation of its shape.
pub fn decompose_local_rotation(physics_rotation: Quat, local_rotation: Quat) -> Quat {
    let rotation = from_physics_rotation(physics_rotation);
    if local_rotation == Quat::IDENTITY {
        return rotation;
    }
    (rotation * local_rotation.inverse()).normalize()
}

/// Owner position recovered from the physics origin of its shape.
///
/// `owner_rotation` must be the rotation returned by
/// [`decompose_local_rotation`] for the same pose.
pub fn decompose_local_offset(
    physics_position: Vec3,
    owner_rotation: Quat,
    owner_scale: Vec3,
    local_offset: Vec3,
) -> Vec3 {
    let position = from_physics_position(physics_position);
    if local_offset == Vec3::ZERO {
        return position;
    }
    position - (owner_rotation * local_offset) * owner_scale
}

/// Slope limits are authored in degrees and stored natively in radians.
#[inline]
pub fn slope_degrees_to_radians(degrees: f32) -> f32 {
    degrees.to_radians()
}
