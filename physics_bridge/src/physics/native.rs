//! Physics backend abstraction.
//!
//! The bridge talks to the simulator only through [`PhysicsBackend`].
//! Everything on the far side of the trait lives in physics space and is
//! addressed through opaque [`RawHandle`]s. Ownership of those handles on
//! the bridge side is expressed with [`NativeHandle`].

use super::error::PhysicsResult;
use super::flags::CollisionFlags;
use super::shape::ShapeKind;
use glam::{Quat, Vec3};
use std::any::Any;
use tracing::warn;

/// Opaque identifier of a native object inside a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawHandle(pub u32);

/// What happened during one simulation step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// User indices of rigid bodies whose world transform changed.
    pub moved: Vec<u64>,
}

/// Trait for physics backend implementations.
///
/// Creation methods may fail with `NativeAllocation`. Every other method is
/// infallible: handles unknown to the backend are ignored with a warning.
pub trait PhysicsBackend: 'static {
    // Shapes
    fn create_shape(&mut self, kind: &ShapeKind) -> PhysicsResult<RawHandle>;
    fn set_shape_scale(&mut self, shape: RawHandle, scale: Vec3);

    // Collision objects
    fn create_rigid_body(&mut self, user_index: u64, mass: f32) -> PhysicsResult<RawHandle>;
    fn create_ghost_object(&mut self, user_index: u64) -> PhysicsResult<RawHandle>;
    fn create_character(
        &mut self,
        ghost: RawHandle,
        shape: RawHandle,
        step_height: f32,
        up_axis: Vec3,
    ) -> PhysicsResult<RawHandle>;

    /// Free a native object of any kind. Objects still in the world are
    /// removed first.
    fn destroy(&mut self, handle: RawHandle);

    fn set_collision_shape(&mut self, object: RawHandle, shape: RawHandle);

    // Material
    fn set_restitution(&mut self, object: RawHandle, value: f32);
    fn set_friction(&mut self, object: RawHandle, value: f32);
    fn set_rolling_friction(&mut self, object: RawHandle, value: f32);
    fn set_ccd_motion_threshold(&mut self, object: RawHandle, value: f32);
    fn set_ccd_swept_sphere_radius(&mut self, object: RawHandle, value: f32);

    fn collision_flags(&self, object: RawHandle) -> CollisionFlags;
    fn set_collision_flags(&mut self, object: RawHandle, flags: CollisionFlags);
    fn set_contact_processing_threshold(&mut self, object: RawHandle, value: f32);
    fn is_active(&self, object: RawHandle) -> bool;

    // Transform, in physics space
    fn world_transform(&self, object: RawHandle) -> (Vec3, Quat);
    fn set_world_origin(&mut self, object: RawHandle, origin: Vec3);
    fn set_world_rotation(&mut self, object: RawHandle, rotation: Quat);

    // Rigid bodies
    fn calculate_local_inertia(&mut self, shape: RawHandle, mass: f32) -> Vec3;
    fn set_mass_props(&mut self, object: RawHandle, mass: f32, inertia: Vec3);
    fn add_rigid_body(&mut self, object: RawHandle, group: u32, mask: u32);
    fn remove_rigid_body(&mut self, object: RawHandle);

    // Characters
    fn add_character(&mut self, character: RawHandle, group: u32, mask: u32);
    fn remove_character(&mut self, character: RawHandle);
    fn set_walk_direction(&mut self, character: RawHandle, direction: Vec3);
    /// A zero vector jumps with the configured jump speed along the up axis.
    fn jump(&mut self, character: RawHandle, velocity: Vec3);
    fn set_fall_speed(&mut self, character: RawHandle, value: f32);
    fn set_jump_speed(&mut self, character: RawHandle, value: f32);
    fn set_max_slope(&mut self, character: RawHandle, radians: f32);
    fn set_character_gravity(&mut self, character: RawHandle, gravity: Vec3);
    fn on_ground(&self, character: RawHandle) -> bool;

    // World
    fn set_world_gravity(&mut self, gravity: Vec3);
    fn step(&mut self, dt: f32) -> StepReport;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Owned native object.
///
/// Not `Clone`: exactly one owner frees the object, by consuming the handle
/// with [`NativeHandle::destroy`].
#[derive(Debug)]
pub struct NativeHandle {
    raw: RawHandle,
    destroyed: bool,
}

impl NativeHandle {
    pub(crate) fn new(raw: RawHandle) -> Self {
        Self {
            raw,
            destroyed: false,
        }
    }

    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    pub fn destroy(mut self, backend: &mut dyn PhysicsBackend) {
        backend.destroy(self.raw);
        self.destroyed = true;
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        if !self.destroyed {
            warn!(handle = ?self.raw, "Native physics object dropped without being destroyed");
        }
    }
}
