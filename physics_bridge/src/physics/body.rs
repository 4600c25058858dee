//! Body variants carried by a physics component.

use super::character::CharacterController;
use super::error::PhysicsResult;
use super::native::{NativeHandle, PhysicsBackend, RawHandle};
use super::rigid_body::RigidBody;
use super::shape::ColliderShape;

/// Which per-category list of the simulation a body is registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyCategory {
    RigidBody,
    Character,
}

/// What a body does when it enters or leaves the simulation.
///
/// The generic component lifecycle drives these hooks; each body variant
/// decides how its native objects are created and inserted.
pub trait SimulationMember {
    fn category(&self) -> BodyCategory;

    /// Create the collision object representing this body.
    fn create_native(
        &mut self,
        backend: &mut dyn PhysicsBackend,
        user_index: u64,
    ) -> PhysicsResult<NativeHandle>;

    fn insert(&mut self, backend: &mut dyn PhysicsBackend, object: RawHandle, group: u32, mask: u32);

    fn remove(&mut self, backend: &mut dyn PhysicsBackend, object: RawHandle);

    /// Called after the collision object received a new shape.
    fn on_shape_change(
        &mut self,
        backend: &mut dyn PhysicsBackend,
        object: RawHandle,
        shape: &ColliderShape,
    ) -> PhysicsResult<()>;

    /// Free native objects owned by the body itself, not the collision object.
    fn destroy_native(&mut self, backend: &mut dyn PhysicsBackend);
}

#[derive(Debug)]
pub enum PhysicsBody {
    RigidBody(RigidBody),
    Character(CharacterController),
}

impl PhysicsBody {
    pub fn member(&self) -> &dyn SimulationMember {
        match self {
            Self::RigidBody(body) => body,
            Self::Character(character) => character,
        }
    }

    pub fn member_mut(&mut self) -> &mut dyn SimulationMember {
        match self {
            Self::RigidBody(body) => body,
            Self::Character(character) => character,
        }
    }

    pub fn category(&self) -> BodyCategory {
        self.member().category()
    }

    pub fn as_character(&self) -> Option<&CharacterController> {
        match self {
            Self::Character(character) => Some(character),
            Self::RigidBody(_) => None,
        }
    }

    pub fn as_character_mut(&mut self) -> Option<&mut CharacterController> {
        match self {
            Self::Character(character) => Some(character),
            Self::RigidBody(_) => None,
        }
    }

    pub fn as_rigid_body(&self) -> Option<&RigidBody> {
        match self {
            Self::RigidBody(body) => Some(body),
            Self::Character(_) => None,
        }
    }

    pub fn as_rigid_body_mut(&mut self) -> Option<&mut RigidBody> {
        match self {
            Self::RigidBody(body) => Some(body),
            Self::Character(_) => None,
        }
    }

    /// Same tunables, no native objects.
    pub fn duplicate(&self) -> Self {
        match self {
            Self::RigidBody(body) => Self::RigidBody(body.duplicate()),
            Self::Character(character) => Self::Character(character.duplicate()),
        }
    }
}
