//! Rigid body variant of a physics component.

use super::body::{BodyCategory, SimulationMember};
use super::error::PhysicsResult;
use super::flags::CollisionFlags;
use super::native::{NativeHandle, PhysicsBackend, RawHandle};
use super::shape::ColliderShape;
use glam::Vec3;
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    mass: f32,
    is_kinematic: bool,
    local_inertia: Vec3,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            mass: 1.0,
            is_kinematic: false,
            local_inertia: Vec3::ZERO,
        }
    }
}

impl RigidBody {
    pub fn new(mass: f32) -> Self {
        Self {
            mass: mass.max(0.0),
            ..Default::default()
        }
    }

    /// Mass 0 body that never moves.
    pub fn fixed() -> Self {
        Self::new(0.0)
    }

    pub fn with_kinematic(mut self, is_kinematic: bool) -> Self {
        self.is_kinematic = is_kinematic;
        self
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn is_kinematic(&self) -> bool {
        self.is_kinematic
    }

    pub fn is_static(&self) -> bool {
        self.mass == 0.0 && !self.is_kinematic
    }

    /// Inertia computed by the backend for the current shape and mass.
    pub fn local_inertia(&self) -> Vec3 {
        self.local_inertia
    }

    pub(crate) fn set_mass(&mut self, mass: f32) {
        self.mass = mass.max(0.0);
    }

    pub(crate) fn set_kinematic(&mut self, is_kinematic: bool) {
        self.is_kinematic = is_kinematic;
    }

    /// Mass the simulation integrates with; kinematic bodies are moved by hand.
    fn effective_mass(&self) -> f32 {
        if self.is_kinematic {
            0.0
        } else {
            self.mass
        }
    }

    pub(crate) fn apply_flags(&self, backend: &mut dyn PhysicsBackend, object: RawHandle) {
        let mut flags = backend.collision_flags(object);
        flags.set(CollisionFlags::KINEMATIC_OBJECT, self.is_kinematic);
        flags.set(CollisionFlags::STATIC_OBJECT, self.is_static());
        backend.set_collision_flags(object, flags);
    }

    pub(crate) fn update_mass_props(
        &mut self,
        backend: &mut dyn PhysicsBackend,
        object: RawHandle,
        shape: Option<RawHandle>,
    ) {
        let mass = self.effective_mass();
        self.local_inertia = match shape {
            Some(shape) if mass > 0.0 => backend.calculate_local_inertia(shape, mass),
            _ => Vec3::ZERO,
        };
        backend.set_mass_props(object, mass, self.local_inertia);
        trace!(mass, inertia = ?self.local_inertia, "Updated rigid body mass properties");
    }

    pub fn duplicate(&self) -> Self {
        Self {
            local_inertia: Vec3::ZERO,
            ..self.clone()
        }
    }
}

impl SimulationMember for RigidBody {
    fn category(&self) -> BodyCategory {
        BodyCategory::RigidBody
    }

    fn create_native(
        &mut self,
        backend: &mut dyn PhysicsBackend,
        user_index: u64,
    ) -> PhysicsResult<NativeHandle> {
        let raw = backend.create_rigid_body(user_index, self.effective_mass())?;
        self.apply_flags(backend, raw);
        Ok(NativeHandle::new(raw))
    }

    fn insert(&mut self, backend: &mut dyn PhysicsBackend, object: RawHandle, group: u32, mask: u32) {
        backend.add_rigid_body(object, group, mask);
    }

    fn remove(&mut self, backend: &mut dyn PhysicsBackend, object: RawHandle) {
        backend.remove_rigid_body(object);
    }

    fn on_shape_change(
        &mut self,
        backend: &mut dyn PhysicsBackend,
        object: RawHandle,
        shape: &ColliderShape,
    ) -> PhysicsResult<()> {
        self.update_mass_props(backend, object, shape.native());
        Ok(())
    }

    fn destroy_native(&mut self, _backend: &mut dyn PhysicsBackend) {}
}
