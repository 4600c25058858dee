//! Physics component and its lifecycle.
//!
//! A [`PhysicsComponent`] sits on its owner entity. It caches material and
//! filter settings, owns the native collision object once the owner has been
//! added to a scene, and keeps that object's transform in step with the
//! owner's world transform.
//!
//! Mutation goes through [`ComponentMut`], obtained from
//! [`PhysicsSimulation::component_mut`], so every setter can reach the
//! backend and the simulation's bookkeeping.

use super::body::{BodyCategory, PhysicsBody};
use super::character::CharacterController;
use super::coordinates::{
    compose_local_offset, compose_local_rotation, decompose_local_offset, decompose_local_rotation,
};
use super::error::{PhysicsError, PhysicsResult};
use super::flags::{CollisionFlags, CollisionGroups};
use super::native::{NativeHandle, PhysicsBackend, RawHandle};
use super::rigid_body::RigidBody;
use super::shape::ColliderShape;
use super::simulation::{PhysicsSimulation, SimulationId};
use crate::core::entity::{TransformFlags, World};
use glam::{Quat, Vec3};
use hecs::Entity;
use std::ops::Deref;
use tracing::{debug, trace, warn};

/// Contact processing threshold set on every enabled collision object.
const CONTACT_PROCESSING_THRESHOLD: f32 = 1e30;

#[derive(Debug)]
pub struct PhysicsComponent {
    restitution: f32,
    friction: f32,
    rolling_friction: f32,
    ccd_motion_threshold: f32,
    ccd_swept_sphere_radius: f32,
    collision_group: u32,
    can_collide_with: u32,
    collider_shape: Option<Entity>,
    can_scale_shape: bool,
    enabled: bool,
    in_scene: bool,
    inserted: bool,
    transform_flags: TransformFlags,
    simulation: Option<SimulationId>,
    native: Option<NativeHandle>,
    in_update_list: bool,
    body: PhysicsBody,
}

impl PhysicsComponent {
    pub fn new(body: PhysicsBody) -> Self {
        Self {
            restitution: 0.0,
            friction: 0.5,
            rolling_friction: 0.0,
            ccd_motion_threshold: 0.0,
            ccd_swept_sphere_radius: 0.0,
            collision_group: CollisionGroups::DEFAULT,
            can_collide_with: CollisionGroups::ALL,
            collider_shape: None,
            can_scale_shape: true,
            enabled: true,
            in_scene: false,
            inserted: false,
            transform_flags: TransformFlags::ALL,
            simulation: None,
            native: None,
            in_update_list: false,
            body,
        }
    }

    pub fn rigid_body(body: RigidBody) -> Self {
        Self::new(PhysicsBody::RigidBody(body))
    }

    pub fn character(character: CharacterController) -> Self {
        Self::new(PhysicsBody::Character(character))
    }

    pub fn with_restitution(mut self, value: f32) -> Self {
        self.restitution = value;
        self
    }

    pub fn with_friction(mut self, value: f32) -> Self {
        self.friction = value;
        self
    }

    pub fn with_rolling_friction(mut self, value: f32) -> Self {
        self.rolling_friction = value;
        self
    }

    pub fn with_ccd_motion_threshold(mut self, value: f32) -> Self {
        self.ccd_motion_threshold = value;
        self
    }

    pub fn with_ccd_swept_sphere_radius(mut self, value: f32) -> Self {
        self.ccd_swept_sphere_radius = value;
        self
    }

    pub fn with_collision_group(mut self, group: u32) -> Self {
        self.collision_group = group;
        self
    }

    pub fn with_can_collide_with(mut self, mask: u32) -> Self {
        self.can_collide_with = mask;
        self
    }

    pub fn with_can_scale_shape(mut self, value: bool) -> Self {
        self.can_scale_shape = value;
        self
    }

    pub fn with_enabled(mut self, value: bool) -> Self {
        self.enabled = value;
        self
    }

    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    pub fn rolling_friction(&self) -> f32 {
        self.rolling_friction
    }

    pub fn ccd_motion_threshold(&self) -> f32 {
        self.ccd_motion_threshold
    }

    pub fn ccd_swept_sphere_radius(&self) -> f32 {
        self.ccd_swept_sphere_radius
    }

    pub fn collision_group(&self) -> u32 {
        self.collision_group
    }

    pub fn can_collide_with(&self) -> u32 {
        self.can_collide_with
    }

    pub fn collider_shape(&self) -> Option<Entity> {
        self.collider_shape
    }

    pub fn can_scale_shape(&self) -> bool {
        self.can_scale_shape
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_in_scene(&self) -> bool {
        self.in_scene
    }

    /// Whether the collision object is currently part of the simulation.
    pub fn is_in_simulation(&self) -> bool {
        self.inserted
    }

    /// Whether the owner is scheduled for the next transform push.
    pub fn is_pending_sync(&self) -> bool {
        self.in_update_list
    }

    pub fn transform_flags(&self) -> TransformFlags {
        self.transform_flags
    }

    pub fn simulation(&self) -> Option<SimulationId> {
        self.simulation
    }

    pub fn native(&self) -> Option<RawHandle> {
        self.native.as_ref().map(NativeHandle::raw)
    }

    pub fn body(&self) -> &PhysicsBody {
        &self.body
    }

    pub fn category(&self) -> BodyCategory {
        self.body.category()
    }

    pub fn as_character(&self) -> Option<&CharacterController> {
        self.body.as_character()
    }

    pub fn as_rigid_body(&self) -> Option<&RigidBody> {
        self.body.as_rigid_body()
    }

    /// Enabled, with a shape, inside a simulation.
    fn is_valid(&self) -> bool {
        self.simulation.is_some() && self.collider_shape.is_some() && self.enabled
    }

    /// Same settings and body tunables, no shape, no native object.
    pub(crate) fn duplicate_settings(&self) -> Self {
        Self::new(self.body.duplicate())
            .with_restitution(self.restitution)
            .with_friction(self.friction)
            .with_rolling_friction(self.rolling_friction)
            .with_ccd_motion_threshold(self.ccd_motion_threshold)
            .with_ccd_swept_sphere_radius(self.ccd_swept_sphere_radius)
            .with_collision_group(self.collision_group)
            .with_can_collide_with(self.can_collide_with)
            .with_can_scale_shape(self.can_scale_shape)
    }

    pub(crate) fn attach_shape_unchecked(&mut self, shape: Entity) {
        self.collider_shape = Some(shape);
    }

    pub(crate) fn take_shape(&mut self) -> Option<Entity> {
        self.collider_shape.take()
    }

    pub(crate) fn take_native(&mut self) -> Option<NativeHandle> {
        self.native.take()
    }

    pub(crate) fn body_mut(&mut self) -> &mut PhysicsBody {
        &mut self.body
    }

    pub(crate) fn set_in_scene(&mut self, value: bool) {
        self.in_scene = value;
    }

    pub(crate) fn clear_pending(&mut self) {
        self.in_update_list = false;
    }

    /// Record a transform change of the owner.
    ///
    /// Returns true when the owner has to be appended to the pending-sync list.
    pub(crate) fn on_owner_transform_changed(&mut self, flags: TransformFlags) -> bool {
        let filtered = flags & TransformFlags::WORLD_POSE;
        if filtered.is_empty() {
            return false;
        }
        self.transform_flags |= filtered;
        if self.is_valid() && !self.in_update_list {
            self.in_update_list = true;
            return true;
        }
        false
    }

    /// First addition to a scene: create the collision object, hook up the
    /// shape and replay the cached material.
    pub(crate) fn on_added(
        &mut self,
        owner: Entity,
        world: &World,
        backend: &mut dyn PhysicsBackend,
    ) -> PhysicsResult<()> {
        if self.native.is_none() {
            let native = self
                .body
                .member_mut()
                .create_native(backend, owner.to_bits().get())?;
            let object = native.raw();
            self.native = Some(native);
            debug!(entity = ?owner, object = ?object, category = ?self.category(), "Created collision object");

            if let Some(shape_entity) = self.collider_shape {
                let mut shape = world
                    .get_mut::<ColliderShape>(shape_entity)
                    .map_err(|_| PhysicsError::MissingShape(owner))?;
                let native_shape = shape.ensure_native(backend)?;
                backend.set_collision_shape(object, native_shape);
                self.on_shape_change(backend, object, &shape)?;
            }
        }
        self.replay_material(backend);
        Ok(())
    }

    fn replay_material(&self, backend: &mut dyn PhysicsBackend) {
        let Some(object) = self.native() else {
            return;
        };
        backend.set_restitution(object, self.restitution);
        backend.set_friction(object, self.friction);
        backend.set_rolling_friction(object, self.rolling_friction);
        backend.set_ccd_motion_threshold(object, self.ccd_motion_threshold);
        backend.set_ccd_swept_sphere_radius(object, self.ccd_swept_sphere_radius);
    }

    fn on_shape_change(
        &mut self,
        backend: &mut dyn PhysicsBackend,
        object: RawHandle,
        shape: &ColliderShape,
    ) -> PhysicsResult<()> {
        let mut flags = backend.collision_flags(object);
        let wanted = shape.needs_custom_collision_callback();
        if flags.contains(CollisionFlags::CUSTOM_MATERIAL_CALLBACK) != wanted {
            flags.set(CollisionFlags::CUSTOM_MATERIAL_CALLBACK, wanted);
            backend.set_collision_flags(object, flags);
        }
        self.body.member_mut().on_shape_change(backend, object, shape)
    }

    /// Enable inside a scene: join the simulation and, with a shape, insert.
    pub(crate) fn enable(
        &mut self,
        owner: Entity,
        world: &World,
        sim: &mut PhysicsSimulation,
    ) -> PhysicsResult<()> {
        self.simulation = Some(sim.id());
        if let Some(object) = self.native() {
            sim.backend_mut()
                .set_contact_processing_threshold(object, CONTACT_PROCESSING_THRESHOLD);
        }
        if self.collider_shape.is_some() && self.enabled {
            self.push_to_physics(owner, world, sim.backend_mut(), true);
            self.add_to_simulation(owner, sim);
        }
        Ok(())
    }

    pub(crate) fn disable(&mut self, owner: Entity, sim: &mut PhysicsSimulation) {
        if self.inserted {
            self.remove_from_simulation(owner, sim);
        }
        if self.in_update_list {
            sim.drop_pending(owner);
            self.in_update_list = false;
        }
        self.simulation = None;
    }

    pub(crate) fn add_to_simulation(&mut self, owner: Entity, sim: &mut PhysicsSimulation) {
        let Some(object) = self.native() else {
            warn!(entity = ?owner, "Cannot insert a component without a collision object");
            return;
        };
        if self.inserted {
            return;
        }
        let (group, mask) = (self.collision_group, self.can_collide_with);
        self.body
            .member_mut()
            .insert(sim.backend_mut(), object, group, mask);
        sim.register(self.category(), owner);
        self.inserted = true;
        trace!(entity = ?owner, group, mask, "Added to simulation");
    }

    pub(crate) fn remove_from_simulation(&mut self, owner: Entity, sim: &mut PhysicsSimulation) {
        let Some(object) = self.native() else {
            return;
        };
        if !self.inserted {
            return;
        }
        self.body.member_mut().remove(sim.backend_mut(), object);
        sim.unregister(self.category(), owner);
        self.inserted = false;
        trace!(entity = ?owner, "Removed from simulation");
    }

    /// Write the owner's world pose to the collision object.
    ///
    /// Only dirty parts are written unless `force` is set; written parts are
    /// cleared from the dirty set. Returns the number of native writes.
    pub(crate) fn push_to_physics(
        &mut self,
        owner: Entity,
        world: &World,
        backend: &mut dyn PhysicsBackend,
        force: bool,
    ) -> usize {
        let (Some(object), Some(shape_entity)) = (self.native(), self.collider_shape) else {
            return 0;
        };
        let Some(pose) = world.world_pose(owner) else {
            warn!(entity = ?owner, "Physics component owner has no transform");
            return 0;
        };
        let Ok(mut shape) = world.get_mut::<ColliderShape>(shape_entity) else {
            warn!(entity = ?owner, shape = ?shape_entity, "Collider shape entity is gone");
            return 0;
        };

        let mut writes = 0;
        if force || self.transform_flags.contains(TransformFlags::WORLD_POSITION) {
            let origin = compose_local_offset(
                pose.position,
                pose.rotation,
                pose.lossy_scale,
                shape.local_offset(),
            );
            backend.set_world_origin(object, origin);
            self.transform_flags.remove(TransformFlags::WORLD_POSITION);
            writes += 1;
        }
        if force || self.transform_flags.contains(TransformFlags::WORLD_ROTATION) {
            let rotation = compose_local_rotation(pose.rotation, shape.local_rotation());
            backend.set_world_rotation(object, rotation);
            self.transform_flags.remove(TransformFlags::WORLD_ROTATION);
            writes += 1;
        }
        if force || self.transform_flags.contains(TransformFlags::WORLD_SCALE) {
            if self.can_scale_shape {
                shape.set_scale(backend, pose.lossy_scale);
                writes += 1;
            }
            self.transform_flags.remove(TransformFlags::WORLD_SCALE);
        }
        trace!(entity = ?owner, writes, force, "Pushed transform to physics");
        writes
    }

    /// Engine-space world position and rotation of the owner implied by the
    /// collision object's current transform.
    pub(crate) fn pose_from_physics(
        &self,
        owner: Entity,
        world: &World,
        backend: &dyn PhysicsBackend,
    ) -> Option<(Vec3, Quat)> {
        let object = self.native()?;
        let shape = world.get::<ColliderShape>(self.collider_shape?).ok()?;
        let scale = world.world_pose(owner)?.lossy_scale;

        let (physics_position, physics_rotation) = backend.world_transform(object);
        let rotation = decompose_local_rotation(physics_rotation, shape.local_rotation());
        let position =
            decompose_local_offset(physics_position, rotation, scale, shape.local_offset());
        Some((position, rotation))
    }
}

/// Mutable access to a physics component together with its simulation.
pub struct ComponentMut<'a> {
    pub(crate) owner: Entity,
    pub(crate) world: &'a World,
    pub(crate) sim: &'a mut PhysicsSimulation,
    pub(crate) component: hecs::RefMut<'a, PhysicsComponent>,
}

impl Deref for ComponentMut<'_> {
    type Target = PhysicsComponent;

    fn deref(&self) -> &PhysicsComponent {
        &self.component
    }
}

impl<'a> ComponentMut<'a> {
    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub fn set_restitution(&mut self, value: f32) {
        self.component.restitution = value;
        if let Some(object) = self.component.native() {
            self.sim.backend_mut().set_restitution(object, value);
        }
    }

    pub fn set_friction(&mut self, value: f32) {
        self.component.friction = value;
        if let Some(object) = self.component.native() {
            self.sim.backend_mut().set_friction(object, value);
        }
    }

    pub fn set_rolling_friction(&mut self, value: f32) {
        self.component.rolling_friction = value;
        if let Some(object) = self.component.native() {
            self.sim.backend_mut().set_rolling_friction(object, value);
        }
    }

    pub fn set_ccd_motion_threshold(&mut self, value: f32) {
        self.component.ccd_motion_threshold = value;
        if let Some(object) = self.component.native() {
            self.sim.backend_mut().set_ccd_motion_threshold(object, value);
        }
    }

    pub fn set_ccd_swept_sphere_radius(&mut self, value: f32) {
        self.component.ccd_swept_sphere_radius = value;
        if let Some(object) = self.component.native() {
            self.sim
                .backend_mut()
                .set_ccd_swept_sphere_radius(object, value);
        }
    }

    pub fn set_collision_group(&mut self, group: u32) {
        if self.component.collision_group == group {
            return;
        }
        self.component.collision_group = group;
        self.reinsert();
    }

    pub fn set_can_collide_with(&mut self, mask: u32) {
        if self.component.can_collide_with == mask {
            return;
        }
        self.component.can_collide_with = mask;
        self.reinsert();
    }

    /// Filters only take effect on insertion.
    fn reinsert(&mut self) {
        if self.component.inserted {
            self.component.remove_from_simulation(self.owner, self.sim);
            self.component.add_to_simulation(self.owner, self.sim);
        }
    }

    pub fn set_can_scale_shape(&mut self, value: bool) {
        self.component.can_scale_shape = value;
    }

    pub fn set_enabled(&mut self, value: bool) -> PhysicsResult<()> {
        if self.component.enabled == value {
            return Ok(());
        }
        self.component.enabled = value;
        if !self.component.in_scene {
            return Ok(());
        }
        if value {
            self.component.enable(self.owner, self.world, self.sim)
        } else {
            self.component.disable(self.owner, self.sim);
            Ok(())
        }
    }

    /// Attach `shape`, replacing the current one, or detach with `None`.
    ///
    /// Fails without changing anything when the shape entity has no
    /// [`ColliderShape`] or the shape is attached to another component.
    pub fn set_collider_shape(&mut self, shape: Option<Entity>) -> PhysicsResult<()> {
        let last = self.component.collider_shape;
        if last == shape {
            return Ok(());
        }

        if let Some(new) = shape {
            let candidate = self
                .world
                .get::<ColliderShape>(new)
                .map_err(|_| PhysicsError::MissingShape(new))?;
            if candidate.attached_to().is_some() {
                return Err(PhysicsError::ShapeAlreadyAttached(new));
            }
        }

        if let Some(last) = last {
            if let Ok(mut previous) = self.world.get_mut::<ColliderShape>(last) {
                previous.detach();
            }
        }
        self.component.collider_shape = shape;

        let Some(new) = shape else {
            if self.component.inserted {
                self.component.remove_from_simulation(self.owner, self.sim);
            }
            debug!(entity = ?self.owner, "Detached collider shape");
            return Ok(());
        };

        let can_in_simulation = {
            let mut attached = self
                .world
                .get_mut::<ColliderShape>(new)
                .map_err(|_| PhysicsError::MissingShape(new))?;
            attached.attach(self.owner);

            let Some(object) = self.component.native() else {
                debug!(entity = ?self.owner, shape = ?new, "Attached collider shape");
                return Ok(());
            };

            let native_shape = attached.ensure_native(self.sim.backend_mut())?;
            self.sim
                .backend_mut()
                .set_collision_shape(object, native_shape);

            let can_in_simulation = self.component.simulation.is_some() && self.component.enabled;
            if can_in_simulation && last.is_some() {
                self.component.remove_from_simulation(self.owner, self.sim);
            }
            self.component
                .on_shape_change(self.sim.backend_mut(), object, &attached)?;
            can_in_simulation
        };

        if can_in_simulation {
            self.component
                .push_to_physics(self.owner, self.world, self.sim.backend_mut(), true);
            self.component.add_to_simulation(self.owner, self.sim);
        }
        debug!(entity = ?self.owner, shape = ?new, "Attached collider shape");
        Ok(())
    }

    /// Write the owner's world pose to the collision object now.
    pub fn push_to_physics(&mut self, force: bool) -> usize {
        self.component
            .push_to_physics(self.owner, self.world, self.sim.backend_mut(), force)
    }

    /// Move the attached shape relative to the owner. The collision object is
    /// rewritten right away so the next pull keeps the owner where it is.
    pub fn set_shape_local_offset(&mut self, offset: Vec3) -> PhysicsResult<()> {
        self.attached_shape_mut()?.set_local_offset(offset);
        self.component.transform_flags |= TransformFlags::WORLD_POSITION;
        self.component
            .push_to_physics(self.owner, self.world, self.sim.backend_mut(), false);
        Ok(())
    }

    /// Rotate the attached shape relative to the owner. The origin depends on
    /// the owner rotation only, so just the rotation is rewritten.
    pub fn set_shape_local_rotation(&mut self, rotation: Quat) -> PhysicsResult<()> {
        self.attached_shape_mut()?.set_local_rotation(rotation);
        self.component.transform_flags |= TransformFlags::WORLD_ROTATION;
        self.component
            .push_to_physics(self.owner, self.world, self.sim.backend_mut(), false);
        Ok(())
    }

    fn attached_shape_mut(&self) -> PhysicsResult<hecs::RefMut<'a, ColliderShape>> {
        let shape = self
            .component
            .collider_shape
            .ok_or(PhysicsError::MissingShape(self.owner))?;
        self.world
            .get_mut::<ColliderShape>(shape)
            .map_err(|_| PhysicsError::MissingShape(shape))
    }

    /// Whether the collision object is active in the simulation.
    pub fn is_active(&self) -> bool {
        match self.component.native() {
            Some(object) => self.sim.backend().is_active(object),
            None => false,
        }
    }

    pub fn set_mass(&mut self, mass: f32) -> PhysicsResult<()> {
        self.rigid_body_mut()?.set_mass(mass);
        self.refresh_rigid_body();
        Ok(())
    }

    pub fn set_kinematic(&mut self, is_kinematic: bool) -> PhysicsResult<()> {
        self.rigid_body_mut()?.set_kinematic(is_kinematic);
        self.refresh_rigid_body();
        Ok(())
    }

    fn rigid_body_mut(&mut self) -> PhysicsResult<&mut RigidBody> {
        let owner = self.owner;
        self.component
            .body
            .as_rigid_body_mut()
            .ok_or(PhysicsError::NotARigidBody(owner))
    }

    fn refresh_rigid_body(&mut self) {
        let Some(object) = self.component.native() else {
            return;
        };
        let shape = self
            .component
            .collider_shape
            .and_then(|entity| self.world.get::<ColliderShape>(entity).ok())
            .and_then(|shape| shape.native());

        let was_inserted = self.component.inserted;
        if was_inserted {
            self.component.remove_from_simulation(self.owner, self.sim);
        }
        if let Some(body) = self.component.body.as_rigid_body_mut() {
            body.apply_flags(self.sim.backend_mut(), object);
            body.update_mass_props(self.sim.backend_mut(), object, shape);
        }
        if was_inserted {
            self.component.add_to_simulation(self.owner, self.sim);
        }
    }

    fn character(&self) -> PhysicsResult<&CharacterController> {
        self.component
            .body
            .as_character()
            .ok_or(PhysicsError::NotACharacter(self.owner))
    }

    fn character_mut(&mut self) -> PhysicsResult<&mut CharacterController> {
        let owner = self.owner;
        self.component
            .body
            .as_character_mut()
            .ok_or(PhysicsError::NotACharacter(owner))
    }

    pub fn set_step_height(&mut self, value: f32) -> PhysicsResult<()> {
        if self.character_mut()?.set_step_height(value) {
            self.rebuild_character()?;
        }
        Ok(())
    }

    pub fn set_up_axis(&mut self, value: Vec3) -> PhysicsResult<()> {
        if self.character_mut()?.set_up_axis(value) {
            self.rebuild_character()?;
        }
        Ok(())
    }

    fn rebuild_character(&mut self) -> PhysicsResult<()> {
        let owner = self.owner;
        let object = self
            .component
            .native()
            .ok_or(PhysicsError::ControllerNotInitialized(owner))?;
        let shape_entity = self
            .component
            .collider_shape
            .ok_or(PhysicsError::MissingShape(owner))?;
        let native_shape = self
            .world
            .get::<ColliderShape>(shape_entity)
            .ok()
            .and_then(|shape| shape.native())
            .ok_or(PhysicsError::MissingShape(owner))?;

        let was_inserted = self.component.inserted;
        if was_inserted {
            self.component.remove_from_simulation(owner, self.sim);
        }
        if let Some(character) = self.component.body.as_character_mut() {
            character.rebuild(self.sim.backend_mut(), object, native_shape)?;
        }
        if was_inserted {
            self.component.add_to_simulation(owner, self.sim);
        }
        Ok(())
    }

    /// Degrees.
    pub fn set_max_slope(&mut self, degrees: f32) -> PhysicsResult<()> {
        let owner = self.owner;
        let character = self
            .component
            .body
            .as_character_mut()
            .ok_or(PhysicsError::NotACharacter(owner))?;
        character.set_max_slope(self.sim.backend_mut(), degrees);
        Ok(())
    }

    pub fn set_jump_speed(&mut self, value: f32) -> PhysicsResult<()> {
        let owner = self.owner;
        let character = self
            .component
            .body
            .as_character_mut()
            .ok_or(PhysicsError::NotACharacter(owner))?;
        character.set_jump_speed(self.sim.backend_mut(), value);
        Ok(())
    }

    pub fn set_fall_speed(&mut self, value: f32) -> PhysicsResult<()> {
        let owner = self.owner;
        let character = self
            .component
            .body
            .as_character_mut()
            .ok_or(PhysicsError::NotACharacter(owner))?;
        character.set_fall_speed(self.sim.backend_mut(), value);
        Ok(())
    }

    /// Engine space.
    pub fn set_gravity(&mut self, gravity: Vec3) -> PhysicsResult<()> {
        let owner = self.owner;
        let character = self
            .component
            .body
            .as_character_mut()
            .ok_or(PhysicsError::NotACharacter(owner))?;
        character.set_gravity(self.sim.backend_mut(), gravity);
        Ok(())
    }

    /// Displacement applied on every simulation step until changed.
    pub fn move_character(&mut self, movement: Vec3) -> PhysicsResult<()> {
        let owner = self.owner;
        let character = self
            .component
            .body
            .as_character()
            .ok_or(PhysicsError::NotACharacter(owner))?;
        character.move_character(self.sim.backend_mut(), owner, movement)
    }

    /// Jump with `velocity`, or with the configured jump speed when `None`.
    pub fn jump(&mut self, velocity: Option<Vec3>) -> PhysicsResult<()> {
        let owner = self.owner;
        let zero_jump = self.sim.config().zero_jump;
        let character = self
            .component
            .body
            .as_character()
            .ok_or(PhysicsError::NotACharacter(owner))?;
        character.jump(self.sim.backend_mut(), owner, velocity, zero_jump)
    }

    pub fn is_grounded(&self) -> PhysicsResult<bool> {
        Ok(self.character()?.is_grounded(self.sim.backend()))
    }
}
