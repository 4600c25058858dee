//! Kinematic character controller.
//!
//! A character is a ghost object (the component's collision object) paired
//! with a native kinematic character. The native character is built from
//! the step height, up axis and shape, so changing any of them tears it down
//! and builds a new one; the remaining tunables are replayed afterwards.

use super::body::{BodyCategory, SimulationMember};
use super::coordinates::{slope_degrees_to_radians, to_physics_direction};
use super::error::{PhysicsError, PhysicsResult};
use super::flags::CollisionFlags;
use super::native::{NativeHandle, PhysicsBackend, RawHandle};
use super::shape::ColliderShape;
use crate::config::ZeroJumpBehavior;
use glam::Vec3;
use hecs::Entity;
use tracing::{debug, trace, warn};

/// Lifecycle of the native character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterState {
    /// No ghost object or no shape yet.
    Unbuilt,
    Built,
    /// Native character torn down, new one not created yet.
    Rebuilding,
    Destroyed,
}

#[derive(Debug)]
pub struct CharacterController {
    step_height: f32,
    up_axis: Vec3,
    max_slope: f32,
    jump_speed: f32,
    fall_speed: f32,
    gravity: Vec3,
    native_character: Option<NativeHandle>,
    state: CharacterState,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self::new(0.1, Vec3::Y)
    }
}

impl CharacterController {
    pub fn new(step_height: f32, up_axis: Vec3) -> Self {
        Self {
            step_height,
            up_axis,
            max_slope: 45.0,
            jump_speed: 10.0,
            fall_speed: 55.0,
            gravity: Vec3::new(0.0, -9.8 * 3.0, 0.0),
            native_character: None,
            state: CharacterState::Unbuilt,
        }
    }

    pub fn with_max_slope(mut self, degrees: f32) -> Self {
        self.max_slope = degrees;
        self
    }

    pub fn with_jump_speed(mut self, speed: f32) -> Self {
        self.jump_speed = speed;
        self
    }

    pub fn with_fall_speed(mut self, speed: f32) -> Self {
        self.fall_speed = speed;
        self
    }

    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn step_height(&self) -> f32 {
        self.step_height
    }

    pub fn up_axis(&self) -> Vec3 {
        self.up_axis
    }

    /// Degrees.
    pub fn max_slope(&self) -> f32 {
        self.max_slope
    }

    pub fn jump_speed(&self) -> f32 {
        self.jump_speed
    }

    pub fn fall_speed(&self) -> f32 {
        self.fall_speed
    }

    /// Engine space.
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    pub fn state(&self) -> CharacterState {
        self.state
    }

    pub fn native_character(&self) -> Option<RawHandle> {
        self.native_character.as_ref().map(NativeHandle::raw)
    }

    fn built(&self) -> Option<RawHandle> {
        match self.state {
            CharacterState::Built => self.native_character(),
            _ => None,
        }
    }

    /// Tear down any native character and build a new one against `ghost`.
    pub(crate) fn rebuild(
        &mut self,
        backend: &mut dyn PhysicsBackend,
        ghost: RawHandle,
        shape: RawHandle,
    ) -> PhysicsResult<()> {
        if let Some(previous) = self.native_character.take() {
            self.state = CharacterState::Rebuilding;
            previous.destroy(backend);
        }

        // The up axis is an engine-space direction and is mirrored like one
        let raw = backend.create_character(
            ghost,
            shape,
            self.step_height,
            to_physics_direction(self.up_axis),
        )?;
        self.native_character = Some(NativeHandle::new(raw));
        self.replay(backend, raw);
        self.state = CharacterState::Built;
        debug!(character = ?raw, step_height = self.step_height, "Built native character");
        Ok(())
    }

    fn replay(&self, backend: &mut dyn PhysicsBackend, raw: RawHandle) {
        backend.set_fall_speed(raw, self.fall_speed);
        backend.set_max_slope(raw, slope_degrees_to_radians(self.max_slope));
        backend.set_jump_speed(raw, self.jump_speed);
        backend.set_character_gravity(raw, to_physics_direction(self.gravity));
    }

    /// Returns true when the native character has to be rebuilt.
    pub(crate) fn set_step_height(&mut self, value: f32) -> bool {
        self.step_height = value;
        self.state == CharacterState::Built
    }

    /// Returns true when the native character has to be rebuilt.
    pub(crate) fn set_up_axis(&mut self, value: Vec3) -> bool {
        self.up_axis = value;
        self.state == CharacterState::Built
    }

    pub(crate) fn set_max_slope(&mut self, backend: &mut dyn PhysicsBackend, degrees: f32) {
        self.max_slope = degrees;
        if let Some(raw) = self.built() {
            backend.set_max_slope(raw, slope_degrees_to_radians(degrees));
        }
    }

    pub(crate) fn set_jump_speed(&mut self, backend: &mut dyn PhysicsBackend, value: f32) {
        self.jump_speed = value;
        if let Some(raw) = self.built() {
            backend.set_jump_speed(raw, value);
        }
    }

    pub(crate) fn set_fall_speed(&mut self, backend: &mut dyn PhysicsBackend, value: f32) {
        self.fall_speed = value;
        if let Some(raw) = self.built() {
            backend.set_fall_speed(raw, value);
        }
    }

    pub(crate) fn set_gravity(&mut self, backend: &mut dyn PhysicsBackend, value: Vec3) {
        self.gravity = value;
        if let Some(raw) = self.built() {
            backend.set_character_gravity(raw, to_physics_direction(value));
        }
    }

    /// Per-step displacement, engine space.
    pub(crate) fn move_character(
        &self,
        backend: &mut dyn PhysicsBackend,
        owner: Entity,
        movement: Vec3,
    ) -> PhysicsResult<()> {
        let raw = self
            .built()
            .ok_or(PhysicsError::ControllerNotInitialized(owner))?;
        backend.set_walk_direction(raw, to_physics_direction(movement));
        trace!(entity = ?owner, movement = ?movement, "Character walk direction");
        Ok(())
    }

    pub(crate) fn jump(
        &self,
        backend: &mut dyn PhysicsBackend,
        owner: Entity,
        velocity: Option<Vec3>,
        zero_jump: ZeroJumpBehavior,
    ) -> PhysicsResult<()> {
        let raw = self
            .built()
            .ok_or(PhysicsError::ControllerNotInitialized(owner))?;
        match (velocity, zero_jump) {
            (Some(velocity), _) => backend.jump(raw, to_physics_direction(velocity)),
            (None, ZeroJumpBehavior::PassZeroVector) => backend.jump(raw, Vec3::ZERO),
            (None, ZeroJumpBehavior::Skip) => {
                trace!(entity = ?owner, "Jump without velocity skipped");
            }
        }
        Ok(())
    }

    pub(crate) fn is_grounded(&self, backend: &dyn PhysicsBackend) -> bool {
        self.built().is_some_and(|raw| backend.on_ground(raw))
    }

    pub fn duplicate(&self) -> Self {
        Self::new(self.step_height, self.up_axis)
            .with_max_slope(self.max_slope)
            .with_jump_speed(self.jump_speed)
            .with_fall_speed(self.fall_speed)
            .with_gravity(self.gravity)
    }
}

impl SimulationMember for CharacterController {
    fn category(&self) -> BodyCategory {
        BodyCategory::Character
    }

    fn create_native(
        &mut self,
        backend: &mut dyn PhysicsBackend,
        user_index: u64,
    ) -> PhysicsResult<NativeHandle> {
        let raw = backend.create_ghost_object(user_index)?;
        backend.set_collision_flags(raw, CollisionFlags::CHARACTER_OBJECT);
        Ok(NativeHandle::new(raw))
    }

    fn insert(&mut self, backend: &mut dyn PhysicsBackend, _object: RawHandle, group: u32, mask: u32) {
        match self.native_character() {
            Some(raw) => backend.add_character(raw, group, mask),
            None => warn!("Character inserted without a native character"),
        }
    }

    fn remove(&mut self, backend: &mut dyn PhysicsBackend, _object: RawHandle) {
        if let Some(raw) = self.native_character() {
            backend.remove_character(raw);
        }
    }

    fn on_shape_change(
        &mut self,
        backend: &mut dyn PhysicsBackend,
        object: RawHandle,
        shape: &ColliderShape,
    ) -> PhysicsResult<()> {
        match shape.native() {
            Some(native_shape) => self.rebuild(backend, object, native_shape),
            None => {
                warn!(object = ?object, "Character shape has no native shape");
                Ok(())
            }
        }
    }

    fn destroy_native(&mut self, backend: &mut dyn PhysicsBackend) {
        if let Some(native) = self.native_character.take() {
            native.destroy(backend);
        }
        self.state = CharacterState::Destroyed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::kinematic_backend::KinematicBackend;

    fn built_character(backend: &mut KinematicBackend) -> (CharacterController, NativeHandle, ColliderShape) {
        let mut shape = ColliderShape::capsule(0.5, 2.0);
        shape.ensure_native(backend).unwrap();
        let mut character = CharacterController::default();
        let ghost = character.create_native(backend, 42).unwrap();
        character.on_shape_change(backend, ghost.raw(), &shape).unwrap();
        (character, ghost, shape)
    }

    #[test]
    fn test_defaults() {
        let character = CharacterController::default();
        assert_eq!(character.step_height(), 0.1);
        assert_eq!(character.up_axis(), Vec3::Y);
        assert_eq!(character.max_slope(), 45.0);
        assert_eq!(character.jump_speed(), 10.0);
        assert_eq!(character.fall_speed(), 55.0);
        assert!((character.gravity().y + 29.4).abs() < 1e-5);
        assert_eq!(character.state(), CharacterState::Unbuilt);
    }

    #[test]
    fn test_ghost_has_character_flag() {
        let mut backend = KinematicBackend::new();
        let mut character = CharacterController::default();
        let ghost = character.create_native(&mut backend, 9).unwrap();

        let object = backend.object(ghost.raw()).unwrap();
        assert!(object.ghost);
        assert_eq!(object.user_index, 9);
        assert!(object.flags.contains(CollisionFlags::CHARACTER_OBJECT));
        ghost.destroy(&mut backend);
    }

    #[test]
    fn test_build_replays_tunables() {
        let mut backend = KinematicBackend::new();
        let mut shape = ColliderShape::capsule(0.5, 2.0);
        shape.ensure_native(&mut backend).unwrap();

        let mut character = CharacterController::default()
            .with_fall_speed(12.0)
            .with_max_slope(30.0)
            .with_gravity(Vec3::new(1.0, -5.0, 0.0));
        let ghost = character.create_native(&mut backend, 1).unwrap();
        character.on_shape_change(&mut backend, ghost.raw(), &shape).unwrap();

        let native = backend.character(character.native_character().unwrap()).unwrap();
        assert_eq!(native.fall_speed, 12.0);
        assert!((native.max_slope - 30f32.to_radians()).abs() < 1e-6);
        assert_eq!(native.gravity, Vec3::new(-1.0, -5.0, 0.0));
        assert_eq!(character.state(), CharacterState::Built);
    }

    #[test]
    fn test_unbuilt_rejects_movement() {
        let mut backend = KinematicBackend::new();
        let owner = hecs::World::new().spawn(());
        let character = CharacterController::default();

        assert!(matches!(
            character.move_character(&mut backend, owner, Vec3::X),
            Err(PhysicsError::ControllerNotInitialized(_))
        ));
        assert!(matches!(
            character.jump(&mut backend, owner, None, ZeroJumpBehavior::PassZeroVector),
            Err(PhysicsError::ControllerNotInitialized(_))
        ));
        assert!(!character.is_grounded(&backend));
    }

    #[test]
    fn test_move_flips_x() {
        let mut backend = KinematicBackend::new();
        let owner = hecs::World::new().spawn(());
        let (mut character, ghost, mut shape) = built_character(&mut backend);

        character
            .move_character(&mut backend, owner, Vec3::new(1.0, 0.0, 2.0))
            .unwrap();
        let native = backend.character(character.native_character().unwrap()).unwrap();
        assert_eq!(native.walk_direction, Vec3::new(-1.0, 0.0, 2.0));

        character.destroy_native(&mut backend);
        ghost.destroy(&mut backend);
        shape.destroy_native(&mut backend);
        assert_eq!(character.state(), CharacterState::Destroyed);
    }

    #[test]
    fn test_zero_jump_behaviors() {
        let mut backend = KinematicBackend::new();
        let owner = hecs::World::new().spawn(());
        let (mut character, ghost, mut shape) = built_character(&mut backend);
        let raw = character.native_character().unwrap();

        character
            .jump(&mut backend, owner, None, ZeroJumpBehavior::Skip)
            .unwrap();
        assert_eq!(backend.character(raw).unwrap().jump_count, 0);

        character
            .jump(&mut backend, owner, None, ZeroJumpBehavior::PassZeroVector)
            .unwrap();
        let native = backend.character(raw).unwrap();
        assert_eq!(native.jump_count, 1);
        assert_eq!(native.vertical_velocity, character.jump_speed());

        character.destroy_native(&mut backend);
        ghost.destroy(&mut backend);
        shape.destroy_native(&mut backend);
    }

    #[test]
    fn test_setters_forward_only_when_built() {
        let mut backend = KinematicBackend::new();
        let mut character = CharacterController::default();
        character.set_jump_speed(&mut backend, 4.0);
        assert_eq!(character.jump_speed(), 4.0);
        assert!(!character.set_step_height(0.3));

        let (mut character, ghost, mut shape) = built_character(&mut backend);
        character.set_jump_speed(&mut backend, 4.0);
        let raw = character.native_character().unwrap();
        assert_eq!(backend.character(raw).unwrap().jump_speed, 4.0);
        assert!(character.set_up_axis(Vec3::Z));

        character.destroy_native(&mut backend);
        ghost.destroy(&mut backend);
        shape.destroy_native(&mut backend);
    }
}
