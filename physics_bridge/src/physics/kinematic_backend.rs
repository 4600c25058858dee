//! Reference physics backend.
//!
//! A small in-process simulator good enough to drive the bridge end to end:
//! dynamic rigid bodies fall under world gravity and bounce off an optional
//! ground plane, kinematic characters follow their walk direction, jump,
//! fall with a clamped speed and land on the same plane. There is no
//! narrowphase; bodies do not collide with each other.

use super::error::{PhysicsError, PhysicsResult};
use super::flags::CollisionFlags;
use super::native::{PhysicsBackend, RawHandle, StepReport};
use super::shape::{effective_scale, ShapeKind, ShapeOrientation};
use crate::config::PhysicsConfig;
use glam::{Quat, Vec3};
use std::any::Any;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Counters exposed for inspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// Origin, rotation and shape-scale writes
    pub transform_writes: usize,
    pub rigid_body_adds: usize,
    pub rigid_body_removes: usize,
    pub character_adds: usize,
    pub character_removes: usize,
    pub characters_created: usize,
    pub objects_destroyed: usize,
}

#[derive(Debug, Clone)]
pub struct NativeShape {
    pub kind: ShapeKind,
    pub scale: Vec3,
}

/// Rigid body or ghost object.
#[derive(Debug, Clone)]
pub struct NativeObject {
    pub user_index: u64,
    pub ghost: bool,
    pub mass: f32,
    pub local_inertia: Vec3,
    pub shape: Option<RawHandle>,
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub restitution: f32,
    pub friction: f32,
    pub rolling_friction: f32,
    pub ccd_motion_threshold: f32,
    pub ccd_swept_sphere_radius: f32,
    pub flags: CollisionFlags,
    pub contact_processing_threshold: f32,
    pub in_world: bool,
    pub group: u32,
    pub mask: u32,
}

impl NativeObject {
    fn new(user_index: u64, ghost: bool, mass: f32) -> Self {
        Self {
            user_index,
            ghost,
            mass,
            local_inertia: Vec3::ZERO,
            shape: None,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            restitution: 0.0,
            friction: 0.5,
            rolling_friction: 0.0,
            ccd_motion_threshold: 0.0,
            ccd_swept_sphere_radius: 0.0,
            flags: CollisionFlags::NONE,
            contact_processing_threshold: 0.0,
            in_world: false,
            group: 0,
            mask: 0,
        }
    }

    fn is_dynamic(&self) -> bool {
        !self.ghost
            && self.mass > 0.0
            && !self.flags.contains(CollisionFlags::STATIC_OBJECT)
            && !self.flags.contains(CollisionFlags::KINEMATIC_OBJECT)
    }
}

/// Kinematic character paired with a ghost object.
#[derive(Debug, Clone)]
pub struct NativeCharacter {
    pub ghost: RawHandle,
    pub shape: RawHandle,
    pub step_height: f32,
    pub up_axis: Vec3,
    pub walk_direction: Vec3,
    pub fall_speed: f32,
    pub jump_speed: f32,
    pub max_slope: f32,
    pub gravity: Vec3,
    pub vertical_velocity: f32,
    pub on_ground: bool,
    pub in_world: bool,
    pub jump_count: usize,
}

#[derive(Debug, Clone)]
enum Entry {
    Shape(NativeShape),
    Object(NativeObject),
    Character(NativeCharacter),
}

/// In-process backend used by default and in tests.
#[derive(Debug)]
pub struct KinematicBackend {
    entries: HashMap<RawHandle, Entry>,
    next_handle: u32,
    gravity: Vec3,
    ground_height: Option<f32>,
    capacity: Option<usize>,
    stats: BackendStats,
}

impl Default for KinematicBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl KinematicBackend {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_handle: 1,
            gravity: Vec3::new(0.0, -10.0, 0.0),
            ground_height: None,
            capacity: None,
            stats: BackendStats::default(),
        }
    }

    /// Backend with the world gravity and ground plane from `config`.
    pub fn from_config(config: &PhysicsConfig) -> Self {
        let mut backend = Self::new();
        backend.gravity = super::coordinates::to_physics_direction(config.gravity);
        backend.ground_height = config.ground_height;
        backend
    }

    /// Horizontal ground plane at height `y`.
    pub fn with_ground(mut self, y: f32) -> Self {
        self.ground_height = Some(y);
        self
    }

    /// Fail allocations once `limit` native objects are alive.
    pub fn with_capacity_limit(mut self, limit: usize) -> Self {
        self.capacity = Some(limit);
        self
    }

    pub fn stats(&self) -> BackendStats {
        self.stats
    }

    pub fn live_objects(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, handle: RawHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn object(&self, handle: RawHandle) -> Option<&NativeObject> {
        match self.entries.get(&handle) {
            Some(Entry::Object(object)) => Some(object),
            _ => None,
        }
    }

    pub fn character(&self, handle: RawHandle) -> Option<&NativeCharacter> {
        match self.entries.get(&handle) {
            Some(Entry::Character(character)) => Some(character),
            _ => None,
        }
    }

    pub fn shape(&self, handle: RawHandle) -> Option<&NativeShape> {
        match self.entries.get(&handle) {
            Some(Entry::Shape(shape)) => Some(shape),
            _ => None,
        }
    }

    /// Objects currently in the world, rigid bodies and ghosts alike.
    pub fn objects_in_world(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| matches!(entry, Entry::Object(object) if object.in_world))
            .count()
    }

    fn allocate(&mut self, entry: Entry, what: &str) -> PhysicsResult<RawHandle> {
        if let Some(limit) = self.capacity {
            if self.entries.len() >= limit {
                return Err(PhysicsError::NativeAllocation(what.to_string()));
            }
        }
        let handle = RawHandle(self.next_handle);
        self.next_handle = self
            .next_handle
            .checked_add(1)
            .ok_or_else(|| PhysicsError::NativeAllocation(what.to_string()))?;
        self.entries.insert(handle, entry);
        trace!(handle = ?handle, kind = what, "Allocated native object");
        Ok(handle)
    }

    fn object_mut(&mut self, handle: RawHandle, op: &str) -> Option<&mut NativeObject> {
        match self.entries.get_mut(&handle) {
            Some(Entry::Object(object)) => Some(object),
            _ => {
                warn!(handle = ?handle, op, "Unknown native collision object");
                None
            }
        }
    }

    fn character_mut(&mut self, handle: RawHandle, op: &str) -> Option<&mut NativeCharacter> {
        match self.entries.get_mut(&handle) {
            Some(Entry::Character(character)) => Some(character),
            _ => {
                warn!(handle = ?handle, op, "Unknown native character");
                None
            }
        }
    }

    /// Half extent of a collision object's shape along physics +Y.
    fn half_height(&self, shape: Option<RawHandle>) -> f32 {
        match shape.and_then(|handle| self.shape(handle)) {
            Some(shape) => half_height_of(&shape.kind) * shape.scale.y.abs(),
            None => 0.0,
        }
    }

    fn step_rigid_bodies(&mut self, dt: f32, report: &mut StepReport) {
        let handles: Vec<RawHandle> = self
            .entries
            .iter()
            .filter_map(|(handle, entry)| match entry {
                Entry::Object(object) if object.in_world && object.is_dynamic() => Some(*handle),
                _ => None,
            })
            .collect();

        for handle in handles {
            let half = match self.object(handle) {
                Some(object) => self.half_height(object.shape),
                None => continue,
            };
            let gravity = self.gravity;
            let ground = self.ground_height;
            let Some(object) = self.object_mut(handle, "step") else {
                continue;
            };

            let before = object.position;
            object.linear_velocity += gravity * dt;
            object.position += object.linear_velocity * dt;

            if let Some(ground) = ground {
                if object.position.y - half < ground {
                    object.position.y = ground + half;
                    let bounce = -object.linear_velocity.y * object.restitution;
                    object.linear_velocity.y = if bounce.abs() < 1e-3 { 0.0 } else { bounce };
                }
            }

            if object.position != before {
                report.moved.push(object.user_index);
            }
        }
    }

    fn step_characters(&mut self, dt: f32) {
        let handles: Vec<RawHandle> = self
            .entries
            .iter()
            .filter_map(|(handle, entry)| match entry {
                Entry::Character(character) if character.in_world => Some(*handle),
                _ => None,
            })
            .collect();

        for handle in handles {
            let Some(character) = self.character(handle).cloned() else {
                continue;
            };
            let Some(ghost) = self.object(character.ghost) else {
                warn!(handle = ?handle, "Character ghost object is gone");
                continue;
            };
            let half = self.half_height(Some(character.shape));
            let mut position = ghost.position + character.walk_direction;

            let up = character.up_axis.normalize_or(Vec3::Y);
            let gravity = (-character.gravity.dot(up)).max(0.0);
            let mut vertical_velocity = character.vertical_velocity - gravity * dt;
            vertical_velocity = vertical_velocity.max(-character.fall_speed);
            position += up * vertical_velocity * dt;

            let mut on_ground = false;
            if let Some(ground) = self.ground_height {
                if position.y - half <= ground {
                    position.y = ground + half;
                    if vertical_velocity < 0.0 {
                        vertical_velocity = 0.0;
                    }
                    on_ground = vertical_velocity <= 0.0;
                }
            }

            if let Some(ghost) = self.object_mut(character.ghost, "step") {
                ghost.position = position;
            }
            if let Some(character) = self.character_mut(handle, "step") {
                character.vertical_velocity = vertical_velocity;
                character.on_ground = on_ground;
            }
        }
    }
}

fn half_height_of(kind: &ShapeKind) -> f32 {
    match kind {
        ShapeKind::Box { size } => size.y * 0.5,
        ShapeKind::Sphere { radius } => *radius,
        ShapeKind::Capsule {
            radius,
            height,
            orientation,
        }
        | ShapeKind::Cone {
            radius,
            height,
            orientation,
        }
        | ShapeKind::Cylinder {
            radius,
            height,
            orientation,
        } => {
            if *orientation == ShapeOrientation::UpY {
                height * 0.5
            } else {
                *radius
            }
        }
        ShapeKind::Mesh { .. } => 0.0,
        ShapeKind::Compound { children } => children
            .iter()
            .map(|child| -child.local_offset.y + half_height_of(&child.kind))
            .fold(0.0, f32::max),
    }
}

impl PhysicsBackend for KinematicBackend {
    fn create_shape(&mut self, kind: &ShapeKind) -> PhysicsResult<RawHandle> {
        self.allocate(
            Entry::Shape(NativeShape {
                kind: kind.clone(),
                scale: Vec3::ONE,
            }),
            "shape",
        )
    }

    fn set_shape_scale(&mut self, shape: RawHandle, scale: Vec3) {
        match self.entries.get_mut(&shape) {
            Some(Entry::Shape(native)) => {
                let (effective, _) = effective_scale(&native.kind, scale);
                native.scale = effective;
                self.stats.transform_writes += 1;
            }
            _ => warn!(handle = ?shape, "Unknown native shape"),
        }
    }

    fn create_rigid_body(&mut self, user_index: u64, mass: f32) -> PhysicsResult<RawHandle> {
        self.allocate(
            Entry::Object(NativeObject::new(user_index, false, mass)),
            "rigid body",
        )
    }

    fn create_ghost_object(&mut self, user_index: u64) -> PhysicsResult<RawHandle> {
        self.allocate(
            Entry::Object(NativeObject::new(user_index, true, 0.0)),
            "ghost object",
        )
    }

    fn create_character(
        &mut self,
        ghost: RawHandle,
        shape: RawHandle,
        step_height: f32,
        up_axis: Vec3,
    ) -> PhysicsResult<RawHandle> {
        if self.object(ghost).is_none() || self.shape(shape).is_none() {
            return Err(PhysicsError::NativeAllocation(format!(
                "character for ghost {ghost:?} with shape {shape:?}"
            )));
        }
        let handle = self.allocate(
            Entry::Character(NativeCharacter {
                ghost,
                shape,
                step_height,
                up_axis,
                walk_direction: Vec3::ZERO,
                fall_speed: 55.0,
                jump_speed: 10.0,
                max_slope: 45f32.to_radians(),
                gravity: up_axis * -29.4,
                vertical_velocity: 0.0,
                on_ground: false,
                in_world: false,
                jump_count: 0,
            }),
            "character",
        )?;
        self.stats.characters_created += 1;
        Ok(handle)
    }

    fn destroy(&mut self, handle: RawHandle) {
        match self.entries.remove(&handle) {
            Some(entry) => {
                let in_world = match &entry {
                    Entry::Object(object) => object.in_world,
                    Entry::Character(character) => character.in_world,
                    Entry::Shape(_) => false,
                };
                if in_world {
                    warn!(handle = ?handle, "Destroyed native object that was still in the world");
                }
                self.stats.objects_destroyed += 1;
                trace!(handle = ?handle, "Destroyed native object");
            }
            None => warn!(handle = ?handle, "Destroy of unknown native object"),
        }
    }

    fn set_collision_shape(&mut self, object: RawHandle, shape: RawHandle) {
        if self.shape(shape).is_none() {
            warn!(handle = ?shape, "Unknown native shape");
            return;
        }
        if let Some(object) = self.object_mut(object, "set_collision_shape") {
            object.shape = Some(shape);
        }
    }

    fn set_restitution(&mut self, object: RawHandle, value: f32) {
        if let Some(object) = self.object_mut(object, "set_restitution") {
            object.restitution = value;
        }
    }

    fn set_friction(&mut self, object: RawHandle, value: f32) {
        if let Some(object) = self.object_mut(object, "set_friction") {
            object.friction = value;
        }
    }

    fn set_rolling_friction(&mut self, object: RawHandle, value: f32) {
        if let Some(object) = self.object_mut(object, "set_rolling_friction") {
            object.rolling_friction = value;
        }
    }

    fn set_ccd_motion_threshold(&mut self, object: RawHandle, value: f32) {
        if let Some(object) = self.object_mut(object, "set_ccd_motion_threshold") {
            object.ccd_motion_threshold = value;
        }
    }

    fn set_ccd_swept_sphere_radius(&mut self, object: RawHandle, value: f32) {
        if let Some(object) = self.object_mut(object, "set_ccd_swept_sphere_radius") {
            object.ccd_swept_sphere_radius = value;
        }
    }

    fn collision_flags(&self, object: RawHandle) -> CollisionFlags {
        self.object(object)
            .map(|object| object.flags)
            .unwrap_or_default()
    }

    fn set_collision_flags(&mut self, object: RawHandle, flags: CollisionFlags) {
        if let Some(object) = self.object_mut(object, "set_collision_flags") {
            object.flags = flags;
        }
    }

    fn set_contact_processing_threshold(&mut self, object: RawHandle, value: f32) {
        if let Some(object) = self.object_mut(object, "set_contact_processing_threshold") {
            object.contact_processing_threshold = value;
        }
    }

    fn is_active(&self, object: RawHandle) -> bool {
        self.object(object).is_some_and(|object| object.in_world)
    }

    fn world_transform(&self, object: RawHandle) -> (Vec3, Quat) {
        match self.object(object) {
            Some(object) => (object.position, object.rotation),
            None => {
                warn!(handle = ?object, "Unknown native collision object");
                (Vec3::ZERO, Quat::IDENTITY)
            }
        }
    }

    fn set_world_origin(&mut self, object: RawHandle, origin: Vec3) {
        if let Some(object) = self.object_mut(object, "set_world_origin") {
            object.position = origin;
            self.stats.transform_writes += 1;
        }
    }

    fn set_world_rotation(&mut self, object: RawHandle, rotation: Quat) {
        if let Some(object) = self.object_mut(object, "set_world_rotation") {
            object.rotation = rotation;
            self.stats.transform_writes += 1;
        }
    }

    fn calculate_local_inertia(&mut self, shape: RawHandle, mass: f32) -> Vec3 {
        let Some(shape) = self.shape(shape) else {
            warn!(handle = ?shape, "Unknown native shape");
            return Vec3::ZERO;
        };
        // Solid sphere approximation over the shape's vertical extent
        let radius = half_height_of(&shape.kind) * shape.scale.max_element().abs();
        Vec3::splat(0.4 * mass * radius * radius)
    }

    fn set_mass_props(&mut self, object: RawHandle, mass: f32, inertia: Vec3) {
        if let Some(object) = self.object_mut(object, "set_mass_props") {
            object.mass = mass;
            object.local_inertia = inertia;
        }
    }

    fn add_rigid_body(&mut self, object: RawHandle, group: u32, mask: u32) {
        if let Some(object) = self.object_mut(object, "add_rigid_body") {
            object.in_world = true;
            object.group = group;
            object.mask = mask;
            self.stats.rigid_body_adds += 1;
        }
    }

    fn remove_rigid_body(&mut self, object: RawHandle) {
        if let Some(object) = self.object_mut(object, "remove_rigid_body") {
            object.in_world = false;
            object.linear_velocity = Vec3::ZERO;
            self.stats.rigid_body_removes += 1;
        }
    }

    fn add_character(&mut self, character: RawHandle, group: u32, mask: u32) {
        let Some(native) = self.character_mut(character, "add_character") else {
            return;
        };
        native.in_world = true;
        let ghost = native.ghost;
        if let Some(ghost) = self.object_mut(ghost, "add_character") {
            ghost.in_world = true;
            ghost.group = group;
            ghost.mask = mask;
        }
        self.stats.character_adds += 1;
    }

    fn remove_character(&mut self, character: RawHandle) {
        let Some(native) = self.character_mut(character, "remove_character") else {
            return;
        };
        native.in_world = false;
        let ghost = native.ghost;
        if let Some(ghost) = self.object_mut(ghost, "remove_character") {
            ghost.in_world = false;
        }
        self.stats.character_removes += 1;
    }

    fn set_walk_direction(&mut self, character: RawHandle, direction: Vec3) {
        if let Some(character) = self.character_mut(character, "set_walk_direction") {
            character.walk_direction = direction;
        }
    }

    fn jump(&mut self, character: RawHandle, velocity: Vec3) {
        if let Some(character) = self.character_mut(character, "jump") {
            character.vertical_velocity = if velocity == Vec3::ZERO {
                character.jump_speed
            } else {
                velocity.length()
            };
            character.on_ground = false;
            character.jump_count += 1;
        }
    }

    fn set_fall_speed(&mut self, character: RawHandle, value: f32) {
        if let Some(character) = self.character_mut(character, "set_fall_speed") {
            character.fall_speed = value;
        }
    }

    fn set_jump_speed(&mut self, character: RawHandle, value: f32) {
        if let Some(character) = self.character_mut(character, "set_jump_speed") {
            character.jump_speed = value;
        }
    }

    fn set_max_slope(&mut self, character: RawHandle, radians: f32) {
        if let Some(character) = self.character_mut(character, "set_max_slope") {
            character.max_slope = radians;
        }
    }

    fn set_character_gravity(&mut self, character: RawHandle, gravity: Vec3) {
        if let Some(character) = self.character_mut(character, "set_character_gravity") {
            character.gravity = gravity;
        }
    }

    fn on_ground(&self, character: RawHandle) -> bool {
        self.character(character)
            .is_some_and(|character| character.on_ground)
    }

    fn set_world_gravity(&mut self, gravity: Vec3) {
        debug!(gravity = ?gravity, "Set world gravity");
        self.gravity = gravity;
    }

    fn step(&mut self, dt: f32) -> StepReport {
        let mut report = StepReport::default();
        if dt <= 0.0 {
            return report;
        }
        self.step_rigid_bodies(dt, &mut report);
        self.step_characters(dt);
        trace!(dt, moved = report.moved.len(), "Kinematic backend step");
        report
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
