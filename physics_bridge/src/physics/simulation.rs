//! Physics simulation: owns the backend and the per-step bookkeeping.
//!
//! The simulation keeps per-category lists of the owners currently inserted,
//! the list of owners whose transform must be pushed before the next step,
//! and an explicit tracking flag that is off while physics results are
//! written back, so those writes do not schedule new pushes.

use super::accumulator::PhysicsAccumulator;
use super::body::BodyCategory;
use super::component::{ComponentMut, PhysicsComponent};
use super::coordinates::to_physics_direction;
use super::error::{PhysicsError, PhysicsResult};
use super::kinematic_backend::KinematicBackend;
use super::native::{PhysicsBackend, StepReport};
use super::shape::ColliderShape;
use crate::config::PhysicsConfig;
use crate::core::entity::{TransformFlags, World};
use hecs::Entity;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, info, trace, warn};

static NEXT_SIMULATION_ID: AtomicU32 = AtomicU32::new(1);

/// Identifies the simulation a component has joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimulationId(u32);

pub struct PhysicsSimulation {
    id: SimulationId,
    backend: Box<dyn PhysicsBackend>,
    config: PhysicsConfig,
    accumulator: PhysicsAccumulator,
    rigid_bodies: Vec<Entity>,
    characters: Vec<Entity>,
    pending_sync: Vec<Entity>,
    tracking_enabled: bool,
}

impl PhysicsSimulation {
    /// Simulation running on the reference [`KinematicBackend`].
    pub fn new(config: PhysicsConfig) -> Self {
        let backend = KinematicBackend::from_config(&config);
        Self::with_backend(config, Box::new(backend))
    }

    pub fn with_backend(config: PhysicsConfig, mut backend: Box<dyn PhysicsBackend>) -> Self {
        backend.set_world_gravity(to_physics_direction(config.gravity));
        let id = SimulationId(NEXT_SIMULATION_ID.fetch_add(1, Ordering::Relaxed));
        info!(
            simulation = ?id,
            fixed_timestep = config.fixed_timestep,
            max_substeps = config.max_substeps,
            "Created physics simulation"
        );
        Self {
            id,
            backend,
            accumulator: PhysicsAccumulator::new(config.fixed_timestep, config.max_substeps),
            config,
            rigid_bodies: Vec::new(),
            characters: Vec::new(),
            pending_sync: Vec::new(),
            tracking_enabled: true,
        }
    }

    pub fn id(&self) -> SimulationId {
        self.id
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn PhysicsBackend {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn PhysicsBackend {
        self.backend.as_mut()
    }

    /// Concrete backend, when it is a `T`.
    pub fn backend_as<T: PhysicsBackend>(&self) -> Option<&T> {
        self.backend.as_any().downcast_ref::<T>()
    }

    pub fn backend_as_mut<T: PhysicsBackend>(&mut self) -> Option<&mut T> {
        self.backend.as_any_mut().downcast_mut::<T>()
    }

    pub fn accumulator(&self) -> &PhysicsAccumulator {
        &self.accumulator
    }

    /// Owners of rigid bodies currently inserted.
    pub fn rigid_bodies(&self) -> &[Entity] {
        &self.rigid_bodies
    }

    /// Owners of characters currently inserted.
    pub fn characters(&self) -> &[Entity] {
        &self.characters
    }

    /// Owners waiting for their transform to be pushed.
    pub fn pending_sync(&self) -> &[Entity] {
        &self.pending_sync
    }

    pub fn is_tracking_enabled(&self) -> bool {
        self.tracking_enabled
    }

    pub(crate) fn register(&mut self, category: BodyCategory, owner: Entity) {
        let list = match category {
            BodyCategory::RigidBody => &mut self.rigid_bodies,
            BodyCategory::Character => &mut self.characters,
        };
        if !list.contains(&owner) {
            list.push(owner);
        }
    }

    pub(crate) fn unregister(&mut self, category: BodyCategory, owner: Entity) {
        let list = match category {
            BodyCategory::RigidBody => &mut self.rigid_bodies,
            BodyCategory::Character => &mut self.characters,
        };
        list.retain(|entity| *entity != owner);
    }

    pub(crate) fn drop_pending(&mut self, owner: Entity) {
        self.pending_sync.retain(|entity| *entity != owner);
    }

    /// Owner entity of a native object's user index.
    pub fn resolve(&self, world: &World, user_index: u64) -> Option<Entity> {
        Entity::from_bits(user_index).filter(|entity| world.contains(*entity))
    }

    pub fn component_mut<'a>(
        &'a mut self,
        world: &'a World,
        owner: Entity,
    ) -> PhysicsResult<ComponentMut<'a>> {
        let component = world
            .get_mut::<PhysicsComponent>(owner)
            .map_err(|_| PhysicsError::MissingComponent(owner))?;
        Ok(ComponentMut {
            owner,
            world,
            sim: self,
            component,
        })
    }

    /// The owner entered a scene driven by this simulation.
    pub fn add_to_scene(&mut self, world: &World, owner: Entity) -> PhysicsResult<()> {
        let mut component = world
            .get_mut::<PhysicsComponent>(owner)
            .map_err(|_| PhysicsError::MissingComponent(owner))?;
        if component.is_in_scene() {
            return Ok(());
        }
        component.set_in_scene(true);
        component.on_added(owner, world, self.backend.as_mut())?;
        if component.is_enabled() {
            component.enable(owner, world, self)?;
        }
        debug!(entity = ?owner, inserted = component.is_in_simulation(), "Physics component added to scene");
        Ok(())
    }

    /// The owner left the scene. The collision object is kept for re-addition.
    pub fn remove_from_scene(&mut self, world: &World, owner: Entity) -> PhysicsResult<()> {
        let mut component = world
            .get_mut::<PhysicsComponent>(owner)
            .map_err(|_| PhysicsError::MissingComponent(owner))?;
        if !component.is_in_scene() {
            return Ok(());
        }
        if component.simulation().is_some() {
            component.disable(owner, self);
        }
        component.set_in_scene(false);
        debug!(entity = ?owner, "Physics component removed from scene");
        Ok(())
    }

    /// Remove the component from its owner and free every native object it
    /// owns, its shape included. A separate shape entity is despawned.
    pub fn destroy_component(&mut self, world: &mut World, owner: Entity) -> PhysicsResult<()> {
        let mut component = world
            .remove_one::<PhysicsComponent>(owner)
            .map_err(|_| PhysicsError::MissingComponent(owner))?;

        if component.simulation().is_some() {
            component.disable(owner, self);
        }
        component.body_mut().member_mut().destroy_native(self.backend.as_mut());
        if let Some(native) = component.take_native() {
            native.destroy(self.backend.as_mut());
        }
        if let Some(shape_entity) = component.take_shape() {
            match world.remove_one::<ColliderShape>(shape_entity) {
                Ok(mut shape) => {
                    shape.detach();
                    shape.destroy_native(self.backend.as_mut());
                    // A shape living on the owner itself leaves the owner in place
                    if shape_entity != owner {
                        if let Err(err) = world.despawn(shape_entity) {
                            warn!(entity = ?owner, shape = ?shape_entity, %err, "Failed to despawn collider shape entity");
                        }
                    }
                }
                Err(_) => warn!(entity = ?owner, shape = ?shape_entity, "Collider shape entity is gone"),
            }
        }
        debug!(entity = ?owner, "Destroyed physics component");
        Ok(())
    }

    /// Give `dst` a new component with the settings of the one on `src` and a
    /// copy of its shape. The copy is not in any scene yet.
    pub fn clone_component(
        &mut self,
        world: &mut World,
        src: Entity,
        dst: Entity,
    ) -> PhysicsResult<()> {
        if world.get::<PhysicsComponent>(dst).is_ok() {
            return Err(PhysicsError::ComponentExists(dst));
        }

        let (mut copy, shape_copy) = {
            let source = world
                .get::<PhysicsComponent>(src)
                .map_err(|_| PhysicsError::MissingComponent(src))?;
            let shape_copy = match source.collider_shape() {
                Some(shape_entity) => Some(
                    world
                        .get::<ColliderShape>(shape_entity)
                        .map_err(|_| PhysicsError::MissingShape(src))?
                        .duplicate(),
                ),
                None => None,
            };
            (source.duplicate_settings(), shape_copy)
        };

        if let Some(mut shape) = shape_copy {
            shape.attach(dst);
            let shape_entity = world.spawn((shape,));
            copy.attach_shape_unchecked(shape_entity);
        }
        world
            .insert_one(dst, copy)
            .map_err(|_| PhysicsError::MissingComponent(dst))?;
        debug!(source = ?src, target = ?dst, "Cloned physics component");
        Ok(())
    }

    /// Record a transform change of `owner`. Ignored while tracking is off.
    pub fn on_owner_transform_changed(
        &mut self,
        world: &World,
        owner: Entity,
        flags: TransformFlags,
    ) {
        if !self.tracking_enabled {
            return;
        }
        let Ok(mut component) = world.get_mut::<PhysicsComponent>(owner) else {
            return;
        };
        if component.on_owner_transform_changed(flags) {
            self.pending_sync.push(owner);
        }
    }

    /// Feed every transform change recorded by `world` since the last call.
    pub fn process_transform_events(&mut self, world: &mut World) {
        let events = world.drain_transform_events();
        for event in events {
            self.on_owner_transform_changed(world, event.entity, event.flags);
        }
    }

    /// Push the dirty transforms of every pending owner. Returns the number
    /// of native writes.
    pub fn flush_pending(&mut self, world: &World) -> usize {
        let pending = std::mem::take(&mut self.pending_sync);
        let mut writes = 0;
        for owner in pending {
            let Ok(mut component) = world.get_mut::<PhysicsComponent>(owner) else {
                warn!(entity = ?owner, "Pending physics owner has no component");
                continue;
            };
            component.clear_pending();
            writes += component.push_to_physics(owner, world, self.backend.as_mut(), false);
        }
        if writes > 0 {
            trace!(writes, "Flushed pending physics transforms");
        }
        writes
    }

    /// Write the collision object's transform back to its owner.
    pub fn pull_from_physics(&mut self, world: &mut World, owner: Entity) -> PhysicsResult<()> {
        let pose = {
            let component = world
                .get::<PhysicsComponent>(owner)
                .map_err(|_| PhysicsError::MissingComponent(owner))?;
            component.pose_from_physics(owner, world, self.backend.as_ref())
        };
        let Some((position, rotation)) = pose else {
            return Ok(());
        };
        world
            .set_world_pose(owner, position, rotation)
            .map_err(|_| PhysicsError::MissingComponent(owner))
    }

    fn pull_quietly(&mut self, world: &mut World, owner: Entity) {
        if let Err(err) = self.pull_from_physics(world, owner) {
            warn!(entity = ?owner, error = %err, "Failed to pull physics transform");
        }
    }

    /// One fixed step: push pending transforms, step the backend, write
    /// results back to moved rigid bodies and to every character.
    pub fn step(&mut self, world: &mut World, dt: f32) -> StepReport {
        self.process_transform_events(world);
        self.flush_pending(world);

        let report = self.backend.step(dt);

        self.tracking_enabled = false;
        for user_index in &report.moved {
            let Some(owner) = self.resolve(world, *user_index) else {
                warn!(user_index, "Moved native object has no owner");
                continue;
            };
            let is_rigid_body = world
                .get::<PhysicsComponent>(owner)
                .is_ok_and(|component| component.category() == BodyCategory::RigidBody);
            if is_rigid_body {
                self.pull_quietly(world, owner);
            }
        }
        let characters = self.characters.clone();
        for owner in characters {
            self.pull_quietly(world, owner);
        }
        // Changes written by the pulls are not echoed back to physics
        self.process_transform_events(world);
        self.tracking_enabled = true;

        report
    }

    /// Accumulate a frame delta and run the resulting fixed steps.
    /// Returns the number of steps taken.
    pub fn update(&mut self, world: &mut World, frame_dt: f32) -> u32 {
        let steps = self.accumulator.accumulate(frame_dt);
        let dt = self.accumulator.fixed_timestep;
        for _ in 0..steps {
            self.step(world, dt);
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::Transform;
    use crate::physics::character::CharacterController;
    use crate::physics::rigid_body::RigidBody;
    use glam::Vec3;

    #[test]
    fn test_ids_are_unique() {
        let a = PhysicsSimulation::new(PhysicsConfig::default());
        let b = PhysicsSimulation::new(PhysicsConfig::default());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_resolve_user_index() {
        let mut world = World::new();
        let sim = PhysicsSimulation::new(PhysicsConfig::default());
        let owner = world.spawn((Transform::default(),));

        assert_eq!(sim.resolve(&world, owner.to_bits().get()), Some(owner));
        world.despawn(owner).unwrap();
        assert_eq!(sim.resolve(&world, owner.to_bits().get()), None);
        assert_eq!(sim.resolve(&world, 0), None);
    }

    #[test]
    fn test_lists_follow_insertion() {
        let mut world = World::new();
        let mut sim = PhysicsSimulation::new(PhysicsConfig::default());

        let shape = world.spawn((ColliderShape::capsule(0.5, 2.0),));
        let owner = world.spawn((
            Transform::default(),
            PhysicsComponent::character(CharacterController::default()),
        ));
        sim.component_mut(&world, owner)
            .unwrap()
            .set_collider_shape(Some(shape))
            .unwrap();

        sim.add_to_scene(&world, owner).unwrap();
        assert_eq!(sim.characters(), &[owner]);
        assert!(sim.rigid_bodies().is_empty());

        sim.remove_from_scene(&world, owner).unwrap();
        assert!(sim.characters().is_empty());

        sim.destroy_component(&mut world, owner).unwrap();
        assert!(!world.contains(shape));
    }

    #[test]
    fn test_tracking_flag_blocks_scheduling() {
        let mut world = World::new();
        let mut sim = PhysicsSimulation::new(PhysicsConfig::default());

        let shape = world.spawn((ColliderShape::cuboid(Vec3::ONE),));
        let owner = world.spawn((
            Transform::default(),
            PhysicsComponent::rigid_body(RigidBody::new(1.0)),
        ));
        sim.component_mut(&world, owner)
            .unwrap()
            .set_collider_shape(Some(shape))
            .unwrap();
        sim.add_to_scene(&world, owner).unwrap();

        sim.tracking_enabled = false;
        sim.on_owner_transform_changed(&world, owner, TransformFlags::WORLD_POSITION);
        assert!(sim.pending_sync().is_empty());

        sim.tracking_enabled = true;
        sim.on_owner_transform_changed(&world, owner, TransformFlags::WORLD_POSITION);
        sim.on_owner_transform_changed(&world, owner, TransformFlags::WORLD_ROTATION);
        assert_eq!(sim.pending_sync(), &[owner]);

        sim.destroy_component(&mut world, owner).unwrap();
    }

    #[test]
    fn test_backend_downcast() {
        let mut sim = PhysicsSimulation::new(PhysicsConfig::default());
        assert!(sim.backend_as::<KinematicBackend>().is_some());
        assert!(sim.backend_as_mut::<KinematicBackend>().is_some());
    }
}
