//! World wrapper providing helper methods for entity management
//!
//! Transform writes that go through the `set_*` helpers are recorded as
//! [`TransformChanged`] events for the entity and all of its descendants.
//! Writing `Transform` directly through `get_mut`/`query_mut` bypasses the
//! event queue.

use super::components::{
    GlobalTransform, Parent, Transform, TransformChanged, TransformFlags, WorldPose,
};
use glam::{Mat4, Quat, Vec3};
use hecs::Entity;
use std::collections::HashSet;
use tracing::{debug, error, trace};

/// Wrapper around hecs::World providing additional helper methods
pub struct World {
    inner: hecs::World,
    transform_events: Vec<TransformChanged>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
            transform_events: Vec::new(),
        }
    }

    /// Spawn a new entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Get a reference to a component on an entity
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a dynamically borrow-checked mutable reference to a component
    pub fn get_mut<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Query a single entity for a mutable component reference
    pub fn query_one_mut<Q: hecs::Query>(
        &mut self,
        entity: Entity,
    ) -> Result<Q::Item<'_>, hecs::QueryOneError> {
        self.inner.query_one_mut::<Q>(entity)
    }

    /// Insert a component into an entity
    pub fn insert_one(
        &mut self,
        entity: Entity,
        component: impl hecs::Component,
    ) -> Result<(), hecs::NoSuchEntity> {
        self.inner.insert_one(entity, component)
    }

    /// Remove a component from an entity and return it
    pub fn remove_one<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<T, hecs::ComponentError> {
        self.inner.remove_one::<T>(entity)
    }

    /// Query entities with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query()
    }

    /// Query entities with specific components (mutable)
    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<'_, Q> {
        self.inner.query_mut()
    }

    /// Despawn an entity and all its components
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Check if an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Helper method to spawn an entity with required transform components
    /// This ensures that entities have both Transform and GlobalTransform
    pub fn spawn_with_transform(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        let entity = self.spawn(components);

        if self.get::<Transform>(entity).is_err() {
            let _ = self.insert_one(entity, Transform::default());
            debug!(entity = ?entity, "Auto-added Transform component");
        }

        if self.get::<GlobalTransform>(entity).is_err() {
            let matrix = self.world_matrix(entity).unwrap_or(Mat4::IDENTITY);
            let _ = self.insert_one(entity, GlobalTransform::from_matrix(matrix));
            debug!(entity = ?entity, "Auto-added GlobalTransform component");
        }

        entity
    }

    /// Get access to the inner hecs::World for advanced operations
    pub fn inner(&self) -> &hecs::World {
        &self.inner
    }

    /// Get mutable access to the inner hecs::World for advanced operations
    pub fn inner_mut(&mut self) -> &mut hecs::World {
        &mut self.inner
    }

    /// Set the local position and record a transform change
    pub fn set_position(
        &mut self,
        entity: Entity,
        position: Vec3,
    ) -> Result<(), hecs::ComponentError> {
        self.get_mut::<Transform>(entity)?.position = position;
        self.record_change(entity, TransformFlags::LOCAL_POSITION);
        Ok(())
    }

    /// Set the local rotation and record a transform change
    pub fn set_rotation(
        &mut self,
        entity: Entity,
        rotation: Quat,
    ) -> Result<(), hecs::ComponentError> {
        self.get_mut::<Transform>(entity)?.rotation = rotation;
        self.record_change(entity, TransformFlags::LOCAL_ROTATION);
        Ok(())
    }

    /// Set the local scale and record a transform change
    pub fn set_scale(&mut self, entity: Entity, scale: Vec3) -> Result<(), hecs::ComponentError> {
        self.get_mut::<Transform>(entity)?.scale = scale;
        self.record_change(entity, TransformFlags::LOCAL_SCALE);
        Ok(())
    }

    /// Replace the whole local transform and record a transform change
    pub fn set_transform(
        &mut self,
        entity: Entity,
        transform: Transform,
    ) -> Result<(), hecs::ComponentError> {
        *self.get_mut::<Transform>(entity)? = transform;
        self.record_change(
            entity,
            TransformFlags::LOCAL_POSITION
                | TransformFlags::LOCAL_ROTATION
                | TransformFlags::LOCAL_SCALE,
        );
        Ok(())
    }

    /// World matrix computed by walking the parent chain.
    ///
    /// Unlike `GlobalTransform` this is never stale.
    pub fn world_matrix(&self, entity: Entity) -> Option<Mat4> {
        let mut matrix = self.get::<Transform>(entity).ok()?.to_matrix();
        let mut visited = HashSet::new();
        visited.insert(entity);

        let mut current = entity;
        while let Ok(parent) = self.get::<Parent>(current).map(|p| p.0) {
            if !visited.insert(parent) {
                error!(entity = ?entity, parent = ?parent, "Cyclic parent chain while computing world matrix");
                break;
            }
            let Ok(parent_transform) = self.get::<Transform>(parent) else {
                break;
            };
            matrix = parent_transform.to_matrix() * matrix;
            current = parent;
        }

        Some(matrix)
    }

    /// World-space position, rotation and lossy scale of an entity
    pub fn world_pose(&self, entity: Entity) -> Option<WorldPose> {
        self.world_matrix(entity)
            .map(|matrix| WorldPose::from_matrix(&matrix))
    }

    /// Move an entity so that its world position and rotation match the given
    /// values. The local scale is kept.
    pub fn set_world_pose(
        &mut self,
        entity: Entity,
        position: Vec3,
        rotation: Quat,
    ) -> Result<(), hecs::ComponentError> {
        let parent_matrix = self
            .get::<Parent>(entity)
            .ok()
            .map(|p| p.0)
            .and_then(|parent| self.world_matrix(parent));

        let (local_position, local_rotation) = match parent_matrix {
            Some(parent_matrix) => {
                let (_, parent_rotation, _) = parent_matrix.to_scale_rotation_translation();
                (
                    parent_matrix.inverse().transform_point3(position),
                    (parent_rotation.inverse() * rotation).normalize(),
                )
            }
            None => (position, rotation),
        };

        {
            let mut transform = self.get_mut::<Transform>(entity)?;
            transform.position = local_position;
            transform.rotation = local_rotation;
        }
        self.record_change(
            entity,
            TransformFlags::LOCAL_POSITION | TransformFlags::LOCAL_ROTATION,
        );
        Ok(())
    }

    /// Direct children of an entity
    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        self.inner
            .query::<&Parent>()
            .iter()
            .filter(|(_, parent)| parent.0 == entity)
            .map(|(child, _)| child)
            .collect()
    }

    /// Take every transform change recorded since the last drain
    pub fn drain_transform_events(&mut self) -> Vec<TransformChanged> {
        std::mem::take(&mut self.transform_events)
    }

    /// Transform changes recorded since the last drain
    pub fn pending_transform_events(&self) -> &[TransformChanged] {
        &self.transform_events
    }

    fn record_change(&mut self, entity: Entity, local: TransformFlags) {
        let mut own = local;
        if local.contains(TransformFlags::LOCAL_POSITION) {
            own.insert(TransformFlags::WORLD_POSITION);
        }
        if local.contains(TransformFlags::LOCAL_ROTATION) {
            own.insert(TransformFlags::WORLD_ROTATION);
        }
        if local.contains(TransformFlags::LOCAL_SCALE) {
            own.insert(TransformFlags::WORLD_SCALE);
        }
        own.insert(TransformFlags::WORLD_MATRIX);
        self.transform_events.push(TransformChanged { entity, flags: own });

        let inherited = local.for_descendants();
        if inherited.is_empty() {
            return;
        }

        let mut visited = HashSet::new();
        visited.insert(entity);
        let mut queue = self.children(entity);
        while let Some(child) = queue.pop() {
            if !visited.insert(child) {
                continue;
            }
            self.transform_events.push(TransformChanged {
                entity: child,
                flags: inherited,
            });
            queue.extend(self.children(child));
        }
        trace!(entity = ?entity, descendants = visited.len() - 1, "Recorded transform change");
    }
}
