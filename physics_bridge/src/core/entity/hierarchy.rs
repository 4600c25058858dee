//! Hierarchy system for updating global transforms based on parent relationships

use super::components::{GlobalTransform, Parent, Transform};
use super::world::World;
use glam::Mat4;
use std::collections::HashSet;
use tracing::{error, trace};

/// Update the hierarchy system, calculating global transforms from local transforms
/// and parent relationships using breadth-first traversal.
pub fn update_hierarchy_system(world: &mut World) {
    let mut queue: Vec<(hecs::Entity, Mat4)> = Vec::with_capacity(256);
    let mut visited = HashSet::with_capacity(256);

    let inner = world.inner_mut();

    // Find root entities (entities with Transform but no Parent)
    let mut root_updates = Vec::new();
    for (entity, transform) in inner.query::<&Transform>().without::<&Parent>().iter() {
        root_updates.push((entity, transform.to_matrix()));
        visited.insert(entity);
    }

    for (entity, world_matrix) in &root_updates {
        write_global(inner, *entity, *world_matrix);
    }

    queue.extend(root_updates);
    trace!(root_count = queue.len(), "Starting hierarchy update");

    while !queue.is_empty() {
        let mut child_updates = Vec::new();

        for (parent_entity, parent_world_matrix) in queue.drain(..) {
            for (child_entity, (parent, transform)) in
                inner.query::<(&Parent, &Transform)>().iter()
            {
                if parent.0 != parent_entity {
                    continue;
                }

                if !visited.insert(child_entity) {
                    error!(
                        parent = ?parent_entity,
                        child = ?child_entity,
                        "Cyclic parent-child relationship detected in hierarchy"
                    );
                    continue;
                }

                child_updates.push((child_entity, parent_world_matrix * transform.to_matrix()));
            }
        }

        for (child_entity, child_world_matrix) in &child_updates {
            write_global(inner, *child_entity, *child_world_matrix);
        }

        queue = child_updates;
    }

    trace!(processed_count = visited.len(), "Hierarchy update completed");
}

fn write_global(inner: &mut hecs::World, entity: hecs::Entity, matrix: Mat4) {
    match inner.query_one_mut::<&mut GlobalTransform>(entity) {
        Ok(global) => global.matrix = matrix,
        Err(_) => {
            let _ = inner.insert_one(entity, GlobalTransform::from_matrix(matrix));
        }
    }
}
