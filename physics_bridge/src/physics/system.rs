//! Physics update system
//!
//! Runs once per frame: forwards the frame's transform changes to the
//! simulation, runs the fixed steps the accumulated time allows, then
//! refreshes global transforms so renderers see the physics results.

use crate::core::entity::{update_hierarchy_system, World};
use crate::physics::PhysicsSimulation;
use tracing::trace;

/// Update the physics simulation
pub fn physics_update_system(world: &mut World, simulation: &mut PhysicsSimulation, delta_time: f32) {
    trace!("Physics update system starting");

    // Step 1: Mark owners moved by gameplay code since the last frame
    simulation.process_transform_events(world);

    // Step 2: Fixed steps (push, step, pull)
    let steps = simulation.update(world, delta_time);

    // Step 3: Propagate pulled poses to GlobalTransform
    update_hierarchy_system(world);

    trace!(steps, "Physics update system completed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::core::entity::{GlobalTransform, Parent, Transform};
    use crate::physics::{CharacterController, ColliderShape, PhysicsComponent};
    use glam::Vec3;

    #[test]
    fn test_system_moves_character_and_children() {
        let mut world = World::new();
        let mut simulation = PhysicsSimulation::new(PhysicsConfig {
            ground_height: Some(0.0),
            ..Default::default()
        });

        let shape = world.spawn((ColliderShape::capsule(0.5, 2.0),));
        let player = world.spawn((
            Transform::from_position(Vec3::new(0.0, 1.0, 0.0)),
            PhysicsComponent::character(CharacterController::default()),
        ));
        let hat = world.spawn((Transform::from_position(Vec3::Y), Parent(player)));

        {
            let mut component = simulation.component_mut(&world, player).unwrap();
            component.set_collider_shape(Some(shape)).unwrap();
        }
        simulation.add_to_scene(&world, player).unwrap();
        simulation
            .component_mut(&world, player)
            .unwrap()
            .move_character(Vec3::new(0.5, 0.0, 0.0))
            .unwrap();

        physics_update_system(&mut world, &mut simulation, 1.0 / 60.0);

        let hat_global = world.get::<GlobalTransform>(hat).unwrap().position();
        assert!((hat_global.x - 0.5).abs() < 1e-4);
        assert!((hat_global.y - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_short_frame_runs_no_step() {
        let mut world = World::new();
        let mut simulation = PhysicsSimulation::new(PhysicsConfig::default());
        let entity = world.spawn((Transform::default(),));

        physics_update_system(&mut world, &mut simulation, 1.0 / 240.0);

        assert!(world.get::<GlobalTransform>(entity).is_ok());
        assert!(simulation.accumulator().accumulated_time() > 0.0);
    }
}
