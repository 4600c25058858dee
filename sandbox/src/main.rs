//! Headless physics demo: a character walks across the ground while a crate
//! described in JSON falls next to it.

use physics_bridge::prelude::*;
use tracing::{info, warn};

const FRAME_TIME: f32 = 1.0 / 60.0;
const FRAMES: u32 = 180;

const CRATE_DESCRIPTOR: &str = r#"{
    "restitution": 0.3,
    "friction": 0.6,
    "mass": 2.0,
    "shapes": [ { "type": "BoxColliderShape", "size": [1.0, 1.0, 1.0] } ]
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    physics_bridge::init_logging();
    info!("Starting physics sandbox");

    let config = match std::env::args().nth(1) {
        Some(path) => PhysicsConfig::load(&path)?,
        None => PhysicsConfig {
            ground_height: Some(0.0),
            ..Default::default()
        },
    };
    info!(?config, "Physics configuration");

    let mut world = World::new();
    let mut simulation = PhysicsSimulation::new(config);

    let player = create_player(&mut world, &mut simulation)?;
    let crate_entity = create_crate(&mut world, &mut simulation)?;

    simulation
        .component_mut(&world, player)?
        .move_character(Vec3::new(0.05, 0.0, 0.0))?;

    for frame in 0..FRAMES {
        if frame == 60 {
            simulation.component_mut(&world, player)?.jump(None)?;
            info!("Player jumps");
        }

        physics_update_system(&mut world, &mut simulation, FRAME_TIME);

        if frame % 30 == 0 {
            log_entity(&world, player);
            log_entity(&world, crate_entity);
        }
    }

    let grounded = simulation.component_mut(&world, player)?.is_grounded()?;
    info!(grounded, "Sandbox finished");

    simulation.destroy_component(&mut world, crate_entity)?;
    simulation.destroy_component(&mut world, player)?;
    Ok(())
}

fn create_player(world: &mut World, simulation: &mut PhysicsSimulation) -> PhysicsResult<Entity> {
    let shape = world.spawn((ColliderShape::capsule(0.4, 1.8),));
    let player = world.spawn((
        Name::new("Player"),
        Transform::from_position(Vec3::new(0.0, 0.9, 0.0)),
        PhysicsComponent::character(CharacterController::default().with_jump_speed(6.0))
            .with_collision_group(CollisionGroups::CHARACTER),
    ));
    simulation
        .component_mut(world, player)?
        .set_collider_shape(Some(shape))?;
    simulation.add_to_scene(world, player)?;
    info!(entity = ?player, "Created player");
    Ok(player)
}

fn create_crate(world: &mut World, simulation: &mut PhysicsSimulation) -> PhysicsResult<Entity> {
    let crate_entity = world.spawn((
        Name::new("Crate"),
        Transform::from_position(Vec3::new(3.0, 6.0, 0.0)),
    ));
    PhysicsComponentData::from_json_str(CRATE_DESCRIPTOR)?.apply(world, simulation, crate_entity)?;
    simulation.add_to_scene(world, crate_entity)?;
    info!(entity = ?crate_entity, "Created crate");
    Ok(crate_entity)
}

fn log_entity(world: &World, entity: Entity) {
    let name = world
        .get::<Name>(entity)
        .map(|name| name.0.clone())
        .unwrap_or_default();
    match world.get::<GlobalTransform>(entity) {
        Ok(global) => info!(name = %name, position = ?global.position(), "Entity position"),
        Err(_) => warn!(name = %name, "Entity has no global transform"),
    }
}
