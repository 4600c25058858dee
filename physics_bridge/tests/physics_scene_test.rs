use glam::Vec3;
use physics_bridge::config::PhysicsConfig;
use physics_bridge::core::entity::{GlobalTransform, Name, Transform, World};
use physics_bridge::physics::{
    physics_update_system, BodyCategory, ColliderShape, CollisionGroups, KinematicBackend,
    PhysicsComponent, PhysicsComponentData, PhysicsError, PhysicsSimulation, RigidBody, ShapeKind,
};
use tracing::info;

const DT: f32 = 1.0 / 60.0;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[test]
fn test_descriptor_applied_to_entity() {
    init_tracing();
    let mut world = World::new();
    let mut sim = PhysicsSimulation::new(PhysicsConfig {
        ground_height: Some(0.0),
        ..Default::default()
    });
    let player = world.spawn((
        Name::new("Player"),
        Transform::from_position(Vec3::new(0.0, 1.0, 0.0)),
    ));

    let data = PhysicsComponentData::from_json_str(
        r#"{
            "collisionGroup": 32,
            "canCollideWith": -1,
            "friction": 0.8,
            "shapes": [
                { "type": "CapsuleColliderShape", "radius": 0.5, "height": 2.0 }
            ],
            "character": { "stepHeight": 0.25, "jumpSpeed": 8.0 }
        }"#,
    )
    .unwrap();
    data.apply(&mut world, &mut sim, player).unwrap();
    sim.add_to_scene(&world, player).unwrap();

    let (shape_entity, native) = {
        let component = world.get::<PhysicsComponent>(player).unwrap();
        assert_eq!(component.category(), BodyCategory::Character);
        assert_eq!(component.collision_group(), CollisionGroups::CHARACTER);
        assert_eq!(component.can_collide_with(), CollisionGroups::ALL);
        assert!(component.is_in_simulation());
        (component.collider_shape().unwrap(), component.native().unwrap())
    };
    assert_eq!(
        world.get::<ColliderShape>(shape_entity).unwrap().attached_to(),
        Some(player)
    );
    assert_eq!(sim.characters(), &[player]);

    let backend = sim.backend_as::<KinematicBackend>().unwrap();
    let object = backend.object(native).unwrap();
    assert_eq!(object.friction, 0.8);
    assert_eq!(object.group, CollisionGroups::CHARACTER);
    info!(live = backend.live_objects(), "Scene built from descriptor");

    // A second apply is refused
    assert!(matches!(
        data.apply(&mut world, &mut sim, player),
        Err(PhysicsError::ComponentExists(_))
    ));
}

#[test]
fn test_bad_descriptor_spawns_nothing() {
    let mut world = World::new();
    let mut sim = PhysicsSimulation::new(PhysicsConfig::default());
    let owner = world.spawn((Transform::default(),));

    let data = PhysicsComponentData::from_json_str(
        r#"{ "shapes": [ { "type": "BoxColliderShape" }, { "type": "TorusColliderShape" } ] }"#,
    )
    .unwrap();
    let result = data.apply(&mut world, &mut sim, owner);
    assert!(matches!(result, Err(PhysicsError::UnknownShapeType(ref name)) if name == "TorusColliderShape"));

    assert!(world.get::<PhysicsComponent>(owner).is_err());
    assert_eq!(world.query::<&ColliderShape>().iter().count(), 0);
}

#[test]
fn test_compound_descriptor_is_one_shape() {
    let mut world = World::new();
    let mut sim = PhysicsSimulation::new(PhysicsConfig::default());
    let owner = world.spawn((Transform::default(),));

    PhysicsComponentData::from_json_str(
        r#"{
            "mass": 2.5,
            "shapes": [
                { "type": "SphereColliderShape", "radius": 0.5, "center": [0.0, 1.0, 0.0] },
                { "type": "CylinderColliderShape", "radius": 0.2, "height": 1.0 }
            ]
        }"#,
    )
    .unwrap()
    .apply(&mut world, &mut sim, owner)
    .unwrap();

    let shape_entity = world
        .get::<PhysicsComponent>(owner)
        .unwrap()
        .collider_shape()
        .unwrap();
    let shape = world.get::<ColliderShape>(shape_entity).unwrap();
    assert!(matches!(shape.kind(), ShapeKind::Compound { children } if children.len() == 2));
    assert_eq!(
        world
            .get::<PhysicsComponent>(owner)
            .unwrap()
            .as_rigid_body()
            .unwrap()
            .mass(),
        2.5
    );
}

#[test]
fn test_falling_body_lands_on_ground() {
    init_tracing();
    let mut world = World::new();
    let mut sim = PhysicsSimulation::new(PhysicsConfig {
        ground_height: Some(0.0),
        ..Default::default()
    });

    let shape = world.spawn((ColliderShape::cuboid(Vec3::ONE),));
    let crate_entity = world.spawn((
        Name::new("Crate"),
        Transform::from_position(Vec3::new(2.0, 5.0, 0.0)),
        PhysicsComponent::rigid_body(RigidBody::new(1.0)),
    ));
    sim.component_mut(&world, crate_entity)
        .unwrap()
        .set_collider_shape(Some(shape))
        .unwrap();
    sim.add_to_scene(&world, crate_entity).unwrap();

    physics_update_system(&mut world, &mut sim, DT);
    let after_one = world.get::<Transform>(crate_entity).unwrap().position;
    assert!(after_one.y < 5.0);

    for _ in 0..300 {
        physics_update_system(&mut world, &mut sim, DT);
    }

    let position = world.get::<Transform>(crate_entity).unwrap().position;
    info!(?position, "Crate at rest");
    assert!((position.y - 0.5).abs() < 1e-4);
    assert!((position.x - 2.0).abs() < 1e-4);
    let global = world.get::<GlobalTransform>(crate_entity).unwrap().position();
    assert!((global.y - 0.5).abs() < 1e-4);
    assert!(sim.pending_sync().is_empty());
}

#[test]
fn test_static_body_stays_put() {
    let mut world = World::new();
    let mut sim = PhysicsSimulation::new(PhysicsConfig::default());

    let shape = world.spawn((ColliderShape::cuboid(Vec3::new(10.0, 1.0, 10.0)),));
    let floor = world.spawn((
        Transform::from_position(Vec3::new(0.0, -0.5, 0.0)),
        PhysicsComponent::rigid_body(RigidBody::fixed()),
    ));
    sim.component_mut(&world, floor)
        .unwrap()
        .set_collider_shape(Some(shape))
        .unwrap();
    sim.add_to_scene(&world, floor).unwrap();

    for _ in 0..30 {
        physics_update_system(&mut world, &mut sim, DT);
    }
    assert_eq!(
        world.get::<Transform>(floor).unwrap().position,
        Vec3::new(0.0, -0.5, 0.0)
    );
}

#[test]
fn test_long_frame_is_clamped_to_max_substeps() {
    let mut world = World::new();
    let mut sim = PhysicsSimulation::new(PhysicsConfig {
        max_substeps: 3,
        ..Default::default()
    });

    assert_eq!(sim.update(&mut world, 1.0), 3);
    assert_eq!(sim.update(&mut world, DT * 0.5), 0);
}
