//! Physics component and transform synchronization bridge
//!
//! This crate keeps a scene graph's transforms and the collision objects of
//! a physics backend in step, and drives kinematic character controllers
//! living in that backend.

pub mod config;
pub mod core;
pub mod physics;

// Re-export commonly used types
pub mod prelude {
    // Entity system types
    pub use crate::core::entity::{
        update_hierarchy_system, Entity, GlobalTransform, Name, Parent, Transform, TransformFlags,
        World,
    };

    // Math types
    pub use glam::{Mat4, Quat, Vec3};

    // Config types
    pub use crate::config::{PhysicsConfig, ZeroJumpBehavior};

    // Physics types
    pub use crate::physics::{
        physics_update_system, CharacterController, ColliderShape, CollisionGroups,
        KinematicBackend, PhysicsBackend, PhysicsComponent, PhysicsComponentData, PhysicsError,
        PhysicsResult, PhysicsSimulation, RigidBody, ShapeKind,
    };
}

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
