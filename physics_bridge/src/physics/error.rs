//! Errors raised by the physics bridge

use hecs::Entity;

#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("collider shape {0:?} is already attached to another physics component")]
    ShapeAlreadyAttached(Entity),

    #[error("unknown collider shape type: {0}")]
    UnknownShapeType(String),

    #[error("character controller on {0:?} has no native character yet")]
    ControllerNotInitialized(Entity),

    #[error("physics backend failed to allocate {0}")]
    NativeAllocation(String),

    #[error("entity {0:?} has no physics component")]
    MissingComponent(Entity),

    #[error("entity {0:?} has no collider shape")]
    MissingShape(Entity),

    #[error("physics component on {0:?} is not a character controller")]
    NotACharacter(Entity),

    #[error("physics component on {0:?} is not a rigid body")]
    NotARigidBody(Entity),

    #[error("entity {0:?} already has a physics component")]
    ComponentExists(Entity),

    #[error("invalid physics descriptor: {0}")]
    InvalidDescriptor(#[from] serde_json::Error),
}

pub type PhysicsResult<T> = Result<T, PhysicsError>;
