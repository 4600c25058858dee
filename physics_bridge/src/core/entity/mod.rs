//! Entity-Component System (ECS) functionality
//!
//! This module provides the scene graph the physics bridge synchronizes with:
//! transform components, hierarchy management and transform-changed events.

pub mod components;
pub mod hierarchy;
pub mod world;

// Re-export commonly used types
pub use components::{
    GlobalTransform, Name, Parent, Transform, TransformChanged, TransformFlags, WorldPose,
};
pub use hierarchy::update_hierarchy_system;
pub use world::World;

// Re-export hecs types that users will need
pub use hecs::Entity;
