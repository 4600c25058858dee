//! Physics bridge
//!
//! Keeps scene-graph transforms (left-handed, Y-up) and collision objects in
//! a right-handed physics backend consistent, and manages the collision
//! objects' lifecycle alongside scene membership and component enablement.

pub mod accumulator;
pub mod body;
pub mod character;
pub mod component;
pub mod coordinates;
pub mod descriptor;
pub mod error;
pub mod flags;
pub mod kinematic_backend;
pub mod native;
pub mod rigid_body;
pub mod shape;
pub mod simulation;
pub mod system;

// Re-export commonly used types
pub use accumulator::PhysicsAccumulator;
pub use body::{BodyCategory, PhysicsBody, SimulationMember};
pub use character::{CharacterController, CharacterState};
pub use component::{ComponentMut, PhysicsComponent};
pub use descriptor::{PhysicsComponentData, ShapeDescriptor};
pub use error::{PhysicsError, PhysicsResult};
pub use flags::{CollisionFlags, CollisionGroups};
pub use kinematic_backend::{BackendStats, KinematicBackend};
pub use native::{NativeHandle, PhysicsBackend, RawHandle, StepReport};
pub use rigid_body::RigidBody;
pub use shape::{ColliderShape, ScalePolicy, ShapeKind, ShapeOrientation};
pub use simulation::{PhysicsSimulation, SimulationId};
pub use system::physics_update_system;
