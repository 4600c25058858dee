//! Serialized physics component and shape descriptors.
//!
//! Scene files describe a physics component as a JSON object with optional
//! material and filter fields, a `shapes` array and, for characters, a
//! `character` block. Shapes are tagged by their `type` string.

use super::character::CharacterController;
use super::component::PhysicsComponent;
use super::error::{PhysicsError, PhysicsResult};
use super::flags::CollisionGroups;
use super::rigid_body::RigidBody;
use super::shape::{ColliderShape, CompoundChild, ShapeKind, ShapeOrientation};
use super::simulation::PhysicsSimulation;
use crate::core::entity::World;
use glam::{Quat, Vec3};
use hecs::Entity;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    #[serde(rename = "type")]
    pub shape_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<[f32; 3]>,
}

impl ShapeDescriptor {
    fn orientation(&self) -> ShapeOrientation {
        match self.orientation {
            None => ShapeOrientation::default(),
            Some(index) => ShapeOrientation::from_index(index).unwrap_or_else(|| {
                warn!(orientation = index, "Unknown shape orientation, using Y");
                ShapeOrientation::default()
            }),
        }
    }

    pub fn kind(&self) -> PhysicsResult<ShapeKind> {
        let kind = match self.shape_type.as_str() {
            "BoxColliderShape" => ShapeKind::Box {
                size: self.size.map(Vec3::from_array).unwrap_or(Vec3::ONE),
            },
            "SphereColliderShape" => ShapeKind::Sphere {
                radius: self.radius.unwrap_or(0.5),
            },
            "CapsuleColliderShape" => ShapeKind::Capsule {
                radius: self.radius.unwrap_or(0.5),
                height: self.height.unwrap_or(2.0),
                orientation: self.orientation(),
            },
            "MeshColliderShape" => ShapeKind::Mesh {
                mesh: self.mesh.clone(),
            },
            "ConeColliderShape" => ShapeKind::Cone {
                radius: self.radius.unwrap_or(0.5),
                height: self.height.unwrap_or(1.0),
                orientation: self.orientation(),
            },
            "CylinderColliderShape" => ShapeKind::Cylinder {
                radius: self.radius.unwrap_or(0.5),
                height: self.height.unwrap_or(1.0),
                orientation: self.orientation(),
            },
            other => return Err(PhysicsError::UnknownShapeType(other.to_string())),
        };
        Ok(kind)
    }

    pub fn local_offset(&self) -> Vec3 {
        self.center.map(Vec3::from_array).unwrap_or(Vec3::ZERO)
    }

    pub fn to_shape(&self) -> PhysicsResult<ColliderShape> {
        Ok(ColliderShape::new(self.kind()?).with_local_offset(self.local_offset()))
    }
}

/// One descriptor becomes that shape, several become a compound.
pub fn shape_from_descriptors(descriptors: &[ShapeDescriptor]) -> PhysicsResult<Option<ColliderShape>> {
    match descriptors {
        [] => Ok(None),
        [single] => single.to_shape().map(Some),
        many => {
            let children = many
                .iter()
                .map(|descriptor| {
                    Ok(CompoundChild {
                        kind: descriptor.kind()?,
                        local_offset: descriptor.local_offset(),
                        local_rotation: Quat::IDENTITY,
                    })
                })
                .collect::<PhysicsResult<Vec<_>>>()?;
            Ok(Some(ColliderShape::new(ShapeKind::Compound { children })))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDescriptor {
    pub step_height: Option<f32>,
    pub up_axis: Option<[f32; 3]>,
    pub max_slope: Option<f32>,
    pub jump_speed: Option<f32>,
    pub fall_speed: Option<f32>,
    pub gravity: Option<[f32; 3]>,
}

impl CharacterDescriptor {
    pub fn build(&self) -> CharacterController {
        let defaults = CharacterController::default();
        CharacterController::new(
            self.step_height.unwrap_or(defaults.step_height()),
            self.up_axis.map(Vec3::from_array).unwrap_or(defaults.up_axis()),
        )
        .with_max_slope(self.max_slope.unwrap_or(defaults.max_slope()))
        .with_jump_speed(self.jump_speed.unwrap_or(defaults.jump_speed()))
        .with_fall_speed(self.fall_speed.unwrap_or(defaults.fall_speed()))
        .with_gravity(self.gravity.map(Vec3::from_array).unwrap_or(defaults.gravity()))
    }
}

/// Serialized physics component.
///
/// Filter masks are signed in scene files, where -1 means every group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsComponentData {
    pub collision_group: Option<i64>,
    pub can_collide_with: Option<i64>,
    pub ccd_motion_threshold: Option<f32>,
    pub ccd_swept_sphere_radius: Option<f32>,
    pub restitution: Option<f32>,
    pub friction: Option<f32>,
    pub rolling_friction: Option<f32>,
    pub mass: Option<f32>,
    pub is_kinematic: Option<bool>,
    #[serde(default)]
    pub shapes: Vec<ShapeDescriptor>,
    pub character: Option<CharacterDescriptor>,
}

impl PhysicsComponentData {
    pub fn from_json_str(json: &str) -> PhysicsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> PhysicsResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Component with every field present in the data applied.
    pub fn build_component(&self) -> PhysicsResult<PhysicsComponent> {
        let mut component = match &self.character {
            Some(character) => PhysicsComponent::character(character.build()),
            None => PhysicsComponent::rigid_body(
                RigidBody::new(self.mass.unwrap_or(1.0))
                    .with_kinematic(self.is_kinematic.unwrap_or(false)),
            ),
        };
        if let Some(group) = self.collision_group {
            component = component.with_collision_group(filter_bits("collisionGroup", group)?);
        }
        if let Some(mask) = self.can_collide_with {
            component = component.with_can_collide_with(filter_bits("canCollideWith", mask)?);
        }
        if let Some(value) = self.ccd_motion_threshold {
            component = component.with_ccd_motion_threshold(value);
        }
        if let Some(value) = self.ccd_swept_sphere_radius {
            component = component.with_ccd_swept_sphere_radius(value);
        }
        if let Some(value) = self.restitution {
            component = component.with_restitution(value);
        }
        if let Some(value) = self.friction {
            component = component.with_friction(value);
        }
        if let Some(value) = self.rolling_friction {
            component = component.with_rolling_friction(value);
        }
        Ok(component)
    }

    pub fn build_shape(&self) -> PhysicsResult<Option<ColliderShape>> {
        shape_from_descriptors(&self.shapes)
    }

    /// Put the described component, and its shape on a new entity, on `owner`.
    ///
    /// Shapes are validated first; on error nothing is spawned.
    pub fn apply(
        &self,
        world: &mut World,
        simulation: &mut PhysicsSimulation,
        owner: Entity,
    ) -> PhysicsResult<()> {
        let shape = self.build_shape()?;
        let component = self.build_component()?;
        if world.get::<PhysicsComponent>(owner).is_ok() {
            return Err(PhysicsError::ComponentExists(owner));
        }
        world
            .insert_one(owner, component)
            .map_err(|_| PhysicsError::MissingComponent(owner))?;

        if let Some(shape) = shape {
            let shape_entity = world.spawn((shape,));
            simulation
                .component_mut(world, owner)?
                .set_collider_shape(Some(shape_entity))?;
        }
        debug!(entity = ?owner, shapes = self.shapes.len(), "Applied physics component data");
        Ok(())
    }
}

/// Group and mask fields hold 32 filter bits; `-1` stands for all of them.
fn filter_bits(field: &str, value: i64) -> PhysicsResult<u32> {
    if value == -1 {
        return Ok(CollisionGroups::ALL);
    }
    u32::try_from(value).map_err(|_| {
        PhysicsError::InvalidDescriptor(<serde_json::Error as serde::de::Error>::custom(format!(
            "{field} {value} is outside the 32 filter bits"
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body::BodyCategory;

    #[test]
    fn test_box_with_center() {
        let descriptor: ShapeDescriptor = serde_json::from_str(
            r#"{ "type": "BoxColliderShape", "size": [1.0, 2.0, 3.0], "center": [0.0, 1.0, 0.0] }"#,
        )
        .unwrap();
        let shape = descriptor.to_shape().unwrap();
        assert_eq!(
            shape.kind(),
            &ShapeKind::Box {
                size: Vec3::new(1.0, 2.0, 3.0)
            }
        );
        assert_eq!(shape.local_offset(), Vec3::Y);
    }

    #[test]
    fn test_capsule_orientation() {
        let descriptor: ShapeDescriptor = serde_json::from_str(
            r#"{ "type": "CapsuleColliderShape", "radius": 0.3, "height": 1.8, "orientation": 2 }"#,
        )
        .unwrap();
        assert_eq!(
            descriptor.kind().unwrap(),
            ShapeKind::Capsule {
                radius: 0.3,
                height: 1.8,
                orientation: ShapeOrientation::UpZ
            }
        );
    }

    #[test]
    fn test_unknown_type() {
        let descriptor: ShapeDescriptor =
            serde_json::from_str(r#"{ "type": "TorusColliderShape" }"#).unwrap();
        match descriptor.to_shape() {
            Err(PhysicsError::UnknownShapeType(name)) => assert_eq!(name, "TorusColliderShape"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_several_shapes_make_compound() {
        let data = PhysicsComponentData::from_json_str(
            r#"{
                "shapes": [
                    { "type": "SphereColliderShape", "radius": 1.0 },
                    { "type": "BoxColliderShape", "center": [0.0, -1.0, 0.0] }
                ]
            }"#,
        )
        .unwrap();
        let shape = data.build_shape().unwrap().unwrap();
        match shape.kind() {
            ShapeKind::Compound { children } => {
                assert_eq!(children.len(), 2);
                assert_eq!(children[1].local_offset, Vec3::NEG_Y);
            }
            other => panic!("expected compound, got {other:?}"),
        }
    }

    #[test]
    fn test_one_bad_shape_fails_compound() {
        let data = PhysicsComponentData::from_json_str(
            r#"{ "shapes": [ { "type": "SphereColliderShape" }, { "type": "Nope" } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            data.build_shape(),
            Err(PhysicsError::UnknownShapeType(_))
        ));
    }

    #[test]
    fn test_component_fields() {
        let data = PhysicsComponentData::from_json_str(
            r#"{
                "collisionGroup": 2,
                "canCollideWith": -1,
                "restitution": 0.25,
                "rollingFriction": 0.1,
                "character": { "stepHeight": 0.3, "jumpSpeed": 7.0 }
            }"#,
        )
        .unwrap();
        let component = data.build_component().unwrap();
        assert_eq!(component.category(), BodyCategory::Character);
        assert_eq!(component.collision_group(), 2);
        assert_eq!(component.can_collide_with(), u32::MAX);
        assert_eq!(component.restitution(), 0.25);
        assert_eq!(component.friction(), 0.5);
        let character = component.as_character().unwrap();
        assert_eq!(character.step_height(), 0.3);
        assert_eq!(character.jump_speed(), 7.0);
        assert_eq!(character.fall_speed(), 55.0);
    }

    #[test]
    fn test_filter_bits_out_of_range() {
        for json in [
            r#"{ "collisionGroup": 4294967296 }"#,
            r#"{ "canCollideWith": -2 }"#,
        ] {
            let data = PhysicsComponentData::from_json_str(json).unwrap();
            assert!(matches!(
                data.build_component(),
                Err(PhysicsError::InvalidDescriptor(_))
            ));
        }

        let data =
            PhysicsComponentData::from_json_str(r#"{ "collisionGroup": 4294967295 }"#).unwrap();
        assert_eq!(data.build_component().unwrap().collision_group(), u32::MAX);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            PhysicsComponentData::from_json_str("{ \"shapes\": 3 }"),
            Err(PhysicsError::InvalidDescriptor(_))
        ));
    }
}
