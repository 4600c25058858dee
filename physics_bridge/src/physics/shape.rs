//! Collider shapes.
//!
//! A [`ColliderShape`] is a hecs component living on its own entity. It is
//! attached to at most one physics component at a time and owns its native
//! shape once one has been created.

use super::error::PhysicsResult;
use super::native::{NativeHandle, PhysicsBackend, RawHandle};
use glam::{Quat, Vec3};
use hecs::Entity;
use tracing::debug;

/// Axis a capsule, cone or cylinder extends along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeOrientation {
    UpX,
    #[default]
    UpY,
    UpZ,
}

impl ShapeOrientation {
    /// Orientation from its serialized index (0 = X, 1 = Y, 2 = Z).
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::UpX),
            1 => Some(Self::UpY),
            2 => Some(Self::UpZ),
            _ => None,
        }
    }

    pub fn axis_index(self) -> usize {
        match self {
            Self::UpX => 0,
            Self::UpY => 1,
            Self::UpZ => 2,
        }
    }
}

/// Geometry of a shape, in engine units.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    Box {
        size: Vec3,
    },
    Sphere {
        radius: f32,
    },
    Capsule {
        radius: f32,
        height: f32,
        orientation: ShapeOrientation,
    },
    Cone {
        radius: f32,
        height: f32,
        orientation: ShapeOrientation,
    },
    Cylinder {
        radius: f32,
        height: f32,
        orientation: ShapeOrientation,
    },
    /// Triangle mesh referenced by asset path.
    Mesh {
        mesh: Option<String>,
    },
    Compound {
        children: Vec<CompoundChild>,
    },
}

impl ShapeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Sphere { .. } => "sphere",
            Self::Capsule { .. } => "capsule",
            Self::Cone { .. } => "cone",
            Self::Cylinder { .. } => "cylinder",
            Self::Mesh { .. } => "mesh",
            Self::Compound { .. } => "compound",
        }
    }
}

/// Child of a compound shape, placed relative to the compound's origin.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundChild {
    pub kind: ShapeKind,
    pub local_offset: Vec3,
    pub local_rotation: Quat,
}

/// Outcome of forwarding a scale to a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalePolicy {
    /// The scale was applied as given.
    Applied,
    /// The shape cannot represent the scale exactly; the closest
    /// representable scale was applied instead.
    Approximated,
}

/// Scale a backend should apply to `kind` for a requested owner scale.
pub fn effective_scale(kind: &ShapeKind, scale: Vec3) -> (Vec3, ScalePolicy) {
    let abs = scale.abs();
    match kind {
        ShapeKind::Box { .. } | ShapeKind::Mesh { .. } | ShapeKind::Compound { .. } => {
            (scale, ScalePolicy::Applied)
        }
        ShapeKind::Sphere { .. } => {
            let max = abs.max_element();
            let policy = if abs.x == abs.y && abs.y == abs.z {
                ScalePolicy::Applied
            } else {
                ScalePolicy::Approximated
            };
            (Vec3::splat(max), policy)
        }
        ShapeKind::Capsule { orientation, .. }
        | ShapeKind::Cone { orientation, .. }
        | ShapeKind::Cylinder { orientation, .. } => {
            let axis = orientation.axis_index();
            let (a, b) = match axis {
                0 => (abs.y, abs.z),
                1 => (abs.x, abs.z),
                _ => (abs.x, abs.y),
            };
            let radius_scale = a.max(b);
            let mut effective = Vec3::splat(radius_scale);
            effective[axis] = abs[axis];
            let policy = if a == b {
                ScalePolicy::Applied
            } else {
                ScalePolicy::Approximated
            };
            (effective, policy)
        }
    }
}

/// Shape component.
#[derive(Debug)]
pub struct ColliderShape {
    kind: ShapeKind,
    local_offset: Vec3,
    local_rotation: Quat,
    attached_to: Option<Entity>,
    native: Option<NativeHandle>,
    scale: Vec3,
}

impl ColliderShape {
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            local_offset: Vec3::ZERO,
            local_rotation: Quat::IDENTITY,
            attached_to: None,
            native: None,
            scale: Vec3::ONE,
        }
    }

    pub fn cuboid(size: Vec3) -> Self {
        Self::new(ShapeKind::Box { size })
    }

    pub fn sphere(radius: f32) -> Self {
        Self::new(ShapeKind::Sphere { radius })
    }

    pub fn capsule(radius: f32, height: f32) -> Self {
        Self::new(ShapeKind::Capsule {
            radius,
            height,
            orientation: ShapeOrientation::UpY,
        })
    }

    pub fn with_local_offset(mut self, offset: Vec3) -> Self {
        self.local_offset = offset;
        self
    }

    pub fn with_local_rotation(mut self, rotation: Quat) -> Self {
        self.local_rotation = rotation;
        self
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn local_offset(&self) -> Vec3 {
        self.local_offset
    }

    /// Attached shapes change through `ComponentMut::set_shape_local_offset`,
    /// which also rewrites the collision object.
    pub(crate) fn set_local_offset(&mut self, offset: Vec3) {
        self.local_offset = offset;
    }

    pub fn local_rotation(&self) -> Quat {
        self.local_rotation
    }

    /// See [`ColliderShape::set_local_offset`].
    pub(crate) fn set_local_rotation(&mut self, rotation: Quat) {
        self.local_rotation = rotation;
    }

    /// Owner of the physics component this shape is attached to.
    pub fn attached_to(&self) -> Option<Entity> {
        self.attached_to
    }

    /// Last scale forwarded through [`ColliderShape::set_scale`].
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn native(&self) -> Option<RawHandle> {
        self.native.as_ref().map(NativeHandle::raw)
    }

    /// Mesh shapes need per-triangle material callbacks on their collision object.
    pub fn needs_custom_collision_callback(&self) -> bool {
        matches!(self.kind, ShapeKind::Mesh { .. })
    }

    /// Copy of the geometry, offset and rotation, without attachment or native shape.
    pub fn duplicate(&self) -> Self {
        Self::new(self.kind.clone())
            .with_local_offset(self.local_offset)
            .with_local_rotation(self.local_rotation)
    }

    pub(crate) fn attach(&mut self, owner: Entity) {
        self.attached_to = Some(owner);
    }

    pub(crate) fn detach(&mut self) {
        self.attached_to = None;
    }

    /// Native shape, created on first use.
    pub(crate) fn ensure_native(&mut self, backend: &mut dyn PhysicsBackend) -> PhysicsResult<RawHandle> {
        if let Some(native) = &self.native {
            return Ok(native.raw());
        }
        let raw = backend.create_shape(&self.kind)?;
        debug!(shape = self.kind.type_name(), handle = ?raw, "Created native collider shape");
        self.native = Some(NativeHandle::new(raw));
        if self.scale != Vec3::ONE {
            let (effective, _) = effective_scale(&self.kind, self.scale);
            backend.set_shape_scale(raw, effective);
        }
        Ok(raw)
    }

    /// Forward an owner scale to the native shape through the rescale policy.
    pub(crate) fn set_scale(&mut self, backend: &mut dyn PhysicsBackend, scale: Vec3) -> ScalePolicy {
        self.scale = scale;
        let (effective, policy) = effective_scale(&self.kind, scale);
        if policy == ScalePolicy::Approximated {
            debug!(
                shape = self.kind.type_name(),
                requested = ?scale,
                applied = ?effective,
                "Collider shape cannot represent scale exactly"
            );
        }
        if let Some(native) = &self.native {
            backend.set_shape_scale(native.raw(), effective);
        }
        policy
    }

    pub(crate) fn destroy_native(&mut self, backend: &mut dyn PhysicsBackend) {
        if let Some(native) = self.native.take() {
            native.destroy(backend);
        }
    }
}
