//! Body records and body-kind tags
//!
//! The World keeps one [`BodyRecord`] per body in a slot-map arena. The engine
//! body stores the arena key in its `user_data`, so a contact reported by the
//! engine can be mapped back to the record (and from there to the name).

use bitflags::bitflags;
use planar_math::Vec2;
use rapier2d::prelude::{RigidBodyHandle, RigidBodyType};
use serde::{Serialize, Deserialize};
use slotmap::{new_key_type, Key, KeyData};

use crate::error::{PhysicsError, PhysicsResult};

// Define generational key type for body records
new_key_type! {
    /// Key to a body record in a World's arena
    ///
    /// Uses generational indexing so a key kept across a `destroy_body` call
    /// resolves to nothing instead of to whichever body reuses the slot.
    pub struct BodyKey;
}

/// Pack an arena key into an engine `user_data` value
pub(crate) fn key_to_user_data(key: BodyKey) -> u128 {
    key.data().as_ffi() as u128
}

/// Recover an arena key from an engine `user_data` value
///
/// Zero is the engine default for bodies created outside the binding and
/// never encodes a real key.
pub(crate) fn key_from_user_data(data: u128) -> Option<BodyKey> {
    if data == 0 || data > u64::MAX as u128 {
        return None;
    }
    Some(BodyKey::from(KeyData::from_ffi(data as u64)))
}

/// The kind of a body
///
/// The numeric tags (0, 1, 2) are the ones external callers pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyKind {
    /// Never moves; zero velocity, infinite mass
    Static,
    /// Moves by its velocity only; unaffected by forces and contacts
    Kinematic,
    /// Fully simulated
    Dynamic,
}

impl BodyKind {
    /// All kinds in tag order
    pub const ALL: [BodyKind; 3] = [BodyKind::Static, BodyKind::Kinematic, BodyKind::Dynamic];

    /// Parse a numeric body-kind tag
    pub fn from_tag(tag: i64) -> PhysicsResult<Self> {
        match tag {
            0 => Ok(BodyKind::Static),
            1 => Ok(BodyKind::Kinematic),
            2 => Ok(BodyKind::Dynamic),
            other => Err(PhysicsError::Validation(format!(
                "unknown body kind {} (expected 0 = static, 1 = kinematic, 2 = dynamic)",
                other
            ))),
        }
    }

    /// Numeric tag of this kind
    pub fn tag(self) -> u32 {
        match self {
            BodyKind::Static => 0,
            BodyKind::Kinematic => 1,
            BodyKind::Dynamic => 2,
        }
    }

    /// Mask bit selecting this kind
    pub fn mask_bit(self) -> BodyKindMask {
        match self {
            BodyKind::Static => BodyKindMask::STATIC,
            BodyKind::Kinematic => BodyKindMask::KINEMATIC,
            BodyKind::Dynamic => BodyKindMask::DYNAMIC,
        }
    }

    pub(crate) fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyKind::Static => RigidBodyType::Fixed,
            BodyKind::Kinematic => RigidBodyType::KinematicVelocityBased,
            BodyKind::Dynamic => RigidBodyType::Dynamic,
        }
    }

    pub(crate) fn from_rapier(body_type: RigidBodyType) -> Self {
        match body_type {
            RigidBodyType::Fixed => BodyKind::Static,
            RigidBodyType::Dynamic => BodyKind::Dynamic,
            RigidBodyType::KinematicVelocityBased | RigidBodyType::KinematicPositionBased => {
                BodyKind::Kinematic
            }
        }
    }
}

bitflags! {
    /// Selects body kinds when enumerating bodies
    ///
    /// Bit `n` selects the kind with tag `n`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct BodyKindMask: u32 {
        const STATIC = 1 << 0;
        const KINEMATIC = 1 << 1;
        const DYNAMIC = 1 << 2;
        const ALL = Self::STATIC.bits() | Self::KINEMATIC.bits() | Self::DYNAMIC.bits();
    }
}

impl Default for BodyKindMask {
    fn default() -> Self {
        BodyKindMask::ALL
    }
}

impl BodyKindMask {
    /// True if the mask selects this kind
    pub fn selects(self, kind: BodyKind) -> bool {
        self.contains(kind.mask_bit())
    }
}

/// Weak link from a body to a host render object
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderLink {
    /// Render-object id; may dangle if the host removes objects
    pub object_id: usize,
    /// Set once Transform Sync has found the object at least once
    pub resolved: bool,
}

impl RenderLink {
    pub fn new(object_id: usize) -> Self {
        Self {
            object_id,
            resolved: false,
        }
    }
}

/// Per-body payload owned by the binding
#[derive(Clone, Debug)]
pub struct BodyRecord {
    /// Registry name, unique within the World
    pub name: String,
    /// Engine handle of the body
    pub handle: RigidBodyHandle,
    /// Optional link to a render object's model matrix
    pub link: Option<RenderLink>,
    /// Force re-applied at the center of mass before every step
    pub constant_force: Vec2,
    /// Torque re-applied before every step
    pub constant_torque: f32,
}

impl BodyRecord {
    pub fn new(name: impl Into<String>, handle: RigidBodyHandle) -> Self {
        Self {
            name: name.into(),
            handle,
            link: None,
            constant_force: Vec2::ZERO,
            constant_torque: 0.0,
        }
    }

    /// True if a constant force or torque is set
    pub fn has_constant_load(&self) -> bool {
        self.constant_force != Vec2::ZERO || self.constant_torque != 0.0
    }
}

/// Position and orientation of a body
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyPose {
    /// World position of the body origin
    pub position: Vec2,
    /// Orientation in radians
    pub angle: f32,
}
