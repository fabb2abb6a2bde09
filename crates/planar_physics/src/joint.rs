//! Joint descriptions
//!
//! Only revolute joints are supported. Joints have no name and are never
//! looked up again; they live until one of their bodies (or the World) is
//! destroyed.

use std::f32::consts::FRAC_PI_4;

use planar_math::Vec2;
use rapier2d::prelude::{point, GenericJoint, RevoluteJointBuilder};
use serde::{Serialize, Deserialize};

use crate::error::{PhysicsError, PhysicsResult};

/// Default lower angular limit, in radians
pub const DEFAULT_LOWER_ANGLE: f32 = -FRAC_PI_4;
/// Default upper angular limit, in radians
pub const DEFAULT_UPPER_ANGLE: f32 = FRAC_PI_4;

/// A hinge between two bodies
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevoluteJointDesc {
    /// Anchor in the first body's local frame
    pub anchor_a: Vec2,
    /// Anchor in the second body's local frame
    pub anchor_b: Vec2,
    /// Lower angular limit (radians)
    pub lower_angle: f32,
    /// Upper angular limit (radians)
    pub upper_angle: f32,
    /// Whether the two connected bodies still collide with each other
    pub collide_connected: bool,
}

impl RevoluteJointDesc {
    /// Hinge with the default +/-45 degree limits and no self-collision
    pub fn new(anchor_a: Vec2, anchor_b: Vec2) -> Self {
        Self {
            anchor_a,
            anchor_b,
            lower_angle: DEFAULT_LOWER_ANGLE,
            upper_angle: DEFAULT_UPPER_ANGLE,
            collide_connected: false,
        }
    }

    pub fn with_limits(mut self, lower_angle: f32, upper_angle: f32) -> Self {
        self.lower_angle = lower_angle;
        self.upper_angle = upper_angle;
        self
    }

    pub fn validate(&self) -> PhysicsResult<()> {
        if !self.anchor_a.is_finite() || !self.anchor_b.is_finite() {
            return Err(PhysicsError::validation("joint anchors must be finite"));
        }
        if !(self.lower_angle.is_finite() && self.upper_angle.is_finite())
            || self.lower_angle > self.upper_angle
        {
            return Err(PhysicsError::Validation(format!(
                "joint limits must be finite and ordered, got [{}, {}]",
                self.lower_angle, self.upper_angle
            )));
        }
        Ok(())
    }

    /// Engine joint for this description; the motor stays disabled
    pub(crate) fn build(&self) -> GenericJoint {
        RevoluteJointBuilder::new()
            .local_anchor1(point![self.anchor_a.x, self.anchor_a.y])
            .local_anchor2(point![self.anchor_b.x, self.anchor_b.y])
            .limits([self.lower_angle, self.upper_angle])
            .contacts_enabled(self.collide_connected)
            .build()
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier2d::prelude::JointAxis;

    #[test]
    fn test_default_limits() {
        let desc = RevoluteJointDesc::new(Vec2::ZERO, Vec2::new(1.0, 0.0));
        assert_eq!(desc.lower_angle, -FRAC_PI_4);
        assert_eq!(desc.upper_angle, FRAC_PI_4);
        assert!(!desc.collide_connected);
        assert!(desc.validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_limits() {
        let desc = RevoluteJointDesc::new(Vec2::ZERO, Vec2::ZERO).with_limits(1.0, -1.0);
        assert!(matches!(desc.validate(), Err(PhysicsError::Validation(_))));
    }

    #[test]
    fn test_rejects_nan_anchor() {
        let desc = RevoluteJointDesc::new(Vec2::new(f32::NAN, 0.0), Vec2::ZERO);
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_built_joint() {
        let joint = RevoluteJointDesc::new(Vec2::new(0.5, 0.0), Vec2::new(-0.5, 0.0)).build();

        assert!(!joint.contacts_enabled);
        assert!((joint.local_anchor1().x - 0.5).abs() < 1e-6);
        assert!((joint.local_anchor2().x + 0.5).abs() < 1e-6);

        let limits = joint.limits(JointAxis::AngX).expect("angular limits should be set");
        assert!((limits.min + FRAC_PI_4).abs() < 1e-6);
        assert!((limits.max - FRAC_PI_4).abs() < 1e-6);
    }
}
