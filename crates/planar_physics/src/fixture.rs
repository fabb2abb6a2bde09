//! Fixture shapes, materials and templates
//!
//! A fixture is a collision shape attached to one body. It has no name of its
//! own; it is reachable only through its body's fixture list. Templates are
//! named, reusable fixture descriptions kept in a per-World registry.

use planar_math::{deg_to_rad, Vec2};
use rapier2d::prelude::{vector, ColliderBuilder, Isometry};
use serde::{Serialize, Deserialize};

use crate::error::{PhysicsError, PhysicsResult};
use crate::filter::FilterData;

/// Material properties of a fixture
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixtureMaterial {
    /// Mass per unit area
    pub density: f32,
    /// Friction coefficient
    pub friction: f32,
    /// Restitution/bounciness (0.0 = no bounce, 1.0 = perfect bounce)
    pub restitution: f32,
}

impl Default for FixtureMaterial {
    fn default() -> Self {
        Self {
            density: 1.0,
            friction: 0.2,
            restitution: 0.0,
        }
    }
}

impl FixtureMaterial {
    /// Material given to box fixtures created through the command surface
    pub const BOX: Self = Self {
        density: 1.0,
        friction: 0.6,
        restitution: 0.2,
    };

    /// Material given to circle fixtures created through the command surface
    pub const CIRCLE: Self = Self {
        density: 1.0,
        friction: 0.3,
        restitution: 0.0,
    };

    pub fn new(density: f32, friction: f32, restitution: f32) -> Self {
        Self {
            density,
            friction,
            restitution,
        }
    }

    fn validate(&self) -> PhysicsResult<()> {
        for (what, value) in [
            ("density", self.density),
            ("friction", self.friction),
            ("restitution", self.restitution),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PhysicsError::Validation(format!(
                    "{} must be a non-negative number, got {}",
                    what, value
                )));
            }
        }
        Ok(())
    }
}

/// Materials used by the box and circle fixture commands
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixtureDefaults {
    pub box_material: FixtureMaterial,
    pub circle_material: FixtureMaterial,
}

impl Default for FixtureDefaults {
    fn default() -> Self {
        Self {
            box_material: FixtureMaterial::BOX,
            circle_material: FixtureMaterial::CIRCLE,
        }
    }
}

/// Collision shape of a fixture, in body-local coordinates
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FixtureShape {
    /// Oriented box
    Box {
        /// Full width (halved when building the engine shape)
        width: f32,
        /// Full height
        height: f32,
        /// Center offset from the body origin
        offset: Vec2,
        /// Rotation relative to the body, in degrees
        angle_deg: f32,
    },
    /// Circle
    Circle {
        /// Center offset from the body origin
        center: Vec2,
        radius: f32,
    },
}

impl FixtureShape {
    /// Box centered on the body origin
    pub fn rect(width: f32, height: f32) -> Self {
        FixtureShape::Box {
            width,
            height,
            offset: Vec2::ZERO,
            angle_deg: 0.0,
        }
    }

    /// Circle centered on the body origin
    pub fn circle(radius: f32) -> Self {
        FixtureShape::Circle {
            center: Vec2::ZERO,
            radius,
        }
    }

    /// Check that the shape parameters describe a real shape
    pub fn validate(&self) -> PhysicsResult<()> {
        match *self {
            FixtureShape::Box { width, height, offset, angle_deg } => {
                if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
                    return Err(PhysicsError::Validation(format!(
                        "box size must be positive, got {} x {}",
                        width, height
                    )));
                }
                if !offset.is_finite() || !angle_deg.is_finite() {
                    return Err(PhysicsError::validation("box offset and angle must be finite"));
                }
            }
            FixtureShape::Circle { center, radius } => {
                if !(radius.is_finite() && radius > 0.0) {
                    return Err(PhysicsError::Validation(format!(
                        "circle radius must be positive, got {}",
                        radius
                    )));
                }
                if !center.is_finite() {
                    return Err(PhysicsError::validation("circle center must be finite"));
                }
            }
        }
        Ok(())
    }

    /// Engine collider builder for this shape (geometry only)
    pub(crate) fn collider_builder(&self) -> ColliderBuilder {
        match *self {
            FixtureShape::Box { width, height, offset, angle_deg } => {
                ColliderBuilder::cuboid(width * 0.5, height * 0.5)
                    .position(Isometry::new(vector![offset.x, offset.y], deg_to_rad(angle_deg)))
            }
            FixtureShape::Circle { center, radius } => {
                ColliderBuilder::ball(radius).translation(vector![center.x, center.y])
            }
        }
    }
}

/// A reusable fixture description
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixtureTemplate {
    pub shape: FixtureShape,
    /// Material; falls back to the World's default for the shape kind
    #[serde(default)]
    pub material: Option<FixtureMaterial>,
    /// Sensor fixtures report contacts but never push
    #[serde(default)]
    pub sensor: bool,
    /// Collision filter; falls back to [`FilterData::default`]
    #[serde(default)]
    pub filter: Option<FilterData>,
}

impl FixtureTemplate {
    pub fn new(shape: FixtureShape) -> Self {
        Self {
            shape,
            material: None,
            sensor: false,
            filter: None,
        }
    }

    pub fn with_material(mut self, material: FixtureMaterial) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn with_filter(mut self, filter: FilterData) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Material this template resolves to under the given defaults
    pub fn resolved_material(&self, defaults: &FixtureDefaults) -> FixtureMaterial {
        self.material.unwrap_or(match self.shape {
            FixtureShape::Box { .. } => defaults.box_material,
            FixtureShape::Circle { .. } => defaults.circle_material,
        })
    }

    /// Validate shape and material
    pub fn validate(&self) -> PhysicsResult<()> {
        self.shape.validate()?;
        if let Some(material) = &self.material {
            material.validate()?;
        }
        Ok(())
    }
}
