//! Scene serialization
//!
//! A [`Scene`] describes one World: its gravity, named fixture templates,
//! bodies (with their fixtures and optional render objects), hinges between
//! bodies, and the contact callback names. Scenes are stored as RON files.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;

use planar_math::Vec2;
use planar_physics::{BodyKind, CallbackNames, FixtureTemplate, PhysicsError};
use serde::{Serialize, Deserialize};

/// A fixture in a body template: a named template or an inline description
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FixtureSpec {
    /// Refers to an entry of [`Scene::templates`]
    Template(String),
    /// Described in place
    Inline(FixtureTemplate),
}

/// A body to create when the scene is instantiated
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyTemplate {
    /// Scene-local name used by joints; the World assigns the real name
    pub alias: String,
    pub kind: BodyKind,
    #[serde(default)]
    pub position: Vec2,
    /// Initial angle in degrees
    #[serde(default)]
    pub angle_deg: f32,
    #[serde(default)]
    pub fixtures: Vec<FixtureSpec>,
    /// Name of a render object to create and drive from this body
    #[serde(default)]
    pub render_object: Option<String>,
}

impl BodyTemplate {
    pub fn new(alias: impl Into<String>, kind: BodyKind, position: Vec2) -> Self {
        Self {
            alias: alias.into(),
            kind,
            position,
            angle_deg: 0.0,
            fixtures: Vec::new(),
            render_object: None,
        }
    }

    pub fn with_angle(mut self, angle_deg: f32) -> Self {
        self.angle_deg = angle_deg;
        self
    }

    pub fn with_fixture(mut self, fixture: FixtureTemplate) -> Self {
        self.fixtures.push(FixtureSpec::Inline(fixture));
        self
    }

    pub fn with_template(mut self, name: impl Into<String>) -> Self {
        self.fixtures.push(FixtureSpec::Template(name.into()));
        self
    }

    pub fn with_render_object(mut self, name: impl Into<String>) -> Self {
        self.render_object = Some(name.into());
        self
    }
}

/// A revolute joint between two bodies, by alias
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointTemplate {
    pub body_a: String,
    pub body_b: String,
    /// Anchor in body A's local frame
    #[serde(default)]
    pub anchor_a: Vec2,
    /// Anchor in body B's local frame
    #[serde(default)]
    pub anchor_b: Vec2,
    /// Angle limits `[lower, upper]` in degrees; +/-45 when absent
    #[serde(default)]
    pub limits_deg: Option<[f32; 2]>,
}

impl JointTemplate {
    pub fn new(body_a: impl Into<String>, body_b: impl Into<String>) -> Self {
        Self {
            body_a: body_a.into(),
            body_b: body_b.into(),
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            limits_deg: None,
        }
    }

    pub fn with_anchors(mut self, anchor_a: Vec2, anchor_b: Vec2) -> Self {
        self.anchor_a = anchor_a;
        self.anchor_b = anchor_b;
        self
    }

    pub fn with_limits_deg(mut self, lower: f32, upper: f32) -> Self {
        self.limits_deg = Some([lower, upper]);
        self
    }
}

/// A serializable description of one World
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Scene name; becomes the World name
    pub name: String,
    /// Gravity override `[x, y]`
    #[serde(default)]
    pub gravity: Option<[f32; 2]>,
    /// Fixture templates registered in the World before bodies are built
    #[serde(default)]
    pub templates: BTreeMap<String, FixtureTemplate>,
    #[serde(default)]
    pub bodies: Vec<BodyTemplate>,
    #[serde(default)]
    pub joints: Vec<JointTemplate>,
    #[serde(default)]
    pub callbacks: CallbackNames,
}

impl Scene {
    /// Create a new empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Load a scene from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let contents = fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    /// Parse a scene from RON text
    pub fn from_ron(contents: &str) -> Result<Self, SceneError> {
        Ok(ron::from_str(contents)?)
    }

    /// Serialize to pretty RON text
    pub fn to_ron(&self) -> Result<String, SceneError> {
        let pretty = ron::ser::PrettyConfig::new()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Save a scene to a RON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SceneError> {
        fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    pub fn with_gravity(mut self, x: f32, y: f32) -> Self {
        self.gravity = Some([x, y]);
        self
    }

    pub fn add_template(&mut self, name: impl Into<String>, template: FixtureTemplate) {
        self.templates.insert(name.into(), template);
    }

    pub fn add_body(&mut self, body: BodyTemplate) {
        self.bodies.push(body);
    }

    pub fn add_joint(&mut self, joint: JointTemplate) {
        self.joints.push(joint);
    }

    /// Check aliases and template references, returning every problem found
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        let mut aliases = HashSet::new();
        for body in &self.bodies {
            if !aliases.insert(body.alias.as_str()) {
                errors.push(ValidationError::DuplicateAlias(body.alias.clone()));
            }
            for fixture in &body.fixtures {
                if let FixtureSpec::Template(name) = fixture {
                    if !self.templates.contains_key(name) {
                        errors.push(ValidationError::UnknownTemplate {
                            body: body.alias.clone(),
                            template: name.clone(),
                        });
                    }
                }
            }
        }

        for joint in &self.joints {
            for alias in [&joint.body_a, &joint.body_b] {
                if !aliases.contains(alias.as_str()) {
                    errors.push(ValidationError::UnknownAlias(alias.clone()));
                }
            }
        }

        if let Some([x, y]) = self.gravity {
            if !(x.is_finite() && y.is_finite()) {
                errors.push(ValidationError::NonFiniteGravity);
            }
        }

        errors
    }
}

/// Problem found by [`Scene::validate`]
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Two bodies share an alias
    DuplicateAlias(String),
    /// A joint names a body alias that does not exist
    UnknownAlias(String),
    /// A body uses a fixture template the scene does not define
    UnknownTemplate { body: String, template: String },
    /// Gravity override is NaN or infinite
    NonFiniteGravity,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::DuplicateAlias(alias) => write!(f, "Duplicate body alias: '{}'", alias),
            ValidationError::UnknownAlias(alias) => write!(f, "Joint refers to unknown body '{}'", alias),
            ValidationError::UnknownTemplate { body, template } => {
                write!(f, "Body '{}' uses unknown fixture template '{}'", body, template)
            }
            ValidationError::NonFiniteGravity => write!(f, "Gravity must be finite"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Error loading, saving or instantiating a scene
#[derive(Debug)]
pub enum SceneError {
    /// IO error (file not found, permission denied, etc.)
    Io(io::Error),
    /// Parse error (invalid RON syntax)
    Parse(ron::error::SpannedError),
    /// Serialization error
    Serialize(ron::Error),
    /// The scene failed validation
    Invalid(Vec<ValidationError>),
    /// The physics binding rejected part of the scene
    Physics(PhysicsError),
}

impl From<io::Error> for SceneError {
    fn from(e: io::Error) -> Self {
        SceneError::Io(e)
    }
}

impl From<ron::error::SpannedError> for SceneError {
    fn from(e: ron::error::SpannedError) -> Self {
        SceneError::Parse(e)
    }
}

impl From<ron::Error> for SceneError {
    fn from(e: ron::Error) -> Self {
        SceneError::Serialize(e)
    }
}

impl From<PhysicsError> for SceneError {
    fn from(e: PhysicsError) -> Self {
        SceneError::Physics(e)
    }
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::Io(e) => write!(f, "IO error: {}", e),
            SceneError::Parse(e) => write!(f, "Parse error: {}", e),
            SceneError::Serialize(e) => write!(f, "Serialize error: {}", e),
            SceneError::Invalid(errors) => {
                write!(f, "Invalid scene:")?;
                for error in errors {
                    write!(f, " {};", error)?;
                }
                Ok(())
            }
            SceneError::Physics(e) => write!(f, "Physics error: {}", e),
        }
    }
}

impl std::error::Error for SceneError {}
