//! SceneBuilder - Declarative scene construction
//!
//! Provides a fluent API for building 2D physics scenes.

use planar_core::{BodyTemplate, JointTemplate, Scene};
use planar_math::Vec2;
use planar_physics::{BodyKind, FixtureShape, FixtureTemplate};

/// Builder for constructing scenes
///
/// # Example
/// ```ignore
/// let scene = SceneBuilder::new("demo")
///     .with_gravity(0.0, -10.0)
///     .add_ground(0.0, 20.0)
///     .add_box("crate", Vec2::new(0.0, 4.0), 1.0)
///     .on_begin_contact("onBeginContact")
///     .build();
/// ```
pub struct SceneBuilder {
    scene: Scene,
}

impl SceneBuilder {
    /// Create a new scene builder
    pub fn new(name: &str) -> Self {
        Self {
            scene: Scene::new(name),
        }
    }

    /// Override the World's gravity
    pub fn with_gravity(mut self, x: f32, y: f32) -> Self {
        self.scene.gravity = Some([x, y]);
        self
    }

    /// Register a named fixture template
    pub fn add_template(mut self, name: &str, template: FixtureTemplate) -> Self {
        self.scene.add_template(name, template);
        self
    }

    /// Add a static ground slab whose top surface is at `y`
    ///
    /// The ground has alias "ground" and no render object.
    pub fn add_ground(mut self, y: f32, width: f32) -> Self {
        self.scene.add_body(
            BodyTemplate::new("ground", BodyKind::Static, Vec2::new(0.0, y - 0.5))
                .with_fixture(FixtureTemplate::new(FixtureShape::rect(width, 1.0))),
        );
        self
    }

    /// Add a dynamic square box with a render object named after it
    pub fn add_box(mut self, alias: &str, position: Vec2, size: f32) -> Self {
        self.scene.add_body(
            BodyTemplate::new(alias, BodyKind::Dynamic, position)
                .with_fixture(FixtureTemplate::new(FixtureShape::rect(size, size)))
                .with_render_object(alias),
        );
        self
    }

    /// Add a dynamic ball with a render object named after it
    pub fn add_ball(mut self, alias: &str, position: Vec2, radius: f32) -> Self {
        self.scene.add_body(
            BodyTemplate::new(alias, BodyKind::Dynamic, position)
                .with_fixture(FixtureTemplate::new(FixtureShape::circle(radius)))
                .with_render_object(alias),
        );
        self
    }

    /// Add any body template
    pub fn add_body(mut self, body: BodyTemplate) -> Self {
        self.scene.add_body(body);
        self
    }

    /// Hinge two bodies at local anchors
    pub fn add_hinge(mut self, body_a: &str, body_b: &str, anchor_a: Vec2, anchor_b: Vec2) -> Self {
        self.scene
            .add_joint(JointTemplate::new(body_a, body_b).with_anchors(anchor_a, anchor_b));
        self
    }

    pub fn on_begin_contact(mut self, name: &str) -> Self {
        self.scene.callbacks.begin_contact = Some(name.to_string());
        self
    }

    pub fn on_end_contact(mut self, name: &str) -> Self {
        self.scene.callbacks.end_contact = Some(name.to_string());
        self
    }

    pub fn on_pre_solve(mut self, name: &str) -> Self {
        self.scene.callbacks.pre_solve = Some(name.to_string());
        self
    }

    /// Build and return the scene
    pub fn build(self) -> Scene {
        self.scene
    }

    /// The scene the demo binary falls back to when no scene file loads
    pub fn demo() -> Scene {
        SceneBuilder::new("demo")
            .add_ground(0.0, 20.0)
            .add_box("crate", Vec2::new(-2.0, 4.0), 1.0)
            .add_ball("ball", Vec2::new(2.0, 6.0), 0.5)
            .add_body(BodyTemplate::new("post", BodyKind::Static, Vec2::new(0.0, 8.0)))
            .add_box("paddle", Vec2::new(1.0, 8.0), 0.5)
            .add_hinge("post", "paddle", Vec2::ZERO, Vec2::new(-1.0, 0.0))
            .on_begin_contact("onBeginContact")
            .on_end_contact("onEndContact")
            .build()
    }
}
