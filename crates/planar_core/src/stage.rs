//! The stage: render objects plus the physics binding that drives them
//!
//! A World is owned by a render object tagged with the physics type. Deleting
//! that object tears the World down first.

use std::collections::HashMap;

use planar_math::{deg_to_rad, Vec2};
use planar_physics::{
    ContactKind, PhysicsBinding, PhysicsError, PhysicsResult, RevoluteJointDesc, TypeRegistry, WorldConfig, WorldId,
};

use crate::objects::{RenderObject, RenderObjects};
use crate::scene::{FixtureSpec, Scene, SceneError};

/// Result of instantiating a [`Scene`]
#[derive(Clone, Debug, PartialEq)]
pub struct SceneInstance {
    pub world: WorldId,
    /// Id of the object that owns the World
    pub owner: usize,
    /// Scene alias -> generated body name
    pub bodies: HashMap<String, String>,
}

impl SceneInstance {
    /// Generated body name for a scene alias
    pub fn body(&self, alias: &str) -> Option<&str> {
        self.bodies.get(alias).map(String::as_str)
    }
}

/// Render objects and physics Worlds living together
pub struct Stage {
    objects: RenderObjects,
    physics: PhysicsBinding,
}

impl Stage {
    /// Create a stage, registering the physics type with the host
    pub fn new(types: &mut TypeRegistry) -> Self {
        Self::with_config(types, WorldConfig::default())
    }

    pub fn with_config(types: &mut TypeRegistry, config: WorldConfig) -> Self {
        Self {
            objects: RenderObjects::new(),
            physics: PhysicsBinding::with_config(types, config),
        }
    }

    pub fn objects(&self) -> &RenderObjects {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut RenderObjects {
        &mut self.objects
    }

    pub fn physics(&self) -> &PhysicsBinding {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsBinding {
        &mut self.physics
    }

    /// Add a plain render object
    pub fn spawn_object(&mut self, object: RenderObject) -> usize {
        self.objects.spawn(object)
    }

    /// Create a World and the object that owns it
    pub fn spawn_world(&mut self, name: &str) -> PhysicsResult<(usize, WorldId)> {
        let config = self.physics.config().clone();
        self.spawn_world_with(name, config)
    }

    pub fn spawn_world_with(&mut self, name: &str, config: WorldConfig) -> PhysicsResult<(usize, WorldId)> {
        let world = self.physics.create_world_with(name, config)?;
        let owner = self
            .objects
            .spawn(RenderObject::new(name).owning(self.physics.type_tag(), world));
        Ok((owner, world))
    }

    /// World owned by an object, if any
    pub fn world_of(&self, object_id: usize) -> Option<WorldId> {
        self.objects.get(object_id).and_then(|o| o.owned_world)
    }

    /// Remove an object, tearing down its World first
    pub fn delete_object(&mut self, id: usize) -> Option<RenderObject> {
        if let Some(world) = self.world_of(id) {
            match self.physics.destroy_world(world) {
                Ok(report) => log::info!(
                    "Destroyed world {} with object {} ({} bodies freed)",
                    world,
                    id,
                    report.bodies_freed
                ),
                Err(e) => log::warn!("Failed to destroy world {} owned by object {}: {}", world, id, e),
            }
        }
        self.objects.remove(id)
    }

    /// Per-frame update of every World
    pub fn update(&mut self, now_ms: f64, frame_seconds: f32) -> PhysicsResult<()> {
        self.physics.update_all(now_ms, frame_seconds, &mut self.objects)
    }

    /// Step one World by a fixed amount
    pub fn step(&mut self, world: WorldId, elapsed: f32) -> PhysicsResult<()> {
        self.physics.step(world, elapsed, &mut self.objects)
    }

    /// Build a World from a scene description
    ///
    /// The scene is validated first. If any part fails to build, the World
    /// and every object created for it are removed again.
    pub fn instantiate(&mut self, scene: &Scene) -> Result<SceneInstance, SceneError> {
        let errors = scene.validate();
        if !errors.is_empty() {
            return Err(SceneError::Invalid(errors));
        }

        let mut config = self.physics.config().clone();
        if let Some([x, y]) = scene.gravity {
            config.gravity = Vec2::new(x, y);
        }

        let first_object = self.objects.len();
        let (owner, world) = self.spawn_world_with(&scene.name, config)?;

        match self.populate(world, scene) {
            Ok(bodies) => {
                log::info!("Instantiated scene '{}' as world {} ({} bodies)", scene.name, world, bodies.len());
                Ok(SceneInstance { world, owner, bodies })
            }
            Err(e) => {
                log::warn!("Scene '{}' failed to build: {}", scene.name, e);
                if let Err(teardown) = self.physics.destroy_world(world) {
                    log::warn!("Failed to destroy partial world {}: {}", world, teardown);
                }
                while self.objects.len() > first_object {
                    self.objects.remove(self.objects.len() - 1);
                }
                Err(e.into())
            }
        }
    }

    fn populate(&mut self, world_id: WorldId, scene: &Scene) -> PhysicsResult<HashMap<String, String>> {
        let tag = self.physics.type_tag();
        let world = self.physics.world_mut(world_id)?;

        for (name, template) in &scene.templates {
            world.define_fixture_template(name, template.clone())?;
        }

        let mut bodies = HashMap::new();
        for body in &scene.bodies {
            let name = world.create_body(body.kind, body.position, body.angle_deg)?;
            for fixture in &body.fixtures {
                match fixture {
                    FixtureSpec::Template(template) => world.create_template_fixture(&name, template)?,
                    FixtureSpec::Inline(template) => {
                        world.create_fixture(&name, template)?;
                    }
                }
            }
            if let Some(object) = &body.render_object {
                let mut render = RenderObject::new(object.as_str());
                render.type_tag = Some(tag);
                let object_id = self.objects.spawn(render);
                world.link_body(&name, object_id)?;
            }
            bodies.insert(body.alias.clone(), name);
        }

        for joint in &scene.joints {
            let (a, b) = match (bodies.get(&joint.body_a), bodies.get(&joint.body_b)) {
                (Some(a), Some(b)) => (a, b),
                _ => {
                    return Err(PhysicsError::Validation(format!(
                        "joint between unknown bodies '{}' and '{}'",
                        joint.body_a, joint.body_b
                    )))
                }
            };
            let mut desc = RevoluteJointDesc::new(joint.anchor_a, joint.anchor_b);
            if let Some([lower, upper]) = joint.limits_deg {
                desc = desc.with_limits(deg_to_rad(lower), deg_to_rad(upper));
            }
            world.create_revolute_joint(a, b, &desc)?;
        }

        for kind in [ContactKind::Begin, ContactKind::End, ContactKind::PreSolve, ContactKind::PostSolve] {
            world.set_callback(kind, scene.callbacks.get(kind).map(str::to_string));
        }

        Ok(bodies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{BodyTemplate, JointTemplate};
    use planar_physics::{BodyKind, FixtureShape, FixtureTemplate};

    fn stage() -> Stage {
        Stage::new(&mut TypeRegistry::new())
    }

    fn pendulum() -> Scene {
        let mut scene = Scene::new("pendulum").with_gravity(0.0, -9.8);
        scene.add_template("bob", FixtureTemplate::new(FixtureShape::circle(0.25)));
        scene.add_body(BodyTemplate::new("anchor", BodyKind::Static, Vec2::new(0.0, 5.0)));
        scene.add_body(
            BodyTemplate::new("bob", BodyKind::Dynamic, Vec2::new(1.0, 5.0))
                .with_template("bob")
                .with_render_object("bob_sprite"),
        );
        scene.add_joint(JointTemplate::new("anchor", "bob").with_anchors(Vec2::ZERO, Vec2::new(-1.0, 0.0)));
        scene.callbacks.begin_contact = Some("onTouch".into());
        scene
    }

    #[test]
    fn test_spawn_world_tags_owner() {
        let mut stage = stage();
        let (owner, world) = stage.spawn_world("arena").unwrap();

        let object = stage.objects().get(owner).unwrap();
        assert_eq!(object.type_tag, Some(stage.physics().type_tag()));
        assert_eq!(stage.world_of(owner), Some(world));
        assert_eq!(stage.physics().world_name(world).unwrap(), "arena");
    }

    #[test]
    fn test_delete_object_destroys_world() {
        let mut stage = stage();
        let (owner, world) = stage.spawn_world("arena").unwrap();
        stage.physics_mut().create_body(world, 2, 0.0, 0.0, 0.0).unwrap();

        let removed = stage.delete_object(owner).unwrap();
        assert_eq!(removed.name, "arena");
        assert_eq!(stage.physics().world_count(), 0);
        assert!(stage.objects().is_empty());
    }

    #[test]
    fn test_delete_plain_object_leaves_worlds() {
        let mut stage = stage();
        stage.spawn_world("arena").unwrap();
        let plain = stage.spawn_object(RenderObject::new("sprite"));

        stage.delete_object(plain);
        assert_eq!(stage.physics().world_count(), 1);
        assert!(stage.delete_object(10).is_none());
    }

    #[test]
    fn test_instantiate_pendulum() {
        let mut stage = stage();
        let instance = stage.instantiate(&pendulum()).unwrap();

        let world = stage.physics().world(instance.world).unwrap();
        assert_eq!(world.name(), "pendulum");
        assert_eq!(world.body_count(), 2);
        assert_eq!(world.joint_count(), 1);
        assert_eq!(world.config().gravity, Vec2::new(0.0, -9.8));
        assert_eq!(world.callbacks().begin_contact.as_deref(), Some("onTouch"));
        assert!(world.fixture_template("bob").is_some());

        let bob = instance.body("bob").unwrap();
        let link = world.body_link(bob).unwrap().unwrap();
        assert_eq!(stage.objects().get(link.object_id).unwrap().name, "bob_sprite");
        assert_eq!(stage.world_of(instance.owner), Some(instance.world));
    }

    #[test]
    fn test_instantiate_rejects_invalid_scene() {
        let mut stage = stage();
        let mut scene = pendulum();
        scene.add_joint(JointTemplate::new("bob", "nobody"));

        let result = stage.instantiate(&scene);
        assert!(matches!(result, Err(SceneError::Invalid(_))));
        assert_eq!(stage.physics().world_count(), 0);
        assert!(stage.objects().is_empty());
    }

    #[test]
    fn test_failed_build_rolls_back() {
        let mut stage = stage();
        stage.spawn_object(RenderObject::new("keep"));

        let mut scene = pendulum();
        // Valid structure, but the engine rejects a negative radius
        scene.add_body(
            BodyTemplate::new("bad", BodyKind::Dynamic, Vec2::ZERO)
                .with_render_object("bad_sprite")
                .with_fixture(FixtureTemplate::new(FixtureShape::circle(-1.0))),
        );

        let result = stage.instantiate(&scene);
        assert!(matches!(result, Err(SceneError::Physics(ref e)) if e.to_string().contains("radius")));
        assert_eq!(stage.physics().world_count(), 0);
        assert_eq!(stage.objects().len(), 1);
        assert_eq!(stage.objects().get(0).unwrap().name, "keep");
    }

    #[test]
    fn test_step_and_update_interleave() {
        let mut stage = stage();
        let (_, a) = stage.spawn_world("a").unwrap();
        let (_, b) = stage.spawn_world("b").unwrap();
        let body = stage.physics_mut().create_body(b, 2, 0.0, 10.0, 0.0).unwrap();

        stage.step(b, 1.0).unwrap();
        let after_step = stage.physics().get_body_info(b, &body).unwrap().position.y;

        stage.update(16.0, 1.0 / 60.0).unwrap();
        stage.update(32.0, 1.0 / 60.0).unwrap();
        stage.step(b, 1.0 / 60.0).unwrap();
        stage.update(48.0, 1.0 / 60.0).unwrap();

        assert_eq!(stage.physics().world(a).unwrap().clock().current_ms(), 48.0);
        assert!(stage.physics().world(b).unwrap().clock().current_ms() > 1000.0);
        assert!(stage.physics().get_body_info(b, &body).unwrap().position.y < after_step);
    }

    #[test]
    fn test_update_moves_linked_objects() {
        let mut stage = stage();
        let instance = stage.instantiate(&pendulum()).unwrap();
        let bob = instance.body("bob").unwrap().to_string();
        let object_id = stage
            .physics()
            .world(instance.world)
            .unwrap()
            .body_link(&bob)
            .unwrap()
            .unwrap()
            .object_id;

        for frame in 1..=30 {
            stage.update(frame as f64 * 16.0, 1.0 / 60.0).unwrap();
        }

        let pose = stage.physics().get_body_info(instance.world, &bob).unwrap();
        assert!(pose.position.y < 5.0);
        let model = stage.objects().get(object_id).unwrap().model;
        assert!((model[3][0] - pose.position.x).abs() < 1e-5);
        assert!((model[3][1] - pose.position.y).abs() < 1e-5);
    }
}
