//! Physics world: one simulation and the registries that name its contents
//!
//! A [`World`] owns exactly one engine instance, the arena of body records,
//! the body name registry, the fixture-template registry, the contact
//! dispatcher and the simulation clock.
//!
//! Every operation validates its arguments and resolves every name before it
//! touches the engine, so a failed call leaves the World unchanged.

use std::collections::HashMap;

use planar_math::{deg_to_rad, Vec2};
use rapier2d::prelude::{
    vector, ActiveEvents, ActiveHooks, CoefficientCombineRule, ColliderHandle, Isometry, RigidBody,
    RigidBodyBuilder, RigidBodyHandle,
};
use slotmap::SlotMap;

use crate::binding::WorldId;
use crate::body::{key_from_user_data, key_to_user_data, BodyKey, BodyKind, BodyKindMask, BodyPose, BodyRecord, RenderLink};
use crate::clock::SimClock;
use crate::contact::{CallbackNames, ContactDispatcher, ContactEvent, ContactHandler, ContactKind, DispatchState, RawContact};
use crate::engine::{solver_iterations, Engine};
use crate::error::{check_finite, PhysicsError, PhysicsResult};
use crate::filter::{FilterData, FilterUpdate};
use crate::fixture::{FixtureDefaults, FixtureShape, FixtureTemplate};
use crate::host::{RenderTargets, TypeTag};
use crate::joint::RevoluteJointDesc;
use crate::registry::NameRegistry;
use crate::sync;

/// Settings a new World starts from
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    /// Gravity acceleration
    pub gravity: Vec2,
    /// Solver velocity iterations per step
    pub velocity_iterations: u32,
    /// Solver position iterations per step
    pub position_iterations: u32,
    /// Linear damping given to every new body
    pub linear_damping: f32,
    /// Angular damping given to every new body
    pub angular_damping: f32,
    /// Materials for the box and circle fixture commands
    pub fixtures: FixtureDefaults,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -10.0),
            velocity_iterations: 6,
            position_iterations: 2,
            linear_damping: 0.0,
            angular_damping: 0.01,
            fixtures: FixtureDefaults::default(),
        }
    }
}

impl WorldConfig {
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_iterations(mut self, velocity: u32, position: u32) -> Self {
        self.velocity_iterations = velocity;
        self.position_iterations = position;
        self
    }
}

// Only reachable if the engine loses a body between lookup and use
fn missing_body(name: &str) -> PhysicsError {
    PhysicsError::RegistryCorruption(format!("body '{}' refers to a missing engine body", name))
}

/// What tearing down a World released
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeardownReport {
    /// Body records freed while their engine bodies were still enumerable
    pub bodies_freed: usize,
    /// Entries left in the body registry afterwards (always zero)
    pub registry_remaining: usize,
}

/// One simulation with named bodies
pub struct World {
    id: WorldId,
    name: String,
    type_tag: TypeTag,
    config: WorldConfig,
    engine: Engine,
    records: SlotMap<BodyKey, BodyRecord>,
    names: NameRegistry<BodyKey>,
    templates: NameRegistry<FixtureTemplate>,
    dispatcher: ContactDispatcher,
    callbacks: CallbackNames,
    handler: Option<ContactHandler>,
    /// Names of bodies destroyed since the last step, for their end contacts
    departed: HashMap<BodyKey, String>,
    clock: SimClock,
    next_body: u64,
}

impl World {
    /// Create a World; fails if the engine cannot be built from `config`
    pub fn new(id: WorldId, name: impl Into<String>, type_tag: TypeTag, config: WorldConfig) -> PhysicsResult<Self> {
        for (what, value) in [
            ("linear damping", config.linear_damping),
            ("angular damping", config.angular_damping),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PhysicsError::ResourceCreation(format!(
                    "{} must be a non-negative number, got {}",
                    what, value
                )));
            }
        }
        let engine = Engine::new(config.gravity, config.velocity_iterations, config.position_iterations)?;

        Ok(Self {
            id,
            name: name.into(),
            type_tag,
            config,
            engine,
            records: SlotMap::with_key(),
            names: NameRegistry::new(),
            templates: NameRegistry::new(),
            dispatcher: ContactDispatcher::new(),
            callbacks: CallbackNames::default(),
            handler: None,
            departed: HashMap::new(),
            clock: SimClock::new(),
            next_body: 0,
        })
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    /// Name passed to contact callbacks
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn body_count(&self) -> usize {
        self.names.len()
    }

    pub fn joint_count(&self) -> usize {
        self.engine.impulse_joints.len()
    }

    pub fn dispatch_state(&self) -> DispatchState {
        self.dispatcher.state()
    }

    /// Contact manifolds whose points are tracked for pre-solve
    pub fn tracked_manifolds(&self) -> usize {
        self.dispatcher.tracked_manifolds()
    }

    // --- Registry ---

    fn corruption(&self, name: &str, what: &str) -> PhysicsError {
        log::error!("World '{}': body '{}' {}", self.name, name, what);
        PhysicsError::RegistryCorruption(format!("body '{}' {}", name, what))
    }

    /// Resolve a body name to its arena key and engine handle
    fn lookup(&self, name: &str) -> PhysicsResult<(BodyKey, RigidBodyHandle)> {
        let key = *self
            .names
            .get(name)
            .ok_or_else(|| PhysicsError::BodyNotFound(name.to_string()))?;
        let record = self
            .records
            .get(key)
            .ok_or_else(|| self.corruption(name, "has no body record"))?;
        if !self.engine.bodies.contains(record.handle) {
            return Err(self.corruption(name, "refers to a missing engine body"));
        }
        Ok((key, record.handle))
    }

    fn body_mut(&mut self, name: &str) -> PhysicsResult<&mut RigidBody> {
        let (_, handle) = self.lookup(name)?;
        self.engine.bodies.get_mut(handle).ok_or_else(|| missing_body(name))
    }

    fn body_ref(&self, name: &str) -> PhysicsResult<&RigidBody> {
        let (_, handle) = self.lookup(name)?;
        self.engine
            .bodies
            .get(handle)
            .ok_or_else(|| self.corruption(name, "refers to a missing engine body"))
    }

    /// True if a body with this name exists
    pub fn contains_body(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    // --- Bodies ---

    /// Create a body and return its generated name
    pub fn create_body(&mut self, kind: BodyKind, position: Vec2, angle_deg: f32) -> PhysicsResult<String> {
        check_finite("x", position.x)?;
        check_finite("y", position.y)?;
        check_finite("angle", angle_deg)?;

        let name = format!("body{}", self.next_body);
        let builder = RigidBodyBuilder::new(kind.to_rapier())
            .translation(vector![position.x, position.y])
            .rotation(deg_to_rad(angle_deg))
            .linear_damping(self.config.linear_damping)
            .angular_damping(self.config.angular_damping)
            // Unit mass until the first fixture gives the body its own
            .additional_mass(1.0);

        let engine = &mut self.engine;
        let key = self.records.insert_with_key(|key| {
            let handle = engine
                .bodies
                .insert(builder.user_data(key_to_user_data(key)).build());
            BodyRecord::new(name.clone(), handle)
        });
        self.names.insert(name.clone(), key);
        self.next_body += 1;

        log::debug!("World '{}': created {:?} body '{}'", self.name, kind, name);
        Ok(name)
    }

    /// Remove a body with its fixtures and any joints attached to it
    ///
    /// Contacts the body was part of end during the next step, and the end
    /// callback still receives its name.
    pub fn destroy_body(&mut self, name: &str) -> PhysicsResult<()> {
        let (key, handle) = self.lookup(name)?;
        if let Some(body) = self.engine.bodies.get(handle) {
            self.dispatcher.mark_departed(body.colliders(), key);
        }
        self.engine.remove_body(handle);
        if let Some(record) = self.records.remove(key) {
            self.departed.insert(key, record.name);
        }
        self.names.remove(name);
        log::debug!("World '{}': destroyed body '{}'", self.name, name);
        Ok(())
    }

    /// Names of the bodies whose kind the mask selects, in creation order
    pub fn bodies(&self, mask: BodyKindMask) -> Vec<String> {
        self.records
            .values()
            .filter(|record| {
                self.engine
                    .bodies
                    .get(record.handle)
                    .map(|body| mask.selects(BodyKind::from_rapier(body.body_type())))
                    .unwrap_or(false)
            })
            .map(|record| record.name.clone())
            .collect()
    }

    pub fn body_kind(&self, name: &str) -> PhysicsResult<BodyKind> {
        Ok(BodyKind::from_rapier(self.body_ref(name)?.body_type()))
    }

    pub fn set_body_kind(&mut self, name: &str, kind: BodyKind) -> PhysicsResult<()> {
        self.body_mut(name)?.set_body_type(kind.to_rapier(), true);
        Ok(())
    }

    /// Position and angle (radians) of a body
    pub fn body_pose(&self, name: &str) -> PhysicsResult<BodyPose> {
        let body = self.body_ref(name)?;
        let translation = body.translation();
        Ok(BodyPose {
            position: Vec2::new(translation.x, translation.y),
            angle: body.rotation().angle(),
        })
    }

    pub fn body_velocity(&self, name: &str) -> PhysicsResult<Vec2> {
        let velocity = self.body_ref(name)?.linvel();
        Ok(Vec2::new(velocity.x, velocity.y))
    }

    /// Move a body directly; the angle is in degrees
    pub fn set_transform(&mut self, name: &str, position: Vec2, angle_deg: f32) -> PhysicsResult<()> {
        check_finite("x", position.x)?;
        check_finite("y", position.y)?;
        check_finite("angle", angle_deg)?;
        let body = self.body_mut(name)?;
        body.set_position(
            Isometry::new(vector![position.x, position.y], deg_to_rad(angle_deg)),
            true,
        );
        Ok(())
    }

    /// Push on the body's center of mass until the end of the next step
    pub fn apply_force(&mut self, name: &str, force: Vec2) -> PhysicsResult<()> {
        check_finite("force x", force.x)?;
        check_finite("force y", force.y)?;
        self.body_mut(name)?.add_force(vector![force.x, force.y], true);
        Ok(())
    }

    /// Change the body's momentum at its center of mass immediately
    pub fn apply_linear_impulse(&mut self, name: &str, impulse: Vec2) -> PhysicsResult<()> {
        check_finite("impulse x", impulse.x)?;
        check_finite("impulse y", impulse.y)?;
        self.body_mut(name)?.apply_impulse(vector![impulse.x, impulse.y], true);
        Ok(())
    }

    /// Set the force and torque re-applied before every step
    pub fn set_constant_force(&mut self, name: &str, force: Vec2, torque: f32) -> PhysicsResult<()> {
        check_finite("force x", force.x)?;
        check_finite("force y", force.y)?;
        check_finite("torque", torque)?;
        let (key, _) = self.lookup(name)?;
        if let Some(record) = self.records.get_mut(key) {
            record.constant_force = force;
            record.constant_torque = torque;
        }
        Ok(())
    }

    /// Drive a render object's model matrix from this body
    pub fn link_body(&mut self, name: &str, object_id: usize) -> PhysicsResult<()> {
        let (key, _) = self.lookup(name)?;
        if let Some(record) = self.records.get_mut(key) {
            record.link = Some(RenderLink::new(object_id));
        }
        Ok(())
    }

    pub fn unlink_body(&mut self, name: &str) -> PhysicsResult<()> {
        let (key, _) = self.lookup(name)?;
        if let Some(record) = self.records.get_mut(key) {
            record.link = None;
        }
        Ok(())
    }

    /// Render link of a body, if any
    pub fn body_link(&self, name: &str) -> PhysicsResult<Option<RenderLink>> {
        let (key, _) = self.lookup(name)?;
        Ok(self.records.get(key).and_then(|record| record.link))
    }

    // --- Fixtures ---

    /// Attach a fixture described by a template to a body
    pub fn create_fixture(&mut self, body: &str, template: &FixtureTemplate) -> PhysicsResult<ColliderHandle> {
        template.validate()?;
        let (_, handle) = self.lookup(body)?;

        let material = template.resolved_material(&self.config.fixtures);
        let filter = template.filter.unwrap_or_default();
        let collider = template
            .shape
            .collider_builder()
            .density(material.density)
            .friction(material.friction)
            .restitution(material.restitution)
            .restitution_combine_rule(CoefficientCombineRule::Max)
            .sensor(template.sensor)
            .user_data(filter.to_user_data())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .active_hooks(
                ActiveHooks::FILTER_CONTACT_PAIRS
                    | ActiveHooks::FILTER_INTERSECTION_PAIR
                    | ActiveHooks::MODIFY_SOLVER_CONTACTS,
            )
            .build();

        let engine = &mut self.engine;
        if let Some(body) = engine.bodies.get_mut(handle) {
            if body.colliders().is_empty() {
                body.set_additional_mass(0.0, true);
            }
        }
        Ok(engine.colliders.insert_with_parent(collider, handle, &mut engine.bodies))
    }

    /// Attach a box; width and height are full extents, the angle is in degrees
    pub fn create_box_fixture(
        &mut self,
        body: &str,
        width: f32,
        height: f32,
        offset: Vec2,
        angle_deg: f32,
    ) -> PhysicsResult<()> {
        let shape = FixtureShape::Box {
            width,
            height,
            offset,
            angle_deg,
        };
        self.create_fixture(body, &FixtureTemplate::new(shape))?;
        Ok(())
    }

    /// Attach a circle centered at `center` in body coordinates
    pub fn create_circle_fixture(&mut self, body: &str, center: Vec2, radius: f32) -> PhysicsResult<()> {
        self.create_fixture(body, &FixtureTemplate::new(FixtureShape::Circle { center, radius }))?;
        Ok(())
    }

    /// Register a named fixture template, replacing any with the same name
    pub fn define_fixture_template(&mut self, name: &str, template: FixtureTemplate) -> PhysicsResult<()> {
        template.validate()?;
        if self.templates.insert(name, template).is_some() {
            log::debug!("World '{}': replaced fixture template '{}'", self.name, name);
        }
        Ok(())
    }

    /// Attach a fixture built from a registered template
    pub fn create_template_fixture(&mut self, body: &str, template: &str) -> PhysicsResult<()> {
        let template = self
            .templates
            .get(template)
            .cloned()
            .ok_or_else(|| PhysicsError::TemplateNotFound(template.to_string()))?;
        self.create_fixture(body, &template)?;
        Ok(())
    }

    pub fn fixture_template(&self, name: &str) -> Option<&FixtureTemplate> {
        self.templates.get(name)
    }

    pub fn fixture_count(&self, body: &str) -> PhysicsResult<usize> {
        Ok(self.body_ref(body)?.colliders().len())
    }

    /// Filters of every fixture on a body, in attachment order
    pub fn fixture_filters(&self, body: &str) -> PhysicsResult<Vec<FilterData>> {
        let colliders = &self.engine.colliders;
        Ok(self
            .body_ref(body)?
            .colliders()
            .iter()
            .filter_map(|h| colliders.get(*h))
            .map(|c| FilterData::from_user_data(c.user_data))
            .collect())
    }

    /// Change the given filter fields on every fixture of a body
    pub fn set_filter_data(&mut self, body: &str, update: &FilterUpdate) -> PhysicsResult<()> {
        let (_, handle) = self.lookup(body)?;
        let engine = &mut self.engine;
        let rb = engine.bodies.get_mut(handle).ok_or_else(|| missing_body(body))?;
        rb.wake_up(true);
        for collider in rb.colliders() {
            if let Some(collider) = engine.colliders.get_mut(*collider) {
                collider.user_data = FilterData::from_user_data(collider.user_data)
                    .updated(update)
                    .to_user_data();
            }
        }
        Ok(())
    }

    /// Mark every fixture of a body as a sensor (or a solid)
    pub fn set_sensor(&mut self, body: &str, sensor: bool) -> PhysicsResult<()> {
        let (_, handle) = self.lookup(body)?;
        let engine = &mut self.engine;
        let rb = engine.bodies.get_mut(handle).ok_or_else(|| missing_body(body))?;
        rb.wake_up(true);
        for collider in rb.colliders() {
            if let Some(collider) = engine.colliders.get_mut(*collider) {
                collider.set_sensor(sensor);
            }
        }
        Ok(())
    }

    pub fn is_sensor(&self, body: &str) -> PhysicsResult<bool> {
        let colliders = &self.engine.colliders;
        let body = self.body_ref(body)?;
        Ok(!body.colliders().is_empty()
            && body
                .colliders()
                .iter()
                .all(|h| colliders.get(*h).map(|c| c.is_sensor()).unwrap_or(false)))
    }

    // --- Joints ---

    /// Connect two bodies with a revolute joint
    pub fn create_revolute_joint(&mut self, body_a: &str, body_b: &str, desc: &RevoluteJointDesc) -> PhysicsResult<()> {
        desc.validate()?;
        if body_a == body_b {
            return Err(PhysicsError::Validation(format!(
                "cannot join body '{}' to itself",
                body_a
            )));
        }
        let (_, handle_a) = self.lookup(body_a)?;
        let (_, handle_b) = self.lookup(body_b)?;
        self.engine.impulse_joints.insert(handle_a, handle_b, desc.build(), true);
        Ok(())
    }

    // --- Configuration ---

    pub fn gravity(&self) -> Vec2 {
        self.engine.gravity()
    }

    pub fn set_gravity(&mut self, gravity: Vec2) -> PhysicsResult<()> {
        check_finite("gravity x", gravity.x)?;
        check_finite("gravity y", gravity.y)?;
        self.engine.set_gravity(gravity);
        self.config.gravity = gravity;
        Ok(())
    }

    /// Solver (velocity, position) iteration counts
    pub fn iterations(&self) -> (u32, u32) {
        self.engine.iterations()
    }

    pub fn set_iterations(&mut self, velocity: u32, position: u32) -> PhysicsResult<()> {
        let (v, p) = solver_iterations(velocity, position)?;
        self.engine.set_iterations(v, p);
        self.config.velocity_iterations = velocity;
        self.config.position_iterations = position;
        Ok(())
    }

    // --- Contacts ---

    pub fn callbacks(&self) -> &CallbackNames {
        &self.callbacks
    }

    /// Name the callback for one contact kind; `None` stops dispatching it
    pub fn set_callback(&mut self, kind: ContactKind, name: Option<String>) {
        self.callbacks.set(kind, name);
    }

    /// Install the closure that receives dispatched contact events
    pub fn set_contact_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&str, &ContactEvent) + 'static,
    {
        self.handler = Some(Box::new(handler));
    }

    pub fn clear_contact_handler(&mut self) {
        self.handler = None;
    }

    fn dispatch_contacts(&mut self, contacts: Vec<RawContact>) {
        let Some(handler) = self.handler.as_mut() else {
            return;
        };
        for contact in contacts {
            let kind = contact.callback_kind();
            let Some(callback) = self.callbacks.get(kind) else {
                continue;
            };
            let resolve = |key: Option<BodyKey>| {
                key.and_then(|k| self.records.get(k).map(|r| &r.name).or_else(|| self.departed.get(&k)))
                    .cloned()
            };
            let (Some(body_a), Some(body_b)) = (resolve(contact.body_a), resolve(contact.body_b)) else {
                log::debug!(
                    "World '{}': skipping {:?} contact for a body without a record",
                    self.name,
                    kind
                );
                continue;
            };
            let event = contact.into_event(&self.name, body_a, body_b);
            handler(callback, &event);
        }
    }

    // --- Stepping ---

    fn simulate(&mut self, dt: f32) {
        if dt == 0.0 {
            return;
        }
        for record in self.records.values().filter(|r| r.has_constant_load()) {
            if let Some(body) = self.engine.bodies.get_mut(record.handle) {
                body.add_force(vector![record.constant_force.x, record.constant_force.y], true);
                body.add_torque(record.constant_torque, true);
            }
        }

        self.dispatcher.begin_step();
        self.engine.step(dt, &self.dispatcher, &self.dispatcher);
        let contacts = self.dispatcher.finish_step();
        self.engine.clear_forces();

        self.dispatch_contacts(contacts);
        self.departed.clear();
    }

    /// Copy linked body poses into the render objects
    pub fn sync_transforms(&mut self, targets: &mut dyn RenderTargets) -> usize {
        sync::sync_transforms(&mut self.records, &self.engine.bodies, targets)
    }

    /// Advance the clock and the simulation by `elapsed` seconds
    ///
    /// Zero elapsed time is valid: the engine is not stepped, but linked
    /// render objects are still synced.
    pub fn step(&mut self, elapsed: f32, targets: &mut dyn RenderTargets) -> PhysicsResult<()> {
        self.clock.advance(elapsed)?;
        self.simulate(elapsed);
        self.sync_transforms(targets);
        Ok(())
    }

    /// Per-frame update driven by the host clock
    pub fn update(&mut self, now_ms: f64, frame_seconds: f32, targets: &mut dyn RenderTargets) -> PhysicsResult<()> {
        self.clock.advance_frame(now_ms, frame_seconds)?;
        self.simulate(frame_seconds);
        self.sync_transforms(targets);
        Ok(())
    }

    /// Rewind the clock to zero; body poses are kept
    pub fn reset(&mut self) {
        self.clock.reset();
    }

    /// Free every body record, then drop the dispatcher and the engine
    pub fn teardown(mut self) -> TeardownReport {
        let mut bodies_freed = 0;
        for (_, body) in self.engine.bodies.iter() {
            if let Some(key) = key_from_user_data(body.user_data) {
                if self.records.remove(key).is_some() {
                    bodies_freed += 1;
                }
            }
        }
        if !self.records.is_empty() {
            log::error!(
                "World '{}': {} body records had no engine body",
                self.name,
                self.records.len()
            );
            self.records.clear();
        }
        self.names.clear();
        let registry_remaining = self.names.len();

        let World {
            name,
            handler,
            dispatcher,
            engine,
            ..
        } = self;
        drop(handler);
        drop(dispatcher);
        drop(engine);

        log::info!("Destroyed world '{}' ({} bodies freed)", name, bodies_freed);
        TeardownReport {
            bodies_freed,
            registry_remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TypeRegistry;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn world() -> World {
        let tag = TypeRegistry::new().register("physics");
        World::new(WorldId::from_raw(0), "world0", tag, WorldConfig::default()).unwrap()
    }

    #[test]
    fn test_new_world_defaults() {
        let w = world();
        assert_eq!(w.gravity(), Vec2::new(0.0, -10.0));
        assert_eq!(w.iterations(), (6, 2));
        assert_eq!(w.body_count(), 0);
        assert_eq!(w.clock().current_ms(), 0.0);
        assert_eq!(w.dispatch_state(), DispatchState::Idle);
    }

    #[test]
    fn test_bad_config_fails_creation() {
        let tag = TypeRegistry::new().register("physics");
        let config = WorldConfig::default().with_iterations(0, 2);
        assert!(matches!(
            World::new(WorldId::from_raw(0), "w", tag, config),
            Err(PhysicsError::ResourceCreation(_))
        ));

        let mut config = WorldConfig::default();
        config.angular_damping = -1.0;
        assert!(World::new(WorldId::from_raw(0), "w", tag, config).is_err());
    }

    #[test]
    fn test_sequential_names() {
        let mut w = world();
        assert_eq!(w.create_body(BodyKind::Static, Vec2::ZERO, 0.0).unwrap(), "body0");
        assert_eq!(w.create_body(BodyKind::Dynamic, Vec2::ZERO, 0.0).unwrap(), "body1");
        w.destroy_body("body0").unwrap();
        assert_eq!(w.create_body(BodyKind::Dynamic, Vec2::ZERO, 0.0).unwrap(), "body2");
        assert_eq!(w.body_count(), 2);
    }

    #[test]
    fn test_create_body_converts_degrees() {
        let mut w = world();
        let body = w.create_body(BodyKind::Dynamic, Vec2::new(1.0, 2.0), 180.0).unwrap();
        let pose = w.body_pose(&body).unwrap();
        assert_eq!(pose.position, Vec2::new(1.0, 2.0));
        assert!((pose.angle.abs() - std::f32::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn test_nan_position_rejected_without_side_effects() {
        let mut w = world();
        assert!(w.create_body(BodyKind::Dynamic, Vec2::new(f32::NAN, 0.0), 0.0).is_err());
        assert_eq!(w.body_count(), 0);
        // The failed call does not use up a name
        assert_eq!(w.create_body(BodyKind::Dynamic, Vec2::ZERO, 0.0).unwrap(), "body0");
    }

    #[test]
    fn test_unknown_body_is_not_found() {
        let mut w = world();
        assert_eq!(
            w.apply_force("body9", Vec2::X),
            Err(PhysicsError::BodyNotFound("body9".to_string()))
        );
        assert!(w.body_pose("nobody").unwrap_err().is_not_found());
    }

    #[test]
    fn test_fixture_defaults_by_shape() {
        let mut w = world();
        let body = w.create_body(BodyKind::Dynamic, Vec2::ZERO, 0.0).unwrap();
        let boxed = w
            .create_fixture(&body, &FixtureTemplate::new(FixtureShape::rect(1.0, 1.0)))
            .unwrap();
        let round = w
            .create_fixture(&body, &FixtureTemplate::new(FixtureShape::circle(0.5)))
            .unwrap();

        let boxed = &w.engine.colliders[boxed];
        assert_eq!(boxed.friction(), 0.6);
        assert_eq!(boxed.restitution(), 0.2);
        let round = &w.engine.colliders[round];
        assert_eq!(round.friction(), 0.3);
        assert_eq!(round.restitution(), 0.0);
        assert_eq!(w.fixture_count(&body).unwrap(), 2);
    }

    #[test]
    fn test_invalid_fixture_leaves_body_untouched() {
        let mut w = world();
        let body = w.create_body(BodyKind::Dynamic, Vec2::ZERO, 0.0).unwrap();
        assert!(w.create_circle_fixture(&body, Vec2::ZERO, -1.0).is_err());
        assert!(w.create_box_fixture(&body, 0.0, 1.0, Vec2::ZERO, 0.0).is_err());
        assert_eq!(w.fixture_count(&body).unwrap(), 0);
    }

    #[test]
    fn test_templates() {
        let mut w = world();
        let body = w.create_body(BodyKind::Dynamic, Vec2::ZERO, 0.0).unwrap();
        w.define_fixture_template("wheel", FixtureTemplate::new(FixtureShape::circle(0.3)))
            .unwrap();

        w.create_template_fixture(&body, "wheel").unwrap();
        assert_eq!(
            w.create_template_fixture(&body, "axle"),
            Err(PhysicsError::TemplateNotFound("axle".to_string()))
        );
        assert_eq!(w.fixture_count(&body).unwrap(), 1);
        assert!(w.fixture_template("wheel").is_some());
    }

    #[test]
    fn test_joint_needs_two_bodies() {
        let mut w = world();
        let a = w.create_body(BodyKind::Dynamic, Vec2::ZERO, 0.0).unwrap();
        let b = w.create_body(BodyKind::Dynamic, Vec2::X, 0.0).unwrap();
        let desc = RevoluteJointDesc::new(Vec2::ZERO, Vec2::ZERO);

        assert!(w.create_revolute_joint(&a, &a, &desc).is_err());
        assert!(w.create_revolute_joint(&a, "body7", &desc).is_err());
        assert_eq!(w.joint_count(), 0);

        w.create_revolute_joint(&a, &b, &desc).unwrap();
        assert_eq!(w.joint_count(), 1);

        // Destroying a body takes its joints with it
        w.destroy_body(&b).unwrap();
        assert_eq!(w.joint_count(), 0);
    }

    #[test]
    fn test_sensor_applies_to_all_fixtures() {
        let mut w = world();
        let body = w.create_body(BodyKind::Static, Vec2::ZERO, 0.0).unwrap();
        w.create_box_fixture(&body, 1.0, 1.0, Vec2::ZERO, 0.0).unwrap();
        w.create_circle_fixture(&body, Vec2::X, 0.5).unwrap();

        assert!(!w.is_sensor(&body).unwrap());
        w.set_sensor(&body, true).unwrap();
        assert!(w.is_sensor(&body).unwrap());
    }

    #[test]
    fn test_constant_force_accelerates_every_step() {
        let mut w = world();
        w.set_gravity(Vec2::ZERO).unwrap();
        let body = w.create_body(BodyKind::Dynamic, Vec2::ZERO, 0.0).unwrap();
        w.create_circle_fixture(&body, Vec2::ZERO, 0.5).unwrap();
        w.set_constant_force(&body, Vec2::new(10.0, 0.0), 0.0).unwrap();

        w.step(1.0 / 60.0, &mut ()).unwrap();
        let first = w.body_velocity(&body).unwrap().x;
        w.step(1.0 / 60.0, &mut ()).unwrap();
        let second = w.body_velocity(&body).unwrap().x;

        assert!(first > 0.0);
        assert!(second > first * 1.5);
    }

    #[test]
    fn test_applied_force_lasts_one_step() {
        let mut w = world();
        w.set_gravity(Vec2::ZERO).unwrap();
        let body = w.create_body(BodyKind::Dynamic, Vec2::ZERO, 0.0).unwrap();
        w.create_circle_fixture(&body, Vec2::ZERO, 0.5).unwrap();
        w.apply_force(&body, Vec2::new(10.0, 0.0)).unwrap();

        w.step(1.0 / 60.0, &mut ()).unwrap();
        let first = w.body_velocity(&body).unwrap().x;
        w.step(1.0 / 60.0, &mut ()).unwrap();
        let second = w.body_velocity(&body).unwrap().x;

        assert!(first > 0.0);
        assert!((second - first).abs() < 1e-4);
    }

    #[test]
    fn test_update_uses_host_clock() {
        let mut w = world();
        w.update(16.0, 0.016, &mut ()).unwrap();
        w.update(33.0, 0.017, &mut ()).unwrap();
        assert_eq!(w.clock().current_ms(), 33.0);
        assert_eq!(w.clock().previous_ms(), 16.0);

        assert!(w.update(50.0, -1.0, &mut ()).is_err());
        assert!(w.update(f64::INFINITY, 0.016, &mut ()).is_err());
        assert_eq!(w.clock().current_ms(), 33.0);

        // Host time behind the clock still advances by the frame
        w.update(10.0, 0.016, &mut ()).unwrap();
        assert_eq!(w.clock().current_ms(), 49.0);

        w.reset();
        assert_eq!(w.clock().current_ms(), 0.0);
    }

    #[test]
    fn test_update_after_explicit_step() {
        let mut w = world();
        let body = w.create_body(BodyKind::Dynamic, Vec2::new(0.0, 10.0), 0.0).unwrap();
        w.step(1.0, &mut ()).unwrap();
        let after_step = w.body_pose(&body).unwrap().position.y;

        w.update(16.0, 1.0 / 60.0, &mut ()).unwrap();
        assert!(w.body_pose(&body).unwrap().position.y < after_step);
        assert!(w.clock().current_ms() > 1000.0);
    }

    #[test]
    fn test_fixtureless_dynamic_body_falls() {
        let mut w = world();
        let body = w.create_body(BodyKind::Dynamic, Vec2::new(0.0, 10.0), 0.0).unwrap();

        for _ in 0..10 {
            w.step(1.0 / 60.0, &mut ()).unwrap();
        }
        assert!(w.body_pose(&body).unwrap().position.y < 10.0);
        assert!(w.body_velocity(&body).unwrap().y < 0.0);

        let (_, handle) = w.lookup(&body).unwrap();
        assert!((w.engine.bodies[handle].mass() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_first_fixture_replaces_unit_mass() {
        let mut w = world();
        let body = w.create_body(BodyKind::Dynamic, Vec2::ZERO, 0.0).unwrap();
        w.create_box_fixture(&body, 2.0, 2.0, Vec2::ZERO, 0.0).unwrap();
        w.step(1.0 / 60.0, &mut ()).unwrap();

        let (_, handle) = w.lookup(&body).unwrap();
        // 2x2 box at the default density of 1
        assert!((w.engine.bodies[handle].mass() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_handler_without_callback_name_gets_nothing() {
        let mut w = world();
        let ground = w.create_body(BodyKind::Static, Vec2::ZERO, 0.0).unwrap();
        w.create_box_fixture(&ground, 10.0, 1.0, Vec2::ZERO, 0.0).unwrap();
        let crate_body = w.create_body(BodyKind::Dynamic, Vec2::new(0.0, 1.0), 0.0).unwrap();
        w.create_box_fixture(&crate_body, 1.0, 1.0, Vec2::ZERO, 0.0).unwrap();

        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);
        w.set_contact_handler(move |_, _| *counter.borrow_mut() += 1);

        for _ in 0..10 {
            w.step(1.0 / 60.0, &mut ()).unwrap();
        }
        assert_eq!(*seen.borrow(), 0);
    }

    #[test]
    fn test_teardown_frees_every_record() {
        let mut w = world();
        for i in 0..5 {
            w.create_body(BodyKind::Dynamic, Vec2::new(i as f32, 0.0), 0.0).unwrap();
        }
        let report = w.teardown();
        assert_eq!(report.bodies_freed, 5);
        assert_eq!(report.registry_remaining, 0);
    }
}
