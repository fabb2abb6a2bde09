//! Command surface
//!
//! [`PhysicsBinding`] is what the host calls into. It owns every World,
//! addresses them by [`WorldId`], and exposes the body, fixture, joint,
//! stepping and callback operations with the argument conventions external
//! callers use: numeric body-kind tags, angles in degrees, raw filter bits.

use std::collections::BTreeMap;
use std::fmt;

use planar_math::Vec2;
use serde::{Serialize, Deserialize};

use crate::body::{BodyKind, BodyKindMask, BodyPose};
use crate::contact::{ContactEvent, ContactKind};
use crate::error::{PhysicsError, PhysicsResult};
use crate::filter::FilterUpdate;
use crate::fixture::FixtureTemplate;
use crate::host::{RenderTargets, TypeRegistry, TypeTag};
use crate::joint::RevoluteJointDesc;
use crate::world::{TeardownReport, World, WorldConfig};

/// Integer id of a World, stable for the World's lifetime
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorldId(u32);

impl WorldId {
    pub fn from_raw(raw: u32) -> Self {
        WorldId(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The physics binding: every World plus the type tag they are created under
pub struct PhysicsBinding {
    type_tag: TypeTag,
    config: WorldConfig,
    worlds: BTreeMap<WorldId, World>,
    next_world: u32,
}

impl PhysicsBinding {
    /// Name the binding registers its type tag under
    pub const TYPE_NAME: &'static str = "physics";

    /// Register with the host's type registry using default World settings
    pub fn register(types: &mut TypeRegistry) -> Self {
        Self::with_config(types, WorldConfig::default())
    }

    /// Register with the host's type registry; new Worlds start from `config`
    pub fn with_config(types: &mut TypeRegistry, config: WorldConfig) -> Self {
        let type_tag = types.register(Self::TYPE_NAME);
        log::debug!("Physics binding registered with type tag {}", type_tag.raw());
        Self {
            type_tag,
            config,
            worlds: BTreeMap::new(),
            next_world: 0,
        }
    }

    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    /// Settings new Worlds start from
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // --- Worlds ---

    /// Create a World named after its id
    pub fn create_world(&mut self) -> PhysicsResult<WorldId> {
        let name = format!("world{}", self.next_world);
        self.create_world_named(name)
    }

    pub fn create_world_named(&mut self, name: impl Into<String>) -> PhysicsResult<WorldId> {
        let config = self.config.clone();
        self.create_world_with(name, config)
    }

    /// Create a World with its own settings
    ///
    /// Nothing is registered if the engine cannot be built.
    pub fn create_world_with(&mut self, name: impl Into<String>, config: WorldConfig) -> PhysicsResult<WorldId> {
        let id = WorldId(self.next_world);
        let world = World::new(id, name, self.type_tag, config)?;
        log::info!("Created world '{}' (id {})", world.name(), id);

        self.worlds.insert(id, world);
        self.next_world += 1;
        Ok(id)
    }

    /// Tear a World down, freeing its body records before its engine
    pub fn destroy_world(&mut self, id: WorldId) -> PhysicsResult<TeardownReport> {
        let world = self.worlds.remove(&id).ok_or(PhysicsError::WorldNotFound(id))?;
        Ok(world.teardown())
    }

    pub fn world(&self, id: WorldId) -> PhysicsResult<&World> {
        self.worlds.get(&id).ok_or(PhysicsError::WorldNotFound(id))
    }

    pub fn world_mut(&mut self, id: WorldId) -> PhysicsResult<&mut World> {
        self.worlds.get_mut(&id).ok_or(PhysicsError::WorldNotFound(id))
    }

    /// Ids of all live Worlds, ascending
    pub fn world_ids(&self) -> Vec<WorldId> {
        self.worlds.keys().copied().collect()
    }

    pub fn world_count(&self) -> usize {
        self.worlds.len()
    }

    pub fn world_name(&self, id: WorldId) -> PhysicsResult<&str> {
        Ok(self.world(id)?.name())
    }

    pub fn body_count(&self, id: WorldId) -> PhysicsResult<usize> {
        Ok(self.world(id)?.body_count())
    }

    pub fn reset(&mut self, id: WorldId) -> PhysicsResult<()> {
        self.world_mut(id)?.reset();
        Ok(())
    }

    pub fn set_gravity(&mut self, id: WorldId, gx: f32, gy: f32) -> PhysicsResult<()> {
        self.world_mut(id)?.set_gravity(Vec2::new(gx, gy))
    }

    pub fn set_iterations(&mut self, id: WorldId, velocity: u32, position: u32) -> PhysicsResult<()> {
        self.world_mut(id)?.set_iterations(velocity, position)
    }

    // --- Bodies ---

    /// Create a body from a numeric kind tag (0 static, 1 kinematic, 2 dynamic)
    pub fn create_body(&mut self, id: WorldId, kind: i64, x: f32, y: f32, angle_deg: f32) -> PhysicsResult<String> {
        let kind = BodyKind::from_tag(kind)?;
        self.world_mut(id)?.create_body(kind, Vec2::new(x, y), angle_deg)
    }

    pub fn destroy_body(&mut self, id: WorldId, body: &str) -> PhysicsResult<()> {
        self.world_mut(id)?.destroy_body(body)
    }

    pub fn set_body_type(&mut self, id: WorldId, body: &str, kind: i64) -> PhysicsResult<()> {
        let kind = BodyKind::from_tag(kind)?;
        self.world_mut(id)?.set_body_kind(body, kind)
    }

    /// Set category bits, and optionally mask bits and group, on every fixture
    pub fn set_filter_data(
        &mut self,
        id: WorldId,
        body: &str,
        category: u16,
        mask: Option<u16>,
        group: Option<i16>,
    ) -> PhysicsResult<()> {
        let update = FilterUpdate {
            category: Some(category),
            mask,
            group,
        };
        self.world_mut(id)?.set_filter_data(body, &update)
    }

    pub fn set_sensor(&mut self, id: WorldId, body: &str, sensor: bool) -> PhysicsResult<()> {
        self.world_mut(id)?.set_sensor(body, sensor)
    }

    pub fn apply_force(&mut self, id: WorldId, body: &str, fx: f32, fy: f32) -> PhysicsResult<()> {
        self.world_mut(id)?.apply_force(body, Vec2::new(fx, fy))
    }

    pub fn apply_linear_impulse(&mut self, id: WorldId, body: &str, ix: f32, iy: f32) -> PhysicsResult<()> {
        self.world_mut(id)?.apply_linear_impulse(body, Vec2::new(ix, iy))
    }

    pub fn set_constant_force(&mut self, id: WorldId, body: &str, fx: f32, fy: f32, torque: f32) -> PhysicsResult<()> {
        self.world_mut(id)?.set_constant_force(body, Vec2::new(fx, fy), torque)
    }

    pub fn set_transform(&mut self, id: WorldId, body: &str, x: f32, y: f32, angle_deg: f32) -> PhysicsResult<()> {
        self.world_mut(id)?.set_transform(body, Vec2::new(x, y), angle_deg)
    }

    /// Position and angle (radians) of a body
    pub fn get_body_info(&self, id: WorldId, body: &str) -> PhysicsResult<BodyPose> {
        self.world(id)?.body_pose(body)
    }

    pub fn get_body_velocity(&self, id: WorldId, body: &str) -> PhysicsResult<Vec2> {
        self.world(id)?.body_velocity(body)
    }

    /// Names of the bodies whose kind the mask selects
    pub fn get_bodies(&self, id: WorldId, mask: BodyKindMask) -> PhysicsResult<Vec<String>> {
        Ok(self.world(id)?.bodies(mask))
    }

    pub fn link_body(&mut self, id: WorldId, body: &str, object_id: usize) -> PhysicsResult<()> {
        self.world_mut(id)?.link_body(body, object_id)
    }

    pub fn unlink_body(&mut self, id: WorldId, body: &str) -> PhysicsResult<()> {
        self.world_mut(id)?.unlink_body(body)
    }

    // --- Fixtures and joints ---

    pub fn create_box_fixture(
        &mut self,
        id: WorldId,
        body: &str,
        width: f32,
        height: f32,
        x: f32,
        y: f32,
        angle_deg: f32,
    ) -> PhysicsResult<()> {
        self.world_mut(id)?
            .create_box_fixture(body, width, height, Vec2::new(x, y), angle_deg)
    }

    pub fn create_circle_fixture(&mut self, id: WorldId, body: &str, x: f32, y: f32, radius: f32) -> PhysicsResult<()> {
        self.world_mut(id)?.create_circle_fixture(body, Vec2::new(x, y), radius)
    }

    pub fn define_fixture_template(&mut self, id: WorldId, name: &str, template: FixtureTemplate) -> PhysicsResult<()> {
        self.world_mut(id)?.define_fixture_template(name, template)
    }

    pub fn create_template_fixture(&mut self, id: WorldId, body: &str, template: &str) -> PhysicsResult<()> {
        self.world_mut(id)?.create_template_fixture(body, template)
    }

    /// Hinge two bodies at local anchors, limited to +/-45 degrees
    pub fn create_revolute_joint(
        &mut self,
        id: WorldId,
        body_a: &str,
        body_b: &str,
        anchor_a: Vec2,
        anchor_b: Vec2,
    ) -> PhysicsResult<()> {
        self.world_mut(id)?
            .create_revolute_joint(body_a, body_b, &RevoluteJointDesc::new(anchor_a, anchor_b))
    }

    // --- Stepping ---

    /// Advance one World by `elapsed` seconds and sync its linked objects
    pub fn step(&mut self, id: WorldId, elapsed: f32, targets: &mut dyn RenderTargets) -> PhysicsResult<()> {
        self.world_mut(id)?.step(elapsed, targets)
    }

    /// Per-frame update of one World from the host clock
    pub fn update(
        &mut self,
        id: WorldId,
        now_ms: f64,
        frame_seconds: f32,
        targets: &mut dyn RenderTargets,
    ) -> PhysicsResult<()> {
        self.world_mut(id)?.update(now_ms, frame_seconds, targets)
    }

    /// Per-frame update of every World
    ///
    /// A World that fails does not hold the others back; the first failure is
    /// returned once every World has been updated.
    pub fn update_all(&mut self, now_ms: f64, frame_seconds: f32, targets: &mut dyn RenderTargets) -> PhysicsResult<()> {
        let mut first_error = None;
        for (id, world) in self.worlds.iter_mut() {
            if let Err(e) = world.update(now_ms, frame_seconds, targets) {
                log::warn!("Update of world {} failed: {}", id, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    // --- Callbacks ---

    pub fn set_begin_contact_callback(&mut self, id: WorldId, name: &str) -> PhysicsResult<()> {
        self.set_callback(id, ContactKind::Begin, name)
    }

    pub fn set_end_contact_callback(&mut self, id: WorldId, name: &str) -> PhysicsResult<()> {
        self.set_callback(id, ContactKind::End, name)
    }

    pub fn set_pre_solve_callback(&mut self, id: WorldId, name: &str) -> PhysicsResult<()> {
        self.set_callback(id, ContactKind::PreSolve, name)
    }

    /// Stored for completeness; post-solve is never dispatched
    pub fn set_post_solve_callback(&mut self, id: WorldId, name: &str) -> PhysicsResult<()> {
        self.set_callback(id, ContactKind::PostSolve, name)
    }

    /// Name a callback; an empty name clears it
    pub fn set_callback(&mut self, id: WorldId, kind: ContactKind, name: &str) -> PhysicsResult<()> {
        let name = (!name.is_empty()).then(|| name.to_string());
        self.world_mut(id)?.set_callback(kind, name);
        Ok(())
    }

    /// Install the closure that receives `(callback_name, event)`
    pub fn set_contact_handler<F>(&mut self, id: WorldId, handler: F) -> PhysicsResult<()>
    where
        F: FnMut(&str, &ContactEvent) + 'static,
    {
        self.world_mut(id)?.set_contact_handler(handler);
        Ok(())
    }
}
