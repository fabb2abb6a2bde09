//! Contact dispatch
//!
//! The [`ContactDispatcher`] is installed into the engine as both its physics
//! hooks and its event handler. While the engine steps it:
//!
//! - applies the category/mask/group filter to every candidate pair
//! - records begin/end notifications for pairs that start or stop touching
//! - records a pre-solve notification the first time a manifold gains a new
//!   contact point, with the contact point and the approach velocity there
//!
//! Notifications are queued with the arena keys of both bodies. Once the step
//! returns, the World resolves the keys to names and hands each event to its
//! [`ContactHandler`], so handlers never run while the engine is mid-step.
//! Begin and end events of a step come before its pre-solve events. Colliders
//! of a body destroyed since the last step still resolve to that body, so its
//! end events keep their names.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use planar_math::Vec2;
use rapier2d::prelude::{
    ColliderHandle, ColliderSet, CollisionEvent, ContactModificationContext, ContactPair,
    EventHandler, PairFilterContext, PhysicsHooks, RigidBodySet, SolverFlags, Vector,
};
use serde::{Serialize, Deserialize};

use crate::body::{key_from_user_data, BodyKey};
use crate::filter::FilterData;

/// The kinds of contact callback a World can name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContactKind {
    Begin,
    End,
    PreSolve,
    /// Can be named but is never fired
    PostSolve,
}

/// A contact notification delivered to the host
#[derive(Clone, Debug, PartialEq)]
pub enum ContactEvent {
    /// Two bodies started touching
    Begin {
        world: String,
        body_a: String,
        body_b: String,
    },
    /// Two bodies stopped touching
    End {
        world: String,
        body_a: String,
        body_b: String,
    },
    /// A new contact point appeared between two touching bodies
    PreSolve {
        world: String,
        body_a: String,
        body_b: String,
        /// World-space contact point
        point: Vec2,
        /// Relative velocity of B with respect to A along the contact normal
        approach_velocity: f32,
    },
}

impl ContactEvent {
    pub fn kind(&self) -> ContactKind {
        match self {
            ContactEvent::Begin { .. } => ContactKind::Begin,
            ContactEvent::End { .. } => ContactKind::End,
            ContactEvent::PreSolve { .. } => ContactKind::PreSolve,
        }
    }

    /// Name of the World the contact happened in
    pub fn world(&self) -> &str {
        match self {
            ContactEvent::Begin { world, .. }
            | ContactEvent::End { world, .. }
            | ContactEvent::PreSolve { world, .. } => world,
        }
    }

    /// Names of the two bodies, in engine order
    pub fn bodies(&self) -> (&str, &str) {
        match self {
            ContactEvent::Begin { body_a, body_b, .. }
            | ContactEvent::End { body_a, body_b, .. }
            | ContactEvent::PreSolve { body_a, body_b, .. } => (body_a, body_b),
        }
    }

    /// True if either body has this name
    pub fn involves(&self, body: &str) -> bool {
        let (a, b) = self.bodies();
        a == body || b == body
    }
}

/// Host callback receiving `(callback_name, event)`
pub type ContactHandler = Box<dyn FnMut(&str, &ContactEvent)>;

/// Callback names configured on a World; unset kinds are not dispatched
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackNames {
    #[serde(default)]
    pub begin_contact: Option<String>,
    #[serde(default)]
    pub end_contact: Option<String>,
    #[serde(default)]
    pub pre_solve: Option<String>,
    #[serde(default)]
    pub post_solve: Option<String>,
}

impl CallbackNames {
    pub fn get(&self, kind: ContactKind) -> Option<&str> {
        match kind {
            ContactKind::Begin => self.begin_contact.as_deref(),
            ContactKind::End => self.end_contact.as_deref(),
            ContactKind::PreSolve => self.pre_solve.as_deref(),
            ContactKind::PostSolve => self.post_solve.as_deref(),
        }
    }

    pub fn set(&mut self, kind: ContactKind, name: Option<String>) {
        let slot = match kind {
            ContactKind::Begin => &mut self.begin_contact,
            ContactKind::End => &mut self.end_contact,
            ContactKind::PreSolve => &mut self.pre_solve,
            ContactKind::PostSolve => &mut self.post_solve,
        };
        *slot = name;
    }
}

/// State of a contact point between two consecutive manifolds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointState {
    /// Point exists only in the new manifold
    Add,
    /// Point exists in both manifolds
    Persist,
    /// Point exists only in the old manifold
    Remove,
}

/// Feature-id pair identifying one manifold point across steps
pub type PointId = (u32, u32);

/// Compare two manifolds point by point
///
/// Returns the states of the old manifold's points (`Persist` or `Remove`)
/// and of the new manifold's points (`Persist` or `Add`).
pub fn point_states(previous: &[PointId], current: &[PointId]) -> (Vec<PointState>, Vec<PointState>) {
    let old = previous
        .iter()
        .map(|id| {
            if current.contains(id) {
                PointState::Persist
            } else {
                PointState::Remove
            }
        })
        .collect();
    let new = current
        .iter()
        .map(|id| {
            if previous.contains(id) {
                PointState::Persist
            } else {
                PointState::Add
            }
        })
        .collect();
    (old, new)
}

/// Whether the dispatcher is inside an engine step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Dispatching,
}

/// A notification recorded during a step, before name resolution
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RawContact {
    pub kind: RawKind,
    pub body_a: Option<BodyKey>,
    pub body_b: Option<BodyKey>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum RawKind {
    Begin,
    End,
    PreSolve { point: Vec2, approach_velocity: f32 },
}

impl RawContact {
    pub fn callback_kind(&self) -> ContactKind {
        match self.kind {
            RawKind::Begin => ContactKind::Begin,
            RawKind::End => ContactKind::End,
            RawKind::PreSolve { .. } => ContactKind::PreSolve,
        }
    }

    pub fn into_event(self, world: &str, body_a: String, body_b: String) -> ContactEvent {
        let world = world.to_string();
        match self.kind {
            RawKind::Begin => ContactEvent::Begin { world, body_a, body_b },
            RawKind::End => ContactEvent::End { world, body_a, body_b },
            RawKind::PreSolve { point, approach_velocity } => ContactEvent::PreSolve {
                world,
                body_a,
                body_b,
                point,
                approach_velocity,
            },
        }
    }
}

/// Identifies one manifold: collider pair plus sub-shape indices
type ManifoldKey = (ColliderHandle, ColliderHandle, u32, u32);

struct DispatchQueue {
    state: DispatchState,
    pending: Vec<RawContact>,
    manifolds: HashMap<ManifoldKey, Vec<PointId>>,
    /// Colliders of bodies destroyed since the last step
    departed: HashMap<ColliderHandle, BodyKey>,
}

/// Engine listener translating solver callbacks into [`RawContact`]s
pub(crate) struct ContactDispatcher {
    queue: Mutex<DispatchQueue>,
}

impl ContactDispatcher {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(DispatchQueue {
                state: DispatchState::Idle,
                pending: Vec::new(),
                manifolds: HashMap::new(),
                departed: HashMap::new(),
            }),
        }
    }

    // The engine never unwinds through a hook, so a poisoned lock still
    // holds consistent data.
    fn lock(&self) -> MutexGuard<'_, DispatchQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> DispatchState {
        self.lock().state
    }

    /// Start recording notifications for one engine step
    pub fn begin_step(&self) {
        let mut queue = self.lock();
        queue.state = DispatchState::Dispatching;
        queue.pending.clear();
    }

    /// Stop recording and take everything recorded during the step
    ///
    /// Begin and end notifications come before pre-solve ones; the engine
    /// reports solver contacts ahead of the collision events of the same step.
    pub fn finish_step(&self) -> Vec<RawContact> {
        let mut queue = self.lock();
        queue.state = DispatchState::Idle;
        queue.departed.clear();
        let mut contacts = std::mem::take(&mut queue.pending);
        contacts.sort_by_key(|c| matches!(c.kind, RawKind::PreSolve { .. }));
        contacts
    }

    /// Remember which body owned these colliders until the next step
    ///
    /// The engine reports the end of their contacts after they are gone.
    pub fn mark_departed(&self, colliders: &[ColliderHandle], key: BodyKey) {
        let mut queue = self.lock();
        for &handle in colliders {
            queue.departed.insert(handle, key);
        }
    }

    /// Number of manifolds whose points are being tracked
    pub fn tracked_manifolds(&self) -> usize {
        self.lock().manifolds.len()
    }

    fn record(&self, contact: RawContact) {
        let mut queue = self.lock();
        if queue.state == DispatchState::Dispatching {
            queue.pending.push(contact);
        }
    }
}

/// Arena key of the body a collider is attached to
fn body_key(bodies: &RigidBodySet, colliders: &ColliderSet, handle: ColliderHandle) -> Option<BodyKey> {
    let parent = colliders.get(handle)?.parent()?;
    key_from_user_data(bodies.get(parent)?.user_data)
}

fn pair_allowed(colliders: &ColliderSet, a: ColliderHandle, b: ColliderHandle) -> bool {
    match (colliders.get(a), colliders.get(b)) {
        (Some(a), Some(b)) => {
            FilterData::from_user_data(a.user_data).should_collide(&FilterData::from_user_data(b.user_data))
        }
        _ => false,
    }
}

impl PhysicsHooks for ContactDispatcher {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        if pair_allowed(context.colliders, context.collider1, context.collider2) {
            Some(SolverFlags::COMPUTE_IMPULSES)
        } else {
            None
        }
    }

    fn filter_intersection_pair(&self, context: &PairFilterContext) -> bool {
        pair_allowed(context.colliders, context.collider1, context.collider2)
    }

    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let manifold = context.manifold;
        let key = (
            context.collider1,
            context.collider2,
            manifold.subshape1,
            manifold.subshape2,
        );
        let current: Vec<PointId> = manifold.points.iter().map(|p| (p.fid1.0, p.fid2.0)).collect();

        let added = {
            let mut queue = self.lock();
            let previous = queue.manifolds.insert(key, current.clone()).unwrap_or_default();
            let (_, states) = point_states(&previous, &current);
            states.iter().position(|s| *s == PointState::Add)
        };
        let Some(index) = added else {
            return;
        };

        let Some(collider1) = context.colliders.get(context.collider1) else {
            return;
        };
        let world_point = collider1.position() * manifold.points[index].local_p1;
        let velocity_at = |handle: Option<_>| {
            handle
                .and_then(|h| context.bodies.get(h))
                .map(|body| body.velocity_at_point(&world_point))
                .unwrap_or_else(Vector::zeros)
        };
        let relative = velocity_at(context.rigid_body2) - velocity_at(context.rigid_body1);

        self.record(RawContact {
            kind: RawKind::PreSolve {
                point: Vec2::new(world_point.x, world_point.y),
                approach_velocity: relative.dot(&*context.normal),
            },
            body_a: body_key(context.bodies, context.colliders, context.collider1),
            body_b: body_key(context.bodies, context.colliders, context.collider2),
        });
    }
}

impl EventHandler for ContactDispatcher {
    fn handle_collision_event(
        &self,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        let (h1, h2, kind) = match event {
            CollisionEvent::Started(h1, h2, _) => (h1, h2, RawKind::Begin),
            CollisionEvent::Stopped(h1, h2, _) => {
                self.lock()
                    .manifolds
                    .retain(|&(a, b, _, _), _| !((a == h1 && b == h2) || (a == h2 && b == h1)));
                (h1, h2, RawKind::End)
            }
        };

        let (body_a, body_b) = {
            let queue = self.lock();
            let resolve = |h| body_key(bodies, colliders, h).or_else(|| queue.departed.get(&h).copied());
            (resolve(h1), resolve(h2))
        };
        self.record(RawContact { kind, body_a, body_b });
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f32,
    ) {
        // Contact force events are not enabled on any collider
    }
}
