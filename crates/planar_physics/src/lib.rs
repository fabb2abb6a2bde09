//! Named-entity physics binding for Planar
//!
//! This crate drives a 2D rigid-body simulation (rapier) on behalf of a host
//! that addresses everything by name:
//! - Worlds addressed by integer id, bodies by per-World generated names
//! - Box/circle fixtures with category/mask/group collision filtering
//! - Revolute joints
//! - Per-frame stepping with a simulation clock
//! - Contact dispatch (begin, end, pre-solve) to a host callback
//! - Transform sync of body poses into render-object model matrices

pub mod binding;
pub mod body;
pub mod clock;
pub mod contact;
mod engine;
pub mod error;
pub mod filter;
pub mod fixture;
pub mod host;
pub mod joint;
pub mod registry;
mod sync;
pub mod world;

// Re-export commonly used types
pub use binding::{PhysicsBinding, WorldId};
pub use body::{BodyKey, BodyKind, BodyKindMask, BodyPose, RenderLink};
pub use clock::SimClock;
pub use contact::{point_states, CallbackNames, ContactEvent, ContactHandler, ContactKind, DispatchState, PointState};
pub use error::{PhysicsError, PhysicsResult};
pub use filter::{CollisionLayer, FilterData, FilterUpdate};
pub use fixture::{FixtureDefaults, FixtureMaterial, FixtureShape, FixtureTemplate};
pub use host::{RenderTargets, TypeRegistry, TypeTag};
pub use joint::RevoluteJointDesc;
pub use registry::NameRegistry;
pub use world::{TeardownReport, World, WorldConfig};
