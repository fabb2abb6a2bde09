//! Host-side types for Planar
//!
//! - [`RenderObjects`]: the object list physics bodies drive
//! - [`Scene`]: RON description of one World
//! - [`Stage`]: objects and Worlds together, with scene instantiation

pub mod objects;
pub mod scene;
pub mod stage;

pub use objects::{RenderObject, RenderObjects};
pub use scene::{BodyTemplate, FixtureSpec, JointTemplate, Scene, SceneError, ValidationError};
pub use stage::{SceneInstance, Stage};
