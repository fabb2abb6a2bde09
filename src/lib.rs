//! Planar - named-entity 2D physics for a scripting host
//!
//! Library surface of the demo application: configuration, the host
//! simulation clock, and scene construction helpers.

pub mod config;
pub mod scene;
pub mod systems;
