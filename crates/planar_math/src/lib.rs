//! Planar math helpers
//!
//! Small, stateless types shared by the physics binding and its host:
//!
//! - [`Vec2`] - 2D vector with x, y components
//! - [`Mat4`] - column-major 4x4 model matrix, as consumed by the renderer
//! - [`mat4::write_planar_pose`] - write a 2D pose into a model matrix
//! - [`deg_to_rad`] / [`rad_to_deg`] - angle unit conversion

mod vec2;
pub mod mat4;

pub use vec2::Vec2;
pub use mat4::Mat4;

/// Convert degrees to radians
#[inline]
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees.to_radians()
}

/// Convert radians to degrees
#[inline]
pub fn rad_to_deg(radians: f32) -> f32 {
    radians.to_degrees()
}
