//! 4x4 model-matrix helpers
//!
//! Render objects carry an OpenGL-style column-major model matrix. Physics only
//! ever touches the Z-rotation block and the XY translation of that matrix.

use crate::Vec2;

/// 4x4 matrix type (column-major)
pub type Mat4 = [[f32; 4]; 4];

/// Identity matrix
pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Overwrite the rotation and translation components of a model matrix with
/// a planar pose.
///
/// The upper-left 2x2 block becomes a rotation by `angle` radians about Z and
/// column 3 receives `(position.x, position.y)`. The Z row/column, the W row
/// and the Z translation are left as they were, so a depth offset set by the
/// renderer survives.
pub fn write_planar_pose(m: &mut Mat4, position: Vec2, angle: f32) {
    let (sn, cs) = angle.sin_cos();

    m[0][0] = cs;
    m[0][1] = sn;
    m[1][0] = -sn;
    m[1][1] = cs;

    m[3][0] = position.x;
    m[3][1] = position.y;
}

/// Build a model matrix from a planar pose
pub fn from_planar_pose(position: Vec2, angle: f32) -> Mat4 {
    let mut m = IDENTITY;
    write_planar_pose(&mut m, position, angle);
    m
}

/// Read the planar translation back out of a model matrix
pub fn planar_translation(m: &Mat4) -> Vec2 {
    Vec2::new(m[3][0], m[3][1])
}

/// Read the Z rotation angle back out of a model matrix
pub fn planar_angle(m: &Mat4) -> f32 {
    m[0][1].atan2(m[0][0])
}

/// Transform a 2D point (z = 0, w = 1) by a model matrix
pub fn transform_point(m: &Mat4, p: Vec2) -> Vec2 {
    Vec2::new(
        m[0][0] * p.x + m[1][0] * p.y + m[3][0],
        m[0][1] * p.x + m[1][1] * p.y + m[3][1],
    )
}

/// Multiply two 4x4 matrices: result = a * b
///
/// In column-major convention, this applies b first, then a.
#[allow(clippy::needless_range_loop)]
pub fn mul(a: Mat4, b: Mat4) -> Mat4 {
    let mut result = [[0.0f32; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }

    result
}
