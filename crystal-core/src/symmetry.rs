//! Hexagonal point-group expansion.
//!
//! Every committed point is replicated under 6-fold rotation about the Y axis,
//! reflection across the XY plane (negating Z) and reflection across the XZ
//! plane (negating Y). The result is the orbit of the point under a group of
//! order 24, which is what gives the crystal its snowflake shape.

use crate::types::Point3;

/// Number of images produced by [`symmetry_images`] for any input point.
///
/// Coincident images (points on a symmetry axis or plane) are not removed.
pub const ORBIT_SIZE: usize = 24;

const HALF_SQRT_3: f32 = 0.866_025_4;

/// `(cos, sin)` of `2πk/6` for `k` in `0..6`.
const HEX_ROTATIONS: [(f32, f32); 6] = [
    (1.0, 0.0),
    (0.5, HALF_SQRT_3),
    (-0.5, HALF_SQRT_3),
    (-1.0, 0.0),
    (-0.5, -HALF_SQRT_3),
    (0.5, -HALF_SQRT_3),
];

/// Rotates `p` about the Y axis by the angle whose cosine and sine are given.
fn rotate_y(p: Point3, cos: f32, sin: f32) -> Point3 {
    Point3::new(p.x * cos - p.z * sin, p.y, p.x * sin + p.z * cos)
}

/// Expands `p` into its full orbit.
///
/// For each of the six rotations `p_k`, the images are emitted in the order
/// `p_k`, `p_k` with Z negated, `p_k` with Y negated, `p_k` with Y and Z
/// negated. The first image is always `p` itself.
pub fn symmetry_images(p: Point3) -> Vec<Point3> {
    let mut images = Vec::with_capacity(ORBIT_SIZE);
    for &(cos, sin) in &HEX_ROTATIONS {
        let r = rotate_y(p, cos, sin);
        images.push(r);
        images.push(Point3::new(r.x, r.y, -r.z));
        images.push(Point3::new(r.x, -r.y, r.z));
        images.push(Point3::new(r.x, -r.y, -r.z));
    }
    images
}
