/// A position in 3-D space.
pub type Point3 = glam::Vec3;

/// Linear RGB color, each channel in `[0, 1]`.
pub type Color = glam::Vec3;

/// Identifier for a committed point in a [`crate::structure::StructureStore`].
///
/// This is the insertion index of the point, and is only meaningful within
/// the lifetime of a given store (a reset invalidates all ids).
pub type PointId = usize;
