use crate::{
    config::GrowthParameters,
    types::{Color, Point3, PointId},
};

/// Compresses a Y offset by the vertical anisotropy factor.
///
/// A zero factor leaves the offset untouched instead of dividing by zero.
pub(crate) fn compress_y(dy: f32, vertical_factor: f32) -> f32 {
    if vertical_factor.abs() > f32::EPSILON {
        dy / vertical_factor
    } else {
        dy
    }
}

/// Squared distance between `a` and `b` with the Y term compressed by
/// `vertical_factor`.
pub fn anisotropic_distance_squared(a: Point3, b: Point3, vertical_factor: f32) -> f32 {
    let d = a - b;
    let dy = compress_y(d.y, vertical_factor);
    d.x * d.x + dy * dy + d.z * d.z
}

/// Ordered, append-only store of committed crystal points.
///
/// Positions, display scales and display colors are kept in parallel arrays
/// indexed by [`PointId`]. Once a point is appended its position and index
/// never change; only the derived scale and color are recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureStore {
    positions: Vec<Point3>,
    scales: Vec<f32>,
    colors: Vec<Color>,
    capacity: usize,
}

impl StructureStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            scales: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the cap. Lowering it below the current length does not drop
    /// points; it only blocks further appends.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.scales.clear();
        self.colors.clear();
    }

    /// Radial parameter `id / capacity`, clamped to `[0, 1]`.
    ///
    /// This is an insertion-order proxy for growth generation, not the
    /// Euclidean distance from the center.
    pub fn radial_parameter(&self, id: PointId) -> f32 {
        if self.capacity == 0 {
            return 0.0;
        }
        (id as f32 / self.capacity as f32).clamp(0.0, 1.0)
    }

    /// Appends `pos` with its derived attributes.
    ///
    /// ### Returns
    /// - `Some(id)` of the new point.
    /// - `None` if the store is already at capacity; nothing is stored.
    pub fn push(&mut self, pos: Point3, params: &GrowthParameters) -> Option<PointId> {
        if self.is_full() {
            return None;
        }
        let id = self.positions.len();
        let r = self.radial_parameter(id);
        self.positions.push(pos);
        self.scales.push(scale_at(r, params));
        self.colors.push(color_at(r, params));
        Some(id)
    }

    /// Recomputes every display scale from its index and `params`.
    pub fn recompute_scales(&mut self, params: &GrowthParameters) {
        for id in 0..self.scales.len() {
            self.scales[id] = scale_at(self.radial_parameter(id), params);
        }
    }

    /// Recomputes every display color from its index and `params`.
    pub fn recompute_colors(&mut self, params: &GrowthParameters) {
        for id in 0..self.colors.len() {
            self.colors[id] = color_at(self.radial_parameter(id), params);
        }
    }

    /// Linear scan: is any committed point strictly closer than `threshold`?
    pub fn any_within(&self, pos: Point3, threshold: f32, vertical_factor: f32) -> bool {
        let t2 = threshold * threshold;
        self.positions
            .iter()
            .any(|q| anisotropic_distance_squared(pos, *q, vertical_factor) < t2)
    }
}

fn scale_at(r: f32, params: &GrowthParameters) -> f32 {
    params.inner_size_multiplier + (params.outer_size_multiplier - params.inner_size_multiplier) * r
}

fn color_at(r: f32, params: &GrowthParameters) -> Color {
    params.inner_color.lerp(params.outer_color, r)
}
