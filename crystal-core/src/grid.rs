//! Uniform hash grid for collision queries.
//!
//! Points are bucketed in the anisotropic metric space, where the Y
//! coordinate is divided by the vertical factor. With the cell size equal to
//! the collision threshold, every point within the threshold of a query lies
//! in the query's cell or one of its 26 neighbors.

use crate::{
    structure::{StructureStore, anisotropic_distance_squared, compress_y},
    types::{Point3, PointId},
};
use glam::{IVec3, Vec3};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct CollisionGrid {
    cell_size: f32,
    vertical_factor: f32,
    cells: HashMap<IVec3, Vec<PointId>>,
    indexed: usize,
}

impl CollisionGrid {
    pub fn new(cell_size: f32, vertical_factor: f32) -> Self {
        Self {
            cell_size,
            vertical_factor,
            cells: HashMap::new(),
            indexed: 0,
        }
    }

    /// Whether the grid can answer queries at all. Degenerate cell sizes make
    /// [`CollisionGrid::any_within`] fall back to a linear scan.
    pub fn is_usable(&self) -> bool {
        self.cell_size.is_finite() && self.cell_size > 0.0
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn vertical_factor(&self) -> f32 {
        self.vertical_factor
    }

    /// Number of store points currently bucketed.
    pub fn indexed(&self) -> usize {
        self.indexed
    }

    fn cell_of(&self, p: Point3) -> IVec3 {
        let metric = Vec3::new(p.x, compress_y(p.y, self.vertical_factor), p.z);
        (metric / self.cell_size).floor().as_ivec3()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.indexed = 0;
    }

    /// Buckets every store point not yet indexed.
    pub fn sync(&mut self, store: &StructureStore) {
        if !self.is_usable() {
            self.indexed = store.len();
            return;
        }
        for id in self.indexed..store.len() {
            let cell = self.cell_of(store.positions()[id]);
            self.cells.entry(cell).or_default().push(id);
        }
        self.indexed = store.len();
    }

    /// Re-buckets the whole store for a new cell size or vertical factor.
    pub fn rebuild(&mut self, store: &StructureStore, cell_size: f32, vertical_factor: f32) {
        self.cell_size = cell_size;
        self.vertical_factor = vertical_factor;
        self.clear();
        self.sync(store);
        log::debug!(
            "collision grid rebuilt: {} points in {} cells (cell size {})",
            self.indexed,
            self.cells.len(),
            self.cell_size
        );
    }

    /// Is any indexed point strictly closer than the cell size to `pos`?
    ///
    /// The query radius is the cell size the grid was built with. `store`
    /// must be the store this grid was last synced or rebuilt against.
    pub(crate) fn any_within(&self, store: &StructureStore, pos: Point3) -> bool {
        if !self.is_usable() {
            return store.any_within(pos, self.cell_size, self.vertical_factor);
        }
        let t2 = self.cell_size * self.cell_size;
        // Far-out coordinates saturate at the i32 bounds; keep neighbors there too.
        let center = self.cell_of(pos);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let cell = center.saturating_add(IVec3::new(dx, dy, dz));
                    let Some(ids) = self.cells.get(&cell) else {
                        continue;
                    };
                    let hit = ids.iter().any(|&id| {
                        anisotropic_distance_squared(pos, store.positions()[id], self.vertical_factor)
                            < t2
                    });
                    if hit {
                        return true;
                    }
                }
            }
        }
        false
    }
}
