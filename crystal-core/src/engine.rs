//! The crystal growth engine.
//!
//! A tick ([`CrystalGrowthEngine::step`]) runs:
//! 1. Spawn: if the walker pool and the capacity guard allow, add one walker
//!    on the spawn shell.
//! 2. Walk: advance every walker (in reverse index order) by one biased
//!    random-walk step.
//! 3. Stick: a walker closer than `3 * particle_radius` to any structure
//!    point (anisotropic metric) is expanded into its symmetry orbit, the
//!    images are appended to the structure and the walker is removed.

use crate::{
    config::{CollisionSearch, GrowthParameters},
    grid::CollisionGrid,
    structure::StructureStore,
    symmetry::{ORBIT_SIZE, symmetry_images},
    types::{Color, Point3, PointId},
    walker::{self, ActivePool},
};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// Owns the committed structure, the walker pool and the RNG that drives
/// spawning and jitter.
#[derive(Debug, Clone)]
pub struct CrystalGrowthEngine {
    params: GrowthParameters,
    structure: StructureStore,
    active: ActivePool,
    grid: CollisionGrid,
    rng: ChaCha12Rng,
    saturation_logged: bool,
}

impl CrystalGrowthEngine {
    /// Creates an engine seeded from the thread RNG, with the origin
    /// already committed.
    pub fn new(params: GrowthParameters) -> Self {
        Self::with_rng(params, ChaCha12Rng::from_rng(&mut rand::rng()))
    }

    /// Creates a reproducible engine: the same seed and parameters always
    /// grow the same crystal.
    pub fn with_seed(params: GrowthParameters, seed: u64) -> Self {
        Self::with_rng(params, ChaCha12Rng::seed_from_u64(seed))
    }

    fn with_rng(params: GrowthParameters, rng: ChaCha12Rng) -> Self {
        let mut engine = Self {
            params,
            structure: StructureStore::new(params.max_particles),
            active: ActivePool::new(),
            grid: CollisionGrid::new(params.collision_threshold(), params.vertical_factor),
            rng,
            saturation_logged: false,
        };
        engine.add_point(Point3::ZERO);
        log::info!(
            "crystal engine created: capacity {}, {} seed images",
            params.max_particles,
            engine.structure.len()
        );
        engine
    }

    pub fn params(&self) -> &GrowthParameters {
        &self.params
    }

    /// Replaces the parameters.
    ///
    /// Committed positions are untouched and derived sizes/colors are not
    /// recomputed; call [`Self::recompute_sizes`] / [`Self::recompute_colors`]
    /// for that.
    pub fn set_params(&mut self, params: GrowthParameters) {
        let metric_changed = params.particle_radius != self.params.particle_radius
            || params.vertical_factor != self.params.vertical_factor;

        if params.max_particles != self.params.max_particles {
            log::debug!(
                "structure capacity {} -> {}",
                self.params.max_particles,
                params.max_particles
            );
            self.structure.set_capacity(params.max_particles);
            self.saturation_logged = false;
        }

        self.params = params;

        if metric_changed {
            self.grid.rebuild(
                &self.structure,
                params.collision_threshold(),
                params.vertical_factor,
            );
        }
    }

    pub fn structure(&self) -> &StructureStore {
        &self.structure
    }

    pub fn active(&self) -> &ActivePool {
        &self.active
    }

    pub fn positions(&self) -> &[Point3] {
        self.structure.positions()
    }

    pub fn scales(&self) -> &[f32] {
        self.structure.scales()
    }

    pub fn colors(&self) -> &[Color] {
        self.structure.colors()
    }

    pub fn walkers(&self) -> &[Point3] {
        &self.active.walkers
    }

    pub fn structure_len(&self) -> usize {
        self.structure.len()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Committed points plus walkers, i.e. the number of instances a
    /// renderer draws.
    pub fn particle_count(&self) -> usize {
        self.structure.len() + self.active.len()
    }

    pub fn radial_parameter(&self, id: PointId) -> f32 {
        self.structure.radial_parameter(id)
    }

    pub fn is_saturated(&self) -> bool {
        self.structure.is_full()
    }

    /// Commits `p` and its symmetry images, stopping silently at capacity.
    ///
    /// Each image gets its radial parameter, scale and color from its
    /// insertion index. The collision grid is brought up to date afterwards.
    ///
    /// ### Parameters
    /// - `p` - Position to expand; usually the walker that just collided.
    ///
    /// ### Returns
    /// The number of images actually appended.
    pub fn add_point(&mut self, p: Point3) -> usize {
        let mut added = 0;
        for image in symmetry_images(p) {
            // Remaining images are dropped once the store is full.
            if self.structure.push(image, &self.params).is_none() {
                break;
            }
            added += 1;
        }
        self.grid.sync(&self.structure);

        if self.structure.is_full() && !self.saturation_logged {
            log::info!("crystal reached capacity of {} points", self.structure.capacity());
            self.saturation_logged = true;
        }
        added
    }

    /// Does a walker at `pos` touch the structure?
    pub fn collides(&self, pos: Point3) -> bool {
        match self.params.collision_search {
            CollisionSearch::Linear => self.structure.any_within(
                pos,
                self.params.collision_threshold(),
                self.params.vertical_factor,
            ),
            CollisionSearch::Grid => self.grid.any_within(&self.structure, pos),
        }
    }

    fn can_spawn(&self) -> bool {
        self.active.len() < self.params.max_active
            && self.structure.len() + self.active.len() * ORBIT_SIZE < self.params.max_particles
    }

    /// Advances the simulation by one tick.
    ///
    /// 1. Spawn one walker on the spawn shell if the pool has room and
    ///    `structure + active * ORBIT_SIZE` stays below `max_particles`.
    /// 2. Walk every walker from the back of the pool: drift toward the
    ///    origin by `step_size` and add jitter (see [`walker::advance`]).
    /// 3. A walker for which [`Self::collides`] holds is committed through
    ///    [`Self::add_point`] and removed from the pool. Later walkers in
    ///    the same tick already see the new images.
    /// 4. Walkers that did not collide stay in the pool for the next tick.
    pub fn step(&mut self) {
        // Approximate guard against overshooting capacity with pending orbits.
        if self.can_spawn() {
            let candidate = walker::spawn_candidate(&self.params, &mut self.rng);
            self.active.walkers.push(candidate);
        }

        // Reverse order keeps indices valid across removals.
        for i in (0..self.active.walkers.len()).rev() {
            let pos = walker::advance(self.active.walkers[i], &self.params, &mut self.rng);
            self.active.walkers[i] = pos;

            // Stick: expand into the orbit and leave the pool.
            if self.collides(pos) {
                self.add_point(pos);
                self.active.walkers.remove(i);
            }
        }
    }

    /// Runs `ticks` consecutive [`Self::step`] calls.
    pub fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Drops all points and walkers and commits the origin again.
    ///
    /// The RNG is not reseeded.
    pub fn reset(&mut self) {
        self.structure.clear();
        self.active.clear();
        self.grid.clear();
        self.saturation_logged = false;
        self.add_point(Point3::ZERO);
        log::info!("crystal reset to {} seed images", self.structure.len());
    }

    /// Recomputes every display scale from the current size endpoints.
    pub fn recompute_sizes(&mut self) {
        log::debug!("recomputing {} point sizes", self.structure.len());
        self.structure.recompute_scales(&self.params);
    }

    /// Recomputes every display color from the current color endpoints.
    pub fn recompute_colors(&mut self) {
        log::debug!("recomputing {} point colors", self.structure.len());
        self.structure.recompute_colors(&self.params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    /// Small, fast-colliding setup.
    fn dense_params(max_particles: usize) -> GrowthParameters {
        GrowthParameters {
            particle_radius: 1.0,
            randomness: 0.5,
            vertical_factor: 1.0,
            spawn_radius: 10.0,
            step_size: 1.0,
            max_active: 5,
            max_particles,
            ..GrowthParameters::default()
        }
    }

    #[test]
    fn new_seeds_origin_orbit() {
        let engine = CrystalGrowthEngine::with_seed(dense_params(100), 0);

        assert_eq!(engine.structure_len(), ORBIT_SIZE);
        assert_eq!(engine.active_len(), 0);
        assert!(engine.positions().iter().all(|p| *p == Vec3::ZERO));
        assert_eq!(engine.scales().len(), ORBIT_SIZE);
        assert_eq!(engine.colors().len(), ORBIT_SIZE);
    }

    #[test]
    fn seed_orbit_is_capped_by_small_capacity() {
        let engine = CrystalGrowthEngine::with_seed(dense_params(10), 0);

        assert_eq!(engine.structure_len(), 10);
        assert!(engine.is_saturated());
    }

    #[test]
    fn add_point_is_a_no_op_once_saturated() {
        let mut engine = CrystalGrowthEngine::with_seed(dense_params(30), 0);

        assert_eq!(engine.add_point(Vec3::new(1.0, 2.0, 3.0)), 6);
        assert_eq!(engine.structure_len(), 30);

        let before = engine.positions().to_vec();
        assert_eq!(engine.add_point(Vec3::new(4.0, 5.0, 6.0)), 0);
        assert_eq!(engine.positions(), before.as_slice());
    }

    #[test]
    fn appended_orbit_is_symmetric() {
        let mut engine = CrystalGrowthEngine::with_seed(dense_params(1000), 0);
        let start = engine.structure_len();

        engine.add_point(Vec3::new(0.4, 0.3, 0.9));
        let appended = &engine.positions()[start..];
        assert_eq!(appended.len(), ORBIT_SIZE);

        for q in appended {
            for image in symmetry_images(*q) {
                assert!(appended.iter().any(|a| (*a - image).length() < 1e-6));
            }
        }
    }

    #[test]
    fn collision_threshold_is_strict() {
        let eps = 1e-4;
        let engine = CrystalGrowthEngine::with_seed(dense_params(100), 0);
        let t = 3.0 * engine.params().particle_radius;

        assert!(engine.collides(Vec3::new(t - eps, 0.0, 0.0)));
        assert!(!engine.collides(Vec3::new(t + eps, 0.0, 0.0)));
        assert!(engine.collides(Vec3::new(0.0, 0.0, -(t - eps))));
    }

    #[test]
    fn collision_compresses_vertical_distance() {
        let eps = 1e-4;
        let mut params = dense_params(100);
        params.vertical_factor = 2.0;
        let engine = CrystalGrowthEngine::with_seed(params, 0);

        // Anisotropic distance is dy / 2.
        assert!(engine.collides(Vec3::new(0.0, 2.0 * (3.0 - eps), 0.0)));
        assert!(!engine.collides(Vec3::new(0.0, 2.0 * (3.0 + eps), 0.0)));
    }

    #[test]
    fn grid_search_matches_linear_search() {
        let mut linear = CrystalGrowthEngine::with_seed(dense_params(600), 11);
        let mut params = dense_params(600);
        params.collision_search = CollisionSearch::Grid;
        let mut grid = CrystalGrowthEngine::with_seed(params, 11);

        linear.run(3000);
        grid.run(3000);

        assert_eq!(linear.positions(), grid.positions());
        assert_eq!(linear.walkers(), grid.walkers());
    }

    #[test]
    fn structure_grows_monotonically_and_respects_capacity() {
        let mut engine = CrystalGrowthEngine::with_seed(dense_params(200), 3);
        let mut last = engine.structure_len();

        for _ in 0..5000 {
            engine.step();
            let len = engine.structure_len();
            assert!(len >= last);
            assert!(len <= 200);
            assert!(engine.active_len() <= engine.params().max_active);
            last = len;
        }
    }

    #[test]
    fn saturates_deterministically_at_small_capacity() {
        let params = dense_params(25);
        let mut a = CrystalGrowthEngine::with_seed(params, 42);
        let mut b = CrystalGrowthEngine::with_seed(params, 42);

        assert_eq!(a.structure_len(), 24);

        a.run(10_000);
        b.run(10_000);

        assert_eq!(a.structure_len(), 25);
        assert!(a.is_saturated());
        assert_eq!(a.positions(), b.positions());
        // The guard stops spawning once the next orbit could not fit.
        assert_eq!(a.active_len(), 0);
    }

    #[test]
    fn reset_restores_post_construction_state() {
        let params = dense_params(300);
        let fresh = CrystalGrowthEngine::with_seed(params, 9);
        let mut engine = CrystalGrowthEngine::with_seed(params, 9);

        engine.run(2000);
        assert!(engine.structure_len() > fresh.structure_len());

        engine.reset();

        assert_eq!(engine.structure(), fresh.structure());
        assert_eq!(engine.active_len(), 0);
        assert_eq!(engine.structure_len(), ORBIT_SIZE);
    }

    #[test]
    fn recompute_applies_new_endpoints_idempotently() {
        let mut engine = CrystalGrowthEngine::with_seed(dense_params(300), 5);
        engine.run(1000);
        let positions = engine.positions().to_vec();

        let mut params = *engine.params();
        params.inner_size_multiplier = 3.0;
        params.outer_size_multiplier = 3.0;
        params.inner_color = Vec3::ONE;
        params.outer_color = Vec3::ONE;
        engine.set_params(params);

        engine.recompute_sizes();
        let scales = engine.scales().to_vec();
        engine.recompute_sizes();
        assert_eq!(engine.scales(), scales.as_slice());
        assert!(scales.iter().all(|s| *s == 3.0));

        engine.recompute_colors();
        let colors = engine.colors().to_vec();
        engine.recompute_colors();
        assert_eq!(engine.colors(), colors.as_slice());
        assert!(colors.iter().all(|c| *c == Vec3::ONE));

        assert_eq!(engine.positions(), positions.as_slice());
    }

    #[test]
    fn radial_parameter_follows_insertion_index() {
        let engine = CrystalGrowthEngine::with_seed(dense_params(48), 0);

        assert_eq!(engine.radial_parameter(0), 0.0);
        assert_eq!(engine.radial_parameter(12), 0.25);
        assert_eq!(engine.radial_parameter(23), 23.0 / 48.0);
    }

    #[test]
    fn raising_capacity_resumes_growth() {
        let mut engine = CrystalGrowthEngine::with_seed(dense_params(24), 1);
        engine.run(200);
        assert_eq!(engine.structure_len(), 24);

        let mut params = *engine.params();
        params.max_particles = 200;
        engine.set_params(params);
        engine.run(5000);

        assert!(engine.structure_len() > 24);
        assert!(engine.structure_len() <= 200);
    }

    #[test]
    fn flat_vertical_factor_still_collides() {
        let mut params = dense_params(100);
        params.vertical_factor = 0.0;
        let mut engine = CrystalGrowthEngine::with_seed(params, 8);

        engine.run(2000);

        assert!(engine.structure_len() > ORBIT_SIZE);
        assert!(engine.positions().iter().all(|p| p.is_finite() && p.y == 0.0));
    }

    #[test]
    fn tiny_radius_with_grid_search_does_not_panic() {
        let params = GrowthParameters {
            particle_radius: 1e-9,
            collision_search: CollisionSearch::Grid,
            ..GrowthParameters::default()
        };
        let mut engine = CrystalGrowthEngine::with_seed(params, 1);

        engine.run(5);

        assert_eq!(engine.structure_len(), ORBIT_SIZE);
        assert!(engine.active_len() > 0);
    }

    #[test]
    fn metric_changes_rebuild_the_collision_grid() {
        use rand::Rng;

        let mut params = dense_params(800);
        params.collision_search = CollisionSearch::Grid;
        let mut engine = CrystalGrowthEngine::with_seed(params, 21);
        engine.run(3000);
        assert!(engine.structure_len() > ORBIT_SIZE);

        let mut rng = ChaCha12Rng::seed_from_u64(99);
        for &(radius, vf) in &[(0.4_f32, 0.3_f32), (1.7, 2.0), (0.25, 1.0)] {
            let mut changed = *engine.params();
            changed.particle_radius = radius;
            changed.vertical_factor = vf;
            engine.set_params(changed);

            let threshold = engine.params().collision_threshold();
            for _ in 0..300 {
                let q = Vec3::new(
                    rng.random_range(-15.0..=15.0),
                    rng.random_range(-8.0..=8.0),
                    rng.random_range(-15.0..=15.0),
                );
                assert_eq!(
                    engine.collides(q),
                    engine.structure().any_within(q, threshold, vf),
                    "grid out of date at {q:?} (radius {radius}, vf {vf})"
                );
            }
        }
    }

    #[test]
    fn particle_count_includes_walkers() {
        let mut engine = CrystalGrowthEngine::with_seed(dense_params(5000), 2);
        engine.step();

        assert_eq!(
            engine.particle_count(),
            engine.structure_len() + engine.active_len()
        );
        assert!(engine.active_len() <= 1);
    }
}
