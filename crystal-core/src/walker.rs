use crate::{config::GrowthParameters, types::Point3};
use rand::Rng;
use std::f32::consts::TAU;

/// Samples a point uniformly on the spawn sphere, then flattens its Y
/// coordinate by `vertical_factor`.
///
/// Uses `θ = 2π·u1` and `φ = acos(2·u2 − 1)` with Y as the polar axis.
pub fn spawn_candidate(params: &GrowthParameters, rng: &mut impl Rng) -> Point3 {
    let theta = TAU * rng.random::<f32>();
    let phi = (2.0 * rng.random::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    let r = params.spawn_radius;

    Point3::new(
        r * phi.sin() * theta.cos(),
        r * phi.cos() * params.vertical_factor,
        r * phi.sin() * theta.sin(),
    )
}

/// One biased random-walk step: drift `step_size` toward the origin, then add
/// per-axis jitter in `[-randomness/2, randomness/2)` (scaled by
/// `vertical_factor` on Y).
///
/// A walker sitting exactly on the origin gets no drift.
pub fn advance(pos: Point3, params: &GrowthParameters, rng: &mut impl Rng) -> Point3 {
    let inward = (-pos).normalize_or_zero();
    let jitter = Point3::new(
        (rng.random::<f32>() - 0.5) * params.randomness,
        (rng.random::<f32>() - 0.5) * params.randomness * params.vertical_factor,
        (rng.random::<f32>() - 0.5) * params.randomness,
    );
    pos + inward * params.step_size + jitter
}

/// Bounded pool of free-moving walkers. Walkers are identified only by
/// their position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivePool {
    pub walkers: Vec<Point3>,
}

impl ActivePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.walkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walkers.is_empty()
    }

    pub fn clear(&mut self) {
        self.walkers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn spawn_lies_on_flattened_sphere() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let mut params = GrowthParameters::default();
        params.spawn_radius = 4.0;
        params.vertical_factor = 0.5;

        for _ in 0..200 {
            let p = spawn_candidate(&params, &mut rng);
            // Undo the flattening and the point is back on the sphere.
            let unflattened = Vec3::new(p.x, p.y / params.vertical_factor, p.z);
            assert!((unflattened.length() - 4.0).abs() < 1e-4, "{p:?}");
            assert!(p.y.abs() <= 2.0 + 1e-4);
        }
    }

    #[test]
    fn spawn_covers_both_hemispheres() {
        let mut rng = ChaCha12Rng::seed_from_u64(2);
        let params = GrowthParameters::default();

        let samples: Vec<Point3> = (0..500).map(|_| spawn_candidate(&params, &mut rng)).collect();

        assert!(samples.iter().any(|p| p.y > 0.0));
        assert!(samples.iter().any(|p| p.y < 0.0));
        assert!(samples.iter().any(|p| p.x < 0.0 && p.z < 0.0));
    }

    #[test]
    fn advance_without_jitter_drifts_toward_origin() {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let mut params = GrowthParameters::default();
        params.randomness = 0.0;
        params.step_size = 0.5;

        let next = advance(Vec3::new(3.0, 0.0, 4.0), &params, &mut rng);

        assert!((next - Vec3::new(2.7, 0.0, 3.6)).length() < 1e-6);
    }

    #[test]
    fn advance_at_origin_has_no_drift() {
        let mut rng = ChaCha12Rng::seed_from_u64(4);
        let mut params = GrowthParameters::default();
        params.randomness = 0.0;

        let next = advance(Vec3::ZERO, &params, &mut rng);

        assert_eq!(next, Vec3::ZERO);
        assert!(next.is_finite());
    }

    #[test]
    fn jitter_is_bounded_and_vertically_scaled() {
        let mut rng = ChaCha12Rng::seed_from_u64(5);
        let mut params = GrowthParameters::default();
        params.step_size = 0.0;
        params.randomness = 2.0;
        params.vertical_factor = 0.25;

        for _ in 0..200 {
            let d = advance(Vec3::new(1.0, 1.0, 1.0), &params, &mut rng) - Vec3::ONE;
            assert!(d.x.abs() <= 1.0 && d.z.abs() <= 1.0);
            assert!(d.y.abs() <= 0.25);
        }
    }
}
