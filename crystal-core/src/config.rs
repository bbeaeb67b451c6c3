use crate::types::Color;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading or writing a parameter preset.
#[derive(Error, Debug)]
pub enum ParamsError {
    #[error("failed to access preset file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse preset: {0}")]
    Json(#[from] serde_json::Error),
}

/// Strategy used to answer "is any structure point within the collision
/// threshold of this walker".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionSearch {
    /// Scan every committed point.
    #[default]
    Linear,
    /// Query a uniform hash grid over the anisotropic metric space.
    Grid,
}

/// Tunable parameters of the growth process and of the derived display
/// attributes.
///
/// Changing these never moves committed points. Growth fields only affect
/// future ticks; size and color fields take effect on existing points after
/// [`crate::engine::CrystalGrowthEngine::recompute_sizes`] /
/// [`crate::engine::CrystalGrowthEngine::recompute_colors`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthParameters {
    /// Collision and visual radius unit. Walkers stick at `3 * particle_radius`.
    pub particle_radius: f32,
    /// Scale of the first committed points (radial parameter 0).
    pub inner_size_multiplier: f32,
    /// Scale of points at full capacity (radial parameter 1).
    pub outer_size_multiplier: f32,
    pub inner_color: Color,
    pub outer_color: Color,
    /// Magnitude of the per-axis jitter added to each walker step.
    pub randomness: f32,
    /// Y-axis anisotropy applied to spawning, jitter and the collision metric.
    pub vertical_factor: f32,
    /// Radius of the shell new walkers are spawned on.
    pub spawn_radius: f32,
    /// Length of the inward drift per step.
    pub step_size: f32,
    pub max_active: usize,
    /// Hard cap on the number of committed structure points.
    pub max_particles: usize,
    pub collision_search: CollisionSearch,
}

impl Default for GrowthParameters {
    fn default() -> Self {
        Self {
            particle_radius: 0.15,
            inner_size_multiplier: 1.5,
            outer_size_multiplier: 0.5,
            inner_color: Vec3::new(0.55, 0.85, 1.0),
            outer_color: Vec3::new(0.15, 0.25, 0.9),
            randomness: 0.5,
            vertical_factor: 0.3,
            spawn_radius: 12.0,
            step_size: 0.2,
            max_active: 50,
            max_particles: 5000,
            collision_search: CollisionSearch::Linear,
        }
    }
}

impl GrowthParameters {
    /// Distance below which a walker sticks to a structure point.
    pub fn collision_threshold(&self) -> f32 {
        3.0 * self.particle_radius
    }

    /// Parses a JSON preset. Missing fields take their default value.
    pub fn from_json_str(s: &str) -> Result<Self, ParamsError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json_string(&self) -> Result<String, ParamsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads a JSON preset from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let params = Self::from_json_str(&text)?;
        log::info!("loaded growth preset from {}", path.as_ref().display());
        Ok(params)
    }

    /// Writes this preset as pretty JSON to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ParamsError> {
        std::fs::write(path.as_ref(), self.to_json_string()?)?;
        log::info!("saved growth preset to {}", path.as_ref().display());
        Ok(())
    }
}
