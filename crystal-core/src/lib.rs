//! Core 3-D snowflake growth library (diffusion-limited aggregation with
//! hexagonal symmetry).
//!
//! Main components:
//! - [`engine`]: spawning walkers, walking them and sticking them to the crystal.
//! - [`symmetry`]: expansion of one point into its 24-image orbit.
//! - [`structure`]: append-only store of committed points and their
//!   derived display attributes.
//! - [`walker`]: free walkers and the biased random-walk step.
//! - [`grid`]: optional hash grid accelerating collision queries.
//! - [`config`]: growth parameters and JSON presets.
//! - [`types`]: shared type aliases and IDs.

pub mod config;
pub mod engine;
pub mod grid;
pub mod structure;
pub mod symmetry;
pub mod types;
pub mod walker;
