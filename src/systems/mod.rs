//! Systems module - host engines the sampler can drive.

mod double_well;

pub use double_well::{mean_radius, mean_x, DoubleWellLangevin, DoubleWellParams, ParticleState};
