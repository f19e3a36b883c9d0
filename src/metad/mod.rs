//! Metadynamics module - hill history, bias evaluation and the hybrid MC sampler.

mod history;
mod bias;
mod grid;
mod deposition;
mod reweight;
mod traits;
mod observables;
mod sampler;

pub use history::{Hill, HistoryStore};
pub use bias::{BiasPotential, PARALLEL_THRESHOLD};
pub use grid::Grid;
pub use deposition::WellTempered;
pub use reweight::{ebetac, reduced_bias_on_grid, stabilized_ratio};
pub use traits::{CollectiveVariable, HostEngine};
pub use observables::{Observable, ObservableRegistry};
pub use sampler::{metropolis_probability, on_cadence, Counters, HmcMetad, MetadParams, SamplerState, TrialOutcome};
