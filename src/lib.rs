//! hmc_metad - hybrid Monte Carlo with well-tempered metadynamics in Rust
//!
//! A host dynamics engine is periodically interrupted for a Metropolis
//! trial on a history-dependent Gaussian bias over one collective variable,
//! while hills are deposited with well-tempered height rescaling.

pub mod error;
pub mod metad;
pub mod io;
pub mod systems;

// Re-export commonly used types at crate root
pub use error::{MetadError, Result};
pub use metad::{BiasPotential, CollectiveVariable, Counters, Grid, Hill, HistoryStore, HmcMetad, HostEngine, MetadParams, ObservableRegistry, SamplerState, TrialOutcome, WellTempered};
pub use io::{read_history, read_run_config, restore_checkpoint, write_history, LogWriter, RunConfig, SavedConfiguration, WriteMode};
pub use systems::{mean_radius, mean_x, DoubleWellLangevin, DoubleWellParams, ParticleState};
