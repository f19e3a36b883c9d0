//! IO module - configuration, hill history files, checkpoints and observable logs.

mod checkpoint;
mod config;
mod history_file;
mod log_writer;

pub use checkpoint::{read_checkpoint, restore_checkpoint, write_checkpoint, SavedConfiguration};
pub use config::{read_run_config, RunConfig};
pub use history_file::{parse_history, read_history, write_history, write_history_to};
pub use log_writer::{LogWriter, WriteMode};
