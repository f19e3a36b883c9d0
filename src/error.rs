//! Error types for hybrid Monte Carlo metadynamics.

use thiserror::Error;

/// Every failure the sampler can report. None of them are recoverable:
/// callers are expected to abort the run.
#[derive(Error, Debug)]
pub enum MetadError {
    /// Invalid construction parameters; the run must not start.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A restart history table failed its shape or ordering checks.
    #[error("Malformed history: {0}")]
    MalformedHistory(String),

    /// A code path that is declared but deliberately unsupported.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// The caller broke an ordering contract (e.g. non-increasing timesteps).
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl MetadError {
    pub fn config(message: impl Into<String>) -> Self {
        MetadError::Configuration(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        MetadError::MalformedHistory(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        MetadError::InvariantViolation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, MetadError>;
