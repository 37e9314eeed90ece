//! Error types for belief discretization and MDP solving.

use thiserror::Error;

use crate::belief::observation::Observation;

/// Errors raised while building or solving a discretized MDP.
#[derive(Error, Debug)]
pub enum Error {
    /// A parameter is outside its admissible range
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Bayes' rule was applied to an observation with zero likelihood
    #[error("undefined belief update: P({observation:?} | b = {belief}) is zero")]
    UndefinedUpdate { belief: f64, observation: Observation },

    /// Two parts of an MDP descriptor disagree on a dimension
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Encodings of the same MDP produced different solver output
    #[error("representations disagree: {0}")]
    RepresentationMismatch(String),

    /// NaN encountered where a total order was needed
    #[error("cannot order values: {0}")]
    Ordering(#[from] ndarray_stats::errors::MinMaxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;
