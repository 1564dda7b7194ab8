// In crates/signal-engine/src/error.rs

use thiserror::Error;

/// Data-shape violations. These are contract errors between pipeline stages,
/// never user errors: each one aborts the current computation pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Moving average column `{0}` is missing; compute the moving averages first")]
    MissingColumn(&'static str),

    #[error("Column `{column}` has {actual} entries but the price series has {expected}")]
    Misaligned {
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Column `{0}` is not keyed by the same trading dates as the price series")]
    DateMismatch(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
