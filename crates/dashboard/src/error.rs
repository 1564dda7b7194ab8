// In crates/dashboard/src/error.rs

use thiserror::Error;

/// Why a recomputation pass failed. Every variant is local to that pass.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Data fetch failed: {0}")]
    DataFetch(#[from] api_client::Error),

    #[error("Data shape error: {0}")]
    DataShape(#[from] signal_engine::Error),
}

impl Error {
    /// Stable machine-readable name, sent to the UI with failures.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::DataFetch(_) => "data_fetch",
            Error::DataShape(_) => "data_shape",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
