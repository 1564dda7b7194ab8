// In crates/api-client/src/error.rs

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the API client: {0}")]
    ClientBuildError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("Unknown symbol '{symbol}': {msg}")]
    UnknownSymbol { symbol: String, msg: String },
    #[error("API error: code {code}, msg: {msg}")]
    ApiError { code: String, msg: String },
    #[error("Provider answered with HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("No price data for '{symbol}' between {start} and {end}")]
    EmptyRange {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("Timestamp {0} is outside the representable date range")]
    InvalidTimestamp(i64),
    #[error("Provider returned an inconsistent series: {0}")]
    InvalidSeries(#[from] core_types::Error),
}

impl Error {
    /// True when the request was well-formed but there is nothing to show:
    /// the symbol does not exist or the range holds no trading days.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::UnknownSymbol { .. } | Error::EmptyRange { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
