// In crates/core-types/src/error.rs

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Price series must be in ascending date order: {previous} is followed by {next}")]
    UnorderedSeries { previous: NaiveDate, next: NaiveDate },

    #[error("Price series contains the trading date {0} more than once")]
    DuplicateDate(NaiveDate),
}

pub type Result<T> = std::result::Result<T, Error>;
