// In crates/api-client/src/lib.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{PriceSeries, Symbol};

pub mod error;
pub mod types;
pub mod yahoo;

// Re-export public types
pub use error::{Error, Result};
pub use yahoo::YahooClient;

/// The universal interface for a source of daily price history.
///
/// A provider turns a symbol and an inclusive calendar range into a
/// [`PriceSeries`]. It never retries; every failure is surfaced to the caller.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// The name of the provider (e.g., "Yahoo").
    fn name(&self) -> &'static str;

    /// Fetches one bar per trading day in `[start, end]`, ordered by date.
    ///
    /// Fails with [`Error::UnknownSymbol`] when the provider does not list the
    /// symbol and with [`Error::EmptyRange`] when the range holds no bars.
    async fn fetch_daily(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries>;
}
