// In crates/api-client/src/yahoo.rs

use crate::types::{ChartEnvelope, ChartResult};
use crate::{Error, MarketDataProvider, Result};
use app_config::MarketDataSettings;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use core_types::{PriceBar, PriceSeries, Symbol};
use reqwest::{Client, StatusCode, Url};
use std::collections::BTreeMap;
use std::time::Duration;

/// The error code Yahoo uses for symbols it does not list.
const NOT_FOUND_CODE: &str = "Not Found";

/// Client for the Yahoo Finance v8 chart endpoint.
#[derive(Debug, Clone)]
pub struct YahooClient {
    /// The persistent HTTP client.
    http_client: Client,
    /// The chart endpoint, without the trailing symbol segment.
    base_url: Url,
}

impl YahooClient {
    /// Constructs a new client from the market data settings.
    pub fn new(settings: &MarketDataSettings) -> Result<Self> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| Error::ClientBuildError(format!("invalid base_url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::ClientBuildError(format!(
                "base_url '{}' cannot take a path",
                settings.base_url
            )));
        }

        let http_client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Builds `{base_url}/{symbol}?period1=..&period2=..&interval=1d`.
    ///
    /// `period2` is the midnight after `end`, which makes `end` inclusive.
    fn chart_url(&self, symbol: &Symbol, start: NaiveDate, end: NaiveDate) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::ClientBuildError("base_url cannot take a path".into()))?
            .pop_if_empty()
            .push(&symbol.0);

        let until = end.succ_opt().unwrap_or(end);
        url.query_pairs_mut()
            .append_pair("period1", &midnight_utc(start).to_string())
            .append_pair("period2", &midnight_utc(until).to_string())
            .append_pair("interval", "1d")
            .append_pair("includePrePost", "false")
            .append_pair("events", "div,splits");

        Ok(url)
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    fn name(&self) -> &'static str {
        "Yahoo"
    }

    async fn fetch_daily(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        if start > end {
            return Err(empty_range(symbol, start, end));
        }

        let url = self.chart_url(symbol, start, end)?;
        tracing::info!(%symbol, %start, %end, "Fetching daily prices.");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(Error::RequestFailed)?;
        let status = response.status();
        let body = response.text().await.map_err(Error::RequestFailed)?;

        let series = parse_chart_response(symbol, status, &body, start, end)?;
        tracing::debug!(
            %symbol,
            bars = series.len(),
            first = ?series.first_date(),
            last = ?series.last_date(),
            "Daily prices received."
        );
        Ok(series)
    }
}

/// Turns a raw chart response into a [`PriceSeries`].
///
/// Rows with any missing OHLCV field are dropped, as are rows outside
/// `[start, end]`. When two rows land on the same calendar date the later one
/// wins.
pub fn parse_chart_response(
    symbol: &Symbol,
    status: StatusCode,
    body: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries> {
    let envelope = match serde_json::from_str::<ChartEnvelope>(body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: truncate(body, 200),
            });
        }
        Err(e) => return Err(Error::DeserializationFailed(e)),
    };

    // Yahoo returns an error object on failure, so we check for that first.
    if let Some(error) = envelope.chart.error {
        return Err(if error.code == NOT_FOUND_CODE {
            Error::UnknownSymbol {
                symbol: symbol.to_string(),
                msg: error.description,
            }
        } else {
            Error::ApiError {
                code: error.code,
                msg: error.description,
            }
        });
    }
    if !status.is_success() {
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            body: truncate(body, 200),
        });
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(empty_range(symbol, start, end));
    };

    let bars = collect_bars(result, start, end)?;
    if bars.is_empty() {
        return Err(empty_range(symbol, start, end));
    }

    Ok(PriceSeries::new(symbol.clone(), bars)?)
}

fn collect_bars(result: ChartResult, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>> {
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };
    let offset = result.meta.gmtoffset;

    // Keyed by date: insertion order makes the last duplicate win, and the
    // map hands the bars back in ascending order.
    let mut by_date = BTreeMap::new();
    for (i, &timestamp) in result.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            value_at(&quote.open, i),
            value_at(&quote.high, i),
            value_at(&quote.low, i),
            value_at(&quote.close, i),
            value_at(&quote.volume, i),
        ) else {
            continue;
        };

        let date = timestamp
            .checked_add(offset)
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .ok_or(Error::InvalidTimestamp(timestamp))?
            .date_naive();
        if date < start || date > end {
            continue;
        }

        by_date.insert(
            date,
            PriceBar {
                date,
                open,
                high,
                low,
                close,
                volume,
            },
        );
    }

    Ok(by_date.into_values().collect())
}

fn value_at<T: Copy>(column: &[Option<T>], i: usize) -> Option<T> {
    column.get(i).copied().flatten()
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

fn empty_range(symbol: &Symbol, start: NaiveDate, end: NaiveDate) -> Error {
    Error::EmptyRange {
        symbol: symbol.to_string(),
        start,
        end,
    }
}

fn truncate(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
