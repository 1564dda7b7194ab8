//! Yahoo client behaviour against a mocked chart endpoint.

use api_client::{Error, MarketDataProvider, YahooClient};
use app_config::MarketDataSettings;
use chrono::NaiveDate;
use core_types::Symbol;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHART_PATH: &str = "/v8/finance/chart";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn client_for(server: &MockServer) -> YahooClient {
    YahooClient::new(&MarketDataSettings {
        base_url: format!("{}{}", server.uri(), CHART_PATH),
        user_agent: "dashboard-tests".to_string(),
        timeout_secs: 5,
    })
    .expect("client builds")
}

/// 14:30 UTC on each date, i.e. a 09:30 New York open.
fn open_timestamps(dates: &[NaiveDate]) -> Vec<i64> {
    dates
        .iter()
        .map(|d| d.and_hms_opt(14, 30, 0).unwrap().and_utc().timestamp())
        .collect()
}

fn chart_body(timestamps: &[i64], closes: &[Option<f64>]) -> Value {
    let volumes: Vec<Option<u64>> = closes.iter().map(|c| c.map(|_| 1_000_000)).collect();
    json!({
        "chart": {
            "result": [{
                "meta": { "symbol": "AAPL", "gmtoffset": -18000, "exchangeTimezoneName": "America/New_York" },
                "timestamp": timestamps,
                "indicators": { "quote": [{
                    "open": closes,
                    "high": closes,
                    "low": closes,
                    "close": closes,
                    "volume": volumes
                }]}
            }],
            "error": null
        }
    })
}

async fn mount_chart(server: &MockServer, symbol: &str, status: u16, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("{CHART_PATH}/{symbol}")))
        .and(query_param("interval", "1d"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetches_daily_bars_in_date_order() {
    let server = MockServer::start().await;
    let dates = [date(2016, 1, 4), date(2016, 1, 5), date(2016, 1, 6)];
    mount_chart(
        &server,
        "AAPL",
        200,
        chart_body(&open_timestamps(&dates), &[Some(105.35), Some(102.71), Some(100.7)]),
    )
    .await;

    let series = client_for(&server)
        .fetch_daily(&Symbol::parse("AAPL"), date(2016, 1, 1), date(2016, 1, 31))
        .await
        .unwrap();

    assert_eq!(series.symbol(), &Symbol::parse("AAPL"));
    assert_eq!(series.dates().collect::<Vec<_>>(), dates.to_vec());
    assert_eq!(series.closes(), vec![105.35, 102.71, 100.7]);
}

#[tokio::test]
async fn sends_the_inclusive_period() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{CHART_PATH}/AAPL")))
        .and(query_param("period1", "1451606400"))
        .and(query_param("period2", "1454284800"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body(
            &open_timestamps(&[date(2016, 1, 29)]),
            &[Some(97.34)],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let series = client_for(&server)
        .fetch_daily(&Symbol::parse("AAPL"), date(2016, 1, 1), date(2016, 1, 31))
        .await
        .unwrap();
    assert_eq!(series.len(), 1);
}

#[tokio::test]
async fn drops_rows_with_missing_fields() {
    let server = MockServer::start().await;
    let dates = [date(2016, 1, 4), date(2016, 1, 5), date(2016, 1, 6)];
    mount_chart(
        &server,
        "AAPL",
        200,
        chart_body(&open_timestamps(&dates), &[Some(105.35), None, Some(100.7)]),
    )
    .await;

    let series = client_for(&server)
        .fetch_daily(&Symbol::parse("AAPL"), date(2016, 1, 1), date(2016, 1, 31))
        .await
        .unwrap();

    assert_eq!(
        series.dates().collect::<Vec<_>>(),
        vec![date(2016, 1, 4), date(2016, 1, 6)]
    );
}

#[tokio::test]
async fn duplicate_dates_keep_the_last_row() {
    let server = MockServer::start().await;
    let mut timestamps = open_timestamps(&[date(2016, 1, 4), date(2016, 1, 5)]);
    // A second, later print for Jan 5 (20:00 UTC, 15:00 in New York).
    timestamps.push(date(2016, 1, 5).and_hms_opt(20, 0, 0).unwrap().and_utc().timestamp());
    mount_chart(
        &server,
        "AAPL",
        200,
        chart_body(&timestamps, &[Some(1.0), Some(2.0), Some(3.0)]),
    )
    .await;

    let series = client_for(&server)
        .fetch_daily(&Symbol::parse("AAPL"), date(2016, 1, 1), date(2016, 1, 31))
        .await
        .unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series.closes(), vec![1.0, 3.0]);
}

#[tokio::test]
async fn unknown_symbol_is_reported() {
    let server = MockServer::start().await;
    mount_chart(
        &server,
        "NOPE",
        404,
        json!({ "chart": { "result": null, "error": {
            "code": "Not Found",
            "description": "No data found, symbol may be delisted"
        }}}),
    )
    .await;

    let err = client_for(&server)
        .fetch_daily(&Symbol::parse("NOPE"), date(2016, 1, 1), date(2016, 1, 31))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnknownSymbol { ref symbol, .. } if symbol == "NOPE"));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn range_without_trading_days_is_empty() {
    let server = MockServer::start().await;
    mount_chart(
        &server,
        "AAPL",
        200,
        json!({ "chart": { "result": [{
            "meta": { "symbol": "AAPL", "gmtoffset": -18000 },
            "indicators": { "quote": [{}] }
        }], "error": null }}),
    )
    .await;

    let err = client_for(&server)
        .fetch_daily(&Symbol::parse("AAPL"), date(2016, 12, 25), date(2016, 12, 25))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::EmptyRange { .. }));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn other_api_errors_keep_their_code() {
    let server = MockServer::start().await;
    mount_chart(
        &server,
        "AAPL",
        400,
        json!({ "chart": { "result": null, "error": {
            "code": "Bad Request",
            "description": "Invalid input - interval=1d is not supported"
        }}}),
    )
    .await;

    let err = client_for(&server)
        .fetch_daily(&Symbol::parse("AAPL"), date(2016, 1, 1), date(2016, 1, 31))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ApiError { ref code, .. } if code == "Bad Request"));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn server_errors_surface_the_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_daily(&Symbol::parse("AAPL"), date(2016, 1, 1), date(2016, 1, 31))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 502, .. }));
}

#[tokio::test]
async fn inverted_range_is_rejected_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_daily(&Symbol::parse("AAPL"), date(2016, 2, 1), date(2016, 1, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::EmptyRange { .. }));
}
