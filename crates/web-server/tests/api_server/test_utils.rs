use std::sync::Arc;

use api_client::YahooClient;
use app_config::{DashboardSettings, MarketDataSettings};
use axum_test::TestServer;
use chrono::{Duration, NaiveDate};
use dashboard::Dashboard;
use events::WsCache;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use web_server::{AppState, create_router};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHART_PATH: &str = "/v8/finance/chart";

/// Helper structure bundling together the HTTP server and the mocked provider.
#[allow(dead_code)]
pub struct TestApiServer {
    pub server: TestServer,
    pub yahoo: MockServer,
    pub dashboard: Arc<Dashboard>,
}

impl TestApiServer {
    pub async fn new() -> Self {
        let yahoo = MockServer::start().await;
        mock_chart(&yahoo, "AAPL", 200, rise_and_fall_chart()).await;
        mock_chart(&yahoo, "NOPE", 404, not_found_chart()).await;
        Mock::given(method("GET"))
            .and(path(format!("{CHART_PATH}/BROKEN")))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&yahoo)
            .await;

        let client = YahooClient::new(&MarketDataSettings {
            base_url: format!("{}{}", yahoo.uri(), CHART_PATH),
            user_agent: "web-server-tests".to_string(),
            timeout_secs: 5,
        })
        .expect("client builds");

        let (ws_tx, _) = broadcast::channel(64);
        let dashboard = Arc::new(Dashboard::new(
            Arc::new(client),
            &DashboardSettings::default(),
            ws_tx.clone(),
        ));
        let state = AppState {
            dashboard: dashboard.clone(),
            ws_tx,
            ws_cache: WsCache::default(),
        };

        // A real listener, so WebSocket upgrades work too.
        let server = TestServer::builder()
            .http_transport()
            .build(create_router(state))
            .expect("start test server");

        Self {
            server,
            yahoo,
            dashboard,
        }
    }
}

/// Inputs that select the mocked AAPL history.
pub fn chart_params(ticker: &str) -> Value {
    json!({
        "ticker": ticker,
        "start_year": 2016,
        "end_year": 2016,
        "short_window": 3,
        "long_window": 10
    })
}

async fn mock_chart(server: &MockServer, symbol: &str, status: u16, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("{CHART_PATH}/{symbol}")))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Thirty rising then thirty falling daily closes from 2016-01-04.
fn rise_and_fall_chart() -> Value {
    let first = NaiveDate::from_ymd_opt(2016, 1, 4).unwrap();
    let timestamps: Vec<i64> = (0..60)
        .map(|i| {
            (first + Duration::days(i))
                .and_hms_opt(14, 30, 0)
                .unwrap()
                .and_utc()
                .timestamp()
        })
        .collect();
    let closes: Vec<f64> = (0..60)
        .map(|i| if i < 30 { 100.0 + i as f64 } else { 159.0 - i as f64 })
        .collect();
    let volumes = vec![1_000_000u64; 60];

    json!({
        "chart": {
            "result": [{
                "meta": { "symbol": "AAPL", "gmtoffset": -18000 },
                "timestamp": timestamps,
                "indicators": { "quote": [{
                    "open": closes, "high": closes, "low": closes, "close": closes,
                    "volume": volumes
                }]}
            }],
            "error": null
        }
    })
}

fn not_found_chart() -> Value {
    json!({ "chart": { "result": null, "error": {
        "code": "Not Found",
        "description": "No data found, symbol may be delisted"
    }}})
}
