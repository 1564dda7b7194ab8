// In crates/dashboard/src/lib.rs

use api_client::MarketDataProvider;
use app_config::DashboardSettings;
use chrono::{Datelike, Utc};
use events::{ChartSnapshot, WsMessage, WsUpdateFailed};
use signal_engine::{SignalEngine, SignalReport};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, broadcast};

pub mod error;
pub mod params;
pub mod publish;

pub use error::{Error, Result};
pub use params::{ControlBounds, DashboardParams, PipelineRequest, Range};
pub use publish::build_snapshot;

/// What the UI currently shows.
#[derive(Debug, Clone)]
struct DashboardState {
    /// The parameters of the last successful pass, or the defaults.
    params: DashboardParams,
    snapshot: Option<Arc<ChartSnapshot>>,
}

/// Recompute-on-change pipeline: validate, fetch, analyze, publish.
///
/// Passes never overlap: `update` holds the pipeline lock for the whole pass,
/// so parameter changes are applied one after another in arrival order.
pub struct Dashboard {
    provider: Arc<dyn MarketDataProvider>,
    bounds: ControlBounds,
    pipeline: Mutex<()>,
    state: RwLock<DashboardState>,
    ws_tx: broadcast::Sender<WsMessage>,
}

impl Dashboard {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        settings: &DashboardSettings,
        ws_tx: broadcast::Sender<WsMessage>,
    ) -> Self {
        let bounds = ControlBounds::from_settings(&settings.bounds, Utc::now().year());
        Self {
            provider,
            bounds,
            pipeline: Mutex::new(()),
            state: RwLock::new(DashboardState {
                params: DashboardParams::from(&settings.defaults),
                snapshot: None,
            }),
            ws_tx,
        }
    }

    pub fn bounds(&self) -> &ControlBounds {
        &self.bounds
    }

    /// The parameters behind the current snapshot (the defaults before the
    /// first successful pass).
    pub async fn params(&self) -> DashboardParams {
        self.state.read().await.params.clone()
    }

    pub async fn current(&self) -> Option<Arc<ChartSnapshot>> {
        self.state.read().await.snapshot.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.ws_tx.subscribe()
    }

    /// Runs one full pass and publishes its result.
    ///
    /// On success the snapshot is replaced wholesale and broadcast as a
    /// `ChartUpdate`. On failure the previous snapshot stays current and an
    /// `UpdateFailed` message is broadcast instead.
    pub async fn update(&self, params: DashboardParams) -> Result<Arc<ChartSnapshot>> {
        let _pass = self.pipeline.lock().await;

        match self.recompute(&params).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                {
                    let mut state = self.state.write().await;
                    state.params = params;
                    state.snapshot = Some(Arc::clone(&snapshot));
                }
                tracing::info!(
                    ticker = %snapshot.ticker,
                    rows = snapshot.curve.len(),
                    buys = snapshot.buy.len(),
                    sells = snapshot.sell.len(),
                    "Chart updated."
                );
                // No receivers is fine; nobody is watching yet.
                let _ = self.ws_tx.send(WsMessage::ChartUpdate(Arc::clone(&snapshot)));
                Ok(snapshot)
            }
            Err(e) => Err(self.reject(e)),
        }
    }

    /// Announces a failed pass to the UI and hands the error back.
    ///
    /// Also used for requests whose inputs could not be read at all, which
    /// never reach [`Dashboard::update`].
    pub fn reject(&self, e: Error) -> Error {
        tracing::warn!(kind = e.kind(), error = %e, "Chart update failed.");
        let _ = self.ws_tx.send(WsMessage::UpdateFailed(WsUpdateFailed {
            timestamp: Utc::now(),
            kind: e.kind().to_string(),
            message: e.to_string(),
        }));
        e
    }

    async fn recompute(&self, params: &DashboardParams) -> Result<ChartSnapshot> {
        // --- 1. Validate ---
        let request = params.validate(&self.bounds)?;

        // --- 2. Fetch and analyze ---
        let report = analyze(self.provider.as_ref(), &request).await?;

        // --- 3. Publish ---
        Ok(build_snapshot(&request, &report))
    }
}

/// Fetches the requested range and runs the crossover engine over it.
pub async fn analyze(
    provider: &dyn MarketDataProvider,
    request: &PipelineRequest,
) -> Result<SignalReport> {
    let series = provider
        .fetch_daily(&request.symbol, request.start, request.end)
        .await?;
    tracing::debug!(
        provider = provider.name(),
        symbol = %request.symbol,
        bars = series.len(),
        "Price series fetched."
    );

    Ok(SignalEngine::new(request.crossover).analyze(series)?)
}
