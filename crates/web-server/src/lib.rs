// In crates/web-server/src/lib.rs

use axum::{
    Router,
    extract::{
        State,
        rejection::JsonRejection,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Json},
    routing::get,
};
use app_config::ServerSettings;
use dashboard::{Dashboard, DashboardParams};
use events::{ChartSnapshot, WsCache, WsMessage};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast::{self, error::RecvError};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use types::ControlsResponse;

pub mod error;
pub mod types;

// Re-export our custom error type for convenience.
pub use error::{Error, Result};

/// The shared application state that is available to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub ws_tx: broadcast::Sender<WsMessage>, // For broadcasting live messages
    pub ws_cache: WsCache,                   // For replaying recent log messages
}

/// Creates the main application router with all routes and middleware.
pub fn create_router(app_state: AppState) -> Router {
    // The dashboard UI may be served from another origin during development.
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let api_router = Router::new()
        .route("/controls", get(get_controls_handler))
        .route("/chart", get(get_chart_handler).post(update_chart_handler));

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check_handler))
        .nest("/api", api_router)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(app_state)
}

/// A simple health check handler.
async fn health_check_handler() -> &'static str {
    "OK"
}

/// Handler for `GET /api/controls`
async fn get_controls_handler(State(state): State<AppState>) -> Json<ControlsResponse> {
    Json(ControlsResponse {
        bounds: *state.dashboard.bounds(),
        params: state.dashboard.params().await,
    })
}

/// Handler for `GET /api/chart`
async fn get_chart_handler(State(state): State<AppState>) -> Result<Json<Arc<ChartSnapshot>>> {
    state
        .dashboard
        .current()
        .await
        .map(Json)
        .ok_or_else(|| Error::NotFound("No chart has been loaded yet".to_string()))
}

/// Handler for `POST /api/chart`. Runs one full pass with the posted inputs.
///
/// A body that does not decode into inputs is invalid input like any other.
async fn update_chart_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<DashboardParams>, JsonRejection>,
) -> Result<Json<Arc<ChartSnapshot>>> {
    let Json(params) = body.map_err(|rejection| {
        state
            .dashboard
            .reject(dashboard::Error::InvalidInput(rejection.body_text()))
    })?;
    tracing::info!(
        ticker = %params.ticker,
        start_year = params.start_year,
        end_year = params.end_year,
        short_window = params.short_window,
        long_window = params.long_window,
        "Chart update requested."
    );
    let snapshot = state.dashboard.update(params).await?;
    Ok(Json(snapshot))
}

/// The handler for `GET /ws`.
/// Upgrades the connection to a WebSocket and handles the real-time communication.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// The actual WebSocket handling logic after the connection is upgraded.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    tracing::info!("New WebSocket client connected.");

    // Subscribe first so nothing published during the replay is missed.
    let mut rx = state.ws_tx.subscribe();

    // --- 1. The "Replay" ---
    let mut replay = state.ws_cache.snapshot();
    if let Some(snapshot) = state.dashboard.current().await {
        replay.push(WsMessage::ChartUpdate(snapshot));
    }
    for msg in &replay {
        if send_message(&mut socket, msg).await.is_err() {
            tracing::info!("WebSocket client disconnected during replay.");
            return;
        }
    }

    // --- 2. "Going Live" ---
    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(msg) => {
                    if send_message(&mut socket, &msg).await.is_err() {
                        tracing::info!("WebSocket client disconnected.");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "WebSocket client fell behind; messages dropped.");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("WebSocket client sent close frame.");
                    break;
                }
                Some(Err(e)) => {
                    tracing::info!(error = %e, "WebSocket receive failed.");
                    break;
                }
                // The UI talks to the REST endpoints; anything else it sends is ignored.
                Some(Ok(_)) => {}
            },
        }
    }
    tracing::info!("WebSocket client connection closed.");
}

async fn send_message(
    socket: &mut WebSocket,
    msg: &WsMessage,
) -> std::result::Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json_msg) => socket.send(Message::Text(json_msg.into())).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize WebSocket message.");
            Ok(())
        }
    }
}

/// The main entry point for running the web server.
///
/// This function sets up the TCP listener and serves the application router.
/// It will run forever until the process is terminated.
pub async fn run(settings: &ServerSettings, app_state: AppState) -> Result<()> {
    let app = create_router(app_state);

    let address = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&address).await.map_err(Error::ServerBindError)?;
    tracing::info!("Web server listening on {}", address);

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(Error::ServerError)?;

    Ok(())
}
