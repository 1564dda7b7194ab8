// In app/src/main.rs

use anyhow::{Context, Result};
use app_config::Settings;
use api_client::YahooClient;
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use dashboard::{ControlBounds, Dashboard, DashboardParams};
use events::{WsCache, WsMessage};
use signal_engine::SignalReport;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;
use web_server::AppState;

use self::tracing_layer::WsBroadcastLayer;
mod tracing_layer;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = "Moving-average crossover dashboard for daily stock prices."
)]
struct Cli {
    /// Read settings from this single TOML file instead of the `config/` layers.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serves the dashboard API and WebSocket feed.
    Serve,

    /// Prints the crossover events for one set of inputs and exits.
    Signals {
        /// The Yahoo ticker (e.g., "^GSPC", "AAPL").
        #[arg(short, long)]
        ticker: Option<String>,

        /// First calendar year to fetch (from January 1).
        #[arg(long)]
        start_year: Option<i32>,

        /// Last calendar year to fetch (through December 31).
        #[arg(long)]
        end_year: Option<i32>,

        /// Short moving-average window, in trading days.
        #[arg(long)]
        short: Option<usize>,

        /// Long moving-average window, in trading days.
        #[arg(long)]
        long: Option<usize>,
    },
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => app_config::load_settings_from_path(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => app_config::load_settings().context("loading layered settings")?,
    };

    // --- WebSocket and Tracing Setup ---
    let (ws_tx, _) = broadcast::channel::<WsMessage>(1024);
    let ws_cache = WsCache::default();
    let level = tracing::Level::from_str(&settings.app.log_level).unwrap_or(tracing::Level::INFO);
    let filter = log_filter(level);
    let ws_layer =
        WsBroadcastLayer::new(ws_tx.clone(), ws_cache.clone()).with_filter(filter.clone());
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter);
    tracing_subscriber::registry().with(fmt_layer).with(ws_layer).init();

    tracing::info!(
        environment = %settings.app.environment,
        "Starting moving-average dashboard"
    );

    match cli.command {
        Commands::Serve => {
            serve(settings, ws_tx, ws_cache).await?;
        }
        Commands::Signals {
            ticker,
            start_year,
            end_year,
            short,
            long,
        } => {
            let defaults = &settings.dashboard.defaults;
            let params = DashboardParams {
                ticker: ticker.unwrap_or_else(|| defaults.ticker.clone()),
                start_year: start_year.unwrap_or(defaults.start_year),
                end_year: end_year.unwrap_or(defaults.end_year),
                short_window: short.unwrap_or(defaults.short_window),
                long_window: long.unwrap_or(defaults.long_window),
            };
            print_signals(&settings, params).await?;
        }
    }

    Ok(())
}

/// The same level filter applies to the console and to the UI log feed.
fn log_filter(level: tracing::Level) -> Targets {
    Targets::new()
        .with_target("hyper_util", tracing::Level::WARN)
        .with_target("reqwest", tracing::Level::WARN)
        .with_default(level)
}

// --- "Serve" Subcommand Logic ---

/// Builds the dashboard, performs the initial load and serves until terminated.
async fn serve(
    settings: Settings,
    ws_tx: broadcast::Sender<WsMessage>,
    ws_cache: WsCache,
) -> Result<()> {
    // --- 1. Component Instantiation ---
    let provider = YahooClient::new(&settings.market_data)?;
    let dashboard = Arc::new(Dashboard::new(
        Arc::new(provider),
        &settings.dashboard,
        ws_tx.clone(),
    ));

    // --- 2. Initial Load ---
    let defaults = DashboardParams::from(&settings.dashboard.defaults);
    if let Err(e) = dashboard.update(defaults).await {
        tracing::error!(error = %e, "Initial chart load failed; serving without a chart.");
    }

    // --- 3. Serve ---
    let app_state = AppState {
        dashboard,
        ws_tx,
        ws_cache,
    };
    web_server::run(&settings.server, app_state).await?;

    Ok(())
}

// --- "Signals" Subcommand Logic ---

async fn print_signals(settings: &Settings, params: DashboardParams) -> Result<()> {
    let bounds = ControlBounds::from_settings(&settings.dashboard.bounds, Utc::now().year());
    let request = params.validate(&bounds)?;
    let provider = YahooClient::new(&settings.market_data)?;

    let report = dashboard::analyze(&provider, &request).await?;
    print!("{}", render_events(&report));

    Ok(())
}

fn render_events(report: &SignalReport) -> String {
    let mut out = format!(
        "{} from {} to {}: {} bars, {} buys, {} sells\n",
        report.analyzed.series().symbol(),
        report
            .analyzed
            .series()
            .first_date()
            .map(|d| d.to_string())
            .unwrap_or_default(),
        report
            .analyzed
            .series()
            .last_date()
            .map(|d| d.to_string())
            .unwrap_or_default(),
        report.analyzed.len(),
        report.buys().count(),
        report.sells().count(),
    );
    out.push_str(&format!(
        "{:<12} {:<6} {:>12} {:>12}\n",
        "date", "signal", "close", "short mean"
    ));
    for event in &report.events {
        out.push_str(&format!(
            "{:<12} {:<6} {:>12.2} {:>12.2}\n",
            event.date.to_string(),
            event.kind.label(),
            event.price,
            event.reference_level
        ));
    }
    out
}
