// In crates/signal-engine/src/lib.rs

pub mod crossover;
pub mod error;
pub mod moving_average;
pub mod types;

pub use crossover::{classify, compute_signals, derive_events};
pub use error::{Error, Result};
pub use moving_average::{compute_moving_averages, rolling_mean};
pub use types::{
    AnalyzedRow, AnalyzedSeries, CrossoverSettings, Holding, MeanColumn, PositionPoint,
    PositionSeries, SignalEvent, SignalKind, SignalReport,
};

use core_types::PriceSeries;

/// Runs the full moving-average crossover pipeline over a price series.
///
/// The engine is stateless between calls: analyzing the same series with the
/// same settings always yields the same report.
#[derive(Debug, Clone, Copy)]
pub struct SignalEngine {
    settings: CrossoverSettings,
}

impl SignalEngine {
    pub fn new(settings: CrossoverSettings) -> Self {
        Self { settings }
    }

    pub fn analyze(&self, series: PriceSeries) -> Result<SignalReport> {
        // --- 1. Moving averages ---
        let analyzed = compute_moving_averages(
            series,
            self.settings.short_window,
            self.settings.long_window,
        );

        // --- 2. Positions ---
        let positions = compute_signals(&analyzed)?;

        // --- 3. Events ---
        let events: Vec<SignalEvent> = derive_events(&analyzed, &positions)?.collect();

        tracing::debug!(
            symbol = %analyzed.series().symbol(),
            rows = analyzed.len(),
            short_window = self.settings.short_window,
            long_window = self.settings.long_window,
            events = events.len(),
            "Crossover analysis complete."
        );

        Ok(SignalReport {
            analyzed,
            positions,
            events,
        })
    }
}
