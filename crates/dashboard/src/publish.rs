// In crates/dashboard/src/publish.rs

use crate::params::PipelineRequest;
use chrono::{NaiveDate, Utc};
use events::{ChartSnapshot, CurvePoint, Marker};
use signal_engine::{SignalEvent, SignalKind, SignalReport};

/// Turns one engine report into the three chart outputs.
pub fn build_snapshot(request: &PipelineRequest, report: &SignalReport) -> ChartSnapshot {
    let curve = report
        .analyzed
        .rows()
        .map(|row| CurvePoint {
            date: row.bar.date,
            price: row.bar.close,
            ln_price: row.bar.close.ln(),
            short_mean: row.short_mean,
            long_mean: row.long_mean,
            day: day_label(row.bar.date),
        })
        .collect();

    ChartSnapshot {
        ticker: request.symbol.clone(),
        start: request.start,
        end: request.end,
        short_window: request.crossover.short_window,
        long_window: request.crossover.long_window,
        generated_at: Utc::now(),
        curve,
        buy: markers(&report.events, SignalKind::Buy),
        sell: markers(&report.events, SignalKind::Sell),
    }
}

fn markers(events: &[SignalEvent], kind: SignalKind) -> Vec<Marker> {
    events
        .iter()
        .filter(|e| e.kind == kind)
        .map(|e| Marker {
            x: e.date,
            y: e.reference_level,
            pos: e.kind.label().to_string(),
            date: day_label(e.date),
            price: format!("{:.2}", e.price),
        })
        .collect()
}

/// "Mar 4" style label.
fn day_label(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}
