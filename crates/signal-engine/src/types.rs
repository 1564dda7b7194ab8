// In crates/signal-engine/src/types.rs

use crate::error::{Error, Result};
use chrono::NaiveDate;
use core_types::{PriceBar, PriceSeries};
use serde::{Deserialize, Serialize};

/// The two averaging windows of the crossover, in trading days.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CrossoverSettings {
    pub short_window: usize,
    pub long_window: usize,
}

/// A trailing-mean column aligned by index with its price series.
///
/// `None` marks the warm-up entries where fewer than `window` closes exist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanColumn {
    pub window: usize,
    pub values: Vec<Option<f64>>,
}

/// A price series extended with the short and long moving-average columns.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedSeries {
    series: PriceSeries,
    short_mean: Option<MeanColumn>,
    long_mean: Option<MeanColumn>,
}

impl AnalyzedSeries {
    /// Wraps a bare price series; neither mean column is present yet.
    pub fn new(series: PriceSeries) -> Self {
        Self {
            series,
            short_mean: None,
            long_mean: None,
        }
    }

    /// Attaches (or replaces) the short-window mean column.
    pub fn with_short_mean(mut self, column: MeanColumn) -> Self {
        self.short_mean = Some(column);
        self
    }

    /// Attaches (or replaces) the long-window mean column.
    pub fn with_long_mean(mut self, column: MeanColumn) -> Self {
        self.long_mean = Some(column);
        self
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn short_mean(&self) -> Option<&MeanColumn> {
        self.short_mean.as_ref()
    }

    pub fn long_mean(&self) -> Option<&MeanColumn> {
        self.long_mean.as_ref()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Iterates the bars together with both means. Entries of a missing
    /// column read as undefined.
    pub fn rows(&self) -> impl Iterator<Item = AnalyzedRow<'_>> + '_ {
        self.series
            .bars()
            .iter()
            .enumerate()
            .map(move |(i, bar)| AnalyzedRow {
                bar,
                short_mean: column_value(self.short_mean.as_ref(), i),
                long_mean: column_value(self.long_mean.as_ref(), i),
            })
    }

    /// The short-mean column, checked to be present and as long as the series.
    pub(crate) fn require_short_mean(&self) -> Result<&MeanColumn> {
        require_column(self.short_mean.as_ref(), "short_mean", self.series.len())
    }

    /// The long-mean column, checked to be present and as long as the series.
    pub(crate) fn require_long_mean(&self) -> Result<&MeanColumn> {
        require_column(self.long_mean.as_ref(), "long_mean", self.series.len())
    }
}

fn require_column<'a>(
    column: Option<&'a MeanColumn>,
    name: &'static str,
    expected: usize,
) -> Result<&'a MeanColumn> {
    let column = column.ok_or(Error::MissingColumn(name))?;
    if column.values.len() != expected {
        return Err(Error::Misaligned {
            column: name,
            expected,
            actual: column.values.len(),
        });
    }
    Ok(column)
}

fn column_value(column: Option<&MeanColumn>, i: usize) -> Option<f64> {
    column.and_then(|c| c.values.get(i).copied().flatten())
}

/// One row of an [`AnalyzedSeries`].
#[derive(Debug, Clone, Copy)]
pub struct AnalyzedRow<'a> {
    pub bar: &'a PriceBar,
    pub short_mean: Option<f64>,
    pub long_mean: Option<f64>,
}

/// The implicit two-state position model: out of the market, or long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Holding {
    Flat,
    Long,
}

impl Holding {
    pub fn as_i8(self) -> i8 {
        match self {
            Holding::Flat => 0,
            Holding::Long => 1,
        }
    }
}

/// Position data for a single trading date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionPoint {
    pub date: NaiveDate,
    /// The raw holding (0 = flat, 1 = long); `None` while either mean is undefined.
    pub holding: Option<Holding>,
    /// First difference of the raw holding: `1` buy, `-1` sell, `0` no change.
    pub position: Option<i8>,
}

/// The position column derived from an [`AnalyzedSeries`], aligned by date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSeries {
    points: Vec<PositionPoint>,
}

impl PositionSeries {
    pub(crate) fn new(points: Vec<PositionPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[PositionPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The defined `position` values, in date order.
    pub fn positions(&self) -> impl Iterator<Item = i8> + '_ {
        self.points.iter().filter_map(|p| p.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    Buy,
    Sell,
}

impl SignalKind {
    /// Maps a non-zero `position` value to the transition it marks.
    pub fn from_position(position: i8) -> Option<Self> {
        match position {
            1 => Some(SignalKind::Buy),
            -1 => Some(SignalKind::Sell),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SignalKind::Buy => "Buy",
            SignalKind::Sell => "Sell",
        }
    }
}

/// A single crossover transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalEvent {
    pub date: NaiveDate,
    pub kind: SignalKind,
    /// The close on the transition date.
    pub price: f64,
    /// The short-window mean on the transition date, used as the marker's y-coordinate.
    pub reference_level: f64,
}

/// Everything one engine pass produces for a price series.
#[derive(Debug, Clone)]
pub struct SignalReport {
    pub analyzed: AnalyzedSeries,
    pub positions: PositionSeries,
    pub events: Vec<SignalEvent>,
}

impl SignalReport {
    pub fn buys(&self) -> impl Iterator<Item = &SignalEvent> + '_ {
        self.events.iter().filter(|e| e.kind == SignalKind::Buy)
    }

    pub fn sells(&self) -> impl Iterator<Item = &SignalEvent> + '_ {
        self.events.iter().filter(|e| e.kind == SignalKind::Sell)
    }
}
