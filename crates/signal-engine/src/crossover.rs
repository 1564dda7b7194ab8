// In crates/signal-engine/src/crossover.rs

use crate::error::{Error, Result};
use crate::types::{AnalyzedSeries, Holding, PositionPoint, PositionSeries, SignalEvent, SignalKind};

/// Classifies one date from its two means.
///
/// Long only when the short mean is strictly above the long mean; a tie is
/// "not above" and therefore flat. Undefined when either mean is undefined.
pub fn classify(short_mean: Option<f64>, long_mean: Option<f64>) -> Option<Holding> {
    match (short_mean, long_mean) {
        (Some(short), Some(long)) if short > long => Some(Holding::Long),
        (Some(_), Some(_)) => Some(Holding::Flat),
        _ => None,
    }
}

/// Derives the position column from the two moving-average columns.
///
/// `position[i]` is the first difference of the raw holding. Warm-up dates
/// (either mean undefined) count as flat when differencing but report no
/// position of their own, and the first date of the series has nothing to
/// difference against.
///
/// Fails without producing any output when either mean column is missing or
/// not aligned with the series.
pub fn compute_signals(analyzed: &AnalyzedSeries) -> Result<PositionSeries> {
    let short_mean = analyzed.require_short_mean()?;
    let long_mean = analyzed.require_long_mean()?;

    let holdings: Vec<Option<Holding>> = short_mean
        .values
        .iter()
        .zip(&long_mean.values)
        .map(|(short, long)| classify(*short, *long))
        .collect();

    let raw: Vec<i8> = holdings
        .iter()
        .map(|h| h.unwrap_or(Holding::Flat).as_i8())
        .collect();
    let differences = std::iter::once(None).chain(raw.windows(2).map(|w| Some(w[1] - w[0])));

    let points = analyzed
        .series()
        .dates()
        .zip(holdings)
        .zip(differences)
        .map(|((date, holding), difference)| PositionPoint {
            date,
            holding,
            position: holding.and(difference),
        })
        .collect();

    Ok(PositionSeries::new(points))
}

/// Lazily yields one [`SignalEvent`] per non-zero position, in date order.
///
/// Each event carries the close and the short mean of its date. The position
/// series must have been computed from `analyzed`.
pub fn derive_events<'a>(
    analyzed: &'a AnalyzedSeries,
    positions: &'a PositionSeries,
) -> Result<impl Iterator<Item = SignalEvent> + 'a> {
    let short_mean = analyzed.require_short_mean()?;

    if positions.len() != analyzed.len() {
        return Err(Error::Misaligned {
            column: "position",
            expected: analyzed.len(),
            actual: positions.len(),
        });
    }
    if !analyzed
        .series()
        .dates()
        .eq(positions.points().iter().map(|p| p.date))
    {
        return Err(Error::DateMismatch("position"));
    }

    let events = analyzed
        .series()
        .bars()
        .iter()
        .zip(&short_mean.values)
        .zip(positions.points())
        .filter_map(|((bar, short), point)| {
            let kind = SignalKind::from_position(point.position?)?;
            Some(SignalEvent {
                date: bar.date,
                kind,
                price: bar.close,
                reference_level: (*short)?,
            })
        });

    Ok(events)
}
