// In crates/signal-engine/src/moving_average.rs

use crate::types::{AnalyzedSeries, MeanColumn};
use core_types::PriceSeries;

/// Simple trailing mean over `window` values, ending at each index inclusive.
///
/// The output has the same length as `values`; the first `window - 1`
/// entries are `None`. A window of 0 leaves every entry undefined.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let warm_up = values.len().min(window - 1);
    let mut means = vec![None; warm_up];
    means.extend(values.windows(window).map(|w| Some(window_mean(w))));
    means
}

/// Mean of a non-empty window, accumulated as offsets from its first value so
/// that a window of identical closes averages to exactly that close.
fn window_mean(window: &[f64]) -> f64 {
    let anchor = window[0];
    let offset: f64 = window.iter().map(|v| v - anchor).sum();
    anchor + offset / window.len() as f64
}

/// Extends a price series with its short- and long-window trailing means of `close`.
pub fn compute_moving_averages(
    series: PriceSeries,
    short_window: usize,
    long_window: usize,
) -> AnalyzedSeries {
    let closes = series.closes();
    let short_mean = MeanColumn {
        window: short_window,
        values: rolling_mean(&closes, short_window),
    };
    let long_mean = MeanColumn {
        window: long_window,
        values: rolling_mean(&closes, long_window),
    };

    AnalyzedSeries::new(series)
        .with_short_mean(short_mean)
        .with_long_mean(long_mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warm_up_entries_are_undefined() {
        let means = rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(means, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn window_longer_than_series_is_all_undefined() {
        let means = rolling_mean(&[1.0, 2.0], 5);
        assert_eq!(means, vec![None, None]);
    }

    #[test]
    fn window_of_one_is_the_series_itself() {
        let values = [3.5, 1.25, 8.0];
        let means = rolling_mean(&values, 1);
        assert_eq!(means, vec![Some(3.5), Some(1.25), Some(8.0)]);
    }

    #[test]
    fn zero_window_is_all_undefined() {
        assert_eq!(rolling_mean(&[1.0, 2.0, 3.0], 0), vec![None, None, None]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(rolling_mean(&[], 3).is_empty());
    }

    #[test]
    fn constant_window_is_exact() {
        // 0.1 cannot be summed exactly; the anchored mean still returns it unchanged.
        let values = vec![0.1; 30];
        for window in [1, 3, 7, 10, 30] {
            let means = rolling_mean(&values, window);
            assert!(means.iter().flatten().all(|m| *m == 0.1), "window {window}");
        }
    }
}
