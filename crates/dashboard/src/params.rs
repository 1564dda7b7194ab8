// In crates/dashboard/src/params.rs

use crate::{Error, Result};
use app_config::{ControlBoundsSettings, DashboardDefaults};
use chrono::NaiveDate;
use core_types::Symbol;
use serde::{Deserialize, Serialize};
use signal_engine::CrossoverSettings;

/// The five UI inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardParams {
    /// Free text; surrounding whitespace is ignored.
    pub ticker: String,
    pub start_year: i32,
    pub end_year: i32,
    pub short_window: usize,
    pub long_window: usize,
}

impl From<&DashboardDefaults> for DashboardParams {
    fn from(defaults: &DashboardDefaults) -> Self {
        Self {
            ticker: defaults.ticker.clone(),
            start_year: defaults.start_year,
            end_year: defaults.end_year,
            short_window: defaults.short_window,
            long_window: defaults.long_window,
        }
    }
}

/// Inclusive slider range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Range<T> {
    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Slider ranges for the numeric controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlBounds {
    pub short_window: Range<usize>,
    pub long_window: Range<usize>,
    pub year: Range<i32>,
}

impl ControlBounds {
    /// Resolves configured bounds; an unset upper year is `current_year`.
    pub fn from_settings(settings: &ControlBoundsSettings, current_year: i32) -> Self {
        Self {
            short_window: Range {
                min: 1,
                max: settings.short_window_max,
            },
            long_window: Range {
                min: 1,
                max: settings.long_window_max,
            },
            year: Range {
                min: settings.year_min,
                max: settings.year_max.unwrap_or(current_year),
            },
        }
    }
}

/// Parameters that passed validation, in the form the pipeline consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    pub symbol: Symbol,
    /// January 1 of the start year.
    pub start: NaiveDate,
    /// December 31 of the end year.
    pub end: NaiveDate,
    pub crossover: CrossoverSettings,
}

impl DashboardParams {
    /// Checks every input against `bounds` before anything is fetched.
    pub fn validate(&self, bounds: &ControlBounds) -> Result<PipelineRequest> {
        let symbol = Symbol::parse(&self.ticker);
        if symbol.0.is_empty() {
            return Err(invalid("ticker must not be empty"));
        }

        for (name, year) in [("start_year", self.start_year), ("end_year", self.end_year)] {
            if !bounds.year.contains(year) {
                return Err(invalid(format!(
                    "{name} {year} is outside {}..={}",
                    bounds.year.min, bounds.year.max
                )));
            }
        }
        if self.start_year > self.end_year {
            return Err(invalid(format!(
                "start_year {} is after end_year {}",
                self.start_year, self.end_year
            )));
        }

        check_window("short_window", self.short_window, bounds.short_window)?;
        check_window("long_window", self.long_window, bounds.long_window)?;

        let start = NaiveDate::from_ymd_opt(self.start_year, 1, 1)
            .ok_or_else(|| invalid(format!("start_year {} has no calendar", self.start_year)))?;
        let end = NaiveDate::from_ymd_opt(self.end_year, 12, 31)
            .ok_or_else(|| invalid(format!("end_year {} has no calendar", self.end_year)))?;

        Ok(PipelineRequest {
            symbol,
            start,
            end,
            crossover: CrossoverSettings {
                short_window: self.short_window,
                long_window: self.long_window,
            },
        })
    }
}

fn check_window(name: &str, window: usize, range: Range<usize>) -> Result<()> {
    if window == 0 {
        return Err(invalid(format!("{name} must be at least 1")));
    }
    if !range.contains(window) {
        return Err(invalid(format!(
            "{name} {window} is outside {}..={}",
            range.min, range.max
        )));
    }
    Ok(())
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidInput(msg.into())
}
