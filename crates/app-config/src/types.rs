// In crates/app-config/src/types.rs

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Settings for the daily price provider.
    pub market_data: MarketDataSettings,
    pub server: ServerSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MarketDataSettings {
    /// The chart endpoint; the symbol is appended as the last path segment.
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct DashboardSettings {
    #[serde(default)]
    pub defaults: DashboardDefaults,
    #[serde(default)]
    pub bounds: ControlBoundsSettings,
}

/// The parameters the dashboard starts with.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DashboardDefaults {
    pub ticker: String,
    pub start_year: i32,
    pub end_year: i32,
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for DashboardDefaults {
    fn default() -> Self {
        Self {
            ticker: "^GSPC".to_string(),
            start_year: 2000,
            end_year: 2016,
            short_window: 50,
            long_window: 200,
        }
    }
}

/// Slider ranges for the UI controls. Window minimums are always 1.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ControlBoundsSettings {
    pub short_window_max: usize,
    pub long_window_max: usize,
    pub year_min: i32,
    /// Defaults to the current calendar year when unset.
    pub year_max: Option<i32>,
}

impl Default for ControlBoundsSettings {
    fn default() -> Self {
        Self {
            short_window_max: 100,
            long_window_max: 400,
            year_min: 1950,
            year_max: None,
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; ma-crossover-dashboard)".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}
