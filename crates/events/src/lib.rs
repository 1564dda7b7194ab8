// --- WebSocket Message Structures ---

use chrono::{DateTime, NaiveDate, Utc};
use core_types::Symbol;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// How many messages a newly connected client is replayed.
pub const WS_CACHE_SIZE: usize = 200;

/// Represents a log message event to be sent to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct WsLogMessage {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub target: String,
    pub message: String,
}

/// One row of the price/mean curves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurvePoint {
    pub date: NaiveDate,
    pub price: f64,
    /// Natural log of the close, for the log-scale view.
    pub ln_price: f64,
    pub short_mean: Option<f64>,
    pub long_mean: Option<f64>,
    /// Short label for the axis, e.g. "Mar 4".
    pub day: String,
}

/// A Buy or Sell triangle on the chart, with its tooltip payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub x: NaiveDate,
    /// The short mean on that date.
    pub y: f64,
    /// "Buy" or "Sell".
    pub pos: String,
    /// Human readable date, e.g. "Mar 4".
    pub date: String,
    /// The close, formatted to two decimals.
    pub price: String,
}

/// Everything the chart shows after one successful recomputation.
///
/// Snapshots are immutable: every parameter change publishes a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSnapshot {
    pub ticker: Symbol,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub short_window: usize,
    pub long_window: usize,
    pub generated_at: DateTime<Utc>,
    pub curve: Vec<CurvePoint>,
    pub buy: Vec<Marker>,
    pub sell: Vec<Marker>,
}

/// Reported when a recomputation fails; the previous chart stays on screen.
#[derive(Debug, Clone, Serialize)]
pub struct WsUpdateFailed {
    pub timestamp: DateTime<Utc>,
    /// "invalid_input", "data_fetch" or "data_shape".
    pub kind: String,
    pub message: String,
}

/// The top-level WebSocket message enum.
/// `tag` and `content` are used by serde for clean JSON representation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum WsMessage {
    Log(WsLogMessage),
    ChartUpdate(Arc<ChartSnapshot>),
    UpdateFailed(WsUpdateFailed),
}

/// Bounded history of recent messages, replayed to clients as they connect.
#[derive(Debug, Clone)]
pub struct WsCache {
    inner: Arc<Mutex<VecDeque<WsMessage>>>,
    capacity: usize,
}

impl Default for WsCache {
    fn default() -> Self {
        Self::with_capacity(WS_CACHE_SIZE)
    }
}

impl WsCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Appends a message, evicting the oldest one once full.
    pub fn push(&self, msg: WsMessage) {
        if self.capacity == 0 {
            return;
        }
        // A panic while holding the lock cannot leave the deque inconsistent.
        let mut cache = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if cache.len() >= self.capacity {
            cache.pop_front();
        }
        cache.push_back(msg);
    }

    /// A copy of the cached messages, oldest first.
    pub fn snapshot(&self) -> Vec<WsMessage> {
        let cache = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        cache.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(message: &str) -> WsMessage {
        WsMessage::Log(WsLogMessage {
            timestamp: Utc::now(),
            level: "INFO".to_string(),
            target: "test".to_string(),
            message: message.to_string(),
        })
    }

    fn messages(cache: &WsCache) -> Vec<String> {
        cache
            .snapshot()
            .into_iter()
            .filter_map(|m| match m {
                WsMessage::Log(l) => Some(l.message),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn cache_evicts_oldest_first() {
        let cache = WsCache::with_capacity(2);
        cache.push(log("a"));
        cache.push(log("b"));
        cache.push(log("c"));
        assert_eq!(messages(&cache), vec!["b", "c"]);
    }

    #[test]
    fn clones_share_the_same_history() {
        let cache = WsCache::default();
        let handle = cache.clone();
        handle.push(log("shared"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn messages_are_tagged_for_the_ui() {
        let failed = WsMessage::UpdateFailed(WsUpdateFailed {
            timestamp: Utc::now(),
            kind: "data_fetch".to_string(),
            message: "Unknown symbol".to_string(),
        });
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["type"], "UpdateFailed");
        assert_eq!(json["payload"]["kind"], "data_fetch");

        let snapshot = ChartSnapshot {
            ticker: Symbol::parse("AAPL"),
            start: NaiveDate::from_ymd_opt(2016, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2016, 12, 31).unwrap(),
            short_window: 5,
            long_window: 20,
            generated_at: Utc::now(),
            curve: Vec::new(),
            buy: Vec::new(),
            sell: Vec::new(),
        };
        let json = serde_json::to_value(WsMessage::ChartUpdate(Arc::new(snapshot))).unwrap();
        assert_eq!(json["type"], "ChartUpdate");
        assert_eq!(json["payload"]["ticker"], "AAPL");
        assert_eq!(json["payload"]["start"], "2016-01-01");
    }
}
