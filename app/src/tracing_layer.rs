// In app/src/tracing_layer.rs

use chrono::Utc;
use events::{WsCache, WsLogMessage, WsMessage};
use std::fmt::Write;
use tokio::sync::broadcast;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;

/// Forwards every log event to connected WebSocket clients and keeps the
/// most recent ones for clients that connect later.
pub struct WsBroadcastLayer {
    tx: broadcast::Sender<WsMessage>,
    cache: WsCache,
}

impl WsBroadcastLayer {
    pub fn new(tx: broadcast::Sender<WsMessage>, cache: WsCache) -> Self {
        Self { tx, cache }
    }
}

impl<S> Layer<S> for WsBroadcastLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = LogMessageVisitor::default();
        event.record(&mut visitor);
        let log_message = WsLogMessage {
            timestamp: Utc::now(),
            level: event.metadata().level().to_string(),
            target: event.metadata().target().to_string(),
            message: visitor.finish(),
        };
        let msg = WsMessage::Log(log_message);
        // Send to live clients; an error only means nobody is connected.
        let _ = self.tx.send(msg.clone());
        self.cache.push(msg);
    }
}

/// Renders `message` followed by the structured fields as `key=value`.
#[derive(Default)]
struct LogMessageVisitor {
    message: String,
    fields: String,
}

impl LogMessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields
        } else {
            format!("{} {}", self.message, self.fields)
        }
    }
}

impl Visit for LogMessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.record_debug(field, &value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
            return;
        }
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={:?}", field.name(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::prelude::*;

    #[test]
    fn events_reach_the_channel_and_the_cache() {
        let (tx, mut rx) = broadcast::channel(8);
        let cache = WsCache::with_capacity(4);
        let subscriber =
            tracing_subscriber::registry().with(WsBroadcastLayer::new(tx, cache.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(ticker = "AAPL", rows = 3, "Chart updated.");
        });

        let WsMessage::Log(log) = rx.try_recv().unwrap() else {
            panic!("expected a log message");
        };
        assert_eq!(log.level, "INFO");
        assert_eq!(log.message, "Chart updated. ticker=\"AAPL\" rows=3");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn filtered_layer_skips_events_below_the_log_level() {
        let (tx, _rx) = broadcast::channel(8);
        let cache = WsCache::with_capacity(4);
        let layer = WsBroadcastLayer::new(tx, cache.clone())
            .with_filter(crate::log_filter(tracing::Level::INFO));
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(rows = 3, "Crossover analysis complete.");
            tracing::info!("Chart updated.");
        });

        assert_eq!(cache.len(), 1);
    }
}
