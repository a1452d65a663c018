//! # Downstream Aggregator
//!
//! The sink side of the ingestion pipeline. The supervisor pushes every
//! accepted event through [`DataAggregator::update`]; the aggregator fans
//! out to its own consumers with no backpressure signal. The provided
//! [`ChannelAggregator`] wraps each event in an `Arc` once and hands clones
//! of the pointer to every subscriber channel, so a fan-out never copies
//! the payload itself.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::calendar::event::CalendarEvent;

/// Push-based sink for accepted calendar events.
///
/// `update` must accept pushes unconditionally and return immediately; the
/// supervisor never waits on the downstream side.
pub trait DataAggregator: Send + Sync {
    /// Registers interest in a symbol and returns the notification channel
    /// for it. Multiple registrations for one symbol each get their own
    /// channel.
    fn add(&self, symbol: &str) -> mpsc::UnboundedReceiver<Arc<CalendarEvent>>;

    /// Drops every notification channel registered for the symbol.
    fn remove(&self, symbol: &str);

    /// Pushes one accepted event. No return value, no backpressure.
    fn update(&self, event: CalendarEvent);
}

/// Channel-based fan-out aggregator.
#[derive(Debug, Default)]
pub struct ChannelAggregator {
    channels: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Arc<CalendarEvent>>>>>,
}

impl ChannelAggregator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DataAggregator for ChannelAggregator {
    fn add(&self, symbol: &str) -> mpsc::UnboundedReceiver<Arc<CalendarEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut channels = self.channels.lock().expect("Aggregator lock poisoned");
        channels.entry(symbol.to_string()).or_default().push(tx);
        log::debug!("Aggregator channel registered for '{}'", symbol);
        rx
    }

    fn remove(&self, symbol: &str) {
        let mut channels = self.channels.lock().expect("Aggregator lock poisoned");
        if channels.remove(symbol).is_some() {
            log::debug!("Aggregator channels dropped for '{}'", symbol);
        }
    }

    fn update(&self, event: CalendarEvent) {
        let key = event.symbol.value.clone();
        let frame = Arc::new(event);

        let mut channels = self.channels.lock().expect("Aggregator lock poisoned");
        if let Some(senders) = channels.get_mut(&key) {
            // Drop senders whose receiver has gone away.
            senders.retain(|sender| sender.send(Arc::clone(&frame)).is_ok());
            if senders.is_empty() {
                channels.remove(&key);
            }
        }
        // No channel for this symbol: the push is accepted and discarded.
    }
}
