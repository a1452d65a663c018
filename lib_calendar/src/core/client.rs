//! # Calendar Client
//!
//! Public lifecycle controller for the streaming client. Construction and
//! start are explicit two steps: `new()` wires the shared state, `start()`
//! spawns the connection supervisor on a background task. Once started the
//! supervisor runs until `shutdown()`, which cancels cooperatively and
//! returns only after the task has fully exited.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::calendar::event::CalendarEvent;
use crate::configs::config_stream::StreamConfig;
use crate::core::aggregator::DataAggregator;
use crate::core::registry::SubscriptionRegistry;
use crate::core::status::ConnectionStatus;
use crate::ingestors::calendar_wss::CalendarWssIngestor;

pub struct CalendarClient {
    config: StreamConfig,
    registry: Arc<SubscriptionRegistry>,
    aggregator: Arc<dyn DataAggregator>,
    status: Arc<ConnectionStatus>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl CalendarClient {
    /// Wires the client without starting ingestion.
    pub fn new(config: StreamConfig, aggregator: Arc<dyn DataAggregator>) -> Self {
        Self {
            config,
            registry: Arc::new(SubscriptionRegistry::new()),
            aggregator,
            status: Arc::new(ConnectionStatus::new()),
            token: CancellationToken::new(),
            task: None,
        }
    }

    /// Starts the connection supervisor on a background task. Idempotent;
    /// a client that has been shut down stays stopped. Must be called from
    /// within a tokio runtime.
    pub fn start(&mut self) {
        if self.task.is_some() {
            return;
        }

        let ingestor = CalendarWssIngestor::new(
            self.config.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&self.aggregator),
            Arc::clone(&self.status),
            self.token.clone(),
        );

        self.task = Some(tokio::spawn(async move { ingestor.run().await }));
    }

    /// Registers interest in a symbol and returns its notification channel.
    /// Never blocks on network I/O. Subscribing twice to one symbol is a
    /// no-op for the registry but still yields a fresh channel.
    pub fn subscribe(&self, symbol: &str) -> mpsc::UnboundedReceiver<Arc<CalendarEvent>> {
        if self.registry.subscribe(symbol) {
            log::debug!("Subscribe: {}", symbol);
        }
        self.aggregator.add(symbol)
    }

    /// Deregisters a symbol. Returns immediately; removing an absent symbol
    /// is a no-op.
    pub fn unsubscribe(&self, symbol: &str) {
        if self.registry.unsubscribe(symbol) {
            self.aggregator.remove(symbol);
            log::debug!("Unsubscribe: {}", symbol);
        }
    }

    /// Non-blocking status probe.
    pub fn is_connected(&self) -> bool {
        self.status.is_connected()
    }

    /// Cancels the supervisor and waits for the background task to exit.
    /// Registered subscriptions are left in place; only ingestion stops.
    pub async fn shutdown(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::error!("Calendar supervisor task aborted: {}", e);
            }
        }
        self.status.set_connected(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::decoder::decode_event;
    use crate::core::aggregator::ChannelAggregator;
    use std::collections::HashSet;
    use std::time::Duration;

    fn unreachable_config() -> StreamConfig {
        StreamConfig {
            // TCP port 1 on loopback refuses connections quickly.
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "demo".to_string(),
            key: "guest".to_string(),
            heartbeat_timeout: Duration::from_secs(5),
            reconnect_cooldown: Duration::from_secs(1),
            override_subscription_check: true,
            supported_countries: HashSet::from(["slovenia".to_string()]),
        }
    }

    #[test]
    fn subscribe_and_unsubscribe_manage_registry_and_channels() {
        let aggregator = Arc::new(ChannelAggregator::new());
        let client = CalendarClient::new(
            unreachable_config(),
            aggregator.clone() as Arc<dyn DataAggregator>,
        );

        let mut rx = client.subscribe("SLOVENIA//SVUER");
        assert!(client.registry.is_subscribed("SLOVENIA//SVUER"));

        aggregator.update(
            decode_event(
                r#"{"event":"Unemployment Rate","country":"Slovenia","category":"Unemployment Rate","ticker":"SVUER","actual":"8.2%","importance":1,"calendarId":236456}"#,
            )
            .unwrap(),
        );
        assert!(rx.try_recv().is_ok());

        client.unsubscribe("SLOVENIA//SVUER");
        assert!(!client.registry.is_subscribed("SLOVENIA//SVUER"));
        // Repeated unsubscribe is a no-op.
        client.unsubscribe("SLOVENIA//SVUER");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_joins_the_background_task_promptly() {
        let mut client = CalendarClient::new(
            unreachable_config(),
            Arc::new(ChannelAggregator::new()) as Arc<dyn DataAggregator>,
        );

        assert!(!client.is_connected());
        client.start();
        // Let the supervisor fail at least one connection attempt.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!client.is_connected());

        tokio::time::timeout(Duration::from_secs(5), client.shutdown())
            .await
            .expect("shutdown should join promptly");
        assert!(client.task.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn start_is_idempotent_and_stays_stopped_after_shutdown() {
        let mut client = CalendarClient::new(
            unreachable_config(),
            Arc::new(ChannelAggregator::new()) as Arc<dyn DataAggregator>,
        );

        client.start();
        client.start();
        client.shutdown().await;

        // The token is cancelled; a restarted task exits immediately.
        client.start();
        tokio::time::timeout(Duration::from_secs(5), client.shutdown())
            .await
            .expect("stopped client shuts down immediately");
    }
}
