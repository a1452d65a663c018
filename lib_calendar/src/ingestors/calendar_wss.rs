//! # Calendar WSS Ingestor
//!
//! The connection supervisor for the Trading Economics calendar stream.
//! Owns the reconnect loop: rate-limited connection attempts, one subscribe
//! handshake per connection, heartbeat-based liveness detection, message
//! reassembly and decode, and routing of accepted events through the
//! subscription registry to the downstream aggregator.
//!
//! Transport failures never escape `run()`; they mark the status
//! disconnected and send the loop back to another attempt. Only the
//! cancellation token ends the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tokio_util::sync::CancellationToken;

use crate::calendar::decoder::{classify, StreamMessage};
use crate::calendar::event::{CalendarEvent, SecurityCategory};
use crate::configs::config_stream::StreamConfig;
use crate::core::aggregator::DataAggregator;
use crate::core::rategate::RateGate;
use crate::core::registry::SubscriptionRegistry;
use crate::core::status::ConnectionStatus;

/// Control message declaring interest in the calendar topic. Sent exactly
/// once per connection, never repeated mid-stream.
const SUBSCRIBE_MESSAGE: &str = "{\"topic\": \"subscribe\", \"to\": \"calendar\"}";

/// The feed emits a keepalive every 45 seconds; the configured heartbeat
/// timeout is the grace period on top of that.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(45);

/// How long a silent socket can defer the heartbeat check. The check itself
/// runs inline once per read iteration, this tick only bounds the wait.
const WATCHDOG_TICK: Duration = Duration::from_secs(1);

pub struct CalendarWssIngestor {
    config: StreamConfig,
    registry: Arc<SubscriptionRegistry>,
    aggregator: Arc<dyn DataAggregator>,
    status: Arc<ConnectionStatus>,
    gate: RateGate,
    token: CancellationToken,
}

impl CalendarWssIngestor {
    pub fn new(
        config: StreamConfig,
        registry: Arc<SubscriptionRegistry>,
        aggregator: Arc<dyn DataAggregator>,
        status: Arc<ConnectionStatus>,
        token: CancellationToken,
    ) -> Self {
        let gate = RateGate::new(config.reconnect_cooldown);
        Self {
            config,
            registry,
            aggregator,
            status,
            gate,
            token,
        }
    }

    /// Primary execution loop with reconnection logic. Runs until the
    /// cancellation token fires.
    pub async fn run(&self) {
        loop {
            if self.token.is_cancelled() {
                break;
            }

            // One attempt per cooldown window, abandoned promptly on shutdown.
            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = self.gate.wait_to_proceed() => {}
            }

            log::info!(
                "Connecting to calendar stream: ws://{}:{}",
                self.config.host,
                self.config.port
            );

            let url = self.config.stream_url();
            let connected = tokio::select! {
                _ = self.token.cancelled() => break,
                result = connect_async(url.as_str()) => result,
            };

            match connected {
                Ok((ws_stream, _)) => {
                    self.stream_session(ws_stream).await;
                    self.status.set_connected(false);
                    log::warn!("Calendar stream session ended. Reconnecting...");
                }
                Err(e) => {
                    self.status.set_connected(false);
                    log::error!("Failed to connect to calendar stream: {}", e);
                }
            }
        }

        self.status.set_connected(false);
        log::info!("Calendar WSS ingestor stopped.");
    }

    /// Runs one connection session: handshake once, then read until the
    /// connection dies, the heartbeat lapses or shutdown is requested.
    async fn stream_session(
        &self,
        ws_stream: tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    ) {
        let (mut write, mut read) = ws_stream.split();

        if let Err(e) = write.send(Message::Text(SUBSCRIBE_MESSAGE.into())).await {
            log::error!("Failed to send calendar subscribe handshake: {}", e);
            return;
        }

        log::info!("Connected and subscribed to the calendar topic.");
        self.status.set_connected(true);
        let mut last_heartbeat = Instant::now();

        loop {
            tokio::select! {
                _ = self.token.cancelled() => {
                    let _ = write.close().await;
                    return;
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_frame(text.as_str(), &mut last_heartbeat);
                        }
                        Some(Ok(Message::Binary(bin))) => {
                            match String::from_utf8(bin.to_vec()) {
                                Ok(text) => self.handle_frame(&text, &mut last_heartbeat),
                                Err(_) => log::warn!("Dropping non-UTF-8 binary frame"),
                            }
                        }
                        Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                        Some(Ok(Message::Close(_))) | None => {
                            log::warn!("Calendar stream closed by remote host.");
                            break;
                        }
                        Some(Err(e)) => {
                            log::error!("Calendar stream read error: {}", e);
                            break;
                        }
                        _ => {}
                    }
                }
                _ = tokio::time::sleep(WATCHDOG_TICK) => {}
            }

            // Checked once per read iteration while handshaked; a select arm
            // on a timer would race the shutdown signal.
            let allowed_silence = self.config.heartbeat_timeout + KEEPALIVE_INTERVAL;
            if last_heartbeat.elapsed() > allowed_silence {
                self.status.set_connected(false);
                log::error!(
                    "Calendar stream timed out ({}s without a keepalive)",
                    allowed_silence.as_secs()
                );
                break;
            }
        }
    }

    /// Handles one complete logical message from the transport.
    fn handle_frame(&self, raw: &str, last_heartbeat: &mut Instant) {
        // Newlines and carriage returns shouldn't be part of the data.
        let cleaned = raw.replace(['\r', '\n'], "");

        match classify(&cleaned) {
            Ok(StreamMessage::Keepalive) => {
                *last_heartbeat = Instant::now();
            }
            Ok(StreamMessage::Event(event)) => {
                self.forward(event);
            }
            Err(e) => {
                // A malformed message never kills the connection. Only
                // payloads mentioning a supported country are worth an
                // error-level entry; everything else is benign noise.
                let lowered = cleaned.to_lowercase();
                if self
                    .config
                    .supported_countries
                    .iter()
                    .any(|country| lowered.contains(country.as_str()))
                {
                    log::error!("Dropping malformed calendar message ({}): {}", e, cleaned);
                } else {
                    log::debug!("Ignoring unrecognized stream message");
                }
            }
        }
    }

    /// Forwards one decoded event to the aggregator when the country
    /// allow-list and the subscription-gate policy admit it. The membership
    /// check and the push run under the registry guard so a concurrent
    /// (un)subscribe cannot land in between.
    fn forward(&self, event: CalendarEvent) {
        if !self.config.supports_country(&event.country) {
            return;
        }

        self.registry.with_symbols(|symbols| {
            let allowed = self.config.override_subscription_check
                || symbols.contains(&event.symbol.value)
                || (event.symbol.category == SecurityCategory::Base && !event.symbol.is_universe());

            if allowed {
                log::debug!("Forwarding calendar event {}", event.symbol);
                self.aggregator.update(event);
            }
        });
    }
}
