//! # Core Client Module
//!
//! The concurrency-bearing pieces of the ingestion client: the subscription
//! registry shared between caller threads and the background task, the
//! downstream aggregator fan-out, the connection liveness flag, the
//! connection-attempt rate gate and the public client lifecycle.

/// Thread-safe set of subscribed symbols gating event forwarding.
pub mod registry;
/// Downstream sink trait and the channel fan-out implementation.
pub mod aggregator;
/// Lock-free connected flag for external health checks.
pub mod status;
/// Rate limiter bounding connection attempts to one per cooldown window.
pub mod rategate;
/// Public client: construct, start, subscribe, shut down.
pub mod client;

// --- Public API Re-exports ---
pub use aggregator::{ChannelAggregator, DataAggregator};
pub use client::CalendarClient;
pub use rategate::RateGate;
pub use registry::SubscriptionRegistry;
pub use status::ConnectionStatus;
