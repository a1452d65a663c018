//! # Data Ingestors Module
//!
//! Ingestion clients for the upstream feeds. Each submodule owns the
//! lifecycle of one source: connecting, keeping the connection alive,
//! decoding what arrives and routing it downstream.
//!
//! ## Contained Modules:
//! - **`calendar_wss`**: the resilient WebSocket supervisor for the
//!   Trading Economics calendar stream.

/// The WebSocket supervisor for the calendar stream.
pub mod calendar_wss;

// --- Public API Re-exports ---
pub use calendar_wss::CalendarWssIngestor;
