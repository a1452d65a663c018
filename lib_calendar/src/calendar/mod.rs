//! # Calendar Data Module
//!
//! Groups the normalized calendar-event model and the live-stream decoder.
//! The decoder is a pure function of the raw message text, so everything in
//! this module is usable without a running connection.

/// Normalized calendar-event record, importance scale and symbol derivation.
pub mod event;
/// Decoder turning one raw stream message into a typed outcome.
pub mod decoder;

// --- Public API Re-exports ---
pub use decoder::{classify, decode_event, DecodeError, StreamMessage, KEEPALIVE_PAYLOAD};
pub use event::{parse_quantity, CalendarEvent, EventSymbol, Importance, SecurityCategory};
