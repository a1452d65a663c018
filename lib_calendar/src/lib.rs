// Declare the modules to re-export
pub mod calendar;
pub mod configs;
pub mod core;
pub mod ingestors;

// Re-export the primary public surface
pub use calendar::decoder::{classify, decode_event, DecodeError, StreamMessage};
pub use calendar::event::{CalendarEvent, EventSymbol, Importance, SecurityCategory};
pub use configs::config_stream::{load_config, ConfigError, ConfigOptions, StreamConfig};
pub use core::aggregator::{ChannelAggregator, DataAggregator};
pub use core::client::CalendarClient;
pub use core::registry::SubscriptionRegistry;
pub use core::status::ConnectionStatus;
