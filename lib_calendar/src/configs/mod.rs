//! # Configuration Modules
//!
//! Layered configuration for the streaming client: built-in defaults,
//! optional JSON config file, environment variables and CLI flags.

/// Options loading, merging and validation for the calendar stream client.
pub mod config_stream;
