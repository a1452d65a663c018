//! # Stream Client Configuration
//!
//! Options are layered: built-in defaults, then an optional JSON config
//! file, then environment variables and CLI flags (clap handles the last
//! two). The merged options are validated into a concrete [`StreamConfig`];
//! missing credentials are fatal before the ingestion loop ever starts.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Countries whose events are forwarded downstream unless overridden via
/// the `supported-countries` option.
pub const DEFAULT_SUPPORTED_COUNTRIES: &[&str] = &[
    "australia",
    "austria",
    "belgium",
    "canada",
    "china",
    "cyprus",
    "estonia",
    "finland",
    "france",
    "germany",
    "greece",
    "ireland",
    "italy",
    "japan",
    "latvia",
    "lithuania",
    "luxembourg",
    "malta",
    "netherlands",
    "new zealand",
    "portugal",
    "slovakia",
    "slovenia",
    "spain",
    "sweden",
    "switzerland",
    "united kingdom",
    "united states",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required credential: {0}")]
    MissingCredential(&'static str),
}

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "Trading Economics calendar stream client", version)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOptions {
    #[clap(long, env = "TE_STREAM_HOST", help = "Streaming feed host.")]
    pub stream_host: Option<String>,

    #[clap(long, env = "TE_STREAM_PORT", help = "Streaming feed port.")]
    pub stream_port: Option<u16>,

    #[clap(long, env = "TE_STREAM_USER", help = "Stream credential user.")]
    pub stream_user: Option<String>,

    #[clap(long, env = "TE_STREAM_KEY", help = "Stream credential key.")]
    pub stream_key: Option<String>,

    #[clap(
        long,
        env = "TE_HEARTBEAT_TIMEOUT_SECONDS",
        help = "Seconds past the vendor keepalive interval before the connection is considered dead."
    )]
    pub heartbeat_timeout_seconds: Option<u64>,

    #[clap(
        long,
        env = "TE_RECONNECT_COOLDOWN_SECONDS",
        help = "Minimum seconds between connection attempts."
    )]
    pub reconnect_cooldown_seconds: Option<u64>,

    #[clap(
        long,
        env = "TE_OVERRIDE_SUBSCRIPTION_CHECK",
        help = "Forward all decoded events regardless of registry state."
    )]
    pub override_subscription_check: Option<bool>,

    #[clap(
        long,
        env = "TE_SUPPORTED_COUNTRIES",
        help = "Comma-separated country allow-list replacing the built-in set."
    )]
    pub supported_countries: Option<String>,

    #[clap(long, env = "TE_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "TE_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,
}

impl ConfigOptions {
    // Merge two option sets, where 'other' overrides 'self' for Some values
    fn merge(self, other: ConfigOptions) -> ConfigOptions {
        ConfigOptions {
            stream_host: other.stream_host.or(self.stream_host),
            stream_port: other.stream_port.or(self.stream_port),
            stream_user: other.stream_user.or(self.stream_user),
            stream_key: other.stream_key.or(self.stream_key),
            heartbeat_timeout_seconds: other
                .heartbeat_timeout_seconds
                .or(self.heartbeat_timeout_seconds),
            reconnect_cooldown_seconds: other
                .reconnect_cooldown_seconds
                .or(self.reconnect_cooldown_seconds),
            override_subscription_check: other
                .override_subscription_check
                .or(self.override_subscription_check),
            supported_countries: other.supported_countries.or(self.supported_countries),
            config_path: other.config_path.or(self.config_path),
            log_level: other.log_level.or(self.log_level),
        }
    }

    fn defaults() -> ConfigOptions {
        ConfigOptions {
            stream_host: Some("stream.tradingeconomics.com".to_string()),
            stream_port: Some(80),
            heartbeat_timeout_seconds: Some(5),
            reconnect_cooldown_seconds: Some(5),
            override_subscription_check: Some(true),
            log_level: Some("info".to_string()),
            ..Default::default()
        }
    }
}

/// Loads options layered as defaults <- JSON config file <- env/CLI.
pub fn load_config() -> ConfigOptions {
    // Parse CLI early to get a potential config-path override.
    let cli_args = ConfigOptions::parse();

    let config_file_path = cli_args
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("calendar_stream.conf"));

    let mut current = ConfigOptions::defaults();

    if config_file_path.exists() {
        match fs::read_to_string(&config_file_path) {
            Ok(config_str) => match serde_json::from_str::<ConfigOptions>(&config_str) {
                Ok(file_config) => current = current.merge(file_config),
                Err(e) => log::warn!(
                    "Failed to parse config file {}: {}. Falling back to other sources.",
                    config_file_path.display(),
                    e
                ),
            },
            Err(e) => log::warn!(
                "Failed to read config file {}: {}. Falling back to other sources.",
                config_file_path.display(),
                e
            ),
        }
    }

    // Environment variables and CLI flags win over file values.
    current.merge(cli_args)
}

/// Validated runtime configuration consumed by the client and supervisor.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub key: String,
    /// Grace period added to the vendor keepalive interval before the
    /// connection counts as dead.
    pub heartbeat_timeout: Duration,
    /// Minimum spacing between connection attempts.
    pub reconnect_cooldown: Duration,
    /// Diagnostic mode forwarding all events regardless of registry state.
    pub override_subscription_check: bool,
    /// Lowercased country allow-list.
    pub supported_countries: HashSet<String>,
}

impl StreamConfig {
    /// Validates merged options. Credentials are mandatory; everything else
    /// falls back to the documented defaults.
    pub fn from_options(options: ConfigOptions) -> Result<Self, ConfigError> {
        let user = options
            .stream_user
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingCredential("stream-user"))?;
        let key = options
            .stream_key
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingCredential("stream-key"))?;

        let supported_countries = parse_country_list(options.supported_countries.as_deref());

        Ok(Self {
            host: options
                .stream_host
                .unwrap_or_else(|| "stream.tradingeconomics.com".to_string()),
            port: options.stream_port.unwrap_or(80),
            user,
            key,
            heartbeat_timeout: Duration::from_secs(options.heartbeat_timeout_seconds.unwrap_or(5)),
            reconnect_cooldown: Duration::from_secs(
                options.reconnect_cooldown_seconds.unwrap_or(5),
            ),
            override_subscription_check: options.override_subscription_check.unwrap_or(true),
            supported_countries,
        })
    }

    /// Connection URI with credentials embedded as `client=<user>:<key>`.
    pub fn stream_url(&self) -> String {
        format!(
            "ws://{}:{}/?client={}:{}",
            self.host, self.port, self.user, self.key
        )
    }

    pub fn supports_country(&self, country: &str) -> bool {
        self.supported_countries.contains(&country.to_lowercase())
    }
}

/// Parses the comma-separated override list. An empty or all-blank override
/// keeps the built-in set.
fn parse_country_list(raw: Option<&str>) -> HashSet<String> {
    let parsed: HashSet<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();

    if parsed.is_empty() {
        DEFAULT_SUPPORTED_COUNTRIES
            .iter()
            .map(|c| c.to_string())
            .collect()
    } else {
        parsed
    }
}
