//! Server configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::heartbeat::DEFAULT_HEARTBEAT_INTERVAL;
use crate::domain::{ConnectionLimits, HubSettings};
use crate::stream::sink::DEFAULT_BUFFER_CAPACITY;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level server configuration.
///
/// Loaded once at startup via [`ServerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Seconds between heartbeats on each open stream (minimum 1).
    pub heartbeat_interval_secs: u64,

    /// Frames buffered per connection before it counts as stalled.
    pub stream_buffer_capacity: usize,

    /// Maximum open streams per topic (0 = unlimited).
    pub max_connections_per_topic: usize,

    /// Maximum open streams overall (0 = unlimited).
    pub max_connections_total: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            heartbeat_interval_secs: DEFAULT_HEARTBEAT_INTERVAL.as_secs(),
            stream_buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            max_connections_per_topic: 0,
            max_connections_total: 0,
            log_format: LogFormat::Text,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };

        Ok(Self {
            listen_addr,
            heartbeat_interval_secs: parse_env(
                "HEARTBEAT_INTERVAL_SECS",
                defaults.heartbeat_interval_secs,
            )
            .max(1),
            stream_buffer_capacity: parse_env(
                "STREAM_BUFFER_CAPACITY",
                defaults.stream_buffer_capacity,
            )
            .max(1),
            max_connections_per_topic: parse_env(
                "MAX_CONNECTIONS_PER_TOPIC",
                defaults.max_connections_per_topic,
            ),
            max_connections_total: parse_env(
                "MAX_CONNECTIONS_TOTAL",
                defaults.max_connections_total,
            ),
            log_format: parse_log_format(std::env::var("LOG_FORMAT").ok().as_deref()),
        })
    }

    /// Returns the heartbeat interval as a [`Duration`].
    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Returns the hub settings derived from this configuration.
    #[must_use]
    pub const fn hub_settings(&self) -> HubSettings {
        HubSettings {
            heartbeat_interval: self.heartbeat_interval(),
            limits: ConnectionLimits {
                per_topic: self.max_connections_per_topic,
                total: self.max_connections_total,
            },
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Accepts `"json"` (case-insensitive); anything else means text.
fn parse_log_format(raw: Option<&str>) -> LogFormat {
    match raw {
        Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
        _ => LogFormat::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr.port(), 3000);
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(config.stream_buffer_capacity, 64);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn hub_settings_carry_limits() {
        let config = ServerConfig {
            heartbeat_interval_secs: 5,
            max_connections_per_topic: 10,
            max_connections_total: 100,
            ..ServerConfig::default()
        };
        let settings = config.hub_settings();
        assert_eq!(settings.heartbeat_interval, Duration::from_secs(5));
        assert_eq!(settings.limits.per_topic, 10);
        assert_eq!(settings.limits.total, 100);
    }

    #[test]
    fn log_format_parsing() {
        assert_eq!(parse_log_format(Some("json")), LogFormat::Json);
        assert_eq!(parse_log_format(Some("JSON")), LogFormat::Json);
        assert_eq!(parse_log_format(Some("pretty")), LogFormat::Text);
        assert_eq!(parse_log_format(None), LogFormat::Text);
    }

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        assert_eq!(parse_env("SIGNAGE_EVENTS_TEST_UNSET_KEY", 7_u64), 7);
    }
}
