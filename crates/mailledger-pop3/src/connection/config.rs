//! Connection configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Dial timeout used when none (or a sub-millisecond one) is configured.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(3);

/// Plain POP3 port.
pub const DEFAULT_PORT: u16 = 110;

/// POP3 over implicit TLS port.
pub const DEFAULT_TLS_PORT: u16 = 995;

/// POP3 connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Server hostname, also used for TLS name verification.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Bound on TCP connect plus TLS handshake. Serialized as whole
    /// milliseconds.
    #[serde(default = "default_dial_timeout", with = "millis")]
    pub dial_timeout: Duration,
    /// Wrap the connection in TLS from the start.
    #[serde(default)]
    pub tls_enabled: bool,
    /// Accept any server certificate. **Not recommended for production.**
    #[serde(default)]
    pub tls_skip_verify: bool,
}

const fn default_dial_timeout() -> Duration {
    DEFAULT_DIAL_TIMEOUT
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

impl Config {
    /// Creates a plaintext configuration on port 110.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self::builder(host).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }

    /// Replaces an unset or sub-millisecond dial timeout with the default.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.dial_timeout < Duration::from_millis(1) {
            self.dial_timeout = DEFAULT_DIAL_TIMEOUT;
        }
        self
    }
}

/// Builder for connection configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: Option<u16>,
    dial_timeout: Duration,
    tls_enabled: bool,
    tls_skip_verify: bool,
}

impl ConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            tls_enabled: false,
            tls_skip_verify: false,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the dial timeout.
    #[must_use]
    pub const fn dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    /// Enables implicit TLS.
    #[must_use]
    pub const fn tls(mut self, enabled: bool) -> Self {
        self.tls_enabled = enabled;
        self
    }

    /// Skips server certificate verification.
    #[must_use]
    pub const fn tls_skip_verify(mut self, skip: bool) -> Self {
        self.tls_skip_verify = skip;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        let default_port = if self.tls_enabled {
            DEFAULT_TLS_PORT
        } else {
            DEFAULT_PORT
        };
        Config {
            host: self.host,
            port: self.port.unwrap_or(default_port),
            dial_timeout: self.dial_timeout,
            tls_enabled: self.tls_enabled,
            tls_skip_verify: self.tls_skip_verify,
        }
        .normalized()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = Config::new("pop.example.com");
        assert_eq!(config.host, "pop.example.com");
        assert_eq!(config.port, 110);
        assert!(!config.tls_enabled);
        assert_eq!(config.dial_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_config_builder_tls_port() {
        let config = Config::builder("pop.163.com").tls(true).build();
        assert_eq!(config.port, 995);
        assert!(config.tls_enabled);
        assert!(!config.tls_skip_verify);
    }

    #[test]
    fn test_config_builder_explicit_port() {
        let config = Config::builder("pop.example.com")
            .tls(true)
            .port(1995)
            .tls_skip_verify(true)
            .dial_timeout(Duration::from_secs(10))
            .build();

        assert_eq!(config.port, 1995);
        assert!(config.tls_skip_verify);
        assert_eq!(config.dial_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_zero_timeout_defaults() {
        let config = Config::builder("pop.example.com")
            .dial_timeout(Duration::ZERO)
            .build();
        assert_eq!(config.dial_timeout, DEFAULT_DIAL_TIMEOUT);

        let config = Config::builder("pop.example.com")
            .dial_timeout(Duration::from_micros(500))
            .build();
        assert_eq!(config.dial_timeout, DEFAULT_DIAL_TIMEOUT);
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let json = r#"{"host": "pop.163.com", "port": 995, "tls_enabled": true}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.host, "pop.163.com");
        assert_eq!(config.port, 995);
        assert!(config.tls_enabled);
        assert!(!config.tls_skip_verify);
        assert_eq!(config.dial_timeout, DEFAULT_DIAL_TIMEOUT);
    }

    #[test]
    fn test_dial_timeout_is_milliseconds() {
        let config = Config::builder("pop.163.com")
            .dial_timeout(Duration::from_millis(2500))
            .build();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["dial_timeout"], 2500);

        let json = r#"{"host": "pop.163.com", "port": 110, "dial_timeout": 750}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.dial_timeout, Duration::from_millis(750));
    }
}
