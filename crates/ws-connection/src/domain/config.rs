//! Connection configuration with validation.
//!
//! Durations are written as humantime strings (`"250ms"`, `"10s"`) and are
//! `Duration` everywhere in the API; no bare integer timeouts.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default server address
pub const DEFAULT_URI: &str = "ws://localhost:8080";

/// Default header carrying the session token
pub const DEFAULT_AUTH_HEADER: &str = "Authorization";

/// Default unsolicited message buffer per subscriber
pub const DEFAULT_UNSOLICITED_BUFFER: usize = 256;

/// Main connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// WebSocket server address (`ws://` or `wss://`)
    pub uri: String,
    /// Token authentication
    pub auth: AuthConfig,
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// Unsolicited message fan-out
    pub unsolicited: UnsolicitedConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            auth: AuthConfig::default(),
            timeouts: TimeoutConfig::default(),
            unsolicited: UnsolicitedConfig::default(),
        }
    }
}

impl ConnectionConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    /// Enable token authentication against the named service.
    pub fn with_token_service(mut self, service_name: impl Into<String>) -> Self {
        self.auth.use_token = true;
        self.auth.service_name = Some(service_name.into());
        self
    }

    /// Set the default timeout applied to requests.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request = Some(timeout);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.uri.trim().is_empty() {
            return Err(ConfigError::EmptyUri);
        }

        if !(self.uri.starts_with("ws://") || self.uri.starts_with("wss://")) {
            return Err(ConfigError::InvalidScheme(self.uri.clone()));
        }

        if self.auth.use_token
            && self
                .auth
                .service_name
                .as_deref()
                .map_or(true, |s| s.trim().is_empty())
        {
            return Err(ConfigError::MissingServiceName);
        }

        if self.auth.header.trim().is_empty() {
            return Err(ConfigError::InvalidHeader);
        }

        if self.timeouts.connect.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "connect timeout cannot be 0".into(),
            ));
        }

        if self.timeouts.request.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::InvalidTimeout(
                "request timeout cannot be 0".into(),
            ));
        }

        if self.unsolicited.buffer == 0 {
            return Err(ConfigError::InvalidBuffer);
        }

        Ok(())
    }
}

/// Token authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Fetch a session token before connecting
    pub use_token: bool,
    /// Service name passed to the token provider
    pub service_name: Option<String>,
    /// Header the token is sent in
    pub header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            use_token: false,
            service_name: None,
            header: DEFAULT_AUTH_HEADER.to_string(),
        }
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Default request timeout (None = wait until response or dispose)
    #[serde(with = "humantime_serde")]
    pub request: Option<Duration>,
    /// Connection establishment timeout
    #[serde(with = "humantime_serde")]
    pub connect: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request: None,
            connect: Duration::from_secs(30),
        }
    }
}

/// Unsolicited message fan-out configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnsolicitedConfig {
    /// Messages buffered per subscriber before the slowest one lags
    pub buffer: usize,
}

impl Default for UnsolicitedConfig {
    fn default() -> Self {
        Self {
            buffer: DEFAULT_UNSOLICITED_BUFFER,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("uri cannot be empty")]
    EmptyUri,
    #[error("uri must use ws:// or wss://: {0}")]
    InvalidScheme(String),
    #[error("use_token requires a service_name")]
    MissingServiceName,
    #[error("auth header name cannot be empty")]
    InvalidHeader,
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    #[error("unsolicited buffer cannot be 0")]
    InvalidBuffer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ConnectionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.uri, DEFAULT_URI);
        assert!(!config.auth.use_token);
        assert!(config.timeouts.request.is_none());
    }

    #[test]
    fn test_rejects_bad_uri() {
        assert_eq!(
            ConnectionConfig::new("").validate(),
            Err(ConfigError::EmptyUri)
        );
        assert!(matches!(
            ConnectionConfig::new("http://localhost").validate(),
            Err(ConfigError::InvalidScheme(_))
        ));
        assert!(ConnectionConfig::new("wss://example.org/socket")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_token_requires_service_name() {
        let mut config = ConnectionConfig::default();
        config.auth.use_token = true;
        assert_eq!(config.validate(), Err(ConfigError::MissingServiceName));

        let config = ConnectionConfig::default().with_token_service("Hangout");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_values() {
        let mut config = ConnectionConfig::default();
        config.timeouts.connect = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout(_))
        ));

        let config = ConnectionConfig::default().with_request_timeout(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout(_))
        ));

        let mut config = ConnectionConfig::default();
        config.unsolicited.buffer = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidBuffer));
    }

    #[test]
    fn test_deserialize_humantime() {
        let config: ConnectionConfig = serde_json::from_str(
            r#"{
                "uri": "ws://game.local:9000",
                "auth": { "use_token": true, "service_name": "Hangout" },
                "timeouts": { "request": "250ms", "connect": "5s" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.uri, "ws://game.local:9000");
        assert_eq!(config.auth.header, DEFAULT_AUTH_HEADER);
        assert_eq!(config.timeouts.request, Some(Duration::from_millis(250)));
        assert_eq!(config.timeouts.connect, Duration::from_secs(5));
        assert_eq!(config.unsolicited.buffer, DEFAULT_UNSOLICITED_BUFFER);
        assert!(config.validate().is_ok());
    }
}
