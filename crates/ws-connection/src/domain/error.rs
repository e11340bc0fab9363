//! Connection error types.
//!
//! Decode failures never appear here: they are absorbed by the envelope codec.
//! Everything below reaches exactly one awaiting caller and is never retried.

use crate::domain::config::ConfigError;
use std::time::Duration;
use ws_envelope::CorrelationId;

/// Failure reported by a transport implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("not connected")]
    NotConnected,
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("send failed: {0}")]
    Send(String),
    #[error("close failed: {0}")]
    Close(String),
    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

/// Failure reported by a token provider.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token request for {service} failed: {reason}")]
    Unavailable { service: String, reason: String },
    #[error("token authentication enabled but no token provider configured")]
    NoProvider,
}

/// Failure handing an unsolicited message to its sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("no subscribers")]
    NoSubscribers,
    #[error("sink full")]
    Full,
    #[error("sink closed")]
    Closed,
}

/// Errors surfaced to callers of the connection and correlation engine.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// No response arrived within the requested timeout
    #[error("request {request_type} ({correlation_id}) timed out after {}ms", .timeout.as_millis())]
    Timeout {
        request_type: String,
        correlation_id: CorrelationId,
        timeout: Duration,
    },

    /// The transport failed to transmit
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The connection was disposed while the request was pending
    #[error("request {correlation_id} cancelled: connection disposed")]
    Cancelled { correlation_id: CorrelationId },

    #[error("correlation id {0} is already pending")]
    DuplicateCorrelationId(CorrelationId),

    #[error("request {request_type} has no correlation id")]
    MissingCorrelationId { request_type: String },

    /// The matched response frame did not fit the response shape
    #[error("malformed response for {correlation_id}: {reason}")]
    MalformedResponse {
        correlation_id: CorrelationId,
        reason: String,
    },

    #[error("failed to connect to WebSocket server {uri}")]
    Connect {
        uri: String,
        #[source]
        source: TransportError,
    },

    /// The connection was disposed and cannot be reopened
    #[error("connection to {uri} has been disposed")]
    Disposed { uri: String },

    #[error("connecting to {uri} timed out after {}ms", .timeout.as_millis())]
    ConnectTimeout { uri: String, timeout: Duration },

    #[error("failed to fetch a valid session token for service: {service}")]
    MissingToken { service: String },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl ConnectionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self, Self::Disposed { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
