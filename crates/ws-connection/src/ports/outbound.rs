//! Outbound ports: the collaborators the correlation engine talks to.

use crate::domain::error::{AuthError, SinkError, TransportError};
use async_trait::async_trait;
use std::sync::Arc;
use ws_envelope::Message;

/// Extra headers sent with the connection handshake
pub type Headers = [(String, String)];

/// Receiver of inbound text frames.
///
/// Called on the transport's delivery path; implementations must not block.
pub trait FrameHandler: Send + Sync {
    fn on_frame(&self, text: &str);
}

/// Message-oriented duplex transport delivering text frames.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to `address` and start delivering inbound frames to `handler`.
    async fn connect(
        &self,
        address: &str,
        headers: &Headers,
        handler: Arc<dyn FrameHandler>,
    ) -> Result<(), TransportError>;

    /// Transmit one text frame.
    async fn send(&self, text: String) -> Result<(), TransportError>;

    /// Close the connection and stop frame delivery.
    async fn close(&self) -> Result<(), TransportError>;

    /// Whether the transport currently holds an open connection.
    fn is_connected(&self) -> bool;
}

/// Session token source used when connecting.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn get_token(&self, service_name: &str) -> Result<String, AuthError>;
}

/// Destination for inbound messages that match no pending request.
///
/// Delivery is a non-blocking handoff.
pub trait UnsolicitedSink: Send + Sync {
    fn deliver(&self, message: Message) -> Result<(), SinkError>;
}
