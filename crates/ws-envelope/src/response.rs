//! Response envelope returned to request callers.

use crate::message::{nullable, Envelope, Message};
use serde::{Deserialize, Serialize};

/// A response back from the server.
///
/// Carries the base envelope fields plus the outcome reported by the peer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(flatten)]
    pub message: Message,

    /// Whether the peer handled the request
    #[serde(default, deserialize_with = "nullable")]
    pub success: bool,

    /// Error reported by the peer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseMessage {
    pub fn success(message: Message) -> Self {
        Self {
            message,
            success: true,
            error: None,
        }
    }

    pub fn failure(message: Message, error: impl Into<String>) -> Self {
        Self {
            message,
            success: false,
            error: Some(error.into()),
        }
    }
}

impl Envelope for ResponseMessage {
    fn message(&self) -> &Message {
        &self.message
    }
}
