//! Outgoing request construction.

use crate::correlation::CorrelationId;
use crate::message::Message;

/// A request envelope with a freshly generated correlation id.
///
/// The id is assigned at construction so it can be registered with the
/// correlation engine before the frame is transmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMessage {
    message: Message,
}

impl RequestMessage {
    /// Create a request of the given type with a new correlation id.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            message: Message::new(kind).with_correlation_id(CorrelationId::generate()),
        }
    }

    /// Set the content payload.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.message.content = content.into();
        self
    }

    /// Set the sender identity.
    pub fn with_actor_id(mut self, actor_id: impl Into<String>) -> Self {
        self.message.actor_id = Some(actor_id.into());
        self
    }

    /// Set the session token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.message.token = Some(token.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.message.kind
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.message.correlation_id
    }

    pub fn as_message(&self) -> &Message {
        &self.message
    }

    pub fn into_message(self) -> Message {
        self.message
    }
}

impl From<RequestMessage> for Message {
    fn from(request: RequestMessage) -> Self {
        request.message
    }
}

impl AsRef<Message> for RequestMessage {
    fn as_ref(&self) -> &Message {
        &self.message
    }
}
