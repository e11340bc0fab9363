//! The base message envelope and its text codec.
//!
//! Wire shape (JSON object, every field optional):
//!
//! ```text
//! { "type": string, "content": string, "correlationId": string,
//!   "actorId": string, "token": string }
//! ```
//!
//! Decoding never fails. Empty or malformed text yields the zero-value
//! envelope so callers can always inspect fields.

use crate::correlation::CorrelationId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::trace;

/// Text codec shared by every envelope shape.
pub trait Envelope: Serialize + DeserializeOwned + Default {
    /// Decode a text frame. Returns `Self::default()` on empty or malformed input.
    fn decode(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self::default();
        }

        match serde_json::from_str(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                trace!(error = %e, len = text.len(), "Frame did not decode, using empty envelope");
                Self::default()
            }
        }
    }

    /// Encode into a text frame. Returns an empty string if serialization fails.
    fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// The base envelope fields.
    fn message(&self) -> &Message;
}

/// Wire-level message envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Semantic kind of the message
    #[serde(rename = "type", default, deserialize_with = "nullable")]
    pub kind: String,

    /// Opaque payload, often serialized structured data
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "String::is_empty"
    )]
    pub content: String,

    /// Present only on request/response pairs
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "CorrelationId::is_empty"
    )]
    pub correlation_id: CorrelationId,

    /// Sender identity (application-level)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,

    /// Session token (application-level)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Message {
    /// Create a message with no correlation id.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Set the content payload.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the correlation id.
    pub fn with_correlation_id(mut self, id: impl Into<CorrelationId>) -> Self {
        self.correlation_id = id.into();
        self
    }

    /// Set the sender identity.
    pub fn with_actor_id(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// Set the session token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Whether this envelope takes part in a request/response pair.
    pub fn is_correlated(&self) -> bool {
        !self.correlation_id.is_empty()
    }
}

impl Envelope for Message {
    fn message(&self) -> &Message {
        self
    }
}

/// Treat JSON `null` the same as an absent field.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_empty_is_zero_value() {
        assert_eq!(Message::decode(""), Message::default());
        assert_eq!(Message::decode("   "), Message::default());
    }

    #[test]
    fn test_decode_garbage_is_zero_value() {
        assert_eq!(Message::decode("not json"), Message::default());
        assert_eq!(Message::decode("{\"type\":"), Message::default());
        assert_eq!(Message::decode("null"), Message::default());
        assert_eq!(Message::decode("[1,2,3]"), Message::default());
    }

    #[test]
    fn test_decode_wrong_field_type_is_zero_value() {
        let msg = Message::decode(r#"{"type":5,"correlationId":"abc"}"#);
        assert_eq!(msg, Message::default());
        assert!(!msg.is_correlated());
    }

    #[test]
    fn test_decode_push_without_correlation() {
        let msg = Message::decode(r#"{"type":"push","content":"hello"}"#);
        assert_eq!(msg.kind, "push");
        assert_eq!(msg.content, "hello");
        assert!(msg.correlation_id.is_empty());
    }

    #[test]
    fn test_decode_null_fields_as_empty() {
        let msg = Message::decode(r#"{"type":"push","content":null,"correlationId":null}"#);
        assert_eq!(msg.kind, "push");
        assert!(msg.content.is_empty());
        assert!(!msg.is_correlated());
    }

    #[test]
    fn test_decode_ignores_response_fields() {
        let msg = Message::decode(r#"{"type":"pong","correlationId":"abc","success":true}"#);
        assert_eq!(msg.kind, "pong");
        assert_eq!(msg.correlation_id.as_str(), "abc");
    }

    #[test]
    fn test_encode_skips_absent_fields() {
        let text = Message::new("push").encode();
        assert_eq!(text, r#"{"type":"push"}"#);
    }

    #[test]
    fn test_encode_uses_wire_names() {
        let msg = Message::new("onJoin")
            .with_correlation_id("abc")
            .with_actor_id("76561198355153721")
            .with_token("secret");
        let value: serde_json::Value = serde_json::from_str(&msg.encode()).unwrap();
        assert_eq!(value["type"], "onJoin");
        assert_eq!(value["correlationId"], "abc");
        assert_eq!(value["actorId"], "76561198355153721");
        assert_eq!(value["token"], "secret");
    }

    #[test]
    fn test_round_trip_full_message() {
        let msg = Message::new("chat")
            .with_content(r#"{"text":"hi"}"#)
            .with_correlation_id(CorrelationId::generate())
            .with_actor_id("actor")
            .with_token("");
        assert_eq!(Message::decode(&msg.encode()), msg);
    }

    #[test]
    fn test_round_trip_zero_value() {
        let msg = Message::default();
        assert_eq!(Message::decode(&msg.encode()), msg);
    }
}
