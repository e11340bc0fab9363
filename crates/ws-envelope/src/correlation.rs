//! Correlation ID for request/response matching.
//!
//! Generated ids are UUID v4 strings, but any inbound string is accepted so
//! that peers are free to pick their own scheme. The empty id means
//! "no correlation" and marks unsolicited messages.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Correlation ID linking a request envelope to its response envelope.
///
/// `Default` is the empty id, which is what a zero-value envelope carries.
/// Use [`CorrelationId::generate`] for a fresh id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a new random correlation ID (UUID v4)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The empty id
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Whether this id carries no correlation
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CorrelationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<Uuid> for CorrelationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }
}

impl From<CorrelationId> for String {
    fn from(id: CorrelationId) -> Self {
        id.0
    }
}

impl AsRef<str> for CorrelationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CorrelationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique() {
        let id1 = CorrelationId::generate();
        let id2 = CorrelationId::generate();
        assert_ne!(id1, id2);
        assert!(!id1.is_empty());
    }

    #[test]
    fn test_generated_is_uuid_v4() {
        let id = CorrelationId::generate();
        assert_eq!(id.as_str().len(), 36); // UUID format: 8-4-4-4-12
        let parsed = Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(CorrelationId::default().is_empty());
        assert_eq!(CorrelationId::default(), CorrelationId::empty());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = CorrelationId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        let parsed: CorrelationId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_display() {
        let id = CorrelationId::from("req-42");
        assert_eq!(id.to_string(), "req-42");
    }
}
