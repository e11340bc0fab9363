//! Token providers.

use crate::domain::error::AuthError;
use crate::ports::TokenProvider;
use async_trait::async_trait;
use std::collections::HashMap;

/// Token provider answering from a fixed table.
///
/// A provider built with [`StaticTokenProvider::new`] returns the same token
/// for every service; [`StaticTokenProvider::for_service`] adds per-service
/// tokens that take precedence.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    default_token: Option<String>,
    tokens: HashMap<String, String>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            default_token: Some(token.into()),
            tokens: HashMap::new(),
        }
    }

    pub fn for_service(mut self, service: impl Into<String>, token: impl Into<String>) -> Self {
        self.tokens.insert(service.into(), token.into());
        self
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self, service_name: &str) -> Result<String, AuthError> {
        self.tokens
            .get(service_name)
            .or(self.default_token.as_ref())
            .cloned()
            .ok_or_else(|| AuthError::Unavailable {
                service: service_name.to_string(),
                reason: "no token configured".into(),
            })
    }
}
