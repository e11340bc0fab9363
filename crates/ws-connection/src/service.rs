//! WebSocket connection service.
//!
//! Wires configuration, a transport, an optional token provider, the
//! correlation engine and the unsolicited broadcast together.

use crate::adapters::sink::BroadcastSink;
use crate::domain::config::ConnectionConfig;
use crate::domain::error::{AuthError, ConnectionError};
use crate::engine::CorrelationEngine;
use crate::global;
use crate::ports::{TokenProvider, Transport, UnsolicitedSink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use ws_envelope::{Message, RequestMessage, ResponseMessage};

/// A correlated WebSocket connection.
pub struct WebSocketConnection {
    config: ConnectionConfig,
    transport: Arc<dyn Transport>,
    token_provider: Option<Arc<dyn TokenProvider>>,
    engine: Arc<CorrelationEngine>,
    unsolicited: Arc<BroadcastSink>,
    disposed: AtomicBool,
}

impl WebSocketConnection {
    /// Create a connection over `transport`. Nothing is opened until
    /// [`connect`](Self::connect).
    pub fn new(
        config: ConnectionConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConnectionError> {
        config.validate()?;

        let unsolicited = Arc::new(BroadcastSink::new(config.unsolicited.buffer));
        let sink: Arc<dyn UnsolicitedSink> = unsolicited.clone();
        let engine = Arc::new(CorrelationEngine::new(Arc::clone(&transport), sink));

        Ok(Self {
            config,
            transport,
            token_provider: None,
            engine,
            unsolicited,
            disposed: AtomicBool::new(false),
        })
    }

    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Open the connection, authenticating first if token use is enabled.
    ///
    /// Fails with [`ConnectionError::Disposed`] once [`dispose`](Self::dispose)
    /// has run.
    pub async fn connect(&self) -> Result<(), ConnectionError> {
        let uri = self.config.uri.clone();
        if self.is_disposed() {
            return Err(ConnectionError::Disposed { uri });
        }
        let headers = self.auth_headers().await?;

        let connect = self
            .transport
            .connect(&uri, &headers, self.engine.frame_handler());
        let result = match tokio::time::timeout(self.config.timeouts.connect, connect).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(ConnectionError::Connect {
                uri: uri.clone(),
                source,
            }),
            Err(_) => Err(ConnectionError::ConnectTimeout {
                uri: uri.clone(),
                timeout: self.config.timeouts.connect,
            }),
        };

        // Disposed while the handshake was in flight
        if result.is_ok() && self.is_disposed() {
            self.close_transport().await;
            return Err(ConnectionError::Disposed { uri });
        }

        match &result {
            Ok(()) => info!(uri = %uri, "Connected to WebSocket server"),
            Err(e) => warn!(uri = %uri, error = %e, "Failed to connect to WebSocket server"),
        }
        result
    }

    async fn auth_headers(&self) -> Result<Vec<(String, String)>, ConnectionError> {
        let auth = &self.config.auth;
        if !auth.use_token {
            return Ok(Vec::new());
        }

        let service = auth.service_name.clone().unwrap_or_default();
        let provider = self.token_provider.as_ref().ok_or(AuthError::NoProvider)?;
        let token = provider.get_token(&service).await?;
        if token.trim().is_empty() {
            return Err(ConnectionError::MissingToken { service });
        }

        debug!(service = %service, header = %auth.header, "Attached session token");
        Ok(vec![(auth.header.clone(), token)])
    }

    /// Send a message without waiting for a reply.
    pub async fn send_message(&self, message: &Message) -> Result<(), ConnectionError> {
        self.engine.send_message(message).await
    }

    /// Send a request with the configured default timeout.
    pub async fn send_request(&self, request: &Message) -> Result<ResponseMessage, ConnectionError> {
        self.engine
            .send_request(request, self.config.timeouts.request)
            .await
    }

    pub async fn send_request_with_timeout(
        &self,
        request: &Message,
        timeout: Option<Duration>,
    ) -> Result<ResponseMessage, ConnectionError> {
        self.engine.send_request(request, timeout).await
    }

    /// Build a request with a fresh correlation id and send it.
    pub async fn request(
        &self,
        kind: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<ResponseMessage, ConnectionError> {
        let request = RequestMessage::new(kind).with_content(content);
        self.send_request(request.as_message()).await
    }

    /// Receive unsolicited messages delivered from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.unsolicited.subscribe()
    }

    pub fn engine(&self) -> &Arc<CorrelationEngine> {
        &self.engine
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Cancel every pending request and close the transport.
    ///
    /// Pending requests are settled before the transport is touched. The
    /// close is bounded by the connect timeout. Idempotent; close failures
    /// are logged, not returned.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.engine.dispose();
        global::clear_if_current(self);
        self.close_transport().await;

        info!(uri = %self.config.uri, "WebSocket connection disposed");
    }

    async fn close_transport(&self) {
        let timeout = self.config.timeouts.connect;
        match tokio::time::timeout(timeout, self.transport.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(uri = %self.config.uri, error = %e, "Error closing WebSocket");
            }
            Err(_) => {
                warn!(
                    uri = %self.config.uri,
                    timeout_ms = timeout.as_millis() as u64,
                    "Timed out closing WebSocket"
                );
            }
        }
    }
}
