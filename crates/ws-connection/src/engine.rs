//! Correlation Engine - request/response matching over a frame transport.
//!
//! The transport has no notion of replies. The engine registers every
//! request's correlation id before the frame leaves, then routes each inbound
//! frame either to the caller waiting on that id or to the unsolicited sink.

use crate::domain::error::{ConnectionError, SinkError};
use crate::domain::pending::{Completion, PendingRequestStore, PendingStats};
use crate::ports::{FrameHandler, Transport, UnsolicitedSink};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};
use ws_envelope::{CorrelationId, Envelope, Message, ResponseMessage};

/// Correlation engine bound to one transport and one unsolicited sink.
pub struct CorrelationEngine {
    pending: Arc<PendingRequestStore>,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn UnsolicitedSink>,
}

impl CorrelationEngine {
    pub fn new(transport: Arc<dyn Transport>, sink: Arc<dyn UnsolicitedSink>) -> Self {
        Self {
            pending: Arc::new(PendingRequestStore::new()),
            transport,
            sink,
        }
    }

    /// Send a request and wait for the response carrying the same correlation id.
    ///
    /// The id is registered before the frame is transmitted. With a
    /// `timeout`, the request fails with [`ConnectionError::Timeout`] once it
    /// elapses without a response.
    pub async fn send_request(
        &self,
        request: &Message,
        timeout: Option<Duration>,
    ) -> Result<ResponseMessage, ConnectionError> {
        let correlation_id = &request.correlation_id;
        if correlation_id.is_empty() {
            return Err(ConnectionError::MissingCorrelationId {
                request_type: request.kind.clone(),
            });
        }

        let registration = self.pending.register(correlation_id, &request.kind)?;
        let ticket = registration.ticket;
        let _abandon = AbandonGuard {
            store: Arc::clone(&self.pending),
            correlation_id: correlation_id.clone(),
            ticket,
        };

        if let Some(timeout) = timeout {
            self.arm_timeout(correlation_id, ticket, timeout);
        }

        match self.transport.send(request.encode()).await {
            Ok(()) => {
                debug!(
                    correlation_id = %correlation_id,
                    request_type = %request.kind,
                    timeout_ms = timeout.map(|t| t.as_millis() as u64),
                    "Sent request"
                );
            }
            Err(e) => {
                warn!(
                    correlation_id = %correlation_id,
                    request_type = %request.kind,
                    error = %e,
                    "Failed to send request"
                );
                self.pending
                    .fail(correlation_id.as_str(), ticket, ConnectionError::Transport(e));
            }
        }

        registration.receiver.await.unwrap_or_else(|_| {
            Err(ConnectionError::Cancelled {
                correlation_id: correlation_id.clone(),
            })
        })
    }

    /// Send a message without waiting for any reply.
    pub async fn send_message(&self, message: &Message) -> Result<(), ConnectionError> {
        self.transport.send(message.encode()).await.map_err(|e| {
            warn!(
                message_type = %message.kind,
                error = %e,
                "Failed to send message"
            );
            ConnectionError::Transport(e)
        })
    }

    /// Dispatch one inbound frame.
    ///
    /// Never suspends and never fails: unmatched or undecodable frames go to
    /// the unsolicited sink.
    pub fn on_frame_received(&self, text: &str) {
        let message = Message::decode(text);

        if message.is_correlated() {
            let correlation_id = message.correlation_id.clone();
            let matched = self
                .pending
                .complete_with(correlation_id.as_str(), || decode_response(text, &correlation_id));
            if matched {
                return;
            }

            debug!(
                correlation_id = %correlation_id,
                message_type = %message.kind,
                "No pending request for correlation id"
            );
        }

        self.forward_unsolicited(message);
    }

    /// Cancel every timer and fail every pending request with `Cancelled`.
    ///
    /// Idempotent. Requests sent afterwards fail with `Cancelled`.
    pub fn dispose(&self) {
        let cancelled = self.pending.cancel_all();
        if cancelled > 0 {
            info!(cancelled = cancelled, "Cancelled pending requests on dispose");
        }
    }

    /// A frame handler that does not keep the engine alive.
    pub fn frame_handler(self: &Arc<Self>) -> Arc<dyn FrameHandler> {
        Arc::new(EngineFrameHandler(Arc::downgrade(self)))
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn pending_count(&self) -> usize {
        self.pending.pending_count()
    }

    pub fn is_pending(&self, correlation_id: &str) -> bool {
        self.pending.is_pending(correlation_id)
    }

    pub fn is_disposed(&self) -> bool {
        self.pending.is_closed()
    }

    pub fn stats(&self) -> &PendingStats {
        self.pending.stats()
    }

    fn arm_timeout(&self, correlation_id: &CorrelationId, ticket: u64, timeout: Duration) {
        let store = Arc::clone(&self.pending);
        let id = correlation_id.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            store.expire(id.as_str(), ticket, timeout);
        });
        self.pending
            .attach_timeout(correlation_id.as_str(), ticket, timer.abort_handle());
    }

    fn forward_unsolicited(&self, message: Message) {
        let message_type = message.kind.clone();
        match self.sink.deliver(message) {
            Ok(()) => {
                trace!(message_type = %message_type, "Forwarded unsolicited message");
            }
            Err(SinkError::NoSubscribers) => {
                debug!(
                    message_type = %message_type,
                    "Unsolicited message dropped (no subscribers)"
                );
            }
            Err(e) => {
                warn!(
                    message_type = %message_type,
                    error = %e,
                    "Failed to forward unsolicited message"
                );
            }
        }
    }
}

impl FrameHandler for CorrelationEngine {
    fn on_frame(&self, text: &str) {
        self.on_frame_received(text);
    }
}

/// Second decode of a matched frame into the response shape.
fn decode_response(text: &str, correlation_id: &CorrelationId) -> Completion {
    serde_json::from_str::<ResponseMessage>(text).map_err(|e| {
        error!(
            correlation_id = %correlation_id,
            error = %e,
            "Error processing received response"
        );
        ConnectionError::MalformedResponse {
            correlation_id: correlation_id.clone(),
            reason: e.to_string(),
        }
    })
}

struct EngineFrameHandler(Weak<CorrelationEngine>);

impl FrameHandler for EngineFrameHandler {
    fn on_frame(&self, text: &str) {
        match self.0.upgrade() {
            Some(engine) => engine.on_frame_received(text),
            None => trace!("Frame received after engine was dropped"),
        }
    }
}

/// Removes the registration if the caller stops waiting before it settles.
struct AbandonGuard {
    store: Arc<PendingRequestStore>,
    correlation_id: CorrelationId,
    ticket: u64,
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        self.store.discard(self.correlation_id.as_str(), self.ticket);
    }
}
