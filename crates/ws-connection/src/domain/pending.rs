//! Pending Request Store - correlation table for in-flight requests.
//!
//! Maps correlation IDs to waiting callers. Every entry is removed from the
//! map before it is settled, so the removal is the single point that decides
//! which of {response, timeout, transport failure, disposal} wins.

use crate::domain::error::ConnectionError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, warn};
use ws_envelope::{CorrelationId, ResponseMessage};

/// Final outcome delivered to a waiting caller
pub type Completion = Result<ResponseMessage, ConnectionError>;

/// A pending request waiting for its response
struct PendingRequest {
    /// Distinguishes this registration from a later one reusing the same id
    ticket: u64,
    /// Single-assignment completion handle
    sender: oneshot::Sender<Completion>,
    /// When request was registered
    created_at: Instant,
    /// Request type (for logging and timeout errors)
    request_type: String,
    /// Timer armed for this request, if any
    timeout: Option<AbortHandle>,
}

impl PendingRequest {
    fn cancel_timeout(&mut self) {
        if let Some(handle) = self.timeout.take() {
            handle.abort();
        }
    }
}

/// Handle returned by [`PendingRequestStore::register`].
#[derive(Debug)]
pub struct Registration {
    pub ticket: u64,
    pub receiver: oneshot::Receiver<Completion>,
}

/// Statistics for pending request store
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Total requests registered
    pub total_registered: AtomicU64,
    /// Total requests resolved by a matching response
    pub total_completed: AtomicU64,
    /// Total requests timed out
    pub total_timeouts: AtomicU64,
    /// Total requests cancelled (disposed or abandoned)
    pub total_cancelled: AtomicU64,
    /// Total requests failed by the transport
    pub total_transport_failures: AtomicU64,
}

/// Pending request store.
///
/// Flow:
/// 1. Caller registers the request's correlation id
/// 2. Caller optionally attaches a timeout timer
/// 3. Caller transmits the request frame
/// 4. Exactly one of `complete_with`, `expire`, `fail` or `cancel_all`
///    removes the entry and settles it
/// 5. Caller awaits the receiver
pub struct PendingRequestStore {
    /// Map of correlation ID to pending request
    pending: DashMap<CorrelationId, PendingRequest>,
    /// Ticket counter
    next_ticket: AtomicU64,
    /// Set once the store has been disposed
    closed: AtomicBool,
    /// Statistics
    stats: PendingStats,
}

impl Default for PendingRequestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingRequestStore {
    /// Create a new pending request store
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            next_ticket: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            stats: PendingStats::default(),
        }
    }

    /// Register a pending request under `correlation_id`.
    ///
    /// Fails if the id is already pending or the store has been disposed.
    pub fn register(
        &self,
        correlation_id: &CorrelationId,
        request_type: &str,
    ) -> Result<Registration, ConnectionError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ConnectionError::Cancelled {
                correlation_id: correlation_id.clone(),
            });
        }

        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();

        match self.pending.entry(correlation_id.clone()) {
            Entry::Occupied(_) => {
                return Err(ConnectionError::DuplicateCorrelationId(
                    correlation_id.clone(),
                ));
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingRequest {
                    ticket,
                    sender: tx,
                    created_at: Instant::now(),
                    request_type: request_type.to_string(),
                    timeout: None,
                });
            }
        }

        // Disposal may have drained the table between the check above and the insert
        if self.closed.load(Ordering::SeqCst)
            && self
                .pending
                .remove_if(correlation_id.as_str(), |_, entry| entry.ticket == ticket)
                .is_some()
        {
            return Err(ConnectionError::Cancelled {
                correlation_id: correlation_id.clone(),
            });
        }

        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);

        debug!(
            correlation_id = %correlation_id,
            request_type = request_type,
            "Registered pending request"
        );

        Ok(Registration {
            ticket,
            receiver: rx,
        })
    }

    /// Attach a timeout timer to a registration.
    ///
    /// If the entry is already gone the timer is aborted immediately.
    pub fn attach_timeout(&self, correlation_id: &str, ticket: u64, handle: AbortHandle) {
        match self.pending.get_mut(correlation_id) {
            Some(mut entry) if entry.ticket == ticket => {
                entry.cancel_timeout();
                entry.timeout = Some(handle);
            }
            _ => handle.abort(),
        }
    }

    /// Resolve a pending request from an inbound frame.
    ///
    /// The entry is removed and its timer cancelled before `build` runs, so
    /// a found id is always settled. Returns false if nothing was pending.
    pub fn complete_with<F>(&self, correlation_id: &str, build: F) -> bool
    where
        F: FnOnce() -> Completion,
    {
        let Some((id, mut pending)) = self.pending.remove(correlation_id) else {
            return false;
        };
        pending.cancel_timeout();

        let response_time = pending.created_at.elapsed();
        let outcome = build();
        let resolved = outcome.is_ok();

        match pending.sender.send(outcome) {
            Ok(()) => {
                self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %id,
                    request_type = pending.request_type,
                    response_time_ms = response_time.as_millis() as u64,
                    resolved = resolved,
                    "Completed pending request"
                );
            }
            Err(_) => {
                // Receiver was dropped (request abandoned)
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %id,
                    request_type = pending.request_type,
                    "Pending request receiver dropped"
                );
            }
        }

        true
    }

    /// Fail a registration with `Timeout`, if it is still pending.
    pub fn expire(&self, correlation_id: &str, ticket: u64, timeout: Duration) -> bool {
        let Some((id, mut pending)) = self
            .pending
            .remove_if(correlation_id, |_, entry| entry.ticket == ticket)
        else {
            return false;
        };
        // Called from the timer itself; nothing left to abort
        pending.timeout.take();

        self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
        warn!(
            correlation_id = %id,
            request_type = pending.request_type,
            timeout_ms = timeout.as_millis() as u64,
            "Request timed out"
        );

        let _ = pending.sender.send(Err(ConnectionError::Timeout {
            request_type: pending.request_type.clone(),
            correlation_id: id,
            timeout,
        }));
        true
    }

    /// Fail a registration with a transport error, if it is still pending.
    pub fn fail(&self, correlation_id: &str, ticket: u64, error: ConnectionError) -> bool {
        let Some((_, mut pending)) = self
            .pending
            .remove_if(correlation_id, |_, entry| entry.ticket == ticket)
        else {
            return false;
        };
        pending.cancel_timeout();

        self.stats
            .total_transport_failures
            .fetch_add(1, Ordering::Relaxed);
        let _ = pending.sender.send(Err(error));
        true
    }

    /// Drop a registration whose caller went away, if it is still pending.
    pub fn discard(&self, correlation_id: &str, ticket: u64) -> bool {
        let Some((id, mut pending)) = self
            .pending
            .remove_if(correlation_id, |_, entry| entry.ticket == ticket)
        else {
            return false;
        };
        pending.cancel_timeout();

        self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
        debug!(
            correlation_id = %id,
            request_type = pending.request_type,
            "Discarded abandoned request"
        );
        true
    }

    /// Cancel every timer and fail every pending request with `Cancelled`.
    ///
    /// Marks the store closed; later registrations are rejected. Returns the
    /// number of requests cancelled by this call.
    pub fn cancel_all(&self) -> usize {
        self.closed.store(true, Ordering::SeqCst);

        let ids: Vec<CorrelationId> = self.pending.iter().map(|e| e.key().clone()).collect();
        let mut cancelled = 0;

        for id in ids {
            if let Some((id, mut pending)) = self.pending.remove(&id) {
                pending.cancel_timeout();
                let _ = pending
                    .sender
                    .send(Err(ConnectionError::Cancelled { correlation_id: id }));
                cancelled += 1;
            }
        }

        self.stats
            .total_cancelled
            .fetch_add(cancelled as u64, Ordering::Relaxed);
        cancelled
    }

    /// Get number of currently pending requests
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Check if a correlation ID is pending
    pub fn is_pending(&self, correlation_id: &str) -> bool {
        self.pending.contains_key(correlation_id)
    }

    /// Whether `cancel_all` has run
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Get statistics
    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}
