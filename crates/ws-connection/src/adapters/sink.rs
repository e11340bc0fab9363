//! # Unsolicited Sinks
//!
//! Destinations for inbound messages that answer no pending request.

use crate::domain::error::SinkError;
use crate::ports::UnsolicitedSink;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, mpsc};
use ws_envelope::Message;

/// Fan-out sink backed by `tokio::sync::broadcast`.
///
/// Every subscriber sees every unsolicited message. A slow subscriber lags
/// and loses the oldest messages rather than blocking frame delivery.
pub struct BroadcastSink {
    sender: broadcast::Sender<Message>,
    delivered: AtomicU64,
}

impl BroadcastSink {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            delivered: AtomicU64::new(0),
        }
    }

    /// Subscribe to unsolicited messages delivered from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total messages handed to at least one subscriber.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}

impl UnsolicitedSink for BroadcastSink {
    fn deliver(&self, message: Message) -> Result<(), SinkError> {
        self.sender
            .send(message)
            .map(|_| {
                self.delivered.fetch_add(1, Ordering::Relaxed);
            })
            .map_err(|_| SinkError::NoSubscribers)
    }
}

/// Single-consumer sink backed by a bounded `mpsc` channel.
pub struct ChannelSink(mpsc::Sender<Message>);

impl ChannelSink {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self(tx), rx)
    }
}

impl UnsolicitedSink for ChannelSink {
    fn deliver(&self, message: Message) -> Result<(), SinkError> {
        self.0.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SinkError::Full,
            mpsc::error::TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}
