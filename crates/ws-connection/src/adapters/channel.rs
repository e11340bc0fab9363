//! In-process transport for tests and embedding.
//!
//! `ChannelTransport` is the engine-facing half; `ChannelPeer` plays the
//! server: it reads what the engine sent and pushes frames back in.

use crate::domain::error::TransportError;
use crate::ports::{FrameHandler, Headers, Transport};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Default)]
struct Shared {
    handler: RwLock<Option<Arc<dyn FrameHandler>>>,
    connected: AtomicBool,
    fail_sends: AtomicBool,
    fail_connects: AtomicBool,
    address: Mutex<Option<String>>,
    headers: Mutex<Vec<(String, String)>>,
}

pub struct ChannelTransport {
    shared: Arc<Shared>,
    outbound: mpsc::UnboundedSender<String>,
}

pub struct ChannelPeer {
    shared: Arc<Shared>,
    outbound: mpsc::UnboundedReceiver<String>,
}

/// Create a connected transport/peer pair.
pub fn channel_transport() -> (ChannelTransport, ChannelPeer) {
    let shared = Arc::new(Shared::default());
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ChannelTransport {
            shared: Arc::clone(&shared),
            outbound: tx,
        },
        ChannelPeer {
            shared,
            outbound: rx,
        },
    )
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn connect(
        &self,
        address: &str,
        headers: &Headers,
        handler: Arc<dyn FrameHandler>,
    ) -> Result<(), TransportError> {
        if self.shared.fail_connects.load(Ordering::SeqCst) {
            return Err(TransportError::Connect(format!(
                "connection refused: {address}"
            )));
        }

        *self.shared.address.lock() = Some(address.to_string());
        *self.shared.headers.lock() = headers.to_vec();
        *self.shared.handler.write() = Some(handler);
        self.shared.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, text: String) -> Result<(), TransportError> {
        if !self.shared.connected.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }
        if self.shared.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Send("peer rejected frame".into()));
        }
        self.outbound
            .send(text)
            .map_err(|_| TransportError::Send("peer dropped".into()))
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.shared.connected.store(false, Ordering::SeqCst);
        self.shared.handler.write().take();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }
}

impl ChannelPeer {
    /// Wait for the next frame the engine transmitted.
    pub async fn next_frame(&mut self) -> Option<String> {
        self.outbound.recv().await
    }

    pub fn try_next_frame(&mut self) -> Option<String> {
        self.outbound.try_recv().ok()
    }

    /// Push an inbound frame to the connected handler.
    ///
    /// Returns false if nothing is connected.
    pub fn deliver(&self, text: &str) -> bool {
        let handler = self.shared.handler.read().clone();
        match handler {
            Some(handler) => {
                handler.on_frame(text);
                true
            }
            None => false,
        }
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.shared.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_connects(&self, fail: bool) {
        self.shared.fail_connects.store(fail, Ordering::SeqCst);
    }

    pub fn connected_address(&self) -> Option<String> {
        self.shared.address.lock().clone()
    }

    pub fn connected_headers(&self) -> Vec<(String, String)> {
        self.shared.headers.lock().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(Mutex<Vec<String>>);

    impl FrameHandler for Recorder {
        fn on_frame(&self, text: &str) {
            self.0.lock().push(text.to_string());
        }
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let (transport, _peer) = channel_transport();
        assert!(matches!(
            transport.send("x".into()).await,
            Err(TransportError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (transport, mut peer) = channel_transport();
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let headers = vec![("Authorization".to_string(), "t".to_string())];

        transport
            .connect("ws://local", &headers, recorder.clone())
            .await
            .unwrap();
        assert_eq!(peer.connected_address().as_deref(), Some("ws://local"));
        assert_eq!(peer.connected_headers(), headers);

        transport.send("out".into()).await.unwrap();
        assert_eq!(peer.next_frame().await.as_deref(), Some("out"));

        assert!(peer.deliver("in"));
        assert_eq!(recorder.0.lock().as_slice(), ["in".to_string()]);

        transport.close().await.unwrap();
        assert!(!peer.deliver("late"));
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let (transport, peer) = channel_transport();
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));

        peer.set_fail_connects(true);
        assert!(transport
            .connect("ws://local", &[], recorder.clone())
            .await
            .is_err());

        peer.set_fail_connects(false);
        transport.connect("ws://local", &[], recorder).await.unwrap();
        peer.set_fail_sends(true);
        assert!(matches!(
            transport.send("x".into()).await,
            Err(TransportError::Send(_))
        ));
    }
}
