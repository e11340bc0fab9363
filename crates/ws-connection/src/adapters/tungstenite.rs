//! WebSocket transport over `tokio-tungstenite`.

use crate::domain::error::TransportError;
use crate::ports::{FrameHandler, Headers, Transport};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Connection {
    sink: SplitSink<WsStream, WsMessage>,
    reader: JoinHandle<()>,
}

/// Client WebSocket transport.
///
/// Inbound text frames are handed to the frame handler from a dedicated
/// reader task; binary frames are delivered if they are valid UTF-8.
#[derive(Default)]
pub struct TungsteniteTransport {
    connection: Mutex<Option<Connection>>,
    connected: Arc<AtomicBool>,
}

impl TungsteniteTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for TungsteniteTransport {
    async fn connect(
        &self,
        address: &str,
        headers: &Headers,
        handler: Arc<dyn FrameHandler>,
    ) -> Result<(), TransportError> {
        let mut request = address
            .into_client_request()
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                }
            })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| TransportError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            request.headers_mut().insert(header_name, header_value);
        }

        let (stream, response) = connect_async(request)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        debug!(status = %response.status(), "WebSocket handshake complete");

        let (sink, stream) = stream.split();
        let mut guard = self.connection.lock().await;
        if let Some(previous) = guard.take() {
            previous.reader.abort();
        }

        self.connected.store(true, Ordering::SeqCst);
        let reader = tokio::spawn(read_loop(stream, handler, Arc::clone(&self.connected)));
        *guard = Some(Connection { sink, reader });
        Ok(())
    }

    async fn send(&self, text: String) -> Result<(), TransportError> {
        let mut guard = self.connection.lock().await;
        let connection = guard.as_mut().ok_or(TransportError::NotConnected)?;
        connection
            .sink
            .send(WsMessage::Text(text.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&self) -> Result<(), TransportError> {
        let Some(mut connection) = self.connection.lock().await.take() else {
            return Ok(());
        };
        self.connected.store(false, Ordering::SeqCst);

        let result = connection
            .sink
            .send(WsMessage::Close(None))
            .await
            .map_err(|e| TransportError::Close(e.to_string()));
        let _ = connection.sink.close().await;
        connection.reader.abort();
        result
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

async fn read_loop(
    mut stream: SplitStream<WsStream>,
    handler: Arc<dyn FrameHandler>,
    connected: Arc<AtomicBool>,
) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => handler.on_frame(text.as_str()),
            Ok(WsMessage::Binary(data)) => match std::str::from_utf8(&data) {
                Ok(text) => handler.on_frame(text),
                Err(_) => debug!(len = data.len(), "Ignoring non UTF-8 binary frame"),
            },
            Ok(WsMessage::Close(frame)) => {
                info!(?frame, "WebSocket closed by server");
                break;
            }
            // Ping/pong are answered by tungstenite
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "WebSocket read failed");
                break;
            }
        }
    }
    connected.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ignore;

    impl FrameHandler for Ignore {
        fn on_frame(&self, _text: &str) {}
    }

    #[tokio::test]
    async fn test_send_before_connect() {
        let transport = TungsteniteTransport::new();
        assert!(!transport.is_connected());
        assert!(matches!(
            transport.send("x".into()).await,
            Err(TransportError::NotConnected)
        ));
        assert!(transport.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_header_rejected() {
        let transport = TungsteniteTransport::new();
        let headers = vec![("bad header".to_string(), "v".to_string())];
        let result = transport
            .connect("ws://127.0.0.1:9", &headers, Arc::new(Ignore))
            .await;
        assert!(matches!(result, Err(TransportError::InvalidHeader { .. })));
    }

    #[tokio::test]
    async fn test_invalid_address_rejected() {
        let transport = TungsteniteTransport::new();
        let result = transport.connect("not a url", &[], Arc::new(Ignore)).await;
        assert!(matches!(result, Err(TransportError::Connect(_))));
    }
}
