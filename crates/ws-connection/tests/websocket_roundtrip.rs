//! # WebSocket Round-Trip Tests
//!
//! Runs a real local WebSocket server and drives it through
//! `TungsteniteTransport`: handshake headers, correlated requests,
//! unsolicited pushes and disposal.

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use ws_connection::{
    ConnectionConfig, ConnectionError, Envelope, Message, ResponseMessage, StaticTokenProvider,
    TungsteniteTransport, WebSocketConnection,
};

// =============================================================================
// TEST SERVER
// =============================================================================

struct TestServer {
    uri: String,
    auth_header: oneshot::Receiver<Option<String>>,
}

/// Serve one client.
///
/// - `ping` is answered with a successful `pong`
/// - `subscribe` is answered, then followed by an unsolicited `push`
/// - `silent` is never answered
/// - anything else is answered with a failure response
async fn spawn_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let uri = format!("ws://{}", listener.local_addr().unwrap());
    let (header_tx, header_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let callback = |request: &Request,
                        response: Response|
         -> Result<Response, ErrorResponse> {
            let header = request
                .headers()
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let _ = header_tx.send(header);
            Ok(response)
        };
        let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback)
            .await
            .unwrap();

        while let Some(Ok(frame)) = ws.next().await {
            let WsMessage::Text(text) = frame else {
                continue;
            };
            let request = Message::decode(text.as_str());
            let id = request.correlation_id.clone();

            let replies = match request.kind.as_str() {
                "ping" => vec![ResponseMessage::success(
                    Message::new("pong").with_correlation_id(id),
                )
                .encode()],
                "subscribe" => vec![
                    ResponseMessage::success(Message::new("subscribed").with_correlation_id(id))
                        .encode(),
                    Message::new("push").with_content("first event").encode(),
                ],
                "silent" => Vec::new(),
                other => vec![ResponseMessage::failure(
                    Message::new(other).with_correlation_id(id),
                    format!("unknown request type: {other}"),
                )
                .encode()],
            };

            for reply in replies {
                if ws.send(WsMessage::Text(reply.into())).await.is_err() {
                    return;
                }
            }
        }
    });

    TestServer {
        uri,
        auth_header: header_rx,
    }
}

async fn connect(server_uri: &str) -> WebSocketConnection {
    let config = ConnectionConfig::new(server_uri).with_request_timeout(Duration::from_secs(5));
    let connection =
        WebSocketConnection::new(config, Arc::new(TungsteniteTransport::new())).unwrap();
    connection.connect().await.unwrap();
    connection
}

// =============================================================================
// TESTS
// =============================================================================

#[tokio::test]
async fn test_request_round_trip() {
    let server = spawn_server().await;
    let connection = connect(&server.uri).await;
    assert!(connection.is_connected());
    assert_eq!(server.auth_header.await.unwrap(), None);

    let response = connection.request("ping", "").await.unwrap();
    assert_eq!(response.message.kind, "pong");
    assert!(response.success);

    let response = connection.request("dance", "").await.unwrap();
    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("unknown request type: dance")
    );

    connection.dispose().await;
    assert!(!connection.is_connected());
}

#[tokio::test]
async fn test_token_sent_in_handshake() {
    let server = spawn_server().await;
    let config = ConnectionConfig::new(server.uri.clone()).with_token_service("Hangout");
    let connection = WebSocketConnection::new(config, Arc::new(TungsteniteTransport::new()))
        .unwrap()
        .with_token_provider(Arc::new(StaticTokenProvider::new("session-123")));

    connection.connect().await.unwrap();
    assert_eq!(
        server.auth_header.await.unwrap().as_deref(),
        Some("session-123")
    );
    connection.dispose().await;
}

#[tokio::test]
async fn test_push_after_response() {
    let server = spawn_server().await;
    let connection = connect(&server.uri).await;
    let mut unsolicited = connection.subscribe();

    let response = connection.request("subscribe", "room-1").await.unwrap();
    assert_eq!(response.message.kind, "subscribed");

    let push = tokio::time::timeout(Duration::from_secs(5), unsolicited.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(push.kind, "push");
    assert_eq!(push.content, "first event");
    assert!(!push.is_correlated());

    connection.dispose().await;
}

#[tokio::test]
async fn test_unanswered_request_times_out_and_dispose_cancels() {
    let server = spawn_server().await;
    let connection = Arc::new(connect(&server.uri).await);

    let err = connection
        .send_request_with_timeout(
            &Message::new("silent").with_correlation_id("quiet-1"),
            Some(Duration::from_millis(100)),
        )
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    let waiting = {
        let connection = Arc::clone(&connection);
        tokio::spawn(async move {
            connection
                .send_request_with_timeout(
                    &Message::new("silent").with_correlation_id("quiet-2"),
                    None,
                )
                .await
        })
    };
    while !connection.engine().is_pending("quiet-2") {
        tokio::task::yield_now().await;
    }
    // Let the frame reach the server before closing
    tokio::time::sleep(Duration::from_millis(50)).await;

    connection.dispose().await;
    assert!(waiting.await.unwrap().unwrap_err().is_cancelled());
}

#[tokio::test]
async fn test_connect_to_closed_port_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let uri = format!("ws://{}", listener.local_addr().unwrap());
    drop(listener);

    let connection = WebSocketConnection::new(
        ConnectionConfig::new(uri.clone()),
        Arc::new(TungsteniteTransport::new()),
    )
    .unwrap();

    let err = connection.connect().await.unwrap_err();
    assert!(matches!(err, ConnectionError::Connect { uri: ref failed, .. } if *failed == uri));
    assert!(!connection.is_connected());
}
