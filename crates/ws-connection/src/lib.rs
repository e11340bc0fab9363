//! WS Connection - request/response correlation over a WebSocket.
//!
//! A WebSocket carries independent text frames in both directions. This crate
//! layers a request/response pattern on top: every request carries a
//! correlation id, and the inbound frame echoing that id completes the caller
//! waiting on it. Frames that answer nothing are fanned out as unsolicited
//! messages.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      WebSocketConnection                          │
//! │   connect (token → auth header)  ·  request  ·  subscribe  ·  dispose
//! ├──────────────────────────────────────────────────────────────────┤
//! │                      Correlation Engine                           │
//! │  ┌──────────────────────────┐     ┌───────────────────────────┐  │
//! │  │   Pending Request Store  │     │     Timeout timers        │  │
//! │  │  id → oneshot completion │◄────┤  (tokio tasks, abortable) │  │
//! │  └────────────┬─────────────┘     └───────────────────────────┘  │
//! │               │ matched                     unmatched            │
//! │               ▼                                 ▼                │
//! │         waiting caller                 Unsolicited sink          │
//! └───────────────┬──────────────────────────────────┬───────────────┘
//!                 │ send                     on_frame│
//!                 ▼                                  │
//!        ┌────────────────────────────────────────────────┐
//!        │   Transport (tokio-tungstenite / in-memory)    │
//!        └────────────────────────────────────────────────┘
//! ```
//!
//! Each pending id is settled exactly once, by whichever of response,
//! timeout, transport failure or disposal removes it from the store first.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use ws_connection::{ConnectionConfig, TungsteniteTransport, WebSocketConnection};
//!
//! let config = ConnectionConfig::new("ws://localhost:8080");
//! let connection = WebSocketConnection::new(config, Arc::new(TungsteniteTransport::new()))?;
//! connection.connect().await?;
//! let response = connection.request("ping", "").await?;
//! connection.dispose().await;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod engine;
pub mod global;
pub mod ports;
pub mod service;

pub use adapters::{
    channel_transport, BroadcastSink, ChannelPeer, ChannelSink, ChannelTransport,
    StaticTokenProvider, TungsteniteTransport,
};
pub use domain::{
    AuthConfig, AuthError, Completion, ConfigError, ConnectionConfig, ConnectionError,
    PendingRequestStore, PendingStats, SinkError, TimeoutConfig, TransportError,
    UnsolicitedConfig,
};
pub use engine::CorrelationEngine;
pub use global::RegistryError;
pub use ports::{FrameHandler, Headers, TokenProvider, Transport, UnsolicitedSink};
pub use service::WebSocketConnection;
pub use ws_envelope::{CorrelationId, Envelope, Message, RequestMessage, ResponseMessage};
