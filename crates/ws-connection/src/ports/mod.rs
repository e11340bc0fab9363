//! Ports for the WebSocket connection.

pub mod outbound;

pub use outbound::{FrameHandler, Headers, TokenProvider, Transport, UnsolicitedSink};
