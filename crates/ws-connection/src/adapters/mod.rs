//! Adapters implementing the outbound ports.

pub mod auth;
pub mod channel;
pub mod sink;
pub mod tungstenite;

pub use auth::StaticTokenProvider;
pub use channel::{channel_transport, ChannelPeer, ChannelTransport};
pub use sink::{BroadcastSink, ChannelSink};
pub use tungstenite::TungsteniteTransport;
