//! Domain types for the WebSocket connection.
//!
//! Configuration, error taxonomy and the pending request table.

pub mod config;
pub mod error;
pub mod pending;

// Re-exports for convenience
pub use config::{AuthConfig, ConfigError, ConnectionConfig, TimeoutConfig, UnsolicitedConfig};
pub use error::{AuthError, ConnectionError, SinkError, TransportError};
pub use pending::{Completion, PendingRequestStore, PendingStats, Registration};
