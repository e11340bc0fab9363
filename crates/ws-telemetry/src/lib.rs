//! # WS Telemetry
//!
//! Logging setup for the WebSocket correlation crates.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ws_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `ws-correlate` | Service name reported at startup |
//! | `WS_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `WS_JSON_LOGS` | `false` (`true` in containers) | JSON formatted logs |
//! | `WS_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    Init(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
