//! # WS Envelope - Wire Unit for WebSocket Frames
//!
//! A flat, fixed-schema record serialized to and from a single JSON text
//! frame. Decoding is total: malformed input becomes the zero-value envelope
//! instead of an error, so the dispatch path can always inspect
//! `correlationId` and `type`.
//!
//! ## Shapes
//!
//! - [`Message`]: base envelope (`type`, `content`, `correlationId`, plus the
//!   optional application fields `actorId` and `token`)
//! - [`RequestMessage`]: a message with a freshly generated correlation id
//! - [`ResponseMessage`]: a message plus `success` and `error`

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod correlation;
pub mod message;
pub mod request;
pub mod response;

pub use correlation::CorrelationId;
pub use message::{Envelope, Message};
pub use request::RequestMessage;
pub use response::ResponseMessage;
