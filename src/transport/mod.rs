//! Transport layer for the capability exchange
//!
//! This module provides the symmetric message envelope (correlation,
//! pending-call tracking, handler dispatch) and the STDIO wiring that
//! connects it to a real process boundary.

pub mod envelope;
pub mod stdio;

// Re-export commonly used types
pub use envelope::{
    Envelope, EnvelopeConfig, MethodHandler, NotificationHandler, method_handler,
    notification_handler,
};
pub use stdio::{ChildEndpoint, attach_stdio};
