//! Protocol layer for the caplink capability exchange
//!
//! This module contains the wire types and message definitions shared by both
//! sides of the channel: JSON-RPC envelope structs, capability descriptors,
//! sampling types, and the per-method parameter/result payloads.

pub mod messages;
pub mod methods;
pub mod types;

// Re-export commonly used types and constants
pub use messages::*;
pub use types::*;
