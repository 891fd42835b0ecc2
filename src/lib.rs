// Copyright (c) 2025 Caplink Contributors
// SPDX-License-Identifier: MIT

//! # caplink
//!
//! A bidirectional capability-exchange protocol between a host process
//! (exposing tools, resources, and prompts over a data store) and an
//! interactive driver process that discovers and invokes them — and answers
//! the host's reverse-direction sampling requests by delegating to a
//! language-model backend.
//!
//! Both sides speak newline-delimited JSON-RPC over one duplex channel
//! through the same symmetric [`Envelope`](transport::Envelope): each side
//! registers handlers for the methods it serves and issues requests for the
//! methods it consumes. That symmetry is what lets a host-side tool call
//! suspend mid-execution, ask the driver for generated text, and resume
//! when the reply arrives.
//!
//! ## Host Example
//!
//! ```rust,no_run
//! use caplink::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> CapResult<()> {
//!     let config = Config::from_env();
//!     let envelope = Envelope::new(EnvelopeConfig::default());
//!
//!     let store = Arc::new(UserStore::new(&config.store_path));
//!     let sampling = Arc::new(SamplingClient::new(envelope.clone()));
//!
//!     let mut registry = Registry::new();
//!     register_user_capabilities(&mut registry, store, sampling)?;
//!
//!     let _host = Host::new(
//!         Implementation::new("caplink-host", "0.1.0"),
//!         registry,
//!         &envelope,
//!     );
//!
//!     caplink::transport::attach_stdio(&envelope)
//!         .await
//!         .map_err(|e| CapError::internal(e.to_string()))
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`core`]: registry, handler traits, validation, and errors
//! - [`protocol`]: wire types and per-method message definitions
//! - [`transport`]: the symmetric envelope and STDIO wiring
//! - [`host`]: host-side request handlers and the user capability set
//! - [`driver`]: session loop, sampling handler, and generation backend
//! - [`store`]: the JSON-file user store collaborator
//! - [`config`]: environment configuration
//! - [`utils`]: URI templates and text normalization helpers

pub mod config;
pub mod core;
pub mod driver;
pub mod host;
pub mod protocol;
pub mod store;
pub mod transport;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::error::{CapError, CapResult};
pub use protocol::types::*;

/// Prelude module for convenient imports
///
/// Use `use caplink::prelude::*;` to bring the common types into scope.
pub mod prelude {
    // Core types and traits
    pub use crate::core::{
        error::{CapError, CapResult},
        prompt::{Prompt, PromptHandler},
        registry::{Registry, ResourceMatch},
        resource::{ResourceHandler, StaticResource, TemplateResource},
        tool::{Tool, ToolHandler},
        validation::validate_arguments,
    };

    // Protocol types and messages
    pub use crate::protocol::messages::*;
    pub use crate::protocol::methods;
    pub use crate::protocol::types::*;

    // Host and driver surfaces
    pub use crate::driver::{
        Driver, DriverSession, GenerationClient, GenerationSamplingHandler, QueryRunner,
        SamplingHandler, TextGenerator, register_sampling_handler,
    };
    pub use crate::host::{Host, Invoker, SamplingBridge, SamplingClient};
    pub use crate::host::users::register_user_capabilities;

    // Transport
    pub use crate::transport::{Envelope, EnvelopeConfig, method_handler};

    // Collaborators
    pub use crate::config::Config;
    pub use crate::store::{NewUser, UserRecord, UserStore};

    // Essential external types
    pub use async_trait::async_trait;
    pub use serde_json::{Value, json};
    pub use std::collections::HashMap;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Basic smoke test to ensure the common paths are accessible
        let _error = CapError::Protocol("test".to_string());
        let _registry = core::registry::Registry::new();
    }
}
