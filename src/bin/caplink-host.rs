//! The caplink host binary
//!
//! Builds the capability registry over the user store, attaches the
//! envelope to stdin/stdout, and serves until the driver closes the
//! channel. Logs go to stderr; stdout carries the protocol.

use std::sync::Arc;

use caplink::config::Config;
use caplink::core::error::{CapError, CapResult};
use caplink::core::registry::Registry;
use caplink::host::users::register_user_capabilities;
use caplink::host::{Host, SamplingClient};
use caplink::protocol::types::Implementation;
use caplink::store::UserStore;
use caplink::transport::envelope::{Envelope, EnvelopeConfig};
use caplink::transport::stdio::attach_stdio;

#[tokio::main]
async fn main() -> CapResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    let envelope = Envelope::new(EnvelopeConfig {
        request_timeout: config.request_timeout,
    });

    let store = Arc::new(UserStore::new(&config.store_path));
    let sampling = Arc::new(SamplingClient::new(envelope.clone()));

    // A duplicate identifier here is a programming error; fail startup
    let mut registry = Registry::new();
    register_user_capabilities(&mut registry, store, sampling)?;

    let _host = Host::new(
        Implementation::with_title(
            "caplink-host".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
            "Caplink Host".to_string(),
        ),
        registry,
        &envelope,
    );

    tracing::info!(store = %config.store_path.display(), "host serving on stdio");

    attach_stdio(&envelope)
        .await
        .map_err(|e| CapError::internal(format!("serve task failed: {e}")))?;

    tracing::info!("channel closed, shutting down");
    Ok(())
}
