// ! Driver-side wiring
// !
// ! The driver spawns the host process, attaches the shared envelope to its
// ! pipes, registers the sampling handler before the handshake so reverse
// ! requests can be served from the first moment, and performs the
// ! initialize exchange.

pub mod generate;
pub mod query;
pub mod sampling;
pub mod session;

use std::sync::Arc;

use crate::config::Config;
use crate::core::error::CapResult;
use crate::protocol::messages::{InitializeParams, InitializeResult};
use crate::protocol::methods;
use crate::protocol::types::{DriverCapabilities, Implementation};
use crate::transport::envelope::{Envelope, EnvelopeConfig};
use crate::transport::stdio::ChildEndpoint;

pub use generate::{GenerationClient, TextGenerator};
pub use query::{MAX_TOOL_STEPS, QueryRunner};
pub use sampling::{GenerationSamplingHandler, SamplingHandler, register_sampling_handler};
pub use session::DriverSession;

/// A connected driver: spawned host process plus initialized envelope
pub struct Driver {
    envelope: Arc<Envelope>,
    endpoint: ChildEndpoint,
    generator: Arc<GenerationClient>,
    host_info: Implementation,
}

impl Driver {
    /// Spawn the host command and complete the initialize handshake
    pub async fn connect(config: &Config, command: &str, args: &[String]) -> CapResult<Self> {
        let mut endpoint = ChildEndpoint::spawn(
            command,
            &args.iter().map(String::as_str).collect::<Vec<_>>(),
        )?;

        let envelope = Envelope::new(EnvelopeConfig {
            request_timeout: config.request_timeout,
        });

        let generator = GenerationClient::shared(config);
        register_sampling_handler(
            &envelope,
            Arc::new(GenerationSamplingHandler::new(generator.clone())),
        );

        let _ = endpoint.attach(&envelope)?;

        let info = Implementation::new(
            "caplink-driver".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        );
        let result: InitializeResult = envelope
            .request_typed(
                methods::INITIALIZE,
                Some(InitializeParams::new(
                    DriverCapabilities {
                        sampling: Some(true),
                    },
                    info,
                )),
            )
            .await?;

        tracing::info!(
            host = %result.host_info.name,
            version = %result.host_info.version,
            "connected to host"
        );

        Ok(Self {
            envelope,
            endpoint,
            generator,
            host_info: result.host_info,
        })
    }

    /// The shared envelope
    pub fn envelope(&self) -> &Arc<Envelope> {
        &self.envelope
    }

    /// Implementation info reported by the host
    pub fn host_info(&self) -> &Implementation {
        &self.host_info
    }

    /// Build the interactive session over this connection
    pub fn session(&self) -> DriverSession {
        DriverSession::new(
            self.envelope.clone(),
            QueryRunner::new(self.envelope.clone(), self.generator.clone()),
        )
    }

    /// Tear down the connection and the host process.
    ///
    /// Closing the envelope drops the writer's half of the pipe, so the
    /// host sees EOF and exits on its own before the kill fallback.
    pub async fn shutdown(self) -> CapResult<()> {
        self.envelope.close();
        self.endpoint.shutdown().await
    }
}
