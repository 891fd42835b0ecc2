// ! Host-side protocol surface
// !
// ! Module wires a capability registry to an envelope: it registers the
// ! request handlers the host serves and exposes the reverse-direction
// ! sampling client that capability handlers use to ask the driver for
// ! generated text.

pub mod invoker;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::error::{CapError, CapResult};
use crate::core::registry::Registry;
use crate::protocol::messages::*;
use crate::protocol::methods;
use crate::protocol::types::{CreateMessageResult, HostCapabilities, Implementation};
use crate::transport::envelope::{Envelope, method_handler};

pub use invoker::Invoker;

/// Reverse-direction text generation as seen from host-side handlers.
///
/// The seam exists so capability handlers can be exercised with a stub
/// backend; the production implementation is [`SamplingClient`].
#[async_trait]
pub trait SamplingBridge: Send + Sync {
    /// Ask the driver to produce generated text, suspending until the
    /// pending call resolves or times out
    async fn create_message(&self, params: CreateMessageParams) -> CapResult<CreateMessageResult>;
}

/// Issues sampling requests through the shared envelope
#[derive(Clone)]
pub struct SamplingClient {
    envelope: Arc<Envelope>,
}

impl SamplingClient {
    pub fn new(envelope: Arc<Envelope>) -> Self {
        Self { envelope }
    }
}

#[async_trait]
impl SamplingBridge for SamplingClient {
    async fn create_message(&self, params: CreateMessageParams) -> CapResult<CreateMessageResult> {
        self.envelope
            .request_typed(methods::SAMPLING_CREATE_MESSAGE, Some(params))
            .await
    }
}

/// The host process's protocol surface
pub struct Host {
    info: Implementation,
    capabilities: HostCapabilities,
    invoker: Arc<Invoker>,
}

impl Host {
    /// Build a host over a fully-registered registry and hook its request
    /// handlers into the envelope. Registration is complete before serving
    /// begins; the registry is immutable from here on.
    pub fn new(info: Implementation, registry: Registry, envelope: &Arc<Envelope>) -> Arc<Self> {
        let host = Arc::new(Self {
            info,
            capabilities: HostCapabilities {
                tools: Some(true),
                resources: Some(true),
                prompts: Some(true),
            },
            invoker: Arc::new(Invoker::new(Arc::new(registry))),
        });
        host.register_handlers(envelope);
        host
    }

    /// Host implementation info
    pub fn info(&self) -> &Implementation {
        &self.info
    }

    /// The invoker executing this host's capabilities
    pub fn invoker(&self) -> &Arc<Invoker> {
        &self.invoker
    }

    fn register_handlers(self: &Arc<Self>, envelope: &Arc<Envelope>) {
        let host = self.clone();
        envelope.register_handler(
            methods::INITIALIZE,
            method_handler(move |params| {
                let host = host.clone();
                async move { host.handle_initialize(params).await }
            }),
        );

        envelope.register_handler(
            methods::PING,
            method_handler(|_params| async {
                serde_json::to_value(PingResult::default()).map_err(CapError::serialization)
            }),
        );

        let host = self.clone();
        envelope.register_handler(
            methods::TOOLS_LIST,
            method_handler(move |_params| {
                let host = host.clone();
                async move {
                    let result = ListToolsResult {
                        tools: host.invoker.registry().list_tools(),
                    };
                    Ok(serde_json::to_value(result)?)
                }
            }),
        );

        let host = self.clone();
        envelope.register_handler(
            methods::TOOLS_CALL,
            method_handler(move |params| {
                let host = host.clone();
                async move {
                    let params: CallToolParams = required_params(params)?;
                    let result = host
                        .invoker
                        .call_tool(&params.name, params.arguments)
                        .await?;
                    Ok(serde_json::to_value(result)?)
                }
            }),
        );

        let host = self.clone();
        envelope.register_handler(
            methods::RESOURCES_LIST,
            method_handler(move |_params| {
                let host = host.clone();
                async move {
                    let result = ListResourcesResult {
                        resources: host.invoker.registry().list_resources(),
                    };
                    Ok(serde_json::to_value(result)?)
                }
            }),
        );

        let host = self.clone();
        envelope.register_handler(
            methods::RESOURCES_TEMPLATES_LIST,
            method_handler(move |_params| {
                let host = host.clone();
                async move {
                    let result = ListResourceTemplatesResult {
                        resource_templates: host.invoker.registry().list_templates(),
                    };
                    Ok(serde_json::to_value(result)?)
                }
            }),
        );

        let host = self.clone();
        envelope.register_handler(
            methods::RESOURCES_READ,
            method_handler(move |params| {
                let host = host.clone();
                async move {
                    let params: ReadResourceParams = required_params(params)?;
                    let result = host.invoker.read_resource(&params.uri).await?;
                    Ok(serde_json::to_value(result)?)
                }
            }),
        );

        let host = self.clone();
        envelope.register_handler(
            methods::PROMPTS_LIST,
            method_handler(move |_params| {
                let host = host.clone();
                async move {
                    let result = ListPromptsResult {
                        prompts: host.invoker.registry().list_prompts(),
                    };
                    Ok(serde_json::to_value(result)?)
                }
            }),
        );

        let host = self.clone();
        envelope.register_handler(
            methods::PROMPTS_GET,
            method_handler(move |params| {
                let host = host.clone();
                async move {
                    let params: GetPromptParams = required_params(params)?;
                    let result = host
                        .invoker
                        .render_prompt(&params.name, params.arguments)
                        .await?;
                    Ok(serde_json::to_value(result)?)
                }
            }),
        );
    }

    async fn handle_initialize(&self, params: Option<Value>) -> CapResult<Value> {
        let params: InitializeParams = required_params(params)?;
        tracing::info!(
            driver = %params.driver_info.name,
            version = %params.driver_info.version,
            sampling = params.capabilities.sampling.unwrap_or(false),
            "driver connected"
        );

        let result = InitializeResult::new(self.capabilities.clone(), self.info.clone());
        Ok(serde_json::to_value(result)?)
    }
}

/// Deserialize required request params, mapping absence to a validation error
fn required_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> CapResult<T> {
    let params = params.ok_or_else(|| CapError::validation("Missing request parameters"))?;
    serde_json::from_value(params).map_err(|e| CapError::validation(format!("Invalid parameters: {e}")))
}
