// ! Driver-side sampling handler
// !
// ! The driver pre-registers a handler for sampling/createMessage; when the
// ! host's tool chain asks for generated text, the handler delegates to the
// ! generation backend and replies. A backend failure still produces a
// ! reply (an error response) so the host's pending call always resolves;
// ! an unresolved pending call would be a deadlock, not an option.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::error::{CapError, CapResult};
use crate::driver::generate::{ChatMessage, TextGenerator, map_finish_reason};
use crate::protocol::messages::CreateMessageParams;
use crate::protocol::methods;
use crate::protocol::types::{CreateMessageResult, Role, SamplingContent, StopReason};
use crate::transport::envelope::{Envelope, method_handler};

/// Trait for answering host-initiated sampling requests
#[async_trait]
pub trait SamplingHandler: Send + Sync {
    /// Produce a generated message for the given request
    async fn create_message(&self, params: CreateMessageParams) -> CapResult<CreateMessageResult>;
}

/// Sampling handler backed by a text generation client.
///
/// When the request carries several message entries, each is generated
/// sequentially and the outputs are joined with newline separators. The
/// model identifier and stop reason fields are synthesized from the
/// backend's configuration and last finish reason, since the protocol
/// requires them even when the backend reports neither.
pub struct GenerationSamplingHandler {
    generator: Arc<dyn TextGenerator>,
}

impl GenerationSamplingHandler {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl SamplingHandler for GenerationSamplingHandler {
    async fn create_message(&self, params: CreateMessageParams) -> CapResult<CreateMessageResult> {
        if params.messages.is_empty() {
            return Err(CapError::validation(
                "sampling request carries no messages",
            ));
        }

        let mut outputs = Vec::with_capacity(params.messages.len());
        let mut last_finish: Option<String> = None;

        for message in &params.messages {
            let mut conversation = Vec::new();
            if let Some(system) = params.system_prompt.as_deref() {
                if !system.trim().is_empty() {
                    conversation.push(ChatMessage::system(system));
                }
            }

            let role = match message.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            conversation.push(ChatMessage {
                role: role.to_string(),
                content: message.content.as_text().to_string(),
                tool_call_id: None,
                tool_calls: None,
            });

            let completion = self
                .generator
                .generate(&conversation, Some(params.max_tokens), None)
                .await?;
            outputs.push(completion.message.content.unwrap_or_default());
            last_finish = completion.finish_reason;
        }

        Ok(CreateMessageResult {
            role: Role::Assistant,
            content: SamplingContent::text(outputs.join("\n")),
            model: self.generator.model_id(),
            stop_reason: map_finish_reason(last_finish.as_deref()).or(Some(StopReason::EndTurn)),
        })
    }
}

/// Hook a sampling handler into the envelope.
///
/// Handler errors become error responses on the wire, resolving the host's
/// pending call with a failure rather than leaving it hanging.
pub fn register_sampling_handler(envelope: &Envelope, handler: Arc<dyn SamplingHandler>) {
    envelope.register_handler(
        methods::SAMPLING_CREATE_MESSAGE,
        method_handler(move |params: Option<Value>| {
            let handler = handler.clone();
            async move {
                let params = params
                    .ok_or_else(|| CapError::validation("Missing sampling parameters"))?;
                let params: CreateMessageParams = serde_json::from_value(params)
                    .map_err(|e| CapError::validation(format!("Invalid parameters: {e}")))?;
                let result = handler.create_message(params).await?;
                Ok(serde_json::to_value(result)?)
            }
        }),
    );
}
