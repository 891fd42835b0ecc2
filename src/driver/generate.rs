// ! Chat-completion client for the driver's generation backend
// !
// ! Module talks to an OpenAI-compatible chat completions endpoint over
// ! HTTP. The credential is optional at construction; a missing key fails
// ! only when a generation is actually attempted, never at startup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::core::error::{CapError, CapResult};
use crate::protocol::types::StopReason;

/// A chat message on the completion wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ChatToolCall>>,
}

impl ChatMessage {
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
            tool_call_id: None,
            tool_calls: None,
        }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            tool_call_id: None,
            tool_calls: None,
        }
    }

    pub fn assistant_with_tool_calls(tool_calls: Vec<ChatToolCall>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: String::new(),
            tool_call_id: None,
            tool_calls: Some(tool_calls),
        }
    }

    /// A tool-result message answering one tool call
    pub fn tool_result<S: Into<String>>(tool_call_id: S, content: S) -> Self {
        Self {
            role: "tool".to_string(),
            content: content.into(),
            tool_call_id: Some(tool_call_id.into()),
            tool_calls: None,
        }
    }
}

/// A tool call requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: ChatToolCallFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatToolCallFunction {
    pub name: String,
    /// JSON-encoded argument object
    pub arguments: String,
}

/// A tool advertised to the model
#[derive(Debug, Clone, Serialize)]
pub struct ChatToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: ChatToolFunction,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatToolFunction {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Value,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ChatToolDefinition]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponseMessage {
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Deserialize)]
struct ChatResponseChoice {
    message: ChatResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatResponseChoice>,
}

/// One settled generation
#[derive(Debug, Clone)]
pub struct Completion {
    /// The model's message (text and/or tool calls)
    pub message: ChatResponseMessage,
    /// Backend finish reason, verbatim
    pub finish_reason: Option<String>,
}

/// Map a backend finish reason onto the protocol's stop reasons
pub fn map_finish_reason(reason: Option<&str>) -> Option<StopReason> {
    match reason? {
        "stop" => Some(StopReason::EndTurn),
        "length" => Some(StopReason::MaxTokens),
        "content_filter" => Some(StopReason::StopSequence),
        other => Some(StopReason::Other(other.to_string())),
    }
}

/// Seam between the sampling/query code and the HTTP backend
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Identifier reported in sampling results
    fn model_id(&self) -> String;

    /// Run one generation over the given conversation
    async fn generate(
        &self,
        messages: &[ChatMessage],
        max_tokens: Option<u32>,
        tools: Option<&[ChatToolDefinition]>,
    ) -> CapResult<Completion>;
}

/// HTTP client for an OpenAI-compatible chat completions endpoint
pub struct GenerationClient {
    http: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
}

impl GenerationClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Build a shared handle
    pub fn shared(config: &Config) -> Arc<Self> {
        Arc::new(Self::new(config))
    }
}

#[async_trait]
impl TextGenerator for GenerationClient {
    fn model_id(&self) -> String {
        self.model.clone()
    }

    async fn generate(
        &self,
        messages: &[ChatMessage],
        max_tokens: Option<u32>,
        tools: Option<&[ChatToolDefinition]>,
    ) -> CapResult<Completion> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            CapError::generation(format!(
                "no API credential configured; set {}",
                crate::config::API_KEY_VAR
            ))
        })?;

        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            max_tokens,
            tools,
        };

        let url = format!("{}/chat/completions", self.api_base);
        tracing::debug!(model = %self.model, messages = messages.len(), "requesting completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CapError::generation(format!(
                "backend returned {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CapError::generation(format!("malformed backend response: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CapError::generation("backend returned no choices"))?;

        Ok(Completion {
            message: choice.message,
            finish_reason: choice.finish_reason,
        })
    }
}
