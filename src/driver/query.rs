// ! Autonomous query mode
// !
// ! Module runs a free-text query against the generation backend with the
// ! host's tools advertised as callable functions. Tool calls requested by
// ! the model are executed over the envelope and their results fed back into
// ! the conversation. The loop is bounded by an explicit step counter with a
// ! hard ceiling, so a model that keeps asking for tools cannot run forever.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::core::error::CapResult;
use crate::driver::generate::{
    ChatMessage, ChatToolDefinition, ChatToolFunction, TextGenerator,
};
use crate::protocol::messages::{CallToolParams, ListToolsResult};
use crate::protocol::methods;
use crate::protocol::types::{CallToolResult, ContentBlock, ToolInfo};
use crate::transport::envelope::Envelope;

/// Hard ceiling on tool invocations per query
pub const MAX_TOOL_STEPS: usize = 5;

const SYSTEM_PROMPT: &str = "You are an assistant operating a user directory. Use the \
available tools when they help answer the request; otherwise answer directly.";

/// Runs bounded multi-step tool-use queries
pub struct QueryRunner {
    envelope: Arc<Envelope>,
    generator: Arc<dyn TextGenerator>,
}

impl QueryRunner {
    pub fn new(envelope: Arc<Envelope>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            envelope,
            generator,
        }
    }

    /// Execute one query, returning the model's final answer text
    pub async fn run(&self, text: &str) -> CapResult<String> {
        let listing: ListToolsResult = self
            .envelope
            .request_typed(methods::TOOLS_LIST, None::<Value>)
            .await?;
        let tool_defs: Vec<ChatToolDefinition> = listing
            .tools
            .iter()
            .map(tool_definition)
            .collect::<Result<_, _>>()?;

        let mut conversation = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(text)];
        let mut steps_used = 0usize;

        loop {
            let completion = self
                .generator
                .generate(&conversation, None, Some(&tool_defs))
                .await?;

            let tool_calls = completion
                .message
                .tool_calls
                .clone()
                .unwrap_or_default();

            if tool_calls.is_empty() {
                return Ok(completion
                    .message
                    .content
                    .unwrap_or_else(|| "(no answer produced)".to_string()));
            }

            if steps_used + tool_calls.len() > MAX_TOOL_STEPS {
                tracing::warn!(steps_used, "tool step ceiling reached, answering without tools");
                return Ok(completion.message.content.unwrap_or_else(|| {
                    format!("Stopped after {MAX_TOOL_STEPS} tool invocations without a final answer.")
                }));
            }

            conversation.push(ChatMessage::assistant_with_tool_calls(tool_calls.clone()));

            for call in tool_calls {
                steps_used += 1;
                let rendered = self.execute_tool_call(&call.function.name, &call.function.arguments)
                    .await;
                tracing::debug!(tool = %call.function.name, step = steps_used, "executed tool call");
                conversation.push(ChatMessage::tool_result(call.id, rendered));
            }
        }
    }

    /// Run one tool call over the envelope, rendering the outcome as text.
    /// Failures render as text too; the model decides what to do with them.
    async fn execute_tool_call(&self, name: &str, raw_arguments: &str) -> String {
        let arguments: HashMap<String, Value> = match serde_json::from_str(raw_arguments) {
            Ok(arguments) => arguments,
            Err(e) => return format!("invalid tool arguments: {e}"),
        };

        let params = CallToolParams::new(name.to_string()).with_arguments(arguments);
        match self
            .envelope
            .request_typed::<_, CallToolResult>(methods::TOOLS_CALL, Some(params))
            .await
        {
            Ok(result) => render_content(&result.content),
            Err(e) => format!("tool call failed: {e}"),
        }
    }
}

/// Advertise a tool descriptor as a callable function
fn tool_definition(info: &ToolInfo) -> CapResult<ChatToolDefinition> {
    Ok(ChatToolDefinition {
        kind: "function".to_string(),
        function: ChatToolFunction {
            name: info.name.clone(),
            description: info.description.clone(),
            parameters: serde_json::to_value(&info.input_schema)?,
        },
    })
}

/// Flatten content blocks into display text, one block per line
pub fn render_content(content: &[ContentBlock]) -> String {
    content
        .iter()
        .map(|block| match block {
            ContentBlock::Text { text } => text.clone(),
            ContentBlock::Resource { resource } => resource.uri().to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
