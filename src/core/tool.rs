//! Tool system for the caplink host
//!
//! This module provides the abstraction for implementing and registering
//! tools. Tools are functions the driver can call to perform operations,
//! guarded by argument validation against the tool's declared input schema.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use crate::core::error::CapResult;
use crate::core::validation::validate_arguments;
use crate::protocol::types::{CallToolResult, ToolInfo};

/// Trait for implementing tool handlers
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with validated arguments.
    ///
    /// Handlers may either return a failure-flagged [`CallToolResult`] or an
    /// error; both surface to the driver as failure content, never as a
    /// protocol fault.
    async fn call(&self, arguments: HashMap<String, Value>) -> CapResult<CallToolResult>;
}

/// A registered tool with its descriptor and handler
pub struct Tool {
    /// Descriptor advertised in tools/list
    pub info: ToolInfo,
    /// Handler that implements the tool's functionality
    pub handler: Box<dyn ToolHandler>,
}

impl Tool {
    /// Create a new tool from a descriptor and handler
    pub fn new<H>(info: ToolInfo, handler: H) -> Self
    where
        H: ToolHandler + 'static,
    {
        Self {
            info,
            handler: Box::new(handler),
        }
    }

    /// Validate the arguments and execute the tool.
    ///
    /// A schema violation yields a failure result without invoking the
    /// handler; a handler error is converted to a failure result. Nothing
    /// escapes as an Err past this point.
    pub async fn invoke(&self, arguments: HashMap<String, Value>) -> CallToolResult {
        let report = validate_arguments(&arguments, &self.info.input_schema);
        if !report.is_valid() {
            return CallToolResult::failure(format!(
                "Invalid arguments for tool '{}': {}",
                self.info.name,
                report.summary()
            ));
        }

        match self.handler.call(arguments).await {
            Ok(result) => result,
            Err(err) => {
                tracing::debug!(tool = %self.info.name, error = %err, "tool handler failed");
                CallToolResult::failure(format!("Tool '{}' failed: {err}", self.info.name))
            }
        }
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool").field("info", &self.info).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::{FieldType, InputSchema};
    use serde_json::json;

    struct EchoHandler;

    #[async_trait]
    impl ToolHandler for EchoHandler {
        async fn call(&self, arguments: HashMap<String, Value>) -> CapResult<CallToolResult> {
            let message = arguments
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("(empty)");
            Ok(CallToolResult::success(message))
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl ToolHandler for FailingHandler {
        async fn call(&self, _arguments: HashMap<String, Value>) -> CapResult<CallToolResult> {
            Err(crate::core::error::CapError::internal("boom"))
        }
    }

    fn echo_tool() -> Tool {
        Tool::new(
            ToolInfo {
                name: "echo".to_string(),
                description: Some("Echo a message".to_string()),
                input_schema: InputSchema::new().required_field(
                    "message",
                    FieldType::String,
                    "Message to echo",
                ),
                annotations: None,
            },
            EchoHandler,
        )
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let tool = echo_tool();
        let mut args = HashMap::new();
        args.insert("message".to_string(), json!("hi"));

        let result = tool.invoke(args).await;
        assert!(!result.is_failure());
        assert_eq!(result.content[0].as_text(), Some("hi"));
    }

    #[tokio::test]
    async fn test_invoke_rejects_invalid_arguments_before_handler() {
        let tool = echo_tool();
        let result = tool.invoke(HashMap::new()).await;
        assert!(result.is_failure());
        let text = result.content[0].as_text().unwrap();
        assert!(text.contains("Invalid arguments"));
        assert!(text.contains("message"));
    }

    #[tokio::test]
    async fn test_handler_error_becomes_failure_content() {
        let tool = Tool::new(
            ToolInfo {
                name: "broken".to_string(),
                description: None,
                input_schema: InputSchema::new(),
                annotations: None,
            },
            FailingHandler,
        );

        let result = tool.invoke(HashMap::new()).await;
        assert!(result.is_failure());
        assert!(
            result.content[0]
                .as_text()
                .unwrap()
                .contains("Tool 'broken' failed")
        );
    }
}
