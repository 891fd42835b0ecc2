// ! Protocol messages
// !
// ! Module defines the request parameter and response result types for every
// ! method on the capability-exchange surface.

use crate::protocol::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Request Parameter Types
// ============================================================================

/// Parameters for initialize request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitializeParams {
    /// Protocol version the driver supports
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Driver capabilities
    pub capabilities: DriverCapabilities,
    /// Driver implementation info
    #[serde(rename = "driverInfo")]
    pub driver_info: Implementation,
}

impl InitializeParams {
    pub fn new(capabilities: DriverCapabilities, driver_info: Implementation) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities,
            driver_info,
        }
    }
}

/// Parameters for tool call request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallToolParams {
    /// Name of the tool to call
    pub name: String,
    /// Arguments to pass to the tool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<HashMap<String, serde_json::Value>>,
}

impl CallToolParams {
    pub fn new(name: String) -> Self {
        Self {
            name,
            arguments: None,
        }
    }

    pub fn with_arguments(mut self, arguments: HashMap<String, serde_json::Value>) -> Self {
        self.arguments = Some(arguments);
        self
    }
}

/// Parameters for resource read request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadResourceParams {
    /// URI of the resource to read
    pub uri: String,
}

impl ReadResourceParams {
    pub fn new(uri: String) -> Self {
        Self { uri }
    }
}

/// Parameters for prompt get request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetPromptParams {
    /// Name of the prompt
    pub name: String,
    /// Arguments for prompt templating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<HashMap<String, String>>,
}

impl GetPromptParams {
    pub fn new(name: String) -> Self {
        Self {
            name,
            arguments: None,
        }
    }

    pub fn with_arguments(mut self, arguments: HashMap<String, String>) -> Self {
        self.arguments = Some(arguments);
        self
    }
}

/// Parameters for list tools request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ListToolsParams {}

/// Parameters for list resources request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ListResourcesParams {}

/// Parameters for list resource templates request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ListResourceTemplatesParams {}

/// Parameters for list prompts request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ListPromptsParams {}

/// Parameters for ping request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PingParams {}

/// Parameters for sampling/createMessage request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateMessageParams {
    /// Messages in the conversation
    pub messages: Vec<SamplingMessage>,
    /// Maximum tokens to generate
    #[serde(rename = "maxTokens")]
    pub max_tokens: u32,
    /// Optional system prompt
    #[serde(rename = "systemPrompt", skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl CreateMessageParams {
    /// A single-user-message sampling request
    pub fn from_prompt<S: Into<String>>(prompt: S, max_tokens: u32) -> Self {
        Self {
            messages: vec![SamplingMessage::user(prompt)],
            max_tokens,
            system_prompt: None,
        }
    }
}

// ============================================================================
// Response Result Types
// ============================================================================

/// Result for initialize request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitializeResult {
    /// Protocol version the host supports
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Host capabilities
    pub capabilities: HostCapabilities,
    /// Host implementation info
    #[serde(rename = "hostInfo")]
    pub host_info: Implementation,
}

impl InitializeResult {
    pub fn new(capabilities: HostCapabilities, host_info: Implementation) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities,
            host_info,
        }
    }
}

/// Result for list tools request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListToolsResult {
    /// Available tools, in registration order
    pub tools: Vec<ToolInfo>,
}

/// Result for list resources request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListResourcesResult {
    /// Available static resources, in registration order
    pub resources: Vec<ResourceInfo>,
}

/// Result for list resource templates request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListResourceTemplatesResult {
    /// Available resource templates, in registration order
    #[serde(rename = "resourceTemplates")]
    pub resource_templates: Vec<ResourceTemplateInfo>,
}

/// Result for read resource request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadResourceResult {
    /// Resource contents
    pub contents: Vec<ResourceContents>,
}

/// Result for list prompts request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListPromptsResult {
    /// Available prompts, in registration order
    pub prompts: Vec<PromptInfo>,
}

/// Result for ping request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PingResult {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_initialize_params_serialization() {
        let params = InitializeParams::new(
            DriverCapabilities {
                sampling: Some(true),
            },
            Implementation::new("test-driver", "1.0.0"),
        );

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(value["driverInfo"]["name"], "test-driver");
        assert_eq!(value["capabilities"]["sampling"], true);

        let parsed: InitializeParams = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.capabilities.sampling, Some(true));
    }

    #[test]
    fn test_call_tool_params_serialization() {
        let mut args = HashMap::new();
        args.insert("name".to_string(), json!("Ada"));

        let params = CallToolParams::new("create-user".to_string()).with_arguments(args);
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["name"], "create-user");
        assert_eq!(value["arguments"]["name"], "Ada");
    }

    #[test]
    fn test_create_message_params_from_prompt() {
        let params = CreateMessageParams::from_prompt("Generate a fake user", 512);
        assert_eq!(params.messages.len(), 1);
        assert_eq!(params.max_tokens, 512);

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["maxTokens"], 512);
        assert_eq!(value["messages"][0]["role"], "user");
        assert!(value.get("systemPrompt").is_none());
    }

    #[test]
    fn test_read_resource_params() {
        let params = ReadResourceParams::new("users://3/profile".to_string());
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value, json!({"uri": "users://3/profile"}));
    }
}
