//! Core protocol types for the caplink capability exchange
//!
//! This module contains the wire-level types shared by the host and driver:
//! content blocks, capability descriptors, sampling types, and the JSON-RPC
//! envelope structs used for request/response correlation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Core Protocol Constants
// ============================================================================

/// Protocol revision advertised during the initialize handshake
pub const PROTOCOL_VERSION: &str = "2025-06-18";
pub const JSONRPC_VERSION: &str = "2.0";

/// Correlation id for JSON-RPC requests.
///
/// Ids are unique among live pending calls; nothing else about their value is
/// load-bearing, so a monotonic counter is enough.
pub type RequestId = u64;

// ============================================================================
// Implementation Info
// ============================================================================

/// Information about a caplink implementation (host or driver)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Implementation {
    /// Programmatic name of the implementation
    pub name: String,
    /// Version of the implementation
    pub version: String,
    /// Human-readable display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Implementation {
    /// Create a new implementation with name and version
    pub fn new<S: Into<String>>(name: S, version: S) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            title: None,
        }
    }

    /// Create implementation with title
    pub fn with_title<S: Into<String>>(name: S, version: S, title: S) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            title: Some(title.into()),
        }
    }
}

pub type HostInfo = Implementation;
pub type DriverInfo = Implementation;

// ============================================================================
// Capabilities
// ============================================================================

/// Capabilities advertised by the host in the initialize result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HostCapabilities {
    /// Tool support
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<bool>,
    /// Resource support (static and templates)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<bool>,
    /// Prompt support
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<bool>,
}

/// Capabilities advertised by the driver in the initialize params
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DriverCapabilities {
    /// Whether the driver answers sampling/createMessage requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<bool>,
}

// ============================================================================
// Content Types
// ============================================================================

/// The uniform unit of result data crossing the protocol boundary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// Text content
    #[serde(rename = "text")]
    Text {
        /// The text content
        text: String,
    },
    /// Embedded resource content
    #[serde(rename = "resource")]
    Resource {
        /// Resource contents
        resource: ResourceContents,
    },
}

impl ContentBlock {
    /// Create text content
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create embedded resource content
    pub fn embedded_resource(resource: ResourceContents) -> Self {
        Self::Resource { resource }
    }

    /// The text payload if this is a text block
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Content of a resource read
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ResourceContents {
    /// Text resource content
    Text {
        /// URI of the resource
        uri: String,
        /// MIME type
        #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        /// Text content
        text: String,
    },
    /// Binary resource content
    Blob {
        /// URI of the resource
        uri: String,
        /// MIME type
        #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        /// Base64-encoded binary data
        blob: String,
    },
}

impl ResourceContents {
    /// Text resource contents with a MIME type
    pub fn text<S: Into<String>>(uri: S, mime_type: S, text: S) -> Self {
        Self::Text {
            uri: uri.into(),
            mime_type: Some(mime_type.into()),
            text: text.into(),
        }
    }

    /// Get the URI of the resource
    pub fn uri(&self) -> &str {
        match self {
            ResourceContents::Text { uri, .. } => uri,
            ResourceContents::Blob { uri, .. } => uri,
        }
    }
}

// ============================================================================
// Tool Types
// ============================================================================

/// Behavioral hints for a tool.
///
/// All properties are hints; they are not guaranteed to describe tool
/// behavior faithfully and must not drive trust decisions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ToolAnnotations {
    /// A human-readable title for the tool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// If true, the tool does not modify its environment
    #[serde(rename = "readOnlyHint", skip_serializing_if = "Option::is_none")]
    pub read_only_hint: Option<bool>,
    /// If true, the tool may perform destructive updates; if false, additive only
    #[serde(rename = "destructiveHint", skip_serializing_if = "Option::is_none")]
    pub destructive_hint: Option<bool>,
    /// If true, repeated calls with the same arguments have no additional effect
    #[serde(rename = "idempotentHint", skip_serializing_if = "Option::is_none")]
    pub idempotent_hint: Option<bool>,
    /// If true, the tool interacts with an open world of external entities
    #[serde(rename = "openWorldHint", skip_serializing_if = "Option::is_none")]
    pub open_world_hint: Option<bool>,
}

impl ToolAnnotations {
    /// Create new empty tool annotations
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the human-readable title for the tool
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Mark tool as read-only
    pub fn read_only(mut self) -> Self {
        self.read_only_hint = Some(true);
        self
    }

    /// Mark tool as performing only additive updates
    pub fn non_destructive(mut self) -> Self {
        self.destructive_hint = Some(false);
        self
    }

    /// Mark tool as idempotent
    pub fn idempotent(mut self) -> Self {
        self.idempotent_hint = Some(true);
        self
    }

    /// Mark tool as interacting with an open world of external entities
    pub fn open_world(mut self) -> Self {
        self.open_world_hint = Some(true);
        self
    }

    /// Mark tool as interacting with a closed world
    pub fn closed_world(mut self) -> Self {
        self.open_world_hint = Some(false);
        self
    }
}

/// Constraint on a single tool parameter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    /// Expected JSON type of the field
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Description of the field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// JSON type tags accepted in input schemas
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    /// Human-readable name used in validation messages
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }
}

/// Declared input contract of a tool: field name -> constraint, plus the
/// required set. Serializes as a JSON-Schema-shaped object so generation
/// backends can consume it directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputSchema {
    /// Schema type (always "object")
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Field constraints, keyed by parameter name
    pub properties: BTreeMap<String, FieldSpec>,
    /// Names of required parameters
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub required: Vec<String>,
}

impl InputSchema {
    /// An empty object schema accepting no declared parameters
    pub fn new() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    /// Add a required field
    pub fn required_field<S: Into<String>>(
        mut self,
        name: S,
        field_type: FieldType,
        description: S,
    ) -> Self {
        let name = name.into();
        self.properties.insert(
            name.clone(),
            FieldSpec {
                field_type,
                description: Some(description.into()),
            },
        );
        self.required.push(name);
        self
    }

    /// Add an optional field
    pub fn optional_field<S: Into<String>>(
        mut self,
        name: S,
        field_type: FieldType,
        description: S,
    ) -> Self {
        self.properties.insert(
            name.into(),
            FieldSpec {
                field_type,
                description: Some(description.into()),
            },
        );
        self
    }
}

impl Default for InputSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// Tool descriptor advertised in tools/list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolInfo {
    /// Programmatic name of the tool
    pub name: String,
    /// Description of what the tool does
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared input contract
    #[serde(rename = "inputSchema")]
    pub input_schema: InputSchema,
    /// Behavioral hints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,
}

/// Result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallToolResult {
    /// Content returned by the tool
    pub content: Vec<ContentBlock>,
    /// Whether this result represents a failure
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl CallToolResult {
    /// A successful result carrying one text block
    pub fn success<S: Into<String>>(text: S) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: Some(false),
        }
    }

    /// A failure result carrying one text block
    pub fn failure<S: Into<String>>(text: S) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: Some(true),
        }
    }

    /// Whether the result is flagged as a failure
    pub fn is_failure(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}

// ============================================================================
// Resource Types
// ============================================================================

/// Static resource descriptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceInfo {
    /// URI of the resource
    pub uri: String,
    /// Programmatic name of the resource
    pub name: String,
    /// Description of the resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the resource
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Resource template descriptor for parameterized URIs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceTemplateInfo {
    /// URI template with `{name}` placeholders
    #[serde(rename = "uriTemplate")]
    pub uri_template: String,
    /// Programmatic name of the template
    pub name: String,
    /// Description of the template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of resources produced by this template
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

// ============================================================================
// Prompt Types
// ============================================================================

/// Prompt descriptor advertised in prompts/list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptInfo {
    /// Programmatic name of the prompt
    pub name: String,
    /// Description of what the prompt does
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Arguments that the prompt accepts, in declaration order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<PromptArgument>>,
}

/// Argument for a prompt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptArgument {
    /// Programmatic name of the argument
    pub name: String,
    /// Description of the argument
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether this argument is required
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// Message role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Role-tagged message in a prompt rendering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptMessage {
    /// Role of the message
    pub role: Role,
    /// Content of the message
    pub content: ContentBlock,
}

impl PromptMessage {
    /// Create a user message with text content
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self {
            role: Role::User,
            content: ContentBlock::text(text),
        }
    }

    /// Create an assistant message with text content
    pub fn assistant<S: Into<String>>(text: S) -> Self {
        Self {
            role: Role::Assistant,
            content: ContentBlock::text(text),
        }
    }
}

/// Result of rendering a prompt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetPromptResult {
    /// Description of the rendering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Messages generated by the prompt
    pub messages: Vec<PromptMessage>,
}

// ============================================================================
// Sampling Types
// ============================================================================

/// A message in a sampling conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SamplingMessage {
    /// Role of the message
    pub role: Role,
    /// Content of the message (text only on this channel)
    pub content: SamplingContent,
}

impl SamplingMessage {
    /// A user message carrying prompt text
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self {
            role: Role::User,
            content: SamplingContent::text(text),
        }
    }
}

/// Content carried by a sampling message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum SamplingContent {
    /// Text content
    #[serde(rename = "text")]
    Text {
        /// The text content
        text: String,
    },
}

impl SamplingContent {
    /// Create text content for sampling
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::Text { text: text.into() }
    }

    /// The text payload
    pub fn as_text(&self) -> &str {
        match self {
            SamplingContent::Text { text } => text,
        }
    }
}

/// Result of sampling/createMessage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateMessageResult {
    /// Role of the generated message
    pub role: Role,
    /// Content of the generated message
    pub content: SamplingContent,
    /// Model used for generation
    pub model: String,
    /// Stop reason; synthesized when the backend does not report one
    #[serde(rename = "stopReason", skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
}

/// Reasons why sampling stopped
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    EndTurn,
    StopSequence,
    MaxTokens,
    #[serde(untagged)]
    Other(String),
}

// ============================================================================
// JSON-RPC Types
// ============================================================================

/// JSON-RPC request message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID for correlation
    pub id: RequestId,
    /// Method name being called
    pub method: String,
    /// Method parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Build a request with serialized params
    pub fn new<P: Serialize>(
        id: RequestId,
        method: String,
        params: Option<P>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method,
            params: params.map(serde_json::to_value).transpose()?,
        })
    }
}

/// JSON-RPC success response message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID for correlation
    pub id: RequestId,
    /// Result of the method call
    pub result: serde_json::Value,
}

impl JsonRpcResponse {
    /// Build a success response
    pub fn success(id: RequestId, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result,
        }
    }
}

/// JSON-RPC error response message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID for correlation
    pub id: RequestId,
    /// Error information
    pub error: ErrorObject,
}

impl JsonRpcError {
    /// Build an error response
    pub fn new(id: RequestId, code: i32, message: String) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: ErrorObject {
                code,
                message,
                data: None,
            },
        }
    }
}

/// Error object carried by an error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorObject {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// JSON-RPC notification message (no id, no reply expected)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcNotification {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Method name being called
    pub method: String,
    /// Method parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcNotification {
    /// Build a notification with serialized params
    pub fn new<P: Serialize>(
        method: String,
        params: Option<P>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method,
            params: params.map(serde_json::to_value).transpose()?,
        })
    }
}

/// Standard JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    // Application-level codes
    pub const TOOL_NOT_FOUND: i32 = -32000;
    pub const RESOURCE_NOT_FOUND: i32 = -32001;
    pub const PROMPT_NOT_FOUND: i32 = -32002;
    pub const GENERATION_FAILED: i32 = -32010;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_block_text() {
        let block = ContentBlock::text("hello");
        assert_eq!(block.as_text(), Some("hello"));

        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value, json!({"type": "text", "text": "hello"}));
    }

    #[test]
    fn test_input_schema_serialization() {
        let schema = InputSchema::new()
            .required_field("name", FieldType::String, "User name")
            .optional_field("age", FieldType::Integer, "User age");

        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["type"], "object");
        assert_eq!(value["properties"]["name"]["type"], "string");
        assert_eq!(value["properties"]["age"]["type"], "integer");
        assert_eq!(value["required"], json!(["name"]));
    }

    #[test]
    fn test_call_tool_result_helpers() {
        let ok = CallToolResult::success("done");
        assert!(!ok.is_failure());

        let failed = CallToolResult::failure("broken");
        assert!(failed.is_failure());
        assert_eq!(failed.content[0].as_text(), Some("broken"));
    }

    #[test]
    fn test_stop_reason_wire_names() {
        assert_eq!(
            serde_json::to_value(StopReason::EndTurn).unwrap(),
            json!("endTurn")
        );
        assert_eq!(
            serde_json::to_value(StopReason::MaxTokens).unwrap(),
            json!("maxTokens")
        );
        let other: StopReason = serde_json::from_value(json!("contentFilter")).unwrap();
        assert_eq!(other, StopReason::Other("contentFilter".to_string()));
    }

    #[test]
    fn test_jsonrpc_request_roundtrip() {
        let request =
            JsonRpcRequest::new(7, "tools/list".to_string(), Some(json!({"cursor": null})))
                .unwrap();
        let line = serde_json::to_string(&request).unwrap();
        let parsed: JsonRpcRequest = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.id, 7);
        assert_eq!(parsed.method, "tools/list");
    }

    #[test]
    fn test_create_message_result_wire_shape() {
        let result = CreateMessageResult {
            role: Role::Assistant,
            content: SamplingContent::text("generated"),
            model: "stub-model".to_string(),
            stop_reason: Some(StopReason::EndTurn),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["content"]["type"], "text");
        assert_eq!(value["stopReason"], "endTurn");
    }
}
