// ! Error types for the caplink crate
// !
// ! Module defines all error types that can occur on either side of the
// ! capability-exchange channel, providing structured error handling with
// ! enough context for logging and user-facing rendering.

use thiserror::Error;

/// The main error type for caplink
#[derive(Error, Debug, Clone)]
pub enum CapError {
    /// Transport-related errors (connection, I/O, channel teardown)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Protocol-level errors (invalid messages, unexpected responses)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid URI format or content
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// A resource URI did not line up with the template it resolved against
    #[error("Unresolved template: {0}")]
    UnresolvedTemplate(String),

    /// Registration-time identifier collision; fatal at startup
    #[error("Duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    /// Requested tool was not found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Requested resource was not found
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Requested prompt was not found
    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    /// Method not found (JSON-RPC error)
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// The sampling backend could not produce text
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// The external user store could not be read or written
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A pending call exceeded its configured bound
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// An error response received from the remote peer
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i32,
        /// Error message from the peer
        message: String,
    },

    /// I/O errors from the standard library
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal errors that shouldn't normally occur
    #[error("Internal error: {0}")]
    Internal(String),
}

// Manual From implementations for types that don't implement Clone
impl From<serde_json::Error> for CapError {
    fn from(err: serde_json::Error) -> Self {
        CapError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for CapError {
    fn from(err: std::io::Error) -> Self {
        CapError::Io(err.to_string())
    }
}

impl From<url::ParseError> for CapError {
    fn from(err: url::ParseError) -> Self {
        CapError::InvalidUri(err.to_string())
    }
}

impl From<reqwest::Error> for CapError {
    fn from(err: reqwest::Error) -> Self {
        CapError::GenerationFailed(err.to_string())
    }
}

/// Result type alias for caplink operations
pub type CapResult<T> = Result<T, CapError>;

impl CapError {
    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new generation error
    pub fn generation<S: Into<String>>(message: S) -> Self {
        Self::GenerationFailed(message.into())
    }

    /// Create a new persistence error
    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new IO error from std::io::Error
    pub fn io(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }

    /// Create a new serialization error from serde_json::Error
    pub fn serialization(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }

    /// Check if this error is recoverable from the caller's point of view
    pub fn is_recoverable(&self) -> bool {
        match self {
            CapError::Timeout(_) => true,
            CapError::Io(_) => true,
            CapError::Persistence(_) => true,
            CapError::GenerationFailed(_) => true,
            CapError::Transport(_) => false,
            CapError::Protocol(_) => false,
            CapError::Serialization(_) => false,
            CapError::InvalidUri(_) => false,
            CapError::UnresolvedTemplate(_) => false,
            CapError::DuplicateIdentifier(_) => false,
            CapError::ToolNotFound(_) => false,
            CapError::ResourceNotFound(_) => false,
            CapError::PromptNotFound(_) => false,
            CapError::MethodNotFound(_) => false,
            CapError::Validation(_) => false,
            CapError::Rpc { .. } => false,
            CapError::Internal(_) => false,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            CapError::Transport(_) => "transport",
            CapError::Protocol(_) => "protocol",
            CapError::Serialization(_) => "serialization",
            CapError::InvalidUri(_) => "validation",
            CapError::UnresolvedTemplate(_) => "validation",
            CapError::DuplicateIdentifier(_) => "registration",
            CapError::ToolNotFound(_) => "not_found",
            CapError::ResourceNotFound(_) => "not_found",
            CapError::PromptNotFound(_) => "not_found",
            CapError::MethodNotFound(_) => "not_found",
            CapError::Validation(_) => "validation",
            CapError::GenerationFailed(_) => "generation",
            CapError::Persistence(_) => "persistence",
            CapError::Timeout(_) => "timeout",
            CapError::Rpc { .. } => "rpc",
            CapError::Io(_) => "io",
            CapError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = CapError::transport("Connection failed");
        assert_eq!(error.to_string(), "Transport error: Connection failed");
        assert_eq!(error.category(), "transport");
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_error_recovery() {
        assert!(CapError::timeout("request timeout").is_recoverable());
        assert!(CapError::persistence("disk full").is_recoverable());
        assert!(!CapError::validation("invalid input").is_recoverable());
        assert!(!CapError::DuplicateIdentifier("echo".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(CapError::protocol("bad message").category(), "protocol");
        assert_eq!(
            CapError::ToolNotFound("missing".to_string()).category(),
            "not_found"
        );
        assert_eq!(
            CapError::Rpc {
                code: -32601,
                message: "nope".to_string()
            }
            .category(),
            "rpc"
        );
    }

    #[test]
    fn test_rpc_error_display() {
        let error = CapError::Rpc {
            code: -32602,
            message: "Invalid params".to_string(),
        };
        assert_eq!(error.to_string(), "RPC error -32602: Invalid params");
    }
}
