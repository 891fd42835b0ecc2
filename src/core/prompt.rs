//! Prompt system for the caplink host
//!
//! Prompts are templates that render argument values into an ordered sequence
//! of role-tagged messages for a language model.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::core::error::{CapError, CapResult};
use crate::protocol::types::{GetPromptResult, PromptInfo};

/// Trait for implementing prompt handlers
#[async_trait]
pub trait PromptHandler: Send + Sync {
    /// Render the prompt messages with the given argument values
    async fn render(&self, arguments: HashMap<String, String>) -> CapResult<GetPromptResult>;
}

/// A registered prompt with its descriptor and handler
pub struct Prompt {
    /// Descriptor advertised in prompts/list
    pub info: PromptInfo,
    /// Handler that renders the prompt
    pub handler: Box<dyn PromptHandler>,
}

impl Prompt {
    pub fn new<H>(info: PromptInfo, handler: H) -> Self
    where
        H: PromptHandler + 'static,
    {
        Self {
            info,
            handler: Box::new(handler),
        }
    }

    /// Check required arguments and render the prompt
    pub async fn render(&self, arguments: HashMap<String, String>) -> CapResult<GetPromptResult> {
        if let Some(ref declared) = self.info.arguments {
            for arg in declared {
                if arg.required.unwrap_or(false) && !arguments.contains_key(&arg.name) {
                    return Err(CapError::validation(format!(
                        "Required argument '{}' missing for prompt '{}'",
                        arg.name, self.info.name
                    )));
                }
            }
        }

        self.handler.render(arguments).await
    }
}

impl std::fmt::Debug for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prompt").field("info", &self.info).finish()
    }
}
