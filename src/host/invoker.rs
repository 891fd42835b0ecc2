// ! Capability invoker
// !
// ! Module executes registered capabilities against caller-supplied
// ! arguments. Tool invocation never raises past this boundary: validation
// ! failures, handler errors, and persistence failures all come back as
// ! failure content the driver can render. Unknown identifiers stay
// ! registry-level errors so the two kinds of "not found" remain distinct.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::core::error::CapResult;
use crate::core::registry::{Registry, ResourceMatch};
use crate::protocol::messages::ReadResourceResult;
use crate::protocol::types::{CallToolResult, GetPromptResult};

/// Executes capabilities out of a shared registry
pub struct Invoker {
    registry: Arc<Registry>,
}

impl Invoker {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// The registry this invoker executes against
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Call a tool by name.
    ///
    /// Err means the tool identifier did not resolve; every execution-side
    /// failure is inside the Ok as a failure-flagged result.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<HashMap<String, Value>>,
    ) -> CapResult<CallToolResult> {
        let tool = self.registry.resolve_tool(name)?;
        let result = tool.invoke(arguments.unwrap_or_default()).await;
        if result.is_failure() {
            tracing::debug!(tool = %name, "tool invocation reported failure");
        }
        Ok(result)
    }

    /// Read a resource by concrete URI, extracting template placeholders
    /// when a template matches.
    ///
    /// Domain-level absence (a resolvable URI naming a missing record) is a
    /// successful read whose payload carries the not-found signal; only an
    /// unresolvable URI is an Err.
    pub async fn read_resource(&self, uri: &str) -> CapResult<ReadResourceResult> {
        let contents = match self.registry.resolve_resource(uri)? {
            ResourceMatch::Static(resource) => {
                resource.handler.read(uri, &HashMap::new()).await?
            }
            ResourceMatch::Template { resource, params } => {
                resource.handler.read(uri, &params).await?
            }
        };
        Ok(ReadResourceResult { contents })
    }

    /// Render a prompt by name with the given argument values
    pub async fn render_prompt(
        &self,
        name: &str,
        arguments: Option<HashMap<String, String>>,
    ) -> CapResult<GetPromptResult> {
        let prompt = self.registry.resolve_prompt(name)?;
        prompt.render(arguments.unwrap_or_default()).await
    }
}
