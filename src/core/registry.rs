//! Capability registry for the caplink host
//!
//! The registry is the host-side catalog of tools, resources, resource
//! templates, and prompts. It is a plain owned value constructed at startup
//! and handed to whatever serves requests; there is no ambient global state.
//!
//! Identifiers are unique within their variant's namespace and entries are
//! immutable once registered. Listing returns entries in registration order.

use std::collections::HashMap;

use crate::core::error::{CapError, CapResult};
use crate::core::prompt::Prompt;
use crate::core::resource::{StaticResource, TemplateResource};
use crate::core::tool::Tool;
use crate::protocol::types::{PromptInfo, ResourceInfo, ResourceTemplateInfo, ToolInfo};
use crate::utils::uri::{extract_template_params, template_covers, validate_uri};

/// Result of resolving a concrete URI against the registered resources
#[derive(Debug)]
pub enum ResourceMatch<'a> {
    /// The URI named a static resource exactly
    Static(&'a StaticResource),
    /// The URI matched a template; placeholder values are extracted
    Template {
        resource: &'a TemplateResource,
        params: HashMap<String, String>,
    },
}

/// The host-side capability catalog
#[derive(Debug, Default)]
pub struct Registry {
    tools: Vec<Tool>,
    resources: Vec<StaticResource>,
    templates: Vec<TemplateResource>,
    prompts: Vec<Prompt>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a tool. Fails with `DuplicateIdentifier` if a tool with the
    /// same name already exists; the existing entry is left unchanged.
    pub fn register_tool(&mut self, tool: Tool) -> CapResult<()> {
        if self.tools.iter().any(|t| t.info.name == tool.info.name) {
            return Err(CapError::DuplicateIdentifier(format!(
                "tool '{}'",
                tool.info.name
            )));
        }
        tracing::debug!(tool = %tool.info.name, "registered tool");
        self.tools.push(tool);
        Ok(())
    }

    /// Register a static resource, keyed by its URI
    pub fn register_resource(&mut self, resource: StaticResource) -> CapResult<()> {
        validate_uri(&resource.info.uri)?;
        if self.resources.iter().any(|r| r.info.uri == resource.info.uri) {
            return Err(CapError::DuplicateIdentifier(format!(
                "resource '{}'",
                resource.info.uri
            )));
        }
        tracing::debug!(uri = %resource.info.uri, "registered resource");
        self.resources.push(resource);
        Ok(())
    }

    /// Register a template resource, keyed by its URI template
    pub fn register_template(&mut self, template: TemplateResource) -> CapResult<()> {
        validate_uri(&template.info.uri_template)?;
        if self
            .templates
            .iter()
            .any(|t| t.info.uri_template == template.info.uri_template)
        {
            return Err(CapError::DuplicateIdentifier(format!(
                "resource template '{}'",
                template.info.uri_template
            )));
        }
        tracing::debug!(template = %template.info.uri_template, "registered resource template");
        self.templates.push(template);
        Ok(())
    }

    /// Register a prompt, keyed by its name
    pub fn register_prompt(&mut self, prompt: Prompt) -> CapResult<()> {
        if self.prompts.iter().any(|p| p.info.name == prompt.info.name) {
            return Err(CapError::DuplicateIdentifier(format!(
                "prompt '{}'",
                prompt.info.name
            )));
        }
        tracing::debug!(prompt = %prompt.info.name, "registered prompt");
        self.prompts.push(prompt);
        Ok(())
    }

    // ========================================================================
    // Discovery (side-effect-free, registration order)
    // ========================================================================

    /// List tool descriptors in registration order
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools.iter().map(|t| t.info.clone()).collect()
    }

    /// List static resource descriptors in registration order
    pub fn list_resources(&self) -> Vec<ResourceInfo> {
        self.resources.iter().map(|r| r.info.clone()).collect()
    }

    /// List resource template descriptors in registration order
    pub fn list_templates(&self) -> Vec<ResourceTemplateInfo> {
        self.templates.iter().map(|t| t.info.clone()).collect()
    }

    /// List prompt descriptors in registration order
    pub fn list_prompts(&self) -> Vec<PromptInfo> {
        self.prompts.iter().map(|p| p.info.clone()).collect()
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolve a tool by name
    pub fn resolve_tool(&self, name: &str) -> CapResult<&Tool> {
        self.tools
            .iter()
            .find(|t| t.info.name == name)
            .ok_or_else(|| CapError::ToolNotFound(name.to_string()))
    }

    /// Resolve a prompt by name
    pub fn resolve_prompt(&self, name: &str) -> CapResult<&Prompt> {
        self.prompts
            .iter()
            .find(|p| p.info.name == name)
            .ok_or_else(|| CapError::PromptNotFound(name.to_string()))
    }

    /// Resolve a concrete URI: static resources first, then templates.
    ///
    /// A template is chosen when its scheme and literal segments line up with
    /// the URI; extraction then fails with `UnresolvedTemplate` if the
    /// segment counts differ. A URI matching nothing is `ResourceNotFound`.
    pub fn resolve_resource<'a>(&'a self, uri: &str) -> CapResult<ResourceMatch<'a>> {
        if let Some(resource) = self.resources.iter().find(|r| r.info.uri == uri) {
            return Ok(ResourceMatch::Static(resource));
        }

        if let Some(template) = self
            .templates
            .iter()
            .find(|t| template_covers(&t.info.uri_template, uri))
        {
            let params = extract_template_params(&template.info.uri_template, uri)?;
            return Ok(ResourceMatch::Template {
                resource: template,
                params,
            });
        }

        Err(CapError::ResourceNotFound(uri.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resource::ResourceHandler;
    use crate::core::tool::ToolHandler;
    use crate::protocol::types::{CallToolResult, InputSchema, ResourceContents};
    use async_trait::async_trait;
    use serde_json::Value;

    struct NoopTool;

    #[async_trait]
    impl ToolHandler for NoopTool {
        async fn call(
            &self,
            _arguments: HashMap<String, Value>,
        ) -> CapResult<CallToolResult> {
            Ok(CallToolResult::success("ok"))
        }
    }

    struct NoopResource;

    #[async_trait]
    impl ResourceHandler for NoopResource {
        async fn read(
            &self,
            uri: &str,
            _params: &HashMap<String, String>,
        ) -> CapResult<Vec<ResourceContents>> {
            Ok(vec![ResourceContents::text(uri, "text/plain", "data")])
        }
    }

    fn tool(name: &str) -> Tool {
        Tool::new(
            ToolInfo {
                name: name.to_string(),
                description: None,
                input_schema: InputSchema::new(),
                annotations: None,
            },
            NoopTool,
        )
    }

    #[test]
    fn test_duplicate_tool_rejected_and_prior_entry_unchanged() {
        let mut registry = Registry::new();
        registry.register_tool(tool("echo")).unwrap();

        let err = registry.register_tool(tool("echo")).unwrap_err();
        assert!(matches!(err, CapError::DuplicateIdentifier(_)));

        let tools = registry.list_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "echo");
    }

    #[test]
    fn test_listing_preserves_registration_order() {
        let mut registry = Registry::new();
        registry.register_tool(tool("zeta")).unwrap();
        registry.register_tool(tool("alpha")).unwrap();
        registry.register_tool(tool("mid")).unwrap();

        let names: Vec<String> = registry.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_repeated_listing_is_identical() {
        let mut registry = Registry::new();
        registry.register_tool(tool("one")).unwrap();
        registry.register_tool(tool("two")).unwrap();

        assert_eq!(registry.list_tools(), registry.list_tools());
    }

    #[test]
    fn test_resolve_unknown_tool() {
        let registry = Registry::new();
        let err = registry.resolve_tool("ghost").unwrap_err();
        assert!(matches!(err, CapError::ToolNotFound(_)));
    }

    #[test]
    fn test_resolve_static_resource_before_template() {
        let mut registry = Registry::new();
        registry
            .register_resource(StaticResource::new(
                ResourceInfo {
                    uri: "users://all".to_string(),
                    name: "all-users".to_string(),
                    description: None,
                    mime_type: Some("application/json".to_string()),
                },
                NoopResource,
            ))
            .unwrap();
        registry
            .register_template(TemplateResource::new(
                ResourceTemplateInfo {
                    uri_template: "users://{id}/profile".to_string(),
                    name: "user-profile".to_string(),
                    description: None,
                    mime_type: Some("application/json".to_string()),
                },
                NoopResource,
            ))
            .unwrap();

        match registry.resolve_resource("users://all").unwrap() {
            ResourceMatch::Static(resource) => assert_eq!(resource.info.name, "all-users"),
            _ => panic!("expected static match"),
        }

        match registry.resolve_resource("users://7/profile").unwrap() {
            ResourceMatch::Template { resource, params } => {
                assert_eq!(resource.info.name, "user-profile");
                assert_eq!(params.get("id"), Some(&"7".to_string()));
            }
            _ => panic!("expected template match"),
        }
    }

    #[test]
    fn test_resolve_unknown_uri() {
        let registry = Registry::new();
        let err = registry.resolve_resource("users://all").unwrap_err();
        assert!(matches!(err, CapError::ResourceNotFound(_)));
    }

    #[test]
    fn test_template_segment_mismatch_surfaces_unresolved() {
        let mut registry = Registry::new();
        registry
            .register_template(TemplateResource::new(
                ResourceTemplateInfo {
                    uri_template: "users://{id}/profile".to_string(),
                    name: "user-profile".to_string(),
                    description: None,
                    mime_type: None,
                },
                NoopResource,
            ))
            .unwrap();

        let err = registry
            .resolve_resource("users://7/profile/extra")
            .unwrap_err();
        assert!(matches!(err, CapError::UnresolvedTemplate(_)));
    }

    #[test]
    fn test_duplicate_template_rejected() {
        let mut registry = Registry::new();
        let info = ResourceTemplateInfo {
            uri_template: "users://{id}/profile".to_string(),
            name: "user-profile".to_string(),
            description: None,
            mime_type: None,
        };
        registry
            .register_template(TemplateResource::new(info.clone(), NoopResource))
            .unwrap();
        let err = registry
            .register_template(TemplateResource::new(info, NoopResource))
            .unwrap_err();
        assert!(matches!(err, CapError::DuplicateIdentifier(_)));
    }
}
