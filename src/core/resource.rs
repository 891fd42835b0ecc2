// ! Resource system for the caplink host
// !
// ! Module provides the abstraction for implementing and registering
// ! resources. Static resources answer a fixed URI; template resources answer
// ! any URI matching their placeholder pattern, with the placeholder values
// ! extracted and passed to the handler.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::core::error::CapResult;
use crate::protocol::types::{ResourceContents, ResourceInfo, ResourceTemplateInfo};

/// Trait for implementing resource read handlers
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Read the content of a resource.
    ///
    /// `uri` is the concrete URI being read; `params` carries the placeholder
    /// values extracted from a template match (empty for static resources).
    ///
    /// Domain-level absence (a known URI shape naming a record that does not
    /// exist) is returned as successful content carrying an error payload,
    /// not as an Err.
    async fn read(
        &self,
        uri: &str,
        params: &HashMap<String, String>,
    ) -> CapResult<Vec<ResourceContents>>;
}

/// A registered static resource
pub struct StaticResource {
    /// Descriptor advertised in resources/list
    pub info: ResourceInfo,
    /// Handler that produces the resource contents
    pub handler: Box<dyn ResourceHandler>,
}

impl StaticResource {
    pub fn new<H>(info: ResourceInfo, handler: H) -> Self
    where
        H: ResourceHandler + 'static,
    {
        Self {
            info,
            handler: Box::new(handler),
        }
    }
}

impl std::fmt::Debug for StaticResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticResource")
            .field("info", &self.info)
            .finish()
    }
}

/// A registered template resource
pub struct TemplateResource {
    /// Descriptor advertised in resources/templates/list
    pub info: ResourceTemplateInfo,
    /// Handler that produces the resource contents
    pub handler: Box<dyn ResourceHandler>,
}

impl TemplateResource {
    pub fn new<H>(info: ResourceTemplateInfo, handler: H) -> Self
    where
        H: ResourceHandler + 'static,
    {
        Self {
            info,
            handler: Box::new(handler),
        }
    }
}

impl std::fmt::Debug for TemplateResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateResource")
            .field("info", &self.info)
            .finish()
    }
}
