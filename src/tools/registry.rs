//! Tool registry for the MCP surface.
//!
//! The [`ToolRegistry`] holds registered tools, provides lookup by name and
//! exports their schemas for `tools/list`.

use std::collections::BTreeMap;
use std::sync::Arc;

use lunr_search::{IndexCache, PageRetriever};

use super::get_page::GetPageTool;
use super::search::SearchDocsTool;
use super::status::IndexStatusTool;
use super::types::Tool;

/// Registry of available tools, listed in name order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `search_<key>` and `get_<key>_page` for every site in
    /// `cache`, plus `index_status`.
    pub fn for_sites(cache: Arc<IndexCache>, retriever: PageRetriever) -> Self {
        let mut registry = Self::new();
        for key in cache.site_keys() {
            registry.register(Arc::new(SearchDocsTool::new(key, Arc::clone(&cache))));
            registry.register(Arc::new(GetPageTool::new(
                key,
                Arc::clone(&cache),
                retriever.clone(),
            )));
        }
        registry.register(Arc::new(IndexStatusTool::new(Arc::clone(&cache))));
        registry
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Names of all registered tools, sorted.
    pub fn list_available(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tool is registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Export MCP tool descriptors: `name`, `description` and `inputSchema`.
    pub fn schemas_for_api(&self) -> Vec<serde_json::Value> {
        self.tools
            .values()
            .map(|t| {
                serde_json::json!({
                    "name": t.name(),
                    "description": t.description(),
                    "inputSchema": t.schema(),
                })
            })
            .collect()
    }
}
