//! Index status tool: reports each site's load state without loading.

use std::sync::Arc;

use async_trait::async_trait;
use lunr_search::IndexCache;
use serde_json::{Value, json};

use crate::error::DocsError;

use super::types::{Tool, ToolResult};

/// Tool name.
pub const INDEX_STATUS: &str = "index_status";

/// Tool that lists every configured site with its index load state,
/// document count, load duration and age.
pub struct IndexStatusTool {
    cache: Arc<IndexCache>,
}

impl IndexStatusTool {
    pub fn new(cache: Arc<IndexCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl Tool for IndexStatusTool {
    fn name(&self) -> &str {
        INDEX_STATUS
    }

    fn description(&self) -> &str {
        "Show the load state of every documentation index (empty, loading, ready or failed), \
         with document counts and load times."
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn call(&self, _args: Value) -> Result<ToolResult, DocsError> {
        Ok(ToolResult::json(&json!({ "sites": self.cache.status() })))
    }
}
