//! Documentation search tool: one instance per configured site.

use std::sync::Arc;

use async_trait::async_trait;
use lunr_search::{IndexCache, IndexOutcome};
use serde_json::{Value, json};

use crate::error::DocsError;

use super::types::{Tool, ToolResult, required_str};

/// Largest `limit` a caller may ask for.
pub const MAX_LIMIT: u64 = 100;

/// Tool that searches one site's documentation index.
///
/// # Arguments (JSON)
///
/// - `query` (string, required): free-text query
/// - `limit` (integer, optional): maximum results (default from config)
pub struct SearchDocsTool {
    site: String,
    name: String,
    description: String,
    cache: Arc<IndexCache>,
}

impl SearchDocsTool {
    /// Create the `search_<site>` tool.
    pub fn new(site: &str, cache: Arc<IndexCache>) -> Self {
        Self {
            site: site.to_owned(),
            name: format!("search_{site}"),
            description: format!(
                "Search {site} documentation. Returns matching pages with title, url and \
                 breadcrumb path, best matches first. Always include the url in your response \
                 to users."
            ),
            cache,
        }
    }
}

/// Loading answer shared by the site tools.
pub(crate) fn loading_result(site: &str) -> ToolResult {
    ToolResult::json(&json!({
        "status": "loading",
        "site": site,
        "message": format!("Search index for {site} is still loading. Please retry in a moment."),
    }))
}

fn parse_limit(args: &Value) -> Result<Option<usize>, DocsError> {
    match args.get("limit") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => match value.as_u64() {
            Some(n) if (1..=MAX_LIMIT).contains(&n) => Ok(Some(n as usize)),
            _ => Err(DocsError::Tool(format!(
                "limit must be an integer between 1 and {MAX_LIMIT}"
            ))),
        },
    }
}

#[async_trait]
impl Tool for SearchDocsTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query string"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_LIMIT,
                    "description": format!(
                        "Maximum number of results to return (default {})",
                        self.cache.default_max_results()
                    )
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, args: Value) -> Result<ToolResult, DocsError> {
        let query = required_str(&args, "query")?;
        let limit = parse_limit(&args)?;

        tracing::debug!(site = %self.site, limit, "search requested");

        Ok(match self.cache.search(&self.site, query, limit).await? {
            IndexOutcome::Ready(hits) => ToolResult::json(&json!({
                "site": self.site,
                "query": query,
                "count": hits.len(),
                "results": hits.iter().map(|hit| json!({
                    "title": hit.title,
                    "url": hit.url,
                    "location": hit.location,
                    "path": hit.breadcrumb,
                    "score": hit.score,
                    "tier": hit.tier,
                    "matched_fields": hit.matched_fields,
                })).collect::<Vec<_>>(),
            })),
            IndexOutcome::Loading => loading_result(&self.site),
            IndexOutcome::Failed(error) => ToolResult::json_failure(&json!({
                "status": "error",
                "site": self.site,
                "error": error.to_string(),
            })),
        })
    }
}
