//! Page retrieval tool: fetches a page found by search and returns it as
//! markdown.

use std::sync::Arc;

use async_trait::async_trait;
use lunr_search::{IndexCache, IndexOutcome, PageRetriever, SearchError};
use serde_json::{Value, json};

use crate::error::DocsError;

use super::search::loading_result;
use super::types::{Tool, ToolResult, required_str};

/// Tool that returns the full content of one documentation page.
///
/// # Arguments (JSON)
///
/// - `location` (string, required): page path from search results
///   (e.g. `/docs/get-started/`); absolute URLs under the site also work
pub struct GetPageTool {
    site: String,
    name: String,
    description: String,
    cache: Arc<IndexCache>,
    retriever: PageRetriever,
}

impl GetPageTool {
    /// Create the `get_<site>_page` tool.
    pub fn new(site: &str, cache: Arc<IndexCache>, retriever: PageRetriever) -> Self {
        Self {
            site: site.to_owned(),
            name: format!("get_{site}_page"),
            description: format!(
                "Get the full content of a specific {site} documentation page as markdown. \
                 Pass the location from search results. Always include the url in your \
                 response to users."
            ),
            cache,
            retriever,
        }
    }
}

#[async_trait]
impl Tool for GetPageTool {
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
                "location": {
                    "type": "string",
                    "description": "Page URL path from search results (e.g. \"/docs/get-started/\")"
                }
            },
            "required": ["location"]
        })
    }

    async fn call(&self, args: Value) -> Result<ToolResult, DocsError> {
        let location = required_str(&args, "location")?;
        if location.trim().is_empty() {
            return Err(DocsError::Tool("location must not be empty".into()));
        }

        let page = match self.cache.resolve(&self.site, location).await? {
            IndexOutcome::Ready(page) => page,
            IndexOutcome::Loading => return Ok(loading_result(&self.site)),
            IndexOutcome::Failed(SearchError::PageNotFound(_)) => {
                return Ok(ToolResult::json_failure(&json!({
                    "status": "not_found",
                    "site": self.site,
                    "error": format!("Page not found: {location}"),
                })));
            }
            IndexOutcome::Failed(error) => {
                return Ok(ToolResult::json_failure(&json!({
                    "status": "error",
                    "site": self.site,
                    "error": error.to_string(),
                })));
            }
        };

        let content = self.retriever.retrieve(&page).await;
        Ok(ToolResult::json(&json!({
            "title": page.title,
            "url": page.url,
            "path": page.breadcrumb,
            "word_count": content.word_count,
            "content": content.text,
        })))
    }
}
