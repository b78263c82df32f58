//! Core tool types for the documentation tools.
//!
//! Defines the [`Tool`] trait that all tools implement and [`ToolResult`]
//! for capturing their output.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::DocsError;

/// Result of a tool execution.
///
/// `content` is the text handed back to the client; failures set
/// `is_error` and still carry a readable message.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Whether the tool reported an error to the client.
    pub is_error: bool,
    /// Output text, usually pretty-printed JSON.
    pub content: String,
}

impl ToolResult {
    /// Create a successful tool result.
    pub fn success(content: String) -> Self {
        Self {
            is_error: false,
            content,
        }
    }

    /// Create a failed tool result with an error message.
    pub fn failure(content: String) -> Self {
        Self {
            is_error: true,
            content,
        }
    }

    /// Create a successful tool result holding `value` as pretty JSON.
    pub fn json(value: &Value) -> Self {
        Self::success(render_json(value))
    }

    /// Create a failed tool result holding `value` as pretty JSON.
    pub fn json_failure(value: &Value) -> Self {
        Self::failure(render_json(value))
    }

    /// MCP `tools/call` result payload.
    pub fn into_call_result(self) -> Value {
        serde_json::json!({
            "content": [{ "type": "text", "text": self.content }],
            "isError": self.is_error,
        })
    }
}

fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Core trait for documentation tools.
///
/// All tools must be `Send + Sync`: one registry serves concurrent calls.
/// The trait provides metadata (name, description, schema) and an async
/// execution method that accepts JSON arguments.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool name (e.g. "search_docs", "get_docs_page").
    fn name(&self) -> &str;

    /// Returns a description of what the tool does.
    fn description(&self) -> &str;

    /// Returns the JSON Schema for the tool's arguments.
    fn schema(&self) -> Value;

    /// Execute the tool with the given JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns [`DocsError::Tool`] for invalid arguments. Failures the
    /// client should see as results (an index that failed to load, a
    /// missing page) come back as [`ToolResult::failure`] instead.
    async fn call(&self, args: Value) -> Result<ToolResult, DocsError>;
}

/// Required string argument.
pub(crate) fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str, DocsError> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| DocsError::Tool(format!("missing required argument: {name}")))
}
