//! MCP request handler: routes JSON-RPC methods to the tool registry.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::DocsError;
use crate::host::contract::{Method, PROTOCOL_VERSION, Request, Response, RpcError, codes};
use crate::tools::ToolRegistry;

/// Server name reported in `initialize`.
pub const SERVER_NAME: &str = "lunr-docs";

/// Parameters of `tools/call`.
#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Handles one request at a time; safe to share across concurrent tasks.
pub struct McpHandler {
    registry: ToolRegistry,
    version: String,
}

impl McpHandler {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }

    /// The registry backing `tools/list` and `tools/call`.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle a request. Notifications yield `None`.
    pub async fn handle(&self, request: Request) -> Option<Response> {
        if let Err(error) = request.validate() {
            return request
                .id
                .map(|id| Response::error(id, error));
        }

        let method = Method::parse(&request.method);
        let Some(id) = request.id else {
            match method {
                Some(Method::Initialized) => info!("client initialized"),
                Some(Method::Cancelled) => debug!("client cancelled a request"),
                _ => debug!(method = %request.method, "ignoring notification"),
            }
            return None;
        };

        let outcome = match method {
            Some(Method::Initialize) => Ok(self.initialize(&request.params)),
            Some(Method::Ping) => Ok(json!({})),
            Some(Method::ToolsList) => Ok(json!({ "tools": self.registry.schemas_for_api() })),
            Some(Method::ToolsCall) => self.call_tool(request.params).await,
            Some(Method::Initialized | Method::Cancelled) | None => {
                Err(RpcError::method_not_found(&request.method))
            }
        };

        Some(match outcome {
            Ok(result) => Response::ok(id, result),
            Err(error) => Response::error(id, error),
        })
    }

    fn initialize(&self, params: &Value) -> Value {
        let client = params
            .pointer("/clientInfo/name")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(client, tools = self.registry.len(), "initialize");
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": SERVER_NAME, "version": self.version },
        })
    }

    async fn call_tool(&self, params: Value) -> Result<Value, RpcError> {
        let params: CallParams = serde_json::from_value(params)
            .map_err(|e| RpcError::invalid_params(format!("invalid tools/call params: {e}")))?;
        let tool = self
            .registry
            .get(&params.name)
            .ok_or_else(|| RpcError::invalid_params(format!("unknown tool: {}", params.name)))?;

        let arguments = match params.arguments {
            Value::Null => json!({}),
            other => other,
        };
        debug!(tool = %params.name, "tools/call");

        match tool.call(arguments).await {
            Ok(result) => Ok(result.into_call_result()),
            Err(DocsError::Tool(message)) => Err(RpcError::invalid_params(message)),
            Err(error) => {
                warn!(tool = %params.name, error = %error, "tool call failed");
                Err(RpcError::new(codes::INTERNAL_ERROR, error.to_string()))
            }
        }
    }
}
