//! MCP host surface: JSON-RPC contract, request routing and the stdio bridge.

pub mod contract;
pub mod handler;
pub mod stdio;

pub use handler::McpHandler;
pub use stdio::{run_stdio_bridge, serve};
