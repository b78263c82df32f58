//! MCP tools exposed per documentation site.
//!
//! Each configured site `k` gets `search_k` and `get_k_page`; a single
//! `index_status` tool reports every site's load state.

pub mod get_page;
pub mod registry;
pub mod search;
pub mod status;
pub mod types;

pub use registry::ToolRegistry;
pub use types::{Tool, ToolResult};
