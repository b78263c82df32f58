//! lunr-docs: an MCP server for published Lunr.js documentation indexes.
//!
//! Each configured site contributes two tools over stdio JSON-RPC:
//! `search_<site>` ranks pages from the site's prebuilt search index, and
//! `get_<site>_page` fetches a page from that site and renders it as
//! markdown. `index_status` reports how far each index has loaded.
//!
//! # Architecture
//!
//! - **config**: TOML file, `LUNR_SITES` and `--site` flags merged into
//!   a site list plus [`lunr_search::SearchConfig`]
//! - **tools**: the MCP tools, backed by a shared
//!   [`lunr_search::IndexCache`]
//! - **host**: JSON-RPC contract, method routing and the stdin/stdout loop
//!
//! Indexes load lazily on the first query for a site. A query that arrives
//! while the index is still downloading waits a bounded time, then answers
//! with a loading status instead of blocking the client.

pub mod config;
pub mod error;
pub mod host;
pub mod tools;

pub use config::DocsConfig;
pub use error::{DocsError, Result};
pub use host::McpHandler;
pub use tools::ToolRegistry;
