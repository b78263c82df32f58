//! Error types for the lunr-docs server.

use lunr_search::SearchError;

/// Top-level error type for the documentation server.
#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    /// Missing or invalid configuration. Fatal at startup.
    #[error("config error: {0}")]
    Config(String),

    /// Error from the search core.
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// Malformed or unsupported protocol message.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Invalid tool arguments or an unknown tool.
    #[error("tool error: {0}")]
    Tool(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, DocsError>;
