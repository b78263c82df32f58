//! Error types for the lunr-search crate.
//!
//! All errors use stable string messages suitable for display to users and
//! programmatic handling. Errors are `Clone` because a single failed index
//! load is observed by every query that was waiting on it.

/// Errors that can occur while loading or searching documentation indexes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The HTTP layer failed, returned a non-2xx status, or the body was not JSON.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The index JSON was well-formed but not a recognisable index artifact,
    /// or a page could not be rendered.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid site or search configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The requested site key is not configured.
    #[error("unknown site: {0}")]
    UnknownSite(String),

    /// No document in the site's index has the requested location.
    #[error("page not found: {0}")]
    PageNotFound(String),
}

/// Convenience type alias for lunr-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
