//! Shared HTTP client for index artifacts and documentation pages.
//!
//! Provides a configured [`reqwest::Client`] with the request timeout from
//! [`SearchConfig`], compressed transfer support and an identifying
//! User-Agent.

use crate::config::SearchConfig;
use crate::error::SearchError;

/// User-Agent sent when the configuration does not override it.
pub const DEFAULT_USER_AGENT: &str = concat!("lunr-search/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] for fetching index artifacts and pages.
///
/// The client has:
/// - Timeout from config (independent of the query-facing load wait)
/// - Custom or default User-Agent
/// - Brotli and gzip decompression
/// - Up to 10 redirects
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the client cannot be constructed.
pub fn build_client(config: &SearchConfig) -> Result<reqwest::Client, SearchError> {
    let ua = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

    reqwest::Client::builder()
        .timeout(config.fetch_timeout())
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| SearchError::Config(format!("failed to build HTTP client: {e}")))
}
