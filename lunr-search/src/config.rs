//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls request timeouts, how long a query waits on a
//! cold index load, result limits, and page rendering. The defaults match
//! interactive use against large documentation sites.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Configuration shared by the index cache, fetcher and page retriever.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour. Deserialises from a TOML `[search]`
/// table; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// HTTP request timeout in seconds for index artifacts and pages.
    /// Independent of [`SearchConfig::load_wait_ms`].
    pub fetch_timeout_seconds: u64,
    /// How long a query waits on an in-flight index load before answering
    /// "still loading". The load itself keeps running.
    pub load_wait_ms: u64,
    /// Default maximum number of results when the caller gives no limit.
    pub max_results: usize,
    /// Maximum characters of rendered page text.
    pub page_max_chars: usize,
    /// How long rendered pages are cached in seconds. Set to 0 to disable.
    pub page_cache_ttl_seconds: u64,
    /// Custom User-Agent string. If `None`, identifies as this crate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_seconds: 30,
            load_wait_ms: 1500,
            max_results: 10,
            page_max_chars: 100_000,
            page_cache_ttl_seconds: 600,
            user_agent: None,
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `fetch_timeout_seconds` must be greater than 0
    /// - `max_results` must be greater than 0
    /// - `page_max_chars` must be greater than 0
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.fetch_timeout_seconds == 0 {
            return Err(SearchError::Config(
                "fetch_timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.max_results == 0 {
            return Err(SearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.page_max_chars == 0 {
            return Err(SearchError::Config(
                "page_max_chars must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// The bounded wait applied to queries that hit a loading index.
    pub fn load_wait(&self) -> Duration {
        Duration::from_millis(self.load_wait_ms)
    }

    /// The per-request HTTP timeout.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }
}
