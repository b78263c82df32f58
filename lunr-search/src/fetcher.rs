//! Index fetching: retrieves raw index artifacts over HTTP.
//!
//! [`IndexFetcher`] is the seam between the load coordinator and the
//! network. The fetcher never retries and never touches the cache; a failed
//! fetch is reported to the coordinator, which marks the site failed so the
//! next query tries again.

use std::future::Future;
use std::time::Instant;

use serde_json::Value;
use url::Url;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;

/// A source of raw index artifacts.
///
/// All implementations must be `Send + Sync`: one fetcher is shared by every
/// background load.
pub trait IndexFetcher: Send + Sync + 'static {
    /// Fetch one artifact and decode it as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Fetch`] when the request fails, the status is
    /// not 2xx, or the body is not valid JSON.
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Value, SearchError>> + Send;

    /// Fetch every artifact of a site concurrently, preserving URL order.
    ///
    /// Fails with the first error; nothing is returned for a partial fetch.
    fn fetch_all(
        &self,
        urls: &[Url],
    ) -> impl Future<Output = Result<Vec<Value>, SearchError>> + Send {
        futures::future::try_join_all(urls.iter().map(|url| self.fetch(url)))
    }
}

/// [`IndexFetcher`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpIndexFetcher {
    client: reqwest::Client,
}

impl HttpIndexFetcher {
    /// Build a fetcher with a client configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(Self::with_client(http::build_client(config)?))
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl IndexFetcher for HttpIndexFetcher {
    async fn fetch(&self, url: &Url) -> Result<Value, SearchError> {
        let started = Instant::now();
        tracing::debug!(%url, "fetching index artifact");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SearchError::Fetch(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "index artifact request rejected");
            return Err(SearchError::Fetch(format!(
                "HTTP {} from {url}",
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SearchError::Fetch(format!("reading {url} failed: {e}")))?;
        let bytes = body.len();

        // Large artifacts take a while to decode; keep that off the async workers.
        let value = tokio::task::spawn_blocking(move || serde_json::from_slice::<Value>(&body))
            .await
            .map_err(|e| SearchError::Fetch(format!("decoding {url} was aborted: {e}")))?
            .map_err(|e| SearchError::Fetch(format!("{url} is not valid JSON: {e}")))?;

        tracing::info!(
            %url,
            status = status.as_u16(),
            bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "index artifact fetched"
        );
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes the URL path back as JSON; fails for paths containing "bad".
    struct EchoFetcher {
        calls: AtomicUsize,
    }

    impl IndexFetcher for EchoFetcher {
        async fn fetch(&self, url: &Url) -> Result<Value, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.path().contains("bad") {
                return Err(SearchError::Fetch(format!("HTTP 500 from {url}")));
            }
            Ok(json!({ "path": url.path() }))
        }
    }

    fn url(raw: &str) -> Url {
        Url::parse(raw).expect("valid url in test")
    }

    #[test]
    fn fetchers_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpIndexFetcher>();
        assert_send_sync::<EchoFetcher>();
    }

    #[test]
    fn http_fetcher_builds_from_default_config() {
        assert!(HttpIndexFetcher::new(&SearchConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn fetch_all_preserves_order() {
        let fetcher = EchoFetcher {
            calls: AtomicUsize::new(0),
        };
        let values = fetcher
            .fetch_all(&[url("https://a.test/one.json"), url("https://a.test/two.json")])
            .await
            .expect("both fetched");
        assert_eq!(values[0]["path"], "/one.json");
        assert_eq!(values[1]["path"], "/two.json");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fetch_all_fails_when_any_artifact_fails() {
        let fetcher = EchoFetcher {
            calls: AtomicUsize::new(0),
        };
        let err = fetcher
            .fetch_all(&[url("https://a.test/one.json"), url("https://a.test/bad.json")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }
}
