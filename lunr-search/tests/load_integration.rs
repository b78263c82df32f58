//! Integration tests for index loading against a mock HTTP server.
//!
//! These tests exercise the real HTTP fetcher end to end. They verify:
//! - Concurrent cold queries download the index once
//! - HTTP failures mark the site failed and the next query retries
//! - Slow loads answer "loading" and finish in the background
//! - Dual indexes merge into one searchable structure
//! - Page retrieval renders markdown and degrades on HTTP errors

use std::sync::Arc;
use std::time::Duration;

use lunr_search::{
    IndexCache, IndexOutcome, LoadState, MatchTier, PageRetriever, SearchConfig, SearchError,
    SiteConfig,
};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn index_body() -> Value {
    json!({
        "documents": [
            {"i": 1, "t": "Getting Started", "u": "/docs/intro/", "b": ["Docs"], "c": "install the CLI tool"},
            {"i": 2, "t": "Configuration", "u": "/docs/config/#flags", "b": ["Docs"], "c": "configure the tool via CLI flags"}
        ],
        "index": {
            "version": "2.3.9",
            "fields": ["title", "content"],
            "invertedIndex": [
                ["cli", {"_index": 0, "content": {"1": {}, "2": {}}}],
                ["tool", {"_index": 1, "content": {"1": {}, "2": {}}}]
            ]
        }
    })
}

fn config(load_wait_ms: u64) -> SearchConfig {
    SearchConfig {
        load_wait_ms,
        fetch_timeout_seconds: 5,
        ..Default::default()
    }
}

fn docs_site(server: &MockServer) -> SiteConfig {
    let url = format!("{}/search-index.json", server.uri());
    SiteConfig::new("docs", &[url.as_str()], None).expect("valid site")
}

async fn mount_index(server: &MockServer, delay: Duration) {
    Mock::given(method("GET"))
        .and(path("/search-index.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(index_body())
                .set_delay(delay),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn concurrent_cold_queries_download_once() {
    let server = MockServer::start().await;
    mount_index(&server, Duration::from_millis(200)).await;

    let cache = Arc::new(IndexCache::new(vec![docs_site(&server)], &config(5_000)).expect("cache"));
    let queries = (0..6).map(|_| {
        let cache = Arc::clone(&cache);
        async move { cache.search("docs", "CLI tool", None).await }
    });

    for outcome in futures::future::join_all(queries).await {
        let hits = outcome.expect("known site").ready().expect("ready");
        let titles: Vec<&str> = hits.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, ["Getting Started", "Configuration"]);
    }

    // Warm queries never go back to the network.
    for _ in 0..3 {
        assert!(matches!(
            cache.search("docs", "configure the tool", None).await,
            Ok(IndexOutcome::Ready(_))
        ));
    }
}

#[tokio::test]
async fn http_500_marks_site_failed_and_next_query_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search-index.json"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_index(&server, Duration::ZERO).await;

    let cache = IndexCache::new(vec![docs_site(&server)], &config(5_000)).expect("cache");

    match cache.search("docs", "cli", None).await.expect("known site") {
        IndexOutcome::Failed(SearchError::Fetch(msg)) => assert!(msg.contains("HTTP 500")),
        other => panic!("expected fetch failure, got {other:?}"),
    }
    assert_eq!(cache.status()[0].state, LoadState::Failed);

    let hits = cache
        .search("docs", "cli", None)
        .await
        .expect("known site")
        .ready()
        .expect("ready after retry");
    assert_eq!(hits.len(), 2);
    assert_eq!(cache.status()[0].state, LoadState::Ready);
}

#[tokio::test]
async fn slow_index_answers_loading_then_serves_from_cache() {
    let server = MockServer::start().await;
    mount_index(&server, Duration::from_millis(600)).await;

    let cache = IndexCache::new(vec![docs_site(&server)], &config(50)).expect("cache");

    let first = cache.search("docs", "tool", None).await.expect("known site");
    assert!(first.is_loading());
    assert_eq!(cache.status()[0].state, LoadState::Loading);

    tokio::time::sleep(Duration::from_millis(1_500)).await;

    let status = &cache.status()[0];
    assert_eq!(status.state, LoadState::Ready);
    assert_eq!(status.documents, Some(2));

    let hits = cache
        .search("docs", "tool", None)
        .await
        .expect("known site")
        .ready()
        .expect("ready");
    assert_eq!(hits[0].url, format!("{}/docs/intro/", server.uri()));
}

#[tokio::test]
async fn dual_index_merges_richer_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search-index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [
                {"i": 1, "t": "Deploying", "u": "/docs/deploy/", "c": "deploy"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search-index-full.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [
                {"i": 1, "t": "Deploying", "u": "/docs/deploy/", "c": "deploy to kubernetes with the helm chart"},
                {"i": 2, "t": "Upgrading", "u": "/docs/upgrade/", "c": "upgrade the helm release"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let short = format!("{}/search-index.json", server.uri());
    let full = format!("{}/search-index-full.json", server.uri());
    let site = SiteConfig::new("docs", &[short.as_str(), full.as_str()], None).expect("valid site");
    assert!(site.is_dual());
    let cache = IndexCache::new(vec![site], &config(5_000)).expect("cache");

    let hits = cache
        .search("docs", "kubernetes helm", None)
        .await
        .expect("known site")
        .ready()
        .expect("ready");
    let titles: Vec<&str> = hits.iter().map(|h| h.title.as_str()).collect();
    assert_eq!(titles, ["Deploying", "Upgrading"]);
    assert_eq!(hits[0].matched_terms, 2);
    assert_eq!(hits[0].tier, MatchTier::Word);
    assert_eq!(cache.status()[0].documents, Some(2));
}

#[tokio::test]
async fn non_json_body_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search-index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not an index</html>"))
        .mount(&server)
        .await;

    let cache = IndexCache::new(vec![docs_site(&server)], &config(5_000)).expect("cache");
    match cache.search("docs", "cli", None).await.expect("known site") {
        IndexOutcome::Failed(SearchError::Fetch(msg)) => assert!(msg.contains("not valid JSON")),
        other => panic!("expected fetch failure, got {other:?}"),
    }
}

#[tokio::test]
async fn json_without_documents_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search-index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": 1})))
        .mount(&server)
        .await;

    let cache = IndexCache::new(vec![docs_site(&server)], &config(5_000)).expect("cache");
    let outcome = cache.search("docs", "cli", None).await.expect("known site");
    assert!(matches!(outcome, IndexOutcome::Failed(SearchError::Parse(_))));
}

#[tokio::test]
async fn resolved_page_renders_as_markdown_and_is_cached() {
    let server = MockServer::start().await;
    mount_index(&server, Duration::ZERO).await;
    Mock::given(method("GET"))
        .and(path("/docs/config/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><title>Configuration | Docs</title></head><body>
                <nav>Docs Blog</nav>
                <article>
                    <h1>Configuration</h1>
                    <p>Pass <code>--verbose</code> to see more.</p>
                    <ul><li>One flag</li><li>Another flag</li></ul>
                </article>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = config(5_000);
    let cache = IndexCache::new(vec![docs_site(&server)], &cfg).expect("cache");
    let retriever = PageRetriever::new(&cfg).expect("retriever");

    let page = cache
        .resolve("docs", "/docs/config/#flags")
        .await
        .expect("known site")
        .ready()
        .expect("resolved");
    assert_eq!(page.url, format!("{}/docs/config/", server.uri()));

    let content = retriever.retrieve(&page).await;
    assert_eq!(content.title, "Configuration | Docs");
    assert!(content.text.starts_with("# Configuration\n\nPass `--verbose` to see more."));
    assert!(content.text.contains("- One flag\n- Another flag"));
    assert!(!content.text.contains("Blog"));

    // Second retrieval is served from the page cache.
    let again = retriever.retrieve(&page).await;
    assert_eq!(again.text, content.text);
}

#[tokio::test]
async fn missing_page_yields_unavailable_body() {
    let server = MockServer::start().await;
    mount_index(&server, Duration::ZERO).await;
    Mock::given(method("GET"))
        .and(path("/docs/intro/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let cfg = config(5_000);
    let cache = IndexCache::new(vec![docs_site(&server)], &cfg).expect("cache");
    let retriever = PageRetriever::new(&cfg).expect("retriever");

    let page = cache
        .resolve("docs", "/docs/intro/")
        .await
        .expect("known site")
        .ready()
        .expect("resolved");
    let content = retriever.retrieve(&page).await;
    assert!(content.text.starts_with("# Getting Started\n\nContent not available"));
    assert!(content.text.contains("HTTP 404"));

    let err = retriever.fetch(&page.url).await.unwrap_err();
    assert!(matches!(err, SearchError::Fetch(_)));
}
