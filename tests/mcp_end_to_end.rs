//! End-to-end tests for the MCP surface against a mock documentation site.
//!
//! A wiremock server publishes a Lunr index and two HTML pages; requests go
//! through [`McpHandler`] or the full newline-delimited stdio loop.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use lunr_docs::host::contract::{Request, codes};
use lunr_docs::host::{McpHandler, serve};
use lunr_docs::tools::ToolRegistry;
use lunr_search::{IndexCache, PageRetriever, SearchConfig, SiteConfig};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn index_body() -> Value {
    json!({
        "documents": [
            {"i": 1, "t": "Getting Started", "u": "/docs/intro/", "b": ["Docs"], "c": "install the CLI tool"},
            {"i": 2, "t": "Configuration", "u": "/docs/config/#flags", "b": ["Docs", "Reference"], "c": "configure the tool via CLI flags"}
        ],
        "index": {
            "version": "2.3.9",
            "fields": ["title", "content"],
            "invertedIndex": []
        }
    })
}

async fn docs_server(index_delay: Duration) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search-index.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(index_body())
                .set_delay(index_delay),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/intro/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><nav>menu</nav><main><h1>Getting Started</h1>\
             <p>Run <code>docs install</code> first.</p></main></body></html>",
        ))
        .mount(&server)
        .await;
    server
}

fn handler(server: &MockServer, load_wait_ms: u64) -> McpHandler {
    let config = SearchConfig {
        load_wait_ms,
        fetch_timeout_seconds: 5,
        ..Default::default()
    };
    let url = format!("{}/search-index.json", server.uri());
    let site = SiteConfig::new("docs", &[url.as_str()], None).expect("valid site");
    let cache = Arc::new(IndexCache::new(vec![site], &config).expect("cache"));
    let retriever = PageRetriever::new(&config).expect("retriever");
    McpHandler::new(ToolRegistry::for_sites(cache, retriever))
}

/// Call a tool and return its parsed JSON payload and `isError` flag.
async fn call_tool(handler: &McpHandler, name: &str, arguments: Value) -> (Value, bool) {
    let response = handler
        .handle(Request::new(
            1,
            "tools/call",
            json!({"name": name, "arguments": arguments}),
        ))
        .await
        .expect("reply");
    let result = response.result.expect("tool result");
    let text = result["content"][0]["text"].as_str().expect("text content");
    (
        serde_json::from_str(text).expect("json payload"),
        result["isError"].as_bool().expect("isError flag"),
    )
}

#[tokio::test]
async fn tools_list_names_every_site_tool() {
    let server = MockServer::start().await;
    let handler = handler(&server, 1_500);
    let response = handler
        .handle(Request::new(1, "tools/list", Value::Null))
        .await
        .expect("reply");
    let names: Vec<String> = response.result.expect("result")["tools"]
        .as_array()
        .expect("tools array")
        .iter()
        .map(|t| t["name"].as_str().unwrap_or_default().to_owned())
        .collect();
    assert_eq!(names, ["get_docs_page", "index_status", "search_docs"]);
}

#[tokio::test]
async fn search_then_fetch_page() {
    let server = docs_server(Duration::ZERO).await;
    let handler = handler(&server, 5_000);

    let (payload, is_error) = call_tool(&handler, "search_docs", json!({"query": "CLI tool"})).await;
    assert!(!is_error);
    assert_eq!(payload["count"], 2);
    assert_eq!(payload["results"][0]["title"], "Getting Started");
    assert_eq!(payload["results"][1]["title"], "Configuration");
    assert_eq!(
        payload["results"][0]["url"],
        format!("{}/docs/intro/", server.uri())
    );

    let (page, is_error) = call_tool(&handler, "get_docs_page", json!({"location": "/docs/intro/"})).await;
    assert!(!is_error);
    assert_eq!(page["title"], "Getting Started");
    let content = page["content"].as_str().expect("content");
    assert!(content.contains("# Getting Started"));
    assert!(content.contains("`docs install`"));
    assert!(!content.contains("menu"));

    let (status, _) = call_tool(&handler, "index_status", json!({})).await;
    assert_eq!(status["sites"][0]["state"], "ready");
    assert_eq!(status["sites"][0]["documents"], 2);
}

#[tokio::test]
async fn search_limit_caps_results() {
    let server = docs_server(Duration::ZERO).await;
    let handler = handler(&server, 5_000);
    let (payload, _) = call_tool(&handler, "search_docs", json!({"query": "tool", "limit": 1})).await;
    assert_eq!(payload["count"], 1);
}

#[tokio::test]
async fn unknown_page_is_not_found() {
    let server = docs_server(Duration::ZERO).await;
    let handler = handler(&server, 5_000);
    let (payload, is_error) =
        call_tool(&handler, "get_docs_page", json!({"location": "/docs/missing/"})).await;
    assert!(is_error);
    assert_eq!(payload["status"], "not_found");
}

#[tokio::test]
async fn slow_index_reports_loading_then_answers() {
    let server = docs_server(Duration::from_millis(500)).await;
    let handler = handler(&server, 50);

    let (payload, is_error) = call_tool(&handler, "search_docs", json!({"query": "CLI"})).await;
    assert!(!is_error);
    assert_eq!(payload["status"], "loading");

    let (status, _) = call_tool(&handler, "index_status", json!({})).await;
    assert_eq!(status["sites"][0]["state"], "loading");

    tokio::time::sleep(Duration::from_millis(1_200)).await;
    let (payload, _) = call_tool(&handler, "search_docs", json!({"query": "CLI"})).await;
    assert_eq!(payload["count"], 2);
}

#[tokio::test]
async fn missing_query_is_invalid_params() {
    let server = MockServer::start().await;
    let handler = handler(&server, 1_500);
    let response = handler
        .handle(Request::new(
            7,
            "tools/call",
            json!({"name": "search_docs", "arguments": {}}),
        ))
        .await
        .expect("reply");
    assert_eq!(response.error.expect("error").code, codes::INVALID_PARAMS);
}

#[tokio::test]
async fn stdio_loop_serves_a_session() {
    let server = docs_server(Duration::ZERO).await;
    let handler = Arc::new(handler(&server, 5_000));

    let (mut client_in, server_in) = tokio::io::duplex(16 * 1024);
    let (server_out, client_out) = tokio::io::duplex(256 * 1024);
    let serving = tokio::spawn(serve(handler, BufReader::new(server_in), server_out));

    let session = [
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"clientInfo": {"name": "e2e"}}}),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
               "params": {"name": "search_docs", "arguments": {"query": "CLI tool"}}}),
    ];
    for message in &session {
        client_in
            .write_all(format!("{message}\n").as_bytes())
            .await
            .expect("write request");
    }
    drop(client_in);

    serving.await.expect("join").expect("serve");

    let mut replies = Vec::new();
    let mut lines = BufReader::new(client_out).lines();
    while let Some(line) = lines.next_line().await.expect("read reply") {
        replies.push(serde_json::from_str::<Value>(&line).expect("json reply"));
    }
    assert_eq!(replies.len(), 2);

    let init = replies.iter().find(|r| r["id"] == 1).expect("initialize reply");
    assert_eq!(init["result"]["serverInfo"]["name"], "lunr-docs");

    let search = replies.iter().find(|r| r["id"] == 2).expect("search reply");
    let text = search["result"]["content"][0]["text"].as_str().expect("text");
    let payload: Value = serde_json::from_str(text).expect("payload");
    assert_eq!(payload["results"][0]["title"], "Getting Started");
}
