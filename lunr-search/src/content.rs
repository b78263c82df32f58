//! Page retrieval: fetch a documentation page and render its main content
//! as markdown.
//!
//! The main content area is the first of `article`, `main`, `[role=main]`
//! or `body` that renders to something non-empty. Boilerplate elements
//! (scripts, navigation, headers, footers, sidebars) are skipped while
//! walking the tree. Rendered pages are memoised per URL for the configured
//! TTL.

use std::time::{Duration, Instant};

use moka::future::Cache;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::http;
use crate::types::{PageContent, ResolvedPage};

/// Maximum number of rendered pages kept in memory.
const MAX_CACHED_PAGES: u64 = 256;

/// Content areas tried in priority order.
const MAIN_SELECTORS: [&str; 4] = ["article", "main", "[role=\"main\"]", "body"];

/// Elements dropped together with everything inside them.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript", "svg", "iframe", "button",
    "form", "template",
];

/// Appended when rendered text exceeds the character limit.
const TRUNCATION_MARKER: &str = "\n\n[Content truncated]";

/// Fetches documentation pages and renders them to markdown.
#[derive(Clone)]
pub struct PageRetriever {
    client: reqwest::Client,
    max_chars: usize,
    cache: Option<Cache<String, PageContent>>,
}

impl PageRetriever {
    /// Build a retriever with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        Ok(Self::with_client(http::build_client(config)?, config))
    }

    /// Build a retriever around an existing client.
    pub fn with_client(client: reqwest::Client, config: &SearchConfig) -> Self {
        let cache = (config.page_cache_ttl_seconds > 0).then(|| {
            Cache::builder()
                .max_capacity(MAX_CACHED_PAGES)
                .time_to_live(Duration::from_secs(config.page_cache_ttl_seconds))
                .build()
        });
        Self {
            client,
            max_chars: config.page_max_chars,
            cache,
        }
    }

    /// Fetch `url` and render its main content.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Fetch`] on transport failure or a non-2xx
    /// status, and [`SearchError::Parse`] when the page has no content.
    pub async fn fetch(&self, url: &str) -> Result<PageContent> {
        if let Some(cache) = &self.cache {
            if let Some(page) = cache.get(url).await {
                tracing::debug!(url, "page cache hit");
                return Ok(page);
            }
        }

        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SearchError::Fetch(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "page request rejected");
            return Err(SearchError::Fetch(format!(
                "HTTP {} from {url}",
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Fetch(format!("reading {url} failed: {e}")))?;

        let owned_url = url.to_owned();
        let max_chars = self.max_chars;
        let page = tokio::task::spawn_blocking(move || render_page(&body, &owned_url, max_chars))
            .await
            .map_err(|e| SearchError::Parse(format!("rendering {url} was aborted: {e}")))??;

        tracing::info!(
            url,
            status = status.as_u16(),
            words = page.word_count,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "page fetched"
        );

        if let Some(cache) = &self.cache {
            cache.insert(url.to_owned(), page.clone()).await;
        }
        Ok(page)
    }

    /// Fetch a resolved page, never failing: an unreachable page yields a
    /// short "Content not available" body instead.
    pub async fn retrieve(&self, page: &ResolvedPage) -> PageContent {
        match self.fetch(&page.url).await {
            Ok(mut content) => {
                if content.title.is_empty() {
                    content.title = page.title.clone();
                }
                content
            }
            Err(error) => unavailable(page, &error),
        }
    }
}

fn unavailable(page: &ResolvedPage, error: &SearchError) -> PageContent {
    let text = format!("# {}\n\nContent not available ({error})", page.title);
    PageContent {
        url: page.url.clone(),
        title: page.title.clone(),
        word_count: text.split_whitespace().count(),
        text,
    }
}

/// Render an HTML document to markdown, truncated to `max_chars` characters.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] if no content area renders any text.
pub fn render_page(html: &str, url: &str, max_chars: usize) -> Result<PageContent> {
    let document = Html::parse_document(html);
    let base = Url::parse(url).ok();

    for selector in MAIN_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        let Some(area) = document.select(&selector).next() else {
            continue;
        };
        let markdown = render_markdown(area, base.as_ref());
        if markdown.is_empty() {
            continue;
        }
        let text = truncate_to_limit(&markdown, max_chars);
        return Ok(PageContent {
            url: url.to_owned(),
            title: extract_title(&document),
            word_count: text.split_whitespace().count(),
            text,
        });
    }

    Err(SearchError::Parse(format!("no extractable content found at {url}")))
}

/// `<title>`, falling back to the first `<h1>`.
fn extract_title(document: &Html) -> String {
    ["title", "h1"]
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| {
            let text = document.select(&selector).next()?.text().collect::<String>();
            let text = collapse(&text);
            (!text.is_empty()).then_some(text)
        })
        .unwrap_or_default()
}

/// Render one element subtree as markdown.
pub fn render_markdown(root: ElementRef<'_>, base: Option<&Url>) -> String {
    let mut renderer = Renderer::new(base, false);
    renderer.children(root);
    tidy(&renderer.out)
}

struct Renderer<'a> {
    out: String,
    base: Option<&'a Url>,
    pre: bool,
}

impl<'a> Renderer<'a> {
    fn new(base: Option<&'a Url>, pre: bool) -> Self {
        Self {
            out: String::new(),
            base,
            pre,
        }
    }

    /// Render `el`'s children into a fresh buffer.
    fn nested(&self, el: ElementRef<'_>) -> String {
        let mut sub = Renderer::new(self.base, self.pre);
        sub.children(el);
        sub.out
    }

    fn children(&mut self, el: ElementRef<'_>) {
        for child in el.children() {
            match child.value() {
                Node::Text(text) => self.text(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.element(child);
                    }
                }
                _ => {}
            }
        }
    }

    fn text(&mut self, text: &str) {
        if self.pre {
            self.out.push_str(text);
            return;
        }
        for c in text.chars() {
            if matches!(c, '\u{200b}' | '\u{feff}') {
                continue;
            }
            if c.is_whitespace() {
                if !self.out.is_empty() && !self.out.ends_with([' ', '\n']) {
                    self.out.push(' ');
                }
            } else {
                self.out.push(c);
            }
        }
    }

    fn element(&mut self, el: ElementRef<'_>) {
        let name = el.value().name();
        if SKIPPED_TAGS.contains(&name) {
            return;
        }
        if self.pre {
            if name == "br" {
                self.out.push('\n');
            } else {
                self.children(el);
            }
            return;
        }

        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => self.heading(el, &name[1..]),
            "p" | "div" | "section" | "article" | "main" | "figure" | "details" | "summary"
            | "dl" | "dt" | "dd" => {
                self.block_break();
                self.children(el);
                self.block_break();
            }
            "br" => {
                self.trim_trailing_spaces();
                self.out.push('\n');
            }
            "hr" => {
                self.block_break();
                self.out.push_str("---");
                self.block_break();
            }
            "pre" => self.code_block(el),
            "code" => {
                let code = el.text().collect::<String>();
                if !code.is_empty() {
                    self.out.push('`');
                    self.out.push_str(&code);
                    self.out.push('`');
                }
            }
            "a" => self.link(el),
            "strong" | "b" => self.emphasis(el, "**"),
            "em" | "i" => self.emphasis(el, "*"),
            "ul" => self.list(el, false),
            "ol" => self.list(el, true),
            "blockquote" => self.quote(el),
            "table" => self.table(el),
            "img" => {
                let alt = el.value().attr("alt").map(collapse).unwrap_or_default();
                let src = el.value().attr("src").and_then(|src| self.resolve(src));
                if let (Some(src), false) = (src, alt.is_empty()) {
                    self.out.push_str(&format!("![{alt}]({src})"));
                }
            }
            _ => self.children(el),
        }
    }

    fn trim_trailing_spaces(&mut self) {
        let len = self.out.trim_end_matches(' ').len();
        self.out.truncate(len);
    }

    /// Make sure the next output starts a new paragraph.
    fn block_break(&mut self) {
        self.trim_trailing_spaces();
        if self.out.is_empty() {
            return;
        }
        while !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn heading(&mut self, el: ElementRef<'_>, level: &str) {
        let text = collapse(&self.nested(el));
        if text.is_empty() {
            return;
        }
        let level = level.parse::<usize>().unwrap_or(1);
        self.block_break();
        self.out.push_str(&"#".repeat(level));
        self.out.push(' ');
        self.out.push_str(&text);
        self.block_break();
    }

    fn code_block(&mut self, el: ElementRef<'_>) {
        let mut sub = Renderer::new(self.base, true);
        sub.children(el);
        let code = sub.out.trim_matches('\n');
        if code.trim().is_empty() {
            return;
        }
        self.block_break();
        self.out.push_str("```");
        self.out.push_str(code_language(el).unwrap_or_default());
        self.out.push('\n');
        self.out.push_str(code);
        self.out.push_str("\n```");
        self.block_break();
    }

    fn link(&mut self, el: ElementRef<'_>) {
        let text = collapse(&self.nested(el));
        if text.is_empty() {
            return;
        }
        match el.value().attr("href").and_then(|href| self.resolve(href)) {
            Some(target) => self.out.push_str(&format!("[{text}]({target})")),
            None => self.out.push_str(&text),
        }
    }

    /// Absolute target for a link, or `None` for in-page and script links.
    fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            return None;
        }
        match self.base {
            Some(base) => base.join(href).ok().map(String::from),
            None => Some(href.to_owned()),
        }
    }

    fn emphasis(&mut self, el: ElementRef<'_>, marker: &str) {
        let inner = self.nested(el);
        let trimmed = inner.trim();
        if trimmed.is_empty() {
            return;
        }
        if inner.starts_with(' ') && !self.out.ends_with([' ', '\n']) && !self.out.is_empty() {
            self.out.push(' ');
        }
        self.out.push_str(marker);
        self.out.push_str(trimmed);
        self.out.push_str(marker);
        if inner.ends_with(' ') {
            self.out.push(' ');
        }
    }

    fn list(&mut self, el: ElementRef<'_>, ordered: bool) {
        self.block_break();
        let items = el
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "li");
        for (n, item) in items.enumerate() {
            let body = tidy(&self.nested(item));
            if body.is_empty() {
                continue;
            }
            let marker = if ordered {
                format!("{}. ", n + 1)
            } else {
                "- ".to_owned()
            };
            let indent = " ".repeat(marker.len());
            for (i, line) in body.lines().enumerate() {
                if i == 0 {
                    self.out.push_str(&marker);
                } else if !line.is_empty() {
                    self.out.push_str(&indent);
                }
                self.out.push_str(line);
                self.out.push('\n');
            }
        }
        self.block_break();
    }

    fn quote(&mut self, el: ElementRef<'_>) {
        let body = tidy(&self.nested(el));
        if body.is_empty() {
            return;
        }
        self.block_break();
        for line in body.lines() {
            if line.is_empty() {
                self.out.push_str(">\n");
            } else {
                self.out.push_str("> ");
                self.out.push_str(line);
                self.out.push('\n');
            }
        }
        self.block_break();
    }

    fn table(&mut self, el: ElementRef<'_>) {
        let rows: Vec<Vec<String>> = el
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|row| row.value().name() == "tr")
            .map(|row| {
                row.children()
                    .filter_map(ElementRef::wrap)
                    .filter(|cell| matches!(cell.value().name(), "th" | "td"))
                    .map(|cell| collapse(&self.nested(cell)).replace('|', "\\|"))
                    .collect()
            })
            .filter(|cells: &Vec<String>| !cells.is_empty())
            .collect();
        if rows.is_empty() {
            return;
        }
        self.block_break();
        for (i, cells) in rows.iter().enumerate() {
            self.out.push_str(&format!("| {} |\n", cells.join(" | ")));
            if i == 0 {
                let rule = vec!["---"; cells.len()].join(" | ");
                self.out.push_str(&format!("| {rule} |\n"));
            }
        }
        self.block_break();
    }
}

/// `language-xxx` class on a `<pre>` or its `<code>` child.
fn code_language<'a>(pre: ElementRef<'a>) -> Option<&'a str> {
    let code = pre
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "code");
    std::iter::once(pre)
        .chain(code)
        .flat_map(|el| el.value().classes())
        .find_map(|class| class.strip_prefix("language-"))
}

/// Collapse every whitespace run to one space and trim.
fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim line ends and collapse runs of blank lines, leaving fenced code as is.
fn tidy(markdown: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut in_fence = false;
    for line in markdown.lines() {
        let line = line.trim_end();
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        } else if !in_fence && line.is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_owned()
}

/// Truncate to at most `max_chars` characters, marking the cut.
fn truncate_to_limit(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_owned(),
        Some((end, _)) => {
            let mut truncated = text[..end].to_owned();
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://docs.example.com/guide/install/";

    fn render(html: &str) -> PageContent {
        render_page(html, URL, 100_000).expect("content")
    }

    #[test]
    fn title_from_title_element_or_first_heading() {
        let page = render("<html><head><title>Install | Docs</title></head><body><p>x</p></body></html>");
        assert_eq!(page.title, "Install | Docs");

        let page = render("<html><body><h1>Install</h1><p>x</p></body></html>");
        assert_eq!(page.title, "Install");
    }

    #[test]
    fn headings_are_atx() {
        let page = render("<html><body><article><h1>Install</h1><h2>On <em>Linux</em></h2><p>Run it.</p></article></body></html>");
        assert_eq!(page.text, "# Install\n\n## On *Linux*\n\nRun it.");
    }

    #[test]
    fn prefers_article_and_skips_boilerplate() {
        let html = r#"<html><body>
            <header>Site header</header>
            <nav>Docs Blog GitHub</nav>
            <article><p>Article content here</p><script>alert('x')</script></article>
            <aside>On this page</aside>
            <footer>Copyright</footer>
        </body></html>"#;
        let page = render(html);
        assert_eq!(page.text, "Article content here");
        assert_eq!(page.word_count, 3);
    }

    #[test]
    fn falls_back_to_main_then_body() {
        let page = render("<html><body><nav>menu</nav><main><p>Main text</p></main></body></html>");
        assert_eq!(page.text, "Main text");

        let page = render("<html><body><nav>menu</nav><p>Body text</p></body></html>");
        assert_eq!(page.text, "Body text");
    }

    #[test]
    fn code_blocks_are_fenced_with_language() {
        let html = r#"<html><body><article>
            <p>Install with <code>npm</code>:</p>
            <pre class="language-bash"><code>npm install
npm run build</code></pre>
        </article></body></html>"#;
        let page = render(html);
        assert!(page.text.contains("Install with `npm`:"));
        assert!(page.text.contains("```bash\nnpm install\nnpm run build\n```"));
    }

    #[test]
    fn line_spans_with_breaks_keep_their_lines() {
        let html = r#"<article><pre><code class="language-sh"><span>echo one</span><br><span>echo two</span></code></pre></article>"#;
        let page = render(html);
        assert!(page.text.contains("```sh\necho one\necho two\n```"));
    }

    #[test]
    fn links_resolve_against_page_url() {
        let html = r##"<article><p>See <a href="../config/">the config page</a>, <a href="https://x.test/">x</a> and <a class="hash-link" href="#top">&#8203;</a><a href="#anchor">here</a>.</p></article>"##;
        let page = render(html);
        assert!(page.text.contains("[the config page](https://docs.example.com/guide/config/)"));
        assert!(page.text.contains("[x](https://x.test/)"));
        assert!(page.text.contains(" here."));
        assert!(!page.text.contains('\u{200b}'));
    }

    #[test]
    fn lists_render_with_markers() {
        let html = "<article><ul><li>First</li><li>Second <strong>bold</strong></li></ul><ol><li>One</li><li>Two</li></ol></article>";
        let page = render(html);
        assert!(page.text.contains("- First\n- Second **bold**"));
        assert!(page.text.contains("1. One\n2. Two"));
    }

    #[test]
    fn tables_render_as_pipe_tables() {
        let html = "<article><table><tr><th>Key</th><th>Default</th></tr><tr><td>port</td><td>8080</td></tr></table></article>";
        let page = render(html);
        assert!(page.text.contains("| Key | Default |\n| --- | --- |\n| port | 8080 |"));
    }

    #[test]
    fn blockquotes_are_prefixed() {
        let page = render("<article><blockquote><p>Note this.</p></blockquote></article>");
        assert_eq!(page.text, "> Note this.");
    }

    #[test]
    fn blank_lines_collapse() {
        let page = render("<article><div><p>a</p></div><div></div><div><p>b</p></div></article>");
        assert_eq!(page.text, "a\n\nb");
    }

    #[test]
    fn empty_page_is_a_parse_error() {
        let err = render_page("<html><body><nav>only nav</nav></body></html>", URL, 100).unwrap_err();
        assert!(matches!(err, SearchError::Parse(_)));
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_to_limit("short", 10), "short");
        let truncated = truncate_to_limit("héllo wörld", 5);
        assert_eq!(truncated, format!("héllo{TRUNCATION_MARKER}"));
        let page = render_page("<article><p>abcdefghij</p></article>", URL, 4).expect("content");
        assert!(page.text.starts_with("abcd"));
        assert!(page.text.ends_with("[Content truncated]"));
    }

    #[test]
    fn unavailable_page_names_title_and_error() {
        let page = ResolvedPage {
            title: "Install".into(),
            url: URL.into(),
            location: "/guide/install/".into(),
            breadcrumb: vec![],
        };
        let content = unavailable(&page, &SearchError::Fetch(format!("HTTP 404 from {URL}")));
        assert!(content.text.starts_with("# Install\n\nContent not available ("));
        assert!(content.text.contains("HTTP 404"));
        assert_eq!(content.title, "Install");
    }

    #[test]
    fn zero_ttl_disables_page_cache() {
        let config = SearchConfig {
            page_cache_ttl_seconds: 0,
            ..Default::default()
        };
        let retriever = PageRetriever::new(&config).expect("retriever");
        assert!(retriever.cache.is_none());
        assert!(PageRetriever::new(&SearchConfig::default()).expect("retriever").cache.is_some());
    }
}
