//! Core types: site configuration, search hits, outcomes and load status.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::SearchError;

/// Maximum number of index artifacts a single site may publish.
pub const MAX_INDEX_URLS: usize = 2;

/// One configured documentation site. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    key: String,
    index_urls: Vec<Url>,
    base_url: Url,
}

impl SiteConfig {
    /// Build a site from its key, one or two index URLs and an optional base
    /// URL override.
    ///
    /// Without an override the base URL is the directory holding the first
    /// index artifact, so `https://docs.example.com/search-index.json`
    /// resolves locations against `https://docs.example.com/`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an empty or non `[A-Za-z0-9_-]`
    /// key, a URL count outside `1..=2`, or a URL that is not http(s).
    pub fn new(key: &str, index_urls: &[&str], base_url: Option<&str>) -> Result<Self, SearchError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(SearchError::Config("site key must not be empty".into()));
        }
        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(SearchError::Config(format!(
                "site key `{key}` may only contain letters, digits, `_` and `-`"
            )));
        }
        if index_urls.is_empty() || index_urls.len() > MAX_INDEX_URLS {
            return Err(SearchError::Config(format!(
                "site `{key}` needs 1 to {MAX_INDEX_URLS} index URLs, got {}",
                index_urls.len()
            )));
        }

        let index_urls = index_urls
            .iter()
            .map(|raw| parse_http_url(key, raw))
            .collect::<Result<Vec<_>, _>>()?;

        let base_url = match base_url {
            Some(raw) => {
                let mut url = parse_http_url(key, raw)?;
                if !url.path().ends_with('/') {
                    let path = format!("{}/", url.path());
                    url.set_path(&path);
                }
                url
            }
            None => index_urls[0].join("./").map_err(|e| {
                SearchError::Config(format!("site `{key}`: cannot derive base URL: {e}"))
            })?,
        };

        Ok(Self {
            key: key.to_owned(),
            index_urls,
            base_url,
        })
    }

    /// The short identifier of this site.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The index artifact URLs, primary first.
    pub fn index_urls(&self) -> &[Url] {
        &self.index_urls
    }

    /// Whether this site publishes a separate secondary (full-content) index.
    pub fn is_dual(&self) -> bool {
        self.index_urls.len() > 1
    }

    /// The base URL used to resolve document locations.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a document location (relative path, absolute path or full
    /// URL) against this site's base URL.
    pub fn resolve_location(&self, location: &str) -> String {
        match self.base_url.join(location) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{}", self.base_url, location.trim_start_matches('/')),
        }
    }
}

fn parse_http_url(key: &str, raw: &str) -> Result<Url, SearchError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| SearchError::Config(format!("site `{key}`: invalid URL `{raw}`: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SearchError::Config(format!(
            "site `{key}`: URL `{raw}` must use http or https, not {other}"
        ))),
    }
}

/// Document fields a query can match in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Page or heading title.
    Title,
    /// Breadcrumb / navigation path.
    Breadcrumb,
    /// Section heading a content fragment belongs to.
    Section,
    /// Body text.
    Content,
}

impl Field {
    /// All fields, in display order.
    pub const ALL: [Field; 4] = [Self::Title, Self::Breadcrumb, Self::Section, Self::Content];

    fn bit(self) -> u8 {
        match self {
            Self::Title => 1,
            Self::Breadcrumb => 1 << 1,
            Self::Section => 1 << 2,
            Self::Content => 1 << 3,
        }
    }

    /// Map a lunr field name onto a document field. Unknown names are body text.
    pub fn from_lunr_name(name: &str) -> Self {
        match name {
            "t" | "title" => Self::Title,
            "b" | "breadcrumb" | "breadcrumbs" => Self::Breadcrumb,
            "s" | "section" | "sectionTitle" | "heading" => Self::Section,
            _ => Self::Content,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Title => "title",
            Self::Breadcrumb => "breadcrumb",
            Self::Section => "section",
            Self::Content => "content",
        })
    }
}

/// Compact set of [`Field`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FieldMask(u8);

impl FieldMask {
    /// A mask holding a single field.
    pub fn of(field: Field) -> Self {
        Self(field.bit())
    }

    /// Add a field.
    pub fn insert(&mut self, field: Field) {
        self.0 |= field.bit();
    }

    /// Add every field of `other`.
    pub fn union(&mut self, other: FieldMask) {
        self.0 |= other.0;
    }

    /// Whether `field` is present.
    pub fn contains(self, field: Field) -> bool {
        self.0 & field.bit() != 0
    }

    /// Whether no field is present.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The fields present, in [`Field::ALL`] order.
    pub fn fields(self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.contains(*f))
            .collect()
    }
}

/// Relevance tier of a hit. Phrase hits always outrank word hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    /// Matched individual query terms only.
    Word,
    /// Contains the whole query as a contiguous phrase.
    Phrase,
}

impl MatchTier {
    /// Score offset for the tier.
    pub fn base_score(self) -> u32 {
        match self {
            Self::Word => 0,
            Self::Phrase => 1_000,
        }
    }
}

/// A single ranked search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Display title of the document.
    pub title: String,
    /// Absolute URL of the page (fragment preserved).
    pub url: String,
    /// Site-relative location, usable with page retrieval.
    pub location: String,
    /// Breadcrumb path, when the index carries one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breadcrumb: Vec<String>,
    /// Relevance tier.
    pub tier: MatchTier,
    /// `tier.base_score() + matched_terms`.
    pub score: u32,
    /// Number of distinct query terms found in the document.
    pub matched_terms: usize,
    /// Fields in which the phrase or terms matched.
    pub matched_fields: Vec<Field>,
}

/// Result of an operation that needs a site's index.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexOutcome<T> {
    /// The index was ready and the operation ran.
    Ready(T),
    /// The index is still loading; retry later.
    Loading,
    /// The load failed (it will be retried on the next call) or the
    /// operation itself failed.
    Failed(SearchError),
}

impl<T> IndexOutcome<T> {
    /// Whether this is [`IndexOutcome::Loading`].
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The ready value, if any.
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Loading | Self::Failed(_) => None,
        }
    }
}

/// Outcome of a search query.
pub type SearchOutcome = IndexOutcome<Vec<SearchHit>>;

/// A document location resolved to its absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPage {
    /// Display title from the index.
    pub title: String,
    /// Absolute page URL, fragment stripped.
    pub url: String,
    /// Site-relative location, fragment stripped.
    pub location: String,
    /// Breadcrumb path from the index.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breadcrumb: Vec<String>,
}

/// Extracted readable content from a fetched documentation page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    /// The URL that was fetched.
    pub url: String,
    /// The page title extracted from HTML.
    pub title: String,
    /// Main content rendered as markdown.
    pub text: String,
    /// Number of words in the rendered text.
    pub word_count: usize,
}

/// Load state of one site's cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    /// Never requested.
    Empty,
    /// A load attempt is in flight.
    Loading,
    /// The searchable structure is available.
    Ready,
    /// The last attempt failed; the next query retries.
    Failed,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "empty",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed => "failed",
        })
    }
}

/// Snapshot of one site's cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteStatus {
    /// Site key.
    pub key: String,
    /// Current load state.
    pub state: LoadState,
    /// Index artifact URLs.
    pub index_urls: Vec<String>,
    /// Number of documents, when ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<usize>,
    /// Milliseconds since the current or last attempt started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_started_ms: Option<u64>,
    /// Duration of the completed load, when ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_ms: Option<u64>,
    /// Failure detail, when failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
