//! Searchable structure built from published lunr index artifacts.
//!
//! An artifact is either a single part `{ "documents": [...], "index": {...} }`,
//! an array of such parts, or an MkDocs `{ "docs": [...] }` object. Parts
//! are merged in order into one [`SiteIndex`]: a repeated document id merges
//! into its first occurrence, taking the later part's content when it is
//! longer.
//!
//! The token map is the union of the artifact's own lunr postings and this
//! crate's tokenisation of each document's fields.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, SearchError};
use crate::tokenizer;
use crate::types::{Field, FieldMask, ResolvedPage, SiteConfig};

/// Postings for one term: document position to the fields it appears in.
pub type Postings = BTreeMap<usize, FieldMask>;

#[derive(Debug, Deserialize)]
struct RawPart {
    #[serde(default, alias = "docs")]
    documents: Option<Vec<RawDocument>>,
    #[serde(default)]
    index: Option<RawLunrIndex>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default, alias = "i", alias = "ref")]
    id: Option<Value>,
    #[serde(default, alias = "t")]
    title: Option<String>,
    #[serde(default, alias = "u", alias = "location")]
    url: Option<String>,
    #[serde(default, alias = "b")]
    breadcrumb: Option<Breadcrumb>,
    #[serde(default, alias = "s")]
    section: Option<String>,
    #[serde(default, alias = "c", alias = "text", alias = "body")]
    content: Option<String>,
    #[serde(default, alias = "p")]
    parent: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Breadcrumb {
    Path(Vec<String>),
    Joined(String),
}

#[derive(Debug, Deserialize)]
struct RawLunrIndex {
    #[serde(default, rename = "invertedIndex")]
    inverted_index: Vec<(String, serde_json::Map<String, Value>)>,
}

/// One document of a site's searchable structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedDocument {
    reference: String,
    title: String,
    location: String,
    breadcrumb: Vec<String>,
    section: String,
    content: String,
}

impl IndexedDocument {
    fn from_raw(raw: RawDocument, fallback_ref: String) -> Self {
        let location = raw.url.unwrap_or_default();
        let reference = match raw.id {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ if !location.is_empty() => location.clone(),
            _ => fallback_ref,
        };
        let breadcrumb = match raw.breadcrumb {
            Some(Breadcrumb::Path(path)) => path,
            Some(Breadcrumb::Joined(joined)) if !joined.trim().is_empty() => vec![joined],
            _ => Vec::new(),
        };
        let title = raw.title.unwrap_or_default();
        let section = raw.section.unwrap_or_default();

        // Content fragments of docusaurus-search-local carry their text in
        // `t`, the heading in `s` and the owning page in `p`.
        let (title, content) = match raw.content {
            Some(content) => (title, content),
            None if raw.parent.is_some() && !section.is_empty() => (section.clone(), title),
            None => (title, String::new()),
        };

        Self {
            reference,
            title,
            location,
            breadcrumb,
            section,
            content,
        }
    }

    /// Merge a later occurrence of the same reference into this one.
    fn absorb(&mut self, later: IndexedDocument) {
        if later.content.len() > self.content.len() {
            self.content = later.content;
        }
        if self.title.is_empty() {
            self.title = later.title;
        }
        if self.location.is_empty() {
            self.location = later.location;
        }
        if self.breadcrumb.is_empty() {
            self.breadcrumb = later.breadcrumb;
        }
        if self.section.is_empty() {
            self.section = later.section;
        }
    }

    /// Document reference, unique within the site.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Display title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Site-relative location as published (may carry a `#fragment`).
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Location without its `#fragment`.
    pub fn page_location(&self) -> &str {
        strip_fragment(&self.location)
    }

    /// Breadcrumb path.
    pub fn breadcrumb(&self) -> &[String] {
        &self.breadcrumb
    }

    /// Section heading, empty when absent.
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Body text, empty when the index carries none.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Text of a field; breadcrumb segments are joined with spaces.
    pub fn field_text(&self, field: Field) -> String {
        match field {
            Field::Title => self.title.clone(),
            Field::Breadcrumb => self.breadcrumb.join(" "),
            Field::Section => self.section.clone(),
            Field::Content => self.content.clone(),
        }
    }
}

/// The in-memory searchable structure of one site.
#[derive(Debug)]
pub struct SiteIndex {
    site: SiteConfig,
    documents: Vec<IndexedDocument>,
    folded: Vec<Vec<(Field, String)>>,
    by_ref: HashMap<String, usize>,
    postings: HashMap<String, Postings>,
}

impl SiteIndex {
    /// Build the searchable structure from fetched artifacts, primary first.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Parse`] if an artifact is not an object or an
    /// array of objects, or a part carries no document store.
    pub fn build(site: SiteConfig, artifacts: Vec<Value>) -> Result<Self> {
        let mut builder = Builder::default();
        for (artifact_no, artifact) in artifacts.into_iter().enumerate() {
            for part in parse_parts(artifact, artifact_no)? {
                builder.add_part(part);
            }
        }
        let index = builder.finish(site);
        tracing::debug!(
            site = index.site.key(),
            documents = index.documents.len(),
            terms = index.postings.len(),
            "site index built"
        );
        Ok(index)
    }

    /// The site this index belongs to.
    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Documents in natural index order.
    pub fn documents(&self) -> &[IndexedDocument] {
        &self.documents
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the index holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of distinct indexed terms.
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// Postings for a normalised term.
    pub fn postings(&self, term: &str) -> Option<&Postings> {
        self.postings.get(term)
    }

    /// Case-folded, whitespace-collapsed non-empty fields of a document.
    pub(crate) fn folded_fields(&self, position: usize) -> &[(Field, String)] {
        self.folded.get(position).map_or(&[], Vec::as_slice)
    }

    /// Look a document up by reference.
    pub fn document(&self, reference: &str) -> Option<&IndexedDocument> {
        self.by_ref.get(reference).map(|&pos| &self.documents[pos])
    }

    /// Find the page for a document reference, a site-relative location or
    /// an absolute URL under the site. Fragments are ignored.
    pub fn find_page(&self, location: &str) -> Option<&IndexedDocument> {
        let wanted = location.trim();
        if wanted.is_empty() {
            return None;
        }
        if let Some(doc) = self.document(wanted) {
            return Some(doc);
        }
        let wanted_url = strip_fragment(&self.site.resolve_location(wanted)).to_owned();
        self.documents.iter().find(|doc| {
            !doc.location.is_empty()
                && (doc.page_location() == strip_fragment(wanted)
                    || strip_fragment(&self.site.resolve_location(&doc.location)) == wanted_url)
        })
    }

    /// Resolve a document reference or location to its absolute page URL.
    pub fn resolve(&self, location: &str) -> Option<ResolvedPage> {
        self.find_page(location).map(|doc| ResolvedPage {
            title: doc.title.clone(),
            url: self.site.resolve_location(doc.page_location()),
            location: doc.page_location().to_owned(),
            breadcrumb: doc.breadcrumb.clone(),
        })
    }
}

fn parse_parts(artifact: Value, artifact_no: usize) -> Result<Vec<RawPart>> {
    let values = match artifact {
        Value::Array(values) => values,
        value @ Value::Object(_) => vec![value],
        other => {
            return Err(SearchError::Parse(format!(
                "index artifact {artifact_no} must be an object or array, got {}",
                json_kind(&other)
            )))
        }
    };
    values
        .into_iter()
        .enumerate()
        .map(|(part_no, value)| {
            let part: RawPart = serde_json::from_value(value).map_err(|e| {
                SearchError::Parse(format!(
                    "index artifact {artifact_no} part {part_no} is malformed: {e}"
                ))
            })?;
            if part.documents.is_none() {
                return Err(SearchError::Parse(format!(
                    "index artifact {artifact_no} part {part_no} has no documents"
                )));
            }
            Ok(part)
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn strip_fragment(location: &str) -> &str {
    location.split('#').next().unwrap_or(location)
}

#[derive(Default)]
struct Builder {
    parts: usize,
    documents: Vec<IndexedDocument>,
    by_ref: HashMap<String, usize>,
    postings: HashMap<String, Postings>,
}

impl Builder {
    fn add_part(&mut self, part: RawPart) {
        let part_no = self.parts;
        self.parts += 1;

        for (pos, raw) in part.documents.unwrap_or_default().into_iter().enumerate() {
            let doc = IndexedDocument::from_raw(raw, format!("{part_no}:{pos}"));
            match self.by_ref.get(&doc.reference) {
                Some(&existing) => self.documents[existing].absorb(doc),
                None => {
                    self.by_ref
                        .insert(doc.reference.clone(), self.documents.len());
                    self.documents.push(doc);
                }
            }
        }

        let Some(index) = part.index else {
            return;
        };
        for (term, fields) in index.inverted_index {
            for (field_name, refs) in fields {
                if field_name == "_index" {
                    continue;
                }
                let Value::Object(refs) = refs else {
                    continue;
                };
                let field = Field::from_lunr_name(&field_name);
                for reference in refs.keys() {
                    if let Some(&position) = self.by_ref.get(reference) {
                        self.post(&term, position, field);
                    }
                }
            }
        }
    }

    fn post(&mut self, term: &str, position: usize, field: Field) {
        self.postings
            .entry(term.to_owned())
            .or_default()
            .entry(position)
            .or_default()
            .insert(field);
    }

    fn finish(mut self, site: SiteConfig) -> SiteIndex {
        let mut folded = Vec::with_capacity(self.documents.len());
        for position in 0..self.documents.len() {
            let mut doc_folded = Vec::new();
            for field in Field::ALL {
                let text = self.documents[position].field_text(field);
                if text.trim().is_empty() {
                    continue;
                }
                for term in tokenizer::tokenize(&text) {
                    self.post(&term, position, field);
                }
                doc_folded.push((field, tokenizer::fold(&text)));
            }
            folded.push(doc_folded);
        }

        SiteIndex {
            site,
            documents: self.documents,
            folded,
            by_ref: self.by_ref,
            postings: self.postings,
        }
    }
}
