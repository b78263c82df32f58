//! # lunr-search
//!
//! Lazy loading and ranked search over published Lunr.js documentation
//! indexes.
//!
//! Static documentation generators (Docusaurus, MkDocs and friends) publish
//! their search index as a JSON artifact next to the site. This crate
//! downloads that artifact on first use, builds an in-memory searchable
//! structure from it, and answers queries against it for the rest of the
//! process lifetime.
//!
//! ## Design
//!
//! - One [`IndexCache`] slot per configured site, loaded on the first query
//! - Cold loads run in the background; a query waits on them only for a
//!   short bounded time and otherwise answers [`IndexOutcome::Loading`]
//! - Concurrent queries share a single load attempt; failed loads are retried
//!   by the next query
//! - Phrase matches rank above word matches; within a tier, documents that
//!   match more distinct query terms rank higher and ties keep index order
//! - [`PageRetriever`] fetches a result page and renders it as markdown
//!
//! ## Example
//!
//! ```no_run
//! # async fn example() -> lunr_search::Result<()> {
//! use lunr_search::{IndexCache, IndexOutcome, SearchConfig, SiteConfig};
//!
//! let site = SiteConfig::new("docs", &["https://docs.example.com/search-index.json"], None)?;
//! let cache = IndexCache::new(vec![site], &SearchConfig::default())?;
//! match cache.search("docs", "install the cli", None).await? {
//!     IndexOutcome::Ready(hits) => {
//!         for hit in hits {
//!             println!("{}: {}", hit.title, hit.url);
//!         }
//!     }
//!     IndexOutcome::Loading => println!("index still loading, retry shortly"),
//!     IndexOutcome::Failed(error) => println!("index unavailable: {error}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod index;
pub mod ranking;
pub mod stemmer;
pub mod tokenizer;
pub mod types;

pub use cache::IndexCache;
pub use config::SearchConfig;
pub use content::PageRetriever;
pub use error::{Result, SearchError};
pub use fetcher::{HttpIndexFetcher, IndexFetcher};
pub use index::SiteIndex;
pub use types::{
    Field, IndexOutcome, LoadState, MatchTier, PageContent, ResolvedPage, SearchHit, SearchOutcome,
    SiteConfig, SiteStatus,
};
