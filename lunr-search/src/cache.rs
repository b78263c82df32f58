//! Per-site index cache and the async load coordinator.
//!
//! Every configured site owns one slot holding a [`CacheEntry`]. The first
//! query for a site starts a background load (fetch, then build); later
//! queries attach to that same attempt instead of starting another. A query
//! waits on the attempt for at most [`SearchConfig::load_wait`] and then
//! answers [`IndexOutcome::Loading`], while the load keeps running and
//! stores its result in the slot. A failed load is not terminal: the next
//! query starts a fresh attempt.
//!
//! The slot lock is a plain [`std::sync::Mutex`]. It guards only the state
//! swap and is never held across an `.await`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::fetcher::{HttpIndexFetcher, IndexFetcher};
use crate::index::SiteIndex;
use crate::ranking;
use crate::types::{IndexOutcome, LoadState, ResolvedPage, SearchOutcome, SiteConfig, SiteStatus};

/// One in-flight load, shared by every query waiting on it.
type LoadAttempt = Shared<BoxFuture<'static, Result<Arc<SiteIndex>>>>;

enum CacheEntry {
    Empty,
    Loading {
        started_at: Instant,
        attempt: LoadAttempt,
    },
    Ready {
        index: Arc<SiteIndex>,
        started_at: Instant,
        loaded_at: Instant,
    },
    Failed {
        error: SearchError,
        started_at: Instant,
        failed_at: Instant,
    },
}

struct SiteSlot {
    site: SiteConfig,
    entry: Mutex<CacheEntry>,
}

impl SiteSlot {
    fn new(site: SiteConfig) -> Self {
        Self {
            site,
            entry: Mutex::new(CacheEntry::Empty),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheEntry> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the outcome of the attempt that started at `started_at`.
    fn settle(&self, started_at: Instant, result: &Result<Arc<SiteIndex>>) {
        let mut entry = self.lock();
        let current = matches!(
            &*entry,
            CacheEntry::Loading { started_at: s, .. } if *s == started_at
        );
        if !current {
            return;
        }
        let now = Instant::now();
        *entry = match result {
            Ok(index) => {
                tracing::info!(
                    site = self.site.key(),
                    documents = index.len(),
                    terms = index.term_count(),
                    load_ms = millis(now - started_at),
                    "index ready"
                );
                CacheEntry::Ready {
                    index: Arc::clone(index),
                    started_at,
                    loaded_at: now,
                }
            }
            Err(error) => {
                tracing::warn!(
                    site = self.site.key(),
                    error = %error,
                    "index load failed; next query will retry"
                );
                CacheEntry::Failed {
                    error: error.clone(),
                    started_at,
                    failed_at: now,
                }
            }
        };
    }

    fn status(&self) -> SiteStatus {
        let entry = self.lock();
        let now = Instant::now();
        let mut status = SiteStatus {
            key: self.site.key().to_owned(),
            state: LoadState::Empty,
            index_urls: self.site.index_urls().iter().map(ToString::to_string).collect(),
            documents: None,
            since_started_ms: None,
            load_ms: None,
            error: None,
        };
        match &*entry {
            CacheEntry::Empty => {}
            CacheEntry::Loading { started_at, .. } => {
                status.state = LoadState::Loading;
                status.since_started_ms = Some(millis(now - *started_at));
            }
            CacheEntry::Ready {
                index,
                started_at,
                loaded_at,
            } => {
                status.state = LoadState::Ready;
                status.documents = Some(index.len());
                status.since_started_ms = Some(millis(now - *started_at));
                status.load_ms = Some(millis(*loaded_at - *started_at));
            }
            CacheEntry::Failed {
                error,
                started_at,
                failed_at,
            } => {
                status.state = LoadState::Failed;
                status.since_started_ms = Some(millis(now - *started_at));
                status.load_ms = Some(millis(*failed_at - *started_at));
                status.error = Some(error.to_string());
            }
        }
        status
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Lazily loaded, process-lifetime cache of site indexes.
///
/// Cheap to share behind an [`Arc`]; all methods take `&self`.
pub struct IndexCache<F: IndexFetcher = HttpIndexFetcher> {
    slots: BTreeMap<String, Arc<SiteSlot>>,
    fetcher: Arc<F>,
    load_wait: Duration,
    max_results: usize,
}

impl IndexCache<HttpIndexFetcher> {
    /// Build a cache for `sites` that fetches over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid, `sites` is
    /// empty or contains a duplicate key, or the HTTP client cannot be built.
    pub fn new(sites: Vec<SiteConfig>, config: &SearchConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = HttpIndexFetcher::new(config)?;
        Self::with_fetcher(sites, config, fetcher)
    }
}

impl<F: IndexFetcher> IndexCache<F> {
    /// Build a cache for `sites` around a custom fetcher.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `sites` is empty or contains a
    /// duplicate key.
    pub fn with_fetcher(sites: Vec<SiteConfig>, config: &SearchConfig, fetcher: F) -> Result<Self> {
        if sites.is_empty() {
            return Err(SearchError::Config("no documentation sites configured".into()));
        }
        let mut slots = BTreeMap::new();
        for site in sites {
            let key = site.key().to_owned();
            if slots.insert(key.clone(), Arc::new(SiteSlot::new(site))).is_some() {
                return Err(SearchError::Config(format!("duplicate site key: {key}")));
            }
        }
        Ok(Self {
            slots,
            fetcher: Arc::new(fetcher),
            load_wait: config.load_wait(),
            max_results: config.max_results,
        })
    }

    /// Configured site keys in sorted order.
    pub fn site_keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Configuration of one site.
    pub fn site(&self, key: &str) -> Option<&SiteConfig> {
        self.slots.get(key).map(|slot| &slot.site)
    }

    /// Default result cap applied when a query gives no limit.
    pub fn default_max_results(&self) -> usize {
        self.max_results
    }

    fn slot(&self, key: &str) -> Result<&Arc<SiteSlot>> {
        self.slots
            .get(key)
            .ok_or_else(|| SearchError::UnknownSite(key.to_owned()))
    }

    /// Obtain the site's index, starting a load when none is ready or in
    /// flight, and waiting on the load for at most the configured bound.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::UnknownSite`] for an unconfigured key. Load
    /// failures are reported as [`IndexOutcome::Failed`].
    pub async fn acquire(&self, key: &str) -> Result<IndexOutcome<Arc<SiteIndex>>> {
        let slot = self.slot(key)?;
        let attempt = {
            let mut entry = slot.lock();
            match &*entry {
                CacheEntry::Ready { index, .. } => {
                    return Ok(IndexOutcome::Ready(Arc::clone(index)));
                }
                CacheEntry::Loading { attempt, .. } => attempt.clone(),
                CacheEntry::Empty | CacheEntry::Failed { .. } => {
                    let started_at = Instant::now();
                    let attempt = self.start_load(slot, started_at);
                    *entry = CacheEntry::Loading {
                        started_at,
                        attempt: attempt.clone(),
                    };
                    attempt
                }
            }
        };

        match tokio::time::timeout(self.load_wait, attempt).await {
            Ok(Ok(index)) => Ok(IndexOutcome::Ready(index)),
            Ok(Err(error)) => Ok(IndexOutcome::Failed(error)),
            Err(_) => {
                tracing::debug!(site = key, "index still loading; answering without results");
                Ok(IndexOutcome::Loading)
            }
        }
    }

    /// Spawn a load task for `slot`. The task writes its outcome into the
    /// slot itself, so it completes even when every waiter has given up.
    fn start_load(&self, slot: &Arc<SiteSlot>, started_at: Instant) -> LoadAttempt {
        tracing::info!(
            site = slot.site.key(),
            urls = slot.site.index_urls().len(),
            "starting index load"
        );
        let fetcher = Arc::clone(&self.fetcher);
        let task_slot = Arc::clone(slot);
        let handle = tokio::spawn(async move {
            let result = load_site(fetcher.as_ref(), task_slot.site.clone())
                .await
                .map(Arc::new);
            task_slot.settle(started_at, &result);
            result
        });

        let join_slot = Arc::clone(slot);
        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    let result = Err(SearchError::Fetch(format!("index load aborted: {e}")));
                    join_slot.settle(started_at, &result);
                    result
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Search one site.
    ///
    /// `max_results` falls back to the configured default.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::UnknownSite`] for an unconfigured key; every
    /// other outcome is carried in the returned [`SearchOutcome`].
    pub async fn search(&self, key: &str, query: &str, max_results: Option<usize>) -> Result<SearchOutcome> {
        let limit = max_results.unwrap_or(self.max_results);
        Ok(match self.acquire(key).await? {
            IndexOutcome::Ready(index) => {
                let started = Instant::now();
                let hits = ranking::rank(&index, query, limit);
                tracing::debug!(
                    site = key,
                    hits = hits.len(),
                    elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
                    "search complete"
                );
                IndexOutcome::Ready(hits)
            }
            IndexOutcome::Loading => IndexOutcome::Loading,
            IndexOutcome::Failed(error) => IndexOutcome::Failed(error),
        })
    }

    /// Resolve a document location (or reference) to its absolute page URL.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::UnknownSite`] for an unconfigured key. A
    /// location missing from the index is [`SearchError::PageNotFound`]
    /// inside [`IndexOutcome::Failed`].
    pub async fn resolve(&self, key: &str, location: &str) -> Result<IndexOutcome<ResolvedPage>> {
        Ok(match self.acquire(key).await? {
            IndexOutcome::Ready(index) => match index.resolve(location) {
                Some(page) => IndexOutcome::Ready(page),
                None => IndexOutcome::Failed(SearchError::PageNotFound(location.to_owned())),
            },
            IndexOutcome::Loading => IndexOutcome::Loading,
            IndexOutcome::Failed(error) => IndexOutcome::Failed(error),
        })
    }

    /// Snapshot of every site's cache entry, in key order. Never starts a load.
    pub fn status(&self) -> Vec<SiteStatus> {
        self.slots.values().map(|slot| slot.status()).collect()
    }
}

async fn load_site<F: IndexFetcher>(fetcher: &F, site: SiteConfig) -> Result<SiteIndex> {
    let artifacts = fetcher.fetch_all(site.index_urls()).await?;
    tokio::task::spawn_blocking(move || SiteIndex::build(site, artifacts))
        .await
        .map_err(|e| SearchError::Parse(format!("index build aborted: {e}")))?
}
