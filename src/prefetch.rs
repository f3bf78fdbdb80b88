//! Concurrent page prefetching
//!
//! A [`Prefetcher`] fans a list of URLs out to a fixed number of worker tasks
//! and lets a single consumer read the pages back in whatever order it needs:
//!
//! - **Write-once cache**: each URL is recorded exactly once; an empty body
//!   means every attempt failed, an absent key means "not fetched yet".
//! - **Awaiting lookup**: [`Prefetcher::lookup`] waits on a readiness signal
//!   until the page is recorded. Pages that nobody is fetching are fetched
//!   directly and not cached.
//! - **Fire-and-forget dispatch**: [`Prefetcher::dispatch`] returns at once;
//!   the lookup is the only synchronisation point.
//!
//! # Examples
//!
//! ```ignore
//! use filmow_export::{FetchPolicy, HttpFetcher, Prefetcher};
//! use std::sync::Arc;
//!
//! let prefetcher = Prefetcher::new(Arc::new(HttpFetcher::new()?), FetchPolicy::default());
//! prefetcher.dispatch(&urls, 15);
//!
//! for url in &urls {
//!     let body = prefetcher.lookup(url).await;
//! }
//! ```

use std::{
    collections::{HashMap, hash_map},
    pin::pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::Notify;
use tracing::debug;

use crate::fetch::{FetchPolicy, Fetcher, fetch_batch, fetch_once};

#[derive(Debug, Default)]
struct CacheState {
    pages: HashMap<String, String>,
    active_workers: usize,
}

/// Shared URL to body map plus the number of workers still filling it
///
/// The lock is only held for a single map or counter operation; it is never
/// held across a fetch or an `.await`.
#[derive(Debug, Default)]
pub struct PrefetchCache {
    state: Mutex<CacheState>,
    changed: Notify,
}

impl PrefetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a fetched page; returns `false` if the URL was already recorded
    ///
    /// The first value recorded for a URL is final.
    pub fn record(&self, url: &str, body: String) -> bool {
        let inserted = match self.lock().pages.entry(url.to_string()) {
            hash_map::Entry::Occupied(_) => false,
            hash_map::Entry::Vacant(slot) => {
                slot.insert(body);
                true
            }
        };
        self.changed.notify_waiters();
        inserted
    }

    /// Completed value for `url`, if any
    pub fn get(&self, url: &str) -> Option<String> {
        self.lock().pages.get(url).cloned()
    }

    /// Number of recorded pages
    pub fn len(&self) -> usize {
        self.lock().pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Workers that have been dispatched and have not finished yet
    pub fn active_workers(&self) -> usize {
        self.lock().active_workers
    }

    /// Count a worker as active until the returned guard is dropped
    pub fn worker_started(self: &Arc<Self>) -> WorkerGuard {
        self.lock().active_workers += 1;
        WorkerGuard {
            cache: Arc::clone(self),
        }
    }

    /// Wait until `url` is recorded
    ///
    /// Returns `None` without waiting when no worker is active, and also
    /// when the last worker finishes without recording `url`.
    pub async fn wait_for(&self, url: &str) -> Option<String> {
        loop {
            let mut notified = pin!(self.changed.notified());
            notified.as_mut().enable();
            {
                let state = self.lock();
                if let Some(body) = state.pages.get(url) {
                    return Some(body.clone());
                }
                if state.active_workers == 0 {
                    return None;
                }
            }
            notified.await;
        }
    }
}

/// Marks one prefetch worker as active for as long as it lives
///
/// Dropping the guard, on normal completion or on panic, decrements the
/// active-worker count and wakes any waiting lookup.
#[derive(Debug)]
pub struct WorkerGuard {
    cache: Arc<PrefetchCache>,
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        {
            let mut state = self.cache.lock();
            state.active_workers = state.active_workers.saturating_sub(1);
        }
        self.cache.changed.notify_waiters();
    }
}

/// Split `urls` into `workers` interleaved shards
///
/// Shard `i` holds `urls[i]`, `urls[i + workers]`, ... so that a slow stretch
/// of the list is spread over every worker. Empty shards are dropped.
pub fn shard(urls: &[String], workers: usize) -> Vec<Vec<String>> {
    let workers = workers.max(1);
    (0..workers)
        .map(|i| urls.iter().skip(i).step_by(workers).cloned().collect::<Vec<_>>())
        .filter(|chunk| !chunk.is_empty())
        .collect()
}

/// Prefetch dispatcher and cache front-end for one run
#[derive(Clone)]
pub struct Prefetcher {
    cache: Arc<PrefetchCache>,
    fetcher: Arc<dyn Fetcher>,
    policy: Arc<FetchPolicy>,
}

impl Prefetcher {
    pub fn new(fetcher: Arc<dyn Fetcher>, policy: FetchPolicy) -> Self {
        Self {
            cache: Arc::new(PrefetchCache::new()),
            fetcher,
            policy: Arc::new(policy),
        }
    }

    pub fn cache(&self) -> &Arc<PrefetchCache> {
        &self.cache
    }

    pub fn fetcher(&self) -> &dyn Fetcher {
        self.fetcher.as_ref()
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Launch up to `workers` tasks fetching `urls`; returns the number launched
    ///
    /// Workers are counted as active before this returns, so a lookup issued
    /// right after dispatching waits for them instead of fetching directly.
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, urls: &[String], workers: usize) -> usize {
        let shards = shard(urls, workers);
        let launched = shards.len();

        for chunk in shards {
            let guard = self.cache.worker_started();
            let cache = Arc::clone(&self.cache);
            let fetcher = Arc::clone(&self.fetcher);
            let policy = Arc::clone(&self.policy);

            tokio::spawn(async move {
                let _guard = guard;
                fetch_batch(fetcher.as_ref(), &chunk, &policy, |url, body| {
                    cache.record(url, body);
                })
                .await;
            });
        }

        debug!(urls = urls.len(), workers = launched, "dispatched prefetch batch");
        launched
    }

    /// Body of `url`, waiting for the workers if they may still fetch it
    ///
    /// A page that no worker recorded is fetched directly with a single
    /// long-timeout attempt and is not cached. Failures yield `""`.
    pub async fn lookup(&self, url: &str) -> String {
        match self.cache.wait_for(url).await {
            Some(body) => body,
            None => fetch_once(self.fetcher.as_ref(), url, self.policy.direct_timeout).await,
        }
    }
}
