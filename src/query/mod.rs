//! # Query cache
//!
//! Keyed, time-boxed caching of async fetch results on top of the [`Store`].
//!
//! A [`QueryHandle`] is the per-consumer side of a query. Each time a screen
//! evaluates it, the handle reads the cache entry for its key, decides whether
//! the entry needs fetching, and returns a [`QueryResult`] snapshot with a
//! manual [`refetch`](QueryResult::refetch).
//!
//! ```text
//! query(key, fetch)
//!   ├── entry missing/stale? ── yes ─> dispatch StartLoading ─> spawn fetch
//!   │                                        ├── Ok(data)  ─> FetchSuccessful
//!   │                                        └── Err(e)    ─> FetchError
//!   └── snapshot { status, data, error, refetch }
//! ```
//!
//! Fetches are never retried, coalesced, or cancelled. Two overlapping fetches
//! for one key both run and the last to settle wins.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use log::{debug, warn};

use crate::error::{FeedError, Result};
use crate::store::{Action, CacheEntry, QueryStatus, Store};

/// Future returned by a fetch function.
pub type FetchFuture<T> = BoxFuture<'static, Result<T>>;

/// A no-argument async operation producing the data for one key.
pub type FetchFn<T> = Arc<dyn Fn() -> FetchFuture<T> + Send + Sync>;

/// Wrap an async closure as a [`FetchFn`].
pub fn fetch_fn<T, F, Fut>(f: F) -> FetchFn<T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Runs the fetch transition for one key.
pub struct Refetch<T> {
    store: Store,
    key: String,
    fetch: FetchFn<T>,
}

impl<T> Clone for Refetch<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key.clone(),
            fetch: self.fetch.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> Refetch<T> {
    pub fn new(store: Store, key: impl Into<String>, fetch: FetchFn<T>) -> Self {
        Self {
            store,
            key: key.into(),
            fetch,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Start a fetch regardless of staleness.
    ///
    /// The entry is marked loading before this returns. The returned future
    /// settles once the success or error has been written to the store.
    pub fn run(&self) -> BoxFuture<'static, ()> {
        self.store.dispatch(Action::StartLoading {
            key: self.key.clone(),
        });

        let pending = (self.fetch)();
        let store = self.store.clone();
        let key = self.key.clone();

        async move {
            match pending.await {
                Ok(data) => {
                    let fetched_at = store.now();
                    debug!("query {}: fetched", key);
                    store.dispatch(Action::FetchSuccessful {
                        key,
                        data: Arc::new(data),
                        fetched_at,
                    });
                }
                Err(error) => {
                    warn!("query {}: fetch failed: {}", key, error);
                    store.dispatch(Action::FetchError {
                        key,
                        error: Arc::new(error),
                    });
                }
            }
        }
        .boxed()
    }
}

/// Snapshot of a query as seen by one evaluation.
pub struct QueryResult<T> {
    pub status: QueryStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<Arc<FeedError>>,
    pub fetched_at: Option<DateTime<Utc>>,
    refetch: Refetch<T>,
}

impl<T: Send + Sync + 'static> QueryResult<T> {
    fn from_entry(entry: Option<&CacheEntry>, refetch: Refetch<T>) -> Self {
        Self {
            status: entry.map(|e| e.status()).unwrap_or_default(),
            data: entry.and_then(|e| e.data_as::<T>()),
            error: entry.and_then(|e| e.error().cloned()),
            fetched_at: entry.and_then(|e| e.fetched_at()),
            refetch,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// Fetch again now. See [`Refetch::run`].
    pub fn refetch(&self) -> BoxFuture<'static, ()> {
        self.refetch.run()
    }
}

/// What a handle last saw of its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Observed {
    has_data: bool,
    fetched_at: Option<DateTime<Utc>>,
}

impl Observed {
    fn of(entry: Option<&CacheEntry>) -> Self {
        Self {
            has_data: entry.is_some_and(|e| e.data().is_some()),
            fetched_at: entry.and_then(|e| e.fetched_at()),
        }
    }
}

/// Per-consumer query state.
///
/// A stale entry is fetched when the handle sees it for the first time, when
/// the entry's data or timestamp changed since the last evaluation, or when it
/// still holds data that has aged past the staleness window. A failed entry is
/// therefore not retried until a new handle evaluates it or someone refetches.
pub struct QueryHandle<T> {
    key: Option<String>,
    observed: Option<Observed>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> Default for QueryHandle<T> {
    fn default() -> Self {
        Self {
            key: None,
            observed: None,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: Send + Sync + 'static> QueryHandle<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate the query for `key`, spawning a fetch on the tokio runtime if needed.
    pub fn query(
        &mut self,
        store: &Store,
        key: impl Into<String>,
        fetch: FetchFn<T>,
    ) -> QueryResult<T> {
        let key = key.into();
        if self.key.as_deref() != Some(key.as_str()) {
            self.key = Some(key.clone());
            self.observed = None;
        }

        let refetch = Refetch::new(store.clone(), key.clone(), fetch);
        let mut entry = store.entry(&key);

        if self.should_fetch(store, entry.as_ref()) {
            debug!("query {}: stale, fetching", key);
            tokio::spawn(refetch.run());
            entry = store.entry(&key);
        }

        self.observed = Some(Observed::of(entry.as_ref()));
        QueryResult::from_entry(entry.as_ref(), refetch)
    }

    fn should_fetch(&self, store: &Store, entry: Option<&CacheEntry>) -> bool {
        let stale = entry.is_none_or(|e| e.is_stale(store.now(), store.stale_after()));
        if !stale {
            return false;
        }

        let observed = Observed::of(entry);
        self.observed != Some(observed) || observed.has_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::clock::ManualClock;
    use crate::store::AppState;

    fn counting_fetch(calls: Arc<AtomicUsize>) -> FetchFn<u64> {
        fetch_fn(move || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) as u64;
                Ok::<_, FeedError>(n + 1)
            }
        })
    }

    /// Let spawned fetches run to completion on the current-thread runtime.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_first_query_is_loading_then_success() {
        let store = Store::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut handle = QueryHandle::new();
        let before = store.now();

        let result = handle.query(&store, "answer", counting_fetch(calls.clone()));
        assert_eq!(result.status, QueryStatus::Loading);
        assert!(result.data.is_none());

        settle().await;

        let result = handle.query(&store, "answer", counting_fetch(calls.clone()));
        assert_eq!(result.status, QueryStatus::Success);
        assert_eq!(result.data.as_deref(), Some(&1));
        assert!(store.entry("answer").unwrap().fetched_at().unwrap() >= before);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_is_stored_and_not_retried() {
        let store = Store::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let failing: FetchFn<u64> = {
            let calls = calls.clone();
            fetch_fn(move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<u64, _>(FeedError::MissingParameter("user"))
                }
            })
        };
        let mut handle = QueryHandle::new();

        handle.query(&store, "userundefined", failing.clone());
        settle().await;

        let result = handle.query(&store, "userundefined", failing.clone());
        assert_eq!(result.status, QueryStatus::Error);
        assert!(result.data.is_none());
        assert!(matches!(
            result.error.as_deref(),
            Some(FeedError::MissingParameter("user"))
        ));

        settle().await;
        handle.query(&store, "userundefined", failing);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fresh_mount_retries_failed_entry() {
        let store = Store::default();
        let calls = Arc::new(AtomicUsize::new(0));
        store.dispatch(Action::StartLoading { key: "k".into() });
        store.dispatch(Action::FetchError {
            key: "k".into(),
            error: Arc::new(FeedError::NotFound("/k".into())),
        });

        let mut handle = QueryHandle::new();
        let result = handle.query(&store, "k", counting_fetch(calls.clone()));
        assert_eq!(result.status, QueryStatus::Loading);

        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.entry("k").unwrap().status(), QueryStatus::Success);
    }

    #[tokio::test]
    async fn test_staleness_uses_injected_clock() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = Store::new(AppState::default()).with_clock(clock.clone());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut handle = QueryHandle::new();

        handle.query(&store, "posts", counting_fetch(calls.clone()));
        settle().await;
        handle.query(&store, "posts", counting_fetch(calls.clone()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(chrono::Duration::seconds(29));
        let result = handle.query(&store, "posts", counting_fetch(calls.clone()));
        assert_eq!(result.status, QueryStatus::Success);
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(chrono::Duration::seconds(2));
        let result = handle.query(&store, "posts", counting_fetch(calls.clone()));
        assert_eq!(result.status, QueryStatus::Loading);
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let result = handle.query(&store, "posts", counting_fetch(calls.clone()));
        assert_eq!(result.data.as_deref(), Some(&2));
    }

    #[tokio::test]
    async fn test_loading_entry_is_not_refetched_by_same_handle() {
        let store = Store::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut handle = QueryHandle::new();

        handle.query(&store, "posts", counting_fetch(calls.clone()));
        handle.query(&store, "posts", counting_fetch(calls.clone()));
        handle.query(&store, "posts", counting_fetch(calls.clone()));
        settle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_key_change_starts_new_query() {
        let store = Store::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut handle = QueryHandle::new();

        handle.query(&store, "post1", counting_fetch(calls.clone()));
        settle().await;
        let result = handle.query(&store, "post2", counting_fetch(calls.clone()));
        assert_eq!(result.status, QueryStatus::Loading);
        settle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.select(|s| s.requests.len()), 2);
    }

    #[tokio::test]
    async fn test_refetch_marks_loading_before_resolving() {
        let store = Store::default();
        store.dispatch(Action::FetchSuccessful {
            key: "posts".into(),
            data: Arc::new(7u64),
            fetched_at: Utc::now(),
        });
        let refetch = Refetch::new(
            store.clone(),
            "posts",
            fetch_fn(|| async { Ok::<_, FeedError>(8u64) }),
        );

        let pending = refetch.run();
        assert_eq!(store.entry("posts").unwrap().status(), QueryStatus::Loading);
        assert!(store.entry("posts").unwrap().data().is_none());

        pending.await;
        let entry = store.entry("posts").unwrap();
        assert_eq!(entry.status(), QueryStatus::Success);
        assert_eq!(*entry.data_as::<u64>().unwrap(), 8);
    }

    #[tokio::test]
    async fn test_latest_fetch_fn_wins() {
        let store = Store::default();
        let mut handle: QueryHandle<u64> = QueryHandle::new();

        handle.query(&store, "v", fetch_fn(|| async { Ok::<_, FeedError>(1u64) }));
        settle().await;
        let result = handle.query(&store, "v", fetch_fn(|| async { Ok::<_, FeedError>(2u64) }));
        result.refetch().await;

        assert_eq!(*store.entry("v").unwrap().data_as::<u64>().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_overlapping_refetches_settle_to_terminal_state() {
        let store = Store::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch: FetchFn<u64> = {
            let calls = calls.clone();
            fetch_fn(move || {
                let n = calls.fetch_add(1, Ordering::SeqCst) as u64;
                async move {
                    tokio::time::sleep(Duration::from_millis(20 - n * 10)).await;
                    if n == 0 {
                        Ok(n)
                    } else {
                        Err(FeedError::NotFound("/posts".into()))
                    }
                }
            })
        };
        let refetch = Refetch::new(store.clone(), "posts", fetch);

        futures::join!(refetch.run(), refetch.run());

        let status = store.entry("posts").unwrap().status();
        assert!(matches!(status, QueryStatus::Success | QueryStatus::Error));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
