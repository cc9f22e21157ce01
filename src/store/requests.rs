// Request cache slice of the store.
// One entry per query key, tracking fetch status, payload, error, and freshness.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::FeedError;

/// Default window during which a successful fetch counts as fresh.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30);

/// Type-erased result of a fetch. Readers downcast to the type they expect.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Status of a cached request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
    #[default]
    Loading,
    Success,
    Error,
}

/// Cached state for a single request key.
///
/// Only the three constructors build entries, so `data` is present only on
/// success, `error` only on failure, and `fetched_at` exactly when the status
/// is [`QueryStatus::Success`].
#[derive(Clone)]
pub struct CacheEntry {
    status: QueryStatus,
    data: Option<Payload>,
    error: Option<Arc<FeedError>>,
    fetched_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// Entry for a request that is in flight.
    pub fn loading() -> Self {
        Self {
            status: QueryStatus::Loading,
            data: None,
            error: None,
            fetched_at: None,
        }
    }

    /// Entry for a request that completed with data.
    pub fn succeeded(data: Payload, fetched_at: DateTime<Utc>) -> Self {
        Self {
            status: QueryStatus::Success,
            data: Some(data),
            error: None,
            fetched_at: Some(fetched_at),
        }
    }

    /// Entry for a request that failed.
    pub fn failed(error: Arc<FeedError>) -> Self {
        Self {
            status: QueryStatus::Error,
            data: None,
            error: Some(error),
            fetched_at: None,
        }
    }

    pub fn status(&self) -> QueryStatus {
        self.status
    }

    pub fn data(&self) -> Option<&Payload> {
        self.data.as_ref()
    }

    /// Data downcast to `T`. `None` when absent or stored under another type.
    pub fn data_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.data.clone().and_then(|data| data.downcast::<T>().ok())
    }

    pub fn error(&self) -> Option<&Arc<FeedError>> {
        self.error.as_ref()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// Check if the entry should be fetched again.
    ///
    /// Entries without data are always stale. Entries with data are stale once
    /// more than `window` has elapsed since they were fetched. A `fetched_at`
    /// in the future (clock skew) counts as fresh.
    pub fn is_stale(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let Some(fetched_at) = self.fetched_at.filter(|_| self.data.is_some()) else {
            return true;
        };

        let elapsed = now
            .signed_duration_since(fetched_at)
            .to_std()
            .unwrap_or(Duration::ZERO);

        elapsed > window
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("status", &self.status)
            .field("has_data", &self.data.is_some())
            .field("error", &self.error)
            .field("fetched_at", &self.fetched_at)
            .finish()
    }
}

/// All cached requests, keyed by query key.
#[derive(Debug, Clone, Default)]
pub struct RequestsState {
    entries: HashMap<String, CacheEntry>,
}

impl RequestsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mark a request as in flight, dropping any previous data or error.
    pub fn start_loading(&mut self, key: String) {
        self.entries.insert(key, CacheEntry::loading());
    }

    /// Record a successful fetch.
    pub fn fetch_successful(&mut self, key: String, data: Payload, fetched_at: DateTime<Utc>) {
        self.entries
            .insert(key, CacheEntry::succeeded(data, fetched_at));
    }

    /// Record a failed fetch.
    pub fn fetch_error(&mut self, key: String, error: Arc<FeedError>) {
        self.entries.insert(key, CacheEntry::failed(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload<T: Any + Send + Sync>(value: T) -> Payload {
        Arc::new(value)
    }

    #[test]
    fn test_transitions_keep_fields_consistent() {
        let mut requests = RequestsState::new();
        let now = Utc::now();

        requests.start_loading("posts".to_string());
        let entry = requests.get("posts").unwrap();
        assert_eq!(entry.status(), QueryStatus::Loading);
        assert!(entry.data().is_none());
        assert!(entry.error().is_none());
        assert!(entry.fetched_at().is_none());

        requests.fetch_successful("posts".to_string(), payload(vec![1, 2, 3]), now);
        let entry = requests.get("posts").unwrap();
        assert_eq!(entry.status(), QueryStatus::Success);
        assert_eq!(*entry.data_as::<Vec<i32>>().unwrap(), vec![1, 2, 3]);
        assert!(entry.error().is_none());
        assert_eq!(entry.fetched_at(), Some(now));

        requests.fetch_error(
            "posts".to_string(),
            Arc::new(FeedError::MissingParameter("post")),
        );
        let entry = requests.get("posts").unwrap();
        assert_eq!(entry.status(), QueryStatus::Error);
        assert!(entry.data().is_none());
        assert!(entry.fetched_at().is_none());
        assert!(matches!(
            entry.error().map(|e| e.as_ref()),
            Some(FeedError::MissingParameter("post"))
        ));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut requests = RequestsState::new();
        requests.start_loading("post1".to_string());
        requests.fetch_successful("post2".to_string(), payload("two"), Utc::now());

        assert_eq!(requests.len(), 2);
        assert_eq!(requests.get("post1").unwrap().status(), QueryStatus::Loading);
        assert_eq!(requests.get("post2").unwrap().status(), QueryStatus::Success);
        assert!(requests.get("post3").is_none());
    }

    #[test]
    fn test_staleness_window() {
        let fetched_at = Utc::now();
        let entry = CacheEntry::succeeded(payload(1u8), fetched_at);

        let at_29 = fetched_at + chrono::Duration::seconds(29);
        let at_31 = fetched_at + chrono::Duration::seconds(31);

        assert!(!entry.is_stale(at_29, DEFAULT_STALE_AFTER));
        assert!(entry.is_stale(at_31, DEFAULT_STALE_AFTER));
    }

    #[test]
    fn test_entries_without_data_are_stale() {
        let now = Utc::now();
        assert!(CacheEntry::loading().is_stale(now, DEFAULT_STALE_AFTER));

        let failed = CacheEntry::failed(Arc::new(FeedError::NotFound("x".into())));
        assert!(failed.is_stale(now, DEFAULT_STALE_AFTER));
    }

    #[test]
    fn test_future_timestamp_is_fresh() {
        let now = Utc::now();
        let entry = CacheEntry::succeeded(payload(1u8), now + chrono::Duration::seconds(600));
        assert!(!entry.is_stale(now, DEFAULT_STALE_AFTER));
    }

    #[test]
    fn test_downcast_to_wrong_type_is_none() {
        let entry = CacheEntry::succeeded(payload(42u64), Utc::now());
        assert!(entry.data_as::<String>().is_none());
        assert_eq!(*entry.data_as::<u64>().unwrap(), 42);
    }
}
