//! # Store
//!
//! The single state container shared by the query cache and the navigation
//! stack. It is owned by the application root and handed to consumers as a
//! cheap clone; there is no global instance.
//!
//! ```text
//! AppState
//! ├── requests: RequestsState      // one CacheEntry per query key
//! └── navigation: NavigationState  // pushed flag + params per screen
//! ```
//!
//! Writes only happen through [`Store::dispatch`], which runs [`reduce`]
//! synchronously inside the watch channel, so mutations never interleave.
//! Every write wakes the receivers returned by [`Store::subscribe`].

pub mod navigation;
pub mod requests;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use tokio::sync::watch;

use crate::clock::{Clock, SystemClock};
use crate::error::FeedError;

pub use navigation::{
    BreadcrumbNode, NavigationState, POST_ID, ScreenId, ScreenParams, ScreenState, USER_ID, params,
};
pub use requests::{CacheEntry, DEFAULT_STALE_AFTER, Payload, QueryStatus, RequestsState};

/// Everything the store holds.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub requests: RequestsState,
    pub navigation: NavigationState,
}

/// Every state change the store accepts.
#[derive(Clone)]
pub enum Action {
    StartLoading {
        key: String,
    },
    FetchSuccessful {
        key: String,
        data: Payload,
        fetched_at: DateTime<Utc>,
    },
    FetchError {
        key: String,
        error: Arc<FeedError>,
    },
    Navigate {
        screen: ScreenId,
        params: ScreenParams,
    },
    GoBack,
}

impl Action {
    /// Stable name of the action, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::StartLoading { .. } => "requests/startLoading",
            Action::FetchSuccessful { .. } => "requests/fetchSuccessful",
            Action::FetchError { .. } => "requests/fetchError",
            Action::Navigate { .. } => "navigation/navigate",
            Action::GoBack => "navigation/goBack",
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::StartLoading { key } => f.debug_struct("StartLoading").field("key", key).finish(),
            Action::FetchSuccessful {
                key, fetched_at, ..
            } => f
                .debug_struct("FetchSuccessful")
                .field("key", key)
                .field("fetched_at", fetched_at)
                .finish_non_exhaustive(),
            Action::FetchError { key, error } => f
                .debug_struct("FetchError")
                .field("key", key)
                .field("error", error)
                .finish(),
            Action::Navigate { screen, params } => f
                .debug_struct("Navigate")
                .field("screen", screen)
                .field("params", params)
                .finish(),
            Action::GoBack => f.write_str("GoBack"),
        }
    }
}

/// Apply an action to the state.
pub fn reduce(state: &mut AppState, action: Action) {
    match action {
        Action::StartLoading { key } => state.requests.start_loading(key),
        Action::FetchSuccessful {
            key,
            data,
            fetched_at,
        } => state.requests.fetch_successful(key, data, fetched_at),
        Action::FetchError { key, error } => state.requests.fetch_error(key, error),
        Action::Navigate { screen, params } => {
            if !state.navigation.navigate(screen, params) {
                debug!("navigate: screen {} is not declared, ignoring", screen);
            }
        }
        Action::GoBack => {
            state.navigation.go_back();
        }
    }
}

/// Shared handle to the application state.
#[derive(Clone)]
pub struct Store {
    state: Arc<watch::Sender<AppState>>,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
}

impl Store {
    /// Create a store with the system clock and the default staleness window.
    pub fn new(initial: AppState) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            state: Arc::new(state),
            clock: Arc::new(SystemClock),
            stale_after: DEFAULT_STALE_AFTER,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Apply an action and notify subscribers.
    pub fn dispatch(&self, action: Action) {
        debug!("dispatch {} {:?}", action.name(), action);
        self.state.send_modify(|state| reduce(state, action));
    }

    /// Read from the current state.
    pub fn select<R>(&self, selector: impl FnOnce(&AppState) -> R) -> R {
        selector(&self.state.borrow())
    }

    /// Receiver that is marked changed after every dispatch.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// Cache entry for a key, if one was ever created.
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.select(|state| state.requests.get(key).cloned())
    }

    pub fn navigate(&self, screen: ScreenId, params: ScreenParams) {
        self.dispatch(Action::Navigate { screen, params });
    }

    pub fn go_back(&self) {
        self.dispatch(Action::GoBack);
    }

    pub fn screen_params(&self, screen: ScreenId) -> Option<ScreenParams> {
        self.select(|state| state.navigation.screen_params(screen).cloned())
    }

    pub fn navigation(&self) -> NavigationState {
        self.select(|state| state.navigation.clone())
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}
