// Navigation state management.
// Tracks which of the declared screens are pushed and the params they were pushed with.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::FeedError;

/// Param key for the post a screen shows.
pub const POST_ID: &str = "postId";
/// Param key for the user a screen shows.
pub const USER_ID: &str = "userId";

/// Numeric params a screen was pushed with.
pub type ScreenParams = BTreeMap<String, u64>;

/// The closed set of screens in the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenId {
    Feed,
    Post,
    User,
}

impl ScreenId {
    /// All screens in declaration order.
    pub const ALL: [ScreenId; 3] = [ScreenId::Feed, ScreenId::Post, ScreenId::User];

    pub fn name(&self) -> &'static str {
        match self {
            ScreenId::Feed => "Feed",
            ScreenId::Post => "Post",
            ScreenId::User => "User",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScreenId {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScreenId::ALL
            .into_iter()
            .find(|screen| screen.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| FeedError::UnknownScreen(s.to_string()))
    }
}

/// Build screen params from `(name, value)` pairs.
pub fn params<const N: usize>(pairs: [(&str, u64); N]) -> ScreenParams {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// State of one declared screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenState {
    pub screen: ScreenId,
    pub params: ScreenParams,
    pub is_pushed: bool,
}

impl ScreenState {
    pub fn new(screen: ScreenId, is_pushed: bool) -> Self {
        Self {
            screen,
            params: ScreenParams::new(),
            is_pushed,
        }
    }
}

/// A node in the navigation breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreadcrumbNode {
    /// Display label for the breadcrumb.
    pub label: String,
    /// The screen this node represents.
    pub screen: ScreenId,
}

/// Pushed/not-pushed flags for a fixed, ordered set of screens.
///
/// This is not a history stack: several screens can be pushed at once, and
/// [`go_back`](Self::go_back) pops whichever pushed screen comes last in
/// declaration order, regardless of the order they were visited in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    screens: Vec<ScreenState>,
}

impl NavigationState {
    /// Create navigation state over the given declared screens.
    pub fn new(screens: Vec<ScreenState>) -> Self {
        Self { screens }
    }

    /// Declared screens in order.
    pub fn screens(&self) -> &[ScreenState] {
        &self.screens
    }

    /// Push a screen with new params. Returns false if the screen isn't declared.
    pub fn navigate(&mut self, screen: ScreenId, params: ScreenParams) -> bool {
        match self.screens.iter_mut().find(|s| s.screen == screen) {
            Some(state) => {
                state.is_pushed = true;
                state.params = params;
                true
            }
            None => false,
        }
    }

    /// Unpush the last pushed screen in declaration order.
    pub fn go_back(&mut self) -> Option<ScreenId> {
        let state = self.screens.iter_mut().rev().find(|s| s.is_pushed)?;
        state.is_pushed = false;
        Some(state.screen)
    }

    pub fn screen_params(&self, screen: ScreenId) -> Option<&ScreenParams> {
        self.find(screen).map(|s| &s.params)
    }

    pub fn is_pushed(&self, screen: ScreenId) -> bool {
        self.find(screen).is_some_and(|s| s.is_pushed)
    }

    /// The pushed screen drawn on top (last pushed in declaration order).
    pub fn top(&self) -> Option<ScreenId> {
        self.screens
            .iter()
            .rev()
            .find(|s| s.is_pushed)
            .map(|s| s.screen)
    }

    /// Get the breadcrumb trail of pushed screens.
    pub fn breadcrumbs(&self) -> Vec<BreadcrumbNode> {
        self.screens
            .iter()
            .filter(|s| s.is_pushed)
            .map(|s| BreadcrumbNode {
                label: breadcrumb_label(s),
                screen: s.screen,
            })
            .collect()
    }

    fn find(&self, screen: ScreenId) -> Option<&ScreenState> {
        self.screens.iter().find(|s| s.screen == screen)
    }
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::new(vec![
            ScreenState::new(ScreenId::Feed, true),
            ScreenState::new(ScreenId::Post, false),
            ScreenState::new(ScreenId::User, false),
        ])
    }
}

fn breadcrumb_label(state: &ScreenState) -> String {
    match state.screen {
        ScreenId::Feed => "Feed".to_string(),
        ScreenId::Post => match state.params.get(POST_ID) {
            Some(id) => format!("Post #{}", id),
            None => "Post".to_string(),
        },
        ScreenId::User => match state.params.get(USER_ID) {
            Some(id) => format!("User #{}", id),
            None => "User".to_string(),
        },
    }
}
