// Feed, Post, and User screens.
// Each screen owns its query handles while mounted and renders from the latest results.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use ratatui::{prelude::*, widgets::*};
use tokio::task::JoinHandle;

use crate::api::{
    ApiClient, Post, User, post_fetcher, post_key, posts_fetcher, posts_key, user_fetcher,
    user_key,
};
use crate::query::{QueryHandle, QueryResult};
use crate::store::{POST_ID, QueryStatus, ScreenId, Store, USER_ID, params};

use super::list;

/// A screen the resolver can mount.
pub trait Screen {
    /// Evaluate the screen's queries against the store.
    fn sync(&mut self, store: &Store, client: &ApiClient);

    /// Refetch everything the screen shows.
    fn refresh(&mut self);

    fn is_refreshing(&self) -> bool;

    fn render(&mut self, frame: &mut Frame, area: Rect, now: DateTime<Utc>);
}

/// In-flight manual refetches, kept to drive the refresh indicator.
#[derive(Debug, Default)]
struct Refreshes {
    handles: Vec<JoinHandle<()>>,
}

impl Refreshes {
    fn start(&mut self, pending: BoxFuture<'static, ()>) {
        self.handles.retain(|h| !h.is_finished());
        self.handles.push(tokio::spawn(pending));
    }

    fn is_active(&self) -> bool {
        self.handles.iter().any(|h| !h.is_finished())
    }
}

fn screen_block(title: &str, refreshing: bool) -> Block<'static> {
    let mut title = format!(" {} ", title);
    if refreshing {
        title.push_str("⟳ ");
    }
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title)
}

fn title_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

// ============================================================================
// Feed
// ============================================================================

/// List of all posts.
#[derive(Default)]
pub struct FeedScreen {
    posts: QueryHandle<Vec<Post>>,
    result: Option<QueryResult<Vec<Post>>>,
    list_state: ListState,
    refreshes: Refreshes,
}

impl FeedScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> QueryStatus {
        self.result.as_ref().map(|r| r.status).unwrap_or_default()
    }

    fn posts(&self) -> &[Post] {
        self.result
            .as_ref()
            .and_then(|r| r.data.as_deref())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn select_next(&mut self) {
        let len = self.posts().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_prev(&mut self) {
        if self.posts().is_empty() {
            return;
        }
        let i = self
            .list_state
            .selected()
            .map_or(0, |i| i.saturating_sub(1));
        self.list_state.select(Some(i));
    }

    pub fn selected_post(&self) -> Option<&Post> {
        self.posts().get(self.list_state.selected()?)
    }

    /// Push the Post screen for the selected post.
    pub fn open_selected(&self, store: &Store) -> bool {
        let Some(post) = self.selected_post() else {
            return false;
        };
        store.navigate(
            ScreenId::Post,
            params([(POST_ID, post.id), (USER_ID, post.user_id)]),
        );
        true
    }
}

impl Screen for FeedScreen {
    fn sync(&mut self, store: &Store, client: &ApiClient) {
        let result = self.posts.query(store, posts_key(), posts_fetcher(client));
        self.result = Some(result);

        let len = self.posts().len();
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select(None),
            None => self.list_state.select(Some(0)),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            Some(_) => {}
        }
    }

    fn refresh(&mut self) {
        if let Some(result) = &self.result {
            self.refreshes.start(result.refetch());
        }
    }

    fn is_refreshing(&self) -> bool {
        self.refreshes.is_active()
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, now: DateTime<Utc>) {
        let mut block = screen_block("Feed", self.is_refreshing());
        if let Some(fetched_at) = self.result.as_ref().and_then(|r| r.fetched_at) {
            block = block.title_bottom(
                Line::from(format!(" updated {} ", list::format_relative_time(&fetched_at, &now)))
                    .right_aligned(),
            );
        }

        let has_data = self.result.as_ref().is_some_and(|r| r.data.is_some());
        match self.status() {
            QueryStatus::Loading => return list::render_loading(frame, area, block),
            QueryStatus::Success if has_data => {}
            _ => return list::render_error(frame, area, block),
        }
        if self.posts().is_empty() {
            return list::render_empty(frame, area, "No posts", block);
        }

        let items: Vec<ListItem> = self
            .posts()
            .iter()
            .map(|post| {
                ListItem::new(vec![
                    Line::from(Span::styled(post.title.clone(), title_style())),
                    Line::from(list::preview_body(&post.body).replace('\n', " ")),
                    Line::from(""),
                ])
            })
            .collect();

        let list_widget = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("> ");

        frame.render_stateful_widget(list_widget, area, &mut self.list_state);
    }
}

// ============================================================================
// Post
// ============================================================================

/// A single post and its author.
#[derive(Default)]
pub struct PostScreen {
    user: QueryHandle<User>,
    post: QueryHandle<Post>,
    user_result: Option<QueryResult<User>>,
    post_result: Option<QueryResult<Post>>,
    refreshes: Refreshes,
}

impl PostScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn author(&self) -> Option<&User> {
        self.user_result.as_ref()?.data.as_deref()
    }

    pub fn post(&self) -> Option<&Post> {
        self.post_result.as_ref()?.data.as_deref()
    }

    /// Push the User screen for the post's author, once loaded.
    pub fn open_author(&self, store: &Store) -> bool {
        let Some(user) = self.author() else {
            return false;
        };
        store.navigate(ScreenId::User, params([(USER_ID, user.id)]));
        true
    }

    fn author_lines(&self) -> Vec<Line<'static>> {
        match &self.user_result {
            Some(result) if result.status == QueryStatus::Success => match self.author() {
                Some(user) => vec![
                    Line::from(vec![
                        Span::styled(user.name.clone(), title_style().fg(Color::Cyan)),
                        Span::styled("  ↵ view profile", Style::default().fg(Color::DarkGray)),
                    ]),
                    Line::from(Span::styled(
                        user.avatar_url.clone(),
                        Style::default().fg(Color::DarkGray),
                    )),
                ],
                None => vec![error_line()],
            },
            Some(result) if result.is_error() => vec![error_line()],
            _ => vec![loading_line()],
        }
    }

    fn post_lines(&self) -> Vec<Line<'static>> {
        match &self.post_result {
            Some(result) if result.status == QueryStatus::Success => match self.post() {
                Some(post) => {
                    let mut lines = vec![Line::from(Span::styled(post.title.clone(), title_style()))];
                    lines.extend(post.body.lines().map(|l| Line::from(l.to_string())));
                    lines
                }
                None => vec![error_line()],
            },
            Some(result) if result.is_error() => vec![error_line()],
            _ => vec![loading_line()],
        }
    }
}

fn loading_line() -> Line<'static> {
    Line::from(Span::styled("loading...", Style::default().fg(Color::Yellow)))
}

fn error_line() -> Line<'static> {
    Line::from(Span::styled(
        "Unknown error occurred",
        Style::default().fg(Color::Red),
    ))
}

impl Screen for PostScreen {
    fn sync(&mut self, store: &Store, client: &ApiClient) {
        let screen_params = store.screen_params(ScreenId::Post).unwrap_or_default();
        let user_id = screen_params.get(USER_ID).copied();
        let post_id = screen_params.get(POST_ID).copied();

        self.user_result = Some(self.user.query(
            store,
            user_key(user_id),
            user_fetcher(client, user_id),
        ));
        self.post_result = Some(self.post.query(
            store,
            post_key(post_id),
            post_fetcher(client, post_id),
        ));
    }

    fn refresh(&mut self) {
        if let Some(result) = &self.user_result {
            self.refreshes.start(result.refetch());
        }
        if let Some(result) = &self.post_result {
            self.refreshes.start(result.refetch());
        }
    }

    fn is_refreshing(&self) -> bool {
        self.refreshes.is_active()
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, _now: DateTime<Utc>) {
        let mut lines = self.author_lines();
        lines.push(Line::from(""));
        lines.extend(self.post_lines());

        let text = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(screen_block("Post", self.is_refreshing()));
        frame.render_widget(text, area);
    }
}

// ============================================================================
// User
// ============================================================================

/// Full profile of a user.
#[derive(Default)]
pub struct UserScreen {
    user: QueryHandle<User>,
    result: Option<QueryResult<User>>,
    refreshes: Refreshes,
}

impl UserScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&User> {
        self.result.as_ref()?.data.as_deref()
    }
}

impl Screen for UserScreen {
    fn sync(&mut self, store: &Store, client: &ApiClient) {
        let user_id = store
            .screen_params(ScreenId::User)
            .and_then(|p| p.get(USER_ID).copied());
        self.result = Some(self.user.query(
            store,
            user_key(user_id),
            user_fetcher(client, user_id),
        ));
    }

    fn refresh(&mut self) {
        if let Some(result) = &self.result {
            self.refreshes.start(result.refetch());
        }
    }

    fn is_refreshing(&self) -> bool {
        self.refreshes.is_active()
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, _now: DateTime<Utc>) {
        let block = screen_block("User", self.is_refreshing());

        // Shown raw, whatever state the query is in.
        let json = self
            .user()
            .and_then(|user| serde_json::to_string_pretty(user).ok())
            .unwrap_or_default();

        let text = Paragraph::new(json)
            .wrap(Wrap { trim: false })
            .block(block);
        frame.render_widget(text, area);
    }
}
