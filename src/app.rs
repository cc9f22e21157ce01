// App state and main event loop.
// Mounts screens as the resolver shows them and routes keyboard input to the top screen.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::prelude::*;

use crate::api::ApiClient;
use crate::store::{ScreenId, Store};
use crate::ui::{
    self,
    screens::{FeedScreen, PostScreen, Screen, UserScreen},
    transition::ScreenResolver,
};

/// How long to wait for input before redrawing.
const FRAME: Duration = Duration::from_millis(33);

/// Main application state.
pub struct App {
    pub store: Store,
    pub client: ApiClient,
    pub resolver: ScreenResolver,
    pub feed: Option<FeedScreen>,
    pub post: Option<PostScreen>,
    pub user: Option<UserScreen>,
    /// Instant of the last tick, used for transition offsets.
    pub last_tick: Instant,
    /// Whether the app should exit.
    pub should_quit: bool,
}

impl App {
    pub fn new(store: Store, client: ApiClient, transition: Duration) -> Self {
        let now = Instant::now();
        let resolver = ScreenResolver::new(&store.navigation(), now, transition);
        Self {
            store,
            client,
            resolver,
            feed: None,
            post: None,
            user: None,
            last_tick: now,
            should_quit: false,
        }
    }

    /// Main event loop.
    pub fn run(&mut self, terminal: &mut Terminal<impl Backend>) -> io::Result<()> {
        while !self.should_quit {
            self.tick(Instant::now());
            terminal.draw(|frame| ui::draw(frame, self))?;
            self.handle_events()?;
        }
        Ok(())
    }

    /// Advance transitions, mount or drop screen state, and re-run queries.
    pub fn tick(&mut self, now: Instant) {
        self.last_tick = now;
        self.resolver.sync(&self.store.navigation(), now);

        mount(&mut self.feed, self.resolver.is_mounted(ScreenId::Feed));
        mount(&mut self.post, self.resolver.is_mounted(ScreenId::Post));
        mount(&mut self.user, self.resolver.is_mounted(ScreenId::User));

        for id in ScreenId::ALL {
            let (store, client) = (&self.store, &self.client);
            let screen = match id {
                ScreenId::Feed => self.feed.as_mut().map(|s| s as &mut dyn Screen),
                ScreenId::Post => self.post.as_mut().map(|s| s as &mut dyn Screen),
                ScreenId::User => self.user.as_mut().map(|s| s as &mut dyn Screen),
            };
            if let Some(screen) = screen {
                screen.sync(store, client);
            }
        }
    }

    /// Top-most pushed screen.
    pub fn top_screen(&self) -> ScreenId {
        self.store
            .select(|state| state.navigation.top())
            .unwrap_or(ScreenId::Feed)
    }

    pub fn screen(&self, id: ScreenId) -> Option<&dyn Screen> {
        match id {
            ScreenId::Feed => self.feed.as_ref().map(|s| s as &dyn Screen),
            ScreenId::Post => self.post.as_ref().map(|s| s as &dyn Screen),
            ScreenId::User => self.user.as_ref().map(|s| s as &dyn Screen),
        }
    }

    pub fn screen_mut(&mut self, id: ScreenId) -> Option<&mut dyn Screen> {
        match id {
            ScreenId::Feed => self.feed.as_mut().map(|s| s as &mut dyn Screen),
            ScreenId::Post => self.post.as_mut().map(|s| s as &mut dyn Screen),
            ScreenId::User => self.user.as_mut().map(|s| s as &mut dyn Screen),
        }
    }

    /// Handle keyboard and other events.
    #[allow(clippy::collapsible_if)]
    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(FRAME)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key.code);
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        let top = self.top_screen();
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => {
                if let (ScreenId::Feed, Some(feed)) = (top, self.feed.as_mut()) {
                    feed.select_prev();
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let (ScreenId::Feed, Some(feed)) = (top, self.feed.as_mut()) {
                    feed.select_next();
                }
            }
            KeyCode::Enter => {
                let opened = match top {
                    ScreenId::Feed => self
                        .feed
                        .as_ref()
                        .is_some_and(|s| s.open_selected(&self.store)),
                    ScreenId::Post => self
                        .post
                        .as_ref()
                        .is_some_and(|s| s.open_author(&self.store)),
                    ScreenId::User => false,
                };
                if opened {
                    log::info!("Opened {} from {}", self.top_screen(), top);
                }
            }
            KeyCode::Esc | KeyCode::Backspace => {
                // The feed is the root and cannot be popped.
                if top != ScreenId::Feed {
                    self.store.go_back();
                    log::info!("Back from {}", top);
                }
            }
            KeyCode::Char('r') => {
                if let Some(screen) = self.screen_mut(top) {
                    screen.refresh();
                    log::info!("Refreshing {}", top);
                }
            }
            _ => {}
        }
    }
}

fn mount<S: Default>(slot: &mut Option<S>, mounted: bool) {
    match (slot.is_some(), mounted) {
        (false, true) => *slot = Some(S::default()),
        (true, false) => *slot = None,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::api::{Post, posts_key};
    use crate::store::{Action, POST_ID, QueryStatus, USER_ID, params};

    fn seeded_app() -> App {
        let store = Store::default();
        store.dispatch(Action::FetchSuccessful {
            key: posts_key(),
            data: Arc::new(vec![
                Post {
                    id: 1,
                    user_id: 10,
                    title: "one".to_string(),
                    body: "first".to_string(),
                },
                Post {
                    id: 2,
                    user_id: 20,
                    title: "two".to_string(),
                    body: "second".to_string(),
                },
            ]),
            fetched_at: store.now(),
        });
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        App::new(store, client, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_feed_mounted_on_first_tick() {
        let mut app = seeded_app();
        assert!(app.feed.is_none());

        app.tick(Instant::now());
        assert!(app.feed.is_some());
        assert!(app.post.is_none());
        assert_eq!(app.top_screen(), ScreenId::Feed);
    }

    #[tokio::test]
    async fn test_drill_down_and_back() {
        let mut app = seeded_app();
        app.tick(Instant::now());

        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.top_screen(), ScreenId::Post);
        assert_eq!(
            app.store.screen_params(ScreenId::Post),
            Some(params([(POST_ID, 2), (USER_ID, 20)]))
        );

        app.tick(Instant::now());
        assert!(app.post.is_some());

        app.handle_key(KeyCode::Esc);
        assert_eq!(app.top_screen(), ScreenId::Feed);
        app.tick(Instant::now());
        assert!(app.post.is_none());
        assert!(app.feed.is_some());
    }

    #[tokio::test]
    async fn test_back_on_feed_is_ignored() {
        let mut app = seeded_app();
        app.tick(Instant::now());

        app.handle_key(KeyCode::Esc);
        assert_eq!(app.top_screen(), ScreenId::Feed);
        assert!(app.store.navigation().is_pushed(ScreenId::Feed));
    }

    #[tokio::test]
    async fn test_refresh_marks_top_query_loading() {
        let mut app = seeded_app();
        app.tick(Instant::now());

        app.handle_key(KeyCode::Char('r'));
        let entry = app.store.entry(&posts_key()).unwrap();
        assert_eq!(entry.status(), QueryStatus::Loading);
        assert!(app.screen(ScreenId::Feed).unwrap().is_refreshing());
    }

    #[tokio::test]
    async fn test_quit() {
        let mut app = seeded_app();
        app.handle_key(KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
