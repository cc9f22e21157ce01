// UI module for rendering the TUI.
// Contains the breadcrumb, the stacked screens, and the status bar.

mod breadcrumb;
mod list;
pub mod screens;
pub mod transition;

use ratatui::{prelude::*, widgets::*};

use crate::app::App;
use crate::store::ScreenId;

/// Main draw function that renders the entire UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Breadcrumb
            Constraint::Min(1),    // Screens
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let breadcrumbs = app.store.navigation().breadcrumbs();
    breadcrumb::draw_breadcrumb(frame, &breadcrumbs, chunks[0], app.store.now());

    draw_screens(frame, app, chunks[1]);

    draw_status_bar(frame, app, chunks[2]);
}

/// Draw every mounted screen bottom to top, each slid right by its transition.
fn draw_screens(frame: &mut Frame, app: &mut App, area: Rect) {
    let now = app.store.now();
    let layers: Vec<(ScreenId, u16)> = app
        .resolver
        .mounted()
        .map(|(id, t)| (id, t.offset(area.width, app.last_tick)))
        .collect();

    for (id, offset) in layers {
        let offset = offset.min(area.width);
        let layer = Rect {
            x: area.x + offset,
            width: area.width - offset,
            ..area
        };
        if layer.width == 0 {
            continue;
        }
        if let Some(screen) = app.screen_mut(id) {
            frame.render_widget(Clear, layer);
            screen.render(frame, layer, now);
        }
    }
}

/// Draw the status bar with keybinding hints and the refresh indicator.
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let top = app.top_screen();
    let key = |k: &'static str| Span::raw(k);
    let hint = |h: &'static str| Span::styled(h, Style::default().fg(Color::DarkGray));

    let mut hints = match top {
        ScreenId::Feed => vec![
            key(" ↑↓ "),
            hint("Navigate"),
            key("  ↵ "),
            hint("Open"),
        ],
        ScreenId::Post => vec![key(" ↵ "), hint("Author"), key("  Esc "), hint("Back")],
        ScreenId::User => vec![key(" Esc "), hint("Back")],
    };
    hints.extend([key("  r "), hint("Refresh"), key("  q "), hint("Quit")]);

    if app.screen(top).is_some_and(|s| s.is_refreshing()) {
        hints.push(Span::styled(
            "  ⟳ refreshing",
            Style::default().fg(Color::Yellow),
        ));
    }

    let status = Paragraph::new(Line::from(hints));
    frame.render_widget(status, area);
}
