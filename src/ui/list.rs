// Shared rendering helpers for screens.
// Provides loading, error, and empty states plus text formatting.

use chrono::{DateTime, Utc};
use ratatui::{prelude::*, widgets::*};

/// Longest body shown in the feed before truncation.
pub const BODY_PREVIEW_LEN: usize = 100;

/// Format a timestamp as relative time (e.g., "2m ago").
pub fn format_relative_time(dt: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(*dt);

    if duration.num_days() > 0 {
        format!("{}d ago", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m ago", duration.num_minutes())
    } else {
        "just now".to_string()
    }
}

/// Shorten a post body for the feed.
///
/// Bodies over the preview length are cut, lose their first line break, and
/// get an ellipsis.
pub fn preview_body(body: &str) -> String {
    if body.chars().count() <= BODY_PREVIEW_LEN {
        return body.to_string();
    }
    let cut: String = body.chars().take(BODY_PREVIEW_LEN).collect();
    format!("{}...", cut.replacen('\n', "", 1))
}

/// Render a loading indicator.
pub fn render_loading(frame: &mut Frame, area: Rect, block: Block) {
    let text = Paragraph::new("loading...")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow))
        .block(block);
    frame.render_widget(text, area);
}

/// Render the generic error message.
pub fn render_error(frame: &mut Frame, area: Rect, block: Block) {
    let text = Paragraph::new("Unknown error occurred")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Red))
        .block(block);
    frame.render_widget(text, area);
}

/// Render an empty state message.
pub fn render_empty(frame: &mut Frame, area: Rect, message: &str, block: Block) {
    let text = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray))
        .block(block);
    frame.render_widget(text, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_body_is_unchanged() {
        let body = "quia et suscipit\nsuscipit recusandae";
        assert_eq!(preview_body(body), body);
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = format!("first line\nsecond line\n{}", "x".repeat(200));
        let preview = preview_body(&body);

        assert!(preview.ends_with("..."));
        assert!(preview.starts_with("first linesecond line\n"));
        // 100 chars kept, one newline dropped, three dots added.
        assert_eq!(preview.chars().count(), 99 + 3);
    }

    #[test]
    fn test_body_at_limit_is_unchanged() {
        let body = "y".repeat(BODY_PREVIEW_LEN);
        assert_eq!(preview_body(&body), body);
    }

    #[test]
    fn test_format_relative_time() {
        let now = Utc::now();
        assert_eq!(format_relative_time(&now, &now), "just now");
        assert_eq!(
            format_relative_time(&(now - chrono::Duration::minutes(5)), &now),
            "5m ago"
        );
        assert_eq!(
            format_relative_time(&(now - chrono::Duration::hours(3)), &now),
            "3h ago"
        );
    }
}
