// Breadcrumb rendering for the navigation trail.
// Shows every pushed screen in declaration order.

use chrono::{DateTime, Utc};
use ratatui::{prelude::*, widgets::*};

use crate::store::BreadcrumbNode;

/// Format timestamp for display in the local timezone.
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    let local: DateTime<chrono::Local> = dt.with_timezone(&chrono::Local);
    local.format("%H:%M:%S").to_string()
}

/// Render the breadcrumb trail, with the clock on the right.
pub fn draw_breadcrumb(
    frame: &mut Frame,
    breadcrumbs: &[BreadcrumbNode],
    area: Rect,
    now: DateTime<Utc>,
) {
    let mut spans = Vec::new();

    for (i, node) in breadcrumbs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
        }

        let style = if i == breadcrumbs.len() - 1 {
            // Current level is highlighted
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        spans.push(Span::styled(node.label.clone(), style));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);

    let timestamp = Paragraph::new(Span::styled(
        format_timestamp(&now),
        Style::default().fg(Color::DarkGray),
    ))
    .alignment(Alignment::Right);
    frame.render_widget(
        timestamp,
        Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height: 1.min(area.height),
        },
    );
}
