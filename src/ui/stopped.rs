//! Stopped-services view rendering.
//!
//! Lists every stopped process reported by the supervision checks,
//! critical hosts before warning hosts, each with its shortened host
//! label.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::{ServiceStatus, StoppedEntry};

/// Render the Stopped view.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    if app.page.is_none() {
        return;
    }
    let overview = &app.stopped;

    let block = Block::default()
        .title(format!(" Stopped Services ({}) ", overview.entries.len()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type);

    if overview.is_empty() {
        let empty = Paragraph::new("No stopped services reported")
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();

    let critical: Vec<&StoppedEntry> = overview.critical().collect();
    if !critical.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("● Critical ({})", critical.len()),
            app.theme
                .status_style(ServiceStatus::Critical)
                .add_modifier(Modifier::BOLD),
        )));
        for entry in critical {
            lines.push(entry_line(entry, app));
        }
        lines.push(Line::from(""));
    }

    let warning: Vec<&StoppedEntry> = overview.warning().collect();
    if !warning.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("● Warning ({})", warning.len()),
            app.theme
                .status_style(ServiceStatus::Warning)
                .add_modifier(Modifier::BOLD),
        )));
        for entry in warning {
            lines.push(entry_line(entry, app));
        }
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn entry_line<'a>(entry: &'a StoppedEntry, app: &App) -> Line<'a> {
    Line::from(vec![
        Span::raw("   "),
        Span::styled(entry.process.as_str(), app.theme.status_style(entry.status)),
        Span::styled(
            format!("  on {}", entry.host_short),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ])
}
