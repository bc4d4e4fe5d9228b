//! Updates view rendering.
//!
//! Shows the Windows update rollout state: hosts with critical updates
//! first, then hosts waiting on a reboot, then optional-only hosts, then
//! a count of hosts that are fully up to date.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::{ServiceStatus, UpdateEntry};

/// Render the Updates view.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    if app.page.is_none() {
        return;
    }
    let overview = &app.updates;

    let block = Block::default()
        .title(format!(" Windows Updates ({}) ", overview.total()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type);

    if overview.is_empty() {
        let empty = Paragraph::new("No update checks reported")
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();

    if !overview.critical.is_empty() {
        lines.push(section_header(
            format!("⚠ Critical Updates ({})", overview.critical.len()),
            app.theme.status_style(ServiceStatus::Critical),
        ));
        for entry in &overview.critical {
            lines.push(entry_line(entry, Some(entry.counts.critical), app));
        }
        lines.push(Line::from(""));
    }

    if !overview.reboot.is_empty() {
        lines.push(section_header(
            format!("↻ Reboot Required ({})", overview.reboot.len()),
            app.theme.status_style(ServiceStatus::Warning),
        ));
        for entry in &overview.reboot {
            lines.push(entry_line(entry, None, app));
        }
        lines.push(Line::from(""));
    }

    if !overview.optional.is_empty() {
        lines.push(section_header(
            format!("○ Optional Updates ({})", overview.optional.len()),
            Style::default().fg(app.theme.highlight),
        ));
        for entry in &overview.optional {
            lines.push(entry_line(entry, Some(entry.counts.optional), app));
        }
        lines.push(Line::from(""));
    }

    if overview.up_to_date > 0 {
        lines.push(section_header(
            format!("✓ Up to Date ({})", overview.up_to_date),
            app.theme.status_style(ServiceStatus::Ok),
        ));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn section_header(text: String, style: Style) -> Line<'static> {
    Line::from(Span::styled(text, style.add_modifier(Modifier::BOLD)))
}

fn entry_line<'a>(entry: &'a UpdateEntry, badge: Option<u32>, app: &App) -> Line<'a> {
    let mut spans = vec![
        Span::raw("   "),
        Span::styled(entry.host_short.as_str(), app.theme.status_style(entry.status)),
    ];
    if let Some(count) = badge {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!("[{}]", count),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::styled(
        format!("  {}", entry.status_info),
        Style::default().add_modifier(Modifier::DIM),
    ));
    Line::from(spans)
}
