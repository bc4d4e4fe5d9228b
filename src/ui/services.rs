//! Services view rendering.
//!
//! Displays host groups as collapsible table sections: one row per host
//! with its worst status rolled up, and one row per service when the host
//! is expanded. The filter line above the table shows per-status record
//! counts and the active filter.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::{HostGroup, SortField, StatusFilter};

/// Render the Services view.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    if app.page.is_none() {
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1), // Filter line
        Constraint::Min(4),    // Table
        Constraint::Length(1), // Footer
    ])
    .split(area);

    let groups = app.visible_groups();

    render_filter_line(frame, app, chunks[0]);

    if groups.is_empty() {
        let empty = Paragraph::new(" No services match the current filters")
            .style(Style::default().add_modifier(Modifier::DIM));
        frame.render_widget(empty, chunks[1]);
        return;
    }

    render_table(frame, app, &groups, chunks[1]);
    render_footer(frame, app, &groups, chunks[2]);
}

fn render_filter_line(frame: &mut Frame, app: &App, area: Rect) {
    let counts = app.status_counts();
    let total = app.table_records().len();

    let mut spans = vec![Span::raw(" ")];
    let all_active = app.status_filter == StatusFilter::All;
    spans.push(Span::styled(
        format!("ALL ({})", total),
        if all_active {
            Style::default().fg(app.theme.highlight).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        },
    ));
    for (status, count) in counts {
        spans.push(Span::raw("  "));
        let active = app.status_filter == StatusFilter::Only(status);
        let style = if active {
            app.theme.status_style(status).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else if count > 0 {
            app.theme.status_style(status)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        spans.push(Span::styled(format!("{} ({})", status.label(), count), style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_table(frame: &mut Frame, app: &App, groups: &[HostGroup], area: Rect) {
    let header = Row::new(vec![
        Cell::from(header_label("Host", SortField::Host, app)),
        Cell::from(header_label("Service", SortField::Service, app)),
        Cell::from(header_label("Status", SortField::Status, app)),
        Cell::from(header_label("Last Check", SortField::LastCheck, app)),
        Cell::from(header_label("Duration", SortField::Duration, app)),
        Cell::from(header_label("Status Information", SortField::StatusInfo, app)),
    ])
    .height(1)
    .style(app.theme.header);

    let mut rows: Vec<Row> = Vec::new();
    let mut selected_row = 0usize;

    for (idx, group) in groups.iter().enumerate() {
        if idx == app.selected_index {
            selected_row = rows.len();
        }

        let expanded = app.is_expanded(group);
        let marker = if expanded { "▼" } else { "▶" };
        let refresh = if app.is_refreshing(group) { " ↻" } else { "" };
        let host_label = if group.host_title.is_empty() {
            group.host.clone()
        } else {
            format!("{} ({})", group.host, group.host_title)
        };
        let count = group.records.len();

        rows.push(
            Row::new(vec![
                Cell::from(format!("{} {}{}", marker, host_label, refresh)),
                Cell::from(format!(
                    "{} service{}",
                    count,
                    if count == 1 { "" } else { "s" }
                )),
                Cell::from(group.worst_status.label())
                    .style(app.theme.status_style(group.worst_status)),
                Cell::from(""),
                Cell::from(""),
                Cell::from(""),
            ])
            .style(Style::default().add_modifier(Modifier::BOLD)),
        );

        if expanded {
            for record in &group.records {
                let status_label = if record.attempt.is_empty() {
                    record.status.label().to_string()
                } else {
                    format!("{} ({})", record.status.label(), record.attempt)
                };
                rows.push(Row::new(vec![
                    Cell::from(""),
                    Cell::from(format!("  {}", record.service)),
                    Cell::from(status_label).style(app.theme.status_style(record.status)),
                    Cell::from(record.last_check.clone()),
                    Cell::from(record.duration.clone()),
                    Cell::from(record.status_info.clone()),
                ]));
            }
        }
    }

    let widths = [
        Constraint::Fill(2),  // Host
        Constraint::Fill(2),  // Service
        Constraint::Min(14),  // Status
        Constraint::Min(20),  // Last Check
        Constraint::Min(15),  // Duration
        Constraint::Fill(3),  // Status Information
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected_row));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_footer(frame: &mut Frame, app: &App, groups: &[HostGroup], area: Rect) {
    let shown: usize = groups.iter().map(|g| g.records.len()).sum();
    let footer = format!(
        " Showing {} service{} across {} host group{} | sort: {} {}",
        shown,
        if shown == 1 { "" } else { "s" },
        groups.len(),
        if groups.len() == 1 { "" } else { "s" },
        app.sort_field.label(),
        app.sort_direction.arrow(),
    );
    frame.render_widget(
        Paragraph::new(footer).style(Style::default().add_modifier(Modifier::DIM)),
        area,
    );
}

fn header_label(label: &str, field: SortField, app: &App) -> String {
    if app.sort_field == field {
        format!("{} {}", label, app.sort_direction.arrow())
    } else {
        format!("{} ⇅", label)
    }
}
