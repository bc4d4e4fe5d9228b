//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::ServiceStatus;

/// Render the header bar with the page's totals overview.
///
/// Displays: overall status indicator, host totals, service totals, and
/// the page's own "Last Updated" stamp.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref page) = app.page else {
        let line = Line::from(vec![
            Span::styled(" NAGWATCH ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("| Loading..."),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };

    let hosts = page.host_totals;
    let services = page.service_totals;

    // Overall indicator follows the worst service category with members.
    let (status_icon, status_style) = if services.critical > 0 {
        ("●", app.theme.status_style(ServiceStatus::Critical))
    } else if services.warning > 0 {
        ("●", app.theme.status_style(ServiceStatus::Warning))
    } else if services.unknown > 0 {
        ("●", app.theme.status_style(ServiceStatus::Unknown))
    } else {
        ("●", app.theme.status_style(ServiceStatus::Ok))
    };

    let dim_zero = |n: u32, style: Style| {
        if n > 0 {
            Span::styled(n.to_string(), style)
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        }
    };

    let line = Line::from(vec![
        Span::styled(format!(" {} ", status_icon), status_style),
        Span::styled("NAGWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ hosts "),
        dim_zero(hosts.up, Style::default().fg(app.theme.ok)),
        Span::raw(" up "),
        dim_zero(hosts.down, Style::default().fg(app.theme.critical)),
        Span::raw(" down "),
        dim_zero(hosts.unreachable, Style::default().fg(app.theme.unknown)),
        Span::raw(" unreach │ services "),
        dim_zero(services.ok, Style::default().fg(app.theme.ok)),
        Span::raw(" ok "),
        dim_zero(services.warning, Style::default().fg(app.theme.warning)),
        Span::raw(" warn "),
        dim_zero(
            services.critical,
            Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" crit "),
        dim_zero(services.unknown, Style::default().fg(app.theme.unknown)),
        Span::raw(" unk │ "),
        Span::raw(format!("Last Updated: {}", page.last_updated)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = vec![
        Line::from(" 1:Services "),
        Line::from(" 2:Updates "),
        Line::from(" 3:Stopped "),
    ];

    let selected = match app.current_view {
        View::Services => 0,
        View::Updates => 1,
        View::Stopped => 2,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: source description, fetch errors, active search, available
/// controls. Also displays temporary status messages.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    // A transport error never hides the data; it rides along in the bar.
    if let Some(ref err) = app.load_error {
        let paragraph = Paragraph::new(format!(" {} | r:retry q:quit ", err))
            .style(Style::default().fg(app.theme.critical));
        frame.render_widget(paragraph, area);
        return;
    }

    let status = if app.page.is_some() {
        let controls = match app.current_view {
            View::Services => {
                if app.search_active {
                    "Type to search | Enter:apply Esc:cancel"
                } else {
                    "/:search t:filter s:sort S:reverse f:force-check Enter:expand ?:help q:quit"
                }
            }
            View::Updates | View::Stopped => "↑↓:scroll Tab:switch r:refresh ?:help q:quit",
        };

        let search = if app.search_text.is_empty() {
            String::new()
        } else {
            format!(" | search: {}", app.search_text)
        };

        format!(" {}{} | {}", app.source_description(), search, controls)
    } else {
        format!(" {} | Loading... | q:quit", app.source_description())
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Navigation",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  ←/→ h/l     Switch views"),
        Line::from("  ↑/↓ j/k     Navigate hosts"),
        Line::from("  PgUp/PgDn   Jump 10 hosts"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  Enter/Space Expand/collapse host"),
        Line::from("  a / A       Expand/collapse all"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Services view",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  /         Search host/service/info"),
        Line::from("  c         Clear search"),
        Line::from("  t         Cycle status filter"),
        Line::from("  s         Cycle sort column"),
        Line::from("  S         Toggle sort direction"),
        Line::from("  f         Force-check selected host"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  r         Refresh now"),
        Line::from("  e         Export to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 46u16.min(area.width.saturating_sub(4));
    let help_height = 28u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
