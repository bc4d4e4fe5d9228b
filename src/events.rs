use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, View};

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // If search input is active, handle text input
    if app.search_active {
        handle_search_input(app, key);
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),

        // Direct view access
        KeyCode::Char('1') => app.set_view(View::Services),
        KeyCode::Char('2') => app.set_view(View::Updates),
        KeyCode::Char('3') => app.set_view(View::Stopped),

        // Navigation (up/down for groups, left/right for tabs)
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        // Expand/collapse host groups
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_selected_expansion(),
        KeyCode::Char('a') => app.expand_all(),
        KeyCode::Char('A') => app.collapse_all(),

        // Refresh now
        KeyCode::Char('r') => app.request_refresh(),

        // Force an immediate check of the selected host's services
        KeyCode::Char('f') => {
            if app.current_view == View::Services {
                app.force_check_selected();
            }
        }

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Sorting (Services view)
        KeyCode::Char('s') => {
            if app.current_view == View::Services {
                app.cycle_sort();
            }
        }
        KeyCode::Char('S') => {
            if app.current_view == View::Services {
                app.toggle_sort_direction();
            }
        }

        // Status filter cycling
        KeyCode::Char('t') => {
            if app.current_view == View::Services {
                app.cycle_status_filter();
            }
        }

        // Search (start typing to filter records)
        KeyCode::Char('/') => app.start_search(),

        // Clear search
        KeyCode::Char('c') => {
            if !app.search_text.is_empty() {
                app.clear_search();
            }
        }

        // Export
        KeyCode::Char('e') => {
            let export_path = std::path::PathBuf::from("nagwatch_export.json");
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle key input while search is active
fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Confirm search
        KeyCode::Enter => {
            app.search_active = false;
        }

        // Cancel search (keep text but exit input mode)
        KeyCode::Esc => {
            app.cancel_search();
        }

        // Clear and exit
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.clear_search();
        }

        // Backspace
        KeyCode::Backspace => {
            app.search_pop();
            if app.search_text.is_empty() {
                app.search_active = false;
            }
        }

        // Type characters
        KeyCode::Char(c) => {
            app.search_push(c);
        }

        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel
        MouseEventKind::ScrollUp => {
            app.select_prev();
        }
        MouseEventKind::ScrollDown => {
            app.select_next();
        }

        // Tab clicks (row 1, after the header bar)
        MouseEventKind::Down(_) if mouse.row == 1 => {
            let col = mouse.column;
            // Approximate tab positions: Services (0-11), Updates (12-22),
            // Stopped (23-33)
            if col < 12 {
                app.set_view(View::Services);
            } else if col < 23 {
                app.set_view(View::Updates);
            } else if col < 34 {
                app.set_view(View::Stopped);
            }
        }

        _ => {}
    }
}
