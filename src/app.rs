//! Application state and navigation logic.

use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};

use crate::command::CheckDispatcher;
use crate::data::{
    self, aggregate, HostGroup, ServiceRecord, ServiceStatus, SortDirection, SortField,
    StatusFilter, StatusPage, StoppedOverview, UpdateOverview, SERVICE_CHECK,
};
use crate::source::DataSource;
use crate::ui::Theme;

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Grouped service table with filter/search/sort controls.
    Services,
    /// Windows update rollout state per host.
    Updates,
    /// Stopped processes reported by supervision checks.
    Stopped,
}

impl View {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Services => View::Updates,
            View::Updates => View::Stopped,
            View::Stopped => View::Services,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Services => View::Stopped,
            View::Updates => View::Services,
            View::Stopped => View::Updates,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Services => "Services",
            View::Updates => "Updates",
            View::Stopped => "Stopped",
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    // Data source and latest parse. A failed poll keeps the previous
    // page; the error is shown alongside it instead of replacing it.
    source: Box<dyn DataSource>,
    pub page: Option<StatusPage>,
    pub load_error: Option<String>,
    pub last_fetch: Option<Instant>,

    // Derived panel views, rebuilt on every successful parse.
    pub updates: UpdateOverview,
    pub stopped: StoppedOverview,
    // Records feeding the main table: the sentinel services live in the
    // panels, not the table.
    table_records: Vec<ServiceRecord>,

    // Table display parameters.
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub status_filter: StatusFilter,
    pub search_text: String,
    pub search_active: bool,

    // Navigation state.
    pub selected_index: usize,
    pub expanded_hosts: HashSet<String>,

    // Forced-check dispatch. Hosts stay in `refreshing_hosts` while a
    // batch is outstanding; a second dispatch for the same host is
    // refused until the first settles.
    dispatcher: Option<CheckDispatcher>,
    pub refreshing_hosts: HashSet<String>,

    // UI
    pub theme: Theme,
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App. The dispatcher is absent for sources with no
    /// command endpoint (file sources); forced checks are then disabled.
    pub fn new(source: Box<dyn DataSource>, dispatcher: Option<CheckDispatcher>) -> Self {
        Self {
            running: true,
            current_view: View::Services,
            show_help: false,
            source,
            page: None,
            load_error: None,
            last_fetch: None,
            updates: UpdateOverview::default(),
            stopped: StoppedOverview::default(),
            table_records: Vec::new(),
            sort_field: SortField::default(),
            sort_direction: SortDirection::default(),
            status_filter: StatusFilter::default(),
            search_text: String::new(),
            search_active: false,
            selected_index: 0,
            expanded_hosts: HashSet::new(),
            dispatcher,
            refreshing_hosts: HashSet::new(),
            theme: Theme::auto_detect(),
            status_message: None,
        }
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Poll the data source and re-derive everything on new content.
    ///
    /// Returns true if a new document was parsed. A poll that yields
    /// nothing leaves the previous page in place and only refreshes the
    /// transport error state.
    pub fn reload_data(&mut self) -> bool {
        let Some(document) = self.source.poll() else {
            self.load_error = self.source.error();
            return false;
        };

        let page = data::parse(&document);
        self.table_records =
            page.records.iter().filter(|r| !feeds_side_panel(r)).cloned().collect();
        self.updates = UpdateOverview::build(&page.records);
        self.stopped = StoppedOverview::build(&page.records);
        self.page = Some(page);
        self.last_fetch = Some(Instant::now());
        self.load_error = self.source.error();

        let count = self.visible_groups().len();
        if self.selected_index >= count {
            self.selected_index = count.saturating_sub(1);
        }
        true
    }

    /// Ask the source for fresh content ahead of its normal cadence.
    pub fn request_refresh(&mut self) {
        self.source.request_refresh();
        self.set_status_message("Refreshing...".to_string());
    }

    /// Drain settled forced-check batches into status messages.
    pub fn tick(&mut self) {
        let outcomes = match &self.dispatcher {
            Some(dispatcher) => dispatcher.drain_outcomes(),
            None => Vec::new(),
        };
        for outcome in outcomes {
            self.refreshing_hosts.remove(&outcome.host_key);
            if outcome.success {
                self.set_status_message(format!("Forced check submitted for {}", outcome.host));
            } else {
                self.set_status_message(format!("Some checks failed for {}", outcome.host));
            }
        }
    }

    /// The records behind the main table (sentinel panels excluded).
    pub fn table_records(&self) -> &[ServiceRecord] {
        &self.table_records
    }

    /// The grouped, filtered, sorted table content. Re-derived on every
    /// call from the immutable record list and the current parameters.
    pub fn visible_groups(&self) -> Vec<HostGroup> {
        aggregate(
            &self.table_records,
            self.status_filter,
            &self.search_text,
            self.sort_field,
            self.sort_direction,
        )
    }

    /// Per-status record counts over the full table record list, for the
    /// filter line.
    pub fn status_counts(&self) -> Vec<(ServiceStatus, usize)> {
        ServiceStatus::all()
            .iter()
            .map(|s| (*s, self.table_records.iter().filter(|r| r.status == *s).count()))
            .collect()
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    /// Move selection down by n groups.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.visible_groups().len().saturating_sub(1);
        self.selected_index = (self.selected_index + n).min(max);
    }

    /// Move selection up by n groups.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_index = self.selected_index.saturating_sub(n);
    }

    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_index = self.visible_groups().len().saturating_sub(1);
    }

    /// Expansion is keyed per host, not per group: when status sorting
    /// splits a host into severity bands, expanding one band expands all
    /// of that host's bands.
    pub fn toggle_selected_expansion(&mut self) {
        let groups = self.visible_groups();
        let Some(group) = groups.get(self.selected_index) else {
            return;
        };
        let key = expand_key(group).to_string();
        if !self.expanded_hosts.remove(&key) {
            self.expanded_hosts.insert(key);
        }
    }

    pub fn expand_all(&mut self) {
        self.expanded_hosts =
            self.visible_groups().iter().map(|g| expand_key(g).to_string()).collect();
    }

    pub fn collapse_all(&mut self) {
        self.expanded_hosts.clear();
    }

    pub fn is_expanded(&self, group: &HostGroup) -> bool {
        self.expanded_hosts.contains(expand_key(group))
    }

    pub fn is_refreshing(&self, group: &HostGroup) -> bool {
        self.refreshing_hosts.contains(expand_key(group))
    }

    /// Cycle to the next sort field, starting it in its natural direction.
    pub fn cycle_sort(&mut self) {
        self.sort_field = self.sort_field.next();
        self.sort_direction = self.sort_field.initial_direction();
    }

    /// Toggle sort direction between ascending and descending.
    pub fn toggle_sort_direction(&mut self) {
        self.sort_direction = self.sort_direction.toggle();
    }

    /// Cycle the status filter: ALL, then each status worst-first.
    pub fn cycle_status_filter(&mut self) {
        self.status_filter = self.status_filter.next();
        self.selected_index = 0;
    }

    /// Enter search input mode (starts capturing keystrokes).
    pub fn start_search(&mut self) {
        self.search_active = true;
    }

    /// Exit search input mode without clearing the search text.
    pub fn cancel_search(&mut self) {
        self.search_active = false;
    }

    /// Clear the search text and exit search mode.
    pub fn clear_search(&mut self) {
        self.search_text.clear();
        self.search_active = false;
        self.selected_index = 0;
    }

    /// Append a character to the search text.
    pub fn search_push(&mut self, c: char) {
        self.search_text.push(c);
        self.selected_index = 0;
    }

    /// Remove the last character from the search text.
    pub fn search_pop(&mut self) {
        self.search_text.pop();
    }

    /// Issue a forced check for every service of the selected host group.
    ///
    /// Refused while a batch for the same host is outstanding, and
    /// unavailable when the source has no command endpoint.
    pub fn force_check_selected(&mut self) {
        let groups = self.visible_groups();
        let Some(group) = groups.get(self.selected_index) else {
            return;
        };
        let key = expand_key(group).to_string();
        if self.refreshing_hosts.contains(&key) {
            self.set_status_message(format!("Check already in flight for {}", group.host));
            return;
        }
        if self.dispatcher.is_none() {
            self.set_status_message("Forced checks need an http source".to_string());
            return;
        }
        self.set_status_message(format!(
            "Forcing {} check{} on {}",
            group.records.len(),
            if group.records.len() == 1 { "" } else { "s" },
            group.host
        ));
        let dispatcher = self.dispatcher.as_ref().unwrap();
        dispatcher.dispatch_batch(key.clone(), group.host.clone(), group.records.clone());
        self.refreshing_hosts.insert(key);
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the current page and panel views to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let Some(page) = &self.page else {
            bail!("No status data to export");
        };
        let export = serde_json::json!({
            "last_updated": page.last_updated,
            "host_totals": page.host_totals,
            "service_totals": page.service_totals,
            "records": page.records,
            "groups": self.visible_groups(),
            "updates": self.updates,
            "stopped": self.stopped,
        });
        std::fs::write(path, serde_json::to_string_pretty(&export)?)?;
        Ok(())
    }
}

/// Records of the panel-feeding sentinel services stay out of the table.
fn feeds_side_panel(record: &ServiceRecord) -> bool {
    record.service.to_lowercase().contains("windows update")
        || record.service.eq_ignore_ascii_case(SERVICE_CHECK)
}

/// Expansion/dispatch key for a group: the opaque host key when the
/// document provided one, the display name otherwise.
fn expand_key(group: &HostGroup) -> &str {
    if group.host_key.is_empty() {
        &group.host
    } else {
        &group.host_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FileSource;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fixture_html() -> &'static str {
        "<html><body><table class='status'>\
         <tr><th>h</th><th>s</th><th>st</th><th>lc</th><th>d</th><th>a</th><th>i</th></tr>\
         <tr>\
           <td><a href='extinfo.cgi?type=1&host=alpha'>alpha</a></td>\
           <td><a href='extinfo.cgi?type=2&host=alpha&service=Disk'>Disk</a></td>\
           <td class='statusCRITICAL'>CRITICAL</td>\
           <td>06-08-2026 10:00:00</td><td>0d 1h 0m 0s</td><td>3/3</td>\
           <td>DISK CRITICAL</td>\
         </tr>\
         <tr>\
           <td></td>\
           <td><a href='extinfo.cgi?type=2&host=alpha&service=Service+Check'>Service Check</a></td>\
           <td class='statusWARNING'>WARNING</td>\
           <td>06-08-2026 10:00:00</td><td>0d 1h 0m 0s</td><td>1/3</td>\
           <td>spooler=stopped</td>\
         </tr>\
         <tr>\
           <td><a href='extinfo.cgi?type=1&host=beta'>beta</a></td>\
           <td><a href='extinfo.cgi?type=2&host=beta&service=Windows+Update'>Windows Update</a></td>\
           <td class='statusWARNING'>WARNING</td>\
           <td>06-08-2026 10:00:00</td><td>0d 1h 0m 0s</td><td>1/3</td>\
           <td>2 critical and 1 optional updates</td>\
         </tr>\
         </table></body></html>"
    }

    fn app_with_fixture() -> (App, NamedTempFile) {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", fixture_html()).unwrap();
        let source = Box::new(FileSource::new(file.path()));
        let mut app = App::new(source, None);
        assert!(app.reload_data());
        (app, file)
    }

    #[test]
    fn reload_parses_and_derives_views() {
        let (app, _file) = app_with_fixture();
        let page = app.page.as_ref().unwrap();
        assert_eq!(page.records.len(), 3);
        // Sentinel services feed the panels, not the table.
        assert_eq!(app.table_records().len(), 1);
        assert_eq!(app.stopped.entries.len(), 1);
        assert_eq!(app.updates.critical.len(), 1);
        assert!(app.last_fetch.is_some());
    }

    #[test]
    fn failed_poll_keeps_previous_page() {
        let (mut app, file) = app_with_fixture();
        drop(file);
        assert!(!app.reload_data());
        assert!(app.page.is_some());
        assert_eq!(app.table_records().len(), 1);
    }

    #[test]
    fn navigation_stays_in_bounds() {
        let (mut app, _file) = app_with_fixture();
        app.select_next_n(10);
        assert_eq!(app.selected_index, app.visible_groups().len() - 1);
        app.select_prev_n(10);
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn expansion_toggles_per_host() {
        let (mut app, _file) = app_with_fixture();
        let group = app.visible_groups()[0].clone();
        assert!(!app.is_expanded(&group));
        app.toggle_selected_expansion();
        assert!(app.is_expanded(&group));
        app.toggle_selected_expansion();
        assert!(!app.is_expanded(&group));
        app.expand_all();
        assert!(app.is_expanded(&group));
        app.collapse_all();
        assert!(!app.is_expanded(&group));
    }

    #[test]
    fn search_input_updates_state() {
        let (mut app, _file) = app_with_fixture();
        app.start_search();
        assert!(app.search_active);
        app.search_push('d');
        app.search_push('i');
        app.search_pop();
        assert_eq!(app.search_text, "d");
        app.clear_search();
        assert!(app.search_text.is_empty());
        assert!(!app.search_active);
    }

    #[test]
    fn force_check_without_dispatcher_leaves_a_message() {
        let (mut app, _file) = app_with_fixture();
        app.force_check_selected();
        assert!(app.refreshing_hosts.is_empty());
        assert!(app.get_status_message().is_some());
    }

    #[test]
    fn status_counts_cover_table_records_only() {
        let (app, _file) = app_with_fixture();
        let counts = app.status_counts();
        let critical = counts.iter().find(|(s, _)| *s == ServiceStatus::Critical).unwrap();
        assert_eq!(critical.1, 1);
        let warning = counts.iter().find(|(s, _)| *s == ServiceStatus::Warning).unwrap();
        // The WARNING sentinel records are not table records.
        assert_eq!(warning.1, 0);
    }

    #[test]
    fn sort_cycling_resets_direction_naturally() {
        let (mut app, _file) = app_with_fixture();
        assert_eq!(app.sort_field, SortField::Status);
        assert_eq!(app.sort_direction, SortDirection::Desc);
        app.cycle_sort();
        assert_eq!(app.sort_field, SortField::LastCheck);
        assert_eq!(app.sort_direction, SortDirection::Asc);
    }

    #[test]
    fn export_without_data_fails() {
        let file = NamedTempFile::new().unwrap();
        let app = App::new(Box::new(FileSource::new("/nonexistent")), None);
        assert!(app.export_state(file.path()).is_err());
    }

    #[test]
    fn export_writes_json() {
        let (app, _file) = app_with_fixture();
        let out = NamedTempFile::new().unwrap();
        app.export_state(out.path()).unwrap();
        let text = std::fs::read_to_string(out.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value.get("records").is_some());
        assert!(value.get("updates").is_some());
    }
}
