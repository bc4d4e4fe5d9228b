//! Status document parsing.
//!
//! Turns the raw HTML served by the status CGI into a [`StatusPage`]. The
//! document's layout is conventional, not contractual, so every extraction
//! step degrades to a default (empty string, zero, UNKNOWN) instead of
//! failing - a document missing every expected marker parses to an
//! all-zero, empty page. Transport problems are the data source's concern;
//! this module never sees them and never returns an error.

use std::sync::LazyLock;

use chrono::Local;
use regex::Regex;

use super::status::{HostTotals, ServiceRecord, ServiceStatus, ServiceTotals, StatusPage};
use crate::markup::{self, Element};

static LAST_UPDATED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Last Updated:\s*([^\n]+)").expect("valid regex"));

/// Extended-info link markers. A `type=1` link identifies a host, a
/// `type=2` link a service; their query parameters carry the opaque keys
/// outgoing commands address.
const HOST_LINK_MARKER: &str = "extinfo.cgi?type=1";
const SERVICE_LINK_MARKER: &str = "extinfo.cgi?type=2";

/// Parse a raw status document. Never fails.
pub fn parse(raw: &str) -> StatusPage {
    let root = markup::parse(raw);
    StatusPage {
        last_updated: extract_last_updated(&root),
        host_totals: extract_host_totals(&root),
        service_totals: extract_service_totals(&root),
        records: extract_records(&root),
    }
}

/// Read the "Last Updated" line out of the page's info box, falling back
/// to the current wall-clock time when the box or the label is missing.
fn extract_last_updated(root: &Element) -> String {
    if let Some(info_box) = root.find_class("infoBox") {
        // Line structure matters here: the label's value ends at the next
        // <br>, and the info box carries several other labeled lines.
        let text = info_box.raw_text();
        if let Some(caps) = LAST_UPDATED_RE.captures(&text) {
            if let Some(value) = caps.get(1) {
                return markup::normalize_ws(value.as_str());
            }
        }
    }
    Local::now().format("%d-%m-%Y %H:%M:%S").to_string()
}

/// Leading-integer cell value, 0 when absent.
fn cell_count(cell: &Element) -> u32 {
    let text = cell.text();
    let digits: String = text.trim_start().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Value of a `name=value` pair in a link's query string.
fn query_param(href: &str, name: &str) -> Option<String> {
    let query = href.split_once('?').map(|(_, q)| q).unwrap_or(href);
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')) {
            return Some(value.to_string());
        }
    }
    None
}

/// Status-type code carried by a totals header link, if any.
fn header_status_type(header: &Element, param: &str) -> Option<String> {
    let link = header.find_tag("a")?;
    query_param(link.attr("href").unwrap_or(""), param)
}

/// Host totals. Named category cells are read by class; the unreachable
/// and pending counts have no cell class of their own and are recovered by
/// matching each header link's status-type code against its column's cell.
fn extract_host_totals(root: &Element) -> HostTotals {
    let mut totals = HostTotals::default();
    if root.find_class("hostTotals").is_none() {
        return totals;
    }

    if let Some(cell) = root.find_class("hostTotalsUP") {
        totals.up = cell_count(cell);
    }
    if let Some(cell) = root.find_class("hostTotalsDOWN") {
        totals.down = cell_count(cell);
    }
    if let Some(cell) = root.find_class("hostTotalsPROBLEMS") {
        totals.all_problems = cell_count(cell);
    }

    for table in root.find_all(|e| e.tag() == "table" && e.has_class("hostTotals")) {
        let cells = table.find_all(|e| e.tag() == "td" && e.has_class("hostTotals"));
        let headers = table.find_all(|e| e.tag() == "th" && e.has_class("hostTotals"));
        for (idx, cell) in cells.iter().enumerate() {
            let Some(header) = headers.get(idx) else {
                continue;
            };
            match header_status_type(header, "hoststatustypes").as_deref() {
                Some("8") => totals.unreachable = cell_count(cell),
                Some("1") => totals.pending = cell_count(cell),
                _ => {}
            }
        }
        // Best-effort: the grand total is the last cell of the table whose
        // rendered text mentions "All Types". Fragile upstream phrasing,
        // so absence simply leaves 0.
        if table.text().contains("All Types") {
            if let Some(last) = cells.last() {
                totals.all_types = cell_count(last);
            }
        }
    }
    totals
}

/// Service totals, same recovery strategy as [`extract_host_totals`].
fn extract_service_totals(root: &Element) -> ServiceTotals {
    let mut totals = ServiceTotals::default();

    if let Some(cell) = root.find_class("serviceTotalsOK") {
        totals.ok = cell_count(cell);
    }
    if let Some(cell) = root.find_class("serviceTotalsWARNING") {
        totals.warning = cell_count(cell);
    }
    if let Some(cell) = root.find_class("serviceTotalsUNKNOWN") {
        totals.unknown = cell_count(cell);
    }
    if let Some(cell) = root.find_class("serviceTotalsCRITICAL") {
        totals.critical = cell_count(cell);
    }
    if let Some(cell) = root.find_class("serviceTotalsPROBLEMS") {
        totals.all_problems = cell_count(cell);
    }

    for table in root.find_all(|e| e.tag() == "table" && e.has_class("serviceTotals")) {
        let cells = table.find_all(|e| e.tag() == "td" && e.has_class("serviceTotals"));
        let headers = table.find_all(|e| e.tag() == "th" && e.has_class("serviceTotals"));
        for (idx, cell) in cells.iter().enumerate() {
            let Some(header) = headers.get(idx) else {
                continue;
            };
            if header_status_type(header, "servicestatustypes").as_deref() == Some("1") {
                totals.pending = cell_count(cell);
            }
        }
        if table.text().contains("All Types") {
            if let Some(last) = cells.last() {
                totals.all_types = cell_count(last);
            }
        }
    }
    totals
}

/// Records come from the single main status table; no table, no records.
fn extract_records(root: &Element) -> Vec<ServiceRecord> {
    let Some(table) = root.find(|e| e.tag() == "table" && e.has_class("status")) else {
        return Vec::new();
    };
    scan_rows(&status_rows(table))
}

/// The table's own rows: direct `<tr>` children, reached through at most
/// one `<thead>`/`<tbody>` section. Rows of tables nested inside cells are
/// deliberately unreachable from here - an all-descendants walk would
/// misalign the column positions below.
fn status_rows(table: &Element) -> Vec<&Element> {
    let mut rows = Vec::new();
    for child in table.child_elements() {
        match child.tag() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => {
                rows.extend(child.child_elements().filter(|e| e.tag() == "tr"));
            }
            _ => {}
        }
    }
    rows
}

/// Host context carried across a block of rows. The page prints a host's
/// name only on the first row of its service block; subsequent rows leave
/// the host cell empty and inherit the context.
#[derive(Debug, Clone, Default)]
struct HostContext {
    host: String,
    title: String,
    key: String,
}

/// Fold over status rows producing records.
///
/// Skips header rows and rows with fewer than 7 direct cells; a row whose
/// first cell carries a host link updates the running context; a row
/// without a service link is a pure host header and emits nothing.
pub(crate) fn scan_rows(rows: &[&Element]) -> Vec<ServiceRecord> {
    let mut context = HostContext::default();
    let mut records = Vec::new();

    for row in rows {
        if row.child_elements().any(|e| e.tag() == "th") {
            continue;
        }
        let cells: Vec<&Element> = row.child_elements().filter(|e| e.tag() == "td").collect();
        if cells.len() < 7 {
            continue;
        }

        if let Some(link) = find_link(cells[0], HOST_LINK_MARKER) {
            let href = link.attr("href").unwrap_or("");
            context = HostContext {
                host: link.text(),
                title: link.attr("title").unwrap_or("").to_string(),
                key: query_param(href, "host").unwrap_or_default(),
            };
        }

        let Some(service_link) = find_link(cells[1], SERVICE_LINK_MARKER) else {
            continue;
        };
        let service_href = service_link.attr("href").unwrap_or("");

        records.push(ServiceRecord {
            host: context.host.clone(),
            host_title: context.title.clone(),
            host_key: query_param(service_href, "host").unwrap_or_else(|| context.key.clone()),
            service: service_link.text(),
            service_key: query_param(service_href, "service").unwrap_or_default(),
            status: ServiceStatus::from_cell(cells[2].class_attr(), &cells[2].text()),
            last_check: cells[3].text(),
            duration: cells[4].text(),
            attempt: cells[5].text(),
            status_info: cells[6].text(),
        });
    }
    records
}

fn find_link<'a>(cell: &'a Element, marker: &str) -> Option<&'a Element> {
    cell.find(|e| e.tag() == "a" && e.attr("href").unwrap_or("").contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(html: &str) -> Element {
        markup::parse(html)
    }

    fn fixture() -> String {
        r#"
        <html><body>
        <div class='infoBox'>
        monitor.example.net<br>
        Last Updated: 06-08-2026 14:21:03<br>
        Updated every 90 seconds
        </div>
        <table class='hostTotals'><tr>
          <th class='hostTotals'><a href='status.cgi?hoststatustypes=2'>Up</a></th>
          <th class='hostTotals'><a href='status.cgi?hoststatustypes=4'>Down</a></th>
          <th class='hostTotals'><a href='status.cgi?hoststatustypes=8'>Unreachable</a></th>
          <th class='hostTotals'><a href='status.cgi?hoststatustypes=1'>Pending</a></th>
        </tr><tr>
          <td class='hostTotals hostTotalsUP'>12</td>
          <td class='hostTotals hostTotalsDOWN'>2</td>
          <td class='hostTotals'>1</td>
          <td class='hostTotals'>3</td>
        </tr></table>
        <table class='hostTotals'><tr>
          <th class='hostTotals'><a href='status.cgi?hoststatustypes=12'>All Problems</a></th>
          <th class='hostTotals'><a href='status.cgi?hoststatustypes=15'>All Types</a></th>
        </tr><tr>
          <td class='hostTotals hostTotalsPROBLEMS'>3</td>
          <td class='hostTotals'>18</td>
        </tr></table>
        <table class='serviceTotals'><tr>
          <th class='serviceTotals'><a href='status.cgi?servicestatustypes=2'>Ok</a></th>
          <th class='serviceTotals'><a href='status.cgi?servicestatustypes=1'>Pending</a></th>
        </tr><tr>
          <td class='serviceTotals serviceTotalsOK'>40</td>
          <td class='serviceTotals'>5</td>
        </tr></table>
        <table class='serviceTotals'><tr>
          <th class='serviceTotals'><a href='status.cgi?servicestatustypes=28'>All Problems</a></th>
          <th class='serviceTotals'><a href='status.cgi?servicestatustypes=31'>All Types</a></th>
        </tr><tr>
          <td class='serviceTotals serviceTotalsPROBLEMS'>7</td>
          <td class='serviceTotals'>52</td>
        </tr></table>
        <table class='status'>
        <tr><th>Host</th><th>Service</th><th>Status</th><th>Last Check</th>
            <th>Duration</th><th>Attempt</th><th>Status Information</th></tr>
        <tr>
          <td><a href='extinfo.cgi?type=1&host=DC+-+Alpha' title='10.0.0.1'>DC - Alpha</a></td>
          <td><a href='extinfo.cgi?type=2&host=DC+-+Alpha&service=CPU+Load'>CPU Load</a></td>
          <td class='statusOK'>OK</td>
          <td class='nowrap'>06-08-2026 14:20:11</td>
          <td class='nowrap'>12d 3h 5m 10s</td>
          <td>1/3</td>
          <td>OK - load average: 0.12</td>
        </tr>
        <tr>
          <td></td>
          <td><a href='extinfo.cgi?type=2&host=DC+-+Alpha&service=Service+Check'>Service Check</a></td>
          <td class='statusCRITICAL'>CRITICAL</td>
          <td class='nowrap'>06-08-2026 14:19:03</td>
          <td class='nowrap'>0d 1h 2m 3s</td>
          <td>3/3</td>
          <td>CRITICAL: nginx=stopped, sshd=running
            <table><tr><td>nested note</td></tr></table>
          </td>
        </tr>
        <tr>
          <td><a href='extinfo.cgi?type=1&host=Edge+-+Beta'>Edge - Beta</a></td>
          <td><a href='extinfo.cgi?type=2&host=Edge+-+Beta&service=Uptime'>Uptime</a></td>
          <td class='nowrap'>Weird</td>
          <td class='nowrap'>N/A</td>
          <td class='nowrap'>N/A</td>
          <td></td>
          <td></td>
        </tr>
        </table>
        </body></html>
        "#
        .to_string()
    }

    #[test]
    fn parses_full_fixture() {
        let page = parse(&fixture());
        assert_eq!(page.last_updated, "06-08-2026 14:21:03");
        assert_eq!(page.records.len(), 3);

        let first = &page.records[0];
        assert_eq!(first.host, "DC - Alpha");
        assert_eq!(first.host_title, "10.0.0.1");
        assert_eq!(first.host_key, "DC+-+Alpha");
        assert_eq!(first.service, "CPU Load");
        assert_eq!(first.service_key, "CPU+Load");
        assert_eq!(first.status, ServiceStatus::Ok);
        assert_eq!(first.last_check, "06-08-2026 14:20:11");
        assert_eq!(first.duration, "12d 3h 5m 10s");
        assert_eq!(first.attempt, "1/3");
    }

    #[test]
    fn host_context_carries_across_rows() {
        let page = parse(&fixture());
        let second = &page.records[1];
        assert_eq!(second.host, "DC - Alpha");
        assert_eq!(second.host_title, "10.0.0.1");
        assert_eq!(second.service, "Service Check");
        assert_eq!(second.status, ServiceStatus::Critical);
        // The nested annotation table must not shift columns; status_info
        // is still the seventh cell's text.
        assert!(second.status_info.starts_with("CRITICAL: nginx=stopped"));

        let third = &page.records[2];
        assert_eq!(third.host, "Edge - Beta");
        assert_eq!(third.host_title, "");
    }

    #[test]
    fn unrecognizable_status_cell_is_unknown() {
        let page = parse(&fixture());
        assert_eq!(page.records[2].status, ServiceStatus::Unknown);
    }

    #[test]
    fn totals_combine_class_and_link_recovery() {
        let page = parse(&fixture());
        assert_eq!(page.host_totals.up, 12);
        assert_eq!(page.host_totals.down, 2);
        assert_eq!(page.host_totals.unreachable, 1);
        assert_eq!(page.host_totals.pending, 3);
        assert_eq!(page.host_totals.all_problems, 3);
        assert_eq!(page.host_totals.all_types, 18);

        assert_eq!(page.service_totals.ok, 40);
        assert_eq!(page.service_totals.pending, 5);
        assert_eq!(page.service_totals.all_problems, 7);
        assert_eq!(page.service_totals.all_types, 52);
    }

    #[test]
    fn missing_status_table_yields_empty_page() {
        let page = parse("<html><body><p>maintenance</p></body></html>");
        assert!(page.records.is_empty());
        assert_eq!(page.host_totals, HostTotals::default());
        assert_eq!(page.service_totals, ServiceTotals::default());
        // Falls back to wall-clock time rather than an empty string.
        assert!(!page.last_updated.is_empty());
    }

    #[test]
    fn empty_input_never_panics() {
        for raw in ["", "<table>", "<table class='status'>"] {
            let page = parse(raw);
            assert!(page.records.is_empty());
        }
    }

    #[test]
    fn short_and_header_rows_are_skipped() {
        let doc = row(
            "<table class='status'>\
             <tr><th>h</th></tr>\
             <tr><td>a</td><td>b</td></tr>\
             </table>",
        );
        let table = doc.find_tag("table").unwrap();
        assert!(scan_rows(&status_rows(table)).is_empty());
    }

    #[test]
    fn host_row_without_service_link_only_updates_context() {
        let doc = row(
            "<table class='status'>\
             <tr>\
               <td><a href='extinfo.cgi?type=1&host=web1'>web1</a></td>\
               <td>no link</td><td></td><td></td><td></td><td></td><td></td>\
             </tr>\
             <tr>\
               <td></td>\
               <td><a href='extinfo.cgi?type=2&host=web1&service=Disk'>Disk</a></td>\
               <td class='statusWARNING'></td><td></td><td></td><td></td><td>87% used</td>\
             </tr>\
             </table>",
        );
        let table = doc.find_tag("table").unwrap();
        let records = scan_rows(&status_rows(table));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].host, "web1");
        assert_eq!(records[0].service, "Disk");
        assert_eq!(records[0].status, ServiceStatus::Warning);
    }

    #[test]
    fn query_param_matches_whole_names() {
        assert_eq!(query_param("x.cgi?host=a&service=b", "host").as_deref(), Some("a"));
        assert_eq!(query_param("x.cgi?hoststatustypes=8", "host"), None);
        assert_eq!(query_param("no-query-here", "host"), None);
    }
}
