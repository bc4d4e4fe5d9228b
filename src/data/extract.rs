//! Pattern extractors over a record's free-text status information.
//!
//! Two well-known check plugins bury structured facts in their plugin
//! output: the service supervision check lists `name=stopped` tokens, and
//! the Windows update check reports critical/optional update counts and a
//! pending-reboot marker. Each extractor is a pure function gated on its
//! sentinel service name; re-running one on the same record always yields
//! the same findings in the same order.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::status::{ServiceRecord, ServiceStatus};

/// Service name of the process supervision check.
pub const SERVICE_CHECK: &str = "Service Check";

/// Service name of the Windows update check.
pub const WINDOWS_UPDATE: &str = "Windows Update";

static STOPPED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)=stopped").expect("valid regex"));

static UPDATE_COUNTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*critical.*?(\d+)\s*optional").expect("valid regex"));

/// Stopped process names in document order.
///
/// Applies only to CRITICAL or WARNING records of the supervision check;
/// any other record yields nothing even if its text happens to match.
pub fn stopped_processes(record: &ServiceRecord) -> Vec<String> {
    if record.service != SERVICE_CHECK {
        return Vec::new();
    }
    if !matches!(record.status, ServiceStatus::Critical | ServiceStatus::Warning) {
        return Vec::new();
    }
    STOPPED_RE
        .captures_iter(&record.status_info)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Update counts recovered from a Windows update record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateCounts {
    pub critical: u32,
    pub optional: u32,
    pub reboot_required: bool,
}

/// Parse update counts and the reboot flag out of a record's status text.
///
/// Returns `None` for records of any other service; for the sentinel
/// service an absent count pattern yields zeros, never an error.
pub fn update_counts(record: &ServiceRecord) -> Option<UpdateCounts> {
    if record.service != WINDOWS_UPDATE {
        return None;
    }
    let info = record.status_info.to_lowercase();
    let mut counts = UpdateCounts {
        reboot_required: info.contains("reboot required"),
        ..UpdateCounts::default()
    };
    if let Some(caps) = UPDATE_COUNTS_RE.captures(&info) {
        counts.critical = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        counts.optional = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    }
    Some(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(service: &str, status: ServiceStatus, info: &str) -> ServiceRecord {
        ServiceRecord {
            host: "DC - Alpha".to_string(),
            host_title: String::new(),
            host_key: "DC+-+Alpha".to_string(),
            service: service.to_string(),
            service_key: service.replace(' ', "+"),
            status,
            last_check: String::new(),
            duration: String::new(),
            attempt: String::new(),
            status_info: info.to_string(),
        }
    }

    #[test]
    fn finds_every_stopped_process_in_order() {
        let rec = record(
            SERVICE_CHECK,
            ServiceStatus::Critical,
            "nginx=stopped, sshd=running, cron=stopped",
        );
        assert_eq!(stopped_processes(&rec), vec!["nginx", "cron"]);
    }

    #[test]
    fn stopped_extraction_ignores_other_services_and_statuses() {
        let other = record("Disk Space", ServiceStatus::Critical, "nginx=stopped");
        assert!(stopped_processes(&other).is_empty());

        let ok = record(SERVICE_CHECK, ServiceStatus::Ok, "nginx=stopped");
        assert!(stopped_processes(&ok).is_empty());

        let warning = record(SERVICE_CHECK, ServiceStatus::Warning, "spooler=stopped");
        assert_eq!(stopped_processes(&warning), vec!["spooler"]);
    }

    #[test]
    fn stopped_extraction_is_idempotent() {
        let rec = record(SERVICE_CHECK, ServiceStatus::Critical, "b=stopped a=stopped");
        assert_eq!(stopped_processes(&rec), stopped_processes(&rec));
        assert_eq!(stopped_processes(&rec), vec!["b", "a"]);
    }

    #[test]
    fn parses_update_counts_with_intervening_text() {
        let rec = record(
            WINDOWS_UPDATE,
            ServiceStatus::Warning,
            "3 critical and 7 optional updates pending",
        );
        let counts = update_counts(&rec).unwrap();
        assert_eq!(counts.critical, 3);
        assert_eq!(counts.optional, 7);
        assert!(!counts.reboot_required);
    }

    #[test]
    fn reboot_flag_is_independent_of_counts() {
        let rec = record(WINDOWS_UPDATE, ServiceStatus::Warning, "Reboot required to finish");
        let counts = update_counts(&rec).unwrap();
        assert_eq!(counts.critical, 0);
        assert_eq!(counts.optional, 0);
        assert!(counts.reboot_required);
    }

    #[test]
    fn update_extraction_ignores_other_services() {
        let rec = record("CPU Load", ServiceStatus::Ok, "2 critical 1 optional");
        assert!(update_counts(&rec).is_none());
    }

    #[test]
    fn absent_counts_default_to_zero() {
        let rec = record(WINDOWS_UPDATE, ServiceStatus::Ok, "All updates installed");
        assert_eq!(update_counts(&rec).unwrap(), UpdateCounts::default());
    }
}
