//! Categorized panel views derived from the full record list.
//!
//! Both builders re-derive from scratch whenever the record list changes;
//! they hold no incremental state. They consume the unfiltered list - the
//! table's display filters have no influence on the panels.

use serde::Serialize;

use super::extract::{self, UpdateCounts};
use super::status::{ServiceRecord, ServiceStatus};

/// Drop a `"<prefix> - "` site label from a host name, keeping the suffix.
pub fn short_host(host: &str) -> String {
    match host.rfind(" - ") {
        Some(idx) => host[idx + 3..].to_string(),
        None => host.to_string(),
    }
}

/// One host's Windows update state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateEntry {
    pub host: String,
    pub host_short: String,
    pub status: ServiceStatus,
    pub counts: UpdateCounts,
    pub status_info: String,
}

/// Hosts bucketed by update urgency.
///
/// A host lands in exactly one bucket, in priority order: critical updates
/// outrank a pending reboot, which outranks optional updates, which
/// outranks being up to date (OK status only). Hosts matching none of the
/// four are omitted entirely. Up-to-date hosts are counted, not listed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateOverview {
    pub critical: Vec<UpdateEntry>,
    pub reboot: Vec<UpdateEntry>,
    pub optional: Vec<UpdateEntry>,
    pub up_to_date: usize,
}

impl UpdateOverview {
    /// Bucket every Windows update record in the list, in document order.
    pub fn build(records: &[ServiceRecord]) -> Self {
        let mut overview = UpdateOverview::default();
        for record in records {
            let Some(counts) = extract::update_counts(record) else {
                continue;
            };
            let entry = UpdateEntry {
                host: record.host.clone(),
                host_short: short_host(&record.host),
                status: record.status,
                counts,
                status_info: record.status_info.clone(),
            };
            if counts.critical > 0 {
                overview.critical.push(entry);
            } else if counts.reboot_required {
                overview.reboot.push(entry);
            } else if counts.optional > 0 {
                overview.optional.push(entry);
            } else if record.status == ServiceStatus::Ok {
                overview.up_to_date += 1;
            }
        }
        overview
    }

    /// Total hosts represented across all four buckets.
    pub fn total(&self) -> usize {
        self.critical.len() + self.reboot.len() + self.optional.len() + self.up_to_date
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// One stopped process reported by a supervision check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoppedEntry {
    pub process: String,
    pub host: String,
    pub host_short: String,
    pub status: ServiceStatus,
}

/// All stopped processes across the estate, worst severity first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoppedOverview {
    pub entries: Vec<StoppedEntry>,
}

impl StoppedOverview {
    /// Collect one entry per stopped-process finding, sorted CRITICAL
    /// before WARNING and by process name within each band.
    pub fn build(records: &[ServiceRecord]) -> Self {
        let mut entries = Vec::new();
        for record in records {
            for process in extract::stopped_processes(record) {
                entries.push(StoppedEntry {
                    process,
                    host: record.host.clone(),
                    host_short: short_host(&record.host),
                    status: record.status,
                });
            }
        }
        entries.sort_by(|a, b| {
            b.status
                .severity()
                .cmp(&a.status.severity())
                .then_with(|| a.process.cmp(&b.process))
        });
        Self { entries }
    }

    pub fn critical(&self) -> impl Iterator<Item = &StoppedEntry> {
        self.entries.iter().filter(|e| e.status == ServiceStatus::Critical)
    }

    pub fn warning(&self) -> impl Iterator<Item = &StoppedEntry> {
        self.entries.iter().filter(|e| e.status == ServiceStatus::Warning)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::extract::{SERVICE_CHECK, WINDOWS_UPDATE};

    fn record(host: &str, service: &str, status: ServiceStatus, info: &str) -> ServiceRecord {
        ServiceRecord {
            host: host.to_string(),
            host_title: String::new(),
            host_key: host.replace(' ', "+"),
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
    fn short_host_strips_site_prefix() {
        assert_eq!(short_host("Sydney DC - web01"), "web01");
        assert_eq!(short_host("A - B - C"), "C");
        assert_eq!(short_host("standalone"), "standalone");
    }

    #[test]
    fn update_buckets_are_mutually_exclusive_by_priority() {
        let records = vec![
            record("a", WINDOWS_UPDATE, ServiceStatus::Critical, "5 critical and 2 optional, reboot required"),
            record("b", WINDOWS_UPDATE, ServiceStatus::Warning, "0 critical and 0 optional, reboot required"),
            record("c", WINDOWS_UPDATE, ServiceStatus::Warning, "0 critical and 3 optional updates"),
            record("d", WINDOWS_UPDATE, ServiceStatus::Ok, "up to date"),
            record("e", WINDOWS_UPDATE, ServiceStatus::Unknown, "plugin timed out"),
            record("f", "CPU Load", ServiceStatus::Critical, "9 critical and 9 optional"),
        ];
        let overview = UpdateOverview::build(&records);
        assert_eq!(overview.critical.len(), 1);
        assert_eq!(overview.critical[0].host, "a");
        assert_eq!(overview.critical[0].counts.critical, 5);
        assert_eq!(overview.reboot.len(), 1);
        assert_eq!(overview.reboot[0].host, "b");
        assert_eq!(overview.optional.len(), 1);
        assert_eq!(overview.optional[0].host, "c");
        assert_eq!(overview.up_to_date, 1);
        // "e" matches no bucket; "f" is another service entirely.
        assert_eq!(overview.total(), 4);
    }

    #[test]
    fn empty_overview_for_no_update_records() {
        let records = vec![record("a", "Disk", ServiceStatus::Ok, "ok")];
        assert!(UpdateOverview::build(&records).is_empty());
    }

    #[test]
    fn stopped_entries_sort_critical_then_name() {
        let records = vec![
            record("Site - h1", SERVICE_CHECK, ServiceStatus::Warning, "zeta=stopped beta=stopped"),
            record("Site - h2", SERVICE_CHECK, ServiceStatus::Critical, "omega=stopped alpha=stopped"),
        ];
        let overview = StoppedOverview::build(&records);
        let order: Vec<(&str, ServiceStatus)> =
            overview.entries.iter().map(|e| (e.process.as_str(), e.status)).collect();
        assert_eq!(
            order,
            vec![
                ("alpha", ServiceStatus::Critical),
                ("omega", ServiceStatus::Critical),
                ("beta", ServiceStatus::Warning),
                ("zeta", ServiceStatus::Warning),
            ]
        );
        assert_eq!(overview.entries[0].host_short, "h2");
        assert_eq!(overview.critical().count(), 2);
        assert_eq!(overview.warning().count(), 2);
    }

    #[test]
    fn stopped_overview_ignores_ok_supervision_checks() {
        let records = vec![
            record("h", SERVICE_CHECK, ServiceStatus::Ok, "all=stopped"),
            record("h", "Other", ServiceStatus::Critical, "x=stopped"),
        ];
        assert!(StoppedOverview::build(&records).is_empty());
    }
}
