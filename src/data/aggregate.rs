//! Grouping, filtering, and sorting of service records.
//!
//! [`aggregate`] is the single entry point: it re-derives the full ordered
//! group list from an immutable record slice and the active display
//! parameters. There is no incremental update path - every call builds
//! fresh value objects, which keeps repeated partial re-derivation
//! (changing a filter, flipping a sort) trivially consistent.

use std::collections::HashMap;

use serde::Serialize;

use super::duration::ParseCache;
use super::status::{ServiceRecord, ServiceStatus};

/// Column to sort by, for both in-group records and the group sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Host,
    Service,
    #[default]
    Status,
    LastCheck,
    Duration,
    StatusInfo,
}

impl SortField {
    /// Cycle to the next sort field.
    pub fn next(self) -> Self {
        match self {
            SortField::Host => SortField::Service,
            SortField::Service => SortField::Status,
            SortField::Status => SortField::LastCheck,
            SortField::LastCheck => SortField::Duration,
            SortField::Duration => SortField::StatusInfo,
            SortField::StatusInfo => SortField::Host,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortField::Host => "host",
            SortField::Service => "service",
            SortField::Status => "status",
            SortField::LastCheck => "last check",
            SortField::Duration => "duration",
            SortField::StatusInfo => "status info",
        }
    }

    /// Direction a freshly selected field starts in: status sorting leads
    /// with the worst problems, everything else ascends.
    pub fn initial_direction(self) -> SortDirection {
        match self {
            SortField::Status => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }
}

/// Sort direction; descending negates the field comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        }
    }

    fn apply(self, ord: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

/// Record-level status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ServiceStatus),
}

impl StatusFilter {
    pub fn matches(self, status: ServiceStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => status == wanted,
        }
    }

    /// Cycle All → CRITICAL → WARNING → UNKNOWN → PENDING → OK → All.
    pub fn next(self) -> Self {
        let order = ServiceStatus::all();
        match self {
            StatusFilter::All => StatusFilter::Only(order[0]),
            StatusFilter::Only(current) => {
                match order.iter().position(|s| *s == current) {
                    Some(idx) if idx + 1 < order.len() => StatusFilter::Only(order[idx + 1]),
                    _ => StatusFilter::All,
                }
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "ALL",
            StatusFilter::Only(status) => status.label(),
        }
    }
}

/// A host's (filtered, sorted) records with a rolled-up worst status.
///
/// When the active sort field is status, groups are keyed by host and
/// status together so each severity band stays contiguous per host; for
/// every other field the key is the host alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostGroup {
    pub key: String,
    pub host: String,
    pub host_title: String,
    pub host_key: String,
    pub records: Vec<ServiceRecord>,
    pub worst_status: ServiceStatus,
}

/// Group, filter, roll up, and sort.
///
/// Filters apply per record inside each group before the rollup and sort;
/// groups left empty are dropped. The worst status is recomputed from the
/// filtered membership, not the original one. Group order before sorting
/// follows first appearance in the record list, and both sorts are stable,
/// so equal keys stay in document order.
pub fn aggregate(
    records: &[ServiceRecord],
    filter: StatusFilter,
    search: &str,
    field: SortField,
    direction: SortDirection,
) -> Vec<HostGroup> {
    let mut groups: Vec<HostGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = if field == SortField::Status {
            format!("{}::{}", record.host, record.status.label())
        } else {
            record.host.clone()
        };
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(HostGroup {
                key,
                host: record.host.clone(),
                host_title: record.host_title.clone(),
                host_key: record.host_key.clone(),
                records: Vec::new(),
                worst_status: record.status,
            });
            groups.len() - 1
        });
        groups[slot].records.push(record.clone());
        if record.status.severity() > groups[slot].worst_status.severity() {
            groups[slot].worst_status = record.status;
        }
    }

    let needle = search.to_lowercase();
    let mut cache = ParseCache::new();

    let mut result: Vec<HostGroup> = groups
        .into_iter()
        .filter_map(|mut group| {
            group
                .records
                .retain(|r| filter.matches(r.status) && matches_search(r, &needle));
            if group.records.is_empty() {
                return None;
            }
            group.worst_status = group
                .records
                .iter()
                .map(|r| r.status)
                .fold(ServiceStatus::Ok, |worst, s| {
                    if s.severity() > worst.severity() {
                        s
                    } else {
                        worst
                    }
                });
            group.records.sort_by(|a, b| {
                direction.apply(compare_records(a, b, field, &mut cache))
            });
            Some(group)
        })
        .collect();

    result.sort_by(|a, b| direction.apply(compare_groups(a, b, field)));
    result
}

fn matches_search(record: &ServiceRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    record.host.to_lowercase().contains(needle)
        || record.service.to_lowercase().contains(needle)
        || record.status_info.to_lowercase().contains(needle)
}

fn compare_records(
    a: &ServiceRecord,
    b: &ServiceRecord,
    field: SortField,
    cache: &mut ParseCache,
) -> std::cmp::Ordering {
    match field {
        SortField::Service => a.service.cmp(&b.service),
        SortField::LastCheck => {
            cache.check_time(&a.last_check).cmp(&cache.check_time(&b.last_check))
        }
        SortField::Duration => {
            cache.duration_secs(&a.duration).cmp(&cache.duration_secs(&b.duration))
        }
        SortField::StatusInfo => a.status_info.cmp(&b.status_info),
        // Status, and the in-group order for host sorting, both rank by
        // severity.
        SortField::Status | SortField::Host => a.status.severity().cmp(&b.status.severity()),
    }
}

/// Group order: host name for host sorting, severity for status sorting,
/// and severity tie-broken by host name for everything else - problem
/// groups float to the extreme no matter which column is active, unless
/// the user explicitly ordered by host.
fn compare_groups(a: &HostGroup, b: &HostGroup, field: SortField) -> std::cmp::Ordering {
    match field {
        SortField::Host => a.host.cmp(&b.host),
        SortField::Status => a.worst_status.severity().cmp(&b.worst_status.severity()),
        _ => a
            .worst_status
            .severity()
            .cmp(&b.worst_status.severity())
            .then_with(|| a.host.cmp(&b.host)),
    }
}
