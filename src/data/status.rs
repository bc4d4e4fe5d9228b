//! Core status page data model.
//!
//! These types are the parser's output and the input to every aggregation
//! and view computation. They are plain serializable data with no behavior
//! beyond severity ranking; each successful parse produces a fresh
//! [`StatusPage`] that supersedes (never merges with) the previous one.

use serde::Serialize;

/// A service check state as reported by the monitoring system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceStatus {
    Ok,
    Warning,
    Unknown,
    Critical,
    Pending,
}

/// Marker-to-status mapping, checked in this order so that a class string
/// like `statusCRITICAL` cannot be shadowed by a shorter marker.
const STATUS_MARKERS: &[(&str, ServiceStatus)] = &[
    ("CRITICAL", ServiceStatus::Critical),
    ("WARNING", ServiceStatus::Warning),
    ("UNKNOWN", ServiceStatus::Unknown),
    ("PENDING", ServiceStatus::Pending),
    ("OK", ServiceStatus::Ok),
];

impl ServiceStatus {
    /// Severity rank used for worst-status rollups and status sorting.
    ///
    /// This is an explicit table, independent of declaration order:
    /// CRITICAL outranks WARNING outranks UNKNOWN outranks PENDING
    /// outranks OK.
    pub fn severity(self) -> u8 {
        match self {
            ServiceStatus::Critical => 4,
            ServiceStatus::Warning => 3,
            ServiceStatus::Unknown => 2,
            ServiceStatus::Pending => 1,
            ServiceStatus::Ok => 0,
        }
    }

    /// The display label, as the monitoring system spells it.
    pub fn label(self) -> &'static str {
        match self {
            ServiceStatus::Ok => "OK",
            ServiceStatus::Warning => "WARNING",
            ServiceStatus::Unknown => "UNKNOWN",
            ServiceStatus::Critical => "CRITICAL",
            ServiceStatus::Pending => "PENDING",
        }
    }

    /// Recover a status from a cell's class marker, falling back to the
    /// cell's own text. A cell bearing no recognizable marker is UNKNOWN;
    /// this never fails.
    pub fn from_cell(class_attr: &str, cell_text: &str) -> Self {
        let class_upper = class_attr.to_ascii_uppercase();
        let text_upper = cell_text.trim().to_ascii_uppercase();
        for (marker, status) in STATUS_MARKERS {
            if class_upper.contains(marker) || text_upper == *marker {
                return *status;
            }
        }
        ServiceStatus::Unknown
    }

    /// All five statuses, worst first. Used by filter cycling and tests.
    pub fn all() -> [ServiceStatus; 5] {
        [
            ServiceStatus::Critical,
            ServiceStatus::Warning,
            ServiceStatus::Unknown,
            ServiceStatus::Pending,
            ServiceStatus::Ok,
        ]
    }
}

/// One monitored service's current check result.
///
/// `host_key` and `service_key` are the opaque identifiers recovered from
/// the document's extended-info links; they are what outgoing commands
/// address. They may be empty when undiscoverable but are never absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceRecord {
    pub host: String,
    pub host_title: String,
    pub host_key: String,
    pub service: String,
    pub service_key: String,
    pub status: ServiceStatus,
    pub last_check: String,
    pub duration: String,
    pub attempt: String,
    pub status_info: String,
}

/// Host state counters from the page's summary box.
///
/// Counters are independent best-effort extractions defaulting to zero;
/// they are not required to sum to `all_types` and are never
/// cross-validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HostTotals {
    pub up: u32,
    pub down: u32,
    pub unreachable: u32,
    pub pending: u32,
    pub all_problems: u32,
    pub all_types: u32,
}

/// Service state counters from the page's summary box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServiceTotals {
    pub ok: u32,
    pub warning: u32,
    pub unknown: u32,
    pub critical: u32,
    pub pending: u32,
    pub all_problems: u32,
    pub all_types: u32,
}

/// Everything recovered from one status document fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusPage {
    pub last_updated: String,
    pub host_totals: HostTotals,
    pub service_totals: ServiceTotals,
    pub records: Vec<ServiceRecord>,
}

impl Default for ServiceStatus {
    fn default() -> Self {
        ServiceStatus::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_worst_first() {
        let ranks: Vec<u8> = ServiceStatus::all().iter().map(|s| s.severity()).collect();
        assert_eq!(ranks, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn from_cell_prefers_class_marker_over_text() {
        assert_eq!(
            ServiceStatus::from_cell("statusBGCRITICAL", "whatever"),
            ServiceStatus::Critical
        );
        assert_eq!(ServiceStatus::from_cell("statusOK", ""), ServiceStatus::Ok);
    }

    #[test]
    fn from_cell_falls_back_to_exact_text() {
        assert_eq!(ServiceStatus::from_cell("", "warning"), ServiceStatus::Warning);
        assert_eq!(ServiceStatus::from_cell("nowrap", " PENDING "), ServiceStatus::Pending);
    }

    #[test]
    fn unrecognizable_cell_is_unknown() {
        assert_eq!(ServiceStatus::from_cell("", "Weird"), ServiceStatus::Unknown);
        assert_eq!(ServiceStatus::from_cell("nowrap", ""), ServiceStatus::Unknown);
    }

    #[test]
    fn status_serializes_as_upper_label() {
        let json = serde_json::to_string(&ServiceStatus::Critical).unwrap();
        assert_eq!(json, r#""CRITICAL""#);
    }
}
