//! Data models and processing for status documents.
//!
//! This module is the extraction and aggregation core: it turns raw status
//! HTML into structured records and derives every displayed view from
//! them. All of it is pure and synchronous - no I/O, no shared state, no
//! errors (malformed input degrades to defaults).
//!
//! ## Submodules
//!
//! - [`status`]: core data model ([`StatusPage`], [`ServiceRecord`],
//!   [`ServiceStatus`] with its severity ranking)
//! - [`parser`]: status document parsing (HTML → [`StatusPage`])
//! - [`extract`]: text-pattern extractors over record status text
//! - [`aggregate`]: grouping, filtering, and sorting of records
//! - [`views`]: categorized panel views (updates, stopped processes)
//! - [`duration`]: parsing of display-formatted durations and check times
//!
//! ## Data flow
//!
//! ```text
//! raw document (HTML)
//!        │
//!        ▼
//! parser::parse()
//!        │
//!        ├──▶ StatusPage (records + totals)
//!        │          │
//!        │          ├──▶ aggregate::aggregate()   (grouped table)
//!        │          ├──▶ views::UpdateOverview    (update panel)
//!        │          └──▶ views::StoppedOverview   (stopped panel)
//! ```

pub mod aggregate;
pub mod duration;
pub mod extract;
pub mod parser;
pub mod status;
pub mod views;

pub use aggregate::{aggregate, HostGroup, SortDirection, SortField, StatusFilter};
pub use extract::{stopped_processes, update_counts, UpdateCounts, SERVICE_CHECK, WINDOWS_UPDATE};
pub use parser::parse;
pub use status::{HostTotals, ServiceRecord, ServiceStatus, ServiceTotals, StatusPage};
pub use views::{StoppedEntry, StoppedOverview, UpdateEntry, UpdateOverview};
