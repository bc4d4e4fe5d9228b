// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # nagwatch
//!
//! A terminal dashboard and library for Nagios status pages.
//!
//! The monitoring system renders its current host/service check results as
//! an HTML status page. This crate fetches that page on an interval,
//! recovers a normalized record set from the markup, and derives the views
//! an operator actually wants: a grouped, filterable, sortable service
//! table; a Windows update rollout panel; a stopped-services panel; and
//! one-key forced re-checks of a host's services.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal│ │
//! │  │ (state) │    │(parse +  │    │(render) │    │         │ │
//! │  └────┬────┘    │ derive)  │    └─────────┘    └─────────┘ │
//! │       │         └──────────┘                               │
//! │       ▼                       ▼                            │
//! │  ┌─────────┐            ┌─────────┐                        │
//! │  │ source  │            │ command │──▶ forced checks       │
//! │  │ (input) │            │ (output)│                        │
//! │  └─────────┘            └─────────┘                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state, view navigation, and user interaction logic
//! - **[`source`]**: Data source abstraction ([`DataSource`] trait) with
//!   HTTP polling and file-based implementations
//! - **[`data`]**: The extraction and aggregation core - parses status
//!   documents into [`StatusPage`] records, groups/filters/sorts them, and
//!   builds the update and stopped-service panel views
//! - **[`markup`]**: Minimal HTML tree the parser queries (class lookup,
//!   direct-children traversal)
//! - **[`command`]**: Outgoing forced-check commands with concurrent
//!   fan-out dispatch
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`settings`]**: Endpoint paths and refresh cadence
//!
//! The `data` layer is pure and synchronous: parsing never fails (malformed
//! markup degrades to defaults), and every aggregation call re-derives its
//! output from an immutable record list. Only the transport edges - the
//! HTTP source and the command dispatcher - are async.
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Dashboard against a live monitoring host
//! nagwatch --url http://monitor.example.net/nagios
//!
//! # Inspect a captured status page offline
//! nagwatch --file status.html
//!
//! # One-shot JSON export
//! nagwatch --file status.html --export status.json
//! ```
//!
//! ### As a library
//!
//! ```
//! use nagwatch::data::{self, SortDirection, SortField, StatusFilter};
//!
//! let page = data::parse("<html>...</html>");
//! let groups = data::aggregate(
//!     &page.records,
//!     StatusFilter::All,
//!     "",
//!     SortField::Status,
//!     SortDirection::Desc,
//! );
//! for group in groups {
//!     println!("{}: {}", group.host, group.worst_status.label());
//! }
//! ```

pub mod app;
pub mod command;
pub mod data;
pub mod events;
pub mod markup;
pub mod settings;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, View};
pub use command::{dispatch, CheckCommand, CheckDispatcher, CommandTransport, HttpTransport};
pub use data::{
    aggregate, parse, HostGroup, HostTotals, ServiceRecord, ServiceStatus, ServiceTotals,
    SortDirection, SortField, StatusFilter, StatusPage, StoppedOverview, UpdateOverview,
};
pub use settings::Settings;
pub use source::{DataSource, FileSource, HttpSource};
