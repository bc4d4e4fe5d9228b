//! Data source abstraction for receiving status documents.
//!
//! This module provides a trait-based abstraction for obtaining the raw
//! status HTML from different backends - a periodically fetched HTTP
//! endpoint in production, a local file for offline use and tests.
//!
//! Sources deliver documents; parsing is the core's job and never fails.
//! Transport problems are a source concern and surface through
//! [`DataSource::error`] without disturbing previously delivered data.

mod file;
mod http;

pub use file::FileSource;
pub use http::HttpSource;

use std::fmt::Debug;

/// Trait for receiving raw status documents from various backends.
///
/// # Example
///
/// ```no_run
/// use nagwatch::source::{DataSource, FileSource};
///
/// let mut source = FileSource::new("status.html");
/// if let Some(document) = source.poll() {
///     let page = nagwatch::data::parse(&document);
///     println!("{} records", page.records.len());
/// }
/// ```
pub trait DataSource: Send + Debug {
    /// Poll for a new raw document.
    ///
    /// Returns `Some(document)` when new content is available, `None`
    /// otherwise. Must be non-blocking; the UI loop calls this every
    /// tick.
    fn poll(&mut self) -> Option<String>;

    /// Human-readable description of the source, for the status bar.
    fn description(&self) -> &str;

    /// The most recent transport error, if the last activity failed.
    fn error(&self) -> Option<String>;

    /// Ask the source to deliver fresh content as soon as it can.
    ///
    /// Best-effort; the default does nothing (file sources re-read on
    /// change anyway).
    fn request_refresh(&mut self) {}
}
