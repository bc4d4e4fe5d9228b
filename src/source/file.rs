//! File-based data source.
//!
//! Polls a saved status HTML document. Useful for offline inspection of a
//! captured page and for driving the full pipeline in tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::DataSource;

/// A data source that reads the status document from a file.
///
/// The source tracks the file's modification time and only returns new
/// content when the file has been updated.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    last_modified: Option<SystemTime>,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            last_modified: None,
        }
    }

    /// Returns the path being monitored.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }
}

impl DataSource for FileSource {
    fn poll(&mut self) -> Option<String> {
        let current_modified = self.modified_time();

        let file_changed = match (&self.last_modified, &current_modified) {
            (None, _) => true,        // First poll, always read
            (Some(_), None) => false, // File disappeared, don't update
            (Some(last), Some(current)) => current > last,
        };
        if !file_changed {
            return None;
        }

        match fs::read_to_string(&self.path) {
            Ok(content) => {
                self.last_error = None;
                self.last_modified = current_modified;
                Some(content)
            }
            Err(e) => {
                self.last_error = Some(format!("Read error: {}", e));
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.clone()
    }

    fn request_refresh(&mut self) {
        // Force a re-read on the next poll even if mtime is unchanged.
        self.last_modified = None;
    }
}
