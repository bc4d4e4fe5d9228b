//! External configuration.
//!
//! The endpoint paths and refresh cadence are deployment concerns, so
//! they come from an optional `nagwatch.toml` plus `NAGWATCH_`-prefixed
//! environment variables; command-line arguments override both. The core
//! consumes these as opaque strings and numbers.

use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

/// Default status query: all hosts, pre-sorted by the CGI, no row limit.
pub const DEFAULT_STATUS_PATH: &str = "/cgi-bin/status.cgi?host=all&sorttype=2&sortoption=3&limit=0";

/// Default command CGI path.
pub const DEFAULT_COMMAND_PATH: &str = "/cgi-bin/cmd.cgi";

/// Default refresh interval in seconds.
pub const DEFAULT_REFRESH_SECS: u64 = 90;

/// Deployment settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Path (with query) of the status document endpoint.
    pub status_path: String,
    /// Path of the external command endpoint.
    pub command_path: String,
    /// Seconds between automatic fetches.
    pub refresh_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            status_path: DEFAULT_STATUS_PATH.to_string(),
            command_path: DEFAULT_COMMAND_PATH.to_string(),
            refresh_secs: DEFAULT_REFRESH_SECS,
        }
    }
}

impl Settings {
    /// Load settings from the default locations, with an optional
    /// explicit config file taking precedence over `nagwatch.toml` in the
    /// working directory. Environment variables (`NAGWATCH_REFRESH_SECS`
    /// etc.) override files.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("nagwatch").required(false));
        if let Some(path) = config_file {
            builder = builder.add_source(config::File::from(path));
        }
        let loaded = builder
            .add_source(config::Environment::with_prefix("NAGWATCH").try_parsing(true))
            .build()?;
        Ok(loaded.try_deserialize()?)
    }
}
