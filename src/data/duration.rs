//! Parsing of the page's display-formatted duration and check-time strings.
//!
//! The status table renders durations as `"Xd Yh Zm Ws"` and check times as
//! `"DD-MM-YYYY HH:MM:SS"`. Sorting needs comparable numbers, so these are
//! parsed on demand; anything unparseable compares as zero / the earliest
//! instant rather than erroring. A [`ParseCache`] memoizes results per
//! distinct input string for the lifetime of one aggregation pass.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)d\s*(\d+)h\s*(\d+)m\s*(\d+)s").expect("valid regex"));

static CHECK_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2})-(\d{2})-(\d{4})\s+(\d{2}):(\d{2}):(\d{2})").expect("valid regex")
});

/// Parse a `"Xd Yh Zm Ws"` duration into total seconds.
///
/// Returns 0 for anything that does not match, so unparseable durations
/// sort below every real one.
pub fn duration_secs(text: &str) -> u64 {
    let Some(caps) = DURATION_RE.captures(text) else {
        return 0;
    };
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok()).unwrap_or(0);
    field(1) * 86_400 + field(2) * 3_600 + field(3) * 60 + field(4)
}

/// Parse a `"DD-MM-YYYY HH:MM:SS"` check time into a unix timestamp.
///
/// Returns 0 (the earliest instant this data can produce) when the text
/// does not contain a recognizable date.
pub fn check_time(text: &str) -> i64 {
    let Some(caps) = CHECK_TIME_RE.captures(text) else {
        return 0;
    };
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok()).unwrap_or(0);
    let (day, month, year) = (field(1), field(2), field(3) as i32);
    let (hour, min, sec) = (field(4), field(5), field(6));
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, min, sec))
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0)
}

/// Transient per-pass memo for parsed duration/check-time strings.
///
/// Scoped to a single aggregation call and discarded afterward; never
/// promoted to shared state. Purely a performance concern: the same
/// rendered string appears on many rows.
#[derive(Debug, Default)]
pub struct ParseCache {
    durations: HashMap<String, u64>,
    instants: HashMap<String, i64>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memoized [`duration_secs`].
    pub fn duration_secs(&mut self, text: &str) -> u64 {
        if let Some(&secs) = self.durations.get(text) {
            return secs;
        }
        let secs = duration_secs(text);
        self.durations.insert(text.to_string(), secs);
        secs
    }

    /// Memoized [`check_time`].
    pub fn check_time(&mut self, text: &str) -> i64 {
        if let Some(&ts) = self.instants.get(text) {
            return ts;
        }
        let ts = check_time(text);
        self.instants.insert(text.to_string(), ts);
        ts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_duration_to_total_seconds() {
        assert_eq!(duration_secs("2d 03h 15m 40s"), 2 * 86_400 + 3 * 3_600 + 15 * 60 + 40);
        assert_eq!(duration_secs("0d 0h 1m 5s"), 65);
    }

    #[test]
    fn unparseable_duration_is_zero_and_sorts_lowest() {
        assert_eq!(duration_secs("N/A"), 0);
        assert_eq!(duration_secs(""), 0);
        assert!(duration_secs("N/A") < duration_secs("0d 0h 0m 1s"));
    }

    #[test]
    fn parses_check_time_day_month_year() {
        // 01-02-2024 is February 1st, not January 2nd.
        let feb1 = check_time("01-02-2024 00:00:00");
        let jan2 = check_time("02-01-2024 00:00:00");
        assert!(feb1 > jan2);
        assert_eq!(check_time("01-01-1970 00:00:10"), 10);
    }

    #[test]
    fn unparseable_check_time_is_earliest() {
        assert_eq!(check_time("N/A"), 0);
        assert_eq!(check_time("31-31-2024 00:00:00"), 0);
        assert!(check_time("junk") < check_time("06-08-2026 10:00:00"));
    }

    #[test]
    fn cache_returns_consistent_values() {
        let mut cache = ParseCache::new();
        let first = cache.duration_secs("1d 2h 3m 4s");
        assert_eq!(first, cache.duration_secs("1d 2h 3m 4s"));
        assert_eq!(cache.check_time("junk"), 0);
        assert_eq!(cache.check_time("junk"), 0);
    }
}
