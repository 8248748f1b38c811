//! Module `naming`
//!
//! Suffix generation used to disambiguate colliding names.

use std::fmt::Write;
use std::sync::OnceLock;
use std::time::Instant;

use chrono::format::{Item, StrftimeItems};
use chrono::{Local, Utc};
use serde::Deserialize;

/// Default number of candidates tried before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// `yyyy-MM-dd_hh-mm-ss-fff` expressed as a chrono format string.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%I-%M-%S-%3f";

/// Ticks between 0001-01-01 and the Unix epoch, at 100ns per tick.
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Algorithm producing the suffix of a candidate name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    /// The 0-based attempt index.
    #[default]
    Integer,
    /// A monotonic clock reading in 100ns ticks.
    TimestampTicks,
    /// Local wall-clock time.
    Timestamp,
    /// UTC wall-clock time.
    TimestampUtc,
}

/// Naming strategy paired with its attempt limit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UniqueNaming {
    pub strategy: NamingStrategy,
    pub max_attempts: usize,
    pub timestamp_format: String,
}

impl Default for UniqueNaming {
    fn default() -> Self {
        Self {
            strategy: NamingStrategy::Integer,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl UniqueNaming {
    pub fn new(strategy: NamingStrategy, max_attempts: usize) -> Self {
        Self {
            strategy,
            max_attempts,
            ..Self::default()
        }
    }

    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    /// Suffix for the given attempt under this configuration.
    pub fn suffix(&self, attempt: usize) -> String {
        next_candidate_suffix(attempt, self.strategy, &self.timestamp_format)
    }
}

/// Returns whether `format` is a usable chrono strftime pattern.
pub fn is_valid_timestamp_format(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Produces the suffix for `attempt` using `strategy`.
///
/// Never fails: an unusable `timestamp_format` falls back to
/// [`DEFAULT_TIMESTAMP_FORMAT`].
pub fn next_candidate_suffix(attempt: usize, strategy: NamingStrategy, timestamp_format: &str) -> String {
    match strategy {
        NamingStrategy::Integer => attempt.to_string(),
        NamingStrategy::TimestampTicks => monotonic_ticks().to_string(),
        NamingStrategy::Timestamp => {
            let now = Local::now();
            format_or_default(timestamp_format, |fmt, out| write!(out, "{}", now.format(fmt)))
        }
        NamingStrategy::TimestampUtc => {
            let now = Utc::now();
            format_or_default(timestamp_format, |fmt, out| write!(out, "{}", now.format(fmt)))
        }
    }
}

fn format_or_default<F>(format: &str, render: F) -> String
where
    F: Fn(&str, &mut String) -> std::fmt::Result,
{
    let mut out = String::new();
    if is_valid_timestamp_format(format) && render(format, &mut out).is_ok() {
        return out;
    }
    out.clear();
    // The default pattern is known-good; an error here leaves the suffix empty.
    let _ = render(DEFAULT_TIMESTAMP_FORMAT, &mut out);
    out
}

/// Wall-clock ticks at process anchor plus monotonic elapsed ticks.
fn monotonic_ticks() -> i64 {
    static ANCHOR: OnceLock<(Instant, i64)> = OnceLock::new();
    let (instant, wall_ticks) = ANCHOR.get_or_init(|| {
        let now = Utc::now();
        let ticks = now.timestamp() * 10_000_000 + i64::from(now.timestamp_subsec_nanos() / 100);
        (Instant::now(), UNIX_EPOCH_TICKS + ticks)
    });
    let elapsed = i64::try_from(instant.elapsed().as_nanos() / 100).unwrap_or(i64::MAX);
    wall_ticks.saturating_add(elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_suffix_is_attempt_index() {
        assert_eq!(next_candidate_suffix(0, NamingStrategy::Integer, ""), "0");
        assert_eq!(next_candidate_suffix(7, NamingStrategy::Integer, ""), "7");
    }

    #[test]
    fn test_ticks_are_non_decreasing() {
        let first: i64 = next_candidate_suffix(0, NamingStrategy::TimestampTicks, "")
            .parse()
            .unwrap();
        let second: i64 = next_candidate_suffix(1, NamingStrategy::TimestampTicks, "")
            .parse()
            .unwrap();
        assert!(second >= first);
        assert!(first > UNIX_EPOCH_TICKS);
    }

    #[test]
    fn test_timestamp_uses_default_pattern_shape() {
        let suffix = next_candidate_suffix(0, NamingStrategy::TimestampUtc, DEFAULT_TIMESTAMP_FORMAT);
        // 2026-10-17_07-05-09-123
        assert_eq!(suffix.len(), 23);
        assert_eq!(suffix.as_bytes()[10], b'_');
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '_'));
    }

    #[test]
    fn test_custom_pattern() {
        let suffix = next_candidate_suffix(0, NamingStrategy::Timestamp, "%Y");
        assert_eq!(suffix.len(), 4);
    }

    #[test]
    fn test_invalid_pattern_falls_back() {
        assert!(!is_valid_timestamp_format("%Q%"));
        let suffix = next_candidate_suffix(0, NamingStrategy::TimestampUtc, "%Q%");
        assert_eq!(suffix.len(), 23);
    }

    #[test]
    fn test_unique_naming_defaults() {
        let naming = UniqueNaming::default();
        assert_eq!(naming.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(naming.strategy, NamingStrategy::Integer);
        assert_eq!(naming.suffix(3), "3");
    }
}
