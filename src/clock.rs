// src/clock.rs
use chrono::format::{Item, StrftimeItems};
use chrono::{Local, TimeZone, Utc};
use once_cell::sync::Lazy;
use std::fmt::Write;
use std::time::Instant;

pub const DEFAULT_TIMESTAMP_PATTERN: &str = "%Y-%m-%d %H:%M:%S%Z";

static PROCESS_START: Lazy<Instant> = Lazy::new(Instant::now);

/// Source of the per-line time readings
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch, UTC
    fn now_epoch(&self) -> i64;
    /// Monotonic seconds since process start
    fn now_clock(&self) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Pin the process-relative clock origin. Later readings count from here.
    pub fn start() -> Self {
        Lazy::force(&PROCESS_START);
        SystemClock
    }
}

impl Clock for SystemClock {
    fn now_epoch(&self) -> i64 {
        Utc::now().timestamp()
    }

    fn now_clock(&self) -> f64 {
        PROCESS_START.elapsed().as_secs_f64()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_epoch(&self) -> i64 {
        (**self).now_epoch()
    }

    fn now_clock(&self) -> f64 {
        (**self).now_clock()
    }
}

/// Check that chrono can render every item of a strftime pattern
pub fn is_valid_pattern(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

/// Render `epoch` in the local time zone. Never fails: an unrenderable
/// pattern falls back to the default one.
pub fn format_timestamp(epoch: i64, pattern: &str) -> String {
    let Some(dt) = Local.timestamp_opt(epoch, 0).single() else {
        return epoch.to_string();
    };

    let mut rendered = String::new();
    if write!(rendered, "{}", dt.format_with_items(StrftimeItems::new(pattern))).is_ok() {
        return rendered;
    }

    rendered.clear();
    match write!(
        rendered,
        "{}",
        dt.format_with_items(StrftimeItems::new(DEFAULT_TIMESTAMP_PATTERN))
    ) {
        Ok(()) => rendered,
        Err(_) => epoch.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_pattern_is_timezone_independent() {
        assert_eq!(format_timestamp(0, "%s"), "0");
        assert_eq!(format_timestamp(1_700_000_000, "%s"), "1700000000");
    }

    #[test]
    fn test_literal_text_and_percent_escape() {
        assert_eq!(format_timestamp(0, "at %%s"), "at %s");
        assert_eq!(format_timestamp(0, "no specifiers"), "no specifiers");
    }

    #[test]
    fn test_default_pattern_shape() {
        let rendered = format_timestamp(1_700_000_000, DEFAULT_TIMESTAMP_PATTERN);
        // 2023-11-14 in every real time zone offset
        assert!(rendered.starts_with("2023-11-1"), "got {}", rendered);
        assert_eq!(&rendered[4..5], "-");
        assert_eq!(&rendered[13..14], ":");
    }

    #[test]
    fn test_invalid_pattern_falls_back() {
        assert!(!is_valid_pattern("%Q"));
        assert!(is_valid_pattern(DEFAULT_TIMESTAMP_PATTERN));
        let rendered = format_timestamp(0, "%Q");
        assert_eq!(rendered, format_timestamp(0, DEFAULT_TIMESTAMP_PATTERN));
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::start();
        let first = clock.now_clock();
        let second = clock.now_clock();
        assert!(first >= 0.0);
        assert!(second >= first);
        assert!(clock.now_epoch() > 1_600_000_000);
    }
}
