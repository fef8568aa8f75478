//! Event timestamps
//!
//! A [`Clock`] is sampled once per event by the stamping context decorator
//! ([`stamp`]); the resulting time travels in the event's context and is
//! rendered by timestamp prefixes using a [`TimestampFormat`].

use super::context::{Context, ContextDecorator, ContextKey};
use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::sync::Arc;

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Wall clock backed by `Utc::now`.
#[must_use]
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Clock that always reports `at`; useful for deterministic output.
#[must_use]
pub fn fixed_clock(at: DateTime<Utc>) -> Clock {
    Arc::new(move || at)
}

struct TimestampKey;

impl ContextKey for TimestampKey {
    type Value = DateTime<Utc>;
}

/// Returns a context carrying `at` as the event timestamp.
#[must_use]
pub fn new_context(ctx: &Context, at: DateTime<Utc>) -> Context {
    ctx.with_value::<TimestampKey>(at)
}

/// Extracts the event timestamp, if one was stamped.
#[must_use]
pub fn from_context(ctx: &Context) -> Option<DateTime<Utc>> {
    ctx.value::<TimestampKey>()
}

/// Context decorator that stamps every event with `clock()`.
#[must_use]
pub fn stamp(clock: Clock) -> Arc<dyn ContextDecorator> {
    Arc::new(move |c: &Context| new_context(c, clock()))
}

/// Timestamp renderings understood by the timestamp prefix.
///
/// # Examples
///
/// ```
/// use rust_log_facade::core::TimestampFormat;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
/// assert_eq!(TimestampFormat::Iso8601.format(&at), "2025-01-08T10:30:45.000Z");
/// assert_eq!(TimestampFormat::Unix.format(&at), "1736332245");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,
    /// `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,
    /// `2025-01-08T10:30:45+00:00`
    Rfc3339,
    /// Seconds since the epoch
    Unix,
    UnixMillis,
    UnixMicros,
    /// `0108 10:30:45.123456`, the header layout used by glog
    Glog,
    /// Any strftime-compatible pattern
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Iso8601Micros => datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::UnixMicros => datetime.timestamp_micros().to_string(),
            TimestampFormat::Glog => {
                let mut buf = [0u8; GLOG_LEN];
                glog(datetime, &mut buf);
                String::from_utf8_lossy(&buf).into_owned()
            }
            TimestampFormat::Custom(pattern) => {
                let mut out = String::new();
                // chrono reports unparsable patterns as a fmt error
                if write!(out, "{}", datetime.format(pattern)).is_err() {
                    return TimestampFormat::Iso8601.format(datetime);
                }
                out
            }
        }
    }

    /// Rejects custom patterns chrono cannot parse. Formatting with such a
    /// pattern falls back to [`TimestampFormat::Iso8601`].
    pub fn validate(&self) -> Result<()> {
        let TimestampFormat::Custom(pattern) = self else {
            return Ok(());
        };
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(LoggerError::formatter(
                "timestamp",
                format!("invalid pattern '{}'", pattern),
            ));
        }
        Ok(())
    }

    /// Check if this is a Unix-based numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimestampFormat::Unix | TimestampFormat::UnixMillis | TimestampFormat::UnixMicros
        )
    }
}

/// Length of a glog timestamp, `mmdd hh:mm:ss.uuuuuu`.
pub const GLOG_LEN: usize = 20;

const DIGITS: &[u8; 10] = b"0123456789";

/// Writes `mmdd hh:mm:ss.uuuuuu` into `buf` without going through the
/// strftime machinery.
pub fn glog(ts: &DateTime<Utc>, buf: &mut [u8; GLOG_LEN]) {
    two_digits(buf, 0, ts.month());
    two_digits(buf, 2, ts.day());
    buf[4] = b' ';
    two_digits(buf, 5, ts.hour());
    buf[7] = b':';
    two_digits(buf, 8, ts.minute());
    buf[10] = b':';
    two_digits(buf, 11, ts.second());
    buf[13] = b'.';
    // leap seconds report nanoseconds >= 1e9; clamp to keep six digits
    n_digits(buf, 6, 14, (ts.nanosecond() / 1000).min(999_999), b'0');
}

fn two_digits(buf: &mut [u8], i: usize, d: u32) {
    buf[i + 1] = DIGITS[(d % 10) as usize];
    buf[i] = DIGITS[((d / 10) % 10) as usize];
}

fn n_digits(buf: &mut [u8], n: usize, i: usize, mut d: u32, pad: u8) {
    let mut j = n;
    while j > 0 && d > 0 {
        j -= 1;
        buf[i + j] = DIGITS[(d % 10) as usize];
        d /= 10;
    }
    while j > 0 {
        j -= 1;
        buf[i + j] = pad;
    }
}
