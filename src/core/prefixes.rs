//! Ready-made prefix decorators
//!
//! Each function returns a marshaler decorator built on
//! [`encoding::prefix`]. They combine freely; remember that the decorator
//! registered last writes its prefix first.

use super::caller;
use super::encoding::{self, Chunk, MarshalerDecorator};
use super::level;
use super::timestamp::{self, TimestampFormat, GLOG_LEN};
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::sync::Arc;

fn event_time(ctx: &super::context::Context) -> DateTime<Utc> {
    timestamp::from_context(ctx).unwrap_or_else(Utc::now)
}

/// One-letter level code, see [`level::annotator`].
#[must_use]
pub fn level() -> Arc<dyn MarshalerDecorator> {
    level::annotator()
}

/// A fixed string.
#[must_use]
pub fn string(s: impl Into<String>) -> Arc<dyn MarshalerDecorator> {
    let s: String = s.into();
    encoding::prefix(move |_| encoding::singular(s.clone().into_bytes()))
}

/// The event timestamp followed by a space. Events that were never stamped
/// use the current time.
#[must_use]
pub fn timestamp(format: TimestampFormat) -> Arc<dyn MarshalerDecorator> {
    encoding::prefix(move |c| {
        let mut ts = format.format(&event_time(c));
        ts.push(' ');
        encoding::singular(ts.into_bytes())
    })
}

/// `mmdd hh:mm:ss.uuuuuu`, without a trailing separator.
#[must_use]
pub fn glog_timestamp() -> Arc<dyn MarshalerDecorator> {
    encoding::prefix(|c| {
        let mut buf = [0u8; GLOG_LEN];
        timestamp::glog(&event_time(c), &mut buf);
        encoding::singular(buf.to_vec())
    })
}

/// Level code, glog timestamp and a space: `I0108 10:30:45.123456 `.
#[must_use]
pub fn glog_header() -> Arc<dyn MarshalerDecorator> {
    encoding::prefix(|c| {
        let code = level::from_context(c).map_or(level::UNKNOWN_CODE, level::Level::code);
        let mut buf = [0u8; GLOG_LEN];
        timestamp::glog(&event_time(c), &mut buf);
        let parts: Vec<Chunk> = vec![
            Cow::Borrowed(code),
            Cow::Owned(buf.to_vec()),
            Cow::Borrowed(&b" "[..]),
        ];
        encoding::chunks(parts)
    })
}

/// `file:line] ` for events carrying caller information; nothing otherwise.
#[must_use]
pub fn caller() -> Arc<dyn MarshalerDecorator> {
    encoding::prefix(|c| match caller::from_context(c) {
        Some(site) => encoding::singular(format!("{}] ", site).into_bytes()),
        None => encoding::empty(),
    })
}

/// `[LEVEL] ` colored by severity.
#[cfg(feature = "console")]
#[must_use]
pub fn colored_level() -> Arc<dyn MarshalerDecorator> {
    use colored::Colorize;

    encoding::prefix(|c| match level::from_context(c) {
        Some(l) => {
            let label = format!("[{}]", l.to_str()).color(l.color_code()).bold();
            encoding::singular(format!("{} ", label).into_bytes())
        }
        None => encoding::empty(),
    })
}
