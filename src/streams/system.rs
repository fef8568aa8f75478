//! Process-wide system sink and the stream that forwards to it
//!
//! The system sink is the library's stand-in for a platform "standard
//! logger": one shared writer (stdout unless replaced) plus a header
//! configuration. [`SystemStream`] and the system logger both emit through
//! it one complete line at a time.

use crate::core::{Result, Stream};
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::LazyLock;

/// Header fields prepended to every line emitted by the system sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemFlags {
    /// `2025/01/08`
    pub date: bool,
    /// `10:30:45`
    pub time: bool,
    /// `.123456` after the time
    pub microseconds: bool,
}

impl SystemFlags {
    /// No header at all.
    pub const NONE: SystemFlags = SystemFlags {
        date: false,
        time: false,
        microseconds: false,
    };

    /// Date and time, the default.
    pub const STANDARD: SystemFlags = SystemFlags {
        date: true,
        time: true,
        microseconds: false,
    };

    fn header(&self, now: &DateTime<Local>) -> String {
        let mut h = String::new();
        if self.date {
            h.push_str(&now.format("%Y/%m/%d ").to_string());
        }
        if self.time || self.microseconds {
            h.push_str(&now.format("%H:%M:%S").to_string());
            if self.microseconds {
                h.push_str(&now.format("%.6f").to_string());
            }
            h.push(' ');
        }
        h
    }
}

impl Default for SystemFlags {
    fn default() -> Self {
        Self::STANDARD
    }
}

struct SystemSink {
    output: Box<dyn Write + Send>,
    flags: SystemFlags,
}

static SYSTEM_SINK: LazyLock<Mutex<SystemSink>> = LazyLock::new(|| {
    Mutex::new(SystemSink {
        output: Box::new(std::io::stdout()),
        flags: SystemFlags::default(),
    })
});

/// Replaces the system sink's writer, returning the previous one.
pub fn set_output(output: Box<dyn Write + Send>) -> Box<dyn Write + Send> {
    std::mem::replace(&mut SYSTEM_SINK.lock().output, output)
}

/// Replaces the system sink's header flags, returning the previous ones.
pub fn set_flags(flags: SystemFlags) -> SystemFlags {
    std::mem::replace(&mut SYSTEM_SINK.lock().flags, flags)
}

pub fn flags() -> SystemFlags {
    SYSTEM_SINK.lock().flags
}

/// Emits one line through the system sink, appending a newline if missing.
pub fn output(message: &[u8]) -> Result<()> {
    let mut sink = SYSTEM_SINK.lock();
    let mut line = sink.flags.header(&Local::now()).into_bytes();
    line.extend_from_slice(message);
    if line.last() != Some(&b'\n') {
        line.push(b'\n');
    }
    sink.output.write_all(&line)?;
    sink.output.flush()?;
    Ok(())
}

/// Buffered stream that forwards every successful event to the system sink.
///
/// Events whose status is an error are discarded and the error returned.
#[derive(Debug, Default)]
pub struct SystemStream {
    buf: Vec<u8>,
}

impl SystemStream {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Stream for SystemStream {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn eom(&mut self, status: Result<()>) -> Result<()> {
        let mut event = std::mem::take(&mut self.buf);
        let result = status.and_then(|()| output(&event));
        event.clear();
        self.buf = event;
        result
    }
}
