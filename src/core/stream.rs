//! Stream trait for log output destinations
//!
//! A stream receives the bytes of one log event through any number of
//! [`Stream::write`] calls, followed by exactly one [`Stream::eom`] call
//! which frames the event and carries the accumulated write status.

use super::error::Result;
use parking_lot::Mutex;
use std::sync::Arc;

pub trait Stream: Send {
    /// Writes part of the current event, returning the number of bytes accepted.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Ends the current event. `status` is the outcome of the writes that
    /// made up the event; the returned result is the outcome of framing and
    /// forwarding it.
    fn eom(&mut self, status: Result<()>) -> Result<()>;

    /// Writes the whole buffer, looping over partial writes.
    fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            let n = self.write(buf)?;
            if n == 0 {
                return Err(std::io::Error::from(std::io::ErrorKind::WriteZero).into());
            }
            buf = &buf[n..];
        }
        Ok(())
    }
}

/// A stream shared between the per-level loggers of one configuration.
pub type SharedStream = Arc<Mutex<dyn Stream>>;

/// Wraps a stream for sharing.
pub fn shared<S: Stream + 'static>(stream: S) -> SharedStream {
    Arc::new(Mutex::new(stream))
}

impl<S: Stream + ?Sized> Stream for Box<S> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    fn eom(&mut self, status: Result<()>) -> Result<()> {
        (**self).eom(status)
    }
}
