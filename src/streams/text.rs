//! Line-oriented text stream over any writer

use crate::core::{Result, Stream};
use std::io::Write;

/// Writes events straight through to `W`, terminating each with a newline
/// unless the event already ended in one.
pub struct TextStream<W: Write + Send> {
    inner: W,
    last_byte: Option<u8>,
}

impl<W: Write + Send> TextStream<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            last_byte: None,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send> Stream for TextStream<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let n = self.inner.write(buf)?;
        if n > 0 {
            self.last_byte = Some(buf[n - 1]);
        }
        Ok(n)
    }

    fn eom(&mut self, status: Result<()>) -> Result<()> {
        let terminated = if self.last_byte.take() != Some(b'\n') {
            self.inner.write_all(b"\n")
        } else {
            Ok(())
        };
        let flushed = terminated.and_then(|()| self.inner.flush());
        // the event's own failure outranks ours
        status.and(flushed.map_err(Into::into))
    }
}
