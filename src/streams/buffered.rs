//! In-memory stream that hands each complete event to a callback

use crate::core::{Result, Stream};
use std::fmt;
use std::io::Write;

/// Read-only view of one buffered event, valid for the duration of the
/// EOM callback.
#[derive(Clone, Copy)]
pub struct Buffer<'a>(&'a [u8]);

impl<'a> Buffer<'a> {
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copies the buffer into `w`, returning the number of bytes written.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize> {
        w.write_all(self.0)?;
        Ok(self.0.len())
    }
}

impl fmt::Display for Buffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.0))
    }
}

impl fmt::Debug for Buffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer({:?})", String::from_utf8_lossy(self.0))
    }
}

/// Callback invoked on EOM with the event bytes and the incoming status.
pub type EomCallback = Box<dyn FnMut(Buffer<'_>, Result<()>) -> Result<()> + Send>;

/// Buffers all writes between calls to EOM.
///
/// On [`Stream::eom`] the optional callback decides whether and how to
/// forward the event. The buffer is emptied afterwards no matter what the
/// callback returns, so no bytes leak into the next event.
///
/// # Example
///
/// ```
/// use rust_log_facade::core::Stream;
/// use rust_log_facade::streams::BufferedStream;
/// use std::sync::{Arc, Mutex};
///
/// let captured = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&captured);
/// let mut stream = BufferedStream::with_callback(move |buf, status| {
///     status?;
///     sink.lock().unwrap().push(buf.to_string());
///     Ok(())
/// });
///
/// stream.write(b"hello").unwrap();
/// stream.eom(Ok(())).unwrap();
/// assert_eq!(captured.lock().unwrap().as_slice(), ["hello"]);
/// ```
#[derive(Default)]
pub struct BufferedStream {
    buf: Vec<u8>,
    on_eom: Option<EomCallback>,
}

impl BufferedStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback<F>(f: F) -> Self
    where
        F: FnMut(Buffer<'_>, Result<()>) -> Result<()> + Send + 'static,
    {
        Self {
            buf: Vec::new(),
            on_eom: Some(Box::new(f)),
        }
    }

    /// Bytes of the event currently being assembled.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }
}

impl Stream for BufferedStream {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn eom(&mut self, status: Result<()>) -> Result<()> {
        // taken up front so a panicking callback still leaves an empty buffer
        let mut event = std::mem::take(&mut self.buf);
        let result = match self.on_eom.as_mut() {
            Some(f) => f(Buffer(&event), status),
            None => status,
        };
        event.clear();
        self.buf = event;
        result
    }
}

impl fmt::Debug for BufferedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedStream")
            .field("pending", &self.buf.len())
            .field("callback", &self.on_eom.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LoggerError;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_without_callback_returns_status() {
        let mut b = BufferedStream::new();
        assert!(b.eom(Ok(())).is_ok());
        let err = b.eom(Err(LoggerError::other("foo"))).unwrap_err();
        assert_eq!(err.to_string(), "foo");
    }

    #[test]
    fn test_buffer_reset_after_eom() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&captured);
        let mut b = BufferedStream::with_callback(move |buf, _| {
            sink.lock().unwrap().push(buf.to_string());
            Ok(())
        });

        b.write(b"first").unwrap();
        b.eom(Ok(())).unwrap();
        assert!(b.pending().is_empty());

        b.write(b"second").unwrap();
        b.eom(Ok(())).unwrap();
        assert_eq!(*captured.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_buffer_reset_when_callback_fails() {
        let mut b = BufferedStream::with_callback(|_, _| Err(LoggerError::other("nope")));
        b.write(b"partial").unwrap();
        assert!(b.eom(Ok(())).is_err());
        assert!(b.pending().is_empty());
    }

    #[test]
    fn test_buffer_reset_when_callback_panics() {
        let mut b = BufferedStream::with_callback(|_, _| panic!("callback exploded"));
        b.write(b"partial").unwrap();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| b.eom(Ok(()))));
        assert!(outcome.is_err());
        assert!(b.pending().is_empty());
    }

    #[test]
    fn test_callback_sees_error_status() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let mut b = BufferedStream::with_callback(move |buf, status| {
            *sink.lock().unwrap() = Some((buf.len(), status.is_err()));
            status
        });
        b.write(b"abc").unwrap();
        assert!(b.eom(Err(LoggerError::other("x"))).is_err());
        assert_eq!(*seen.lock().unwrap(), Some((3, true)));
    }

    #[test]
    fn test_buffer_write_to() {
        let data = b"payload".to_vec();
        let mut out = Vec::new();
        assert_eq!(Buffer(&data).write_to(&mut out).unwrap(), 7);
        assert_eq!(out, data);
    }
}
