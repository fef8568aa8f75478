//! Stream that swallows all output, akin to /dev/null

use crate::core::{Result, Stream};

#[derive(Debug, Default, Clone, Copy)]
pub struct NullStream;

impl NullStream {
    pub fn new() -> Self {
        Self
    }
}

impl Stream for NullStream {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        Ok(buf.len())
    }

    fn eom(&mut self, _status: Result<()>) -> Result<()> {
        Ok(())
    }
}
