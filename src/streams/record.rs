//! Length-prefixed record stream
//!
//! Every event is written as an unsigned LEB128 varint holding the payload
//! length, followed by the payload bytes. Records are assembled in memory
//! and written on EOM, so a record is never interleaved with another.

use crate::core::{LoggerError, Result, Stream, WritePhase};
use std::io::{Read, Write};

/// Maximum encoded size of a `u64` varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Encodes `value` into `buf`, returning the number of bytes used.
pub fn put_uvarint(buf: &mut [u8; MAX_VARINT_LEN], mut value: u64) -> usize {
    let mut i = 0;
    while value >= 0x80 {
        buf[i] = (value as u8) | 0x80;
        value >>= 7;
        i += 1;
    }
    buf[i] = value as u8;
    i + 1
}

/// Decodes a varint from `r`. Returns `Ok(None)` on a clean end of input.
pub fn read_uvarint<R: Read + ?Sized>(r: &mut R) -> Result<Option<u64>> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    let mut byte = [0u8; 1];
    for i in 0..MAX_VARINT_LEN {
        if r.read(&mut byte)? == 0 {
            return if i == 0 {
                Ok(None)
            } else {
                Err(LoggerError::malformed("truncated length prefix"))
            };
        }
        let b = byte[0];
        if i == MAX_VARINT_LEN - 1 && b > 1 {
            return Err(LoggerError::malformed("length prefix overflows u64"));
        }
        value |= u64::from(b & 0x7f) << shift;
        if b < 0x80 {
            return Ok(Some(value));
        }
        shift += 7;
    }
    Err(LoggerError::malformed("length prefix overflows u64"))
}

/// Reads one record written by [`RecordStream`]. Returns `Ok(None)` when
/// the input is exhausted.
pub fn read_record<R: Read + ?Sized>(r: &mut R) -> Result<Option<Vec<u8>>> {
    let Some(len) = read_uvarint(r)? else {
        return Ok(None);
    };
    let len = usize::try_from(len).map_err(|_| LoggerError::malformed("record too large"))?;
    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload)
        .map_err(|e| LoggerError::io_operation("reading record", "truncated payload", e))?;
    Ok(Some(payload))
}

pub struct RecordStream<W: Write + Send> {
    delegate: W,
    buf: Vec<u8>,
}

impl<W: Write + Send> RecordStream<W> {
    pub fn new(delegate: W) -> Self {
        Self {
            delegate,
            buf: Vec::new(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.delegate
    }

    pub fn into_inner(self) -> W {
        self.delegate
    }

    fn write_record(&mut self, payload: &[u8]) -> Result<()> {
        let mut sz = [0u8; MAX_VARINT_LEN];
        let n = put_uvarint(&mut sz, payload.len() as u64);
        let written = self.delegate.write(&sz[..n])?;
        if written != n {
            return Err(LoggerError::short_write(WritePhase::LengthPrefix, n, written));
        }

        if !payload.is_empty() {
            let written = self.delegate.write(payload)?;
            if written != payload.len() {
                return Err(LoggerError::short_write(
                    WritePhase::Payload,
                    payload.len(),
                    written,
                ));
            }
        }
        Ok(())
    }
}

impl<W: Write + Send> Stream for RecordStream<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn eom(&mut self, status: Result<()>) -> Result<()> {
        let mut event = std::mem::take(&mut self.buf);
        let result = status.and_then(|()| self.write_record(&event));
        event.clear();
        self.buf = event;
        result
    }
}
