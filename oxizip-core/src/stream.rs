//! Byte sources and sinks for streaming decoders.
//!
//! A decoder never owns the whole compressed input or the whole decompressed
//! output. Instead it pulls input through a [`ByteSource`] whenever its input
//! window runs dry, and pushes output through a [`ByteSink`] whenever its
//! output window fills up. Both calls are synchronous.

use crate::error::Result;
use std::io::{self, Read, Write};

/// Supplier of input bytes.
pub trait ByteSource {
    /// Fill `buf` with the next input bytes and return how many were written.
    ///
    /// `Ok(0)` means the source is exhausted. Exhaustion is not an error: the
    /// bit reader keeps feeding zero bytes after it.
    fn refill(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Consumer of output bytes.
pub trait ByteSink {
    /// Accept the next run of output bytes.
    fn put(&mut self, data: &[u8]) -> Result<()>;
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    fn refill(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).refill(buf)
    }
}

impl<T: ByteSink + ?Sized> ByteSink for &mut T {
    fn put(&mut self, data: &[u8]) -> Result<()> {
        (**self).put(data)
    }
}

/// A [`ByteSource`] backed by any `Read` implementation.
#[derive(Debug)]
pub struct ReaderSource<R: Read> {
    inner: R,
    bytes_read: u64,
    exhausted: bool,
}

impl<R: Read> ReaderSource<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            bytes_read: 0,
            exhausted: false,
        }
    }

    /// Total bytes pulled from the reader.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Whether the reader has reported end of file.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Consume the source and return the reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn refill(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.exhausted || buf.is_empty() {
            return Ok(0);
        }
        loop {
            match self.inner.read(buf) {
                Ok(0) => {
                    self.exhausted = true;
                    return Ok(0);
                }
                Ok(n) => {
                    self.bytes_read += n as u64;
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// A [`ByteSource`] over an in-memory slice.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> SliceSource<'a> {
    /// Create a source over `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Bytes handed out so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes not yet handed out.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.position..]
    }
}

impl ByteSource for SliceSource<'_> {
    fn refill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let rest = self.remaining();
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.position += n;
        Ok(n)
    }
}

impl ByteSink for Vec<u8> {
    fn put(&mut self, data: &[u8]) -> Result<()> {
        self.extend_from_slice(data);
        Ok(())
    }
}

/// A [`ByteSink`] that writes to any `Write` implementation.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    inner: W,
    bytes_written: u64,
}

impl<W: Write> WriterSink<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    /// Total bytes written.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Get a mutable reference to the writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ByteSink for WriterSink<W> {
    fn put(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write_all(data)?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }
}

/// A [`ByteSink`] that discards everything and counts it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink {
    bytes: u64,
    flushes: u64,
}

impl NullSink {
    /// Create a new counting sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes received.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Number of flush calls received.
    pub fn flushes(&self) -> u64 {
        self.flushes
    }
}

impl ByteSink for NullSink {
    fn put(&mut self, data: &[u8]) -> Result<()> {
        self.bytes += data.len() as u64;
        self.flushes += 1;
        Ok(())
    }
}
