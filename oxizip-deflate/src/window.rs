//! Circular output window for streaming decompression.
//!
//! The window holds the most recent `capacity` bytes of output, which is
//! exactly the history back-references may reach. Whenever the write cursor
//! reaches the end of the buffer the whole buffer is handed to the sink and
//! the cursor wraps to zero; the flushed bytes stay in place as history.

use oxizip_core::error::{OxiZipError, Result};
use oxizip_core::stream::ByteSink;

/// Window size for DEFLATE (32 KB).
pub const DEFLATE_WINDOW_SIZE: usize = 32768;

/// A circular output buffer that flushes to a [`ByteSink`] when full.
#[derive(Debug, Clone)]
pub struct OutputWindow {
    /// The underlying buffer.
    buffer: Box<[u8]>,
    /// Next write position.
    pos: usize,
    /// Start of bytes not yet handed to the sink.
    unflushed: usize,
    /// Total bytes written.
    total: u64,
}

impl OutputWindow {
    /// Create a window holding `capacity` bytes of history (at least 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0u8; capacity.max(1)].into_boxed_slice(),
            pos: 0,
            unflushed: 0,
            total: 0,
        }
    }

    /// Create a window of the DEFLATE maximum distance.
    pub fn deflate() -> Self {
        Self::new(DEFLATE_WINDOW_SIZE)
    }

    /// Size of the window.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes written so far.
    pub fn total_out(&self) -> u64 {
        self.total
    }

    /// Bytes of history a back-reference can currently reach.
    pub fn available(&self) -> u64 {
        self.total.min(self.buffer.len() as u64)
    }

    /// Clear history and counters.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.unflushed = 0;
        self.total = 0;
    }

    /// Advance the cursor by `n` written bytes, flushing on wraparound.
    #[inline]
    fn advance<K: ByteSink>(&mut self, n: usize, sink: &mut K) -> Result<()> {
        self.pos += n;
        self.total += n as u64;
        if self.pos == self.buffer.len() {
            sink.put(&self.buffer[self.unflushed..])?;
            self.pos = 0;
            self.unflushed = 0;
        }
        Ok(())
    }

    /// Write a single byte.
    #[inline]
    pub fn push<K: ByteSink>(&mut self, byte: u8, sink: &mut K) -> Result<()> {
        self.buffer[self.pos] = byte;
        self.advance(1, sink)
    }

    /// Write a run of literal bytes.
    pub fn write_slice<K: ByteSink>(&mut self, mut data: &[u8], sink: &mut K) -> Result<()> {
        while !data.is_empty() {
            let n = data.len().min(self.buffer.len() - self.pos);
            self.buffer[self.pos..self.pos + n].copy_from_slice(&data[..n]);
            data = &data[n..];
            self.advance(n, sink)?;
        }
        Ok(())
    }

    /// Copy `length` bytes starting `distance` bytes back.
    ///
    /// Overlapping copies (`distance < length`) repeat the referenced bytes,
    /// and copies may cross the wrap point in both source and destination.
    pub fn copy_match<K: ByteSink>(
        &mut self,
        distance: usize,
        mut length: usize,
        sink: &mut K,
    ) -> Result<()> {
        let size = self.buffer.len();
        if distance == 0 || distance > size || distance as u64 > self.total {
            return Err(OxiZipError::invalid_distance(distance, self.available()));
        }

        while length > 0 {
            let src = if self.pos >= distance {
                self.pos - distance
            } else {
                self.pos + size - distance
            };
            let n = length
                .min(size - self.pos)
                .min(size - src)
                .min(distance);
            self.buffer.copy_within(src..src + n, self.pos);
            length -= n;
            self.advance(n, sink)?;
        }
        Ok(())
    }

    /// Hand every byte not yet flushed to the sink.
    pub fn finish<K: ByteSink>(&mut self, sink: &mut K) -> Result<()> {
        if self.pos > self.unflushed {
            sink.put(&self.buffer[self.unflushed..self.pos])?;
            self.unflushed = self.pos;
        }
        Ok(())
    }
}
