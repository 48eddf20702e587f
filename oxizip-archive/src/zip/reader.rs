//! Reading entries out of an archive.

use super::directory::{DirEntry, Directory, read_directory};
use super::locate::locate;
use super::records::CompressionMethod;
use oxizip_core::error::{OxiZipError, Result};
use oxizip_core::stream::{ByteSink, ReaderSource, WriterSink};
use oxizip_deflate::{InflateOptions, Inflater};
use std::borrow::Cow;
use std::io::{Read, Seek, Write};
use tracing::debug;

/// Upper bound on the up-front reservation made by [`ZipReader::extract`].
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// ZIP archive reader.
///
/// The central directory is read once in [`new`](Self::new); entries are
/// then located and decoded on demand.
///
/// ```rust,no_run
/// use oxizip_archive::zip::ZipReader;
/// use std::fs::File;
///
/// let mut reader = ZipReader::new(File::open("archive.zip")?)?;
/// let entry = *reader.entry_by_name("readme.txt")?;
/// let data = reader.extract(&entry)?;
/// # Ok::<(), oxizip_core::OxiZipError>(())
/// ```
#[derive(Debug)]
pub struct ZipReader<R> {
    source: R,
    directory: Directory,
}

impl<R: Read + Seek> ZipReader<R> {
    /// Read the central directory of `source`.
    pub fn new(mut source: R) -> Result<Self> {
        let directory = read_directory(&mut source)?;
        Ok(Self { source, directory })
    }

    /// The parsed central directory.
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// All entries in central directory order.
    pub fn entries(&self) -> &[DirEntry] {
        self.directory.entries()
    }

    /// First entry with the given name.
    pub fn entry_by_name(&self, name: &str) -> Result<&DirEntry> {
        self.directory.entry_by_name(name)
    }

    /// Name of an entry.
    pub fn name(&self, entry: &DirEntry) -> Cow<'_, str> {
        self.directory.name(entry)
    }

    /// Decode an entry into memory.
    pub fn extract(&mut self, entry: &DirEntry) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let reserve = entry.uncompressed_size.min(MAX_PREALLOCATION);
        output
            .try_reserve(reserve as usize)
            .map_err(|_| OxiZipError::allocation_failed(reserve))?;
        self.decode_to_sink(entry, &mut output, &InflateOptions::default())?;
        Ok(output)
    }

    /// Decode an entry into a writer, returning the bytes written.
    pub fn extract_to<W: Write>(&mut self, entry: &DirEntry, writer: W) -> Result<u64> {
        self.extract_with(entry, writer, &InflateOptions::default())
    }

    /// Like [`extract_to`](Self::extract_to) with explicit decoder options.
    pub fn extract_with<W: Write>(
        &mut self,
        entry: &DirEntry,
        writer: W,
        options: &InflateOptions,
    ) -> Result<u64> {
        let mut sink = WriterSink::new(writer);
        self.decode_to_sink(entry, &mut sink, options)
    }

    /// Decode an entry into any sink, returning the bytes produced.
    ///
    /// The result is not compared with `uncompressed_size`.
    pub fn decode_to_sink<K: ByteSink>(
        &mut self,
        entry: &DirEntry,
        sink: &mut K,
        options: &InflateOptions,
    ) -> Result<u64> {
        if entry.is_encrypted() {
            return Err(OxiZipError::invalid_header(format!(
                "{}: encrypted entries are not supported",
                self.directory.name(entry)
            )));
        }
        if let CompressionMethod::Unknown(method) = entry.method {
            return Err(OxiZipError::unsupported_method(method));
        }

        let payload = locate(&mut self.source, entry)?;
        debug!(
            name = %self.directory.name(entry),
            payload,
            method = entry.method.name(),
            "decoding entry"
        );

        let limited = (&mut self.source).take(entry.compressed_size);
        match entry.method {
            CompressionMethod::Stored => copy_stored(limited, sink, entry.compressed_size, options),
            CompressionMethod::Deflate => {
                let mut inflater = Inflater::with_options(*options);
                let summary = inflater.inflate_source(ReaderSource::new(limited), sink)?;
                Ok(summary.bytes_out)
            }
            CompressionMethod::Unknown(method) => Err(OxiZipError::unsupported_method(method)),
        }
    }

    /// Consume the reader and return the source.
    pub fn into_inner(self) -> R {
        self.source
    }
}

/// Copy a stored payload to the sink in input-buffer-sized chunks.
fn copy_stored<R: Read, K: ByteSink>(
    mut reader: R,
    sink: &mut K,
    size: u64,
    options: &InflateOptions,
) -> Result<u64> {
    let mut buf = vec![0u8; options.input_buffer_size.max(1)];
    let mut copied = 0u64;
    while copied < size {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Err(OxiZipError::unexpected_eof(copied)),
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        sink.put(&buf[..n])?;
        copied += n as u64;
    }
    Ok(copied)
}
