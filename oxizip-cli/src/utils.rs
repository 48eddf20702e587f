//! Utility functions for the CLI.

use filetime::FileTime;
use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use oxizip_archive::{DirEntry, Directory};
use oxizip_core::OxiZipError;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

/// An error tagged with the archive or entry it concerns.
#[derive(Debug, thiserror::Error)]
#[error("{name}: {source}")]
pub struct NamedError {
    name: String,
    #[source]
    source: OxiZipError,
}

impl NamedError {
    pub fn new(name: impl Into<String>, source: OxiZipError) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is valid")
            .progress_chars("█▓▒░ "),
    );
    pb
}

/// Check if a filename matches the filter patterns.
/// - If include patterns are specified, the name must match at least one
/// - If exclude patterns are specified, the name must not match any
pub fn matches_filters(name: &str, include: &[String], exclude: &[String]) -> bool {
    let matches = |pattern: &String| {
        Pattern::new(pattern)
            .map(|p| p.matches(name))
            .unwrap_or(false)
    };

    if exclude.iter().any(matches) {
        return false;
    }
    include.is_empty() || include.iter().any(matches)
}

/// Join an entry name onto the output directory.
///
/// Absolute names and `..` components are refused; `.` components are
/// dropped.
pub fn output_path(output: &Path, name: &str) -> Result<PathBuf, OxiZipError> {
    let mut path = output.to_path_buf();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(OxiZipError::path_traversal(name));
            }
        }
    }
    if name.contains('\0') {
        return Err(OxiZipError::path_traversal(name));
    }
    Ok(path)
}

/// JSON serializable entry data for archive listings.
#[derive(Debug, Serialize)]
pub struct EntryJson {
    name: String,
    offset: u64,
    compressed_size: u64,
    uncompressed_size: u64,
    method: &'static str,
    crc32: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified: Option<String>,
    is_dir: bool,
}

impl EntryJson {
    pub fn new(directory: &Directory, entry: &DirEntry) -> Self {
        Self {
            name: directory.name(entry).into_owned(),
            offset: entry.local_header_offset,
            compressed_size: entry.compressed_size,
            uncompressed_size: entry.uncompressed_size,
            method: entry.method.name(),
            crc32: entry.crc32,
            modified: entry.modification_time.map(|t| t.to_rfc3339()),
            is_dir: directory.is_dir(entry),
        }
    }
}

/// Print entries, one name per line or in the verbose column layout.
pub fn print_entries(directory: &Directory, entries: &[&DirEntry], verbose: bool) {
    if !verbose {
        for entry in entries {
            println!("{}", directory.name(entry));
        }
        return;
    }

    println!(
        "{:>10} {:>10} {:>10} {:<17} Name",
        "Offset", "Compressed", "Size", "Modified"
    );
    println!("{}", "-".repeat(64));

    let mut total_size = 0u64;
    let mut total_compressed = 0u64;
    for entry in entries {
        let modified = entry
            .modification_time
            .map(|t| t.format("%Y %b %d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>10} {:>10} {:>10} {:<17} {}",
            entry.local_header_offset,
            entry.compressed_size,
            entry.uncompressed_size,
            modified,
            directory.name(entry)
        );
        total_size += entry.uncompressed_size;
        total_compressed += entry.compressed_size;
    }

    println!("{}", "-".repeat(64));
    println!(
        "{:>10} {:>10} {:>10} {:<17} {} files",
        "", total_compressed, total_size, "", entries.len()
    );
}

/// Set directory modification times after their contents are in place.
pub fn apply_dir_times(times: &[(PathBuf, FileTime)]) -> std::io::Result<()> {
    for (path, time) in times {
        filetime::set_file_mtime(path, *time)?;
    }
    Ok(())
}

/// Fresh per-process directory under the system temp dir.
#[cfg(test)]
pub(crate) fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("oxizip-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
