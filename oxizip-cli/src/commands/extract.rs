//! Extract command implementation.

use super::open_archive;
use crate::utils::{
    NamedError, apply_dir_times, create_progress_bar, matches_filters, output_path,
};
use filetime::FileTime;
use oxizip_deflate::InflateOptions;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Options for extracting archive contents.
pub struct ExtractOptions<'a> {
    pub output: &'a Path,
    pub files: &'a [String],
    pub include: &'a [String],
    pub exclude: &'a [String],
    pub stdout: bool,
    pub window_size: usize,
    pub buffer_size: usize,
    pub verbose: bool,
    pub progress: bool,
}

pub fn cmd_extract(
    archive: &Path,
    options: &ExtractOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = open_archive(archive)?;
    let inflate_options = InflateOptions::default()
        .with_window_size(options.window_size)
        .with_input_buffer_size(options.buffer_size);

    let should_extract = |name: &str| -> bool {
        // If specific files are requested, check those first
        if !options.files.is_empty()
            && !options
                .files
                .iter()
                .any(|f| name == f || name.starts_with(&format!("{}/", f.trim_end_matches('/'))))
        {
            return false;
        }
        matches_filters(name, options.include, options.exclude)
    };

    let to_extract: Vec<_> = reader
        .directory()
        .iter()
        .filter(|(_, name)| should_extract(name))
        .map(|(entry, _)| *entry)
        .collect();

    if !options.stdout {
        println!(
            "Extracting {} to {}",
            archive.display(),
            options.output.display()
        );
    }

    let pb = create_progress_bar(to_extract.len() as u64, options.progress && !options.stdout);
    pb.set_message("files");

    let stdout = std::io::stdout();
    let mut dir_times: Vec<(PathBuf, FileTime)> = Vec::new();
    for entry in &to_extract {
        let name = reader.name(entry).into_owned();
        let is_dir = reader.directory().is_dir(entry);

        if options.stdout {
            if !is_dir {
                let mut out = stdout.lock();
                reader
                    .extract_with(entry, &mut out, &inflate_options)
                    .map_err(|e| NamedError::new(&name, e))?;
                out.flush()?;
            }
            continue;
        }

        let path = output_path(options.output, &name).map_err(|e| NamedError::new(&name, e))?;
        if is_dir {
            std::fs::create_dir_all(&path)?;
            if options.verbose {
                pb.println(format!("  Created: {}", name));
            }
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let mut writer = BufWriter::new(File::create(&path)?);
            let written = reader
                .extract_with(entry, &mut writer, &inflate_options)
                .map_err(|e| NamedError::new(&name, e))?;
            writer.flush()?;
            drop(writer);

            if written != entry.uncompressed_size {
                warn!(
                    name = %name,
                    written,
                    expected = entry.uncompressed_size,
                    "extracted size differs from directory"
                );
            }
            if options.verbose {
                pb.println(format!("  Extracted: {} ({} bytes)", name, written));
            }
        }

        if let Some(modified) = entry.modification_time {
            let mtime = FileTime::from_unix_time(modified.timestamp(), 0);
            if is_dir {
                // Extracting children would bump it again.
                dir_times.push((path, mtime));
            } else {
                filetime::set_file_mtime(&path, mtime)?;
            }
        }
        pb.inc(1);
    }
    apply_dir_times(&dir_times)?;
    pb.finish_with_message("Done");

    Ok(())
}
