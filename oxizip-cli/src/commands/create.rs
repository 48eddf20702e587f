//! Create command implementation.

use crate::utils::NamedError;
use oxizip_archive::ZipWriter;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

pub fn cmd_create(
    archive: &Path,
    files: &[PathBuf],
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(archive)?;
    let output = archive.canonicalize()?;
    let mut zip = ZipWriter::new(file);

    println!("Creating {}", archive.display());

    for path in files {
        add_path_to_zip(&mut zip, path, path, &output, verbose)?;
    }

    let count = zip
        .finalize()
        .map_err(|e| NamedError::new(archive.display().to_string(), e))?;
    println!("Stored {} entries", count);
    Ok(())
}

fn add_path_to_zip(
    zip: &mut ZipWriter<File>,
    path: &Path,
    base: &Path,
    output: &Path,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if path.canonicalize().is_ok_and(|p| p == output) {
        if verbose {
            println!("  Skipped: {} (output archive)", path.display());
        }
        return Ok(());
    }

    let name = path
        .strip_prefix(base.parent().unwrap_or(base))
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");

    if path.is_dir() {
        let dir_name = format!("{}/", name.trim_end_matches('/'));
        zip.store(&dir_name, &[])
            .map_err(|e| NamedError::new(&dir_name, e))?;
        if verbose {
            println!("  Added: {}", dir_name);
        }

        let mut children = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        children.sort();
        for child in children {
            add_path_to_zip(zip, &child, base, output, verbose)?;
        }
    } else {
        let data = std::fs::read(path)?;
        zip.store(&name, &data)
            .map_err(|e| NamedError::new(&name, e))?;
        if verbose {
            println!("  Added: {} ({} bytes)", name, data.len());
        }
    }
    Ok(())
}
