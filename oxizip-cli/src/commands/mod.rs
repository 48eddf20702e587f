//! Command implementations for OxiZip CLI.

pub mod create;
pub mod extract;
pub mod list;

pub use create::cmd_create;
pub use extract::{ExtractOptions, cmd_extract};
pub use list::{ListOptions, cmd_list};
pub use test::cmd_test;

use crate::utils::NamedError;
use oxizip_archive::ZipReader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Open an archive and read its directory, naming the archive on failure.
pub(crate) fn open_archive(archive: &Path) -> Result<ZipReader<BufReader<File>>, NamedError> {
    let name = archive.display().to_string();
    let file = File::open(archive).map_err(|e| NamedError::new(&name, e.into()))?;
    ZipReader::new(BufReader::new(file)).map_err(|e| NamedError::new(&name, e))
}
