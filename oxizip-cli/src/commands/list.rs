//! List command implementation.

use super::open_archive;
use crate::utils::{EntryJson, matches_filters, print_entries};
use std::path::Path;

/// Options for listing archive contents.
pub struct ListOptions<'a> {
    pub verbose: bool,
    pub json: bool,
    pub include: &'a [String],
    pub exclude: &'a [String],
}

pub fn cmd_list(archive: &Path, options: &ListOptions) -> Result<(), Box<dyn std::error::Error>> {
    let reader = open_archive(archive)?;
    let directory = reader.directory();

    let entries: Vec<_> = directory
        .iter()
        .filter(|(_, name)| matches_filters(name, options.include, options.exclude))
        .map(|(entry, _)| entry)
        .collect();

    if options.json {
        let json: Vec<_> = entries
            .iter()
            .map(|entry| EntryJson::new(directory, entry))
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    print_entries(directory, &entries, options.verbose);
    Ok(())
}
