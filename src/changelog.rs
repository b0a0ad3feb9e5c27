//! Merging freshly generated release notes into the changelog file.
//!
//! The changelog is rebuilt on every release: an optional title, then the new
//! entry, then every release entry that was already there. Anything sitting
//! above the first release entry (an old title, stray preamble) is dropped,
//! which is what makes rerunning a release idempotent.

use std::{path::Path, sync::LazyLock};

use log::debug;
use regex::Regex;

use crate::fs;

static MAJOR_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\n\n)# \[").expect("major entry pattern is valid"));
static MINOR_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\n\n)## \[").expect("minor entry pattern is valid"));

/// Merges `notes` into the changelog at `path`, creating the file if needed.
pub(crate) fn merge(path: &Path, notes: &str, title: Option<&str>) -> Result<(), fs::Error> {
    let old_content = fs::read_to_string_if_exists(path)?.unwrap_or_default();
    let merged = merge_content(&old_content, notes, title);
    fs::write(path, merged)?;
    debug!("Merged release notes into {}", path.display());
    Ok(())
}

fn merge_content(old_content: &str, notes: &str, title: Option<&str>) -> String {
    let preserved = existing_entries(old_content);
    let mut merged = String::new();
    if let Some(title) = title {
        merged.push_str(title);
        merged.push_str("\n\n");
    }
    merged.push_str(notes.trim());
    if !preserved.is_empty() {
        merged.push_str("\n\n");
        merged.push_str(preserved);
    }
    merged
}

/// Everything from the first release entry onward, kept verbatim.
///
/// An entry heading (`# [` or `## [`) only counts at the very start of the
/// file or right after a blank line, so a version reference in running text
/// doesn't truncate the file. Content without any entry heading is preserved
/// whole.
fn existing_entries(old_content: &str) -> &str {
    [&*MAJOR_ENTRY, &*MINOR_ENTRY]
        .iter()
        .filter_map(|pattern| pattern.find(old_content))
        .map(|found| {
            if found.start() == 0 {
                0
            } else {
                // Skip the blank line that the pattern had to match.
                found.start() + 2
            }
        })
        .min()
        .map_or(old_content, |boundary| &old_content[boundary..])
}
