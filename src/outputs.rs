//! Surfacing the decision to the rest of the pipeline as step outputs.

use std::path::Path;

use indexmap::IndexMap;
use itertools::Itertools;
use log::info;

use crate::{fs, release::ReleaseDecision};

/// Appends the decision to `output_file` as `key=value` lines, the format CI
/// step-output files expect. Without a file the outputs are logged instead,
/// so local runs still show what would have been published.
///
/// `notes_file` is the path the raw notes were written to, empty when this
/// release has none.
pub(crate) fn emit(
    decision: &ReleaseDecision,
    notes_file: &str,
    output_file: Option<&Path>,
) -> Result<(), fs::Error> {
    let mut outputs: IndexMap<&str, String> = IndexMap::new();
    outputs.insert("channel", decision.channel.clone().unwrap_or_default());
    outputs.insert("git_tags", decision.git_tags.iter().join(" "));
    outputs.insert("notes_file", notes_file.to_string());
    outputs.insert("prerelease", decision.prerelease.to_string());
    outputs.insert("tags", decision.tags.iter().join(" "));
    outputs.insert("version", decision.version.clone());

    match output_file {
        Some(path) => {
            let block: String = outputs
                .iter()
                .map(|(key, value)| format!("{key}={value}\n"))
                .collect();
            fs::append(path, block)
        }
        None => {
            for (key, value) in &outputs {
                info!("{key}={value}");
            }
            Ok(())
        }
    }
}
