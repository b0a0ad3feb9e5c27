//! Everything one run needs, gathered at the CLI boundary.

use std::path::PathBuf;

use crate::escalate::Policy;

/// The full configuration for a run. The environment is only consulted while
/// building this (clap maps the usual CI variables onto the flags), nothing
/// deeper in the crate reads it ambiently.
#[derive(Clone, Debug)]
pub(crate) struct Config {
    /// The checkout the release is computed for.
    pub(crate) workspace: PathBuf,
    /// Raw JSON branch policy table. `None` means the built-in default table.
    pub(crate) branches: Option<String>,
    /// Raw JSON plugin list, forwarded to the decision engine untouched.
    pub(crate) plugins: Option<String>,
    /// For example `v${version}`, forwarded to the decision engine.
    pub(crate) tag_format: Option<String>,
    /// Changelog to merge the notes into, relative to the workspace. `None`
    /// skips the changelog entirely.
    pub(crate) changelog_file: Option<PathBuf>,
    pub(crate) changelog_title: Option<String>,
    /// Where the raw notes are written for later pipeline steps.
    pub(crate) notes_file: PathBuf,
    /// What to do when there is nothing to release.
    pub(crate) version_bump: Option<Policy>,
    /// Whether roll-up and channel tags should be produced at all.
    pub(crate) floating_tags: bool,
    /// Skip the decision engine and release exactly this version.
    pub(crate) version: Option<String>,
    /// Channel override for explicitly versioned releases.
    pub(crate) release_channel: ChannelOverride,
    /// Forwarded so the engine verifies push access against the right remote.
    pub(crate) repository_url: Option<String>,
    /// GitHub-Actions-style `key=value` outputs file. `None` logs instead.
    pub(crate) output_file: Option<PathBuf>,
    /// Command line that runs the decision engine.
    pub(crate) decider: Option<String>,
}

/// The release-channel input for explicitly versioned releases: a channel
/// name, the literal string `false` to release onto the branch's own name
/// without channel tags, or nothing.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) enum ChannelOverride {
    /// No override, the release lands on the default channel.
    #[default]
    Unset,
    UseBranch,
    Named(String),
}

impl ChannelOverride {
    pub(crate) fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" => ChannelOverride::Unset,
            "false" => ChannelOverride::UseBranch,
            name => ChannelOverride::Named(name.to_string()),
        }
    }
}
