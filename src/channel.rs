//! Resolving which release channel a branch publishes to.

use std::sync::LazyLock;

use regex::Regex;

use crate::branch::{ChannelConfig, ResolvedBranch};

/// The channel non-maintenance branches publish to when the table is silent.
pub(crate) const DEFAULT_CHANNEL: &str = "latest";

static MAJOR_MAINTENANCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.x\.x").expect("major maintenance pattern is valid"));
static MINOR_MAINTENANCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+\.x").expect("minor maintenance pattern is valid"));

/// Whether `range` pins a single minor line (like `2.3.x`), which means major
/// roll-up tags must not move.
pub(crate) fn is_minor_maintenance(range: &str) -> bool {
    MINOR_MAINTENANCE.is_match(range)
}

/// A branch is in maintenance when it has a non-empty `range` or its name
/// contains a maintenance pattern like `1.x.x` or `1.2.x`.
pub(crate) fn is_maintenance(branch: &ResolvedBranch) -> bool {
    branch
        .range
        .as_deref()
        .is_some_and(|range| !range.is_empty())
        || MAJOR_MAINTENANCE.is_match(&branch.name)
        || MINOR_MAINTENANCE.is_match(&branch.name)
}

/// The channel the release lands on, `None` when the branch deliberately has
/// no channel.
///
/// Prerelease branches always have a channel. Everything else follows the
/// table: a configured name is used verbatim, a channel switched off stays
/// off except on maintenance branches (which fall back to the branch name so
/// old-line consumers still have a track to follow), and a silent table means
/// the default channel for mainline branches and none for maintenance ones.
pub(crate) fn resolve(branch: &ResolvedBranch) -> Option<String> {
    if branch.is_prerelease() {
        return Some(match &branch.channel {
            ChannelConfig::Named(name) => name.clone(),
            ChannelConfig::Unset | ChannelConfig::Empty => branch.name.clone(),
        });
    }
    match &branch.channel {
        ChannelConfig::Named(name) => Some(name.clone()),
        ChannelConfig::Empty => is_maintenance(branch).then(|| branch.name.clone()),
        ChannelConfig::Unset if is_maintenance(branch) => None,
        ChannelConfig::Unset => Some(DEFAULT_CHANNEL.to_string()),
    }
}
