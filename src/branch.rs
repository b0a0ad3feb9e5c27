//! The branch policy table: which branches release, and how.

use miette::Diagnostic;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

/// One entry in the branch policy table.
///
/// A bare string is shorthand for "this branch releases with all defaults".
/// An object can override the channel, mark the branch as a prerelease
/// branch, or pin a maintenance range.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub(crate) enum BranchSpec {
    Named(String),
    Detailed(BranchDetails),
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub(crate) struct BranchDetails {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) channel: ChannelConfig,
    #[serde(default)]
    pub(crate) prerelease: PrereleaseConfig,
    #[serde(default)]
    pub(crate) range: Option<String>,
}

/// What the table says about a branch's channel. "Nothing at all" and
/// "explicitly none" lead to different defaults later, so they are separate
/// states rather than a collapsed `Option`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) enum ChannelConfig {
    /// The table has no opinion, resolution falls back to defaults.
    #[default]
    Unset,
    /// Explicitly switched off with `false` or an empty string.
    Empty,
    /// A concrete channel name, possibly containing a `${name}` placeholder.
    Named(String),
}

impl<'de> Deserialize<'de> for ChannelConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Toggle(bool),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Toggle(false) => Ok(ChannelConfig::Empty),
            Raw::Toggle(true) => Err(serde::de::Error::custom(
                "`channel` must be a string or `false`, not `true`",
            )),
            Raw::Name(name) if name.trim().is_empty() => Ok(ChannelConfig::Empty),
            Raw::Name(name) => Ok(ChannelConfig::Named(name)),
        }
    }
}

/// Whether a branch cuts prereleases, and under which label.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) enum PrereleaseConfig {
    #[default]
    Off,
    /// Prerelease with the label derived from the branch name.
    On,
    /// Prerelease under an explicit label, e.g. `rc`.
    Label(String),
}

impl<'de> Deserialize<'de> for PrereleaseConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Toggle(bool),
            Label(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Toggle(false) => PrereleaseConfig::Off,
            Raw::Toggle(true) => PrereleaseConfig::On,
            Raw::Label(label) if label.is_empty() => PrereleaseConfig::Off,
            Raw::Label(label) => PrereleaseConfig::Label(label),
        })
    }
}

/// The ordered table of releasable branches.
///
/// `raw` is the table exactly as configured (normalized to an array) so it
/// can be forwarded to the decision engine and echoed in errors without
/// losing fields this tool does not model.
#[derive(Clone, Debug)]
pub(crate) struct BranchPolicyTable {
    pub(crate) raw: Value,
    specs: Vec<BranchSpec>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TableRepr {
    Many(Vec<BranchSpec>),
    One(BranchSpec),
}

impl BranchPolicyTable {
    pub(crate) fn parse(raw: &str) -> Result<Self, Error> {
        let value: Value = serde_json::from_str(raw).map_err(|source| Error::MalformedTable {
            raw: raw.to_string(),
            source,
        })?;
        Self::from_value(value).map_err(|source| Error::MalformedTable {
            raw: raw.to_string(),
            source,
        })
    }

    fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let specs = match serde_json::from_value(value.clone())? {
            TableRepr::Many(specs) => specs,
            TableRepr::One(spec) => vec![spec],
        };
        let raw = if value.is_array() {
            value
        } else {
            Value::Array(vec![value])
        };
        Ok(Self { raw, specs })
    }

    /// Finds the policy for `current`, first match wins. The result is a
    /// clone, later adjustments to it never leak back into the table.
    pub(crate) fn classify(&self, current: &str) -> Result<ResolvedBranch, Error> {
        for spec in &self.specs {
            match spec {
                BranchSpec::Named(name) if name == current => {
                    return Ok(ResolvedBranch {
                        name: name.clone(),
                        channel: ChannelConfig::Unset,
                        prerelease: PrereleaseConfig::Off,
                        range: None,
                    });
                }
                BranchSpec::Detailed(details) if details.name == current => {
                    let details = details.clone();
                    return Ok(ResolvedBranch {
                        name: details.name,
                        channel: details.channel,
                        prerelease: details.prerelease,
                        range: details.range,
                    });
                }
                _ => {}
            }
        }
        Err(Error::BranchNotFound {
            branch: current.to_string(),
            table: self.raw.to_string(),
        })
    }
}

impl Default for BranchPolicyTable {
    fn default() -> Self {
        let raw = json!([
            "main",
            "master",
            {"name": "beta", "prerelease": true},
            {"name": "alpha", "prerelease": true},
        ]);
        Self::from_value(raw).expect("default branch table is valid")
    }
}

/// A branch's policy after classification.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ResolvedBranch {
    pub(crate) name: String,
    pub(crate) channel: ChannelConfig,
    pub(crate) prerelease: PrereleaseConfig,
    pub(crate) range: Option<String>,
}

impl ResolvedBranch {
    pub(crate) fn is_prerelease(&self) -> bool {
        !matches!(self.prerelease, PrereleaseConfig::Off)
    }

    /// The range governing roll-up tags: the explicit `range` when non-empty,
    /// otherwise the branch name.
    pub(crate) fn effective_range(&self) -> &str {
        self.range
            .as_deref()
            .filter(|range| !range.is_empty())
            .unwrap_or(&self.name)
    }

    /// Replaces a configured channel name with the one the decision engine
    /// reported, which has placeholders like `${name}` already substituted.
    /// Branches without a configured channel name are left alone.
    pub(crate) fn adopt_resolved_channel(&mut self, resolved: &str) {
        if resolved.is_empty() {
            return;
        }
        if let ChannelConfig::Named(name) = &mut self.channel {
            *name = resolved.to_string();
        }
    }
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum Error {
    #[error("Failed to parse release branches: {raw}")]
    #[diagnostic(
        code(branch::malformed_table),
        help(
            "The branches input must be JSON: an array of branch names and/or objects with \
             name, channel, prerelease, and range fields."
        )
    )]
    MalformedTable {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Branch {branch:?} not found in branches: {table}")]
    #[diagnostic(
        code(branch::not_found),
        help(
            "Only branches listed in the branches input can release. Add this branch to the \
             table or skip the release step for it."
        )
    )]
    BranchNotFound { branch: String, table: String },
}
