//! Forcing a release when commit analysis finds nothing to release.

use std::{fmt, path::Path, str::FromStr};

use log::{debug, info};
use miette::Diagnostic;

use crate::{
    engine::{self, Decider, DecisionRequest, NextRelease},
    git,
};

/// What to do when the decision engine reports no releasable commits.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Policy {
    /// Force at least a minor bump with a synthetic `feat:` commit.
    DefaultMinor,
    /// Force at least a patch bump with a synthetic `fix:` commit.
    DefaultPatch,
}

impl Policy {
    pub(crate) const fn commit_type(self) -> &'static str {
        match self {
            Policy::DefaultMinor => "feat",
            Policy::DefaultPatch => "fix",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Policy::DefaultMinor => "default-minor",
            Policy::DefaultPatch => "default-patch",
        })
    }
}

impl FromStr for Policy {
    type Err = InvalidPolicy;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "default-minor" => Ok(Policy::DefaultMinor),
            "default-patch" => Ok(Policy::DefaultPatch),
            _ => Err(InvalidPolicy(raw.to_string())),
        }
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("Invalid version-bump option: {0}. Valid options are: default-minor, default-patch")]
#[diagnostic(
    code(escalate::invalid_policy),
    help("version-bump controls what happens when no commit since the last release asks for one.")
)]
pub(crate) struct InvalidPolicy(String);

/// A release decision, and whether a synthetic commit was needed to get it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Outcome {
    pub(crate) release: NextRelease,
    /// Escalated releases carry no usable notes: the only releasable commit
    /// was the synthetic one.
    pub(crate) escalated: bool,
}

/// Asks the decision engine for the next release. If it reports nothing to
/// release and a policy is set, commits a synthetic commit of the policy's
/// type and asks exactly once more.
///
/// The synthetic commit is reverted before returning, no matter how the
/// second attempt went.
pub(crate) fn decide(
    decider: &dyn Decider,
    request: &DecisionRequest<'_>,
    policy: Option<Policy>,
    workspace: &Path,
) -> Result<Outcome, Error> {
    if let Some(release) = decider.decide(request)? {
        if release.notes.is_empty() {
            return Err(Error::MissingNotes);
        }
        return Ok(Outcome {
            release,
            escalated: false,
        });
    }
    let Some(policy) = policy else {
        return Err(Error::NoReleasableChange);
    };

    info!(
        "No releasable commits found, retrying with a synthetic {}: commit",
        policy.commit_type()
    );
    git::commit_synthetic(workspace, policy.commit_type())?;
    let retry = decider.decide(request);
    git::revert_synthetic(workspace)?;
    debug!("Synthetic commit reverted");
    match retry? {
        Some(release) => Ok(Outcome {
            release,
            escalated: true,
        }),
        None => Err(Error::EscalationExhausted { policy }),
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error("No releasable changes found")]
    #[diagnostic(
        code(escalate::nothing_to_release),
        help(
            "No commit since the last release asks for a version bump. Check the commit messages \
             (or the aggregated message if squash-merging), or set version-bump to force a \
             release anyway."
        )
    )]
    NoReleasableChange,
    #[error("No release was generated even with version-bump {policy}")]
    #[diagnostic(
        code(escalate::exhausted),
        help(
            "The synthetic commit should have forced a release, so the commit analyzer is \
             probably configured with a preset that ignores feat: and fix: commits."
        )
    )]
    EscalationExhausted { policy: Policy },
    #[error("No release notes found in the next release. This is unexpected")]
    #[diagnostic(
        code(escalate::missing_notes),
        help(
            "The decision engine computed a release without any notes, which usually means its \
             release-notes generator is misconfigured."
        )
    )]
    MissingNotes,
    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] engine::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Git(#[from] git::Error),
}
