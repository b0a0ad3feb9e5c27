//! The decision flow for one pipeline run, from branch lookup to outputs.

use log::{debug, info};
use miette::Diagnostic;

use crate::{
    branch::{self, BranchPolicyTable},
    changelog, channel,
    config::Config,
    engine::{self, CommandDecider, Decider, DecisionRequest},
    escalate, fs, git, outputs, tags,
};

/// The final answer for one pipeline run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ReleaseDecision {
    /// Tag-formatted version, e.g. `v1.4.0` under the tag format `v${version}`.
    pub(crate) version: String,
    /// The release track downstream tooling should publish to, `None` when
    /// the branch deliberately has none.
    pub(crate) channel: Option<String>,
    /// Tags created once per release, never moved afterwards.
    pub(crate) git_tags: Vec<String>,
    /// Tags that may overwrite existing tags of the same name.
    pub(crate) tags: Vec<String>,
    pub(crate) prerelease: bool,
    /// Raw release notes. `None` for explicit versions and escalated
    /// releases, which have nothing meaningful to say.
    pub(crate) notes: Option<String>,
}

/// Computes the release decision, merges the changelog, and emits outputs.
pub(crate) fn run(config: &Config) -> Result<ReleaseDecision, Error> {
    let current_branch = git::current_branch(&config.workspace)?;
    debug!("Computing release decision for branch {current_branch}");

    let decision = if let Some(version) = &config.version {
        explicit(version, &current_branch, config)
    } else {
        let command = config.decider.as_deref().ok_or(Error::MissingDecider)?;
        let decider = CommandDecider::new(command.to_string(), &config.workspace);
        computed(&current_branch, config, &decider)?
    };

    let notes_file = write_notes(&decision, config)?;
    outputs::emit(&decision, &notes_file, config.output_file.as_deref())?;
    match &decision.channel {
        Some(channel) => info!("Next release is {} on channel {channel}", decision.version),
        None => info!("Next release is {} with no channel", decision.version),
    }
    Ok(decision)
}

/// An explicitly requested version: no engine, no notes, never a prerelease.
fn explicit(version: &str, current_branch: &str, config: &Config) -> ReleaseDecision {
    info!("Releasing explicitly requested version {version}");
    let (channel, tag_sets) = tags::for_explicit(
        version,
        current_branch,
        &config.release_channel,
        config.floating_tags,
    );
    ReleaseDecision {
        version: version.to_string(),
        channel: Some(channel),
        git_tags: tag_sets.git_tags,
        tags: tag_sets.tags,
        prerelease: false,
        notes: None,
    }
}

fn computed(
    current_branch: &str,
    config: &Config,
    decider: &dyn Decider,
) -> Result<ReleaseDecision, Error> {
    let table = match &config.branches {
        Some(raw) => BranchPolicyTable::parse(raw)?,
        None => BranchPolicyTable::default(),
    };
    let mut resolved = table.classify(current_branch)?;
    debug!("Branch policy: {resolved:?}");

    let plugins = config
        .plugins
        .as_deref()
        .map(engine::parse_plugins)
        .transpose()?;
    if let Some(tag_format) = config.tag_format.as_deref() {
        if tag_format.matches("${version}").count() != 1 {
            return Err(engine::Error::InvalidTagFormat.into());
        }
    }

    let request = DecisionRequest {
        branches: &table.raw,
        current_branch,
        tag_format: config.tag_format.as_deref(),
        plugins: plugins.as_ref(),
        repository_url: config.repository_url.as_deref(),
        dry_run: true,
    };
    let escalate::Outcome { release, escalated } =
        escalate::decide(decider, &request, config.version_bump, &config.workspace)?;

    if let Some(engine_channel) = &release.channel {
        resolved.adopt_resolved_channel(engine_channel);
    }
    let channel = channel::resolve(&resolved);
    let tag_sets = tags::for_release(
        &release.version,
        &resolved,
        channel.as_deref(),
        config.floating_tags,
    );
    let notes = (!escalated).then_some(release.notes);
    Ok(ReleaseDecision {
        version: release.version,
        channel,
        git_tags: tag_sets.git_tags,
        tags: tag_sets.tags,
        prerelease: resolved.is_prerelease(),
        notes,
    })
}

/// Writes the notes file and merges the changelog, returning the notes file
/// path for the outputs (empty when this release carries no notes).
fn write_notes(decision: &ReleaseDecision, config: &Config) -> Result<String, Error> {
    let Some(notes) = &decision.notes else {
        return Ok(String::new());
    };
    if let Some(changelog_file) = &config.changelog_file {
        let path = config.workspace.join(changelog_file);
        changelog::merge(&path, notes, config.changelog_title.as_deref())?;
        info!("Updated changelog {}", path.display());
    }
    fs::write(&config.notes_file, notes)?;
    Ok(config.notes_file.display().to_string())
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Branch(#[from] branch::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] engine::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Escalate(#[from] escalate::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Git(#[from] git::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fs(#[from] fs::Error),
    #[error("No decision engine command configured")]
    #[diagnostic(
        code(release::missing_decider),
        help("Pass --decider with the command that runs the release decision engine.")
    )]
    MissingDecider,
}
