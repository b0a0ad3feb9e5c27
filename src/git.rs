//! The small slice of Git this tool needs: knowing which branch is checked
//! out, and creating/reverting the synthetic commit used to force a release.

use std::path::Path;

use git2::{Repository, ResetType};
use log::debug;
use miette::Diagnostic;

use crate::fs;

/// The throwaway file committed to force the decision engine's hand.
pub(crate) const SYNTHETIC_MARKER: &str = ".reltrack-synthetic";

/// The branch HEAD points at.
pub(crate) fn current_branch(workspace: &Path) -> Result<String, Error> {
    let repo = Repository::open(workspace).map_err(ErrorKind::OpenRepo)?;
    let head = repo.head()?;
    if !head.is_branch() {
        return Err(ErrorKind::NotOnAGitBranch.into());
    }
    head.shorthand()
        .map(String::from)
        .ok_or_else(|| ErrorKind::NotOnAGitBranch.into())
}

/// Commits an empty marker file so the next commit analysis sees exactly one
/// releasable commit of the given type.
///
/// Callers must follow up with [`revert_synthetic`], the commit must never
/// outlive the run.
pub(crate) fn commit_synthetic(workspace: &Path, commit_type: &str) -> Result<(), Error> {
    let repo = Repository::open(workspace).map_err(ErrorKind::OpenRepo)?;
    fs::write(&workspace.join(SYNTHETIC_MARKER), "")?;
    let mut index = repo.index()?;
    index.add_path(Path::new(SYNTHETIC_MARKER))?;
    index.write()?;
    let tree = repo.find_tree(index.write_tree()?)?;
    let signature = repo.signature().map_err(|_| ErrorKind::NoCommitter)?;
    let parent = repo.head()?.peel_to_commit()?;
    let message = format!("{commit_type}: synthetic");
    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        &message,
        &tree,
        &[&parent],
    )?;
    debug!("Created synthetic commit {message:?}");
    Ok(())
}

/// Drops the synthetic commit (and its marker file) by hard-resetting to the
/// parent of HEAD.
pub(crate) fn revert_synthetic(workspace: &Path) -> Result<(), Error> {
    let repo = Repository::open(workspace).map_err(ErrorKind::OpenRepo)?;
    let parent = repo
        .head()?
        .peel_to_commit()?
        .parent(0)
        .map_err(ErrorKind::NoParent)?;
    let target = parent.into_object();
    repo.reset(&target, ResetType::Hard, None)?;
    debug!("Reverted synthetic commit, HEAD is back at {}", target.id());
    Ok(())
}

#[derive(Debug, Diagnostic, thiserror::Error)]
#[error(transparent)]
#[diagnostic(transparent)]
pub(crate) struct Error(Box<ErrorKind>);

impl<T: Into<ErrorKind>> From<T> for Error {
    fn from(kind: T) -> Self {
        Self(Box::new(kind.into()))
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
enum ErrorKind {
    #[error("Could not open Git repository: {0}")]
    #[diagnostic(
        code(git::open_repo),
        help("Make sure you are in a Git repository and that you have permission to access it.")
    )]
    OpenRepo(#[source] git2::Error),
    #[error("Not on the tip of a Git branch.")]
    #[diagnostic(
        code(git::not_a_branch),
        help("Releases are computed for the checked-out branch, so a detached HEAD won't work.")
    )]
    NotOnAGitBranch,
    #[error("Could not determine Git committer to commit changes")]
    #[diagnostic(
        code(git::no_committer),
        help(
            "We couldn't determine who to commit the changes as. Please set the `user.name` and \
                `user.email` Git config options."
        )
    )]
    NoCommitter,
    #[error("Could not find the commit to reset back to: {0}")]
    #[diagnostic(code(git::no_parent))]
    NoParent(#[source] git2::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fs(#[from] fs::Error),
    #[error("Unknown Git error: {0}")]
    #[diagnostic(
        code(git::libgit2),
        help(
            "Something went wrong when interacting with Git that we don't have an explanation for. \
                    Maybe try performing the operation manually?"
        )
    )]
    Git(#[from] git2::Error),
}
