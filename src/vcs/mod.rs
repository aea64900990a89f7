//! Version-control collaborator.
//!
//! The fetch engine only talks to repositories through [`Vcs`]. The production
//! implementation is [`Git`], built on `git2`.

mod git;

pub use git::Git;

use std::fmt;
use std::path::{Path, PathBuf};

/// Working-tree state as seen before an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoStatus {
    Clean,
    /// Modified, staged or untracked files present.
    Uncommitted,
    /// HEAD does not point at a branch.
    Detached,
    /// Local commits not yet on the upstream branch.
    Unpushed,
    /// The current branch tracks no upstream.
    NoUpstream,
}

impl fmt::Display for RepoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RepoStatus::Clean => "clean",
            RepoStatus::Uncommitted => "uncommitted changes",
            RepoStatus::Detached => "detached head",
            RepoStatus::Unpushed => "unpushed local commits",
            RepoStatus::NoUpstream => "no upstream configured",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    #[error(transparent)]
    Git(#[from] git2::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Refused(String),
}

pub trait Vcs {
    /// Clone `remote` into `dir`, creating parent directories as needed.
    fn clone_repo(&self, dir: &Path, remote: &str) -> Result<(), VcsError>;

    /// Fast-forward the current branch from its remote.
    fn pull(&self, dir: &Path) -> Result<(), VcsError>;

    fn status(&self, dir: &Path) -> Result<RepoStatus, VcsError>;

    fn tags(&self, dir: &Path) -> Result<Vec<String>, VcsError>;

    /// Most recent tag reachable from HEAD, `None` if there is none.
    fn most_recent_tag(&self, dir: &Path) -> Result<Option<String>, VcsError>;

    /// Check out a branch (HEAD follows it) or any other reference (HEAD detached).
    fn checkout(&self, dir: &Path, reference: &str) -> Result<(), VcsError>;

    /// True if HEAD already resolves to the same commit as `reference`.
    fn head_matches(&self, dir: &Path, reference: &str) -> Result<bool, VcsError>;

    /// Branch that updates are pulled onto.
    fn primary_branch(&self, dir: &Path) -> Result<String, VcsError>;

    /// Root of the working tree that contains `dir`.
    fn top_level(&self, dir: &Path) -> Result<PathBuf, VcsError>;

    fn is_repository(&self, dir: &Path) -> bool;
}
