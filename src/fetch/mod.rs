//! Recursive fetch engine.
//!
//! [`Engine::fetch`] takes one package identifier and walks its import graph depth-first.
//! For every package it meets it decides whether to clone the owning repository, inspect
//! an existing checkout, update it, or leave it alone. A repository holding many packages
//! is handled as one unit: a package that does not exist yet is satisfied by cloning the
//! repository that owns it, found through the [`RuleSet`].
//!
//! State for one run lives in the engine ([`TraversalContext`]) and in the
//! [`FetchReport`] it builds up.
//!
//! ```text
//! fetch(pkg)
//!   ├─ visited?           → done
//!   ├─ missing on disk    → resolve rule → clone repo (or redirect to it)
//!   ├─ present on disk    → skip | inspect → update repo root
//!   └─ traverse imports   → fetch(import) ... → hooks → install
//! ```

mod engine;
mod error;
mod install;
mod update;


pub use engine::Engine;
pub use error::FetchError;
pub use install::InstallOutcome;
pub use update::TagPin;

use crate::hooks::HookKind;
use crate::ident::PackageId;
use crate::vcs::RepoStatus;
use crate::visited::VisitedSet;
use serde::Deserialize;

/// How packages that already exist on disk are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMode {
    /// Leave existing packages alone; only freshly cloned ones are traversed.
    #[default]
    Skip,
    /// Traverse existing packages too, fetching whatever they import that is missing.
    DeepFetch,
    /// Like `DeepFetch`, and bring every inspected repository up to date.
    Update,
}

#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub mode: ScanMode,
    pub install: bool,
    pub hooks: bool,
    /// Pin cloned and updated repositories to their most recent tag.
    pub tagged: bool,
    /// Treat a repository as one unit: enumerate `id/...` and redirect sub-packages to
    /// their repository root.
    pub subtree: bool,
    /// Branch to update onto, instead of the repository's default branch.
    pub primary_branch: Option<String>,
}

/// Identifiers processed, cloned and inspected during one run.
#[derive(Debug, Default)]
pub struct TraversalContext {
    pub visited: VisitedSet,
    pub cloned: VisitedSet,
    pub inspected: VisitedSet,
}

impl TraversalContext {
    /// True if `id` belongs to a repository cloned or inspected in this run.
    pub fn is_materialized(&self, id: &PackageId) -> bool {
        self.cloned.is_done(id) || self.inspected.is_done(id)
    }
}

/// What a run did, in the order it happened.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FetchReport {
    /// Packages whose traversal finished, leaves first.
    pub completed: Vec<PackageId>,
    pub cloned: Vec<PackageId>,
    pub updated: Vec<PackageId>,
    pub skipped_updates: Vec<(PackageId, RepoStatus)>,
    pub pinned: Vec<(PackageId, TagPin)>,
    pub hook_failures: Vec<(PackageId, HookKind)>,
    /// Packages whose install only partly succeeded, with the members that failed.
    pub install_failures: Vec<(PackageId, Vec<PackageId>)>,
    /// Every soft failure that was tolerated.
    pub warnings: Vec<String>,
}

impl FetchReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.install_failures.is_empty()
    }
}
