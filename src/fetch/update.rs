//! Updating an existing repository and pinning it to a tag.

use super::{Engine, FetchError};
use crate::hooks::HookKind;
use crate::ident::PackageId;
use crate::vcs::RepoStatus;
use std::fmt;
use std::path::Path;

/// Where tag pinning left HEAD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagPin {
    /// The repository has no tags; HEAD untouched.
    NoTags,
    /// HEAD already at the most recent tag.
    AlreadyAt(String),
    /// Checked out the most recent tag; HEAD is detached.
    Detached(String),
}

impl fmt::Display for TagPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagPin::NoTags => f.write_str("no tags"),
            TagPin::AlreadyAt(tag) => write!(f, "already at {}", tag),
            TagPin::Detached(tag) => write!(f, "{} (detached)", tag),
        }
    }
}

impl<'a> Engine<'a> {
    /// Bring the repository rooted at `dir` up to date. Only a clean checkout is touched;
    /// anything else is reported and left as it is.
    pub(super) fn update_repository(
        &mut self,
        repo: &PackageId,
        dir: &Path,
    ) -> Result<(), FetchError> {
        if let Err(source) = self.hooks.run(HookKind::BeforeUpdate, dir) {
            self.report
                .hook_failures
                .push((repo.clone(), HookKind::BeforeUpdate));
            return self.soft_fail(FetchError::HookFailed {
                package: repo.clone(),
                source,
            });
        }

        let status = match self.vcs.status(dir) {
            Ok(status) => status,
            Err(source) => {
                return self.soft_fail(FetchError::StatusQueryFailed {
                    repository: repo.clone(),
                    source,
                });
            }
        };
        if status != RepoStatus::Clean {
            self.reporter.warn(format!(
                "Not updating {} ({}), git status is {}",
                repo,
                dir.display(),
                status
            ));
            self.report.skipped_updates.push((repo.clone(), status));
            return Ok(());
        }

        let branch = match &self.options.primary_branch {
            Some(branch) => branch.clone(),
            None => match self.vcs.primary_branch(dir) {
                Ok(branch) => branch,
                Err(source) => {
                    return self.soft_fail(FetchError::UpdateStepFailed {
                        repository: repo.clone(),
                        step: "find the primary branch".to_string(),
                        source,
                    });
                }
            },
        };

        self.reporter
            .trace(format!("[{}] git checkout {}", dir.display(), branch));
        if let Err(source) = self.vcs.checkout(dir, &branch) {
            return self.soft_fail(FetchError::UpdateStepFailed {
                repository: repo.clone(),
                step: format!("checkout {}", branch),
                source,
            });
        }

        self.reporter.trace(format!("[{}] git pull", dir.display()));
        if let Err(source) = self.vcs.pull(dir) {
            return self.soft_fail(FetchError::UpdateStepFailed {
                repository: repo.clone(),
                step: "pull".to_string(),
                source,
            });
        }

        self.reporter.success(format!("Updated {}", repo));
        self.report.updated.push(repo.clone());

        if self.options.tagged {
            self.pin_tag(repo, dir)?;
        }
        Ok(())
    }

    /// Move HEAD to the most recent tag, if the repository has any.
    pub(super) fn pin_tag(&mut self, repo: &PackageId, dir: &Path) -> Result<(), FetchError> {
        let tags = match self.vcs.tags(dir) {
            Ok(tags) => tags,
            Err(source) => {
                return self.soft_fail(FetchError::UpdateStepFailed {
                    repository: repo.clone(),
                    step: "list tags".to_string(),
                    source,
                });
            }
        };

        let latest = if tags.is_empty() {
            None
        } else {
            match self.vcs.most_recent_tag(dir) {
                Ok(tag) => tag,
                Err(source) => {
                    return self.soft_fail(FetchError::UpdateStepFailed {
                        repository: repo.clone(),
                        step: "find the most recent tag".to_string(),
                        source,
                    });
                }
            }
        };

        let Some(tag) = latest else {
            self.reporter
                .warn(format!("Package {} ({}) has no tags", repo, dir.display()));
            self.report.pinned.push((repo.clone(), TagPin::NoTags));
            return Ok(());
        };

        let pin = match self.vcs.head_matches(dir, &tag) {
            Ok(true) => TagPin::AlreadyAt(tag),
            Ok(false) => {
                self.reporter
                    .trace(format!("[{}] git checkout {}", dir.display(), tag));
                if let Err(source) = self.vcs.checkout(dir, &tag) {
                    return self.soft_fail(FetchError::UpdateStepFailed {
                        repository: repo.clone(),
                        step: format!("checkout tag {}", tag),
                        source,
                    });
                }
                TagPin::Detached(tag)
            }
            Err(source) => {
                return self.soft_fail(FetchError::UpdateStepFailed {
                    repository: repo.clone(),
                    step: format!("resolve tag {}", tag),
                    source,
                });
            }
        };

        self.report.pinned.push((repo.clone(), pin));
        Ok(())
    }
}
