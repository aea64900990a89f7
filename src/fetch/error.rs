use crate::hooks::HookError;
use crate::ident::PackageId;
use crate::toolchain::ToolchainError;
use crate::vcs::VcsError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("could not find a rule matching {0}")]
    NoRuleMatched(PackageId),

    #[error("cannot get dependencies only for {0}: package does not exist")]
    MissingForDepsOnly(PackageId),

    #[error("package {package} not found in repository {repository}")]
    PackageNotFound {
        package: PackageId,
        repository: PackageId,
    },

    #[error("failed to clone {remote} into {repository}: {source}")]
    CloneFailed {
        repository: PackageId,
        remote: String,
        #[source]
        source: VcsError,
    },

    #[error("package {package} ({}) is not inside a git repository", dir.display())]
    NotARepository { package: PackageId, dir: PathBuf },

    #[error("repository root {} of package {package} does not map to a package in the workspace", dir.display())]
    PathMappingFailed { package: PackageId, dir: PathBuf },

    #[error("failed to get git status of {repository}: {source}")]
    StatusQueryFailed {
        repository: PackageId,
        #[source]
        source: VcsError,
    },

    #[error("not updating {repository}: could not {step}: {source}")]
    UpdateStepFailed {
        repository: PackageId,
        step: String,
        #[source]
        source: VcsError,
    },

    #[error("hook failed for {package}: {source}")]
    HookFailed {
        package: PackageId,
        #[source]
        source: HookError,
    },

    #[error("{spec} [Failed: {}]", failed.join(", "))]
    PartialInstallFailure { spec: String, failed: Vec<String> },

    #[error("failed to list {spec}: {source}")]
    Metadata {
        spec: String,
        #[source]
        source: ToolchainError,
    },
}

impl FetchError {
    /// Soft failures are recorded and only stop the run under fail-fast.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            FetchError::StatusQueryFailed { .. }
                | FetchError::UpdateStepFailed { .. }
                | FetchError::HookFailed { .. }
                | FetchError::PartialInstallFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_and_install_problems_are_soft() {
        let pull = FetchError::UpdateStepFailed {
            repository: PackageId::from("gh/u1/p"),
            step: "pull".to_string(),
            source: VcsError::Refused("diverged".to_string()),
        };
        let partial = FetchError::PartialInstallFailure {
            spec: "gh/u1/p/...".to_string(),
            failed: vec![".../s1".to_string()],
        };
        assert!(pull.is_soft());
        assert!(partial.is_soft());
        assert_eq!(partial.to_string(), "gh/u1/p/... [Failed: .../s1]");
    }

    #[test]
    fn test_missing_packages_are_hard() {
        let missing = FetchError::PackageNotFound {
            package: PackageId::from("gh/u1/p/missing"),
            repository: PackageId::from("gh/u1/p"),
        };
        assert!(!missing.is_soft());
        assert!(!FetchError::NoRuleMatched(PackageId::from("example.org/x")).is_soft());
    }
}
