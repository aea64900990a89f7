//! Toolchain collaborators: package metadata and install.
//!
//! The fetch engine asks two questions of the language toolchain: what packages live under
//! an identifier and what they import ([`Metadata`]), and how to build/install them
//! ([`Installer`]). [`GoToolchain`] answers both by shelling out to `go` in GOPATH mode.

mod go;
pub mod types;

pub use go::GoToolchain;
pub use types::{PackageDir, PackageInfo, ToolchainError};

use crate::ident::{PackageId, PackageSpec};
use std::path::{Path, PathBuf};

pub trait Metadata {
    /// On-disk directory for `pkg` and whether it exists yet.
    fn directory(&self, working_dir: &Path, pkg: &PackageId) -> PackageDir;

    /// Every package selected by `spec`, with its declared imports, in toolchain order.
    fn enumerate(
        &self,
        working_dir: &Path,
        spec: &PackageSpec,
    ) -> Result<Vec<PackageInfo>, ToolchainError>;

    fn is_standard_library(&self, id: &PackageId) -> bool;

    /// Canonical identifier of the package rooted at `dir`, if `dir` lies in the workspace.
    fn identifier_for(&self, working_dir: &Path, dir: &Path) -> Option<PackageId>;
}

pub trait Installer: Sync {
    fn install(&self, working_dir: &Path, spec: &PackageSpec) -> Result<(), ToolchainError>;
}

/// Detect the `go` toolchain, using `gopath` when given and the environment otherwise.
pub fn detect_toolchain(
    gopath: &[PathBuf],
    build_flags: Vec<String>,
) -> Result<GoToolchain, ToolchainError> {
    GoToolchain::detect(gopath, build_flags)
}
