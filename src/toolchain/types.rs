use crate::ident::PackageId;
use std::path::PathBuf;

/// Where a package lives, or would live once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDir {
    pub path: PathBuf,
    pub exists: bool,
}

/// One enumerated package and its declared imports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub id: PackageId,
    pub imports: Vec<PackageId>,
    /// Imports of the package's tests, internal and external.
    pub test_imports: Vec<PackageId>,
    /// Problem reported by the toolchain for this package, if any.
    pub error: Option<String>,
}

impl PackageInfo {
    pub fn new(id: impl Into<PackageId>, imports: &[&str]) -> Self {
        Self {
            id: id.into(),
            imports: imports.iter().map(|s| PackageId::from(*s)).collect(),
            test_imports: Vec::new(),
            error: None,
        }
    }

    pub fn with_test_imports(mut self, imports: &[&str]) -> Self {
        self.test_imports = imports.iter().map(|s| PackageId::from(*s)).collect();
        self
    }
}

/// Error type for toolchain operations
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    /// No usable toolchain or workspace
    #[error("toolchain not found: {0}")]
    NotFound(String),

    /// A toolchain command exited unsuccessfully
    #[error("`{command}` failed:\n{output}")]
    CommandFailed { command: String, output: String },

    /// Unreadable `go list` output
    #[error("unable to parse `go list` output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
