use super::{Installer, Metadata, PackageDir, PackageInfo, ToolchainError};
use crate::ident::{PackageId, PackageSpec};
use colored::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;

/// Pseudo-package for cgo; never fetched.
const CGO_PSEUDO_PACKAGE: &str = "C";

/// `go` in GOPATH mode.
#[derive(Debug)]
pub struct GoToolchain {
    go: PathBuf,
    gopath: Vec<PathBuf>,
    build_flags: Vec<String>,
    trace: bool,
    std_libs: OnceLock<HashSet<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListPackage {
    import_path: String,
    #[serde(default)]
    imports: Vec<String>,
    #[serde(default)]
    test_imports: Vec<String>,
    #[serde(default)]
    x_test_imports: Vec<String>,
    #[serde(default)]
    error: Option<GoListError>,
}

#[derive(Deserialize)]
struct GoListError {
    #[serde(rename = "Err")]
    err: String,
}

/// Parse the concatenated JSON objects printed by `go list -json`.
pub(crate) fn parse_list(output: &[u8]) -> Result<Vec<PackageInfo>, serde_json::Error> {
    serde_json::Deserializer::from_slice(output)
        .into_iter::<GoListPackage>()
        .map(|entry| {
            entry.map(|pkg| PackageInfo {
                id: PackageId::new(pkg.import_path),
                imports: pkg.imports.into_iter().map(PackageId::new).collect(),
                test_imports: pkg
                    .test_imports
                    .into_iter()
                    .chain(pkg.x_test_imports)
                    .map(PackageId::new)
                    .collect(),
                error: pkg.error.map(|e| e.err),
            })
        })
        .collect()
}

fn gopath_from_env() -> Vec<PathBuf> {
    std::env::var_os("GOPATH")
        .map(|value| {
            std::env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn relative_identifier(dir: &Path, src: &Path) -> Option<PackageId> {
    let rel = dir.strip_prefix(src).ok()?;
    let segments: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(PackageId::new(segments.join("/")))
    }
}

impl GoToolchain {
    /// Toolchain over an explicit GOPATH, without probing the environment.
    pub fn with_gopath(gopath: Vec<PathBuf>, build_flags: Vec<String>) -> Self {
        Self {
            go: PathBuf::from("go"),
            gopath,
            build_flags,
            trace: false,
            std_libs: OnceLock::new(),
        }
    }

    pub fn detect(gopath: &[PathBuf], build_flags: Vec<String>) -> Result<Self, ToolchainError> {
        let probe = Command::new("go").arg("version").output();
        match probe {
            Ok(out) if out.status.success() => {}
            _ => {
                return Err(ToolchainError::NotFound(
                    "`go` is not on PATH. Install Go from https://go.dev/dl/".to_string(),
                ));
            }
        }

        let mut gopath = if gopath.is_empty() {
            gopath_from_env()
        } else {
            gopath.to_vec()
        };

        if gopath.is_empty() {
            let out = Command::new("go").args(["env", "GOPATH"]).output()?;
            let value = String::from_utf8_lossy(&out.stdout).trim().to_string();
            gopath = std::env::split_paths(&OsString::from(value))
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }

        let Some(first) = gopath.first() else {
            return Err(ToolchainError::NotFound("GOPATH is not set".to_string()));
        };
        if !first.exists() {
            return Err(ToolchainError::NotFound(format!(
                "first GOPATH element ({}) not found",
                first.display()
            )));
        }

        Ok(Self::with_gopath(gopath, build_flags))
    }

    /// Print every command before running it.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn gopath(&self) -> &[PathBuf] {
        &self.gopath
    }

    fn run(&self, working_dir: &Path, args: &[&str]) -> Result<Output, ToolchainError> {
        let command_line = format!("go {}", args.join(" "));
        if self.trace {
            println!(
                "   {} [{}] {}",
                "$".dimmed(),
                working_dir.display(),
                command_line.dimmed()
            );
        }

        let gopath = std::env::join_paths(&self.gopath)
            .map_err(|e| ToolchainError::NotFound(format!("invalid GOPATH: {}", e)))?;
        let output = Command::new(&self.go)
            .args(args)
            .current_dir(working_dir)
            .env("GOPATH", gopath)
            .env("GO111MODULE", "off")
            .output()?;

        if output.status.success() {
            Ok(output)
        } else {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            Err(ToolchainError::CommandFailed {
                command: command_line,
                output: text.trim().to_string(),
            })
        }
    }

    fn load_std_libs(&self) -> HashSet<String> {
        let cwd = self
            .gopath
            .first()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("."));
        match self.run(&cwd, &["list", "std"]) {
            Ok(out) => String::from_utf8_lossy(&out.stdout)
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
            Err(err) => {
                eprintln!("{} Could not list standard library: {}", "!".yellow(), err);
                HashSet::new()
            }
        }
    }
}

impl Metadata for GoToolchain {
    fn directory(&self, working_dir: &Path, pkg: &PackageId) -> PackageDir {
        for root in &self.gopath {
            let mut candidate = root.join("src");
            candidate.extend(pkg.segments());
            if candidate.is_dir() {
                return PackageDir {
                    path: candidate,
                    exists: true,
                };
            }
        }

        let mut path = self
            .gopath
            .first()
            .map(|root| root.join("src"))
            .unwrap_or_else(|| working_dir.to_path_buf());
        path.extend(pkg.segments());
        PackageDir {
            path,
            exists: false,
        }
    }

    fn enumerate(
        &self,
        working_dir: &Path,
        spec: &PackageSpec,
    ) -> Result<Vec<PackageInfo>, ToolchainError> {
        let target = spec.to_string();
        let output = self.run(working_dir, &["list", "-e", "-json", &target])?;
        Ok(parse_list(&output.stdout)?)
    }

    fn is_standard_library(&self, id: &PackageId) -> bool {
        id.as_str() == CGO_PSEUDO_PACKAGE
            || self
                .std_libs
                .get_or_init(|| self.load_std_libs())
                .contains(id.as_str())
    }

    fn identifier_for(&self, _working_dir: &Path, dir: &Path) -> Option<PackageId> {
        for root in &self.gopath {
            let src = root.join("src");
            if let Some(id) = relative_identifier(dir, &src) {
                return Some(id);
            }
            if let (Ok(dir), Ok(src)) = (dir.canonicalize(), src.canonicalize())
                && let Some(id) = relative_identifier(&dir, &src)
            {
                return Some(id);
            }
        }
        None
    }
}

impl Installer for GoToolchain {
    fn install(&self, working_dir: &Path, spec: &PackageSpec) -> Result<(), ToolchainError> {
        let target = spec.to_string();
        let mut args: Vec<&str> = vec!["install"];
        args.extend(self.build_flags.iter().map(String::as_str));
        args.push(&target);
        self.run(working_dir, &args).map(|_| ())
    }
}
