//! Package lifecycle hooks.
//!
//! A package may carry scripts at its directory root that run around updates and
//! installs. Each hook is looked up under its accepted names in order; the first file
//! that exists is executed directly (it must be executable and carry its own shebang)
//! with the package directory as working directory.

use colored::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    BeforeUpdate,
    BeforeInstall,
    AfterInstall,
}

impl HookKind {
    /// File names this hook may be stored under, in lookup order.
    pub fn file_names(self) -> &'static [&'static str] {
        match self {
            HookKind::BeforeUpdate => &[
                "get-before-update.sh",
                "get-before-update",
                "get-before-pull.sh",
                "get-before-pull",
            ],
            HookKind::BeforeInstall => &["get-before-install.sh", "get-before-install"],
            HookKind::AfterInstall => &["get-after-install.sh", "get-after-install"],
        }
    }

    /// Script for this hook in `dir`, if present.
    pub fn locate(self, dir: &Path) -> Option<PathBuf> {
        self.file_names()
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HookKind::BeforeUpdate => "before-update",
            HookKind::BeforeInstall => "before-install",
            HookKind::AfterInstall => "after-install",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Hooks disabled, or no script for this hook.
    Skipped,
    Ran(PathBuf),
}

#[derive(Debug, thiserror::Error)]
#[error("{kind} hook {} failed: {reason}", script.display())]
pub struct HookError {
    pub kind: HookKind,
    pub script: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HookRunner {
    enabled: bool,
    trace: bool,
}

impl HookRunner {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            trace: false,
        }
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn run(&self, kind: HookKind, dir: &Path) -> Result<HookOutcome, HookError> {
        if !self.enabled {
            return Ok(HookOutcome::Skipped);
        }
        let Some(script) = kind.locate(dir) else {
            return Ok(HookOutcome::Skipped);
        };

        if self.trace {
            println!(
                "   {} [{}] {}",
                "$".dimmed(),
                dir.display(),
                script.display().to_string().dimmed()
            );
        }

        // Relative program paths resolve differently once current_dir is set.
        let program = std::path::absolute(&script).unwrap_or_else(|_| script.clone());
        let output = if cfg!(target_os = "windows") {
            Command::new("cmd")
                .arg("/C")
                .arg(&program)
                .current_dir(dir)
                .output()
        } else {
            Command::new(&program).current_dir(dir).output()
        };

        let output = output.map_err(|e| HookError {
            kind,
            script: script.clone(),
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            let reason = match output.status.code() {
                Some(code) if text.trim().is_empty() => format!("exit status {}", code),
                Some(code) => format!("exit status {}\n{}", code, text.trim()),
                None => "terminated by signal".to_string(),
            };
            return Err(HookError {
                kind,
                script,
                reason,
            });
        }

        Ok(HookOutcome::Ran(script))
    }
}
