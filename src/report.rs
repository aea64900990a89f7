//! Console reporting and the error policy.
//!
//! All engine output goes through a [`Reporter`], which decides what is shown at the
//! current [`Verbosity`] and how soft failures are treated ([`ErrorPolicy`]).

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::fmt::Display;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    /// Also list every completed package.
    Verbose,
    /// Also echo every collaborator command.
    Trace,
}

/// What to do with failures that do not stop the traversal by themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Record them, print nothing.
    #[default]
    Silent,
    /// Record them and print a warning.
    Warn,
    /// Turn the first one into an error.
    FailFast,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    verbosity: Verbosity,
    policy: ErrorPolicy,
}

impl Reporter {
    pub fn new(verbosity: Verbosity, policy: ErrorPolicy) -> Self {
        Self { verbosity, policy }
    }

    /// Reporter that prints nothing.
    pub fn quiet(policy: ErrorPolicy) -> Self {
        Self::new(Verbosity::Quiet, policy)
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn is_tracing(&self) -> bool {
        self.verbosity >= Verbosity::Trace
    }

    pub fn warnings_visible(&self) -> bool {
        self.verbosity > Verbosity::Quiet
            && (self.policy != ErrorPolicy::Silent || self.verbosity >= Verbosity::Verbose)
    }

    pub fn warn(&self, msg: impl Display) {
        if self.warnings_visible() {
            eprintln!("{} {}", "!".yellow(), msg);
        }
    }

    pub fn error(&self, msg: impl Display) {
        eprintln!("{} {}", "x".red(), msg);
    }

    pub fn success(&self, msg: impl Display) {
        if self.verbosity >= Verbosity::Normal {
            println!("{} {}", "✓".green(), msg);
        }
    }

    /// A package finished traversal.
    pub fn completed(&self, pkg: impl Display) {
        if self.verbosity >= Verbosity::Verbose {
            println!("{}", pkg);
        }
    }

    pub fn trace(&self, msg: impl Display) {
        if self.is_tracing() {
            println!("   {} {}", "$".dimmed(), msg.to_string().dimmed());
        }
    }

    /// Spinner for a long-running step; hidden when quiet.
    pub fn spinner(&self, msg: impl Into<String>) -> ProgressBar {
        if self.verbosity == Verbosity::Quiet {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.blue} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⣾⣽⣻⢿⡿⣟⣯⣷"),
        );
        pb.set_message(msg.into());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}
