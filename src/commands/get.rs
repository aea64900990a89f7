//! `getx get` handler

use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;

use crate::config::GetxConfig;
use crate::fetch::{Engine, FetchOptions, ScanMode};
use crate::ident::PackageId;
use crate::report::{ErrorPolicy, Reporter, Verbosity};
use crate::toolchain;
use crate::ui;
use crate::vcs::Git;

#[derive(Clone, Debug, Default)]
pub struct GetArgs {
    pub packages: Vec<String>,
    pub deps_only: bool,
    pub tests: bool,
    pub verbose: bool,
    pub trace: bool,
    pub install: bool,
    /// Traverse existing packages too.
    pub fetch_missing: bool,
    pub update: bool,
    pub hooks: bool,
    pub tagged: bool,
    pub recurse: bool,
    pub fail_fast: bool,
    pub warn: bool,
    pub dir: Option<PathBuf>,
}

impl GetArgs {
    /// Merge the flags over the config file's `[defaults]`.
    pub fn options(&self, config: &GetxConfig) -> FetchOptions {
        let defaults = &config.defaults;
        let mode = if self.update {
            ScanMode::Update
        } else if self.fetch_missing {
            ScanMode::DeepFetch
        } else {
            defaults.mode.unwrap_or_default()
        };
        FetchOptions {
            mode,
            install: self.install || defaults.install,
            hooks: self.hooks || defaults.hooks,
            tagged: self.tagged || defaults.tagged,
            subtree: self.recurse || defaults.recurse,
            primary_branch: config.primary_branch.clone(),
        }
    }

    pub fn policy(&self, config: &GetxConfig) -> ErrorPolicy {
        if self.fail_fast {
            ErrorPolicy::FailFast
        } else if self.warn {
            ErrorPolicy::Warn
        } else {
            config.defaults.errors.unwrap_or_default()
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        if self.trace {
            Verbosity::Trace
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

/// Handle `getx get`. Returns `false` if any requested package failed.
pub fn handle_get_command(args: &GetArgs) -> Result<bool> {
    let working_dir = super::working_dir(args.dir.as_deref())?;
    let config = GetxConfig::load(&working_dir).context("Failed to load configuration")?;
    let rules = config.rule_set().context("Failed to load rules")?;

    let options = args.options(&config);
    let policy = args.policy(&config);
    let reporter = Reporter::new(args.verbosity(), policy);

    if rules.is_empty() {
        reporter.warn("No rules loaded; missing packages cannot be cloned");
    }

    let go = toolchain::detect_toolchain(&config.gopath, config.build_flags.clone())
        .context("Failed to set up the Go toolchain")?
        .with_trace(args.trace);
    let git = Git;

    let mut engine = Engine::new(rules, &git, &go, &go, options, reporter);
    let mut ok = true;

    for raw in &args.packages {
        let pkg = PackageId::new(raw.as_str());
        if let Err(e) = engine.fetch(&working_dir, &pkg, args.deps_only, args.tests) {
            reporter.error(format!("{}: {}", pkg, e));
            if policy == ErrorPolicy::FailFast {
                return Ok(false);
            }
            ok = false;
        }
    }

    let report = engine.into_report();
    if reporter.verbosity() >= Verbosity::Normal {
        ui::print_summary(&report);
    }
    if !report.warnings.is_empty() && !reporter.warnings_visible() {
        println!(
            "{} {} problem(s) were ignored; rerun with {} to see them",
            "!".yellow(),
            report.warnings.len(),
            "--warn".cyan()
        );
    }

    Ok(ok)
}
