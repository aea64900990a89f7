use super::install::install_packages;
use super::{FetchError, FetchOptions, FetchReport, InstallOutcome, ScanMode, TraversalContext};
use crate::hooks::{HookKind, HookRunner};
use crate::ident::{PackageId, PackageSpec};
use crate::report::{ErrorPolicy, Reporter};
use crate::rules::RuleSet;
use crate::toolchain::{Installer, Metadata, PackageInfo};
use crate::vcs::Vcs;
use crate::visited::{Coverage, VisitedSet};
use colored::*;
use std::path::{Path, PathBuf};

/// Outcome of one decision step for a package.
#[derive(Debug)]
enum Step {
    /// Nothing more to do for this identifier.
    Done,
    /// Continue with the owning repository instead.
    Redirect(PackageId),
    /// The package is on disk; walk its imports.
    Traverse(PathBuf),
}

pub struct Engine<'a> {
    pub(super) rules: RuleSet,
    pub(super) vcs: &'a dyn Vcs,
    pub(super) metadata: &'a dyn Metadata,
    pub(super) installer: &'a dyn Installer,
    pub(super) hooks: HookRunner,
    pub(super) reporter: Reporter,
    pub(super) options: FetchOptions,
    pub(super) ctx: TraversalContext,
    pub(super) report: FetchReport,
}

impl<'a> Engine<'a> {
    pub fn new(
        rules: RuleSet,
        vcs: &'a dyn Vcs,
        metadata: &'a dyn Metadata,
        installer: &'a dyn Installer,
        options: FetchOptions,
        reporter: Reporter,
    ) -> Self {
        let hooks = HookRunner::new(options.hooks).with_trace(reporter.is_tracing());
        Self {
            rules,
            vcs,
            metadata,
            installer,
            hooks,
            reporter,
            options,
            ctx: TraversalContext::default(),
            report: FetchReport::default(),
        }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.ctx.visited
    }

    pub fn report(&self) -> &FetchReport {
        &self.report
    }

    pub fn into_report(self) -> FetchReport {
        self.report
    }

    /// Fetch `pkg` and, recursively, everything it imports.
    ///
    /// With `deps_only` the package itself must already exist and only its imports are
    /// fetched. `include_tests` adds the package's test imports; it is not passed on to
    /// the imports themselves.
    pub fn fetch(
        &mut self,
        working_dir: &Path,
        pkg: &PackageId,
        deps_only: bool,
        include_tests: bool,
    ) -> Result<(), FetchError> {
        let mut current = pkg.clone();
        loop {
            match self.step(working_dir, &current, deps_only)? {
                Step::Done => break,
                Step::Redirect(repo) => {
                    self.reporter
                        .trace(format!("{} is part of {}, fetching it whole", current, repo));
                    current = repo;
                }
                Step::Traverse(dir) => {
                    self.traverse(working_dir, &current, &dir, include_tests)?;
                    break;
                }
            }
        }

        if &current != pkg {
            // Reached through its repository; the package should now be on disk.
            self.ctx.visited.mark_exact(pkg);
            if !self.metadata.directory(working_dir, pkg).exists {
                return Err(FetchError::PackageNotFound {
                    package: pkg.clone(),
                    repository: current,
                });
            }
        }
        Ok(())
    }

    fn coverage(&self) -> Coverage {
        if self.options.subtree {
            Coverage::Subtree
        } else {
            Coverage::Exact
        }
    }

    fn spec_for(&self, pkg: &PackageId) -> PackageSpec {
        if self.options.subtree {
            PackageSpec::subtree(pkg.clone())
        } else {
            PackageSpec::single(pkg.clone())
        }
    }

    fn step(
        &mut self,
        working_dir: &Path,
        pkg: &PackageId,
        deps_only: bool,
    ) -> Result<Step, FetchError> {
        if self.ctx.visited.is_done(pkg) {
            return Ok(Step::Done);
        }

        let dir = self.metadata.directory(working_dir, pkg);
        match (deps_only, dir.exists) {
            (true, false) => Err(FetchError::MissingForDepsOnly(pkg.clone())),
            (true, true) => Ok(Step::Traverse(dir.path)),
            (false, false) => self.step_missing(working_dir, pkg, dir.path),
            (false, true) => self.step_existing(working_dir, pkg, dir.path),
        }
    }

    fn step_missing(
        &mut self,
        working_dir: &Path,
        pkg: &PackageId,
        dir: PathBuf,
    ) -> Result<Step, FetchError> {
        let resolved = self
            .rules
            .resolve(pkg)
            .map_err(|_| FetchError::NoRuleMatched(pkg.clone()))?;
        let repo = resolved.repository;

        if &repo == pkg {
            self.clone_repository(&repo, &resolved.remote, &dir)?;
            return Ok(Step::Traverse(dir));
        }

        if self.ctx.is_materialized(&repo) {
            // The repository is already here, so the package is not part of it.
            self.ctx.visited.mark(pkg, self.coverage());
            return Err(FetchError::PackageNotFound {
                package: pkg.clone(),
                repository: repo,
            });
        }

        if self.options.subtree {
            return Ok(Step::Redirect(repo));
        }

        let repo_dir = self.metadata.directory(working_dir, &repo);
        if !repo_dir.exists {
            self.clone_repository(&repo, &resolved.remote, &repo_dir.path)?;
        }

        if !self.metadata.directory(working_dir, pkg).exists {
            self.ctx.visited.mark(pkg, self.coverage());
            return Err(FetchError::PackageNotFound {
                package: pkg.clone(),
                repository: repo,
            });
        }
        Ok(Step::Traverse(dir))
    }

    fn step_existing(
        &mut self,
        working_dir: &Path,
        pkg: &PackageId,
        dir: PathBuf,
    ) -> Result<Step, FetchError> {
        if self.options.mode == ScanMode::Skip && !self.ctx.cloned.is_done(pkg) {
            self.ctx.visited.mark(pkg, self.coverage());
            return Ok(Step::Done);
        }

        if self.ctx.is_materialized(pkg) {
            return Ok(Step::Traverse(dir));
        }

        if !self.options.subtree && self.options.mode != ScanMode::Update {
            // Deep fetch of a single package needs nothing from git.
            self.ctx.inspected.mark_done(pkg);
            return Ok(Step::Traverse(dir));
        }

        let (repo, repo_dir) = self.repository_root(working_dir, pkg, &dir)?;
        self.ctx.inspected.mark_done(&repo);

        if self.options.mode == ScanMode::Update {
            self.update_repository(&repo, &repo_dir)?;
        }

        if &repo != pkg && self.options.subtree {
            return Ok(Step::Redirect(repo));
        }
        Ok(Step::Traverse(dir))
    }

    /// Identifier and directory of the repository checkout containing `dir`.
    fn repository_root(
        &self,
        working_dir: &Path,
        pkg: &PackageId,
        dir: &Path,
    ) -> Result<(PackageId, PathBuf), FetchError> {
        let not_a_repo = || FetchError::NotARepository {
            package: pkg.clone(),
            dir: dir.to_path_buf(),
        };
        if !self.vcs.is_repository(dir) {
            return Err(not_a_repo());
        }
        let top = self.vcs.top_level(dir).map_err(|_| not_a_repo())?;

        match self.metadata.identifier_for(working_dir, &top) {
            Some(repo) if pkg.is_same_or_descendant_of(&repo) => Ok((repo, top)),
            _ => Err(FetchError::PathMappingFailed {
                package: pkg.clone(),
                dir: top,
            }),
        }
    }

    fn clone_repository(
        &mut self,
        repo: &PackageId,
        remote: &str,
        dir: &Path,
    ) -> Result<(), FetchError> {
        self.reporter
            .trace(format!("git clone {} {}", remote, dir.display()));
        let pb = self.reporter.spinner(format!("Cloning {}...", repo));

        if let Err(source) = self.vcs.clone_repo(dir, remote) {
            pb.finish_with_message(format!("{} Failed {}", "x".red(), repo));
            return Err(FetchError::CloneFailed {
                repository: repo.clone(),
                remote: remote.to_string(),
                source,
            });
        }
        pb.finish_with_message(format!("{} Cloned {}", "✓".green(), repo));

        self.ctx.cloned.mark_done(repo);
        self.report.cloned.push(repo.clone());

        if self.options.tagged {
            self.pin_tag(repo, dir)?;
        }
        Ok(())
    }

    fn traverse(
        &mut self,
        working_dir: &Path,
        pkg: &PackageId,
        dir: &Path,
        include_tests: bool,
    ) -> Result<(), FetchError> {
        self.ctx.visited.mark(pkg, self.coverage());

        let spec = self.spec_for(pkg);
        self.reporter.trace(format!("go list -e -json {}", spec));
        let packages =
            self.metadata
                .enumerate(working_dir, &spec)
                .map_err(|source| FetchError::Metadata {
                    spec: spec.to_string(),
                    source,
                })?;

        let mut imports: Vec<PackageId> = Vec::new();
        for info in &packages {
            if let Some(err) = &info.error {
                self.reporter.trace(format!("{}: {}", info.id, err));
            }
            imports.extend(info.imports.iter().cloned());
            if include_tests {
                imports.extend(info.test_imports.iter().cloned());
            }
        }

        for import in &imports {
            if self.metadata.is_standard_library(import) {
                continue;
            }
            // Imports under the spec were listed by the same enumeration or do not exist.
            if spec.covers(import) {
                if packages.iter().any(|info| &info.id == import) {
                    continue;
                }
                return Err(FetchError::PackageNotFound {
                    package: import.clone(),
                    repository: pkg.clone(),
                });
            }
            if self.ctx.visited.is_done(import) {
                continue;
            }
            self.fetch(working_dir, import, false, false)?;
        }

        self.finish(working_dir, pkg, dir, &spec, &packages)
    }

    /// Hooks and install for a traversed package.
    fn finish(
        &mut self,
        working_dir: &Path,
        pkg: &PackageId,
        dir: &Path,
        spec: &PackageSpec,
        packages: &[PackageInfo],
    ) -> Result<(), FetchError> {
        if let Err(source) = self.hooks.run(HookKind::BeforeInstall, dir) {
            self.report
                .hook_failures
                .push((pkg.clone(), HookKind::BeforeInstall));
            return self.soft_fail(FetchError::HookFailed {
                package: pkg.clone(),
                source,
            });
        }

        let outcome = if self.options.install {
            self.reporter.trace(format!("go install {}", spec));
            install_packages(self.installer, working_dir, spec, packages)
        } else {
            InstallOutcome::Skipped
        };

        if let Err(source) = self.hooks.run(HookKind::AfterInstall, dir) {
            self.report
                .hook_failures
                .push((pkg.clone(), HookKind::AfterInstall));
            self.soft_fail(FetchError::HookFailed {
                package: pkg.clone(),
                source,
            })?;
        }

        self.report.completed.push(pkg.clone());

        match outcome {
            InstallOutcome::Partial { failed } => {
                let names = failed.iter().map(|id| spec.abbreviate(id)).collect();
                self.report.install_failures.push((pkg.clone(), failed));
                self.soft_fail(FetchError::PartialInstallFailure {
                    spec: spec.to_string(),
                    failed: names,
                })
            }
            InstallOutcome::Installed | InstallOutcome::Skipped => {
                self.reporter.completed(pkg);
                Ok(())
            }
        }
    }

    /// Hard errors and every error under fail-fast are returned; soft ones are
    /// reported and recorded.
    pub(super) fn soft_fail(&mut self, err: FetchError) -> Result<(), FetchError> {
        if !err.is_soft() || self.reporter.policy() == ErrorPolicy::FailFast {
            return Err(err);
        }
        self.reporter.warn(&err);
        self.report.warnings.push(err.to_string());
        Ok(())
    }
}
