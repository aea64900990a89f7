use crate::ident::{PackageId, PackageSpec};
use crate::toolchain::{Installer, PackageInfo};
use rayon::prelude::*;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Install not requested.
    Skipped,
    Installed,
    /// Some enumerated packages failed to install on their own.
    Partial { failed: Vec<PackageId> },
}

/// Install `spec` in one go; if that fails, install each enumerated package separately
/// and collect the ones that still fail.
pub(super) fn install_packages(
    installer: &dyn Installer,
    working_dir: &Path,
    spec: &PackageSpec,
    packages: &[PackageInfo],
) -> InstallOutcome {
    if installer.install(working_dir, spec).is_ok() {
        return InstallOutcome::Installed;
    }

    let results: Vec<(PackageId, bool)> = packages
        .par_iter()
        .map(|info| {
            let single = PackageSpec::single(info.id.clone());
            let ok = installer.install(working_dir, &single).is_ok();
            (info.id.clone(), ok)
        })
        .collect();

    // par_iter().collect() keeps input order, so failures stay in enumeration order.
    let failed: Vec<PackageId> = results
        .into_iter()
        .filter_map(|(id, ok)| (!ok).then_some(id))
        .collect();

    if failed.is_empty() {
        InstallOutcome::Installed
    } else {
        InstallOutcome::Partial { failed }
    }
}
