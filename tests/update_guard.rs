//! Update and tag pinning against real git repositories.
//!
//! Packages live in a GOPATH-style tree under a temp dir; the remotes are local
//! repositories next to it. Package metadata is stubbed so no Go toolchain is needed.

use getx::fetch::{Engine, FetchOptions, FetchReport, ScanMode, TagPin};
use getx::ident::{PackageId, PackageSpec};
use getx::report::{ErrorPolicy, Reporter};
use getx::rules::RuleSet;
use getx::toolchain::{Installer, Metadata, PackageDir, PackageInfo, ToolchainError};
use getx::vcs::{Git, RepoStatus};
use git2::{Commit, Oid, Repository, RepositoryInitOptions, Signature};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Every package is a leaf and lives at `src/<id>`.
struct Layout {
    src: PathBuf,
}

impl Metadata for Layout {
    fn directory(&self, _working_dir: &Path, pkg: &PackageId) -> PackageDir {
        let mut path = self.src.clone();
        path.extend(pkg.segments());
        let exists = path.is_dir();
        PackageDir { path, exists }
    }

    fn enumerate(
        &self,
        _working_dir: &Path,
        spec: &PackageSpec,
    ) -> Result<Vec<PackageInfo>, ToolchainError> {
        Ok(vec![PackageInfo::new(spec.id.clone(), &[])])
    }

    fn is_standard_library(&self, _id: &PackageId) -> bool {
        false
    }

    fn identifier_for(&self, _working_dir: &Path, dir: &Path) -> Option<PackageId> {
        let rel = dir.strip_prefix(&self.src).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(PackageId::new(parts.join("/")))
    }
}

struct NoInstall;

impl Installer for NoInstall {
    fn install(&self, _working_dir: &Path, _spec: &PackageSpec) -> Result<(), ToolchainError> {
        Ok(())
    }
}

struct Workspace {
    root: TempDir,
    layout: Layout,
}

impl Workspace {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let src = root.path().join("gopath").join("src");
        fs::create_dir_all(&src).unwrap();
        Self {
            root,
            layout: Layout { src },
        }
    }

    fn origins(&self) -> PathBuf {
        self.root.path().join("origins")
    }

    fn origin(&self, user: &str, name: &str) -> Repository {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("master");
        Repository::init_opts(self.origins().join(user).join(name), &opts).unwrap()
    }

    fn checkout_dir(&self, pkg: &str) -> PathBuf {
        self.layout.directory(self.root.path(), &PackageId::from(pkg)).path
    }

    fn rules(&self) -> RuleSet {
        let text = format!(
            "gh/([^/]+)/([^/]+)={}/$1/$2\n",
            self.origins().display()
        );
        RuleSet::parse(&text).unwrap()
    }

    fn run(&self, pkg: &str, options: FetchOptions) -> FetchReport {
        let git = Git;
        let mut engine = Engine::new(
            self.rules(),
            &git,
            &self.layout,
            &NoInstall,
            options,
            Reporter::quiet(ErrorPolicy::Warn),
        );
        engine
            .fetch(self.root.path(), &PackageId::from(pkg), false, false)
            .unwrap();
        engine.into_report()
    }
}

fn commit_file(repo: &Repository, name: &str, contents: &str) -> Oid {
    let workdir = repo.workdir().unwrap().to_path_buf();
    fs::write(workdir.join(name), contents).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("getx", "getx@example.com").unwrap();
    let parents: Vec<Commit> = repo
        .head()
        .ok()
        .map(|h| h.peel_to_commit().unwrap())
        .into_iter()
        .collect();
    let parent_refs: Vec<&Commit> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, name, &tree, &parent_refs)
        .unwrap()
}

fn head_of(dir: &Path) -> Oid {
    Repository::open(dir)
        .unwrap()
        .head()
        .unwrap()
        .peel_to_commit()
        .unwrap()
        .id()
}

/// Contents of every file in the working tree, `.git` excluded.
fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(base: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.file_name().is_some_and(|n| n == ".git") {
                continue;
            }
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                let rel = path.strip_prefix(base).unwrap().to_path_buf();
                out.insert(rel, fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(dir, dir, &mut out);
    out
}

fn update_whole_repos() -> FetchOptions {
    FetchOptions {
        mode: ScanMode::Update,
        subtree: true,
        ..Default::default()
    }
}

#[test]
fn test_dirty_checkout_is_left_untouched() {
    let ws = Workspace::new();
    let origin = ws.origin("u1", "p");
    commit_file(&origin, "p.go", "package p\n");

    let report = ws.run("gh/u1/p", FetchOptions::default());
    assert_eq!(report.cloned, vec![PackageId::from("gh/u1/p")]);

    let dir = ws.checkout_dir("gh/u1/p");
    fs::write(dir.join("p.go"), "package p // local edit\n").unwrap();
    fs::write(dir.join("notes.txt"), "scratch\n").unwrap();
    commit_file(&origin, "q.go", "package p\n");

    let before = snapshot(&dir);
    let head_before = head_of(&dir);

    let report = ws.run("gh/u1/p", update_whole_repos());

    assert_eq!(snapshot(&dir), before);
    assert_eq!(head_of(&dir), head_before);
    assert!(report.updated.is_empty());
    assert_eq!(
        report.skipped_updates,
        vec![(PackageId::from("gh/u1/p"), RepoStatus::Uncommitted)]
    );
}

#[test]
fn test_clean_checkout_fast_forwards() {
    let ws = Workspace::new();
    let origin = ws.origin("u1", "p");
    commit_file(&origin, "p.go", "package p\n");
    ws.run("gh/u1/p", FetchOptions::default());

    let newest = commit_file(&origin, "q.go", "package p\n");
    let report = ws.run("gh/u1/p", update_whole_repos());

    let dir = ws.checkout_dir("gh/u1/p");
    assert_eq!(head_of(&dir), newest);
    assert!(dir.join("q.go").is_file());
    assert_eq!(report.updated, vec![PackageId::from("gh/u1/p")]);
}

#[test]
fn test_tagged_clone_detaches_at_latest_tag() {
    let ws = Workspace::new();
    let origin = ws.origin("u1", "p");
    let first = commit_file(&origin, "a.go", "package p\n");
    let second = commit_file(&origin, "b.go", "package p\n");
    commit_file(&origin, "c.go", "package p\n");
    for (name, oid) in [("v1.0", first), ("v1.1", second)] {
        let object = origin.find_object(oid, None).unwrap();
        origin.tag_lightweight(name, &object, false).unwrap();
    }

    let options = FetchOptions {
        tagged: true,
        ..Default::default()
    };
    let report = ws.run("gh/u1/p", options);

    let dir = ws.checkout_dir("gh/u1/p");
    assert_eq!(
        report.pinned,
        vec![(
            PackageId::from("gh/u1/p"),
            TagPin::Detached("v1.1".to_string())
        )]
    );
    assert_eq!(head_of(&dir), second);
    assert!(Repository::open(&dir).unwrap().head_detached().unwrap());
}

#[cfg(unix)]
#[test]
fn test_ignored_hook_markers_keep_checkout_clean() {
    let ws = Workspace::new();
    let origin = ws.origin("u1", "hooked");
    commit_file(&origin, ".gitignore", ".hook*\n");
    {
        use std::os::unix::fs::PermissionsExt;
        let hook = origin.workdir().unwrap().join("get-before-update.sh");
        fs::write(&hook, "#!/bin/sh\ntouch .hook1\n").unwrap();
        fs::set_permissions(&hook, fs::Permissions::from_mode(0o755)).unwrap();
    }
    commit_file(&origin, "get-before-update.sh", "#!/bin/sh\ntouch .hook1\n");
    ws.run("gh/u1/hooked", FetchOptions::default());

    let options = FetchOptions {
        hooks: true,
        ..update_whole_repos()
    };
    let first = ws.run("gh/u1/hooked", options.clone());
    let second = ws.run("gh/u1/hooked", options);

    let dir = ws.checkout_dir("gh/u1/hooked");
    assert!(dir.join(".hook1").is_file());
    assert_eq!(first.updated, vec![PackageId::from("gh/u1/hooked")]);
    assert_eq!(second.updated, vec![PackageId::from("gh/u1/hooked")]);
    assert!(second.skipped_updates.is_empty());
}
