use super::{RepoStatus, Vcs, VcsError};
use git2::build::CheckoutBuilder;
use git2::{
    BranchType, DescribeFormatOptions, DescribeOptions, ErrorCode, Repository, StatusOptions,
};
use std::fs;
use std::path::{Path, PathBuf};

const REMOTE_HEAD: &str = "refs/remotes/origin/HEAD";
const FALLBACK_BRANCHES: [&str; 2] = ["master", "main"];

/// `git2`-backed repository access.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git;

impl Git {
    pub fn new() -> Self {
        Self
    }
}

fn open(dir: &Path) -> Result<Repository, VcsError> {
    Ok(Repository::open(dir)?)
}

fn current_branch(repo: &Repository) -> Result<String, VcsError> {
    let head = repo.head()?;
    if !head.is_branch() {
        return Err(VcsError::Refused("HEAD is not on a branch".to_string()));
    }
    head.shorthand()
        .map(ToOwned::to_owned)
        .ok_or_else(|| VcsError::Refused("branch name is not valid UTF-8".to_string()))
}

fn branch_exists(repo: &Repository, name: &str) -> bool {
    repo.find_branch(name, BranchType::Local).is_ok()
        || repo
            .find_branch(&format!("origin/{}", name), BranchType::Remote)
            .is_ok()
}

impl Vcs for Git {
    fn clone_repo(&self, dir: &Path, remote: &str) -> Result<(), VcsError> {
        if let Some(parent) = dir.parent() {
            fs::create_dir_all(parent)?;
        }
        Repository::clone(remote, dir)?;
        Ok(())
    }

    fn pull(&self, dir: &Path) -> Result<(), VcsError> {
        let repo = open(dir)?;
        let branch_name = current_branch(&repo)?;
        let refname = format!("refs/heads/{}", branch_name);

        let upstream_name = {
            let local = repo.find_branch(&branch_name, BranchType::Local)?;
            let upstream = local.upstream()?;
            upstream
                .name()?
                .map(ToOwned::to_owned)
                .ok_or_else(|| VcsError::Refused("upstream name is not valid UTF-8".to_string()))?
        };
        let remote_name = upstream_name
            .split_once('/')
            .map(|(remote, _)| remote.to_string())
            .ok_or_else(|| VcsError::Refused(format!("unexpected upstream '{}'", upstream_name)))?;

        let mut remote = repo.find_remote(&remote_name)?;
        remote.fetch(&[] as &[&str], None, None)?;

        let upstream_oid = repo
            .find_branch(&upstream_name, BranchType::Remote)?
            .get()
            .target()
            .ok_or_else(|| VcsError::Refused(format!("{} has no target", upstream_name)))?;
        let incoming = repo.find_annotated_commit(upstream_oid)?;
        let (analysis, _) = repo.merge_analysis(&[&incoming])?;

        if analysis.is_up_to_date() {
            return Ok(());
        }
        if !analysis.is_fast_forward() {
            return Err(VcsError::Refused(format!(
                "{} cannot be fast-forwarded to {}",
                branch_name, upstream_name
            )));
        }

        let mut reference = repo.find_reference(&refname)?;
        reference.set_target(upstream_oid, "getx: fast-forward")?;
        repo.set_head(&refname)?;
        repo.checkout_head(Some(CheckoutBuilder::new().force()))?;
        Ok(())
    }

    fn status(&self, dir: &Path) -> Result<RepoStatus, VcsError> {
        let repo = open(dir)?;

        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .include_ignored(false)
            .recurse_untracked_dirs(true);
        if !repo.statuses(Some(&mut opts))?.is_empty() {
            return Ok(RepoStatus::Uncommitted);
        }

        if repo.head_detached()? {
            return Ok(RepoStatus::Detached);
        }

        let branch_name = current_branch(&repo)?;
        let local = repo.find_branch(&branch_name, BranchType::Local)?;
        let upstream = match local.upstream() {
            Ok(upstream) => upstream,
            Err(err) if err.code() == ErrorCode::NotFound => return Ok(RepoStatus::NoUpstream),
            Err(err) => return Err(err.into()),
        };

        let (Some(local_oid), Some(upstream_oid)) = (local.get().target(), upstream.get().target())
        else {
            return Ok(RepoStatus::NoUpstream);
        };
        let (ahead, _behind) = repo.graph_ahead_behind(local_oid, upstream_oid)?;
        if ahead > 0 {
            Ok(RepoStatus::Unpushed)
        } else {
            Ok(RepoStatus::Clean)
        }
    }

    fn tags(&self, dir: &Path) -> Result<Vec<String>, VcsError> {
        let repo = open(dir)?;
        let names = repo.tag_names(None)?;
        Ok(names.iter().flatten().map(ToOwned::to_owned).collect())
    }

    fn most_recent_tag(&self, dir: &Path) -> Result<Option<String>, VcsError> {
        let repo = open(dir)?;
        if repo.tag_names(None)?.is_empty() {
            return Ok(None);
        }

        let mut opts = DescribeOptions::new();
        opts.describe_tags();
        let describe = match repo.describe(&opts) {
            Ok(describe) => describe,
            Err(err) if err.code() == ErrorCode::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let mut format = DescribeFormatOptions::new();
        format.abbreviated_size(0);
        Ok(Some(describe.format(Some(&format))?))
    }

    fn checkout(&self, dir: &Path, reference: &str) -> Result<(), VcsError> {
        let repo = open(dir)?;
        let (object, found) = repo.revparse_ext(reference)?;
        repo.checkout_tree(&object, Some(CheckoutBuilder::new().safe()))?;

        match found {
            Some(found) if found.is_branch() => {
                let name = found
                    .name()
                    .ok_or_else(|| VcsError::Refused("branch name is not valid UTF-8".to_string()))?;
                repo.set_head(name)?;
            }
            _ => {
                let commit = object.peel_to_commit()?;
                repo.set_head_detached(commit.id())?;
            }
        }
        Ok(())
    }

    fn head_matches(&self, dir: &Path, reference: &str) -> Result<bool, VcsError> {
        let repo = open(dir)?;
        let head = repo.head()?.peel_to_commit()?.id();
        let target = repo.revparse_single(reference)?.peel_to_commit()?.id();
        Ok(head == target)
    }

    fn primary_branch(&self, dir: &Path) -> Result<String, VcsError> {
        let repo = open(dir)?;

        if let Ok(remote_head) = repo.find_reference(REMOTE_HEAD)
            && let Some(target) = remote_head.symbolic_target()
            && let Some(name) = target.strip_prefix("refs/remotes/origin/")
        {
            return Ok(name.to_string());
        }

        if let Some(name) = FALLBACK_BRANCHES
            .iter()
            .find(|name| branch_exists(&repo, name))
        {
            return Ok(name.to_string());
        }

        current_branch(&repo)
    }

    fn top_level(&self, dir: &Path) -> Result<PathBuf, VcsError> {
        let repo = Repository::discover(dir)?;
        repo.workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| VcsError::Refused(format!("{} is a bare repository", dir.display())))
    }

    fn is_repository(&self, dir: &Path) -> bool {
        Repository::discover(dir).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Commit, Oid, RepositoryInitOptions, Signature};
    use tempfile::TempDir;

    fn init_origin(root: &Path) -> Repository {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("master");
        Repository::init_opts(root.join("origin"), &opts).unwrap()
    }

    fn commit_file(repo: &Repository, name: &str, contents: &str) -> Oid {
        let workdir = repo.workdir().unwrap().to_path_buf();
        fs::write(workdir.join(name), contents).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("getx", "getx@example.com").unwrap();
        let parents: Vec<Commit> = match repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => Vec::new(),
        };
        let parent_refs: Vec<&Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, name, &tree, &parent_refs)
            .unwrap()
    }

    fn tag(repo: &Repository, name: &str, oid: Oid) {
        let object = repo.find_object(oid, None).unwrap();
        repo.tag_lightweight(name, &object, false).unwrap();
    }

    fn cloned(temp: &TempDir) -> (Repository, PathBuf) {
        let origin = init_origin(temp.path());
        commit_file(&origin, "gen.go", "package p1\n");
        let dir = temp.path().join("src").join("gh").join("p1");
        Git.clone_repo(&dir, origin.workdir().unwrap().to_str().unwrap())
            .unwrap();
        (origin, dir)
    }

    #[test]
    fn test_fresh_clone_is_clean() {
        let temp = TempDir::new().unwrap();
        let (_origin, dir) = cloned(&temp);
        assert!(Git.is_repository(&dir));
        assert_eq!(Git.status(&dir).unwrap(), RepoStatus::Clean);
    }

    #[test]
    fn test_untracked_file_is_uncommitted() {
        let temp = TempDir::new().unwrap();
        let (_origin, dir) = cloned(&temp);
        fs::write(dir.join("scratch.txt"), "wip").unwrap();
        assert_eq!(Git.status(&dir).unwrap(), RepoStatus::Uncommitted);
    }

    #[test]
    fn test_ignored_files_do_not_count() {
        let temp = TempDir::new().unwrap();
        let origin = init_origin(temp.path());
        commit_file(&origin, ".gitignore", ".hook*\n");
        let dir = temp.path().join("clone");
        Git.clone_repo(&dir, origin.workdir().unwrap().to_str().unwrap())
            .unwrap();
        fs::write(dir.join(".hook1"), "").unwrap();
        assert_eq!(Git.status(&dir).unwrap(), RepoStatus::Clean);
    }

    #[test]
    fn test_local_commit_is_unpushed() {
        let temp = TempDir::new().unwrap();
        let (_origin, dir) = cloned(&temp);
        let repo = Repository::open(&dir).unwrap();
        commit_file(&repo, "extra.go", "package p1\n");
        assert_eq!(Git.status(&dir).unwrap(), RepoStatus::Unpushed);
    }

    #[test]
    fn test_branch_without_upstream() {
        let temp = TempDir::new().unwrap();
        let (_origin, dir) = cloned(&temp);
        let repo = Repository::open(&dir).unwrap();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        repo.branch("feature", &head, false).unwrap();
        Git.checkout(&dir, "feature").unwrap();
        assert_eq!(Git.status(&dir).unwrap(), RepoStatus::NoUpstream);
    }

    #[test]
    fn test_most_recent_tag_and_detached_checkout() {
        let temp = TempDir::new().unwrap();
        let origin = init_origin(temp.path());
        let first = commit_file(&origin, "a.go", "package a\n");
        tag(&origin, "v1.0.0", first);
        let second = commit_file(&origin, "b.go", "package a\n");
        tag(&origin, "v1.1.0", second);
        commit_file(&origin, "c.go", "package a\n");

        let dir = temp.path().join("clone");
        Git.clone_repo(&dir, origin.workdir().unwrap().to_str().unwrap())
            .unwrap();

        let mut tags = Git.tags(&dir).unwrap();
        tags.sort();
        assert_eq!(tags, vec!["v1.0.0", "v1.1.0"]);

        let latest = Git.most_recent_tag(&dir).unwrap();
        assert_eq!(latest.as_deref(), Some("v1.1.0"));
        assert!(!Git.head_matches(&dir, "v1.1.0").unwrap());

        Git.checkout(&dir, "v1.1.0").unwrap();
        assert!(Git.head_matches(&dir, "v1.1.0").unwrap());
        assert_eq!(Git.status(&dir).unwrap(), RepoStatus::Detached);
    }

    #[test]
    fn test_no_tags() {
        let temp = TempDir::new().unwrap();
        let (_origin, dir) = cloned(&temp);
        assert!(Git.tags(&dir).unwrap().is_empty());
        assert_eq!(Git.most_recent_tag(&dir).unwrap(), None);
    }

    #[test]
    fn test_pull_fast_forwards() {
        let temp = TempDir::new().unwrap();
        let (origin, dir) = cloned(&temp);
        let newest = commit_file(&origin, "new.go", "package p1\n");

        Git.pull(&dir).unwrap();

        let repo = Repository::open(&dir).unwrap();
        assert_eq!(repo.head().unwrap().peel_to_commit().unwrap().id(), newest);
        assert!(dir.join("new.go").exists());
        assert_eq!(Git.status(&dir).unwrap(), RepoStatus::Clean);
    }

    #[test]
    fn test_primary_branch_and_checkout() {
        let temp = TempDir::new().unwrap();
        let (_origin, dir) = cloned(&temp);
        assert_eq!(Git.primary_branch(&dir).unwrap(), "master");
        Git.checkout(&dir, "master").unwrap();
        assert_eq!(Git.status(&dir).unwrap(), RepoStatus::Clean);
    }

    #[test]
    fn test_top_level_from_subdirectory() {
        let temp = TempDir::new().unwrap();
        let (_origin, dir) = cloned(&temp);
        let sub = dir.join("s1");
        fs::create_dir_all(&sub).unwrap();
        let top = Git.top_level(&sub).unwrap();
        assert_eq!(
            top.canonicalize().unwrap(),
            dir.canonicalize().unwrap()
        );
    }

    #[test]
    fn test_plain_directory_is_not_a_repository() {
        let temp = TempDir::new().unwrap();
        let plain = temp.path().join("plain");
        fs::create_dir_all(&plain).unwrap();
        // A temp dir may itself sit inside a checkout; only assert when it does not.
        if Repository::discover(temp.path()).is_err() {
            assert!(!Git.is_repository(&plain));
        }
    }
}
