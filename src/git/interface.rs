//! git::interface
//!
//! [`Repository`] implementation backed by git2 and the `git` binary.
//!
//! # Architecture
//!
//! Reads (branch, status, ahead/behind, describe, log) use `git2` against a
//! freshly opened repository. Writes that touch the working tree or the
//! network (checkout, pull, commit, tag, push) run the `git` binary so that
//! hooks, credential helpers and the user's configuration apply exactly as
//! they would on the command line. On failure whatever git printed is
//! returned in [`GitError::CommandFailed`]: several porcelain commands
//! (`commit` with nothing to commit, for one) report on stdout only.
//!
//! Working copies are opened with `git2::Repository::open`, not `discover`:
//! a library directory that is not itself a repository must be reported as
//! such rather than resolving to an enclosing repository.
//!
//! # Example
//!
//! ```ignore
//! use targetlock::git::{GitRepo, Repository};
//!
//! let repo = GitRepo::open(Path::new("libraries/codal-core"), "origin")?;
//! println!("HEAD at {}", repo.head_revision()?.short(7));
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::traits::{GitError, Repository, RepositoryOpener};
use crate::core::types::{BranchName, Oid};

fn internal(err: git2::Error) -> GitError {
    GitError::Internal {
        message: err.message().to_string(),
    }
}

/// Join the non-empty streams of a failed command, stderr first.
fn diagnostic(stderr: &[u8], stdout: &[u8]) -> String {
    let parts: Vec<String> = [stderr, stdout]
        .iter()
        .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();
    if parts.is_empty() {
        "no output".to_string()
    } else {
        parts.join("\n")
    }
}

/// A working copy on disk.
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
    remote: String,
}

impl GitRepo {
    /// Open the working copy rooted at `path`.
    ///
    /// # Errors
    ///
    /// [`GitError::NotARepo`] if `path` is not a non-bare repository root.
    pub fn open(path: &Path, remote: &str) -> Result<Self, GitError> {
        let not_a_repo = || GitError::NotARepo {
            path: path.to_path_buf(),
        };
        let repo = git2::Repository::open(path).map_err(|_| not_a_repo())?;
        if repo.is_bare() {
            return Err(not_a_repo());
        }
        Ok(Self {
            path: path.to_path_buf(),
            remote: remote.to_string(),
        })
    }

    fn repo(&self) -> Result<git2::Repository, GitError> {
        git2::Repository::open(&self.path).map_err(|_| GitError::NotARepo {
            path: self.path.clone(),
        })
    }

    /// Run `git` in the working copy and return its trimmed stdout.
    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let command = format!("git {}", args.join(" "));
        debug!(path = %self.path.display(), %command, "running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.path)
            .output()
            .map_err(|e| GitError::Internal {
                message: format!("failed to run {}: {}", command, e),
            })?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command,
                output: diagnostic(&output.stderr, &output.stdout),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn ref_exists(repo: &git2::Repository, refname: &str) -> bool {
        repo.find_reference(refname).is_ok()
    }

    /// Ask the remote for its HEAD when no `refs/remotes/<remote>/HEAD`
    /// exists locally.
    fn query_remote_head(&self) -> Result<BranchName, GitError> {
        let listing = self.run(&["ls-remote", "--symref", &self.remote, "HEAD"])?;
        listing
            .lines()
            .filter_map(|line| line.strip_prefix("ref: refs/heads/"))
            .filter_map(|rest| rest.split_whitespace().next())
            .next()
            .map(BranchName::new)
            .transpose()?
            .ok_or_else(|| GitError::RefNotFound {
                refname: format!("refs/remotes/{}/HEAD", self.remote),
            })
    }
}

impl Repository for GitRepo {
    fn path(&self) -> &Path {
        &self.path
    }

    fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let repo = self.repo()?;
        let head = match repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(internal(e)),
        };

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(Some(BranchName::new(name)?));
            }
        }

        Ok(None) // Detached HEAD
    }

    fn is_detached(&self) -> Result<bool, GitError> {
        self.repo()?.head_detached().map_err(internal)
    }

    fn is_dirty(&self) -> Result<bool, GitError> {
        let repo = self.repo()?;
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(false)
            .include_ignored(false);

        let statuses = repo.statuses(Some(&mut opts)).map_err(internal)?;
        Ok(!statuses.is_empty())
    }

    fn is_ahead_of_remote(&self) -> Result<bool, GitError> {
        let repo = self.repo()?;
        let Some(branch) = self.current_branch()? else {
            return Ok(false);
        };

        let local = repo
            .find_branch(branch.as_str(), git2::BranchType::Local)
            .map_err(internal)?;
        let upstream = match local.upstream() {
            Ok(u) => u,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(false),
            Err(e) => return Err(internal(e)),
        };

        let (Some(local_oid), Some(upstream_oid)) = (local.get().target(), upstream.get().target())
        else {
            return Ok(false);
        };
        let (ahead, _behind) = repo
            .graph_ahead_behind(local_oid, upstream_oid)
            .map_err(internal)?;
        Ok(ahead > 0)
    }

    fn head_revision(&self) -> Result<Oid, GitError> {
        let repo = self.repo()?;
        let head = repo.head().map_err(|_| GitError::RefNotFound {
            refname: "HEAD".to_string(),
        })?;
        let commit = head.peel_to_commit().map_err(internal)?;
        Ok(Oid::new(commit.id().to_string())?)
    }

    fn nearest_tag(&self) -> Result<Option<String>, GitError> {
        let repo = self.repo()?;
        let mut opts = git2::DescribeOptions::new();
        opts.describe_tags();

        let describe = match repo.describe(&opts) {
            Ok(d) => d,
            Err(e) => {
                // No tags reachable (or an unborn HEAD)
                debug!(path = %self.path.display(), error = %e.message(), "no tag found");
                return Ok(None);
            }
        };

        let mut format = git2::DescribeFormatOptions::new();
        format.abbreviated_size(0);
        describe.format(Some(&format)).map(Some).map_err(internal)
    }

    fn recent_messages(&self, limit: usize) -> Result<Vec<String>, GitError> {
        let repo = self.repo()?;
        let mut walk = repo.revwalk().map_err(internal)?;
        if let Err(e) = walk.push_head() {
            if e.code() == git2::ErrorCode::UnbornBranch || e.code() == git2::ErrorCode::NotFound {
                return Ok(Vec::new());
            }
            return Err(internal(e));
        }
        walk.set_sorting(git2::Sort::TIME).map_err(internal)?;

        let mut messages = Vec::new();
        for oid in walk.take(limit) {
            let commit = repo.find_commit(oid.map_err(internal)?).map_err(internal)?;
            messages.push(commit.message().unwrap_or("").to_string());
        }
        Ok(messages)
    }

    fn default_branch(&self) -> Result<BranchName, GitError> {
        let repo = self.repo()?;
        let head_ref = format!("refs/remotes/{}/HEAD", self.remote);
        let prefix = format!("refs/remotes/{}/", self.remote);

        if let Ok(reference) = repo.find_reference(&head_ref) {
            if let Some(name) = reference
                .symbolic_target()
                .and_then(|target| target.strip_prefix(&prefix))
            {
                return Ok(BranchName::new(name)?);
            }
        }

        debug!(path = %self.path.display(), "no {} locally, asking remote", head_ref);
        self.query_remote_head()
    }

    fn checkout(&self, reference: &str) -> Result<(), GitError> {
        let repo = self.repo()?;
        let known = repo.revparse_single(reference).is_ok()
            || Self::ref_exists(&repo, &format!("refs/remotes/{}/{}", self.remote, reference));
        if !known {
            return Err(GitError::RefNotFound {
                refname: reference.to_string(),
            });
        }

        self.run(&["checkout", "--quiet", reference])?;
        Ok(())
    }

    fn fetch_incoming(&self) -> Result<Option<Oid>, GitError> {
        let Some(branch) = self.current_branch()? else {
            return Ok(None);
        };
        // Tags are left alone: the remote may hold one with the name just
        // created locally.
        self.run(&["fetch", "--quiet", "--no-tags", &self.remote])?;

        let repo = self.repo()?;
        let local = repo
            .find_branch(branch.as_str(), git2::BranchType::Local)
            .map_err(internal)?;
        let upstream = match local.upstream() {
            Ok(u) => u,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(internal(e)),
        };
        let (Some(local_oid), Some(upstream_oid)) = (local.get().target(), upstream.get().target())
        else {
            return Ok(None);
        };

        let (_ahead, behind) = repo
            .graph_ahead_behind(local_oid, upstream_oid)
            .map_err(internal)?;
        if behind == 0 {
            return Ok(None);
        }
        debug!(path = %self.path.display(), behind, "upstream has moved");
        Ok(Some(Oid::new(upstream_oid.to_string())?))
    }

    fn pull(&self) -> Result<(), GitError> {
        self.run(&["pull", "--quiet", "--no-rebase", "--no-edit"])?;
        Ok(())
    }

    fn commit(&self, message: &str, files: &[&Path]) -> Result<Oid, GitError> {
        let paths: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();

        let mut add = vec!["add", "--"];
        add.extend(paths.iter().map(String::as_str));
        self.run(&add)?;

        let mut commit = vec!["commit", "--quiet", "-m", message, "--"];
        commit.extend(paths.iter().map(String::as_str));
        self.run(&commit)?;

        self.head_revision()
    }

    fn tag(&self, name: &str) -> Result<(), GitError> {
        self.run(&["tag", name])?;
        Ok(())
    }

    fn push(&self, include_tags: bool) -> Result<(), GitError> {
        self.run(&["push", "--quiet", &self.remote, "HEAD"])?;
        if include_tags {
            self.run(&["push", "--quiet", "--tags", &self.remote])?;
        }
        Ok(())
    }

    fn discard_changes(&self, file: &Path) -> Result<(), GitError> {
        let repo = self.repo()?;
        let tracked = repo
            .head()
            .and_then(|head| head.peel_to_tree())
            .and_then(|tree| tree.get_path(file))
            .is_ok();

        if tracked {
            let path = file.display().to_string();
            self.run(&["checkout", "--quiet", "HEAD", "--", &path])?;
        } else {
            let absolute = self.path.join(file);
            if absolute.exists() {
                fs::remove_file(&absolute).map_err(|e| GitError::Internal {
                    message: format!("cannot remove {}: {}", absolute.display(), e),
                })?;
            }
        }
        Ok(())
    }
}

/// Opens [`GitRepo`] handles bound to one remote name.
#[derive(Debug, Clone)]
pub struct GitOpener {
    remote: String,
}

impl GitOpener {
    pub fn new(remote: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
        }
    }
}

impl Default for GitOpener {
    fn default() -> Self {
        Self::new("origin")
    }
}

impl RepositoryOpener for GitOpener {
    type Repo = GitRepo;

    fn open(&self, path: &Path) -> Result<GitRepo, GitError> {
        GitRepo::open(path, &self.remote)
    }
}
