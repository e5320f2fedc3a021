//! git::traits
//!
//! The repository handle abstraction.
//!
//! # Design
//!
//! Every working copy in a workspace (the target and each library) is
//! driven through [`Repository`]. A handle is bound to one explicit path at
//! open time and never consults the process working directory, so handles
//! for many working copies can be used side by side.
//!
//! All methods are synchronous and take `&self`: reads open the repository
//! fresh and writes go through the `git` binary, so a handle carries no
//! cached state that could go stale between steps of a workflow.
//!
//! [`RepositoryOpener`] produces handles. The engine is generic over it,
//! which lets tests substitute [`crate::git::mock::MockWorkspace`].
//!
//! # Example
//!
//! ```ignore
//! use targetlock::git::{GitOpener, Repository, RepositoryOpener};
//!
//! let opener = GitOpener::new("origin");
//! let repo = opener.open(Path::new("libraries/codal-core"))?;
//! if repo.is_dirty()? {
//!     println!("{} has local changes", repo.path().display());
//! }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{BranchName, Oid, TypeError};

/// Errors from repository operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GitError {
    /// The path is not the root of a working copy.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// A branch, tag or revision resolves neither locally nor on the remote.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// A `git` invocation exited unsuccessfully.
    #[error("`{command}` failed: {output}")]
    CommandFailed {
        /// The command line, for diagnostics
        command: String,
        /// Captured standard error and standard output
        output: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Internal git2 or process error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(oid) => GitError::InvalidOid { oid },
            TypeError::InvalidBranchName(message) => GitError::Internal { message },
        }
    }
}

/// One working copy.
pub trait Repository {
    /// Root of the working copy.
    fn path(&self) -> &Path;

    /// Checked-out branch, or `None` when HEAD is detached.
    fn current_branch(&self) -> Result<Option<BranchName>, GitError>;

    fn is_detached(&self) -> Result<bool, GitError>;

    /// Whether the working tree has staged, unstaged or untracked changes.
    fn is_dirty(&self) -> Result<bool, GitError>;

    /// Whether the current branch has commits its upstream lacks.
    ///
    /// `false` when detached or when the branch has no upstream.
    fn is_ahead_of_remote(&self) -> Result<bool, GitError>;

    /// Commit HEAD points at.
    fn head_revision(&self) -> Result<Oid, GitError>;

    /// Nearest tag reachable from HEAD, if any.
    fn nearest_tag(&self) -> Result<Option<String>, GitError>;

    /// Messages of up to `limit` commits reachable from HEAD, newest first.
    fn recent_messages(&self, limit: usize) -> Result<Vec<String>, GitError>;

    /// The remote's default branch.
    fn default_branch(&self) -> Result<BranchName, GitError>;

    /// Check out a branch, tag or revision.
    ///
    /// # Errors
    ///
    /// [`GitError::RefNotFound`] if `reference` resolves neither locally nor
    /// as a remote branch.
    fn checkout(&self, reference: &str) -> Result<(), GitError>;

    /// Fetch the current branch's upstream without touching the working
    /// tree or local refs other than remote-tracking ones.
    ///
    /// Returns the upstream tip when it carries commits HEAD lacks, `None`
    /// when HEAD already contains it, is detached or has no upstream.
    fn fetch_incoming(&self) -> Result<Option<Oid>, GitError>;

    /// Fetch and integrate the upstream of the current branch.
    fn pull(&self) -> Result<(), GitError>;

    /// Commit the given files with `message`, returning the new HEAD.
    fn commit(&self, message: &str, files: &[&Path]) -> Result<Oid, GitError>;

    /// Create a lightweight tag at HEAD.
    fn tag(&self, name: &str) -> Result<(), GitError>;

    /// Push the current branch, then tags when `include_tags` is set.
    fn push(&self, include_tags: bool) -> Result<(), GitError>;

    /// Drop local modifications to one file: restore it from HEAD if tracked,
    /// remove it otherwise.
    fn discard_changes(&self, file: &Path) -> Result<(), GitError>;
}

/// Opens handles for working copies.
pub trait RepositoryOpener {
    type Repo: Repository;

    /// Open the working copy rooted at `path`.
    ///
    /// # Errors
    ///
    /// [`GitError::NotARepo`] if `path` is not the root of a working copy.
    fn open(&self, path: &Path) -> Result<Self::Repo, GitError>;
}
