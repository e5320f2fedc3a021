//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. Every working copy in a
//! workspace is read and written through the [`Repository`] trait. No other
//! module imports `git2` or spawns `git`.
//!
//! # Responsibilities
//!
//! - Opening working copies by explicit path
//! - State queries (branch, detached, dirty, ahead, HEAD, nearest tag)
//! - History reads for version derivation
//! - Checkout, fetch, pull, commit, tag and push
//!
//! # Invariants
//!
//! - A handle never depends on the process working directory
//! - All operations return strong types (Oid, BranchName)
//! - Failed `git` invocations surface what git printed, stderr and stdout
//!
//! # Example
//!
//! ```ignore
//! use targetlock::git::{GitOpener, Repository, RepositoryOpener};
//!
//! let repo = GitOpener::new("origin").open(Path::new("libraries/codal-core"))?;
//! repo.checkout("master")?;
//! repo.pull()?;
//! ```

mod interface;
pub mod mock;
mod traits;

pub use interface::{GitOpener, GitRepo};
pub use traits::{GitError, Repository, RepositoryOpener};
