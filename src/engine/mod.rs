//! engine
//!
//! Orchestrates the multi-repository workflows: inspect, update, pin, lock.
//!
//! # Architecture
//!
//! Every workflow starts from a freshly loaded [`DependencyGraph`] and
//! drives working copies through a [`crate::git::RepositoryOpener`]:
//!
//! - [`scan`]: read each repository's state (never mutates)
//! - [`gate`]: lock preconditions over the complete scan result
//! - [`version`]: next snapshot version from the target's history
//! - [`sync`]: update to recorded or default branches, revision pin
//! - [`lock`]: the Inspecting -> ... -> Done publication sequence
//! - [`select`]: choose the active target from the catalog
//!
//! # Invariants
//!
//! - Workflows are sequential; repositories are visited in declared order
//! - Multi-repository passes report per-repository results
//! - Nothing is retried
//!
//! # Example
//!
//! ```ignore
//! use targetlock::engine::{lock, LockOptions};
//!
//! let graph = DependencyGraph::load(&store)?;
//! let report = lock::lock(&store, &graph, &GitOpener::new("origin"), &LockOptions::default())?;
//! println!("New snapshot: {} [{}]", report.version, report.commit);
//! ```
//!
//! [`DependencyGraph`]: crate::core::graph::DependencyGraph

pub mod gate;
pub mod lock;
pub mod scan;
pub mod select;
pub mod sync;
pub mod version;

pub use lock::{LockAbort, LockOptions, LockPhase, LockReport, PinnedLibrary};
pub use scan::{RepoRole, RepoStatus, RepositoryState};
pub use sync::{RepoOutcome, SyncAction, SyncOptions, SyncReport};
pub use version::{VersionError, VersionPolicy};

use std::path::PathBuf;

use crate::core::catalog::CatalogError;
use crate::core::descriptor::DescriptorError;
use crate::core::graph::GraphError;
use crate::core::store::StoreError;
use crate::core::types::Oid;
use crate::core::version::SnapshotVersion;
use crate::git::GitError;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect command behavior.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
}

impl Context {
    /// Workspace root: the `--cwd` override or the process directory.
    pub fn workspace_root(&self) -> std::io::Result<PathBuf> {
        match &self.cwd {
            Some(cwd) => Ok(cwd.clone()),
            None => std::env::current_dir(),
        }
    }
}

/// Errors from engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Version(#[from] VersionError),

    /// A repository could not be inspected.
    #[error("cannot inspect {repo}: {source}")]
    Inspection {
        repo: String,
        #[source]
        source: GitError,
    },

    /// Working copies with local changes.
    #[error("uncommitted changes in: {}", .repos.join(", "))]
    UncommittedChanges { repos: Vec<String> },

    /// Working copies with commits not yet pushed.
    #[error("unpushed commits in: {}", .repos.join(", "))]
    UnpushedCommits { repos: Vec<String> },

    /// The upstream moved past the snapshot commit before it was pushed.
    #[error(
        "concurrent lock detected: {version} was committed at {} but the remote moved to {}; nothing was pushed",
        .local.short(7),
        .remote.short(7)
    )]
    ConcurrentLockDetected {
        version: SnapshotVersion,
        local: Oid,
        remote: Oid,
    },

    /// The build directory could not be reset.
    #[error("failed to reset build directory '{path}': {source}")]
    BuildDir {
        path: PathBuf,
        source: std::io::Error,
    },
}
