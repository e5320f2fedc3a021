//! engine::lock
//!
//! Publishes a locked descriptor: every library pinned to the revision it is
//! checked out at, versioned from the target's history, committed, tagged
//! and pushed.
//!
//! # Phases
//!
//! ```text
//! Inspecting -> Verifying -> Pinning -> Versioning -> Publishing -> Tagging -> Done
//! ```
//!
//! Any phase may abort; the abort carries the phase it happened in. Nothing
//! is written before Publishing, so an abort up to and including Versioning
//! leaves every working copy and file exactly as it was. Failures from
//! Publishing onward are not rolled back: the commit or tag that was made
//! stays, and the error says where the sequence stopped.
//!
//! # Concurrent locks
//!
//! After tagging, the target fetches its upstream without merging. If the
//! upstream carries commits the snapshot commit lacks, someone else pushed
//! in the meantime and their snapshot may duplicate this one; the lock
//! stops there with nothing merged and nothing pushed. Otherwise the pull
//! that follows is a no-op and the push goes out.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use super::gate;
use super::scan::{self, RepoStatus};
use super::version::{self, VersionPolicy};
use super::EngineError;
use crate::core::graph::DependencyGraph;
use crate::core::paths::LOCKED_DESCRIPTOR_FILE;
use crate::core::store::ConfigStore;
use crate::core::types::Oid;
use crate::core::version::{Bump, SnapshotVersion};
use crate::git::{Repository, RepositoryOpener};

/// Step of the lock sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPhase {
    Inspecting,
    Verifying,
    Pinning,
    Versioning,
    Publishing,
    Tagging,
    Done,
}

impl fmt::Display for LockPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LockPhase::Inspecting => "inspecting",
            LockPhase::Verifying => "verifying",
            LockPhase::Pinning => "pinning",
            LockPhase::Versioning => "versioning",
            LockPhase::Publishing => "publishing",
            LockPhase::Tagging => "tagging",
            LockPhase::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// A lock that stopped before completing.
#[derive(Debug, Error)]
#[error("lock aborted while {phase}: {error}")]
pub struct LockAbort {
    pub phase: LockPhase,
    #[source]
    pub error: EngineError,
}

/// What to lock as.
#[derive(Debug, Clone, Default)]
pub struct LockOptions {
    pub bump: Bump,
    /// Use this version instead of deriving one.
    pub explicit_version: Option<String>,
    pub policy: VersionPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedLibrary {
    pub name: String,
    pub revision: Oid,
}

/// A published snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockReport {
    pub version: SnapshotVersion,
    /// The snapshot commit in the target repository.
    pub commit: Oid,
    pub pinned: Vec<PinnedLibrary>,
    pub locked_descriptor: PathBuf,
}

/// Tracks the current phase so every error can be attributed to it.
struct Sequence {
    phase: LockPhase,
}

impl Sequence {
    fn enter(&mut self, phase: LockPhase) {
        info!(%phase, "lock phase");
        self.phase = phase;
    }

    fn abort(&self, error: impl Into<EngineError>) -> LockAbort {
        LockAbort {
            phase: self.phase,
            error: error.into(),
        }
    }
}

fn pin_all(statuses: &[RepoStatus]) -> Vec<PinnedLibrary> {
    statuses
        .iter()
        .filter_map(|s| {
            s.state.as_ref().ok().map(|state| PinnedLibrary {
                name: s.name.clone(),
                revision: state.head.clone(),
            })
        })
        .collect()
}

/// Run the full lock sequence for the selected target.
///
/// # Errors
///
/// Returns [`LockAbort`] naming the phase that failed:
/// - Inspecting: a library could not be read
/// - Verifying: [`EngineError::UncommittedChanges`] or [`EngineError::UnpushedCommits`]
/// - Versioning: [`EngineError::Version`]
/// - Publishing: the target is dirty, or writing or committing failed
/// - Tagging: tag, fetch, pull or push failed, or [`EngineError::ConcurrentLockDetected`]
pub fn lock<O: RepositoryOpener>(
    store: &ConfigStore,
    graph: &DependencyGraph,
    opener: &O,
    options: &LockOptions,
) -> Result<LockReport, LockAbort> {
    let mut seq = Sequence {
        phase: LockPhase::Inspecting,
    };
    let target_name = graph.target().name.as_str();

    let statuses = scan::inspect_libraries(graph, opener);
    gate::require_inspected(&statuses).map_err(|e| seq.abort(e))?;

    seq.enter(LockPhase::Verifying);
    gate::require_clean_and_pushed(&statuses).map_err(|e| seq.abort(e))?;

    seq.enter(LockPhase::Pinning);
    let pinned = pin_all(&statuses);
    let mut descriptor = graph.descriptor().clone();
    for pin in &pinned {
        if let Some(entry) = descriptor.library_mut(&pin.name) {
            entry.pin(&pin.revision);
        }
    }

    seq.enter(LockPhase::Versioning);
    let target = opener
        .open(&graph.target().path)
        .map_err(|e| seq.abort(e))?;
    let version = version::next_version(
        &target,
        options.bump,
        options.explicit_version.as_deref(),
        &options.policy,
    )
    .map_err(|e| seq.abort(e))?;
    info!(%version, "creating snapshot");
    descriptor.snapshot_version = Some(version.clone());

    seq.enter(LockPhase::Publishing);
    let locked_file = Path::new(LOCKED_DESCRIPTOR_FILE);
    target
        .discard_changes(locked_file)
        .map_err(|e| seq.abort(e))?;
    if target.is_dirty().map_err(|e| seq.abort(e))? {
        return Err(seq.abort(EngineError::UncommittedChanges {
            repos: vec![target_name.to_string()],
        }));
    }
    let locked_descriptor = store
        .write_locked_descriptor(target_name, &descriptor)
        .map_err(|e| seq.abort(e))?;
    let commit = target
        .commit(&version.commit_message(), &[locked_file])
        .map_err(|e| seq.abort(e))?;

    seq.enter(LockPhase::Tagging);
    target
        .tag(&version.to_string())
        .map_err(|e| seq.abort(e))?;
    if let Some(remote) = target.fetch_incoming().map_err(|e| seq.abort(e))? {
        return Err(seq.abort(EngineError::ConcurrentLockDetected {
            version,
            local: commit,
            remote,
        }));
    }
    target.pull().map_err(|e| seq.abort(e))?;
    target.push(true).map_err(|e| seq.abort(e))?;

    seq.enter(LockPhase::Done);
    Ok(LockReport {
        version,
        commit,
        pinned,
        locked_descriptor,
    })
}
