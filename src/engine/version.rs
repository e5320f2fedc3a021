//! engine::version
//!
//! Derives the next snapshot version from the target repository's history.
//!
//! # Algorithm
//!
//! 1. An explicit version wins outright.
//! 2. Otherwise the most recent `Snapshot v...` commit message within the
//!    configured history depth is the previous snapshot. There is no
//!    fallback: a repository that was never locked needs an explicit
//!    version for its first snapshot.
//! 3. Release bumps (major, minor, patch) are cut from a trunk branch.
//!    Branch bumps are cut from anything else and carry the branch name;
//!    the counter continues only when the previous snapshot was cut from
//!    the same branch.

use thiserror::Error;
use tracing::debug;

use crate::core::config::{Config, DEFAULT_HISTORY_DEPTH, DEFAULT_TRUNK_BRANCHES};
use crate::core::version::{Bump, SnapshotVersion, VersionParseError};
use crate::git::{GitError, Repository};

/// Errors deriving a version.
#[derive(Debug, Error)]
pub enum VersionError {
    /// No snapshot commit within the scanned history.
    #[error("cannot determine next version: no snapshot in the last {depth} commits (pass an explicit version)")]
    NoPriorSnapshot { depth: usize },

    /// The bump kind does not fit the branch HEAD is on.
    #[error("{}", trunk_message(.branch, .bump))]
    TrunkRequired { branch: String, bump: Bump },

    #[error(transparent)]
    InvalidExplicit(#[from] VersionParseError),

    #[error(transparent)]
    Git(#[from] GitError),
}

fn trunk_message(branch: &str, bump: &Bump) -> String {
    match bump {
        Bump::Branch => format!(
            "'{}' is a trunk branch; branch snapshots are cut from feature branches",
            branch
        ),
        _ => format!(
            "{} snapshots are cut from a trunk branch, not '{}' (use a branch bump)",
            bump, branch
        ),
    }
}

/// Where versions may be cut and how far back to look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPolicy {
    pub trunk_branches: Vec<String>,
    pub history_depth: usize,
}

impl Default for VersionPolicy {
    fn default() -> Self {
        Self {
            trunk_branches: DEFAULT_TRUNK_BRANCHES.iter().map(|s| s.to_string()).collect(),
            history_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

impl VersionPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            trunk_branches: config.trunk_branches(),
            history_depth: config.history_depth(),
        }
    }

    pub fn is_trunk(&self, branch: &str) -> bool {
        self.trunk_branches.iter().any(|t| t == branch)
    }
}

/// Most recent snapshot recorded in the last `depth` commits.
pub fn previous_snapshot<R: Repository>(
    repo: &R,
    depth: usize,
) -> Result<Option<SnapshotVersion>, GitError> {
    Ok(repo
        .recent_messages(depth)?
        .iter()
        .find_map(|message| SnapshotVersion::find_in_message(message)))
}

/// Compute the version the next lock publishes.
///
/// # Errors
///
/// - [`VersionError::InvalidExplicit`] if `explicit` does not parse
/// - [`VersionError::NoPriorSnapshot`] if history holds no snapshot
/// - [`VersionError::TrunkRequired`] if the bump does not fit the branch
pub fn next_version<R: Repository>(
    repo: &R,
    bump: Bump,
    explicit: Option<&str>,
    policy: &VersionPolicy,
) -> Result<SnapshotVersion, VersionError> {
    if let Some(explicit) = explicit {
        return Ok(explicit.parse()?);
    }

    let previous = previous_snapshot(repo, policy.history_depth)?.ok_or(
        VersionError::NoPriorSnapshot {
            depth: policy.history_depth,
        },
    )?;
    debug!(%previous, %bump, "previous snapshot");

    let branch = repo
        .current_branch()?
        .map(String::from)
        .unwrap_or_else(|| "HEAD".to_string());
    let on_trunk = policy.is_trunk(&branch);
    let trunk_required = || VersionError::TrunkRequired {
        branch: branch.clone(),
        bump,
    };

    match bump {
        Bump::Branch => {
            if on_trunk || branch == "HEAD" {
                return Err(trunk_required());
            }
            let counter = match &previous.pre {
                Some(pre) if pre.branch == branch => pre.counter + 1,
                _ => 1,
            };
            Ok(previous.release().with_pre_release(branch.clone(), counter))
        }
        _ if !on_trunk => Err(trunk_required()),
        Bump::Major => Ok(previous.bump_major()),
        Bump::Minor => Ok(previous.bump_minor()),
        Bump::Patch => Ok(previous.bump_patch()),
    }
}
