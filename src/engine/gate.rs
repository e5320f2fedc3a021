//! engine::gate
//!
//! Preconditions a lock must satisfy before anything is written.
//!
//! # Invariants
//!
//! - The gate sees the complete inspection result and reports every
//!   offending repository, not just the first one found
//! - The gate is pure: it never touches a working copy

use super::scan::RepoStatus;
use super::EngineError;

/// Require every inspected repository to be readable.
///
/// Returns the first inspection failure, attributed to its repository.
pub fn require_inspected(statuses: &[RepoStatus]) -> Result<(), EngineError> {
    match statuses.iter().find_map(|s| s.state.as_ref().err().map(|e| (s, e))) {
        Some((status, error)) => Err(EngineError::Inspection {
            repo: status.name.clone(),
            source: error.clone(),
        }),
        None => Ok(()),
    }
}

/// Require every repository to be clean and fully pushed.
///
/// Uncommitted changes are reported before unpushed commits.
pub fn require_clean_and_pushed(statuses: &[RepoStatus]) -> Result<(), EngineError> {
    let dirty: Vec<String> = statuses
        .iter()
        .filter(|s| s.is_dirty())
        .map(|s| s.name.clone())
        .collect();
    if !dirty.is_empty() {
        return Err(EngineError::UncommittedChanges { repos: dirty });
    }

    let ahead: Vec<String> = statuses
        .iter()
        .filter(|s| s.is_ahead())
        .map(|s| s.name.clone())
        .collect();
    if !ahead.is_empty() {
        return Err(EngineError::UnpushedCommits { repos: ahead });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scan::{RepoRole, RepositoryState};
    use crate::git::mock::mock_oid;
    use crate::git::GitError;
    use std::path::PathBuf;

    fn status(name: &str, dirty: bool, ahead: bool) -> RepoStatus {
        RepoStatus {
            name: name.to_string(),
            path: PathBuf::from(name),
            role: RepoRole::Library,
            state: Ok(RepositoryState {
                branch: None,
                dirty,
                ahead,
                head: mock_oid(1),
                nearest_tag: None,
            }),
        }
    }

    #[test]
    fn all_clean_passes() {
        let statuses = [status("a", false, false), status("b", false, false)];
        assert!(require_inspected(&statuses).is_ok());
        assert!(require_clean_and_pushed(&statuses).is_ok());
    }

    #[test]
    fn lists_every_dirty_repository() {
        let statuses = [
            status("a", true, false),
            status("b", false, true),
            status("c", true, true),
        ];
        match require_clean_and_pushed(&statuses) {
            Err(EngineError::UncommittedChanges { repos }) => assert_eq!(repos, ["a", "c"]),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn lists_every_unpushed_repository() {
        let statuses = [status("a", false, true), status("b", false, true)];
        match require_clean_and_pushed(&statuses) {
            Err(EngineError::UnpushedCommits { repos }) => assert_eq!(repos, ["a", "b"]),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn inspection_failure_is_attributed() {
        let mut broken = status("b", false, false);
        broken.state = Err(GitError::NotARepo {
            path: PathBuf::from("b"),
        });
        let statuses = [status("a", false, false), broken];

        match require_inspected(&statuses) {
            Err(EngineError::Inspection { repo, .. }) => assert_eq!(repo, "b"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
