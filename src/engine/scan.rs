//! engine::scan
//!
//! Repository state inspection across the dependency graph.
//!
//! # Architecture
//!
//! The scanner visits every library in declared order and then the target,
//! reading each working copy's [`RepositoryState`]. A repository that
//! cannot be read (missing working copy, git failure) is recorded with its
//! error rather than aborting the pass, so callers always see the complete
//! picture and decide for themselves what is fatal.
//!
//! # Invariants
//!
//! - Scan is read-only; it never mutates a working copy
//! - Scan is deterministic: two scans with no mutation in between are equal
//! - State is computed on demand and never cached

use std::path::PathBuf;

use tracing::debug;

use crate::core::graph::DependencyGraph;
use crate::core::types::{BranchName, Oid};
use crate::git::{GitError, Repository, RepositoryOpener};

/// Observed state of one working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryState {
    /// Checked-out branch, `None` when detached.
    pub branch: Option<BranchName>,
    pub dirty: bool,
    pub ahead: bool,
    pub head: Oid,
    pub nearest_tag: Option<String>,
}

impl RepositoryState {
    /// Read the state of a working copy.
    pub fn read<R: Repository>(repo: &R) -> Result<Self, GitError> {
        Ok(Self {
            branch: repo.current_branch()?,
            dirty: repo.is_dirty()?,
            ahead: repo.is_ahead_of_remote()?,
            head: repo.head_revision()?,
            nearest_tag: repo.nearest_tag()?,
        })
    }

    pub fn is_detached(&self) -> bool {
        self.branch.is_none()
    }
}

/// Whether a scanned repository is a library or the target itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoRole {
    Library,
    Target,
}

/// Result of inspecting one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoStatus {
    pub name: String,
    pub path: PathBuf,
    pub role: RepoRole,
    pub state: Result<RepositoryState, GitError>,
}

impl RepoStatus {
    pub fn is_dirty(&self) -> bool {
        matches!(&self.state, Ok(s) if s.dirty)
    }

    pub fn is_ahead(&self) -> bool {
        matches!(&self.state, Ok(s) if s.ahead)
    }
}

fn inspect_one<O: RepositoryOpener>(
    opener: &O,
    name: &str,
    path: PathBuf,
    role: RepoRole,
) -> RepoStatus {
    let state = opener
        .open(&path)
        .and_then(|repo| RepositoryState::read(&repo));
    if let Err(e) = &state {
        debug!(repo = name, error = %e, "inspection failed");
    }
    RepoStatus {
        name: name.to_string(),
        path,
        role,
        state,
    }
}

/// Inspect every library in declared order, then the target.
pub fn inspect<O: RepositoryOpener>(graph: &DependencyGraph, opener: &O) -> Vec<RepoStatus> {
    let mut statuses = inspect_libraries(graph, opener);
    let target = graph.target();
    statuses.push(inspect_one(
        opener,
        &target.name,
        target.path.clone(),
        RepoRole::Target,
    ));
    statuses
}

/// Inspect every library in declared order.
pub fn inspect_libraries<O: RepositoryOpener>(
    graph: &DependencyGraph,
    opener: &O,
) -> Vec<RepoStatus> {
    graph
        .libraries()
        .iter()
        .map(|lib| inspect_one(opener, lib.name(), lib.path.clone(), RepoRole::Library))
        .collect()
}

/// Inspect only the named repositories, in the order given.
///
/// A name may refer to a library or to the target. Names matching neither
/// are returned separately.
pub fn inspect_selected<O: RepositoryOpener>(
    graph: &DependencyGraph,
    opener: &O,
    names: &[String],
) -> (Vec<RepoStatus>, Vec<String>) {
    let mut statuses = Vec::new();
    let mut unknown = Vec::new();

    for name in names {
        if let Some(lib) = graph.library(name) {
            statuses.push(inspect_one(opener, name, lib.path.clone(), RepoRole::Library));
        } else if graph.target().name == *name {
            statuses.push(inspect_one(
                opener,
                name,
                graph.target().path.clone(),
                RepoRole::Target,
            ));
        } else {
            unknown.push(name.clone());
        }
    }

    (statuses, unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::DependencyDescriptor;
    use crate::core::paths::WorkspacePaths;
    use crate::core::store::TargetSelection;
    use crate::git::mock::{mock_oid, FailOn, MockRepoState, MockWorkspace};
    use std::collections::BTreeMap;

    fn graph(paths: &WorkspacePaths) -> DependencyGraph {
        let descriptor = DependencyDescriptor::from_json(
            r#"{ "libraries": [
                { "name": "core", "branch": "main" },
                { "name": "driver", "branch": "main" }
            ] }"#,
        )
        .unwrap();
        let selection = TargetSelection {
            name: "board".into(),
            url: String::new(),
            branch: "main".into(),
            dev: false,
            extra: BTreeMap::new(),
        };
        DependencyGraph::from_parts(paths, &selection, descriptor)
    }

    fn workspace(paths: &WorkspacePaths) -> MockWorkspace {
        let workspace = MockWorkspace::new();
        workspace.add_repo(
            paths.repo_dir("core"),
            MockRepoState::on_branch("main").with_dirty_file("src/a.cpp"),
        );
        workspace.add_repo(
            paths.repo_dir("driver"),
            MockRepoState::on_branch("main")
                .ahead()
                .with_tag("v0.1.0", mock_oid(1)),
        );
        workspace.add_repo(paths.repo_dir("board"), MockRepoState::on_branch("main"));
        workspace
    }

    #[test]
    fn libraries_then_target() {
        let paths = WorkspacePaths::new("/work");
        let statuses = inspect(&graph(&paths), &workspace(&paths));

        let names: Vec<_> = statuses.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["core", "driver", "board"]);
        assert_eq!(statuses[2].role, RepoRole::Target);
        assert!(statuses[0].is_dirty());
        assert!(statuses[1].is_ahead());
        assert_eq!(
            statuses[1].state.as_ref().unwrap().nearest_tag.as_deref(),
            Some("v0.1.0")
        );
    }

    #[test]
    fn failures_are_attributed_not_fatal() {
        let paths = WorkspacePaths::new("/work");
        let mock = workspace(&paths);
        mock.update_repo(paths.repo_dir("core"), |s| s.fail_on = Some(FailOn::Status));
        let g = graph(&paths);

        let without_driver = MockWorkspace::new();
        without_driver.add_repo(paths.repo_dir("core"), MockRepoState::on_branch("main"));
        let statuses = inspect_libraries(&g, &without_driver);
        assert!(statuses[0].state.is_ok());
        assert!(matches!(statuses[1].state, Err(GitError::NotARepo { .. })));

        let statuses = inspect(&g, &mock);
        assert_eq!(statuses.len(), 3);
        assert!(matches!(statuses[0].state, Err(GitError::CommandFailed { .. })));
        assert!(statuses[2].state.is_ok());
    }

    #[test]
    fn inspection_is_idempotent() {
        let paths = WorkspacePaths::new("/work");
        let g = graph(&paths);
        let mock = workspace(&paths);

        assert_eq!(inspect(&g, &mock), inspect(&g, &mock));
        assert!(mock.operations().is_empty());
    }

    #[test]
    fn selected_names() {
        let paths = WorkspacePaths::new("/work");
        let names = vec!["board".to_string(), "nope".to_string(), "driver".to_string()];
        let (statuses, unknown) = inspect_selected(&graph(&paths), &workspace(&paths), &names);

        let seen: Vec<_> = statuses.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(seen, ["board", "driver"]);
        assert_eq!(unknown, ["nope"]);
    }
}
