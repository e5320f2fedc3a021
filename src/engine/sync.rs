//! engine::sync
//!
//! Brings every working copy up to date with its remote.
//!
//! # Update
//!
//! Libraries are visited in declared order: each checks out the branch its
//! descriptor entry records (or the remote's default branch when syncing to
//! default) and pulls. The target comes last. A detached target is first
//! returned to its trunk unless detached targets are allowed, in which case
//! it is left exactly where it is.
//!
//! A failure in one repository does not stop the others; each outcome is
//! reported on its own.
//!
//! # Revision pin
//!
//! Checks the target out at a revision or tag, then updates the libraries
//! with the detached target left in place. The graph is loaded again after
//! the checkout, so libraries follow the descriptor as it was at that
//! revision rather than the one on the branch just left.

use std::path::PathBuf;

use tracing::{debug, info};

use super::EngineError;
use crate::core::graph::DependencyGraph;
use crate::core::store::ConfigStore;
use crate::core::types::Oid;
use crate::git::{GitError, Repository, RepositoryOpener};

/// How an update treats branches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Follow each library's remote default branch instead of its recorded one.
    pub sync_to_default_branch: bool,
    /// Leave a detached target where it is.
    pub allow_detached: bool,
}

/// What happened to one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Checked out `reference` and pulled.
    Updated { reference: String, head: Oid },
    /// Pulled the current branch without a checkout.
    Pulled { head: Oid },
    /// Detached and allowed to stay so.
    LeftDetached { head: Oid },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoOutcome {
    pub name: String,
    pub path: PathBuf,
    pub result: Result<SyncAction, GitError>,
}

/// Per-repository results of an update, libraries first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub outcomes: Vec<RepoOutcome>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &RepoOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

fn sync_library<R: Repository>(
    repo: &R,
    recorded_branch: &str,
    options: SyncOptions,
) -> Result<SyncAction, GitError> {
    let reference = if options.sync_to_default_branch {
        repo.default_branch()?.to_string()
    } else {
        recorded_branch.to_string()
    };
    repo.checkout(&reference)?;
    repo.pull()?;
    Ok(SyncAction::Updated {
        reference,
        head: repo.head_revision()?,
    })
}

fn sync_target<R: Repository>(repo: &R, options: SyncOptions) -> Result<SyncAction, GitError> {
    if repo.is_detached()? {
        if options.allow_detached {
            return Ok(SyncAction::LeftDetached {
                head: repo.head_revision()?,
            });
        }
        let trunk = repo.default_branch()?.to_string();
        debug!(%trunk, "target detached, returning to trunk");
        repo.checkout(&trunk)?;
        repo.pull()?;
        return Ok(SyncAction::Updated {
            reference: trunk,
            head: repo.head_revision()?,
        });
    }

    repo.pull()?;
    Ok(SyncAction::Pulled {
        head: repo.head_revision()?,
    })
}

/// Update every library, then the target.
pub fn update<O: RepositoryOpener>(
    graph: &DependencyGraph,
    opener: &O,
    options: SyncOptions,
) -> SyncReport {
    let mut report = SyncReport::default();

    for library in graph.libraries() {
        let result = opener
            .open(&library.path)
            .and_then(|repo| sync_library(&repo, library.branch(), options));
        match &result {
            Ok(action) => info!(repo = library.name(), ?action, "updated"),
            Err(e) => info!(repo = library.name(), error = %e, "update failed"),
        }
        report.outcomes.push(RepoOutcome {
            name: library.name().to_string(),
            path: library.path.clone(),
            result,
        });
    }

    let target = graph.target();
    let result = opener
        .open(&target.path)
        .and_then(|repo| sync_target(&repo, options));
    report.outcomes.push(RepoOutcome {
        name: target.name.clone(),
        path: target.path.clone(),
        result,
    });

    report
}

/// Check the target out at `rev`, then update the libraries around it.
///
/// # Errors
///
/// Fails without touching any library if the target cannot be opened or
/// `rev` cannot be checked out ([`GitError::RefNotFound`] for unknown refs).
/// If the descriptor at `rev` cannot be loaded the target stays at `rev`
/// and [`EngineError::Graph`] is returned.
pub fn revision_pin<O: RepositoryOpener>(
    store: &ConfigStore,
    opener: &O,
    rev: &str,
) -> Result<SyncReport, EngineError> {
    let before = DependencyGraph::load(store)?;
    let target = opener.open(&before.target().path)?;
    target.checkout(rev)?;
    info!(target = %before.target().name, rev, "target pinned");

    let graph = DependencyGraph::load(store)?;
    debug!(libraries = graph.libraries().len(), "descriptor reloaded at {}", rev);
    Ok(update(
        &graph,
        opener,
        SyncOptions {
            sync_to_default_branch: false,
            allow_detached: true,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::paths::WorkspacePaths;
    use crate::core::store::{BuildConfig, TargetSelection};
    use crate::git::mock::{mock_oid, FailOn, MockOperation, MockRepoState, MockWorkspace};
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    const DESCRIPTOR: &str = r#"{ "libraries": [
        { "name": "core", "branch": "v2" },
        { "name": "driver", "branch": "main" }
    ] }"#;

    struct Setup {
        _temp: TempDir,
        store: ConfigStore,
        paths: WorkspacePaths,
        graph: DependencyGraph,
        mock: MockWorkspace,
    }

    fn setup() -> Setup {
        let temp = TempDir::new().unwrap();
        let paths = WorkspacePaths::new(temp.path());
        let store = ConfigStore::new(paths.clone());
        store
            .save(&BuildConfig::new(TargetSelection {
                name: "board".into(),
                url: String::new(),
                branch: "master".into(),
                dev: false,
                extra: BTreeMap::new(),
            }))
            .unwrap();
        fs::create_dir_all(paths.repo_dir("board")).unwrap();
        fs::write(paths.descriptor_path("board"), DESCRIPTOR).unwrap();
        let graph = DependencyGraph::load(&store).unwrap();

        let mock = MockWorkspace::new();
        mock.add_repo(
            paths.repo_dir("core"),
            MockRepoState::on_branch("main").with_branch("v2", mock_oid(2)),
        );
        mock.add_repo(paths.repo_dir("driver"), MockRepoState::on_branch("main"));
        mock.add_repo(
            paths.repo_dir("board"),
            MockRepoState::on_branch("master").with_tag("v1.0.0", mock_oid(7)),
        );
        Setup {
            _temp: temp,
            store,
            paths,
            graph,
            mock,
        }
    }

    fn checkouts(mock: &MockWorkspace, path: PathBuf) -> Vec<String> {
        mock.operations_for(path)
            .into_iter()
            .filter_map(|op| match op {
                MockOperation::Checkout { reference, .. } => Some(reference),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn update_checks_out_recorded_branches() {
        let Setup { paths, graph, mock, _temp, .. } = setup();
        let report = update(&graph, &mock, SyncOptions::default());

        assert!(report.is_success());
        assert_eq!(checkouts(&mock, paths.repo_dir("core")), ["v2"]);
        assert_eq!(checkouts(&mock, paths.repo_dir("driver")), ["main"]);
        assert!(checkouts(&mock, paths.repo_dir("board")).is_empty());
        assert_eq!(
            report.outcomes.last().unwrap().result,
            Ok(SyncAction::Pulled { head: mock_oid(1) })
        );
    }

    #[test]
    fn update_to_default_branch() {
        let Setup { paths, graph, mock, _temp, .. } = setup();
        let options = SyncOptions {
            sync_to_default_branch: true,
            ..SyncOptions::default()
        };
        let report = update(&graph, &mock, options);

        assert!(report.is_success());
        assert_eq!(checkouts(&mock, paths.repo_dir("core")), ["main"]);
    }

    #[test]
    fn detached_target_returns_to_trunk() {
        let Setup { paths, graph, mock, _temp, .. } = setup();
        mock.update_repo(paths.repo_dir("board"), |s| s.branch = None);

        let report = update(&graph, &mock, SyncOptions::default());

        assert!(report.is_success());
        assert_eq!(checkouts(&mock, paths.repo_dir("board")), ["master"]);
        assert_eq!(
            mock.state(paths.repo_dir("board")).unwrap().branch.as_deref(),
            Some("master")
        );
    }

    #[test]
    fn failures_do_not_stop_other_repositories() {
        let Setup { paths, graph, mock, _temp, .. } = setup();
        mock.update_repo(paths.repo_dir("core"), |s| s.fail_on = Some(FailOn::Pull));

        let report = update(&graph, &mock, SyncOptions::default());

        assert!(!report.is_success());
        let failed: Vec<_> = report.failures().map(|o| o.name.as_str()).collect();
        assert_eq!(failed, ["core"]);
        assert_eq!(checkouts(&mock, paths.repo_dir("driver")), ["main"]);
        assert_eq!(report.outcomes.len(), 3);
    }

    #[test]
    fn revision_pin_leaves_target_detached() {
        let Setup { paths, mock, store, _temp, .. } = setup();

        let report = revision_pin(&store, &mock, "v1.0.0").unwrap();

        assert!(report.is_success());
        let board = mock.state(paths.repo_dir("board")).unwrap();
        assert_eq!(board.branch, None);
        assert_eq!(board.head, mock_oid(7));
        assert_eq!(
            report.outcomes.last().unwrap().result,
            Ok(SyncAction::LeftDetached { head: mock_oid(7) })
        );
        assert_eq!(checkouts(&mock, paths.repo_dir("core")), ["v2"]);
    }

    #[test]
    fn revision_pin_unknown_ref_touches_nothing_else() {
        let Setup { paths, mock, store, _temp, .. } = setup();

        let err = revision_pin(&store, &mock, "v9.9.9").unwrap_err();

        assert!(matches!(err, EngineError::Git(GitError::RefNotFound { .. })));
        assert!(mock.operations_for(paths.repo_dir("core")).is_empty());
    }

    #[test]
    fn revision_pin_reads_descriptor_from_disk() {
        let Setup { paths, mock, store, _temp, .. } = setup();
        fs::write(
            paths.descriptor_path("board"),
            r#"{ "libraries": [ { "name": "driver", "branch": "release" } ] }"#,
        )
        .unwrap();
        mock.update_repo(paths.repo_dir("driver"), |s| {
            s.branches.insert("release".into(), mock_oid(9));
        });

        let report = revision_pin(&store, &mock, "v1.0.0").unwrap();

        assert!(report.is_success());
        assert_eq!(checkouts(&mock, paths.repo_dir("driver")), ["release"]);
        assert!(mock.operations_for(paths.repo_dir("core")).is_empty());
        let names: Vec<_> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["driver", "board"]);
    }
}
