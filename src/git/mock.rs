//! git::mock
//!
//! In-memory working copies for deterministic testing.
//!
//! # Design
//!
//! [`MockWorkspace`] implements [`RepositoryOpener`] over a set of simulated
//! repositories keyed by path. Handles opened from it share state with the
//! workspace, so a test can arrange repositories, run an engine operation,
//! then inspect both the resulting state and the recorded operations.
//!
//! History is linear: each repository tracks its HEAD, the messages
//! reachable from it (newest first), named branches and tags. Commits get
//! sequential synthetic object ids.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use targetlock::git::mock::{MockRepoState, MockWorkspace};
//! use targetlock::git::{Repository, RepositoryOpener};
//!
//! let workspace = MockWorkspace::new();
//! workspace.add_repo("libraries/core", MockRepoState::on_branch("main"));
//!
//! let repo = workspace.open(Path::new("libraries/core")).unwrap();
//! assert!(!repo.is_dirty().unwrap());
//! assert_eq!(repo.current_branch().unwrap().unwrap().as_str(), "main");
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::traits::{GitError, Repository, RepositoryOpener};
use crate::core::types::{BranchName, Oid};

/// Deterministic object id for test fixtures.
pub fn mock_oid(n: u64) -> Oid {
    Oid::new(format!("{:040x}", n)).unwrap()
}

/// Which operation a simulated repository should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    /// Fail status reads (`is_dirty`).
    Status,
    Checkout,
    Fetch,
    Pull,
    Commit,
    Tag,
    Push,
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Checkout { path: PathBuf, reference: String },
    Fetch { path: PathBuf },
    Pull { path: PathBuf },
    Commit { path: PathBuf, message: String, files: Vec<PathBuf> },
    Tag { path: PathBuf, name: String },
    Push { path: PathBuf, include_tags: bool },
    DiscardChanges { path: PathBuf, file: PathBuf },
}

impl MockOperation {
    /// Working copy the operation ran in.
    pub fn path(&self) -> &Path {
        match self {
            MockOperation::Checkout { path, .. }
            | MockOperation::Fetch { path }
            | MockOperation::Pull { path }
            | MockOperation::Commit { path, .. }
            | MockOperation::Tag { path, .. }
            | MockOperation::Push { path, .. }
            | MockOperation::DiscardChanges { path, .. } => path,
        }
    }
}

/// State of one simulated repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRepoState {
    /// Checked-out branch; `None` when detached.
    pub branch: Option<String>,
    pub head: Oid,
    /// Paths with local modifications.
    pub dirty_files: BTreeSet<PathBuf>,
    pub ahead: bool,
    /// Tags in creation order.
    pub tags: Vec<(String, Oid)>,
    /// Commit messages reachable from HEAD, newest first.
    pub messages: Vec<String>,
    pub default_branch: String,
    pub branches: BTreeMap<String, Oid>,
    /// Commits already on the remote that the next fetch reports and the
    /// next pull brings in.
    pub incoming: Vec<String>,
    pub fail_on: Option<FailOn>,
}

impl MockRepoState {
    /// A clean repository on `branch`, which is also the remote default.
    pub fn on_branch(branch: &str) -> Self {
        let head = mock_oid(1);
        let mut branches = BTreeMap::new();
        branches.insert(branch.to_string(), head.clone());
        Self {
            branch: Some(branch.to_string()),
            head,
            dirty_files: BTreeSet::new(),
            ahead: false,
            tags: Vec::new(),
            messages: vec!["Initial commit".to_string()],
            default_branch: branch.to_string(),
            branches,
            incoming: Vec::new(),
            fail_on: None,
        }
    }

    pub fn with_head(mut self, head: Oid) -> Self {
        if let Some(branch) = &self.branch {
            self.branches.insert(branch.clone(), head.clone());
        }
        self.head = head;
        self
    }

    /// Add a branch that exists alongside the current one.
    pub fn with_branch(mut self, name: &str, head: Oid) -> Self {
        self.branches.insert(name.to_string(), head);
        self
    }

    pub fn with_default_branch(mut self, name: &str) -> Self {
        self.default_branch = name.to_string();
        self.branches
            .entry(name.to_string())
            .or_insert_with(|| self.head.clone());
        self
    }

    /// Replace history with `messages`, newest first.
    pub fn with_messages<I, S>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.messages = messages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tag(mut self, name: &str, oid: Oid) -> Self {
        self.tags.push((name.to_string(), oid));
        self
    }

    pub fn with_dirty_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.dirty_files.insert(file.into());
        self
    }

    pub fn ahead(mut self) -> Self {
        self.ahead = true;
        self
    }

    pub fn detached_at(mut self, head: Oid) -> Self {
        self.branch = None;
        self.head = head;
        self
    }

    /// Someone else pushes a commit that the next pull brings in.
    pub fn with_incoming(mut self, message: &str) -> Self {
        self.incoming.push(message.to_string());
        self
    }

    pub fn failing(mut self, fail_on: FailOn) -> Self {
        self.fail_on = Some(fail_on);
        self
    }

    fn knows_revision(&self, oid: &str) -> bool {
        self.head.as_str() == oid
            || self.branches.values().any(|o| o.as_str() == oid)
            || self.tags.iter().any(|(_, o)| o.as_str() == oid)
    }
}

#[derive(Debug)]
struct Inner {
    repos: HashMap<PathBuf, MockRepoState>,
    operations: Vec<MockOperation>,
    next_oid: u64,
}

/// A set of simulated working copies.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockWorkspace {
    inner: Arc<Mutex<Inner>>,
}

impl MockWorkspace {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                repos: HashMap::new(),
                operations: Vec::new(),
                next_oid: 0x1000,
            })),
        }
    }

    /// Register a working copy at `path`.
    pub fn add_repo(&self, path: impl Into<PathBuf>, state: MockRepoState) {
        let mut inner = self.inner.lock().unwrap();
        inner.repos.insert(path.into(), state);
    }

    /// Current state of a working copy (for test verification).
    pub fn state(&self, path: impl AsRef<Path>) -> Option<MockRepoState> {
        let inner = self.inner.lock().unwrap();
        inner.repos.get(path.as_ref()).cloned()
    }

    /// Change a working copy in place, e.g. to dirty it between steps.
    pub fn update_repo(&self, path: impl AsRef<Path>, f: impl FnOnce(&mut MockRepoState)) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(state) = inner.repos.get_mut(path.as_ref()) {
            f(state);
        }
    }

    /// All recorded operations, in order.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Recorded operations for one working copy.
    pub fn operations_for(&self, path: impl AsRef<Path>) -> Vec<MockOperation> {
        self.operations()
            .into_iter()
            .filter(|op| op.path() == path.as_ref())
            .collect()
    }

    pub fn clear_operations(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.clear();
    }
}

impl Default for MockWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryOpener for MockWorkspace {
    type Repo = MockRepo;

    fn open(&self, path: &Path) -> Result<MockRepo, GitError> {
        let inner = self.inner.lock().unwrap();
        if !inner.repos.contains_key(path) {
            return Err(GitError::NotARepo {
                path: path.to_path_buf(),
            });
        }
        Ok(MockRepo {
            path: path.to_path_buf(),
            inner: Arc::clone(&self.inner),
        })
    }
}

/// Handle to one simulated working copy.
#[derive(Debug, Clone)]
pub struct MockRepo {
    path: PathBuf,
    inner: Arc<Mutex<Inner>>,
}

impl MockRepo {
    fn read<T>(&self, f: impl FnOnce(&MockRepoState) -> Result<T, GitError>) -> Result<T, GitError> {
        let inner = self.inner.lock().unwrap();
        match inner.repos.get(&self.path) {
            Some(state) => f(state),
            None => Err(GitError::NotARepo {
                path: self.path.clone(),
            }),
        }
    }

    /// Record `op`, then apply `f` unless the repository is set to fail `fail`.
    fn write<T>(
        &self,
        op: MockOperation,
        fail: FailOn,
        f: impl FnOnce(&mut MockRepoState, &mut u64) -> Result<T, GitError>,
    ) -> Result<T, GitError> {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        inner.operations.push(op);
        let state = inner
            .repos
            .get_mut(&self.path)
            .ok_or_else(|| GitError::NotARepo {
                path: self.path.clone(),
            })?;
        if state.fail_on == Some(fail) {
            return Err(failure(fail));
        }
        f(state, &mut inner.next_oid)
    }
}

fn failure(op: FailOn) -> GitError {
    GitError::CommandFailed {
        command: format!("git {:?}", op).to_lowercase(),
        output: "simulated failure".to_string(),
    }
}

fn new_commit(state: &mut MockRepoState, next_oid: &mut u64, message: &str) -> Oid {
    let oid = mock_oid(*next_oid);
    *next_oid += 1;
    state.head = oid.clone();
    state.messages.insert(0, message.to_string());
    if let Some(branch) = &state.branch {
        state.branches.insert(branch.clone(), oid.clone());
    }
    oid
}

impl Repository for MockRepo {
    fn path(&self) -> &Path {
        &self.path
    }

    fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        self.read(|s| match &s.branch {
            Some(b) => Ok(Some(BranchName::new(b.as_str())?)),
            None => Ok(None),
        })
    }

    fn is_detached(&self) -> Result<bool, GitError> {
        self.read(|s| Ok(s.branch.is_none()))
    }

    fn is_dirty(&self) -> Result<bool, GitError> {
        self.read(|s| {
            if s.fail_on == Some(FailOn::Status) {
                return Err(failure(FailOn::Status));
            }
            Ok(!s.dirty_files.is_empty())
        })
    }

    fn is_ahead_of_remote(&self) -> Result<bool, GitError> {
        self.read(|s| Ok(s.branch.is_some() && s.ahead))
    }

    fn head_revision(&self) -> Result<Oid, GitError> {
        self.read(|s| Ok(s.head.clone()))
    }

    fn nearest_tag(&self) -> Result<Option<String>, GitError> {
        self.read(|s| Ok(s.tags.last().map(|(name, _)| name.clone())))
    }

    fn recent_messages(&self, limit: usize) -> Result<Vec<String>, GitError> {
        self.read(|s| Ok(s.messages.iter().take(limit).cloned().collect()))
    }

    fn default_branch(&self) -> Result<BranchName, GitError> {
        self.read(|s| Ok(BranchName::new(s.default_branch.as_str())?))
    }

    fn checkout(&self, reference: &str) -> Result<(), GitError> {
        let op = MockOperation::Checkout {
            path: self.path.clone(),
            reference: reference.to_string(),
        };
        self.write(op, FailOn::Checkout, |s, _| {
            if let Some(oid) = s.branches.get(reference).cloned() {
                s.branch = Some(reference.to_string());
                s.head = oid;
            } else if let Some(oid) = s
                .tags
                .iter()
                .find(|(name, _)| name == reference)
                .map(|(_, oid)| oid.clone())
            {
                s.head = oid;
                s.branch = None;
            } else if s.knows_revision(reference) {
                s.head = Oid::new(reference)?;
                s.branch = None;
            } else {
                return Err(GitError::RefNotFound {
                    refname: reference.to_string(),
                });
            }
            Ok(())
        })
    }

    fn fetch_incoming(&self) -> Result<Option<Oid>, GitError> {
        let op = MockOperation::Fetch {
            path: self.path.clone(),
        };
        self.write(op, FailOn::Fetch, |s, next_oid| {
            if s.branch.is_none() || s.incoming.is_empty() {
                return Ok(None);
            }
            // The id the last incoming commit receives once pulled.
            let tip = *next_oid + s.incoming.len() as u64 - 1;
            Ok(Some(mock_oid(tip)))
        })
    }

    fn pull(&self) -> Result<(), GitError> {
        let op = MockOperation::Pull {
            path: self.path.clone(),
        };
        self.write(op, FailOn::Pull, |s, next_oid| {
            if s.branch.is_none() {
                return Err(GitError::CommandFailed {
                    command: "git pull".to_string(),
                    output: "You are not currently on a branch.".to_string(),
                });
            }
            for message in std::mem::take(&mut s.incoming) {
                new_commit(s, next_oid, &message);
            }
            Ok(())
        })
    }

    fn commit(&self, message: &str, files: &[&Path]) -> Result<Oid, GitError> {
        let op = MockOperation::Commit {
            path: self.path.clone(),
            message: message.to_string(),
            files: files.iter().map(|f| f.to_path_buf()).collect(),
        };
        self.write(op, FailOn::Commit, |s, next_oid| {
            for file in files {
                s.dirty_files.remove(*file);
            }
            s.ahead = true;
            Ok(new_commit(s, next_oid, message))
        })
    }

    fn tag(&self, name: &str) -> Result<(), GitError> {
        let op = MockOperation::Tag {
            path: self.path.clone(),
            name: name.to_string(),
        };
        self.write(op, FailOn::Tag, |s, _| {
            if s.tags.iter().any(|(existing, _)| existing == name) {
                return Err(GitError::CommandFailed {
                    command: format!("git tag {}", name),
                    output: format!("fatal: tag '{}' already exists", name),
                });
            }
            s.tags.push((name.to_string(), s.head.clone()));
            Ok(())
        })
    }

    fn push(&self, include_tags: bool) -> Result<(), GitError> {
        let op = MockOperation::Push {
            path: self.path.clone(),
            include_tags,
        };
        self.write(op, FailOn::Push, |s, _| {
            s.ahead = false;
            Ok(())
        })
    }

    fn discard_changes(&self, file: &Path) -> Result<(), GitError> {
        let op = MockOperation::DiscardChanges {
            path: self.path.clone(),
            file: file.to_path_buf(),
        };
        self.write(op, FailOn::Checkout, |s, _| {
            s.dirty_files.remove(file);
            Ok(())
        })
    }
}
