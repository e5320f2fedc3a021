//! core::ops::lock
//!
//! Exclusive lock over a workspace's tree of working copies.
//!
//! # Architecture
//!
//! Lock, update and pin each mutate several working copies in sequence.
//! Two such runs over the same tree would interleave checkouts, pulls and
//! commits, so every mutating command holds this lock for its whole run.
//! Read-only commands (status, targets) do not take it.
//!
//! # Storage
//!
//! - `<root>/.targetlock/lock` - Lock file with OS-level exclusive lock
//!
//! # Invariants
//!
//! - Lock is automatically released on drop (RAII pattern)
//! - Lock acquisition is non-blocking (fails fast if locked)
//!
//! # Example
//!
//! ```ignore
//! use targetlock::core::ops::lock::TreeLock;
//! use targetlock::core::paths::WorkspacePaths;
//!
//! let lock = TreeLock::acquire(&WorkspacePaths::new("/work"))?;
//! // ... lock or update the workspace ...
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::WorkspacePaths;

/// Errors from tree locking.
#[derive(Debug, Error)]
pub enum TreeLockError {
    /// Another process already holds the lock.
    #[error("workspace is locked by another targetlock process ({path})")]
    AlreadyLocked { path: PathBuf },

    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),
}

/// An exclusive lock on the workspace tree, held until dropped.
#[derive(Debug)]
pub struct TreeLock {
    file: File,
}

impl TreeLock {
    /// Attempt to acquire the workspace lock.
    ///
    /// Uses OS-level file locking via `fs2`, which works across processes.
    /// Non-blocking: if another process holds the lock, this returns
    /// [`TreeLockError::AlreadyLocked`] immediately.
    pub fn acquire(paths: &WorkspacePaths) -> Result<Self, TreeLockError> {
        let state_dir = paths.state_dir();
        fs::create_dir_all(&state_dir).map_err(|e| {
            TreeLockError::CreateFailed(format!("cannot create {}: {}", state_dir.display(), e))
        })?;

        let path = paths.tree_lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                TreeLockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self { file }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                Err(TreeLockError::AlreadyLocked { path })
            }
            Err(e) => Err(TreeLockError::AcquireFailed(e.to_string())),
        }
    }
}

impl Drop for TreeLock {
    fn drop(&mut self) {
        // Best effort; closing the file releases it as well.
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn acquire_creates_state_dir() {
        let temp = TempDir::new().unwrap();
        let paths = WorkspacePaths::new(temp.path());
        assert!(!paths.state_dir().exists());

        let _lock = TreeLock::acquire(&paths).expect("acquire lock");

        assert!(paths.state_dir().is_dir());
        assert!(paths.tree_lock_path().is_file());
    }

    #[test]
    fn second_acquire_fails_fast() {
        let temp = TempDir::new().unwrap();
        let paths = WorkspacePaths::new(temp.path());

        let _held = TreeLock::acquire(&paths).expect("first acquire");
        let result = TreeLock::acquire(&paths);
        assert!(matches!(result, Err(TreeLockError::AlreadyLocked { .. })));
    }

    #[test]
    fn released_on_drop() {
        let temp = TempDir::new().unwrap();
        let paths = WorkspacePaths::new(temp.path());

        let lock = TreeLock::acquire(&paths).expect("first acquire");
        assert!(TreeLock::acquire(&paths).is_err());
        drop(lock);

        let _again = TreeLock::acquire(&paths).expect("acquire after drop");
    }
}
