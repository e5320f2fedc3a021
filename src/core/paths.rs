//! core::paths
//!
//! Centralized path routing for a build workspace.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   build.json                  selected target (BuildConfig)
//!   build/                      out-of-source build directory
//!   utils/targets.json          target catalog (default location)
//!   libraries/<target>/         target working copy
//!     target.json               unlocked descriptor
//!     target-locked.json        locked descriptor
//!   libraries/<library>/        one working copy per library
//!   .targetlock/config.toml     workspace settings
//!   .targetlock/lock            tree lock
//! ```
//!
//! **Hard rule:** no component computes these locations itself and no
//! component depends on the process working directory. Every path is derived
//! from an explicit root.
//!
//! # Example
//!
//! ```
//! use targetlock::core::paths::WorkspacePaths;
//! use std::path::PathBuf;
//!
//! let paths = WorkspacePaths::new("/work");
//! assert_eq!(
//!     paths.repo_dir("codal-core"),
//!     PathBuf::from("/work/libraries/codal-core")
//! );
//! ```

use std::path::{Path, PathBuf};

/// Name of the unlocked descriptor inside the target working copy.
pub const DESCRIPTOR_FILE: &str = "target.json";

/// Name of the locked descriptor inside the target working copy.
pub const LOCKED_DESCRIPTOR_FILE: &str = "target-locked.json";

/// Whether `name` can stand as one directory under `libraries/`.
pub fn is_plain_dir_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

/// Paths of a single build workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    root: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/build.json`
    pub fn build_config_path(&self) -> PathBuf {
        self.root.join("build.json")
    }

    /// `<root>/build`
    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    /// `<root>/libraries`
    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    /// Working copy of a library or target.
    pub fn repo_dir(&self, name: &str) -> PathBuf {
        self.libraries_dir().join(name)
    }

    /// Unlocked descriptor of the named target.
    pub fn descriptor_path(&self, target: &str) -> PathBuf {
        self.repo_dir(target).join(DESCRIPTOR_FILE)
    }

    /// Locked descriptor of the named target.
    pub fn locked_descriptor_path(&self, target: &str) -> PathBuf {
        self.repo_dir(target).join(LOCKED_DESCRIPTOR_FILE)
    }

    /// `<root>/.targetlock`
    pub fn state_dir(&self) -> PathBuf {
        self.root.join(".targetlock")
    }

    /// `<root>/.targetlock/config.toml`
    pub fn workspace_config_path(&self) -> PathBuf {
        self.state_dir().join("config.toml")
    }

    /// `<root>/.targetlock/lock`
    pub fn tree_lock_path(&self) -> PathBuf {
        self.state_dir().join("lock")
    }

    /// Resolve a possibly relative path against the root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
