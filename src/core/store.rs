//! core::store
//!
//! Local build configuration: which target is selected and in which mode.
//!
//! # Storage
//!
//! `<root>/build.json`, consumed verbatim by the downstream build:
//!
//! ```json
//! {
//!     "target": {
//!         "name": "circuit-playground",
//!         "url": "https://example.com/circuit-playground",
//!         "branch": "main",
//!         "dev": true
//!     }
//! }
//! ```
//!
//! The store is the only writer of this file. Every other component reads
//! through [`ConfigStore::load`] and never keeps a copy across operations.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::core::descriptor::{DependencyDescriptor, DescriptorError};
use crate::core::paths::WorkspacePaths;

/// Errors from the build configuration store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No target has been selected yet.
    #[error("no target selected ({path} not found); select a target first")]
    NotConfigured { path: PathBuf },

    #[error("failed to read build config '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse build config '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("failed to write build config '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The selected target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSelection {
    /// Target name; also its working copy directory.
    pub name: String,

    /// Source location of the target repository.
    #[serde(default)]
    pub url: String,

    /// Branch or revision the target is fetched at.
    #[serde(default)]
    pub branch: String,

    /// Developer mode: build against the unlocked descriptor.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dev: bool,

    /// Remaining catalog keys, forwarded to the build.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Contents of `build.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub target: TargetSelection,

    /// Application source directory, when not the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,

    /// Output directory, when not the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl BuildConfig {
    pub fn new(target: TargetSelection) -> Self {
        Self {
            target,
            application: None,
            output: None,
        }
    }
}

/// Owner of `build.json` and the target descriptor files.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    paths: WorkspacePaths,
}

impl ConfigStore {
    pub fn new(paths: WorkspacePaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    /// Load the build configuration.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotConfigured`] if no target has been selected
    /// - [`StoreError::Parse`] if the file is not a valid build config
    pub fn load(&self) -> Result<BuildConfig, StoreError> {
        let path = self.paths.build_config_path();
        if !path.is_file() {
            return Err(StoreError::NotConfigured { path });
        }
        let contents = fs::read_to_string(&path).map_err(|e| StoreError::Read {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&contents).map_err(|e| StoreError::Parse {
            path,
            message: e.to_string(),
        })
    }

    /// Persist the build configuration, replacing any previous selection.
    pub fn save(&self, config: &BuildConfig) -> Result<PathBuf, StoreError> {
        let path = self.paths.build_config_path();
        let write_err = |p: &Path| {
            let p = p.to_path_buf();
            move |e| StoreError::Write { path: p, source: e }
        };

        let contents = serde_json::to_string_pretty(config)
            .map_err(|e| StoreError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;

        let temp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).map_err(write_err(&temp_path))?;
        file.write_all(contents.as_bytes())
            .map_err(write_err(&temp_path))?;
        file.sync_all().map_err(write_err(&temp_path))?;
        fs::rename(&temp_path, &path).map_err(write_err(&path))?;

        Ok(path)
    }

    /// Read the unlocked descriptor of a target.
    ///
    /// # Errors
    ///
    /// [`DescriptorError::Missing`] if the target's working copy or its
    /// descriptor does not exist.
    pub fn descriptor(&self, target: &str) -> Result<DependencyDescriptor, DescriptorError> {
        let dir = self.paths.repo_dir(target);
        if !dir.is_dir() {
            return Err(DescriptorError::Missing { path: dir });
        }
        DependencyDescriptor::read(&self.paths.descriptor_path(target))
    }

    /// Read the locked descriptor of a target, if one has been published.
    pub fn locked_descriptor(
        &self,
        target: &str,
    ) -> Result<Option<DependencyDescriptor>, DescriptorError> {
        DependencyDescriptor::read_optional(&self.paths.locked_descriptor_path(target))
    }

    /// Write the locked descriptor of a target.
    pub fn write_locked_descriptor(
        &self,
        target: &str,
        descriptor: &DependencyDescriptor,
    ) -> Result<PathBuf, DescriptorError> {
        let path = self.paths.locked_descriptor_path(target);
        descriptor.write(&path)?;
        Ok(path)
    }

    /// Recreate the build directory; stale objects from another target must
    /// not leak into the next build.
    pub fn reset_build_dir(&self) -> std::io::Result<()> {
        let dir = self.paths.build_dir();
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)
    }
}
