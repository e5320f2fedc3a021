//! core::catalog
//!
//! The list of targets a workspace can be configured for.
//!
//! # Format
//!
//! A JSON array, by default at `<root>/utils/targets.json`:
//!
//! ```json
//! [
//!     {
//!         "name": "codal-circuit-playground",
//!         "info": "Adafruit Circuit Playground Express",
//!         "device_url": "https://www.adafruit.com/product/3333",
//!         "url": "https://github.com/lancaster-university/codal-circuit-playground",
//!         "branch": "master"
//!     }
//! ]
//! ```
//!
//! `info` and `device_url` describe the target for humans. They are not
//! copied into the build configuration when a target is selected; every
//! other key is.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::core::paths::is_plain_dir_name;
use crate::core::store::TargetSelection;

/// Errors from the target catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("target catalog not found: {path}")]
    Missing { path: PathBuf },

    #[error("failed to read target catalog '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed target catalog '{path}': {message}")]
    Malformed { path: PathBuf, message: String },

    /// The requested target is not listed.
    #[error("unknown target '{name}'")]
    UnknownTarget { name: String },
}

/// One target in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub branch: String,

    /// Human-readable description.
    #[serde(default)]
    pub info: String,

    /// Product page for the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_url: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CatalogEntry {
    /// The build configuration entry for this target.
    pub fn to_selection(&self, dev: bool) -> TargetSelection {
        TargetSelection {
            name: self.name.clone(),
            url: self.url.clone(),
            branch: self.branch.clone(),
            dev,
            extra: self.extra.clone(),
        }
    }

    /// One line for `targets`: `name: info (device_url)`.
    pub fn listing(&self) -> String {
        match &self.device_url {
            Some(url) => format!("{}: {} ({})", self.name, self.info, url),
            None => format!("{}: {}", self.name, self.info),
        }
    }
}

/// All known targets, in catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetCatalog {
    entries: Vec<CatalogEntry>,
}

impl TargetCatalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.is_file() {
            return Err(CatalogError::Missing {
                path: path.to_path_buf(),
            });
        }
        let contents = fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let malformed = |message: String| CatalogError::Malformed {
            path: path.to_path_buf(),
            message,
        };
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(&contents).map_err(|e| malformed(e.to_string()))?;
        // A target is cloned into libraries/<name>.
        if let Some(entry) = entries.iter().find(|e| !is_plain_dir_name(&e.name)) {
            return Err(malformed(format!(
                "target name '{}' must be a plain directory name",
                entry.name
            )));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Look a target up by name.
    ///
    /// # Errors
    ///
    /// [`CatalogError::UnknownTarget`] if no entry has that name.
    pub fn find(&self, name: &str) -> Result<&CatalogEntry, CatalogError> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| CatalogError::UnknownTarget {
                name: name.to_string(),
            })
    }
}
