//! core::config::schema
//!
//! Settings schema types.
//!
//! # Global Settings
//!
//! Located at (in order of precedence):
//! 1. `$TARGETLOCK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/targetlock/config.toml`
//! 3. `~/.targetlock/config.toml`
//!
//! # Workspace Settings
//!
//! Located at `<root>/.targetlock/config.toml`.
//!
//! # Validation
//!
//! Values are validated after parsing (trunk names must be valid branch
//! names, the history depth must be positive).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// Global settings (user scope).
///
/// # Example
///
/// ```toml
/// remote = "origin"
/// trunk_branches = ["main", "master"]
/// history_depth = 100
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Remote used for pull, push and default-branch discovery
    pub remote: Option<String>,

    /// Branch names treated as trunk
    pub trunk_branches: Option<Vec<String>>,

    /// Number of commits scanned for the previous snapshot
    pub history_depth: Option<usize>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_common(
            self.remote.as_deref(),
            self.trunk_branches.as_deref(),
            self.history_depth,
        )
    }
}

/// Workspace settings.
///
/// # Example
///
/// ```toml
/// trunk_branches = ["main"]
/// catalog = "utils/targets.json"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceConfig {
    pub remote: Option<String>,

    pub trunk_branches: Option<Vec<String>>,

    pub history_depth: Option<usize>,

    /// Target catalog location, relative to the workspace root
    pub catalog: Option<PathBuf>,
}

impl WorkspaceConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_common(
            self.remote.as_deref(),
            self.trunk_branches.as_deref(),
            self.history_depth,
        )
    }
}

fn validate_common(
    remote: Option<&str>,
    trunk_branches: Option<&[String]>,
    history_depth: Option<usize>,
) -> Result<(), ConfigError> {
    if let Some(remote) = remote {
        if remote.is_empty() {
            return Err(ConfigError::InvalidValue(
                "remote cannot be empty".to_string(),
            ));
        }
    }

    if let Some(trunks) = trunk_branches {
        if trunks.is_empty() {
            return Err(ConfigError::InvalidValue(
                "trunk_branches cannot be empty".to_string(),
            ));
        }
        for trunk in trunks {
            BranchName::new(trunk).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid trunk branch name: {}", e))
            })?;
        }
    }

    if history_depth == Some(0) {
        return Err(ConfigError::InvalidValue(
            "history_depth must be greater than zero".to_string(),
        ));
    }

    Ok(())
}
