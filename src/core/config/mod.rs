//! core::config
//!
//! Tool settings schema and loading.
//!
//! # Overview
//!
//! Settings have two scopes:
//! - **Global**: user-level settings
//! - **Workspace**: overrides for one build workspace
//!
//! These are distinct from `build.json` (see [`crate::core::store`]), which
//! records *what* is being built rather than *how* the tool behaves.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Workspace config file
//! 4. CLI flags (not handled here)
//!
//! # Example
//!
//! ```no_run
//! use targetlock::core::config::Config;
//! use targetlock::core::paths::WorkspacePaths;
//!
//! let config = Config::load(&WorkspacePaths::new("/path/to/workspace")).unwrap();
//! println!("Remote: {}", config.remote());
//! println!("Trunks: {:?}", config.trunk_branches());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, WorkspaceConfig};

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::paths::WorkspacePaths;

/// Default number of commits scanned for the previous snapshot.
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// Default trunk branch names.
pub const DEFAULT_TRUNK_BRANCHES: &[&str] = &["main", "master"];

/// Default catalog location relative to the workspace root.
pub const DEFAULT_CATALOG: &str = "utils/targets.json";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged settings from all sources.
///
/// Accessors apply precedence automatically: workspace overrides global,
/// global overrides defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    pub workspace: Option<WorkspaceConfig>,
}

impl Config {
    /// Load settings from the default global location and the workspace.
    ///
    /// Missing files are not an error (defaults are used).
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation.
    pub fn load(paths: &WorkspacePaths) -> Result<Self, ConfigError> {
        Self::load_from(Self::global_config_path().as_deref(), paths)
    }

    /// Load settings with an explicit global config location.
    pub fn load_from(
        global_path: Option<&Path>,
        paths: &WorkspacePaths,
    ) -> Result<Self, ConfigError> {
        let global: GlobalConfig = match global_path {
            Some(path) if path.exists() => read_toml(path)?,
            _ => GlobalConfig::default(),
        };

        let workspace_path = paths.workspace_config_path();
        let workspace: Option<WorkspaceConfig> = if workspace_path.exists() {
            Some(read_toml(&workspace_path)?)
        } else {
            None
        };

        global.validate()?;
        if let Some(ref w) = workspace {
            w.validate()?;
        }

        Ok(Self { global, workspace })
    }

    /// Locate the global config file, if any exists.
    ///
    /// Searched in order: `$TARGETLOCK_CONFIG`,
    /// `$XDG_CONFIG_HOME/targetlock/config.toml`, `~/.targetlock/config.toml`.
    pub fn global_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("TARGETLOCK_CONFIG") {
            return Some(PathBuf::from(path));
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("targetlock/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir().map(|home| home.join(".targetlock/config.toml"))
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Remote name. Defaults to "origin".
    pub fn remote(&self) -> &str {
        self.workspace
            .as_ref()
            .and_then(|w| w.remote.as_deref())
            .or(self.global.remote.as_deref())
            .unwrap_or("origin")
    }

    /// Trunk branch names. Defaults to `main` and `master`.
    pub fn trunk_branches(&self) -> Vec<String> {
        self.workspace
            .as_ref()
            .and_then(|w| w.trunk_branches.clone())
            .or_else(|| self.global.trunk_branches.clone())
            .unwrap_or_else(|| {
                DEFAULT_TRUNK_BRANCHES
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
    }

    /// Commits scanned for the previous snapshot. Defaults to 100.
    pub fn history_depth(&self) -> usize {
        self.workspace
            .as_ref()
            .and_then(|w| w.history_depth)
            .or(self.global.history_depth)
            .unwrap_or(DEFAULT_HISTORY_DEPTH)
    }

    /// Absolute path of the target catalog.
    pub fn catalog_path(&self, paths: &WorkspacePaths) -> PathBuf {
        let relative = self
            .workspace
            .as_ref()
            .and_then(|w| w.catalog.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG));
        paths.resolve(&relative)
    }
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_workspace_config(paths: &WorkspacePaths, contents: &str) {
        let path = paths.workspace_config_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn load_empty_defaults() {
        let temp = TempDir::new().unwrap();
        let paths = WorkspacePaths::new(temp.path());

        let config = Config::load_from(None, &paths).unwrap();

        assert_eq!(config.remote(), "origin");
        assert_eq!(config.trunk_branches(), ["main", "master"]);
        assert_eq!(config.history_depth(), 100);
        assert_eq!(
            config.catalog_path(&paths),
            temp.path().join("utils/targets.json")
        );
    }

    #[test]
    fn workspace_overrides_global() {
        let temp = TempDir::new().unwrap();
        let paths = WorkspacePaths::new(temp.path());
        let global = temp.path().join("global.toml");
        fs::write(&global, "remote = \"upstream\"\nhistory_depth = 20\n").unwrap();
        write_workspace_config(&paths, "history_depth = 5\ntrunk_branches = [\"develop\"]\n");

        let config = Config::load_from(Some(&global), &paths).unwrap();

        assert_eq!(config.remote(), "upstream");
        assert_eq!(config.history_depth(), 5);
        assert_eq!(config.trunk_branches(), ["develop"]);
    }

    #[test]
    fn missing_global_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let paths = WorkspacePaths::new(temp.path());
        let config = Config::load_from(Some(&temp.path().join("absent.toml")), &paths).unwrap();
        assert_eq!(config.remote(), "origin");
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let paths = WorkspacePaths::new(temp.path());
        write_workspace_config(&paths, "remote = \"origin\"\nunknown_field = true\n");

        let result = Config::load_from(None, &paths);
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn invalid_values_rejected() {
        let temp = TempDir::new().unwrap();
        let paths = WorkspacePaths::new(temp.path());
        write_workspace_config(&paths, "trunk_branches = [\"invalid..name\"]\n");

        let result = Config::load_from(None, &paths);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn custom_catalog_location() {
        let temp = TempDir::new().unwrap();
        let paths = WorkspacePaths::new(temp.path());
        write_workspace_config(&paths, "catalog = \"boards/catalog.json\"\n");

        let config = Config::load_from(None, &paths).unwrap();
        assert_eq!(
            config.catalog_path(&paths),
            temp.path().join("boards/catalog.json")
        );
    }
}
