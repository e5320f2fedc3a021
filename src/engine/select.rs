//! engine::select
//!
//! Target selection: makes one catalog entry the active target.

use tracing::info;

use super::EngineError;
use crate::core::catalog::TargetCatalog;
use crate::core::store::{BuildConfig, ConfigStore, TargetSelection};

/// Select `name` from the catalog and record it in `build.json`.
///
/// Any previous selection is replaced and the build directory is emptied,
/// since objects built for another target must not be reused.
///
/// # Errors
///
/// [`crate::core::catalog::CatalogError::UnknownTarget`] if the catalog has
/// no such target.
pub fn select_target(
    store: &ConfigStore,
    catalog: &TargetCatalog,
    name: &str,
    dev: bool,
) -> Result<TargetSelection, EngineError> {
    let selection = catalog.find(name)?.to_selection(dev);
    store.save(&BuildConfig::new(selection.clone()))?;

    store.reset_build_dir().map_err(|e| EngineError::BuildDir {
        path: store.paths().build_dir(),
        source: e,
    })?;

    info!(target = name, dev, "target selected");
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::CatalogError;
    use crate::core::paths::WorkspacePaths;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ConfigStore, TargetCatalog) {
        let temp = TempDir::new().unwrap();
        let catalog_path = temp.path().join("targets.json");
        fs::write(
            &catalog_path,
            r#"[
                { "name": "uno", "info": "Arduino Uno", "device_url": "https://arduino.cc",
                  "url": "https://example.com/uno", "branch": "main" },
                { "name": "microbit", "info": "micro:bit", "url": "https://example.com/mb", "branch": "master" }
            ]"#,
        )
        .unwrap();
        let catalog = TargetCatalog::load(&catalog_path).unwrap();
        let store = ConfigStore::new(WorkspacePaths::new(temp.path()));
        (temp, store, catalog)
    }

    #[test]
    fn writes_build_config_and_resets_build_dir() {
        let (_temp, store, catalog) = setup();
        let build = store.paths().build_dir();
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("old.o"), "").unwrap();

        let selection = select_target(&store, &catalog, "uno", true).unwrap();

        assert_eq!(store.load().unwrap().target, selection);
        assert!(selection.dev);
        assert!(build.is_dir());
        assert!(!build.join("old.o").exists());

        let text = fs::read_to_string(store.paths().build_config_path()).unwrap();
        assert!(!text.contains("device_url"));
        assert!(!text.contains("Arduino Uno"));
    }

    #[test]
    fn reselect_overwrites() {
        let (_temp, store, catalog) = setup();
        select_target(&store, &catalog, "uno", true).unwrap();
        select_target(&store, &catalog, "microbit", false).unwrap();

        let config = store.load().unwrap();
        assert_eq!(config.target.name, "microbit");
        assert!(!config.target.dev);
    }

    #[test]
    fn unknown_target_leaves_config_alone() {
        let (_temp, store, catalog) = setup();
        let err = select_target(&store, &catalog, "zx81", false).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Catalog(CatalogError::UnknownTarget { .. })
        ));
        assert!(!store.paths().build_config_path().exists());
    }
}
