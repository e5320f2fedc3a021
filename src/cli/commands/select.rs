//! select command - Make a catalog target the active target

use anyhow::{Context as _, Result};

use super::Workspace;
use crate::core::catalog::TargetCatalog;
use crate::engine::select::select_target;
use crate::engine::Context;
use crate::ui::output;

/// Select `target` from the catalog.
pub fn select(ctx: &Context, target: &str, dev: bool) -> Result<()> {
    let ws = Workspace::open(ctx)?;
    let catalog_path = ws.config.catalog_path(&ws.paths);
    let catalog = TargetCatalog::load(&catalog_path).context("Failed to load target catalog")?;

    let selection = select_target(&ws.store, &catalog, target, dev)?;

    let mode = if selection.dev { " (developer mode)" } else { "" };
    output::success(
        format!("Selected target '{}'{}", selection.name, mode),
        ws.verbosity,
    );
    Ok(())
}
