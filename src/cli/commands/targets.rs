//! targets command - List the target catalog

use anyhow::{Context as _, Result};

use super::Workspace;
use crate::core::catalog::TargetCatalog;
use crate::engine::Context;
use crate::ui::output;

/// Print one line per catalog entry.
pub fn targets(ctx: &Context) -> Result<()> {
    let ws = Workspace::open(ctx)?;
    let catalog = TargetCatalog::load(&ws.config.catalog_path(&ws.paths))
        .context("Failed to load target catalog")?;

    for entry in catalog.entries() {
        output::result(entry.listing());
    }
    Ok(())
}
