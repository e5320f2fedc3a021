//! pin command - Check the target out at a revision

use anyhow::{Context as _, Result};

use super::{report_sync, Workspace};
use crate::core::ops::TreeLock;
use crate::engine::sync;
use crate::engine::Context;

/// Check the target out at `rev`, then update the libraries.
pub fn pin(ctx: &Context, rev: &str) -> Result<()> {
    let ws = Workspace::open(ctx)?;
    let _lock = TreeLock::acquire(&ws.paths).context("Failed to acquire workspace lock")?;
    let target = ws.graph()?.target().name.clone();

    let report = sync::revision_pin(&ws.store, &ws.opener(), rev)
        .with_context(|| format!("Failed to check out '{}' in {}", rev, target))?;
    report_sync(&report, ws.verbosity)
}
