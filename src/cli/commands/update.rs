//! update command - Check out and pull every working copy

use anyhow::{Context as _, Result};

use super::{report_sync, Workspace};
use crate::core::ops::TreeLock;
use crate::engine::sync::{self, SyncOptions};
use crate::engine::Context;

/// Update every library, then the target.
pub fn update(ctx: &Context, sync_default: bool) -> Result<()> {
    let ws = Workspace::open(ctx)?;
    let _lock = TreeLock::acquire(&ws.paths).context("Failed to acquire workspace lock")?;
    let graph = ws.graph()?;

    let options = SyncOptions {
        sync_to_default_branch: sync_default,
        allow_detached: false,
    };
    let report = sync::update(&graph, &ws.opener(), options);
    report_sync(&report, ws.verbosity)
}
