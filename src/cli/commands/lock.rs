//! lock command - Pin every library and publish a snapshot

use anyhow::{Context as _, Result};

use super::Workspace;
use crate::core::ops::TreeLock;
use crate::core::version::Bump;
use crate::engine::lock::{self, LockOptions};
use crate::engine::{Context, VersionPolicy};
use crate::ui::output;

/// Lock the selected target.
pub fn lock(ctx: &Context, bump: Bump, explicit_version: Option<&str>) -> Result<()> {
    let ws = Workspace::open(ctx)?;
    let _lock = TreeLock::acquire(&ws.paths).context("Failed to acquire workspace lock")?;
    let graph = ws.graph()?;

    let options = LockOptions {
        bump,
        explicit_version: explicit_version.map(String::from),
        policy: VersionPolicy::from_config(&ws.config),
    };
    let report = lock::lock(&ws.store, &graph, &ws.opener(), &options)?;

    let pins: Vec<_> = report
        .pinned
        .iter()
        .map(|pin| format!("{} {}", pin.name, pin.revision))
        .collect();
    if !pins.is_empty() {
        output::print(output::format_list(&pins, ""), ws.verbosity);
    }
    output::print(format!("Creating snapshot {}", report.version), ws.verbosity);
    output::result(format!("New snapshot: {} [{}]", report.version, report.commit));
    Ok(())
}
