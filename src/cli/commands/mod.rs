//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads the workspace (paths, settings, build configuration store)
//! 2. Calls the engine to execute the command
//! 3. Formats and displays output
//!
//! Handlers do NOT touch working copies directly. Mutating commands (update,
//! lock, pin) hold the workspace tree lock for their whole run.

mod completion;
mod lock;
mod pin;
mod select;
mod status;
mod targets;
mod update;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use lock::lock;
pub use pin::pin;
pub use select::select;
pub use status::status;
pub use targets::targets;
pub use update::update;

use anyhow::{bail, Context as _, Result};

use crate::cli::args::Command;
use crate::core::config::Config;
use crate::core::graph::DependencyGraph;
use crate::core::paths::WorkspacePaths;
use crate::core::store::ConfigStore;
use crate::engine::{Context, SyncAction, SyncReport};
use crate::git::GitOpener;
use crate::ui::output::{self, Verbosity};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Select { target, dev } => select::select(ctx, &target, dev),
        Command::Targets => targets::targets(ctx),
        Command::Status { libraries } => status::status(ctx, &libraries),
        Command::Update { sync_default } => update::update(ctx, sync_default),
        Command::Lock {
            major,
            minor,
            branch,
            explicit_version,
        } => lock::lock(
            ctx,
            Command::bump(major, minor, branch),
            explicit_version.as_deref(),
        ),
        Command::Pin { rev } => pin::pin(ctx, &rev),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Everything a handler needs about the workspace it runs in.
pub(crate) struct Workspace {
    pub paths: WorkspacePaths,
    pub config: Config,
    pub store: ConfigStore,
    pub verbosity: Verbosity,
}

impl Workspace {
    pub fn open(ctx: &Context) -> Result<Self> {
        let root = ctx
            .workspace_root()
            .context("Failed to determine working directory")?;
        let paths = WorkspacePaths::new(root);
        let config = Config::load(&paths).context("Failed to load settings")?;
        let store = ConfigStore::new(paths.clone());
        Ok(Self {
            paths,
            config,
            store,
            verbosity: Verbosity::from_flags(ctx.quiet, ctx.debug),
        })
    }

    pub fn opener(&self) -> GitOpener {
        GitOpener::new(self.config.remote())
    }

    pub fn graph(&self) -> Result<DependencyGraph> {
        DependencyGraph::load(&self.store).context("Failed to load the selected target")
    }
}

/// Print per-repository sync results; fail if any repository failed.
pub(crate) fn report_sync(report: &SyncReport, verbosity: Verbosity) -> Result<()> {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(SyncAction::Updated { reference, head }) => output::print(
                format!("{}: {} at {}", outcome.name, reference, head.short(7)),
                verbosity,
            ),
            Ok(SyncAction::Pulled { head }) => output::print(
                format!("{}: pulled, at {}", outcome.name, head.short(7)),
                verbosity,
            ),
            Ok(SyncAction::LeftDetached { head }) => output::print(
                format!("{}: detached at {}", outcome.name, head.short(7)),
                verbosity,
            ),
            Err(e) => output::error(format!("{}: {}", outcome.name, e)),
        }
    }

    if !report.is_success() {
        let failed: Vec<_> = report.failures().map(|o| o.name.as_str()).collect();
        bail!("update failed for: {}", failed.join(", "));
    }
    Ok(())
}
