//! cli
//!
//! Command-line interface layer for targetlock.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Set up logging
//! - Delegate to command handlers
//! - Does NOT touch working copies directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::engine`] for execution.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::engine;
use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    init_logging(ctx.debug);

    commands::dispatch(cli.command, &ctx)
}

/// Log to stderr. `RUST_LOG` wins over `--debug`.
fn init_logging(debug: bool) {
    let fallback = if debug { "targetlock=debug" } else { "warn" };
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
