//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::version::Bump;

/// targetlock - pin, version and sync a target and its library repositories
#[derive(Parser, Debug)]
#[command(name = "tl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if tl was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Make a target from the catalog the active target
    #[command(
        name = "select",
        long_about = "Make a target from the catalog the active target.\n\n\
            Writes build.json with the catalog entry for the target and empties the \
            build directory. With --dev the build uses the target's unlocked \
            descriptor (branches) instead of the locked one (pinned revisions).",
        after_help = "\
EXAMPLES:
    # Build against the published snapshot
    tl select codal-microbit-v2

    # Work on the libraries themselves
    tl select codal-microbit-v2 --dev"
    )]
    Select {
        /// Target name, as listed by `tl targets`
        target: String,

        /// Developer mode: follow branches rather than the locked snapshot
        #[arg(short, long)]
        dev: bool,
    },

    /// List the targets in the catalog
    Targets,

    /// Show branch, nearest tag, HEAD and cleanliness of each repository
    #[command(
        name = "status",
        after_help = "\
EXAMPLES:
    # Every library, then the target
    tl status

    # Only some repositories
    tl status codal-core codal-nrf52"
    )]
    Status {
        /// Only these libraries (or the target)
        libraries: Vec<String>,
    },

    /// Check out and pull every library, then the target
    #[command(
        name = "update",
        long_about = "Check out and pull every library, then the target.\n\n\
            Each library is checked out at the branch its descriptor entry records and \
            pulled. A detached target is returned to its trunk first."
    )]
    Update {
        /// Follow each library's remote default branch instead of the recorded one
        #[arg(long)]
        sync_default: bool,
    },

    /// Pin every library and publish a new snapshot of the target
    #[command(
        name = "lock",
        group(ArgGroup::new("bump").args(["major", "minor", "branch"])),
        long_about = "Pin every library and publish a new snapshot of the target.\n\n\
            Every library must be clean and fully pushed. Each library's current HEAD is \
            recorded in target-locked.json along with the new snapshot version, which \
            is committed as \"Snapshot <version>\", tagged and pushed.\n\n\
            The version is the previous snapshot found in the target's history, bumped. \
            Release bumps are cut on a trunk branch; --branch cuts a pre-release named \
            after the current feature branch.",
        after_help = "\
EXAMPLES:
    # v1.2.3 -> v1.2.4
    tl lock

    # v1.2.3 -> v1.3.0
    tl lock --minor

    # On branch 'featurex': v1.2.3 -> v1.2.3-featurex.1
    tl lock --branch

    # First snapshot of a repository
    tl lock --version v0.1.0"
    )]
    Lock {
        /// Bump the major version
        #[arg(short = 'M', long)]
        major: bool,

        /// Bump the minor version
        #[arg(short, long)]
        minor: bool,

        /// Cut a pre-release for the current feature branch
        #[arg(short, long)]
        branch: bool,

        /// Use this version instead of deriving one
        #[arg(long = "version", value_name = "VERSION")]
        explicit_version: Option<String>,
    },

    /// Check the target out at a revision or tag, then update the libraries
    #[command(
        name = "pin",
        after_help = "\
EXAMPLES:
    # Go back to a published snapshot
    tl pin v1.2.3"
    )]
    Pin {
        /// Revision hash or tag
        rev: String,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Command {
    /// Bump requested by `lock` flags; patch when none given.
    pub fn bump(major: bool, minor: bool, branch: bool) -> Bump {
        if major {
            Bump::Major
        } else if minor {
            Bump::Minor
        } else if branch {
            Bump::Branch
        } else {
            Bump::Patch
        }
    }
}

/// Shells supported for completion generation.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
