//! targetlock - lock and synchronize a build target and its libraries
//!
//! A build target is a repository whose descriptor (`target.json`) lists the
//! library repositories it is built from, each at a branch. targetlock keeps
//! the working copies of all of them in step, and publishes snapshots: a
//! locked descriptor (`target-locked.json`) pinning every library to an exact
//! revision, committed, tagged with a version and pushed.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Inspect, update, pin and lock workflows
//! - [`core`] - Domain types, descriptors, the build configuration store, settings
//! - [`git`] - Single interface for all Git operations
//! - [`ui`] - Output helpers
//!
//! # Correctness Invariants
//!
//! 1. A snapshot is published only when every library is clean and pushed
//! 2. A published locked descriptor pins every library to a full revision
//! 3. Nothing is pushed when a concurrent lock is detected
//! 4. Mutating commands hold the workspace lock

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod ui;
