//! core
//!
//! Core domain types, persisted formats, and configuration for targetlock.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid
//! - [`version`] - Snapshot versions and the lock commit message format
//! - [`descriptor`] - Target dependency descriptors (unlocked and locked)
//! - [`store`] - `build.json` and descriptor file ownership
//! - [`catalog`] - Known targets and their build configuration entries
//! - [`graph`] - Dependency graph of the selected target
//! - [`ops`] - Workspace tree locking
//! - [`config`] - Tool settings schema and loading
//! - [`paths`] - Centralized path routing for the workspace
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Persisted formats are deterministic and carry unknown keys through
//! - Nothing here talks to git

pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod graph;
pub mod ops;
pub mod paths;
pub mod store;
pub mod types;
pub mod version;
