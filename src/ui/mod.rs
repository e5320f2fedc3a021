//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All user-facing output goes through this module so that `--quiet` is
//! honored consistently.

pub mod output;
