//! core::ops
//!
//! Coordination for mutating operations.
//!
//! # Modules
//!
//! - [`lock`] - Exclusive workspace tree lock
//!
//! # Architecture
//!
//! Every mutating command (update, lock, pin) acquires the tree lock before
//! touching any working copy and holds it until the command returns.

pub mod lock;

pub use lock::{TreeLock, TreeLockError};
