//! Foldsync - one-way folder mirroring driven by per-directory `.sync`
//! descriptors.
//!
//! This library provides the core functionality for foldsync, including:
//! - The mirroring engine (copy pass + prune pass)
//! - `.sync` descriptor parsing and target resolution
//! - Tool configuration (storage root)
//! - Console notification helpers

pub mod cfg;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod ui;
