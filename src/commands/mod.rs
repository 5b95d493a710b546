//! CLI command implementations for procsnap.
//!
//! This module provides implementations for all CLI subcommands:
//! - default: take one or more snapshots and print them
//! - `check`: Source and snapshot validation
//! - `config`: Configuration file generation

pub mod check;
pub mod config;
pub mod snapshot;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use snapshot::command_snapshot;
