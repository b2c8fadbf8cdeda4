//! CLI front end
//!
//! - Argument parsing structures
//! - Routing a parsed command to a transform batch

pub mod args;
pub mod router;

pub use args::{Cli, Commands, DocumentArgs, LineSpan, VaultArgs};
pub use router::execute_command;
