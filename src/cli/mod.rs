//! Command-line interface for pipegraph.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, GraphArgs, RunArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};
