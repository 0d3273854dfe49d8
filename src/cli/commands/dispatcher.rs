//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::cli::args::{Cli, Commands};
use crate::config::pipeline_path;
use crate::error::Result;
use crate::ui::{Output, PipegraphTheme};

/// Exit code for a run interrupted by cancellation (128 + SIGINT).
pub const EXIT_CANCELLED: i32 = 130;

/// Trait for command implementations.
#[async_trait]
pub trait Command {
    /// Execute the command, writing human output through `output`.
    async fn execute(&self, output: &Output, theme: &PipegraphTheme) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    working_dir: PathBuf,
    cancel: CancellationToken,
}

impl CommandDispatcher {
    /// Create a dispatcher resolving relative paths against `working_dir`.
    pub fn new(working_dir: PathBuf, cancel: CancellationToken) -> Self {
        Self {
            working_dir,
            cancel,
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Dispatch and execute a command.
    pub async fn dispatch(
        &self,
        cli: &Cli,
        output: &Output,
        theme: &PipegraphTheme,
    ) -> Result<CommandResult> {
        let config = pipeline_path(cli.config.as_deref(), &self.working_dir);
        match &cli.command {
            Commands::Run(args) => {
                let cmd = super::run::RunCommand::new(
                    config,
                    &self.working_dir,
                    args.clone(),
                    self.cancel.clone(),
                );
                cmd.execute(output, theme).await
            }
            Commands::Graph(args) => {
                let cmd = super::graph::GraphCommand::new(config, args.clone());
                cmd.execute(output, theme).await
            }
            Commands::List => {
                let cmd = super::list::ListCommand::new(config);
                cmd.execute(output, theme).await
            }
            Commands::Params => {
                let cmd = super::params::ParamsCommand::new(config);
                cmd.execute(output, theme).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn command_result_failure() {
        let result = CommandResult::failure(EXIT_CANCELLED);
        assert!(!result.success);
        assert_eq!(result.exit_code, 130);
    }

    #[test]
    fn dispatcher_keeps_working_dir() {
        let dispatcher = CommandDispatcher::new(PathBuf::from("/work"), CancellationToken::new());
        assert_eq!(dispatcher.working_dir(), Path::new("/work"));
    }
}
