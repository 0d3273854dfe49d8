//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pipegraph - run CI steps in dependency order.
#[derive(Debug, Parser)]
#[command(name = "pipegraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the pipeline file (defaults to ./pipeline.yml)
    #[arg(short, long, global = true, env = "PIPEGRAPH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Execute the pipeline
    Run(RunArgs),

    /// Print the dependency graph as a tree
    Graph(GraphArgs),

    /// List steps with the links they require and create
    List,

    /// Resolve and print every deferred parameter
    Params,
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    /// Run only these targets and what they need (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub target: Vec<String>,

    /// Walk the graph without executing commands
    #[arg(long)]
    pub dry_run: bool,

    /// Write a JUnit XML report to this file
    #[arg(long, value_name = "FILE")]
    pub junit: Option<PathBuf>,

    /// Write a JSON report to this file
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Write resolved parameters to this file once every provider has run
    #[arg(long, value_name = "FILE")]
    pub params_file: Option<PathBuf>,
}

/// Arguments for the `graph` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct GraphArgs {
    /// Show only these targets and what they need (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub target: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_targets() {
        let cli = Cli::parse_from(["pipegraph", "run", "--target", "bin,rpm", "--dry-run"]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.target, vec!["bin", "rpm"]);
                assert!(args.dry_run);
                assert!(args.junit.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["pipegraph", "list", "--config", "ci.yml", "--quiet"]);
        assert_eq!(cli.config, Some(PathBuf::from("ci.yml")));
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn command_is_required() {
        assert!(Cli::try_parse_from(["pipegraph"]).is_err());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
