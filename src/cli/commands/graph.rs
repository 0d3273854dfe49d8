//! Graph command implementation.
//!
//! The `pipegraph graph` command prints the dependency tree.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::cli::args::GraphArgs;
use crate::error::Result;
use crate::graph::build_partial_graph;
use crate::ui::{Output, PipegraphTheme};

use super::dispatcher::{Command, CommandResult};
use super::pipeline::PreparedPipeline;

/// The graph command implementation.
pub struct GraphCommand {
    config: PathBuf,
    args: GraphArgs,
}

impl GraphCommand {
    pub fn new(config: PathBuf, args: GraphArgs) -> Self {
        Self { config, args }
    }
}

#[async_trait]
impl Command for GraphCommand {
    async fn execute(&self, output: &Output, _theme: &PipegraphTheme) -> Result<CommandResult> {
        let prepared = PreparedPipeline::load(&self.config)?;
        let graph = build_partial_graph(&prepared.steps, &self.args.target)?;
        output.println(graph.render_tree().trim_end());
        Ok(CommandResult::success())
    }
}
