//! Params command implementation.
//!
//! The `pipegraph params` command resolves every deferred parameter.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::params::format_parameters;
use crate::ui::{Output, PipegraphTheme};

use super::dispatcher::{Command, CommandResult};
use super::pipeline::PreparedPipeline;

/// The params command implementation.
pub struct ParamsCommand {
    config: PathBuf,
}

impl ParamsCommand {
    pub fn new(config: PathBuf) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Command for ParamsCommand {
    async fn execute(&self, output: &Output, _theme: &PipegraphTheme) -> Result<CommandResult> {
        let prepared = PreparedPipeline::load(&self.config)?;
        let values = prepared.params.map()?;
        let rendered = format_parameters(&values);
        if !rendered.is_empty() {
            output.println(rendered.trim_end());
        }
        Ok(CommandResult::success())
    }
}
