//! List command implementation.
//!
//! The `pipegraph list` command lists steps and their links.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::graph::StepLink;
use crate::ui::{Output, PipegraphTheme};

use super::dispatcher::{Command, CommandResult};
use super::pipeline::PreparedPipeline;

/// The list command implementation.
pub struct ListCommand {
    config: PathBuf,
}

impl ListCommand {
    pub fn new(config: PathBuf) -> Self {
        Self { config }
    }
}

fn join_links(links: &[StepLink]) -> String {
    links
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl Command for ListCommand {
    async fn execute(&self, output: &Output, theme: &PipegraphTheme) -> Result<CommandResult> {
        let prepared = PreparedPipeline::load(&self.config)?;

        for step in &prepared.steps {
            output.println(&theme.format_step(step.name(), step.description()));
            let requires = step.requires();
            if !requires.is_empty() {
                output.println(&format!(
                    "    requires: {}",
                    theme.link.apply_to(join_links(&requires))
                ));
            }
            let creates = step.creates();
            if !creates.is_empty() {
                output.println(&format!(
                    "    creates:  {}",
                    theme.link.apply_to(join_links(&creates))
                ));
            }
        }

        Ok(CommandResult::success())
    }
}
