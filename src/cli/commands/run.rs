//! Run command implementation.
//!
//! The `pipegraph run` command executes the full or partial graph.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli::args::RunArgs;
use crate::error::Result;
use crate::graph::build_partial_graph;
use crate::runner::run_with_progress;
use crate::steps::{Step, WriteParametersStep, WRITE_PARAMETERS_STEP};
use crate::ui::{format_summary, Output, PipegraphTheme, ProgressPrinter};

use super::dispatcher::{Command, CommandResult, EXIT_CANCELLED};
use super::pipeline::PreparedPipeline;

/// The run command implementation.
pub struct RunCommand {
    config: PathBuf,
    working_dir: PathBuf,
    args: RunArgs,
    cancel: CancellationToken,
}

impl RunCommand {
    pub fn new(config: PathBuf, working_dir: &Path, args: RunArgs, cancel: CancellationToken) -> Self {
        Self {
            config,
            working_dir: working_dir.to_path_buf(),
            args,
            cancel,
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}

#[async_trait]
impl Command for RunCommand {
    async fn execute(&self, output: &Output, theme: &PipegraphTheme) -> Result<CommandResult> {
        let prepared = PreparedPipeline::load(&self.config)?;
        let mut steps = prepared.steps.clone();
        let mut targets = self.args.target.clone();

        if let Some(path) = &self.args.params_file {
            let writer: Arc<dyn Step> = Arc::new(WriteParametersStep::new(
                self.resolve(path),
                Arc::clone(&prepared.params),
            ));
            steps.push(writer);
            if !targets.is_empty() {
                targets.push(WRITE_PARAMETERS_STEP.to_string());
            }
        }

        let graph = build_partial_graph(&steps, &targets)?;
        output.progress(&theme.format_header(&format!(
            "Running {} ({} steps)",
            prepared.suite_name(),
            graph.len()
        )));

        let printer = ProgressPrinter::new(output, theme, self.args.dry_run);
        let mut execution = run_with_progress(&self.cancel, &graph, self.args.dry_run, |event| {
            printer.handle(event)
        })
        .await;
        execution.suite.name = prepared.suite_name().to_string();

        if let Some(path) = &self.args.junit {
            execution.suite.write_junit(&self.resolve(path))?;
        }
        if let Some(path) = &self.args.json {
            execution.suite.write_json(&self.resolve(path))?;
        }

        output.println(&format_summary(&execution.suite, theme));

        match &execution.error {
            None => Ok(CommandResult::success()),
            Some(err) if err.is_cancelled() => {
                warn!("run cancelled");
                output.eprintln(&theme.format_warning("Run cancelled"));
                Ok(CommandResult::failure(EXIT_CANCELLED))
            }
            Some(err) => {
                output.eprintln(&theme.format_error(&err.to_string()));
                Ok(CommandResult::failure(1))
            }
        }
    }
}
