//! Step that writes every deferred parameter to a file.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{PipegraphError, Result};
use crate::graph::StepLink;
use crate::params::{write_parameters_file, DeferredParameters};
use crate::steps::{InputDefinition, ParameterMap, Step};

/// Target name of the parameter-file step.
pub const WRITE_PARAMETERS_STEP: &str = "parameters";

/// Writes the resolved parameter set as `KEY=value` lines.
///
/// It requires the provenance link of every registered parameter, so it
/// runs only after every provider has finished.
pub struct WriteParametersStep {
    path: PathBuf,
    description: String,
    params: Arc<DeferredParameters>,
}

impl WriteParametersStep {
    pub fn new(path: impl Into<PathBuf>, params: Arc<DeferredParameters>) -> Self {
        let path = path.into();
        Self {
            description: format!("Write parameters to {}", path.display()),
            path,
            params,
        }
    }
}

#[async_trait]
impl Step for WriteParametersStep {
    async fn inputs(&self, _cancel: &CancellationToken, _dry_run: bool) -> Result<InputDefinition> {
        Ok(Vec::new())
    }

    async fn run(&self, cancel: CancellationToken, dry_run: bool) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(PipegraphError::Cancelled);
        }
        if dry_run {
            info!("would write parameters to {}", self.path.display());
            return Ok(());
        }
        write_parameters_file(&self.path, &self.params)?;
        info!("wrote parameters to {}", self.path.display());
        Ok(())
    }

    async fn done(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        WRITE_PARAMETERS_STEP
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn requires(&self) -> Vec<StepLink> {
        self.params.all_links()
    }

    fn creates(&self) -> Vec<StepLink> {
        Vec::new()
    }

    fn provides(&self) -> (ParameterMap, Option<StepLink>) {
        (ParameterMap::new(), None)
    }
}
