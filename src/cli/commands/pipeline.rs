//! Shared pipeline setup for commands.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::config::{load_pipeline, LoadedPipeline};
use crate::error::Result;
use crate::params::{register_parameters, DeferredParameters};
use crate::steps::{steps_from_pipeline, Step};

/// A loaded pipeline with its steps and registered parameters.
pub struct PreparedPipeline {
    pub pipeline: LoadedPipeline,
    pub params: Arc<DeferredParameters>,
    pub steps: Vec<Arc<dyn Step>>,
}

impl PreparedPipeline {
    /// Load `config` and register every parameter its steps provide.
    pub fn load(config: &Path) -> Result<Self> {
        let pipeline = load_pipeline(config)?;
        let params = Arc::new(DeferredParameters::new());
        let steps = steps_from_pipeline(&pipeline, &params);
        register_parameters(&params, &steps);
        debug!(
            steps = steps.len(),
            "loaded pipeline from {}",
            config.display()
        );
        Ok(Self {
            pipeline,
            params,
            steps,
        })
    }

    /// Name used for the report suite.
    pub fn suite_name(&self) -> &str {
        self.pipeline.config.name.as_deref().unwrap_or("pipeline")
    }
}
