//! Steps backed by a shell command from the pipeline file.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{LoadedPipeline, ProvidedParameter, StepConfig};
use crate::error::{PipegraphError, Result};
use crate::graph::{reduce_links, StepLink};
use crate::params::DeferredParameters;
use crate::shell::{execute, execute_check, CommandOptions};
use crate::steps::{InputDefinition, ParameterMap, ParameterResolver, Step};

/// A step that runs one shell command.
///
/// Deferred parameters listed in `parameters` are resolved right before the
/// command starts and exported into its environment. Their provenance links
/// become additional requirements, so the step is only scheduled once the
/// steps that make those values available have finished.
pub struct CommandStep {
    name: String,
    description: String,
    command: String,
    requires: Vec<StepLink>,
    creates: Vec<StepLink>,
    parameters: Vec<String>,
    provides: BTreeMap<String, ProvidedParameter>,
    provides_link: Option<StepLink>,
    done_check: Option<String>,
    env: BTreeMap<String, String>,
    timeout: Option<Duration>,
    root: PathBuf,
    params: Arc<DeferredParameters>,
    fingerprint: OnceCell<InputDefinition>,
}

impl CommandStep {
    /// Build a step from its pipeline entry.
    ///
    /// `pipeline_env` is layered under the step's own `env`.
    pub fn from_config(
        config: &StepConfig,
        pipeline_env: &HashMap<String, String>,
        root: &Path,
        params: Arc<DeferredParameters>,
    ) -> Self {
        let mut env: BTreeMap<String, String> = pipeline_env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        env.extend(config.env.iter().map(|(k, v)| (k.clone(), v.clone())));

        Self {
            name: config.name.clone(),
            description: config
                .description
                .clone()
                .unwrap_or_else(|| config.name.clone()),
            command: config.command.clone(),
            requires: config.requires.iter().map(StepLink::from).collect(),
            creates: config.creates.iter().map(StepLink::from).collect(),
            parameters: config.parameters.clone(),
            provides: config
                .provides
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            provides_link: config.provides_link.as_ref().map(StepLink::from),
            done_check: config.done_check.clone(),
            env,
            timeout: config.timeout.map(Duration::from_secs),
            root: root.to_path_buf(),
            params,
            fingerprint: OnceCell::new(),
        }
    }

    fn options(&self, extra: HashMap<String, String>) -> CommandOptions {
        let mut env: HashMap<String, String> = self
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        env.extend(extra);
        CommandOptions {
            cwd: Some(self.root.clone()),
            env,
            timeout: self.timeout,
        }
    }

    /// Resolve consumed parameters on the blocking pool.
    async fn resolve_parameters(&self) -> Result<HashMap<String, String>> {
        if self.parameters.is_empty() {
            return Ok(HashMap::new());
        }
        let params = Arc::clone(&self.params);
        let names = self.parameters.clone();
        tokio::task::spawn_blocking(move || resolve_all(&params, &names))
            .await
            .map_err(anyhow::Error::from)?
    }

    fn compute_fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.command.as_bytes());
        for (key, value) in &self.env {
            hasher.update(b"\0");
            hasher.update(key.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
        }
        for name in &self.parameters {
            hasher.update(b"\0$");
            hasher.update(name.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

fn resolve_all(params: &DeferredParameters, names: &[String]) -> Result<HashMap<String, String>> {
    let mut values = HashMap::with_capacity(names.len());
    for name in names {
        let value = params.get(name)?.ok_or_else(|| PipegraphError::Parameter {
            name: name.clone(),
            message: "no step provides it and it is not set in the environment".to_string(),
        })?;
        values.insert(name.clone(), value);
    }
    Ok(values)
}

fn literal_resolver(value: String) -> ParameterResolver {
    Arc::new(move || Ok(value.clone()))
}

fn file_resolver(path: PathBuf) -> ParameterResolver {
    Arc::new(move || {
        let content = fs::read_to_string(&path)?;
        Ok(content.trim_end().to_string())
    })
}

#[async_trait]
impl Step for CommandStep {
    async fn inputs(&self, cancel: &CancellationToken, _dry_run: bool) -> Result<InputDefinition> {
        if cancel.is_cancelled() {
            return Err(PipegraphError::Cancelled);
        }
        let inputs = self
            .fingerprint
            .get_or_init(|| async { vec![self.compute_fingerprint()] })
            .await;
        Ok(inputs.clone())
    }

    async fn run(&self, cancel: CancellationToken, dry_run: bool) -> Result<()> {
        if dry_run {
            info!(step = %self.name, "would run: {}", self.command);
            return Ok(());
        }

        let values = self.resolve_parameters().await?;
        let options = self.options(values);
        info!(step = %self.name, "running: {}", self.command);

        let result = execute(&self.command, &options, &cancel).await?;
        debug!(step = %self.name, exit_code = ?result.exit_code, "command finished");
        match result.into_result(&self.command) {
            Ok(_) => Ok(()),
            Err(PipegraphError::CommandFailed { code, output, .. }) => {
                Err(PipegraphError::StepFailed {
                    step: self.name.clone(),
                    message: match code {
                        Some(code) => format!("command exited with code {}", code),
                        None => "command was terminated by a signal".to_string(),
                    },
                    output,
                })
            }
            Err(err) => Err(err),
        }
    }

    async fn done(&self) -> Result<bool> {
        match &self.done_check {
            Some(check) => execute_check(check, &self.options(HashMap::new())).await,
            None => Ok(false),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn requires(&self) -> Vec<StepLink> {
        let mut links = self.requires.clone();
        for name in &self.parameters {
            links.extend(self.params.links(name));
        }
        reduce_links(links)
    }

    fn creates(&self) -> Vec<StepLink> {
        self.creates.clone()
    }

    fn provides(&self) -> (ParameterMap, Option<StepLink>) {
        let mut provided = ParameterMap::new();
        for (name, source) in &self.provides {
            let resolver = match (&source.value, &source.file) {
                (Some(value), _) => literal_resolver(value.clone()),
                (None, Some(file)) => file_resolver(self.root.join(file)),
                (None, None) => continue,
            };
            provided.insert(name.clone(), resolver);
        }
        let link = self
            .provides_link
            .clone()
            .or_else(|| self.creates.first().cloned());
        (provided, link)
    }
}

/// Build one [`CommandStep`] per pipeline entry, in declaration order.
///
/// Pipeline-level `parameters` are seeded into `params` as known values.
pub fn steps_from_pipeline(
    pipeline: &LoadedPipeline,
    params: &Arc<DeferredParameters>,
) -> Vec<Arc<dyn Step>> {
    for (name, value) in &pipeline.config.parameters {
        params.set(name, value.clone());
    }
    pipeline
        .config
        .steps
        .iter()
        .map(|config| {
            Arc::new(CommandStep::from_config(
                config,
                &pipeline.config.env,
                &pipeline.root,
                Arc::clone(params),
            )) as Arc<dyn Step>
        })
        .collect()
}
