//! Configurable in-memory step for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{PipegraphError, Result};
use crate::graph::StepLink;
use crate::steps::{InputDefinition, ParameterMap, ParameterResolver, Step};

pub struct FakeStep {
    name: String,
    description: String,
    requires: Vec<StepLink>,
    creates: Vec<StepLink>,
    provides: ParameterMap,
    provides_link: Option<StepLink>,
    failure: Option<(String, Option<String>)>,
    delay: Duration,
    hang: bool,
    runs: Arc<AtomicUsize>,
    mutated: Arc<AtomicBool>,
}

impl FakeStep {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: format!("{} step", name),
            requires: Vec::new(),
            creates: Vec::new(),
            provides: ParameterMap::new(),
            provides_link: None,
            failure: None,
            delay: Duration::ZERO,
            hang: false,
            runs: Arc::new(AtomicUsize::new(0)),
            mutated: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn requires(mut self, links: Vec<StepLink>) -> Self {
        self.requires = links;
        self
    }

    pub fn creates(mut self, links: Vec<StepLink>) -> Self {
        self.creates = links;
        self
    }

    pub fn provides(mut self, name: &str, link: StepLink, resolver: ParameterResolver) -> Self {
        self.provides.insert(name.to_string(), resolver);
        self.provides_link = Some(link);
        self
    }

    pub fn fails(mut self, message: &str, output: Option<&str>) -> Self {
        self.failure = Some((message.to_string(), output.map(str::to_string)));
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Never finish unless cancelled.
    pub fn hangs(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn runs(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.runs)
    }

    pub fn mutated(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.mutated)
    }

    pub fn into_step(self) -> Arc<dyn Step> {
        Arc::new(self)
    }
}

#[async_trait]
impl Step for FakeStep {
    async fn inputs(&self, _cancel: &CancellationToken, _dry_run: bool) -> Result<InputDefinition> {
        Ok(vec![self.name.clone()])
    }

    async fn run(&self, cancel: CancellationToken, dry_run: bool) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            cancel.cancelled().await;
            return Err(PipegraphError::Cancelled);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some((message, output)) = &self.failure {
            return Err(PipegraphError::StepFailed {
                step: self.name.clone(),
                message: message.clone(),
                output: output.clone(),
            });
        }
        if !dry_run {
            self.mutated.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn done(&self) -> Result<bool> {
        Ok(self.mutated.load(Ordering::SeqCst))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn requires(&self) -> Vec<StepLink> {
        self.requires.clone()
    }

    fn creates(&self) -> Vec<StepLink> {
        self.creates.clone()
    }

    fn provides(&self) -> (ParameterMap, Option<StepLink>) {
        (self.provides.clone(), self.provides_link.clone())
    }
}
