//! The contract every unit of pipeline work implements.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::graph::StepLink;

/// Ordered identifiers that fingerprint a step's effective inputs.
pub type InputDefinition = Vec<String>;

/// Lazily computes the value of a deferred parameter.
///
/// Resolvers must not call back into the parameter store.
pub type ParameterResolver = Arc<dyn Fn() -> Result<String> + Send + Sync>;

/// Parameters a step can supply, keyed by name.
pub type ParameterMap = HashMap<String, ParameterResolver>;

/// A unit of pipeline work.
///
/// The graph never mutates a step; it only asks it what it requires and
/// creates, and calls [`Step::run`] once its requirements are satisfied.
#[async_trait]
pub trait Step: Send + Sync {
    /// Identifiers describing what this step consumes. May be memoized.
    async fn inputs(&self, cancel: &CancellationToken, dry_run: bool) -> Result<InputDefinition>;

    /// Perform the work. Called at most once per execution.
    async fn run(&self, cancel: CancellationToken, dry_run: bool) -> Result<()>;

    /// Whether the effect of this step already exists.
    async fn done(&self) -> Result<bool>;

    /// Target name. An empty name cannot be targeted by a partial graph.
    fn name(&self) -> &str;

    /// Human description, used as the report entry name.
    fn description(&self) -> &str;

    /// Capabilities that must exist before `run` may be called.
    fn requires(&self) -> Vec<StepLink>;

    /// Capabilities this step establishes once `run` succeeds.
    fn creates(&self) -> Vec<StepLink>;

    /// Parameters this step supplies, and the link that must hold before
    /// their resolvers are safe to call.
    fn provides(&self) -> (ParameterMap, Option<StepLink>);
}
