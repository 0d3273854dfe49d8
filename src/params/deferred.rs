//! Lazily resolved, memoized parameters with link provenance.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::{PipegraphError, Result};
use crate::graph::{reduce_links, StepLink};
use crate::steps::{ParameterResolver, Step};

#[derive(Default)]
struct Inner {
    resolvers: HashMap<String, ParameterResolver>,
    values: HashMap<String, String>,
    links: HashMap<String, Vec<StepLink>>,
    // Serializes resolution of one name without holding the store lock.
    slots: HashMap<String, Arc<Mutex<()>>>,
}

/// Named values resolved on first use.
///
/// A variable of the same name in the environment always wins over a
/// registered resolver, and such a parameter carries no link provenance.
///
/// The store lock is only held while reading or writing the maps, never
/// while a resolver runs. Resolvers must not call back into the store for
/// their own name.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use std::sync::Arc;
/// use pipegraph::graph::StepLink;
/// use pipegraph::params::DeferredParameters;
///
/// let params = DeferredParameters::with_environment(HashMap::new());
/// params.add("IMAGE", Some(StepLink::internal("bin")), Arc::new(|| Ok("registry/bin:latest".to_string())));
///
/// assert!(params.has("IMAGE"));
/// assert_eq!(params.get("IMAGE").unwrap().as_deref(), Some("registry/bin:latest"));
/// assert_eq!(params.links("IMAGE"), vec![StepLink::internal("bin")]);
/// ```
pub struct DeferredParameters {
    inner: Mutex<Inner>,
    env: Option<HashMap<String, String>>,
}

impl Default for DeferredParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl DeferredParameters {
    /// Create a store that consults the process environment.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            env: None,
        }
    }

    /// Create a store that consults a fixed environment instead of the process one.
    pub fn with_environment(env: HashMap<String, String>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            env: Some(env),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn env_var(&self, name: &str) -> Option<String> {
        match &self.env {
            Some(env) => env.get(name).cloned(),
            None => std::env::var(name).ok(),
        }
    }

    /// Register a resolver and the link that must hold before it is called.
    ///
    /// Ignored once the name has a resolved value.
    pub fn add(&self, name: &str, link: Option<StepLink>, resolver: ParameterResolver) {
        let mut inner = self.lock();
        if inner.values.contains_key(name) {
            debug!(parameter = name, "ignoring resolver for already resolved parameter");
            return;
        }
        inner.resolvers.insert(name.to_string(), resolver);
        match link {
            Some(link) => {
                inner.links.insert(name.to_string(), vec![link]);
            }
            None => {
                inner.links.remove(name);
            }
        }
    }

    /// Seed a known value. No-op when the name already has a resolver or value.
    pub fn set(&self, name: &str, value: impl Into<String>) {
        let mut inner = self.lock();
        if inner.resolvers.contains_key(name) || inner.values.contains_key(name) {
            return;
        }
        inner.values.insert(name.to_string(), value.into());
    }

    /// Resolve a parameter.
    ///
    /// Returns `Ok(None)` when nothing is registered under `name` and the
    /// environment does not define it. Resolver failures are not cached.
    pub fn get(&self, name: &str) -> Result<Option<String>> {
        let (resolver, slot) = {
            let mut inner = self.lock();
            if let Some(value) = inner.values.get(name) {
                return Ok(Some(value.clone()));
            }
            if let Some(value) = self.env_var(name) {
                inner.values.insert(name.to_string(), value.clone());
                return Ok(Some(value));
            }
            let Some(resolver) = inner.resolvers.get(name).cloned() else {
                return Ok(None);
            };
            let slot = Arc::clone(inner.slots.entry(name.to_string()).or_default());
            (resolver, slot)
        };

        let _resolving = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = self.lock().values.get(name) {
            return Ok(Some(value.clone()));
        }

        debug!(parameter = name, "resolving deferred parameter");
        let value = resolver().map_err(|err| PipegraphError::Parameter {
            name: name.to_string(),
            message: err.to_string(),
        })?;
        self.lock().values.insert(name.to_string(), value.clone());
        Ok(Some(value))
    }

    /// Whether a resolver is registered or the environment defines the name.
    pub fn has(&self, name: &str) -> bool {
        self.lock().resolvers.contains_key(name) || self.env_var(name).is_some()
    }

    /// Links a parameter depends on. Empty when the environment overrides it.
    pub fn links(&self, name: &str) -> Vec<StepLink> {
        if self.env_var(name).is_some() {
            return Vec::new();
        }
        self.lock().links.get(name).cloned().unwrap_or_default()
    }

    /// Links of every parameter not overridden by the environment.
    pub fn all_links(&self) -> Vec<StepLink> {
        let by_name: BTreeMap<String, Vec<StepLink>> = self
            .lock()
            .links
            .iter()
            .map(|(name, links)| (name.clone(), links.clone()))
            .collect();

        let links = by_name
            .into_iter()
            .filter(|(name, _)| self.env_var(name).is_none())
            .flat_map(|(_, links)| links)
            .collect();
        reduce_links(links)
    }

    /// Resolve every known parameter.
    pub fn map(&self) -> Result<BTreeMap<String, String>> {
        let mut names: Vec<String> = {
            let inner = self.lock();
            inner
                .resolvers
                .keys()
                .chain(inner.values.keys())
                .cloned()
                .collect()
        };
        names.sort();
        names.dedup();

        let mut resolved = BTreeMap::new();
        for name in names {
            if let Some(value) = self.get(&name)? {
                resolved.insert(name, value);
            }
        }
        Ok(resolved)
    }
}

/// Register every parameter each step provides.
pub fn register_parameters(params: &DeferredParameters, steps: &[Arc<dyn Step>]) {
    for step in steps {
        let (provided, link) = step.provides();
        for (name, resolver) in provided {
            params.add(&name, link.clone(), resolver);
        }
    }
}
