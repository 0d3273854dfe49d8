//! Pipegraph - capability-driven step graph execution for CI pipelines.
//!
//! Steps declare the links (capabilities) they require and create. The
//! graph builder wires a step under every step that creates something it
//! requires, and the executor runs independent branches concurrently,
//! starting each step as soon as all of its requirements are satisfied.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Pipeline file loading, parsing, and validation
//! - [`error`] - Error types and result aliases
//! - [`graph`] - Links and the step graph builder
//! - [`params`] - Deferred parameters and the parameter-file writer
//! - [`runner`] - Concurrent executor and run reports
//! - [`shell`] - Cancellable shell command execution
//! - [`steps`] - The step contract and concrete steps
//! - [`ui`] - Terminal output
//!
//! # Example
//!
//! ```
//! use pipegraph::config::{LinkConfig, StepConfig};
//! use pipegraph::graph::build_graph;
//! use pipegraph::params::DeferredParameters;
//! use pipegraph::steps::{CommandStep, Step};
//! use std::collections::HashMap;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let params = Arc::new(DeferredParameters::new());
//! let step = |name: &str, requires: Vec<LinkConfig>, creates: Vec<LinkConfig>| -> Arc<dyn Step> {
//!     let config = StepConfig {
//!         name: name.to_string(),
//!         command: "true".to_string(),
//!         requires,
//!         creates,
//!         ..Default::default()
//!     };
//!     Arc::new(CommandStep::from_config(&config, &HashMap::new(), Path::new("."), params.clone()))
//! };
//!
//! let src = LinkConfig::InternalImage { tag: "src".into() };
//! let graph = build_graph(&[
//!     step("src", vec![], vec![src.clone()]),
//!     step("unit", vec![src], vec![]),
//! ]);
//! assert_eq!(graph.render_tree(), "src - src\n  unit - unit\n");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod params;
pub mod runner;
pub mod shell;
pub mod steps;
pub mod ui;

pub use error::{PipegraphError, Result};
