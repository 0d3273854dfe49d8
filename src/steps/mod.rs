//! Units of pipeline work.
//!
//! - [`Step`] - The contract the graph builder and executor rely on
//! - [`CommandStep`] - Runs a shell command from the pipeline file
//! - [`WriteParametersStep`] - Writes resolved parameters once every
//!   provider has finished
//!
//! # Example
//!
//! ```
//! use pipegraph::config::StepConfig;
//! use pipegraph::params::DeferredParameters;
//! use pipegraph::steps::{CommandStep, Step};
//! use std::collections::HashMap;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let config = StepConfig {
//!     name: "src".to_string(),
//!     command: "make src".to_string(),
//!     ..Default::default()
//! };
//! let params = Arc::new(DeferredParameters::new());
//! let step = CommandStep::from_config(&config, &HashMap::new(), Path::new("."), params);
//!
//! assert_eq!(step.name(), "src");
//! assert!(step.requires().is_empty());
//! ```

pub mod command;
pub mod step;
pub mod write_params;

#[cfg(test)]
pub(crate) mod testing;

pub use command::{steps_from_pipeline, CommandStep};
pub use step::{InputDefinition, ParameterMap, ParameterResolver, Step};
pub use write_params::{WriteParametersStep, WRITE_PARAMETERS_STEP};
