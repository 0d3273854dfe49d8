//! Pipeline definition loading and validation.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use pipegraph::config::{load_pipeline, LinkConfig};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join("pipeline.yml");
//! fs::write(&path, r#"
//! steps:
//!   - name: src
//!     command: make src
//!     creates:
//!       - kind: internal_image
//!         tag: src
//! "#).unwrap();
//!
//! let loaded = load_pipeline(&path).unwrap();
//! assert_eq!(loaded.config.steps[0].creates, vec![LinkConfig::InternalImage { tag: "src".into() }]);
//! ```

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::{load_pipeline, parse_pipeline, pipeline_path, LoadedPipeline, DEFAULT_PIPELINE_FILE};
pub use schema::{LinkConfig, PipelineConfig, ProvidedParameter, StepConfig};
pub use validator::{validate, validate_config, ValidationError};
