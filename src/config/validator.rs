//! Pipeline validation rules.
//!
//! - Step names must be non-empty and unique
//! - Commands must be non-empty
//! - A provided parameter sets exactly one of `value` and `file`
//! - A parameter is either set at pipeline level or provided by a step

use crate::config::schema::PipelineConfig;
use crate::error::{PipegraphError, Result};
use std::collections::{HashMap, HashSet};

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
}

/// Validate a pipeline and return all errors.
pub fn validate_config(config: &PipelineConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    let mut provided: HashMap<&str, &str> = HashMap::new();

    for (index, step) in config.steps.iter().enumerate() {
        if step.name.trim().is_empty() {
            errors.push(ValidationError {
                rule: "missing-name".to_string(),
                message: format!("Step #{} has no name", index + 1),
            });
        } else if !seen.insert(step.name.as_str()) {
            errors.push(ValidationError {
                rule: "duplicate-name".to_string(),
                message: format!("Step '{}' is defined more than once", step.name),
            });
        }

        if step.command.trim().is_empty() {
            errors.push(ValidationError {
                rule: "missing-command".to_string(),
                message: format!("Step '{}' must have a 'command'", step.name),
            });
        }

        for (param, source) in &step.provides {
            if source.value.is_some() == source.file.is_some() {
                errors.push(ValidationError {
                    rule: "provided-parameter-source".to_string(),
                    message: format!(
                        "Parameter '{}' of step '{}' must set exactly one of 'value' or 'file'",
                        param, step.name
                    ),
                });
            }
            if let Some(first) = provided.insert(param.as_str(), step.name.as_str()) {
                errors.push(ValidationError {
                    rule: "duplicate-parameter".to_string(),
                    message: format!(
                        "Parameter '{}' is provided by both '{}' and '{}'",
                        param, first, step.name
                    ),
                });
            }
            if config.parameters.contains_key(param) {
                errors.push(ValidationError {
                    rule: "parameter-source-conflict".to_string(),
                    message: format!(
                        "Parameter '{}' is set in 'parameters' and provided by step '{}'",
                        param, step.name
                    ),
                });
            }
        }
    }

    errors
}

/// Validate a pipeline, failing on the first batch of errors.
pub fn validate(config: &PipelineConfig) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        return Ok(());
    }
    let message = errors
        .iter()
        .map(|e| format!("{} [{}]", e.message, e.rule))
        .collect::<Vec<_>>()
        .join("; ");
    Err(PipegraphError::ConfigValidationError { message })
}
