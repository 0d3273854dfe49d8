//! Error types for pipegraph operations.
//!
//! This module defines [`PipegraphError`], the error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Construction errors (unknown or duplicate targets) abort before any
//!   step runs
//! - Step failures may carry auxiliary captured output, exposed through
//!   [`PipegraphError::additional_output`]
//! - A run collects every step failure and folds them with [`aggregate`]
//! - Cancellation is its own variant so callers can tell it apart from a
//!   failing step

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pipegraph operations.
#[derive(Debug, Error)]
pub enum PipegraphError {
    /// Partial graph targets that match no step.
    #[error("the following names were not found: {}", names.join(", "))]
    UnknownTargets { names: Vec<String> },

    /// A partial graph target that was requested twice or is ambiguous.
    #[error("target '{name}' was requested more than once or names several steps")]
    DuplicateTarget { name: String },

    /// Pipeline definition not found at expected location.
    #[error("Pipeline definition not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse the pipeline definition.
    #[error("Failed to parse pipeline at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid pipeline structure or values.
    #[error("Invalid pipeline: {message}")]
    ConfigValidationError { message: String },

    /// Step execution failed.
    #[error("step {step} failed: {message}")]
    StepFailed {
        step: String,
        message: String,
        output: Option<String>,
    },

    /// Shell command failed.
    #[error("command failed with exit code {code:?}: {command}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: Option<String>,
    },

    /// A deferred parameter could not be resolved.
    #[error("could not lazily evaluate deferred parameter {name}: {message}")]
    Parameter { name: String, message: String },

    /// More than one step failed during a run.
    #[error("{}", AggregateDisplay(errors))]
    Aggregate { errors: Vec<PipegraphError> },

    /// The run was cancelled before every scheduled step reported back.
    #[error("execution cancelled")]
    Cancelled,

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipegraphError {
    /// Captured output attached to a failure (process logs and the like).
    pub fn additional_output(&self) -> Option<&str> {
        match self {
            PipegraphError::StepFailed { output, .. }
            | PipegraphError::CommandFailed { output, .. } => output.as_deref(),
            _ => None,
        }
    }

    /// Whether this error is, or contains, a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            PipegraphError::Cancelled => true,
            PipegraphError::Aggregate { errors } => errors.iter().any(|e| e.is_cancelled()),
            _ => false,
        }
    }
}

struct AggregateDisplay<'a>(&'a [PipegraphError]);

impl fmt::Display for AggregateDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors occurred:", self.0.len())?;
        for err in self.0 {
            write!(f, "\n  * {}", err)?;
        }
        Ok(())
    }
}

/// Fold a list of errors: none is success, one is returned as is,
/// several are combined.
pub fn aggregate(mut errors: Vec<PipegraphError>) -> Result<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(PipegraphError::Aggregate { errors }),
    }
}

/// Result type alias for pipegraph operations.
pub type Result<T> = std::result::Result<T, PipegraphError>;
