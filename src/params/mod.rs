//! Deferred parameters shared between steps.
//!
//! - [`DeferredParameters`] - lazy, memoized, environment-overridable store
//! - [`register_parameters`] - feed every step's provided parameters into a store
//! - [`format_parameters`] / [`write_parameters_file`] - `KEY=value` dumps

pub mod deferred;
pub mod writer;

pub use deferred::{register_parameters, DeferredParameters};
pub use writer::{format_parameters, shell_quote, write_parameters_file};
