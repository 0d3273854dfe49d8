//! Dependency graph of steps.
//!
//! - [`StepLink`] and the matching helpers in [`link`]
//! - [`StepGraph`] / [`StepNode`] built by [`build_graph`] and
//!   [`build_partial_graph`]

pub mod builder;
pub mod link;

pub use builder::{build_graph, build_partial_graph, NodeId, StepGraph, StepNode};
pub use link::{has_all_links, has_any_links, reduce_links, StepLink};
