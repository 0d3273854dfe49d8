//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait and is routed by
//! [`CommandDispatcher`]. Commands share pipeline loading through
//! [`pipeline::PreparedPipeline`].

pub mod dispatcher;
pub mod graph;
pub mod list;
pub mod params;
pub mod pipeline;
pub mod run;

pub use dispatcher::{Command, CommandDispatcher, CommandResult, EXIT_CANCELLED};
