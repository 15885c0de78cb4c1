#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod config;
mod error;
pub mod graph;
pub mod payload;
pub mod port;
pub mod registry;
pub mod run;
pub mod store;
pub mod validate;

#[doc(hidden)]
pub mod prelude;

pub use error::{WorkflowError, WorkflowResult};

/// Tracing target for workflow graph operations.
pub const TRACING_TARGET: &str = "agentry_graph";
