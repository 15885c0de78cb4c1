//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types for ergonomic imports:
//!
//! ```rust
//! use agentry_graph::prelude::*;
//! ```

pub use crate::config::{ConfigFields, ConfigSchema, NodeConfig};
pub use crate::error::{WorkflowError, WorkflowResult};
pub use crate::graph::{
    Edge, EdgeId, NodeId, NodeInstance, NodeView, PortRef, Position, WorkflowGraph,
    WorkflowMetadata,
};
pub use crate::payload::WorkflowPayload;
pub use crate::port::{DataType, PortDirection, PortSpec};
pub use crate::registry::{NodeKind, NodeRegistry, NodeType};
pub use crate::run::{ExecutionBackend, NodeRunStatus, RunReport, RunRequest};
pub use crate::store::{MemoryStore, WorkflowStore};
pub use crate::validate::{Finding, ValidationResult, Validator};
