//! Workflow error types.

use thiserror::Error;

use crate::config::ConfigViolation;
use crate::graph::{EdgeId, NodeId};
use crate::port::{DataType, PortDirection};
use crate::registry::NodeKind;
use crate::validate::Finding;

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors that can occur during workflow operations.
///
/// Every variant is recoverable: a failed mutation leaves the graph exactly
/// as it was before the call.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A node type with this kind is already registered.
    #[error("node kind `{0}` is already registered")]
    DuplicateKind(NodeKind),

    /// The kind is not known to the registry.
    #[error("unknown node kind `{0}`")]
    UnknownKind(String),

    /// A configuration value violates the kind's schema.
    #[error("invalid config for `{kind}` field `{field}`: {reason}")]
    InvalidConfig {
        /// Kind whose schema was violated.
        kind: NodeKind,
        /// Offending field name.
        field: String,
        /// Human-readable reason.
        reason: String,
    },

    /// No node with this id exists in the graph.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The referenced port does not exist on the node's type.
    #[error("{direction} port `{port}` not found on node {node_id}")]
    PortNotFound {
        /// Node the port was looked up on.
        node_id: NodeId,
        /// Requested port id.
        port: String,
        /// Direction the port was expected in.
        direction: PortDirection,
    },

    /// A canvas coordinate is NaN or infinite.
    #[error("node position ({x}, {y}) is not finite")]
    InvalidPosition {
        /// Rejected x coordinate.
        x: f32,
        /// Rejected y coordinate.
        y: f32,
    },

    /// No edge with this id exists in the graph.
    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),

    /// The two ports carry incompatible data types.
    #[error("cannot connect `{output}` output to `{input}` input")]
    TypeMismatch {
        /// Data type of the producing port.
        output: DataType,
        /// Data type of the consuming port.
        input: DataType,
    },

    /// The target input already has a producer and accepts only one.
    #[error("input port `{port}` on node {node_id} is already connected")]
    PortOccupied {
        /// Node owning the input port.
        node_id: NodeId,
        /// Occupied port id.
        port: String,
    },

    /// The edge would close a cycle through the listed nodes.
    #[error("connection would create a cycle through {} node(s)", .nodes.len())]
    CycleDetected {
        /// Nodes participating in the cycle.
        nodes: Vec<NodeId>,
    },

    /// A concurrent save advanced the stored revision.
    #[error("revision conflict: expected {expected}, found {actual}")]
    VersionConflict {
        /// Revision the caller last saw.
        expected: u64,
        /// Revision currently stored.
        actual: u64,
    },

    /// No stored workflow with this id.
    #[error("workflow `{0}` not found")]
    WorkflowNotFound(String),

    /// The payload is structurally malformed (e.g. duplicate ids).
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Aggregate validation reported one or more findings.
    #[error("workflow failed validation with {} finding(s)", .0.len())]
    ValidationFailed(Vec<Finding>),

    /// The workflow store could not read or write its backing storage.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The execution backend rejected or failed the run.
    #[error("execution backend error: {0}")]
    Backend(String),
}

impl WorkflowError {
    /// Creates an [`WorkflowError::InvalidConfig`] from a schema violation.
    pub fn invalid_config(kind: NodeKind, violation: ConfigViolation) -> Self {
        Self::InvalidConfig {
            kind,
            field: violation.field,
            reason: violation.reason,
        }
    }
}
