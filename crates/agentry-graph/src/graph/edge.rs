//! Edge types for connecting node ports.

use super::{EdgeId, NodeId};

/// A port on a specific node instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortRef {
    /// Node owning the port.
    pub node: NodeId,
    /// Port id on the node's type.
    pub port: String,
}

impl PortRef {
    /// Creates a new port reference.
    pub fn new(node: NodeId, port: impl Into<String>) -> Self {
        Self {
            node,
            port: port.into(),
        }
    }
}

/// A directed connection from an output port to an input port.
///
/// Edges are never mutated; re-routing is a disconnect followed by a connect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Edge identifier.
    pub id: EdgeId,
    /// Producing output port.
    pub source: PortRef,
    /// Consuming input port.
    pub target: PortRef,
}

impl Edge {
    /// Returns whether either endpoint is on `node`.
    pub fn touches(&self, node: NodeId) -> bool {
        self.source.node == node || self.target.node == node
    }

    /// Returns whether this edge ends at the given input port.
    pub fn ends_at(&self, node: NodeId, port: &str) -> bool {
        self.target.node == node && self.target.port == port
    }
}
