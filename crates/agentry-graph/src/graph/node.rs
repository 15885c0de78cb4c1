//! Node instances and their read-only views.

use serde::{Deserialize, Serialize};

use super::NodeId;
use crate::config::NodeConfig;
use crate::port::PortSpec;
use crate::registry::{NodeKind, NodeType};

/// Position of a node in the visual editor.
///
/// A layout hint only; validation never looks at it. Graph mutations reject
/// NaN and infinite coordinates because JSON cannot represent them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Position {
    /// Creates a new position.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns whether both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A node placed on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInstance {
    /// Identifier, unique within the graph.
    pub id: NodeId,
    /// Kind of the node; selects its [`NodeType`].
    pub kind: NodeKind,
    /// User-editable display name.
    pub label: String,
    /// Typed configuration.
    pub config: NodeConfig,
    /// Canvas position.
    pub position: Position,
}

/// Port of a node together with its current number of connections.
#[derive(Debug, Clone, Copy)]
pub struct PortView<'a> {
    /// Static port description.
    pub spec: &'a PortSpec,
    /// Number of edges attached to this port.
    pub connections: usize,
}

impl PortView<'_> {
    /// Returns whether at least one edge is attached.
    pub fn is_connected(&self) -> bool {
        self.connections > 0
    }

    /// Returns whether a required input still lacks a producer.
    pub fn is_missing(&self) -> bool {
        self.spec.required && self.connections == 0
    }
}

/// Read-only view of a node for the rendering layer.
///
/// Combines the instance with its node type's ports so a renderer can draw
/// handles and form fields without per-kind logic.
#[derive(Debug, Clone)]
pub struct NodeView<'a> {
    /// The node instance.
    pub node: &'a NodeInstance,
    /// The node's type descriptor.
    pub node_type: &'a NodeType,
    /// Input ports in display order.
    pub inputs: Vec<PortView<'a>>,
    /// Output ports in display order.
    pub outputs: Vec<PortView<'a>>,
}
