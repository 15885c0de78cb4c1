//! Persistence payload for workflow graphs.
//!
//! The payload is the JSON document the editor saves and the execution
//! backend receives. Nodes and edges keep their insertion order and config
//! maps have sorted keys, so serializing the same graph twice yields
//! byte-identical output.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ConfigFields;
use crate::error::{WorkflowError, WorkflowResult};
use crate::graph::{
    Edge, EdgeId, NodeId, NodeInstance, PortRef, Position, WorkflowGraph, WorkflowMetadata,
};
use crate::registry::{NodeKind, NodeRegistry};

/// Tracing target for payload conversion.
const TRACING_TARGET: &str = "agentry_graph::payload";

/// Serialized form of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Node identifier.
    pub instance_id: NodeId,
    /// Kind string, resolved against the registry on load.
    pub kind: String,
    /// Display label; defaults to the node type name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Config field map.
    #[serde(default)]
    pub config: ConfigFields,
    /// Canvas position.
    #[serde(default)]
    pub position: Position,
}

impl From<&NodeInstance> for NodeRecord {
    fn from(node: &NodeInstance) -> Self {
        Self {
            instance_id: node.id,
            kind: node.kind.to_string(),
            label: Some(node.label.clone()),
            config: node.config.to_fields(),
            position: node.position,
        }
    }
}

/// Serialized form of one edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    /// Edge identifier; generated on load when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EdgeId>,
    /// Producing node.
    pub source_instance_id: NodeId,
    /// Output port on the producing node.
    pub source_port_id: String,
    /// Consuming node.
    pub target_instance_id: NodeId,
    /// Input port on the consuming node.
    pub target_port_id: String,
}

impl EdgeRecord {
    fn source(&self) -> PortRef {
        PortRef::new(self.source_instance_id, &self.source_port_id)
    }

    fn target(&self) -> PortRef {
        PortRef::new(self.target_instance_id, &self.target_port_id)
    }
}

impl From<&Edge> for EdgeRecord {
    fn from(edge: &Edge) -> Self {
        Self {
            id: Some(edge.id),
            source_instance_id: edge.source.node,
            source_port_id: edge.source.port.clone(),
            target_instance_id: edge.target.node,
            target_port_id: edge.target.port.clone(),
        }
    }
}

/// Complete persisted workflow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPayload {
    /// Nodes in insertion order.
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    /// Edges in insertion order.
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
    /// Workflow metadata.
    #[serde(default)]
    pub metadata: WorkflowMetadata,
}

impl WorkflowPayload {
    /// Captures the current state of `graph`.
    pub fn from_graph(graph: &WorkflowGraph) -> Self {
        Self {
            nodes: graph.nodes().map(NodeRecord::from).collect(),
            edges: graph.edges().map(EdgeRecord::from).collect(),
            metadata: graph.metadata.clone(),
        }
    }

    /// Serializes to compact JSON.
    pub fn to_json(&self) -> WorkflowResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes to indented JSON.
    pub fn to_json_pretty(&self) -> WorkflowResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a payload from JSON.
    pub fn from_json(json: &str) -> WorkflowResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rebuilds a graph from this payload.
    ///
    /// Every node and edge goes through the same checks as interactive
    /// editing, so a payload that loads also satisfies the graph invariants.
    /// The first failure aborts the load.
    pub fn into_graph(self, registry: Arc<NodeRegistry>) -> WorkflowResult<WorkflowGraph> {
        self.check_unique_ids()?;

        let node_count = self.nodes.len();
        let edge_count = self.edges.len();
        let mut graph = WorkflowGraph::with_metadata(registry, self.metadata);

        for record in self.nodes {
            let kind = NodeKind::parse(&record.kind)?;
            graph.insert_node(
                record.instance_id,
                kind,
                record.label,
                record.config,
                record.position,
            )?;
        }

        for record in self.edges {
            let id = record.id.unwrap_or_default();
            graph.insert_edge(id, record.source(), record.target())?;
        }

        tracing::debug!(
            target: TRACING_TARGET,
            nodes = node_count,
            edges = edge_count,
            "workflow loaded from payload"
        );

        Ok(graph)
    }

    fn check_unique_ids(&self) -> WorkflowResult<()> {
        let mut nodes = HashSet::with_capacity(self.nodes.len());
        if let Some(record) = self.nodes.iter().find(|r| !nodes.insert(r.instance_id)) {
            return Err(WorkflowError::InvalidPayload(format!(
                "duplicate node id {}",
                record.instance_id
            )));
        }

        let mut edges = HashSet::with_capacity(self.edges.len());
        if let Some(id) = self.edges.iter().filter_map(|r| r.id).find(|id| !edges.insert(*id)) {
            return Err(WorkflowError::InvalidPayload(format!(
                "duplicate edge id {id}"
            )));
        }

        Ok(())
    }
}

impl From<&WorkflowGraph> for WorkflowPayload {
    fn from(graph: &WorkflowGraph) -> Self {
        Self::from_graph(graph)
    }
}

impl WorkflowGraph {
    /// Captures this graph as a persistence payload.
    pub fn to_payload(&self) -> WorkflowPayload {
        WorkflowPayload::from_graph(self)
    }
}
