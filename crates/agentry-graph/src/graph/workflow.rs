//! Editable workflow graph.

use std::collections::HashMap;
use std::sync::Arc;

use petgraph::Direction;
use petgraph::algo::{astar, toposort};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};

use super::edge::{Edge, PortRef};
use super::metadata::WorkflowMetadata;
use super::node::{NodeInstance, NodeView, PortView, Position};
use super::{EdgeId, NodeId};
use crate::config::{ConfigFields, NodeConfig};
use crate::error::{WorkflowError, WorkflowResult};
use crate::port::{PortDirection, PortSpec, compatible};
use crate::registry::{NodeKind, NodeRegistry, NodeType};

/// Tracing target for graph mutations.
const TRACING_TARGET: &str = "agentry_graph::graph";

#[derive(Debug, Clone)]
struct NodeSlot {
    index: NodeIndex,
    node: NodeInstance,
}

#[derive(Debug, Clone)]
struct EdgeSlot {
    index: EdgeIndex,
    edge: Edge,
}

/// A node removed from the graph together with every edge that was attached
/// to it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    /// The removed node.
    pub node: NodeInstance,
    /// Edges removed along with the node, in insertion order.
    pub edges: Vec<Edge>,
}

/// The nodes and edges of one agent's workflow.
///
/// The graph exclusively owns its nodes and edges and keeps them in insertion
/// order. Node types are looked up in a shared [`NodeRegistry`].
///
/// Every mutation is atomic: it either succeeds with all invariants holding
/// afterwards, or fails and leaves the graph untouched. The invariants are:
/// - every edge connects an existing output port to an existing input port,
/// - connected ports have compatible data types,
/// - an input port has at most one producer unless it accepts multiple,
/// - the graph is acyclic.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    registry: Arc<NodeRegistry>,
    graph: StableDiGraph<NodeId, EdgeId>,
    nodes: HashMap<NodeId, NodeSlot>,
    node_order: Vec<NodeId>,
    edges: HashMap<EdgeId, EdgeSlot>,
    edge_order: Vec<EdgeId>,
    /// Workflow metadata.
    pub metadata: WorkflowMetadata,
}

impl WorkflowGraph {
    /// Creates an empty graph using node types from `registry`.
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self::with_metadata(registry, WorkflowMetadata::default())
    }

    /// Creates an empty graph with metadata.
    pub fn with_metadata(registry: Arc<NodeRegistry>, metadata: WorkflowMetadata) -> Self {
        Self {
            registry,
            graph: StableDiGraph::default(),
            nodes: HashMap::new(),
            node_order: Vec::new(),
            edges: HashMap::new(),
            edge_order: Vec::new(),
            metadata,
        }
    }

    /// Returns the registry this graph resolves node types with.
    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a node of `kind`.
    ///
    /// Unset config fields are filled from the schema defaults. Fails with
    /// [`WorkflowError::UnknownKind`] if the kind is not registered,
    /// [`WorkflowError::InvalidConfig`] if the config violates the schema and
    /// [`WorkflowError::InvalidPosition`] if a coordinate is not finite.
    pub fn add_node(
        &mut self,
        kind: NodeKind,
        config: Option<ConfigFields>,
        position: Position,
    ) -> WorkflowResult<&NodeInstance> {
        self.insert_node(
            NodeId::new(),
            kind,
            None,
            config.unwrap_or_default(),
            position,
        )
    }

    /// Adds a node with a caller-chosen id and label.
    pub(crate) fn insert_node(
        &mut self,
        id: NodeId,
        kind: NodeKind,
        label: Option<String>,
        config: ConfigFields,
        position: Position,
    ) -> WorkflowResult<&NodeInstance> {
        if self.nodes.contains_key(&id) {
            return Err(WorkflowError::InvalidPayload(format!(
                "duplicate node id {id}"
            )));
        }
        check_position(position)?;

        let node_type = self.registry.lookup(kind)?;
        let config = NodeConfig::resolve(kind, &node_type.schema, config)
            .map_err(|violation| WorkflowError::invalid_config(kind, violation))?;
        let label = label.unwrap_or_else(|| node_type.name.clone());

        let index = self.graph.add_node(id);
        self.node_order.push(id);

        tracing::debug!(
            target: TRACING_TARGET,
            node_id = %id,
            kind = %kind,
            "node added"
        );

        let slot = self.nodes.entry(id).or_insert(NodeSlot {
            index,
            node: NodeInstance {
                id,
                kind,
                label,
                config,
                position,
            },
        });
        Ok(&slot.node)
    }

    /// Removes a node and every edge attached to it.
    ///
    /// The cascaded edges are returned so callers can react to the change in
    /// port occupancy.
    pub fn remove_node(&mut self, id: NodeId) -> WorkflowResult<RemovedNode> {
        let slot = self
            .nodes
            .remove(&id)
            .ok_or(WorkflowError::NodeNotFound(id))?;

        let (cascaded, kept): (Vec<EdgeId>, Vec<EdgeId>) =
            self.edge_order.iter().copied().partition(|edge_id| {
                self.edges
                    .get(edge_id)
                    .is_some_and(|edge| edge.edge.touches(id))
            });
        self.edge_order = kept;

        let edges: Vec<Edge> = cascaded
            .into_iter()
            .filter_map(|edge_id| self.edges.remove(&edge_id))
            .map(|slot| slot.edge)
            .collect();

        // Removing the petgraph node drops its attached edges as well.
        self.graph.remove_node(slot.index);
        self.node_order.retain(|node_id| *node_id != id);

        tracing::debug!(
            target: TRACING_TARGET,
            node_id = %id,
            cascaded_edges = edges.len(),
            "node removed"
        );

        Ok(RemovedNode {
            node: slot.node,
            edges,
        })
    }

    /// Applies a partial config update to a node.
    ///
    /// Only the patched fields are validated; all other fields keep their
    /// values. `null` unsets an optional field.
    pub fn update_config(
        &mut self,
        id: NodeId,
        patch: ConfigFields,
    ) -> WorkflowResult<&NodeInstance> {
        let slot = self
            .nodes
            .get_mut(&id)
            .ok_or(WorkflowError::NodeNotFound(id))?;
        let kind = slot.node.kind;
        let node_type = self.registry.lookup(kind)?;

        let fields: Vec<_> = patch.keys().cloned().collect();
        slot.node.config = slot
            .node
            .config
            .patch(&node_type.schema, patch)
            .map_err(|violation| WorkflowError::invalid_config(kind, violation))?;

        tracing::debug!(
            target: TRACING_TARGET,
            node_id = %id,
            fields = ?fields,
            "node config updated"
        );

        Ok(&slot.node)
    }

    /// Changes a node's display label.
    pub fn rename_node(&mut self, id: NodeId, label: impl Into<String>) -> WorkflowResult<()> {
        let slot = self
            .nodes
            .get_mut(&id)
            .ok_or(WorkflowError::NodeNotFound(id))?;
        slot.node.label = label.into();
        Ok(())
    }

    /// Moves a node on the canvas.
    pub fn move_node(&mut self, id: NodeId, position: Position) -> WorkflowResult<()> {
        let slot = self
            .nodes
            .get_mut(&id)
            .ok_or(WorkflowError::NodeNotFound(id))?;
        check_position(position)?;
        slot.node.position = position;
        Ok(())
    }

    /// Connects an output port to an input port.
    ///
    /// Checks, in order: both nodes exist, both ports exist in the right
    /// direction, the data types are compatible, the edge does not close a
    /// cycle, and the input port is free (or accepts multiple producers).
    pub fn connect(&mut self, source: PortRef, target: PortRef) -> WorkflowResult<&Edge> {
        self.insert_edge(EdgeId::new(), source, target)
    }

    /// Connects two ports with a caller-chosen edge id.
    pub(crate) fn insert_edge(
        &mut self,
        id: EdgeId,
        source: PortRef,
        target: PortRef,
    ) -> WorkflowResult<&Edge> {
        if self.edges.contains_key(&id) {
            return Err(WorkflowError::InvalidPayload(format!(
                "duplicate edge id {id}"
            )));
        }

        let (source_index, target_index) = self
            .check_connection(&source, &target)
            .inspect_err(|error| {
                tracing::debug!(
                    target: TRACING_TARGET,
                    source = %source.node,
                    target = %target.node,
                    error = %error,
                    "connection rejected"
                );
            })?;

        let index = self.graph.add_edge(source_index, target_index, id);
        self.edge_order.push(id);

        tracing::debug!(
            target: TRACING_TARGET,
            edge_id = %id,
            source = %source.node,
            source_port = %source.port,
            target = %target.node,
            target_port = %target.port,
            "nodes connected"
        );

        let slot = self.edges.entry(id).or_insert(EdgeSlot {
            index,
            edge: Edge { id, source, target },
        });
        Ok(&slot.edge)
    }

    fn check_connection(
        &self,
        source: &PortRef,
        target: &PortRef,
    ) -> WorkflowResult<(NodeIndex, NodeIndex)> {
        let source_slot = self
            .nodes
            .get(&source.node)
            .ok_or(WorkflowError::NodeNotFound(source.node))?;
        let target_slot = self
            .nodes
            .get(&target.node)
            .ok_or(WorkflowError::NodeNotFound(target.node))?;

        let source_port = self.port_spec(&source_slot.node, PortDirection::Output, &source.port)?;
        let target_port = self.port_spec(&target_slot.node, PortDirection::Input, &target.port)?;

        if !compatible(source_port, target_port) {
            return Err(WorkflowError::TypeMismatch {
                output: source_port.data_type,
                input: target_port.data_type,
            });
        }

        // The new edge closes a cycle iff the source is reachable from the target.
        if let Some(nodes) = self.path_between(target_slot.index, source_slot.index) {
            return Err(WorkflowError::CycleDetected { nodes });
        }

        let occupied = self.edges.values().any(|slot| {
            slot.edge.ends_at(target.node, &target.port)
                && (!target_port.multiple || slot.edge.source == *source)
        });
        if occupied {
            return Err(WorkflowError::PortOccupied {
                node_id: target.node,
                port: target.port.clone(),
            });
        }

        Ok((source_slot.index, target_slot.index))
    }

    fn port_spec(
        &self,
        node: &NodeInstance,
        direction: PortDirection,
        port: &str,
    ) -> WorkflowResult<&PortSpec> {
        self.registry
            .lookup(node.kind)?
            .port(direction, port)
            .ok_or_else(|| WorkflowError::PortNotFound {
                node_id: node.id,
                port: port.to_owned(),
                direction,
            })
    }

    /// Returns the nodes on a directed path from `from` to `to`, if any.
    fn path_between(&self, from: NodeIndex, to: NodeIndex) -> Option<Vec<NodeId>> {
        let (_, path) = astar(&self.graph, from, |index| index == to, |_| 1u32, |_| 0u32)?;
        Some(
            path.into_iter()
                .filter_map(|index| self.graph.node_weight(index).copied())
                .collect(),
        )
    }

    /// Removes an edge.
    pub fn disconnect(&mut self, id: EdgeId) -> WorkflowResult<Edge> {
        let slot = self
            .edges
            .remove(&id)
            .ok_or(WorkflowError::EdgeNotFound(id))?;
        self.graph.remove_edge(slot.index);
        self.edge_order.retain(|edge_id| *edge_id != id);

        tracing::debug!(
            target: TRACING_TARGET,
            edge_id = %id,
            "edge removed"
        );

        Ok(slot.edge)
    }

    /// Returns a node by id.
    pub fn node(&self, id: NodeId) -> Option<&NodeInstance> {
        self.nodes.get(&id).map(|slot| &slot.node)
    }

    /// Iterates over nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeInstance> + '_ {
        self.node_order
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .map(|slot| &slot.node)
    }

    /// Returns an edge by id.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id).map(|slot| &slot.edge)
    }

    /// Iterates over edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edge_order
            .iter()
            .filter_map(|id| self.edges.get(id))
            .map(|slot| &slot.edge)
    }

    /// Iterates over edges ending at `id`.
    pub fn incoming(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.edges().filter(move |edge| edge.target.node == id)
    }

    /// Iterates over edges starting at `id`.
    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.edges().filter(move |edge| edge.source.node == id)
    }

    /// Returns the number of edges attached to a port.
    pub fn connections(&self, id: NodeId, direction: PortDirection, port: &str) -> usize {
        self.edges()
            .filter(|edge| {
                let end = match direction {
                    PortDirection::Input => &edge.target,
                    PortDirection::Output => &edge.source,
                };
                end.node == id && end.port == port
            })
            .count()
    }

    /// Returns the node type of a node.
    pub fn node_type(&self, id: NodeId) -> Option<&NodeType> {
        let node = self.node(id)?;
        self.registry.lookup(node.kind).ok()
    }

    /// Returns nodes without incoming edges, in insertion order.
    pub fn entry_nodes(&self) -> Vec<NodeId> {
        self.node_order
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .filter(|slot| {
                self.graph
                    .neighbors_directed(slot.index, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|slot| slot.node.id)
            .collect()
    }

    /// Returns nodes in topological order.
    pub fn topological_order(&self) -> WorkflowResult<Vec<NodeId>> {
        toposort(&self.graph, None)
            .map(|indices| {
                indices
                    .into_iter()
                    .filter_map(|index| self.graph.node_weight(index).copied())
                    .collect()
            })
            .map_err(|cycle| WorkflowError::CycleDetected {
                nodes: self
                    .graph
                    .node_weight(cycle.node_id())
                    .copied()
                    .into_iter()
                    .collect(),
            })
    }

    /// Returns a read-only view of a node and its ports.
    pub fn view(&self, id: NodeId) -> Option<NodeView<'_>> {
        let node = self.node(id)?;
        let node_type = self.registry.lookup(node.kind).ok()?;

        Some(NodeView {
            node,
            node_type,
            inputs: self.port_views(id, PortDirection::Input, &node_type.inputs),
            outputs: self.port_views(id, PortDirection::Output, &node_type.outputs),
        })
    }

    fn port_views<'a>(
        &'a self,
        id: NodeId,
        direction: PortDirection,
        specs: &'a [PortSpec],
    ) -> Vec<PortView<'a>> {
        specs
            .iter()
            .map(|spec| PortView {
                spec,
                connections: self.connections(id, direction, &spec.id),
            })
            .collect()
    }

    /// Returns the underlying petgraph.
    pub(crate) fn inner(&self) -> &StableDiGraph<NodeId, EdgeId> {
        &self.graph
    }

    /// Adds an edge without any checks.
    #[cfg(test)]
    pub(crate) fn insert_edge_unchecked(&mut self, source: PortRef, target: PortRef) -> EdgeId {
        let id = EdgeId::new();
        let index = self
            .graph
            .add_edge(self.nodes[&source.node].index, self.nodes[&target.node].index, id);
        self.edge_order.push(id);
        self.edges.insert(id, EdgeSlot {
            index,
            edge: Edge { id, source, target },
        });
        id
    }
}

fn check_position(position: Position) -> WorkflowResult<()> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(WorkflowError::InvalidPosition {
            x: position.x,
            y: position.y,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::OutputConfig;
    use crate::payload::WorkflowPayload;
    use crate::port::DataType;
    use crate::registry::builtin;

    fn graph() -> WorkflowGraph {
        WorkflowGraph::new(Arc::new(NodeRegistry::builtin()))
    }

    fn fields(value: serde_json::Value) -> ConfigFields {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn add(graph: &mut WorkflowGraph, kind: NodeKind) -> NodeId {
        graph.add_node(kind, None, Position::default()).unwrap().id
    }

    fn port(node: NodeId, port: &str) -> PortRef {
        PortRef::new(node, port)
    }

    /// Registry whose output node consumes JSON, and accepts many producers.
    fn json_sink_registry() -> Arc<NodeRegistry> {
        let mut registry = NodeRegistry::new();
        registry.register(builtin::input()).unwrap();
        registry.register(builtin::llm()).unwrap();
        registry
            .register(
                NodeType::builder()
                    .with_kind(NodeKind::Output)
                    .with_name("Collector")
                    .with_inputs(vec![
                        PortSpec::new("payload", DataType::Json),
                        PortSpec::new("texts", DataType::Text).multiple(),
                    ])
                    .with_schema(OutputConfig::schema())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        Arc::new(registry)
    }

    #[test]
    fn add_node_fills_defaults_and_label() {
        let mut graph = graph();
        let node = graph
            .add_node(NodeKind::Llm, None, Position::new(10.0, 20.0))
            .unwrap();

        assert_eq!(node.label, "LLM");
        assert_eq!(node.position, Position::new(10.0, 20.0));
        let llm = node.config.as_llm().unwrap();
        assert_eq!(llm.temperature, 0.7);
        assert_eq!(llm.max_tokens, 1024);
    }

    #[test]
    fn add_node_rejects_unregistered_kind() {
        let mut registry = NodeRegistry::new();
        registry.register(builtin::input()).unwrap();
        let mut graph = WorkflowGraph::new(Arc::new(registry));

        let err = graph
            .add_node(NodeKind::Llm, None, Position::default())
            .unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownKind(_)));
        assert!(graph.is_empty());
    }

    #[test]
    fn add_node_rejects_invalid_config() {
        let mut graph = graph();
        let err = graph
            .add_node(
                NodeKind::Llm,
                Some(fields(json!({ "temperature": 5.0 }))),
                Position::default(),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::InvalidConfig { kind: NodeKind::Llm, ref field, .. } if field == "temperature"
        ));
        assert!(graph.is_empty());
        assert_eq!(graph.inner().node_count(), 0);
    }

    #[test]
    fn input_to_llm_scenario() {
        let mut graph = graph();
        let n1 = add(&mut graph, NodeKind::Input);
        let n2 = add(&mut graph, NodeKind::Llm);

        graph.connect(port(n1, "value"), port(n2, "prompt")).unwrap();

        let err = graph
            .connect(port(n2, "response"), port(n2, "prompt"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::CycleDetected { ref nodes } if nodes == &[n2]));
        let err = graph
            .connect(port(n2, "response"), port(n2, "context"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::CycleDetected { .. }));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn connect_rejects_transitive_cycle() {
        let mut graph = graph();
        let n1 = add(&mut graph, NodeKind::Llm);
        let n2 = add(&mut graph, NodeKind::Llm);
        let n3 = add(&mut graph, NodeKind::Llm);

        graph.connect(port(n1, "response"), port(n2, "prompt")).unwrap();
        graph.connect(port(n2, "response"), port(n3, "prompt")).unwrap();

        let err = graph
            .connect(port(n3, "response"), port(n1, "prompt"))
            .unwrap_err();
        assert!(
            matches!(err, WorkflowError::CycleDetected { ref nodes } if nodes == &[n1, n2, n3])
        );
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn connect_rejects_type_mismatch() {
        let mut graph = WorkflowGraph::new(json_sink_registry());
        let input = add(&mut graph, NodeKind::Input);
        let sink = add(&mut graph, NodeKind::Output);

        let err = graph
            .connect(port(input, "value"), port(sink, "payload"))
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::TypeMismatch {
                output: DataType::Text,
                input: DataType::Json
            }
        ));
    }

    #[test]
    fn connect_accepts_any_port() {
        let mut graph = graph();
        let llm = add(&mut graph, NodeKind::Llm);
        let output = add(&mut graph, NodeKind::Output);

        assert!(graph.connect(port(llm, "response"), port(output, "value")).is_ok());
    }

    #[test]
    fn connect_rejects_occupied_port() {
        let mut graph = graph();
        let a = add(&mut graph, NodeKind::Input);
        let b = add(&mut graph, NodeKind::Input);
        let llm = add(&mut graph, NodeKind::Llm);

        graph.connect(port(a, "value"), port(llm, "prompt")).unwrap();
        let err = graph
            .connect(port(b, "value"), port(llm, "prompt"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::PortOccupied { ref port, .. } if port == "prompt"));

        // Fan-out from a single output is fine.
        graph.connect(port(a, "value"), port(llm, "context")).unwrap();
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn multi_input_port_accepts_many_producers() {
        let mut graph = WorkflowGraph::new(json_sink_registry());
        let a = add(&mut graph, NodeKind::Input);
        let b = add(&mut graph, NodeKind::Input);
        let sink = add(&mut graph, NodeKind::Output);

        graph.connect(port(a, "value"), port(sink, "texts")).unwrap();
        graph.connect(port(b, "value"), port(sink, "texts")).unwrap();
        assert_eq!(graph.connections(sink, PortDirection::Input, "texts"), 2);

        let err = graph
            .connect(port(a, "value"), port(sink, "texts"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::PortOccupied { .. }));
    }

    #[test]
    fn connect_reports_missing_endpoints() {
        let mut graph = graph();
        let input = add(&mut graph, NodeKind::Input);
        let llm = add(&mut graph, NodeKind::Llm);
        let ghost = NodeId::new();

        assert!(matches!(
            graph.connect(port(ghost, "value"), port(llm, "prompt")),
            Err(WorkflowError::NodeNotFound(id)) if id == ghost
        ));
        assert!(matches!(
            graph.connect(port(input, "value"), port(llm, "query")),
            Err(WorkflowError::PortNotFound { direction: PortDirection::Input, .. })
        ));
        // Input ports cannot act as sources.
        assert!(matches!(
            graph.connect(port(llm, "prompt"), port(llm, "context")),
            Err(WorkflowError::PortNotFound { direction: PortDirection::Output, .. })
        ));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn remove_node_cascades_to_edges() {
        let mut graph = graph();
        let input = add(&mut graph, NodeKind::Input);
        let llm = add(&mut graph, NodeKind::Llm);
        let output = add(&mut graph, NodeKind::Output);

        let first = graph.connect(port(input, "value"), port(llm, "prompt")).unwrap().id;
        let second = graph.connect(port(llm, "response"), port(output, "value")).unwrap().id;

        let removed = graph.remove_node(llm).unwrap();
        assert_eq!(removed.node.id, llm);
        let ids: Vec<_> = removed.edges.iter().map(|edge| edge.id).collect();
        assert_eq!(ids, [first, second]);

        assert_eq!(graph.edge_count(), 0);
        assert!(graph.edges().all(|edge| !edge.touches(llm)));
        assert_eq!(graph.inner().edge_count(), 0);
        let order: Vec<_> = graph.nodes().map(|node| node.id).collect();
        assert_eq!(order, [input, output]);

        assert!(matches!(
            graph.remove_node(llm),
            Err(WorkflowError::NodeNotFound(_))
        ));
    }

    #[test]
    fn update_config_rejects_out_of_range_temperature() {
        let mut graph = graph();
        let llm = add(&mut graph, NodeKind::Llm);
        let before = graph.node(llm).unwrap().config.clone();

        let err = graph
            .update_config(llm, fields(json!({ "temperature": 5.0 })))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidConfig { .. }));
        assert_eq!(graph.node(llm).unwrap().config, before);
    }

    #[test]
    fn update_config_keeps_other_fields() {
        let mut graph = graph();
        let llm = graph
            .add_node(
                NodeKind::Llm,
                Some(fields(json!({ "model": "claude-sonnet", "max_tokens": 256 }))),
                Position::default(),
            )
            .unwrap()
            .id;

        let node = graph
            .update_config(llm, fields(json!({ "temperature": 0.2 })))
            .unwrap();
        let config = node.config.as_llm().unwrap();
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.model, "claude-sonnet");
        assert_eq!(config.max_tokens, 256);
    }

    #[test]
    fn disconnect_removes_edge_once() {
        let mut graph = graph();
        let input = add(&mut graph, NodeKind::Input);
        let llm = add(&mut graph, NodeKind::Llm);
        let edge = graph.connect(port(input, "value"), port(llm, "prompt")).unwrap().id;

        let removed = graph.disconnect(edge).unwrap();
        assert_eq!(removed.source.node, input);
        assert_eq!(graph.connections(llm, PortDirection::Input, "prompt"), 0);
        assert!(matches!(
            graph.disconnect(edge),
            Err(WorkflowError::EdgeNotFound(id)) if id == edge
        ));

        // The freed port can be connected again.
        assert!(graph.connect(port(input, "value"), port(llm, "prompt")).is_ok());
    }

    #[test]
    fn topological_order_follows_edges() {
        let mut graph = graph();
        let output = add(&mut graph, NodeKind::Output);
        let llm = add(&mut graph, NodeKind::Llm);
        let input = add(&mut graph, NodeKind::Input);

        graph.connect(port(input, "value"), port(llm, "prompt")).unwrap();
        graph.connect(port(llm, "response"), port(output, "value")).unwrap();

        assert_eq!(graph.topological_order().unwrap(), [input, llm, output]);
        assert_eq!(graph.entry_nodes(), [input]);
    }

    #[test]
    fn view_reports_port_occupancy() {
        let mut graph = graph();
        let input = add(&mut graph, NodeKind::Input);
        let llm = add(&mut graph, NodeKind::Llm);
        graph.connect(port(input, "value"), port(llm, "context")).unwrap();

        let view = graph.view(llm).unwrap();
        assert_eq!(view.node_type.kind, NodeKind::Llm);
        let prompt = &view.inputs[0];
        assert!(prompt.is_missing());
        let context = &view.inputs[1];
        assert!(context.is_connected());
        assert!(!view.outputs[0].is_connected());
    }

    #[test]
    fn rename_and_move_node() {
        let mut graph = graph();
        let input = add(&mut graph, NodeKind::Input);

        graph.rename_node(input, "Question").unwrap();
        graph.move_node(input, Position::new(1.5, -3.0)).unwrap();

        let node = graph.node(input).unwrap();
        assert_eq!(node.label, "Question");
        assert_eq!(node.position, Position::new(1.5, -3.0));
        assert!(graph.rename_node(NodeId::new(), "x").is_err());
    }

    #[test]
    fn non_finite_positions_are_rejected() {
        let mut graph = graph();
        let input = add(&mut graph, NodeKind::Input);
        graph.move_node(input, Position::new(40.0, 80.0)).unwrap();

        let err = graph
            .move_node(input, Position::new(f32::NAN, f32::INFINITY))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidPosition { .. }));
        assert_eq!(graph.node(input).unwrap().position, Position::new(40.0, 80.0));

        let err = graph
            .add_node(NodeKind::Output, None, Position::new(0.0, f32::NEG_INFINITY))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidPosition { .. }));
        assert_eq!(graph.node_count(), 1);

        let json = graph.to_payload().to_json().unwrap();
        let reloaded = WorkflowPayload::from_json(&json).unwrap();
        assert_eq!(reloaded.nodes[0].position, Position::new(40.0, 80.0));
    }

    #[test]
    fn incoming_and_outgoing_edges() {
        let mut graph = graph();
        let input = add(&mut graph, NodeKind::Input);
        let llm = add(&mut graph, NodeKind::Llm);
        let output = add(&mut graph, NodeKind::Output);
        let prompt = graph.connect(port(input, "value"), port(llm, "prompt")).unwrap().id;
        let context = graph.connect(port(input, "value"), port(llm, "context")).unwrap().id;
        let result = graph.connect(port(llm, "response"), port(output, "value")).unwrap().id;

        let ids = |edges: Vec<&Edge>| edges.into_iter().map(|edge| edge.id).collect::<Vec<_>>();
        assert_eq!(ids(graph.incoming(llm).collect()), [prompt, context]);
        assert_eq!(ids(graph.outgoing(llm).collect()), [result]);
        assert_eq!(ids(graph.outgoing(input).collect()), [prompt, context]);
        assert_eq!(graph.incoming(input).count(), 0);

        assert_eq!(graph.node_type(llm).unwrap().name, "LLM");
        assert!(graph.node_type(NodeId::new()).is_none());
    }
}
