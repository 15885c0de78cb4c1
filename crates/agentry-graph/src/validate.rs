//! Aggregate workflow validation.
//!
//! Mutations on [`WorkflowGraph`] already keep the structural invariants. The
//! [`Validator`] checks what a graph needs before it can be saved or run, and
//! re-checks node configs against the registry so schema drift is caught.
//! Every problem is recorded; validation never stops at the first one.

use std::collections::{HashMap, HashSet};

use derive_more::Display;
use petgraph::Direction;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::visit::Dfs;
use serde::{Deserialize, Serialize};

use crate::error::{WorkflowError, WorkflowResult};
use crate::graph::{NodeId, WorkflowGraph};
use crate::port::PortDirection;
use crate::registry::{NodeKind, NodeRegistry};

/// Tracing target for validation.
const TRACING_TARGET: &str = "agentry_graph::validate";

/// A single problem found by the [`Validator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Finding {
    /// The node's kind is not in the registry.
    #[display("node {node_id}: unknown kind `{kind}`")]
    UnknownKind {
        /// Affected node.
        node_id: NodeId,
        /// Unregistered kind.
        kind: NodeKind,
    },
    /// A config field no longer satisfies the kind's schema.
    #[display("node {node_id}: field `{field}` {reason}")]
    InvalidConfig {
        /// Affected node.
        node_id: NodeId,
        /// Offending field.
        field: String,
        /// Human-readable reason.
        reason: String,
    },
    /// A required input port has no producer.
    #[display("node {node_id}: required input `{port}` is not connected")]
    MissingRequiredInput {
        /// Affected node.
        node_id: NodeId,
        /// Unconnected port.
        port: String,
    },
    /// No entry node reaches this node.
    #[display("node {node_id} is unreachable from any entry node")]
    UnreachableNode {
        /// Affected node.
        node_id: NodeId,
    },
    /// These nodes form a cycle.
    #[display("cycle through {} node(s)", nodes.len())]
    CycleDetected {
        /// Participating nodes, in insertion order.
        nodes: Vec<NodeId>,
    },
}

impl Finding {
    /// Returns the nodes this finding should be annotated on.
    pub fn nodes(&self) -> &[NodeId] {
        match self {
            Self::UnknownKind { node_id, .. }
            | Self::InvalidConfig { node_id, .. }
            | Self::MissingRequiredInput { node_id, .. }
            | Self::UnreachableNode { node_id } => std::slice::from_ref(node_id),
            Self::CycleDetected { nodes } => nodes,
        }
    }
}

/// Outcome of validating a workflow graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// No findings; the workflow may be saved and run.
    Valid,
    /// One or more findings; saving and running must be refused.
    Invalid(Vec<Finding>),
}

impl ValidationResult {
    /// Builds a result from collected findings.
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        if findings.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(findings)
        }
    }

    /// Returns whether there are no findings.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns all findings.
    pub fn findings(&self) -> &[Finding] {
        match self {
            Self::Valid => &[],
            Self::Invalid(findings) => findings,
        }
    }

    /// Returns the findings annotated on `node`.
    pub fn findings_for(&self, node: NodeId) -> impl Iterator<Item = &Finding> {
        self.findings()
            .iter()
            .filter(move |finding| finding.nodes().contains(&node))
    }

    /// Converts an invalid result into [`WorkflowError::ValidationFailed`].
    pub fn into_result(self) -> WorkflowResult<()> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(findings) => Err(WorkflowError::ValidationFailed(findings)),
        }
    }
}

/// Checks workflow graphs against a registry.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    registry: &'a NodeRegistry,
}

impl<'a> Validator<'a> {
    /// Creates a validator using the node types in `registry`.
    pub fn new(registry: &'a NodeRegistry) -> Self {
        Self { registry }
    }

    /// Validates `graph`, collecting every finding.
    ///
    /// Runs, in order: config re-check, required-input coverage,
    /// reachability from entry nodes, and acyclicity.
    pub fn validate(&self, graph: &WorkflowGraph) -> ValidationResult {
        let mut findings = Vec::new();

        self.check_configs(graph, &mut findings);
        self.check_required_inputs(graph, &mut findings);
        Self::check_reachability(graph, &mut findings);
        Self::check_acyclic(graph, &mut findings);

        tracing::info!(
            target: TRACING_TARGET,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            findings = findings.len(),
            "workflow validated"
        );

        ValidationResult::from_findings(findings)
    }

    fn check_configs(&self, graph: &WorkflowGraph, findings: &mut Vec<Finding>) {
        for node in graph.nodes() {
            let Ok(node_type) = self.registry.lookup(node.kind) else {
                findings.push(Finding::UnknownKind {
                    node_id: node.id,
                    kind: node.kind,
                });
                continue;
            };

            let violations = node_type.schema.check_all(&node.config.to_fields());
            findings.extend(violations.into_iter().map(|violation| Finding::InvalidConfig {
                node_id: node.id,
                field: violation.field,
                reason: violation.reason,
            }));
        }
    }

    fn check_required_inputs(&self, graph: &WorkflowGraph, findings: &mut Vec<Finding>) {
        for node in graph.nodes() {
            let Ok(node_type) = self.registry.lookup(node.kind) else {
                continue;
            };

            for port in node_type.required_inputs() {
                let producers = graph.connections(node.id, PortDirection::Input, &port.id);
                let covered = if port.multiple {
                    producers >= 1
                } else {
                    producers == 1
                };

                if !covered {
                    findings.push(Finding::MissingRequiredInput {
                        node_id: node.id,
                        port: port.id.clone(),
                    });
                }
            }
        }
    }

    fn check_reachability(graph: &WorkflowGraph, findings: &mut Vec<Finding>) {
        let inner = graph.inner();
        let mut reached = HashSet::new();
        let mut dfs = Dfs::empty(inner);

        let entries = inner.node_indices().filter(|&index| {
            inner
                .neighbors_directed(index, Direction::Incoming)
                .next()
                .is_none()
        });
        for entry in entries {
            dfs.move_to(entry);
            while let Some(index) = dfs.next(inner) {
                if let Some(id) = inner.node_weight(index) {
                    reached.insert(*id);
                }
            }
        }

        findings.extend(
            graph
                .nodes()
                .filter(|node| !reached.contains(&node.id))
                .map(|node| Finding::UnreachableNode { node_id: node.id }),
        );
    }

    fn check_acyclic(graph: &WorkflowGraph, findings: &mut Vec<Finding>) {
        let inner = graph.inner();
        if toposort(inner, None).is_ok() {
            return;
        }

        let order: HashMap<NodeId, usize> = graph
            .nodes()
            .enumerate()
            .map(|(position, node)| (node.id, position))
            .collect();

        for component in tarjan_scc(inner) {
            let cyclic = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&index| inner.contains_edge(index, index));
            if !cyclic {
                continue;
            }

            let mut nodes: Vec<NodeId> = component
                .into_iter()
                .filter_map(|index| inner.node_weight(index).copied())
                .collect();
            nodes.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
            findings.push(Finding::CycleDetected { nodes });
        }
    }
}
