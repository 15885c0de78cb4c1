//! Hand-off of validated workflows to an execution backend.
//!
//! The graph model never executes anything itself. A [`RunRequest`] is an
//! owned snapshot of a validated graph; the [`ExecutionBackend`] runs it and
//! reports a [`NodeRunStatus`] per node, which the editor shows next to the
//! corresponding node.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{WorkflowError, WorkflowResult};
use crate::graph::{NodeId, WorkflowGraph};
use crate::payload::WorkflowPayload;
use crate::registry::NodeKind;
use crate::validate::Validator;

/// Tracing target for run hand-off.
const TRACING_TARGET: &str = "agentry_graph::run";

/// A validated workflow ready for execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    /// Identifier of this run.
    pub run_id: Uuid,
    /// Workflow snapshot.
    pub payload: WorkflowPayload,
    /// Nodes in a valid execution order.
    pub order: Vec<NodeId>,
    /// Values supplied for input nodes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<NodeId, Value>,
}

impl RunRequest {
    /// Validates `graph` and captures it for execution.
    ///
    /// Fails with [`WorkflowError::ValidationFailed`] if the validator has
    /// any findings.
    pub fn prepare(graph: &WorkflowGraph) -> WorkflowResult<Self> {
        Validator::new(graph.registry())
            .validate(graph)
            .into_result()?;

        let request = Self {
            run_id: Uuid::now_v7(),
            payload: graph.to_payload(),
            order: graph.topological_order()?,
            inputs: BTreeMap::new(),
        };

        tracing::info!(
            target: TRACING_TARGET,
            run_id = %request.run_id,
            nodes = request.order.len(),
            "run prepared"
        );

        Ok(request)
    }

    /// Supplies the value of an input node.
    ///
    /// Fails with [`WorkflowError::NodeNotFound`] if `node` is not an input
    /// node of this workflow.
    pub fn with_input(mut self, node: NodeId, value: impl Into<Value>) -> WorkflowResult<Self> {
        let is_input = self
            .payload
            .nodes
            .iter()
            .any(|record| record.instance_id == node && record.kind == NodeKind::Input.as_ref());
        if !is_input {
            return Err(WorkflowError::NodeNotFound(node));
        }

        self.inputs.insert(node, value.into());
        Ok(self)
    }
}

/// Execution state of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NodeRunStatus {
    /// Not started yet.
    Pending,
    /// Currently executing.
    Running,
    /// Finished with a value.
    Succeeded {
        /// Value produced by the node.
        output: Value,
    },
    /// Finished with an error.
    Failed {
        /// Error shown next to the node.
        message: String,
    },
    /// Not executed because an upstream node failed.
    Skipped,
}

impl NodeRunStatus {
    /// Returns whether the node will not change state anymore.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::Failed { .. } | Self::Skipped
        )
    }
}

/// Per-node results of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Identifier of the run.
    pub run_id: Uuid,
    /// Status of every node, keyed by instance id.
    pub nodes: BTreeMap<NodeId, NodeRunStatus>,
}

impl RunReport {
    /// Creates a report with every node of `request` pending.
    pub fn pending(request: &RunRequest) -> Self {
        Self {
            run_id: request.run_id,
            nodes: request
                .order
                .iter()
                .map(|&node| (node, NodeRunStatus::Pending))
                .collect(),
        }
    }

    /// Records the status of a node.
    pub fn set(&mut self, node: NodeId, status: NodeRunStatus) {
        self.nodes.insert(node, status);
    }

    /// Returns the status of a node.
    pub fn status(&self, node: NodeId) -> Option<&NodeRunStatus> {
        self.nodes.get(&node)
    }

    /// Iterates over failed nodes and their messages.
    pub fn failures(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.nodes.iter().filter_map(|(&node, status)| match status {
            NodeRunStatus::Failed { message } => Some((node, message.as_str())),
            _ => None,
        })
    }

    /// Returns whether every node succeeded.
    pub fn is_success(&self) -> bool {
        self.nodes
            .values()
            .all(|status| matches!(status, NodeRunStatus::Succeeded { .. }))
    }
}

/// Executes prepared workflows.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Runs `request` and reports the outcome of every node.
    async fn execute(&self, request: RunRequest) -> WorkflowResult<RunReport>;
}

/// Prepares `graph` and hands it to `backend`.
pub async fn run_workflow<B>(
    backend: &B,
    graph: &WorkflowGraph,
    inputs: impl IntoIterator<Item = (NodeId, Value)>,
) -> WorkflowResult<RunReport>
where
    B: ExecutionBackend + ?Sized,
{
    let mut request = RunRequest::prepare(graph)?;
    for (node, value) in inputs {
        request = request.with_input(node, value)?;
    }

    let run_id = request.run_id;
    let report = backend.execute(request).await?;

    tracing::info!(
        target: TRACING_TARGET,
        run_id = %run_id,
        success = report.is_success(),
        failures = report.failures().count(),
        "run finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::graph::{PortRef, Position};
    use crate::registry::NodeRegistry;

    /// Walks the order echoing upstream values. Empty strings fail.
    struct EchoBackend;

    #[async_trait]
    impl ExecutionBackend for EchoBackend {
        async fn execute(&self, request: RunRequest) -> WorkflowResult<RunReport> {
            let mut report = RunReport::pending(&request);
            let mut failed = HashSet::new();

            for &node in &request.order {
                let upstream: Vec<_> = request
                    .payload
                    .edges
                    .iter()
                    .filter(|edge| edge.target_instance_id == node)
                    .map(|edge| edge.source_instance_id)
                    .collect();

                if upstream.iter().any(|id| failed.contains(id)) {
                    failed.insert(node);
                    report.set(node, NodeRunStatus::Skipped);
                    continue;
                }

                let output = match request.inputs.get(&node) {
                    Some(value) => value.clone(),
                    None => upstream
                        .first()
                        .and_then(|id| match report.status(*id) {
                            Some(NodeRunStatus::Succeeded { output }) => Some(output.clone()),
                            _ => None,
                        })
                        .unwrap_or(Value::Null),
                };

                if output == json!("") {
                    failed.insert(node);
                    report.set(node, NodeRunStatus::Failed {
                        message: "empty prompt".into(),
                    });
                } else {
                    report.set(node, NodeRunStatus::Succeeded { output });
                }
            }

            Ok(report)
        }
    }

    fn pipeline() -> (WorkflowGraph, [NodeId; 3]) {
        let mut graph = WorkflowGraph::new(Arc::new(NodeRegistry::builtin()));
        let mut add = |kind| {
            graph
                .add_node(kind, None, Position::default())
                .unwrap()
                .id
        };
        let ids = [add(NodeKind::Input), add(NodeKind::Llm), add(NodeKind::Output)];
        graph
            .connect(PortRef::new(ids[0], "value"), PortRef::new(ids[1], "prompt"))
            .unwrap();
        graph
            .connect(PortRef::new(ids[1], "response"), PortRef::new(ids[2], "value"))
            .unwrap();
        (graph, ids)
    }

    #[test]
    fn prepare_refuses_invalid_graph() {
        let mut graph = WorkflowGraph::new(Arc::new(NodeRegistry::builtin()));
        graph
            .add_node(NodeKind::Llm, None, Position::default())
            .unwrap();

        let err = RunRequest::prepare(&graph).unwrap_err();
        assert!(matches!(err, WorkflowError::ValidationFailed(_)));
    }

    #[test]
    fn prepare_orders_nodes() {
        let (graph, ids) = pipeline();
        let request = RunRequest::prepare(&graph).unwrap();
        assert_eq!(request.order, ids);
        assert_eq!(request.payload, graph.to_payload());
    }

    #[test]
    fn inputs_only_target_input_nodes() {
        let (graph, [input, llm, _]) = pipeline();
        let request = RunRequest::prepare(&graph).unwrap();

        let err = request.clone().with_input(llm, "hi").unwrap_err();
        assert!(matches!(err, WorkflowError::NodeNotFound(id) if id == llm));

        let request = request.with_input(input, "hi").unwrap();
        assert_eq!(request.inputs[&input], json!("hi"));
    }

    #[tokio::test]
    async fn successful_run_reports_every_node() {
        let (graph, [input, _, output]) = pipeline();
        let report = run_workflow(&EchoBackend, &graph, [(input, json!("hello"))])
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.nodes.len(), 3);
        assert_eq!(
            report.status(output),
            Some(&NodeRunStatus::Succeeded {
                output: json!("hello")
            })
        );
    }

    #[tokio::test]
    async fn failure_skips_downstream_nodes() {
        let (graph, [input, llm, output]) = pipeline();
        let report = run_workflow(&EchoBackend, &graph, [(input, json!(""))])
            .await
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.failures().map(|(id, _)| id).collect::<Vec<_>>(), [input]);
        assert_eq!(report.status(llm), Some(&NodeRunStatus::Skipped));
        assert!(report.status(output).is_some_and(NodeRunStatus::is_terminal));
    }

    #[test]
    fn status_serializes_with_tag() {
        let status = NodeRunStatus::Failed {
            message: "timeout".into(),
        };
        assert_eq!(
            serde_json::to_value(status).unwrap(),
            json!({ "status": "failed", "message": "timeout" })
        );
    }
}
