//! Subcommands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use agentry_graph::graph::{NodeId, WorkflowGraph};
use agentry_graph::payload::WorkflowPayload;
use agentry_graph::registry::NodeRegistry;
use agentry_graph::store::WorkflowStore;
use agentry_graph::validate::{ValidationResult, Validator};
use anyhow::Context;
use clap::Subcommand;
use tokio::fs;

use crate::TRACING_TARGET_COMMAND;
use crate::config::StoreConfig;
use crate::store::FileStore;

/// Operations on workflow payload files and the workflow store.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Prints the node palette as JSON.
    Palette,

    /// Checks a workflow payload file and prints every finding.
    Validate {
        /// Payload file to check.
        file: PathBuf,
    },

    /// Rewrites a workflow payload in canonical form.
    Normalize {
        /// Payload file to read.
        file: PathBuf,

        /// Where to write the result; defaults to stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Saves a workflow payload to the store.
    Save {
        /// Workflow id (ASCII letters, digits, `-` and `_`).
        id: String,

        /// Payload file to save.
        file: PathBuf,

        /// Revision the payload was based on; 0 for a new workflow.
        #[arg(long, default_value_t = 0)]
        revision: u64,
    },

    /// Prints a stored workflow together with its revision.
    Show {
        /// Workflow id.
        id: String,
    },
}

impl Command {
    /// Returns the subcommand name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Palette => "palette",
            Self::Validate { .. } => "validate",
            Self::Normalize { .. } => "normalize",
            Self::Save { .. } => "save",
            Self::Show { .. } => "show",
        }
    }

    /// Runs the command.
    pub async fn execute(&self, store: &StoreConfig) -> anyhow::Result<()> {
        let registry = Arc::new(NodeRegistry::builtin());

        match self {
            Self::Palette => {
                let palette = registry.palette().context("failed to export palette")?;
                println!("{}", serde_json::to_string_pretty(&palette)?);
            }
            Self::Validate { file } => {
                let graph = load_graph(file, &registry).await?;
                let result = Validator::new(&registry).validate(&graph);
                report(&graph, &result);
                result
                    .into_result()
                    .with_context(|| format!("{} is not a valid workflow", file.display()))?;
            }
            Self::Normalize { file, output } => {
                let graph = load_graph(file, &registry).await?;
                let json = graph.to_payload().to_json_pretty()?;
                match output {
                    Some(path) => fs::write(path, json + "\n")
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?,
                    None => println!("{json}"),
                }
            }
            Self::Save { id, file, revision } => {
                let payload = read_payload(file).await?;
                let store = FileStore::new(&store.store_dir, registry);
                let revision = store
                    .save(id, *revision, payload)
                    .await
                    .with_context(|| format!("failed to save workflow `{id}`"))?;
                println!("saved `{id}` at revision {revision}");
            }
            Self::Show { id } => {
                let store = FileStore::new(&store.store_dir, registry);
                let stored = store
                    .load(id)
                    .await
                    .with_context(|| format!("failed to load workflow `{id}`"))?;
                println!("{}", serde_json::to_string_pretty(&stored)?);
            }
        }

        Ok(())
    }
}

async fn read_payload(path: &Path) -> anyhow::Result<WorkflowPayload> {
    let json = fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    WorkflowPayload::from_json(&json)
        .with_context(|| format!("{} is not a workflow payload", path.display()))
}

async fn load_graph(path: &Path, registry: &Arc<NodeRegistry>) -> anyhow::Result<WorkflowGraph> {
    let graph = read_payload(path)
        .await?
        .into_graph(Arc::clone(registry))
        .with_context(|| format!("failed to load {}", path.display()))?;

    tracing::debug!(
        target: TRACING_TARGET_COMMAND,
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "workflow loaded"
    );

    Ok(graph)
}

/// Prints one line per finding, prefixed with the affected nodes.
fn report(graph: &WorkflowGraph, result: &ValidationResult) {
    if result.is_valid() {
        println!("workflow is valid");
        return;
    }

    for finding in result.findings() {
        let nodes: Vec<_> = finding
            .nodes()
            .iter()
            .filter_map(|id| describe(graph, *id))
            .collect();
        println!("[{}] {finding}", nodes.join(", "));
    }
}

/// Renders a node as `label (type, N in, M out)`.
fn describe(graph: &WorkflowGraph, id: NodeId) -> Option<String> {
    let node = graph.node(id)?;
    let type_name = graph
        .node_type(id)
        .map_or_else(|| node.kind.to_string(), |node_type| node_type.name.clone());

    Some(format!(
        "{} ({type_name}, {} in, {} out)",
        node.label,
        graph.incoming(id).count(),
        graph.outgoing(id).count()
    ))
}
