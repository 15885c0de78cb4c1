//! Node type registry.
//!
//! The registry maps every [`NodeKind`] to its [`NodeType`]: ports and config
//! schema. It is built once at startup, usually with
//! [`NodeRegistry::builtin`], and then shared read-only (typically behind an
//! `Arc`) with every graph and validator that needs it.

pub mod builtin;
mod kind;
mod node_type;

use std::collections::HashMap;

pub use kind::NodeKind;
pub use node_type::{NodeType, NodeTypeBuilder, NodeTypeBuilderError};
use serde::Serialize;

use crate::error::{WorkflowError, WorkflowResult};

/// Tracing target for registry operations.
const TRACING_TARGET: &str = "agentry_graph::registry";

/// Insertion-ordered collection of node types, keyed by kind.
///
/// Serializes as the palette: a list of node types with their ports and
/// config schemas.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct NodeRegistry {
    types: Vec<NodeType>,
    #[serde(skip)]
    index: HashMap<NodeKind, usize>,
}

impl NodeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in node types.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for node_type in builtin::node_types() {
            registry.push(node_type);
        }
        registry
    }

    /// Registers a node type.
    ///
    /// Fails with [`WorkflowError::DuplicateKind`] if the kind is taken.
    pub fn register(&mut self, node_type: NodeType) -> WorkflowResult<()> {
        if self.index.contains_key(&node_type.kind) {
            return Err(WorkflowError::DuplicateKind(node_type.kind));
        }

        tracing::debug!(
            target: TRACING_TARGET,
            kind = %node_type.kind,
            inputs = node_type.inputs.len(),
            outputs = node_type.outputs.len(),
            fields = node_type.schema.fields().len(),
            "node type registered"
        );

        self.push(node_type);
        Ok(())
    }

    /// Returns the node type registered for `kind`.
    pub fn lookup(&self, kind: NodeKind) -> WorkflowResult<&NodeType> {
        self.index
            .get(&kind)
            .map(|&position| &self.types[position])
            .ok_or_else(|| WorkflowError::UnknownKind(kind.to_string()))
    }

    /// Parses `kind` and returns its node type.
    pub fn lookup_str(&self, kind: &str) -> WorkflowResult<&NodeType> {
        self.lookup(NodeKind::parse(kind)?)
    }

    /// Returns whether `kind` is registered.
    pub fn contains(&self, kind: NodeKind) -> bool {
        self.index.contains_key(&kind)
    }

    /// Iterates over registered node types in registration order.
    ///
    /// The iterator is lazy and can be cloned to restart it.
    pub fn list_all(&self) -> std::slice::Iter<'_, NodeType> {
        self.types.iter()
    }

    /// Serializes the registry as the palette consumed by the form layer.
    pub fn palette(&self) -> WorkflowResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Returns the number of registered node types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns whether no node type is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn push(&mut self, node_type: NodeType) {
        self.index.insert(node_type.kind, self.types.len());
        self.types.push(node_type);
    }
}
