//! Built-in node types available in every editor session.

use super::{NodeKind, NodeType};
use crate::config::{InputConfig, LlmConfig, OutputConfig};
use crate::port::{DataType, PortSpec};

/// Returns the built-in node types in palette order.
pub fn node_types() -> Vec<NodeType> {
    vec![input(), llm(), output()]
}

/// Text entered by the user; the usual entry node.
pub fn input() -> NodeType {
    NodeType {
        kind: NodeKind::Input,
        name: "Input".into(),
        description: Some("Text provided when the agent runs".into()),
        inputs: Vec::new(),
        outputs: vec![PortSpec::new("value", DataType::Text)],
        schema: InputConfig::schema(),
    }
}

/// Language-model completion over a prompt and optional context.
pub fn llm() -> NodeType {
    NodeType {
        kind: NodeKind::Llm,
        name: "LLM".into(),
        description: Some("Generates a completion with a language model".into()),
        inputs: vec![
            PortSpec::new("prompt", DataType::Text).required(),
            PortSpec::new("context", DataType::Text),
        ],
        outputs: vec![PortSpec::new("response", DataType::Text)],
        schema: LlmConfig::schema(),
    }
}

/// Displays whatever reaches it.
pub fn output() -> NodeType {
    NodeType {
        kind: NodeKind::Output,
        name: "Output".into(),
        description: Some("Shows a result to the user".into()),
        inputs: vec![PortSpec::new("value", DataType::Any).required()],
        outputs: Vec::new(),
        schema: OutputConfig::schema(),
    }
}
