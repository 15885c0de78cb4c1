//! Node type descriptors.

use std::collections::HashSet;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::NodeKind;
use crate::config::ConfigSchema;
use crate::port::{PortDirection, PortSpec};

/// Static description of a node kind: its ports and configuration form.
///
/// Node types are built once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(
    name = "NodeTypeBuilder",
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct NodeType {
    /// Kind this descriptor belongs to.
    pub kind: NodeKind,
    /// Display name, also the default label of new nodes.
    pub name: String,
    /// Short palette description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub description: Option<String>,
    /// Input ports in display order.
    #[serde(default)]
    #[builder(default)]
    pub inputs: Vec<PortSpec>,
    /// Output ports in display order.
    #[serde(default)]
    #[builder(default)]
    pub outputs: Vec<PortSpec>,
    /// Configuration form.
    #[serde(default)]
    #[builder(default)]
    pub schema: ConfigSchema,
}

impl NodeTypeBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.kind.is_none() {
            return Err("kind is required".into());
        }
        if self.name.as_ref().is_none_or(|name| name.trim().is_empty()) {
            return Err("name is required".into());
        }

        for (direction, ports) in [
            (PortDirection::Input, &self.inputs),
            (PortDirection::Output, &self.outputs),
        ] {
            let mut seen = HashSet::new();
            for port in ports.iter().flatten() {
                if !seen.insert(port.id.as_str()) {
                    return Err(format!("duplicate {direction} port `{}`", port.id));
                }
            }
        }

        if let Some(outputs) = &self.outputs
            && outputs.iter().any(|port| port.required || port.multiple)
        {
            return Err("output ports cannot be required or multi-input".into());
        }

        if let Some(schema) = &self.schema {
            let mut seen = HashSet::new();
            for field in schema.fields() {
                if !seen.insert(field.name.as_str()) {
                    return Err(format!("duplicate config field `{}`", field.name));
                }
            }
        }

        Ok(())
    }
}

impl NodeType {
    /// Returns a builder for creating a node type.
    pub fn builder() -> NodeTypeBuilder {
        NodeTypeBuilder::default()
    }

    /// Returns the input port with the given id.
    pub fn input(&self, id: &str) -> Option<&PortSpec> {
        self.inputs.iter().find(|port| port.id == id)
    }

    /// Returns the output port with the given id.
    pub fn output(&self, id: &str) -> Option<&PortSpec> {
        self.outputs.iter().find(|port| port.id == id)
    }

    /// Returns the port with the given id in the given direction.
    pub fn port(&self, direction: PortDirection, id: &str) -> Option<&PortSpec> {
        match direction {
            PortDirection::Input => self.input(id),
            PortDirection::Output => self.output(id),
        }
    }

    /// Returns the input ports that need an incoming edge.
    pub fn required_inputs(&self) -> impl Iterator<Item = &PortSpec> {
        self.inputs.iter().filter(|port| port.required)
    }
}
