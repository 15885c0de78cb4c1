//! Typed connection points on node types.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Semantic tag for the data flowing through a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DataType {
    /// Plain text.
    Text,
    /// Numeric value.
    Number,
    /// Boolean flag.
    Boolean,
    /// Arbitrary JSON document.
    Json,
    /// Wildcard, connects to everything.
    Any,
}

/// Direction of a port relative to its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PortDirection {
    /// Consumes data from an upstream node.
    Input,
    /// Produces data for downstream nodes.
    Output,
}

/// Static description of one port on a node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    /// Port identifier, unique within its node type and direction.
    pub id: String,
    /// Data type carried by the port.
    pub data_type: DataType,
    /// Whether an incoming edge is needed before the workflow can run.
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    /// Whether the port accepts more than one incoming edge.
    #[serde(default, skip_serializing_if = "is_false")]
    pub multiple: bool,
}

impl PortSpec {
    /// Creates an optional, single-producer port.
    pub fn new(id: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id: id.into(),
            data_type,
            required: false,
            multiple: false,
        }
    }

    /// Marks the port as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Allows more than one incoming edge.
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }
}

/// Returns whether an edge may run from `output` to `input`.
///
/// Ports are compatible when their data types match or when either side is
/// [`DataType::Any`]. Coercion rules belong here and nowhere else.
pub fn compatible(output: &PortSpec, input: &PortSpec) -> bool {
    output.data_type == input.data_type
        || output.data_type == DataType::Any
        || input.data_type == DataType::Any
}

const fn is_false(value: &bool) -> bool {
    !*value
}
