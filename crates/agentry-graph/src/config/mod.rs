//! Per-kind node configuration.
//!
//! This module provides:
//! - [`ConfigSchema`]: form metadata and validation rules for a node kind
//! - [`NodeConfig`]: the typed configuration of a node instance, one variant
//!   per [`NodeKind`]

mod input;
mod llm;
mod output;
mod schema;

use derive_more::From;
pub use input::InputConfig;
pub use llm::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, LlmConfig};
pub use output::{OutputConfig, OutputFormat};
pub use schema::{ConfigFields, ConfigSchema, ConfigViolation, Constraint, FieldSpec, FieldType};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::registry::NodeKind;

/// Typed configuration of a node instance.
#[derive(Debug, Clone, PartialEq, From)]
pub enum NodeConfig {
    /// Text input node.
    Input(InputConfig),
    /// Language-model completion node.
    Llm(LlmConfig),
    /// Result display node.
    Output(OutputConfig),
}

impl NodeConfig {
    /// Returns the kind this configuration belongs to.
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Input(_) => NodeKind::Input,
            Self::Llm(_) => NodeKind::Llm,
            Self::Output(_) => NodeKind::Output,
        }
    }

    /// Resolves user-supplied fields against `schema` and builds the typed
    /// configuration for `kind`.
    pub fn resolve(
        kind: NodeKind,
        schema: &ConfigSchema,
        supplied: ConfigFields,
    ) -> Result<Self, ConfigViolation> {
        let resolved = schema.resolve(supplied)?;
        Self::from_fields(kind, resolved)
    }

    /// Builds the typed configuration for `kind` from a complete field map.
    pub fn from_fields(kind: NodeKind, fields: ConfigFields) -> Result<Self, ConfigViolation> {
        match kind {
            NodeKind::Input => typed(fields).map(Self::Input),
            NodeKind::Llm => typed(fields).map(Self::Llm),
            NodeKind::Output => typed(fields).map(Self::Output),
        }
    }

    /// Returns the configuration as a field map.
    pub fn to_fields(&self) -> ConfigFields {
        match self {
            Self::Input(config) => untyped(config),
            Self::Llm(config) => untyped(config),
            Self::Output(config) => untyped(config),
        }
    }

    /// Applies a partial update, checking only the patched fields.
    ///
    /// `null` removes an optional field. On failure `self` is unchanged.
    pub fn patch(&self, schema: &ConfigSchema, patch: ConfigFields) -> Result<Self, ConfigViolation> {
        schema.check_patch(&patch)?;

        let mut fields = self.to_fields();
        for (name, value) in patch {
            if value.is_null() {
                fields.remove(&name);
            } else {
                fields.insert(name, value);
            }
        }

        Self::from_fields(self.kind(), fields)
    }

    /// Returns the language-model configuration, if this is one.
    pub fn as_llm(&self) -> Option<&LlmConfig> {
        match self {
            Self::Llm(config) => Some(config),
            _ => None,
        }
    }
}

fn typed<T: DeserializeOwned>(fields: ConfigFields) -> Result<T, ConfigViolation> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|err| ConfigViolation::new("config", err.to_string()))
}

fn untyped<T: Serialize>(config: &T) -> ConfigFields {
    match serde_json::to_value(config) {
        Ok(Value::Object(fields)) => fields,
        _ => ConfigFields::new(),
    }
}
