//! Output node configuration.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use super::schema::{ConfigSchema, Constraint, FieldSpec, FieldType};

/// How an output node renders its result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutputFormat {
    /// Plain text.
    #[default]
    Text,
    /// Rendered markdown.
    Markdown,
    /// Pretty-printed JSON.
    Json,
}

/// Configuration of a result display node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Rendering format.
    pub format: OutputFormat,
}

impl OutputConfig {
    /// Returns the form schema for output nodes.
    pub fn schema() -> ConfigSchema {
        let formats = OutputFormat::iter().map(|f| f.to_string()).collect();

        ConfigSchema::new([FieldSpec::new("format", FieldType::Choice)
            .required()
            .with_default(OutputFormat::default().to_string())
            .with_constraint(Constraint::OneOf { values: formats })
            .with_description("How the result is rendered")])
    }
}
