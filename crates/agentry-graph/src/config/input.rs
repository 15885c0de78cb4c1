//! Input node configuration.

use serde::{Deserialize, Serialize};

use super::schema::{ConfigSchema, Constraint, FieldSpec, FieldType};

/// Configuration of a user-facing text input node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    /// Hint shown in the empty input box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Value used when the run is started without user input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Whether the input renders as a multi-line text area.
    #[serde(default)]
    pub multiline: bool,
}

impl InputConfig {
    /// Returns the form schema for input nodes.
    pub fn schema() -> ConfigSchema {
        ConfigSchema::new([
            FieldSpec::new("placeholder", FieldType::Text)
                .with_constraint(Constraint::MaxLength { max: 200 })
                .with_description("Hint shown in the empty input box"),
            FieldSpec::new("default_value", FieldType::Text)
                .with_description("Value used when no input is given"),
            FieldSpec::new("multiline", FieldType::Boolean)
                .with_default(false)
                .with_description("Render as a multi-line text area"),
        ])
    }
}
