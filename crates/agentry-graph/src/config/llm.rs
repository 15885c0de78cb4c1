//! Language-model node configuration.

use serde::{Deserialize, Serialize};

use super::schema::{ConfigSchema, Constraint, FieldSpec, FieldType};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Completion token limit used when none is configured.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Configuration of a language-model completion node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Model identifier understood by the execution backend.
    pub model: String,
    /// Sampling temperature, between 0 and 2.
    pub temperature: f64,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Optional system prompt prepended to every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl LlmConfig {
    /// Returns the form schema for language-model nodes.
    pub fn schema() -> ConfigSchema {
        ConfigSchema::new([
            FieldSpec::new("model", FieldType::Text)
                .required()
                .with_default(DEFAULT_MODEL)
                .with_constraint(Constraint::NonEmpty)
                .with_description("Model identifier"),
            FieldSpec::new("temperature", FieldType::Number)
                .with_default(DEFAULT_TEMPERATURE)
                .with_constraint(Constraint::Range {
                    min: Some(0.0),
                    max: Some(2.0),
                })
                .with_description("Sampling temperature"),
            FieldSpec::new("max_tokens", FieldType::Integer)
                .with_default(DEFAULT_MAX_TOKENS)
                .with_constraint(Constraint::Range {
                    min: Some(1.0),
                    max: Some(128_000.0),
                })
                .with_description("Maximum number of generated tokens"),
            FieldSpec::new("system_prompt", FieldType::Text)
                .with_constraint(Constraint::MaxLength { max: 8_000 })
                .with_description("Instructions prepended to every request"),
        ])
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_owned(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: None,
        }
    }
}
