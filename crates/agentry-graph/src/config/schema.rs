//! Configuration schemas describing per-kind form fields.
//!
//! A [`ConfigSchema`] is the metadata the form layer renders and the rule set
//! every config map is checked against. Values travel as a
//! [`ConfigFields`] map; the typed structs in the sibling modules are built
//! from a map only after it passed the schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Field name to value mapping for a node's configuration.
///
/// Keys are kept sorted, which makes serialized configs deterministic.
pub type ConfigFields = serde_json::Map<String, Value>;

/// Value type accepted by a config field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldType {
    /// Free-form string.
    Text,
    /// Any JSON number.
    Number,
    /// Whole number.
    Integer,
    /// Boolean toggle.
    Boolean,
    /// String picked from a fixed list (see [`Constraint::OneOf`]).
    Choice,
    /// Arbitrary JSON value.
    Json,
}

impl FieldType {
    /// Returns whether `value` has the shape this type expects.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Text | Self::Choice => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Json => true,
        }
    }
}

/// Additional restriction on a field's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    /// Inclusive numeric bounds.
    Range {
        /// Lower bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        /// Upper bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Maximum string length in characters.
    MaxLength {
        /// Largest accepted length.
        max: usize,
    },
    /// String must be one of the listed values.
    OneOf {
        /// Accepted values, in display order.
        values: Vec<String>,
    },
    /// String, array or object must not be empty.
    NonEmpty,
}

impl Constraint {
    /// Checks `value` against this constraint.
    ///
    /// Values of a shape the constraint does not apply to pass; shape is the
    /// job of [`FieldType::accepts`].
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Self::Range { min, max } => {
                let Some(number) = value.as_f64() else {
                    return Ok(());
                };
                if let Some(min) = min
                    && number < *min
                {
                    return Err(format!("must be at least {min}"));
                }
                if let Some(max) = max
                    && number > *max
                {
                    return Err(format!("must be at most {max}"));
                }
                Ok(())
            }
            Self::MaxLength { max } => match value.as_str() {
                Some(text) if text.chars().count() > *max => {
                    Err(format!("must be at most {max} characters"))
                }
                _ => Ok(()),
            },
            Self::OneOf { values } => match value.as_str() {
                Some(text) if !values.iter().any(|v| v == text) => {
                    Err(format!("must be one of: {}", values.join(", ")))
                }
                _ => Ok(()),
            },
            Self::NonEmpty => {
                let empty = match value {
                    Value::String(text) => text.trim().is_empty(),
                    Value::Array(items) => items.is_empty(),
                    Value::Object(map) => map.is_empty(),
                    _ => false,
                };
                if empty {
                    Err("must not be empty".into())
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// A single config field violating its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("field `{field}` {reason}")]
pub struct ConfigViolation {
    /// Offending field name.
    pub field: String,
    /// Human-readable reason.
    pub reason: String,
}

impl ConfigViolation {
    /// Creates a new violation.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    fn unknown(field: &str) -> Self {
        Self::new(field, "is not a known field")
    }

    fn missing(field: &str) -> Self {
        Self::new(field, "is required")
    }
}

/// Describes one form field of a node kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name, unique within the schema.
    pub name: String,
    /// Expected value type.
    pub field_type: FieldType,
    /// Value used when the field is not supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Whether the field must hold a value.
    #[serde(default)]
    pub required: bool,
    /// Extra value restrictions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    /// Help text for the form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSpec {
    /// Creates an optional field without default.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default: None,
            required: false,
            constraints: Vec::new(),
            description: None,
        }
    }

    /// Marks the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Adds a constraint.
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Sets the help text.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks a single supplied value. `null` means "unset".
    pub fn check(&self, value: &Value) -> Result<(), ConfigViolation> {
        if value.is_null() {
            return if self.required {
                Err(ConfigViolation::missing(&self.name))
            } else {
                Ok(())
            };
        }

        if !self.field_type.accepts(value) {
            return Err(ConfigViolation::new(
                &self.name,
                format!("expected a value of type {}", self.field_type),
            ));
        }

        for constraint in &self.constraints {
            constraint
                .check(value)
                .map_err(|reason| ConfigViolation::new(&self.name, reason))?;
        }

        Ok(())
    }
}

/// Ordered set of form fields for one node kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigSchema {
    fields: Vec<FieldSpec>,
}

impl ConfigSchema {
    /// Creates a schema from fields in form order.
    pub fn new(fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Returns the field with the given name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Returns the fields in form order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Builds a complete config map from user-supplied values.
    ///
    /// Unset fields are filled from their defaults; `null` counts as unset.
    /// Fails on the first unknown field, missing required field, or invalid
    /// value.
    pub fn resolve(&self, supplied: ConfigFields) -> Result<ConfigFields, ConfigViolation> {
        if let Some(name) = supplied.keys().find(|name| self.field(name).is_none()) {
            return Err(ConfigViolation::unknown(name));
        }

        let mut resolved = ConfigFields::new();
        for field in &self.fields {
            let value = supplied
                .get(&field.name)
                .filter(|value| !value.is_null())
                .or(field.default.as_ref());

            match value {
                Some(value) => {
                    field.check(value)?;
                    resolved.insert(field.name.clone(), value.clone());
                }
                None if field.required => return Err(ConfigViolation::missing(&field.name)),
                None => {}
            }
        }

        Ok(resolved)
    }

    /// Checks only the fields named in `patch`.
    pub fn check_patch(&self, patch: &ConfigFields) -> Result<(), ConfigViolation> {
        for (name, value) in patch {
            let field = self
                .field(name)
                .ok_or_else(|| ConfigViolation::unknown(name))?;
            field.check(value)?;
        }
        Ok(())
    }

    /// Collects every violation in a stored config map.
    pub fn check_all(&self, fields: &ConfigFields) -> Vec<ConfigViolation> {
        let mut violations: Vec<_> = fields
            .keys()
            .filter(|name| self.field(name).is_none())
            .map(|name| ConfigViolation::unknown(name))
            .collect();

        for field in &self.fields {
            match fields.get(&field.name) {
                Some(value) => {
                    if let Err(violation) = field.check(value) {
                        violations.push(violation);
                    }
                }
                None if field.required => violations.push(ConfigViolation::missing(&field.name)),
                None => {}
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(value: Value) -> ConfigFields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn schema() -> ConfigSchema {
        ConfigSchema::new([
            FieldSpec::new("model", FieldType::Text).required(),
            FieldSpec::new("temperature", FieldType::Number)
                .with_default(0.7)
                .with_constraint(Constraint::Range {
                    min: Some(0.0),
                    max: Some(2.0),
                }),
            FieldSpec::new("note", FieldType::Text),
        ])
    }

    #[test]
    fn resolve_fills_defaults() {
        let resolved = schema().resolve(fields(json!({ "model": "m" }))).unwrap();
        assert_eq!(resolved, fields(json!({ "model": "m", "temperature": 0.7 })));
    }

    #[test]
    fn resolve_rejects_missing_required() {
        let err = schema().resolve(ConfigFields::new()).unwrap_err();
        assert_eq!(err.field, "model");
    }

    #[test]
    fn resolve_rejects_unknown_field() {
        let err = schema()
            .resolve(fields(json!({ "model": "m", "colour": "red" })))
            .unwrap_err();
        assert_eq!(err.field, "colour");
    }

    #[test]
    fn resolve_rejects_out_of_range() {
        let err = schema()
            .resolve(fields(json!({ "model": "m", "temperature": 5.0 })))
            .unwrap_err();
        assert_eq!(err.field, "temperature");
        assert_eq!(err.reason, "must be at most 2");
    }

    #[test]
    fn resolve_rejects_wrong_type() {
        let err = schema()
            .resolve(fields(json!({ "model": 3 })))
            .unwrap_err();
        assert_eq!(err.reason, "expected a value of type text");

        let tokens = FieldSpec::new("max_tokens", FieldType::Integer);
        let err = tokens.check(&json!(0.5)).unwrap_err();
        assert_eq!(err.reason, "expected a value of type integer");
    }

    #[test]
    fn null_unsets_optional_but_not_required() {
        let schema = schema();
        assert!(schema.check_patch(&fields(json!({ "note": null }))).is_ok());
        assert!(schema.check_patch(&fields(json!({ "model": null }))).is_err());
    }

    #[test]
    fn check_all_collects_every_violation() {
        let violations = schema().check_all(&fields(json!({
            "temperature": -1,
            "extra": true,
        })));
        let names: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(names, ["extra", "model", "temperature"]);
    }

    #[test]
    fn constraints_check_strings() {
        let one_of = Constraint::OneOf {
            values: vec!["a".into(), "b".into()],
        };
        assert!(one_of.check(&json!("a")).is_ok());
        assert!(one_of.check(&json!("c")).is_err());
        assert!(Constraint::NonEmpty.check(&json!("  ")).is_err());
        assert!(Constraint::MaxLength { max: 3 }.check(&json!("abcd")).is_err());
    }

    #[test]
    fn integer_rejects_fractions() {
        assert!(FieldType::Integer.accepts(&json!(3)));
        assert!(!FieldType::Integer.accepts(&json!(3.5)));
    }
}
