//! Error surface of the model engine.
//!
//! Every fallible operation returns [`ModelError`]. Rule violations on a write are
//! carried by [`ValidationError`], which keeps each failing rule's message as a
//! separate record; the multi-line rendering is only its `Display`.
use std::fmt;

use thiserror::Error;

use crate::value::Value;

/// Preamble of the rendered [`ValidationError`].
pub const VALIDATION_PREAMBLE: &str = "The following validations failed";

#[derive(Error, Debug)]
pub enum ModelError {
    /// One or more rules rejected a value on write.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A model declaration is unusable (bad field name, conflicting shape, ...).
    #[error("schema definition error in model '{model}': {reason}")]
    Schema { model: String, reason: String },

    /// A field default does not pass the field's own rules.
    #[error("invalid default for field '{field}' of model '{model}': {source}")]
    InvalidDefault {
        model: String,
        field: String,
        source: ValidationError,
    },

    /// No member of a union matched the serialized mapping.
    #[error("cannot resolve union member for field '{field}': {reason}")]
    UnresolvedUnion { field: String, reason: String },

    /// A sequence was found where a field value was expected.
    #[error("field '{field}' holds a sequence; nested sequences of models are unsupported")]
    UnsupportedSequence { field: String },

    #[error("unknown model type '{0}'")]
    UnknownModel(String),

    #[error("model '{model}' has no field '{field}'")]
    UnknownField { model: String, field: String },

    /// Input that cannot be mapped onto the declared model shape.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Aggregated rule failures of a single write.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field_name: Option<String>,
    pub attempted_value: Option<Value>,
    /// Failure messages in rule-evaluation order.
    pub failures: Vec<String>,
}

impl ValidationError {
    pub fn new(failures: Vec<String>) -> Self {
        Self { field_name: None, attempted_value: None, failures }
    }

    pub fn for_field(field_name: impl Into<String>, value: Value, failures: Vec<String>) -> Self {
        Self {
            field_name: Some(field_name.into()),
            attempted_value: Some(value),
            failures,
        }
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(VALIDATION_PREAMBLE)?;
        if let Some(name) = &self.field_name {
            write!(f, " for field '{name}'")?;
        }
        if let Some(value) = &self.attempted_value {
            write!(f, " (attempted value: {value})")?;
        }
        f.write_str(":")?;
        for failure in &self.failures {
            write!(f, "\n-- {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
