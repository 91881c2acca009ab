//! Runtime values held by model fields.
use std::cmp::Ordering;
use std::fmt;

use ordered_float::OrderedFloat;

use crate::error::{ModelError, Result};
use crate::model::Model;

/// Shared null, for reads of never-written slots.
pub(crate) static NULL: Value = Value::Null;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The null/absence marker.
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
    Model(Box<Model>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view: ints widen, everything else is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(f.0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Value::Model(m) => Some(m),
            _ => None,
        }
    }

    /// Name of the runtime kind, used in diagnostics.
    pub fn kind(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Model(m) => m.type_name(),
        }
    }

    /// Equality by value: ints and floats compare numerically, bools never equal numbers.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_f64() == other.as_f64()
            }
            _ => self == other,
        }
    }

    /// Ordering between comparable values (numbers with numbers, strings with strings).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => {
                let (a, b) = (self.as_f64()?, other.as_f64()?);
                a.partial_cmp(&b)
            }
        }
    }

    /// Length of a string in Unicode scalar values.
    pub fn char_len(&self) -> Option<usize> {
        self.as_str().map(|s| s.chars().count())
    }

    /// Scalar conversion from JSON. Objects are resolved by the serializer, never here.
    pub fn from_json(json: &serde_json::Value) -> Result<Value> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if n.is_u64() {
                    return Err(ModelError::Parse(format!("number {n} is out of range")));
                } else if let Some(f) = n.as_f64() {
                    Value::Float(OrderedFloat(f))
                } else {
                    return Err(ModelError::Parse(format!("number {n} is out of range")));
                }
            }
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(_) => {
                return Err(ModelError::Parse(
                    "sequences are not supported as field values".into(),
                ));
            }
            serde_json::Value::Object(_) => {
                return Err(ModelError::Parse(
                    "a nested mapping needs a model type to be validated against".into(),
                ));
            }
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => match serde_json::Number::from_f64(f.0) {
                Some(n) => serde_json::Value::Number(n),
                None => {
                    tracing::warn!(value = f.0, "non-finite float has no JSON form, writing null");
                    serde_json::Value::Null
                }
            },
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Model(m) => serde_json::Value::Object(m.dump()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            // Debug keeps the trailing `.0` on whole floats.
            Value::Float(x) => write!(f, "{:?}", x.0),
            Value::Str(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
            Value::Model(m) => write!(f, "{m}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(OrderedFloat(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Model> for Value {
    fn from(m: Model) -> Self {
        Value::Model(Box::new(m))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
