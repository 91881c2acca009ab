//! Declarative model schemas read from JSON.
//!
//! ```json
//! {"models": [
//!   {"name": "Fruit", "tagged": false, "fields": {
//!     "name":     {"type": "str"},
//!     "quantity": {"type": "int", "default": 10, "min_value": 0},
//!     "kind":     {"type": {"literal": ["apple", "pear"]}, "default": "apple"}
//!   }}
//! ]}
//! ```
//!
//! Field types are `"int"`, `"float"`, `"str"`, `"bool"`, a model name,
//! `{"union": [...], "discriminator": "key"}` or `{"literal": [...]}`.
//! User predicates cannot be expressed here; they are code-only.
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::{ModelError, Result};
use crate::field::Field;
use crate::model::{ModelSpec, ModelType};
use crate::path_de;
use crate::registry::Registry;
use crate::rules::Rule;
use crate::ty::{Literal, Ty, Union};
use crate::value::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    pub models: Vec<ModelDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDecl {
    pub name: String,
    #[serde(default = "yes")]
    pub tagged: bool,
    pub fields: IndexMap<String, FieldDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    #[serde(rename = "type")]
    pub ty: TyDecl,
    #[serde(default)]
    pub default: Option<JsonValue>,
    #[serde(default = "yes")]
    pub required: bool,
    #[serde(default)]
    pub min_value: Option<JsonValue>,
    #[serde(default)]
    pub max_value: Option<JsonValue>,
    #[serde(default)]
    pub max_len: Option<usize>,
    #[serde(default)]
    pub min_len: Option<usize>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub one_of: Option<Vec<JsonValue>>,
    #[serde(default)]
    pub discriminator: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TyDecl {
    Named(String),
    Union {
        union: Vec<TyDecl>,
        #[serde(default)]
        discriminator: Option<String>,
    },
    Literal {
        literal: Vec<JsonValue>,
    },
}

fn yes() -> bool {
    true
}

impl SchemaDocument {
    pub fn from_json_str(text: &str) -> Result<Self> {
        path_de::from_str_with_path(text)
    }

    pub fn to_specs(&self) -> Result<Vec<ModelSpec>> {
        self.models.iter().map(ModelDecl::to_spec).collect()
    }

    /// Register every declared model, in document order.
    pub fn register_all(&self, registry: &Registry) -> Result<Vec<Arc<ModelType>>> {
        self.to_specs()?.iter().map(|spec| registry.register(spec)).collect()
    }
}

impl ModelDecl {
    pub fn to_spec(&self) -> Result<ModelSpec> {
        let mut spec = ModelSpec::new(&self.name).tagged(self.tagged);
        for (name, decl) in &self.fields {
            let field = decl.to_field().map_err(|e| ModelError::Schema {
                model: self.name.clone(),
                reason: format!("field '{name}': {e}"),
            })?;
            spec = spec.field(name, field);
        }
        Ok(spec)
    }
}

impl FieldDecl {
    pub fn to_field(&self) -> Result<Field> {
        let mut builder = Field::builder(self.ty.to_ty()?).required(self.required);
        if let Some(default) = &self.default {
            builder = builder.default(Value::from_json(default)?);
        }
        if let Some(bound) = &self.min_value {
            builder = builder.min_value(Value::from_json(bound)?);
        }
        if let Some(bound) = &self.max_value {
            builder = builder.max_value(Value::from_json(bound)?);
        }
        if let Some(max) = self.max_len {
            builder = builder.max_len(max);
        }
        if let Some(min) = self.min_len {
            builder = builder.min_len(min);
        }
        if let Some(pattern) = &self.pattern {
            builder = builder.pattern(pattern.clone());
        }
        if let Some(allowed) = &self.one_of {
            let allowed = allowed.iter().map(Value::from_json).collect::<Result<Vec<_>>>()?;
            builder = builder.rule(Rule::one_of(allowed));
        }
        if let Some(key) = &self.discriminator {
            builder = builder.discriminator(key.clone());
        }
        builder.build()
    }
}

impl TyDecl {
    pub fn to_ty(&self) -> Result<Ty> {
        Ok(match self {
            TyDecl::Named(name) => match name.as_str() {
                "int" => Ty::Int,
                "float" => Ty::Float,
                "str" => Ty::Str,
                "bool" => Ty::Bool,
                model => Ty::model(model),
            },
            TyDecl::Union { union, discriminator } => {
                let members = union.iter().map(TyDecl::to_ty).collect::<Result<Vec<_>>>()?;
                let mut union = Union::of(members);
                union.discriminator = discriminator.clone();
                Ty::Union(union)
            }
            TyDecl::Literal { literal } => {
                let values = literal.iter().map(Value::from_json).collect::<Result<Vec<_>>>()?;
                Ty::Literal(Literal { values })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DOC: &str = r#"{
        "models": [
            {"name": "DiscriminatedModelA", "tagged": false, "fields": {
                "internal_key": {"type": {"literal": ["A"]}, "default": "A"},
                "payload": {"type": "str", "default": "AAA", "max_len": 8}
            }},
            {"name": "DiscriminatedModelB", "tagged": false, "fields": {
                "internal_key": {"type": {"literal": ["B"]}, "default": "B"},
                "payload": {"type": "str", "default": "BBB"}
            }},
            {"name": "Holder", "tagged": false, "fields": {
                "nested_model": {"type": {"union": ["DiscriminatedModelA", "DiscriminatedModelB"]},
                                 "discriminator": "internal_key"},
                "count": {"type": "int", "default": 1, "one_of": [1, 2, 3]},
                "ratio": {"type": "float", "required": false, "min_value": 0}
            }}
        ]
    }"#;

    #[test]
    fn document_registers_and_validates() {
        let registry = Registry::new();
        let doc = SchemaDocument::from_json_str(DOC).unwrap();
        let types = doc.register_all(&registry).unwrap();
        assert_eq!(types.len(), 3);

        let holder = registry.require("Holder").unwrap();
        assert_eq!(
            holder.field_order().collect::<Vec<_>>(),
            vec!["count", "nested_model", "ratio"]
        );

        let data = json!({"nested_model": {"internal_key": "B", "payload": "x"}, "count": 2});
        let model = registry.validate(&holder, data.as_object().unwrap()).unwrap();
        let nested = model.get("nested_model").unwrap().as_model().unwrap();
        assert_eq!(nested.type_name(), "DiscriminatedModelB");
        assert_eq!(model.get("ratio").unwrap(), &Value::Null);

        let bad = json!({"nested_model": {"internal_key": "A"}, "count": 4});
        assert!(registry.validate(&holder, bad.as_object().unwrap()).is_err());
    }

    #[test]
    fn unknown_keys_are_reported_with_path() {
        let text = r#"{"models": [{"name": "X", "fields": {"a": {"type": "int", "bogus": 1}}}]}"#;
        let err = SchemaDocument::from_json_str(text).unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }

    #[test]
    fn literal_default_outside_members_is_a_schema_error() {
        let text = r#"{"models": [{"name": "X", "fields": {
            "f": {"type": {"literal": ["apple"]}, "default": "orange"}
        }}]}"#;
        let doc = SchemaDocument::from_json_str(text).unwrap();
        assert!(matches!(doc.to_specs(), Err(ModelError::Schema { .. })));
    }
}
