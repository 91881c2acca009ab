//! Model instances to and from the generic mapping representation, plus the
//! JSON text and byte forms on top of it.
//!
//! Dumps follow the canonical field order and append [`TAG_KEY`] for
//! self-tagged types. Validation rewrites nested mappings into model values
//! (resolving unions on the way) and hands the result to construction, so every
//! value passes through the field rules again.
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use crate::discriminator;
use crate::error::{ModelError, Result};
use crate::field::Field;
use crate::model::{Model, ModelType, TAG_KEY};
use crate::path_de;
use crate::registry::Registry;
use crate::ty::Ty;
use crate::value::Value;

impl Model {
    pub fn dump(&self) -> Map<String, JsonValue> {
        let mut out = Map::new();
        for (name, value) in self.iter() {
            out.insert(name.to_string(), value.to_json());
        }
        if self.model_type().is_tagged() {
            out.insert(TAG_KEY.to_string(), JsonValue::from(self.type_name()));
        }
        out
    }

    pub fn dump_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.dump())?)
    }

    /// JSON text as UTF-8 bytes with one trailing newline.
    pub fn dump_jsonb(&self) -> Result<Vec<u8>> {
        let mut bytes = self.dump_json()?.into_bytes();
        bytes.push(b'\n');
        Ok(bytes)
    }
}

impl Registry {
    /// Build an instance of `ty` from a mapping.
    pub fn validate(&self, ty: &Arc<ModelType>, data: &Map<String, JsonValue>) -> Result<Model> {
        let mut kwargs: Vec<(String, Value)> = Vec::with_capacity(data.len());
        for field in ty.fields() {
            let Some(raw) = data.get(field.name()) else {
                continue;
            };
            let value = match raw {
                JsonValue::Object(nested) => self.validate_nested(field, nested)?,
                JsonValue::Array(_) => {
                    return Err(ModelError::UnsupportedSequence { field: field.name().to_string() });
                }
                scalar => Value::from_json(scalar)?,
            };
            kwargs.push((field.name().to_string(), value));
        }
        ty.construct(kwargs)
    }

    pub fn validate_named(&self, name: &str, data: &Map<String, JsonValue>) -> Result<Model> {
        self.validate(&self.require(name)?, data)
    }

    /// Validate a self-tagged mapping against the type its tag names.
    pub fn validate_tagged(&self, data: &Map<String, JsonValue>) -> Result<Model> {
        let name = data
            .get(TAG_KEY)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| {
                ModelError::Parse(format!("mapping carries no string '{TAG_KEY}' key"))
            })?;
        self.validate_named(name, data)
    }

    pub fn validate_json(&self, ty: &Arc<ModelType>, text: &str) -> Result<Model> {
        let data: Map<String, JsonValue> = path_de::from_str_with_path(text)?;
        self.validate(ty, &data)
    }

    pub fn validate_jsonb(&self, ty: &Arc<ModelType>, bytes: &[u8]) -> Result<Model> {
        let data: Map<String, JsonValue> = path_de::from_slice_with_path(bytes)?;
        self.validate(ty, &data)
    }

    pub fn validate_tagged_json(&self, text: &str) -> Result<Model> {
        let data: Map<String, JsonValue> = path_de::from_str_with_path(text)?;
        self.validate_tagged(&data)
    }

    fn validate_nested(&self, field: &Field, nested: &Map<String, JsonValue>) -> Result<Value> {
        let target = match field.ty() {
            Ty::Model(name) => self.require(name)?,
            Ty::Union(_) => discriminator::resolve(self, field, nested)?,
            other => {
                return Err(ModelError::Parse(format!(
                    "field '{}' of type {other} cannot hold a nested mapping",
                    field.name()
                )));
            }
        };
        Ok(Value::from(self.validate(&target, nested)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelSpec;
    use crate::ty::{Literal, Union};
    use serde_json::json;

    fn fruit() -> ModelSpec {
        ModelSpec::new("Fruit")
            .untagged()
            .field("name", Field::of(Ty::Str).unwrap())
            .field("quantity", Field::builder(Ty::Int).default(10).build().unwrap())
            .field("weight", Field::builder(Ty::Float).default(1.0).build().unwrap())
    }

    fn salad() -> ModelSpec {
        ModelSpec::new("FruitSalad")
            .untagged()
            .field("ingredient_1", Field::of(Ty::model("Fruit")).unwrap())
            .field("ingredient_2", Field::of(Ty::model("Fruit")).unwrap())
    }

    fn object(v: JsonValue) -> Map<String, JsonValue> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn dump_uses_canonical_order_and_defaults() {
        let registry = Registry::new();
        let apple = registry.construct(&fruit(), [("name", "apple")]).unwrap();
        let dumped = apple.dump();
        assert_eq!(
            JsonValue::Object(dumped.clone()),
            json!({"name": "apple", "quantity": 10, "weight": 1.0})
        );
        assert_eq!(dumped.keys().collect::<Vec<_>>(), vec!["name", "quantity", "weight"]);
    }

    #[test]
    fn tagged_dump_appends_type_name_last() {
        let registry = Registry::new();
        let spec = fruit().tagged(true);
        let apple = registry.construct(&spec, [("name", "apple")]).unwrap();
        let dumped = apple.dump();
        assert_eq!(dumped.keys().last().map(String::as_str), Some(TAG_KEY));
        assert_eq!(dumped[TAG_KEY], json!("Fruit"));
    }

    #[test]
    fn jsonb_round_trip() {
        let registry = Registry::new();
        let fruit_ty = registry.register(&fruit()).unwrap();
        let f = fruit_ty
            .construct([
                ("name", Value::from("apple")),
                ("quantity", Value::Int(5)),
                ("weight", Value::from(5.0)),
            ])
            .unwrap();
        let bytes = f.dump_jsonb().unwrap();
        assert_eq!(bytes.last(), Some(&b'\n'));
        let parsed: JsonValue = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, json!({"name": "apple", "quantity": 5, "weight": 5.0}));

        let back = registry.validate_jsonb(&fruit_ty, &bytes).unwrap();
        assert_eq!(back, f);
        assert_eq!(back.get("weight").unwrap(), &Value::from(5.0));
    }

    #[test]
    fn nested_models_round_trip() {
        let registry = Registry::new();
        registry.register(&fruit()).unwrap();
        let salad_ty = registry.register(&salad()).unwrap();
        let apple = registry.construct(&fruit(), [("name", "apple")]).unwrap();
        let banana = registry.construct(&fruit(), [("name", "banana")]).unwrap();
        let bowl = salad_ty.construct([("ingredient_1", apple), ("ingredient_2", banana)]).unwrap();

        let back = registry.validate(&salad_ty, &bowl.dump()).unwrap();
        assert_eq!(back, bowl);
        let first = back.get("ingredient_1").unwrap().as_model().unwrap();
        assert_eq!(first.type_name(), "Fruit");
        assert_eq!(first.get("name").unwrap(), &Value::from("apple"));
    }

    #[test]
    fn sequences_are_rejected_immediately() {
        let registry = Registry::new();
        let salad_ty = registry.register(&salad()).unwrap();
        let err = registry
            .validate(&salad_ty, &object(json!({"ingredient_1": [{"name": "apple"}]})))
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::UnsupportedSequence { ref field } if field == "ingredient_1"
        ));
    }

    #[test]
    fn nested_mapping_into_scalar_field_is_a_parse_error() {
        let registry = Registry::new();
        let fruit_ty = registry.register(&fruit()).unwrap();
        let err = registry.validate(&fruit_ty, &object(json!({"name": {"x": 1}}))).unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }

    #[test]
    fn validation_still_applies_to_input() {
        let registry = Registry::new();
        let fruit_ty = registry.register(&fruit()).unwrap();
        let err = registry
            .validate(&fruit_ty, &object(json!({"name": "apple", "quantity": 1.5})))
            .unwrap_err();
        match err {
            ModelError::Validation(v) => {
                assert_eq!(v.field_name.as_deref(), Some("quantity"));
                assert_eq!(v.failures, vec!["Value must be of type int".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn tagged_union_and_top_level_tag() {
        let registry = Registry::new();
        for (name, key) in [("NestedModelA", "A"), ("NestedModelB", "B")] {
            let spec = ModelSpec::new(name)
                .field(
                    "internal_key",
                    Field::builder(Literal::of([key])).default(key).build().unwrap(),
                )
                .field("payload", Field::builder(Ty::Str).default(key.repeat(3)).build().unwrap());
            registry.register(&spec).unwrap();
        }
        let holder = ModelSpec::new("ModelWithNestedUnion").field(
            "nested_model",
            Field::of(Union::of([Ty::model("NestedModelA"), Ty::model("NestedModelB")])).unwrap(),
        );
        let holder_ty = registry.register(&holder).unwrap();

        let b = registry
            .require("NestedModelB")
            .unwrap()
            .construct(Vec::<(&str, Value)>::new())
            .unwrap();
        let outer = holder_ty.construct([("nested_model", b)]).unwrap();
        let dumped = outer.dump();
        assert_eq!(dumped["nested_model"][TAG_KEY], json!("NestedModelB"));

        let via_type = registry.validate(&holder_ty, &dumped).unwrap();
        let via_tag = registry.validate_tagged(&dumped).unwrap();
        assert_eq!(via_type, outer);
        assert_eq!(via_tag, outer);
        let inner = via_tag.get("nested_model").unwrap().as_model().unwrap();
        assert_eq!(inner.type_name(), "NestedModelB");
    }

    #[test]
    fn top_level_tag_is_required_for_tagged_validation() {
        let registry = Registry::new();
        let err = registry.validate_tagged(&object(json!({"name": "apple"}))).unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }

    #[test]
    fn json_decode_errors_carry_the_path() {
        let registry = Registry::new();
        let fruit_ty = registry.register(&fruit()).unwrap();
        let err = registry.validate_json(&fruit_ty, "[1, 2]").unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }
}
