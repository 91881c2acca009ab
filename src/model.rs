//! Model declarations, registered model types and model instances.
//!
//! A [`ModelSpec`] is the author's declaration. Registration turns it into a
//! frozen [`ModelType`] whose fields iterate in lexicographic order, the
//! canonical order for construction, dumping and display. A [`Model`] holds one
//! slot per field; a slot that was never written materializes the field default
//! on first read.
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::error::{ModelError, Result};
use crate::field::Field;
use crate::value::{NULL, Value};

/// Reserved key holding the producing model's type name in self-tagged dumps.
pub const TAG_KEY: &str = "__class_name__";

/// A model declaration: a type name, its fields and the self-tagging switch.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    name: String,
    fields: Vec<(String, Field)>,
    tagged: bool,
}

impl ModelSpec {
    /// New declaration; self-tagging is on by default.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new(), tagged: true }
    }

    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    pub fn untagged(mut self) -> Self {
        self.tagged = false;
        self
    }

    pub fn tagged(mut self, tagged: bool) -> Self {
        self.tagged = tagged;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Validate the declaration and freeze it into a [`ModelType`].
    pub(crate) fn freeze(&self) -> Result<ModelType> {
        let schema_err = |reason: String| ModelError::Schema { model: self.name.clone(), reason };
        if self.name.is_empty() {
            return Err(schema_err("model name must not be empty".into()));
        }

        let mut fields = IndexMap::with_capacity(self.fields.len());
        for (name, field) in &self.fields {
            if name.is_empty() {
                return Err(schema_err("field names must not be empty".into()));
            }
            if name == TAG_KEY {
                return Err(schema_err(format!("'{TAG_KEY}' is reserved for the type tag")));
            }
            let mut field = field.clone();
            field.bind(name);
            if let Some(default) = field.default_value() {
                field.check(default).map_err(|source| ModelError::InvalidDefault {
                    model: self.name.clone(),
                    field: name.clone(),
                    source,
                })?;
            }
            if fields.insert(name.clone(), field).is_some() {
                return Err(schema_err(format!("field '{name}' is declared twice")));
            }
        }
        fields.sort_keys();

        Ok(ModelType { name: self.name.clone(), fields, tagged: self.tagged })
    }
}

/// A registered model type. Field iteration order is lexicographic by name.
#[derive(Debug)]
pub struct ModelType {
    name: String,
    fields: IndexMap<String, Field>,
    tagged: bool,
}

impl ModelType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_tagged(&self) -> bool {
        self.tagged
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Fields in canonical order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn field_order(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// True when `spec` declares exactly this type: same tagging, the same field
    /// names (each once) and the same declaration for every field.
    pub(crate) fn same_shape(&self, spec: &ModelSpec) -> bool {
        let mut declared: Vec<&str> = spec.field_names().collect();
        declared.sort_unstable();
        self.tagged == spec.tagged
            && declared.iter().copied().eq(self.field_order())
            && spec.fields.iter().all(|(name, field)| {
                self.fields.get(name).is_some_and(|existing| existing.same_declaration(field))
            })
    }

    fn field_or_err(&self, name: &str) -> Result<&Field> {
        self.fields.get(name).ok_or_else(|| ModelError::UnknownField {
            model: self.name.clone(),
            field: name.to_string(),
        })
    }

    /// Build an instance. Every field, supplied or defaulted, goes through the
    /// write path; the first failing field aborts construction.
    pub fn construct<K, V>(
        self: &Arc<Self>,
        kwargs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Model>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut supplied: IndexMap<String, Value> =
            kwargs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();

        let mut model = Model::blank(Arc::clone(self));
        for field in self.fields.values() {
            let value = supplied
                .swap_remove(field.name())
                .or_else(|| field.default_value().cloned())
                .unwrap_or(Value::Null);
            model.set(field.name(), value)?;
        }
        for extra in supplied.keys() {
            tracing::debug!(
                model = %self.name,
                key = %extra,
                "ignoring value for undeclared field"
            );
        }
        Ok(model)
    }
}

/// An instance of a registered model type.
#[derive(Clone)]
pub struct Model {
    ty: Arc<ModelType>,
    slots: IndexMap<String, OnceCell<Value>>,
}

impl Model {
    /// An instance with no field written yet.
    pub(crate) fn blank(ty: Arc<ModelType>) -> Self {
        let slots = ty.fields.keys().map(|name| (name.clone(), OnceCell::new())).collect();
        Self { ty, slots }
    }

    pub fn model_type(&self) -> &Arc<ModelType> {
        &self.ty
    }

    pub fn type_name(&self) -> &str {
        &self.ty.name
    }

    /// Current value of a field. A never-written slot takes the field default
    /// (once), or reads as null when there is none.
    pub fn get(&self, name: &str) -> Result<&Value> {
        let field = self.ty.field_or_err(name)?;
        let slot = &self.slots[name];
        Ok(match field.default_value() {
            Some(default) => slot.get_or_init(|| default.clone()),
            None => slot.get().unwrap_or(&NULL),
        })
    }

    /// Validate and store a field value. On failure the stored value is untouched.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.ty.field_or_err(name)?.check(&value)?;
        if let Some(slot) = self.slots.get_mut(name) {
            *slot = OnceCell::with_value(value);
        }
        Ok(())
    }

    /// `(name, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.ty
            .field_order()
            .map(move |name| (name, self.get(name).unwrap_or(&NULL)))
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name() && self.iter().eq(other.iter())
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.type_name())?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;
    use crate::ty::Ty;

    fn fruit() -> Arc<ModelType> {
        let spec = ModelSpec::new("Fruit")
            .untagged()
            .field("weight", Field::builder(Ty::Float).default(1.0).build().unwrap())
            .field("name", Field::of(Ty::Str).unwrap())
            .field("quantity", Field::builder(Ty::Int).default(10).build().unwrap());
        Arc::new(spec.freeze().unwrap())
    }

    #[test]
    fn field_order_is_lexicographic() {
        let ty = fruit();
        assert_eq!(ty.field_order().collect::<Vec<_>>(), vec!["name", "quantity", "weight"]);
    }

    #[test]
    fn construction_applies_defaults() {
        let apple = fruit().construct([("name", "apple")]).unwrap();
        assert_eq!(apple.get("name").unwrap(), &Value::from("apple"));
        assert_eq!(apple.get("quantity").unwrap(), &Value::Int(10));
        assert_eq!(apple.get("weight").unwrap(), &Value::from(1.0));
    }

    #[test]
    fn missing_required_field_fails_construction() {
        let err = fruit().construct(Vec::<(&str, Value)>::new()).unwrap_err();
        match err {
            ModelError::Validation(v) => {
                assert_eq!(v.field_name.as_deref(), Some("name"));
                assert_eq!(v.failures, vec!["Value must not be null".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failed_write_keeps_previous_value() {
        let mut apple = fruit().construct([("name", "apple")]).unwrap();
        assert!(apple.set("quantity", 5.5).is_err());
        assert_eq!(apple.get("quantity").unwrap(), &Value::Int(10));
        apple.set("quantity", 5).unwrap();
        assert_eq!(apple.get("quantity").unwrap(), &Value::Int(5));
    }

    #[test]
    fn blank_slot_materializes_default_on_read() {
        let model = Model::blank(fruit());
        assert_eq!(model.get("quantity").unwrap(), &Value::Int(10));
        assert_eq!(model.get("name").unwrap(), &Value::Null);
    }

    #[test]
    fn unknown_field_is_reported() {
        let mut apple = fruit().construct([("name", "apple")]).unwrap();
        assert!(matches!(apple.get("colour"), Err(ModelError::UnknownField { .. })));
        assert!(matches!(apple.set("colour", "red"), Err(ModelError::UnknownField { .. })));
    }

    #[test]
    fn display_is_repr_like() {
        let apple = fruit()
            .construct([
                ("name", Value::from("apple")),
                ("quantity", Value::Int(5)),
                ("weight", Value::from(5.0)),
            ])
            .unwrap();
        assert_eq!(apple.to_string(), "Fruit(name='apple', quantity=5, weight=5.0)");
    }

    #[test]
    fn default_breaking_a_rule_fails_freeze() {
        let even = Rule::predicate(|v| v.as_i64().is_some_and(|i| i % 2 == 0))
            .with_message("Value must be even");
        let field = Field::builder(Ty::Int).rule(even).default(3).build().unwrap();
        let err = ModelSpec::new("Odd").field("n", field).freeze().unwrap_err();
        match err {
            ModelError::InvalidDefault { model, field, source } => {
                assert_eq!(model, "Odd");
                assert_eq!(field, "n");
                assert_eq!(source.failures, vec!["Value must be even".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reserved_and_duplicate_names_are_schema_errors() {
        let reserved = ModelSpec::new("R").field(TAG_KEY, Field::of(Ty::Int).unwrap());
        assert!(matches!(reserved.freeze(), Err(ModelError::Schema { .. })));

        let dup = ModelSpec::new("D")
            .field("a", Field::of(Ty::Int).unwrap())
            .field("a", Field::of(Ty::Str).unwrap());
        assert!(matches!(dup.freeze(), Err(ModelError::Schema { .. })));
    }
}
