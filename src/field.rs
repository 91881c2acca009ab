//! Field descriptors: a declared type, a default, a required flag and an ordered
//! rule list. The rule list is assembled once, at build time, in this order:
//! type check, not-null, greater-than, less-than, max-length, min-length, pattern,
//! then user rules.
//!
//! Building checks a default against the declared type only; the full rule list
//! is checked against defaults when the owning model is registered.
use crate::error::{Result, ValidationError};
use crate::rules::{self, Rule};
use crate::ty::Ty;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    ty: Ty,
    default: Option<Value>,
    required: bool,
    rules: Vec<Rule>,
    discriminator: Option<String>,
}

/// Builder for [`Field`]. Fields are required unless [`FieldBuilder::optional`] is called.
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    ty: Ty,
    default: Option<Value>,
    required: bool,
    min_value: Option<Value>,
    max_value: Option<Value>,
    max_len: Option<usize>,
    min_len: Option<usize>,
    pattern: Option<String>,
    rules: Vec<Rule>,
    discriminator: Option<String>,
}

impl Field {
    pub fn builder(ty: impl Into<Ty>) -> FieldBuilder {
        FieldBuilder {
            ty: ty.into(),
            default: None,
            required: true,
            min_value: None,
            max_value: None,
            max_len: None,
            min_len: None,
            pattern: None,
            rules: Vec::new(),
            discriminator: None,
        }
    }

    /// Shorthand for a required field with no default and no extra rules.
    pub fn of(ty: impl Into<Ty>) -> Result<Field> {
        Self::builder(ty).build()
    }

    /// Owning name; empty until the field is bound by registration.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn bind(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn ty(&self) -> &Ty {
        &self.ty
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Discriminator key declared on the field, else on its union type.
    pub fn discriminator(&self) -> Option<&str> {
        self.discriminator
            .as_deref()
            .or_else(|| self.ty.as_union().and_then(|u| u.discriminator.as_deref()))
    }

    /// Same type, default, required flag, discriminator and rule list. Predicates
    /// are compared by their failure message.
    pub(crate) fn same_declaration(&self, other: &Field) -> bool {
        self.ty == other.ty
            && self.default == other.default
            && self.required == other.required
            && self.discriminator() == other.discriminator()
            && self.rules.iter().map(Rule::message).eq(other.rules.iter().map(Rule::message))
    }

    /// Run the full rule list against `value`.
    pub fn check(&self, value: &Value) -> std::result::Result<(), ValidationError> {
        let failures = rules::check(&self.rules, value);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::for_field(self.name.clone(), value.clone(), failures))
        }
    }
}

impl FieldBuilder {
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn min_value(mut self, bound: impl Into<Value>) -> Self {
        self.min_value = Some(bound.into());
        self
    }

    pub fn max_value(mut self, bound: impl Into<Value>) -> Self {
        self.max_value = Some(bound.into());
        self
    }

    pub fn max_len(mut self, max: usize) -> Self {
        self.max_len = Some(max);
        self
    }

    pub fn min_len(mut self, min: usize) -> Self {
        self.min_len = Some(min);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn discriminator(mut self, key: impl Into<String>) -> Self {
        self.discriminator = Some(key.into());
        self
    }

    /// Assemble the rule list and check a non-null default against the declared type.
    pub fn build(self) -> Result<Field> {
        let mut rules = vec![Rule::is_type(self.ty.clone())];
        if self.required {
            rules.push(Rule::not_null());
        }
        if let Some(bound) = self.min_value {
            rules.push(Rule::greater_than(bound));
        }
        if let Some(bound) = self.max_value {
            rules.push(Rule::less_than(bound));
        }
        if let Some(max) = self.max_len {
            rules.push(Rule::max_len(max));
        }
        if let Some(min) = self.min_len {
            rules.push(Rule::min_len(min));
        }
        if let Some(pattern) = &self.pattern {
            rules.push(Rule::pattern(pattern)?);
        }
        rules.extend(self.rules);

        let field = Field {
            name: String::new(),
            ty: self.ty,
            default: self.default.filter(|v| !v.is_null()),
            required: self.required,
            rules,
            discriminator: self.discriminator,
        };
        if let Some(default) = &field.default {
            if !field.ty.accepts(default) {
                return Err(ValidationError {
                    field_name: None,
                    attempted_value: Some(default.clone()),
                    failures: vec![field.rules[0].message()],
                }
                .into());
            }
        }
        Ok(field)
    }
}
