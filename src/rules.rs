//! Validation rules and their composition.
//!
//! A rule passes on the null marker unless it is the not-null rule, so that
//! null-rejection is owned by exactly one rule. [`check`] runs a whole rule list
//! without short-circuiting and returns every failure message.
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::{ModelError, Result};
use crate::ty::{write_joined, Ty};
use crate::value::Value;

pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct Rule {
    kind: RuleKind,
}

#[derive(Clone)]
enum RuleKind {
    NotNull,
    IsType(Ty),
    GreaterThan(Value),
    LessThan(Value),
    OneOf(Vec<Value>),
    MaxLen(usize),
    MinLen(usize),
    Pattern { source: String, re: Regex },
    UserSupplied { test: Predicate, message: Option<String> },
    Named { name: String, test: Predicate },
}

impl Rule {
    pub fn not_null() -> Self {
        Self { kind: RuleKind::NotNull }
    }

    pub fn is_type(ty: Ty) -> Self {
        Self { kind: RuleKind::IsType(ty) }
    }

    pub fn greater_than(bound: impl Into<Value>) -> Self {
        Self { kind: RuleKind::GreaterThan(bound.into()) }
    }

    pub fn less_than(bound: impl Into<Value>) -> Self {
        Self { kind: RuleKind::LessThan(bound.into()) }
    }

    pub fn one_of<V: Into<Value>>(allowed: impl IntoIterator<Item = V>) -> Self {
        Self { kind: RuleKind::OneOf(allowed.into_iter().map(Into::into).collect()) }
    }

    pub fn max_len(max: usize) -> Self {
        Self { kind: RuleKind::MaxLen(max) }
    }

    pub fn min_len(min: usize) -> Self {
        Self { kind: RuleKind::MinLen(min) }
    }

    /// Full-match regular expression on string values.
    pub fn pattern(pattern: &str) -> Result<Self> {
        let anchored = format!("^(?:{pattern})$");
        let re = Regex::new(&anchored)
            .map_err(|e| ModelError::Parse(format!("invalid pattern {pattern:?}: {e}")))?;
        Ok(Self { kind: RuleKind::Pattern { source: pattern.to_string(), re } })
    }

    /// A user-supplied predicate; see [`Rule::with_message`] to name the failure.
    pub fn predicate(test: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self {
            kind: RuleKind::UserSupplied { test: Arc::new(test), message: None },
        }
    }

    /// A predicate reported only by name, with the generic fallback message.
    pub fn named(
        name: impl Into<String>,
        test: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind: RuleKind::Named { name: name.into(), test: Arc::new(test) },
        }
    }

    /// Replace the failure message of a user-supplied predicate. Other rules keep
    /// their templated message.
    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        if let RuleKind::UserSupplied { message, .. } = &mut self.kind {
            *message = Some(text.into());
        }
        self
    }

    pub fn is_satisfied(&self, value: &Value) -> bool {
        if let RuleKind::NotNull = self.kind {
            return !value.is_null();
        }
        value.is_null() || self.test(value)
    }

    fn test(&self, value: &Value) -> bool {
        match &self.kind {
            RuleKind::NotNull => !value.is_null(),
            RuleKind::IsType(ty) => ty.accepts(value),
            RuleKind::GreaterThan(bound) => value.compare(bound) == Some(Ordering::Greater),
            RuleKind::LessThan(bound) => value.compare(bound) == Some(Ordering::Less),
            RuleKind::OneOf(allowed) => allowed.iter().any(|a| a.loosely_equals(value)),
            RuleKind::MaxLen(max) => value.char_len().is_some_and(|n| n <= *max),
            RuleKind::MinLen(min) => value.char_len().is_some_and(|n| n >= *min),
            RuleKind::Pattern { re, .. } => value.as_str().is_some_and(|s| re.is_match(s)),
            RuleKind::UserSupplied { test, .. } | RuleKind::Named { test, .. } => test(value),
        }
    }

    pub fn message(&self) -> String {
        match &self.kind {
            RuleKind::NotNull => "Value must not be null".to_string(),
            RuleKind::IsType(ty) => format!("Value must be of type {ty}"),
            RuleKind::GreaterThan(bound) => format!("Value must be greater than {bound}"),
            RuleKind::LessThan(bound) => format!("Value must be less than {bound}"),
            RuleKind::OneOf(allowed) => format!("Value must be one of [{}]", Joined(allowed)),
            RuleKind::MaxLen(max) => format!("Value must have length less than or equal to {max}"),
            RuleKind::MinLen(min) => {
                format!("Value must have length greater than or equal to {min}")
            }
            RuleKind::Pattern { source, .. } => format!("Value must match pattern {source}"),
            RuleKind::UserSupplied { message, .. } => message
                .clone()
                .unwrap_or_else(|| "Value must pass the user-supplied predicate".to_string()),
            RuleKind::Named { name, .. } => format!("Value failed validation {name}"),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rule").field(&self.message()).finish()
    }
}

struct Joined<'a>(&'a [Value]);

impl fmt::Display for Joined<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, self.0)
    }
}

/// Evaluate every rule against `value`, collecting the message of each failing one.
pub fn check(rules: &[Rule], value: &Value) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| !rule.is_satisfied(value))
        .map(Rule::message)
        .collect()
}
