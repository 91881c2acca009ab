//! Recovering the concrete member of a model union from a serialized mapping.
//!
//! An explicit discriminator key wins: the first member (declaration order) whose
//! same-named field is a `Literal` accepting the mapping's value is chosen.
//! Without one, the reserved tag key is matched against member type names.
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use crate::error::{ModelError, Result};
use crate::field::Field;
use crate::model::{ModelType, TAG_KEY};
use crate::registry::Registry;
use crate::value::Value;

/// True when `candidate` declares `key` as a `Literal` field that accepts `value`.
pub fn is_discriminated_match(key: &str, value: &Value, candidate: &ModelType) -> bool {
    candidate
        .field(key)
        .and_then(|field| field.ty().as_literal())
        .is_some_and(|literal| literal.accepts(value))
}

/// Pick the union member `raw` should be validated against.
pub fn resolve(
    registry: &Registry,
    field: &Field,
    raw: &Map<String, JsonValue>,
) -> Result<Arc<ModelType>> {
    let unresolved = |reason: String| ModelError::UnresolvedUnion {
        field: field.name().to_string(),
        reason,
    };
    let union = field
        .ty()
        .as_union()
        .ok_or_else(|| unresolved(format!("declared type {} is not a union", field.ty())))?;

    if let Some(key) = field.discriminator() {
        let raw_value = raw
            .get(key)
            .ok_or_else(|| unresolved(format!("mapping has no discriminator key '{key}'")))?;
        // Non-scalar tags can never equal a literal.
        let tag = Value::from_json(raw_value).unwrap_or(Value::Null);
        for name in union.model_members() {
            // An unregistered member can never be the match.
            let Some(candidate) = registry.get(name) else {
                tracing::trace!(
                    field = %field.name(),
                    member = %name,
                    "skipping unregistered member"
                );
                continue;
            };
            if is_discriminated_match(key, &tag, &candidate) {
                tracing::trace!(
                    field = %field.name(),
                    %key,
                    member = %name,
                    "resolved by discriminator"
                );
                return Ok(candidate);
            }
        }
        return Err(unresolved(format!("no member of {union} has '{key}' = {raw_value}")));
    }

    if let Some(tag) = raw.get(TAG_KEY) {
        let tag = tag
            .as_str()
            .ok_or_else(|| unresolved(format!("'{TAG_KEY}' must be a string, got {tag}")))?;
        if let Some(name) = union.model_members().find(|name| *name == tag) {
            tracing::trace!(field = %field.name(), member = %name, "resolved by type tag");
            return registry.require(name);
        }
        return Err(unresolved(format!("'{tag}' is not a member of {union}")));
    }

    Err(unresolved(format!(
        "no discriminator declared and mapping carries no '{TAG_KEY}' key"
    )))
}
