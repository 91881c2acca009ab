//! Model registry: model type name to its frozen [`ModelType`].
//!
//! Entries are written once per type and read thereafter. Registration is
//! insert-if-absent under the write lock, so concurrent first use of the same
//! spec yields one shared `Arc<ModelType>`.
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;

use crate::error::{ModelError, Result};
use crate::model::{Model, ModelSpec, ModelType};
use crate::value::Value;

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

#[derive(Debug, Default)]
pub struct Registry {
    types: RwLock<HashMap<String, Arc<ModelType>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Register a model declaration. Registering the same declaration again
    /// returns the existing type; a different shape under the same name is an error.
    pub fn register(&self, spec: &ModelSpec) -> Result<Arc<ModelType>> {
        if let Some(existing) = self.get(spec.name()) {
            return Self::reuse(existing, spec);
        }

        let frozen = Arc::new(spec.freeze()?);
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        match types.entry(spec.name().to_string()) {
            Entry::Occupied(entry) => Self::reuse(Arc::clone(entry.get()), spec),
            Entry::Vacant(entry) => {
                tracing::debug!(
                    model = %frozen.name(),
                    fields = ?frozen.field_order().collect::<Vec<_>>(),
                    tagged = frozen.is_tagged(),
                    "registered model type"
                );
                Ok(Arc::clone(entry.insert(frozen)))
            }
        }
    }

    fn reuse(existing: Arc<ModelType>, spec: &ModelSpec) -> Result<Arc<ModelType>> {
        if existing.same_shape(spec) {
            Ok(existing)
        } else {
            Err(ModelError::Schema {
                model: spec.name().to_string(),
                reason: "already registered with a different set of fields".into(),
            })
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<ModelType>> {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        types.get(name).cloned()
    }

    /// Like [`Registry::get`], failing with [`ModelError::UnknownModel`].
    pub fn require(&self, name: &str) -> Result<Arc<ModelType>> {
        self.get(name).ok_or_else(|| ModelError::UnknownModel(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        types.contains_key(name)
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<String> {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = types.keys().cloned().collect();
        names.sort();
        names
    }

    /// Register `spec` if needed, then construct an instance of it.
    pub fn construct<K, V>(
        &self,
        spec: &ModelSpec,
        kwargs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Model>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.register(spec)?.construct(kwargs)
    }
}
