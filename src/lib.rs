//! Declarative data models with per-field validation and JSON round-trips.
//!
//! Declare a model as a [`ModelSpec`] of named [`Field`]s, register it in a
//! [`Registry`], then construct [`Model`] instances from keyword values or
//! validate them out of JSON mappings. Every write runs the field's rules;
//! all failing rules are reported together in one [`ValidationError`].
//!
//! ```
//! use json_model::{Field, ModelSpec, Registry, Rule, Ty, Value};
//!
//! let even = Rule::predicate(|v| v.as_i64().is_some_and(|n| n % 2 == 0))
//!     .with_message("Value must be even");
//! let spec = ModelSpec::new("Counter")
//!     .untagged()
//!     .field("count", Field::builder(Ty::Int).default(0).rule(even).build()?);
//! let registry = Registry::new();
//! let counter = registry.construct(&spec, [("count", 4)])?;
//! assert_eq!(counter.get("count")?, &Value::Int(4));
//! assert_eq!(counter.dump_json()?, r#"{"count":4}"#);
//! assert!(registry.construct(&spec, [("count", 3)]).is_err());
//! # Ok::<(), json_model::ModelError>(())
//! ```
pub mod discriminator;
pub mod error;
pub mod field;
pub mod model;
pub mod path_de;
pub mod registry;
pub mod rules;
pub mod schema_doc;
pub mod ty;
pub mod value;

mod serialize;

pub use discriminator::is_discriminated_match;
pub use error::{ModelError, Result, ValidationError};
pub use field::{Field, FieldBuilder};
pub use model::{Model, ModelSpec, ModelType, TAG_KEY};
pub use registry::Registry;
pub use rules::Rule;
pub use ty::{Literal, Ty, Union};
pub use value::Value;
