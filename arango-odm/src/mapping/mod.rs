//! Mapping metadata of entity types.
//!
//! An entity type declares how it maps to the database through a
//! [`TypeDescription`], usually generated by `#[derive(ArangoEntity)]`.
//! The [`ArangoMappingContext`] compiles each description exactly once into an
//! [`ArangoPersistentEntity`] which derives:
//!
//! - the backing collection name (literal or templated), kind and creation options
//! - the search view name (literal or templated) and its properties
//! - the identity (`_key`, `_id`) and revision (`_rev`) properties
//! - the indexed and field-linked properties
//!
//! ```rust,ignore
//! use arango_odm::mapping::ArangoMappingContext;
//!
//! let context = ArangoMappingContext::new();
//! let entity = context.persistent_entity::<Product>()?;
//! assert_eq!(entity.collection()?, "product");
//! ```
//!
//! # Templated names
//!
//! Collection and view names may embed `{reference}` placeholders resolved
//! against an [`EvaluationContext`] installed on the mapping context. Such
//! names are evaluated on every access and fail with
//! `ErrorKind::UnresolvedExpression` until a context is installed.

mod annotation;
mod annotation_cache;
mod context;
pub mod expression;
mod options;
mod persistent_entity;
mod property;
mod type_description;

pub use annotation::*;
pub use annotation_cache::*;
pub use context::*;
pub use expression::{ContextHolder, EvaluationContext, MapEvaluationContext, NameTemplate};
pub use options::*;
pub use persistent_entity::*;
pub use property::*;
pub use type_description::*;
