//! Index definitions derived from entity mappings.
//!
//! Indexes are declared on an entity either at type level (repeatable
//! `hash_index(...)`, `skiplist_index(...)`, ... annotations naming one or
//! more fields) or at property level (`hash_indexed`, ...), which index the
//! annotated property alone. The descriptor turns both into
//! [`IndexDefinition`]s that the operations facade ensures on the backing
//! collection.
//!
//! ```rust,ignore
//! use arango_odm::index::hash_index;
//!
//! let definition = hash_index(vec!["email"]).unique(true);
//! client.ensure_index("users", &definition)?;
//! ```

mod options;

pub use options::*;
