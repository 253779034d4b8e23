//! Named operations on collections and search views.
//!
//! Handles returned by [`ArangoTemplate`](crate::arango_template::ArangoTemplate)
//! for one collection or view. They forward to the database client and keep
//! the template's bookkeeping in step, e.g. dropping a view also forgets its
//! aggregated registrations.

mod collection_operations;
mod search_operations;
mod view_operations;

pub use collection_operations::*;
pub use search_operations::*;
pub use view_operations::*;
