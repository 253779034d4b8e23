//! Aggregation of search view contributions.
//!
//! Several entity types may declare the same search view. Each one
//! contributes the view-level settings it declares and a link to its own
//! backing collection; the [`ViewRegistry`] merges these contributions into
//! one view configuration per view name.
//!
//! ```rust,ignore
//! let registry = ViewRegistry::new(ViewConflictPolicy::Reject);
//! registry.register("commonView", "ViewEntityA", &options_a)?;
//! let merged = registry.register("commonView", "ViewEntityB", &options_b)?;
//! assert_eq!(merged.links().len(), 2);
//! ```

mod entry;
mod registry;

pub use entry::*;
pub use registry::*;
