//! Configuration of an [`ArangoTemplate`](crate::arango_template::ArangoTemplate).

use std::sync::{Arc, OnceLock};

use crate::common::DEFAULT_DATABASE;
use crate::errors::{ErrorKind, OdmError, OdmResult};
use crate::view::ViewConflictPolicy;

/// Settings of the mapping layer.
///
/// Every value can be set once; unset values report their default. Values
/// are normally set through the template builder, which reports the first
/// failed setting from `build()`.
///
/// | setting | default |
/// |---------|---------|
/// | `database_name` | `"_system"` |
/// | `ensure_indexes` | `true` |
/// | `view_conflict_policy` | [`ViewConflictPolicy::Reject`] |
/// | `create_collections` | `true` |
///
/// Cloning is cheap; clones share the same values.
#[derive(Clone, Default)]
pub struct OdmConfig {
    inner: Arc<OdmConfigInner>,
}

impl OdmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn database_name(&self) -> String {
        self.inner
            .database_name
            .get()
            .cloned()
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
    }

    pub fn set_database_name(&self, database_name: &str) -> OdmResult<()> {
        if database_name.trim().is_empty() {
            log::error!("Database name cannot be empty");
            return Err(OdmError::new(
                "Database name cannot be empty",
                ErrorKind::ConfigurationError,
            ));
        }
        set_once(&self.inner.database_name, "database name", database_name.to_string())
    }

    /// Whether index definitions are ensured when a collection is first used.
    pub fn ensure_indexes(&self) -> bool {
        self.inner.ensure_indexes.get().copied().unwrap_or(true)
    }

    pub fn set_ensure_indexes(&self, ensure_indexes: bool) -> OdmResult<()> {
        set_once(&self.inner.ensure_indexes, "index creation", ensure_indexes)
    }

    pub fn view_conflict_policy(&self) -> ViewConflictPolicy {
        self.inner
            .view_conflict_policy
            .get()
            .copied()
            .unwrap_or_default()
    }

    pub fn set_view_conflict_policy(&self, policy: ViewConflictPolicy) -> OdmResult<()> {
        set_once(&self.inner.view_conflict_policy, "view conflict policy", policy)
    }

    /// Whether missing collections are created when first used.
    pub fn create_collections(&self) -> bool {
        self.inner.create_collections.get().copied().unwrap_or(true)
    }

    pub fn set_create_collections(&self, create_collections: bool) -> OdmResult<()> {
        set_once(&self.inner.create_collections, "collection creation", create_collections)
    }
}

#[derive(Default)]
struct OdmConfigInner {
    database_name: OnceLock<String>,
    ensure_indexes: OnceLock<bool>,
    view_conflict_policy: OnceLock<ViewConflictPolicy>,
    create_collections: OnceLock<bool>,
}

fn set_once<T>(cell: &OnceLock<T>, setting: &str, value: T) -> OdmResult<()> {
    cell.set(value).map_err(|_| {
        log::error!("The {} setting has already been set", setting);
        OdmError::new(
            &format!("The {} setting has already been set", setting),
            ErrorKind::InvalidOperation,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OdmConfig::new();
        assert_eq!(config.database_name(), "_system");
        assert!(config.ensure_indexes());
        assert!(config.create_collections());
        assert_eq!(config.view_conflict_policy(), ViewConflictPolicy::Reject);
    }

    #[test]
    fn test_values_are_set_once() {
        let config = OdmConfig::new();
        config.set_database_name("shop").unwrap();
        config.set_ensure_indexes(false).unwrap();
        assert_eq!(config.database_name(), "shop");
        assert!(!config.ensure_indexes());

        let err = config.set_database_name("other").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        assert_eq!(config.database_name(), "shop");
        assert!(config.set_ensure_indexes(true).is_err());
    }

    #[test]
    fn test_empty_database_name_is_rejected() {
        let config = OdmConfig::new();
        let err = config.set_database_name(" ").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ConfigurationError);
        config.set_database_name("valid").unwrap();
    }

    #[test]
    fn test_clones_share_values() {
        let config = OdmConfig::new();
        let clone = config.clone();
        config
            .set_view_conflict_policy(ViewConflictPolicy::FirstRegisteredWins)
            .unwrap();
        assert_eq!(clone.view_conflict_policy(), ViewConflictPolicy::FirstRegisteredWins);
        assert!(Arc::ptr_eq(&config.inner, &clone.inner));
    }
}
