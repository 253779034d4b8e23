use serde_json::Value;
use std::ops::Deref;
use std::sync::Arc;

use crate::common::{field_value, Document};
use crate::errors::OdmResult;
use crate::index::IndexDefinition;
use crate::mapping::{ArangoSearchPropertiesOptions, CollectionCreateOptions};

/// Database operations the mapping layer relies on.
///
/// Implementations talk to the database server (or stand in for it). The
/// mapping layer never retries a failed call: errors are handed to the
/// caller as they are reported, tagged with the entity type they concern.
///
/// Documents are exchanged in their stored form, with the system attributes
/// `_key`, `_id` and `_rev`.
pub trait DatabaseClientProvider: Send + Sync {
    /// Name of the database the client operates on.
    fn database_name(&self) -> String;

    fn create_collection(&self, name: &str, options: &CollectionCreateOptions) -> OdmResult<()>;

    fn collection_exists(&self, name: &str) -> OdmResult<bool>;

    fn collection_options(&self, name: &str) -> OdmResult<CollectionCreateOptions>;

    fn collection_names(&self) -> OdmResult<Vec<String>>;

    fn drop_collection(&self, name: &str) -> OdmResult<()>;

    /// Creates the index unless an identical one exists.
    ///
    /// Returns `true` when the index was created.
    fn ensure_index(&self, collection: &str, index: &IndexDefinition) -> OdmResult<bool>;

    fn indexes(&self, collection: &str) -> OdmResult<Vec<IndexDefinition>>;

    /// Stores a new document and returns it with its system attributes filled in.
    fn insert_document(&self, collection: &str, document: Document) -> OdmResult<Document>;

    fn get_document(&self, collection: &str, key: &str) -> OdmResult<Option<Document>>;

    /// Replaces the document stored under `key` and returns the stored document.
    fn replace_document(&self, collection: &str, key: &str, document: Document) -> OdmResult<Document>;

    /// Removes the document stored under `key`.
    ///
    /// Returns `false` when there was no such document.
    fn remove_document(&self, collection: &str, key: &str) -> OdmResult<bool>;

    fn count_documents(&self, collection: &str) -> OdmResult<u64>;

    fn all_documents(&self, collection: &str) -> OdmResult<Vec<Document>>;

    fn create_view(&self, name: &str, options: &ArangoSearchPropertiesOptions) -> OdmResult<()>;

    fn view_exists(&self, name: &str) -> OdmResult<bool>;

    fn view_properties(&self, name: &str) -> OdmResult<ArangoSearchPropertiesOptions>;

    /// Replaces the properties of an existing view.
    fn update_view(&self, name: &str, options: &ArangoSearchPropertiesOptions) -> OdmResult<()>;

    fn drop_view(&self, name: &str) -> OdmResult<()>;

    /// Returns the documents of every collection linked to the view that
    /// match `filter`.
    fn search_view(&self, name: &str, filter: &SearchFilter) -> OdmResult<Vec<Document>>;
}

/// A database client.
///
/// Cheap to clone; clones share the same underlying provider.
#[derive(Clone)]
pub struct ArangoClient {
    inner: Arc<dyn DatabaseClientProvider>,
}

impl ArangoClient {
    pub fn new<T: DatabaseClientProvider + 'static>(inner: T) -> Self {
        ArangoClient {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for ArangoClient {
    type Target = Arc<dyn DatabaseClientProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Selects documents of a search view.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchFilter {
    /// Every document.
    All,
    /// Documents whose attribute at `field` equals `value`.
    Eq { field: String, value: Value },
    /// Documents whose attribute at `field` equals one of `values`.
    In { field: String, values: Vec<Value> },
}

impl SearchFilter {
    pub fn all() -> Self {
        SearchFilter::All
    }

    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        SearchFilter::Eq {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn is_in(field: &str, values: Vec<Value>) -> Self {
        SearchFilter::In {
            field: field.to_string(),
            values,
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            SearchFilter::All => true,
            SearchFilter::Eq { field, value } => field_value(document, field) == Some(value),
            SearchFilter::In { field, values } => field_value(document, field)
                .map(|found| values.contains(found))
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_filter_matches() {
        let doc = document(json!({"_key": "1", "address": {"city": "Berlin"}}));
        assert!(SearchFilter::all().matches(&doc));
        assert!(SearchFilter::eq("_key", "1").matches(&doc));
        assert!(!SearchFilter::eq("_key", "2").matches(&doc));
        assert!(SearchFilter::eq("address.city", "Berlin").matches(&doc));
        assert!(SearchFilter::is_in("_key", vec![json!("3"), json!("1")]).matches(&doc));
        assert!(!SearchFilter::is_in("missing", vec![json!("1")]).matches(&doc));
    }
}
