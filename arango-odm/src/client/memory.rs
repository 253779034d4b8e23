use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::client::{DatabaseClientProvider, SearchFilter};
use crate::common::{document_key, field_values, Document, DEFAULT_DATABASE, DOC_FROM, DOC_ID, DOC_KEY, DOC_REV, DOC_TO, ID_SEPARATOR};
use crate::errors::{ErrorKind, OdmError, OdmResult};
use crate::index::IndexDefinition;
use crate::mapping::{ArangoSearchPropertiesOptions, CollectionCreateOptions, CollectionKind};

/// In-memory stand-in for a database server.
///
/// # Purpose
/// `InMemoryClient` implements [`DatabaseClientProvider`] without a server,
/// for tests and demos. Collections, indexes and search views live in
/// process memory and are lost when the last clone is dropped.
///
/// # Characteristics
/// - **Keys**: documents without `_key` get a generated uuid key; `_id` and
///   `_rev` are always assigned by the client
/// - **User keys**: a caller supplied `_key` is rejected when the collection's
///   key options disallow user keys
/// - **Edges**: documents of edge collections need `_from` and `_to`
/// - **Unique indexes**: enforced on insert, replace and index creation;
///   sparse indexes ignore documents missing an indexed attribute
/// - **Views**: every link must name an existing collection; searches run
///   over the documents of all linked collections in link order
///
/// # Usage
/// ```text
/// let client = ArangoClient::new(InMemoryClient::new());
/// client.create_collection("products", &CollectionCreateOptions::default())?;
/// let stored = client.insert_document("products", document)?;
/// ```
#[derive(Clone, Default)]
pub struct InMemoryClient {
    inner: Arc<InMemoryClientInner>,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client operating on the named database.
    pub fn with_database(database_name: &str) -> Self {
        InMemoryClient {
            inner: Arc::new(InMemoryClientInner {
                database_name: database_name.to_string(),
                ..Default::default()
            }),
        }
    }
}

impl DatabaseClientProvider for InMemoryClient {
    fn database_name(&self) -> String {
        self.inner.database_name.clone()
    }

    fn create_collection(&self, name: &str, options: &CollectionCreateOptions) -> OdmResult<()> {
        self.inner.create_collection(name, options)
    }

    fn collection_exists(&self, name: &str) -> OdmResult<bool> {
        Ok(self.inner.collections.read().contains_key(name))
    }

    fn collection_options(&self, name: &str) -> OdmResult<CollectionCreateOptions> {
        self.inner.read_collection(name, |collection| Ok(collection.options.clone()))
    }

    fn collection_names(&self) -> OdmResult<Vec<String>> {
        Ok(self.inner.collections.read().keys().cloned().collect())
    }

    fn drop_collection(&self, name: &str) -> OdmResult<()> {
        self.inner.drop_collection(name)
    }

    fn ensure_index(&self, collection: &str, index: &IndexDefinition) -> OdmResult<bool> {
        self.inner.write_collection(collection, |collection| collection.ensure_index(index))
    }

    fn indexes(&self, collection: &str) -> OdmResult<Vec<IndexDefinition>> {
        self.inner.read_collection(collection, |collection| Ok(collection.indexes.clone()))
    }

    fn insert_document(&self, collection: &str, document: Document) -> OdmResult<Document> {
        let revision = self.inner.next_revision();
        self.inner.write_collection(collection, |c| c.insert(document, revision))
    }

    fn get_document(&self, collection: &str, key: &str) -> OdmResult<Option<Document>> {
        self.inner
            .read_collection(collection, |collection| Ok(collection.documents.get(key).cloned()))
    }

    fn replace_document(&self, collection: &str, key: &str, document: Document) -> OdmResult<Document> {
        let revision = self.inner.next_revision();
        self.inner
            .write_collection(collection, |c| c.replace(key, document, revision))
    }

    fn remove_document(&self, collection: &str, key: &str) -> OdmResult<bool> {
        self.inner
            .write_collection(collection, |c| Ok(c.documents.shift_remove(key).is_some()))
    }

    fn count_documents(&self, collection: &str) -> OdmResult<u64> {
        self.inner
            .read_collection(collection, |collection| Ok(collection.documents.len() as u64))
    }

    fn all_documents(&self, collection: &str) -> OdmResult<Vec<Document>> {
        self.inner.read_collection(collection, |collection| {
            Ok(collection.documents.values().cloned().collect())
        })
    }

    fn create_view(&self, name: &str, options: &ArangoSearchPropertiesOptions) -> OdmResult<()> {
        self.inner.create_view(name, options)
    }

    fn view_exists(&self, name: &str) -> OdmResult<bool> {
        Ok(self.inner.views.read().contains_key(name))
    }

    fn view_properties(&self, name: &str) -> OdmResult<ArangoSearchPropertiesOptions> {
        self.inner
            .views
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| view_not_found(name))
    }

    fn update_view(&self, name: &str, options: &ArangoSearchPropertiesOptions) -> OdmResult<()> {
        self.inner.update_view(name, options)
    }

    fn drop_view(&self, name: &str) -> OdmResult<()> {
        match self.inner.views.write().shift_remove(name) {
            Some(_) => Ok(()),
            None => Err(view_not_found(name)),
        }
    }

    fn search_view(&self, name: &str, filter: &SearchFilter) -> OdmResult<Vec<Document>> {
        self.inner.search_view(name, filter)
    }
}

struct InMemoryClientInner {
    database_name: String,
    collections: RwLock<IndexMap<String, MemoryCollection>>,
    views: RwLock<IndexMap<String, ArangoSearchPropertiesOptions>>,
    revision: AtomicU64,
}

impl Default for InMemoryClientInner {
    fn default() -> Self {
        InMemoryClientInner {
            database_name: DEFAULT_DATABASE.to_string(),
            collections: RwLock::new(IndexMap::new()),
            views: RwLock::new(IndexMap::new()),
            revision: AtomicU64::new(0),
        }
    }
}

impl InMemoryClientInner {
    fn next_revision(&self) -> String {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        format!("_{:x}", revision)
    }

    fn create_collection(&self, name: &str, options: &CollectionCreateOptions) -> OdmResult<()> {
        if options.kind == CollectionKind::None {
            log::error!("Cannot create collection {} without a collection kind", name);
            return Err(OdmError::new(
                &format!("Collection '{}' needs a document or edge kind", name),
                ErrorKind::InvalidOperation,
            ));
        }

        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            log::error!("Collection {} already exists", name);
            return Err(OdmError::new(
                &format!("Collection '{}' already exists", name),
                ErrorKind::InvalidOperation,
            ));
        }
        collections.insert(name.to_string(), MemoryCollection::new(name, options.clone()));
        log::debug!("Created {:?} collection {}", options.kind, name);
        Ok(())
    }

    fn drop_collection(&self, name: &str) -> OdmResult<()> {
        let linked_views: Vec<String> = self
            .views
            .read()
            .iter()
            .filter(|(_, options)| options.link_on(name).is_some())
            .map(|(view, _)| view.clone())
            .collect();
        if !linked_views.is_empty() {
            log::warn!("Dropping collection {} still linked by views {:?}", name, linked_views);
        }

        match self.collections.write().shift_remove(name) {
            Some(_) => {
                let mut views = self.views.write();
                for view in linked_views {
                    if let Some(options) = views.get_mut(&view) {
                        options.links.retain(|link| link.name != name);
                    }
                }
                Ok(())
            }
            None => Err(collection_not_found(name)),
        }
    }

    fn read_collection<R>(
        &self,
        name: &str,
        f: impl FnOnce(&MemoryCollection) -> OdmResult<R>,
    ) -> OdmResult<R> {
        let collections = self.collections.read();
        match collections.get(name) {
            Some(collection) => f(collection),
            None => Err(collection_not_found(name)),
        }
    }

    fn write_collection<R>(
        &self,
        name: &str,
        f: impl FnOnce(&mut MemoryCollection) -> OdmResult<R>,
    ) -> OdmResult<R> {
        let mut collections = self.collections.write();
        match collections.get_mut(name) {
            Some(collection) => f(collection),
            None => Err(collection_not_found(name)),
        }
    }

    fn validate_links(&self, view: &str, options: &ArangoSearchPropertiesOptions) -> OdmResult<()> {
        let collections = self.collections.read();
        for link in &options.links {
            if !collections.contains_key(&link.name) {
                log::error!("View {} links to missing collection {}", view, link.name);
                return Err(OdmError::new(
                    &format!("View '{}' links to missing collection '{}'", view, link.name),
                    ErrorKind::CollectionNotFound,
                ));
            }
        }
        Ok(())
    }

    fn create_view(&self, name: &str, options: &ArangoSearchPropertiesOptions) -> OdmResult<()> {
        self.validate_links(name, options)?;
        let mut views = self.views.write();
        if views.contains_key(name) {
            log::error!("View {} already exists", name);
            return Err(OdmError::new(
                &format!("View '{}' already exists", name),
                ErrorKind::InvalidOperation,
            ));
        }
        views.insert(name.to_string(), options.clone());
        log::debug!("Created view {} with {} link(s)", name, options.links.len());
        Ok(())
    }

    fn update_view(&self, name: &str, options: &ArangoSearchPropertiesOptions) -> OdmResult<()> {
        self.validate_links(name, options)?;
        let mut views = self.views.write();
        match views.get_mut(name) {
            Some(existing) => {
                *existing = options.clone();
                log::debug!("Updated view {} with {} link(s)", name, options.links.len());
                Ok(())
            }
            None => Err(view_not_found(name)),
        }
    }

    fn search_view(&self, name: &str, filter: &SearchFilter) -> OdmResult<Vec<Document>> {
        let links: Vec<String> = {
            let views = self.views.read();
            let options = views.get(name).ok_or_else(|| view_not_found(name))?;
            options.links.iter().map(|link| link.name.clone()).collect()
        };

        let collections = self.collections.read();
        let mut result = Vec::new();
        for link in links {
            if let Some(collection) = collections.get(&link) {
                result.extend(
                    collection
                        .documents
                        .values()
                        .filter(|document| filter.matches(document))
                        .cloned(),
                );
            }
        }
        Ok(result)
    }
}

struct MemoryCollection {
    name: String,
    options: CollectionCreateOptions,
    indexes: Vec<IndexDefinition>,
    documents: IndexMap<String, Document>,
}

impl MemoryCollection {
    fn new(name: &str, options: CollectionCreateOptions) -> Self {
        MemoryCollection {
            name: name.to_string(),
            options,
            indexes: Vec::new(),
            documents: IndexMap::new(),
        }
    }

    fn ensure_index(&mut self, index: &IndexDefinition) -> OdmResult<bool> {
        if self.indexes.contains(index) {
            return Ok(false);
        }
        if index.is_unique() {
            let mut seen: Vec<Vec<Value>> = Vec::new();
            for document in self.documents.values() {
                let Some(values) = unique_values(index, document) else {
                    continue;
                };
                if seen.contains(&values) {
                    return Err(unique_violation(&self.name, index));
                }
                seen.push(values);
            }
        }
        self.indexes.push(index.clone());
        log::debug!("Created {} index on {}{:?}", index.index_type(), self.name, index.fields());
        Ok(true)
    }

    fn insert(&mut self, mut document: Document, revision: String) -> OdmResult<Document> {
        let key = match document_key(&document) {
            Some(key) => {
                if !self.options.allows_user_keys() {
                    log::error!("Collection {} does not allow user keys", self.name);
                    return Err(OdmError::new(
                        &format!("Collection '{}' does not allow user defined keys", self.name),
                        ErrorKind::InvalidOperation,
                    ));
                }
                if self.documents.contains_key(key) {
                    log::error!("Duplicate key {} in collection {}", key, self.name);
                    return Err(OdmError::new(
                        &format!("Unique constraint violated on '{}': _key {}", self.name, key),
                        ErrorKind::UniqueConstraintViolation,
                    ));
                }
                key.to_string()
            }
            None => Uuid::new_v4().simple().to_string(),
        };

        self.complete(&mut document, &key, revision)?;
        self.check_unique(&document, None)?;
        self.documents.insert(key, document.clone());
        Ok(document)
    }

    fn replace(&mut self, key: &str, mut document: Document, revision: String) -> OdmResult<Document> {
        if !self.documents.contains_key(key) {
            log::error!("Document {} not found in collection {}", key, self.name);
            return Err(OdmError::new(
                &format!("Document '{}/{}' not found", self.name, key),
                ErrorKind::DocumentNotFound,
            ));
        }
        self.complete(&mut document, key, revision)?;
        self.check_unique(&document, Some(key))?;
        self.documents.insert(key.to_string(), document.clone());
        Ok(document)
    }

    fn complete(&self, document: &mut Document, key: &str, revision: String) -> OdmResult<()> {
        if self.options.kind == CollectionKind::Edge
            && !(document.contains_key(DOC_FROM) && document.contains_key(DOC_TO))
        {
            log::error!("Edge document for {} is missing _from or _to", self.name);
            return Err(OdmError::new(
                &format!("Edge documents of '{}' need _from and _to", self.name),
                ErrorKind::InvalidOperation,
            ));
        }
        document.insert(DOC_KEY.to_string(), Value::from(key));
        document.insert(
            DOC_ID.to_string(),
            Value::from(format!("{}{}{}", self.name, ID_SEPARATOR, key)),
        );
        document.insert(DOC_REV.to_string(), Value::from(revision));
        Ok(())
    }

    fn check_unique(&self, document: &Document, replacing: Option<&str>) -> OdmResult<()> {
        for index in self.indexes.iter().filter(|index| index.is_unique()) {
            let Some(values) = unique_values(index, document) else {
                continue;
            };
            let duplicate = self.documents.iter().any(|(key, existing)| {
                Some(key.as_str()) != replacing && unique_values(index, existing).as_ref() == Some(&values)
            });
            if duplicate {
                return Err(unique_violation(&self.name, index));
            }
        }
        Ok(())
    }
}

/// Values a document contributes to a unique index; `None` when a sparse
/// index skips the document.
fn unique_values(index: &IndexDefinition, document: &Document) -> Option<Vec<Value>> {
    let values = field_values(document, index.fields());
    if index.is_sparse() && values.iter().any(|value| value.is_null()) {
        None
    } else {
        Some(values)
    }
}

fn unique_violation(collection: &str, index: &IndexDefinition) -> OdmError {
    log::error!("Unique constraint violated on {}{:?}", collection, index.fields());
    OdmError::new(
        &format!(
            "Unique constraint violated on '{}' for fields {:?}",
            collection,
            index.fields()
        ),
        ErrorKind::UniqueConstraintViolation,
    )
}

fn collection_not_found(name: &str) -> OdmError {
    log::error!("Collection {} not found", name);
    OdmError::new(
        &format!("Collection '{}' not found", name),
        ErrorKind::CollectionNotFound,
    )
}

fn view_not_found(name: &str) -> OdmError {
    log::error!("View {} not found", name);
    OdmError::new(&format!("View '{}' not found", name), ErrorKind::ViewNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ArangoClient;
    use crate::index::hash_index;
    use crate::mapping::{CollectionLink, KeyOptions, KeyType};
    use serde_json::json;

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn client_with(collection: &str) -> ArangoClient {
        let client = ArangoClient::new(InMemoryClient::new());
        client
            .create_collection(collection, &CollectionCreateOptions::default())
            .unwrap();
        client
    }

    #[test]
    fn test_database_name() {
        assert_eq!(InMemoryClient::new().database_name(), "_system");
        assert_eq!(InMemoryClient::with_database("shop").database_name(), "shop");
    }

    #[test]
    fn test_insert_assigns_system_attributes() {
        let client = client_with("products");
        let stored = client
            .insert_document("products", document(json!({"name": "pen"})))
            .unwrap();
        let key = stored["_key"].as_str().unwrap().to_string();
        assert_eq!(stored["_id"], json!(format!("products/{}", key)));
        assert!(stored["_rev"].as_str().unwrap().starts_with('_'));
        assert_eq!(client.count_documents("products").unwrap(), 1);
        assert_eq!(client.get_document("products", &key).unwrap(), Some(stored));
    }

    #[test]
    fn test_user_keys() {
        let client = client_with("products");
        client
            .insert_document("products", document(json!({"_key": "1"})))
            .unwrap();
        let err = client
            .insert_document("products", document(json!({"_key": "1"})))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);

        let mut options = CollectionCreateOptions::default();
        options.key_options = Some(KeyOptions {
            allow_user_keys: false,
            key_type: KeyType::Autoincrement,
            increment: None,
            offset: None,
        });
        client.create_collection("generated", &options).unwrap();
        let err = client
            .insert_document("generated", document(json!({"_key": "1"})))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_unique_index() {
        let client = client_with("users");
        let index = hash_index(vec!["email"]).unique(true);
        assert!(client.ensure_index("users", &index).unwrap());
        assert!(!client.ensure_index("users", &index).unwrap());
        assert_eq!(client.indexes("users").unwrap(), vec![index]);

        client
            .insert_document("users", document(json!({"_key": "a", "email": "x@y"})))
            .unwrap();
        let err = client
            .insert_document("users", document(json!({"email": "x@y"})))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);

        // replacing a document with its own value is fine
        client
            .replace_document("users", "a", document(json!({"email": "x@y", "name": "n"})))
            .unwrap();
    }

    #[test]
    fn test_edges_need_endpoints() {
        let client = ArangoClient::new(InMemoryClient::new());
        client
            .create_collection("knows", &CollectionCreateOptions::new(CollectionKind::Edge))
            .unwrap();
        let err = client
            .insert_document("knows", document(json!({"since": 2020})))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        client
            .insert_document("knows", document(json!({"_from": "p/1", "_to": "p/2"})))
            .unwrap();
    }

    #[test]
    fn test_missing_collection_and_document() {
        let client = client_with("c");
        assert_eq!(
            client.count_documents("missing").unwrap_err().kind(),
            &ErrorKind::CollectionNotFound
        );
        assert_eq!(
            client.replace_document("c", "nope", Document::new()).unwrap_err().kind(),
            &ErrorKind::DocumentNotFound
        );
        assert!(!client.remove_document("c", "nope").unwrap());
    }

    #[test]
    fn test_views() {
        let client = client_with("a");
        client.create_collection("b", &CollectionCreateOptions::default()).unwrap();
        client.insert_document("a", document(json!({"_key": "1", "v": "a"}))).unwrap();
        client.insert_document("b", document(json!({"_key": "1", "v": "b"}))).unwrap();
        client.insert_document("b", document(json!({"_key": "2", "v": "b"}))).unwrap();

        let missing = ArangoSearchPropertiesOptions::new().link(CollectionLink::on("zzz"));
        assert_eq!(
            client.create_view("v", &missing).unwrap_err().kind(),
            &ErrorKind::CollectionNotFound
        );

        let options = ArangoSearchPropertiesOptions::new()
            .link(CollectionLink::on("a"))
            .link(CollectionLink::on("b"));
        client.create_view("v", &options).unwrap();
        assert!(client.view_exists("v").unwrap());
        assert_eq!(client.view_properties("v").unwrap(), options);

        let found = client.search_view("v", &SearchFilter::eq("_key", "1")).unwrap();
        let sources: Vec<&Value> = found.iter().map(|d| &d["v"]).collect();
        assert_eq!(sources, vec![&json!("a"), &json!("b")]);

        client.drop_collection("b").unwrap();
        assert_eq!(client.view_properties("v").unwrap().links.len(), 1);

        client.drop_view("v").unwrap();
        assert_eq!(client.drop_view("v").unwrap_err().kind(), &ErrorKind::ViewNotFound);
    }
}
