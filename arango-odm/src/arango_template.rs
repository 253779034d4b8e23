use dashmap::DashSet;
use itertools::Itertools;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::client::ArangoClient;
use crate::common::LockRegistry;
use crate::errors::{ErrorKind, OdmError, OdmResult};
use crate::mapping::{
    ArangoEntity, ArangoMappingContext, ArangoPersistentEntity, ArangoSearchPropertiesOptions,
};
use crate::odm_config::OdmConfig;
use crate::operations::{ArangoSearchOperations, CollectionOperations};
use crate::repository::ArangoSearchRepository;
use crate::template_builder::ArangoTemplateBuilder;
use crate::view::ViewRegistry;

/// Entry point of the mapping layer.
///
/// `ArangoTemplate` resolves entity types through its mapping context, makes
/// sure their collections, indexes and search views exist, and stores and
/// loads entities through the database client.
///
/// - The backing collection of a type is set up once per collection name:
///   created when missing (if the configuration allows it) and given the
///   type's index definitions.
/// - A type declaring a search view registers its contribution with the view
///   registry when its collection is first set up or when
///   [`arangosearch`](Self::arangosearch) is called. The merged configuration
///   of every contributing type is written to the database.
///
/// Failures of the database client are returned as `DelegatedOperation`
/// errors naming the entity type, with the client error as their cause.
///
/// `ArangoTemplate` uses the PIMPL pattern; clones share the same state.
///
/// # Examples
///
/// ```rust,ignore
/// use arango_odm::arango_template::ArangoTemplate;
///
/// let template = ArangoTemplate::builder()
///     .database_name("shop")
///     .build()?;
///
/// let stored = template.insert(&Product::new("p-1", "lamp"))?;
/// let found: Option<Product> = template.find("p-1")?;
/// ```
#[derive(Clone)]
pub struct ArangoTemplate {
    inner: Arc<ArangoTemplateInner>,
}

impl ArangoTemplate {
    pub fn builder() -> ArangoTemplateBuilder {
        ArangoTemplateBuilder::new()
    }

    pub(crate) fn new(client: ArangoClient, config: OdmConfig, mapping_context: ArangoMappingContext) -> Self {
        let view_registry = ViewRegistry::new(config.view_conflict_policy());
        ArangoTemplate {
            inner: Arc::new(ArangoTemplateInner {
                client,
                config,
                mapping_context,
                view_registry,
                ensured: DashSet::new(),
                locks: LockRegistry::new(),
            }),
        }
    }

    pub fn client(&self) -> &ArangoClient {
        &self.inner.client
    }

    pub fn config(&self) -> &OdmConfig {
        &self.inner.config
    }

    pub fn mapping_context(&self) -> &ArangoMappingContext {
        &self.inner.mapping_context
    }

    pub fn view_registry(&self) -> &ViewRegistry {
        &self.inner.view_registry
    }

    pub fn database_name(&self) -> String {
        self.inner.client.database_name()
    }

    /// Returns the persistent entity of `T`.
    pub fn persistent_entity<T: ArangoEntity>(&self) -> OdmResult<Arc<ArangoPersistentEntity>> {
        self.inner.mapping_context.persistent_entity::<T>()
    }

    /// Sets up the backing collection of `T` and returns its operations.
    ///
    /// # Errors
    ///
    /// - `CollectionNotFound` if `T` declares a search view only, or if the
    ///   collection is missing and collection creation is disabled.
    /// - `DelegatedOperation` if the client fails.
    pub fn collection<T: ArangoEntity>(&self) -> OdmResult<CollectionOperations> {
        let entity = self.persistent_entity::<T>()?;
        let name = self.inner.prepare(&entity)?;
        Ok(CollectionOperations::new(&name, self.clone()))
    }

    /// Returns the operations of an existing collection.
    pub fn collection_by_name(&self, name: &str) -> OdmResult<CollectionOperations> {
        if !self.inner.client.collection_exists(name)? {
            log::error!("Collection {} does not exist", name);
            return Err(OdmError::new(
                &format!("Collection '{}' does not exist", name),
                ErrorKind::CollectionNotFound,
            ));
        }
        Ok(CollectionOperations::new(name, self.clone()))
    }

    /// Registers the search view contribution of `T` and writes the merged
    /// view configuration to the database.
    ///
    /// The backing collection of `T`, if it has one, is set up first so the
    /// view can link to it.
    ///
    /// # Errors
    ///
    /// - `ConfigurationError` if `T` declares no search view, or if its
    ///   contribution conflicts with an earlier one under the `Reject` policy.
    /// - `DelegatedOperation` if the client fails.
    pub fn arangosearch<T: ArangoEntity>(&self) -> OdmResult<ArangoSearchOperations> {
        let entity = self.persistent_entity::<T>()?;
        let Some(view) = entity.arango_search_view()? else {
            log::error!("{} does not declare a search view", entity.type_name());
            return Err(OdmError::new(
                &format!("Entity '{}' does not declare a search view", entity.type_name()),
                ErrorKind::ConfigurationError,
            ));
        };
        if entity.has_collection() {
            self.inner.prepare(&entity)?;
        }
        self.inner.register_view(&entity, &view)?;
        Ok(ArangoSearchOperations::new(&view, self.clone()))
    }

    /// Creates the search view `name` with explicit options, or replaces the
    /// properties of an existing view with the same name.
    ///
    /// Views set up this way are not tracked by the view registry.
    pub fn arangosearch_with_options(
        &self,
        name: &str,
        options: &ArangoSearchPropertiesOptions,
    ) -> OdmResult<ArangoSearchOperations> {
        self.inner.write_view(name, options)?;
        Ok(ArangoSearchOperations::new(name, self.clone()))
    }

    /// Returns the operations of an existing search view.
    pub fn view(&self, name: &str) -> OdmResult<ArangoSearchOperations> {
        if !self.inner.client.view_exists(name)? {
            log::error!("View {} does not exist", name);
            return Err(OdmError::new(
                &format!("View '{}' does not exist", name),
                ErrorKind::ViewNotFound,
            ));
        }
        Ok(ArangoSearchOperations::new(name, self.clone()))
    }

    /// Returns a repository that reads `T` through its search view.
    pub fn search_repository<T>(&self) -> OdmResult<ArangoSearchRepository<T>>
    where
        T: ArangoEntity + DeserializeOwned,
    {
        self.arangosearch::<T>()?;
        let entity = self.persistent_entity::<T>()?;
        Ok(ArangoSearchRepository::new(entity, self.clone()))
    }

    /// Stores a new entity and returns it as stored, with key and revision.
    pub fn insert<T>(&self, entity: &T) -> OdmResult<T>
    where
        T: ArangoEntity + Serialize + DeserializeOwned,
    {
        let persistent_entity = self.persistent_entity::<T>()?;
        let collection = self.inner.prepare(&persistent_entity)?;
        let document = persistent_entity.to_document(entity)?;
        let stored = self
            .inner
            .delegate(&persistent_entity, |client| client.insert_document(&collection, document))?;
        persistent_entity.from_document(stored)
    }

    /// Loads the entity stored under `key`.
    pub fn find<T>(&self, key: &str) -> OdmResult<Option<T>>
    where
        T: ArangoEntity + DeserializeOwned,
    {
        let persistent_entity = self.persistent_entity::<T>()?;
        let collection = self.inner.prepare(&persistent_entity)?;
        let document = self
            .inner
            .delegate(&persistent_entity, |client| client.get_document(&collection, key))?;
        document
            .map(|document| persistent_entity.from_document(document))
            .transpose()
    }

    /// Loads every entity of the backing collection of `T`.
    pub fn find_all<T>(&self) -> OdmResult<Vec<T>>
    where
        T: ArangoEntity + DeserializeOwned,
    {
        let persistent_entity = self.persistent_entity::<T>()?;
        let collection = self.inner.prepare(&persistent_entity)?;
        let documents = self
            .inner
            .delegate(&persistent_entity, |client| client.all_documents(&collection))?;
        documents
            .into_iter()
            .map(|document| persistent_entity.from_document(document))
            .collect()
    }

    /// Replaces the entity stored under `key` and returns it as stored.
    pub fn replace<T>(&self, key: &str, entity: &T) -> OdmResult<T>
    where
        T: ArangoEntity + Serialize + DeserializeOwned,
    {
        let persistent_entity = self.persistent_entity::<T>()?;
        let collection = self.inner.prepare(&persistent_entity)?;
        let document = persistent_entity.to_document(entity)?;
        let stored = self.inner.delegate(&persistent_entity, |client| {
            client.replace_document(&collection, key, document)
        })?;
        persistent_entity.from_document(stored)
    }

    /// Removes the entity stored under `key`; returns `false` if there was none.
    pub fn delete<T: ArangoEntity>(&self, key: &str) -> OdmResult<bool> {
        let persistent_entity = self.persistent_entity::<T>()?;
        let collection = self.inner.prepare(&persistent_entity)?;
        self.inner
            .delegate(&persistent_entity, |client| client.remove_document(&collection, key))
    }

    pub fn exists<T: ArangoEntity>(&self, key: &str) -> OdmResult<bool> {
        let persistent_entity = self.persistent_entity::<T>()?;
        let collection = self.inner.prepare(&persistent_entity)?;
        let document = self
            .inner
            .delegate(&persistent_entity, |client| client.get_document(&collection, key))?;
        Ok(document.is_some())
    }

    pub fn count<T: ArangoEntity>(&self) -> OdmResult<u64> {
        let persistent_entity = self.persistent_entity::<T>()?;
        let collection = self.inner.prepare(&persistent_entity)?;
        self.inner
            .delegate(&persistent_entity, |client| client.count_documents(&collection))
    }

    /// Forgets that `name` has been set up, so the next use sets it up again,
    /// and removes the view links to it.
    pub(crate) fn forget_collection(&self, name: &str) {
        self.inner.ensured.retain(|(collection, _)| collection != name);
        self.inner.view_registry.forget_collection(name);
    }
}

struct ArangoTemplateInner {
    client: ArangoClient,
    config: OdmConfig,
    mapping_context: ArangoMappingContext,
    view_registry: ViewRegistry,
    // (collection, type name) pairs already set up
    ensured: DashSet<(String, String)>,
    locks: LockRegistry,
}

impl ArangoTemplateInner {
    /// Sets up the backing collection of `entity` and its search view
    /// contribution, returning the collection name.
    fn prepare(&self, entity: &ArangoPersistentEntity) -> OdmResult<String> {
        let name = entity.collection()?;
        let marker = (name.clone(), entity.type_name().to_string());
        let mut fresh = false;
        if !self.ensured.contains(&marker) {
            let handle = self.locks.get_lock(&format!("collection:{}", name));
            let _guard = handle.lock();
            if !self.ensured.contains(&marker) {
                self.ensure_collection(entity, &name)?;
                self.ensured.insert(marker);
                fresh = true;
            }
        }

        // a recreated collection has lost its view links
        if let Some(view) = entity.arango_search_view()? {
            let registered = self
                .view_registry
                .contributing_types(&view)
                .contains(&entity.type_name().to_string());
            if fresh || !registered {
                self.register_view(entity, &view)?;
            }
        }
        Ok(name)
    }

    fn ensure_collection(&self, entity: &ArangoPersistentEntity, name: &str) -> OdmResult<()> {
        let exists = self.delegate(entity, |client| client.collection_exists(name))?;
        if !exists {
            if !self.config.create_collections() {
                log::error!("Collection {} for {} does not exist", name, entity.type_name());
                return Err(OdmError::new(
                    &format!(
                        "Collection '{}' for entity '{}' does not exist",
                        name,
                        entity.type_name()
                    ),
                    ErrorKind::CollectionNotFound,
                ));
            }
            let options = entity.collection_options().cloned().unwrap_or_default();
            self.delegate(entity, |client| client.create_collection(name, &options))?;
            log::debug!("Created {:?} collection {} for {}", options.kind, name, entity.type_name());
        }

        if self.config.ensure_indexes() {
            let mut created = 0;
            for index in entity.index_definitions() {
                if self.delegate(entity, |client| client.ensure_index(name, &index))? {
                    created += 1;
                }
            }
            if created > 0 {
                log::debug!("Created {} index(es) on {} for {}", created, name, entity.type_name());
            }
        }
        Ok(())
    }

    fn register_view(&self, entity: &ArangoPersistentEntity, view: &str) -> OdmResult<()> {
        let contribution = entity.arango_search_options()?.unwrap_or_default();

        // the view is written under the same lock as the registration
        let handle = self.locks.get_lock(&format!("view:{}", view));
        let _guard = handle.lock();
        let config = self
            .view_registry
            .register(view, entity.type_name(), &contribution)?;
        self.write_view(view, config.options())
            .map_err(|err| OdmError::delegated(entity.type_name(), err))
    }

    fn write_view(&self, view: &str, options: &ArangoSearchPropertiesOptions) -> OdmResult<()> {
        if self.client.view_exists(view)? {
            self.client.update_view(view, options)?;
            log::debug!(
                "Updated view {} with links to [{}]",
                view,
                options.links.iter().map(|link| link.name.as_str()).join(", ")
            );
        } else {
            self.client.create_view(view, options)?;
            log::debug!("Created view {}", view);
        }
        Ok(())
    }

    /// Runs a client call, tagging a failure with the entity type.
    fn delegate<R>(
        &self,
        entity: &ArangoPersistentEntity,
        call: impl FnOnce(&ArangoClient) -> OdmResult<R>,
    ) -> OdmResult<R> {
        call(&self.client).map_err(|err| {
            log::error!("Client operation for {} failed: {}", entity.type_name(), err);
            OdmError::delegated(entity.type_name(), err)
        })
    }
}


impl std::fmt::Debug for ArangoTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArangoTemplate").finish_non_exhaustive()
    }
}
