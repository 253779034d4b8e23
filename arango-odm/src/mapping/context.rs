use dashmap::DashMap;
use parking_lot::Mutex;
use std::any::TypeId;
use std::sync::Arc;

use crate::errors::OdmResult;
use crate::mapping::{
    ArangoEntity, ArangoPersistentEntity, ArangoPersistentProperty, ArangoSearchPropertiesOptions,
    CollectionCreateOptions, ContextHolder, EvaluationContext, TypeDescription,
};

/// Owns the persistent entity of every mapped type.
///
/// The entity of a type is created on its first request, exactly once, and
/// shared afterwards. A failed creation is not remembered: the next request
/// tries again and reports the same error.
///
/// All entities of one mapping context share its evaluation context holder, so
/// installing a context with [`set_evaluation_context`](Self::set_evaluation_context)
/// makes templated names resolvable for every type at once.
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct ArangoMappingContext {
    inner: Arc<MappingContextInner>,
}

impl ArangoMappingContext {
    pub fn new() -> Self {
        ArangoMappingContext {
            inner: Arc::new(MappingContextInner::new()),
        }
    }

    /// Installs or replaces the context templated names are resolved against.
    pub fn set_evaluation_context(&self, context: Arc<dyn EvaluationContext>) {
        self.inner.context_holder.install(context);
    }

    pub fn context_holder(&self) -> &ContextHolder {
        &self.inner.context_holder
    }

    /// Returns the persistent entity of `T`, creating it on first use.
    pub fn persistent_entity<T: ArangoEntity>(&self) -> OdmResult<Arc<ArangoPersistentEntity>> {
        self.inner.persistent_entity::<T>()
    }

    /// Returns the persistent entity of a hand-built description.
    ///
    /// Descriptions are identified by their type name.
    pub fn persistent_entity_for(
        &self,
        description: TypeDescription,
    ) -> OdmResult<Arc<ArangoPersistentEntity>> {
        self.inner.persistent_entity_for(description)
    }

    pub fn has_persistent_entity<T: ArangoEntity>(&self) -> bool {
        self.inner.by_type.contains_key(&TypeId::of::<T>())
    }

    /// Number of entities created so far.
    pub fn entity_count(&self) -> usize {
        self.inner.by_type.len() + self.inner.by_name.len()
    }

    pub fn collection<T: ArangoEntity>(&self) -> OdmResult<String> {
        self.persistent_entity::<T>()?.collection()
    }

    pub fn collection_options<T: ArangoEntity>(&self) -> OdmResult<Option<CollectionCreateOptions>> {
        Ok(self.persistent_entity::<T>()?.collection_options().cloned())
    }

    pub fn arango_search_view<T: ArangoEntity>(&self) -> OdmResult<Option<String>> {
        self.persistent_entity::<T>()?.arango_search_view()
    }

    pub fn arango_search_options<T: ArangoEntity>(
        &self,
    ) -> OdmResult<Option<ArangoSearchPropertiesOptions>> {
        self.persistent_entity::<T>()?.arango_search_options()
    }

    pub fn id_property<T: ArangoEntity>(&self) -> OdmResult<Option<ArangoPersistentProperty>> {
        Ok(self.persistent_entity::<T>()?.id_property().cloned())
    }

    pub fn rev_property<T: ArangoEntity>(&self) -> OdmResult<Option<ArangoPersistentProperty>> {
        Ok(self.persistent_entity::<T>()?.rev_property().cloned())
    }

    pub fn hash_indexed_properties<T: ArangoEntity>(&self) -> OdmResult<Vec<ArangoPersistentProperty>> {
        self.properties_of::<T>(|entity| entity.hash_indexed_properties())
    }

    pub fn skiplist_indexed_properties<T: ArangoEntity>(
        &self,
    ) -> OdmResult<Vec<ArangoPersistentProperty>> {
        self.properties_of::<T>(|entity| entity.skiplist_indexed_properties())
    }

    pub fn persistent_indexed_properties<T: ArangoEntity>(
        &self,
    ) -> OdmResult<Vec<ArangoPersistentProperty>> {
        self.properties_of::<T>(|entity| entity.persistent_indexed_properties())
    }

    pub fn geo_indexed_properties<T: ArangoEntity>(&self) -> OdmResult<Vec<ArangoPersistentProperty>> {
        self.properties_of::<T>(|entity| entity.geo_indexed_properties())
    }

    pub fn fulltext_indexed_properties<T: ArangoEntity>(
        &self,
    ) -> OdmResult<Vec<ArangoPersistentProperty>> {
        self.properties_of::<T>(|entity| entity.fulltext_indexed_properties())
    }

    pub fn field_linked_properties<T: ArangoEntity>(&self) -> OdmResult<Vec<ArangoPersistentProperty>> {
        self.properties_of::<T>(|entity| entity.field_linked_properties())
    }

    fn properties_of<T: ArangoEntity>(
        &self,
        select: impl for<'a> Fn(&'a ArangoPersistentEntity) -> Vec<&'a ArangoPersistentProperty>,
    ) -> OdmResult<Vec<ArangoPersistentProperty>> {
        let entity = self.persistent_entity::<T>()?;
        Ok(select(&entity).into_iter().cloned().collect())
    }
}

impl Default for ArangoMappingContext {
    fn default() -> Self {
        Self::new()
    }
}

struct MappingContextInner {
    by_type: DashMap<TypeId, Arc<ArangoPersistentEntity>>,
    by_name: DashMap<String, Arc<ArangoPersistentEntity>>,
    context_holder: ContextHolder,
    lock: Mutex<()>,
}

impl MappingContextInner {
    fn new() -> Self {
        MappingContextInner {
            by_type: DashMap::new(),
            by_name: DashMap::new(),
            context_holder: ContextHolder::new(),
            lock: Mutex::new(()),
        }
    }

    fn persistent_entity<T: ArangoEntity>(&self) -> OdmResult<Arc<ArangoPersistentEntity>> {
        let type_id = TypeId::of::<T>();
        if let Some(entity) = self.by_type.get(&type_id) {
            return Ok(entity.clone());
        }

        let _guard = self.lock.lock();
        if let Some(entity) = self.by_type.get(&type_id) {
            return Ok(entity.clone());
        }

        let entity = Arc::new(ArangoPersistentEntity::new(
            T::type_description(),
            self.context_holder.clone(),
        )?);
        self.by_type.insert(type_id, entity.clone());
        Ok(entity)
    }

    fn persistent_entity_for(&self, description: TypeDescription) -> OdmResult<Arc<ArangoPersistentEntity>> {
        let name = description.type_name().to_string();
        if let Some(entity) = self.by_name.get(&name) {
            return Ok(entity.clone());
        }

        let _guard = self.lock.lock();
        if let Some(entity) = self.by_name.get(&name) {
            return Ok(entity.clone());
        }

        let entity = Arc::new(ArangoPersistentEntity::new(
            description,
            self.context_holder.clone(),
        )?);
        self.by_name.insert(name, entity.clone());
        Ok(entity)
    }
}
