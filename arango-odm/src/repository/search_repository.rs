use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::arango_template::ArangoTemplate;
use crate::client::SearchFilter;
use crate::common::{Document, DOC_KEY};
use crate::errors::{ErrorKind, OdmError, OdmResult};
use crate::mapping::{ArangoEntity, ArangoPersistentEntity};

/// Reads entities of type `T` through the search view `T` declares.
///
/// The view spans every collection linked to it, so a repository of a base
/// type returns the documents of all types contributing to the same view.
/// Documents are converted to `T` field by field; attributes `T` does not
/// declare are ignored.
///
/// Property names passed to the finders are translated to stored attribute
/// names, so `find_by("id", ..)` searches `_key` when `id` is the key property.
///
/// The view name is resolved on every search, so a templated name follows
/// the current evaluation context.
pub struct ArangoSearchRepository<T> {
    entity: Arc<ArangoPersistentEntity>,
    template: ArangoTemplate,
    _phantom: PhantomData<T>,
}

impl<T> ArangoSearchRepository<T>
where
    T: ArangoEntity + DeserializeOwned,
{
    pub(crate) fn new(entity: Arc<ArangoPersistentEntity>, template: ArangoTemplate) -> Self {
        ArangoSearchRepository {
            entity,
            template,
            _phantom: PhantomData,
        }
    }

    /// Resolves the name of the view `T` declares.
    pub fn view_name(&self) -> OdmResult<String> {
        match self.entity.arango_search_view()? {
            Some(view) => Ok(view),
            None => {
                log::error!("{} does not declare a search view", self.entity.type_name());
                Err(OdmError::new(
                    &format!("Entity '{}' does not declare a search view", self.entity.type_name()),
                    ErrorKind::ConfigurationError,
                ))
            }
        }
    }

    /// Returns the first entity whose key is `id`.
    pub fn find_by_id(&self, id: &str) -> OdmResult<Option<T>> {
        let mut documents = self.search(&SearchFilter::eq(DOC_KEY, id))?;
        if documents.is_empty() {
            return Ok(None);
        }
        self.entity.from_document(documents.swap_remove(0)).map(Some)
    }

    /// Returns the entities whose key is one of `ids`.
    pub fn find_all_by_id(&self, ids: &[&str]) -> OdmResult<Vec<T>> {
        let keys = ids.iter().map(|id| Value::from(*id)).collect();
        self.convert(self.search(&SearchFilter::is_in(DOC_KEY, keys))?)
    }

    pub fn exists_by_id(&self, id: &str) -> OdmResult<bool> {
        Ok(!self.search(&SearchFilter::eq(DOC_KEY, id))?.is_empty())
    }

    /// Returns the entities whose property `property` equals `value`.
    pub fn find_by(&self, property: &str, value: impl Into<Value>) -> OdmResult<Vec<T>> {
        let field = self.field_name(property);
        self.convert(self.search(&SearchFilter::eq(&field, value))?)
    }

    pub fn find_all(&self) -> OdmResult<Vec<T>> {
        self.convert(self.search(&SearchFilter::all())?)
    }

    pub fn count(&self) -> OdmResult<u64> {
        Ok(self.search(&SearchFilter::all())?.len() as u64)
    }

    fn field_name(&self, property: &str) -> String {
        self.entity
            .property(property)
            .map(|p| p.field_name().to_string())
            .unwrap_or_else(|| property.to_string())
    }

    fn search(&self, filter: &SearchFilter) -> OdmResult<Vec<Document>> {
        let view = self.view_name()?;
        let type_name = self.entity.type_name().to_string();
        if !self.template.view_registry().contributing_types(&view).contains(&type_name) {
            // first search under a newly resolved name
            self.template.arangosearch::<T>()?;
        }
        self.template
            .client()
            .search_view(&view, filter)
            .map_err(|err| {
                log::error!("Search on view {} failed: {}", view, err);
                OdmError::delegated(self.entity.type_name(), err)
            })
    }

    fn convert(&self, documents: Vec<Document>) -> OdmResult<Vec<T>> {
        documents
            .into_iter()
            .map(|document| self.entity.from_document(document))
            .collect()
    }
}

impl<T> Clone for ArangoSearchRepository<T> {
    fn clone(&self) -> Self {
        ArangoSearchRepository {
            entity: self.entity.clone(),
            template: self.template.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T> Debug for ArangoSearchRepository<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArangoSearchRepository")
            .field("type_name", &self.entity.type_name())
            .finish()
    }
}
