use crate::arango_template::ArangoTemplate;
use crate::errors::OdmResult;
use crate::index::IndexDefinition;
use crate::mapping::CollectionCreateOptions;

/// Operations on one collection.
#[derive(Clone)]
pub struct CollectionOperations {
    name: String,
    template: ArangoTemplate,
}

impl CollectionOperations {
    pub(crate) fn new(name: &str, template: ArangoTemplate) -> Self {
        CollectionOperations {
            name: name.to_string(),
            template,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Deletes the collection and its documents from the database.
    pub fn drop(&self) -> OdmResult<()> {
        self.template.client().drop_collection(&self.name)?;
        self.template.forget_collection(&self.name);
        log::debug!("Dropped collection {}", self.name);
        Ok(())
    }

    pub fn count(&self) -> OdmResult<u64> {
        self.template.client().count_documents(&self.name)
    }

    pub fn indexes(&self) -> OdmResult<Vec<IndexDefinition>> {
        self.template.client().indexes(&self.name)
    }

    /// Ensures an additional index; returns `true` when it was created.
    pub fn ensure_index(&self, index: &IndexDefinition) -> OdmResult<bool> {
        self.template.client().ensure_index(&self.name, index)
    }

    pub fn options(&self) -> OdmResult<CollectionCreateOptions> {
        self.template.client().collection_options(&self.name)
    }

    pub fn exists(&self) -> OdmResult<bool> {
        self.template.client().collection_exists(&self.name)
    }
}

impl std::fmt::Debug for CollectionOperations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionOperations")
            .field("name", &self.name)
            .finish()
    }
}
