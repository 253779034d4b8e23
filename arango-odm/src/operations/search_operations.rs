use crate::arango_template::ArangoTemplate;
use crate::errors::OdmResult;
use crate::mapping::ArangoSearchPropertiesOptions;
use crate::operations::ViewOperations;

/// Operations on one search view.
#[derive(Clone)]
pub struct ArangoSearchOperations {
    name: String,
    template: ArangoTemplate,
}

impl ArangoSearchOperations {
    pub(crate) fn new(name: &str, template: ArangoTemplate) -> Self {
        ArangoSearchOperations {
            name: name.to_string(),
            template,
        }
    }

    /// Reads the view properties as currently stored by the database.
    pub fn properties(&self) -> OdmResult<ArangoSearchPropertiesOptions> {
        self.template.client().view_properties(&self.name)
    }

    /// Replaces the view properties in the database.
    ///
    /// Registrations of entity types are not affected; the next registration
    /// against this view writes the aggregated configuration again.
    pub fn update_properties(&self, options: &ArangoSearchPropertiesOptions) -> OdmResult<()> {
        self.template.client().update_view(&self.name, options)
    }
}

impl ViewOperations for ArangoSearchOperations {
    fn name(&self) -> &str {
        &self.name
    }

    fn drop(&self) -> OdmResult<()> {
        self.template.client().drop_view(&self.name)?;
        self.template.view_registry().remove(&self.name);
        log::debug!("Dropped view {}", self.name);
        Ok(())
    }
}

impl std::fmt::Debug for ArangoSearchOperations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArangoSearchOperations")
            .field("name", &self.name)
            .finish()
    }
}
