use std::sync::Arc;

use crate::arango_template::ArangoTemplate;
use crate::client::{ArangoClient, DatabaseClientProvider, InMemoryClient};
use crate::errors::{OdmError, OdmResult};
use crate::mapping::{ArangoMappingContext, EvaluationContext};
use crate::odm_config::OdmConfig;
use crate::view::ViewConflictPolicy;

/// Builder for an [`ArangoTemplate`].
///
/// Settings are validated as they are applied. The first failure is kept and
/// returned by [`build`](Self::build); later settings are ignored once a
/// failure has been recorded.
///
/// Without an explicit client the template works against an
/// [`InMemoryClient`] for the configured database.
///
/// # Examples
///
/// ```rust,ignore
/// use arango_odm::arango_template::ArangoTemplate;
/// use arango_odm::view::ViewConflictPolicy;
///
/// let template = ArangoTemplate::builder()
///     .database_name("shop")
///     .view_conflict_policy(ViewConflictPolicy::FirstRegisteredWins)
///     .ensure_indexes(false)
///     .build()?;
/// ```
#[derive(Default)]
pub struct ArangoTemplateBuilder {
    error: Option<OdmError>,
    config: OdmConfig,
    client: Option<ArangoClient>,
    evaluation_context: Option<Arc<dyn EvaluationContext>>,
}

impl ArangoTemplateBuilder {
    pub fn new() -> Self {
        ArangoTemplateBuilder {
            error: None,
            config: OdmConfig::new(),
            client: None,
            evaluation_context: None,
        }
    }

    /// Sets the database client the template talks to.
    pub fn client<T: DatabaseClientProvider + 'static>(mut self, client: T) -> Self {
        self.client = Some(ArangoClient::new(client));
        self
    }

    /// Sets the name of the database.
    ///
    /// An empty name is recorded as a `ConfigurationError`.
    pub fn database_name(mut self, database_name: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_database_name(database_name) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Whether index definitions are ensured when a collection is first used.
    pub fn ensure_indexes(mut self, ensure_indexes: bool) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_ensure_indexes(ensure_indexes) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Whether missing collections are created when first used.
    pub fn create_collections(mut self, create_collections: bool) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_create_collections(create_collections) {
                self.error = Some(e);
            }
        }
        self
    }

    /// How conflicting view-level settings of entity types sharing a view are
    /// handled.
    pub fn view_conflict_policy(mut self, policy: ViewConflictPolicy) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_view_conflict_policy(policy) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the context templated collection and view names resolve against.
    pub fn evaluation_context(mut self, context: Arc<dyn EvaluationContext>) -> Self {
        self.evaluation_context = Some(context);
        self
    }

    /// Builds the template, or returns the first failed setting.
    pub fn build(self) -> OdmResult<ArangoTemplate> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let client = match self.client {
            Some(client) => {
                if client.database_name() != self.config.database_name() {
                    log::warn!(
                        "Client database {} differs from configured database {}",
                        client.database_name(),
                        self.config.database_name()
                    );
                }
                client
            }
            None => ArangoClient::new(InMemoryClient::with_database(&self.config.database_name())),
        };

        let mapping_context = ArangoMappingContext::new();
        if let Some(context) = self.evaluation_context {
            mapping_context.set_evaluation_context(context);
        }
        log::debug!("Building template for database {}", client.database_name());
        Ok(ArangoTemplate::new(client, self.config, mapping_context))
    }
}
