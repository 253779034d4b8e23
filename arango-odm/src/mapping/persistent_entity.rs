use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::common::{has_text, uncapitalize, Document, DOC_ID, DOC_KEY, DOC_REV, UNSET};
use crate::errors::{ErrorKind, OdmError, OdmResult};
use crate::index::{IndexDefinition, IndexType};
use crate::mapping::{
    Annotation, AnnotationCache, AnnotationKind, ArangoPersistentProperty, ArangoSearchPropertiesOptions,
    CollectionAnnotation, CollectionCreateOptions, CollectionKind, CollectionLink, ConsolidateThreshold,
    ConsolidateType, ContextHolder, FulltextIndex, GeoIndex, HashIndex, KeyOptions, NameTemplate,
    PersistentIndex, SearchViewAnnotation, SkiplistIndex, TypeDescription,
};

/// The derived mapping metadata of one entity type.
///
/// Built once per type from its [`TypeDescription`]. Everything except the
/// repeatable annotation lookups and templated names is computed at
/// construction; a descriptor is safe to share between threads.
///
/// # Collection
///
/// - an edge declaration maps the type to an edge collection
/// - otherwise a document declaration maps it to a document collection
/// - a type declaring neither is mapped to a document collection, unless it
///   declares a search view, in which case it has no backing collection
///
/// Unnamed collections and views are named after the type with its first
/// character lowercased.
///
/// # Errors
///
/// Construction fails with `ConfigurationError` when more than one property
/// claims the same identity role (`_key`, `_id` or `_rev`), when a property
/// claims more than one of them, or when a collection or view name is not a
/// valid template.
pub struct ArangoPersistentEntity {
    description: Arc<TypeDescription>,
    collection_kind: CollectionKind,
    collection_template: Option<NameTemplate>,
    collection_options: Option<CollectionCreateOptions>,
    view_template: Option<NameTemplate>,
    view_options: Option<ArangoSearchPropertiesOptions>,
    link_settings: Option<CollectionLink>,
    properties: Vec<ArangoPersistentProperty>,
    id_property: Option<usize>,
    arango_id_property: Option<usize>,
    rev_property: Option<usize>,
    hash_indexed: Vec<usize>,
    skiplist_indexed: Vec<usize>,
    persistent_indexed: Vec<usize>,
    geo_indexed: Vec<usize>,
    fulltext_indexed: Vec<usize>,
    field_linked: Vec<usize>,
    cache: AnnotationCache,
    context_holder: ContextHolder,
}

impl ArangoPersistentEntity {
    pub fn new(description: TypeDescription, context_holder: ContextHolder) -> OdmResult<Self> {
        let description = Arc::new(description);
        let cache = AnnotationCache::new(description.clone());
        let type_name = description.type_name().to_string();
        let default_name = uncapitalize(&type_name);

        let properties: Vec<ArangoPersistentProperty> = description
            .effective_properties()
            .into_iter()
            .map(ArangoPersistentProperty::new)
            .collect();
        let (id_property, arango_id_property, rev_property) =
            resolve_identity(&type_name, &properties)?;

        let edge = cache.find_first(AnnotationKind::Edge);
        let document = cache.find_first(AnnotationKind::Document);
        let view = cache.find_first(AnnotationKind::SearchView);

        if edge.is_some() && document.is_some() {
            log::warn!(
                "{} declares both an edge and a document collection, mapping it as edge",
                type_name
            );
        }

        let collection_annotation = match (&edge, &document) {
            (Some(annotation), _) => annotation
                .as_collection()
                .map(|a| (CollectionKind::Edge, a.clone())),
            (None, Some(annotation)) => annotation
                .as_collection()
                .map(|a| (CollectionKind::Document, a.clone())),
            (None, None) => None,
        };

        let (collection_kind, collection_template, collection_options) = match collection_annotation
        {
            Some((kind, annotation)) => {
                let name = if annotation.name.trim().is_empty() {
                    default_name.clone()
                } else {
                    annotation.name.clone()
                };
                (
                    kind,
                    Some(NameTemplate::compile(&name)?),
                    Some(derive_collection_options(kind, &annotation)),
                )
            }
            None if view.is_none() => (
                CollectionKind::Document,
                Some(NameTemplate::compile(&default_name)?),
                Some(CollectionCreateOptions::new(CollectionKind::Document)),
            ),
            None => (CollectionKind::None, None, None),
        };

        let view_annotation = view.as_ref().and_then(|a| a.as_search_view()).cloned();
        let (view_template, view_options, link_settings) = match view_annotation {
            Some(annotation) => {
                let name = if annotation.name.trim().is_empty() {
                    default_name.clone()
                } else {
                    annotation.name.clone()
                };
                (
                    Some(NameTemplate::compile(&name)?),
                    Some(derive_search_options(&annotation)),
                    Some(derive_link_settings(&annotation)),
                )
            }
            None => (None, None, None),
        };

        let indexed = |predicate: fn(&ArangoPersistentProperty) -> bool| -> Vec<usize> {
            properties
                .iter()
                .enumerate()
                .filter(|(_, property)| predicate(property))
                .map(|(idx, _)| idx)
                .collect()
        };
        let hash_indexed = indexed(|p| p.hash_indexed().is_some());
        let skiplist_indexed = indexed(|p| p.skiplist_indexed().is_some());
        let persistent_indexed = indexed(|p| p.persistent_indexed().is_some());
        let geo_indexed = indexed(|p| p.geo_indexed().is_some());
        let fulltext_indexed = indexed(|p| p.fulltext_indexed().is_some());
        let field_linked = indexed(|p| p.field_link().is_some());

        log::debug!(
            "Created persistent entity for {} (collection: {:?} {:?}, view: {:?})",
            type_name,
            collection_kind,
            collection_template.as_ref().map(|t| t.raw()),
            view_template.as_ref().map(|t| t.raw())
        );

        Ok(ArangoPersistentEntity {
            description,
            collection_kind,
            collection_template,
            collection_options,
            view_template,
            view_options,
            link_settings,
            properties,
            id_property,
            arango_id_property,
            rev_property,
            hash_indexed,
            skiplist_indexed,
            persistent_indexed,
            geo_indexed,
            fulltext_indexed,
            field_linked,
            cache,
            context_holder,
        })
    }

    pub fn type_name(&self) -> &str {
        self.description.type_name()
    }

    pub fn description(&self) -> &TypeDescription {
        &self.description
    }

    pub fn collection_kind(&self) -> CollectionKind {
        self.collection_kind
    }

    pub fn has_collection(&self) -> bool {
        self.collection_template.is_some()
    }

    /// Resolves the backing collection name.
    ///
    /// Templated names are evaluated against the current evaluation context
    /// on every call.
    pub fn collection(&self) -> OdmResult<String> {
        match &self.collection_template {
            Some(template) => template.evaluate(&self.context_holder),
            None => {
                log::error!("{} is view-only and has no backing collection", self.type_name());
                Err(OdmError::new(
                    &format!("{} is view-only and has no backing collection", self.type_name()),
                    ErrorKind::CollectionNotFound,
                ))
            }
        }
    }

    pub fn collection_options(&self) -> Option<&CollectionCreateOptions> {
        self.collection_options.as_ref()
    }

    /// Resolves the search view name, if the type declares a view.
    pub fn arango_search_view(&self) -> OdmResult<Option<String>> {
        self.view_template
            .as_ref()
            .map(|template| template.evaluate(&self.context_holder))
            .transpose()
    }

    /// Returns the view properties this type contributes: the view-level
    /// settings it declares and, when it has a backing collection, the link
    /// to that collection.
    pub fn arango_search_options(&self) -> OdmResult<Option<ArangoSearchPropertiesOptions>> {
        let Some(options) = &self.view_options else {
            return Ok(None);
        };
        let mut options = options.clone();
        if let Some(link) = self.collection_link()? {
            options = options.link(link);
        }
        Ok(Some(options))
    }

    /// Returns the link from this type's view to its backing collection.
    ///
    /// `None` when the type declares no view or has no backing collection.
    pub fn collection_link(&self) -> OdmResult<Option<CollectionLink>> {
        let (Some(settings), Some(_)) = (&self.link_settings, &self.collection_template) else {
            return Ok(None);
        };
        let mut link = settings.clone();
        link.name = self.collection()?;
        link.fields = self
            .field_linked_properties()
            .into_iter()
            .filter_map(|property| property.to_field_link())
            .collect();
        Ok(Some(link))
    }

    /// The property holding the document key (`_key`).
    pub fn id_property(&self) -> Option<&ArangoPersistentProperty> {
        self.id_property.map(|idx| &self.properties[idx])
    }

    /// The property holding the document handle (`_id`).
    pub fn arango_id_property(&self) -> Option<&ArangoPersistentProperty> {
        self.arango_id_property.map(|idx| &self.properties[idx])
    }

    pub fn rev_property(&self) -> Option<&ArangoPersistentProperty> {
        self.rev_property.map(|idx| &self.properties[idx])
    }

    /// All mapped properties, own declarations first.
    pub fn persistent_properties(&self) -> &[ArangoPersistentProperty] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&ArangoPersistentProperty> {
        self.properties.iter().find(|property| property.name() == name)
    }

    pub fn hash_indexed_properties(&self) -> Vec<&ArangoPersistentProperty> {
        self.select(&self.hash_indexed)
    }

    pub fn skiplist_indexed_properties(&self) -> Vec<&ArangoPersistentProperty> {
        self.select(&self.skiplist_indexed)
    }

    pub fn persistent_indexed_properties(&self) -> Vec<&ArangoPersistentProperty> {
        self.select(&self.persistent_indexed)
    }

    pub fn geo_indexed_properties(&self) -> Vec<&ArangoPersistentProperty> {
        self.select(&self.geo_indexed)
    }

    pub fn fulltext_indexed_properties(&self) -> Vec<&ArangoPersistentProperty> {
        self.select(&self.fulltext_indexed)
    }

    pub fn field_linked_properties(&self) -> Vec<&ArangoPersistentProperty> {
        self.select(&self.field_linked)
    }

    pub fn hash_indexes(&self) -> Vec<HashIndex> {
        self.collect_indexes(AnnotationKind::HashIndex, |a| a.as_hash_index().cloned())
    }

    pub fn skiplist_indexes(&self) -> Vec<SkiplistIndex> {
        self.collect_indexes(AnnotationKind::SkiplistIndex, |a| a.as_skiplist_index().cloned())
    }

    pub fn persistent_indexes(&self) -> Vec<PersistentIndex> {
        self.collect_indexes(AnnotationKind::PersistentIndex, |a| {
            a.as_persistent_index().cloned()
        })
    }

    pub fn geo_indexes(&self) -> Vec<GeoIndex> {
        self.collect_indexes(AnnotationKind::GeoIndex, |a| a.as_geo_index().cloned())
    }

    pub fn fulltext_indexes(&self) -> Vec<FulltextIndex> {
        self.collect_indexes(AnnotationKind::FulltextIndex, |a| a.as_fulltext_index().cloned())
    }

    /// Returns every index to ensure on the backing collection.
    ///
    /// Type-level indexes come first, followed by one single-field index per
    /// indexed property. Identical definitions are listed once.
    pub fn index_definitions(&self) -> Vec<IndexDefinition> {
        let mut definitions: Vec<IndexDefinition> = Vec::new();
        let mut push = |definition: IndexDefinition| {
            if !definitions.contains(&definition) {
                definitions.push(definition);
            }
        };

        for index in self.hash_indexes() {
            push(
                IndexDefinition::with_fields(IndexType::Hash, index.fields)
                    .unique(index.unique)
                    .sparse(index.sparse)
                    .deduplicate(index.deduplicate),
            );
        }
        for index in self.skiplist_indexes() {
            push(
                IndexDefinition::with_fields(IndexType::Skiplist, index.fields)
                    .unique(index.unique)
                    .sparse(index.sparse)
                    .deduplicate(index.deduplicate),
            );
        }
        for index in self.persistent_indexes() {
            push(
                IndexDefinition::with_fields(IndexType::Persistent, index.fields)
                    .unique(index.unique)
                    .sparse(index.sparse),
            );
        }
        for index in self.geo_indexes() {
            push(IndexDefinition::with_fields(IndexType::Geo, index.fields).geo_json(index.geo_json));
        }
        for index in self.fulltext_indexes() {
            push(
                IndexDefinition::with_fields(IndexType::Fulltext, index.fields)
                    .min_length(index.min_length),
            );
        }

        for property in &self.properties {
            let field = vec![property.field_name().to_string()];
            if let Some(indexed) = property.hash_indexed() {
                push(
                    IndexDefinition::with_fields(IndexType::Hash, field.clone())
                        .unique(indexed.unique)
                        .sparse(indexed.sparse)
                        .deduplicate(indexed.deduplicate),
                );
            }
            if let Some(indexed) = property.skiplist_indexed() {
                push(
                    IndexDefinition::with_fields(IndexType::Skiplist, field.clone())
                        .unique(indexed.unique)
                        .sparse(indexed.sparse)
                        .deduplicate(indexed.deduplicate),
                );
            }
            if let Some(indexed) = property.persistent_indexed() {
                push(
                    IndexDefinition::with_fields(IndexType::Persistent, field.clone())
                        .unique(indexed.unique)
                        .sparse(indexed.sparse),
                );
            }
            if let Some(indexed) = property.geo_indexed() {
                push(IndexDefinition::with_fields(IndexType::Geo, field.clone()).geo_json(indexed.geo_json));
            }
            if let Some(indexed) = property.fulltext_indexed() {
                push(IndexDefinition::with_fields(IndexType::Fulltext, field).min_length(indexed.min_length));
            }
        }
        definitions
    }

    /// Returns the repeatable annotations of `kind`, scanning the type at most once.
    pub fn find_repeatable(&self, kind: AnnotationKind) -> Arc<Vec<Annotation>> {
        self.cache.find_repeatable(kind)
    }

    /// Number of annotation scans performed for this type.
    pub fn scan_count(&self) -> usize {
        self.cache.scan_count()
    }

    /// Converts an entity into a stored document.
    ///
    /// Identity properties are renamed to `_key`, `_id` and `_rev`; identity
    /// properties without a value are left out.
    pub fn to_document<T: Serialize>(&self, entity: &T) -> OdmResult<Document> {
        let mut document = match serde_json::to_value(entity)? {
            Value::Object(map) => map,
            other => {
                log::error!("{} does not serialize to an object: {}", self.type_name(), other);
                return Err(OdmError::new(
                    &format!("{} must serialize to an object", self.type_name()),
                    ErrorKind::ObjectMappingError,
                ));
            }
        };

        for property in self.identity_properties() {
            if property.name() == property.field_name() {
                continue;
            }
            match document.remove(property.name()) {
                Some(Value::Null) | None => {}
                Some(value) => {
                    document.insert(property.field_name().to_string(), value);
                }
            }
        }
        Ok(document)
    }

    /// Converts a stored document back into an entity.
    ///
    /// System attributes the type does not map are dropped.
    pub fn from_document<T: DeserializeOwned>(&self, mut document: Document) -> OdmResult<T> {
        for system_attribute in [DOC_KEY, DOC_ID, DOC_REV] {
            let value = document.remove(system_attribute);
            let target = self
                .identity_properties()
                .find(|property| property.field_name() == system_attribute);
            match (target, value) {
                (Some(property), Some(value)) => {
                    document.insert(property.name().to_string(), value);
                }
                (None, Some(value)) if self.property(system_attribute).is_some() => {
                    document.insert(system_attribute.to_string(), value);
                }
                _ => {}
            }
        }
        Ok(serde_json::from_value(Value::Object(document))?)
    }

    fn identity_properties(&self) -> impl Iterator<Item = &ArangoPersistentProperty> {
        [self.id_property(), self.arango_id_property(), self.rev_property()]
            .into_iter()
            .flatten()
    }

    fn select(&self, indices: &[usize]) -> Vec<&ArangoPersistentProperty> {
        indices.iter().map(|idx| &self.properties[*idx]).collect()
    }

    fn collect_indexes<I>(&self, kind: AnnotationKind, extract: impl Fn(&Annotation) -> Option<I>) -> Vec<I> {
        self.cache
            .find_repeatable(kind)
            .iter()
            .filter_map(extract)
            .collect()
    }
}

impl Debug for ArangoPersistentEntity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArangoPersistentEntity")
            .field("type_name", &self.type_name())
            .field("collection_kind", &self.collection_kind)
            .field("collection", &self.collection_template.as_ref().map(|t| t.raw()))
            .field("view", &self.view_template.as_ref().map(|t| t.raw()))
            .finish()
    }
}

type IdentityIndices = (Option<usize>, Option<usize>, Option<usize>);

fn resolve_identity(
    type_name: &str,
    properties: &[ArangoPersistentProperty],
) -> OdmResult<IdentityIndices> {
    if let Some(property) = properties.iter().find(|p| p.identity_roles() > 1) {
        log::error!(
            "Property {}.{} claims more than one of _key, _id and _rev",
            type_name,
            property.name()
        );
        return Err(OdmError::new(
            &format!(
                "Property {}.{} claims more than one of _key, _id and _rev",
                type_name,
                property.name()
            ),
            ErrorKind::ConfigurationError,
        ));
    }

    let single = |role: &str, predicate: fn(&ArangoPersistentProperty) -> bool| -> OdmResult<Option<usize>> {
        let found: Vec<usize> = properties
            .iter()
            .enumerate()
            .filter(|(_, property)| predicate(property))
            .map(|(idx, _)| idx)
            .collect();
        if found.len() > 1 {
            let names: Vec<&str> = found.iter().map(|idx| properties[*idx].name()).collect();
            log::error!("{} declares more than one {} property: {:?}", type_name, role, names);
            return Err(OdmError::new(
                &format!(
                    "{} declares more than one {} property: {}",
                    type_name,
                    role,
                    names.join(", ")
                ),
                ErrorKind::ConfigurationError,
            ));
        }
        Ok(found.first().copied())
    };

    Ok((
        single(DOC_KEY, |p| p.is_id_property())?,
        single(DOC_ID, |p| p.is_arango_id_property())?,
        single(DOC_REV, |p| p.is_rev_property())?,
    ))
}

fn derive_collection_options(kind: CollectionKind, annotation: &CollectionAnnotation) -> CollectionCreateOptions {
    let mut options = CollectionCreateOptions::new(kind);
    options.wait_for_sync = annotation.wait_for_sync;
    options.do_compact = annotation.do_compact;
    options.is_volatile = annotation.is_volatile;
    options.is_system = annotation.is_system;
    options.journal_size = set_value(annotation.journal_size);
    options.replication_factor = set_value(annotation.replication_factor);
    options.satellite = annotation.satellite.then_some(true);
    // edges take any declared shard keys, documents only non-blank ones
    let shard_keys_set = match kind {
        CollectionKind::Edge => !annotation.shard_keys.is_empty(),
        _ => has_text(&annotation.shard_keys),
    };
    if shard_keys_set {
        options.shard_keys = Some(annotation.shard_keys.clone());
    }
    options.number_of_shards = set_value(annotation.number_of_shards);
    options.index_buckets = set_value(annotation.index_buckets);
    if annotation.allow_user_keys {
        options.key_options = Some(KeyOptions {
            allow_user_keys: true,
            key_type: annotation.key_type,
            increment: set_value(annotation.key_increment),
            offset: set_value(annotation.key_offset),
        });
    }
    options
}

fn derive_search_options(annotation: &SearchViewAnnotation) -> ArangoSearchPropertiesOptions {
    let mut options = ArangoSearchPropertiesOptions::new();
    if !annotation.locale.is_empty() {
        options = options.locale(&annotation.locale);
    }
    if let Some(commit_interval_msec) = set_value(annotation.commit_interval_msec) {
        options = options.commit_interval_msec(commit_interval_msec);
    }
    if let Some(cleanup_interval_step) = set_value(annotation.cleanup_interval_step) {
        options = options.cleanup_interval_step(cleanup_interval_step);
    }

    let declared = [
        (ConsolidateType::Count, annotation.count_threshold, annotation.count_segment_threshold),
        (ConsolidateType::Bytes, annotation.bytes_threshold, annotation.bytes_segment_threshold),
        (
            ConsolidateType::BytesAccum,
            annotation.bytes_accum_threshold,
            annotation.bytes_accum_segment_threshold,
        ),
        (ConsolidateType::Fill, annotation.fill_threshold, annotation.fill_segment_threshold),
    ];
    for (kind, threshold, segment_threshold) in declared {
        if let Some(threshold) = consolidate_threshold(kind, threshold, segment_threshold) {
            options = options.with_threshold(threshold);
        }
    }
    options
}

fn consolidate_threshold(
    kind: ConsolidateType,
    threshold: f64,
    segment_threshold: i64,
) -> Option<ConsolidateThreshold> {
    if threshold <= UNSET as f64 && segment_threshold <= UNSET {
        return None;
    }
    let mut result = ConsolidateThreshold::of(kind);
    if threshold > UNSET as f64 {
        result = result.threshold(threshold);
    }
    if segment_threshold > UNSET {
        result = result.segment_threshold(segment_threshold);
    }
    Some(result)
}

fn derive_link_settings(annotation: &SearchViewAnnotation) -> CollectionLink {
    let mut link = CollectionLink::on("");
    link.analyzers = annotation.analyzers.clone();
    link.include_all_fields = annotation.include_all_fields;
    link.track_list_positions = annotation.track_list_positions;
    link.store_values = annotation.store_values;
    link
}

fn set_value(value: i64) -> Option<i64> {
    (value > UNSET).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{
        FieldLinkAnnotation, HashIndexed, KeyType, MapEvaluationContext, PropertyAnnotation,
        PropertyDescription,
    };
    use serde::Deserialize;

    fn entity(description: TypeDescription) -> ArangoPersistentEntity {
        ArangoPersistentEntity::new(description, ContextHolder::new()).unwrap()
    }

    #[test]
    fn test_unnamed_document_uses_type_name() {
        let entity = entity(
            TypeDescription::builder("Customer")
                .annotation(Annotation::Document(CollectionAnnotation::default()))
                .build(),
        );
        assert_eq!(entity.collection().unwrap(), "customer");
        assert_eq!(entity.collection_kind(), CollectionKind::Document);
    }

    #[test]
    fn test_undeclared_type_maps_to_document_collection() {
        let entity = entity(TypeDescription::builder("ViewEntityA").build());
        assert_eq!(entity.collection().unwrap(), "viewEntityA");
        assert_eq!(entity.collection_kind(), CollectionKind::Document);
        assert_eq!(
            entity.collection_options(),
            Some(&CollectionCreateOptions::new(CollectionKind::Document))
        );
        assert!(entity.arango_search_view().unwrap().is_none());
    }

    #[test]
    fn test_edge_wins_over_document() {
        let entity = entity(
            TypeDescription::builder("Knows")
                .annotation(Annotation::Document(CollectionAnnotation::named("docs")))
                .annotation(Annotation::Edge(CollectionAnnotation::named("knows")))
                .build(),
        );
        assert_eq!(entity.collection_kind(), CollectionKind::Edge);
        assert_eq!(entity.collection().unwrap(), "knows");
        assert_eq!(entity.collection_options().unwrap().kind, CollectionKind::Edge);
    }

    #[test]
    fn test_view_only_type_has_no_collection() {
        let entity = entity(
            TypeDescription::builder("SearchOnly")
                .annotation(Annotation::SearchView(SearchViewAnnotation::default()))
                .property(
                    PropertyDescription::new("value")
                        .with(PropertyAnnotation::FieldLink(FieldLinkAnnotation::default())),
                )
                .build(),
        );
        assert_eq!(entity.collection_kind(), CollectionKind::None);
        assert!(!entity.has_collection());
        assert!(entity.collection_options().is_none());
        assert_eq!(entity.collection().unwrap_err().kind(), &ErrorKind::CollectionNotFound);
        assert_eq!(entity.arango_search_view().unwrap().as_deref(), Some("searchOnly"));
        assert!(entity.collection_link().unwrap().is_none());
        assert!(entity.arango_search_options().unwrap().unwrap().links.is_empty());
    }

    #[test]
    fn test_unset_sentinels_are_skipped() {
        let entity = entity(
            TypeDescription::builder("Plain")
                .annotation(Annotation::Document(CollectionAnnotation {
                    shard_keys: vec!["".to_string()],
                    ..Default::default()
                }))
                .build(),
        );
        let options = entity.collection_options().unwrap();
        assert_eq!(options.journal_size, None);
        assert_eq!(options.replication_factor, None);
        assert_eq!(options.number_of_shards, None);
        assert_eq!(options.index_buckets, None);
        assert_eq!(options.satellite, None);
        assert_eq!(options.shard_keys, None);
        assert_eq!(options.key_options, None);
    }

    #[test]
    fn test_edge_keeps_declared_shard_keys() {
        let route = entity(
            TypeDescription::builder("Route")
                .annotation(Annotation::Edge(CollectionAnnotation {
                    shard_keys: vec!["".to_string()],
                    ..Default::default()
                }))
                .build(),
        );
        let options = route.collection_options().unwrap();
        assert_eq!(options.kind, CollectionKind::Edge);
        assert_eq!(options.shard_keys, Some(vec!["".to_string()]));

        let hop = entity(
            TypeDescription::builder("Hop")
                .annotation(Annotation::Edge(CollectionAnnotation::default()))
                .build(),
        );
        assert_eq!(hop.collection_options().unwrap().shard_keys, None);
    }

    #[test]
    fn test_explicit_collection_options() {
        let entity = entity(
            TypeDescription::builder("Tuned")
                .annotation(Annotation::Document(CollectionAnnotation {
                    name: "tuned".to_string(),
                    journal_size: 0,
                    replication_factor: 2,
                    satellite: true,
                    shard_keys: vec!["region".to_string()],
                    allow_user_keys: true,
                    key_type: KeyType::Autoincrement,
                    key_increment: 5,
                    ..Default::default()
                }))
                .build(),
        );
        let options = entity.collection_options().unwrap();
        assert_eq!(options.journal_size, Some(0));
        assert_eq!(options.replication_factor, Some(2));
        assert_eq!(options.satellite, Some(true));
        assert_eq!(options.shard_keys, Some(vec!["region".to_string()]));
        assert_eq!(
            options.key_options,
            Some(KeyOptions {
                allow_user_keys: true,
                key_type: KeyType::Autoincrement,
                increment: Some(5),
                offset: None,
            })
        );
    }

    #[test]
    fn test_single_threshold_is_derived() {
        let entity = entity(
            TypeDescription::builder("Indexed")
                .annotation(Annotation::Document(CollectionAnnotation::default()))
                .annotation(Annotation::SearchView(SearchViewAnnotation {
                    name: "view".to_string(),
                    count_threshold: 1.0,
                    ..Default::default()
                }))
                .build(),
        );
        let options = entity.arango_search_options().unwrap().unwrap();
        assert_eq!(options.thresholds.len(), 1);
        assert_eq!(
            options.threshold_of(ConsolidateType::Count),
            Some(&ConsolidateThreshold::of(ConsolidateType::Count).threshold(1.0))
        );
        assert!(options.locale.is_none());
        assert!(options.commit_interval_msec.is_none());
    }

    #[test]
    fn test_segment_threshold_alone_creates_entry() {
        let entity = entity(
            TypeDescription::builder("Indexed")
                .annotation(Annotation::SearchView(SearchViewAnnotation {
                    fill_segment_threshold: 3,
                    ..Default::default()
                }))
                .build(),
        );
        let options = entity.arango_search_options().unwrap().unwrap();
        let fill = options.threshold_of(ConsolidateType::Fill).unwrap();
        assert_eq!(fill.threshold, None);
        assert_eq!(fill.segment_threshold, Some(3));
    }

    #[test]
    fn test_duplicate_id_fails_fast() {
        let result = ArangoPersistentEntity::new(
            TypeDescription::builder("Broken")
                .property(PropertyDescription::new("id").with(PropertyAnnotation::Id))
                .property(PropertyDescription::new("key").with(PropertyAnnotation::Id))
                .build(),
            ContextHolder::new(),
        );
        let err = result.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ConfigurationError);
        assert!(err.message().contains("id, key"));
    }

    #[test]
    fn test_duplicate_rev_and_combined_roles_fail_fast() {
        let duplicate_rev = ArangoPersistentEntity::new(
            TypeDescription::builder("Broken")
                .property(PropertyDescription::new("a").with(PropertyAnnotation::Rev))
                .property(PropertyDescription::new("b").with(PropertyAnnotation::Rev))
                .build(),
            ContextHolder::new(),
        );
        assert_eq!(duplicate_rev.unwrap_err().kind(), &ErrorKind::ConfigurationError);

        let combined = ArangoPersistentEntity::new(
            TypeDescription::builder("Broken")
                .property(
                    PropertyDescription::new("a")
                        .with(PropertyAnnotation::Id)
                        .with(PropertyAnnotation::Rev),
                )
                .build(),
            ContextHolder::new(),
        );
        assert_eq!(combined.unwrap_err().kind(), &ErrorKind::ConfigurationError);
    }

    #[test]
    fn test_invalid_name_template_fails_fast() {
        let result = ArangoPersistentEntity::new(
            TypeDescription::builder("Broken")
                .annotation(Annotation::Document(CollectionAnnotation::named("orders-{tenant")))
                .build(),
            ContextHolder::new(),
        );
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::ConfigurationError);
    }

    #[test]
    fn test_templated_names_follow_context() {
        let holder = ContextHolder::new();
        let entity = ArangoPersistentEntity::new(
            TypeDescription::builder("Order")
                .annotation(Annotation::Document(CollectionAnnotation::named("orders-{tenant}")))
                .annotation(Annotation::SearchView(SearchViewAnnotation::named("{tenant}-search")))
                .build(),
            holder.clone(),
        )
        .unwrap();
        assert_eq!(entity.collection().unwrap_err().kind(), &ErrorKind::UnresolvedExpression);

        let context = Arc::new(MapEvaluationContext::new().with("tenant", "acme"));
        holder.install(context.clone());
        assert_eq!(entity.collection().unwrap(), "orders-acme");
        assert_eq!(entity.arango_search_view().unwrap().as_deref(), Some("acme-search"));
        assert_eq!(entity.collection_link().unwrap().unwrap().name, "orders-acme");

        context.set("tenant", "globex");
        assert_eq!(entity.collection().unwrap(), "orders-globex");
    }

    #[test]
    fn test_index_groups_and_link() {
        let entity = entity(
            TypeDescription::builder("Product")
                .annotation(Annotation::Document(CollectionAnnotation::named("products")))
                .annotation(Annotation::SearchView(SearchViewAnnotation {
                    name: "productView".to_string(),
                    analyzers: vec!["text_en".to_string()],
                    include_all_fields: true,
                    ..Default::default()
                }))
                .property(PropertyDescription::new("id").with(PropertyAnnotation::Id))
                .property(
                    PropertyDescription::new("sku")
                        .with(PropertyAnnotation::HashIndexed(HashIndexed {
                            unique: true,
                            ..Default::default()
                        }))
                        .with(PropertyAnnotation::FieldLink(FieldLinkAnnotation::default())),
                )
                .property(PropertyDescription::new("name"))
                .property(
                    PropertyDescription::new("code")
                        .with(PropertyAnnotation::HashIndexed(HashIndexed::default())),
                )
                .build(),
        );
        let hashed: Vec<&str> = entity.hash_indexed_properties().iter().map(|p| p.name()).collect();
        assert_eq!(hashed, vec!["sku", "code"]);
        assert!(entity.skiplist_indexed_properties().is_empty());
        assert_eq!(entity.id_property().unwrap().name(), "id");
        assert!(entity.rev_property().is_none());

        let link = entity.collection_link().unwrap().unwrap();
        assert_eq!(link.name, "products");
        assert_eq!(link.analyzers, vec!["text_en"]);
        assert!(link.include_all_fields);
        assert_eq!(link.fields.len(), 1);
        assert_eq!(link.fields[0].name, "sku");

        let definitions = entity.index_definitions();
        assert_eq!(definitions.len(), 2);
        assert!(definitions[0].is_unique());
        assert_eq!(definitions[1].fields(), &["code".to_string()]);
    }

    #[test]
    fn test_type_level_indexes_through_cache() {
        let entity = entity(
            TypeDescription::builder("Product")
                .annotation(Annotation::HashIndex(HashIndex {
                    fields: vec!["a".to_string()],
                    ..Default::default()
                }))
                .annotation(Annotation::GeoIndexes(vec![GeoIndex {
                    fields: vec!["location".to_string()],
                    geo_json: true,
                }]))
                .build(),
        );
        let scans = entity.scan_count();
        assert_eq!(entity.hash_indexes().len(), 1);
        assert_eq!(entity.hash_indexes().len(), 1);
        assert_eq!(entity.scan_count(), scans + 1);
        assert!(entity.geo_indexes()[0].geo_json);
        assert_eq!(entity.index_definitions().len(), 2);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Person {
        id: Option<String>,
        rev: Option<String>,
        name: String,
    }

    fn person_entity() -> ArangoPersistentEntity {
        entity(
            TypeDescription::builder("Person")
                .property(PropertyDescription::new("id").with(PropertyAnnotation::Id))
                .property(PropertyDescription::new("rev").with(PropertyAnnotation::Rev))
                .property(PropertyDescription::new("name"))
                .build(),
        )
    }

    #[test]
    fn test_to_document_renames_identity() {
        let entity = person_entity();
        let person = Person {
            id: Some("1".to_string()),
            rev: None,
            name: "Ann".to_string(),
        };
        let document = entity.to_document(&person).unwrap();
        assert_eq!(document.get("_key"), Some(&Value::from("1")));
        assert!(!document.contains_key("id"));
        assert!(!document.contains_key("rev"));
        assert!(!document.contains_key("_rev"));
        assert_eq!(document.get("name"), Some(&Value::from("Ann")));
    }

    #[test]
    fn test_from_document_restores_identity() {
        let entity = person_entity();
        let mut document = Document::new();
        document.insert("_key".to_string(), Value::from("1"));
        document.insert("_id".to_string(), Value::from("person/1"));
        document.insert("_rev".to_string(), Value::from("_abc"));
        document.insert("name".to_string(), Value::from("Ann"));

        let person: Person = entity.from_document(document).unwrap();
        assert_eq!(
            person,
            Person {
                id: Some("1".to_string()),
                rev: Some("_abc".to_string()),
                name: "Ann".to_string(),
            }
        );
    }

    #[test]
    fn test_to_document_rejects_non_objects() {
        let entity = person_entity();
        let err = entity.to_document(&"plain").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ObjectMappingError);
    }
}
