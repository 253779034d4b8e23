//! Declarative mapping annotations.
//!
//! These structs mirror the attributes an entity type can declare. Numeric
//! attributes use [`UNSET`] and string or list attributes use an empty value
//! to mean "not declared"; derived options never carry such values.

use crate::common::{UNSET, UNSET_THRESHOLD};
use crate::mapping::{KeyType, StoreValues};

/// Attributes of a document or edge collection declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionAnnotation {
    pub name: String,
    pub wait_for_sync: bool,
    pub do_compact: bool,
    pub is_volatile: bool,
    pub is_system: bool,
    pub journal_size: i64,
    pub replication_factor: i64,
    pub satellite: bool,
    pub shard_keys: Vec<String>,
    pub number_of_shards: i64,
    pub index_buckets: i64,
    pub allow_user_keys: bool,
    pub key_type: KeyType,
    pub key_increment: i64,
    pub key_offset: i64,
}

impl CollectionAnnotation {
    pub fn named(name: &str) -> Self {
        CollectionAnnotation {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

impl Default for CollectionAnnotation {
    fn default() -> Self {
        CollectionAnnotation {
            name: String::new(),
            wait_for_sync: false,
            do_compact: true,
            is_volatile: false,
            is_system: false,
            journal_size: UNSET,
            replication_factor: UNSET,
            satellite: false,
            shard_keys: Vec::new(),
            number_of_shards: UNSET,
            index_buckets: UNSET,
            allow_user_keys: false,
            key_type: KeyType::Traditional,
            key_increment: UNSET,
            key_offset: UNSET,
        }
    }
}

/// Attributes of a search view declaration.
///
/// The link-level attributes (`analyzers` through `store_values`) configure
/// the link from the view to the declaring type's collection.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchViewAnnotation {
    pub name: String,
    pub locale: String,
    pub commit_interval_msec: i64,
    pub cleanup_interval_step: i64,
    pub count_threshold: f64,
    pub count_segment_threshold: i64,
    pub bytes_threshold: f64,
    pub bytes_segment_threshold: i64,
    pub bytes_accum_threshold: f64,
    pub bytes_accum_segment_threshold: i64,
    pub fill_threshold: f64,
    pub fill_segment_threshold: i64,
    pub analyzers: Vec<String>,
    pub include_all_fields: bool,
    pub track_list_positions: bool,
    pub store_values: StoreValues,
}

impl SearchViewAnnotation {
    pub fn named(name: &str) -> Self {
        SearchViewAnnotation {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

impl Default for SearchViewAnnotation {
    fn default() -> Self {
        SearchViewAnnotation {
            name: String::new(),
            locale: String::new(),
            commit_interval_msec: UNSET,
            cleanup_interval_step: UNSET,
            count_threshold: UNSET_THRESHOLD,
            count_segment_threshold: UNSET,
            bytes_threshold: UNSET_THRESHOLD,
            bytes_segment_threshold: UNSET,
            bytes_accum_threshold: UNSET_THRESHOLD,
            bytes_accum_segment_threshold: UNSET,
            fill_threshold: UNSET_THRESHOLD,
            fill_segment_threshold: UNSET,
            analyzers: Vec::new(),
            include_all_fields: false,
            track_list_positions: false,
            store_values: StoreValues::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HashIndex {
    pub fields: Vec<String>,
    pub unique: bool,
    pub sparse: bool,
    pub deduplicate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SkiplistIndex {
    pub fields: Vec<String>,
    pub unique: bool,
    pub sparse: bool,
    pub deduplicate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersistentIndex {
    pub fields: Vec<String>,
    pub unique: bool,
    pub sparse: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeoIndex {
    pub fields: Vec<String>,
    pub geo_json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulltextIndex {
    pub fields: Vec<String>,
    pub min_length: i64,
}

impl Default for FulltextIndex {
    fn default() -> Self {
        FulltextIndex {
            fields: Vec::new(),
            min_length: UNSET,
        }
    }
}

/// Identifies a kind of type-level annotation.
///
/// Container annotations (`HashIndexes`, ...) report the kind of the
/// annotations they aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    Document,
    Edge,
    SearchView,
    HashIndex,
    SkiplistIndex,
    PersistentIndex,
    GeoIndex,
    FulltextIndex,
}

/// A type-level annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Document(CollectionAnnotation),
    Edge(CollectionAnnotation),
    SearchView(SearchViewAnnotation),
    HashIndex(HashIndex),
    HashIndexes(Vec<HashIndex>),
    SkiplistIndex(SkiplistIndex),
    SkiplistIndexes(Vec<SkiplistIndex>),
    PersistentIndex(PersistentIndex),
    PersistentIndexes(Vec<PersistentIndex>),
    GeoIndex(GeoIndex),
    GeoIndexes(Vec<GeoIndex>),
    FulltextIndex(FulltextIndex),
    FulltextIndexes(Vec<FulltextIndex>),
}

impl Annotation {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Annotation::Document(_) => AnnotationKind::Document,
            Annotation::Edge(_) => AnnotationKind::Edge,
            Annotation::SearchView(_) => AnnotationKind::SearchView,
            Annotation::HashIndex(_) | Annotation::HashIndexes(_) => AnnotationKind::HashIndex,
            Annotation::SkiplistIndex(_) | Annotation::SkiplistIndexes(_) => {
                AnnotationKind::SkiplistIndex
            }
            Annotation::PersistentIndex(_) | Annotation::PersistentIndexes(_) => {
                AnnotationKind::PersistentIndex
            }
            Annotation::GeoIndex(_) | Annotation::GeoIndexes(_) => AnnotationKind::GeoIndex,
            Annotation::FulltextIndex(_) | Annotation::FulltextIndexes(_) => {
                AnnotationKind::FulltextIndex
            }
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Annotation::HashIndexes(_)
                | Annotation::SkiplistIndexes(_)
                | Annotation::PersistentIndexes(_)
                | Annotation::GeoIndexes(_)
                | Annotation::FulltextIndexes(_)
        )
    }

    /// Flattens a container annotation into its elements.
    ///
    /// Non-container annotations yield themselves.
    pub fn expand(&self) -> Vec<Annotation> {
        match self {
            Annotation::HashIndexes(items) => {
                items.iter().cloned().map(Annotation::HashIndex).collect()
            }
            Annotation::SkiplistIndexes(items) => {
                items.iter().cloned().map(Annotation::SkiplistIndex).collect()
            }
            Annotation::PersistentIndexes(items) => {
                items.iter().cloned().map(Annotation::PersistentIndex).collect()
            }
            Annotation::GeoIndexes(items) => {
                items.iter().cloned().map(Annotation::GeoIndex).collect()
            }
            Annotation::FulltextIndexes(items) => {
                items.iter().cloned().map(Annotation::FulltextIndex).collect()
            }
            other => vec![other.clone()],
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionAnnotation> {
        match self {
            Annotation::Document(annotation) | Annotation::Edge(annotation) => Some(annotation),
            _ => None,
        }
    }

    pub fn as_search_view(&self) -> Option<&SearchViewAnnotation> {
        match self {
            Annotation::SearchView(annotation) => Some(annotation),
            _ => None,
        }
    }

    pub fn as_hash_index(&self) -> Option<&HashIndex> {
        match self {
            Annotation::HashIndex(index) => Some(index),
            _ => None,
        }
    }

    pub fn as_skiplist_index(&self) -> Option<&SkiplistIndex> {
        match self {
            Annotation::SkiplistIndex(index) => Some(index),
            _ => None,
        }
    }

    pub fn as_persistent_index(&self) -> Option<&PersistentIndex> {
        match self {
            Annotation::PersistentIndex(index) => Some(index),
            _ => None,
        }
    }

    pub fn as_geo_index(&self) -> Option<&GeoIndex> {
        match self {
            Annotation::GeoIndex(index) => Some(index),
            _ => None,
        }
    }

    pub fn as_fulltext_index(&self) -> Option<&FulltextIndex> {
        match self {
            Annotation::FulltextIndex(index) => Some(index),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HashIndexed {
    pub unique: bool,
    pub sparse: bool,
    pub deduplicate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SkiplistIndexed {
    pub unique: bool,
    pub sparse: bool,
    pub deduplicate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersistentIndexed {
    pub unique: bool,
    pub sparse: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeoIndexed {
    pub geo_json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulltextIndexed {
    pub min_length: i64,
}

impl Default for FulltextIndexed {
    fn default() -> Self {
        FulltextIndexed { min_length: UNSET }
    }
}

/// Marks a property as part of the search view link of its type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldLinkAnnotation {
    pub analyzers: Vec<String>,
    pub include_all_fields: bool,
    pub track_list_positions: bool,
    pub store_values: StoreValues,
}

/// A property-level annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyAnnotation {
    /// The property holds the document key (`_key`).
    Id,
    /// The property holds the document handle (`_id`).
    ArangoId,
    /// The property holds the document revision (`_rev`).
    Rev,
    HashIndexed(HashIndexed),
    SkiplistIndexed(SkiplistIndexed),
    PersistentIndexed(PersistentIndexed),
    GeoIndexed(GeoIndexed),
    FulltextIndexed(FulltextIndexed),
    FieldLink(FieldLinkAnnotation),
}
