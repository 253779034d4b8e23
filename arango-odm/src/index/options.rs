use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::common::{FULLTEXT_INDEX, GEO_INDEX, HASH_INDEX, PERSISTENT_INDEX, SKIPLIST_INDEX};

/// The kind of a collection index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    Hash,
    Skiplist,
    Persistent,
    Geo,
    Fulltext,
}

impl IndexType {
    pub fn name(&self) -> &'static str {
        match self {
            IndexType::Hash => HASH_INDEX,
            IndexType::Skiplist => SKIPLIST_INDEX,
            IndexType::Persistent => PERSISTENT_INDEX,
            IndexType::Geo => GEO_INDEX,
            IndexType::Fulltext => FULLTEXT_INDEX,
        }
    }

    /// Returns whether this index kind can enforce uniqueness.
    pub fn supports_unique(&self) -> bool {
        matches!(self, IndexType::Hash | IndexType::Skiplist | IndexType::Persistent)
    }
}

impl Display for IndexType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Specifies an index to ensure on a collection.
///
/// # Characteristics
/// - **Fields**: one or more document attribute paths
/// - **Type specific options**: `unique`/`sparse`/`deduplicate` for hash,
///   skiplist and persistent indexes, `geo_json` for geo indexes and
///   `min_length` for fulltext indexes. Options that do not apply to the
///   index type are left unset.
/// - **Equality**: two definitions are the same index when every attribute
///   matches, which is how ensuring an index twice stays a no-op.
///
/// # Usage
/// ```ignore
/// let by_email = hash_index(vec!["email"]).unique(true);
/// let by_location = geo_index(vec!["location"]).geo_json(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDefinition {
    #[serde(rename = "type")]
    index_type: IndexType,
    fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sparse: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deduplicate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    geo_json: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_length: Option<i64>,
}

impl IndexDefinition {
    /// Creates a definition of the given type over `fields` with no options set.
    pub fn new(index_type: IndexType, fields: Vec<&str>) -> Self {
        Self::with_fields(index_type, fields.iter().map(|f| f.to_string()).collect())
    }

    pub fn with_fields(index_type: IndexType, fields: Vec<String>) -> Self {
        IndexDefinition {
            index_type,
            fields,
            unique: None,
            sparse: None,
            deduplicate: None,
            geo_json: None,
            min_length: None,
        }
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    pub fn sparse(mut self, sparse: bool) -> Self {
        self.sparse = Some(sparse);
        self
    }

    pub fn deduplicate(mut self, deduplicate: bool) -> Self {
        self.deduplicate = Some(deduplicate);
        self
    }

    pub fn geo_json(mut self, geo_json: bool) -> Self {
        self.geo_json = Some(geo_json);
        self
    }

    /// Sets the minimum word length of a fulltext index; negative values
    /// leave it unset.
    pub fn min_length(mut self, min_length: i64) -> Self {
        self.min_length = (min_length > -1).then_some(min_length);
        self
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_unique(&self) -> bool {
        self.unique.unwrap_or(false)
    }

    pub fn is_sparse(&self) -> bool {
        self.sparse.unwrap_or(false)
    }

    pub fn is_geo_json(&self) -> bool {
        self.geo_json.unwrap_or(false)
    }

    pub fn deduplicates(&self) -> bool {
        self.deduplicate.unwrap_or(false)
    }

    pub fn get_min_length(&self) -> Option<i64> {
        self.min_length
    }
}

/// Creates a hash index definition.
pub fn hash_index(fields: Vec<&str>) -> IndexDefinition {
    IndexDefinition::new(IndexType::Hash, fields)
}

/// Creates a skiplist index definition.
pub fn skiplist_index(fields: Vec<&str>) -> IndexDefinition {
    IndexDefinition::new(IndexType::Skiplist, fields)
}

/// Creates a persistent index definition.
pub fn persistent_index(fields: Vec<&str>) -> IndexDefinition {
    IndexDefinition::new(IndexType::Persistent, fields)
}

/// Creates a geo index definition.
pub fn geo_index(fields: Vec<&str>) -> IndexDefinition {
    IndexDefinition::new(IndexType::Geo, fields)
}

/// Creates a fulltext index definition.
pub fn fulltext_index(fields: Vec<&str>) -> IndexDefinition {
    IndexDefinition::new(IndexType::Fulltext, fields)
}
