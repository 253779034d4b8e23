use serde::{Deserialize, Serialize};

/// Kind of the backing collection of an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// A document collection.
    Document,
    /// An edge collection.
    Edge,
    /// The type is view-only and has no backing collection.
    None,
}

/// Key generator of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    #[default]
    Traditional,
    Autoincrement,
    Uuid,
    Padded,
}

/// Key generation options of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyOptions {
    pub allow_user_keys: bool,
    #[serde(rename = "type")]
    pub key_type: KeyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

/// Options used to create the backing collection of an entity type.
///
/// The optional values are only present when the source annotation set
/// them explicitly, so server-side defaults apply for everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCreateOptions {
    #[serde(rename = "type")]
    pub kind: CollectionKind,
    pub wait_for_sync: bool,
    pub do_compact: bool,
    pub is_volatile: bool,
    pub is_system: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_factor: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satellite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_keys: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_shards: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_buckets: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_options: Option<KeyOptions>,
}

impl CollectionCreateOptions {
    /// Creates options for a collection of the given kind with server defaults.
    pub fn new(kind: CollectionKind) -> Self {
        CollectionCreateOptions {
            kind,
            wait_for_sync: false,
            do_compact: true,
            is_volatile: false,
            is_system: false,
            journal_size: None,
            replication_factor: None,
            satellite: None,
            shard_keys: None,
            number_of_shards: None,
            index_buckets: None,
            key_options: None,
        }
    }

    /// Returns whether documents may be stored with a caller supplied `_key`.
    ///
    /// Collections without explicit key options use the traditional generator,
    /// which accepts user keys.
    pub fn allows_user_keys(&self) -> bool {
        self.key_options
            .as_ref()
            .map(|options| options.allow_user_keys)
            .unwrap_or(true)
    }
}

impl Default for CollectionCreateOptions {
    fn default() -> Self {
        CollectionCreateOptions::new(CollectionKind::Document)
    }
}

/// Consolidation policy kind of a search view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidateType {
    Count,
    Bytes,
    BytesAccum,
    Fill,
}

impl ConsolidateType {
    pub const ALL: [ConsolidateType; 4] = [
        ConsolidateType::Count,
        ConsolidateType::Bytes,
        ConsolidateType::BytesAccum,
        ConsolidateType::Fill,
    ];
}

/// A consolidation threshold of a search view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidateThreshold {
    #[serde(rename = "type")]
    pub kind: ConsolidateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_threshold: Option<i64>,
}

impl ConsolidateThreshold {
    pub fn of(kind: ConsolidateType) -> Self {
        ConsolidateThreshold {
            kind,
            threshold: None,
            segment_threshold: None,
        }
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn segment_threshold(mut self, segment_threshold: i64) -> Self {
        self.segment_threshold = Some(segment_threshold);
        self
    }
}

/// Which values a search view stores for a link or field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreValues {
    #[default]
    None,
    Id,
}

/// Per-field configuration inside a collection link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldLink {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub analyzers: Vec<String>,
    pub include_all_fields: bool,
    pub track_list_positions: bool,
    pub store_values: StoreValues,
}

impl FieldLink {
    pub fn on(name: &str) -> Self {
        FieldLink {
            name: name.to_string(),
            analyzers: Vec::new(),
            include_all_fields: false,
            track_list_positions: false,
            store_values: StoreValues::None,
        }
    }

    pub fn include_all_fields(mut self, include_all_fields: bool) -> Self {
        self.include_all_fields = include_all_fields;
        self
    }
}

/// Per-collection configuration of a search view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionLink {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub analyzers: Vec<String>,
    pub include_all_fields: bool,
    pub track_list_positions: bool,
    pub store_values: StoreValues,
    #[serde(default)]
    pub fields: Vec<FieldLink>,
}

impl CollectionLink {
    pub fn on(collection: &str) -> Self {
        CollectionLink {
            name: collection.to_string(),
            analyzers: Vec::new(),
            include_all_fields: false,
            track_list_positions: false,
            store_values: StoreValues::None,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldLink) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns the field link named `name`, if any.
    pub fn field_named(&self, name: &str) -> Option<&FieldLink> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Adds every field of `other` this link does not carry yet.
    ///
    /// Returns the number of fields added.
    pub fn merge_fields(&mut self, other: &CollectionLink) -> usize {
        let mut added = 0;
        for field in &other.fields {
            if self.field_named(&field.name).is_none() {
                self.fields.push(field.clone());
                added += 1;
            }
        }
        for analyzer in &other.analyzers {
            if !self.analyzers.contains(analyzer) {
                self.analyzers.push(analyzer.clone());
            }
        }
        added
    }
}

/// Properties of a search view: view-level settings plus collection links.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArangoSearchPropertiesOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_interval_msec: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup_interval_step: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thresholds: Vec<ConsolidateThreshold>,
    #[serde(default)]
    pub links: Vec<CollectionLink>,
}

impl ArangoSearchPropertiesOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn locale(mut self, locale: &str) -> Self {
        self.locale = Some(locale.to_string());
        self
    }

    pub fn commit_interval_msec(mut self, commit_interval_msec: i64) -> Self {
        self.commit_interval_msec = Some(commit_interval_msec);
        self
    }

    pub fn cleanup_interval_step(mut self, cleanup_interval_step: i64) -> Self {
        self.cleanup_interval_step = Some(cleanup_interval_step);
        self
    }

    /// Sets a threshold, replacing any existing threshold of the same kind.
    pub fn with_threshold(mut self, threshold: ConsolidateThreshold) -> Self {
        self.thresholds.retain(|existing| existing.kind != threshold.kind);
        self.thresholds.push(threshold);
        self
    }

    pub fn link(mut self, link: CollectionLink) -> Self {
        self.links.push(link);
        self
    }

    pub fn threshold_of(&self, kind: ConsolidateType) -> Option<&ConsolidateThreshold> {
        self.thresholds.iter().find(|threshold| threshold.kind == kind)
    }

    pub fn link_on(&self, collection: &str) -> Option<&CollectionLink> {
        self.links.iter().find(|link| link.name == collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_options_skip_unset_on_serialize() {
        let options = CollectionCreateOptions::new(CollectionKind::Edge);
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "edge",
                "waitForSync": false,
                "doCompact": true,
                "isVolatile": false,
                "isSystem": false
            })
        );
    }

    #[test]
    fn test_allows_user_keys() {
        let mut options = CollectionCreateOptions::default();
        assert!(options.allows_user_keys());
        options.key_options = Some(KeyOptions {
            allow_user_keys: false,
            key_type: KeyType::Autoincrement,
            increment: Some(5),
            offset: None,
        });
        assert!(!options.allows_user_keys());
    }

    #[test]
    fn test_with_threshold_replaces_same_kind() {
        let options = ArangoSearchPropertiesOptions::new()
            .with_threshold(ConsolidateThreshold::of(ConsolidateType::Count).threshold(1.0))
            .with_threshold(ConsolidateThreshold::of(ConsolidateType::Count).threshold(2.0))
            .with_threshold(ConsolidateThreshold::of(ConsolidateType::Fill).segment_threshold(3));
        assert_eq!(options.thresholds.len(), 2);
        assert_eq!(
            options.threshold_of(ConsolidateType::Count).and_then(|t| t.threshold),
            Some(2.0)
        );
        assert!(options.threshold_of(ConsolidateType::Bytes).is_none());
    }

    #[test]
    fn test_merge_fields_is_union() {
        let mut link = CollectionLink::on("a").field(FieldLink::on("value"));
        let other = CollectionLink::on("a")
            .field(FieldLink::on("value").include_all_fields(true))
            .field(FieldLink::on("name"));
        assert_eq!(link.merge_fields(&other), 1);
        assert_eq!(link.fields.len(), 2);
        // the first declaration of a field is kept
        assert!(!link.field_named("value").unwrap().include_all_fields);
    }

    #[test]
    fn test_search_options_round_trip_shape() {
        let options = ArangoSearchPropertiesOptions::new()
            .commit_interval_msec(65000)
            .with_threshold(ConsolidateThreshold::of(ConsolidateType::BytesAccum).threshold(0.5))
            .link(CollectionLink::on("c"));
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value["commitIntervalMsec"], json!(65000));
        assert_eq!(value["thresholds"][0]["type"], json!("bytes_accum"));
        assert!(value.get("locale").is_none());
        let back: ArangoSearchPropertiesOptions = serde_json::from_value(value).unwrap();
        assert_eq!(back, options);
    }
}
