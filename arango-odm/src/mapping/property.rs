use crate::common::{DOC_ID, DOC_KEY, DOC_REV};
use crate::mapping::{
    FieldLink, FieldLinkAnnotation, FulltextIndexed, GeoIndexed, HashIndexed, PersistentIndexed,
    PropertyAnnotation, PropertyDescription, SkiplistIndexed,
};

/// A mapped property of an entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct ArangoPersistentProperty {
    name: String,
    annotations: Vec<PropertyAnnotation>,
}

impl ArangoPersistentProperty {
    pub fn new(description: &PropertyDescription) -> Self {
        ArangoPersistentProperty {
            name: description.name().to_string(),
            annotations: description.annotations().to_vec(),
        }
    }

    /// The attribute name of the property in the serialized entity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attribute name of the property in stored documents.
    ///
    /// Identity properties are stored under the system attributes
    /// `_key`, `_id` and `_rev`.
    pub fn field_name(&self) -> &str {
        if self.is_id_property() {
            DOC_KEY
        } else if self.is_arango_id_property() {
            DOC_ID
        } else if self.is_rev_property() {
            DOC_REV
        } else {
            &self.name
        }
    }

    pub fn annotations(&self) -> &[PropertyAnnotation] {
        &self.annotations
    }

    pub fn is_id_property(&self) -> bool {
        self.annotations.contains(&PropertyAnnotation::Id)
    }

    pub fn is_arango_id_property(&self) -> bool {
        self.annotations.contains(&PropertyAnnotation::ArangoId)
    }

    pub fn is_rev_property(&self) -> bool {
        self.annotations.contains(&PropertyAnnotation::Rev)
    }

    /// Number of identity roles (`_key`, `_id`, `_rev`) the property claims.
    pub(crate) fn identity_roles(&self) -> usize {
        [
            self.is_id_property(),
            self.is_arango_id_property(),
            self.is_rev_property(),
        ]
        .iter()
        .filter(|role| **role)
        .count()
    }

    pub fn hash_indexed(&self) -> Option<&HashIndexed> {
        self.annotations.iter().find_map(|a| match a {
            PropertyAnnotation::HashIndexed(indexed) => Some(indexed),
            _ => None,
        })
    }

    pub fn skiplist_indexed(&self) -> Option<&SkiplistIndexed> {
        self.annotations.iter().find_map(|a| match a {
            PropertyAnnotation::SkiplistIndexed(indexed) => Some(indexed),
            _ => None,
        })
    }

    pub fn persistent_indexed(&self) -> Option<&PersistentIndexed> {
        self.annotations.iter().find_map(|a| match a {
            PropertyAnnotation::PersistentIndexed(indexed) => Some(indexed),
            _ => None,
        })
    }

    pub fn geo_indexed(&self) -> Option<&GeoIndexed> {
        self.annotations.iter().find_map(|a| match a {
            PropertyAnnotation::GeoIndexed(indexed) => Some(indexed),
            _ => None,
        })
    }

    pub fn fulltext_indexed(&self) -> Option<&FulltextIndexed> {
        self.annotations.iter().find_map(|a| match a {
            PropertyAnnotation::FulltextIndexed(indexed) => Some(indexed),
            _ => None,
        })
    }

    pub fn field_link(&self) -> Option<&FieldLinkAnnotation> {
        self.annotations.iter().find_map(|a| match a {
            PropertyAnnotation::FieldLink(link) => Some(link),
            _ => None,
        })
    }

    /// Builds the search view field link of a field-linked property.
    pub fn to_field_link(&self) -> Option<FieldLink> {
        self.field_link().map(|annotation| FieldLink {
            name: self.field_name().to_string(),
            analyzers: annotation.analyzers.clone(),
            include_all_fields: annotation.include_all_fields,
            track_list_positions: annotation.track_list_positions,
            store_values: annotation.store_values,
        })
    }
}
