use crate::common::simple_type_name;
use crate::mapping::{Annotation, PropertyAnnotation};

/// Trait that describes how an entity type maps to the database.
///
/// # Purpose
/// Provides the declared mapping configuration of a type: its type-level
/// annotations (document/edge/search view, repeatable indexes) and the
/// annotations of each declared property. The mapping context turns this
/// description into an [`ArangoPersistentEntity`](crate::mapping::ArangoPersistentEntity)
/// exactly once per type.
///
/// Typically implemented via the `ArangoEntity` derive macro, not manually.
///
/// # Usage
/// ```ignore
/// #[derive(ArangoEntity, Serialize, Deserialize)]
/// #[arango(document(name = "products"), hash_index(fields = "name, sku", unique))]
/// pub struct Product {
///     #[arango(id)]
///     id: Option<String>,
///     #[arango(rev)]
///     rev: Option<String>,
///     name: String,
/// }
/// ```
pub trait ArangoEntity: 'static {
    /// Returns the declared mapping configuration of this type.
    fn type_description() -> TypeDescription;

    /// Returns the simple name of the implementing type.
    fn type_name() -> String {
        simple_type_name::<Self>()
    }
}

/// A declared property of an entity type and its annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescription {
    name: String,
    annotations: Vec<PropertyAnnotation>,
}

impl PropertyDescription {
    /// Creates a property with the given attribute name.
    pub fn new(name: &str) -> Self {
        PropertyDescription {
            name: name.to_string(),
            annotations: Vec::new(),
        }
    }

    pub fn with(mut self, annotation: PropertyAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotations(&self) -> &[PropertyAnnotation] {
        &self.annotations
    }
}

/// The declared mapping configuration of one entity type.
///
/// `base` composes the configuration of a base type (for example a type
/// carrying a shared search view and field links): its annotations and
/// properties are inherited unless the type declares its own.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescription {
    type_name: String,
    annotations: Vec<Annotation>,
    properties: Vec<PropertyDescription>,
    base: Option<Box<TypeDescription>>,
}

impl TypeDescription {
    pub fn builder(type_name: &str) -> TypeDescriptionBuilder {
        TypeDescriptionBuilder::new(type_name)
    }

    /// The simple name of the described type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Type-level annotations in declaration order, without inherited ones.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Declared properties in declaration order, without inherited ones.
    pub fn properties(&self) -> &[PropertyDescription] {
        &self.properties
    }

    pub fn base(&self) -> Option<&TypeDescription> {
        self.base.as_deref()
    }

    /// Returns this type followed by its base chain.
    pub fn hierarchy(&self) -> Vec<&TypeDescription> {
        let mut chain = vec![self];
        let mut current = self.base();
        while let Some(description) = current {
            chain.push(description);
            current = description.base();
        }
        chain
    }

    /// Returns own properties followed by inherited properties whose name
    /// the type does not declare itself.
    pub fn effective_properties(&self) -> Vec<&PropertyDescription> {
        let mut result: Vec<&PropertyDescription> = Vec::new();
        for description in self.hierarchy() {
            for property in description.properties() {
                if !result.iter().any(|p| p.name() == property.name()) {
                    result.push(property);
                }
            }
        }
        result
    }
}

/// Builder for [`TypeDescription`].
pub struct TypeDescriptionBuilder {
    description: TypeDescription,
}

impl TypeDescriptionBuilder {
    fn new(type_name: &str) -> Self {
        TypeDescriptionBuilder {
            description: TypeDescription {
                type_name: type_name.to_string(),
                annotations: Vec::new(),
                properties: Vec::new(),
                base: None,
            },
        }
    }

    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.description.annotations.push(annotation);
        self
    }

    pub fn property(mut self, property: PropertyDescription) -> Self {
        self.description.properties.push(property);
        self
    }

    pub fn base(mut self, base: TypeDescription) -> Self {
        self.description.base = Some(Box::new(base));
        self
    }

    pub fn build(self) -> TypeDescription {
        self.description
    }
}
