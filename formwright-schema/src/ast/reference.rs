//! Schema references (`$ref`) and composition entries (`allOf`).

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::lenient;
use super::{PropertySchema, SchemaDefinition};

/// Extract the schema name a `$ref` string points at.
///
/// Accepts `#/components/schemas/Name`, `#/definitions/Name`, `#/Name`
/// and a bare `Name`. Returns `None` for an empty reference.
pub fn schema_name_from_ref(reference: &str) -> Option<SmolStr> {
    let trimmed = reference.trim();
    let name = match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed.trim_start_matches('#'),
    };

    if name.is_empty() {
        None
    } else {
        Some(SmolStr::new(name))
    }
}

/// One entry of an `allOf` list.
///
/// Either a pointer to a named schema or an inline partial schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaComponent {
    /// Reference to a named schema.
    #[serde(
        rename = "$ref",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional"
    )]
    pub reference: Option<String>,
    /// Inline properties.
    #[serde(skip_serializing_if = "IndexMap::is_empty", deserialize_with = "lenient::map")]
    pub properties: IndexMap<SmolStr, PropertySchema>,
    /// Inline required set.
    #[serde(skip_serializing_if = "IndexSet::is_empty", deserialize_with = "lenient::list")]
    pub required: IndexSet<SmolStr>,
}

impl SchemaComponent {
    /// Create a component pointing at a named schema.
    pub fn reference(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Default::default()
        }
    }

    /// Create an inline component from a partial schema.
    pub fn inline(definition: SchemaDefinition) -> Self {
        Self {
            reference: None,
            properties: definition.properties,
            required: definition.required,
        }
    }

    /// The schema name this component references, if any.
    pub fn target_name(&self) -> Option<SmolStr> {
        self.reference.as_deref().and_then(schema_name_from_ref)
    }

    /// Whether this component carries inline properties.
    pub fn is_inline(&self) -> bool {
        self.reference.is_none() && !self.properties.is_empty()
    }

    /// Convert an inline component into an anonymous schema definition.
    pub fn to_definition(&self, name: impl Into<SmolStr>) -> SchemaDefinition {
        let mut definition = SchemaDefinition {
            properties: self.properties.clone(),
            required: self.required.clone(),
            ..Default::default()
        };
        definition.normalize(name);
        definition
    }
}

/// Where a reference leads: a named schema or an inline one.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaTarget {
    /// A schema looked up by name through the provider.
    Named(SmolStr),
    /// An inline `allOf` part.
    Inline(SchemaDefinition),
}

impl SchemaTarget {
    /// Label used for logging and cycle detection.
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) => name.as_str(),
            Self::Inline(definition) => definition.name.as_str(),
        }
    }
}
