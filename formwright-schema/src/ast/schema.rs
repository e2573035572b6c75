//! Named schema definitions and schema documents.

use std::path::Path;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

use super::lenient;
use super::{PropertySchema, SchemaComponent};
use crate::error::{SchemaError, SchemaResult};

/// A named object schema: ordered properties plus a required set.
///
/// A definition without `properties` deserializes to an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchemaDefinition {
    /// Schema name; filled in from the document key.
    #[serde(skip)]
    pub name: SmolStr,
    /// Declared type, normally `object`.
    #[serde(
        rename = "type",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional"
    )]
    pub type_name: Option<SmolStr>,
    /// Properties in declaration order.
    #[serde(deserialize_with = "lenient::map")]
    pub properties: IndexMap<SmolStr, PropertySchema>,
    /// Names of properties that must be present.
    #[serde(skip_serializing_if = "IndexSet::is_empty", deserialize_with = "lenient::list")]
    pub required: IndexSet<SmolStr>,
    /// Schema-level composition.
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "lenient::list")]
    pub all_of: Vec<SchemaComponent>,
}

impl SchemaDefinition {
    /// Create an empty schema.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            type_name: Some(SmolStr::new_static("object")),
            ..Default::default()
        }
    }

    /// Append a property; its id becomes the map key.
    pub fn with_property(mut self, property: PropertySchema) -> Self {
        self.add_property(property);
        self
    }

    /// Mark a property as required.
    pub fn with_required(mut self, name: impl Into<SmolStr>) -> Self {
        self.required.insert(name.into());
        self
    }

    /// Append a schema-level composition entry.
    pub fn with_all_of(mut self, component: SchemaComponent) -> Self {
        self.all_of.push(component);
        self
    }

    /// Append a property.
    pub fn add_property(&mut self, property: PropertySchema) {
        self.properties.insert(property.id.clone(), property);
    }

    /// Get a property by name.
    pub fn get_property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.get(name)
    }

    /// Whether the named property is required.
    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    /// Property names in declaration order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(|s| s.as_str())
    }

    /// Whether the schema declares no properties and no composition.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.all_of.is_empty()
    }

    /// Fill in the schema name and every property id from their map keys.
    pub fn normalize(&mut self, name: impl Into<SmolStr>) {
        self.name = name.into();
        for (key, property) in self.properties.iter_mut() {
            property.assign_id(key);
        }
        for component in self.all_of.iter_mut() {
            for (key, property) in component.properties.iter_mut() {
                property.assign_id(key);
            }
        }
    }
}

/// A set of named schemas, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDocument {
    schemas: IndexMap<SmolStr, Arc<SchemaDefinition>>,
}

impl SchemaDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from JSON.
    ///
    /// Accepts an OpenAPI document (`components.schemas`), a JSON-schema
    /// style `definitions` map, or a bare map of name to schema.
    pub fn from_json(source: &str) -> SchemaResult<Self> {
        let value: Value = serde_json::from_str(source)?;
        Self::from_value(value)
    }

    /// Load a document from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    /// Build a document from an already parsed JSON value.
    pub fn from_value(mut value: Value) -> SchemaResult<Self> {
        let schemas = match value
            .pointer_mut("/components/schemas")
            .map(Value::take)
            .or_else(|| value.get_mut("definitions").map(Value::take))
        {
            Some(schemas) => schemas,
            None => value,
        };

        let Value::Object(entries) = schemas else {
            return Err(SchemaError::ConfigError {
                message: "schema document must be a JSON object".to_string(),
            });
        };

        let mut document = Self::new();
        for (name, raw) in entries {
            let mut definition = match SchemaDefinition::deserialize(&raw) {
                Ok(definition) => definition,
                Err(e) => {
                    tracing::warn!(schema = %name, error = %e, "Skipping unreadable schema");
                    continue;
                }
            };
            definition.normalize(name.as_str());
            document.insert(definition);
        }

        tracing::debug!(schemas = document.len(), "Loaded schema document");
        Ok(document)
    }

    /// Add or replace a schema.
    pub fn insert(&mut self, definition: SchemaDefinition) {
        self.schemas
            .insert(definition.name.clone(), Arc::new(definition));
    }

    /// Get a schema by name.
    pub fn get(&self, name: &str) -> Option<&Arc<SchemaDefinition>> {
        self.schemas.get(name)
    }

    /// Whether a schema exists.
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Schema names in document order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(|s| s.as_str())
    }

    /// Iterate schemas in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SchemaDefinition>> {
        self.schemas.values()
    }

    /// Number of schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the document is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Clone out the full name-to-schema map.
    pub fn to_map(&self) -> IndexMap<SmolStr, Arc<SchemaDefinition>> {
        self.schemas.clone()
    }
}

impl FromIterator<SchemaDefinition> for SchemaDocument {
    fn from_iter<I: IntoIterator<Item = SchemaDefinition>>(iter: I) -> Self {
        let mut document = Self::new();
        for definition in iter {
            document.insert(definition);
        }
        document
    }
}

impl std::fmt::Display for SchemaDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Schema {}({} properties, {} required)",
            self.name,
            self.properties.len(),
            self.required.len()
        )
    }
}
