//! Explicit model registration.
//!
//! Instead of annotating model types, each model's form fields are declared
//! with ordinary function calls at model-definition time:
//!
//! ```rust
//! use formwright_schema::registry::{FieldDescriptor, ModelRegistry, TypeTag};
//!
//! let registry = ModelRegistry::new();
//! registry.define("Address", |model| {
//!     model
//!         .field(FieldDescriptor::new("street", TypeTag::Text).required())
//!         .field(FieldDescriptor::new("zip", TypeTag::Text).length(Some(4.0), Some(10.0)))
//! });
//! registry.define("Customer", |model| {
//!     model
//!         .field(FieldDescriptor::new("email", TypeTag::Email).required())
//!         .field(FieldDescriptor::new("address", TypeTag::Model("Address".into())))
//! });
//!
//! let customer = registry.definition("Customer").unwrap();
//! assert_eq!(customer.properties["address"].reference.as_deref(), Some("#/Address"));
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use smol_str::SmolStr;

use crate::ast::{PropertySchema, SchemaComponent, SchemaDefinition, SchemaDocument};
use crate::error::SchemaResult;
use crate::provider::SchemaProvider;

/// Caller-supplied value type of a registered field.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeTag {
    /// Single-line text.
    Text,
    /// Multi-line text.
    TextArea,
    /// Email address.
    Email,
    /// Password (rendered masked).
    Password,
    /// Floating point number.
    Number,
    /// Whole number.
    Integer,
    /// True/false.
    Boolean,
    /// Calendar date.
    Date,
    /// Date and time.
    DateTime,
    /// File upload.
    File,
    /// One of a fixed set of values.
    Choice(Vec<Value>),
    /// Another registered model, rendered as a nested group.
    Model(SmolStr),
    /// Repeated values of the inner tag.
    List(Box<TypeTag>),
}

impl TypeTag {
    /// Schema `type` and `format` this tag maps to.
    pub fn type_and_format(&self) -> (Option<&'static str>, Option<&'static str>) {
        match self {
            Self::Text => (Some("string"), None),
            Self::TextArea => (Some("string"), Some("textarea")),
            Self::Email => (Some("string"), Some("email")),
            Self::Password => (Some("string"), Some("password")),
            Self::Number => (Some("number"), None),
            Self::Integer => (Some("integer"), None),
            Self::Boolean => (Some("boolean"), None),
            Self::Date => (Some("string"), Some("date")),
            Self::DateTime => (Some("string"), Some("date-time")),
            Self::File => (Some("file"), None),
            Self::Choice(_) => (Some("string"), None),
            Self::Model(_) => (Some("object"), None),
            Self::List(_) => (Some("array"), None),
        }
    }

    /// Build the bare property schema for this tag.
    pub fn to_property(&self, id: &SmolStr) -> PropertySchema {
        let (type_name, format) = self.type_and_format();
        let mut property = PropertySchema::new(id.clone());
        property.type_name = type_name.map(SmolStr::new_static);
        property.format = format.map(SmolStr::new_static);

        match self {
            Self::Choice(values) => property.enum_values = Some(values.clone()),
            Self::Model(name) => property.reference = Some(format!("#/{name}")),
            Self::List(inner) => property.items = Some(Box::new(inner.to_property(id))),
            _ => {}
        }
        property
    }
}

/// Declaration of one form field of a registered model.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Value type.
    pub tag: TypeTag,
    /// Whether the field must be filled in.
    pub required: bool,
    /// Presentation hints and constraints.
    pub property: PropertySchema,
}

impl FieldDescriptor {
    /// Declare a field.
    pub fn new(name: impl Into<SmolStr>, tag: TypeTag) -> Self {
        let name = name.into();
        Self {
            property: tag.to_property(&name),
            tag,
            required: false,
        }
    }

    /// Field name.
    pub fn name(&self) -> &str {
        self.property.id.as_str()
    }

    /// Mark the field required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the display label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.property.label = Some(label.into());
        self
    }

    /// Set the placeholder.
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.property.placeholder = Some(placeholder.into());
        self
    }

    /// Place the field in a field-set.
    pub fn field_set(mut self, name: impl Into<SmolStr>) -> Self {
        self.property.field_set = Some(name.into());
        self
    }

    /// Numeric range.
    pub fn range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.property.minimum = minimum;
        self.property.maximum = maximum;
        self
    }

    /// Length bounds.
    pub fn length(mut self, min_length: Option<f64>, max_length: Option<f64>) -> Self {
        self.property.min_length = min_length;
        self.property.max_length = max_length;
        self
    }

    /// Hide the field.
    pub fn hidden(mut self) -> Self {
        self.property.hidden = true;
        self
    }

    /// Disable the field.
    pub fn disabled(mut self) -> Self {
        self.property.disabled = true;
        self
    }

    /// Load options from an endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.property.endpoint = Some(endpoint.into());
        self
    }

    /// Derive options from another field.
    pub fn options_path(mut self, path: impl Into<String>) -> Self {
        self.property.options_path = Some(path.into());
        self
    }

    /// Initial value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.property.default = Some(value.into());
        self
    }

    /// Adjust the underlying property schema directly.
    pub fn configure(mut self, f: impl FnOnce(&mut PropertySchema)) -> Self {
        f(&mut self.property);
        self
    }
}

/// Fields of one model under construction.
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    parents: Vec<SmolStr>,
    fields: IndexMap<SmolStr, FieldDescriptor>,
}

impl ModelBuilder {
    /// Inherit every field of another registered model.
    ///
    /// Inherited fields come first; fields declared here override
    /// inherited ones with the same name.
    pub fn extends(mut self, parent: impl Into<SmolStr>) -> Self {
        self.parents.push(parent.into());
        self
    }

    /// Declare (or redeclare) a field.
    pub fn field(mut self, descriptor: FieldDescriptor) -> Self {
        self.fields
            .insert(descriptor.property.id.clone(), descriptor);
        self
    }

    fn build(self, name: &str) -> SchemaDefinition {
        let mut definition = SchemaDefinition::new(name);
        for parent in self.parents {
            definition
                .all_of
                .push(SchemaComponent::reference(format!("#/{parent}")));
        }
        for (key, descriptor) in self.fields {
            if descriptor.required {
                definition.required.insert(key.clone());
            }
            definition.properties.insert(key, descriptor.property);
        }
        definition.normalize(name);
        definition
    }
}

/// Registry of model field declarations, keyed by model name.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: RwLock<IndexMap<SmolStr, Arc<SchemaDefinition>>>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model; a second definition under the same name replaces the first.
    pub fn define(&self, name: impl Into<SmolStr>, f: impl FnOnce(ModelBuilder) -> ModelBuilder) {
        let name = name.into();
        let definition = f(ModelBuilder::default()).build(&name);
        tracing::trace!(model = %name, fields = definition.properties.len(), "Registered model");
        self.models.write().insert(name, Arc::new(definition));
    }

    /// Schema definition of a registered model.
    pub fn definition(&self, name: &str) -> Option<Arc<SchemaDefinition>> {
        self.models.read().get(name).cloned()
    }

    /// Whether a model is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.models.read().contains_key(name)
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }

    /// Snapshot of every registered model as a document.
    pub fn to_document(&self) -> SchemaDocument {
        self.models
            .read()
            .values()
            .map(|definition| definition.as_ref().clone())
            .collect()
    }
}

#[async_trait]
impl SchemaProvider for ModelRegistry {
    async fn get_schema(&self, name: &str) -> SchemaResult<Option<Arc<SchemaDefinition>>> {
        Ok(self.definition(name))
    }

    async fn get_schemas(&self) -> SchemaResult<IndexMap<SmolStr, Arc<SchemaDefinition>>> {
        Ok(self.models.read().clone())
    }
}
