//! Property declarations within a schema.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

use super::lenient;
use super::{SchemaComponent, schema_name_from_ref};

/// One property of a schema.
///
/// The recognised keys follow OpenAPI/JSON-schema naming (`minLength`,
/// `$ref`, `allOf`, ...) plus presentation hints (`label`, `fieldSet`,
/// `optionsPath`, `endpoint`, ...). Unrecognised keys are kept in
/// [`PropertySchema::extensions`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertySchema {
    /// Property name; filled in from the map key when the schema is normalized.
    #[serde(skip)]
    pub id: SmolStr,
    /// Declared type (`string`, `number`, `integer`, `boolean`, `array`, `file`, `object`, ...).
    #[serde(
        rename = "type",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional"
    )]
    pub type_name: Option<SmolStr>,
    /// Type refinement (`date`, `date-time`, `email`, `textarea`, `radio`, ...).
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::optional")]
    pub format: Option<SmolStr>,
    /// Allowed literal values.
    #[serde(
        rename = "enum",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional"
    )]
    pub enum_values: Option<Vec<Value>>,
    /// Element schema for arrays.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::optional")]
    pub items: Option<Box<PropertySchema>>,
    /// Reference to another named schema.
    #[serde(
        rename = "$ref",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional"
    )]
    pub reference: Option<String>,
    /// Composition of other schemas.
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "lenient::list")]
    pub all_of: Vec<SchemaComponent>,

    /// Display label (translation key or literal).
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::optional")]
    pub label: Option<String>,
    /// OpenAPI title, used when no label is given.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::optional")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::optional")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::optional")]
    pub description: Option<String>,
    /// CSS classes forwarded to the rendered control.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::optional")]
    pub classes: Option<String>,
    /// Name of the field-set this property is displayed in.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::optional")]
    pub field_set: Option<SmolStr>,

    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::optional")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::optional")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::optional")]
    pub min_length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::optional")]
    pub max_length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::optional")]
    pub step: Option<f64>,
    /// Regular expression the value must match.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::optional")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "std::ops::Not::not", deserialize_with = "lenient::flag")]
    pub hidden: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not", deserialize_with = "lenient::flag")]
    pub disabled: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not", deserialize_with = "lenient::flag")]
    pub read_only: bool,

    /// Remote listing endpoint for select options; may contain `$key` placeholders.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::optional")]
    pub endpoint: Option<String>,
    /// Path to another field whose selected option provides these options.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::optional")]
    pub options_path: Option<String>,
    /// Initial value.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::optional")]
    pub default: Option<Value>,

    /// Keys not recognised above.
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl PropertySchema {
    /// Create an empty property with the given id.
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Set the declared type.
    pub fn with_type(mut self, type_name: impl Into<SmolStr>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Set the format refinement.
    pub fn with_format(mut self, format: impl Into<SmolStr>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Set the allowed values.
    pub fn with_enum<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Set the element schema.
    pub fn with_items(mut self, items: PropertySchema) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    /// Set a direct `$ref`.
    pub fn with_ref(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Append an `allOf` component.
    pub fn with_all_of(mut self, component: SchemaComponent) -> Self {
        self.all_of.push(component);
        self
    }

    /// Set the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Assign the property to a field-set.
    pub fn with_field_set(mut self, field_set: impl Into<SmolStr>) -> Self {
        self.field_set = Some(field_set.into());
        self
    }

    /// Set the numeric range.
    pub fn with_range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    /// Set the length bounds.
    pub fn with_length(mut self, min_length: Option<f64>, max_length: Option<f64>) -> Self {
        self.min_length = min_length;
        self.max_length = max_length;
        self
    }

    /// Mark the property hidden.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Set the remote option endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the cross-field option path.
    pub fn with_options_path(mut self, path: impl Into<String>) -> Self {
        self.options_path = Some(path.into());
        self
    }

    /// Declared type as a string slice.
    pub fn type_str(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Format as a string slice.
    pub fn format_str(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Check the declared type.
    pub fn is_type(&self, name: &str) -> bool {
        self.type_str() == Some(name)
    }

    /// Check the declared format.
    pub fn is_format(&self, name: &str) -> bool {
        self.format_str() == Some(name)
    }

    /// The effective enum: the property's own, else its items'.
    pub fn effective_enum(&self) -> Option<&[Value]> {
        let own = self.enum_values.as_deref().filter(|v| !v.is_empty());
        own.or_else(|| {
            self.items
                .as_ref()
                .and_then(|items| items.enum_values.as_deref())
                .filter(|v| !v.is_empty())
        })
    }

    /// Non-empty `optionsPath`.
    pub fn options_path(&self) -> Option<&str> {
        self.options_path.as_deref().filter(|p| !p.is_empty())
    }

    /// Non-empty `endpoint`.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref().filter(|e| !e.is_empty())
    }

    /// Whether options come from somewhere: an enum, a path, or an endpoint.
    pub fn has_option_source(&self) -> bool {
        self.effective_enum().is_some()
            || self.options_path().is_some()
            || self.endpoint().is_some()
    }

    /// Schema components this property itself points at, in declaration order.
    ///
    /// A direct `$ref` comes first, followed by `allOf` entries.
    pub fn components(&self) -> Vec<SchemaComponent> {
        let mut components = Vec::new();
        if let Some(reference) = &self.reference {
            if schema_name_from_ref(reference).is_some() {
                components.push(SchemaComponent::reference(reference.clone()));
            }
        }
        components.extend(
            self.all_of
                .iter()
                .filter(|c| c.target_name().is_some() || c.is_inline())
                .cloned(),
        );
        components
    }

    /// Components of the element schema for arrays.
    pub fn item_components(&self) -> Vec<SchemaComponent> {
        self.items
            .as_ref()
            .map(|items| items.components())
            .unwrap_or_default()
    }

    /// Whether this property (or, for arrays, its items) points at another schema.
    pub fn is_reference(&self) -> bool {
        !self.components().is_empty() || !self.item_components().is_empty()
    }

    /// Explicit label, else the title.
    pub fn display_label(&self) -> Option<&str> {
        self.label.as_deref().or(self.title.as_deref())
    }

    /// Field-set name, ignored for hidden properties.
    pub fn visible_field_set(&self) -> Option<&str> {
        if self.hidden {
            None
        } else {
            self.field_set.as_deref().filter(|f| !f.is_empty())
        }
    }

    /// Extension value by key.
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    pub(crate) fn assign_id(&mut self, id: &SmolStr) {
        self.id = id.clone();
        if let Some(items) = self.items.as_mut() {
            items.assign_id(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_camel_case() {
        let property: PropertySchema = serde_json::from_value(json!({
            "type": "string",
            "minLength": 3,
            "maxLength": 12,
            "fieldSet": "account",
            "optionsPath": "$root.country.cities",
            "x-widget": "fancy"
        }))
        .unwrap();

        assert_eq!(property.type_str(), Some("string"));
        assert_eq!(property.min_length, Some(3.0));
        assert_eq!(property.max_length, Some(12.0));
        assert_eq!(property.field_set.as_deref(), Some("account"));
        assert_eq!(property.options_path(), Some("$root.country.cities"));
        assert_eq!(property.extension("x-widget"), Some(&json!("fancy")));
    }

    #[test]
    fn test_effective_enum_prefers_own() {
        let property = PropertySchema::new("tags")
            .with_type("array")
            .with_items(PropertySchema::new("tags").with_enum(["x", "y"]));
        assert_eq!(property.effective_enum().map(<[Value]>::len), Some(2));

        let empty = PropertySchema::new("status").with_enum(Vec::<Value>::new());
        assert!(empty.effective_enum().is_none());
        assert!(!empty.has_option_source());
    }

    #[test]
    fn test_components_order() {
        let property = PropertySchema::new("owner")
            .with_ref("#/User")
            .with_all_of(SchemaComponent::reference("#/Audit"))
            .with_all_of(SchemaComponent::default());

        let names: Vec<_> = property
            .components()
            .iter()
            .filter_map(SchemaComponent::target_name)
            .collect();
        assert_eq!(names, vec!["User", "Audit"]);
    }

    #[test]
    fn test_item_components() {
        let property = PropertySchema::new("lines")
            .with_type("array")
            .with_items(PropertySchema::default().with_ref("#/Line"));
        assert!(property.components().is_empty());
        assert_eq!(property.item_components().len(), 1);
        assert!(property.is_reference());
    }

    #[test]
    fn test_hidden_drops_field_set() {
        let property = PropertySchema::new("token").with_field_set("meta").hidden();
        assert_eq!(property.visible_field_set(), None);
    }

    #[test]
    fn test_label_falls_back_to_title() {
        let mut property = PropertySchema::new("name");
        property.title = Some("Name".into());
        assert_eq!(property.display_label(), Some("Name"));
        let property = property.with_label("user.name");
        assert_eq!(property.display_label(), Some("user.name"));
    }
}
