//! The compiled field tree.
//!
//! A compilation produces one root [`FieldConfig`] of kind
//! [`FieldKind::Group`]. Groups hold children in `field_group` and a
//! field-set layout in `field_sets`; arrays hold a keyless item template in
//! `field_array`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

use crate::validators::ValidatorDescriptor;

/// Closed set of field renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    /// Single-line input; see [`InputType`] for the sub-kind.
    Input,
    /// Multi-line text.
    Textarea,
    /// Date or date-time picker.
    Date,
    /// Drop-down choice.
    Select,
    /// Radio button choice, for booleans and small enums.
    Radio,
    /// Boolean toggle.
    Checkbox,
    /// File upload; `multiple` for arrays of files.
    Upload,
    /// Nested object with its own `field_group`.
    Group,
    /// Repeated items described by the `field_array` template.
    Array,
}

impl FieldKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Textarea => "textarea",
            Self::Date => "date",
            Self::Select => "select",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Upload => "upload",
            Self::Group => "group",
            Self::Array => "array",
        }
    }

    /// Kinds that carry nested fields instead of a value.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Group | Self::Array)
    }

    /// Kinds that choose from an option list.
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTML input sub-kind for [`FieldKind::Input`] and [`FieldKind::Date`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputType {
    /// Plain text, the default.
    Text,
    /// Numeric input with `min`, `max` and `step`.
    Number,
    /// Masked text for `format: password`.
    Password,
    /// Calendar date without time.
    Date,
    /// Date and time, rendered as `datetime-local`.
    DatetimeLocal,
}

impl InputType {
    /// Wire name, as used in the HTML `type` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Password => "password",
            Self::Date => "date",
            Self::DatetimeLocal => "datetime-local",
        }
    }
}

/// One entry of a choice field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Value stored in the form model when chosen.
    pub value: Value,
    /// Label or label translation key.
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<String>,
    /// The raw item a fetched option was built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl SelectOption {
    /// Create an option with a value and a label.
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            classes: None,
            data: None,
        }
    }

    pub fn with_classes(mut self, classes: impl Into<String>) -> Self {
        self.classes = Some(classes.into());
        self
    }

    /// Keep the raw item the option came from, for `optionsPath` lookups.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Value at a dotted path inside the option, read from its raw item
    /// when present and from its value otherwise.
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        let mut current = self.data.as_ref().unwrap_or(&self.value);
        for segment in path {
            current = match current {
                Value::Object(map) => map.get(*segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Where a choice field gets its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "camelCase")]
pub enum OptionSource {
    /// Fixed list built from the schema enum.
    Static(Vec<SelectOption>),
    /// Derived from another field's selected option.
    Path(String),
    /// Fetched from a templated endpoint.
    Endpoint(String),
}

impl OptionSource {
    /// Whether the options change at runtime.
    pub fn is_dynamic(&self) -> bool {
        !matches!(self, Self::Static(_))
    }

    /// The static options, if any.
    pub fn static_options(&self) -> Option<&[SelectOption]> {
        match self {
            Self::Static(options) => Some(options),
            _ => None,
        }
    }
}

/// Renderer properties of a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldProps {
    /// Label or label translation key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<String>,
    pub required: bool,
    pub hidden: bool,
    pub disabled: bool,
    pub readonly: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub multiple: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionSource>,
    /// Vendor extensions carried over from the schema.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A named visual section of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSet {
    pub id: SmolStr,
    /// Legend translation key; `None` for the implicit root set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<String>,
    /// Keys of the member fields, in field order.
    pub fields: Vec<SmolStr>,
}

impl FieldSet {
    /// Empty field-set.
    pub fn new(id: impl Into<SmolStr>, legend: Option<String>) -> Self {
        Self {
            id: id.into(),
            legend,
            fields: Vec::new(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f == key)
    }
}

/// One node of the compiled form tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    /// Property id; empty for array item templates.
    pub key: SmolStr,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub validators: IndexMap<SmolStr, ValidatorDescriptor>,
    #[serde(default)]
    pub props: FieldProps,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_group: Vec<FieldConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_sets: Vec<FieldSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_array: Option<Box<FieldConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl FieldConfig {
    /// Create a field with empty props.
    pub fn new(key: impl Into<SmolStr>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            kind,
            validators: IndexMap::new(),
            props: FieldProps::default(),
            field_group: Vec::new(),
            field_sets: Vec::new(),
            field_array: None,
            default_value: None,
        }
    }

    /// Create a group over the given children.
    pub fn group(key: impl Into<SmolStr>, fields: Vec<FieldConfig>) -> Self {
        let mut group = Self::new(key, FieldKind::Group);
        group.field_group = fields;
        group
    }

    /// Hidden input, used for identity fields.
    pub fn hidden_input(key: impl Into<SmolStr>) -> Self {
        let mut field = Self::new(key, FieldKind::Input);
        field.props.hidden = true;
        field.props.input_type = Some(InputType::Text);
        field
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.props.label = Some(label.into());
        self
    }

    /// Direct child by key.
    pub fn child(&self, key: &str) -> Option<&FieldConfig> {
        self.field_group.iter().find(|f| f.key == key)
    }

    /// Mutable direct child by key.
    pub fn child_mut(&mut self, key: &str) -> Option<&mut FieldConfig> {
        self.field_group.iter_mut().find(|f| f.key == key)
    }

    /// Descendant by dotted key path. Array item templates are stepped
    /// through without consuming a segment.
    pub fn find(&self, path: &str) -> Option<&FieldConfig> {
        let mut current = self;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            let scope = current.field_array.as_deref().unwrap_or(current);
            current = scope.child(segment)?;
        }
        Some(current)
    }

    /// Keys of the direct children, in order.
    pub fn keys(&self) -> Vec<&str> {
        self.field_group.iter().map(|f| f.key.as_str()).collect()
    }

    /// Field-set by id.
    pub fn field_set(&self, id: &str) -> Option<&FieldSet> {
        self.field_sets.iter().find(|s| s.id == id)
    }

    /// Whether any validator is attached.
    pub fn has_validators(&self) -> bool {
        !self.validators.is_empty()
    }

    /// Validators the value fails, in attachment order.
    pub fn failing_validators(&self, value: &Value) -> Vec<&ValidatorDescriptor> {
        self.validators
            .values()
            .filter(|descriptor| !descriptor.rule.check(value))
            .collect()
    }

    /// Visit this node and every descendant, depth-first, with its dotted path.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&str, &'a FieldConfig)) {
        self.walk_at("", visit);
    }

    fn walk_at<'a>(&'a self, path: &str, visit: &mut impl FnMut(&str, &'a FieldConfig)) {
        visit(path, self);
        if let Some(template) = &self.field_array {
            template.walk_at(path, visit);
            return;
        }
        for child in &self.field_group {
            let child_path = if path.is_empty() {
                child.key.to_string()
            } else {
                format!("{path}.{}", child.key)
            };
            child.walk_at(&child_path, visit);
        }
    }

    /// Mutable pre-order traversal.
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut FieldConfig)) {
        visit(self);
        if let Some(template) = self.field_array.as_deref_mut() {
            template.walk_mut(visit);
        }
        for child in &mut self.field_group {
            child.walk_mut(visit);
        }
    }
}
