//! Field kind selection and numeric defaults.

use formwright_schema::PropertySchema;

use crate::field::{FieldKind, InputType};

/// Pick the renderer kind for a property.
///
/// Returns `None` for properties with no renderable shape, such as a plain
/// `object` without references. Those are dropped from the form.
pub fn select_kind(property: &PropertySchema) -> Option<FieldKind> {
    if property.has_option_source() {
        return Some(if property.is_format("radio") {
            FieldKind::Radio
        } else {
            FieldKind::Select
        });
    }

    match property.type_str() {
        Some("string" | "number" | "integer" | "textarea") => Some(scalar_kind(property)),
        Some("boolean") => Some(FieldKind::Checkbox),
        Some("array") if property.is_reference() => Some(FieldKind::Array),
        Some("array") => Some(FieldKind::Input),
        Some("file" | "upload") => Some(FieldKind::Upload),
        _ if !property.components().is_empty() => Some(FieldKind::Group),
        _ => None,
    }
}

fn scalar_kind(property: &PropertySchema) -> FieldKind {
    if property.is_type("textarea") || property.is_format("textarea") {
        FieldKind::Textarea
    } else if property.is_format("date") || property.is_format("date-time") {
        FieldKind::Date
    } else {
        FieldKind::Input
    }
}

/// HTML input type for value-carrying kinds.
pub fn input_type(kind: FieldKind, property: &PropertySchema) -> Option<InputType> {
    match kind {
        FieldKind::Date if property.is_format("date-time") => Some(InputType::DatetimeLocal),
        FieldKind::Date => Some(InputType::Date),
        FieldKind::Input if is_password(property) => Some(InputType::Password),
        FieldKind::Input if is_numeric(property) => Some(InputType::Number),
        FieldKind::Input => Some(InputType::Text),
        _ => None,
    }
}

/// Whether a property holds numbers, directly or as array items.
pub fn is_numeric(property: &PropertySchema) -> bool {
    let numeric = |p: &PropertySchema| p.is_type("number") || p.is_type("integer");
    numeric(property)
        || (property.is_type("array") && property.items.as_deref().is_some_and(numeric))
}

fn is_password(property: &PropertySchema) -> bool {
    property.is_format("password") || property.id.to_ascii_lowercase().contains("password")
}

/// Numeric bounds, substituting `±sentinel` for anything missing or non-finite.
pub fn numeric_bounds(property: &PropertySchema, sentinel: f64) -> (f64, f64) {
    let min = property.minimum.filter(|m| m.is_finite()).unwrap_or(-sentinel);
    let max = property.maximum.filter(|m| m.is_finite()).unwrap_or(sentinel);
    (min, max)
}

/// Declared step, else the default.
pub fn step(property: &PropertySchema, default_step: f64) -> f64 {
    property
        .step
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(default_step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwright_schema::SchemaComponent;

    #[test]
    fn test_enum_wins_over_type() {
        let property = PropertySchema::new("status").with_type("string").with_enum(["a", "b"]);
        assert_eq!(select_kind(&property), Some(FieldKind::Select));

        let radio = property.clone().with_format("radio");
        assert_eq!(select_kind(&radio), Some(FieldKind::Radio));
    }

    #[test]
    fn test_option_sources_select() {
        let path = PropertySchema::new("city")
            .with_type("string")
            .with_options_path("country.cities");
        assert_eq!(select_kind(&path), Some(FieldKind::Select));
        let endpoint = PropertySchema::new("city").with_endpoint("/cities/$country");
        assert_eq!(select_kind(&endpoint), Some(FieldKind::Select));

        let items_enum = PropertySchema::new("tags")
            .with_type("array")
            .with_items(PropertySchema::new("tags").with_type("string").with_enum(["x"]));
        assert_eq!(select_kind(&items_enum), Some(FieldKind::Select));
    }

    #[test]
    fn test_scalar_kinds() {
        let text = PropertySchema::new("notes").with_type("string").with_format("textarea");
        assert_eq!(select_kind(&text), Some(FieldKind::Textarea));
        let date = PropertySchema::new("due").with_type("string").with_format("date-time");
        assert_eq!(select_kind(&date), Some(FieldKind::Date));
        assert_eq!(input_type(FieldKind::Date, &date), Some(InputType::DatetimeLocal));
        let flag = PropertySchema::new("active").with_type("boolean");
        assert_eq!(select_kind(&flag), Some(FieldKind::Checkbox));
        let file = PropertySchema::new("avatar").with_type("file");
        assert_eq!(select_kind(&file), Some(FieldKind::Upload));
    }

    #[test]
    fn test_references() {
        let group = PropertySchema::new("address").with_ref("#/components/schemas/Address");
        assert_eq!(select_kind(&group), Some(FieldKind::Group));

        let composed =
            PropertySchema::new("owner").with_all_of(SchemaComponent::reference("#/User"));
        assert_eq!(select_kind(&composed), Some(FieldKind::Group));

        let array = PropertySchema::new("lines")
            .with_type("array")
            .with_items(PropertySchema::new("lines").with_ref("#/Line"));
        assert_eq!(select_kind(&array), Some(FieldKind::Array));

        let plain_array = PropertySchema::new("tags").with_type("array");
        assert_eq!(select_kind(&plain_array), Some(FieldKind::Input));
    }

    #[test]
    fn test_unrenderable_object() {
        assert_eq!(select_kind(&PropertySchema::new("meta").with_type("object")), None);
        assert_eq!(select_kind(&PropertySchema::new("meta")), None);
    }

    #[test]
    fn test_input_types() {
        let secret = PropertySchema::new("newPassword").with_type("string");
        assert_eq!(input_type(FieldKind::Input, &secret), Some(InputType::Password));
        let qty = PropertySchema::new("qty").with_type("integer");
        assert_eq!(input_type(FieldKind::Input, &qty), Some(InputType::Number));
        let name = PropertySchema::new("name").with_type("string");
        assert_eq!(input_type(FieldKind::Input, &name), Some(InputType::Text));
        assert_eq!(input_type(FieldKind::Textarea, &name), None);
    }

    #[test]
    fn test_numeric_defaults() {
        let qty = PropertySchema::new("qty")
            .with_type("number")
            .with_range(Some(1.0), Some(f64::INFINITY));
        assert_eq!(numeric_bounds(&qty, 100.0), (1.0, 100.0));
        assert_eq!(step(&qty, 1.0), 1.0);

        let mut precise = qty.clone();
        precise.step = Some(0.01);
        assert_eq!(step(&precise, 1.0), 0.01);
    }
}
