//! Schema document linting.
//!
//! Compilation is deliberately lenient: dangling references and similar
//! problems degrade to empty sub-forms. Hosts that want to catch such
//! problems early can lint a document up front:
//! - every `$ref` and `allOf` reference resolves
//! - `required` names an existing property
//! - declared enums are non-empty
//! - lower bounds do not exceed upper bounds

use crate::ast::*;
use crate::error::{SchemaError, SchemaResult};

/// Collects lint findings over a document.
#[derive(Debug, Default)]
pub struct SchemaLinter {
    errors: Vec<SchemaError>,
}

impl SchemaLinter {
    /// Create a new linter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lint every schema in a document.
    pub fn lint(&mut self, document: &SchemaDocument) -> SchemaResult<()> {
        self.errors.clear();

        for schema in document.iter() {
            self.lint_schema(schema, document);
        }

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::ValidationFailed {
                count: self.errors.len(),
                errors: std::mem::take(&mut self.errors),
            })
        }
    }

    fn lint_schema(&mut self, schema: &SchemaDefinition, document: &SchemaDocument) {
        for name in &schema.required {
            if !schema.properties.contains_key(name.as_str()) {
                self.errors.push(SchemaError::invalid_property(
                    schema.name.as_str(),
                    name.as_str(),
                    "listed as required but not declared",
                ));
            }
        }

        for component in &schema.all_of {
            self.check_component(component, schema, "allOf", document);
        }

        for property in schema.properties.values() {
            self.lint_property(property, schema, document);
        }
    }

    fn lint_property(
        &mut self,
        property: &PropertySchema,
        schema: &SchemaDefinition,
        document: &SchemaDocument,
    ) {
        for component in property.components() {
            self.check_component(&component, schema, &property.id, document);
        }
        for component in property.item_components() {
            self.check_component(&component, schema, &property.id, document);
        }

        if matches!(&property.enum_values, Some(values) if values.is_empty()) {
            self.errors.push(SchemaError::invalid_property(
                schema.name.as_str(),
                property.id.as_str(),
                "enum must have at least one value",
            ));
        }

        self.check_bounds(
            property.minimum,
            property.maximum,
            "minimum",
            "maximum",
            property,
            schema,
        );
        self.check_bounds(
            property.min_length,
            property.max_length,
            "minLength",
            "maxLength",
            property,
            schema,
        );
    }

    fn check_component(
        &mut self,
        component: &SchemaComponent,
        schema: &SchemaDefinition,
        property: &str,
        document: &SchemaDocument,
    ) {
        let (Some(reference), Some(target)) = (&component.reference, component.target_name())
        else {
            return;
        };
        if !document.contains(&target) {
            self.errors
                .push(SchemaError::unresolvable(schema.name.as_str(), property, reference));
        }
    }

    fn check_bounds(
        &mut self,
        lower: Option<f64>,
        upper: Option<f64>,
        lower_name: &str,
        upper_name: &str,
        property: &PropertySchema,
        schema: &SchemaDefinition,
    ) {
        if let (Some(lower), Some(upper)) = (lower, upper) {
            if lower > upper {
                self.errors.push(SchemaError::invalid_property(
                    schema.name.as_str(),
                    property.id.as_str(),
                    format!("{lower_name} ({lower}) exceeds {upper_name} ({upper})"),
                ));
            }
        }
    }
}

/// Lint a document and return the first-class error listing every finding.
pub fn lint_document(document: &SchemaDocument) -> SchemaResult<()> {
    SchemaLinter::new().lint(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors_of(result: SchemaResult<()>) -> Vec<SchemaError> {
        match result {
            Err(SchemaError::ValidationFailed { errors, .. }) => errors,
            Err(other) => panic!("unexpected error: {other}"),
            Ok(()) => vec![],
        }
    }

    #[test]
    fn test_clean_document() {
        let document = SchemaDocument::from_json(
            r##"{
                "Order": {"required": ["n"], "properties": {
                    "n": {"type": "string"},
                    "lines": {"type": "array", "items": {"$ref": "#/Line"}}
                }},
                "Line": {"properties": {"qty": {"type": "number", "minimum": 1, "maximum": 5}}}
            }"##,
        )
        .unwrap();
        assert!(lint_document(&document).is_ok());
    }

    #[test]
    fn test_dangling_reference() {
        let document = SchemaDocument::from_json(
            r##"{"Order": {"properties": {"customer": {"$ref": "#/Customer"}}}}"##,
        )
        .unwrap();
        let errors = errors_of(lint_document(&document));
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SchemaError::UnresolvableReference { .. }));
    }

    #[test]
    fn test_dangling_all_of() {
        let document =
            SchemaDocument::from_json(r##"{"Admin": {"allOf": [{"$ref": "#/User"}]}}"##).unwrap();
        assert_eq!(errors_of(lint_document(&document)).len(), 1);
    }

    #[test]
    fn test_required_without_property() {
        let document =
            SchemaDocument::from_json(r#"{"User": {"required": ["email"], "properties": {}}}"#)
                .unwrap();
        let errors = errors_of(lint_document(&document));
        assert!(errors[0].to_string().contains("User.email"));
    }

    #[test]
    fn test_empty_enum_and_inverted_bounds() {
        let document = SchemaDocument::from_json(
            r#"{"T": {"properties": {
                "s": {"type": "string", "enum": []},
                "n": {"type": "number", "minimum": 10, "maximum": 1},
                "t": {"type": "string", "minLength": 8, "maxLength": 2}
            }}}"#,
        )
        .unwrap();
        assert_eq!(errors_of(lint_document(&document)).len(), 3);
    }
}
