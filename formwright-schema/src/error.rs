//! Error types for schema loading, lookup and linting.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while loading, resolving or linting schemas.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(formwright::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The schema document is not valid JSON or has the wrong shape.
    #[error("failed to parse schema document")]
    #[diagnostic(code(formwright::schema::json_error))]
    JsonError {
        #[source]
        source: serde_json::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(formwright::schema::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    #[diagnostic(code(formwright::schema::config_error))]
    ConfigError { message: String },

    /// A requested schema does not exist.
    #[error("schema `{name}` not found")]
    #[diagnostic(
        code(formwright::schema::not_found),
        help("compilation treats a missing schema as an empty form unless strict mode is enabled")
    )]
    SchemaNotFound { name: String },

    /// A `$ref` points at a schema that does not exist.
    #[error("unresolvable reference `{reference}` in `{schema}.{property}`")]
    #[diagnostic(code(formwright::schema::unresolvable_reference))]
    UnresolvableReference {
        schema: String,
        property: String,
        reference: String,
    },

    /// The schema provider failed to deliver a schema.
    #[error("schema provider failed: {message}")]
    #[diagnostic(code(formwright::schema::provider))]
    Provider { message: String },

    /// A property declaration is inconsistent.
    #[error("invalid property `{schema}.{property}`: {message}")]
    #[diagnostic(code(formwright::schema::invalid_property))]
    InvalidProperty {
        schema: String,
        property: String,
        message: String,
    },

    /// Lint failure with multiple issues.
    #[error("schema lint failed with {count} error(s)")]
    #[diagnostic(code(formwright::schema::validation_failed))]
    ValidationFailed {
        count: usize,
        #[related]
        errors: Vec<SchemaError>,
    },
}

impl SchemaError {
    /// Create a schema-not-found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::SchemaNotFound { name: name.into() }
    }

    /// Create an unresolvable reference error.
    pub fn unresolvable(
        schema: impl Into<String>,
        property: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self::UnresolvableReference {
            schema: schema.into(),
            property: property.into(),
            reference: reference.into(),
        }
    }

    /// Create a provider error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Create an invalid property error.
    pub fn invalid_property(
        schema: impl Into<String>,
        property: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidProperty {
            schema: schema.into(),
            property: property.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(source: serde_json::Error) -> Self {
        Self::JsonError { source }
    }
}

#[cfg(test)]
#[allow(unused_assignments)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = SchemaError::not_found("Invoice");
        assert_eq!(err.to_string(), "schema `Invoice` not found");
    }

    #[test]
    fn test_unresolvable_display() {
        let err = SchemaError::unresolvable("Order", "lines", "#/Line");
        let display = err.to_string();
        assert!(display.contains("Order.lines"));
        assert!(display.contains("#/Line"));
    }

    #[test]
    fn test_invalid_property_fields() {
        let err = SchemaError::invalid_property("User", "age", "minimum exceeds maximum");

        match err {
            SchemaError::InvalidProperty {
                schema,
                property,
                message,
            } => {
                assert_eq!(schema, "User");
                assert_eq!(property, "age");
                assert_eq!(message, "minimum exceeds maximum");
            }
            _ => panic!("Expected InvalidProperty"),
        }
    }

    #[test]
    fn test_json_error_conversion() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SchemaError = source.into();
        assert!(matches!(err, SchemaError::JsonError { .. }));
    }

    #[test]
    fn test_validation_failed_display() {
        let err = SchemaError::ValidationFailed {
            count: 2,
            errors: vec![SchemaError::not_found("A"), SchemaError::not_found("B")],
        };
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn test_diagnostic_code() {
        let err = SchemaError::provider("timeout");
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("formwright::schema::provider"));
    }
}
