//! Error types for form compilation.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use formwright_schema::SchemaError;
use miette::Diagnostic;
use thiserror::Error;

use crate::customizer::CustomizerError;

/// Result type for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// Errors surfaced by [`SchemaFormCompiler::compile`](crate::SchemaFormCompiler::compile).
///
/// Missing schemas and dangling references are not errors; they compile to
/// empty sub-trees. Only provider failures, strict-mode lookups and
/// customizer failures reach the caller.
#[derive(Error, Debug, Diagnostic)]
pub enum CompileError {
    /// The schema provider failed, or a strict-mode lookup found nothing.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    /// The customizer hook returned an error.
    #[error("customizer rejected field `{key}`")]
    #[diagnostic(code(formwright::compiler::customizer_rejected))]
    CustomizerRejected {
        key: String,
        #[source]
        source: CustomizerError,
    },
}

impl CompileError {
    /// Create a customizer error for a field path.
    pub fn customizer(key: impl Into<String>, source: CustomizerError) -> Self {
        Self::CustomizerRejected {
            key: key.into(),
            source,
        }
    }

    /// Whether this error came from the customizer hook.
    pub fn is_customizer(&self) -> bool {
        matches!(self, Self::CustomizerRejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_is_transparent() {
        let err: CompileError = SchemaError::not_found("Order").into();
        assert_eq!(err.to_string(), "schema `Order` not found");
        assert!(!err.is_customizer());
    }

    #[test]
    fn test_customizer_error() {
        let err = CompileError::customizer("address.zip", "lookup failed".into());
        assert!(err.is_customizer());
        assert!(err.to_string().contains("address.zip"));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("lookup failed"));
    }
}
