//! Error types for option resolution.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for option operations.
pub type OptionResult<T> = Result<T, OptionError>;

/// Errors raised while resolving options at runtime.
#[derive(Error, Debug, Clone, PartialEq, Diagnostic)]
pub enum OptionError {
    /// The fetch collaborator failed for an endpoint.
    #[error("failed to fetch options from `{endpoint}`: {message}")]
    #[diagnostic(
        code(formwright::options::fetch_failed),
        help("the provider keeps emitting its last known options")
    )]
    FetchFailed { endpoint: String, message: String },

    /// No provider is attached at a field path.
    #[error("no option provider for field `{path}`")]
    #[diagnostic(code(formwright::options::unknown_field))]
    UnknownField { path: String },
}

impl OptionError {
    /// Fetch failure for an endpoint.
    pub fn fetch_failed(endpoint: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::FetchFailed {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    /// No provider at `path`.
    pub fn unknown_field(path: impl Into<String>) -> Self {
        Self::UnknownField { path: path.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = OptionError::fetch_failed("/cities?country=de", "timeout");
        assert_eq!(
            err.to_string(),
            "failed to fetch options from `/cities?country=de`: timeout"
        );
        assert_eq!(
            OptionError::unknown_field("address.city").to_string(),
            "no option provider for field `address.city`"
        );
    }
}
