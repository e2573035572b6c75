//! # Formwright
//!
//! Schema-driven form models for Rust.
//!
//! Formwright turns object schemas (OpenAPI `components.schemas`, plain
//! JSON schema maps, or models declared in code) into nested field trees
//! that a UI layer can render:
//! - fields with a kind, props and synthesized validators
//! - nested groups and repeatable arrays for referenced schemas
//! - field-sets grouping fields into visual sections
//! - runtime option lists for select and radio fields
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use formwright::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let document = SchemaDocument::from_file("openapi.json")?;
//!     let provider = StaticSchemaProvider::new(document);
//!     let compiler = SchemaFormCompiler::from_provider(Arc::new(provider));
//!
//!     let form = compiler
//!         .compile("Order", &CompileOptions::new().with_label_prefix("order"))
//!         .await?;
//!
//!     let resolver = OptionResolver::new();
//!     resolver.attach(&form);
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Schema model, providers, caching, registry and configuration.
pub mod schema {
    pub use formwright_schema::*;
}

/// The schema-to-form compiler and its output tree.
pub mod compiler {
    pub use formwright_compiler::*;
}

/// Runtime option resolution for choice fields.
pub mod options {
    pub use formwright_options::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::compiler::{
        CompileError, CompileOptions, CompilerConfig, CustomizeContext, Customized, Customizer,
        FieldConfig, FieldKind, FieldSet, FnCustomizer, OptionSource, SchemaFormCompiler,
        SelectOption, StaticTranslator, Translator, localize,
    };
    pub use crate::options::{
        FnOptionFetcher, OptionError, OptionFetcher, OptionProvider, OptionResolver,
    };
    pub use crate::schema::{
        FormwrightConfig, ModelRegistry, PropertySchema, SchemaCache, SchemaDefinition,
        SchemaDocument, SchemaError, SchemaProvider, StaticSchemaProvider, TypeTag,
        lint_document,
    };
}

// Re-export key types at the crate root
pub use compiler::{CompileError, CompileOptions, FieldConfig, SchemaFormCompiler};
pub use options::{OptionError, OptionResolver};
pub use schema::{FormwrightConfig, SchemaDocument, SchemaError};
