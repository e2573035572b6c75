//! # formwright-schema
//!
//! Schema model and loading for the Formwright form compiler.
//!
//! This crate provides:
//! - Schema model types (`SchemaDefinition`, `PropertySchema`) loaded from
//!   OpenAPI documents or plain schema maps
//! - The async [`SchemaProvider`] contract and in-memory providers
//! - A session-scoped, single-flight [`SchemaCache`]
//! - An explicit [`ModelRegistry`] for declaring form models in code
//! - Document linting and `formwright.toml` configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use formwright_schema::{SchemaCache, SchemaDocument, StaticSchemaProvider, lint_document};
//!
//! let document = SchemaDocument::from_file("openapi.json")?;
//! lint_document(&document)?;
//!
//! let cache = SchemaCache::new(Arc::new(StaticSchemaProvider::new(document)));
//! let order = cache.get("Order").await?;
//! ```

pub mod ast;
pub mod cache;
pub mod config;
pub mod error;
pub mod lint;
pub mod provider;
pub mod registry;

pub use ast::*;
pub use cache::{CacheStats, SchemaCache, SingleFlight};
pub use config::FormwrightConfig;
pub use error::{SchemaError, SchemaResult};
pub use lint::{SchemaLinter, lint_document};
pub use provider::{FnSchemaProvider, SchemaProvider, StaticSchemaProvider};
pub use registry::{FieldDescriptor, ModelBuilder, ModelRegistry, TypeTag};
