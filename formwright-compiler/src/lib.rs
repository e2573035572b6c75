//! # formwright-compiler
//!
//! Turns object schemas into nested form field trees.
//!
//! Given a schema name, [`SchemaFormCompiler::compile`] walks the schema and
//! everything it references and produces a root [`FieldConfig`] group with:
//! - one field per renderable property, in declaration order
//! - validators synthesized from the declared constraints
//! - field-sets grouping fields under their declared `fieldSet`
//! - nested groups and array templates for referenced schemas, merged
//!   last-wins across `allOf` parts
//! - hidden identity fields for persisted entities
//!
//! A [`Customizer`] can adjust, replace or expand each field as it is
//! built. Generated labels are translation keys; [`localize`] resolves them.
//!
//! ## Example
//!
//! ```rust,ignore
//! use formwright_compiler::{CompileOptions, SchemaFormCompiler};
//!
//! let compiler = SchemaFormCompiler::from_provider(provider);
//! let form = compiler
//!     .compile("Order", &CompileOptions::new().with_label_prefix("order"))
//!     .await?;
//! ```

pub mod compiler;
pub mod config;
pub mod customizer;
pub mod error;
pub mod field;
pub mod fieldset;
pub mod kind;
pub mod logging;
pub mod resolve;
pub mod translate;
pub mod validators;

pub use compiler::{CompileOptions, ROOT_KEY, SchemaFormCompiler};
pub use config::CompilerConfig;
pub use customizer::{CustomizeContext, Customized, Customizer, CustomizerError, FnCustomizer};
pub use error::{CompileError, CompileResult};
pub use field::{
    FieldConfig, FieldKind, FieldProps, FieldSet, InputType, OptionSource, SelectOption,
};
pub use fieldset::{FieldSetAssignments, accumulate, legend_key};
pub use kind::select_kind;
pub use translate::{StaticTranslator, Translator, localize};
pub use validators::{ValidatorDescriptor, ValidatorRule};
