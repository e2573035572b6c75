//! The per-field customization hook.
//!
//! A customizer runs once per compiled property, after its default
//! configuration is built, and once more for the root group. It may keep
//! the field, replace it, or expand it into several fields.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use formwright_schema::{PropertySchema, SchemaDefinition};

use crate::compiler::CompileOptions;
use crate::field::FieldConfig;

/// Error type customizers may return.
pub type CustomizerError = Box<dyn std::error::Error + Send + Sync>;

/// Everything a customizer can see about the field being compiled.
#[derive(Clone, Copy)]
pub struct CustomizeContext<'a> {
    /// The default configuration built for the property.
    pub field: &'a FieldConfig,
    /// The property itself.
    pub property: &'a PropertySchema,
    /// The schema that declares the property.
    pub schema: &'a SchemaDefinition,
    /// Dotted key path of the field; empty for the root.
    pub path: &'a str,
    /// Options passed to `compile`.
    pub options: &'a CompileOptions,
}

impl<'a> CustomizeContext<'a> {
    /// Whether this call is for the root group.
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Downcast the host context passed with the compile options.
    pub fn host<T: Any + Send + Sync>(&self) -> Option<&'a T> {
        self.options.context().and_then(|c| c.downcast_ref::<T>())
    }
}

impl std::fmt::Debug for CustomizeContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomizeContext")
            .field("path", &self.path)
            .field("schema", &self.schema.name)
            .field("kind", &self.field.kind)
            .finish()
    }
}

/// What a customizer decided.
#[derive(Debug, Clone, PartialEq)]
pub enum Customized {
    /// Keep the default configuration.
    Unchanged,
    /// Use this configuration instead.
    Replace(FieldConfig),
    /// Emit these configurations in place of the field. An empty list
    /// removes the field.
    Expand(Vec<FieldConfig>),
}

impl Customized {
    /// Resolve against the default configuration.
    pub fn into_fields(self, original: FieldConfig) -> Vec<FieldConfig> {
        match self {
            Self::Unchanged => vec![original],
            Self::Replace(field) => vec![field],
            Self::Expand(fields) => fields,
        }
    }
}

impl From<FieldConfig> for Customized {
    fn from(field: FieldConfig) -> Self {
        Self::Replace(field)
    }
}

impl From<Vec<FieldConfig>> for Customized {
    fn from(fields: Vec<FieldConfig>) -> Self {
        Self::Expand(fields)
    }
}

impl From<Option<FieldConfig>> for Customized {
    fn from(field: Option<FieldConfig>) -> Self {
        field.map_or(Self::Unchanged, Self::Replace)
    }
}

/// Hook invoked for every compiled field.
#[async_trait]
pub trait Customizer: Send + Sync {
    async fn customize(&self, ctx: CustomizeContext<'_>) -> Result<Customized, CustomizerError>;
}

type CustomizeFn =
    Arc<dyn Fn(&CustomizeContext<'_>) -> Result<Customized, CustomizerError> + Send + Sync>;

/// Customizer backed by a synchronous closure.
#[derive(Clone)]
pub struct FnCustomizer {
    f: CustomizeFn,
}

impl FnCustomizer {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&CustomizeContext<'_>) -> Result<Customized, CustomizerError> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }
}

impl std::fmt::Debug for FnCustomizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCustomizer").finish_non_exhaustive()
    }
}

#[async_trait]
impl Customizer for FnCustomizer {
    async fn customize(&self, ctx: CustomizeContext<'_>) -> Result<Customized, CustomizerError> {
        (self.f)(&ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;

    #[test]
    fn test_into_fields() {
        let original = FieldConfig::new("a", FieldKind::Input);
        assert_eq!(Customized::Unchanged.into_fields(original.clone()), vec![original.clone()]);

        let replaced = FieldConfig::new("a", FieldKind::Textarea);
        assert_eq!(
            Customized::from(replaced.clone()).into_fields(original.clone()),
            vec![replaced]
        );
        assert!(Customized::Expand(vec![]).into_fields(original.clone()).is_empty());
        assert_eq!(Customized::from(None).into_fields(original.clone()), vec![original]);
    }

    #[tokio::test]
    async fn test_fn_customizer_sees_context() {
        let customizer = FnCustomizer::new(|ctx| {
            if ctx.property.id == "secret" {
                return Err("secret fields are not allowed".into());
            }
            let host = ctx.host::<String>().cloned().unwrap_or_default();
            Ok(ctx.field.clone().with_label(format!("{host}:{}", ctx.path)).into())
        });

        let options = CompileOptions::new().with_context(Arc::new("tenant".to_string()));
        let schema = SchemaDefinition::new("User");
        let property = PropertySchema::new("name").with_type("string");
        let field = FieldConfig::new("name", FieldKind::Input);
        let ctx = CustomizeContext {
            field: &field,
            property: &property,
            schema: &schema,
            path: "name",
            options: &options,
        };

        let Customized::Replace(result) = customizer.customize(ctx).await.unwrap() else {
            panic!("expected replacement");
        };
        assert_eq!(result.props.label.as_deref(), Some("tenant:name"));

        let secret = PropertySchema::new("secret");
        let ctx = CustomizeContext {
            property: &secret,
            ..ctx
        };
        assert!(customizer.customize(ctx).await.is_err());
    }
}
