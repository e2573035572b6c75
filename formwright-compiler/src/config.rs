//! Compiler configuration.

use formwright_schema::FormwrightConfig;
use formwright_schema::config::CompilerSettings;

/// Settings owned by a [`SchemaFormCompiler`](crate::SchemaFormCompiler).
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerConfig {
    /// Label prefix used when the compile options carry none.
    pub label_prefix: Option<String>,
    /// Hidden identity fields prepended to non-empty roots.
    pub identity_fields: Vec<String>,
    /// Fail on a missing root schema instead of compiling an empty form.
    pub strict_schemas: bool,
    /// Magnitude substituted for unspecified numeric bounds.
    pub numeric_bound: f64,
    /// Step for numeric inputs without one.
    pub default_step: f64,
    /// Id of the implicit field-set.
    pub root_field_set: String,
    /// Maximum nesting of referenced schemas.
    pub max_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::from(&CompilerSettings::default())
    }
}

impl From<&CompilerSettings> for CompilerConfig {
    fn from(settings: &CompilerSettings) -> Self {
        Self {
            label_prefix: settings.label_prefix.clone().filter(|p| !p.is_empty()),
            identity_fields: settings.identity_fields.clone(),
            strict_schemas: settings.strict_schemas,
            numeric_bound: settings.numeric_bound,
            default_step: settings.default_step,
            root_field_set: settings.root_field_set.clone(),
            max_depth: settings.max_depth,
        }
    }
}

impl From<&FormwrightConfig> for CompilerConfig {
    fn from(config: &FormwrightConfig) -> Self {
        Self::from(&config.compiler)
    }
}

impl CompilerConfig {
    /// Defaults of the `[compiler]` config section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback label prefix.
    pub fn with_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = Some(prefix.into());
        self
    }

    /// Fail on missing root schemas.
    pub fn strict(mut self) -> Self {
        self.strict_schemas = true;
        self
    }

    /// Replace the hidden identity fields.
    pub fn with_identity_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identity_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Limit how deep references are expanded.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}
