//! Configuration file parsing for `formwright.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{SchemaError, SchemaResult};

/// Main configuration structure for `formwright.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FormwrightConfig {
    /// Compiler settings.
    #[serde(default)]
    pub compiler: CompilerSettings,

    /// Option resolution settings.
    #[serde(default)]
    pub options: OptionSettings,

    /// Debug/logging settings.
    #[serde(default)]
    pub debug: DebugConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl FormwrightConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SchemaResult<Self> {
        let expanded = expand_env_vars(content);
        let config: Self =
            toml::from_str(&expanded).map_err(|e| SchemaError::TomlError { source: e })?;
        config.check()?;
        Ok(config)
    }

    /// Apply environment-specific overrides.
    pub fn with_environment(mut self, env: &str) -> Self {
        if let Some(overrides) = self.environments.remove(env) {
            if let Some(compiler) = overrides.compiler {
                if let Some(prefix) = compiler.label_prefix {
                    self.compiler.label_prefix = Some(prefix);
                }
                if let Some(strict) = compiler.strict_schemas {
                    self.compiler.strict_schemas = strict;
                }
                if let Some(fields) = compiler.identity_fields {
                    self.compiler.identity_fields = fields;
                }
                if let Some(depth) = compiler.max_depth {
                    self.compiler.max_depth = depth;
                }
            }
            if let Some(debug) = overrides.debug {
                if let Some(level) = debug.log_level {
                    self.debug.log_level = level;
                }
                if let Some(format) = debug.log_format {
                    self.debug.log_format = format;
                }
            }
        }
        self
    }

    fn check(&self) -> SchemaResult<()> {
        if !(self.compiler.numeric_bound.is_finite() && self.compiler.numeric_bound > 0.0) {
            return Err(SchemaError::ConfigError {
                message: format!(
                    "compiler.numeric_bound must be a positive finite number, got {}",
                    self.compiler.numeric_bound
                ),
            });
        }
        if !(self.compiler.default_step.is_finite() && self.compiler.default_step > 0.0) {
            return Err(SchemaError::ConfigError {
                message: format!(
                    "compiler.default_step must be a positive finite number, got {}",
                    self.compiler.default_step
                ),
            });
        }
        if self.compiler.root_field_set.is_empty() {
            return Err(SchemaError::ConfigError {
                message: "compiler.root_field_set must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Compiler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerSettings {
    /// Prefix for generated translation keys.
    pub label_prefix: Option<String>,

    /// Hidden identity fields prepended to every non-empty root group.
    #[serde(default = "default_identity_fields")]
    pub identity_fields: Vec<String>,

    /// Fail when the root schema is missing instead of producing an empty form.
    #[serde(default)]
    pub strict_schemas: bool,

    /// Magnitude used for unspecified numeric bounds.
    #[serde(default = "default_numeric_bound")]
    pub numeric_bound: f64,

    /// Step used when a numeric property declares none.
    #[serde(default = "default_step")]
    pub default_step: f64,

    /// Id of the implicit field-set collecting ungrouped fields.
    #[serde(default = "default_root_field_set")]
    pub root_field_set: String,

    /// Maximum nesting of referenced schemas.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            label_prefix: None,
            identity_fields: default_identity_fields(),
            strict_schemas: false,
            numeric_bound: default_numeric_bound(),
            default_step: default_step(),
            root_field_set: default_root_field_set(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_identity_fields() -> Vec<String> {
    vec!["id".to_string(), "_id".to_string()]
}
fn default_numeric_bound() -> f64 { 999_999_999.0 }
fn default_step() -> f64 { 1.0 }
fn default_root_field_set() -> String { "root-controls".to_string() }
fn default_max_depth() -> usize { 32 }

/// Option resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OptionSettings {
    /// Marker that makes an `optionsPath` resolve from the form root.
    #[serde(default = "default_root_marker")]
    pub root_marker: String,
}

impl Default for OptionSettings {
    fn default() -> Self {
        Self {
            root_marker: default_root_marker(),
        }
    }
}

fn default_root_marker() -> String { "$root".to_string() }

/// Debug/logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (json, pretty, compact).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "warn".to_string() }
fn default_log_format() -> String { "json".to_string() }

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Compiler overrides.
    pub compiler: Option<CompilerOverride>,

    /// Debug overrides.
    pub debug: Option<DebugOverride>,
}

/// Compiler configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerOverride {
    /// Override label_prefix.
    pub label_prefix: Option<String>,

    /// Override strict_schemas.
    pub strict_schemas: Option<bool>,

    /// Override identity_fields.
    pub identity_fields: Option<Vec<String>>,

    /// Override max_depth.
    pub max_depth: Option<usize>,
}

/// Debug configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugOverride {
    /// Override log_level.
    pub log_level: Option<String>,

    /// Override log_format.
    pub log_format: Option<String>,
}

/// Expand environment variables in the format `${VAR_NAME}`.
fn expand_env_vars(content: &str) -> String {
    static ENV_VAR: std::sync::LazyLock<regex_lite::Regex> = std::sync::LazyLock::new(|| {
        regex_lite::Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern")
    });

    ENV_VAR
        .replace_all(content, |caps: &regex_lite::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FormwrightConfig::default();
        assert_eq!(config.compiler.identity_fields, vec!["id", "_id"]);
        assert_eq!(config.compiler.root_field_set, "root-controls");
        assert_eq!(config.compiler.numeric_bound, 999_999_999.0);
        assert!(!config.compiler.strict_schemas);
        assert_eq!(config.options.root_marker, "$root");
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            [compiler]
            label_prefix = "order"
        "#;

        let config = FormwrightConfig::from_str(toml).unwrap();
        assert_eq!(config.compiler.label_prefix.as_deref(), Some("order"));
        assert_eq!(config.compiler.default_step, 1.0);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = FormwrightConfig::from_str("[compiler]\nlabel = \"x\"").unwrap_err();
        assert!(matches!(err, SchemaError::TomlError { .. }));
    }

    #[test]
    fn test_invalid_bound_rejected() {
        let err = FormwrightConfig::from_str("[compiler]\nnumeric_bound = -1.0").unwrap_err();
        assert!(matches!(err, SchemaError::ConfigError { .. }));
    }

    #[test]
    fn test_environment_override() {
        let toml = r#"
            [compiler]
            strict_schemas = false

            [environments.production.compiler]
            strict_schemas = true
            identity_fields = ["uuid"]

            [environments.production.debug]
            log_level = "error"
        "#;

        let config = FormwrightConfig::from_str(toml)
            .unwrap()
            .with_environment("production");
        assert!(config.compiler.strict_schemas);
        assert_eq!(config.compiler.identity_fields, vec!["uuid"]);
        assert_eq!(config.debug.log_level, "error");
    }

    #[test]
    fn test_env_var_expansion() {
        // SAFETY: This test runs single-threaded and we clean up after
        unsafe {
            std::env::set_var("FORMWRIGHT_TEST_PREFIX", "invoice");
        }
        let expanded = expand_env_vars("label_prefix = \"${FORMWRIGHT_TEST_PREFIX}\"");
        assert_eq!(expanded, "label_prefix = \"invoice\"");
        unsafe {
            std::env::remove_var("FORMWRIGHT_TEST_PREFIX");
        }

        let untouched = expand_env_vars("x = \"${FORMWRIGHT_SURELY_UNSET_VAR}\"");
        assert_eq!(untouched, "x = \"${FORMWRIGHT_SURELY_UNSET_VAR}\"");
    }
}
