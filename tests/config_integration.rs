//! Integration tests for `formwright.toml` handling.

use formwright::compiler::logging;
use formwright::prelude::*;
use formwright::schema::config::DebugConfig;
use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

const CONFIG: &str = r#"
[compiler]
label_prefix = "order"
identity_fields = ["uuid"]
root_field_set = "general"
max_depth = 4

[options]
root_marker = "$form"

[debug]
log_level = "info"
log_format = "pretty"

[environments.production.compiler]
strict_schemas = true
label_prefix = "shop"

[environments.production.debug]
log_level = "error"
"#;

const SCHEMAS: &str = r#"{"Order": {"properties": {
    "number": {"type": "string"},
    "note": {"type": "string", "fieldSet": "extra"}
}}}"#;

fn compiler(config: &FormwrightConfig) -> SchemaFormCompiler {
    let provider = StaticSchemaProvider::from_json(SCHEMAS).unwrap();
    SchemaFormCompiler::from_provider(Arc::new(provider)).with_config(CompilerConfig::from(config))
}

#[test]
fn test_load_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();

    let config = FormwrightConfig::from_file(file.path()).unwrap();
    assert_eq!(config.compiler.label_prefix.as_deref(), Some("order"));
    assert_eq!(config.compiler.identity_fields, vec!["uuid"]);
    assert_eq!(config.compiler.max_depth, 4);
    assert!(!config.compiler.strict_schemas);
    assert_eq!(config.options.root_marker, "$form");
    assert_eq!(config.debug.log_format, "pretty");
}

#[test]
fn test_missing_file_is_io_error() {
    let err = FormwrightConfig::from_file("/definitely/not/here/formwright.toml").unwrap_err();
    assert!(matches!(err, SchemaError::IoError { .. }));
}

#[test]
fn test_defaults() {
    let config = FormwrightConfig::from_str("").unwrap();
    assert_eq!(config.compiler.identity_fields, vec!["id", "_id"]);
    assert_eq!(config.compiler.root_field_set, "root-controls");
    assert_eq!(config.options.root_marker, "$root");
    assert_eq!(config.debug.log_level, "warn");
    assert_eq!(CompilerConfig::from(&config), CompilerConfig::default());
}

#[test]
fn test_rejects_unknown_keys_and_bad_values() {
    assert!(FormwrightConfig::from_str("[compiler]\nlabel_prefx = \"x\"").is_err());

    let err = FormwrightConfig::from_str("[compiler]\ndefault_step = 0.0").unwrap_err();
    assert!(matches!(err, SchemaError::ConfigError { .. }));

    let err = FormwrightConfig::from_str("[compiler]\nroot_field_set = \"\"").unwrap_err();
    assert!(matches!(err, SchemaError::ConfigError { .. }));
}

#[test]
fn test_unset_env_var_left_verbatim() {
    let config = FormwrightConfig::from_str(
        "[compiler]\nlabel_prefix = \"${FORMWRIGHT_TEST_SURELY_UNSET}\"",
    )
    .unwrap();
    assert_eq!(
        config.compiler.label_prefix.as_deref(),
        Some("${FORMWRIGHT_TEST_SURELY_UNSET}")
    );
}

#[test]
fn test_environment_overrides() {
    let config = FormwrightConfig::from_str(CONFIG).unwrap().with_environment("production");
    assert!(config.compiler.strict_schemas);
    assert_eq!(config.compiler.label_prefix.as_deref(), Some("shop"));
    assert_eq!(config.compiler.identity_fields, vec!["uuid"]);
    assert_eq!(config.debug.log_level, "error");
    assert_eq!(config.debug.log_format, "pretty");

    let untouched = FormwrightConfig::from_str(CONFIG).unwrap().with_environment("staging");
    assert!(!untouched.compiler.strict_schemas);
}

#[tokio::test]
async fn test_config_drives_compilation() {
    let config = FormwrightConfig::from_str(CONFIG).unwrap();
    let root = compiler(&config)
        .compile("Order", &CompileOptions::new())
        .await
        .unwrap();

    assert_eq!(root.keys(), vec!["uuid", "number", "note"]);
    assert_eq!(
        root.child("number").unwrap().props.label.as_deref(),
        Some("order.number")
    );
    let sets: Vec<&str> = root.field_sets.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(sets, vec!["general", "extra"]);
}

#[tokio::test]
async fn test_options_prefix_wins_over_config() {
    let config = FormwrightConfig::from_str(CONFIG).unwrap();
    let root = compiler(&config)
        .compile("Order", &CompileOptions::new().with_label_prefix("invoice"))
        .await
        .unwrap();

    assert_eq!(
        root.child("note").unwrap().props.label.as_deref(),
        Some("invoice.note")
    );
}

#[tokio::test]
async fn test_strict_environment_rejects_missing_schema() {
    let config = FormwrightConfig::from_str(CONFIG).unwrap().with_environment("production");
    let err = compiler(&config)
        .compile("Invoice", &CompileOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CompileError::Schema(SchemaError::SchemaNotFound { .. })
    ));
}

#[tokio::test]
async fn test_resolver_uses_configured_root_marker() {
    let config = FormwrightConfig::from_str(CONFIG).unwrap();
    let mut city = FieldConfig::new("city", FieldKind::Select);
    city.props.options = Some(OptionSource::Path("$form.country.cities".into()));
    let mut country = FieldConfig::new("country", FieldKind::Select);
    country.props.options = Some(OptionSource::Static(vec![
        SelectOption::new("de", "Germany").with_data(serde_json::json!({"cities": ["Berlin"]})),
    ]));
    let form = FieldConfig::group("root", vec![country, city]);

    let resolver = OptionResolver::new().with_settings(&config.options);
    resolver.attach(&form);
    let cities = resolver
        .refresh("city", &serde_json::json!({"country": "de"}))
        .await
        .unwrap();
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0].label, "Berlin");
}

#[test]
fn test_logging_init_is_idempotent() {
    let debug = DebugConfig {
        log_level: "debug".to_string(),
        log_format: "compact".to_string(),
    };
    logging::init_from_config(&debug);
    logging::init_from_config(&debug);
    assert_eq!(logging::normalize_level("WARNING"), Some("warn"));
}
