//! Logging setup for Formwright.
//!
//! Library code logs through `tracing` and never installs a subscriber on
//! its own. Hosts that want output can call [`init`], which reads:
//!
//! - `FORMWRIGHT_DEBUG=true|1|yes` - enable debug logging
//! - `FORMWRIGHT_LOG_LEVEL=trace|debug|info|warn|error` - explicit level
//! - `FORMWRIGHT_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! or [`init_from_config`], which starts from the `[debug]` table of
//! `formwright.toml` and lets the environment override it.
//!
//! Installing a subscriber needs the `tracing-subscriber` feature; without
//! it both functions are no-ops.

use std::env;
use std::sync::Once;

use formwright_schema::config::DebugConfig;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "FORMWRIGHT_DEBUG";
const LEVEL_VAR: &str = "FORMWRIGHT_LOG_LEVEL";
const FORMAT_VAR: &str = "FORMWRIGHT_LOG_FORMAT";

/// Whether `FORMWRIGHT_DEBUG` is set to a truthy value.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Map a level name to a known level, or `None` if unrecognized.
pub fn normalize_level(level: &str) -> Option<&'static str> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

/// Map a format name to a known format; anything else is `json`.
pub fn normalize_format(format: &str) -> &'static str {
    match format.trim().to_lowercase().as_str() {
        "pretty" => "pretty",
        "compact" => "compact",
        _ => "json",
    }
}

/// Effective level: `FORMWRIGHT_LOG_LEVEL`, else `debug` when
/// `FORMWRIGHT_DEBUG` is on, else `fallback`.
pub fn log_level(fallback: &'static str) -> &'static str {
    env::var(LEVEL_VAR)
        .ok()
        .and_then(|l| normalize_level(&l))
        .unwrap_or(if is_debug_enabled() { "debug" } else { fallback })
}

/// Effective format: `FORMWRIGHT_LOG_FORMAT`, else `fallback`.
pub fn log_format(fallback: &'static str) -> &'static str {
    env::var(FORMAT_VAR)
        .map(|f| normalize_format(&f))
        .unwrap_or(fallback)
}

/// Install a subscriber from the environment.
///
/// Does nothing unless `FORMWRIGHT_DEBUG` or `FORMWRIGHT_LOG_LEVEL` is set.
/// Only the first call in a process has any effect.
pub fn init() {
    if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
        return;
    }
    install(log_level("warn"), log_format("json"));
}

/// Install a subscriber from configuration, with environment overrides.
pub fn init_from_config(config: &DebugConfig) {
    let level = log_level(normalize_level(&config.log_level).unwrap_or("warn"));
    let format = log_format(normalize_format(&config.log_format));
    install(level, format);
}

#[cfg_attr(not(feature = "tracing-subscriber"), allow(unused_variables))]
fn install(level: &'static str, format: &'static str) {
    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let directives = [
                "formwright",
                "formwright_schema",
                "formwright_compiler",
                "formwright_options",
            ]
            .map(|target| format!("{target}={level}"))
            .join(",");
            let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("warn"));

            let registry = tracing_subscriber::registry().with(filter);
            let installed = match format {
                "pretty" => registry.with(fmt::layer().pretty()).try_init(),
                "compact" => registry.with(fmt::layer().compact()).try_init(),
                _ => registry.with(fmt::layer().json()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(level, format, "Formwright logging initialized");
            }
        }
    });
}
