//! Validator synthesis from property constraints.
//!
//! Every rule carries a message key of the form `<prefix>.error.<name>`
//! (or `error.<name>` without a prefix). Rules are attached only when the
//! constraint is actually declared: a NaN bound or missing flag produces no
//! validator, and synthesis never fails.

use std::sync::LazyLock;

use formwright_schema::PropertySchema;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

static EMAIL: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern")
});

/// A single validation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "camelCase")]
pub enum ValidatorRule {
    /// Value must be present and non-empty.
    Required,
    /// Strings must look like an email address.
    Email,
    /// Strings must match the regular expression.
    Pattern(String),
    /// Minimum string or array length.
    MinLength(usize),
    /// Maximum string or array length.
    MaxLength(usize),
    /// Minimum numeric value.
    Min(f64),
    /// Maximum numeric value.
    Max(f64),
    /// Minimum length of every array item.
    ItemsMinLength(usize),
    /// Maximum length of every array item.
    ItemsMaxLength(usize),
    /// Minimum value of every array item.
    ItemsMinValue(f64),
    /// Maximum value of every array item.
    ItemsMaxValue(f64),
}

impl ValidatorRule {
    /// Name used as the validator key and in the message key.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Email => "email",
            Self::Pattern(_) => "pattern",
            Self::MinLength(_) => "minLength",
            Self::MaxLength(_) => "maxLength",
            Self::Min(_) => "min",
            Self::Max(_) => "max",
            Self::ItemsMinLength(_) => "itemsMinLength",
            Self::ItemsMaxLength(_) => "itemsMaxLength",
            Self::ItemsMinValue(_) => "itemsMinValue",
            Self::ItemsMaxValue(_) => "itemsMaxValue",
        }
    }

    /// Whether `value` satisfies the rule.
    ///
    /// Only `Required` rejects absent values; every other rule passes on
    /// null or an empty string.
    pub fn check(&self, value: &Value) -> bool {
        if !matches!(self, Self::Required) && is_blank(value) {
            return true;
        }

        match self {
            Self::Required => !is_blank(value) && !matches!(value, Value::Array(a) if a.is_empty()),
            Self::Email => value.as_str().is_none_or(|s| EMAIL.is_match(s)),
            Self::Pattern(pattern) => check_pattern(pattern, value),
            Self::MinLength(min) => length_of(value).is_none_or(|len| len >= *min),
            Self::MaxLength(max) => length_of(value).is_none_or(|len| len <= *max),
            Self::Min(min) => number_of(value).is_none_or(|n| n >= *min),
            Self::Max(max) => number_of(value).is_none_or(|n| n <= *max),
            Self::ItemsMinLength(min) => {
                each_item(value, |item| length_of(item).is_none_or(|len| len >= *min))
            }
            Self::ItemsMaxLength(max) => {
                each_item(value, |item| length_of(item).is_none_or(|len| len <= *max))
            }
            Self::ItemsMinValue(min) => {
                each_item(value, |item| number_of(item).is_none_or(|n| n >= *min))
            }
            Self::ItemsMaxValue(max) => {
                each_item(value, |item| number_of(item).is_none_or(|n| n <= *max))
            }
        }
    }
}

/// A rule with its error message translation key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorDescriptor {
    #[serde(flatten)]
    pub rule: ValidatorRule,
    pub message_key: String,
}

impl ValidatorDescriptor {
    /// Pair a rule with its message key under `label_prefix`.
    pub fn new(rule: ValidatorRule, label_prefix: Option<&str>) -> Self {
        let message_key = message_key(label_prefix, rule.name());
        Self { rule, message_key }
    }
}

/// Message key for a rule name.
pub fn message_key(label_prefix: Option<&str>, name: &str) -> String {
    match label_prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{prefix}.error.{name}"),
        None => format!("error.{name}"),
    }
}

/// Synthesize validators for a property.
///
/// `required` says whether the owning schema lists the property as required.
pub fn synthesize(
    property: &PropertySchema,
    required: bool,
    label_prefix: Option<&str>,
) -> IndexMap<SmolStr, ValidatorDescriptor> {
    let mut rules = Vec::new();

    if required {
        rules.push(ValidatorRule::Required);
    }
    if let Some(min) = length_bound(property.min_length) {
        rules.push(ValidatorRule::MinLength(min));
    }
    if let Some(max) = length_bound(property.max_length) {
        rules.push(ValidatorRule::MaxLength(max));
    }
    if let Some(min) = value_bound(property.minimum) {
        rules.push(ValidatorRule::Min(min));
    }
    if let Some(max) = value_bound(property.maximum) {
        rules.push(ValidatorRule::Max(max));
    }
    if property.is_format("email") {
        rules.push(ValidatorRule::Email);
    }
    if let Some(pattern) = property.pattern.as_deref().filter(|p| !p.is_empty()) {
        rules.push(ValidatorRule::Pattern(pattern.to_string()));
    }

    if property.is_type("array") {
        if let Some(items) = property.items.as_deref() {
            if let Some(min) = length_bound(items.min_length) {
                rules.push(ValidatorRule::ItemsMinLength(min));
            }
            if let Some(max) = length_bound(items.max_length) {
                rules.push(ValidatorRule::ItemsMaxLength(max));
            }
            if let Some(min) = value_bound(items.minimum) {
                rules.push(ValidatorRule::ItemsMinValue(min));
            }
            if let Some(max) = value_bound(items.maximum) {
                rules.push(ValidatorRule::ItemsMaxValue(max));
            }
        }
    }

    rules
        .into_iter()
        .map(|rule| {
            (
                SmolStr::new_static(rule.name()),
                ValidatorDescriptor::new(rule, label_prefix),
            )
        })
        .collect()
}

fn value_bound(bound: Option<f64>) -> Option<f64> {
    bound.filter(|b| !b.is_nan())
}

fn length_bound(bound: Option<f64>) -> Option<usize> {
    // Saturating cast: negatives clamp to zero.
    value_bound(bound).map(|b| b as usize)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn each_item(value: &Value, check: impl Fn(&Value) -> bool) -> bool {
    match value {
        Value::Array(items) => items.iter().all(check),
        _ => true,
    }
}

fn check_pattern(pattern: &str, value: &Value) -> bool {
    let Some(text) = value.as_str() else {
        return true;
    };
    let anchored = format!(
        "{}{pattern}{}",
        if pattern.starts_with('^') { "" } else { "^" },
        if pattern.ends_with('$') { "" } else { "$" },
    );
    match regex_lite::Regex::new(&anchored) {
        Ok(regex) => regex.is_match(text),
        Err(e) => {
            tracing::warn!(pattern = %pattern, error = %e, "Ignoring invalid pattern");
            true
        }
    }
}
