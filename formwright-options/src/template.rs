//! Endpoint templates with `$key` placeholders.
//!
//! `/regions/$country/cities?zip=$address.zip` is filled from the values of
//! the field's siblings, flattened to dotted keys.

use std::sync::LazyLock;

use indexmap::IndexMap;
use serde_json::Value;

static PLACEHOLDER: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"\$([A-Za-z_][A-Za-z0-9_.]*)").expect("valid placeholder pattern")
});

/// Flatten a value to dotted keys. Only scalar leaves are kept; array
/// elements are keyed by index.
pub fn flatten(value: &Value) -> IndexMap<String, Value> {
    let mut flat = IndexMap::new();
    flatten_into(value, String::new(), &mut flat);
    flat
}

fn flatten_into(value: &Value, prefix: String, flat: &mut IndexMap<String, Value>) {
    let child = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(nested, child(key), flat);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                flatten_into(nested, child(&index.to_string()), flat);
            }
        }
        scalar if !prefix.is_empty() => {
            flat.insert(prefix, scalar.clone());
        }
        _ => {}
    }
}

/// Placeholder names in an endpoint, in order of appearance.
pub fn placeholders(endpoint: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(endpoint)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('.'))
        .collect()
}

/// Substitute every placeholder from the flattened values.
///
/// Returns `None` if any placeholder has no usable value (missing, null or
/// an empty string), in which case nothing should be fetched.
pub fn substitute(endpoint: &str, values: &IndexMap<String, Value>) -> Option<String> {
    let mut missing = false;
    let filled = PLACEHOLDER.replace_all(endpoint, |caps: &regex_lite::Captures<'_>| {
        let raw = &caps[1];
        let name = raw.trim_end_matches('.');
        let trailing = &raw[name.len()..];
        match values.get(name).and_then(render) {
            Some(text) => format!("{text}{trailing}"),
            None => {
                missing = true;
                String::new()
            }
        }
    });
    (!missing).then(|| filled.into_owned())
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
