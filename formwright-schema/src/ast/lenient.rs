//! Tolerant deserializers for schema keywords.
//!
//! Backend schemas are often hand-written. A keyword with the wrong JSON
//! type (`"minLength": "3"`, `"enum": "a"`) is dropped with a warning, so
//! one bad keyword never rejects the rest of the document.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use smol_str::SmolStr;

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn convert<T: DeserializeOwned>(raw: &Value) -> Option<T> {
    match T::deserialize(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(
                found = json_type(raw),
                error = %e,
                "Ignoring mistyped schema keyword"
            );
            None
        }
    }
}

/// An optional keyword; `null` and mistyped values become `None`.
pub(crate) fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(None);
    }
    Ok(convert(&raw))
}

/// A boolean keyword; anything but `true` reads as `false`.
pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<bool> = optional(deserializer)?;
    Ok(value.unwrap_or(false))
}

/// An array keyword; mistyped entries are skipped, a non-array is empty.
pub(crate) fn list<'de, D, C>(deserializer: D) -> Result<C, D::Error>
where
    D: Deserializer<'de>,
    C: IntoIterator + FromIterator<<C as IntoIterator>::Item>,
    C::Item: DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    let entries = match raw {
        Value::Array(entries) => entries,
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(found = json_type(&other), "Ignoring non-array schema keyword");
            Vec::new()
        }
    };
    Ok(entries.iter().filter_map(convert).collect())
}

/// A keyed keyword such as `properties`; mistyped entries are skipped.
pub(crate) fn map<'de, D, T>(deserializer: D) -> Result<IndexMap<SmolStr, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    let entries = match raw {
        Value::Object(entries) => entries,
        Value::Null => return Ok(IndexMap::new()),
        other => {
            tracing::warn!(found = json_type(&other), "Ignoring non-object schema keyword");
            return Ok(IndexMap::new());
        }
    };

    Ok(entries
        .iter()
        .filter_map(|(key, value)| {
            let parsed = convert(value);
            if parsed.is_none() {
                tracing::warn!(key = %key, "Skipping unreadable schema entry");
            }
            parsed.map(|parsed| (SmolStr::new(key), parsed))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexSet;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Keywords {
        #[serde(deserialize_with = "optional")]
        bound: Option<f64>,
        #[serde(deserialize_with = "flag")]
        hidden: bool,
        #[serde(deserialize_with = "list")]
        names: IndexSet<SmolStr>,
        #[serde(deserialize_with = "map")]
        sizes: IndexMap<SmolStr, u32>,
    }

    #[test]
    fn test_well_typed_values_pass_through() {
        let parsed: Keywords = serde_json::from_value(json!({
            "bound": 3,
            "hidden": true,
            "names": ["a", "b"],
            "sizes": {"s": 1}
        }))
        .unwrap();
        assert_eq!(parsed.bound, Some(3.0));
        assert!(parsed.hidden);
        assert_eq!(parsed.names.len(), 2);
        assert_eq!(parsed.sizes["s"], 1);
    }

    #[test]
    fn test_mistyped_values_are_dropped() {
        let parsed: Keywords = serde_json::from_value(json!({
            "bound": "3",
            "hidden": "yes",
            "names": ["a", 7, "b"],
            "sizes": {"s": "big", "m": 2}
        }))
        .unwrap();
        assert_eq!(parsed.bound, None);
        assert!(!parsed.hidden);
        let names: Vec<&str> = parsed.names.iter().map(SmolStr::as_str).collect();
        assert_eq!(names, vec!["a", "b"]);
        let sizes: Vec<&str> = parsed.sizes.keys().map(SmolStr::as_str).collect();
        assert_eq!(sizes, vec!["m"]);

        let scalar: Keywords = serde_json::from_value(json!({"names": "a", "sizes": []})).unwrap();
        assert!(scalar.names.is_empty());
        assert!(scalar.sizes.is_empty());
    }
}
