//! `optionsPath` expressions and value paths.
//!
//! Value paths address the form model and may contain array indexes
//! (`lines.0.sku`). Field keys address the compiled tree, where array items
//! share one template and indexes disappear (`lines.sku`). Patterns sit in
//! between: they mark every array step with [`WILDCARD`] (`lines.*.sku`)
//! and expand to the value paths present in a form.

use serde_json::Value;

/// Pattern segment standing for any array index.
pub const WILDCARD: &str = "*";

/// Where an `optionsPath` starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The form root.
    Root,
    /// The field's group, walked up this many further levels.
    Up(usize),
}

/// A parsed `optionsPath`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsPath {
    pub anchor: Anchor,
    /// Sibling (or ancestor's child) field holding the selection.
    pub source: String,
    /// Path inside the selected option to the list of new options.
    pub rest: Vec<String>,
}

impl OptionsPath {
    /// Parse `$root.a.b`, `..a.b`, `.a.b` or `a.b`.
    ///
    /// One leading dot and no leading dot both mean siblings; every extra
    /// dot walks up one level.
    pub fn parse(path: &str, root_marker: &str) -> Option<Self> {
        let path = path.trim();
        let (anchor, remainder) = match path.strip_prefix(root_marker) {
            Some(rest) if !root_marker.is_empty() && (rest.is_empty() || rest.starts_with('.')) => {
                (Anchor::Root, rest.trim_start_matches('.'))
            }
            _ => {
                let dots = path.len() - path.trim_start_matches('.').len();
                (Anchor::Up(dots.saturating_sub(1)), &path[dots..])
            }
        };

        let mut segments = remainder.split('.').filter(|s| !s.is_empty()).map(str::to_string);
        let source = segments.next()?;
        Some(Self {
            anchor,
            source,
            rest: segments.collect(),
        })
    }

    /// Value path of the source field, given the value path of the field
    /// that owns this expression. `None` if it walks above the root.
    pub fn source_path(&self, field_path: &str) -> Option<String> {
        let scope = match self.anchor {
            Anchor::Root => String::new(),
            Anchor::Up(levels) => scope_of(field_path, levels)?,
        };
        Some(join(&scope, &self.source))
    }

    /// Segments to read from the selected option.
    pub fn rest_segments(&self) -> Vec<&str> {
        self.rest.iter().map(String::as_str).collect()
    }
}

/// Split a value path into steps: a key plus any array indexes after it.
fn steps(path: &str) -> Vec<Vec<&str>> {
    let mut steps: Vec<Vec<&str>> = Vec::new();
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        match steps.last_mut() {
            Some(step) if is_index(segment) => step.push(segment),
            _ => steps.push(vec![segment]),
        }
    }
    steps
}

/// Value path of the group containing a field, walked up `levels` more.
pub fn scope_of(field_path: &str, levels: usize) -> Option<String> {
    let steps = steps(field_path);
    let keep = steps.len().checked_sub(1 + levels)?;
    Some(
        steps[..keep]
            .iter()
            .flatten()
            .copied()
            .collect::<Vec<_>>()
            .join("."),
    )
}

/// Field key of a value path or pattern: the path with array indexes removed.
pub fn field_key(value_path: &str) -> String {
    value_path
        .split('.')
        .filter(|s| !s.is_empty() && !is_index(s) && *s != WILDCARD)
        .collect::<Vec<_>>()
        .join(".")
}

/// Join a scope and a key.
pub fn join(scope: &str, key: &str) -> String {
    if scope.is_empty() {
        key.to_string()
    } else {
        format!("{scope}.{key}")
    }
}

/// Whether a value path is an instance of a pattern.
pub fn matches_pattern(pattern: &str, value_path: &str) -> bool {
    let mut expected = pattern.split('.').filter(|s| !s.is_empty());
    let mut actual = value_path.split('.').filter(|s| !s.is_empty());
    loop {
        match (expected.next(), actual.next()) {
            (None, None) => return true,
            (Some(WILDCARD), Some(segment)) if is_index(segment) => {}
            (Some(want), Some(segment)) if want == segment => {}
            _ => return false,
        }
    }
}

/// Value paths of a pattern in a form, one per array item present.
///
/// A pattern without wildcards expands to itself whether or not the form
/// holds a value there. Wildcards over missing or non-array values expand
/// to nothing.
pub fn expand(pattern: &str, values: &Value) -> Vec<String> {
    let mut paths = vec![String::new()];
    for segment in pattern.split('.').filter(|s| !s.is_empty()) {
        if segment == WILDCARD {
            paths = paths
                .into_iter()
                .flat_map(|prefix| {
                    let count = value_at(values, &prefix)
                        .and_then(Value::as_array)
                        .map_or(0, Vec::len);
                    (0..count).map(move |index| join(&prefix, &index.to_string()))
                })
                .collect();
        } else {
            for path in &mut paths {
                *path = join(path, segment);
            }
        }
    }
    paths
}

/// Value at a dotted path; numeric segments index arrays.
pub fn value_at<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|s| !s.is_empty())
        .try_fold(root, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
            _ => None,
        })
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_anchors() {
        let root = OptionsPath::parse("$root.country.cities", "$root").unwrap();
        assert_eq!(root.anchor, Anchor::Root);
        assert_eq!(root.source, "country");
        assert_eq!(root.rest, vec!["cities"]);

        assert_eq!(OptionsPath::parse("country.cities", "$root").unwrap().anchor, Anchor::Up(0));
        assert_eq!(OptionsPath::parse(".country.cities", "$root").unwrap().anchor, Anchor::Up(0));
        assert_eq!(OptionsPath::parse("...country", "$root").unwrap().anchor, Anchor::Up(2));
        assert!(OptionsPath::parse("..", "$root").is_none());
    }

    #[test]
    fn test_source_paths() {
        let siblings = OptionsPath::parse("country.cities", "$root").unwrap();
        assert_eq!(siblings.source_path("address.city").as_deref(), Some("address.country"));
        assert_eq!(siblings.source_path("city").as_deref(), Some("country"));

        let up = OptionsPath::parse("..country.cities", "$root").unwrap();
        assert_eq!(up.source_path("lines.2.city").as_deref(), Some("country"));
        assert_eq!(up.source_path("city"), None);

        let root = OptionsPath::parse("$root.country", "$root").unwrap();
        assert_eq!(root.source_path("a.b.c").as_deref(), Some("country"));
    }

    #[test]
    fn test_field_key_and_values() {
        assert_eq!(field_key("lines.0.sku"), "lines.sku");
        assert_eq!(scope_of("lines.0.sku", 0).as_deref(), Some("lines.0"));

        let form = json!({"lines": [{"sku": "A"}, {"sku": "B"}]});
        assert_eq!(value_at(&form, "lines.1.sku"), Some(&json!("B")));
        assert_eq!(value_at(&form, ""), Some(&form));
        assert_eq!(value_at(&form, "lines.x"), None);
    }

    #[test]
    fn test_patterns() {
        assert_eq!(field_key("orders.*.lines.*.sku"), "orders.lines.sku");
        assert!(matches_pattern("lines.*.sku", "lines.12.sku"));
        assert!(matches_pattern("status", "status"));
        assert!(!matches_pattern("lines.*.sku", "lines.sku"));
        assert!(!matches_pattern("lines.*.sku", "lines.x.sku"));
        assert!(!matches_pattern("lines.*.sku", "lines.0.sku.name"));

        let form = json!({"orders": [
            {"lines": [{"sku": "A"}, {"sku": "B"}]},
            {"lines": "none"},
            {"lines": [{"sku": "C"}]}
        ]});
        assert_eq!(
            expand("orders.*.lines.*.sku", &form),
            vec!["orders.0.lines.0.sku", "orders.0.lines.1.sku", "orders.2.lines.0.sku"]
        );
        assert_eq!(expand("status", &form), vec!["status"]);
        assert!(expand("missing.*.sku", &form).is_empty());
    }
}
