//! Translation of generated keys.
//!
//! The compiler emits translation keys (labels, legends, option labels).
//! [`localize`] rewrites a compiled tree with a [`Translator`], leaving any
//! key it cannot translate as-is.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::join_all;

use crate::field::{FieldConfig, OptionSource};

/// Source of translated strings.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Synchronous lookup.
    fn instant(&self, key: &str) -> Option<String>;

    /// Asynchronous lookup; defaults to [`Translator::instant`].
    async fn translate(&self, key: &str) -> Option<String> {
        self.instant(key)
    }
}

/// Translator over an in-memory table.
#[derive(Debug, Clone, Default)]
pub struct StaticTranslator {
    entries: HashMap<String, String>,
}

impl StaticTranslator {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one translation.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Number of translations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no translations.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticTranslator {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[async_trait]
impl Translator for StaticTranslator {
    fn instant(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Every translation key in a tree, deduplicated, in tree order.
pub fn translation_keys(root: &FieldConfig) -> Vec<String> {
    let mut keys = Vec::new();
    let mut push = |key: &str| {
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    };
    root.walk(&mut |_, field| {
        if let Some(label) = field.props.label.as_deref() {
            push(label);
        }
        if let Some(placeholder) = field.props.placeholder.as_deref() {
            push(placeholder);
        }
        for legend in field.field_sets.iter().filter_map(|s| s.legend.as_deref()) {
            push(legend);
        }
        if let Some(OptionSource::Static(options)) = &field.props.options {
            for option in options {
                push(option.label.as_str());
            }
        }
    });
    keys
}

/// Translate labels, placeholders, legends and static option labels.
///
/// Lookups run concurrently; untranslated keys are left in place.
pub async fn localize(root: &mut FieldConfig, translator: &dyn Translator) {
    let keys = translation_keys(root);
    let lookups = join_all(keys.iter().map(|key| translator.translate(key))).await;
    let table: HashMap<String, String> = keys
        .into_iter()
        .zip(lookups)
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect();

    tracing::debug!(translated = table.len(), "Localized form");

    let apply = |text: &mut String| {
        if let Some(value) = table.get(text.as_str()) {
            *text = value.clone();
        }
    };
    root.walk_mut(&mut |field| {
        if let Some(label) = field.props.label.as_mut() {
            apply(label);
        }
        if let Some(placeholder) = field.props.placeholder.as_mut() {
            apply(placeholder);
        }
        for set in &mut field.field_sets {
            if let Some(legend) = set.legend.as_mut() {
                apply(legend);
            }
        }
        if let Some(OptionSource::Static(options)) = field.props.options.as_mut() {
            for option in options {
                apply(&mut option.label);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldKind, FieldSet, SelectOption};
    use pretty_assertions::assert_eq;

    fn form() -> FieldConfig {
        let mut status = FieldConfig::new("status", FieldKind::Select).with_label("order.status");
        status.props.options = Some(OptionSource::Static(vec![
            SelectOption::new("a", "order.status.a"),
            SelectOption::new("b", "order.status.b"),
        ]));
        let mut root = FieldConfig::group("root", vec![status]);
        let mut set = FieldSet::new("main", Some("legend.main".into()));
        set.fields.push("status".into());
        root.field_sets.push(set);
        root
    }

    #[test]
    fn test_translation_keys() {
        assert_eq!(
            translation_keys(&form()),
            vec!["legend.main", "order.status", "order.status.a", "order.status.b"]
        );
    }

    #[tokio::test]
    async fn test_localize_with_fallback() {
        let translator: StaticTranslator = [
            ("order.status", "Status"),
            ("order.status.a", "Active"),
            ("legend.main", "General"),
        ]
        .into_iter()
        .collect();

        let mut root = form();
        localize(&mut root, &translator).await;

        let status = root.child("status").unwrap();
        assert_eq!(status.props.label.as_deref(), Some("Status"));
        let options = status.props.options.as_ref().and_then(|o| o.static_options()).unwrap();
        assert_eq!(options[0].label, "Active");
        assert_eq!(options[1].label, "order.status.b");
        assert_eq!(root.field_sets[0].legend.as_deref(), Some("General"));
    }
}
