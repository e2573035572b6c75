//! Option resolution for a compiled form.
//!
//! An [`OptionResolver`] registers every choice field of a compiled tree
//! and keeps one [`OptionProvider`] per value path. Fields inside array
//! templates get a provider per item, created the first time the item is
//! addressed (`lines.0.product`, `lines.1.product`). Providers are
//! refreshed from the current form values:
//! - static enum options are emitted once, at creation
//! - `optionsPath` options are read from the option currently selected in
//!   another field
//! - `endpoint` options are fetched from the templated endpoint, through a
//!   single-flight cache keyed by the substituted endpoint

use std::sync::Arc;

use formwright_compiler::{FieldConfig, OptionSource};
use formwright_schema::config::OptionSettings;
use futures::future::join_all;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::error::{OptionError, OptionResult};
use crate::fetcher::{OptionCache, OptionFetcher, map_items};
use crate::path::{
    OptionsPath, WILDCARD, expand, field_key, join, matches_pattern, scope_of, value_at,
};
use crate::provider::{OptionList, OptionProvider, OptionSubscription};
use crate::template::{flatten, substitute};

/// A registered choice field.
#[derive(Debug, Clone)]
struct ChoiceField {
    /// Value path with a wildcard for every enclosing array.
    pattern: String,
    source: OptionSource,
}

impl ChoiceField {
    fn is_repeated(&self) -> bool {
        self.pattern.split('.').any(|segment| segment == WILDCARD)
    }
}

/// Registry of option providers for one form.
pub struct OptionResolver {
    fields: RwLock<IndexMap<SmolStr, ChoiceField>>,
    providers: RwLock<IndexMap<String, Arc<OptionProvider>>>,
    cache: Option<Arc<OptionCache>>,
    root_marker: String,
}

impl Default for OptionResolver {
    fn default() -> Self {
        Self {
            fields: RwLock::new(IndexMap::new()),
            providers: RwLock::new(IndexMap::new()),
            cache: None,
            root_marker: OptionSettings::default().root_marker,
        }
    }
}

impl OptionResolver {
    /// Create a resolver without a fetcher; endpoint fields fail to refresh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with its own response cache over a fetcher.
    pub fn with_fetcher(fetcher: Arc<dyn OptionFetcher>) -> Self {
        Self::with_cache(Arc::new(OptionCache::new(fetcher)))
    }

    /// Create a resolver sharing a response cache owned by the host.
    pub fn with_cache(cache: Arc<OptionCache>) -> Self {
        Self {
            cache: Some(cache),
            ..Self::default()
        }
    }

    /// Apply the `[options]` config section.
    pub fn with_settings(mut self, settings: &OptionSettings) -> Self {
        self.root_marker = settings.root_marker.clone();
        self
    }

    /// The response cache, if a fetcher was configured.
    pub fn cache(&self) -> Option<&Arc<OptionCache>> {
        self.cache.as_ref()
    }

    /// Register every choice field in a tree.
    ///
    /// Fields already attached are replaced along with their providers.
    /// Fields outside arrays get a provider right away. Returns the number
    /// of fields registered.
    pub fn attach(&self, root: &FieldConfig) -> usize {
        let mut found = Vec::new();
        collect_choices(root, "", &mut found);

        let mut fields = self.fields.write();
        let mut providers = self.providers.write();
        for choice in &found {
            let key = SmolStr::new(field_key(&choice.pattern));
            providers.retain(|path, _| key.as_str() != field_key(path));
            if !choice.is_repeated() {
                let provider = OptionProvider::new(choice.pattern.as_str(), choice.source.clone());
                providers.insert(choice.pattern.clone(), Arc::new(provider));
            }
            fields.insert(key, choice.clone());
        }
        debug!(count = found.len(), "Attached choice fields");
        found.len()
    }

    /// Provider for a value path.
    ///
    /// Items of an array are addressed by index (`lines.2.product`); their
    /// provider is created on first use. Paths that name no attached field,
    /// or leave out an array index, have none.
    pub fn provider(&self, path: &str) -> Option<Arc<OptionProvider>> {
        let path = path.trim_matches('.');
        if let Some(provider) = self.providers.read().get(path) {
            return Some(Arc::clone(provider));
        }

        let source = {
            let fields = self.fields.read();
            let choice = fields.get(field_key(path).as_str())?;
            if !matches_pattern(&choice.pattern, path) {
                return None;
            }
            choice.source.clone()
        };

        let mut providers = self.providers.write();
        let provider = providers.entry(path.to_string()).or_insert_with(|| {
            debug!(path = %path, "Created option provider for array item");
            Arc::new(OptionProvider::new(path, source))
        });
        Some(Arc::clone(provider))
    }

    /// Field keys of all attached choice fields.
    pub fn paths(&self) -> Vec<SmolStr> {
        self.fields.read().keys().cloned().collect()
    }

    /// Value paths that currently have a provider.
    pub fn provider_paths(&self) -> Vec<String> {
        self.providers.read().keys().cloned().collect()
    }

    /// Number of attached choice fields.
    pub fn len(&self) -> usize {
        self.fields.read().len()
    }

    /// Whether no choice field is attached.
    pub fn is_empty(&self) -> bool {
        self.fields.read().is_empty()
    }

    /// Subscribe to a field's options.
    pub fn subscribe(&self, path: &str) -> OptionResult<OptionSubscription> {
        Ok(self.require(path)?.subscribe())
    }

    /// Replace a field's options, e.g. after the enum changed.
    pub fn set_options(&self, path: &str, options: OptionList) -> OptionResult<bool> {
        Ok(self.require(path)?.emit(options))
    }

    /// Recompute a field's options from the form values.
    ///
    /// `path` is a value path; array items are addressed by index
    /// (`lines.0.product`). A failed fetch leaves the last emitted options
    /// in place.
    pub async fn refresh(&self, path: &str, values: &Value) -> OptionResult<OptionList> {
        let provider = self.require(path)?;
        let path = provider.path();
        let options = match provider.source() {
            OptionSource::Static(_) => return Ok(provider.current()),
            OptionSource::Path(expression) => self.from_path(path, expression, values),
            OptionSource::Endpoint(template) => self.from_endpoint(path, template, values).await?,
        };
        provider.emit(Arc::clone(&options));
        Ok(options)
    }

    /// Refresh every dynamic field.
    ///
    /// Fields inside arrays are refreshed once per item present in
    /// `values`. All refreshes run to completion; the first failure is
    /// returned, otherwise the number of providers refreshed.
    pub async fn refresh_all(&self, values: &Value) -> OptionResult<usize> {
        let targets: Vec<String> = self
            .fields
            .read()
            .values()
            .filter(|choice| choice.source.is_dynamic())
            .flat_map(|choice| expand(&choice.pattern, values))
            .collect();

        let results = join_all(targets.iter().map(|path| self.refresh(path, values))).await;
        let count = results.len();
        results.into_iter().collect::<OptionResult<Vec<_>>>()?;
        Ok(count)
    }

    fn require(&self, path: &str) -> OptionResult<Arc<OptionProvider>> {
        self.provider(path)
            .ok_or_else(|| OptionError::unknown_field(path))
    }

    fn from_path(&self, path: &str, expression: &str, values: &Value) -> OptionList {
        let Some(parsed) = OptionsPath::parse(expression, &self.root_marker) else {
            warn!(path = %path, expression = %expression, "Invalid optionsPath");
            return OptionList::default();
        };
        let Some(source_path) = parsed.source_path(path) else {
            warn!(path = %path, expression = %expression, "optionsPath walks above the form root");
            return OptionList::default();
        };
        let Some(source) = self.provider(&source_path) else {
            warn!(path = %path, source = %source_path, "optionsPath source has no options");
            return OptionList::default();
        };

        let selected = match value_at(values, &source_path) {
            None | Some(Value::Null) => return OptionList::default(),
            Some(selected) => selected,
        };
        let current = source.current();
        let Some(option) = current.iter().find(|o| &o.value == selected) else {
            return OptionList::default();
        };

        option
            .lookup(&parsed.rest_segments())
            .map(|raw| Arc::new(map_items(raw)))
            .unwrap_or_default()
    }

    async fn from_endpoint(
        &self,
        path: &str,
        template: &str,
        values: &Value,
    ) -> OptionResult<OptionList> {
        let siblings = scope_of(path, 0)
            .and_then(|scope| value_at(values, &scope).cloned())
            .unwrap_or(Value::Null);

        let Some(endpoint) = substitute(template, &flatten(&siblings)) else {
            debug!(path = %path, template = %template, "Endpoint placeholders unset, no options");
            return Ok(OptionList::default());
        };

        let Some(cache) = &self.cache else {
            return Err(OptionError::fetch_failed(endpoint, "no option fetcher configured"));
        };
        cache.get(&endpoint).await.inspect_err(|e| {
            warn!(path = %path, endpoint = %endpoint, error = %e, "Option fetch failed");
        })
    }
}

/// Choice fields of a tree with their value path patterns.
///
/// Array templates are keyless groups; their children sit one wildcard
/// below the array.
fn collect_choices(field: &FieldConfig, pattern: &str, found: &mut Vec<ChoiceField>) {
    if let Some(source) = &field.props.options {
        found.push(ChoiceField {
            pattern: pattern.to_string(),
            source: source.clone(),
        });
    }
    if let Some(template) = &field.field_array {
        let item = join(pattern, WILDCARD);
        for child in &template.field_group {
            collect_choices(child, &join(&item, &child.key), found);
        }
        return;
    }
    for child in &field.field_group {
        collect_choices(child, &join(pattern, &child.key), found);
    }
}

impl std::fmt::Debug for OptionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionResolver")
            .field("fields", &self.paths())
            .field("providers", &self.provider_paths())
            .field("root_marker", &self.root_marker)
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{FetchError, FnOptionFetcher};
    use formwright_compiler::{FieldKind, SelectOption};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn choice(key: &str, source: OptionSource) -> FieldConfig {
        let mut field = FieldConfig::new(key, FieldKind::Select);
        field.props.options = Some(source);
        field
    }

    fn labels(options: &OptionList) -> Vec<&str> {
        options.iter().map(|o| o.label.as_str()).collect()
    }

    #[tokio::test]
    async fn test_attach_and_unknown_field() {
        let root = FieldConfig::group(
            "root",
            vec![
                choice("status", OptionSource::Static(vec![SelectOption::new("a", "status.a")])),
                FieldConfig::new("name", FieldKind::Input),
            ],
        );
        let resolver = OptionResolver::new();
        assert_eq!(resolver.attach(&root), 1);
        assert_eq!(resolver.paths(), vec![SmolStr::new("status")]);

        let refreshed = resolver.refresh("status", &json!({})).await.unwrap();
        assert_eq!(labels(&refreshed), vec!["status.a"]);

        let err = resolver.subscribe("name").unwrap_err();
        assert_eq!(err, OptionError::unknown_field("name"));
    }

    #[tokio::test]
    async fn test_options_path_from_selection() {
        let root = FieldConfig::group(
            "root",
            vec![
                choice("country", OptionSource::Endpoint("/countries".into())),
                choice("city", OptionSource::Path("country.cities".into())),
            ],
        );
        let resolver = OptionResolver::new();
        resolver.attach(&root);
        resolver
            .set_options(
                "country",
                Arc::new(vec![
                    SelectOption::new("de", "Germany")
                        .with_data(json!({"id": "de", "cities": ["Berlin", "Hamburg"]})),
                    SelectOption::new("fr", "France")
                        .with_data(json!({"id": "fr", "cities": ["Paris"]})),
                ]),
            )
            .unwrap();

        let cities = resolver.refresh("city", &json!({"country": "fr"})).await.unwrap();
        assert_eq!(labels(&cities), vec!["Paris"]);

        let mut subscription = resolver.subscribe("city").unwrap();
        assert_eq!(labels(&subscription.next().await.unwrap()), vec!["Paris"]);

        let none = resolver.refresh("city", &json!({"country": null})).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_endpoint_substitution_and_failure() {
        let fetcher = FnOptionFetcher::new(|endpoint: String| async move {
            match endpoint.as_str() {
                "/cities?country=de" => Ok(json!([{"id": 1, "name": "Berlin"}])),
                _ => Err::<Value, FetchError>(format!("no route {endpoint}").into()),
            }
        });
        let root = FieldConfig::group(
            "root",
            vec![choice("city", OptionSource::Endpoint("/cities?country=$country".into()))],
        );
        let resolver = OptionResolver::with_fetcher(Arc::new(fetcher));
        resolver.attach(&root);

        let empty = resolver.refresh("city", &json!({})).await.unwrap();
        assert!(empty.is_empty());

        let cities = resolver.refresh("city", &json!({"country": "de"})).await.unwrap();
        assert_eq!(labels(&cities), vec!["Berlin"]);

        let err = resolver.refresh("city", &json!({"country": "xx"})).await.unwrap_err();
        assert!(matches!(err, OptionError::FetchFailed { .. }));
        let kept = resolver.provider("city").unwrap().current();
        assert_eq!(labels(&kept), vec!["Berlin"]);
    }

    #[tokio::test]
    async fn test_endpoint_without_fetcher() {
        let root = FieldConfig::group(
            "root",
            vec![choice("tag", OptionSource::Endpoint("/tags".into()))],
        );
        let resolver = OptionResolver::new();
        resolver.attach(&root);
        assert!(resolver.refresh_all(&json!({})).await.is_err());
    }

    fn order_with_lines() -> FieldConfig {
        let mut lines = FieldConfig::new("lines", FieldKind::Array);
        lines.field_array = Some(Box::new(FieldConfig::group(
            "",
            vec![
                FieldConfig::new("country", FieldKind::Input),
                choice("city", OptionSource::Endpoint("/cities/$country".into())),
            ],
        )));
        FieldConfig::group("root", vec![lines])
    }

    fn city_fetcher() -> FnOptionFetcher {
        FnOptionFetcher::new(|endpoint: String| async move {
            match endpoint.as_str() {
                "/cities/de" => Ok(json!([{"id": "ber", "name": "Berlin"}])),
                "/cities/fr" => Ok(json!([
                    {"id": "par", "name": "Paris"},
                    {"id": "lyo", "name": "Lyon"}
                ])),
                _ => Err::<Value, FetchError>(format!("no route {endpoint}").into()),
            }
        })
    }

    #[tokio::test]
    async fn test_array_items_keep_their_own_options() {
        let resolver = OptionResolver::with_fetcher(Arc::new(city_fetcher()));
        assert_eq!(resolver.attach(&order_with_lines()), 1);
        assert_eq!(resolver.paths(), vec![SmolStr::new("lines.city")]);
        assert!(resolver.provider_paths().is_empty());

        let values = json!({"lines": [{"country": "de"}, {"country": "fr"}]});
        let first = resolver.refresh("lines.0.city", &values).await.unwrap();
        let second = resolver.refresh("lines.1.city", &values).await.unwrap();
        assert_eq!(labels(&first), vec!["Berlin"]);
        assert_eq!(labels(&second), vec!["Paris", "Lyon"]);

        let kept = resolver.provider("lines.0.city").unwrap().current();
        assert_eq!(labels(&kept), vec!["Berlin"]);
        assert!(resolver.provider("lines.city").is_none());
        assert!(resolver.provider("lines.x.city").is_none());
    }

    #[tokio::test]
    async fn test_refresh_all_expands_array_items() {
        let resolver = OptionResolver::with_fetcher(Arc::new(city_fetcher()));
        resolver.attach(&order_with_lines());

        let mut first = resolver.subscribe("lines.0.city").unwrap();
        assert!(first.next().await.unwrap().is_empty());

        let values = json!({"lines": [{"country": "de"}, {"country": "fr"}]});
        assert_eq!(resolver.refresh_all(&values).await.unwrap(), 2);

        assert_eq!(labels(&first.next().await.unwrap()), vec!["Berlin"]);
        let second = resolver.provider("lines.1.city").unwrap().current();
        assert_eq!(labels(&second), vec!["Paris", "Lyon"]);
        assert_eq!(resolver.provider_paths(), vec!["lines.0.city", "lines.1.city"]);

        assert_eq!(resolver.refresh_all(&json!({"lines": []})).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reattach_drops_item_providers() {
        let resolver = OptionResolver::with_fetcher(Arc::new(city_fetcher()));
        resolver.attach(&order_with_lines());
        resolver.provider("lines.4.city").unwrap();
        assert_eq!(resolver.provider_paths().len(), 1);

        resolver.attach(&order_with_lines());
        assert!(resolver.provider_paths().is_empty());
        assert_eq!(resolver.len(), 1);
    }
}
