//! The remote option listing collaborator and its response cache.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use formwright_compiler::SelectOption;
use formwright_schema::{CacheStats, SingleFlight};
use serde_json::Value;

use crate::error::{OptionError, OptionResult};

/// Error type fetchers may return.
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// Lists raw option items for an endpoint.
///
/// The response should be a JSON array; anything else yields no options.
/// Retries and timeouts belong to the implementation.
#[async_trait]
pub trait OptionFetcher: Send + Sync {
    async fn fetch(&self, endpoint: &str) -> Result<Value, FetchError>;
}

/// Type alias for async fetch functions.
pub type FetchFn = Arc<
    dyn Fn(String) -> Pin<Box<dyn Future<Output = Result<Value, FetchError>> + Send>>
        + Send
        + Sync,
>;

/// A fetcher backed by a callback.
#[derive(Clone)]
pub struct FnOptionFetcher {
    fetch_fn: FetchFn,
}

impl FnOptionFetcher {
    /// Wrap an async closure taking the substituted endpoint.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
    {
        Self {
            fetch_fn: Arc::new(move |endpoint| Box::pin(f(endpoint))),
        }
    }
}

impl std::fmt::Debug for FnOptionFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnOptionFetcher").finish_non_exhaustive()
    }
}

#[async_trait]
impl OptionFetcher for FnOptionFetcher {
    async fn fetch(&self, endpoint: &str) -> Result<Value, FetchError> {
        (self.fetch_fn)(endpoint.to_string()).await
    }
}

/// Map one raw item to an option.
///
/// Objects take their value from `value`, `id` or `_id` and their label
/// from `label`, `name` or `title`, and keep the whole object as the
/// option's data. Scalars are both value and label. Items without a value
/// are skipped.
pub fn map_item(item: &Value) -> Option<SelectOption> {
    match item {
        Value::Null => None,
        Value::Object(map) => {
            let value = ["value", "id", "_id"]
                .iter()
                .find_map(|k| map.get(*k).filter(|v| !v.is_null()))?
                .clone();
            let label = ["label", "name", "title"]
                .iter()
                .find_map(|k| map.get(*k))
                .map(display)
                .unwrap_or_else(|| display(&value));
            let mut option = SelectOption::new(value, label).with_data(item.clone());
            if let Some(classes) = map.get("classes").and_then(Value::as_str) {
                option = option.with_classes(classes);
            }
            Some(option)
        }
        scalar => Some(SelectOption::new(scalar.clone(), display(scalar))),
    }
}

/// Map a raw list to options; non-arrays map to nothing.
pub fn map_items(raw: &Value) -> Vec<SelectOption> {
    raw.as_array()
        .map(|items| items.iter().filter_map(map_item).collect())
        .unwrap_or_default()
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Single-flight cache of mapped option lists keyed by substituted endpoint.
///
/// Concurrent requests for one endpoint share a single fetch. Failures
/// are not cached. Eviction is up to the host.
pub struct OptionCache {
    fetcher: Arc<dyn OptionFetcher>,
    lists: SingleFlight<String, Arc<Vec<SelectOption>>>,
}

impl OptionCache {
    /// Create an empty cache over a fetcher.
    pub fn new(fetcher: Arc<dyn OptionFetcher>) -> Self {
        Self {
            fetcher,
            lists: SingleFlight::new(),
        }
    }

    /// Options for an endpoint, fetching on first use.
    pub async fn get(&self, endpoint: &str) -> OptionResult<Arc<Vec<SelectOption>>> {
        let fetcher = Arc::clone(&self.fetcher);
        self.lists
            .get_or_try_load(endpoint.to_string(), || async move {
                tracing::debug!(endpoint = %endpoint, "Fetching options");
                let raw = fetcher
                    .fetch(endpoint)
                    .await
                    .map_err(|e| OptionError::fetch_failed(endpoint, e))?;
                Ok(Arc::new(map_items(&raw)))
            })
            .await
    }

    /// Whether a list is cached for an endpoint.
    pub fn contains(&self, endpoint: &str) -> bool {
        self.lists.contains(endpoint)
    }

    /// Drop one endpoint so the next `get` fetches again.
    pub fn evict(&self, endpoint: &str) -> bool {
        self.lists.evict(endpoint)
    }

    /// Drop every cached list.
    pub fn clear(&self) {
        self.lists.clear();
    }

    /// Hit and miss counters.
    pub fn stats(&self) -> CacheStats {
        self.lists.stats()
    }
}

impl std::fmt::Debug for OptionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionCache")
            .field("stats", &self.lists.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_map_objects() {
        let options = map_items(&json!([
            {"id": 7, "name": "Seven", "classes": "odd"},
            {"_id": "x"},
            {"value": "v", "label": "Vee", "title": "ignored"},
            {"name": "no value"}
        ]));
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].value, json!(7));
        assert_eq!(options[0].label, "Seven");
        assert_eq!(options[0].classes.as_deref(), Some("odd"));
        assert_eq!(options[1].label, "x");
        assert_eq!(options[2].label, "Vee");
    }

    #[test]
    fn test_map_scalars_and_non_arrays() {
        let options = map_items(&json!(["a", 2, null]));
        assert_eq!(options, vec![SelectOption::new("a", "a"), SelectOption::new(2, "2")]);
        assert!(map_items(&json!({"items": []})).is_empty());
    }

    #[tokio::test]
    async fn test_cache_single_flight_and_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let fetcher = FnOptionFetcher::new(move |endpoint| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                if endpoint.contains("broken") {
                    Err::<Value, FetchError>("503".into())
                } else {
                    Ok(json!(["a", "b"]))
                }
            }
        });
        let cache = OptionCache::new(Arc::new(fetcher));

        let (first, second) = tokio::join!(cache.get("/letters"), cache.get("/letters"));
        assert_eq!(first.unwrap().len(), 2);
        assert_eq!(second.unwrap().len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let err = cache.get("/broken").await.unwrap_err();
        assert!(matches!(err, OptionError::FetchFailed { .. }));
        assert!(!cache.contains("/broken"));
        assert!(cache.get("/broken").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        assert!(cache.evict("/letters"));
        cache.get("/letters").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
