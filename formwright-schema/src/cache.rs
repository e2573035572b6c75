//! Schema caching with single-flight loading.
//!
//! This module provides:
//! - [`SingleFlight`], a keyed async memoizer where concurrent requests for
//!   one key share a single in-flight computation
//! - [`SchemaCache`], which wraps a [`SchemaProvider`] so each schema is
//!   fetched at most once per form-building session
//!
//! Eviction is always explicit: the host decides when a session ends and
//! calls [`SchemaCache::clear`] or [`SchemaCache::evict`].
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use formwright_schema::cache::SchemaCache;
//! use formwright_schema::provider::StaticSchemaProvider;
//!
//! # tokio_test_block(async {
//! let provider = StaticSchemaProvider::from_json(r#"{"Tag": {"properties": {}}}"#).unwrap();
//! let cache = SchemaCache::new(Arc::new(provider));
//!
//! let first = cache.get("Tag").await.unwrap();
//! let second = cache.get("Tag").await.unwrap();
//! assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     futures::executor::block_on(f)
//! # }
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use smol_str::SmolStr;
use tokio::sync::OnceCell;

use crate::ast::SchemaDefinition;
use crate::error::SchemaResult;
use crate::provider::SchemaProvider;

// ============================================================================
// Single-flight memoization
// ============================================================================

/// Statistics for a cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits (including joins on an in-flight load).
    pub hits: u64,
    /// Number of loads actually performed.
    pub misses: u64,
    /// Number of loads that failed.
    pub failures: u64,
    /// Number of entries currently cached.
    pub cached_count: usize,
}

impl CacheStats {
    /// Get the cache hit rate.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Keyed async memoizer.
///
/// Every key maps to one cell. The first caller for a key runs the loader;
/// callers arriving while it runs wait for the same result. A failed load
/// leaves the cell empty, so the next caller retries.
#[derive(Debug)]
pub struct SingleFlight<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
    stats: Mutex<CacheStats>,
}

impl<K, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
            stats: Mutex::new(CacheStats::default()),
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty memoizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value for `key`, running `load` only if no value exists and
    /// no load is in flight.
    pub async fn get_or_try_load<F, Fut, E>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = {
            let mut cells = self.cells.lock();
            Arc::clone(cells.entry(key).or_default())
        };

        if let Some(value) = cell.get() {
            self.stats.lock().hits += 1;
            return Ok(value.clone());
        }

        let mut loaded = false;
        let result = cell
            .get_or_try_init(|| {
                loaded = true;
                load()
            })
            .await
            .cloned();

        let mut stats = self.stats.lock();
        match (&result, loaded) {
            (Err(_), _) => stats.failures += 1,
            (Ok(_), true) => stats.misses += 1,
            (Ok(_), false) => stats.hits += 1,
        }
        result
    }

    /// Store a value directly, replacing any previous one.
    pub fn insert(&self, key: K, value: V) {
        let cell = OnceCell::new_with(Some(value));
        self.cells.lock().insert(key, Arc::new(cell));
    }

    /// Get a loaded value without triggering a load.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cells
            .lock()
            .get(key)
            .and_then(|cell| cell.get().cloned())
    }

    /// Whether a loaded value exists for `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cells
            .lock()
            .get(key)
            .is_some_and(|cell| cell.initialized())
    }

    /// Drop the entry for `key`. In-flight loads finish but are not kept.
    pub fn evict<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cells.lock().remove(key).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.cells.lock().clear();
    }

    /// Number of loaded entries.
    pub fn len(&self) -> usize {
        self.cells
            .lock()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    /// Whether nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.lock().clone();
        stats.cached_count = self.len();
        stats
    }
}

// ============================================================================
// Schema Cache
// ============================================================================

/// A session-scoped schema cache in front of a [`SchemaProvider`].
///
/// Missing schemas are cached too (as `None`), so a dangling reference is
/// looked up once per session.
pub struct SchemaCache {
    provider: Arc<dyn SchemaProvider>,
    schemas: SingleFlight<SmolStr, Option<Arc<SchemaDefinition>>>,
}

impl SchemaCache {
    /// Create a cache over a provider.
    pub fn new(provider: Arc<dyn SchemaProvider>) -> Self {
        Self {
            provider,
            schemas: SingleFlight::new(),
        }
    }

    /// Get a schema, loading it through the provider on first use.
    pub async fn get(&self, name: &str) -> SchemaResult<Option<Arc<SchemaDefinition>>> {
        let provider = Arc::clone(&self.provider);
        self.schemas
            .get_or_try_load(SmolStr::new(name), || async move {
                tracing::debug!(schema = %name, "Fetching schema");
                provider.get_schema(name).await
            })
            .await
    }

    /// Load every schema the provider knows and seed the cache with them.
    pub async fn get_all(&self) -> SchemaResult<IndexMap<SmolStr, Arc<SchemaDefinition>>> {
        let schemas = self.provider.get_schemas().await?;
        for (name, definition) in &schemas {
            if !self.schemas.contains(name.as_str()) {
                self.schemas.insert(name.clone(), Some(Arc::clone(definition)));
            }
        }
        Ok(schemas)
    }

    /// Whether a schema (or its absence) is cached.
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains(name)
    }

    /// Forget one schema.
    pub fn evict(&self, name: &str) -> bool {
        self.schemas.evict(name)
    }

    /// Forget everything; call between independent form sessions.
    pub fn clear(&self) {
        self.schemas.clear();
    }

    /// Number of cached lookups.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.schemas.stats()
    }
}

impl std::fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCache")
            .field("stats", &self.stats())
            .finish()
    }
}
