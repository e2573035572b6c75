//! Schema providers: where schema definitions come from.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use smol_str::SmolStr;

use crate::ast::{SchemaDefinition, SchemaDocument};
use crate::error::SchemaResult;

/// A source of schema definitions.
///
/// Implementations may perform I/O; the compiler only ever reaches them
/// through a [`SchemaCache`](crate::cache::SchemaCache), which memoizes
/// results per name.
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// Fetch one schema by name. `Ok(None)` means the schema does not exist.
    async fn get_schema(&self, name: &str) -> SchemaResult<Option<Arc<SchemaDefinition>>>;

    /// Fetch every schema the provider knows about.
    async fn get_schemas(&self) -> SchemaResult<IndexMap<SmolStr, Arc<SchemaDefinition>>>;
}

/// A provider serving an in-memory [`SchemaDocument`].
#[derive(Debug, Default)]
pub struct StaticSchemaProvider {
    document: RwLock<SchemaDocument>,
}

impl StaticSchemaProvider {
    /// Create a provider over a document.
    pub fn new(document: SchemaDocument) -> Self {
        Self {
            document: RwLock::new(document),
        }
    }

    /// Parse a JSON document and serve it.
    pub fn from_json(source: &str) -> SchemaResult<Self> {
        Ok(Self::new(SchemaDocument::from_json(source)?))
    }

    /// Add or replace a schema.
    pub fn insert(&self, definition: SchemaDefinition) {
        self.document.write().insert(definition);
    }

    /// Replace the whole document.
    pub fn replace(&self, document: SchemaDocument) {
        *self.document.write() = document;
    }

    /// Number of schemas served.
    pub fn len(&self) -> usize {
        self.document.read().len()
    }

    /// Whether the provider serves nothing.
    pub fn is_empty(&self) -> bool {
        self.document.read().is_empty()
    }
}

#[async_trait]
impl SchemaProvider for StaticSchemaProvider {
    async fn get_schema(&self, name: &str) -> SchemaResult<Option<Arc<SchemaDefinition>>> {
        Ok(self.document.read().get(name).cloned())
    }

    async fn get_schemas(&self) -> SchemaResult<IndexMap<SmolStr, Arc<SchemaDefinition>>> {
        Ok(self.document.read().to_map())
    }
}

/// Type alias for async schema loader functions.
pub type LoaderFn = Arc<
    dyn Fn(SmolStr) -> Pin<Box<dyn Future<Output = SchemaResult<Option<SchemaDefinition>>> + Send>>
        + Send
        + Sync,
>;

/// A provider backed by a callback, e.g. an HTTP fetch.
///
/// Such a provider cannot enumerate schemas, so `get_schemas` returns only
/// the names it was told about via [`FnSchemaProvider::with_known`].
pub struct FnSchemaProvider {
    load_fn: LoaderFn,
    known: Vec<SmolStr>,
}

impl FnSchemaProvider {
    /// Create a provider with a loader callback.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(SmolStr) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SchemaResult<Option<SchemaDefinition>>> + Send + 'static,
    {
        Self {
            load_fn: Arc::new(move |name| Box::pin(f(name))),
            known: Vec::new(),
        }
    }

    /// Names returned by `get_schemas`.
    pub fn with_known<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.known = names.into_iter().map(Into::into).collect();
        self
    }
}

impl std::fmt::Debug for FnSchemaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSchemaProvider")
            .field("known", &self.known)
            .finish()
    }
}

#[async_trait]
impl SchemaProvider for FnSchemaProvider {
    async fn get_schema(&self, name: &str) -> SchemaResult<Option<Arc<SchemaDefinition>>> {
        let loaded = (self.load_fn)(SmolStr::new(name)).await?;
        Ok(loaded.map(|mut definition| {
            definition.normalize(name);
            Arc::new(definition)
        }))
    }

    async fn get_schemas(&self) -> SchemaResult<IndexMap<SmolStr, Arc<SchemaDefinition>>> {
        let mut schemas = IndexMap::with_capacity(self.known.len());
        for name in &self.known {
            if let Some(definition) = self.get_schema(name).await? {
                schemas.insert(name.clone(), definition);
            }
        }
        Ok(schemas)
    }
}
