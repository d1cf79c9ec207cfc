//! Store registry

use crate::Store;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Name → store lookup. Filled once at startup, read on every request.
#[derive(Clone, Default)]
pub struct StoreRegistry {
    stores: BTreeMap<String, Arc<dyn Store>>,
}

impl StoreRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a store under its own name, replacing any previous one
    pub fn register(&mut self, store: Arc<dyn Store>) -> Option<Arc<dyn Store>> {
        let name = store.name().to_string();
        tracing::debug!(store = %name, "Registering store");
        self.stores.insert(name, store)
    }

    /// Builder-style registration
    pub fn with_store(mut self, store: impl Store + 'static) -> Self {
        self.register(Arc::new(store));
        self
    }

    /// Resolve a store by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Store>> {
        self.stores.get(name).cloned()
    }

    /// Registered store names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.stores.keys().map(String::as_str).collect()
    }

    /// Number of registered stores
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Check if no store is registered
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}
