//! Engine type → adapter lookup.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::{AdapterError, EngineAdapter, MySqlAdapter, MySqlFlavor, OracleAdapter, PostgresAdapter};

/// Maps configuration engine types to adapters.
///
/// Built once at startup and passed to whoever needs lookup.
#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn EngineAdapter>>,
}

impl AdapterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in engine family.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        let postgres: Arc<dyn EngineAdapter> = Arc::new(PostgresAdapter);
        registry.register("postgres", postgres.clone());
        registry.register("postgresql", postgres);
        registry.register("mysql", Arc::new(MySqlAdapter::new(MySqlFlavor::MySql)));
        registry.register("mariadb", Arc::new(MySqlAdapter::new(MySqlFlavor::MariaDb)));
        registry.register("oracle", Arc::new(OracleAdapter));
        registry
    }

    /// Registers `adapter` under `name`, replacing any earlier registration.
    pub fn register(&mut self, name: impl Into<String>, adapter: Arc<dyn EngineAdapter>) {
        self.adapters.insert(name.into(), adapter);
    }

    /// Looks up the adapter for an engine type (case-sensitive).
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn EngineAdapter>, AdapterError> {
        self.adapters
            .get(name)
            .cloned()
            .ok_or_else(|| AdapterError::UnsupportedEngine(name.to_string()))
    }

    /// All registered engine types, sorted.
    pub fn list_supported(&self) -> BTreeSet<String> {
        self.adapters.keys().cloned().collect()
    }
}
