//! Provider registry.

use crate::error::{CoreError, CoreResult};
use crate::provider::IndexProvider;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Name to provider mapping.
///
/// Read-mostly: lookups take a shared lock, registration (an administrative
/// step done at setup) takes the exclusive one.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn IndexProvider>>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under `name`, replacing any previous one.
    pub fn register(&self, name: impl Into<String>, provider: Arc<dyn IndexProvider>) {
        let name = name.into();
        tracing::debug!(provider = %name, "index provider registered");
        self.providers.write().insert(name, provider);
    }

    /// Looks up the provider registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownProvider`](CoreError::UnknownProvider) if nothing is
    /// registered under `name`.
    pub fn lookup(&self, name: &str) -> CoreResult<Arc<dyn IndexProvider>> {
        self.providers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::unknown_provider(name))
    }

    /// Returns true if a provider is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.providers.read().contains_key(name)
    }

    /// Registered provider names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::HashIndexProvider;

    #[test]
    fn lookup_registered_provider() {
        let registry = ProviderRegistry::new();
        registry.register("hash", Arc::new(HashIndexProvider::new()));

        assert!(registry.contains("hash"));
        assert!(registry.lookup("hash").is_ok());
        assert_eq!(registry.names(), vec!["hash"]);
    }

    #[test]
    fn lookup_unknown_provider_fails() {
        let registry = ProviderRegistry::new();
        let err = registry.lookup("lucene").err().unwrap();
        assert!(matches!(err, CoreError::UnknownProvider { ref name } if name == "lucene"));
    }

    #[test]
    fn register_replaces() {
        let registry = ProviderRegistry::new();
        let first: Arc<dyn IndexProvider> = Arc::new(HashIndexProvider::new());
        let second: Arc<dyn IndexProvider> = Arc::new(HashIndexProvider::new());
        registry.register("hash", Arc::clone(&first));
        registry.register("hash", Arc::clone(&second));

        let found = registry.lookup("hash").unwrap();
        assert!(Arc::ptr_eq(&found, &second));
        assert_eq!(registry.names().len(), 1);
    }
}
