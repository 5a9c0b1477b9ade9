//! Database configuration consulted by the index manager.

use std::collections::HashMap;

/// Provider used when neither the index-scoped nor the global default is set.
pub const DEFAULT_INDEX_PROVIDER: &str = "hash";

/// Global parameter naming the default provider for every index.
pub const INDEX_PROVIDER_PARAM: &str = "index";

/// Database-level configuration.
///
/// `params` is a read-only snapshot of database parameters. The index
/// manager reads provider defaults from it: `index.<name>` for one index,
/// then `index` for all of them.
#[derive(Debug, Clone)]
pub struct Config {
    /// Raw database parameters.
    pub params: HashMap<String, String>,

    /// Whether the durable index store syncs after every record.
    pub sync_on_write: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            params: HashMap::new(),
            sync_on_write: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an arbitrary parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Sets the default provider for every index.
    #[must_use]
    pub fn default_index_provider(self, provider: impl Into<String>) -> Self {
        self.param(INDEX_PROVIDER_PARAM, provider)
    }

    /// Sets the default provider for the index called `index_name`.
    #[must_use]
    pub fn index_provider_for(self, index_name: &str, provider: impl Into<String>) -> Self {
        self.param(scoped_param(index_name), provider)
    }

    /// Sets whether the durable store syncs after every record.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Provider name to use for `index_name` when the caller supplies no configuration.
    ///
    /// Checks `index.<name>`, then `index`, then falls back to
    /// [`DEFAULT_INDEX_PROVIDER`].
    #[must_use]
    pub fn provider_for(&self, index_name: &str) -> &str {
        self.params
            .get(&scoped_param(index_name))
            .or_else(|| self.params.get(INDEX_PROVIDER_PARAM))
            .map_or(DEFAULT_INDEX_PROVIDER, String::as_str)
    }
}

fn scoped_param(index_name: &str) -> String {
    format!("{INDEX_PROVIDER_PARAM}.{index_name}")
}
