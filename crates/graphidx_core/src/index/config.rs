//! Per-index configuration maps.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Configuration of a single index: string keys to string values.
///
/// Key order is irrelevant; two configurations are equal when they hold
/// exactly the same entries. Every effective configuration carries
/// [`PROVIDER_KEY`](Self::PROVIDER_KEY) naming the provider that owns the
/// index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexConfig {
    entries: BTreeMap<String, String>,
}

impl IndexConfig {
    /// Reserved key naming the owning provider.
    pub const PROVIDER_KEY: &'static str = "provider";

    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration holding only the provider key.
    pub fn for_provider(provider: impl Into<String>) -> Self {
        Self::new().with(Self::PROVIDER_KEY, provider)
    }

    /// Adds an entry, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts an entry, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Returns the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns true when `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the provider name, if set.
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        self.get(Self::PROVIDER_KEY)
    }

    /// Returns the provider name or an [`InvalidConfig`](CoreError::InvalidConfig) error.
    pub fn require_provider(&self) -> CoreResult<&str> {
        self.provider().ok_or_else(|| {
            CoreError::invalid_config(format!(
                "configuration {self} has no '{}' entry",
                Self::PROVIDER_KEY
            ))
        })
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.entries.iter()
    }
}

impl fmt::Display for IndexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str("}")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for IndexConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<HashMap<String, String>> for IndexConfig {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a IndexConfig {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
