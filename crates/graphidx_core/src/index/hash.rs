//! Accessor for indexes owned by the built-in hash provider.

use crate::index::{GraphIndex, IndexConfig};
use crate::types::IndexIdentity;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::{HashMap, HashSet};

/// Matching mode of a hash index, read from its `type` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Values match byte for byte.
    Exact,
    /// Values are lowercased before insertion and lookup.
    CaseInsensitive,
}

impl MatchMode {
    /// Configuration key selecting the mode.
    pub const CONFIG_KEY: &'static str = "type";

    /// Parses the mode from a configuration; absent means exact.
    #[must_use]
    pub fn from_config(config: &IndexConfig) -> Option<Self> {
        match config.get(Self::CONFIG_KEY) {
            None | Some("exact") => Some(Self::Exact),
            Some("fulltext") => Some(Self::CaseInsensitive),
            Some(_) => None,
        }
    }

    fn normalize(self, value: &str) -> String {
        match self {
            Self::Exact => value.to_string(),
            Self::CaseInsensitive => value.to_lowercase(),
        }
    }
}

/// A key/value to entity-id hash index.
///
/// Each `(key, value)` pair maps to the set of graph entities indexed under
/// it. Lookups are O(1) equality matches.
///
/// ```rust,ignore
/// let index = HashGraphIndex::new(IndexIdentity::node("people"), config, MatchMode::Exact);
/// index.add(42, "name", "alice");
/// assert_eq!(index.get("name", "alice"), vec![42]);
/// ```
#[derive(Debug)]
pub struct HashGraphIndex {
    identity: IndexIdentity,
    config: IndexConfig,
    mode: MatchMode,
    entries: RwLock<HashMap<(String, String), HashSet<u64>>>,
}

impl HashGraphIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new(identity: IndexIdentity, config: IndexConfig, mode: MatchMode) -> Self {
        Self {
            identity,
            config,
            mode,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Matching mode.
    #[must_use]
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Indexes `entity` under `key = value`. Returns false if it already was.
    pub fn add(&self, entity: u64, key: &str, value: &str) -> bool {
        let slot = (key.to_string(), self.mode.normalize(value));
        self.entries.write().entry(slot).or_default().insert(entity)
    }

    /// Removes `entity` from `key = value`. Returns true if it was present.
    pub fn remove(&self, entity: u64, key: &str, value: &str) -> bool {
        let slot = (key.to_string(), self.mode.normalize(value));
        let mut entries = self.entries.write();
        let Some(set) = entries.get_mut(&slot) else {
            return false;
        };
        let removed = set.remove(&entity);
        if set.is_empty() {
            entries.remove(&slot);
        }
        removed
    }

    /// Entities indexed under `key = value`, in ascending id order.
    #[must_use]
    pub fn get(&self, key: &str, value: &str) -> Vec<u64> {
        let slot = (key.to_string(), self.mode.normalize(value));
        let mut hits: Vec<u64> = self
            .entries
            .read()
            .get(&slot)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        hits.sort_unstable();
        hits
    }

    /// Total number of (entity, key, value) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().values().map(HashSet::len).sum()
    }

    /// Returns true when nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl GraphIndex for HashGraphIndex {
    fn identity(&self) -> &IndexIdentity {
        &self.identity
    }

    fn config(&self) -> &IndexConfig {
        &self.config
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact() -> HashGraphIndex {
        HashGraphIndex::new(
            IndexIdentity::node("people"),
            IndexConfig::for_provider("hash"),
            MatchMode::Exact,
        )
    }

    #[test]
    fn add_and_get() {
        let index = exact();
        assert!(index.add(2, "name", "alice"));
        assert!(index.add(1, "name", "alice"));
        assert!(!index.add(1, "name", "alice"));
        assert_eq!(index.get("name", "alice"), vec![1, 2]);
        assert!(index.get("name", "bob").is_empty());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn remove_drops_empty_slots() {
        let index = exact();
        index.add(1, "name", "alice");
        assert!(index.remove(1, "name", "alice"));
        assert!(!index.remove(1, "name", "alice"));
        assert!(index.is_empty());
    }

    #[test]
    fn exact_mode_is_case_sensitive() {
        let index = exact();
        index.add(1, "name", "Alice");
        assert!(index.get("name", "alice").is_empty());
    }

    #[test]
    fn fulltext_mode_lowercases() {
        let index = HashGraphIndex::new(
            IndexIdentity::node("people"),
            IndexConfig::for_provider("hash").with("type", "fulltext"),
            MatchMode::CaseInsensitive,
        );
        index.add(1, "name", "Alice");
        assert_eq!(index.get("name", "ALICE"), vec![1]);
    }

    #[test]
    fn mode_from_config() {
        let base = IndexConfig::for_provider("hash");
        assert_eq!(MatchMode::from_config(&base), Some(MatchMode::Exact));
        assert_eq!(
            MatchMode::from_config(&base.clone().with("type", "fulltext")),
            Some(MatchMode::CaseInsensitive)
        );
        assert_eq!(MatchMode::from_config(&base.with("type", "fuzzy")), None);
    }
}
