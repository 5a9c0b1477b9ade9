//! In-memory index store.

use crate::error::CoreResult;
use crate::index::IndexConfig;
use crate::store::{committed_names, Entry, IndexStore};
use crate::types::{EntityKind, IndexIdentity};
use parking_lot::RwLock;
use std::collections::HashMap;

/// An [`IndexStore`] that keeps records in a map for the life of the process.
#[derive(Debug, Default)]
pub struct InMemoryIndexStore {
    records: RwLock<HashMap<IndexIdentity, Entry>>,
}

impl InMemoryIndexStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().values().filter(|entry| entry.committed).count()
    }

    /// Returns true when no index is committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IndexStore for InMemoryIndexStore {
    fn get(&self, identity: &IndexIdentity) -> CoreResult<Option<IndexConfig>> {
        Ok(self
            .records
            .read()
            .get(identity)
            .filter(|entry| entry.committed)
            .map(|entry| entry.config.clone()))
    }

    fn set_if_absent(&self, identity: &IndexIdentity, config: &IndexConfig) -> CoreResult<bool> {
        let mut records = self.records.write();
        if records.get(identity).is_some_and(|entry| entry.committed) {
            return Ok(false);
        }
        records.insert(identity.clone(), Entry::claimed(config));
        Ok(true)
    }

    fn commit(&self, identity: &IndexIdentity) -> CoreResult<bool> {
        match self.records.write().get_mut(identity) {
            Some(entry) if !entry.committed => {
                entry.committed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn remove(&self, identity: &IndexIdentity) -> CoreResult<bool> {
        Ok(self.records.write().remove(identity).is_some())
    }

    fn names(&self, kind: EntityKind) -> CoreResult<Vec<String>> {
        Ok(committed_names(self.records.read().iter(), kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit_new(store: &InMemoryIndexStore, identity: &IndexIdentity, config: &IndexConfig) {
        assert!(store.set_if_absent(identity, config).unwrap());
        assert!(store.commit(identity).unwrap());
    }

    #[test]
    fn committed_record_blocks_later_claims() {
        let store = InMemoryIndexStore::new();
        let identity = IndexIdentity::node("people");
        let first = IndexConfig::for_provider("hash");
        let second = IndexConfig::for_provider("other");

        commit_new(&store, &identity, &first);
        assert!(!store.set_if_absent(&identity, &second).unwrap());
        assert!(!store.commit(&identity).unwrap());
        assert_eq!(store.get(&identity).unwrap(), Some(first));
    }

    #[test]
    fn uncommitted_claim_is_invisible_and_replaceable() {
        let store = InMemoryIndexStore::new();
        let identity = IndexIdentity::node("people");

        assert!(store
            .set_if_absent(&identity, &IndexConfig::for_provider("hash"))
            .unwrap());
        assert!(store.get(&identity).unwrap().is_none());
        assert!(store.names(EntityKind::Node).unwrap().is_empty());
        assert!(store.is_empty());

        let replacement = IndexConfig::for_provider("other");
        assert!(store.set_if_absent(&identity, &replacement).unwrap());
        assert!(store.commit(&identity).unwrap());
        assert_eq!(store.get(&identity).unwrap(), Some(replacement));
    }

    #[test]
    fn remove_clears_record() {
        let store = InMemoryIndexStore::new();
        let identity = IndexIdentity::relationship("knows");
        commit_new(&store, &identity, &IndexConfig::for_provider("hash"));

        assert!(store.remove(&identity).unwrap());
        assert!(!store.remove(&identity).unwrap());
        assert!(store.get(&identity).unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn names_are_per_kind() {
        let store = InMemoryIndexStore::new();
        let config = IndexConfig::for_provider("hash");
        commit_new(&store, &IndexIdentity::node("b"), &config);
        commit_new(&store, &IndexIdentity::node("a"), &config);
        commit_new(&store, &IndexIdentity::relationship("c"), &config);
        store.set_if_absent(&IndexIdentity::node("pending"), &config).unwrap();

        assert_eq!(store.names(EntityKind::Node).unwrap(), vec!["a", "b"]);
        assert_eq!(store.names(EntityKind::Relationship).unwrap(), vec!["c"]);
        assert_eq!(store.len(), 3);
    }
}
