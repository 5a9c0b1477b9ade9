//! Built-in in-memory hash index provider.

use crate::error::{CoreError, CoreResult};
use crate::index::{GraphIndex, HashGraphIndex, IndexConfig, IndexHandle, MatchMode};
use crate::provider::IndexProvider;
use crate::transaction::{DataSource, IndexConnection, TransactionalResource};
use crate::types::{EntityKind, IndexIdentity, TransactionId};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Name of the data source backing [`HashIndexProvider`].
pub const HASH_DATA_SOURCE: &str = "hash-index";

/// Index structures plus creations staged per open transaction.
#[derive(Debug, Default)]
struct HashIndexSpace {
    live: RwLock<HashMap<IndexIdentity, Arc<HashGraphIndex>>>,
    staged: Mutex<HashMap<TransactionId, Vec<(IndexIdentity, IndexConfig, MatchMode)>>>,
}

impl HashIndexSpace {
    fn open(&self, identity: IndexIdentity, config: &IndexConfig) -> CoreResult<IndexHandle> {
        if let Some(index) = self.live.read().get(&identity) {
            return Ok(Arc::clone(index) as IndexHandle);
        }
        let mode = parse_mode(config)?;
        let mut live = self.live.write();
        let index = live
            .entry(identity.clone())
            .or_insert_with(|| Arc::new(HashGraphIndex::new(identity, config.clone(), mode)));
        Ok(Arc::clone(index) as IndexHandle)
    }
}

impl TransactionalResource for HashIndexSpace {
    fn prepare(&self, txid: TransactionId) -> CoreResult<()> {
        let staged = self.staged.lock();
        let live = self.live.read();
        for (identity, config, _) in staged.get(&txid).into_iter().flatten() {
            if let Some(existing) = live.get(identity) {
                if existing.config() != config {
                    return Err(CoreError::invalid_operation(format!(
                        "hash index {identity} already exists with {}",
                        existing.config()
                    )));
                }
            }
        }
        Ok(())
    }

    fn commit(&self, txid: TransactionId) -> CoreResult<()> {
        let Some(creations) = self.staged.lock().remove(&txid) else {
            return Ok(());
        };
        let mut live = self.live.write();
        for (identity, config, mode) in creations {
            live.entry(identity.clone())
                .or_insert_with(|| Arc::new(HashGraphIndex::new(identity, config, mode)));
        }
        Ok(())
    }

    fn rollback(&self, txid: TransactionId) -> CoreResult<()> {
        self.staged.lock().remove(&txid);
        Ok(())
    }
}

struct HashConnection {
    space: Arc<HashIndexSpace>,
}

impl IndexConnection for HashConnection {
    fn resource(&self) -> Arc<dyn TransactionalResource> {
        Arc::clone(&self.space) as Arc<dyn TransactionalResource>
    }

    fn create_index(
        &mut self,
        txid: TransactionId,
        identity: &IndexIdentity,
        config: &IndexConfig,
    ) -> CoreResult<()> {
        let mode = parse_mode(config)?;
        self.space
            .staged
            .lock()
            .entry(txid)
            .or_default()
            .push((identity.clone(), config.clone(), mode));
        Ok(())
    }
}

/// In-memory provider of exact-match (or case-insensitive) hash indexes.
///
/// The provider is also its own [`DataSource`]: register the same `Arc`
/// with both the provider registry and the data source registry. Created
/// indexes become visible when the creating transaction commits.
///
/// Configuration:
/// - `type`: `exact` (default) or `fulltext` (values are lowercased)
#[derive(Debug, Default)]
pub struct HashIndexProvider {
    space: Arc<HashIndexSpace>,
}

impl HashIndexProvider {
    /// Creates a provider with no indexes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a committed index exists for `identity`.
    #[must_use]
    pub fn is_created(&self, identity: &IndexIdentity) -> bool {
        self.space.live.read().contains_key(identity)
    }

    /// Number of committed indexes.
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.space.live.read().len()
    }
}

impl IndexProvider for HashIndexProvider {
    fn fill_in_defaults(&self, mut config: IndexConfig) -> IndexConfig {
        if !config.contains_key(MatchMode::CONFIG_KEY) {
            config.insert(MatchMode::CONFIG_KEY, "exact");
        }
        config
    }

    fn data_source_name(&self) -> &str {
        HASH_DATA_SOURCE
    }

    fn node_index(&self, name: &str, config: &IndexConfig) -> CoreResult<IndexHandle> {
        self.space
            .open(IndexIdentity::new(EntityKind::Node, name), config)
    }

    fn relationship_index(&self, name: &str, config: &IndexConfig) -> CoreResult<IndexHandle> {
        self.space
            .open(IndexIdentity::new(EntityKind::Relationship, name), config)
    }
}

impl DataSource for HashIndexProvider {
    fn name(&self) -> &str {
        HASH_DATA_SOURCE
    }

    fn connect(&self) -> CoreResult<Box<dyn IndexConnection>> {
        Ok(Box::new(HashConnection {
            space: Arc::clone(&self.space),
        }))
    }
}

fn parse_mode(config: &IndexConfig) -> CoreResult<MatchMode> {
    MatchMode::from_config(config).ok_or_else(|| {
        CoreError::invalid_config(format!(
            "unsupported hash index type in {config}, expected 'exact' or 'fulltext'"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_config() -> IndexConfig {
        HashIndexProvider::new().fill_in_defaults(IndexConfig::for_provider("hash"))
    }

    #[test]
    fn fills_in_exact_type() {
        let config = hash_config();
        assert_eq!(config.get("type"), Some("exact"));

        let custom = HashIndexProvider::new()
            .fill_in_defaults(IndexConfig::for_provider("hash").with("type", "fulltext"));
        assert_eq!(custom.get("type"), Some("fulltext"));
    }

    #[test]
    fn creation_is_visible_only_after_commit() {
        let provider = HashIndexProvider::new();
        let identity = IndexIdentity::node("people");
        let txid = TransactionId::new(1);

        let mut connection = provider.connect().unwrap();
        provider
            .create_index(connection.as_mut(), txid, &identity, &hash_config())
            .unwrap();
        assert!(!provider.is_created(&identity));

        let resource = connection.resource();
        resource.prepare(txid).unwrap();
        resource.commit(txid).unwrap();
        assert!(provider.is_created(&identity));
    }

    #[test]
    fn rollback_discards_staged_creation() {
        let provider = HashIndexProvider::new();
        let identity = IndexIdentity::relationship("knows");
        let txid = TransactionId::new(3);

        let mut connection = provider.connect().unwrap();
        connection
            .create_index(txid, &identity, &hash_config())
            .unwrap();
        connection.resource().rollback(txid).unwrap();
        connection.resource().commit(txid).unwrap();

        assert!(!provider.is_created(&identity));
        assert_eq!(provider.index_count(), 0);
    }

    #[test]
    fn unsupported_type_is_rejected_at_creation() {
        let provider = HashIndexProvider::new();
        let mut connection = provider.connect().unwrap();
        let result = connection.create_index(
            TransactionId::new(1),
            &IndexIdentity::node("people"),
            &IndexConfig::for_provider("hash").with("type", "fuzzy"),
        );
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
    }

    #[test]
    fn accessors_share_committed_state() {
        let provider = HashIndexProvider::new();
        let config = hash_config();

        let first = provider.node_index("people", &config).unwrap();
        let second = provider.node_index("people", &config).unwrap();
        let hash = first.as_any().downcast_ref::<HashGraphIndex>().unwrap();
        hash.add(7, "name", "alice");

        let again = second.as_any().downcast_ref::<HashGraphIndex>().unwrap();
        assert_eq!(again.get("name", "alice"), vec![7]);
        assert_eq!(second.entity_kind(), EntityKind::Node);
    }
}
