//! Transactional resources, connections and data sources.

use crate::error::{CoreError, CoreResult};
use crate::index::IndexConfig;
use crate::types::{IndexIdentity, TransactionId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A participant in two-phase commit.
///
/// Work staged under a [`TransactionId`] becomes visible only after
/// [`commit`](Self::commit) for that id; [`rollback`](Self::rollback)
/// discards it.
pub trait TransactionalResource: Send + Sync {
    /// Votes on whether staged work for `txid` can commit.
    fn prepare(&self, _txid: TransactionId) -> CoreResult<()> {
        Ok(())
    }

    /// Makes staged work for `txid` visible.
    fn commit(&self, txid: TransactionId) -> CoreResult<()>;

    /// Discards staged work for `txid`.
    fn rollback(&self, txid: TransactionId) -> CoreResult<()>;
}

/// A connection to a data source, owned by one execution context at a time.
pub trait IndexConnection: Send {
    /// The resource to enlist in the transaction this connection works under.
    fn resource(&self) -> Arc<dyn TransactionalResource>;

    /// Stages creation of the storage structures for `identity` under `txid`.
    fn create_index(
        &mut self,
        txid: TransactionId,
        identity: &IndexIdentity,
        config: &IndexConfig,
    ) -> CoreResult<()>;

    /// Releases the connection. Called on every exit path by its owner.
    fn close(&mut self) {}
}

/// A named source of [`IndexConnection`]s.
pub trait DataSource: Send + Sync {
    /// Name providers refer to this source by.
    fn name(&self) -> &str;

    /// Opens a new connection.
    fn connect(&self) -> CoreResult<Box<dyn IndexConnection>>;
}

/// Registry of data sources by name.
#[derive(Default)]
pub struct DataSourceRegistry {
    sources: RwLock<HashMap<String, Arc<dyn DataSource>>>,
}

impl DataSourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `source` under its own name, replacing any previous one.
    pub fn register(&self, source: Arc<dyn DataSource>) {
        let name = source.name().to_string();
        self.sources.write().insert(name, source);
    }

    /// Looks up a data source.
    pub fn get(&self, name: &str) -> CoreResult<Arc<dyn DataSource>> {
        self.sources
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::unknown_data_source(name))
    }

    /// Names of all registered sources, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for DataSourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSourceRegistry")
            .field("sources", &self.names())
            .finish()
    }
}
