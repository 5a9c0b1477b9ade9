//! Pluggable index providers.
//!
//! A provider is the backend for a storage technology. It fills in its
//! default options, names the data source its index structures live in,
//! creates those structures inside a transaction, and opens accessors.
//!
//! Providers are registered by name in a [`ProviderRegistry`]; the built-in
//! [`HashIndexProvider`] is registered under
//! [`DEFAULT_INDEX_PROVIDER`](crate::DEFAULT_INDEX_PROVIDER).

mod hash;
mod registry;

pub use hash::{HashIndexProvider, HASH_DATA_SOURCE};
pub use registry::ProviderRegistry;

use crate::error::CoreResult;
use crate::index::{IndexConfig, IndexHandle};
use crate::transaction::IndexConnection;
use crate::types::{EntityKind, IndexIdentity, TransactionId};

/// A pluggable index backend.
pub trait IndexProvider: Send + Sync {
    /// Completes `config`, which holds at least the provider key, with this
    /// provider's defaults.
    fn fill_in_defaults(&self, config: IndexConfig) -> IndexConfig;

    /// Name of the [`DataSource`](crate::DataSource) holding this provider's indexes.
    fn data_source_name(&self) -> &str;

    /// Creates the storage structures for `identity` as part of transaction `txid`.
    ///
    /// Only the index creator calls this, from its worker, after enlisting
    /// `connection`'s resource. The default stages the work on the connection.
    fn create_index(
        &self,
        connection: &mut dyn IndexConnection,
        txid: TransactionId,
        identity: &IndexIdentity,
        config: &IndexConfig,
    ) -> CoreResult<()> {
        connection.create_index(txid, identity, config)
    }

    /// Opens the node index `name`.
    fn node_index(&self, name: &str, config: &IndexConfig) -> CoreResult<IndexHandle>;

    /// Opens the relationship index `name`.
    fn relationship_index(&self, name: &str, config: &IndexConfig) -> CoreResult<IndexHandle>;

    /// Opens the accessor matching `kind`.
    fn index_for(
        &self,
        kind: EntityKind,
        name: &str,
        config: &IndexConfig,
    ) -> CoreResult<IndexHandle> {
        match kind {
            EntityKind::Node => self.node_index(name, config),
            EntityKind::Relationship => self.relationship_index(name, config),
        }
    }
}
