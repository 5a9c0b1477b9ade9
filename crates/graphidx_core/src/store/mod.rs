//! Persisted index configuration.
//!
//! The [`IndexStore`] is the single source of truth for "has this index been
//! created, and with which configuration". A record goes through two steps:
//! [`set_if_absent`](IndexStore::set_if_absent) claims the creation, and
//! [`commit`](IndexStore::commit) marks it done once the index exists. Only
//! committed records are visible to [`get`](IndexStore::get) and
//! [`names`](IndexStore::names); a claim whose creation failed or was cut
//! short by a crash never shows up as an existing index.
//!
//! - [`InMemoryIndexStore`]: a locked map, nothing persisted
//! - [`DurableIndexStore`]: a framed, checksummed record log on any
//!   [`StorageBackend`](graphidx_storage::StorageBackend)

mod durable;
mod memory;
mod record;

pub use durable::DurableIndexStore;
pub use memory::InMemoryIndexStore;
pub use record::{compute_crc32, scan_log, LogScan, StoreRecord, RECORD_MAGIC, RECORD_VERSION};

use crate::error::CoreResult;
use crate::index::IndexConfig;
use crate::types::{EntityKind, IndexIdentity};

/// Store of per-index configuration records, keyed by [`IndexIdentity`].
///
/// Callers serialize claims for one identity themselves; the store only
/// guarantees that each call is atomic.
pub trait IndexStore: Send + Sync {
    /// Returns the committed configuration for `identity`.
    fn get(&self, identity: &IndexIdentity) -> CoreResult<Option<IndexConfig>>;

    /// Claims the creation of `identity` with `config` unless a committed
    /// record exists.
    ///
    /// Returns true if this call made the claim. An uncommitted claim left
    /// by an earlier failed creation is replaced.
    fn set_if_absent(&self, identity: &IndexIdentity, config: &IndexConfig) -> CoreResult<bool>;

    /// Commits the claim on `identity`. Returns true if a claim was pending.
    fn commit(&self, identity: &IndexIdentity) -> CoreResult<bool>;

    /// Withdraws the record for `identity`, committed or not. Returns true
    /// if one existed.
    fn remove(&self, identity: &IndexIdentity) -> CoreResult<bool>;

    /// Names of all committed indexes of `kind`, sorted.
    fn names(&self, kind: EntityKind) -> CoreResult<Vec<String>>;
}

/// One stored record: the configuration and whether its creation committed.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    config: IndexConfig,
    committed: bool,
}

impl Entry {
    fn claimed(config: &IndexConfig) -> Self {
        Self {
            config: config.clone(),
            committed: false,
        }
    }
}

fn committed_names<'a>(
    entries: impl Iterator<Item = (&'a IndexIdentity, &'a Entry)>,
    kind: EntityKind,
) -> Vec<String> {
    let mut names: Vec<String> = entries
        .filter(|(identity, entry)| entry.committed && identity.kind == kind)
        .map(|(identity, _)| identity.name.clone())
        .collect();
    names.sort();
    names
}
