//! Log-structured index store.

use crate::error::CoreResult;
use crate::index::IndexConfig;
use crate::store::record::{scan_log, StoreRecord};
use crate::store::{committed_names, Entry, IndexStore};
use crate::types::{EntityKind, IndexIdentity};
use graphidx_storage::StorageBackend;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use tracing::{debug, warn};

/// An [`IndexStore`] persisted as an append-only log of [`StoreRecord`]s.
///
/// The whole log is replayed into memory on open; reads never touch the
/// backend. Claims without a following `Commit` record are dropped on
/// replay: their creation failed or was interrupted. Every mutation is appended (and, with `sync_on_write`, synced)
/// before the in-memory view changes, so a failed write leaves the store
/// as it was.
pub struct DurableIndexStore {
    backend: Mutex<Box<dyn StorageBackend>>,
    records: RwLock<HashMap<IndexIdentity, Entry>>,
    sync_on_write: bool,
}

impl DurableIndexStore {
    /// Opens a store over `backend`, replaying its log.
    ///
    /// A torn record at the end of the log is cut off.
    ///
    /// # Errors
    ///
    /// Fails on checksum mismatches or malformed records anywhere before
    /// the tail.
    pub fn open(mut backend: Box<dyn StorageBackend>, sync_on_write: bool) -> CoreResult<Self> {
        let scan = scan_log(backend.as_ref())?;
        if let Some(offset) = scan.torn_tail {
            warn!(offset, "truncating torn index record at end of log");
            backend.truncate(scan.valid_len)?;
        }

        let mut records: HashMap<IndexIdentity, Entry> = HashMap::new();
        let replayed = scan.records.len();
        for (_, record) in scan.records {
            match record {
                StoreRecord::Put { identity, config } => {
                    records.insert(identity, Entry::claimed(&config));
                }
                StoreRecord::Commit { identity } => {
                    if let Some(entry) = records.get_mut(&identity) {
                        entry.committed = true;
                    }
                }
                StoreRecord::Remove { identity } => {
                    records.remove(&identity);
                }
            }
        }
        records.retain(|identity, entry| {
            if !entry.committed {
                warn!(index = %identity, "dropping uncommitted index claim");
            }
            entry.committed
        });
        debug!(replayed, live = records.len(), "index store opened");

        Ok(Self {
            backend: Mutex::new(backend),
            records: RwLock::new(records),
            sync_on_write,
        })
    }

    fn append(&self, record: &StoreRecord) -> CoreResult<()> {
        let data = record.encode()?;
        let mut backend = self.backend.lock();
        backend.append(&data)?;
        if self.sync_on_write {
            backend.sync()?;
        } else {
            backend.flush()?;
        }
        Ok(())
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

    /// Size of the underlying log in bytes.
    pub fn log_size(&self) -> CoreResult<u64> {
        Ok(self.backend.lock().size()?)
    }
}

impl IndexStore for DurableIndexStore {
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
        self.append(&StoreRecord::Put {
            identity: identity.clone(),
            config: config.clone(),
        })?;
        records.insert(identity.clone(), Entry::claimed(config));
        Ok(true)
    }

    fn commit(&self, identity: &IndexIdentity) -> CoreResult<bool> {
        let mut records = self.records.write();
        let Some(entry) = records.get_mut(identity).filter(|entry| !entry.committed) else {
            return Ok(false);
        };
        self.append(&StoreRecord::Commit {
            identity: identity.clone(),
        })?;
        entry.committed = true;
        Ok(true)
    }

    fn remove(&self, identity: &IndexIdentity) -> CoreResult<bool> {
        let mut records = self.records.write();
        if !records.contains_key(identity) {
            return Ok(false);
        }
        self.append(&StoreRecord::Remove {
            identity: identity.clone(),
        })?;
        records.remove(identity);
        Ok(true)
    }

    fn names(&self, kind: EntityKind) -> CoreResult<Vec<String>> {
        Ok(committed_names(self.records.read().iter(), kind))
    }
}

impl std::fmt::Debug for DurableIndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableIndexStore")
            .field("records", &self.len())
            .field("sync_on_write", &self.sync_on_write)
            .finish_non_exhaustive()
    }
}
