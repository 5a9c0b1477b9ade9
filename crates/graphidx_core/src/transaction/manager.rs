//! Transaction manager.

use crate::error::{CoreError, CoreResult};
use crate::transaction::resource::TransactionalResource;
use crate::transaction::state::{TransactionScope, TransactionState};
use crate::types::TransactionId;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Hands out transaction scopes and drives two-phase commit over the
/// resources enlisted in them.
pub struct TransactionManager {
    /// Next transaction ID.
    next_txid: AtomicU64,
    /// Scopes begun but not yet finished.
    active_txns: RwLock<Vec<TransactionId>>,
    committed: AtomicU64,
    rolled_back: AtomicU64,
}

impl TransactionManager {
    /// Creates a new transaction manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_txid: AtomicU64::new(1),
            active_txns: RwLock::new(Vec::new()),
            committed: AtomicU64::new(0),
            rolled_back: AtomicU64::new(0),
        }
    }

    /// Begins a new transaction scope.
    pub fn begin(&self) -> TransactionScope<'_> {
        let txid = TransactionId::new(self.next_txid.fetch_add(1, Ordering::SeqCst));
        self.active_txns.write().push(txid);
        debug!(txid = %txid, "transaction begun");
        TransactionScope::new(self, txid)
    }

    /// Finishes `txid`: two-phase commit when `success`, rollback otherwise.
    pub(crate) fn complete(
        &self,
        txid: TransactionId,
        success: bool,
        resources: &[Arc<dyn TransactionalResource>],
    ) -> (TransactionState, CoreResult<()>) {
        let outcome = if success {
            Self::commit_all(txid, resources)
        } else {
            let result = Self::rollback_all(txid, resources);
            (TransactionState::RolledBack, result)
        };

        self.active_txns.write().retain(|&id| id != txid);
        match outcome.0 {
            TransactionState::Committed => {
                self.committed.fetch_add(1, Ordering::SeqCst);
                debug!(txid = %txid, resources = resources.len(), "transaction committed");
            }
            _ => {
                self.rolled_back.fetch_add(1, Ordering::SeqCst);
                debug!(txid = %txid, resources = resources.len(), "transaction rolled back");
            }
        }
        outcome
    }

    fn commit_all(
        txid: TransactionId,
        resources: &[Arc<dyn TransactionalResource>],
    ) -> (TransactionState, CoreResult<()>) {
        for resource in resources {
            if let Err(e) = resource.prepare(txid) {
                warn!(txid = %txid, error = %e, "prepare failed, rolling back");
                // the abort reason wins over any secondary rollback failure
                let _ = Self::rollback_all(txid, resources);
                return (
                    TransactionState::RolledBack,
                    Err(CoreError::transaction_aborted(format!("prepare failed: {e}"))),
                );
            }
        }

        let mut first_error = None;
        for resource in resources {
            if let Err(e) = resource.commit(txid) {
                warn!(txid = %txid, error = %e, "commit failed after successful prepare");
                first_error.get_or_insert(e);
            }
        }
        (TransactionState::Committed, first_error.map_or(Ok(()), Err))
    }

    fn rollback_all(
        txid: TransactionId,
        resources: &[Arc<dyn TransactionalResource>],
    ) -> CoreResult<()> {
        let mut first_error = None;
        for resource in resources {
            if let Err(e) = resource.rollback(txid) {
                warn!(txid = %txid, error = %e, "rollback failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Returns the number of active transaction scopes.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_txns.read().len()
    }

    /// Returns how many scopes committed.
    #[must_use]
    pub fn committed_count(&self) -> u64 {
        self.committed.load(Ordering::SeqCst)
    }

    /// Returns how many scopes rolled back.
    #[must_use]
    pub fn rolled_back_count(&self) -> u64 {
        self.rolled_back.load(Ordering::SeqCst)
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("active_count", &self.active_count())
            .field("committed", &self.committed_count())
            .field("rolled_back", &self.rolled_back_count())
            .finish_non_exhaustive()
    }
}
