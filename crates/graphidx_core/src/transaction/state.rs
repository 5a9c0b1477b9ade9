//! Transaction scope state.

use crate::error::{CoreError, CoreResult};
use crate::transaction::manager::TransactionManager;
use crate::transaction::resource::TransactionalResource;
use crate::types::TransactionId;
use std::sync::Arc;

/// State of a transaction scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Scope is open and accepts enlistments.
    Active,
    /// Every enlisted resource committed.
    Committed,
    /// Every enlisted resource was rolled back.
    RolledBack,
}

/// A unit of work that enlisted resources commit or roll back together.
///
/// Mirrors the begin / success / finish protocol: call
/// [`mark_success`](Self::mark_success) once the work succeeded, then always
/// [`finish`](Self::finish). A scope finished without the success marker,
/// or dropped without being finished, rolls back.
pub struct TransactionScope<'a> {
    manager: &'a TransactionManager,
    id: TransactionId,
    state: TransactionState,
    success: bool,
    resources: Vec<Arc<dyn TransactionalResource>>,
}

impl<'a> TransactionScope<'a> {
    pub(crate) fn new(manager: &'a TransactionManager, id: TransactionId) -> Self {
        Self {
            manager,
            id,
            state: TransactionState::Active,
            success: false,
            resources: Vec::new(),
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the scope is still open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Number of enlisted resources.
    #[must_use]
    pub fn enlisted(&self) -> usize {
        self.resources.len()
    }

    /// Enlists `resource` so it commits or rolls back with this scope.
    pub fn enlist(&mut self, resource: Arc<dyn TransactionalResource>) -> CoreResult<()> {
        self.ensure_active()?;
        self.resources.push(resource);
        Ok(())
    }

    /// Marks the work as successful; `finish` will then commit.
    pub fn mark_success(&mut self) {
        self.success = true;
    }

    /// Commits when marked successful, otherwise rolls back.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionAborted`](CoreError::TransactionAborted) if a
    /// resource refuses to prepare, in which case every resource was rolled
    /// back.
    pub fn finish(mut self) -> CoreResult<()> {
        self.ensure_active()?;
        let resources = std::mem::take(&mut self.resources);
        let (state, result) = self.manager.complete(self.id, self.success, &resources);
        self.state = state;
        result
    }

    fn ensure_active(&self) -> CoreResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(CoreError::invalid_operation(format!(
                "transaction {} is no longer active",
                self.id
            )))
        }
    }
}

impl Drop for TransactionScope<'_> {
    fn drop(&mut self) {
        if self.is_active() {
            tracing::warn!(txid = %self.id, "transaction scope dropped without finish, rolling back");
            let resources = std::mem::take(&mut self.resources);
            let (state, _) = self.manager.complete(self.id, false, &resources);
            self.state = state;
        }
    }
}

impl std::fmt::Debug for TransactionScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionScope")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("success", &self.success)
            .field("enlisted", &self.resources.len())
            .finish()
    }
}
