//! Transaction resource management.
//!
//! A small two-phase-commit coordinator that index creation enlists into:
//!
//! - [`DataSource`] hands out [`IndexConnection`]s
//! - each connection exposes a [`TransactionalResource`] to enlist
//! - a [`TransactionScope`] from [`TransactionManager::begin`] commits or rolls
//!   back every enlisted resource together

mod manager;
mod resource;
mod state;

pub use manager::TransactionManager;
pub use resource::{DataSource, DataSourceRegistry, IndexConnection, TransactionalResource};
pub use state::{TransactionScope, TransactionState};
