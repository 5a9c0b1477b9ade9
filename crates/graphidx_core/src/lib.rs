//! # graphidx Core
//!
//! Index lifecycle for an embedded graph database.
//!
//! This crate provides:
//! - A registry of pluggable index providers
//! - Configuration resolution with conflict detection
//! - Persisted index configuration (in memory or as a checksummed log)
//! - At-most-once, transactional index creation on a dedicated worker
//! - The [`IndexManager`] facade tying them together

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod creator;
mod error;
mod manager;
mod resolver;
mod types;

pub mod index;
pub mod provider;
pub mod store;
pub mod transaction;

pub use config::{Config, DEFAULT_INDEX_PROVIDER, INDEX_PROVIDER_PARAM};
pub use creator::IndexCreator;
pub use error::{CoreError, CoreResult};
pub use index::{GraphIndex, HashGraphIndex, IndexConfig, IndexHandle, MatchMode};
pub use manager::IndexManager;
pub use provider::{HashIndexProvider, IndexProvider, ProviderRegistry, HASH_DATA_SOURCE};
pub use resolver::{ConfigResolver, Resolution};
pub use store::{DurableIndexStore, InMemoryIndexStore, IndexStore};
pub use transaction::{
    DataSource, DataSourceRegistry, IndexConnection, TransactionManager, TransactionScope,
    TransactionState, TransactionalResource,
};
pub use types::{EntityKind, IndexIdentity, TransactionId};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
