//! Index manager facade.

use crate::config::{Config, DEFAULT_INDEX_PROVIDER};
use crate::creator::IndexCreator;
use crate::error::{CoreError, CoreResult};
use crate::index::{IndexConfig, IndexHandle};
use crate::provider::{HashIndexProvider, IndexProvider, ProviderRegistry};
use crate::resolver::ConfigResolver;
use crate::store::{DurableIndexStore, InMemoryIndexStore, IndexStore};
use crate::transaction::{DataSource, DataSourceRegistry, TransactionManager};
use crate::types::{EntityKind, IndexIdentity};
use graphidx_storage::FileBackend;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The index manager.
///
/// `IndexManager` is the entry point for named secondary indexes:
/// - resolving the effective configuration of an index
/// - creating each index at most once, inside a transaction, on a
///   dedicated worker
/// - handing out accessors from the owning provider
///
/// # Example
///
/// ```rust,ignore
/// use graphidx_core::{Config, EntityKind, IndexConfig, IndexManager};
///
/// let manager = IndexManager::open_in_memory(Config::default())?;
/// let people = manager.for_nodes("people", None)?;
/// let knows = manager.for_relationships(
///     "knows",
///     Some(&IndexConfig::for_provider("hash").with("type", "fulltext")),
/// )?;
/// assert!(manager.exists_for_kind(EntityKind::Node, "people")?);
/// ```
///
/// # Concurrency
///
/// All methods take `&self`. Resolution is serialized under one lock so
/// that exactly one caller wins creation for an identity; the winner runs
/// the creation outside the lock. Other callers for the same identity
/// block until it finishes and then share its outcome.
///
/// The resolution lock is manager-wide, not per identity: resolutions of
/// unrelated indexes, including the durable store's synced append, queue
/// behind one another. Creations never hold it.
pub struct IndexManager {
    config: Config,
    store: Arc<dyn IndexStore>,
    providers: Arc<ProviderRegistry>,
    sources: Arc<DataSourceRegistry>,
    transactions: Arc<TransactionManager>,
    creator: IndexCreator,
    /// Creations in flight, keyed by the identity being created.
    pending: Mutex<HashMap<IndexIdentity, Arc<PendingCreation>>>,
}

impl IndexManager {
    /// Creates a manager over `store`.
    ///
    /// The built-in [`HashIndexProvider`] is registered under
    /// [`DEFAULT_INDEX_PROVIDER`], along with its data source.
    ///
    /// # Errors
    ///
    /// Fails if the creation worker cannot be started.
    pub fn new(config: Config, store: Arc<dyn IndexStore>) -> CoreResult<Self> {
        let providers = Arc::new(ProviderRegistry::new());
        let sources = Arc::new(DataSourceRegistry::new());
        let transactions = Arc::new(TransactionManager::new());

        let hash = Arc::new(HashIndexProvider::new());
        providers.register(DEFAULT_INDEX_PROVIDER, Arc::clone(&hash) as Arc<dyn IndexProvider>);
        sources.register(hash);

        let creator = IndexCreator::start(
            Arc::clone(&providers),
            Arc::clone(&sources),
            Arc::clone(&transactions),
        )?;

        Ok(Self {
            config,
            store,
            providers,
            sources,
            transactions,
            creator,
            pending: Mutex::new(HashMap::new()),
        })
    }

    /// Opens a manager whose configuration records live in the log at `path`.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Fails if the log cannot be opened or is corrupt.
    pub fn open(path: &Path, config: Config) -> CoreResult<Self> {
        let backend = FileBackend::open_with_create_dirs(path)?;
        let store = DurableIndexStore::open(Box::new(backend), config.sync_on_write)?;
        info!(path = %path.display(), indexes = store.len(), "index manager opened");
        Self::new(config, Arc::new(store))
    }

    /// Creates a manager that persists nothing.
    pub fn open_in_memory(config: Config) -> CoreResult<Self> {
        Self::new(config, Arc::new(InMemoryIndexStore::new()))
    }

    /// Registers `provider` under `name`, replacing any previous one.
    ///
    /// The data source the provider names must be registered too, see
    /// [`register_data_source`](Self::register_data_source).
    pub fn register_provider(&self, name: impl Into<String>, provider: Arc<dyn IndexProvider>) {
        self.providers.register(name, provider);
    }

    /// Registers a data source under its own name.
    pub fn register_data_source(&self, source: Arc<dyn DataSource>) {
        debug!(source = source.name(), "data source registered");
        self.sources.register(source);
    }

    /// Returns true if the index exists: its creation committed.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn exists_for_kind(&self, kind: EntityKind, name: &str) -> CoreResult<bool> {
        Ok(self.store.get(&IndexIdentity::new(kind, name))?.is_some())
    }

    /// [`exists_for_kind`](Self::exists_for_kind) for a node index.
    pub fn exists_for_nodes(&self, name: &str) -> CoreResult<bool> {
        self.exists_for_kind(EntityKind::Node, name)
    }

    /// [`exists_for_kind`](Self::exists_for_kind) for a relationship index.
    pub fn exists_for_relationships(&self, name: &str) -> CoreResult<bool> {
        self.exists_for_kind(EntityKind::Relationship, name)
    }

    /// Returns the accessor for the index, creating the index first if it
    /// has never been created.
    ///
    /// `supplied`, when given, must name its provider and must equal any
    /// configuration already recorded for the index.
    ///
    /// # Errors
    ///
    /// - [`UnknownProvider`](CoreError::UnknownProvider)
    /// - [`ConfigConflict`](CoreError::ConfigConflict)
    /// - [`InvalidConfig`](CoreError::InvalidConfig)
    /// - [`CreationFailed`](CoreError::CreationFailed), also returned to
    ///   every caller that waited on the failed creation
    /// - store failures, unchanged
    pub fn for_kind(
        &self,
        kind: EntityKind,
        name: &str,
        supplied: Option<&IndexConfig>,
    ) -> CoreResult<IndexHandle> {
        let identity = IndexIdentity::new(kind, name);

        let (config, role) = {
            let mut pending = self.pending.lock();
            if let Some(slot) = pending.get(&identity).cloned() {
                let config = ConfigResolver::join(&identity, supplied, &slot.config)?;
                (config, Role::Waiter(slot))
            } else {
                let resolution = ConfigResolver::new(self.store.as_ref(), &self.providers)
                    .resolve(&identity, supplied, &self.config)?;
                let role = if resolution.needs_creation {
                    let slot = Arc::new(PendingCreation::new(resolution.config.clone()));
                    pending.insert(identity.clone(), Arc::clone(&slot));
                    Role::Creator(slot)
                } else {
                    Role::Reader
                };
                (resolution.config, role)
            }
        };

        match role {
            Role::Creator(slot) => self.create(&identity, &config, &slot)?,
            Role::Waiter(slot) => {
                debug!(index = %identity, "waiting for in-flight index creation");
                slot.wait().map_err(|cause| CoreError::CreationFailed {
                    identity: identity.clone(),
                    config: config.clone(),
                    cause,
                })?;
            }
            Role::Reader => {}
        }

        let provider = self.providers.lookup(config.require_provider()?)?;
        let handle = provider.index_for(kind, name, &config)?;
        debug!(index = %identity, "index accessor opened");
        Ok(handle)
    }

    /// [`for_kind`](Self::for_kind) for a node index.
    pub fn for_nodes(&self, name: &str, supplied: Option<&IndexConfig>) -> CoreResult<IndexHandle> {
        self.for_kind(EntityKind::Node, name, supplied)
    }

    /// [`for_kind`](Self::for_kind) for a relationship index.
    pub fn for_relationships(
        &self,
        name: &str,
        supplied: Option<&IndexConfig>,
    ) -> CoreResult<IndexHandle> {
        self.for_kind(EntityKind::Relationship, name, supplied)
    }

    /// Names of the existing indexes of `kind`, sorted.
    ///
    /// Indexes whose creation is in flight or failed are left out.
    pub fn index_names(&self, kind: EntityKind) -> CoreResult<Vec<String>> {
        self.store.names(kind)
    }

    /// Committed configuration of an existing index.
    pub fn config_for(&self, kind: EntityKind, name: &str) -> CoreResult<Option<IndexConfig>> {
        self.store.get(&IndexIdentity::new(kind, name))
    }

    /// Registered provider names, sorted.
    #[must_use]
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.names()
    }

    /// Registered data source names, sorted.
    #[must_use]
    pub fn data_source_names(&self) -> Vec<String> {
        self.sources.names()
    }

    /// The transaction manager creations run under.
    #[must_use]
    pub fn transactions(&self) -> &TransactionManager {
        &self.transactions
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the creation this caller won, then settles the pending slot.
    ///
    /// The claim is committed before waiters are released. On failure it is
    /// withdrawn; a claim that cannot be withdrawn stays uncommitted, which
    /// readers ignore and the next resolution replaces.
    fn create(
        &self,
        identity: &IndexIdentity,
        config: &IndexConfig,
        slot: &PendingCreation,
    ) -> CoreResult<()> {
        let result = self.creator.create(identity, config);

        let mut pending = self.pending.lock();
        let outcome = match result.and_then(|()| self.store.commit(identity)) {
            Ok(_) => {
                info!(
                    index = %identity,
                    provider = config.provider().unwrap_or_default(),
                    "index created"
                );
                Ok(())
            }
            Err(e) => {
                if let Err(remove_err) = self.store.remove(identity) {
                    warn!(
                        index = %identity,
                        error = %remove_err,
                        "failed to withdraw claim of failed index creation"
                    );
                }
                Err(match e {
                    CoreError::CreationFailed { cause, .. } => cause,
                    other => Arc::new(other),
                })
            }
        };
        pending.remove(identity);
        slot.complete(outcome.clone());
        drop(pending);

        outcome.map_err(|cause| CoreError::CreationFailed {
            identity: identity.clone(),
            config: config.clone(),
            cause,
        })
    }
}

impl std::fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager")
            .field("providers", &self.providers)
            .field("sources", &self.sources)
            .field("pending", &self.pending.lock().len())
            .finish_non_exhaustive()
    }
}

/// What a `for_kind` caller does after resolution.
enum Role {
    /// Claimed the creation; runs it.
    Creator(Arc<PendingCreation>),
    /// Lost to a creation still in flight; waits for it.
    Waiter(Arc<PendingCreation>),
    /// The index already exists.
    Reader,
}

/// Outcome slot for one in-flight creation.
struct PendingCreation {
    config: IndexConfig,
    outcome: Mutex<Option<Result<(), Arc<CoreError>>>>,
    done: Condvar,
}

impl PendingCreation {
    fn new(config: IndexConfig) -> Self {
        Self {
            config,
            outcome: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn wait(&self) -> Result<(), Arc<CoreError>> {
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(result) = outcome.as_ref() {
                return result.clone();
            }
            self.done.wait(&mut outcome);
        }
    }

    fn complete(&self, result: Result<(), Arc<CoreError>>) {
        *self.outcome.lock() = Some(result);
        self.done.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::HashGraphIndex;
    use tempfile::tempdir;

    fn manager() -> IndexManager {
        IndexManager::open_in_memory(Config::default()).unwrap()
    }

    #[test]
    fn builtin_provider_is_registered() {
        let manager = manager();
        assert_eq!(manager.provider_names(), vec!["hash"]);
        assert_eq!(manager.data_source_names(), vec!["hash-index"]);
    }

    #[test]
    fn for_kind_creates_once_then_reads() {
        let manager = manager();
        assert!(!manager.exists_for_nodes("people").unwrap());

        let handle = manager.for_nodes("people", None).unwrap();
        assert_eq!(handle.name(), "people");
        assert_eq!(handle.entity_kind(), EntityKind::Node);
        assert_eq!(handle.config().get("type"), Some("exact"));
        assert!(manager.exists_for_nodes("people").unwrap());
        assert!(!manager.exists_for_relationships("people").unwrap());

        manager.for_nodes("people", None).unwrap();
        assert_eq!(manager.transactions().committed_count(), 1);
    }

    #[test]
    fn handles_share_index_state() {
        let manager = manager();
        let config = IndexConfig::for_provider("hash").with("type", "fulltext");
        let first = manager.for_relationships("knows", Some(&config)).unwrap();
        first
            .as_any()
            .downcast_ref::<HashGraphIndex>()
            .unwrap()
            .add(1, "since", "2001");

        let second = manager.for_relationships("knows", None).unwrap();
        let hash = second.as_any().downcast_ref::<HashGraphIndex>().unwrap();
        assert_eq!(hash.get("since", "2001"), vec![1]);
        assert_eq!(second.config(), &config);
    }

    #[test]
    fn failed_creation_withdraws_record() {
        let manager = manager();
        let bad = IndexConfig::for_provider("hash").with("type", "fuzzy");

        let err = manager.for_nodes("people", Some(&bad)).unwrap_err();
        assert!(matches!(
            err.creation_cause().map(|cause| &**cause),
            Some(CoreError::InvalidConfig { .. })
        ));
        assert!(!manager.exists_for_nodes("people").unwrap());
        assert!(manager.config_for(EntityKind::Node, "people").unwrap().is_none());
        assert_eq!(manager.transactions().rolled_back_count(), 1);

        manager.for_nodes("people", None).unwrap();
        assert!(manager.exists_for_nodes("people").unwrap());
    }

    /// Store that refuses every withdrawal.
    #[derive(Default)]
    struct NoRemoveStore(InMemoryIndexStore);

    impl IndexStore for NoRemoveStore {
        fn get(&self, identity: &IndexIdentity) -> CoreResult<Option<IndexConfig>> {
            self.0.get(identity)
        }

        fn set_if_absent(
            &self,
            identity: &IndexIdentity,
            config: &IndexConfig,
        ) -> CoreResult<bool> {
            self.0.set_if_absent(identity, config)
        }

        fn commit(&self, identity: &IndexIdentity) -> CoreResult<bool> {
            self.0.commit(identity)
        }

        fn remove(&self, _identity: &IndexIdentity) -> CoreResult<bool> {
            Err(CoreError::invalid_operation("removal refused"))
        }

        fn names(&self, kind: EntityKind) -> CoreResult<Vec<String>> {
            self.0.names(kind)
        }
    }

    #[test]
    fn failed_creation_stays_hidden_when_withdrawal_fails() {
        let manager =
            IndexManager::new(Config::default(), Arc::new(NoRemoveStore::default())).unwrap();
        let bad = IndexConfig::for_provider("hash").with("type", "fuzzy");

        assert!(manager.for_nodes("people", Some(&bad)).is_err());
        assert!(!manager.exists_for_nodes("people").unwrap());
        assert!(manager.config_for(EntityKind::Node, "people").unwrap().is_none());
        assert!(manager.index_names(EntityKind::Node).unwrap().is_empty());

        let err = manager.for_nodes("people", Some(&bad)).unwrap_err();
        assert!(err.creation_cause().is_some());
        assert_eq!(manager.transactions().rolled_back_count(), 2);

        let handle = manager.for_nodes("people", None).unwrap();
        assert_eq!(handle.config().get("type"), Some("exact"));
        assert!(manager.exists_for_nodes("people").unwrap());
        assert_eq!(manager.transactions().committed_count(), 1);
    }

    #[test]
    fn interrupted_creation_is_retried_after_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("indexes.log");
        let identity = IndexIdentity::node("people");

        {
            let backend = FileBackend::open_with_create_dirs(&path).unwrap();
            let store = DurableIndexStore::open(Box::new(backend), true).unwrap();
            let claimed = IndexConfig::for_provider("hash").with("type", "fulltext");
            assert!(store.set_if_absent(&identity, &claimed).unwrap());
        }

        let manager = IndexManager::open(&path, Config::default()).unwrap();
        assert!(!manager.exists_for_nodes("people").unwrap());
        assert!(manager.config_for(EntityKind::Node, "people").unwrap().is_none());
        assert!(manager.index_names(EntityKind::Node).unwrap().is_empty());

        let handle = manager.for_nodes("people", None).unwrap();
        assert_eq!(handle.config().get("type"), Some("exact"));
        assert_eq!(manager.transactions().committed_count(), 1);
        assert!(manager.exists_for_nodes("people").unwrap());
    }

    #[test]
    fn index_names_and_configs() {
        let manager = manager();
        manager.for_nodes("b", None).unwrap();
        manager.for_nodes("a", None).unwrap();
        manager.for_relationships("r", None).unwrap();

        assert_eq!(manager.index_names(EntityKind::Node).unwrap(), vec!["a", "b"]);
        assert_eq!(
            manager.index_names(EntityKind::Relationship).unwrap(),
            vec!["r"]
        );
        let config = manager.config_for(EntityKind::Node, "a").unwrap().unwrap();
        assert_eq!(config.provider(), Some("hash"));
    }

    #[test]
    fn durable_manager_remembers_indexes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("meta").join("indexes.log");
        let config = IndexConfig::for_provider("hash").with("type", "fulltext");

        {
            let manager = IndexManager::open(&path, Config::default()).unwrap();
            manager.for_nodes("people", Some(&config)).unwrap();
        }

        let manager = IndexManager::open(&path, Config::default()).unwrap();
        assert!(manager.exists_for_nodes("people").unwrap());
        let handle = manager.for_nodes("people", None).unwrap();
        assert_eq!(handle.config(), &config);
        assert_eq!(manager.transactions().committed_count(), 0);
    }
}
