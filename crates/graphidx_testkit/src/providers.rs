//! Instrumented index providers for tests.
//!
//! [`RecordingProvider`] behaves like the built-in hash provider but counts
//! creation attempts and connection lifecycles, and can be scripted to slow
//! down, fail or panic during creation.

use graphidx_core::{
    CoreError, CoreResult, DataSource, EntityKind, HashIndexProvider, IndexConfig,
    IndexConnection, IndexHandle, IndexIdentity, IndexManager, IndexProvider,
    TransactionId, TransactionalResource,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// What [`RecordingProvider`] does when asked to create an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateBehavior {
    /// Stage the creation normally.
    Succeed,
    /// Return a provider error with this message.
    Fail(String),
    /// Panic with this message.
    Panic(String),
}

/// Counters shared between a provider and the connections it hands out.
#[derive(Debug, Default)]
pub struct ProviderStats {
    /// Calls to `create_index`.
    pub creations: AtomicUsize,
    /// Connections opened.
    pub connections_opened: AtomicUsize,
    /// Connections closed.
    pub connections_closed: AtomicUsize,
}

impl ProviderStats {
    /// Calls to `create_index` so far.
    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    /// Connections opened but not yet closed.
    pub fn open_connections(&self) -> usize {
        self.connections_opened.load(Ordering::SeqCst)
            - self.connections_closed.load(Ordering::SeqCst)
    }
}

/// A hash-backed provider that records what happens to it.
///
/// It is also its own data source, named `<provider name>-source`.
#[derive(Debug)]
pub struct RecordingProvider {
    name: String,
    source_name: String,
    inner: HashIndexProvider,
    behavior: CreateBehavior,
    delay: Duration,
    stats: Arc<ProviderStats>,
}

impl RecordingProvider {
    /// Creates a provider that succeeds immediately.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            source_name: format!("{name}-source"),
            name,
            inner: HashIndexProvider::new(),
            behavior: CreateBehavior::Succeed,
            delay: Duration::ZERO,
            stats: Arc::new(ProviderStats::default()),
        }
    }

    /// Sets the creation behavior.
    #[must_use]
    pub fn with_behavior(mut self, behavior: CreateBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Makes every creation sleep for `delay` first.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Name the provider registers under.
    pub fn provider_name(&self) -> &str {
        &self.name
    }

    /// Shared counters.
    pub fn stats(&self) -> Arc<ProviderStats> {
        Arc::clone(&self.stats)
    }

    /// Returns true if a committed index exists for `identity`.
    pub fn is_created(&self, identity: &IndexIdentity) -> bool {
        self.inner.is_created(identity)
    }

    /// Registers the provider and its data source with `manager`.
    pub fn install(self, manager: &IndexManager) -> Arc<Self> {
        let provider = Arc::new(self);
        manager.register_provider(
            provider.name.clone(),
            Arc::clone(&provider) as Arc<dyn IndexProvider>,
        );
        manager.register_data_source(Arc::clone(&provider) as Arc<dyn DataSource>);
        provider
    }

    /// A configuration naming this provider.
    pub fn config(&self) -> IndexConfig {
        IndexConfig::for_provider(self.name.clone())
    }
}

impl IndexProvider for RecordingProvider {
    fn fill_in_defaults(&self, config: IndexConfig) -> IndexConfig {
        self.inner.fill_in_defaults(config)
    }

    fn data_source_name(&self) -> &str {
        &self.source_name
    }

    fn create_index(
        &self,
        connection: &mut dyn IndexConnection,
        txid: TransactionId,
        identity: &IndexIdentity,
        config: &IndexConfig,
    ) -> CoreResult<()> {
        self.stats.creations.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        match &self.behavior {
            CreateBehavior::Succeed => connection.create_index(txid, identity, config),
            CreateBehavior::Fail(message) => Err(CoreError::provider(message.clone())),
            CreateBehavior::Panic(message) => panic!("{message}"),
        }
    }

    fn node_index(&self, name: &str, config: &IndexConfig) -> CoreResult<IndexHandle> {
        self.inner.index_for(EntityKind::Node, name, config)
    }

    fn relationship_index(&self, name: &str, config: &IndexConfig) -> CoreResult<IndexHandle> {
        self.inner.index_for(EntityKind::Relationship, name, config)
    }
}

impl DataSource for RecordingProvider {
    fn name(&self) -> &str {
        &self.source_name
    }

    fn connect(&self) -> CoreResult<Box<dyn IndexConnection>> {
        let inner = self.inner.connect()?;
        self.stats.connections_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingConnection {
            inner,
            stats: Arc::clone(&self.stats),
            closed: false,
        }))
    }
}

struct RecordingConnection {
    inner: Box<dyn IndexConnection>,
    stats: Arc<ProviderStats>,
    closed: bool,
}

impl IndexConnection for RecordingConnection {
    fn resource(&self) -> Arc<dyn TransactionalResource> {
        self.inner.resource()
    }

    fn create_index(
        &mut self,
        txid: TransactionId,
        identity: &IndexIdentity,
        config: &IndexConfig,
    ) -> CoreResult<()> {
        self.inner.create_index(txid, identity, config)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.inner.close();
            self.stats.connections_closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}
