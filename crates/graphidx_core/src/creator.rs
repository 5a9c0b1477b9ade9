//! Transactional index creation on a dedicated worker thread.
//!
//! Connections to a data source are owned by one thread for their whole
//! life. The creator keeps a single long-lived worker that, per job:
//!
//! 1. looks up the provider named in the configuration and its data source
//! 2. opens a connection
//! 3. begins a transaction scope and enlists the connection's resource
//! 4. asks the provider to create the index
//! 5. marks the scope successful if that worked, then always finishes it
//! 6. always closes the connection
//!
//! The caller blocks on a reply channel until the worker is done. The wait
//! cannot be abandoned, so a creation is never left half-observed.

use crate::error::{CoreError, CoreResult};
use crate::index::IndexConfig;
use crate::provider::{IndexProvider, ProviderRegistry};
use crate::transaction::{DataSourceRegistry, IndexConnection, TransactionManager};
use crate::types::IndexIdentity;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

const WORKER_THREAD_NAME: &str = "graphidx-index-creator";

struct CreationJob {
    identity: IndexIdentity,
    config: IndexConfig,
    reply: Sender<CoreResult<()>>,
}

/// Runs index creations on a dedicated worker thread.
pub struct IndexCreator {
    jobs: Mutex<Option<Sender<CreationJob>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl IndexCreator {
    /// Starts the worker thread.
    ///
    /// # Errors
    ///
    /// Fails if the thread cannot be spawned.
    pub fn start(
        providers: Arc<ProviderRegistry>,
        sources: Arc<DataSourceRegistry>,
        transactions: Arc<TransactionManager>,
    ) -> CoreResult<Self> {
        let (jobs, queue) = mpsc::channel();
        let worker = CreationWorker {
            providers,
            sources,
            transactions,
        };
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker.run(queue))?;

        Ok(Self {
            jobs: Mutex::new(Some(jobs)),
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Creates the index for `identity` with `config` and waits for the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`CreationFailed`](CoreError::CreationFailed) wrapping whatever
    /// went wrong: an unknown provider or data source, a provider error or
    /// panic, an aborted transaction, or [`WorkerStopped`](CoreError::WorkerStopped).
    pub fn create(&self, identity: &IndexIdentity, config: &IndexConfig) -> CoreResult<()> {
        self.submit(identity, config)
            .map_err(|cause| CoreError::CreationFailed {
                identity: identity.clone(),
                config: config.clone(),
                cause: Arc::new(cause),
            })
    }

    fn submit(&self, identity: &IndexIdentity, config: &IndexConfig) -> CoreResult<()> {
        let (reply, outcome) = mpsc::channel();
        let job = CreationJob {
            identity: identity.clone(),
            config: config.clone(),
            reply,
        };
        {
            let jobs = self.jobs.lock();
            let sender = jobs.as_ref().ok_or(CoreError::WorkerStopped)?;
            sender.send(job).map_err(|_| CoreError::WorkerStopped)?;
        }
        // the worker dropping the reply sender without answering means it died
        outcome.recv().map_err(|_| CoreError::WorkerStopped)?
    }

    /// Returns true while the worker thread is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops accepting jobs and waits for the worker to drain its queue.
    pub fn shutdown(&self) {
        self.jobs.lock().take();
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                warn!("index creator worker exited by panic");
            }
        }
    }
}

impl Drop for IndexCreator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for IndexCreator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexCreator")
            .field("running", &self.is_running())
            .finish()
    }
}

struct CreationWorker {
    providers: Arc<ProviderRegistry>,
    sources: Arc<DataSourceRegistry>,
    transactions: Arc<TransactionManager>,
}

impl CreationWorker {
    fn run(self, queue: Receiver<CreationJob>) {
        debug!("index creator worker started");
        while let Ok(job) = queue.recv() {
            let result = self.create(&job.identity, &job.config);
            match &result {
                Ok(()) => debug!(index = %job.identity, "index created"),
                Err(e) => warn!(index = %job.identity, error = %e, "index creation failed"),
            }
            // the caller is blocked on the reply and never hangs up first
            let _ = job.reply.send(result);
        }
        debug!("index creator worker stopped");
    }

    fn create(&self, identity: &IndexIdentity, config: &IndexConfig) -> CoreResult<()> {
        let provider = self.providers.lookup(config.require_provider()?)?;
        let source = self.sources.get(provider.data_source_name())?;
        let mut connection = source.connect()?;
        let result =
            self.create_enlisted(provider.as_ref(), connection.as_mut(), identity, config);
        connection.close();
        result
    }

    fn create_enlisted(
        &self,
        provider: &dyn IndexProvider,
        connection: &mut dyn IndexConnection,
        identity: &IndexIdentity,
        config: &IndexConfig,
    ) -> CoreResult<()> {
        let mut scope = self.transactions.begin();
        scope.enlist(connection.resource())?;

        let txid = scope.id();
        let created = panic::catch_unwind(AssertUnwindSafe(|| {
            provider.create_index(connection, txid, identity, config)
        }))
        .unwrap_or_else(|payload| {
            Err(CoreError::provider(format!(
                "index provider panicked: {}",
                panic_message(payload.as_ref())
            )))
        });

        if created.is_ok() {
            scope.mark_success();
        }
        let finished = scope.finish();
        created.and(finished)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
