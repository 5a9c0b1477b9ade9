//! Stress tests for the index manager.
//!
//! These helpers hammer `for_kind` from many threads at once and report
//! what each caller observed.

use graphidx_core::{CoreResult, EntityKind, IndexConfig, IndexHandle, IndexManager};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {name} ===");
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent threads.
    pub threads: usize,
    /// Number of distinct indexes each thread requests.
    pub indexes: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            indexes: 16,
        }
    }
}

/// Calls `for_kind` for the same index from `threads` threads released
/// together, returning every caller's outcome.
pub fn race_for_kind(
    manager: &Arc<IndexManager>,
    kind: EntityKind,
    name: &str,
    supplied: Option<&IndexConfig>,
    threads: usize,
) -> Vec<CoreResult<IndexHandle>> {
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let manager = Arc::clone(manager);
            let barrier = Arc::clone(&barrier);
            let name = name.to_string();
            let supplied = supplied.cloned();
            thread::spawn(move || {
                barrier.wait();
                manager.for_kind(kind, &name, supplied.as_ref())
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|handle| handle.join().expect("Thread panicked"))
        .collect()
}

/// Every thread requests every one of `config.indexes` node indexes, in a
/// thread-specific order.
pub fn stress_many_indexes(manager: &Arc<IndexManager>, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(config.threads));
    let indexes = config.indexes;

    let start = Instant::now();
    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let manager = Arc::clone(manager);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();
                for i in 0..indexes {
                    let name = format!("stress_{}", (i + t) % indexes);
                    match manager.for_kind(EntityKind::Node, &name, None) {
                        Ok(_) => {
                            successful.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{CreateBehavior, RecordingProvider};
    use graphidx_core::{Config, CoreError, IndexIdentity};

    fn shared_manager() -> Arc<IndexManager> {
        Arc::new(IndexManager::open_in_memory(Config::default()).unwrap())
    }

    #[test]
    fn concurrent_callers_create_once() {
        let manager = shared_manager();
        let provider = RecordingProvider::new("slow")
            .with_delay(Duration::from_millis(50))
            .install(&manager);

        let results = race_for_kind(
            &manager,
            EntityKind::Node,
            "people",
            Some(&provider.config()),
            8,
        );

        assert_eq!(provider.stats().creations(), 1);
        assert_eq!(provider.stats().open_connections(), 0);
        for result in results {
            let handle = result.unwrap();
            assert_eq!(handle.name(), "people");
        }
        assert!(provider.is_created(&IndexIdentity::node("people")));
        assert_eq!(manager.transactions().committed_count(), 1);
    }

    #[test]
    fn concurrent_callers_share_one_failure() {
        let manager = shared_manager();
        let provider = RecordingProvider::new("broken")
            .with_delay(Duration::from_millis(200))
            .with_behavior(CreateBehavior::Fail("no space left".to_string()))
            .install(&manager);

        let results = race_for_kind(
            &manager,
            EntityKind::Relationship,
            "knows",
            Some(&provider.config()),
            6,
        );

        assert_eq!(provider.stats().creations(), 1);
        let mut causes = Vec::new();
        for result in results {
            match result {
                Err(CoreError::CreationFailed { cause, .. }) => causes.push(cause),
                other => panic!(
                    "expected creation failure, got {:?}",
                    other.map(|h| h.name().to_string())
                ),
            }
        }
        // every caller saw the one attempt's cause
        assert_eq!(causes.len(), 6);
        let distinct = causes
            .iter()
            .fold(Vec::<&Arc<CoreError>>::new(), |mut seen, cause| {
                if !seen.iter().any(|s| Arc::ptr_eq(*s, cause)) {
                    seen.push(cause);
                }
                seen
            })
            .len();
        assert_eq!(distinct, 1);
        assert!(causes
            .iter()
            .all(|cause| cause.to_string().contains("no space left")));
        assert!(!manager.exists_for_relationships("knows").unwrap());
        assert_eq!(provider.stats().open_connections(), 0);
    }

    #[test]
    fn many_indexes_across_threads() {
        let manager = shared_manager();
        let config = StressConfig {
            threads: 4,
            indexes: 12,
        };

        let result = stress_many_indexes(&manager, &config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.successful_ops, 48);
        assert_eq!(manager.index_names(EntityKind::Node).unwrap().len(), 12);
        assert_eq!(manager.transactions().committed_count(), 12);
    }
}
