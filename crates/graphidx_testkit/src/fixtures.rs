//! Test fixtures and manager helpers.
//!
//! Provides convenience functions for setting up index managers
//! and common test scenarios.

use graphidx_core::{Config, IndexManager};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Name of the configuration log inside a file-backed fixture.
pub const INDEX_LOG_FILE: &str = "indexes.log";

/// A test index manager with automatic cleanup.
pub struct TestManager {
    /// The manager instance.
    pub manager: IndexManager,
    config: Config,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestManager {
    /// Creates a manager that persists nothing.
    pub fn memory() -> Self {
        Self::memory_with_config(Config::default())
    }

    /// Creates an in-memory manager with `config`.
    pub fn memory_with_config(config: Config) -> Self {
        Self {
            manager: IndexManager::open_in_memory(config.clone())
                .expect("Failed to open in-memory index manager"),
            config,
            temp_dir: None,
        }
    }

    /// Creates a manager backed by a log in a fresh temporary directory.
    pub fn file() -> Self {
        Self::file_with_config(Config::default())
    }

    /// Creates a file-backed manager with `config`.
    pub fn file_with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let manager = IndexManager::open(&temp_dir.path().join(INDEX_LOG_FILE), config.clone())
            .expect("Failed to open file index manager");
        Self {
            manager,
            config,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the log path if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().join(INDEX_LOG_FILE))
    }

    /// Closes and reopens a file-based manager over the same log.
    ///
    /// Providers registered on the old manager are not carried over.
    pub fn reopen(self) -> Self {
        let Self {
            manager,
            config,
            temp_dir,
        } = self;
        let temp_dir = temp_dir.expect("Only file-based managers can be reopened");
        drop(manager);

        let manager = IndexManager::open(&temp_dir.path().join(INDEX_LOG_FILE), config.clone())
            .expect("Failed to reopen file index manager");
        Self {
            manager,
            config,
            temp_dir: Some(temp_dir),
        }
    }
}

impl std::ops::Deref for TestManager {
    type Target = IndexManager;

    fn deref(&self) -> &Self::Target {
        &self.manager
    }
}

/// Runs a test with a temporary in-memory manager.
///
/// # Example
///
/// ```rust,ignore
/// use graphidx_testkit::with_temp_manager;
///
/// #[test]
/// fn my_test() {
///     with_temp_manager(|manager| {
///         let people = manager.for_nodes("people", None).unwrap();
///         // ... test operations
///     });
/// }
/// ```
pub fn with_temp_manager<F, R>(f: F) -> R
where
    F: FnOnce(&IndexManager) -> R,
{
    let test_manager = TestManager::memory();
    f(&test_manager.manager)
}

/// Runs a test with a temporary file-based manager.
pub fn with_file_manager<F, R>(f: F) -> R
where
    F: FnOnce(&IndexManager, &Path) -> R,
{
    let test_manager = TestManager::file();
    let path = test_manager
        .path()
        .expect("File manager should have a path");
    f(&test_manager.manager, &path)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use graphidx_core::EntityKind;

    /// Creates a manager holding `count` node indexes and `count`
    /// relationship indexes, named `node_<i>` and `rel_<i>`.
    pub fn populated_manager(count: usize) -> TestManager {
        let test_manager = TestManager::memory();
        for i in 0..count {
            test_manager
                .for_kind(EntityKind::Node, &format!("node_{i}"), None)
                .expect("Failed to create node index");
            test_manager
                .for_kind(EntityKind::Relationship, &format!("rel_{i}"), None)
                .expect("Failed to create relationship index");
        }
        test_manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphidx_core::EntityKind;

    #[test]
    fn test_memory_manager() {
        let test_manager = TestManager::memory();
        assert!(test_manager.path().is_none());
        assert_eq!(test_manager.provider_names(), vec!["hash"]);
    }

    #[test]
    fn test_with_temp_manager() {
        with_temp_manager(|manager| {
            manager.for_nodes("people", None).unwrap();
            assert!(manager.exists_for_nodes("people").unwrap());
        });
    }

    #[test]
    fn test_reopen_keeps_indexes() {
        let test_manager = TestManager::file();
        test_manager.for_relationships("knows", None).unwrap();

        let reopened = test_manager.reopen();
        assert!(reopened.exists_for_relationships("knows").unwrap());
        assert!(reopened.path().unwrap().exists());
    }

    #[test]
    fn test_populated_scenario() {
        let test_manager = scenarios::populated_manager(3);
        assert_eq!(test_manager.index_names(EntityKind::Node).unwrap().len(), 3);
        assert_eq!(
            test_manager.index_names(EntityKind::Relationship).unwrap(),
            vec!["rel_0", "rel_1", "rel_2"]
        );
    }
}
