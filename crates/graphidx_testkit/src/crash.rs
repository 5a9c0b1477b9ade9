//! Crash recovery testing for the durable index store.
//!
//! Creating an index appends a claim record and then a commit record.
//! The harness simulates a process dying partway through that pair by
//! cutting the log short, then checks that reopening keeps every committed
//! index and reports the interrupted one as absent.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use graphidx_testkit::crash::{CrashPoint, CrashRecoveryHarness};
//!
//! let harness = CrashRecoveryHarness::new();
//! let result = harness.run(CrashPoint::MidPayload, 5);
//! assert!(result.passed, "{:?}", result.error);
//! ```

use graphidx_core::store::{scan_log, DurableIndexStore, IndexStore};
use graphidx_core::store::StoreRecord;
use graphidx_core::{Config, CoreResult, EntityKind, IndexIdentity, IndexManager};
use graphidx_storage::{FileBackend, StorageBackend};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Where inside the records of the last creation the simulated crash happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashPoint {
    /// Only part of the claim's header reached the log.
    MidHeader,
    /// The claim's header and part of its payload reached the log.
    MidPayload,
    /// The claim reached the log, the commit did not.
    BeforeCommit,
    /// Everything but the commit's trailing checksum reached the log.
    BeforeChecksum,
    /// Both records were fully written.
    AfterRecord,
}

impl CrashPoint {
    /// All crash points.
    pub const ALL: [Self; 5] = [
        Self::MidHeader,
        Self::MidPayload,
        Self::BeforeCommit,
        Self::BeforeChecksum,
        Self::AfterRecord,
    ];

    /// Bytes of a `claim_len`-byte claim followed by a `commit_len`-byte
    /// commit that survive the crash.
    pub fn surviving_bytes(self, claim_len: u64, commit_len: u64) -> u64 {
        match self {
            Self::MidHeader => 5,
            Self::MidPayload => claim_len / 2,
            Self::BeforeCommit => claim_len,
            Self::BeforeChecksum => claim_len + commit_len - 4,
            Self::AfterRecord => claim_len + commit_len,
        }
    }
}

/// Result of a crash recovery test.
#[derive(Debug, Clone)]
pub struct CrashRecoveryResult {
    /// Whether the test passed.
    pub passed: bool,
    /// Description of what was tested.
    pub description: String,
    /// Expected indexes after recovery.
    pub expected_indexes: usize,
    /// Actual indexes after recovery.
    pub actual_indexes: usize,
    /// Any error message.
    pub error: Option<String>,
}

impl CrashRecoveryResult {
    /// Creates a passing result.
    pub fn pass(description: &str, indexes: usize) -> Self {
        Self {
            passed: true,
            description: description.to_string(),
            expected_indexes: indexes,
            actual_indexes: indexes,
            error: None,
        }
    }

    /// Creates a failing result.
    pub fn fail(description: &str, expected: usize, actual: usize, error: &str) -> Self {
        Self {
            passed: false,
            description: description.to_string(),
            expected_indexes: expected,
            actual_indexes: actual,
            error: Some(error.to_string()),
        }
    }
}

/// Drives crash scenarios against a log in a private temporary directory.
pub struct CrashRecoveryHarness {
    temp_dir: TempDir,
}

impl CrashRecoveryHarness {
    /// Creates a harness with a fresh temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Path of the log for `scenario`.
    pub fn log_path(&self, scenario: &str) -> PathBuf {
        self.temp_dir.path().join(format!("{scenario}.log"))
    }

    /// Creates `committed` node indexes through a manager, then creates one
    /// more and cuts its records at `point`. Reopens and compares.
    pub fn run(&self, point: CrashPoint, committed: usize) -> CrashRecoveryResult {
        let description = format!("crash {point:?} after {committed} indexes");
        let path = self.log_path(&format!("{point:?}_{committed}"));
        match self.try_run(&path, point, committed) {
            Ok(actual) => {
                let expected = match point {
                    CrashPoint::AfterRecord => committed + 1,
                    _ => committed,
                };
                if actual == expected {
                    CrashRecoveryResult::pass(&description, actual)
                } else {
                    CrashRecoveryResult::fail(&description, expected, actual, "index count mismatch")
                }
            }
            Err(e) => CrashRecoveryResult::fail(&description, committed, 0, &e.to_string()),
        }
    }

    fn try_run(&self, path: &Path, point: CrashPoint, committed: usize) -> CoreResult<usize> {
        {
            let manager = IndexManager::open(path, Config::default())?;
            for i in 0..committed {
                manager.for_nodes(&format!("idx_{i}"), None)?;
            }
        }

        let before = file_len(path)?;
        {
            let manager = IndexManager::open(path, Config::default())?;
            manager.for_nodes("victim", None)?;
        }
        let after = file_len(path)?;
        let commit_len = StoreRecord::Commit {
            identity: IndexIdentity::node("victim"),
        }
        .encode()?
        .len() as u64;
        let claim_len = after - before - commit_len;
        cut_log(path, before + point.surviving_bytes(claim_len, commit_len))?;

        let manager = IndexManager::open(path, Config::default())?;
        Ok(manager.index_names(EntityKind::Node)?.len())
    }
}

impl Default for CrashRecoveryHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Length of the log at `path`.
pub fn file_len(path: &Path) -> CoreResult<u64> {
    Ok(FileBackend::open(path)?.size()?)
}

/// Truncates the log at `path` to `len` bytes.
pub fn cut_log(path: &Path, len: u64) -> CoreResult<()> {
    let mut backend = FileBackend::open(path)?;
    backend.truncate(len)?;
    backend.sync()?;
    Ok(())
}

/// Flips every bit of the byte at `offset` in the log at `path`.
pub fn corrupt_byte(path: &Path, offset: u64) -> CoreResult<()> {
    let mut data = std::fs::read(path)?;
    if let Some(byte) = data.get_mut(offset as usize) {
        *byte ^= 0xFF;
    }
    std::fs::write(path, data)?;
    Ok(())
}

/// Number of complete records in the log at `path`.
pub fn record_count(path: &Path) -> CoreResult<usize> {
    let backend = FileBackend::open(path)?;
    Ok(scan_log(&backend)?.records.len())
}

/// Opens the store at `path` directly, bypassing the manager.
pub fn open_store(path: &Path) -> CoreResult<Box<dyn IndexStore>> {
    let backend = FileBackend::open(path)?;
    Ok(Box::new(DurableIndexStore::open(Box::new(backend), true)?))
}
