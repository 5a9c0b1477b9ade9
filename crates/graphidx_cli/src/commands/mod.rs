//! CLI command implementations.

pub mod dump;
pub mod list;
pub mod verify;

use graphidx_core::store::{scan_log, LogScan};
use graphidx_storage::FileBackend;
use std::path::Path;

/// Reads the whole log at `path` without modifying it.
pub fn read_log(path: &Path) -> Result<LogScan, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No index log found at {}", path.display()).into());
    }
    let backend = FileBackend::open(path)?;
    Ok(scan_log(&backend)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphidx_core::{Config, EntityKind, IndexManager};
    use tempfile::tempdir;

    #[test]
    fn reads_log_written_by_manager() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("indexes.log");
        {
            let manager = IndexManager::open(&path, Config::default()).unwrap();
            manager.for_nodes("people", None).unwrap();
            manager.for_relationships("knows", None).unwrap();
        }

        let scan = read_log(&path).unwrap();
        assert_eq!(scan.records.len(), 4);
        assert!(scan.torn_tail.is_none());

        let live = list::live_indexes(scan.records.into_iter().map(|(_, r)| r));
        let kinds: Vec<EntityKind> = live.keys().map(|identity| identity.kind).collect();
        assert_eq!(kinds, vec![EntityKind::Node, EntityKind::Relationship]);
    }

    #[test]
    fn missing_log_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(read_log(&dir.path().join("absent.log")).is_err());
    }
}
