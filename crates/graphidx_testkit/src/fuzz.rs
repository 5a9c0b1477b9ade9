//! Fuzz testing harnesses.
//!
//! This module provides fuzz targets that can be used with cargo-fuzz
//! or other fuzzing frameworks.

use graphidx_core::store::{scan_log, DurableIndexStore, IndexStore, StoreRecord};
use graphidx_core::{Config, EntityKind, IndexConfig, IndexIdentity, IndexManager};
use graphidx_storage::InMemoryBackend;

/// Fuzz target for log scanning.
///
/// Arbitrary bytes either scan to records or fail with an error; the
/// scanner never panics and never claims more valid bytes than it read.
pub fn fuzz_scan_log(data: &[u8]) {
    let backend = InMemoryBackend::with_data(data.to_vec());
    if let Ok(scan) = scan_log(&backend) {
        assert!(scan.valid_len <= data.len() as u64);
    }
}

/// Fuzz target for store recovery.
///
/// A log made of valid records followed by arbitrary bytes must either
/// open with every valid record intact or be rejected as corrupt.
pub fn fuzz_store_recovery(data: &[u8]) {
    let anchor = IndexIdentity::node("anchor");
    let records = [
        StoreRecord::Put {
            identity: anchor.clone(),
            config: IndexConfig::for_provider("hash"),
        },
        StoreRecord::Commit {
            identity: anchor.clone(),
        },
    ];
    let mut log = Vec::new();
    for record in &records {
        let Ok(encoded) = record.encode() else {
            return;
        };
        log.extend_from_slice(&encoded);
    }
    log.extend_from_slice(data);

    let backend = InMemoryBackend::with_data(log);
    if let Ok(store) = DurableIndexStore::open(Box::new(backend), false) {
        assert!(matches!(store.get(&anchor), Ok(Some(_))));
    }
}

/// Fuzz target for manager operations.
///
/// Interprets `data` as a sequence of requests; no sequence may panic, and
/// an index that `for_kind` returned must then exist.
pub fn fuzz_manager_operations(data: &[u8]) {
    let Ok(manager) = IndexManager::open_in_memory(Config::default()) else {
        return;
    };

    for chunk in data.chunks(2) {
        let op = chunk[0];
        let name = format!("idx_{}", chunk.get(1).copied().unwrap_or(0) % 8);
        let kind = if op & 0x80 == 0 {
            EntityKind::Node
        } else {
            EntityKind::Relationship
        };

        match op % 4 {
            0 => {
                if manager.for_kind(kind, &name, None).is_ok() {
                    assert!(manager.exists_for_kind(kind, &name).unwrap_or(false));
                }
            }
            1 => {
                let mode = if op & 0x40 == 0 { "exact" } else { "fulltext" };
                let config = IndexConfig::for_provider("hash").with("type", mode);
                let _ = manager.for_kind(kind, &name, Some(&config));
            }
            2 => {
                let _ = manager.exists_for_kind(kind, &name);
            }
            _ => {
                let config = IndexConfig::for_provider("missing");
                assert!(manager.for_kind(kind, &name, Some(&config)).is_err());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::{DefaultHasher, Hash, Hasher};

    /// Generate pseudo-random data for fuzzing based on a seed.
    fn generate_random_data(seed: u64, len: usize) -> Vec<u8> {
        let mut result = Vec::with_capacity(len);
        let mut state = seed;

        for _ in 0..len {
            let mut hasher = DefaultHasher::new();
            state.hash(&mut hasher);
            state = hasher.finish();
            result.push((state & 0xFF) as u8);
        }

        result
    }

    #[test]
    fn test_fuzz_scan_log_empty() {
        fuzz_scan_log(&[]);
    }

    #[test]
    fn test_fuzz_scan_log_garbage() {
        fuzz_scan_log(&[0xFF; 32]);
        fuzz_scan_log(b"GIDX\x01\x00\x01\xFF\xFF\xFF\xFF");
    }

    #[test]
    fn test_fuzz_store_recovery_random() {
        for seed in 0..64 {
            fuzz_store_recovery(&generate_random_data(seed, 48));
        }
    }

    #[test]
    fn test_fuzz_manager_operations_random() {
        for seed in 0..16 {
            fuzz_manager_operations(&generate_random_data(seed, 64));
        }
    }
}
