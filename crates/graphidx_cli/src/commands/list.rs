//! List command implementation.

use graphidx_core::store::StoreRecord;
use graphidx_core::{EntityKind, IndexConfig, IndexIdentity};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One persisted index.
#[derive(Debug, Serialize)]
pub struct IndexEntry {
    /// Entity kind.
    pub kind: EntityKind,
    /// Index name.
    pub name: String,
    /// Recorded configuration.
    pub config: IndexConfig,
}

/// Runs the list command.
pub fn run(
    path: &Path,
    kind: Option<EntityKind>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let scan = super::read_log(path)?;
    if let Some(offset) = scan.torn_tail {
        tracing::warn!(offset, "log ends in an incomplete record, ignoring it");
    }

    let entries: Vec<IndexEntry> = live_indexes(scan.records.into_iter().map(|(_, r)| r))
        .into_iter()
        .filter(|(identity, _)| kind.map_or(true, |k| identity.kind == k))
        .map(|(identity, config)| IndexEntry {
            kind: identity.kind,
            name: identity.name,
            config,
        })
        .collect();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        _ => print_text_output(&entries),
    }

    Ok(())
}

/// Replays `records` into the set of indexes that exist at the end.
///
/// A claim only counts once a commit for the same index follows it.
pub fn live_indexes(
    records: impl IntoIterator<Item = StoreRecord>,
) -> BTreeMap<IndexIdentity, IndexConfig> {
    let mut claims = BTreeMap::new();
    let mut live = BTreeMap::new();
    for record in records {
        match record {
            StoreRecord::Put { identity, config } => {
                claims.insert(identity, config);
            }
            StoreRecord::Commit { identity } => {
                if let Some(config) = claims.remove(&identity) {
                    live.insert(identity, config);
                }
            }
            StoreRecord::Remove { identity } => {
                claims.remove(&identity);
                live.remove(&identity);
            }
        }
    }
    live
}

fn print_text_output(entries: &[IndexEntry]) {
    if entries.is_empty() {
        println!("No indexes");
        return;
    }
    println!("{:<14} {:<24} CONFIG", "KIND", "NAME");
    for entry in entries {
        println!("{:<14} {:<24} {}", entry.kind.as_str(), entry.name, entry.config);
    }
    println!();
    println!("{} index(es)", entries.len());
}
