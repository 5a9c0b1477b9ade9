//! Dump command implementation.

use graphidx_core::store::StoreRecord;
use graphidx_core::{EntityKind, IndexConfig};
use serde::Serialize;
use std::path::Path;

/// One record as printed by `dump`.
#[derive(Debug, Serialize)]
pub struct DumpedRecord {
    /// Byte offset of the record in the log.
    pub offset: u64,
    /// `put`, `commit` or `remove`.
    pub op: &'static str,
    /// Entity kind.
    pub kind: EntityKind,
    /// Index name.
    pub name: String,
    /// Configuration, for `put` records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<IndexConfig>,
}

impl DumpedRecord {
    fn new(offset: u64, record: StoreRecord) -> Self {
        match record {
            StoreRecord::Put { identity, config } => Self {
                offset,
                op: "put",
                kind: identity.kind,
                name: identity.name,
                config: Some(config),
            },
            StoreRecord::Commit { identity } => Self {
                offset,
                op: "commit",
                kind: identity.kind,
                name: identity.name,
                config: None,
            },
            StoreRecord::Remove { identity } => Self {
                offset,
                op: "remove",
                kind: identity.kind,
                name: identity.name,
                config: None,
            },
        }
    }
}

/// Runs the dump command.
pub fn run(
    path: &Path,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let scan = super::read_log(path)?;
    let records: Vec<DumpedRecord> = scan
        .records
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|(offset, record)| DumpedRecord::new(offset, record))
        .collect();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => {
            for record in &records {
                match &record.config {
                    Some(config) => println!(
                        "{:>10}  {:<6}  {}:{}  {}",
                        record.offset,
                        record.op,
                        record.kind.as_str(),
                        record.name,
                        config
                    ),
                    None => println!(
                        "{:>10}  {:<6}  {}:{}",
                        record.offset,
                        record.op,
                        record.kind.as_str(),
                        record.name
                    ),
                }
            }
            if let Some(offset) = scan.torn_tail {
                println!("{offset:>10}  <incomplete record>");
            }
        }
    }

    Ok(())
}
