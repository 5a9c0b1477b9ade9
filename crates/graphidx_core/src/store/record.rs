//! Framed records of the index-configuration log.

use crate::error::{CoreError, CoreResult};
use crate::index::IndexConfig;
use crate::types::IndexIdentity;
use graphidx_storage::StorageBackend;
use serde::{Deserialize, Serialize};

/// Magic bytes opening every record.
pub const RECORD_MAGIC: [u8; 4] = *b"GIDX";

/// Current record format version.
pub const RECORD_VERSION: u16 = 1;

/// magic (4) + version (2) + type (1) + length (4)
pub const HEADER_SIZE: usize = 11;

/// Trailing CRC32.
pub const CRC_SIZE: usize = 4;

/// One entry of the index-configuration log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRecord {
    /// A creation of an index was claimed with this configuration.
    ///
    /// The claim counts only once a [`Commit`](Self::Commit) follows it.
    Put {
        /// Index the record is about.
        identity: IndexIdentity,
        /// Its configuration.
        config: IndexConfig,
    },
    /// The creation claimed by the last `Put` for the index succeeded.
    Commit {
        /// Index the record is about.
        identity: IndexIdentity,
    },
    /// The record of an index was withdrawn.
    Remove {
        /// Index the record is about.
        identity: IndexIdentity,
    },
}

#[derive(Serialize, Deserialize)]
struct PutBody {
    identity: IndexIdentity,
    config: IndexConfig,
}

#[derive(Serialize, Deserialize)]
struct IdentityBody {
    identity: IndexIdentity,
}

const TYPE_PUT: u8 = 1;
const TYPE_REMOVE: u8 = 2;
const TYPE_COMMIT: u8 = 3;

impl StoreRecord {
    /// Identity the record is about.
    #[must_use]
    pub fn identity(&self) -> &IndexIdentity {
        match self {
            Self::Put { identity, .. } | Self::Commit { identity } | Self::Remove { identity } => {
                identity
            }
        }
    }

    /// Encodes the record with its envelope.
    ///
    /// ```text
    /// | magic (4) | version (2) | type (1) | length (4) | cbor payload (N) | crc32 (4) |
    /// ```
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let mut payload = Vec::new();
        let record_type = match self {
            Self::Put { identity, config } => {
                let body = PutBody {
                    identity: identity.clone(),
                    config: config.clone(),
                };
                ciborium::into_writer(&body, &mut payload)
                    .map_err(|e| CoreError::codec(e.to_string()))?;
                TYPE_PUT
            }
            Self::Commit { identity } | Self::Remove { identity } => {
                let body = IdentityBody {
                    identity: identity.clone(),
                };
                ciborium::into_writer(&body, &mut payload)
                    .map_err(|e| CoreError::codec(e.to_string()))?;
                match self {
                    Self::Commit { .. } => TYPE_COMMIT,
                    _ => TYPE_REMOVE,
                }
            }
        };

        let len = u32::try_from(payload.len())
            .map_err(|_| CoreError::invalid_operation("index record payload too large"))?;

        let mut data = Vec::with_capacity(HEADER_SIZE + payload.len() + CRC_SIZE);
        data.extend_from_slice(&RECORD_MAGIC);
        data.extend_from_slice(&RECORD_VERSION.to_le_bytes());
        data.push(record_type);
        data.extend_from_slice(&len.to_le_bytes());
        data.extend_from_slice(&payload);
        let crc = compute_crc32(&data);
        data.extend_from_slice(&crc.to_le_bytes());
        Ok(data)
    }

    fn decode_payload(record_type: u8, payload: &[u8]) -> CoreResult<Self> {
        match record_type {
            TYPE_PUT => {
                let body: PutBody =
                    ciborium::from_reader(payload).map_err(|e| CoreError::codec(e.to_string()))?;
                Ok(Self::Put {
                    identity: body.identity,
                    config: body.config,
                })
            }
            TYPE_COMMIT | TYPE_REMOVE => {
                let body: IdentityBody =
                    ciborium::from_reader(payload).map_err(|e| CoreError::codec(e.to_string()))?;
                Ok(if record_type == TYPE_COMMIT {
                    Self::Commit {
                        identity: body.identity,
                    }
                } else {
                    Self::Remove {
                        identity: body.identity,
                    }
                })
            }
            other => Err(CoreError::invalid_format(format!(
                "unknown index record type: {other}"
            ))),
        }
    }
}

/// Result of reading a log from the start.
#[derive(Debug, Default)]
pub struct LogScan {
    /// Complete records with their offsets, in log order.
    pub records: Vec<(u64, StoreRecord)>,
    /// Offset of an incomplete trailing record, if the log ends in one.
    pub torn_tail: Option<u64>,
    /// Bytes covered by complete records.
    pub valid_len: u64,
}

/// Reads every record in `backend`.
///
/// A record cut short at the end of the log (a crash mid-append) ends the
/// scan cleanly and is reported in [`LogScan::torn_tail`]. Bad magic, an
/// unknown version or type, and CRC mismatches are fatal.
pub fn scan_log(backend: &dyn StorageBackend) -> CoreResult<LogScan> {
    let size = backend.size()?;
    let mut scan = LogScan::default();
    let mut offset = 0u64;

    while offset < size {
        if size - offset < HEADER_SIZE as u64 {
            scan.torn_tail = Some(offset);
            break;
        }
        let header = backend.read_at(offset, HEADER_SIZE)?;
        if header[0..4] != RECORD_MAGIC {
            return Err(CoreError::invalid_format(format!(
                "bad index record magic at offset {offset}"
            )));
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version > RECORD_VERSION {
            return Err(CoreError::invalid_format(format!(
                "unsupported index record version {version} at offset {offset}"
            )));
        }
        let record_type = header[6];
        let len = u64::from(u32::from_le_bytes([header[7], header[8], header[9], header[10]]));

        let total = HEADER_SIZE as u64 + len + CRC_SIZE as u64;
        if size - offset < total {
            scan.torn_tail = Some(offset);
            break;
        }

        let len = len as usize;
        let rest = backend.read_at(offset + HEADER_SIZE as u64, len + CRC_SIZE)?;
        let (payload, crc_bytes) = rest.split_at(len);
        let expected = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
        let mut covered = header;
        covered.extend_from_slice(payload);
        let actual = compute_crc32(&covered);
        if expected != actual {
            return Err(CoreError::ChecksumMismatch { expected, actual });
        }

        let record = StoreRecord::decode_payload(record_type, payload)?;
        scan.records.push((offset, record));
        offset += total;
        scan.valid_len = offset;
    }

    Ok(scan)
}

/// CRC32 (IEEE polynomial) over `data`.
#[must_use]
pub fn compute_crc32(data: &[u8]) -> u32 {
    const TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut bit = 0;
            while bit < 8 {
                crc = if crc & 1 != 0 {
                    (crc >> 1) ^ 0xEDB8_8320
                } else {
                    crc >> 1
                };
                bit += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    !data.iter().fold(0xFFFF_FFFF_u32, |crc, &byte| {
        (crc >> 8) ^ TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize]
    })
}
