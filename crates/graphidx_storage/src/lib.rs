//! # graphidx storage
//!
//! Byte-store backends underneath the persisted index-configuration log.
//!
//! A backend knows nothing about index identities or record framing. It
//! only reads, appends, flushes and truncates bytes; `graphidx_core` owns
//! every format decision.
//!
//! ## Backends
//!
//! - [`InMemoryBackend`] - ephemeral stores and tests
//! - [`FileBackend`] - a single append-only file
//!
//! ```rust
//! use graphidx_storage::{InMemoryBackend, StorageBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"node:people").unwrap();
//! assert_eq!(backend.read_at(offset, 4).unwrap(), b"node");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
