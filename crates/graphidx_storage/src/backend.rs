//! Storage backend trait.

use crate::error::StorageResult;

/// An append-only byte store.
///
/// Offsets handed out by [`append`](Self::append) stay valid until the
/// store is truncated below them. Implementations must be `Send + Sync` so a
/// single backend can sit behind the index store shared by every caller
/// thread.
pub trait StorageBackend: Send + Sync {
    /// Reads exactly `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadPastEnd`](crate::StorageError::ReadPastEnd)
    /// when the range is not fully inside the store.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends `data` and returns the offset it was written at.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes buffered writes down to the operating system.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size in bytes, which is also the next append offset.
    fn size(&self) -> StorageResult<u64>;

    /// Makes data and metadata durable. Stronger than [`flush`](Self::flush).
    fn sync(&mut self) -> StorageResult<()>;

    /// Drops everything at or after `new_size`.
    ///
    /// Used to cut a torn record off the tail of a log on open.
    ///
    /// # Errors
    ///
    /// Fails if `new_size` is larger than the current size.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;
}
