//! Error types for graphidx core.

use crate::index::IndexConfig;
use crate::types::IndexIdentity;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in graphidx core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] graphidx_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No provider is registered under the requested name.
    #[error("no index provider '{name}' found")]
    UnknownProvider {
        /// The provider name that was looked up.
        name: String,
    },

    /// The supplied configuration differs from the one the index was created with.
    #[error(
        "supplied index configuration {supplied} differs from stored configuration {stored} for '{identity}'"
    )]
    ConfigConflict {
        /// The index whose configuration conflicted.
        identity: IndexIdentity,
        /// Configuration passed by the caller.
        supplied: IndexConfig,
        /// Configuration recorded at creation time.
        stored: IndexConfig,
    },

    /// Transactional creation of an index failed.
    ///
    /// The cause is shared so that every caller waiting on the same
    /// creation observes the same failure.
    #[error("index creation failed for {identity}, {config}: {cause}")]
    CreationFailed {
        /// The index that could not be created.
        identity: IndexIdentity,
        /// The effective configuration creation ran with.
        config: IndexConfig,
        /// The underlying failure.
        #[source]
        cause: Arc<CoreError>,
    },

    /// A provider depends on a data source nobody registered.
    #[error("no data source '{name}' registered")]
    UnknownDataSource {
        /// The data source name.
        name: String,
    },

    /// Configuration is structurally invalid.
    #[error("invalid index configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// A provider reported a failure of its own.
    #[error("provider error: {message}")]
    Provider {
        /// Description reported by the provider.
        message: String,
    },

    /// Transaction was aborted.
    #[error("transaction aborted: {reason}")]
    TransactionAborted {
        /// Reason for abort.
        reason: String,
    },

    /// Persisted data is not in the expected format.
    #[error("invalid format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Checksum mismatch detected.
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Expected checksum.
        expected: u32,
        /// Actual checksum.
        actual: u32,
    },

    /// CBOR encoding or decoding failed.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the failure.
        message: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// The index creation worker is no longer running.
    #[error("index creation worker stopped")]
    WorkerStopped,
}

impl CoreError {
    /// Creates an unknown provider error.
    pub fn unknown_provider(name: impl Into<String>) -> Self {
        Self::UnknownProvider { name: name.into() }
    }

    /// Creates an unknown data source error.
    pub fn unknown_data_source(name: impl Into<String>) -> Self {
        Self::UnknownDataSource { name: name.into() }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a provider error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Creates a transaction aborted error.
    pub fn transaction_aborted(reason: impl Into<String>) -> Self {
        Self::TransactionAborted {
            reason: reason.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns the underlying cause if this is a creation failure.
    #[must_use]
    pub fn creation_cause(&self) -> Option<&Arc<CoreError>> {
        match self {
            Self::CreationFailed { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn conflict_message_names_both_sides() {
        let err = CoreError::ConfigConflict {
            identity: IndexIdentity::node("idx"),
            supplied: IndexConfig::for_provider("p").with("x", "2"),
            stored: IndexConfig::for_provider("p").with("x", "1"),
        };
        let message = err.to_string();
        assert!(message.contains("node:idx"));
        assert!(message.contains("x=2"));
        assert!(message.contains("x=1"));
    }

    #[test]
    fn creation_failure_exposes_cause() {
        let cause = Arc::new(CoreError::provider("disk full"));
        let err = CoreError::CreationFailed {
            identity: IndexIdentity::relationship("knows"),
            config: IndexConfig::for_provider("hash"),
            cause: Arc::clone(&cause),
        };
        assert!(Arc::ptr_eq(err.creation_cause().unwrap(), &cause));
        assert_eq!(err.source().unwrap().to_string(), "provider error: disk full");
        assert!(CoreError::WorkerStopped.creation_cause().is_none());
    }
}
