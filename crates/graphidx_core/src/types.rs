//! Core type definitions for graphidx.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a transaction scope.
///
/// Transaction IDs are monotonically increasing and never reused within a
/// [`TransactionManager`](crate::TransactionManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a new transaction ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// The kind of graph entity an index covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum EntityKind {
    /// Indexes over nodes.
    Node = 0,
    /// Indexes over relationships.
    Relationship = 1,
}

impl EntityKind {
    /// Both kinds, in a stable order.
    pub const ALL: [Self; 2] = [Self::Node, Self::Relationship];

    /// Lower-case name used in logs and CLI output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Relationship => "relationship",
        }
    }
}

impl TryFrom<u8> for EntityKind {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Node),
            1 => Ok(Self::Relationship),
            _ => Err(CoreError::invalid_format(format!(
                "unknown entity kind: {value}"
            ))),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a named index: unique per entity kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndexIdentity {
    /// Entity kind the index covers.
    pub kind: EntityKind,
    /// Caller-chosen index name.
    pub name: String,
}

impl IndexIdentity {
    /// Creates an identity.
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Identity of a node index.
    pub fn node(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Node, name)
    }

    /// Identity of a relationship index.
    pub fn relationship(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Relationship, name)
    }

    /// Rejects names the store cannot key on.
    pub(crate) fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::invalid_config("index name must not be empty"));
        }
        Ok(())
    }
}

impl fmt::Display for IndexIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_id_display() {
        assert_eq!(TransactionId::new(7).to_string(), "txn:7");
        assert!(TransactionId::new(1) < TransactionId::new(2));
    }

    #[test]
    fn entity_kind_byte_conversion() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::try_from(kind as u8).unwrap(), kind);
        }
        assert!(EntityKind::try_from(9).is_err());
    }

    #[test]
    fn identity_is_scoped_by_kind() {
        let node = IndexIdentity::node("people");
        let rel = IndexIdentity::relationship("people");
        assert_ne!(node, rel);
        assert_eq!(node.to_string(), "node:people");
        assert_eq!(rel.to_string(), "relationship:people");
    }

    #[test]
    fn empty_name_is_invalid() {
        assert!(IndexIdentity::node("").validate().is_err());
        assert!(IndexIdentity::node("x").validate().is_ok());
    }
}
