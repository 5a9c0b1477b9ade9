//! Index accessors handed out by providers.

use crate::index::IndexConfig;
use crate::types::{EntityKind, IndexIdentity};
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// An accessor for one named index, produced by its provider.
///
/// The core never queries through this trait; it only passes the handle
/// back to the caller. Concrete providers expose their search surface on
/// the concrete type, reachable through [`as_any`](Self::as_any).
pub trait GraphIndex: Debug + Send + Sync {
    /// Identity of the index.
    fn identity(&self) -> &IndexIdentity;

    /// Effective configuration the index was opened with.
    fn config(&self) -> &IndexConfig;

    /// Upcast for downcasting to the provider's concrete accessor.
    fn as_any(&self) -> &dyn Any;

    /// Name of the index.
    fn name(&self) -> &str {
        &self.identity().name
    }

    /// Entity kind of the index.
    fn entity_kind(&self) -> EntityKind {
        self.identity().kind
    }
}

/// Shared handle to an index accessor.
pub type IndexHandle = Arc<dyn GraphIndex>;
