//! Cross-crate integration test helpers.
//!
//! [`IntegrationHarness`] drives an [`IndexManager`] while tracking the
//! configuration every successfully resolved index must keep, so tests can
//! check that no later call silently changes it.

use graphidx_core::{
    Config, CoreError, CoreResult, EntityKind, IndexConfig, IndexHandle, IndexIdentity,
    IndexManager,
};
use std::collections::HashMap;

/// A test harness for integration testing.
pub struct IntegrationHarness {
    /// The manager instance.
    pub manager: IndexManager,
    /// Configuration each created index was resolved to.
    resolved: HashMap<IndexIdentity, IndexConfig>,
}

impl IntegrationHarness {
    /// Creates a harness over an in-memory manager with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a harness over an in-memory manager with `config`.
    pub fn with_config(config: Config) -> Self {
        Self {
            manager: IndexManager::open_in_memory(config).expect("Failed to open index manager"),
            resolved: HashMap::new(),
        }
    }

    /// Requests an index and tracks the configuration it resolved to.
    pub fn request(
        &mut self,
        kind: EntityKind,
        name: &str,
        supplied: Option<&IndexConfig>,
    ) -> CoreResult<IndexHandle> {
        let handle = self.manager.for_kind(kind, name, supplied)?;
        let identity = IndexIdentity::new(kind, name);
        if let Some(previous) = self.resolved.get(&identity) {
            assert_eq!(
                handle.config(),
                previous,
                "Configuration of {identity} changed after creation"
            );
        }
        self.resolved.insert(identity, handle.config().clone());
        Ok(handle)
    }

    /// Checks every tracked index still exists with its tracked configuration.
    pub fn verify_all(&self) -> Result<usize, String> {
        for (identity, expected) in &self.resolved {
            let stored = self
                .manager
                .config_for(identity.kind, &identity.name)
                .map_err(|e| e.to_string())?;
            if stored.as_ref() != Some(expected) {
                return Err(format!(
                    "{identity}: expected {expected}, stored {stored:?}"
                ));
            }
        }
        Ok(self.resolved.len())
    }

    /// Number of tracked indexes.
    pub fn tracked(&self) -> usize {
        self.resolved.len()
    }
}

impl Default for IntegrationHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Asserts `result` is a configuration conflict for `identity`.
pub fn assert_conflict<T>(result: CoreResult<T>, identity: &IndexIdentity) {
    match result {
        Err(CoreError::ConfigConflict { identity: got, .. }) => assert_eq!(&got, identity),
        Err(other) => panic!("expected conflict for {identity}, got {other}"),
        Ok(_) => panic!("expected conflict for {identity}, call succeeded"),
    }
}

/// Asserts `result` failed because `provider` is not registered.
pub fn assert_unknown_provider<T>(result: CoreResult<T>, provider: &str) {
    match result {
        Err(CoreError::UnknownProvider { name }) => assert_eq!(name, provider),
        Err(other) => panic!("expected unknown provider {provider}, got {other}"),
        Ok(_) => panic!("expected unknown provider {provider}, call succeeded"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{CreateBehavior, RecordingProvider};

    #[test]
    fn test_conflicting_config_is_rejected() {
        let mut harness = IntegrationHarness::new();
        let provider = RecordingProvider::new("p").install(&harness.manager);
        let stored = provider.config().with("x", "1");
        harness
            .request(EntityKind::Node, "idx", Some(&stored))
            .unwrap();

        let conflicting = provider.config().with("x", "2");
        assert_conflict(
            harness.request(EntityKind::Node, "idx", Some(&conflicting)),
            &IndexIdentity::node("idx"),
        );

        let handle = harness
            .request(EntityKind::Node, "idx", Some(&stored))
            .unwrap();
        assert_eq!(handle.config(), &stored);
        assert_eq!(provider.stats().creations(), 1);
        assert_eq!(harness.verify_all(), Ok(1));
    }

    #[test]
    fn test_same_name_different_kinds_are_independent() {
        let mut harness = IntegrationHarness::new();
        let fulltext = IndexConfig::for_provider("hash").with("type", "fulltext");
        harness.request(EntityKind::Node, "idx", None).unwrap();
        harness
            .request(EntityKind::Relationship, "idx", Some(&fulltext))
            .unwrap();

        assert_eq!(harness.tracked(), 2);
        assert_eq!(harness.verify_all(), Ok(2));
    }

    #[test]
    fn test_default_precedence() {
        let config = Config::new()
            .default_index_provider("global")
            .index_provider_for("idx", "mem");
        let mut harness = IntegrationHarness::with_config(config);
        RecordingProvider::new("mem").install(&harness.manager);
        RecordingProvider::new("global").install(&harness.manager);

        let scoped = harness.request(EntityKind::Node, "idx", None).unwrap();
        assert_eq!(scoped.config().provider(), Some("mem"));

        let global = harness.request(EntityKind::Node, "other", None).unwrap();
        assert_eq!(global.config().provider(), Some("global"));

        let mut plain = IntegrationHarness::new();
        let fallback = plain.request(EntityKind::Node, "idx", None).unwrap();
        assert_eq!(fallback.config().provider(), Some("hash"));
    }

    #[test]
    fn test_unknown_provider_has_no_side_effects() {
        let mut harness = IntegrationHarness::new();
        let missing = IndexConfig::for_provider("lucene");

        assert_unknown_provider(
            harness.request(EntityKind::Node, "idx", Some(&missing)),
            "lucene",
        );
        assert!(!harness.manager.exists_for_nodes("idx").unwrap());
        assert!(harness.manager.index_names(EntityKind::Node).unwrap().is_empty());
        assert_eq!(harness.manager.transactions().committed_count(), 0);
        assert_eq!(harness.manager.transactions().rolled_back_count(), 0);
    }

    #[test]
    fn test_failed_creation_is_reported_and_retryable() {
        let mut harness = IntegrationHarness::new();
        let provider = RecordingProvider::new("broken")
            .with_behavior(CreateBehavior::Fail("disk full".to_string()))
            .install(&harness.manager);

        let err = harness
            .request(EntityKind::Node, "idx", Some(&provider.config()))
            .unwrap_err();
        match &err {
            CoreError::CreationFailed {
                identity, cause, ..
            } => {
                assert_eq!(identity, &IndexIdentity::node("idx"));
                assert!(matches!(&**cause, CoreError::Provider { message } if message == "disk full"));
            }
            other => panic!("expected creation failure, got {other}"),
        }
        assert!(!harness.manager.exists_for_nodes("idx").unwrap());

        // no automatic retry; a second call tries again
        let _ = harness.request(EntityKind::Node, "idx", Some(&provider.config()));
        assert_eq!(provider.stats().creations(), 2);
        assert_eq!(provider.stats().open_connections(), 0);

        let handle = harness.request(EntityKind::Node, "idx", None).unwrap();
        assert_eq!(handle.config().provider(), Some("hash"));
    }

    #[test]
    fn test_provider_panic_becomes_creation_failure() {
        let mut harness = IntegrationHarness::new();
        let provider = RecordingProvider::new("buggy")
            .with_behavior(CreateBehavior::Panic("index file vanished".to_string()))
            .install(&harness.manager);

        let err = harness
            .request(EntityKind::Relationship, "idx", Some(&provider.config()))
            .unwrap_err();
        let cause = err.creation_cause().expect("creation failure");
        assert!(cause.to_string().contains("index file vanished"));
        assert!(!harness.manager.exists_for_relationships("idx").unwrap());

        // the worker survived the panic
        harness.request(EntityKind::Relationship, "idx", None).unwrap();
    }
}
