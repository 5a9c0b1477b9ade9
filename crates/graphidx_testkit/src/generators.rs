//! Property-based test generators using proptest.
//!
//! Provides strategies for generating index identities, configurations
//! and store operation sequences.

use graphidx_core::{EntityKind, IndexConfig, IndexIdentity, DEFAULT_INDEX_PROVIDER};
use proptest::prelude::*;

/// Strategy for generating valid index names.
pub fn index_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating entity kinds.
pub fn entity_kind_strategy() -> impl Strategy<Value = EntityKind> {
    prop_oneof![Just(EntityKind::Node), Just(EntityKind::Relationship)]
}

/// Strategy for generating index identities.
pub fn index_identity_strategy() -> impl Strategy<Value = IndexIdentity> {
    (entity_kind_strategy(), index_name_strategy())
        .prop_map(|(kind, name)| IndexIdentity::new(kind, name))
}

/// Strategy for generating identities from a small pool, so sequences
/// revisit the same index.
pub fn pooled_identity_strategy(pool: usize) -> impl Strategy<Value = IndexIdentity> {
    (entity_kind_strategy(), 0..pool.max(1))
        .prop_map(|(kind, i)| IndexIdentity::new(kind, format!("idx_{i}")))
}

/// Strategy for generating configurations accepted by the built-in
/// hash provider, with a few extra free-form entries.
pub fn hash_config_strategy() -> impl Strategy<Value = IndexConfig> {
    (
        prop_oneof![Just("exact"), Just("fulltext")],
        prop::collection::btree_map("[a-z]{1,8}", "[a-zA-Z0-9 ]{0,12}", 0..4),
    )
        .prop_map(|(kind, extra)| {
            let mut config = IndexConfig::for_provider(DEFAULT_INDEX_PROVIDER).with("type", kind);
            for (key, value) in extra {
                if config.get(&key).is_none() {
                    config.insert(key, value);
                }
            }
            config
        })
}

/// An operation against an index store.
#[derive(Debug, Clone)]
pub enum StoreOperation {
    /// Claim a creation unless a committed record exists.
    SetIfAbsent {
        /// Target index.
        identity: IndexIdentity,
        /// Configuration to record.
        config: IndexConfig,
    },
    /// Commit a pending claim.
    Commit {
        /// Target index.
        identity: IndexIdentity,
    },
    /// Withdraw a record.
    Remove {
        /// Target index.
        identity: IndexIdentity,
    },
    /// Read a record.
    Get {
        /// Target index.
        identity: IndexIdentity,
    },
}

/// Strategy for generating store operations over a pool of `pool` names.
pub fn store_operation_strategy(pool: usize) -> impl Strategy<Value = StoreOperation> {
    prop_oneof![
        3 => (pooled_identity_strategy(pool), hash_config_strategy())
            .prop_map(|(identity, config)| StoreOperation::SetIfAbsent { identity, config }),
        2 => pooled_identity_strategy(pool)
            .prop_map(|identity| StoreOperation::Commit { identity }),
        1 => pooled_identity_strategy(pool)
            .prop_map(|identity| StoreOperation::Remove { identity }),
        2 => pooled_identity_strategy(pool)
            .prop_map(|identity| StoreOperation::Get { identity }),
    ]
}

/// Strategy for generating a sequence of store operations.
pub fn store_operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(store_operation_strategy(6), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphidx_core::store::{DurableIndexStore, InMemoryIndexStore, IndexStore};
    use graphidx_storage::FileBackend;
    use std::collections::HashMap;
    use tempfile::tempdir;

    /// Configuration and committed flag per identity.
    type Model = HashMap<IndexIdentity, (IndexConfig, bool)>;

    fn committed(model: &Model) -> HashMap<IndexIdentity, IndexConfig> {
        model
            .iter()
            .filter(|(_, (_, committed))| *committed)
            .map(|(identity, (config, _))| (identity.clone(), config.clone()))
            .collect()
    }

    fn apply(
        store: &dyn IndexStore,
        model: &mut Model,
        op: &StoreOperation,
    ) -> Result<(), TestCaseError> {
        match op {
            StoreOperation::SetIfAbsent { identity, config } => {
                let expected = !model.get(identity).is_some_and(|(_, committed)| *committed);
                prop_assert_eq!(store.set_if_absent(identity, config).unwrap(), expected);
                if expected {
                    model.insert(identity.clone(), (config.clone(), false));
                }
            }
            StoreOperation::Commit { identity } => {
                let expected = match model.get_mut(identity) {
                    Some((_, committed)) if !*committed => {
                        *committed = true;
                        true
                    }
                    _ => false,
                };
                prop_assert_eq!(store.commit(identity).unwrap(), expected);
            }
            StoreOperation::Remove { identity } => {
                let expected = model.remove(identity).is_some();
                prop_assert_eq!(store.remove(identity).unwrap(), expected);
            }
            StoreOperation::Get { identity } => {
                let expected = committed(model).get(identity).cloned();
                prop_assert_eq!(store.get(identity).unwrap(), expected);
            }
        }
        Ok(())
    }

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn index_name_is_valid(identity in index_identity_strategy()) {
            let first = identity.name.chars().next();
            prop_assert!(first.is_some_and(|c| c.is_ascii_alphabetic()));
        }

        #[test]
        fn hash_config_names_default_provider(config in hash_config_strategy()) {
            prop_assert_eq!(config.provider(), Some(DEFAULT_INDEX_PROVIDER));
            prop_assert!(matches!(config.get("type"), Some("exact" | "fulltext")));
        }

        #[test]
        fn memory_store_matches_model(ops in store_operation_sequence_strategy(1, 40)) {
            let store = InMemoryIndexStore::new();
            let mut model = Model::new();
            for op in &ops {
                apply(&store, &mut model, op)?;
            }
            prop_assert_eq!(store.len(), committed(&model).len());
        }

        #[test]
        fn durable_store_replays_to_model(ops in store_operation_sequence_strategy(1, 40)) {
            let dir = tempdir().unwrap();
            let path = dir.path().join("indexes.log");
            let mut model = Model::new();
            {
                let backend = FileBackend::open(&path).unwrap();
                let store = DurableIndexStore::open(Box::new(backend), false).unwrap();
                for op in &ops {
                    apply(&store, &mut model, op)?;
                }
            }

            let backend = FileBackend::open(&path).unwrap();
            let store = DurableIndexStore::open(Box::new(backend), false).unwrap();
            let live = committed(&model);
            prop_assert_eq!(store.len(), live.len());
            for (identity, config) in &live {
                let replayed = store.get(identity).unwrap();
                prop_assert_eq!(replayed.as_ref(), Some(config));
            }
        }
    }
}
