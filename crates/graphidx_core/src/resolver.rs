//! Effective configuration resolution.
//!
//! Precedence, in order:
//!
//! 1. the committed record, if any (a different supplied config is a conflict)
//! 2. the caller-supplied configuration
//! 3. the provider named by `index.<name>`, then `index`, then
//!    [`DEFAULT_INDEX_PROVIDER`](crate::DEFAULT_INDEX_PROVIDER), completed
//!    with that provider's defaults
//!
//! The final `set_if_absent` claims the creation of an index that has no
//! committed record. Callers joining a creation still in flight go through
//! [`ConfigResolver::join`] instead.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::index::IndexConfig;
use crate::provider::ProviderRegistry;
use crate::store::IndexStore;
use crate::types::IndexIdentity;
use tracing::debug;

/// Outcome of [`ConfigResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Configuration the index is created and opened with.
    pub config: IndexConfig,
    /// True if this call claimed the creation and must create the index.
    pub needs_creation: bool,
}

/// Computes effective index configurations against a store and a registry.
pub struct ConfigResolver<'a> {
    store: &'a dyn IndexStore,
    providers: &'a ProviderRegistry,
}

impl<'a> ConfigResolver<'a> {
    /// Creates a resolver.
    #[must_use]
    pub fn new(store: &'a dyn IndexStore, providers: &'a ProviderRegistry) -> Self {
        Self { store, providers }
    }

    /// Resolves the configuration for `identity` and records it if absent.
    ///
    /// # Errors
    ///
    /// - [`InvalidConfig`](CoreError::InvalidConfig): empty name, or a
    ///   supplied config without a provider key
    /// - [`UnknownProvider`](CoreError::UnknownProvider): the chosen or
    ///   stored provider is not registered
    /// - [`ConfigConflict`](CoreError::ConfigConflict): `supplied` differs
    ///   from the stored record
    /// - store failures, unchanged
    pub fn resolve(
        &self,
        identity: &IndexIdentity,
        supplied: Option<&IndexConfig>,
        defaults: &Config,
    ) -> CoreResult<Resolution> {
        identity.validate()?;
        let stored = self.store.get(identity)?;

        let candidate = match supplied {
            Some(config) => {
                config.require_provider()?;
                config.clone()
            }
            None => self.default_config(&identity.name, defaults)?,
        };

        let effective = match stored {
            Some(stored) => {
                check_supplied(identity, supplied, &stored)?;
                stored
            }
            None => candidate,
        };

        let provider = effective.require_provider()?;
        if !self.providers.contains(provider) {
            return Err(CoreError::unknown_provider(provider));
        }

        let needs_creation = self.store.set_if_absent(identity, &effective)?;
        debug!(
            index = %identity,
            provider,
            needs_creation,
            "index configuration resolved"
        );
        Ok(Resolution {
            config: effective,
            needs_creation,
        })
    }

    /// Checks a request for `identity` against a creation of it that is
    /// still in flight with `in_flight`, and returns that configuration.
    ///
    /// # Errors
    ///
    /// [`InvalidConfig`](CoreError::InvalidConfig) and
    /// [`ConfigConflict`](CoreError::ConfigConflict), as for
    /// [`resolve`](Self::resolve).
    pub fn join(
        identity: &IndexIdentity,
        supplied: Option<&IndexConfig>,
        in_flight: &IndexConfig,
    ) -> CoreResult<IndexConfig> {
        identity.validate()?;
        if let Some(config) = supplied {
            config.require_provider()?;
        }
        check_supplied(identity, supplied, in_flight)?;
        Ok(in_flight.clone())
    }

    fn default_config(&self, name: &str, defaults: &Config) -> CoreResult<IndexConfig> {
        let provider_name = defaults.provider_for(name);
        let provider = self.providers.lookup(provider_name)?;
        Ok(provider.fill_in_defaults(IndexConfig::for_provider(provider_name)))
    }
}

fn check_supplied(
    identity: &IndexIdentity,
    supplied: Option<&IndexConfig>,
    recorded: &IndexConfig,
) -> CoreResult<()> {
    match supplied {
        Some(config) if config != recorded => Err(CoreError::ConfigConflict {
            identity: identity.clone(),
            supplied: config.clone(),
            stored: recorded.clone(),
        }),
        _ => Ok(()),
    }
}
