//! Account registry.
//!
//! Maps each account to its own [`SignalEngine`]. Engines never share
//! state, so work on different accounts proceeds without contention.
//! A registry built with a factory opens unknown accounts on first use.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use super::engine::SignalEngine;
use crate::domain::AccountId;

type EngineFactory = dyn Fn(&AccountId) -> SignalEngine + Send + Sync;

/// Concurrent map of account engines.
#[derive(Default)]
pub struct AccountRegistry {
    engines: DashMap<AccountId, Arc<SignalEngine>>,
    factory: Option<Box<EngineFactory>>,
}

impl AccountRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that builds engines for unknown accounts with `factory`.
    #[must_use]
    pub fn with_factory(
        factory: impl Fn(&AccountId) -> SignalEngine + Send + Sync + 'static,
    ) -> Self {
        Self {
            engines: DashMap::new(),
            factory: Some(Box::new(factory)),
        }
    }

    /// Return the engine for `id`, opening it through the factory if needed.
    ///
    /// `None` when the account is unknown and there is no factory.
    pub fn open(&self, id: &AccountId) -> Option<Arc<SignalEngine>> {
        if let Some(engine) = self.get(id) {
            return Some(engine);
        }
        let factory = self.factory.as_ref()?;
        Some(self.get_or_insert_with(id, || {
            info!(account = %id, "Account opened");
            factory(id)
        }))
    }

    /// Register an engine under its own account ID, replacing any previous one.
    pub fn insert(&self, engine: SignalEngine) -> Arc<SignalEngine> {
        let engine = Arc::new(engine);
        info!(account = %engine.account_id(), "Account registered");
        self.engines
            .insert(engine.account_id().clone(), Arc::clone(&engine));
        engine
    }

    /// Return the engine for `id`, creating it with `make` if absent.
    pub fn get_or_insert_with(
        &self,
        id: &AccountId,
        make: impl FnOnce() -> SignalEngine,
    ) -> Arc<SignalEngine> {
        Arc::clone(
            self.engines
                .entry(id.clone())
                .or_insert_with(|| Arc::new(make()))
                .value(),
        )
    }

    #[must_use]
    pub fn get(&self, id: &AccountId) -> Option<Arc<SignalEngine>> {
        self.engines.get(id).map(|e| Arc::clone(e.value()))
    }

    /// Registered account IDs, sorted.
    #[must_use]
    pub fn account_ids(&self) -> Vec<AccountId> {
        let mut ids: Vec<_> = self.engines.iter().map(|e| e.key().clone()).collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
