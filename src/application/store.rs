//! Authoritative ordered collection of trade signals.
//!
//! Iteration order is newest-created first. Every status change goes
//! through [`SignalStore::transition`], which enforces the lifecycle graph
//! and leaves the store untouched when it refuses.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{AdmittedSignal, SignalId, SignalStatus, TradeSignal};
use crate::error::StoreError;

/// Predicate used by [`SignalStore::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalFilter {
    All,
    /// PENDING or EXECUTED, in store order.
    Active,
    Status(SignalStatus),
    /// Up to `n` COMPLETED signals, most recently closed first.
    RecentCompleted(usize),
}

/// Outcome of a successful transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transitioned {
    pub from: SignalStatus,
    pub signal: TradeSignal,
}

/// Newest-first signal collection enforcing the lifecycle state machine.
///
/// Not synchronised on its own; the owning engine serialises access.
#[derive(Debug, Clone, Default)]
pub struct SignalStore {
    signals: VecDeque<TradeSignal>,
}

impl SignalStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a new PENDING signal at the front of the collection.
    pub fn create(&mut self, fields: AdmittedSignal, now: DateTime<Utc>) -> &TradeSignal {
        let mut id = SignalId::generate();
        while self.get(&id).is_some() {
            id = SignalId::generate();
        }

        self.signals.push_front(TradeSignal::new(id, fields, now));
        &self.signals[0]
    }

    /// Check that `id` may move to `to` without changing anything.
    ///
    /// Returns the current status on success.
    pub fn check_transition(
        &self,
        id: &SignalId,
        to: SignalStatus,
        profit: Option<Decimal>,
    ) -> Result<SignalStatus, StoreError> {
        let from = self
            .get(id)
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })?
            .status();

        if !from.can_transition_to(to) {
            return Err(StoreError::InvalidTransition {
                id: id.clone(),
                from,
                to,
            });
        }
        if to == SignalStatus::Completed && profit.is_none() {
            return Err(StoreError::MissingProfit { id: id.clone() });
        }
        Ok(from)
    }

    /// Move a signal to `to`.
    ///
    /// `profit` is required when completing and ignored otherwise.
    pub fn transition(
        &mut self,
        id: &SignalId,
        to: SignalStatus,
        profit: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> Result<Transitioned, StoreError> {
        let from = self.check_transition(id, to, profit)?;
        let signal = self
            .signals
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;

        signal.apply(to, profit.filter(|_| to == SignalStatus::Completed), now);
        Ok(Transitioned {
            from,
            signal: signal.clone(),
        })
    }

    /// Look up a signal by ID.
    #[must_use]
    pub fn get(&self, id: &SignalId) -> Option<&TradeSignal> {
        self.signals.iter().find(|s| s.id() == id)
    }

    /// Iterate over all signals, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &TradeSignal> {
        self.signals.iter()
    }

    /// Collect the signals matching `filter`.
    #[must_use]
    pub fn list(&self, filter: SignalFilter) -> Vec<TradeSignal> {
        match filter {
            SignalFilter::All => self.signals.iter().cloned().collect(),
            SignalFilter::Active => self.iter().filter(|s| s.is_active()).cloned().collect(),
            SignalFilter::Status(status) => self
                .iter()
                .filter(|s| s.status() == status)
                .cloned()
                .collect(),
            SignalFilter::RecentCompleted(n) => {
                let mut completed: Vec<_> = self
                    .iter()
                    .filter(|s| s.status() == SignalStatus::Completed)
                    .cloned()
                    .collect();
                // Stable sort keeps store order for equal close times.
                completed.sort_by(|a, b| b.closed_at().cmp(&a.closed_at()));
                completed.truncate(n);
                completed
            }
        }
    }

    /// Number of PENDING or EXECUTED signals.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.iter().filter(|s| s.is_active()).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}
