//! Per-account signal engine.
//!
//! One [`SignalEngine`] owns the signal store, account state, risk
//! configuration and Telegram link of a single account. All of them sit
//! behind one lock, so a risk evaluation and the store mutation it
//! authorises happen atomically: two concurrent admissions can never both
//! take the last simultaneous-trade slot.
//!
//! Events are delivered after the state lock is released. Before letting
//! go of it, a mutation takes a second, delivery lock and holds it while
//! notifying, so each account's events reach the notifier in the order
//! its state changed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::risk::{PositionSizing, RiskDecision, RiskPolicy};
use super::stats;
use super::store::{SignalFilter, SignalStore, Transitioned};
use crate::domain::{
    AccountId, AccountState, AccountStats, Amount, BotStatus, RiskConfiguration,
    RiskConfigurationUpdate, SignalId, SignalRequest, SignalStatus, TelegramLink, TradeSignal,
};
use crate::error::{StoreError, SubmitError, ValidationError};
use crate::port::{Event, LifecycleEvent, Notifier, NotifierRegistry, RejectionEvent};

struct EngineState {
    store: SignalStore,
    account: AccountState,
    config: RiskConfiguration,
    telegram: TelegramLink,
    /// Signals admitted since the last `start_trading_day`.
    trades_today: u32,
}

/// Serialised owner of one account's trading state.
pub struct SignalEngine {
    account_id: AccountId,
    state: Mutex<EngineState>,
    delivery: Mutex<()>,
    notifier: Arc<dyn Notifier>,
}

impl SignalEngine {
    /// Create an engine without notifiers.
    #[must_use]
    pub fn new(account_id: AccountId, account: AccountState, config: RiskConfiguration) -> Self {
        Self::with_notifier(account_id, account, config, Arc::new(NotifierRegistry::new()))
    }

    /// Create an engine that reports every change to `notifier`.
    #[must_use]
    pub fn with_notifier(
        account_id: AccountId,
        account: AccountState,
        config: RiskConfiguration,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            account_id,
            state: Mutex::new(EngineState {
                store: SignalStore::new(),
                account,
                config,
                telegram: TelegramLink::default(),
                trades_today: 0,
            }),
            delivery: Mutex::new(()),
            notifier,
        }
    }

    #[must_use]
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    // ---------------------------------------------------------------------
    // Signal intake
    // ---------------------------------------------------------------------

    /// Evaluate and, if accepted, admit a candidate signal now.
    pub fn submit_signal(&self, request: SignalRequest) -> Result<SignalId, SubmitError> {
        self.admit(request, PositionSizing::Fixed, Utc::now())
            .map(|signal| signal.id().clone())
    }

    /// Evaluate `request` at `now` and admit it as a PENDING signal.
    ///
    /// Malformed payloads, including levels that cannot be derived, fail
    /// with [`SubmitError::InvalidSignal`]; risk refusals with
    /// [`SubmitError::Rejected`]. Either way nothing is stored.
    pub fn admit(
        &self,
        request: SignalRequest,
        sizing: PositionSizing,
        now: DateTime<Utc>,
    ) -> Result<TradeSignal, SubmitError> {
        if let Err(e) = request.validate() {
            let e = SubmitError::from(e);
            warn!(account = %self.account_id, error = %e, "Malformed signal dropped");
            return Err(e);
        }

        let (outcome, _delivery) =
            self.mutate(|state| Self::evaluate_and_store(state, &request, sizing, now));

        match outcome {
            Ok(signal) => {
                info!(
                    account = %self.account_id,
                    signal_id = %signal.id(),
                    pair = %signal.pair(),
                    direction = %signal.direction(),
                    entry = %signal.entry_price(),
                    lots = %signal.lot_size(),
                    "Signal admitted"
                );
                self.notifier
                    .notify(Event::Lifecycle(LifecycleEvent::new(&signal, None, now)));
                Ok(signal)
            }
            Err(SubmitError::Rejected(reason)) => {
                let pair = request.normalized_pair();
                warn!(
                    account = %self.account_id,
                    pair = %pair,
                    reason = %reason,
                    "Signal rejected"
                );
                self.notifier.notify(Event::SignalRejected(RejectionEvent {
                    pair,
                    direction: request.direction,
                    entry_price: request.entry_price,
                    reason: reason.clone(),
                    timestamp: now,
                }));
                Err(SubmitError::Rejected(reason))
            }
            Err(e) => {
                warn!(account = %self.account_id, error = %e, "Malformed signal dropped");
                Err(e)
            }
        }
    }

    fn evaluate_and_store(
        state: &mut EngineState,
        request: &SignalRequest,
        sizing: PositionSizing,
        now: DateTime<Utc>,
    ) -> Result<TradeSignal, SubmitError> {
        let decision = RiskPolicy::evaluate_sized(
            request,
            &state.config,
            &state.account,
            state.store.active_count(),
            state.trades_today,
            now,
            sizing,
        );

        match decision {
            RiskDecision::Accept(fields) => {
                state.trades_today += 1;
                Ok(state.store.create(fields, now).clone())
            }
            RiskDecision::Reject(reason) => Err(SubmitError::Rejected(reason)),
            RiskDecision::Invalid(e) => Err(SubmitError::from(e)),
        }
    }

    // ---------------------------------------------------------------------
    // Execution venue callbacks
    // ---------------------------------------------------------------------

    /// Fill confirmed: PENDING -> EXECUTED.
    pub fn report_fill(&self, id: &SignalId) -> Result<TradeSignal, StoreError> {
        self.transition(id, SignalStatus::Executed, None, Utc::now())
    }

    /// Position closed: EXECUTED -> COMPLETED with `profit` booked to the account.
    pub fn report_close(&self, id: &SignalId, profit: Decimal) -> Result<TradeSignal, StoreError> {
        self.transition(id, SignalStatus::Completed, Some(profit), Utc::now())
    }

    /// Abandon a PENDING or EXECUTED signal.
    pub fn cancel_signal(&self, id: &SignalId) -> Result<TradeSignal, StoreError> {
        self.transition(id, SignalStatus::Cancelled, None, Utc::now())
    }

    /// Apply a lifecycle transition at `now`.
    ///
    /// A completed signal's profit is added to the balance and the daily
    /// realised P&L under the same lock; a profit the balance cannot hold
    /// fails with [`StoreError::ProfitOutOfRange`]. Refused transitions are
    /// logged and returned; the caller should treat a late or duplicate
    /// confirmation as a no-op rather than retry it.
    pub fn transition(
        &self,
        id: &SignalId,
        to: SignalStatus,
        profit: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> Result<TradeSignal, StoreError> {
        let (result, _delivery) =
            self.mutate(|state| Self::apply_transition(state, id, to, profit, now));

        match result {
            Ok(done) => {
                info!(
                    account = %self.account_id,
                    signal_id = %id,
                    from = %done.from,
                    to = %to,
                    "Signal transitioned"
                );
                self.notifier.notify(Event::Lifecycle(LifecycleEvent::new(
                    &done.signal,
                    Some(done.from),
                    now,
                )));
                Ok(done.signal)
            }
            Err(e) => {
                warn!(account = %self.account_id, error = %e, "Transition refused");
                Err(e)
            }
        }
    }

    /// Neither the account nor the store changes unless both accept.
    fn apply_transition(
        state: &mut EngineState,
        id: &SignalId,
        to: SignalStatus,
        profit: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> Result<Transitioned, StoreError> {
        state.store.check_transition(id, to, profit)?;

        let mut account = state.account.clone();
        if let (SignalStatus::Completed, Some(p)) = (to, profit) {
            account
                .record_realized(p)
                .map_err(|_| StoreError::ProfitOutOfRange {
                    id: id.clone(),
                    profit: p,
                })?;
        }

        let done = state.store.transition(id, to, profit, now)?;
        state.account = account;
        Ok(done)
    }

    // ---------------------------------------------------------------------
    // Risk configuration
    // ---------------------------------------------------------------------

    /// Merge a partial update into the risk configuration.
    ///
    /// On a validation error the previous configuration stays in place.
    pub fn update_risk_configuration(
        &self,
        update: &RiskConfigurationUpdate,
    ) -> Result<RiskConfiguration, ValidationError> {
        let (result, _delivery) = self.mutate(|state| {
            state.config.apply(update).map(|next| {
                state.config = next.clone();
                next
            })
        });

        match &result {
            Ok(_) => {
                info!(account = %self.account_id, "Risk configuration updated");
                self.notifier.notify(Event::RiskConfigurationUpdated {
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                warn!(
                    account = %self.account_id,
                    field = e.field,
                    reason = %e.reason,
                    "Risk configuration update rejected"
                );
            }
        }
        result
    }

    #[must_use]
    pub fn risk_configuration(&self) -> RiskConfiguration {
        self.state.lock().config.clone()
    }

    // ---------------------------------------------------------------------
    // Account and bot status
    // ---------------------------------------------------------------------

    /// Snapshot of the account state.
    #[must_use]
    pub fn account(&self) -> AccountState {
        self.state.lock().account.clone()
    }

    #[must_use]
    pub fn bot_status(&self) -> BotStatus {
        self.state.lock().account.bot_status()
    }

    /// Turn automated trading on or off. Returns the resulting status.
    pub fn set_auto_trading(&self, enabled: bool) -> BotStatus {
        self.update_account(None, |account| account.set_auto_trading(enabled))
    }

    /// Flip automated trading.
    pub fn toggle_auto_trading(&self) -> BotStatus {
        self.update_account(None, |account| {
            let enabled = !account.auto_trading();
            account.set_auto_trading(enabled);
        })
    }

    /// Put the bot into ERROR until [`clear_fault`](Self::clear_fault).
    pub fn report_fault(&self, reason: impl Into<String>) -> BotStatus {
        let reason = reason.into();
        warn!(account = %self.account_id, reason = %reason, "Fault reported");
        self.update_account(Some(reason.clone()), move |account| {
            account.set_fault(reason);
        })
    }

    /// Leave ERROR and fall back to the auto-trading toggle.
    pub fn clear_fault(&self) -> BotStatus {
        self.update_account(None, AccountState::clear_fault)
    }

    /// Replace the balance after reconciliation.
    pub fn set_balance(&self, balance: Amount) {
        self.state.lock().account.set_balance(balance);
    }

    /// Reset the daily realised P&L and the admission counter.
    pub fn start_trading_day(&self) {
        let mut state = self.state.lock();
        state.account.start_trading_day();
        state.trades_today = 0;
        info!(account = %self.account_id, "Trading day started");
    }

    /// Signals admitted since the last trading day start.
    #[must_use]
    pub fn trades_today(&self) -> u32 {
        self.state.lock().trades_today
    }

    fn update_account(
        &self,
        reason: Option<String>,
        change: impl FnOnce(&mut AccountState),
    ) -> BotStatus {
        let ((from, to), _delivery) = self.mutate(|state| {
            let from = state.account.bot_status();
            change(&mut state.account);
            (from, state.account.bot_status())
        });

        if from != to {
            info!(account = %self.account_id, from = %from, to = %to, "Bot status changed");
            self.notifier.notify(Event::BotStatusChanged {
                from,
                to,
                reason,
                timestamp: Utc::now(),
            });
        }
        to
    }

    // ---------------------------------------------------------------------
    // Telegram link
    // ---------------------------------------------------------------------

    /// Store non-empty credentials and mark the link connected.
    pub fn connect_telegram(
        &self,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Result<TelegramLink, ValidationError> {
        let now = Utc::now();
        let link = TelegramLink::connect(bot_token, chat_id, now)?;
        let _delivery = self.mutate(|state| state.telegram = link.clone()).1;

        info!(account = %self.account_id, chat_id = %link.chat_id(), "Telegram linked");
        self.notifier.notify(Event::TelegramLinkChanged {
            connected: true,
            timestamp: now,
        });
        Ok(link)
    }

    pub fn disconnect_telegram(&self) {
        let _delivery = self.mutate(|state| state.telegram.disconnect()).1;

        info!(account = %self.account_id, "Telegram unlinked");
        self.notifier.notify(Event::TelegramLinkChanged {
            connected: false,
            timestamp: Utc::now(),
        });
    }

    #[must_use]
    pub fn telegram_link(&self) -> TelegramLink {
        self.state.lock().telegram.clone()
    }

    /// Run `change` under the state lock and return with the delivery lock
    /// held, taken before the state lock is released.
    fn mutate<T>(&self, change: impl FnOnce(&mut EngineState) -> T) -> (T, MutexGuard<'_, ()>) {
        let mut state = self.state.lock();
        let out = change(&mut *state);
        let delivery = self.delivery.lock();
        (out, delivery)
    }

    // ---------------------------------------------------------------------
    // Read views
    // ---------------------------------------------------------------------

    /// Consistent copy of the store; statistics run on it outside the lock.
    #[must_use]
    pub fn snapshot(&self) -> SignalStore {
        self.state.lock().store.clone()
    }

    #[must_use]
    pub fn signal(&self, id: &SignalId) -> Option<TradeSignal> {
        self.state.lock().store.get(id).cloned()
    }

    #[must_use]
    pub fn signals(&self, filter: SignalFilter) -> Vec<TradeSignal> {
        self.state.lock().store.list(filter)
    }

    #[must_use]
    pub fn stats(&self) -> AccountStats {
        stats::summarize(&self.snapshot())
    }

    #[must_use]
    pub fn win_rate(&self) -> f64 {
        stats::win_rate(&self.snapshot())
    }

    #[must_use]
    pub fn total_completed_trades(&self) -> usize {
        stats::total_completed_trades(&self.snapshot())
    }

    #[must_use]
    pub fn recent_trades(&self, n: usize) -> Vec<TradeSignal> {
        stats::recent_trades(&self.snapshot(), n)
    }

    #[must_use]
    pub fn active_trades(&self) -> Vec<TradeSignal> {
        stats::active_trades(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, TradingHours};
    use crate::error::RejectReason;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    fn engine() -> SignalEngine {
        SignalEngine::new(
            AccountId::default(),
            AccountState::default(),
            RiskConfiguration::default(),
        )
    }

    fn eurusd() -> SignalRequest {
        SignalRequest::new("EURUSD", Direction::Buy, dec!(1.08765))
    }

    #[test]
    fn test_admit_counts_trades_today() {
        let engine = engine();
        engine.admit(eurusd(), PositionSizing::Fixed, noon()).unwrap();
        engine.admit(eurusd(), PositionSizing::Fixed, noon()).unwrap();

        assert_eq!(engine.trades_today(), 2);
        engine.start_trading_day();
        assert_eq!(engine.trades_today(), 0);
    }

    #[test]
    fn test_unbookable_profit_changes_nothing() {
        let engine = engine();
        let signal = engine.admit(eurusd(), PositionSizing::Fixed, noon()).unwrap();
        let id = signal.id().clone();
        engine
            .transition(&id, SignalStatus::Executed, None, noon())
            .unwrap();

        let err = engine
            .transition(&id, SignalStatus::Completed, Some(Decimal::MAX), noon())
            .unwrap_err();

        assert_eq!(
            err,
            StoreError::ProfitOutOfRange {
                id: id.clone(),
                profit: Decimal::MAX,
            }
        );
        let stored = engine.signal(&id).unwrap();
        assert_eq!(stored.status(), SignalStatus::Executed);
        assert_eq!(stored.profit(), None);
        assert_eq!(engine.account(), AccountState::default());

        let closed = engine
            .transition(&id, SignalStatus::Completed, Some(dec!(12.5)), noon())
            .unwrap();
        assert_eq!(closed.profit(), Some(dec!(12.5)));
        assert_eq!(engine.account().balance(), dec!(10012.5));
    }

    #[test]
    fn test_underivable_levels_are_invalid_and_not_counted() {
        let engine = SignalEngine::new(
            AccountId::default(),
            AccountState::default(),
            RiskConfiguration {
                default_take_profit_pips: dec!(100000),
                ..RiskConfiguration::default()
            },
        );
        let request =
            SignalRequest::new("EURUSD", Direction::Buy, Decimal::MAX).with_stop_loss(dec!(1));

        let err = engine
            .admit(request, PositionSizing::Fixed, noon())
            .unwrap_err();

        assert!(matches!(
            err,
            SubmitError::InvalidSignal {
                field: "take_profit",
                ..
            }
        ));
        assert!(engine.snapshot().is_empty());
        assert_eq!(engine.trades_today(), 0);
    }

    #[test]
    fn test_malformed_signal_is_not_stored() {
        let engine = engine();
        let err = engine
            .admit(
                SignalRequest::new("EURUSD", Direction::Buy, dec!(0)),
                PositionSizing::Fixed,
                noon(),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            SubmitError::InvalidSignal {
                field: "entry_price",
                ..
            }
        ));
        assert!(engine.snapshot().is_empty());
        assert_eq!(engine.trades_today(), 0);
    }

    #[test]
    fn test_rejection_does_not_consume_daily_slot() {
        let engine = engine();
        let err = engine
            .admit(
                SignalRequest::new("XAUUSD", Direction::Buy, dec!(2300)),
                PositionSizing::Fixed,
                noon(),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            SubmitError::Rejected(RejectReason::PairNotAllowed { .. })
        ));
        assert_eq!(engine.trades_today(), 0);
    }

    #[test]
    fn test_close_books_profit_to_account() {
        let engine = engine();
        let signal = engine.admit(eurusd(), PositionSizing::Fixed, noon()).unwrap();

        engine.report_fill(signal.id()).unwrap();
        engine.report_close(signal.id(), dec!(-40)).unwrap();

        let account = engine.account();
        assert_eq!(account.balance(), dec!(9960));
        assert_eq!(account.daily_realized_pnl(), dec!(-40));
    }

    #[test]
    fn test_failed_close_does_not_touch_account() {
        let engine = engine();
        let signal = engine.admit(eurusd(), PositionSizing::Fixed, noon()).unwrap();

        // Still PENDING, so completing is not a valid edge.
        let err = engine.report_close(signal.id(), dec!(25)).unwrap_err();

        assert!(matches!(err, StoreError::InvalidTransition { .. }));
        assert_eq!(engine.account().balance(), dec!(10000));
    }

    #[test]
    fn test_cancelled_signal_frees_simultaneous_slot() {
        let engine = engine();
        engine
            .update_risk_configuration(&RiskConfigurationUpdate {
                max_simultaneous_trades: Some(1),
                ..Default::default()
            })
            .unwrap();

        let first = engine.admit(eurusd(), PositionSizing::Fixed, noon()).unwrap();
        assert!(engine.admit(eurusd(), PositionSizing::Fixed, noon()).is_err());

        engine.cancel_signal(first.id()).unwrap();
        assert!(engine.admit(eurusd(), PositionSizing::Fixed, noon()).is_ok());
    }

    #[test]
    fn test_update_risk_configuration_keeps_prior_on_error() {
        let engine = engine();
        let before = engine.risk_configuration();

        let err = engine
            .update_risk_configuration(&RiskConfigurationUpdate {
                risk_per_trade_percent: Some(dec!(7)),
                max_daily_trades: Some(1),
                ..Default::default()
            })
            .unwrap_err();

        assert_eq!(err.field, "risk_per_trade_percent");
        assert_eq!(engine.risk_configuration(), before);
    }

    #[test]
    fn test_bot_status_transitions() {
        let engine = engine();
        assert_eq!(engine.bot_status(), BotStatus::Inactive);
        assert_eq!(engine.toggle_auto_trading(), BotStatus::Active);
        assert_eq!(engine.report_fault("repeated fill timeouts"), BotStatus::Error);
        assert_eq!(engine.clear_fault(), BotStatus::Active);
        assert_eq!(engine.set_auto_trading(false), BotStatus::Inactive);
    }

    #[test]
    fn test_telegram_link() {
        let engine = engine();
        assert!(engine.connect_telegram("", "1").is_err());
        assert!(!engine.telegram_link().is_connected());

        engine.connect_telegram("token", "1").unwrap();
        assert!(engine.telegram_link().is_connected());

        engine.disconnect_telegram();
        assert!(!engine.telegram_link().is_connected());
    }

    #[test]
    fn test_trading_hours_use_supplied_time() {
        let engine = engine();
        engine
            .update_risk_configuration(&RiskConfigurationUpdate {
                trading_hours: Some(TradingHours::default()),
                ..Default::default()
            })
            .unwrap();
        let late = Utc.with_ymd_and_hms(2024, 5, 15, 20, 0, 0).unwrap();

        let err = engine
            .admit(eurusd(), PositionSizing::Fixed, late)
            .unwrap_err();
        assert_eq!(err, SubmitError::Rejected(RejectReason::OutsideTradingHours));
    }
}
