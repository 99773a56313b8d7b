//! Tests for risk gating, including concurrent admissions against one account.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Barrier;
use tradebolt::application::{AccountRegistry, PositionSizing, RiskDecision, RiskPolicy};
use tradebolt::domain::{AccountId, AccountState, RiskConfiguration, RiskConfigurationUpdate};
use tradebolt::error::{RejectReason, SubmitError};
use tradebolt::testkit::domain::{any_hour_config, buy, engine, engine_with, eurusd_buy, noon};
use tradebolt::testkit::notifier::RecordingNotifier;

/// Concurrent candidates must never both take the last simultaneous slot.
///
/// Several tasks race to admit a signal while only one slot is free; the
/// engine evaluates and stores under one lock, so exactly one wins.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_admissions_cannot_exceed_simultaneous_limit() {
    const TASKS: usize = 8;

    let recorder = RecordingNotifier::new();
    let config = RiskConfiguration {
        max_simultaneous_trades: 1,
        ..any_hour_config()
    };
    let engine = Arc::new(engine_with(config, Arc::new(recorder.clone())));
    let barrier = Arc::new(Barrier::new(TASKS));

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                engine.admit(eurusd_buy(), PositionSizing::Fixed, noon())
            })
        })
        .collect();

    let mut admitted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(SubmitError::Rejected(RejectReason::SimultaneousTradeLimitReached {
                open: 1,
                limit: 1,
            })) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(admitted, 1, "expected exactly one admission");
    assert_eq!(rejected, TASKS - 1);
    assert_eq!(engine.active_trades().len(), 1);
    assert_eq!(recorder.rejections(), TASKS - 1);
}

/// The daily counter is bumped under the same lock as the check.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_admissions_respect_daily_limit() {
    const TASKS: usize = 6;

    let config = RiskConfiguration {
        max_daily_trades: 2,
        ..any_hour_config()
    };
    let engine = Arc::new(engine_with(config, Arc::new(RecordingNotifier::new())));
    let barrier = Arc::new(Barrier::new(TASKS));

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                engine.admit(eurusd_buy(), PositionSizing::Fixed, noon()).is_ok()
            })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 2);
    assert_eq!(engine.trades_today(), 2);
}

#[test]
fn simultaneous_limit_boundary() {
    let config = RiskConfiguration {
        max_simultaneous_trades: 3,
        ..RiskConfiguration::default()
    };
    let account = AccountState::default();

    let at_limit = RiskPolicy::evaluate(&eurusd_buy(), &config, &account, 3, 0, noon());
    assert_eq!(
        at_limit.rejection(),
        Some(&RejectReason::SimultaneousTradeLimitReached { open: 3, limit: 3 })
    );

    let one_below = RiskPolicy::evaluate(&eurusd_buy(), &config, &account, 2, 0, noon());
    assert!(one_below.is_accepted());
}

#[test]
fn daily_limit_with_two_trades_today() {
    let config = RiskConfiguration {
        max_daily_trades: 2,
        ..RiskConfiguration::default()
    };

    let decision = RiskPolicy::evaluate(
        &eurusd_buy(),
        &config,
        &AccountState::default(),
        0,
        2,
        noon(),
    );

    assert_eq!(
        decision.rejection(),
        Some(&RejectReason::DailyTradeLimitReached { taken: 2, limit: 2 })
    );
}

#[test]
fn first_failing_check_wins() {
    let config = RiskConfiguration {
        max_daily_trades: 0,
        max_simultaneous_trades: 0,
        ..RiskConfiguration::default()
    };
    let late = noon() + chrono::Duration::hours(8);

    // Disallowed pair beats every other failure.
    let decision =
        RiskPolicy::evaluate(&buy("XAUUSD", dec!(2300)), &config, &AccountState::default(), 5, 5, late);
    assert!(matches!(
        decision.rejection(),
        Some(RejectReason::PairNotAllowed { .. })
    ));

    // Then trading hours.
    let decision =
        RiskPolicy::evaluate(&eurusd_buy(), &config, &AccountState::default(), 5, 5, late);
    assert_eq!(decision.rejection(), Some(&RejectReason::OutsideTradingHours));
}

#[test]
fn drawdown_limit_stops_admissions() {
    let mut account = AccountState::new(dec!(10000));
    account.set_balance(dec!(9400));

    let decision = RiskPolicy::evaluate(
        &eurusd_buy(),
        &RiskConfiguration::default(),
        &account,
        0,
        0,
        noon(),
    );

    assert!(matches!(
        decision,
        RiskDecision::Reject(RejectReason::DrawdownLimitExceeded { .. })
    ));
}

#[test]
fn risk_based_sizing_uses_balance_and_stop_distance() {
    let engine = engine();
    engine
        .update_risk_configuration(&RiskConfigurationUpdate {
            risk_per_trade_percent: Some(dec!(2)),
            ..Default::default()
        })
        .unwrap();

    // 10 000 * 2% = 200 at risk; 20 pip stop at 10 per pip per lot = 1 lot.
    let signal = engine
        .admit(
            buy("EURUSD", dec!(1.1000)).with_stop_loss(dec!(1.0980)),
            PositionSizing::RiskBased {
                pip_value: dec!(10),
            },
            noon(),
        )
        .unwrap();

    assert_eq!(signal.lot_size(), dec!(1));
    assert_eq!(signal.stop_loss(), dec!(1.0980));
}

#[test]
fn default_stops_are_derived_from_pips() {
    let engine = engine();
    let signal = engine
        .admit(buy("USDJPY", dec!(151.20)), PositionSizing::Fixed, noon())
        .unwrap();

    // 10 and 25 pips at 0.01 per pip.
    assert_eq!(signal.stop_loss(), dec!(151.10));
    assert_eq!(signal.take_profit(), dec!(151.45));
    assert_eq!(signal.lot_size(), dec!(0.01));
}

#[test]
fn accounts_do_not_share_limits() {
    let registry = AccountRegistry::new();
    let config = RiskConfiguration {
        max_simultaneous_trades: 1,
        ..any_hour_config()
    };
    for name in ["alice", "bob"] {
        registry.insert(tradebolt::application::SignalEngine::new(
            AccountId::from(name),
            AccountState::default(),
            config.clone(),
        ));
    }

    let alice = registry.get(&AccountId::from("alice")).unwrap();
    let bob = registry.get(&AccountId::from("bob")).unwrap();

    assert!(alice.submit_signal(eurusd_buy()).is_ok());
    assert!(alice.submit_signal(eurusd_buy()).is_err());
    assert!(bob.submit_signal(eurusd_buy()).is_ok());
}

#[test]
fn zero_risk_percent_sizes_with_fixed_lot() {
    let engine = engine();
    engine
        .update_risk_configuration(&RiskConfigurationUpdate {
            risk_per_trade_percent: Some(Decimal::ZERO),
            ..Default::default()
        })
        .unwrap();

    let signal = engine
        .admit(
            buy("EURUSD", dec!(1.1000)).with_stop_loss(dec!(1.0980)),
            PositionSizing::RiskBased {
                pip_value: dec!(10),
            },
            noon(),
        )
        .unwrap();

    assert_eq!(signal.lot_size(), dec!(0.01));
}

#[test]
fn extreme_prices_never_panic_the_gate() {
    let engine = engine();

    let signal = engine
        .admit(
            buy("EURUSD", Decimal::MAX)
                .with_stop_loss(dec!(1))
                .with_take_profit(Decimal::MAX),
            PositionSizing::RiskBased {
                pip_value: Decimal::new(1, 28),
            },
            noon(),
        )
        .unwrap();

    assert_eq!(signal.lot_size(), dec!(0.01));
    assert_eq!(engine.trades_today(), 1);
}
