//! Admission gate for candidate signals.
//!
//! Checks run in a fixed order and the first failure wins:
//! allowed pair, trading hours, daily trade count, simultaneous trades,
//! daily realised loss, drawdown from peak. An accepted candidate comes
//! back with stop loss, take profit and lot size resolved; one whose
//! levels overflow the decimal range comes back [`RiskDecision::Invalid`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::money::{pip_size, price_distance_in_pips};
use crate::domain::{AccountState, AdmittedSignal, Lots, Price, RiskConfiguration, SignalRequest};
use crate::error::{RejectReason, ValidationError};

/// How the lot size of an accepted signal is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionSizing {
    /// Use the configured fixed lot size.
    #[default]
    Fixed,
    /// Risk `risk_per_trade_percent` of the balance over the stop distance.
    ///
    /// `pip_value` is the account-currency value of one pip for one lot,
    /// supplied by market data.
    RiskBased { pip_value: Decimal },
}

/// Result of evaluating a candidate signal.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskDecision {
    /// Candidate may be admitted with these resolved fields.
    Accept(AdmittedSignal),
    /// Candidate is refused.
    Reject(RejectReason),
    /// Candidate passed the checks but its levels cannot be resolved.
    Invalid(ValidationError),
}

impl RiskDecision {
    /// Return `true` if the candidate was accepted.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accept(_))
    }

    /// Return the rejection reason, or `None` if accepted.
    #[must_use]
    pub const fn rejection(&self) -> Option<&RejectReason> {
        match self {
            Self::Reject(reason) => Some(reason),
            Self::Accept(_) | Self::Invalid(_) => None,
        }
    }
}

/// Stateless risk gate.
///
/// Everything the checks need is passed in; mutation happens in the
/// store after an [`RiskDecision::Accept`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskPolicy;

impl RiskPolicy {
    /// Evaluate with fixed lot sizing.
    #[must_use]
    pub fn evaluate(
        candidate: &SignalRequest,
        config: &RiskConfiguration,
        account: &AccountState,
        open_count: usize,
        trades_today: u32,
        now: DateTime<Utc>,
    ) -> RiskDecision {
        Self::evaluate_sized(
            candidate,
            config,
            account,
            open_count,
            trades_today,
            now,
            PositionSizing::Fixed,
        )
    }

    /// Evaluate a candidate and, on acceptance, size it with `sizing`.
    #[must_use]
    pub fn evaluate_sized(
        candidate: &SignalRequest,
        config: &RiskConfiguration,
        account: &AccountState,
        open_count: usize,
        trades_today: u32,
        now: DateTime<Utc>,
        sizing: PositionSizing,
    ) -> RiskDecision {
        let pair = candidate.normalized_pair();

        if let Err(reason) = Self::check_limits(&pair, config, account, open_count, trades_today, now)
        {
            return RiskDecision::Reject(reason);
        }

        match Self::resolve(candidate, pair, config, account, sizing) {
            Ok(admitted) => RiskDecision::Accept(admitted),
            Err(e) => RiskDecision::Invalid(e),
        }
    }

    fn check_limits(
        pair: &str,
        config: &RiskConfiguration,
        account: &AccountState,
        open_count: usize,
        trades_today: u32,
        now: DateTime<Utc>,
    ) -> Result<(), RejectReason> {
        if !config.is_pair_allowed(pair) {
            return Err(RejectReason::PairNotAllowed {
                pair: pair.to_string(),
            });
        }

        if !config.trading_hours.contains(now.time()) {
            return Err(RejectReason::OutsideTradingHours);
        }

        if trades_today >= config.max_daily_trades {
            return Err(RejectReason::DailyTradeLimitReached {
                taken: trades_today,
                limit: config.max_daily_trades,
            });
        }

        if open_count >= config.max_simultaneous_trades as usize {
            return Err(RejectReason::SimultaneousTradeLimitReached {
                open: open_count,
                limit: config.max_simultaneous_trades,
            });
        }

        let realized = account.daily_realized_pnl();
        if realized <= -config.max_daily_loss {
            return Err(RejectReason::DailyLossLimitExceeded {
                realized,
                limit: config.max_daily_loss,
            });
        }

        if account.peak_balance() > Decimal::ZERO {
            let drawdown = account.drawdown_percent();
            if drawdown >= config.max_drawdown_percent {
                return Err(RejectReason::DrawdownLimitExceeded {
                    drawdown: drawdown.round_dp(2),
                    limit: config.max_drawdown_percent,
                });
            }
        }

        Ok(())
    }

    fn resolve(
        candidate: &SignalRequest,
        pair: String,
        config: &RiskConfiguration,
        account: &AccountState,
        sizing: PositionSizing,
    ) -> Result<AdmittedSignal, ValidationError> {
        let entry = candidate.entry_price;
        let pip = pip_size(&pair);
        let sign = candidate.direction.sign();

        let stop_loss = level_or_default(
            candidate.stop_loss,
            entry,
            -sign * config.default_stop_loss_pips,
            pip,
            "stop_loss",
        )?;
        let take_profit = level_or_default(
            candidate.take_profit,
            entry,
            sign * config.default_take_profit_pips,
            pip,
            "take_profit",
        )?;

        let stop_pips = match candidate.stop_loss {
            Some(sl) => price_distance_in_pips(&pair, entry, sl),
            None => Some(config.default_stop_loss_pips),
        };
        let lot_size = Self::lot_size(config, account, stop_pips, sizing);

        Ok(AdmittedSignal {
            pair,
            direction: candidate.direction,
            entry_price: entry,
            stop_loss,
            take_profit,
            lot_size,
        })
    }

    /// `lots = balance * risk% / 100 / (stop_pips * pip_value)`.
    ///
    /// Falls back to the fixed lot size whenever that yields no positive,
    /// representable lot count.
    fn lot_size(
        config: &RiskConfiguration,
        account: &AccountState,
        stop_pips: Option<Decimal>,
        sizing: PositionSizing,
    ) -> Lots {
        let PositionSizing::RiskBased { pip_value } = sizing else {
            return config.fixed_lot_size;
        };

        let lots = stop_pips
            .and_then(|pips| pips.checked_mul(pip_value))
            .filter(|per_lot_risk| *per_lot_risk > Decimal::ZERO)
            .and_then(|per_lot_risk| {
                account
                    .balance()
                    .checked_mul(config.risk_per_trade_percent)?
                    .checked_div(dec!(100))?
                    .checked_div(per_lot_risk)
            });

        match lots {
            Some(lots) if lots > Decimal::ZERO => lots,
            _ => config.fixed_lot_size,
        }
    }
}

/// The supplied level, or `entry + pips * pip` when none was given.
fn level_or_default(
    supplied: Option<Price>,
    entry: Price,
    pips: Decimal,
    pip: Decimal,
    field: &'static str,
) -> Result<Price, ValidationError> {
    if let Some(price) = supplied {
        return Ok(price);
    }
    pips.checked_mul(pip)
        .and_then(|distance| entry.checked_add(distance))
        .ok_or_else(|| ValidationError::new(field, "derived level is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, RiskConfigurationUpdate, TradingHours};
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    fn eurusd_buy() -> SignalRequest {
        SignalRequest::new("EURUSD", Direction::Buy, dec!(1.08765))
    }

    fn evaluate(
        config: &RiskConfiguration,
        account: &AccountState,
        open_count: usize,
        trades_today: u32,
    ) -> RiskDecision {
        RiskPolicy::evaluate(&eurusd_buy(), config, account, open_count, trades_today, noon())
    }

    #[test]
    fn test_accepts_with_default_levels() {
        let config = RiskConfiguration::default();
        let account = AccountState::default();

        let RiskDecision::Accept(admitted) = evaluate(&config, &account, 0, 0) else {
            panic!("expected acceptance");
        };

        assert_eq!(admitted.pair, "EURUSD");
        assert_eq!(admitted.stop_loss, dec!(1.08665));
        assert_eq!(admitted.take_profit, dec!(1.09015));
        assert_eq!(admitted.lot_size, dec!(0.01));
    }

    #[test]
    fn test_sell_levels_are_mirrored() {
        let config = RiskConfiguration::default();
        let account = AccountState::default();
        let candidate = SignalRequest::new("usd/jpy", Direction::Sell, dec!(151.435));

        let decision = RiskPolicy::evaluate(&candidate, &config, &account, 0, 0, noon());
        let RiskDecision::Accept(admitted) = decision else {
            panic!("expected acceptance");
        };

        assert_eq!(admitted.pair, "USDJPY");
        assert_eq!(admitted.stop_loss, dec!(151.535));
        assert_eq!(admitted.take_profit, dec!(151.185));
    }

    #[test]
    fn test_supplied_levels_are_kept() {
        let config = RiskConfiguration::default();
        let account = AccountState::default();
        let candidate = eurusd_buy()
            .with_stop_loss(dec!(1.0850))
            .with_take_profit(dec!(1.0950));

        let decision = RiskPolicy::evaluate(&candidate, &config, &account, 0, 0, noon());
        let RiskDecision::Accept(admitted) = decision else {
            panic!("expected acceptance");
        };

        assert_eq!(admitted.stop_loss, dec!(1.0850));
        assert_eq!(admitted.take_profit, dec!(1.0950));
    }

    #[test]
    fn test_rejects_pair_not_allowed() {
        let config = RiskConfiguration::default();
        let candidate = SignalRequest::new("XAUUSD", Direction::Buy, dec!(2300));

        let decision =
            RiskPolicy::evaluate(&candidate, &config, &AccountState::default(), 0, 0, noon());

        assert_eq!(
            decision.rejection(),
            Some(&RejectReason::PairNotAllowed {
                pair: "XAUUSD".into()
            })
        );
    }

    #[test]
    fn test_rejects_outside_trading_hours() {
        let config = RiskConfiguration::default();
        let evening = Utc.with_ymd_and_hms(2024, 5, 15, 17, 0, 0).unwrap();

        let decision = RiskPolicy::evaluate(
            &eurusd_buy(),
            &config,
            &AccountState::default(),
            0,
            0,
            evening,
        );

        assert_eq!(decision.rejection(), Some(&RejectReason::OutsideTradingHours));
    }

    #[test]
    fn test_disabled_trading_hours_accept_any_time() {
        let config = RiskConfiguration {
            trading_hours: TradingHours {
                enabled: false,
                ..TradingHours::default()
            },
            ..RiskConfiguration::default()
        };
        let night = Utc.with_ymd_and_hms(2024, 5, 15, 2, 0, 0).unwrap();

        let decision =
            RiskPolicy::evaluate(&eurusd_buy(), &config, &AccountState::default(), 0, 0, night);

        assert!(decision.is_accepted());
    }

    #[test]
    fn test_daily_trade_limit() {
        let config = RiskConfiguration::default()
            .apply(&RiskConfigurationUpdate {
                max_daily_trades: Some(2),
                ..Default::default()
            })
            .unwrap();
        let account = AccountState::default();

        assert!(evaluate(&config, &account, 0, 1).is_accepted());
        assert_eq!(
            evaluate(&config, &account, 0, 2).rejection(),
            Some(&RejectReason::DailyTradeLimitReached { taken: 2, limit: 2 })
        );
    }

    #[test]
    fn test_simultaneous_trade_limit_boundary() {
        let config = RiskConfiguration::default();
        let account = AccountState::default();
        let limit = config.max_simultaneous_trades as usize;

        assert!(evaluate(&config, &account, limit - 1, 0).is_accepted());
        assert!(matches!(
            evaluate(&config, &account, limit, 0).rejection(),
            Some(RejectReason::SimultaneousTradeLimitReached { .. })
        ));
    }

    #[test]
    fn test_daily_loss_limit() {
        let config = RiskConfiguration {
            max_drawdown_percent: dec!(20),
            ..RiskConfiguration::default()
        };
        let mut account = AccountState::default();

        account.record_realized(dec!(-99.99)).unwrap();
        assert!(evaluate(&config, &account, 0, 0).is_accepted());

        account.record_realized(dec!(-0.01)).unwrap();
        assert!(matches!(
            evaluate(&config, &account, 0, 0).rejection(),
            Some(RejectReason::DailyLossLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_drawdown_limit() {
        let config = RiskConfiguration {
            max_daily_loss: dec!(100000),
            ..RiskConfiguration::default()
        };
        let mut account = AccountState::new(dec!(10000));

        account.record_realized(dec!(-499)).unwrap();
        assert!(evaluate(&config, &account, 0, 0).is_accepted());

        account.record_realized(dec!(-1)).unwrap();
        assert_eq!(
            evaluate(&config, &account, 0, 0).rejection(),
            Some(&RejectReason::DrawdownLimitExceeded {
                drawdown: dec!(5),
                limit: dec!(5),
            })
        );
    }

    #[test]
    fn test_first_failing_check_wins() {
        let config = RiskConfiguration::default();
        let mut account = AccountState::default();
        account.record_realized(dec!(-1000)).unwrap();

        // Daily trades, simultaneous trades, loss and drawdown all fail;
        // the daily trade limit is checked first.
        let decision = evaluate(&config, &account, 10, 10);
        assert!(matches!(
            decision.rejection(),
            Some(RejectReason::DailyTradeLimitReached { .. })
        ));
    }

    #[test]
    fn test_risk_based_sizing() {
        let config = RiskConfiguration::default();
        let account = AccountState::new(dec!(10000));
        let candidate = eurusd_buy().with_stop_loss(dec!(1.08565));

        // 1% of 10_000 = 100 risked over 20 pips at 10 per pip per lot.
        let decision = RiskPolicy::evaluate_sized(
            &candidate,
            &config,
            &account,
            0,
            0,
            noon(),
            PositionSizing::RiskBased {
                pip_value: dec!(10),
            },
        );
        let RiskDecision::Accept(admitted) = decision else {
            panic!("expected acceptance");
        };

        assert_eq!(admitted.lot_size, dec!(0.5));
    }

    #[test]
    fn test_risk_based_sizing_falls_back_on_zero_pip_value() {
        let config = RiskConfiguration::default();
        let decision = RiskPolicy::evaluate_sized(
            &eurusd_buy(),
            &config,
            &AccountState::default(),
            0,
            0,
            noon(),
            PositionSizing::RiskBased {
                pip_value: Decimal::ZERO,
            },
        );
        let RiskDecision::Accept(admitted) = decision else {
            panic!("expected acceptance");
        };

        assert_eq!(admitted.lot_size, config.fixed_lot_size);
    }

    fn risk_based(candidate: &SignalRequest, config: &RiskConfiguration, pip_value: Decimal) -> Lots {
        let decision = RiskPolicy::evaluate_sized(
            candidate,
            config,
            &AccountState::default(),
            0,
            0,
            noon(),
            PositionSizing::RiskBased { pip_value },
        );
        let RiskDecision::Accept(admitted) = decision else {
            panic!("expected acceptance, got {decision:?}");
        };
        admitted.lot_size
    }

    #[test]
    fn test_unrepresentable_default_level_is_invalid() {
        let config = RiskConfiguration {
            default_take_profit_pips: dec!(100000),
            ..RiskConfiguration::default()
        };
        let candidate =
            SignalRequest::new("EURUSD", Direction::Buy, Decimal::MAX).with_stop_loss(dec!(1));

        let decision =
            RiskPolicy::evaluate(&candidate, &config, &AccountState::default(), 0, 0, noon());

        assert!(!decision.is_accepted());
        assert_eq!(decision.rejection(), None);
        let RiskDecision::Invalid(err) = decision else {
            panic!("expected invalid, got {decision:?}");
        };
        assert_eq!(err.field, "take_profit");
    }

    #[test]
    fn test_huge_stop_distance_falls_back_to_fixed_lot() {
        let config = RiskConfiguration::default();
        let candidate = SignalRequest::new("EURUSD", Direction::Buy, Decimal::MAX)
            .with_stop_loss(dec!(1))
            .with_take_profit(Decimal::MAX);

        assert_eq!(
            risk_based(&candidate, &config, dec!(10)),
            config.fixed_lot_size
        );
    }

    #[test]
    fn test_tiny_pip_value_falls_back_to_fixed_lot() {
        let config = RiskConfiguration::default();
        let tiny = Decimal::new(1, 28);

        assert_eq!(
            risk_based(&eurusd_buy(), &config, tiny),
            config.fixed_lot_size
        );
    }

    #[test]
    fn test_zero_risk_percent_falls_back_to_fixed_lot() {
        let config = RiskConfiguration {
            risk_per_trade_percent: Decimal::ZERO,
            ..RiskConfiguration::default()
        };

        assert_eq!(
            risk_based(&eurusd_buy(), &config, dec!(10)),
            config.fixed_lot_size
        );
    }
}
