//! JSON-lines command feed.
//!
//! Stands in for the ingestion gateway and the execution venue: each input
//! line is one JSON command tagged by `op`, each output line the JSON
//! response to it. An optional `account` field routes the command to that
//! account's engine; without it the feed's default account is used.
//! Responses are tagged by `status`:
//!
//! ```text
//! {"op":"submit","pair":"EURUSD","direction":"BUY","entry_price":"1.08765"}
//! {"status":"ok","data":{"id":"…","status":"PENDING",…}}
//! {"op":"signals","account":"desk-2","active":true}
//! {"status":"ok","data":[]}
//! ```

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::adapter::notifier::{ActivityLog, ActivityQuery};
use crate::application::stats::DEFAULT_RECENT_TRADES;
use crate::application::{AccountRegistry, PositionSizing, SignalEngine, SignalFilter};
use crate::domain::{
    AccountId, AccountState, AccountStats, BotStatus, Direction, Price, RiskConfigurationUpdate,
    SignalId, SignalRequest, SignalStatus, TradeSignal,
};
use crate::error::{Result, StoreError, SubmitError};

/// One input line: a command and the account it targets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub account: Option<AccountId>,
    #[serde(flatten)]
    pub command: Command,
}

/// A command read from the feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    /// Candidate signal from the ingestion gateway.
    Submit(SubmitArgs),
    /// Venue confirmed the fill.
    Fill { id: SignalId },
    /// Venue closed the position.
    Close { id: SignalId, profit: Decimal },
    Cancel { id: SignalId },
    UpdateRisk(RiskConfigurationUpdate),
    /// Set the toggle, or flip it when `enabled` is absent.
    AutoTrading {
        #[serde(default)]
        enabled: Option<bool>,
    },
    /// Connect with credentials, or disconnect when they are absent.
    Telegram {
        #[serde(default)]
        bot_token: Option<String>,
        #[serde(default)]
        chat_id: Option<String>,
    },
    StartDay,
    Stats {
        #[serde(default)]
        recent: Option<usize>,
    },
    Signals(SignalsArgs),
    /// Shared activity log; not scoped to an account.
    Activity(ActivityQuery),
    /// IDs of the accounts opened so far.
    Accounts,
}

/// Payload of a `submit` command.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmitArgs {
    pub pair: String,
    pub direction: Direction,
    pub entry_price: Price,
    #[serde(default)]
    pub stop_loss: Option<Price>,
    #[serde(default)]
    pub take_profit: Option<Price>,
    /// Account-currency value of one pip per lot; enables risk-based sizing.
    #[serde(default)]
    pub pip_value: Option<Decimal>,
}

impl SubmitArgs {
    fn into_parts(self) -> (SignalRequest, PositionSizing) {
        let sizing = self
            .pip_value
            .map_or(PositionSizing::Fixed, |pip_value| PositionSizing::RiskBased {
                pip_value,
            });
        let request = SignalRequest {
            pair: self.pair,
            direction: self.direction,
            entry_price: self.entry_price,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
        };
        (request, sizing)
    }
}

/// Payload of a `signals` command.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SignalsArgs {
    pub status: Option<SignalStatus>,
    /// Only PENDING and EXECUTED signals.
    pub active: bool,
}

impl SignalsArgs {
    fn filter(&self) -> SignalFilter {
        match (self.active, self.status) {
            (true, _) => SignalFilter::Active,
            (false, Some(status)) => SignalFilter::Status(status),
            (false, None) => SignalFilter::All,
        }
    }
}

/// One response line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
    /// The risk policy refused a candidate.
    Rejected { code: &'static str, reason: String },
    Error { kind: &'static str, message: String },
}

impl Response {
    fn ok<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(data) => Self::Ok { data: Some(data) },
            Err(e) => Self::error("encode", e),
        }
    }

    const fn empty() -> Self {
        Self::Ok { data: None }
    }

    fn error(kind: &'static str, message: impl ToString) -> Self {
        Self::Error {
            kind,
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

#[derive(Serialize)]
struct StatsView {
    bot_status: BotStatus,
    account: AccountState,
    trades_today: u32,
    stats: AccountStats,
    recent_trades: Vec<TradeSignal>,
}

/// Routes feed commands to account engines.
pub struct Feed<'a> {
    accounts: &'a AccountRegistry,
    default_account: &'a AccountId,
    activity: &'a ActivityLog,
}

impl<'a> Feed<'a> {
    #[must_use]
    pub const fn new(
        accounts: &'a AccountRegistry,
        default_account: &'a AccountId,
        activity: &'a ActivityLog,
    ) -> Self {
        Self {
            accounts,
            default_account,
            activity,
        }
    }

    /// Execute one request.
    ///
    /// Unknown accounts are opened when the registry has a factory and
    /// refused otherwise.
    pub fn apply(&self, request: Request) -> Response {
        match request.command {
            Command::Accounts => Response::ok(&self.accounts.account_ids()),
            Command::Activity(query) => Response::ok(&self.activity.entries(&query)),
            command => {
                let id = request
                    .account
                    .unwrap_or_else(|| self.default_account.clone());
                match self.accounts.open(&id) {
                    Some(engine) => apply_to_engine(&engine, command),
                    None => {
                        warn!(account = %id, "Command for unknown account");
                        Response::error("account", format!("unknown account {id}"))
                    }
                }
            }
        }
    }

    /// Parse one input line into a response. Blank lines yield `None`.
    pub fn handle_line(&self, line: &str) -> Option<Response> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => {
                debug!(?request, "Command received");
                self.apply(request)
            }
            Err(e) => {
                warn!(error = %e, "Unparseable command");
                Response::error("parse", e)
            }
        };
        Some(response)
    }

    /// Serve commands from `reader` until end of input.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(account = %self.default_account, "Command feed started");

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let Some(response) = self.handle_line(&line) else {
                continue;
            };

            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }

        info!("Command feed closed");
        Ok(())
    }
}

/// Execute an account-scoped command against `engine`.
fn apply_to_engine(engine: &SignalEngine, command: Command) -> Response {
    match command {
        Command::Submit(args) => {
            let (request, sizing) = args.into_parts();
            match engine.admit(request, sizing, Utc::now()) {
                Ok(signal) => Response::ok(&signal),
                Err(SubmitError::Rejected(reason)) => Response::Rejected {
                    code: reason.code(),
                    reason: reason.to_string(),
                },
                Err(e @ SubmitError::InvalidSignal { .. }) => Response::error("invalid_signal", e),
            }
        }
        Command::Fill { id } => store_result(engine.report_fill(&id)),
        Command::Close { id, profit } => store_result(engine.report_close(&id, profit)),
        Command::Cancel { id } => store_result(engine.cancel_signal(&id)),
        Command::UpdateRisk(update) => match engine.update_risk_configuration(&update) {
            Ok(config) => Response::ok(&config),
            Err(e) => Response::error("validation", e),
        },
        Command::AutoTrading { enabled } => {
            let status = match enabled {
                Some(enabled) => engine.set_auto_trading(enabled),
                None => engine.toggle_auto_trading(),
            };
            Response::ok(&status)
        }
        Command::Telegram { bot_token, chat_id } => match (bot_token, chat_id) {
            (None, None) => {
                engine.disconnect_telegram();
                Response::ok(&engine.telegram_link())
            }
            (token, chat) => match engine
                .connect_telegram(token.unwrap_or_default(), chat.unwrap_or_default())
            {
                Ok(link) => Response::ok(&link),
                Err(e) => Response::error("validation", e),
            },
        },
        Command::StartDay => {
            engine.start_trading_day();
            Response::empty()
        }
        Command::Stats { recent } => Response::ok(&StatsView {
            bot_status: engine.bot_status(),
            account: engine.account(),
            trades_today: engine.trades_today(),
            stats: engine.stats(),
            recent_trades: engine.recent_trades(recent.unwrap_or(DEFAULT_RECENT_TRADES)),
        }),
        Command::Signals(args) => Response::ok(&engine.signals(args.filter())),
        Command::Activity(_) | Command::Accounts => {
            Response::error("internal", "command is not scoped to an account")
        }
    }
}

fn store_result(result: std::result::Result<TradeSignal, StoreError>) -> Response {
    match result {
        Ok(signal) => Response::ok(&signal),
        Err(e) => Response::error("store", e),
    }
}
