// Location: mt5-relay/src/application/dispatcher.rs
// Purpose: Map operation names onto terminal calls and normalize the results
// Why: Both transports are thin codecs over this one table, so identical input
//      yields identical results regardless of the transport.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::str::FromStr;
use std::sync::Arc;

use mt5_wire::npy::{self, ArrayRecord};
use mt5_wire::TradeRequest;

use super::args::Args;
use super::errors::DispatchError;
use super::records::{to_record, to_records};
use super::session::Session;
use crate::domain::models::{HistoryQuery, InitializeParams, LoginParams, OrderFilter};
use crate::ports::Terminal;

macro_rules! operations {
    ($($variant:ident => $name:literal,)+) => {
        /// Every operation exposed to remote callers
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Operation {
            $($variant,)+
        }

        impl Operation {
            pub const ALL: &'static [Operation] = &[$(Operation::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Operation::$variant => $name,)+
                }
            }
        }

        impl FromStr for Operation {
            type Err = DispatchError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Operation::$variant),)+
                    other => Err(DispatchError::UnknownOperation(other.to_string())),
                }
            }
        }
    };
}

operations! {
    Initialize => "initialize",
    Shutdown => "shutdown",
    Login => "login",
    LastError => "last_error",
    Version => "version",
    AccountInfo => "account_info",
    TerminalInfo => "terminal_info",
    SymbolsTotal => "symbols_total",
    SymbolsGet => "symbols_get",
    SymbolInfo => "symbol_info",
    SymbolInfoTick => "symbol_info_tick",
    SymbolSelect => "symbol_select",
    OrderSend => "order_send",
    OrderCheck => "order_check",
    OrderCalcMargin => "order_calc_margin",
    OrderCalcProfit => "order_calc_profit",
    OrdersTotal => "orders_total",
    OrdersGet => "orders_get",
    PositionsTotal => "positions_total",
    PositionsGet => "positions_get",
    HistoryOrdersTotal => "history_orders_total",
    HistoryOrdersGet => "history_orders_get",
    HistoryDealsTotal => "history_deals_total",
    HistoryDealsGet => "history_deals_get",
    CopyRatesFrom => "copy_rates_from",
    CopyRatesFromPos => "copy_rates_from_pos",
    CopyRatesRange => "copy_rates_range",
    CopyTicksFrom => "copy_ticks_from",
    CopyTicksRange => "copy_ticks_range",
    SessionState => "session_state",
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized result of one operation
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Structured result, including `{error: true, last_error}` payloads
    Json(Value),
    /// Time series as a `.npy` array
    Array(Vec<u8>),
}

pub struct Dispatcher {
    session: Arc<Session>,
    default_terminal_path: String,
}

impl Dispatcher {
    pub fn new(session: Arc<Session>, default_terminal_path: impl Into<String>) -> Self {
        Self {
            session,
            default_terminal_path: default_terminal_path.into(),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Resolve `name` and dispatch it
    pub fn dispatch_named(&self, name: &str, args: &Map<String, Value>) -> Result<Reply, DispatchError> {
        self.dispatch(name.parse()?, args)
    }

    pub fn dispatch(&self, op: Operation, args: &Map<String, Value>) -> Result<Reply, DispatchError> {
        let args = Args::new(args);
        tracing::debug!(operation = %op, "Dispatching");

        match op {
            Operation::Initialize => self.initialize(args),
            Operation::Shutdown => {
                self.session.shutdown();
                Ok(Reply::Json(json!({ "ok": true })))
            }
            Operation::Login => self.login(args),
            Operation::LastError => {
                let err = self.session.query(|t| t.last_error());
                Ok(Reply::Json(json!({ "code": err.code, "message": err.message })))
            }
            Operation::Version => self
                .session
                .query(|t| scalar(t, "version", t.version())),
            Operation::AccountInfo => self.session.query(|t| record(t, t.account_info())),
            Operation::TerminalInfo => self.session.query(|t| record(t, t.terminal_info())),

            Operation::SymbolsTotal => self
                .session
                .query(|t| scalar(t, "total", t.symbols_total())),
            Operation::SymbolsGet => {
                let group = args.opt_str("group")?;
                self.session.query(|t| records(t, t.symbols_get(group)))
            }
            Operation::SymbolInfo => {
                let symbol = args.str("symbol")?;
                self.session.query(|t| record(t, t.symbol_info(&symbol)))
            }
            Operation::SymbolInfoTick => {
                let symbol = args.str("symbol")?;
                self.session.query(|t| record(t, t.symbol_info_tick(&symbol)))
            }
            Operation::SymbolSelect => {
                let symbol = args.str("symbol")?;
                let enable = args.opt_bool("enable")?.unwrap_or(true);
                Ok(self.session.query(|t| {
                    if t.symbol_select(&symbol, enable) {
                        Reply::Json(json!({ "ok": true }))
                    } else {
                        Reply::Json(json!({ "ok": false, "last_error": t.last_error() }))
                    }
                }))
            }

            Operation::OrderSend => {
                let request = trade_request(args)?;
                self.session.query(|t| record(t, t.order_send(&request)))
            }
            Operation::OrderCheck => {
                let request = trade_request(args)?;
                self.session.query(|t| record(t, t.order_check(&request)))
            }
            Operation::OrderCalcMargin => {
                let action = args.i32("action")?;
                let symbol = args.str("symbol")?;
                let volume = args.f64("volume")?;
                let price = args.f64("price")?;
                self.session.query(|t| {
                    scalar(t, "margin", t.order_calc_margin(action, &symbol, volume, price))
                })
            }
            Operation::OrderCalcProfit => {
                let action = args.i32("action")?;
                let symbol = args.str("symbol")?;
                let volume = args.f64("volume")?;
                let price_open = args.f64("price_open")?;
                let price_close = args.f64("price_close")?;
                self.session.query(|t| {
                    scalar(
                        t,
                        "profit",
                        t.order_calc_profit(action, &symbol, volume, price_open, price_close),
                    )
                })
            }

            Operation::OrdersTotal => self
                .session
                .query(|t| scalar(t, "total", t.orders_total())),
            Operation::OrdersGet => {
                let filter = order_filter(args)?;
                self.session.query(|t| records(t, t.orders_get(&filter)))
            }
            Operation::PositionsTotal => self
                .session
                .query(|t| scalar(t, "total", t.positions_total())),
            Operation::PositionsGet => {
                let filter = order_filter(args)?;
                self.session.query(|t| records(t, t.positions_get(&filter)))
            }

            Operation::HistoryOrdersTotal => {
                let (from, to) = (args.time("date_from")?, args.time("date_to")?);
                self.session
                    .query(|t| scalar(t, "total", t.history_orders_total(from, to)))
            }
            Operation::HistoryOrdersGet => {
                let query = history_query(args)?;
                self.session.query(|t| records(t, t.history_orders_get(&query)))
            }
            Operation::HistoryDealsTotal => {
                let (from, to) = (args.time("date_from")?, args.time("date_to")?);
                self.session
                    .query(|t| scalar(t, "total", t.history_deals_total(from, to)))
            }
            Operation::HistoryDealsGet => {
                let query = history_query(args)?;
                self.session.query(|t| records(t, t.history_deals_get(&query)))
            }

            Operation::CopyRatesFrom => {
                let symbol = args.str("symbol")?;
                let timeframe = args.i32("timeframe")?;
                let from = args.time("date_from")?;
                let count = args.u32("count")?;
                Ok(self.session.query(|t| {
                    array(t, t.copy_rates_from(&symbol, timeframe, from, count))
                }))
            }
            Operation::CopyRatesFromPos => {
                let symbol = args.str("symbol")?;
                let timeframe = args.i32("timeframe")?;
                let start_pos = args.u32("start_pos")?;
                let count = args.u32("count")?;
                Ok(self.session.query(|t| {
                    array(t, t.copy_rates_from_pos(&symbol, timeframe, start_pos, count))
                }))
            }
            Operation::CopyRatesRange => {
                let symbol = args.str("symbol")?;
                let timeframe = args.i32("timeframe")?;
                let from = args.time("date_from")?;
                let to = args.time("date_to")?;
                Ok(self
                    .session
                    .query(|t| array(t, t.copy_rates_range(&symbol, timeframe, from, to))))
            }
            Operation::CopyTicksFrom => {
                let symbol = args.str("symbol")?;
                let from = args.time("date_from")?;
                let count = args.u32("count")?;
                let flags = args.i32("flags")?;
                Ok(self
                    .session
                    .query(|t| array(t, t.copy_ticks_from(&symbol, from, count, flags))))
            }
            Operation::CopyTicksRange => {
                let symbol = args.str("symbol")?;
                let from = args.time("date_from")?;
                let to = args.time("date_to")?;
                let flags = args.i32("flags")?;
                Ok(self
                    .session
                    .query(|t| array(t, t.copy_ticks_range(&symbol, from, to, flags))))
            }

            Operation::SessionState => {
                Ok(Reply::Json(json!({ "state": self.session.state() })))
            }
        }
    }

    fn initialize(&self, args: Args<'_>) -> Result<Reply, DispatchError> {
        let params = InitializeParams {
            path: args
                .opt_str("path")?
                .unwrap_or_else(|| self.default_terminal_path.clone()),
            login: args.opt_i64("login")?,
            password: args.opt_str("password")?,
            server: args.opt_str("server")?,
            timeout: args.opt_u64("timeout")?,
            portable: args.opt_bool("portable")?,
        };

        let outcome = self.session.ensure(&params);
        Ok(Reply::Json(if outcome.ok {
            json!({ "ok": true })
        } else {
            json!({ "ok": false, "last_error": outcome.last_error })
        }))
    }

    fn login(&self, args: Args<'_>) -> Result<Reply, DispatchError> {
        let params = LoginParams {
            login: args.i64("login")?,
            password: args.opt_str("password")?,
            server: args.opt_str("server")?,
            timeout: args.opt_u64("timeout")?,
        };

        Ok(Reply::Json(match self.session.login(&params) {
            Ok(()) => json!({ "ok": true }),
            Err(err) => json!({ "ok": false, "last_error": err }),
        }))
    }
}

/// `{error: true, last_error: [code, message]}` for a failed terminal call
fn failure(terminal: &dyn Terminal) -> Value {
    json!({ "error": true, "last_error": terminal.last_error() })
}

fn record<T: Serialize>(terminal: &dyn Terminal, result: Option<T>) -> Result<Reply, DispatchError> {
    match result {
        Some(value) => Ok(Reply::Json(to_record(&value)?)),
        None => Ok(Reply::Json(failure(terminal))),
    }
}

fn records<T: Serialize>(
    terminal: &dyn Terminal,
    result: Option<Vec<T>>,
) -> Result<Reply, DispatchError> {
    match result {
        Some(values) => Ok(Reply::Json(to_records(&values)?)),
        None => Ok(Reply::Json(failure(terminal))),
    }
}

fn scalar<T: Serialize>(
    terminal: &dyn Terminal,
    key: &str,
    result: Option<T>,
) -> Result<Reply, DispatchError> {
    match result {
        Some(value) => {
            let mut map = Map::new();
            map.insert(key.to_string(), to_record(&value)?);
            Ok(Reply::Json(Value::Object(map)))
        }
        None => Ok(Reply::Json(failure(terminal))),
    }
}

fn array<T: ArrayRecord>(terminal: &dyn Terminal, result: Option<Vec<T>>) -> Reply {
    match result {
        Some(values) => Reply::Array(npy::encode(&values)),
        None => Reply::Json(failure(terminal)),
    }
}

/// Trade request from `request`, or from the body itself when absent
fn trade_request(args: Args<'_>) -> Result<TradeRequest, DispatchError> {
    let source = match args.get("request") {
        Some(Value::Object(request)) => request.clone(),
        Some(_) => return Err(DispatchError::invalid("request", "expected an object")),
        None => args.map().clone(),
    };
    serde_json::from_value(Value::Object(source))
        .map_err(|e| DispatchError::invalid("request", e.to_string()))
}

fn order_filter(args: Args<'_>) -> Result<OrderFilter, DispatchError> {
    Ok(OrderFilter {
        symbol: args.opt_str("symbol")?,
        group: args.opt_str("group")?,
        ticket: args.opt_u64("ticket")?,
    })
}

fn history_query(args: Args<'_>) -> Result<HistoryQuery, DispatchError> {
    Ok(HistoryQuery {
        date_from: args.time("date_from")?,
        date_to: args.time("date_to")?,
        group: args.opt_str("group")?,
        ticket: args.opt_u64("ticket")?,
        position: args.opt_u64("position")?,
    })
}
