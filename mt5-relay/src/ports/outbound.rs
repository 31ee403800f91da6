use chrono::{DateTime, Utc};
use mt5_wire::{
    AccountInfo, LastError, OrderCheckResult, OrderSendResult, Rate, SymbolInfo, TerminalInfo,
    TerminalVersion, Tick, TradeDeal, TradeOrder, TradePosition, TradeRequest,
};
use std::time::Duration;

use crate::domain::models::{Credentials, HistoryQuery, InitializeParams, LoginParams, OrderFilter};

/// Terminal capability interface.
///
/// Mirrors the vendor binding one-to-one. Calls block until the terminal
/// answers. A failing call returns `None` (or `false`); the reason is then
/// available through [`Terminal::last_error`].
#[cfg_attr(test, mockall::automock)]
pub trait Terminal: Send + Sync {
    fn initialize(&self, params: &InitializeParams) -> bool;
    fn shutdown(&self);
    fn login(&self, params: &LoginParams) -> bool;
    fn last_error(&self) -> LastError;
    fn version(&self) -> Option<TerminalVersion>;

    fn account_info(&self) -> Option<AccountInfo>;
    fn terminal_info(&self) -> Option<TerminalInfo>;

    fn symbols_total(&self) -> Option<i64>;
    fn symbols_get(&self, group: Option<String>) -> Option<Vec<SymbolInfo>>;
    fn symbol_info(&self, symbol: &str) -> Option<SymbolInfo>;
    fn symbol_info_tick(&self, symbol: &str) -> Option<Tick>;
    fn symbol_select(&self, symbol: &str, enable: bool) -> bool;

    fn order_send(&self, request: &TradeRequest) -> Option<OrderSendResult>;
    fn order_check(&self, request: &TradeRequest) -> Option<OrderCheckResult>;
    fn order_calc_margin(&self, action: i32, symbol: &str, volume: f64, price: f64)
        -> Option<f64>;
    fn order_calc_profit(
        &self,
        action: i32,
        symbol: &str,
        volume: f64,
        price_open: f64,
        price_close: f64,
    ) -> Option<f64>;

    fn orders_total(&self) -> Option<i64>;
    fn orders_get(&self, filter: &OrderFilter) -> Option<Vec<TradeOrder>>;
    fn positions_total(&self) -> Option<i64>;
    fn positions_get(&self, filter: &OrderFilter) -> Option<Vec<TradePosition>>;

    fn history_orders_total(&self, date_from: DateTime<Utc>, date_to: DateTime<Utc>)
        -> Option<i64>;
    fn history_orders_get(&self, query: &HistoryQuery) -> Option<Vec<TradeOrder>>;
    fn history_deals_total(&self, date_from: DateTime<Utc>, date_to: DateTime<Utc>)
        -> Option<i64>;
    fn history_deals_get(&self, query: &HistoryQuery) -> Option<Vec<TradeDeal>>;

    fn copy_rates_from(
        &self,
        symbol: &str,
        timeframe: i32,
        date_from: DateTime<Utc>,
        count: u32,
    ) -> Option<Vec<Rate>>;
    fn copy_rates_from_pos(
        &self,
        symbol: &str,
        timeframe: i32,
        start_pos: u32,
        count: u32,
    ) -> Option<Vec<Rate>>;
    fn copy_rates_range(
        &self,
        symbol: &str,
        timeframe: i32,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
    ) -> Option<Vec<Rate>>;
    fn copy_ticks_from(
        &self,
        symbol: &str,
        date_from: DateTime<Utc>,
        count: u32,
        flags: i32,
    ) -> Option<Vec<Tick>>;
    fn copy_ticks_range(
        &self,
        symbol: &str,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
        flags: i32,
    ) -> Option<Vec<Tick>>;
}

/// Advisory filesystem and process actions around a terminal (re)launch.
///
/// Every method is best-effort: failures are logged by the implementation and
/// never reported to the caller.
#[cfg_attr(test, mockall::automock)]
pub trait Housekeeping: Send + Sync {
    /// Write credentials into the terminal configuration and re-enable
    /// algorithmic trading
    fn prepare_config(&self, credentials: &Credentials);
    /// Delete the known-accounts artifact everywhere it may live
    fn purge_accounts(&self);
    /// Force-terminate the terminal process, then wait for the OS to settle
    fn kill_and_settle(&self);
    /// Sleep between lifecycle steps
    fn pause(&self, duration: Duration);
}
