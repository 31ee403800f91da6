use chrono::{DateTime, Utc};
use mt5_wire::{
    AccountInfo, LastError, OrderCheckResult, OrderSendResult, Rate, SymbolInfo, TerminalInfo,
    TerminalVersion, Tick, TradeDeal, TradeOrder, TradePosition, TradeRequest,
    RES_E_INTERNAL_FAIL_CONNECT,
};

use crate::domain::models::{HistoryQuery, InitializeParams, LoginParams, OrderFilter};
use crate::ports::Terminal;

/// Stand-in used when no native terminal binding is linked into the build.
///
/// Every call fails with "No IPC connection", which lets both transports and
/// the lifecycle plumbing run (and be health-checked) on any host.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineTerminal;

impl OfflineTerminal {
    pub fn new() -> Self {
        Self
    }
}

impl Terminal for OfflineTerminal {
    fn initialize(&self, params: &InitializeParams) -> bool {
        tracing::warn!(path = %params.path, "No terminal binding available, initialize refused");
        false
    }

    fn shutdown(&self) {}

    fn login(&self, _params: &LoginParams) -> bool {
        false
    }

    fn last_error(&self) -> LastError {
        LastError::new(RES_E_INTERNAL_FAIL_CONNECT, "No IPC connection")
    }

    fn version(&self) -> Option<TerminalVersion> {
        None
    }

    fn account_info(&self) -> Option<AccountInfo> {
        None
    }

    fn terminal_info(&self) -> Option<TerminalInfo> {
        None
    }

    fn symbols_total(&self) -> Option<i64> {
        None
    }

    fn symbols_get(&self, _group: Option<String>) -> Option<Vec<SymbolInfo>> {
        None
    }

    fn symbol_info(&self, _symbol: &str) -> Option<SymbolInfo> {
        None
    }

    fn symbol_info_tick(&self, _symbol: &str) -> Option<Tick> {
        None
    }

    fn symbol_select(&self, _symbol: &str, _enable: bool) -> bool {
        false
    }

    fn order_send(&self, _request: &TradeRequest) -> Option<OrderSendResult> {
        None
    }

    fn order_check(&self, _request: &TradeRequest) -> Option<OrderCheckResult> {
        None
    }

    fn order_calc_margin(&self, _: i32, _: &str, _: f64, _: f64) -> Option<f64> {
        None
    }

    fn order_calc_profit(&self, _: i32, _: &str, _: f64, _: f64, _: f64) -> Option<f64> {
        None
    }

    fn orders_total(&self) -> Option<i64> {
        None
    }

    fn orders_get(&self, _filter: &OrderFilter) -> Option<Vec<TradeOrder>> {
        None
    }

    fn positions_total(&self) -> Option<i64> {
        None
    }

    fn positions_get(&self, _filter: &OrderFilter) -> Option<Vec<TradePosition>> {
        None
    }

    fn history_orders_total(&self, _: DateTime<Utc>, _: DateTime<Utc>) -> Option<i64> {
        None
    }

    fn history_orders_get(&self, _query: &HistoryQuery) -> Option<Vec<TradeOrder>> {
        None
    }

    fn history_deals_total(&self, _: DateTime<Utc>, _: DateTime<Utc>) -> Option<i64> {
        None
    }

    fn history_deals_get(&self, _query: &HistoryQuery) -> Option<Vec<TradeDeal>> {
        None
    }

    fn copy_rates_from(&self, _: &str, _: i32, _: DateTime<Utc>, _: u32) -> Option<Vec<Rate>> {
        None
    }

    fn copy_rates_from_pos(&self, _: &str, _: i32, _: u32, _: u32) -> Option<Vec<Rate>> {
        None
    }

    fn copy_rates_range(
        &self,
        _: &str,
        _: i32,
        _: DateTime<Utc>,
        _: DateTime<Utc>,
    ) -> Option<Vec<Rate>> {
        None
    }

    fn copy_ticks_from(&self, _: &str, _: DateTime<Utc>, _: u32, _: i32) -> Option<Vec<Tick>> {
        None
    }

    fn copy_ticks_range(
        &self,
        _: &str,
        _: DateTime<Utc>,
        _: DateTime<Utc>,
        _: i32,
    ) -> Option<Vec<Tick>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_call_reports_no_connection() {
        let terminal = OfflineTerminal::new();
        assert!(!terminal.initialize(&InitializeParams::default()));
        assert!(terminal.account_info().is_none());
        assert!(terminal.symbols_total().is_none());
        assert_eq!(terminal.last_error().code, -10004);
    }
}
