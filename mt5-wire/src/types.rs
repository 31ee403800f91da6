// Location: mt5-wire/src/types.rs
// Purpose: Record types exchanged with the terminal capability interface
// Why: One typed definition per record kind, shared by server, client and tests
//
// Field names follow the terminal binding verbatim so that a record flattened
// to a map carries the same keys callers already use.

use serde::{Deserialize, Serialize};

/// Diagnostic retained by the capability interface after a failing call.
/// Travels as the two-element array `[code, message]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i32, String)", into = "(i32, String)")]
pub struct LastError {
    pub code: i32,
    pub message: String,
}

impl LastError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<(i32, String)> for LastError {
    fn from((code, message): (i32, String)) -> Self {
        Self { code, message }
    }
}

impl From<LastError> for (i32, String) {
    fn from(err: LastError) -> Self {
        (err.code, err.message)
    }
}

impl std::fmt::Display for LastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, '{}')", self.code, self.message)
    }
}

/// Terminal version triple: `[terminal_version, build, release_date]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i32, i32, String)", into = "(i32, i32, String)")]
pub struct TerminalVersion {
    pub version: i32,
    pub build: i32,
    pub release_date: String,
}

impl From<(i32, i32, String)> for TerminalVersion {
    fn from((version, build, release_date): (i32, i32, String)) -> Self {
        Self {
            version,
            build,
            release_date,
        }
    }
}

impl From<TerminalVersion> for (i32, i32, String) {
    fn from(v: TerminalVersion) -> Self {
        (v.version, v.build, v.release_date)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub login: i64,
    pub trade_mode: i32,
    pub leverage: i64,
    pub limit_orders: i32,
    pub margin_so_mode: i32,
    pub trade_allowed: bool,
    pub trade_expert: bool,
    pub margin_mode: i32,
    pub currency_digits: i32,
    pub fifo_close: bool,
    pub balance: f64,
    pub credit: f64,
    pub profit: f64,
    pub equity: f64,
    pub margin: f64,
    pub margin_free: f64,
    pub margin_level: f64,
    pub margin_so_call: f64,
    pub margin_so_so: f64,
    pub margin_initial: f64,
    pub margin_maintenance: f64,
    pub assets: f64,
    pub liabilities: f64,
    pub commission_blocked: f64,
    pub name: String,
    pub server: String,
    pub currency: String,
    pub company: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerminalInfo {
    pub community_account: bool,
    pub community_connection: bool,
    pub connected: bool,
    pub dlls_allowed: bool,
    /// False when the terminal has disabled algorithmic trading, e.g. after
    /// it detected an account change
    pub trade_allowed: bool,
    pub tradeapi_disabled: bool,
    pub email_enabled: bool,
    pub ftp_enabled: bool,
    pub notifications_enabled: bool,
    pub mqid: bool,
    pub build: i32,
    pub maxbars: i32,
    pub codepage: i32,
    pub ping_last: i64,
    pub community_balance: f64,
    pub retransmission: f64,
    pub company: String,
    pub name: String,
    pub language: String,
    pub path: String,
    pub data_path: String,
    pub commondata_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub custom: bool,
    pub chart_mode: i32,
    pub select: bool,
    pub visible: bool,
    pub session_deals: i64,
    pub session_buy_orders: i64,
    pub session_sell_orders: i64,
    pub volume: i64,
    pub volumehigh: i64,
    pub volumelow: i64,
    pub time: i64,
    pub digits: i32,
    pub spread: i32,
    pub spread_float: bool,
    pub ticks_bookdepth: i32,
    pub trade_calc_mode: i32,
    pub trade_mode: i32,
    pub start_time: i64,
    pub expiration_time: i64,
    pub trade_stops_level: i32,
    pub trade_freeze_level: i32,
    pub trade_exemode: i32,
    pub swap_mode: i32,
    pub swap_rollover3days: i32,
    pub expiration_mode: i32,
    pub filling_mode: i32,
    pub order_mode: i32,
    pub bid: f64,
    pub bidhigh: f64,
    pub bidlow: f64,
    pub ask: f64,
    pub askhigh: f64,
    pub asklow: f64,
    pub last: f64,
    pub lasthigh: f64,
    pub lastlow: f64,
    pub volume_real: f64,
    pub point: f64,
    pub trade_tick_value: f64,
    pub trade_tick_value_profit: f64,
    pub trade_tick_value_loss: f64,
    pub trade_tick_size: f64,
    pub trade_contract_size: f64,
    pub volume_min: f64,
    pub volume_max: f64,
    pub volume_step: f64,
    pub volume_limit: f64,
    pub swap_long: f64,
    pub swap_short: f64,
    pub margin_initial: f64,
    pub margin_maintenance: f64,
    pub currency_base: String,
    pub currency_profit: String,
    pub currency_margin: String,
    pub bank: String,
    pub description: String,
    pub exchange: String,
    pub formula: String,
    pub isin: String,
    pub name: String,
    pub page: String,
    pub path: String,
}

/// Last tick of a symbol; also the element type of tick series
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub time: i64,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub volume: u64,
    pub time_msc: i64,
    pub flags: u32,
    pub volume_real: f64,
}

/// One bar of a rate series
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub tick_volume: u64,
    pub spread: i32,
    pub real_volume: u64,
}

/// Pending or historical order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeOrder {
    pub ticket: u64,
    pub time_setup: i64,
    pub time_setup_msc: i64,
    pub time_done: i64,
    pub time_done_msc: i64,
    pub time_expiration: i64,
    #[serde(rename = "type")]
    pub order_type: i32,
    pub type_time: i32,
    pub type_filling: i32,
    pub state: i32,
    pub magic: i64,
    pub position_id: u64,
    pub position_by_id: u64,
    pub reason: i32,
    pub volume_initial: f64,
    pub volume_current: f64,
    pub price_open: f64,
    pub sl: f64,
    pub tp: f64,
    pub price_current: f64,
    pub price_stoplimit: f64,
    pub symbol: String,
    pub comment: String,
    pub external_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradePosition {
    pub ticket: u64,
    pub time: i64,
    pub time_msc: i64,
    pub time_update: i64,
    pub time_update_msc: i64,
    #[serde(rename = "type")]
    pub position_type: i32,
    pub magic: i64,
    pub identifier: u64,
    pub reason: i32,
    pub volume: f64,
    pub price_open: f64,
    pub sl: f64,
    pub tp: f64,
    pub price_current: f64,
    pub swap: f64,
    pub profit: f64,
    pub symbol: String,
    pub comment: String,
    pub external_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeDeal {
    pub ticket: u64,
    pub order: u64,
    pub time: i64,
    pub time_msc: i64,
    #[serde(rename = "type")]
    pub deal_type: i32,
    pub entry: i32,
    pub magic: i64,
    pub position_id: u64,
    pub reason: i32,
    pub volume: f64,
    pub price: f64,
    pub commission: f64,
    pub swap: f64,
    pub profit: f64,
    pub fee: f64,
    pub symbol: String,
    pub comment: String,
    pub external_id: String,
}

/// Trade request passed through to `order_send` / `order_check`.
/// Every field is optional on the wire; absent fields take the terminal's
/// zero defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeRequest {
    pub action: i32,
    pub magic: i64,
    pub order: u64,
    pub symbol: String,
    pub volume: f64,
    pub price: f64,
    pub stoplimit: f64,
    pub sl: f64,
    pub tp: f64,
    pub deviation: u64,
    #[serde(rename = "type")]
    pub order_type: i32,
    pub type_filling: i32,
    pub type_time: i32,
    pub expiration: i64,
    pub comment: String,
    pub position: u64,
    pub position_by: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderSendResult {
    pub retcode: u32,
    pub deal: u64,
    pub order: u64,
    pub volume: f64,
    pub price: f64,
    pub bid: f64,
    pub ask: f64,
    pub comment: String,
    pub request_id: u32,
    pub retcode_external: i32,
    pub request: TradeRequest,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderCheckResult {
    pub retcode: u32,
    pub balance: f64,
    pub equity: f64,
    pub profit: f64,
    pub margin: f64,
    pub margin_free: f64,
    pub margin_level: f64,
    pub comment: String,
    pub request: TradeRequest,
}
