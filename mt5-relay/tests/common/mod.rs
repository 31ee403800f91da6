// mt5-relay/tests/common/mod.rs
//
// Scripted terminal and recording housekeeping shared by the integration
// tests. Both append to one event log so tests can assert the exact order of
// lifecycle steps across the two ports.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mt5_relay::application::{Dispatcher, Session};
use mt5_relay::domain::models::{
    Credentials, HistoryQuery, InitializeParams, LoginParams, OrderFilter,
};
use mt5_relay::ports::{Housekeeping, Terminal};
use mt5_wire::{
    AccountInfo, LastError, OrderCheckResult, OrderSendResult, Rate, SymbolInfo, TerminalInfo,
    TerminalVersion, Tick, TradeDeal, TradeOrder, TradePosition, TradeRequest,
    RES_E_INTERNAL_FAIL_CONNECT, RES_S_OK,
};

pub const TERMINAL_PATH: &str = r"C:\Program Files\MetaTrader 5\terminal64.exe";

pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Terminal double driven by per-call scripts.
///
/// `initialize` pops the next scripted outcome (success once the script is
/// exhausted); `terminal_info` pops the next trade-allowed flag (the last
/// one sticks). Data queries answer only while connected.
pub struct StubTerminal {
    log: EventLog,
    init_script: Mutex<VecDeque<Result<(), LastError>>>,
    trade_script: Mutex<VecDeque<bool>>,
    trade_allowed: AtomicBool,
    connected: AtomicBool,
    last_error: Mutex<LastError>,
}

impl StubTerminal {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            init_script: Mutex::new(VecDeque::new()),
            trade_script: Mutex::new(VecDeque::new()),
            trade_allowed: AtomicBool::new(true),
            connected: AtomicBool::new(false),
            last_error: Mutex::new(LastError::new(RES_S_OK, "Success")),
        }
    }

    pub fn init_results(self, results: impl IntoIterator<Item = Result<(), LastError>>) -> Self {
        self.init_script.lock().unwrap().extend(results);
        self
    }

    pub fn trade_allowed(self, flags: impl IntoIterator<Item = bool>) -> Self {
        self.trade_script.lock().unwrap().extend(flags);
        self
    }

    pub fn connected(self) -> Self {
        self.connected.store(true, Ordering::SeqCst);
        self
    }

    fn record(&self, event: &str) {
        self.log.lock().unwrap().push(event.to_string());
    }

    fn fail(&self, err: LastError) {
        *self.last_error.lock().unwrap() = err;
    }

    fn answer<T>(&self, value: impl FnOnce() -> T) -> Option<T> {
        if self.connected.load(Ordering::SeqCst) {
            self.fail(LastError::new(RES_S_OK, "Success"));
            Some(value())
        } else {
            self.fail(LastError::new(RES_E_INTERNAL_FAIL_CONNECT, "No IPC connection"));
            None
        }
    }
}

pub fn sample_rates(count: u32) -> Vec<Rate> {
    (0..count)
        .map(|i| Rate {
            time: 1_704_067_200 + i64::from(i) * 60,
            open: 1.1 + f64::from(i) * 0.001,
            high: 1.102 + f64::from(i) * 0.001,
            low: 1.099 + f64::from(i) * 0.001,
            close: 1.101 + f64::from(i) * 0.001,
            tick_volume: 100 + u64::from(i),
            spread: 2,
            real_volume: 0,
        })
        .collect()
}

pub fn sample_ticks(count: u32) -> Vec<Tick> {
    (0..count)
        .map(|i| Tick {
            time: 1_704_067_200 + i64::from(i),
            bid: 1.1,
            ask: 1.1002,
            last: 0.0,
            volume: 0,
            time_msc: (1_704_067_200 + i64::from(i)) * 1000,
            flags: 6,
            volume_real: 0.0,
        })
        .collect()
}

impl Terminal for StubTerminal {
    fn initialize(&self, _params: &InitializeParams) -> bool {
        self.record("initialize");
        let next = self.init_script.lock().unwrap().pop_front().unwrap_or(Ok(()));
        match next {
            Ok(()) => {
                self.connected.store(true, Ordering::SeqCst);
                true
            }
            Err(err) => {
                self.fail(err);
                false
            }
        }
    }

    fn shutdown(&self) {
        self.record("shutdown");
        self.connected.store(false, Ordering::SeqCst);
    }

    fn login(&self, params: &LoginParams) -> bool {
        self.record(&format!("login:{}", params.login));
        self.answer(|| ()).is_some()
    }

    fn last_error(&self) -> LastError {
        self.last_error.lock().unwrap().clone()
    }

    fn version(&self) -> Option<TerminalVersion> {
        self.answer(|| TerminalVersion::from((500, 4410, "14 Jun 2024".to_string())))
    }

    fn account_info(&self) -> Option<AccountInfo> {
        self.answer(|| AccountInfo {
            login: 5001,
            balance: 10_000.0,
            equity: 10_000.0,
            currency: "USD".into(),
            server: "Broker-Demo".into(),
            ..Default::default()
        })
    }

    fn terminal_info(&self) -> Option<TerminalInfo> {
        if let Some(flag) = self.trade_script.lock().unwrap().pop_front() {
            self.trade_allowed.store(flag, Ordering::SeqCst);
        }
        let trade_allowed = self.trade_allowed.load(Ordering::SeqCst);
        self.answer(|| TerminalInfo {
            connected: true,
            trade_allowed,
            build: 4410,
            ..Default::default()
        })
    }

    fn symbols_total(&self) -> Option<i64> {
        self.answer(|| 3)
    }

    fn symbols_get(&self, _group: Option<String>) -> Option<Vec<SymbolInfo>> {
        self.answer(|| {
            ["EURUSD", "GBPUSD", "USDJPY"]
                .into_iter()
                .map(|name| SymbolInfo {
                    name: name.into(),
                    ..Default::default()
                })
                .collect()
        })
    }

    fn symbol_info(&self, symbol: &str) -> Option<SymbolInfo> {
        self.answer(|| SymbolInfo {
            name: symbol.into(),
            digits: 5,
            ..Default::default()
        })
    }

    fn symbol_info_tick(&self, _symbol: &str) -> Option<Tick> {
        self.answer(|| sample_ticks(1)[0])
    }

    fn symbol_select(&self, _symbol: &str, _enable: bool) -> bool {
        self.answer(|| ()).is_some()
    }

    fn order_send(&self, request: &TradeRequest) -> Option<OrderSendResult> {
        let request = request.clone();
        self.answer(move || OrderSendResult {
            retcode: 10009,
            volume: request.volume,
            request,
            ..Default::default()
        })
    }

    fn order_check(&self, request: &TradeRequest) -> Option<OrderCheckResult> {
        let request = request.clone();
        self.answer(move || OrderCheckResult {
            request,
            ..Default::default()
        })
    }

    fn order_calc_margin(&self, _action: i32, _symbol: &str, volume: f64, price: f64) -> Option<f64> {
        self.answer(|| volume * price * 1000.0)
    }

    fn order_calc_profit(
        &self,
        _action: i32,
        _symbol: &str,
        volume: f64,
        price_open: f64,
        price_close: f64,
    ) -> Option<f64> {
        self.answer(|| (price_close - price_open) * volume * 100_000.0)
    }

    fn orders_total(&self) -> Option<i64> {
        self.answer(|| 0)
    }

    fn orders_get(&self, _filter: &OrderFilter) -> Option<Vec<TradeOrder>> {
        self.answer(Vec::new)
    }

    fn positions_total(&self) -> Option<i64> {
        self.answer(|| 1)
    }

    fn positions_get(&self, _filter: &OrderFilter) -> Option<Vec<TradePosition>> {
        self.answer(|| {
            vec![TradePosition {
                ticket: 42,
                symbol: "EURUSD".into(),
                volume: 0.1,
                ..Default::default()
            }]
        })
    }

    fn history_orders_total(&self, _from: DateTime<Utc>, _to: DateTime<Utc>) -> Option<i64> {
        self.answer(|| 0)
    }

    fn history_orders_get(&self, _query: &HistoryQuery) -> Option<Vec<TradeOrder>> {
        self.answer(Vec::new)
    }

    fn history_deals_total(&self, _from: DateTime<Utc>, _to: DateTime<Utc>) -> Option<i64> {
        self.answer(|| 0)
    }

    fn history_deals_get(&self, _query: &HistoryQuery) -> Option<Vec<TradeDeal>> {
        self.answer(Vec::new)
    }

    fn copy_rates_from(
        &self,
        _symbol: &str,
        _timeframe: i32,
        _date_from: DateTime<Utc>,
        count: u32,
    ) -> Option<Vec<Rate>> {
        self.answer(|| sample_rates(count))
    }

    fn copy_rates_from_pos(
        &self,
        _symbol: &str,
        _timeframe: i32,
        _start_pos: u32,
        count: u32,
    ) -> Option<Vec<Rate>> {
        self.answer(|| sample_rates(count))
    }

    fn copy_rates_range(
        &self,
        _symbol: &str,
        _timeframe: i32,
        _date_from: DateTime<Utc>,
        _date_to: DateTime<Utc>,
    ) -> Option<Vec<Rate>> {
        self.answer(|| sample_rates(5))
    }

    fn copy_ticks_from(
        &self,
        _symbol: &str,
        _date_from: DateTime<Utc>,
        count: u32,
        _flags: i32,
    ) -> Option<Vec<Tick>> {
        self.answer(|| sample_ticks(count))
    }

    fn copy_ticks_range(
        &self,
        _symbol: &str,
        _date_from: DateTime<Utc>,
        _date_to: DateTime<Utc>,
        _flags: i32,
    ) -> Option<Vec<Tick>> {
        self.answer(|| sample_ticks(5))
    }
}

/// Housekeeping double that only records what it was asked to do
pub struct RecordingHousekeeping {
    log: EventLog,
    credentials: Mutex<Vec<Credentials>>,
}

impl RecordingHousekeeping {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            credentials: Mutex::new(Vec::new()),
        }
    }

    pub fn prepared_credentials(&self) -> Vec<Credentials> {
        self.credentials.lock().unwrap().clone()
    }

    fn record(&self, event: &str) {
        self.log.lock().unwrap().push(event.to_string());
    }
}

impl Housekeeping for RecordingHousekeeping {
    fn prepare_config(&self, credentials: &Credentials) {
        self.record("prepare_config");
        self.credentials.lock().unwrap().push(credentials.clone());
    }

    fn purge_accounts(&self) {
        self.record("purge_accounts");
    }

    fn kill_and_settle(&self) {
        self.record("kill_and_settle");
    }

    fn pause(&self, _duration: Duration) {
        self.record("pause");
    }
}

pub struct Fixture {
    pub log: EventLog,
    pub terminal: Arc<StubTerminal>,
    pub housekeeping: Arc<RecordingHousekeeping>,
    pub session: Arc<Session>,
    pub dispatcher: Arc<Dispatcher>,
}

impl Fixture {
    /// Wire a session and dispatcher around a scripted terminal
    pub fn new(configure: impl FnOnce(StubTerminal) -> StubTerminal) -> Self {
        let log = event_log();
        let terminal = Arc::new(configure(StubTerminal::new(log.clone())));
        let housekeeping = Arc::new(RecordingHousekeeping::new(log.clone()));
        let session = Arc::new(Session::new(
            terminal.clone(),
            housekeeping.clone(),
            Duration::ZERO,
        ));
        let dispatcher = Arc::new(Dispatcher::new(session.clone(), TERMINAL_PATH));

        Self {
            log,
            terminal,
            housekeeping,
            session,
            dispatcher,
        }
    }

    pub fn events(&self) -> Vec<String> {
        events(&self.log)
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| e.as_str() == event).count()
    }
}
