//! Shared fixtures for session and dispatcher tests
//!
//! Builds a `Session` over mocked ports so each test only scripts the
//! terminal calls it cares about.

use super::*;
use crate::ports::{MockHousekeeping, MockTerminal};
use mt5_wire::{LastError, TerminalInfo};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;


pub(crate) const TEST_TERMINAL_PATH: &str = r"C:\Program Files\MetaTrader 5\terminal64.exe";

/// Housekeeping mock that accepts any number of calls
pub(crate) fn permissive_housekeeping() -> MockHousekeeping {
    let mut housekeeping = MockHousekeeping::new();
    housekeeping.expect_prepare_config().return_const(());
    housekeeping.expect_purge_accounts().return_const(());
    housekeeping.expect_kill_and_settle().return_const(());
    housekeeping.expect_pause().return_const(());
    housekeeping
}

pub(crate) fn create_test_session(terminal: MockTerminal, housekeeping: MockHousekeeping) -> Arc<Session> {
    Arc::new(Session::new(
        Arc::new(terminal),
        Arc::new(housekeeping),
        Duration::ZERO,
    ))
}

pub(crate) fn create_test_dispatcher(terminal: MockTerminal) -> Dispatcher {
    Dispatcher::new(
        create_test_session(terminal, permissive_housekeeping()),
        TEST_TERMINAL_PATH,
    )
}

pub(crate) fn trading_info(trade_allowed: bool) -> TerminalInfo {
    TerminalInfo {
        connected: true,
        trade_allowed,
        build: 4410,
        ..Default::default()
    }
}

pub(crate) fn no_connection() -> LastError {
    LastError::new(mt5_wire::RES_E_INTERNAL_FAIL_CONNECT, "No IPC connection")
}

/// Argument map from a JSON object literal
pub(crate) fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("test arguments must be an object, got {}", other),
    }
}

pub(crate) fn json_reply(reply: Result<Reply, DispatchError>) -> Value {
    match reply {
        Ok(Reply::Json(value)) => value,
        other => panic!("expected a JSON reply, got {:?}", other),
    }
}
