// Location: mt5-relay/src/domain/models.rs
// Purpose: Parameter and state types of the terminal session
// Why: Keeps the port traits and the controller free of transport-level maps

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session state derived on demand from the terminal's own status query.
/// Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Down,
    /// A lifecycle operation (initialize, login, shutdown) holds the session lock
    Launching,
    InitializedTradeEnabled,
    InitializedTradeDisabled,
    /// The last lifecycle call failed and the terminal does not answer
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Down => "down",
            SessionState::Launching => "launching",
            SessionState::InitializedTradeEnabled => "initialized_trade_enabled",
            SessionState::InitializedTradeDisabled => "initialized_trade_disabled",
            SessionState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments of the terminal's `initialize`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitializeParams {
    /// Terminal executable
    pub path: String,
    pub login: Option<i64>,
    pub password: Option<String>,
    pub server: Option<String>,
    /// Connection timeout in milliseconds
    pub timeout: Option<u64>,
    pub portable: Option<bool>,
}

impl InitializeParams {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            login: self.login,
            server: self.server.clone(),
        }
    }
}

/// Arguments of the terminal's `login`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginParams {
    pub login: i64,
    pub password: Option<String>,
    pub server: Option<String>,
    pub timeout: Option<u64>,
}

impl LoginParams {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            login: Some(self.login),
            server: self.server.clone(),
        }
    }
}

/// Account identity written into the terminal configuration before launch.
/// The password is never persisted by the relay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub login: Option<i64>,
    pub server: Option<String>,
}

impl Credentials {
    /// Whether anything account-related is about to change
    pub fn is_empty(&self) -> bool {
        self.login.is_none() && self.server.is_none()
    }
}

/// Optional narrowing of `orders_get` / `positions_get`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub symbol: Option<String>,
    pub group: Option<String>,
    pub ticket: Option<u64>,
}

/// Date range plus optional narrowing of `history_*_get`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub date_from: DateTime<Utc>,
    pub date_to: DateTime<Utc>,
    pub group: Option<String>,
    pub ticket: Option<u64>,
    pub position: Option<u64>,
}
