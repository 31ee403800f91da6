// Location: mt5-relay/src/domain/services/session_controller.rs
// Purpose: Bring the terminal into an initialized, trade-enabled state
// Why: The terminal silently disables trading after an account change and
//      fails initialize while a stale instance lingers; both are only cured by
//      a cold restart with the configuration already in place.
//
// Sequence:
//   credentials given? -> patch config, purge accounts
//   initialize
//     ok  -> trading disabled? -> restart once
//     err -> recoverable code?  -> restart once, else fail
//   restart = shutdown, kill + settle, patch, purge, grace pause, initialize

use mt5_wire::{is_recoverable_init_error, LastError, RES_E_AUTO_TRADING_DISABLED};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::models::{Credentials, InitializeParams};
use crate::ports::{Housekeeping, Terminal};

/// Result of one `ensure_session` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub ok: bool,
    pub last_error: Option<LastError>,
    /// Whether the restart-and-retry cycle ran
    pub restarted: bool,
}

impl SessionOutcome {
    fn ready(restarted: bool) -> Self {
        Self {
            ok: true,
            last_error: None,
            restarted,
        }
    }

    fn failed(err: LastError, restarted: bool) -> Self {
        Self {
            ok: false,
            last_error: Some(err),
            restarted,
        }
    }
}

enum TradeProbe {
    Enabled,
    Disabled,
    /// Status query itself failed
    Unknown,
}

pub struct SessionController<T: ?Sized, H: ?Sized> {
    terminal: Arc<T>,
    housekeeping: Arc<H>,
    grace: Duration,
}

impl<T, H> SessionController<T, H>
where
    T: Terminal + ?Sized,
    H: Housekeeping + ?Sized,
{
    pub fn new(terminal: Arc<T>, housekeeping: Arc<H>, grace: Duration) -> Self {
        Self {
            terminal,
            housekeeping,
            grace,
        }
    }

    /// Initialize the terminal, restarting it at most once.
    ///
    /// Not reentrant: the caller must hold the session's lifecycle lock.
    pub fn ensure_session(&self, params: &InitializeParams) -> SessionOutcome {
        let credentials = params.credentials();
        if !credentials.is_empty() {
            self.prepare(&credentials);
        }

        if self.terminal.initialize(params) {
            return match self.probe_trading() {
                TradeProbe::Disabled => {
                    tracing::warn!("Trading disabled after initialize, restarting terminal");
                    self.restart_and_retry(params, &credentials)
                }
                TradeProbe::Unknown => {
                    tracing::warn!("initialize succeeded but terminal_info is unavailable");
                    SessionOutcome::ready(false)
                }
                TradeProbe::Enabled => {
                    tracing::info!(path = %params.path, login = ?params.login, "Terminal initialized");
                    SessionOutcome::ready(false)
                }
            };
        }

        let err = self.terminal.last_error();
        if is_recoverable_init_error(err.code) {
            tracing::warn!(
                code = err.code,
                message = %err.message,
                "initialize failed with a recoverable code, killing terminal and retrying"
            );
            return self.restart_and_retry(params, &credentials);
        }

        tracing::error!(code = err.code, message = %err.message, "initialize failed");
        SessionOutcome::failed(err, false)
    }

    fn restart_and_retry(
        &self,
        params: &InitializeParams,
        credentials: &Credentials,
    ) -> SessionOutcome {
        self.terminal.shutdown();
        self.housekeeping.kill_and_settle();
        self.prepare(credentials);
        self.housekeeping.pause(self.grace);

        if !self.terminal.initialize(params) {
            let err = self.terminal.last_error();
            tracing::error!(code = err.code, message = %err.message, "Retry also failed");
            return SessionOutcome::failed(err, true);
        }

        match self.probe_trading() {
            TradeProbe::Disabled => {
                tracing::error!("Trading still disabled after terminal restart");
                SessionOutcome::failed(
                    LastError::new(
                        RES_E_AUTO_TRADING_DISABLED,
                        "Auto trading disabled after terminal restart",
                    ),
                    true,
                )
            }
            _ => {
                tracing::info!("Retry succeeded");
                SessionOutcome::ready(true)
            }
        }
    }

    fn prepare(&self, credentials: &Credentials) {
        self.housekeeping.prepare_config(credentials);
        self.housekeeping.purge_accounts();
    }

    fn probe_trading(&self) -> TradeProbe {
        match self.terminal.terminal_info() {
            Some(info) if info.trade_allowed => TradeProbe::Enabled,
            Some(_) => TradeProbe::Disabled,
            None => TradeProbe::Unknown,
        }
    }
}
