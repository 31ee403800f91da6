// Location: mt5-relay/src/application/session.rs
// Purpose: Explicit handle on the singleton terminal session
// Why: Lifecycle calls (initialize, login, shutdown) rewrite config files and
//      kill processes; they must exclude each other and every data query, while
//      data queries may run concurrently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};
use std::time::Duration;

use mt5_wire::LastError;

use crate::domain::models::{InitializeParams, LoginParams, SessionState};
use crate::domain::services::{SessionController, SessionOutcome};
use crate::ports::{Housekeeping, Terminal};

pub struct Session {
    terminal: Arc<dyn Terminal>,
    housekeeping: Arc<dyn Housekeeping>,
    controller: SessionController<dyn Terminal, dyn Housekeeping>,
    /// Write = lifecycle operation, read = data query
    gate: RwLock<()>,
    last_lifecycle_failed: AtomicBool,
    closed: AtomicBool,
}

impl Session {
    pub fn new(
        terminal: Arc<dyn Terminal>,
        housekeeping: Arc<dyn Housekeeping>,
        grace: Duration,
    ) -> Self {
        let controller = SessionController::new(terminal.clone(), housekeeping.clone(), grace);
        Self {
            terminal,
            housekeeping,
            controller,
            gate: RwLock::new(()),
            last_lifecycle_failed: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Bring the terminal up, restarting it at most once
    pub fn ensure(&self, params: &InitializeParams) -> SessionOutcome {
        let _lifecycle = self.lifecycle_lock();
        let outcome = self.controller.ensure_session(params);
        self.last_lifecycle_failed.store(!outcome.ok, Ordering::Relaxed);
        outcome
    }

    /// Switch account on a running terminal. The configuration is patched
    /// first so the next cold start already carries the new account.
    pub fn login(&self, params: &LoginParams) -> Result<(), LastError> {
        let _lifecycle = self.lifecycle_lock();
        self.housekeeping.prepare_config(&params.credentials());

        let ok = self.terminal.login(params);
        self.last_lifecycle_failed.store(!ok, Ordering::Relaxed);
        if ok {
            tracing::info!(login = params.login, "Logged in");
            Ok(())
        } else {
            let err = self.terminal.last_error();
            tracing::warn!(login = params.login, code = err.code, message = %err.message, "login failed");
            Err(err)
        }
    }

    pub fn shutdown(&self) {
        let _lifecycle = self.lifecycle_lock();
        self.terminal.shutdown();
        self.last_lifecycle_failed.store(false, Ordering::Relaxed);
        tracing::info!("Terminal connection shut down");
    }

    /// Run a data query against the terminal. Waits while a lifecycle
    /// operation is in progress; queries do not exclude each other.
    pub fn query<R>(&self, f: impl FnOnce(&dyn Terminal) -> R) -> R {
        let _query = self.gate.read().unwrap_or_else(PoisonError::into_inner);
        f(self.terminal.as_ref())
    }

    /// Current state, derived from the terminal's own status query
    pub fn state(&self) -> SessionState {
        let _query: RwLockReadGuard<'_, ()> = match self.gate.try_read() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return SessionState::Launching,
        };

        match self.terminal.terminal_info() {
            Some(info) if info.trade_allowed => SessionState::InitializedTradeEnabled,
            Some(_) => SessionState::InitializedTradeDisabled,
            None if self.last_lifecycle_failed.load(Ordering::Relaxed) => SessionState::Failed,
            None => SessionState::Down,
        }
    }

    /// Tear the session down at process exit. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown();
    }

    fn lifecycle_lock(&self) -> RwLockWriteGuard<'_, ()> {
        self.gate.write().unwrap_or_else(PoisonError::into_inner)
    }
}
