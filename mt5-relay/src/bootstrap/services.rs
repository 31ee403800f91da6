use std::sync::Arc;

use crate::adapters::infrastructure::FilesystemHousekeeping;
use crate::adapters::outbound::OfflineTerminal;
use crate::application::{Dispatcher, Session};
use crate::config::Config;
use crate::ports;

pub struct ServiceRegistry {
    pub session: Arc<Session>,
    pub dispatcher: Arc<Dispatcher>,
}

pub fn setup(config: &Config) -> ServiceRegistry {
    // Native bindings plug in here; without one every call reports no IPC connection
    let terminal: Arc<dyn ports::Terminal> = Arc::new(OfflineTerminal::new());
    tracing::warn!("No native terminal binding linked; terminal calls will fail with no connection");

    let housekeeping: Arc<dyn ports::Housekeeping> = Arc::new(FilesystemHousekeeping::from_config(
        &config.terminal,
        &config.lifecycle,
    ));

    let session = Arc::new(Session::new(terminal, housekeeping, config.lifecycle.grace()));
    tracing::info!(
        "Session ready: grace={}s, settle={}s, kill_timeout={}s",
        config.lifecycle.grace_secs,
        config.lifecycle.settle_secs,
        config.lifecycle.kill_timeout_secs
    );

    let default_path = config.terminal.executable_path().to_string_lossy().into_owned();
    let dispatcher = Arc::new(Dispatcher::new(session.clone(), default_path));

    ServiceRegistry {
        session,
        dispatcher,
    }
}
