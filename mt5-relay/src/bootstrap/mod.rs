use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

use crate::adapters::inbound::rpc::RpcServer;
use crate::application::Session;
use crate::config::Config;

pub mod logging;
pub mod server;
pub mod services;

pub struct Application {
    /// `None` when the HTTP adapter is disabled
    pub router: Option<Router>,
    pub http_address: String,
    /// `None` when the RPC adapter is disabled
    pub rpc_server: Option<RpcServer>,
    pub rpc_endpoint: String,
    pub session: Arc<Session>,
    /// Flushes file logs on drop
    pub log_guard: Option<WorkerGuard>,
}

pub fn setup() -> Result<Application> {
    // 1. Load Configuration
    let config = load_config();

    // 2. Setup Logging
    let log_guard = logging::setup(&config);

    // 3. Setup Services
    let registry = services::setup(&config);

    // 4. Setup Transports
    server::setup(&config, registry, log_guard)
}

fn load_config() -> Config {
    let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_string_lossy().into_owned()))
            .unwrap_or_else(|| ".".to_string())
    });
    let config_base = format!("{}/config", config_dir);

    eprintln!(
        "Config directory: {}, config base: {}",
        config_dir, config_base
    );

    match Config::from_file(&config_base) {
        Ok(cfg) => {
            eprintln!("Configuration loaded successfully from {}", config_base);
            cfg
        }
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}, using defaults", e);
            Config::default()
        }
    }
}
