use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;

use crate::adapters::inbound::http::{create_router, HttpState};
use crate::adapters::inbound::rpc::RpcServer;
use crate::bootstrap::{services::ServiceRegistry, Application};
use crate::config::Config;

pub fn setup(
    config: &Config,
    registry: ServiceRegistry,
    log_guard: Option<WorkerGuard>,
) -> Result<Application> {
    if !config.http.enabled && !config.rpc.enabled {
        anyhow::bail!("Both transports are disabled; enable [http] or [rpc]");
    }

    let router = if config.http.enabled {
        tracing::info!("HTTP adapter will listen on: {}", config.http_address());
        Some(create_router(HttpState {
            dispatcher: registry.dispatcher.clone(),
        }))
    } else {
        tracing::info!("HTTP adapter disabled");
        None
    };

    let rpc_server = if config.rpc.enabled {
        tracing::info!(
            "RPC adapter will listen on: {} (client call timeout {}s)",
            config.rpc_endpoint(),
            config.rpc.call_timeout_secs
        );
        Some(RpcServer::new(registry.dispatcher.clone()))
    } else {
        tracing::info!("RPC adapter disabled");
        None
    };

    Ok(Application {
        router,
        http_address: config.http_address(),
        rpc_server,
        rpc_endpoint: config.rpc_endpoint(),
        session: registry.session,
        log_guard,
    })
}
