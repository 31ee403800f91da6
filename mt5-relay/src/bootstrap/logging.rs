use tracing_appender::non_blocking::WorkerGuard;

use crate::config::Config;
use crate::logging;

pub fn setup(config: &Config) -> Option<WorkerGuard> {
    let guard = logging::init(&config.logging);

    tracing::info!("Starting MT5 Relay Server...");
    tracing::info!("Server Version: {}", env!("BUILD_INFO"));

    if config.logging.enabled {
        tracing::info!(
            "File logging enabled: directory={}, prefix={}, rotation={}",
            config.logging.directory,
            config.logging.file_prefix,
            config.logging.rotation
        );
    }

    tracing::info!(
        "Terminal: executable={}, data_root={}",
        config.terminal.executable_path().display(),
        config.terminal.data_root
    );

    guard
}
