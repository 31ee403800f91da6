use anyhow::{Context, Result};
use mt5_wire::{DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_HTTP_PORT, DEFAULT_RPC_PORT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub terminal: TerminalConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Request/response (JSON over HTTP) adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            host: default_host(),
            port: default_http_port(),
        }
    }
}

/// Object-RPC (ZeroMQ) adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_rpc_port")]
    pub port: u16,
    /// Client-side wait for one call; covers a full restart cycle
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            host: default_host(),
            port: default_rpc_port(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

/// Where the terminal is installed and where it keeps its per-user state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    #[serde(default = "default_install_dir")]
    pub install_dir: String,
    /// Relative to `install_dir` unless absolute
    #[serde(default = "default_executable")]
    pub executable: String,
    /// Image name passed to the process killer
    #[serde(default = "default_executable")]
    pub process_name: String,
    /// Parent of the hashed profile directories; `%VAR%` references are expanded
    #[serde(default = "default_data_root")]
    pub data_root: String,
    #[serde(default = "default_config_file")]
    pub config_file: String,
    #[serde(default = "default_accounts_file")]
    pub accounts_file: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            install_dir: default_install_dir(),
            executable: default_executable(),
            process_name: default_executable(),
            data_root: default_data_root(),
            config_file: default_config_file(),
            accounts_file: default_accounts_file(),
        }
    }
}

impl TerminalConfig {
    /// Full path of the terminal executable handed to `initialize`
    pub fn executable_path(&self) -> PathBuf {
        let exe = Path::new(&self.executable);
        if exe.is_absolute() {
            exe.to_path_buf()
        } else {
            Path::new(&self.install_dir).join(exe)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Wait after killing the terminal so file locks are released
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,
    /// Wait between repatching and the retried initialize
    #[serde(default = "default_grace_secs")]
    pub grace_secs: u64,
    /// Upper bound on the kill command itself
    #[serde(default = "default_kill_timeout_secs")]
    pub kill_timeout_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            settle_secs: default_settle_secs(),
            grace_secs: default_grace_secs(),
            kill_timeout_secs: default_kill_timeout_secs(),
        }
    }
}

impl LifecycleConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }

    pub fn kill_timeout(&self) -> Duration {
        Duration::from_secs(self.kill_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable file logging
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Directory for log files (relative to the working directory or absolute)
    #[serde(default = "default_log_directory")]
    pub directory: String,
    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
    /// Rotation strategy: "daily", "hourly", or "never"
    #[serde(default = "default_log_rotation")]
    pub rotation: String,
    /// Maximum number of log files to keep (0 = unlimited)
    #[serde(default = "default_max_files")]
    pub max_files: u32,
    /// Maximum age of log files in days (0 = unlimited)
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            directory: default_log_directory(),
            file_prefix: default_log_file_prefix(),
            rotation: default_log_rotation(),
            max_files: default_max_files(),
            max_age_days: default_max_age_days(),
        }
    }
}

fn default_enabled() -> bool {
    true
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}
fn default_rpc_port() -> u16 {
    DEFAULT_RPC_PORT
}
fn default_call_timeout_secs() -> u64 {
    DEFAULT_CALL_TIMEOUT_SECS
}
fn default_install_dir() -> String {
    r"C:\Program Files\MetaTrader 5".to_string()
}
fn default_executable() -> String {
    "terminal64.exe".to_string()
}
fn default_data_root() -> String {
    r"%APPDATA%\MetaQuotes\Terminal".to_string()
}
fn default_config_file() -> String {
    "common.ini".to_string()
}
fn default_accounts_file() -> String {
    "accounts.dat".to_string()
}
fn default_settle_secs() -> u64 {
    3
}
fn default_grace_secs() -> u64 {
    2
}
fn default_kill_timeout_secs() -> u64 {
    10
}
fn default_log_directory() -> String {
    "logs".to_string()
}
fn default_log_file_prefix() -> String {
    "mt5-relay".to_string()
}
fn default_log_rotation() -> String {
    "daily".to_string()
}
fn default_max_files() -> u32 {
    30
}
fn default_max_age_days() -> u32 {
    90
}

impl Config {
    /// Load config from layered TOML files
    ///
    /// Later files override earlier ones:
    /// 1. {base_name}.toml (required)
    /// 2. {base_name}.{CONFIG_ENV}.toml (optional, only if CONFIG_ENV is set)
    /// 3. {base_name}.local.toml (optional, personal overrides)
    pub fn from_file<P: AsRef<Path>>(base_name: P) -> Result<Self> {
        let base_str = base_name.as_ref().to_str().context("Invalid base path")?;

        let mut builder =
            config::Config::builder().add_source(config::File::with_name(base_str));

        if let Ok(env) = std::env::var("CONFIG_ENV") {
            let env_config = format!("{}.{}", base_str, env);
            builder = builder.add_source(config::File::with_name(&env_config).required(false));
        }

        let local_config = format!("{}.local", base_str);
        builder = builder.add_source(config::File::with_name(&local_config).required(false));

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn http_address(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }

    pub fn rpc_endpoint(&self) -> String {
        let host = if self.rpc.host == "0.0.0.0" {
            "*"
        } else {
            self.rpc.host.as_str()
        };
        format!("tcp://{}:{}", host, self.rpc.port)
    }
}
