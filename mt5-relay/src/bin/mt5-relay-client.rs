//! Reference client: connect, initialize, print a short account summary and
//! shut the terminal connection down again.

use anyhow::{bail, Result};
use clap::Parser;
use serde_json::{json, Map, Value};
use std::time::Duration;

use mt5_relay::client::RpcClient;
use mt5_wire::{DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_RPC_PORT, RES_E_AUTH_FAILED};

/// Drive a remote MT5 terminal through the relay's object-RPC channel.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Trading account number
    login: i64,

    password: String,

    /// Trade server name, e.g. "MetaQuotes-Demo"
    server: String,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = DEFAULT_RPC_PORT)]
    port: u16,

    /// Terminal executable on the relay host. The relay's default when omitted.
    #[arg(long)]
    path: Option<String>,

    /// Seconds to wait for each reply
    #[arg(long, default_value_t = DEFAULT_CALL_TIMEOUT_SECS)]
    timeout: u64,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let endpoint = format!("tcp://{}:{}", cli.host, cli.port);
    let mut client = RpcClient::connect(&endpoint, Duration::from_secs(cli.timeout))?;
    println!("Connected to {}", client.endpoint());

    let mut args = credentials(&cli);
    if let Some(path) = &cli.path {
        args.insert("path".into(), json!(path));
    }

    let init = client.call_value("initialize", args)?;
    if init["ok"] != json!(true) {
        let code = init["last_error"][0].as_i64();
        if code != Some(i64::from(RES_E_AUTH_FAILED)) {
            bail!("initialize failed: {}", init["last_error"]);
        }

        // Terminal is up but refused the account; retry as an explicit login
        println!("initialize rejected the credentials, trying login");
        let login = client.call_value("login", credentials(&cli))?;
        if login["ok"] != json!(true) {
            bail!("login failed: {}", login["last_error"]);
        }
    }
    println!("Terminal initialized");

    let version = client.call_value("version", Map::new())?;
    println!("Version: {}", version["version"]);

    let account = client.call_value("account_info", Map::new())?;
    print_account(&account);

    let symbols = client.call_value("symbols_total", Map::new())?;
    println!("Symbols: {}", symbols["total"]);

    client.call_value("shutdown", Map::new())?;
    println!("Terminal connection shut down");
    Ok(())
}

fn credentials(cli: &Cli) -> Map<String, Value> {
    let mut args = Map::new();
    args.insert("login".into(), json!(cli.login));
    args.insert("password".into(), json!(cli.password));
    args.insert("server".into(), json!(cli.server));
    args
}

fn print_account(account: &Value) {
    if account["error"] == json!(true) {
        println!("Account info unavailable: {}", account["last_error"]);
        return;
    }
    println!(
        "Account {} ({}) on {}: balance {} {}, equity {}, leverage 1:{}",
        account["login"],
        account["name"].as_str().unwrap_or_default(),
        account["server"].as_str().unwrap_or_default(),
        account["balance"],
        account["currency"].as_str().unwrap_or_default(),
        account["equity"],
        account["leverage"],
    );
}
