//!
//! eventhub server binary
//! ----------------------
//! Command-line entry point for the eventhub HTTP API. Configuration comes from
//! environment variables; CLI flags override them.

use anyhow::{Context, Result};
use std::env;

use eventhub::config::{AppConfig, ENV_HTTP_PORT, ENV_JWT_SECRET, ENV_TEST_MODE};

fn parse_port_arg(args: &[String], flag: &str) -> Option<u16> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return args[i + 1].parse::<u16>().ok();
        }
        i += 1;
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool { args.iter().any(|a| a == flag) }

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!(
            "eventhub Server\n\nUSAGE:\n  eventhub_server [--http-port N] [--test-mode]\n\nOPTIONS:\n  --http-port N   HTTP API port (env: {ENV_HTTP_PORT}, default 3000)\n  --test-mode     Enable test mode (env: {ENV_TEST_MODE}); required for the bypass credential\n\nThe signing secret is read from {ENV_JWT_SECRET} and must be set.\n"
        );
        return Ok(());
    }

    let mut config = AppConfig::from_env().context("While loading server configuration")?;
    if let Some(port) = parse_port_arg(&args, "--http-port") {
        config.http_port = port;
    }
    if has_flag(&args, "--test-mode") {
        config.test_mode = true;
    }
    tracing::debug!(target: "startup", ?config, "configuration resolved");

    eventhub::server::run(config).await
}
