use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use f1_bridge_app::config::Config;
use f1_bridge_app::server;
use f1_bridge_executor::PythonBridge;
use f1_bridge_tools::{ToolDispatcher, ToolRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol; every diagnostic goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = parse_args()?;
    let config = Config::load(&config_path)?;
    info!(
        "Bridge command: {} {} (timeout: {:?})",
        config.python_bin,
        config.script.display(),
        config.timeout()
    );

    let bridge = PythonBridge::new(config.python_bin.clone(), config.script.clone())
        .with_timeout(config.timeout());
    let dispatcher = Arc::new(ToolDispatcher::new(ToolRegistry::new(), Arc::new(bridge)));

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    server::serve(dispatcher, stdin, stdout).await?;

    Ok(())
}

fn parse_args() -> Result<PathBuf> {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        None => Ok(PathBuf::from("config.toml")),
        Some("--config") => match args.get(2) {
            Some(path) => Ok(PathBuf::from(path)),
            None => anyhow::bail!("--config requires a path"),
        },
        Some(other) => anyhow::bail!("Unknown argument: {other}\nUsage: f1-bridge [--config <path>]"),
    }
}
