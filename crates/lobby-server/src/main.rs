//! WebSocket lobby server.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lobby_server::config::Config;
use lobby_server::{logging, server};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "lobby-server", version, about = "Rhythm-game lobby session coordinator")]
struct Cli {
    /// TOML file with `bind_addr`, `port` and `max_clients`.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    bind_addr: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    #[arg(long)]
    max_clients: Option<usize>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    debug: bool,

    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(addr) = &self.bind_addr {
            config.bind_addr = addr.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(max_clients) = self.max_clients {
            config.max_clients = max_clients;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug, cli.json_logs)?;

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let config = cli.apply(config);

    info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        max_clients = config.max_clients,
        "starting lobby-server"
    );

    server::run(config).await.context("server failed")?;
    info!("lobby-server stopped");
    Ok(())
}
