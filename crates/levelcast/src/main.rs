use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use levelcast::{LevelcastError, RelayServer, ServerConfig};
use tracing_subscriber::EnvFilter;

/// Real-time relay server for multiplayer levels.
#[derive(Parser, Debug)]
#[command(name = "levelcast", version, about)]
struct Args {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, host:port (overrides the config file)
    #[arg(short, long)]
    bind: Option<String>,

    /// Port to listen on (overrides the port of the bind address)
    #[arg(short, long)]
    port: Option<u16>,
}

impl Args {
    fn server_config(&self) -> Result<ServerConfig, LevelcastError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.bind.clone_from(bind);
        }
        if let Some(port) = self.port {
            config.set_port(port);
        }
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // RUST_LOG=levelcast=debug for per-packet diagnostics
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "levelcast failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), LevelcastError> {
    let config = args.server_config()?;
    let mut server = RelayServer::builder().config(config).build().await?;
    tracing::info!(local_addr = %server.local_addr(), "levelcast started");

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
}
