use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::network::Server;
use server::shutdown::Shutdown;
use shared::{Framing, DEFAULT_PORT};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Physics tick period in milliseconds
    #[arg(short, long, default_value = "50")]
    tick_ms: u64,

    /// Global cooldown between applied actions in milliseconds
    #[arg(short, long, default_value = "100")]
    cooldown_ms: u64,

    /// Maximum number of connected players
    #[arg(short, long, default_value = "32")]
    max_players: usize,

    /// Snapshot framing: `length-prefixed` or `raw`
    #[arg(short, long, default_value_t = Framing::LengthPrefixed)]
    framing: Framing,

    /// Seed for spawn placement
    #[arg(long)]
    seed: Option<u64>,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            host: args.host,
            port: args.port,
            tick: Duration::from_millis(args.tick_ms),
            cooldown: Duration::from_millis(args.cooldown_ms),
            max_players: args.max_players,
            framing: args.framing,
            seed: args.seed,
            ..ServerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from(Args::parse());
    info!(
        "Starting server on {} ({} framing, up to {} players)",
        config.bind_addr(),
        config.framing,
        config.max_players
    );

    let shutdown = Shutdown::new();
    let (server, engine) = Server::bind(&config, shutdown.clone()).await?;
    let simulation = tokio::spawn(engine.run(shutdown.clone()));

    tokio::select! {
        _ = server.run() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("Received Ctrl+C, shutting down...");
        }
    }

    shutdown.trigger();
    if let Err(e) = simulation.await {
        error!("Simulation task panicked: {}", e);
    }

    Ok(())
}
