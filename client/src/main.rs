use clap::Parser;
use client::network::Client;
use log::info;
use shared::Framing;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Snapshot framing used by the server: `length-prefixed` or `raw`
    #[arg(short, long, default_value_t = Framing::LengthPrefixed)]
    framing: Framing,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(client::log_env()).init();

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    info!("Controls: W/A/S/D to move, Space to shoot, Q to quit");

    let client = match Client::connect(&args.server, args.framing).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to connect to server at {}: {}", args.server, e);
            return Err(e.into());
        }
    };

    client.run().await?;

    Ok(())
}
