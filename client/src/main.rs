use clap::Parser;
use log::info;

/// Receiving test peer: opens concurrent connections to the dispatch server
/// and logs whatever each one receives.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Number of concurrent connections to open
    #[arg(short, long, default_value = "4")]
    connections: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting receiving peer...");
    info!(
        "Opening {} connections to {}",
        args.connections, args.server
    );

    client::run_peers(&args.server, args.connections).await;

    Ok(())
}
