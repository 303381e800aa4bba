use clap::Parser;
use server::{Server, ServerConfig};
use std::time::Duration;

/// Concurrent TCP connection-dispatch server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = shared::DEFAULT_HOST)]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Number of worker tasks servicing connections
    #[arg(short, long, default_value_t = shared::DEFAULT_WORKERS)]
    workers: usize,

    /// Maximum number of clients tracked for broadcast
    #[arg(short, long, default_value_t = shared::DEFAULT_MAX_CLIENTS)]
    max_clients: usize,

    /// Accept backlog depth
    #[arg(long, default_value_t = shared::DEFAULT_BACKLOG)]
    backlog: u32,

    /// Per-read buffer size in bytes
    #[arg(long, default_value_t = shared::DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Interval between outbound messages in milliseconds
    #[arg(long, default_value_t = shared::DEFAULT_SEND_INTERVAL_MS)]
    send_interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let config = ServerConfig {
        backlog: args.backlog,
        workers: args.workers,
        max_clients: args.max_clients,
        buffer_size: args.buffer_size,
        send_interval: Duration::from_millis(args.send_interval_ms),
    };

    let address = format!("{}:{}", args.host, args.port);
    let server = Server::bind(&address, config).await?;
    server.run().await
}
