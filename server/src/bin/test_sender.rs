//! Minimal sending peer for exercising the dispatch server by hand: opens
//! one connection and pushes a numbered message every second until a send
//! fails.

use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| format!("{}:{}", shared::DEFAULT_HOST, shared::DEFAULT_PORT));

    let mut stream = TcpStream::connect(&addr).await?;
    println!("[TEST_SENDER] Connected to server at {}", addr);

    let mut counter: u64 = 0;
    loop {
        let message = shared::peer_message(counter);
        counter += 1;

        if let Err(e) = stream.write_all(message.as_bytes()).await {
            println!("[TEST_SENDER] Failed to send data: {}", e);
            break;
        }

        println!("[TEST_SENDER] Sent: {}", message);
        sleep(Duration::from_secs(1)).await;
    }

    Ok(())
}
