//! # Receiving Test Peer Library
//!
//! A deliberately simple peer for the dispatch server: it opens one or more
//! TCP connections and logs everything each of them receives until the
//! server closes the connection. It speaks no protocol (the server's output
//! is an opaque byte stream), which makes it useful both as a manual smoke
//! test and as a building block for the workspace integration tests.
//!
//! Running several connections at once exercises the server's dispatch
//! path: with more connections than workers, the surplus sits queued and
//! goes silent until a worker frees up, which is directly observable from
//! this peer's output.

use log::{error, info};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

/// Connects to `addr` and logs received data until EOF or an error.
///
/// Returns the total number of bytes received over the connection's
/// lifetime.
pub async fn receive_loop(peer_id: usize, addr: &str) -> std::io::Result<u64> {
    let mut stream = TcpStream::connect(addr).await?;
    info!("peer {} connected to server {}", peer_id, addr);

    let mut buf = vec![0u8; shared::DEFAULT_BUFFER_SIZE];
    let mut total: u64 = 0;
    loop {
        match stream.read(&mut buf).await {
            Ok(0) => {
                info!("peer {}: connection closed by server", peer_id);
                return Ok(total);
            }
            Ok(n) => {
                total += n as u64;
                info!(
                    "peer {} received: {}",
                    peer_id,
                    String::from_utf8_lossy(&buf[..n])
                );
            }
            Err(e) => {
                error!("peer {} failed to receive data: {}", peer_id, e);
                return Err(e);
            }
        }
    }
}

/// Runs `count` concurrent receiving connections against `addr` and waits
/// for all of them to finish.
pub async fn run_peers(addr: &str, count: usize) {
    let mut handles = Vec::with_capacity(count);
    for peer_id in 0..count {
        let addr = addr.to_string();
        handles.push(tokio::spawn(async move {
            if let Err(e) = receive_loop(peer_id, &addr).await {
                error!("peer {} exited with error: {}", peer_id, e);
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }
}
