//! Per-connection outbound traffic generation
//!
//! Each dispatched connection gets one sender task pushing a periodic
//! message on the shared write half. The task stands in for "server has data
//! to push" in a full application; the payload is plain text with no
//! framing. It terminates on the first send failure or as soon as the
//! owning worker signals that the read loop ended, and never touches the
//! socket lifetime itself: dropping its clone of the write half is its only
//! teardown.

use log::{debug, warn};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::connection::SharedWriter;

/// Spawns the sender task for one connection.
pub fn spawn(
    id: u32,
    writer: SharedWriter,
    closed: watch::Receiver<bool>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(run(id, writer, closed, interval))
}

/// Sends a numbered message, then waits one interval; repeats until a send
/// fails or the close signal fires. The wait is a `select!`, so the close is
/// observed within one send-or-sleep cycle at the latest.
pub async fn run(id: u32, writer: SharedWriter, mut closed: watch::Receiver<bool>, interval: Duration) {
    let mut counter: u64 = 0;

    loop {
        if *closed.borrow() {
            break;
        }

        let message = shared::server_message(counter);
        {
            let mut writer = writer.lock().await;
            if let Err(e) = writer.write_all(message.as_bytes()).await {
                warn!("send to connection {} failed: {}", id, e);
                break;
            }
        }
        debug!("sent to connection {}: {}", id, message);
        counter += 1;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = closed.changed() => {
                // A value change means the read loop ended; an error means
                // the connection itself is gone. Either way, stop.
                if changed.is_err() || *closed.borrow() {
                    break;
                }
            }
        }
    }

    debug!("sender for connection {} terminated", id);
}
