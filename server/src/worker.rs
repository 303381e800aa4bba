//! Long-lived worker tasks servicing dispatched connections
//!
//! A fixed number of workers is started once at process startup. Each worker
//! loops forever: pull a connection off the shared queue, register it,
//! announce it, spawn its sender task, then run the blocking inbound read
//! loop until the peer closes or an error occurs. Teardown is the worker's
//! responsibility: it signals the sender, unregisters the connection, and
//! lets ownership release the socket once both halves are dropped.
//!
//! With `W` workers, at most `W` connections are in the active reading state
//! at any moment; everything else waits in the queue.

use log::{debug, error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;

use crate::connection::Connection;
use crate::queue::ConnectionQueue;
use crate::registry::ClientRegistry;
use crate::sender;

/// Handles of the spawned worker tasks.
///
/// Workers run for the process lifetime; the handles exist so embedding
/// callers and tests can count or tear them down.
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `count` workers draining `queue` into `registry`.
    pub fn spawn(
        count: usize,
        queue: Arc<ConnectionQueue>,
        registry: Arc<ClientRegistry>,
        buffer_size: usize,
        send_interval: Duration,
    ) -> Self {
        let handles = (0..count)
            .map(|worker_id| {
                let queue = Arc::clone(&queue);
                let registry = Arc::clone(&registry);
                tokio::spawn(worker_loop(
                    worker_id,
                    queue,
                    registry,
                    buffer_size,
                    send_interval,
                ))
            })
            .collect();
        info!("started {} worker tasks", count);
        Self { handles }
    }

    /// Number of workers in the pool.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Aborts all workers. Only used by tests and embedding callers; the
    /// server itself never stops its pool.
    pub fn shutdown(self) {
        for handle in self.handles {
            handle.abort();
        }
    }
}

/// One worker: dequeue, service, repeat. The read buffer is reused across
/// connections since a worker services one connection at a time.
async fn worker_loop(
    worker_id: usize,
    queue: Arc<ConnectionQueue>,
    registry: Arc<ClientRegistry>,
    buffer_size: usize,
    send_interval: Duration,
) {
    let mut buffer = vec![0u8; buffer_size];
    loop {
        let conn = queue.dequeue().await;
        debug!("worker {} servicing connection {}", worker_id, conn.id);
        service_connection(&registry, conn, &mut buffer, send_interval).await;
    }
}

/// Drives one connection from dispatch to close.
async fn service_connection(
    registry: &ClientRegistry,
    mut conn: Connection,
    buffer: &mut [u8],
    send_interval: Duration,
) {
    let id = conn.id;

    let registered = registry
        .register(id, conn.peer_addr, conn.writer.clone())
        .await;
    if registered {
        let notice = shared::join_notice(id);
        registry.broadcast(notice.as_bytes(), Some(id)).await;
    }

    // Detached on purpose: the sender holds its own clone of the write
    // half, so the socket outlives the read loop until the sender has also
    // stopped, and a sender blocked on a stalled peer cannot wedge the
    // worker.
    let _sender = sender::spawn(id, conn.writer.clone(), conn.close_signal(), send_interval);

    // Inbound loop. Payload bytes are opaque here; an application layer
    // would replace the logging below.
    loop {
        match conn.reader.read(buffer).await {
            Ok(0) => {
                info!("connection {} closed by peer", id);
                break;
            }
            Ok(n) => {
                info!(
                    "received {} bytes from connection {}: {}",
                    n,
                    id,
                    String::from_utf8_lossy(&buffer[..n])
                );
            }
            Err(e) => {
                // A read error tears the connection down the same way EOF
                // does; it never propagates to other connections.
                error!("failed to read from connection {}: {}", id, e);
                break;
            }
        }
    }

    conn.signal_closed();

    if registered {
        registry.unregister(id).await;
        let notice = shared::leave_notice(id);
        registry.broadcast(notice.as_bytes(), None).await;
    }

    // `conn` drops here: the read half goes away now, the write half once
    // the registry and sender clones are gone, and only then does the OS
    // socket close.
}
