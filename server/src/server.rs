//! Listening socket setup and the accept loop feeding the dispatch queue

use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket};

use crate::connection::Connection;
use crate::queue::ConnectionQueue;
use crate::registry::ClientRegistry;
use crate::worker::WorkerPool;

/// Tuning knobs for a server instance. Defaults mirror the `shared` crate's
/// constants so binaries, tests, and embedding callers start from the same
/// values.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Accept backlog depth passed to `listen`.
    pub backlog: u32,
    /// Number of worker tasks servicing connections.
    pub workers: usize,
    /// Registry capacity: how many connections broadcast can reach.
    pub max_clients: usize,
    /// Buffer size for each inbound read.
    pub buffer_size: usize,
    /// Interval between outbound messages on each connection.
    pub send_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            backlog: shared::DEFAULT_BACKLOG,
            workers: shared::DEFAULT_WORKERS,
            max_clients: shared::DEFAULT_MAX_CLIENTS,
            buffer_size: shared::DEFAULT_BUFFER_SIZE,
            send_interval: Duration::from_millis(shared::DEFAULT_SEND_INTERVAL_MS),
        }
    }
}

/// The dispatch server: one listener, a FIFO queue, a fixed worker pool, and
/// a bounded client registry.
pub struct Server {
    listener: TcpListener,
    queue: Arc<ConnectionQueue>,
    registry: Arc<ClientRegistry>,
    config: ServerConfig,
}

impl Server {
    /// Binds the listening socket.
    ///
    /// Any failure here (bad address, socket creation, bind, listen) is
    /// fatal and propagates to the caller before a single worker exists.
    pub async fn bind(addr: &str, config: ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let addr: SocketAddr = addr.parse()?;
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(config.backlog)?;
        info!("server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            queue: Arc::new(ConnectionQueue::new()),
            registry: Arc::new(ClientRegistry::new(config.max_clients)),
            config,
        })
    }

    /// Address the listener actually bound to (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared handle to the registry, for broadcasting from outside the
    /// dispatch path and for observing membership in tests.
    pub fn registry(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.registry)
    }

    /// Shared handle to the dispatch queue, mainly for depth introspection.
    pub fn queue(&self) -> Arc<ConnectionQueue> {
        Arc::clone(&self.queue)
    }

    /// Sends a payload to every registered client. Best-effort; returns the
    /// delivery count.
    pub async fn broadcast(&self, payload: &[u8]) -> usize {
        self.registry.broadcast(payload, None).await
    }

    /// Starts the worker pool, then accepts connections forever.
    ///
    /// A failed accept is logged and retried after a short pause; it never
    /// takes the process down. The queue is unbounded, so a slow pool grows
    /// memory instead of stalling accepts. Callers needing a hard memory cap
    /// must impose one externally.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let _workers = WorkerPool::spawn(
            self.config.workers,
            Arc::clone(&self.queue),
            Arc::clone(&self.registry),
            self.config.buffer_size,
            self.config.send_interval,
        );

        let mut next_conn_id: u32 = 1;
        loop {
            match self.listener.accept().await {
                Ok((stream, peer_addr)) => {
                    let id = next_conn_id;
                    next_conn_id = next_conn_id.wrapping_add(1);
                    info!("accepted connection {} from {}", id, peer_addr);
                    self.queue
                        .enqueue(Connection::new(id, stream, peer_addr))
                        .await;
                }
                Err(e) => {
                    error!("failed to accept connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}
