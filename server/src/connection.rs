//! Per-connection state shared between a worker's read loop and its sender task

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};

/// Write half of an accepted socket, shared between the connection's sender
/// task and the registry's broadcast path. Each write happens under the
/// mutex, so concurrent writers never interleave inside a single payload.
pub type SharedWriter = Arc<Mutex<OwnedWriteHalf>>;

/// One accepted connection on its way through the dispatch pipeline.
///
/// The read half has exactly one owner at a time (the queue node, then the
/// servicing worker). The write half is reference-counted so the sender task
/// and the registry can hold it concurrently. The operating-system socket is
/// released once, when the last owner of each half drops it, so a descriptor
/// can never be closed while another task may still write to it.
#[derive(Debug)]
pub struct Connection {
    /// Server-assigned identifier, unique for the process lifetime.
    pub id: u32,
    /// Address of the remote peer, kept for logging and registry bookkeeping.
    pub peer_addr: SocketAddr,
    /// Read half, used only by the servicing worker's inbound loop.
    pub reader: OwnedReadHalf,
    /// Shared write half for the sender task and broadcast delivery.
    pub writer: SharedWriter,
    closed_tx: watch::Sender<bool>,
}

impl Connection {
    /// Wraps a freshly accepted stream.
    pub fn new(id: u32, stream: TcpStream, peer_addr: SocketAddr) -> Self {
        let (reader, writer) = stream.into_split();
        let (closed_tx, _closed_rx) = watch::channel(false);
        Self {
            id,
            peer_addr,
            reader,
            writer: Arc::new(Mutex::new(writer)),
            closed_tx,
        }
    }

    /// Returns a receiver that resolves once the read loop has terminated.
    ///
    /// The sender task selects on this alongside its interval sleep, so it
    /// observes the close within one send-or-sleep cycle. Dropping the
    /// connection also wakes subscribers, via the channel-closed error.
    pub fn close_signal(&self) -> watch::Receiver<bool> {
        self.closed_tx.subscribe()
    }

    /// Marks the connection as closing. Called by the worker when its read
    /// loop observes EOF or an error; idempotent.
    pub fn signal_closed(&self) {
        let _ = self.closed_tx.send(true);
    }

    /// True once `signal_closed` has run.
    pub fn is_closed(&self) -> bool {
        *self.closed_tx.borrow()
    }
}
