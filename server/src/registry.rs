//! Active-connection tracking and broadcast fan-out for the dispatch server
//!
//! This module handles the server-side bookkeeping of dispatched
//! connections, including:
//! - Registration at dispatch and de-registration at close
//! - Capacity enforcement for the broadcast set
//! - Best-effort broadcast with per-recipient failure isolation
//!
//! Capacity bounds the broadcast fan-out, not connection admission: a
//! connection rejected here is still serviced by its worker and sender, it
//! just never receives broadcast payloads.

use log::{info, warn};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::connection::SharedWriter;

/// A connection currently tracked for broadcast.
#[derive(Debug, Clone)]
struct RegisteredClient {
    addr: SocketAddr,
    writer: SharedWriter,
}

#[derive(Debug)]
struct RegistryInner {
    clients: HashMap<u32, RegisteredClient>,
    max_clients: usize,
}

/// Bounded set of active connections supporting broadcast.
///
/// The map is protected by a lock internal to the registry, so callers share
/// it as a plain `Arc<ClientRegistry>`. Membership changes only through
/// `register` and `unregister`; `broadcast` works from a point-in-time
/// snapshot taken under the lock, so a concurrently registering connection
/// is either fully included or fully excluded, never half-delivered.
#[derive(Debug)]
pub struct ClientRegistry {
    inner: RwLock<RegistryInner>,
}

impl ClientRegistry {
    /// Creates an empty registry with the given capacity.
    pub fn new(max_clients: usize) -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                clients: HashMap::new(),
                max_clients,
            }),
        }
    }

    /// Attempts to track a dispatched connection.
    ///
    /// Returns false when the registry is at capacity. The caller keeps
    /// servicing the connection either way; rejection only excludes it from
    /// broadcast delivery.
    pub async fn register(&self, id: u32, addr: SocketAddr, writer: SharedWriter) -> bool {
        let mut inner = self.inner.write().await;
        if inner.clients.len() >= inner.max_clients {
            warn!(
                "registry full ({} clients), connection {} excluded from broadcast",
                inner.max_clients, id
            );
            return false;
        }

        inner.clients.insert(id, RegisteredClient { addr, writer });
        info!(
            "client {} registered from {}. total clients: {}",
            id,
            addr,
            inner.clients.len()
        );
        true
    }

    /// Stops tracking a connection. Idempotent: returns false if the id was
    /// never registered or was already removed.
    pub async fn unregister(&self, id: u32) -> bool {
        let mut inner = self.inner.write().await;
        if inner.clients.remove(&id).is_some() {
            info!(
                "client {} removed. total clients: {}",
                id,
                inner.clients.len()
            );
            true
        } else {
            false
        }
    }

    /// Sends a payload to every registered connection, skipping `exclude`.
    ///
    /// Delivery is best-effort: a failed send is logged and the remaining
    /// recipients still get the payload. Returns the number of successful
    /// deliveries.
    pub async fn broadcast(&self, payload: &[u8], exclude: Option<u32>) -> usize {
        let targets: Vec<(u32, SharedWriter)> = {
            let inner = self.inner.read().await;
            inner
                .clients
                .iter()
                .map(|(id, client)| (*id, client.writer.clone()))
                .collect()
        };

        let mut delivered = 0;
        for (id, writer) in targets {
            if Some(id) == exclude {
                continue;
            }
            let mut writer = writer.lock().await;
            match writer.write_all(payload).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!("failed to send broadcast to client {}: {}", id, e),
            }
        }
        delivered
    }

    /// True if the connection is currently tracked.
    pub async fn contains(&self, id: u32) -> bool {
        self.inner.read().await.clients.contains_key(&id)
    }

    /// Number of currently registered connections.
    pub async fn len(&self) -> usize {
        self.inner.read().await.clients.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.clients.is_empty()
    }

    /// Capacity the registry was created with.
    pub async fn capacity(&self) -> usize {
        self.inner.read().await.max_clients
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::Mutex;

    /// Loopback pair: the accept-side write half goes into the registry, the
    /// connect side plays the remote peer.
    async fn registered_writer() -> (SharedWriter, SocketAddr, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connect = TcpStream::connect(addr);
        let (accepted, connected) = tokio::join!(listener.accept(), connect);
        let (stream, peer_addr) = accepted.unwrap();
        let (_reader, writer) = stream.into_split();
        (Arc::new(Mutex::new(writer)), peer_addr, connected.unwrap())
    }

    #[tokio::test]
    async fn test_registry_creation() {
        let registry = ClientRegistry::new(5);
        assert_eq!(registry.capacity().await, 5);
        assert!(registry.is_empty().await);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_register_and_contains() {
        let registry = ClientRegistry::new(2);
        let (writer, addr, _peer) = registered_writer().await;

        assert!(registry.register(1, addr, writer).await);
        assert!(registry.contains(1).await);
        assert_eq!(registry.len().await, 1);
        assert!(!registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_register_rejected_at_capacity() {
        let registry = ClientRegistry::new(1);
        let (writer1, addr1, _peer1) = registered_writer().await;
        let (writer2, addr2, _peer2) = registered_writer().await;

        assert!(registry.register(1, addr1, writer1).await);
        assert!(!registry.register(2, addr2, writer2).await);
        assert_eq!(registry.len().await, 1);
        assert!(!registry.contains(2).await);
    }

    #[tokio::test]
    async fn test_unregister() {
        let registry = ClientRegistry::new(2);
        let (writer, addr, _peer) = registered_writer().await;

        registry.register(1, addr, writer).await;
        assert!(registry.unregister(1).await);
        assert_eq!(registry.len().await, 0);
        assert!(!registry.contains(1).await);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = ClientRegistry::new(2);
        assert!(!registry.unregister(999).await);

        let (writer, addr, _peer) = registered_writer().await;
        registry.register(1, addr, writer).await;
        assert!(registry.unregister(1).await);
        assert!(!registry.unregister(1).await);
    }

    #[tokio::test]
    async fn test_capacity_frees_up_after_unregister() {
        let registry = ClientRegistry::new(1);
        let (writer1, addr1, _peer1) = registered_writer().await;
        let (writer2, addr2, _peer2) = registered_writer().await;

        assert!(registry.register(1, addr1, writer1).await);
        registry.unregister(1).await;
        assert!(registry.register(2, addr2, writer2).await);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_registered() {
        let registry = ClientRegistry::new(4);
        let (writer1, addr1, mut peer1) = registered_writer().await;
        let (writer2, addr2, mut peer2) = registered_writer().await;

        registry.register(1, addr1, writer1).await;
        registry.register(2, addr2, writer2).await;

        let delivered = registry.broadcast(b"hello", None).await;
        assert_eq!(delivered, 2);

        let mut buf = [0u8; 16];
        let n = peer1.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello");
        let n = peer2.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello");
    }

    #[tokio::test]
    async fn test_broadcast_excludes_sender() {
        let registry = ClientRegistry::new(4);
        let (writer1, addr1, _peer1) = registered_writer().await;
        let (writer2, addr2, mut peer2) = registered_writer().await;

        registry.register(1, addr1, writer1).await;
        registry.register(2, addr2, writer2).await;

        let delivered = registry.broadcast(b"notice", Some(1)).await;
        assert_eq!(delivered, 1);

        let mut buf = [0u8; 16];
        let n = peer2.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"notice");
    }

    #[tokio::test]
    async fn test_broadcast_survives_failed_recipient() {
        let registry = ClientRegistry::new(4);
        let (writer1, addr1, mut peer1) = registered_writer().await;
        let (writer2, addr2, _peer2) = registered_writer().await;
        let (writer3, addr3, mut peer3) = registered_writer().await;

        registry.register(1, addr1, writer1).await;
        registry.register(2, addr2, Arc::clone(&writer2)).await;
        registry.register(3, addr3, writer3).await;

        // Shut down client 2's write half so its send fails outright.
        writer2.lock().await.shutdown().await.unwrap();

        let delivered = registry.broadcast(b"partial", None).await;
        assert_eq!(delivered, 2);

        let mut buf = [0u8; 16];
        let n = peer1.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"partial");
        let n = peer3.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"partial");

        // The failed recipient stays registered; teardown is the worker's
        // job, not the broadcast path's.
        assert!(registry.contains(2).await);
    }

    #[tokio::test]
    async fn test_broadcast_on_empty_registry() {
        let registry = ClientRegistry::new(4);
        assert_eq!(registry.broadcast(b"anyone?", None).await, 0);
    }
}
