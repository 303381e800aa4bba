//! # Connection-Dispatch Server Library
//!
//! This library implements a concurrent TCP server that separates accepting
//! connections from servicing them. A single listener accepts sockets and
//! hands them to a fixed pool of workers through a thread-safe FIFO queue;
//! each dispatched connection is serviced by two cooperating tasks (the
//! worker's inbound read loop and a per-connection sender pushing periodic
//! outbound traffic) while a bounded registry tracks active connections
//! for broadcast.
//!
//! ## Core Responsibilities
//!
//! ### Dispatch
//! Accepted connections are queued in arrival order and picked up by
//! whichever worker frees up first. With `W` workers, at most `W`
//! connections are actively read at once; the rest wait in the unbounded
//! queue. This caps concurrent service without ever stalling the accept
//! loop.
//!
//! ### Connection Service
//! The server is byte-stream agnostic: inbound payloads are logged, not
//! parsed, and outbound traffic is a periodic plain-text message. An
//! application layer would replace both ends without touching the dispatch
//! machinery.
//!
//! ### Broadcast
//! The registry can push one payload to every tracked connection,
//! best-effort, with per-recipient failure isolation. Capacity bounds the
//! broadcast fan-out only; connections beyond it are still serviced.
//!
//! ## Module Organization
//!
//! - [`connection`]: the per-connection handle: split socket halves, close
//!   signaling, and the ownership rules that make teardown race-free
//! - [`queue`]: FIFO handoff from the listener to the workers
//! - [`registry`]: bounded active-connection set and broadcast
//! - [`worker`]: the long-lived worker pool and per-connection service loop
//! - [`sender`]: per-connection outbound traffic task
//! - [`server`]: socket setup, configuration, and the accept loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind("127.0.0.1:8080", ServerConfig::default()).await?;
//!     server.run().await
//! }
//! ```
//!
//! ## Failure Model
//!
//! Setup failures (bind/listen) abort startup with an error before any
//! worker starts. Everything after that is scoped to a single connection:
//! accept, read, and send errors are logged and tear down at most the one
//! connection involved, never the server.

pub mod connection;
pub mod queue;
pub mod registry;
pub mod sender;
pub mod server;
pub mod worker;

pub use connection::Connection;
pub use queue::ConnectionQueue;
pub use registry::ClientRegistry;
pub use server::{Server, ServerConfig};
pub use worker::WorkerPool;
