//! Defaults and message formatting shared by the dispatch server, the test
//! peers, and the workspace integration tests.
//!
//! The server treats every payload as an opaque byte stream, so nothing in
//! here is a wire protocol. The formatters only exist so the server's sender
//! tasks, the sending test peer, and the tests that observe their output all
//! agree on the same human-readable text.

/// Address the test peers connect to when none is given on the command line.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Port the server listens on by default.
pub const DEFAULT_PORT: u16 = 8080;
/// Accept backlog depth for the listening socket.
pub const DEFAULT_BACKLOG: u32 = 10;
/// Buffer size used for each socket read.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;
/// Number of worker tasks servicing connections concurrently.
pub const DEFAULT_WORKERS: usize = 4;
/// Maximum number of clients tracked for broadcast fan-out.
pub const DEFAULT_MAX_CLIENTS: usize = 100;
/// Interval between outbound messages pushed on each connection, in ms.
pub const DEFAULT_SEND_INTERVAL_MS: u64 = 1000;

/// Formats the periodic message a connection's sender task pushes to its peer.
pub fn server_message(counter: u64) -> String {
    format!("Server test message #{}", counter)
}

/// Formats the payload the sending test peer pushes to the server.
pub fn peer_message(counter: u64) -> String {
    format!("Test message #{} from sender", counter)
}

/// Formats the notice broadcast to registered clients when a connection is
/// dispatched to a worker.
pub fn join_notice(id: u32) -> String {
    format!("client {} joined", id)
}

/// Formats the notice broadcast to registered clients when a connection
/// closes.
pub fn leave_notice(id: u32) -> String {
    format!("client {} left", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_format() {
        assert_eq!(server_message(0), "Server test message #0");
        assert_eq!(server_message(42), "Server test message #42");
    }

    #[test]
    fn test_server_message_counter_monotonic_text() {
        // Consecutive counters must produce distinct payloads so a peer can
        // tell messages apart without any framing.
        let a = server_message(7);
        let b = server_message(8);
        assert_ne!(a, b);
    }

    #[test]
    fn test_peer_message_format() {
        assert_eq!(peer_message(3), "Test message #3 from sender");
    }

    #[test]
    fn test_notice_formats() {
        assert_eq!(join_notice(5), "client 5 joined");
        assert_eq!(leave_notice(5), "client 5 left");
        assert_ne!(join_notice(1), leave_notice(1));
    }

    #[test]
    fn test_defaults_are_sane() {
        assert!(DEFAULT_WORKERS > 0);
        assert!(DEFAULT_MAX_CLIENTS >= DEFAULT_WORKERS);
        assert!(DEFAULT_BUFFER_SIZE >= 512);
        assert!(DEFAULT_SEND_INTERVAL_MS > 0);
    }
}
