//! Mock server startup that tolerates sandboxes without loopback sockets.

use wiremock::MockServer;

/// Starts a wiremock server, or returns `None` (after printing why) when the
/// environment forbids binding a localhost socket.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if let Err(e) = std::net::TcpListener::bind("127.0.0.1:0") {
        eprintln!("skipping socket-bound test: cannot bind localhost ({e})");
        return None;
    }
    Some(MockServer::start().await)
}
