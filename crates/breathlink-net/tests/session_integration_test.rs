//! Integration tests for the blocking TCP runtime.
//!
//! These run the real server and client against real sockets on the
//! loopback interface. A raw `TcpStream` plays the peer in most tests so
//! the wire-level behavior (single-read JSON framing, exact reply codes
//! and texts) is exercised without going through the typed client.

use std::{
    io::{ErrorKind, Read, Write},
    net::TcpStream,
    sync::mpsc::{Receiver, RecvTimeoutError},
    time::{Duration, Instant},
};

use breathlink_core::{ClientConfig, Pairing, ServerConfig};
use breathlink_net::{NetClient, NetEvent, NetServer};
use breathlink_proto::{CommandRequest, ResponseMessage, code};
use serde_json::{Value, json};

const TOKEN: &str = "ABC123";

/// Start a server on an ephemeral loopback port with a known token.
fn start_server(ready: bool) -> (NetServer, Receiver<NetEvent>) {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        pairing: Pairing::Static { port: 0, token: TOKEN.to_string() },
        read_timeout: Duration::from_millis(100),
    };
    let (server, events) = NetServer::start(config).unwrap();
    server.set_ready(ready);
    (server, events)
}

/// Connect a raw peer socket to the server.
fn connect(server: &NetServer) -> TcpStream {
    let stream = TcpStream::connect(server.local_addr()).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream
}

fn send(stream: &mut TcpStream, payload: &Value) {
    stream.write_all(&serde_json::to_vec(payload).unwrap()).unwrap();
}

/// One legacy-discipline read: at most 1024 bytes, one message.
fn read_reply(stream: &mut TcpStream) -> ResponseMessage {
    let mut buffer = [0u8; 1024];
    let len = stream.read(&mut buffer).unwrap();
    assert_ne!(len, 0, "connection closed while a reply was expected");
    serde_json::from_slice(&buffer[..len]).unwrap()
}

fn authenticate(stream: &mut TcpStream) {
    send(stream, &json!({"type": "auth", "token": TOKEN}));
    let reply = read_reply(stream);
    assert_eq!(reply.code, code::OK, "handshake failed: {}", reply.msg);
}

/// Poll until `done` holds or the deadline passes.
fn wait_for(mut done: impl FnMut() -> bool, what: &str) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn endpoint_surfaces_the_pairing_token() {
    let (server, _events) = start_server(false);

    let endpoint = server.endpoint();
    assert_eq!(endpoint.token, TOKEN);
    assert_ne!(endpoint.port, 0, "bound port should be surfaced, not the configured 0");
    assert_eq!(endpoint.to_string(), format!("127.0.0.1:{}", endpoint.port));
}

#[test]
fn wrong_token_is_rejected_and_retry_succeeds() {
    let (server, _events) = start_server(true);
    let mut peer = connect(&server);

    send(&mut peer, &json!({"type": "auth", "token": "WRONG1"}));
    let reply = read_reply(&mut peer);
    assert_eq!(reply.code, code::TOKEN_NOT_FOUND);
    assert_eq!(reply.msg, "Your auth-token not found.");

    // The session stays open; the peer retries on the same connection.
    send(&mut peer, &json!({"type": "auth", "token": TOKEN}));
    let reply = read_reply(&mut peer);
    assert_eq!(reply.code, code::OK);
    assert_eq!(reply.msg, "Authorization is successful.");
}

#[test]
fn malformed_auth_gets_400_and_stays_open() {
    let (server, _events) = start_server(true);
    let mut peer = connect(&server);

    send(&mut peer, &json!({"token": TOKEN}));
    let reply = read_reply(&mut peer);
    assert_eq!(reply.code, code::BAD_REQUEST);

    authenticate(&mut peer);
}

#[test]
fn test_mode_dispatches_and_acknowledges() {
    let (server, events) = start_server(true);
    let mut peer = connect(&server);
    authenticate(&mut peer);

    send(&mut peer, &json!({"type": "mode", "mode": "test", "time": 5}));

    let reply = read_reply(&mut peer);
    assert_eq!(reply.code, code::OK);
    assert_eq!(reply.msg, "Starting test command...");

    let event = events.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(event, NetEvent::Command(CommandRequest::test(5)));
}

#[test]
fn command_while_not_ready_is_discarded_with_425() {
    let (server, events) = start_server(false);
    let mut peer = connect(&server);
    authenticate(&mut peer);

    send(&mut peer, &json!({"type": "mode", "mode": "rehab"}));

    let reply = read_reply(&mut peer);
    assert_eq!(reply.code, code::NOT_READY);
    assert_eq!(reply.msg, "The application is not ready yet.");

    // The command was discarded, not queued.
    assert_eq!(events.recv_timeout(Duration::from_millis(300)), Err(RecvTimeoutError::Timeout));
}

#[test]
fn invalid_command_gets_400_and_loop_continues() {
    let (server, events) = start_server(true);
    let mut peer = connect(&server);
    authenticate(&mut peer);

    send(&mut peer, &json!({"type": "mode", "mode": "test"}));
    let reply = read_reply(&mut peer);
    assert_eq!(reply.code, code::BAD_REQUEST);

    send(&mut peer, &json!({"type": "mode", "mode": "test", "time": 1}));
    let reply = read_reply(&mut peer);
    assert_eq!(reply.code, code::OK);
    assert!(events.recv_timeout(Duration::from_secs(2)).is_ok());
}

#[test]
fn malformed_bytes_are_ignored_mid_loop() {
    let (server, _events) = start_server(true);
    let mut peer = connect(&server);
    authenticate(&mut peer);

    peer.write_all(b"definitely not json").unwrap();

    // The next well-formed command is served as if nothing happened.
    send(&mut peer, &json!({"type": "stop"}));
    let reply = read_reply(&mut peer);
    assert_eq!(reply.code, code::OK);
    assert_eq!(reply.msg, "Starting stop command...");
}

#[test]
fn close_disconnects_gracefully() {
    let (server, _events) = start_server(true);
    let mut peer = connect(&server);
    authenticate(&mut peer);

    send(&mut peer, &json!({"type": "close"}));

    let reply = read_reply(&mut peer);
    assert_eq!(reply.code, code::OK);
    assert_eq!(reply.msg, "Disconnected successfully.");

    // The server releases the socket after the farewell.
    let mut buffer = [0u8; 16];
    assert_eq!(peer.read(&mut buffer).unwrap_or(0), 0);
}

#[test]
fn second_connection_waits_for_the_first_session() {
    let (server, _events) = start_server(true);

    let mut first = connect(&server);
    authenticate(&mut first);

    // The second peer can connect (OS backlog) but gets no handshake
    // service while the first session is open.
    let mut second = connect(&server);
    send(&mut second, &json!({"type": "auth", "token": TOKEN}));
    second.set_read_timeout(Some(Duration::from_millis(300))).unwrap();
    let starved = second.read(&mut [0u8; 1024]);
    match starved {
        Err(error) => assert!(
            matches!(error.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut),
            "unexpected error: {error}"
        ),
        Ok(len) => unreachable!("second peer was served early: {len} bytes"),
    }

    // Once the first session closes, the queued peer is served.
    send(&mut first, &json!({"type": "close"}));
    assert_eq!(read_reply(&mut first).code, code::OK);

    second.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let reply = read_reply(&mut second);
    assert_eq!(reply.code, code::OK);
    assert_eq!(reply.msg, "Authorization is successful.");
}

#[test]
fn forced_shutdown_sends_521_then_closes() {
    let (mut server, _events) = start_server(true);
    let mut peer = connect(&server);
    authenticate(&mut peer);

    // stop() is synchronous: the thread is joined when it returns, which
    // means the farewell has already been written.
    server.stop();

    let reply = read_reply(&mut peer);
    assert_eq!(reply.code, code::SERVER_DOWN);
    assert_eq!(reply.msg, "Server is Down");

    let mut buffer = [0u8; 16];
    assert_eq!(peer.read(&mut buffer).unwrap_or(0), 0);
}

#[test]
fn typed_client_end_to_end() {
    let (mut server, server_events) = start_server(true);

    let mut config = ClientConfig::new(server.local_addr().to_string());
    config.read_timeout = Duration::from_millis(100);
    let registration = json!({"type": "auth", "token": TOKEN});
    let (client, client_events) = NetClient::connect(config, Some(registration)).unwrap();

    // Handshake reply is forwarded to the application.
    let event = client_events.recv_timeout(Duration::from_secs(2)).unwrap();
    let NetEvent::Response(reply) = event else {
        unreachable!("expected a response event");
    };
    assert_eq!(reply.code, code::OK);
    assert_eq!(reply.msg, "Authorization is successful.");

    // Commands pushed through the client reach the host application.
    client.send(&CommandRequest::test(2)).unwrap();
    let event = server_events.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(event, NetEvent::Command(CommandRequest::test(2)));

    let event = client_events.recv_timeout(Duration::from_secs(2)).unwrap();
    let NetEvent::Response(ack) = event else {
        unreachable!("expected a response event");
    };
    assert_eq!(ack.msg, "Starting test command...");

    // Host shutdown reaches the client as 521 and ends its loop.
    server.stop();
    let event = client_events.recv_timeout(Duration::from_secs(2)).unwrap();
    let NetEvent::Response(farewell) = event else {
        unreachable!("expected a response event");
    };
    assert_eq!(farewell.code, code::SERVER_DOWN);

    wait_for(|| !client.connected(), "client to observe the shutdown");
}

#[test]
fn rejected_registration_closes_the_client() {
    let (server, _events) = start_server(true);

    let mut config = ClientConfig::new(server.local_addr().to_string());
    config.read_timeout = Duration::from_millis(100);
    let (client, client_events) =
        NetClient::connect(config, Some(json!({"hello": "world"}))).unwrap();

    let event = client_events.recv_timeout(Duration::from_secs(2)).unwrap();
    let NetEvent::Response(reply) = event else {
        unreachable!("expected a response event");
    };
    assert_eq!(reply.code, code::BAD_REQUEST);

    wait_for(|| !client.connected(), "client to close after rejection");
}

#[test]
fn connect_to_nothing_fails_fast() {
    let mut config = ClientConfig::new("127.0.0.1:1");
    config.connect_timeout = Duration::from_millis(500);
    assert!(NetClient::connect(config, None).is_err());
}
