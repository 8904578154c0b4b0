// tests/integration/lifecycle_test.rs

//! Connection lifecycle: teardown on quit, abrupt disconnect, protocol
//! violations, and periodic heartbeats.

use super::test_helpers::{TestClient, TestServer, eventually};
use mudstone::config::{Config, HeartbeatConfig};
use mudstone::core::protocol::{CommandType, MessageKind};
use mudstone::core::world::WorldStore;
use std::time::Duration;

#[tokio::test]
async fn test_quit_clears_the_session_and_closes_the_stream() {
    let server = TestServer::spawn().await;
    let mut client = TestClient::connect(server.addr).await;
    client.login_new("finn").await;

    client.send_command(CommandType::Quit, "").await;
    assert!(
        client.try_next_frame().await.is_none(),
        "server must close the stream after QUIT"
    );

    let state = server.state.clone();
    eventually("registry to empty after quit", || {
        let state = state.clone();
        async move { state.registry.is_empty() }
    })
    .await;
    assert_eq!(server.state.world.connection_of("finn").await.unwrap(), None);

    // The character is free again: a fresh login succeeds.
    let mut again = TestClient::connect(server.addr).await;
    again
        .send_login(mudstone::core::protocol::LoginType::Existing, "finn", "hash")
        .await;
    let frame = again.next_non_heartbeat().await;
    assert_eq!(frame.kind, MessageKind::Ack.code());
}

#[tokio::test]
async fn test_abrupt_disconnect_tears_down_exactly_once() {
    let server = TestServer::spawn().await;
    let mut client = TestClient::connect(server.addr).await;
    client.login_new("finn").await;

    let state = server.state.clone();
    eventually("connection to register", || {
        let state = state.clone();
        async move { state.registry.len() == 1 }
    })
    .await;

    // Drop the socket without a QUIT: the zero-length read drives teardown.
    drop(client);

    let state = server.state.clone();
    eventually("registry to empty after disconnect", || {
        let state = state.clone();
        async move { state.registry.is_empty() }
    })
    .await;
    assert_eq!(server.state.world.connection_of("finn").await.unwrap(), None);
    assert_eq!(server.state.stats.get_connected_clients(), 0);
    assert!(server.state.world.list_online().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_protocol_violation_drops_only_the_offender() {
    let server = TestServer::spawn().await;

    let mut honest = TestClient::connect(server.addr).await;
    honest.login_new("finn").await;

    // A header announcing a 2-byte total length is below the 4-byte minimum.
    let mut offender = TestClient::connect(server.addr).await;
    offender.send_raw(&[1, 0, 2, 0]).await;
    assert!(
        offender.try_next_frame().await.is_none(),
        "protocol violation must close the offending connection"
    );

    // The sibling connection is unaffected.
    honest.send_command(CommandType::Look, "").await;
    honest.expect_room().await;

    let state = server.state.clone();
    eventually("offender to leave the registry", || {
        let state = state.clone();
        async move { state.registry.len() == 1 }
    })
    .await;
}

#[tokio::test]
async fn test_malformed_json_body_drops_the_connection() {
    let server = TestServer::spawn().await;
    let mut client = TestClient::connect(server.addr).await;

    // Kind 4 (login) with a 5-byte body that is not JSON.
    client.send_raw(&[4, 0, 9, 0, b'n', b'o', b'p', b'e', b'!']).await;
    assert!(client.try_next_frame().await.is_none());
}

#[tokio::test]
async fn test_periodic_heartbeats_reach_idle_clients() {
    let config = Config {
        heartbeat: HeartbeatConfig {
            tick_interval: Duration::from_millis(5),
            ticks_per_beat: 2,
        },
        ..Config::default()
    };
    let server = TestServer::spawn_with_config(config).await;
    let mut client = TestClient::connect(server.addr).await;

    // Without sending anything, the scheduler's broadcast arrives.
    let frame = client.next_frame().await;
    assert_eq!(frame.kind, MessageKind::Heartbeat.code());
    assert!(frame.payload.is_empty());
}

#[tokio::test]
async fn test_shutdown_signal_closes_client_connections() {
    let server = TestServer::spawn().await;
    let mut client = TestClient::connect(server.addr).await;
    client.login_new("finn").await;

    server.shutdown_tx.send(()).unwrap();
    assert!(
        client.try_next_frame().await.is_none(),
        "global shutdown must close the stream"
    );
}
