// tests/integration/test_helpers.rs

//! Test helpers: boot a real server on an ephemeral port and drive it with a
//! framed client.

use futures::{SinkExt, StreamExt};
use mudstone::config::Config;
use mudstone::connection::ConnectionHandler;
use mudstone::core::protocol::{
    Ack, AckKind, Command, CommandType, Frame, FrameCodec, Login, LoginType, MessageKind, Room,
    ServerMessage,
};
use mudstone::core::state::ServerState;
use mudstone::core::tasks::heartbeat::HeartbeatTask;
use mudstone::core::world::InMemoryWorld;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_util::codec::Framed;

/// A running server with its accept loop and heartbeat scheduler, bound to an
/// ephemeral loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<ServerState>,
    pub shutdown_tx: broadcast::Sender<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(Config::default()).await
    }

    pub async fn spawn_with_config(config: Config) -> Self {
        let state = ServerState::new(config, Arc::new(InMemoryWorld::new()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, _) = broadcast::channel(1);

        tokio::spawn(HeartbeatTask::new(state.clone()).run(shutdown_tx.subscribe()));

        let accept_state = state.clone();
        let accept_shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut next_id: u64 = 0;
            let mut shutdown_rx = accept_shutdown.subscribe();
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    res = listener.accept() => {
                        let Ok((socket, peer)) = res else { break };
                        next_id += 1;
                        accept_state.stats.increment_total_connections();
                        let handler = ConnectionHandler::accept(
                            socket,
                            peer,
                            accept_state.clone(),
                            next_id,
                            accept_shutdown.subscribe(),
                        );
                        tokio::spawn(handler.run());
                    }
                }
            }
        });

        Self {
            addr,
            state,
            shutdown_tx,
        }
    }
}

/// Polls an async condition until it holds, panicking after five seconds.
pub async fn eventually<F, Fut>(what: &str, mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..500 {
        if condition().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {what}");
}

/// A framed client driving the server like the real game front-end would.
pub struct TestClient {
    framed: Framed<TcpStream, FrameCodec>,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let socket = TcpStream::connect(addr).await.unwrap();
        Self {
            framed: Framed::new(socket, FrameCodec::new()),
        }
    }

    pub async fn send(&mut self, frame: Frame) {
        self.framed.send(frame).await.unwrap();
    }

    /// Writes pre-encoded bytes directly, bypassing the codec. Used to
    /// deliver several messages in a single chunk or to inject invalid data.
    pub async fn send_raw(&mut self, bytes: &[u8]) {
        let stream = self.framed.get_mut();
        stream.write_all(bytes).await.unwrap();
        stream.flush().await.unwrap();
    }

    pub async fn send_login(&mut self, login_type: LoginType, name: &str, hash: &str) {
        self.send(
            Frame::from_payload(
                MessageKind::Login,
                &Login {
                    login_type,
                    name: name.to_string(),
                    hash: hash.to_string(),
                },
            )
            .unwrap(),
        )
        .await;
    }

    pub async fn send_command(&mut self, command_type: CommandType, arguments: &str) {
        self.send(
            Frame::from_payload(
                MessageKind::Command,
                &Command {
                    command_type,
                    arguments: arguments.to_string(),
                },
            )
            .unwrap(),
        )
        .await;
    }

    /// The next inbound frame, or `None` once the server closed the stream.
    /// An abortive close (reset instead of a clean FIN) also counts as closed.
    pub async fn try_next_frame(&mut self) -> Option<Frame> {
        tokio::time::timeout(Duration::from_secs(5), self.framed.next())
            .await
            .expect("timed out waiting for a frame")
            .and_then(|res| res.ok())
    }

    pub async fn next_frame(&mut self) -> Frame {
        self.try_next_frame()
            .await
            .expect("server closed the stream")
    }

    /// The next frame that is not a periodic heartbeat.
    pub async fn next_non_heartbeat(&mut self) -> Frame {
        loop {
            let frame = self.next_frame().await;
            if frame.kind != MessageKind::Heartbeat.code() {
                return frame;
            }
        }
    }

    pub async fn expect_room(&mut self) -> Room {
        let frame = self.next_non_heartbeat().await;
        assert_eq!(frame.kind, MessageKind::Room.code(), "expected a Room frame");
        serde_json::from_slice(&frame.payload).unwrap()
    }

    pub async fn expect_server_message(&mut self) -> ServerMessage {
        let frame = self.next_non_heartbeat().await;
        assert_eq!(
            frame.kind,
            MessageKind::ServerMessage.code(),
            "expected a ServerMessage frame"
        );
        serde_json::from_slice(&frame.payload).unwrap()
    }

    /// Creates a character and consumes the Ack + Room exchange.
    pub async fn login_new(&mut self, name: &str) -> Room {
        self.send_login(LoginType::New, name, "hash").await;
        let ack_frame = self.next_non_heartbeat().await;
        assert_eq!(ack_frame.kind, MessageKind::Ack.code(), "expected login ack");
        let ack: Ack = serde_json::from_slice(&ack_frame.payload).unwrap();
        assert_eq!(ack.kind, AckKind::Login);
        self.expect_room().await
    }
}
