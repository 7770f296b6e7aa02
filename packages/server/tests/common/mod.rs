//! Helpers shared by the integration tests: an in-process server bound to an
//! ephemeral port and a thin JSON WebSocket client.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use irori_server::{
    domain::MessageLog,
    infrastructure::{
        auth::StaticTokenVerifier,
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryConnectionRegistry, InMemoryMessageLog, InMemoryRoomRepository},
    },
    ui::{AppState, Dependencies, Server},
};
use irori_shared::time::SystemClock;
use serde_json::{Value, json};
use tokio::{net::TcpStream, sync::oneshot, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const RECV_TIMEOUT: Duration = Duration::from_secs(3);

/// Server running inside the test runtime
pub struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    /// Start a server with an in-memory message log and no tokens
    pub async fn start() -> Self {
        Self::start_with(Arc::new(InMemoryMessageLog::new()), StaticTokenVerifier::new()).await
    }

    /// Start a server on top of the given message log and token table
    pub async fn start_with(
        message_log: Arc<dyn MessageLog>,
        token_verifier: StaticTokenVerifier,
    ) -> Self {
        let state = AppState::new(Dependencies {
            rooms: Arc::new(InMemoryRoomRepository::default()),
            registry: Arc::new(InMemoryConnectionRegistry::default()),
            message_log,
            message_pusher: Arc::new(WebSocketMessagePusher::default()),
            token_verifier: Arc::new(token_verifier),
            clock: Arc::new(SystemClock),
            initial_limit: 100,
            scrollback_limit: 50,
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(Server::new(state).serve(listener, async move {
            let _ = shutdown_rx.await;
        }));

        TestServer {
            addr,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    /// WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// HTTP URL for the given path
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Open a WebSocket connection without a token
    pub async fn connect(&self) -> TestClient {
        TestClient::connect(&self.ws_url()).await
    }

    /// Open a WebSocket connection carrying `?token=`
    pub async fn connect_with_token(&self, token: &str) -> TestClient {
        TestClient::connect(&format!("{}?token={}", self.ws_url(), token)).await
    }

    /// Signal graceful shutdown and wait for the serve task to finish
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(RECV_TIMEOUT, &mut self.handle).await;
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// JSON-speaking WebSocket client
pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Connect and wait until the server has attached the connection.
    ///
    /// The `get_rooms` round trip guarantees that later broadcasts reach this
    /// client.
    pub async fn connect(url: &str) -> Self {
        let (stream, _) = connect_async(url)
            .await
            .expect("Failed to connect to test server");
        let mut client = TestClient { stream };
        client.send(json!({ "type": "get_rooms" })).await;
        client.expect("available_rooms").await;
        client
    }

    pub async fn send(&mut self, event: Value) {
        self.stream
            .send(Message::text(event.to_string()))
            .await
            .expect("Failed to send frame");
    }

    /// Next JSON event, or None if nothing arrives within the timeout
    pub async fn next_event(&mut self) -> Option<Value> {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .ok()??
                .ok()?;
            if let Message::Text(text) = frame {
                return Some(serde_json::from_str(text.as_str()).expect("Server sent invalid JSON"));
            }
        }
    }

    /// Skip events until one of the given type arrives
    pub async fn expect(&mut self, event_type: &str) -> Value {
        loop {
            let event = self
                .next_event()
                .await
                .unwrap_or_else(|| panic!("Timed out waiting for {}", event_type));
            if event["type"] == event_type {
                return event;
            }
        }
    }

    /// Announce an identity and wait for this connection's own online status
    pub async fn user_connected(&mut self, user_id: &str, username: &str) {
        self.send(json!({ "type": "user_connected", "userId": user_id, "username": username }))
            .await;
        loop {
            let event = self.expect("user_status_changed").await;
            if event["userId"] == user_id && event["status"] == "online" {
                break;
            }
        }
    }

    /// Join a room and return its `room_history` event
    pub async fn join(&mut self, room_id: &str) -> Value {
        self.send(json!({ "type": "join_room", "roomId": room_id }))
            .await;
        self.expect("room_history").await
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}

/// Contents of a `messages` array, in order
pub fn contents(event: &Value) -> Vec<String> {
    event["messages"]
        .as_array()
        .expect("messages must be an array")
        .iter()
        .map(|m| m["content"].as_str().unwrap_or_default().to_string())
        .collect()
}
