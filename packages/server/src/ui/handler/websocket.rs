//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionIdFactory, Identity, Session},
    ui::{connection::ConnectionHandler, state::AppState},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Optional bearer token; an unknown token yields an unauthenticated session
    pub token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    let verified = match query.token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => {
            let identity = state.token_verifier.verify(token).await;
            if identity.is_none() {
                tracing::warn!("Token verification failed, continuing unauthenticated");
            }
            identity
        }
        None => None,
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, verified))
}

/// Spawns a task that receives frames from the rx channel and pushes them to the WebSocket sender.
///
/// This function handles the outbound flow: events produced by any use case
/// for this connection (via rx channel) are written to its WebSocket.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, verified: Option<Identity>) {
    let connection_id = ConnectionIdFactory::generate();
    tracing::info!(
        "Connection '{}' opened ({})",
        connection_id,
        verified
            .as_ref()
            .map(Identity::kind)
            .unwrap_or("unauthenticated")
    );

    // Create a channel for this connection to receive events
    let (tx, rx) = mpsc::unbounded_channel();
    state
        .connect_user_usecase
        .attach(connection_id.clone(), tx)
        .await;

    let (sender, mut receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);
    let mut handler = ConnectionHandler::new(state, Session::new(connection_id.clone(), verified));

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let msg = match incoming {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket error on '{}': {}", connection_id, e);
                        break;
                    }
                    None => break,
                };

                match msg {
                    Message::Text(text) => handler.handle_text(text.as_str()).await,
                    Message::Close(_) => {
                        tracing::info!("Connection '{}' requested close", connection_id);
                        break;
                    }
                    Message::Binary(_) => {
                        tracing::debug!("Ignoring binary frame from '{}'", connection_id);
                    }
                    // Ping/pong is handled automatically by the WebSocket protocol
                    _ => {}
                }
            }
            _ = &mut send_task => break,
        }
    }

    send_task.abort();
    handler.close().await;
    tracing::info!("Connection '{}' closed", connection_id);
}
