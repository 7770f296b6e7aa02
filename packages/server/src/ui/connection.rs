//! Per-connection event dispatch.
//!
//! A `ConnectionHandler` owns the `Session` of one WebSocket and turns each
//! inbound frame into a call to the matching use case. Frames from one
//! connection are handled strictly in arrival order.

use std::{panic::AssertUnwindSafe, sync::Arc};

use futures_util::FutureExt;

use crate::{
    domain::{MessageContent, RoomId, Session, SessionState, Timestamp},
    infrastructure::dto::{conversion::optional_field, websocket::ClientEvent},
    ui::state::AppState,
};

pub struct ConnectionHandler {
    state: Arc<AppState>,
    session: Session,
}

impl ConnectionHandler {
    pub fn new(state: Arc<AppState>, session: Session) -> Self {
        Self { state, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Handle one text frame. Malformed frames are logged and dropped.
    pub async fn handle_text(&mut self, text: &str) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.handle_event(event).await,
            Err(e) => tracing::warn!(
                "Ignoring malformed frame from '{}': {}",
                self.session.connection_id(),
                e
            ),
        }
    }

    /// Handle one event behind a panic boundary.
    pub async fn handle_event(&mut self, event: ClientEvent) {
        let connection_id = self.session.connection_id().clone();
        if let Err(panic) = AssertUnwindSafe(self.dispatch(event)).catch_unwind().await {
            tracing::error!(
                "Event handler panicked on '{}': {}",
                connection_id,
                panic_message(panic.as_ref())
            );
        }
    }

    /// Run disconnect cleanup. Safe to call more than once.
    pub async fn close(&mut self) {
        if self.session.state() == SessionState::Disconnected {
            return;
        }
        let connection_id = self.session.connection_id().clone();
        let bound = self.session.disconnect();
        let cleanup = self
            .state
            .disconnect_user_usecase
            .execute(&connection_id, bound.as_ref());
        if let Err(panic) = AssertUnwindSafe(cleanup).catch_unwind().await {
            tracing::error!(
                "Disconnect cleanup panicked on '{}': {}",
                connection_id,
                panic_message(panic.as_ref())
            );
        }
    }

    async fn dispatch(&mut self, event: ClientEvent) {
        let connection_id = self.session.connection_id().clone();
        tracing::debug!("'{}' -> {:?}", connection_id, event);

        match event {
            ClientEvent::UserConnected { user_id, username } => {
                if self.session.bound_identity().is_some() {
                    tracing::debug!("'{}' is already bound, ignoring user_connected", connection_id);
                    return;
                }
                match self
                    .session
                    .bind(optional_field(user_id), optional_field(username))
                {
                    Ok(identity) => {
                        self.state
                            .connect_user_usecase
                            .execute(&connection_id, &identity)
                            .await;
                    }
                    Err(e) => tracing::warn!("Cannot bind identity: {}", e),
                }
            }
            ClientEvent::GetRooms => {
                self.state
                    .get_rooms_usecase
                    .reply_to(&connection_id)
                    .await;
            }
            ClientEvent::JoinRoom {
                room_id,
                user_id,
                username,
            } => {
                let Some(room) = self.room_or_warn(room_id, "join_room") else {
                    return;
                };
                let identity = match self
                    .session
                    .resolve(optional_field(user_id), optional_field(username))
                {
                    Ok(identity) => identity,
                    Err(e) => {
                        tracing::warn!("Ignoring join_room: {}", e);
                        return;
                    }
                };
                if let Err(e) = self.session.enter_room(room.clone()) {
                    tracing::warn!("Ignoring join_room: {}", e);
                    return;
                }
                self.state
                    .join_room_usecase
                    .execute(&connection_id, &identity, &room)
                    .await;
            }
            ClientEvent::LeaveRoom {
                room_id,
                user_id,
                username,
            } => {
                let Some(room) = self.room_or_warn(room_id, "leave_room") else {
                    return;
                };
                let identity = match self
                    .session
                    .resolve(optional_field(user_id), optional_field(username))
                {
                    Ok(identity) => identity,
                    Err(e) => {
                        tracing::warn!("Ignoring leave_room: {}", e);
                        return;
                    }
                };
                self.session.exit_room(&room);
                self.state
                    .leave_room_usecase
                    .execute(&room, &identity)
                    .await;
            }
            ClientEvent::SendMessage {
                room_id,
                content,
                username,
            } => {
                let Some(room) = self.room_or_warn(room_id, "send_message") else {
                    return;
                };
                let Some(content) = optional_field::<MessageContent>(content) else {
                    tracing::warn!("Ignoring send_message without valid content");
                    return;
                };
                let identity = match self.session.resolve(None, optional_field(username)) {
                    Ok(identity) => identity,
                    Err(e) => {
                        tracing::warn!("Ignoring send_message: {}", e);
                        return;
                    }
                };
                // The sender has already been told about the failure
                let _ = self
                    .state
                    .send_message_usecase
                    .execute(&connection_id, &identity, &room, content)
                    .await;
            }
            ClientEvent::LoadMoreMessages { room_id, before } => {
                let Some(room) = self.room_or_warn(room_id, "load_more_messages") else {
                    return;
                };
                self.state
                    .load_more_messages_usecase
                    .execute(&connection_id, &room, before.map(Timestamp::new))
                    .await;
            }
            ClientEvent::Typing { room_id, username } => {
                let Some(room) = self.room_or_warn(room_id, "typing") else {
                    return;
                };
                match self.session.resolve(None, optional_field(username)) {
                    Ok(identity) => {
                        self.state
                            .typing_usecase
                            .start(&room, identity.username())
                            .await;
                    }
                    Err(e) => tracing::warn!("Ignoring typing: {}", e),
                }
            }
            ClientEvent::StopTyping { room_id, username } => {
                let Some(room) = self.room_or_warn(room_id, "stop_typing") else {
                    return;
                };
                match self.session.resolve(None, optional_field(username)) {
                    Ok(identity) => {
                        self.state
                            .typing_usecase
                            .stop(&room, identity.username())
                            .await;
                    }
                    Err(e) => tracing::warn!("Ignoring stop_typing: {}", e),
                }
            }
        }
    }

    fn room_or_warn(&self, room_id: Option<String>, event: &str) -> Option<RoomId> {
        let room = optional_field::<RoomId>(room_id);
        if room.is_none() {
            tracing::warn!(
                "Ignoring {} from '{}' without a valid roomId",
                event,
                self.session.connection_id()
            );
        }
        room
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
