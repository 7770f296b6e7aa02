//! UseCase: タイピング表示
//!
//! タイピング集合はメンバー集合とは独立している。サーバー側のタイムアウトはなく、
//! stop_typing・退出・切断でのみ消える。

use std::sync::Arc;

use crate::domain::{MessagePusher, OutboundEvent, Room, RoomId, RoomRepository, Username};

use super::sequencer::RoomEventSequencer;

/// タイピング表示のユースケース
pub struct TypingUseCase {
    rooms: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    sequencer: Arc<RoomEventSequencer>,
}

impl TypingUseCase {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        sequencer: Arc<RoomEventSequencer>,
    ) -> Self {
        Self {
            rooms,
            message_pusher,
            sequencer,
        }
    }

    /// タイピング開始。新たに追加された場合だけ通知し、true を返す
    pub async fn start(&self, room_id: &RoomId, username: &Username) -> bool {
        let _turn = self.sequencer.enter().await;
        match self.rooms.start_typing(room_id, username).await {
            Some(room) => {
                self.broadcast_typing(&room).await;
                true
            }
            None => false,
        }
    }

    /// タイピング終了。変化の有無にかかわらず現在の集合を通知する
    pub async fn stop(&self, room_id: &RoomId, username: &Username) -> Vec<Username> {
        let _turn = self.sequencer.enter().await;
        let room = self.rooms.stop_typing(room_id, username).await;
        self.broadcast_typing(&room).await;
        room.typing_users()
    }

    async fn broadcast_typing(&self, room: &Room) {
        let event = OutboundEvent::TypingUpdate {
            room: room.id.clone(),
            users: room.typing_users(),
        };
        if let Err(e) = self
            .message_pusher
            .broadcast(&room.member_connections(), &event)
            .await
        {
            tracing::warn!("Failed to broadcast typing update: {}", e);
        }
    }
}
